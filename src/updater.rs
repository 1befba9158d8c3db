use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use thiserror::Error;

use crate::config::ScheduleConfig;
use crate::platform::{PlatformError, PrivacyStatus, VideoItem, VideoPlatform, VideoUpdate};
use crate::schedule::{
    compute_publish_time, format_title, reconcile_title, HourPicker, ScheduleError,
};

/// Longest title the platform accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is empty")]
    EmptyTitle,

    #[error("title is {length} characters long, the limit is {max}")]
    TitleTooLong { length: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("could not fetch video categories: {0}")]
    Categories(#[source] PlatformError),

    #[error("video category '{0}' does not exist in this region")]
    UnknownCategory(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Running total of quota units spent by this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaCounter {
    used: u64,
    budget: u64,
}

impl QuotaCounter {
    pub fn new(budget: u64) -> Self {
        Self { used: 0, budget }
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.used + cost <= self.budget
    }

    pub fn charge(&mut self, cost: u64) {
        self.used += cost;
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.budget.saturating_sub(self.used)
    }
}

/// One video of the batch with everything it is about to be given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub index: usize,
    pub video: VideoItem,
    /// Bare episode number the new title is built from.
    pub canonical_title: String,
    pub title: String,
    pub publish_at: DateTime<FixedOffset>,
}

impl PlanEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let length = self.title.chars().count();
        if length > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                length,
                max: MAX_TITLE_CHARS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    Update,
    PlaylistInsert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Updated,
    Skipped(ValidationError),
    Failed { step: UpdateStep, error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Outcome per attempted entry, as `(video id, outcome)`.
    pub outcomes: Vec<(String, ItemOutcome)>,
    pub quota_used: u64,
    pub stopped_by_quota: bool,
    /// Entries never reached because the quota ran out.
    pub deferred: usize,
}

impl PassReport {
    pub fn updated(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Updated))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }
}

/// Titles and publish times for `videos`, which must already be in publish order.
pub fn plan_updates<H: HourPicker + ?Sized>(
    videos: &[VideoItem],
    anchor: DateTime<FixedOffset>,
    config: &ScheduleConfig,
    hours: &mut H,
) -> Result<Vec<PlanEntry>, ScheduleError> {
    let mut plan = Vec::with_capacity(videos.len());

    for video in videos {
        let Some(canonical_title) = reconcile_title(video) else {
            warn!("Skipping {} without an episode number: '{}'", video.id, video.title);
            continue;
        };

        let index = plan.len();
        let title = format_title(&config.title_prefix, &canonical_title, &config.title_suffix);
        let publish_at = compute_publish_time(
            &anchor,
            index,
            config.first_interval,
            config.second_interval,
            config.videos_per_day,
            hours,
        )?;

        plan.push(PlanEntry {
            index,
            video: video.clone(),
            canonical_title,
            title,
            publish_at,
        });
    }

    Ok(plan)
}

/// Applies `plan` in order until it is done or the next video would overrun the quota.
pub async fn execute_plan<P: VideoPlatform + ?Sized>(
    platform: &P,
    plan: &[PlanEntry],
    config: &ScheduleConfig,
) -> Result<PassReport, UpdateError> {
    let costs = config.quota;
    let mut quota = QuotaCounter::new(costs.budget);
    let mut report = PassReport::default();

    let categories = platform
        .list_categories(&config.region_code)
        .await
        .map_err(UpdateError::Categories)?;
    quota.charge(costs.category_list_cost);
    let category_id = categories
        .get(&config.category)
        .cloned()
        .ok_or_else(|| UpdateError::UnknownCategory(config.category.clone()))?;

    for (position, entry) in plan.iter().enumerate() {
        let video = &entry.video;

        if let Err(reason) = entry.validate() {
            warn!("Skipping {} ('{}'): {}", video.id, video.title, reason);
            report.outcomes.push((video.id.clone(), ItemOutcome::Skipped(reason)));
            continue;
        }

        if !quota.can_afford(costs.per_video()) {
            warn!(
                "Approaching quota limit ({} of {} used). Pausing updates.",
                quota.used(),
                costs.budget
            );
            report.stopped_by_quota = true;
            report.deferred = plan.len() - position;
            break;
        }

        let update = VideoUpdate {
            video_id: video.id.clone(),
            title: entry.title.clone(),
            description: config.description.clone(),
            category_id: category_id.clone(),
            publish_at: entry.publish_at,
            privacy: PrivacyStatus::Private,
        };

        if let Err(e) = platform.update_video(&update).await {
            error!("Error updating video {}: {}", video.title, e);
            report
                .outcomes
                .push((video.id.clone(), failed(UpdateStep::Update, e)));
            continue;
        }
        quota.charge(costs.update_cost);
        info!(
            "Updated video: {} with new title: {} and scheduled publish time: {}",
            video.title, entry.title, entry.publish_at
        );

        match platform
            .insert_into_playlist(&config.playlist_id, &video.id)
            .await
        {
            Ok(()) => {
                quota.charge(costs.playlist_insert_cost);
                info!(
                    "Added video: {} to playlist: {}",
                    entry.title, config.playlist_id
                );
                report.outcomes.push((video.id.clone(), ItemOutcome::Updated));
            }
            Err(e) => {
                error!(
                    "Error adding video {} to playlist {}: {}",
                    entry.title, config.playlist_id, e
                );
                report
                    .outcomes
                    .push((video.id.clone(), failed(UpdateStep::PlaylistInsert, e)));
            }
        }

        info!("Quota used so far: {}", quota.used());
    }

    report.quota_used = quota.used();
    Ok(report)
}

fn failed(step: UpdateStep, error: PlatformError) -> ItemOutcome {
    ItemOutcome::Failed {
        step,
        error: error.to_string(),
    }
}

/// Plans and applies a whole batch in one go.
pub async fn run_update_pass<P, H>(
    platform: &P,
    videos: &[VideoItem],
    anchor: DateTime<FixedOffset>,
    config: &ScheduleConfig,
    hours: &mut H,
) -> Result<PassReport, UpdateError>
where
    P: VideoPlatform + ?Sized,
    H: HourPicker + ?Sized,
{
    let plan = plan_updates(videos, anchor, config, hours)?;
    execute_plan(platform, &plan, config).await
}
