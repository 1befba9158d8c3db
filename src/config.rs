use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use thiserror::Error;

use crate::schedule::at_hour;
use crate::{Args, Mode};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is missing or empty")]
    Missing(&'static str),

    #[error("TITLE_PREFIX must not contain digits, they read as the episode number: '{0}'")]
    DigitsInPrefix(String),

    #[error("{field} is not in the 'YYYY-MM-DD' format: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("UTC_OFFSET is not in the '+HH:MM' format: '{0}'")]
    InvalidOffset(String),

    #[error("VIDEOS_PER_DAY must be 1 or 2, got {0}")]
    UnsupportedVideosPerDay(u32),

    #[error("{name} [{low}, {high}] is not a valid hour range")]
    InvalidInterval { name: &'static str, low: u32, high: u32 },

    #[error("the first interval must end before the second one starts")]
    OverlappingIntervals,

    #[error("episode range [{start}, {end}) is empty")]
    InvalidEpisodeRange { start: u64, end: u64 },
}

/// Inclusive hour-of-day range, `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourInterval {
    pub low: u32,
    pub high: u32,
}

impl HourInterval {
    pub fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.low <= hour && hour <= self.high
    }

    fn validated(self, name: &'static str) -> Result<Self, ConfigError> {
        if self.low > self.high || self.high > 23 {
            return Err(ConfigError::InvalidInterval {
                name,
                low: self.low,
                high: self.high,
            });
        }
        Ok(self)
    }
}

/// Half-open range of episode numbers, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRange {
    pub start: u64,
    pub end: u64,
}

impl EpisodeRange {
    pub fn contains(&self, number: u64) -> bool {
        self.start <= number && number < self.end
    }
}

/// Cost model of the remote API, in quota units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub budget: u64,
    pub update_cost: u64,
    pub playlist_insert_cost: u64,
    pub category_list_cost: u64,
}

impl QuotaPolicy {
    /// What one fully processed video costs.
    pub fn per_video(&self) -> u64 {
        self.update_cost + self.playlist_insert_cost
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            budget: 100_000,
            update_cost: 1600,
            playlist_insert_cost: 50,
            category_list_cost: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Drafts,
    Reschedule(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub mode: RunMode,
    pub title_prefix: String,
    pub title_suffix: String,
    pub playlist_id: String,
    pub description: String,
    pub first_interval: HourInterval,
    pub second_interval: HourInterval,
    pub videos_per_day: u32,
    /// Anchor used when nothing is scheduled yet, midnight in `offset`.
    pub start_date: DateTime<FixedOffset>,
    pub episodes: EpisodeRange,
    pub max_videos: usize,
    pub page_size: u32,
    pub category: String,
    pub region_code: String,
    pub quota: QuotaPolicy,
}

impl ScheduleConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let title_prefix = required("TITLE_PREFIX", args.title_prefix.as_deref())?;
        if title_prefix.chars().any(|c| c.is_ascii_digit()) {
            return Err(ConfigError::DigitsInPrefix(title_prefix));
        }
        let title_suffix = required("TITLE_SUFFIX", args.title_suffix.as_deref())?;
        let playlist_id = required("PLAYLIST_ID", args.playlist_id.as_deref())?;
        let description =
            required("DESCRIPTION", args.description.as_deref())?.replace("\\n", "\n");

        let first_interval = HourInterval::new(args.first_interval_start, args.first_interval_end)
            .validated("FIRST_INTERVAL")?;
        let second_interval =
            HourInterval::new(args.second_interval_start, args.second_interval_end)
                .validated("SECOND_INTERVAL")?;
        if first_interval.high >= second_interval.low {
            return Err(ConfigError::OverlappingIntervals);
        }

        if !matches!(args.videos_per_day, 1 | 2) {
            return Err(ConfigError::UnsupportedVideosPerDay(args.videos_per_day));
        }

        let episodes = EpisodeRange {
            start: args.start_video_number,
            end: args.end_video_number,
        };
        if episodes.start >= episodes.end {
            return Err(ConfigError::InvalidEpisodeRange {
                start: episodes.start,
                end: episodes.end,
            });
        }

        let offset = match args.utc_offset.as_deref() {
            Some(raw) => parse_offset(raw)?,
            None => Local::now().offset().fix(),
        };
        let today = Utc::now().with_timezone(&offset).date_naive();

        let start_day = match args.start_date.as_deref() {
            Some(raw) => parse_date("START_DATE", raw)?,
            None => today,
        };
        let start_date = at_hour(start_day, 0, offset).ok_or(ConfigError::InvalidDate {
            field: "START_DATE",
            value: start_day.to_string(),
        })?;

        let mode = match &args.mode {
            None | Some(Mode::Drafts) => RunMode::Drafts,
            Some(Mode::Reschedule { date }) => RunMode::Reschedule(match date.as_deref() {
                Some(raw) => parse_date("TEMP_DATE", raw)?,
                None => today,
            }),
        };

        Ok(Self {
            mode,
            title_prefix,
            title_suffix,
            playlist_id,
            description,
            first_interval,
            second_interval,
            videos_per_day: args.videos_per_day,
            start_date,
            episodes,
            max_videos: args.max_videos,
            page_size: args.page_size,
            category: args.category.clone(),
            region_code: args.region_code.clone(),
            quota: QuotaPolicy {
                budget: args.quota_budget,
                update_cost: args.update_cost,
                playlist_insert_cost: args.playlist_insert_cost,
                category_list_cost: args.category_list_cost,
            },
        })
    }

    pub fn offset(&self) -> FixedOffset {
        *self.start_date.offset()
    }
}

fn required(name: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    let invalid = || ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    };
    // chrono accepts single-digit months and days, the format does not
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

pub fn parse_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let stamp = format!("2000-01-01T00:00:00{}", value.trim());
    DateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%S%:z")
        .map(|parsed| *parsed.offset())
        .map_err(|_| ConfigError::InvalidOffset(value.to_string()))
}
