use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use log::{debug, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

use crate::config::HourInterval;
use crate::platform::VideoItem;

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("unsupported configuration: {0} videos per day")]
    UnsupportedVideosPerDay(u32),

    #[error("hour {0} is not a valid hour of the day")]
    HourOutOfRange(u32),
}

/// Episode number of a title: its first run of ASCII digits.
///
/// Returns `None` when the title has no digits or the run does not fit a `u64`.
pub fn episode_number(title: &str) -> Option<u64> {
    FIRST_NUMBER
        .find(title)
        .and_then(|found| found.as_str().parse().ok())
}

/// Source of publish hours.
pub trait HourPicker {
    fn pick(&mut self, interval: HourInterval) -> u32;
}

/// Uniform hour picker backed by any `rand` generator.
pub struct RandomHours<R>(pub R);

impl<R: Rng> HourPicker for RandomHours<R> {
    fn pick(&mut self, interval: HourInterval) -> u32 {
        self.0.gen_range(interval.low..=interval.high)
    }
}

pub(crate) fn at_hour(
    day: NaiveDate,
    hour: u32,
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let naive = day.and_hms_opt(hour, 0, 0)?;
    offset.from_local_datetime(&naive).single()
}

/// Publish time of the `index`-th video of a batch starting on `anchor`'s day.
///
/// With two videos per day, even indices land in `first` and odd ones in `second`,
/// two per calendar day. With one per day, every day gets a single video at an
/// hour anywhere between `first.low` and `second.high`.
pub fn compute_publish_time<H: HourPicker + ?Sized>(
    anchor: &DateTime<FixedOffset>,
    index: usize,
    first: HourInterval,
    second: HourInterval,
    videos_per_day: u32,
    hours: &mut H,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let (interval, day_offset) = match videos_per_day {
        1 => (HourInterval::new(first.low, second.high), index),
        2 if index % 2 == 0 => (first, index / 2),
        2 => (second, index / 2),
        other => {
            warn!("Unsupported configuration: {} videos per day", other);
            return Err(ScheduleError::UnsupportedVideosPerDay(other));
        }
    };

    let hour = hours.pick(interval);
    let day = anchor.date_naive() + Duration::days(day_offset as i64);
    at_hour(day, hour, *anchor.offset()).ok_or(ScheduleError::HourOutOfRange(hour))
}

/// First day new videos may be scheduled on.
///
/// That is midnight after the latest already-scheduled video, in the offset of
/// `default`, or `default` itself when nothing is scheduled.
pub fn resolve_anchor(
    scheduled: &[VideoItem],
    default: DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    let Some(latest) = scheduled.iter().filter_map(|video| video.publish_at).max() else {
        return default;
    };

    let offset = *default.offset();
    let next_day = latest.with_timezone(&offset).date_naive() + Duration::days(1);
    match at_hour(next_day, 0, offset) {
        Some(anchor) => {
            debug!("Latest scheduled video publishes at {}, anchoring at {}", latest, anchor);
            anchor
        }
        None => default,
    }
}

/// Bare episode number a title is rebuilt from.
///
/// A title carrying anything besides its number was already rewritten, at least
/// locally, by an earlier run; starting over from the number keeps prefixes and
/// suffixes from piling up. This relies on the prefix carrying no digits, which
/// `ScheduleConfig::from_args` enforces.
pub fn reconcile_title(video: &VideoItem) -> Option<String> {
    let canonical = episode_number(&video.title)?.to_string();
    if video.title != canonical {
        debug!(
            "Resetting title of {} from '{}' to '{}'",
            video.id, video.title, canonical
        );
    }
    Some(canonical)
}

pub fn format_title(prefix: &str, canonical: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, canonical, suffix)
}
