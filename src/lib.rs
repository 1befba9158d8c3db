use clap::{Parser, Subcommand};

pub mod config;
pub mod discovery;
pub mod platform;
pub mod schedule;
pub mod updater;
pub mod youtube;


pub use config::{ConfigError, EpisodeRange, HourInterval, QuotaPolicy, RunMode, ScheduleConfig};
pub use discovery::{discover, page_stream, Inventory, DETAILS_BATCH_SIZE};
pub use platform::{
    PageEntry, PlatformError, PrivacyStatus, VideoItem, VideoPage, VideoPlatform, VideoUpdate,
};
pub use schedule::{
    compute_publish_time, episode_number, reconcile_title, resolve_anchor, HourPicker, RandomHours,
    ScheduleError,
};
pub use updater::{
    execute_plan, plan_updates, run_update_pass, ItemOutcome, PassReport, PlanEntry, QuotaCounter,
    UpdateError, UpdateStep, ValidationError, MAX_TITLE_CHARS,
};

#[derive(Parser, Debug)]
#[command(author = "LinlyBoi",
          version = "0.1",
          about = "Retitle and schedule draft YouTube videos in bulk",
          long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Option<Mode>,

    #[arg(
        long = "title-prefix",
        env = "TITLE_PREFIX",
        value_name = "TEXT",
        help = "Text prepended to every episode number"
    )]
    pub title_prefix: Option<String>,

    #[arg(
        long = "title-suffix",
        env = "TITLE_SUFFIX",
        value_name = "TEXT",
        help = "Text appended to every episode number"
    )]
    pub title_suffix: Option<String>,

    #[arg(
        short = 'p',
        long = "playlist-id",
        env = "PLAYLIST_ID",
        value_name = "PLAYLIST_ID",
        help = "Playlist every updated video is inserted into"
    )]
    pub playlist_id: Option<String>,

    #[arg(
        short = 'd',
        long,
        env = "DESCRIPTION",
        value_name = "TEXT",
        help = "Description applied to every video (\\n is expanded)"
    )]
    pub description: Option<String>,

    #[arg(long = "first-interval-start", env = "FIRST_INTERVAL_START", default_value_t = 1)]
    pub first_interval_start: u32,

    #[arg(long = "first-interval-end", env = "FIRST_INTERVAL_END", default_value_t = 9)]
    pub first_interval_end: u32,

    #[arg(long = "second-interval-start", env = "SECOND_INTERVAL_START", default_value_t = 13)]
    pub second_interval_start: u32,

    #[arg(long = "second-interval-end", env = "SECOND_INTERVAL_END", default_value_t = 23)]
    pub second_interval_end: u32,

    #[arg(
        long = "videos-per-day",
        env = "VIDEOS_PER_DAY",
        value_name = "1|2",
        default_value_t = 2,
        help = "Releases per day"
    )]
    pub videos_per_day: u32,

    #[arg(
        short = 's',
        long = "start-date",
        env = "START_DATE",
        value_name = "YYYY-MM-DD",
        help = "First day to schedule when nothing is scheduled yet (defaults to today)"
    )]
    pub start_date: Option<String>,

    #[arg(long = "start-video-number", env = "START_VIDEO_NUMBER", default_value_t = 130)]
    pub start_video_number: u64,

    #[arg(
        long = "end-video-number",
        env = "END_VIDEO_NUMBER",
        default_value_t = 200,
        help = "First episode number past the processed range"
    )]
    pub end_video_number: u64,

    #[arg(long = "max-videos", env = "MAX_VIDEOS", default_value_t = 400)]
    pub max_videos: usize,

    #[arg(
        long = "page-size",
        env = "REQ_MAX_RESULT",
        default_value_t = 400,
        help = "Results requested per search page"
    )]
    pub page_size: u32,

    #[arg(long = "category", env = "CATEGORY_NAME", default_value = "Entertainment")]
    pub category: String,

    #[arg(long = "region-code", env = "REGION_CODE", default_value = "US")]
    pub region_code: String,

    #[arg(
        long = "utc-offset",
        env = "UTC_OFFSET",
        value_name = "+HH:MM",
        help = "Timezone offset publish times are expressed in (defaults to the local offset)"
    )]
    pub utc_offset: Option<String>,

    #[arg(long = "quota-budget", env = "QUOTA_BUDGET", default_value_t = 100_000)]
    pub quota_budget: u64,

    #[arg(long = "update-cost", env = "UPDATE_COST", default_value_t = 1600)]
    pub update_cost: u64,

    #[arg(long = "playlist-insert-cost", env = "PLAYLIST_INSERT_COST", default_value_t = 50)]
    pub playlist_insert_cost: u64,

    #[arg(long = "category-list-cost", env = "CATEGORY_LIST_COST", default_value_t = 1)]
    pub category_list_cost: u64,

    #[arg(
        short = 'c',
        long = "client-secrets",
        env = "CLIENT_SECRETS",
        value_name = "CONFIG_FILE",
        help = "OAuth client secrets file (JSON)",
        default_value = "~/.client_secrets.json"
    )]
    pub client_secrets: String,

    #[arg(
        long = "token-file",
        env = "TOKEN_FILE",
        value_name = "FILE",
        help = "Where OAuth tokens are cached",
        default_value = "~/.youtube_tokens.json"
    )]
    pub token_file: String,

    #[arg(
        long = "dry-run",
        help = "Show schedule without updating",
        action = clap::ArgAction::SetTrue
    )]
    pub dry_run: bool,

    #[arg(
        short = 'y',
        long = "yes",
        help = "Skip the confirmation prompt",
        action = clap::ArgAction::SetTrue
    )]
    pub yes: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Enable debug logging",
        action = clap::ArgAction::SetTrue
    )]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Schedule unpublished drafts right after the last scheduled video
    Drafts,
    /// Re-apply titles and publish times to videos scheduled on one day
    Reschedule {
        #[arg(long, env = "TEMP_DATE", value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
}

pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            path.replacen("~", &home, 1)
        } else {
            path.to_string()
        }
    } else {
        path.to_string()
    }
}
