use std::collections::HashSet;

use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};

use crate::config::EpisodeRange;
use crate::platform::{PlatformError, PrivacyStatus, VideoItem, VideoPage, VideoPlatform};
use crate::schedule::episode_number;

/// Most ids a single details lookup accepts.
pub const DETAILS_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Private videos without a publish time, by episode number.
    pub drafts: Vec<VideoItem>,
    /// Videos with a publish time already set, by episode number.
    pub scheduled: Vec<VideoItem>,
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily walks the listing until the platform stops handing out page tokens.
///
/// A failed page is yielded as an error and ends the walk, since there is no
/// token left to continue from. Calling this again starts over from the first page.
pub fn page_stream<'a, P: VideoPlatform + ?Sized>(
    platform: &'a P,
    page_size: u32,
) -> impl Stream<Item = Result<VideoPage, PlatformError>> + 'a {
    stream::unfold(Cursor::Start, move |cursor| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return None,
        };

        match platform.list_page(token.as_deref(), page_size).await {
            Ok(page) => {
                let next = match &page.next_page_token {
                    Some(token) => Cursor::Next(token.clone()),
                    None => Cursor::Done,
                };
                Some((Ok(page), next))
            }
            Err(e) => Some((Err(e), Cursor::Done)),
        }
    })
}

/// Collects the drafts and scheduled videos whose episode number is in `range`.
///
/// Best effort: failed pages and detail batches are logged and left out.
pub async fn discover<P: VideoPlatform + ?Sized>(
    platform: &P,
    range: &EpisodeRange,
    page_size: u32,
) -> Inventory {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    let pages = page_stream(platform, page_size);
    futures::pin_mut!(pages);
    while let Some(page) = pages.next().await {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                warn!("Error fetching videos: {}", e);
                continue;
            }
        };

        for entry in page.entries {
            match episode_number(&entry.title) {
                Some(number) if range.contains(number) => {
                    if seen.insert(entry.id.clone()) {
                        debug!("Adding video: {}, Number: {}", entry.title, number);
                        ids.push(entry.id);
                    }
                }
                _ => {}
            }
        }
    }

    let mut videos = Vec::with_capacity(ids.len());
    for batch in ids.chunks(DETAILS_BATCH_SIZE) {
        match platform.fetch_details(batch).await {
            Ok(details) => videos.extend(details),
            Err(e) => warn!("Error fetching details for {} videos: {}", batch.len(), e),
        }
    }

    let inventory = partition(videos);
    info!(
        "Found {} draft and {} scheduled videos in episodes [{}, {})",
        inventory.drafts.len(),
        inventory.scheduled.len(),
        range.start,
        range.end
    );
    inventory
}

/// Splits videos into drafts and scheduled ones, each sorted by episode number.
///
/// Public videos and unscheduled unlisted ones are dropped, as are videos whose
/// title lost its number.
pub fn partition(videos: Vec<VideoItem>) -> Inventory {
    let mut drafts = Vec::new();
    let mut scheduled = Vec::new();

    for video in videos {
        let Some(number) = episode_number(&video.title) else {
            debug!("Dropping {} without an episode number: '{}'", video.id, video.title);
            continue;
        };

        match (video.privacy, video.publish_at) {
            (PrivacyStatus::Public, _) => {}
            (_, Some(_)) => scheduled.push((number, video)),
            (PrivacyStatus::Private, None) => drafts.push((number, video)),
            (PrivacyStatus::Unlisted, None) => {}
        }
    }

    drafts.sort_by_key(|(number, _)| *number);
    scheduled.sort_by_key(|(number, _)| *number);

    Inventory {
        drafts: drafts.into_iter().map(|(_, video)| video).collect(),
        scheduled: scheduled.into_iter().map(|(_, video)| video).collect(),
    }
}
