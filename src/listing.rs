//! Pagination and listing helpers.
//!
//! Listings are consumed page by page through continuation tokens; nothing
//! here materializes a whole bucket in memory. Backend ordering is
//! preserved as-is, never re-sorted.

use std::sync::Arc;

use futures_core::Stream;

use crate::error::GatewayResult;
use crate::store::{ListPage, ObjectStore, ObjectSummary};

/// Page size used when walking a whole bucket internally
pub(crate) const WALK_PAGE_SIZE: usize = 1000;

/// Keep only items with the given extension (leading dot and case are
/// ignored). The continuation token is left untouched: filtering changes
/// what a page shows, never how pagination proceeds, so a filtered page
/// may be empty while a token remains.
pub fn filter_by_extension(mut page: ListPage, extension: &str) -> ListPage {
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
    page.items
        .retain(|item| item.extension.as_deref() == Some(wanted.as_str()));
    page
}

/// Stream every object in a bucket, fetching pages on demand.
///
/// Callers that want "all objects" loop over this and accumulate only what
/// they need; the stream holds one page at a time.
pub fn stream_objects(
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: Option<String>,
) -> impl Stream<Item = GatewayResult<ObjectSummary>> + Send {
    async_stream::try_stream! {
        let mut token: Option<String> = None;
        loop {
            let page = store
                .list(&bucket, prefix.as_deref(), token.as_deref(), WALK_PAGE_SIZE)
                .await?;
            for item in page.items {
                yield item;
            }
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
    }
}

/// Render a byte count in binary units, one decimal place
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
