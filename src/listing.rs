//! Paginated channel-listing results.

use crate::cursor::PageCursor;
use crate::endpoints::to_https;
use crate::model::{Uploader, cst_timestamp};
use crate::wire::Archive;
use chrono::{DateTime, FixedOffset};

/// One item of a channel listing page.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingItem {
    pub bvid: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub duration_secs: i64,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub view_count: i64,
}

impl From<Archive> for ListingItem {
    fn from(archive: Archive) -> Self {
        ListingItem {
            url: format!("https://www.bilibili.com/video/{}", archive.bvid),
            thumbnail: to_https(&archive.pic),
            duration_secs: archive.duration,
            published_at: cst_timestamp(archive.ctime),
            view_count: archive.stat.view,
            bvid: archive.bvid,
            title: archive.title,
        }
    }
}

/// One page of listing items plus the cursor for the next page.
///
/// `next` is `None` at end-of-listing (the upstream returned zero items);
/// callers must stop paginating then and must not advance the cursor again.
#[derive(Clone, Debug)]
pub struct ListingPage {
    pub items: Vec<ListingItem>,
    pub next: Option<PageCursor>,
    /// Total item count as reported by the listing endpoint, when present.
    pub total: Option<i64>,
    /// Channel owner from the card document; `None` when the card fetch
    /// failed or the listing URL carries no `mid`.
    pub uploader: Option<Uploader>,
}

impl ListingPage {
    pub fn is_end(&self) -> bool {
        self.next.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Stat;

    #[test]
    fn archive_converts_to_item() {
        let archive = Archive {
            bvid: "BV1xx411c7mD".to_string(),
            title: "title".to_string(),
            pic: "http://i0.hdslb.com/bfs/archive/cover.jpg".to_string(),
            duration: 213,
            ctime: 1_577_836_800,
            stat: Stat {
                view: 1234,
                ..Default::default()
            },
            owner: Default::default(),
        };
        let item = ListingItem::from(archive);
        assert_eq!(item.url, "https://www.bilibili.com/video/BV1xx411c7mD");
        assert_eq!(item.thumbnail, "https://i0.hdslb.com/bfs/archive/cover.jpg");
        assert_eq!(item.view_count, 1234);
        assert!(item.published_at.is_some());
    }
}
