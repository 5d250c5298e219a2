//! Single-slot memoization of the last resolved identifier.
//!
//! Resolving the same identifier twice must not re-issue network calls, so
//! the pipeline keeps the last complete [`ResolvedContent`] keyed by its
//! identifier. One slot only: a different identifier overwrites it, nothing
//! is ever evicted by time.
//!
//! The cache is deliberately not synchronized. Callers either serialize
//! access to one instance or keep one cache per execution context; the
//! `&mut` receiver on [`store`](WatchDataCache::store) makes the invariant
//! explicit instead of hiding it behind a lock.

use crate::model::ResolvedContent;
use tracing::debug;

/// Last-identifier resolution cache, owned and passed in by the caller.
#[derive(Debug, Default)]
pub struct WatchDataCache {
    slot: Option<(String, ResolvedContent)>,
}

impl WatchDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached content for `identifier`, if it is the one in the slot.
    pub fn lookup(&self, identifier: &str) -> Option<&ResolvedContent> {
        match &self.slot {
            Some((id, content)) if id == identifier => {
                debug!("watch cache HIT for {}", identifier);
                Some(content)
            }
            _ => {
                debug!("watch cache MISS for {}", identifier);
                None
            }
        }
    }

    /// Overwrite the slot with a fresh resolution.
    pub fn store(&mut self, identifier: &str, content: ResolvedContent) {
        self.slot = Some((identifier.to_string(), content));
    }

    /// Identifier currently occupying the slot.
    pub fn last_identifier(&self) -> Option<&str> {
        self.slot.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ContentMode;
    use crate::model::{ContentDescriptor, ModeDetails, Uploader, VariantSet};

    fn resolved(id: &str) -> ResolvedContent {
        ResolvedContent {
            descriptor: ContentDescriptor {
                identifier: id.to_string(),
                mode: ContentMode::Standard,
                title: "t".to_string(),
                uploader: Uploader::default(),
                thumbnail: None,
                description: None,
                duration_secs: 10,
                published_at: None,
                paid: false,
                view_count: 0,
                like_count: 0,
                tags: vec![],
            },
            variants: VariantSet::default(),
            captions: vec![],
            related: vec![],
            details: ModeDetails::Standard {
                bvid: id.to_string(),
                cid: 1,
                part: 1,
                page_count: 1,
            },
        }
    }

    #[test]
    fn hit_on_same_identifier() {
        let mut cache = WatchDataCache::new();
        cache.store("BV1", resolved("BV1"));
        assert!(cache.lookup("BV1").is_some());
        assert_eq!(cache.last_identifier(), Some("BV1"));
    }

    #[test]
    fn miss_on_other_identifier() {
        let mut cache = WatchDataCache::new();
        cache.store("BV1", resolved("BV1"));
        assert!(cache.lookup("BV2").is_none());
    }

    #[test]
    fn new_identifier_overwrites_slot() {
        let mut cache = WatchDataCache::new();
        cache.store("BV1", resolved("BV1"));
        cache.store("BV2", resolved("BV2"));
        assert!(cache.lookup("BV1").is_none());
        assert!(cache.lookup("BV2").is_some());
    }

    #[test]
    fn clear_empties_slot() {
        let mut cache = WatchDataCache::new();
        cache.store("BV1", resolved("BV1"));
        cache.clear();
        assert!(cache.lookup("BV1").is_none());
        assert_eq!(cache.last_identifier(), None);
    }
}
