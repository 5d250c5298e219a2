//! Content resolution engine for the Bilibili video platform.
//!
//! Turns a content identifier (video URL, live-room URL, bangumi URL) into a
//! normalized, player-ready description: a [`ContentDescriptor`] with
//! metadata, a [`VariantSet`] of playable stream variants, caption tracks and
//! — for channel listings — paginated item pages.
//!
//! The crate deliberately owns only the resolution logic. HTTP transport is
//! abstracted behind the [`Fetcher`] trait so callers control retries,
//! timeouts and proxying; the default [`HttpFetcher`] is a thin reqwest
//! wrapper sending the platform headers.

pub mod cache;
pub mod captions;
pub mod cursor;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod manifest;
pub mod mode;
pub mod model;
pub mod pipeline;
mod wire;

pub use cache::WatchDataCache;
pub use captions::{SubtitleCue, transcode};
pub use cursor::{ListingVariant, PageCursor};
pub use endpoints::Endpoints;
pub use error::{ResolveError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use listing::{ListingItem, ListingPage};
pub use mode::ContentMode;
pub use model::{
    CaptionTrack, ContentDescriptor, DeliveryMethod, MediaContainer, ModeDetails, RelatedItem,
    ResolvedContent, StreamVariant, TranscodedCaption, Uploader, VariantSet,
};
pub use pipeline::ContentResolver;
