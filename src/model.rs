//! Player-facing data model: descriptors, stream variants, caption tracks.

use crate::mode::ContentMode;
use chrono::{DateTime, FixedOffset, TimeZone};

/// Duration value used for unbounded (live) content.
pub const LIVE_DURATION: i64 = -1;

/// Platform timestamps are China Standard Time (UTC+8).
pub fn cst_timestamp(epoch_secs: i64) -> Option<DateTime<FixedOffset>> {
    if epoch_secs <= 0 {
        return None;
    }
    let offset = FixedOffset::east_opt(8 * 3600)?;
    offset.timestamp_opt(epoch_secs, 0).single()
}

/// Media container of one stream variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaContainer {
    /// MP4 video (DASH video representations).
    Mpeg4,
    /// M4A audio (DASH audio representations).
    M4a,
    /// MPEG-TS, used by the live HLS variant.
    MpegTs,
}

/// How a variant is delivered to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMethod {
    ProgressiveHttp,
    Hls,
}

/// One playable rendition.
///
/// Mirrors are not folded: each mirror URL of a representation becomes its
/// own variant, so every entry here is independently playable.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamVariant {
    /// Stable id for the player (`bilibili-{bvid}-video` style).
    pub id: String,
    pub url: String,
    pub container: MediaContainer,
    /// A video-only variant never carries audio.
    pub video_only: bool,
    /// Resolution label (`"720P"`) or `"Best"` for the legacy fallback.
    pub label: String,
    /// Fixed per platform tier for audio variants, absent for video.
    pub bitrate: Option<u32>,
    pub delivery: DeliveryMethod,
}

/// Uploader identity attached to a descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Uploader {
    pub name: String,
    pub url: Option<String>,
    pub avatar: Option<String>,
}

/// Raw caption reference before transcoding.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionTrack {
    pub url: String,
    /// Normalized language code (auto-generated `ai-` prefix stripped).
    pub language: String,
    pub auto_generated: bool,
}

/// Output subtitle markup plus the track metadata it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscodedCaption {
    pub markup: String,
    pub language: String,
    pub auto_generated: bool,
}

/// Mode-specific payload of a resolution.
///
/// Exactly one of these holds per resolved identifier; mode-dependent
/// accessors match exhaustively over this union.
#[derive(Clone, Debug, PartialEq)]
pub enum ModeDetails {
    Standard {
        bvid: String,
        cid: i64,
        /// 1-based part index within the video's parts list.
        part: usize,
        page_count: usize,
    },
    Premium {
        bvid: String,
        cid: i64,
        episode_id: i64,
    },
    Live {
        room_id: i64,
        hls_url: String,
        /// Broadcast start, seconds since epoch.
        started_at: i64,
    },
    RoundPlay {
        room_id: i64,
        bvid: String,
        cid: i64,
        /// Seek offset into the current round, seconds.
        play_time: i64,
        /// Epoch millis at which the next round begins.
        next_timestamp: i64,
    },
}

/// Resolved metadata for one content identifier. Immutable once returned.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentDescriptor {
    pub identifier: String,
    pub mode: ContentMode,
    pub title: String,
    pub uploader: Uploader,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    /// Seconds; [`LIVE_DURATION`] for unbounded content.
    pub duration_secs: i64,
    /// Absent for live broadcasts.
    pub published_at: Option<DateTime<FixedOffset>>,
    pub paid: bool,
    pub view_count: i64,
    /// `-1` when the platform exposes no like counter for the mode.
    pub like_count: i64,
    pub tags: Vec<String>,
}

/// Ordered video-only and audio variants built for one descriptor.
///
/// The raw lists keep one entry per (representation × URL) and stay
/// introspectable via [`video_only_count`](Self::video_only_count) /
/// [`audio_count`](Self::audio_count); the pairing expansion demanded by the
/// player happens only in the exposure accessors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantSet {
    video_only: Vec<StreamVariant>,
    audio: Vec<StreamVariant>,
    /// Muxed variants: live HLS or the legacy progressive fallback.
    muxed: Vec<StreamVariant>,
}

impl VariantSet {
    pub fn new(
        video_only: Vec<StreamVariant>,
        audio: Vec<StreamVariant>,
        muxed: Vec<StreamVariant>,
    ) -> Self {
        Self {
            video_only,
            audio,
            muxed,
        }
    }

    pub fn video_only_count(&self) -> usize {
        self.video_only.len()
    }

    pub fn audio_count(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.video_only.is_empty() && self.audio.is_empty() && self.muxed.is_empty()
    }

    /// Muxed (audio+video) variants: the live HLS stream or the legacy
    /// progressive fallback. Empty for DASH content.
    pub fn video_streams(&self) -> &[StreamVariant] {
        &self.muxed
    }

    /// Exposed video-only list, `V * A` entries long.
    ///
    /// The raw list is tiled cyclically so that index `i` pairs with entry
    /// `i / V` of [`audio_streams`](Self::audio_streams): together the two
    /// lists enumerate every (video, audio) combination while keeping
    /// `len(video) == len(audio)`, which the downstream player assumes.
    /// Empty when either raw list is empty.
    pub fn video_only_streams(&self) -> Vec<StreamVariant> {
        let v = self.video_only.len();
        let a = self.audio.len();
        if v == 0 || a == 0 {
            return Vec::new();
        }
        self.video_only.iter().cloned().cycle().take(v * a).collect()
    }

    /// Exposed audio list, `V * A` entries long: each raw audio entry is
    /// repeated `V` times contiguously. Empty when either raw list is empty.
    pub fn audio_streams(&self) -> Vec<StreamVariant> {
        let v = self.video_only.len();
        if v == 0 {
            return Vec::new();
        }
        self.audio
            .iter()
            .flat_map(|item| std::iter::repeat_n(item.clone(), v))
            .collect()
    }
}

/// One item adjacent to a resolution: a sibling episode, another part of a
/// multi-part video, a recommendation, or the next round of a looping room.
#[derive(Clone, Debug, PartialEq)]
pub struct RelatedItem {
    pub title: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<i64>,
    pub view_count: Option<i64>,
}

/// Complete result of one resolution: descriptor, variants, caption tracks
/// and the mode payload. Cached verbatim by [`crate::WatchDataCache`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedContent {
    pub descriptor: ContentDescriptor,
    pub variants: VariantSet,
    pub captions: Vec<CaptionTrack>,
    /// Related items known at resolve time (premium sibling episodes).
    /// Standard and round-play related items are produced on demand by
    /// [`related_items`](crate::ContentResolver::related_items).
    pub related: Vec<RelatedItem>,
    pub details: ModeDetails,
}

impl ResolvedContent {
    /// HLS playback URL, only meaningful for plain live broadcasts.
    pub fn hls_url(&self) -> Option<&str> {
        match &self.details {
            ModeDetails::Live { hls_url, .. } => Some(hls_url),
            _ => None,
        }
    }

    /// Seek offset into the stream, seconds. Non-zero only for round-play.
    pub fn timestamp_offset(&self) -> i64 {
        match &self.details {
            ModeDetails::RoundPlay { play_time, .. } => *play_time,
            _ => 0,
        }
    }
}
