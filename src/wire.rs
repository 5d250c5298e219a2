//! Upstream wire shapes.
//!
//! Every platform endpoint wraps its payload in the same envelope with a
//! numeric `code` and a message; premium endpoints put the payload under
//! `result` instead of `data`. Field coverage is intentionally partial —
//! only what the pipeline reads.

use crate::error::{ResolveError, Result, upstream_error};
use serde::Deserialize;
use std::collections::HashMap;

/// Common response envelope.
///
/// `code == 0` is success. Some live endpoints use `msg`, the rest
/// `message`, and a few send both, so the two fields are kept separate
/// rather than aliased.
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    fn message_text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .unwrap_or_default()
    }

    /// Unwrap the payload, surfacing non-success codes with the platform's
    /// own message preserved verbatim.
    pub fn payload(self) -> Result<T> {
        if self.code != 0 {
            let message = self.message_text();
            return Err(upstream_error(self.code, message));
        }
        let message = self.message_text();
        self.data
            .or(self.result)
            .ok_or_else(|| ResolveError::Parse(format!("response carries no payload: {message}")))
    }
}

/// Decode a raw body into an envelope and unwrap its payload in one step.
pub fn decode_payload<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.payload()
}

// ---- live ----

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoomInit {
    #[serde(default)]
    pub room_id: i64,
    #[serde(default)]
    pub uid: i64,
    #[serde(default)]
    pub live_status: i64,
    #[serde(default)]
    pub live_time: i64,
}

/// Room presentation metadata from `get_status_info_by_uids` (keyed by uid).
pub type RoomStatusMap = HashMap<String, RoomStatus>;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoomStatus {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub face: String,
    #[serde(default)]
    pub cover_from_user: String,
    #[serde(default)]
    pub online: i64,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub live_time: i64,
    #[serde(default)]
    pub uid: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoundPlayInfo {
    #[serde(default)]
    pub cid: i64,
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub play_time: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LivePlayInfo {
    #[serde(default)]
    pub durl: Vec<Durl>,
}

// ---- VOD ----

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WatchDoc {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub ctime: i64,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub stat: Stat,
    #[serde(default)]
    pub rights: Rights,
    #[serde(default)]
    pub pages: Vec<PartInfo>,
    #[serde(default)]
    pub subtitle: SubtitleInfo,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub face: String,
}

/// Counter block; standard docs use `view`/`coin`, premium `views`/`coins`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Stat {
    #[serde(default)]
    pub view: i64,
    #[serde(default)]
    pub coin: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub coins: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Rights {
    #[serde(default)]
    pub pay: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartInfo {
    #[serde(default)]
    pub cid: i64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubtitleInfo {
    #[serde(default)]
    pub list: Vec<SubtitleRef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubtitleRef {
    #[serde(default)]
    pub lan: String,
    #[serde(default)]
    pub ai_status: i64,
    #[serde(default)]
    pub subtitle_url: String,
}

// ---- premium ----

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeasonDoc {
    #[serde(default)]
    pub evaluate: String,
    #[serde(default)]
    pub up_info: Option<UpInfo>,
    #[serde(default)]
    pub stat: Stat,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpInfo {
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub uname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub cid: i64,
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub share_url: String,
    #[serde(default)]
    pub share_copy: String,
    /// Milliseconds, unlike everything else on the platform.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub pub_time: i64,
    #[serde(default)]
    pub rights: Rights,
}

// ---- manifest ----

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayInfo {
    #[serde(default)]
    pub dash: Option<DashManifest>,
    #[serde(default)]
    pub durl: Vec<Durl>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DashManifest {
    /// Total duration, seconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub video: Vec<Representation>,
    #[serde(default)]
    pub audio: Vec<Representation>,
}

impl DashManifest {
    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }
}

/// One encoded rendition with a primary URL and ordered fallback mirrors.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Representation {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "baseUrl", alias = "base_url", default)]
    pub base_url: String,
    #[serde(rename = "backupUrl", alias = "backup_url", default)]
    pub backup_url: Option<Vec<String>>,
}

impl Representation {
    pub fn mirrors(&self) -> &[String] {
        self.backup_url.as_deref().unwrap_or(&[])
    }
}

/// Legacy progressive entry: one URL plus mirrors, no quality split.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Durl {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}

impl Durl {
    pub fn mirrors(&self) -> &[String] {
        self.backup_url.as_deref().unwrap_or(&[])
    }
}

// ---- tags & listings ----

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TagItem {
    #[serde(default)]
    pub tag_name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub page: Option<PageMeta>,
    #[serde(default)]
    pub archives: Vec<Archive>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub total: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub ctime: i64,
    #[serde(default)]
    pub stat: Stat,
    /// Present on recommendation archives, absent on channel listings.
    #[serde(default)]
    pub owner: Owner,
}

/// Channel owner card from `x/web-interface/card`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardDoc {
    #[serde(default)]
    pub card: Card,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub face: String,
}
