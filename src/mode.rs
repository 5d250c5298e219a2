//! Content-mode classification.
//!
//! Pure function of the identifier string: live-room URLs are classified as
//! live candidates (refined to [`ContentMode::Live`] or
//! [`ContentMode::RoundPlay`] once the room status is fetched), bangumi URLs
//! as premium, everything else as standard VOD with an explicit part index.

use crate::error::{ResolveError, Result};
use url::Url;

/// Which resolution path an identifier takes. Fixed for the lifetime of a
/// resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentMode {
    /// Standard on-demand video.
    Standard,
    /// Active live broadcast.
    Live,
    /// Ended broadcast looping pre-recorded content.
    RoundPlay,
    /// Gated episodic (bangumi) content.
    Premium,
}

/// Classified identifier plus the inputs its fetch plan needs.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifiedId {
    /// Live candidate. Live vs round-play is decided by the room status.
    Live {
        room_id: String,
        /// Explicit round-play timestamp from the URL, millis.
        timestamp_ms: Option<i64>,
    },
    /// Premium episode. `season` selects the first episode of the season;
    /// otherwise the episode is matched by share-URL suffix against `id`.
    Premium { id: String, season: bool },
    /// Standard video, `part` 1-based.
    Standard { bvid: String, part: usize },
}

const LIVE_HOST: &str = "live.bilibili.com";
const PREMIUM_PATH: &str = "bangumi/play/";

/// Classify an identifier or URL into its content mode inputs.
///
/// # Errors
///
/// Returns [`ResolveError::Parse`] when no video id can be extracted.
pub fn classify(identifier: &str) -> Result<ClassifiedId> {
    if let Ok(url) = Url::parse(identifier) {
        if url
            .host_str()
            .is_some_and(|h| h == LIVE_HOST || h.ends_with(".live.bilibili.com"))
        {
            let room_id = url
                .path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
                .map(str::to_string)
                .ok_or_else(|| ResolveError::Parse(format!("no room id in {identifier}")))?;
            let timestamp_ms = query_value(&url, "timestamp").and_then(|v| v.parse().ok());
            return Ok(ClassifiedId::Live { room_id, timestamp_ms });
        }

        if url.path().contains(PREMIUM_PATH) {
            let id = url
                .path_segments()
                .and_then(|segments| {
                    segments
                        .filter(|s| !s.is_empty())
                        .find(|s| s.starts_with("ss") || s.starts_with("ep"))
                })
                .map(|s| s.to_string())
                .ok_or_else(|| ResolveError::Parse(format!("no season/episode id in {identifier}")))?;
            let season = id.starts_with("ss");
            return Ok(ClassifiedId::Premium { id, season });
        }

        let bvid = url
            .path_segments()
            .and_then(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .find(|s| s.starts_with("BV"))
                    .map(str::to_string)
            })
            .or_else(|| query_value(&url, "bvid"))
            .ok_or_else(|| ResolveError::Parse(format!("no video id in {identifier}")))?;
        let part = query_value(&url, "p")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);
        return Ok(ClassifiedId::Standard { bvid: pure_bvid(&bvid), part });
    }

    // Bare identifiers without a scheme.
    if identifier.starts_with("ss") || identifier.starts_with("ep") {
        let season = identifier.starts_with("ss");
        return Ok(ClassifiedId::Premium {
            id: identifier.to_string(),
            season,
        });
    }
    if identifier.starts_with("BV") {
        return Ok(ClassifiedId::Standard {
            bvid: pure_bvid(identifier),
            part: 1,
        });
    }

    Err(ResolveError::Parse(format!(
        "unrecognized content identifier: {identifier}"
    )))
}

/// Strip trailing query junk from a BV id.
fn pure_bvid(raw: &str) -> String {
    raw.split(['?', '&', '/']).next().unwrap_or(raw).to_string()
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_url_with_room_id() {
        let id = classify("https://live.bilibili.com/22637261").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Live {
                room_id: "22637261".to_string(),
                timestamp_ms: None
            }
        );
    }

    #[test]
    fn live_url_with_round_play_timestamp() {
        let id = classify("https://live.bilibili.com/22637261?timestamp=1700000000000").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Live {
                room_id: "22637261".to_string(),
                timestamp_ms: Some(1_700_000_000_000)
            }
        );
    }

    #[test]
    fn bangumi_season_url() {
        let id = classify("https://www.bilibili.com/bangumi/play/ss33802").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Premium {
                id: "ss33802".to_string(),
                season: true
            }
        );
    }

    #[test]
    fn bangumi_episode_url() {
        let id = classify("https://www.bilibili.com/bangumi/play/ep249470").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Premium {
                id: "ep249470".to_string(),
                season: false
            }
        );
    }

    #[test]
    fn standard_url_defaults_to_part_one() {
        let id = classify("https://www.bilibili.com/video/BV1xx411c7mD").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Standard {
                bvid: "BV1xx411c7mD".to_string(),
                part: 1
            }
        );
    }

    #[test]
    fn standard_url_with_part_index() {
        let id = classify("https://www.bilibili.com/video/BV1xx411c7mD?p=3").unwrap();
        assert_eq!(
            id,
            ClassifiedId::Standard {
                bvid: "BV1xx411c7mD".to_string(),
                part: 3
            }
        );
    }

    #[test]
    fn bare_bvid() {
        let id = classify("BV1xx411c7mD").unwrap();
        assert!(matches!(id, ClassifiedId::Standard { part: 1, .. }));
    }

    #[test]
    fn live_host_requires_a_label_boundary() {
        // A host merely ending in the live domain's text is not a live room.
        assert!(matches!(
            classify("https://olive.bilibili.com/22637261"),
            Err(ResolveError::Parse(_))
        ));
        assert!(matches!(
            classify("https://www.live.bilibili.com/22637261").unwrap(),
            ClassifiedId::Live { .. }
        ));
    }

    #[test]
    fn unrecognized_identifier_fails() {
        assert!(matches!(
            classify("not-a-video"),
            Err(ResolveError::Parse(_))
        ));
    }
}
