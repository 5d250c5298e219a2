//! Stream-set construction from a decoded play manifest.
//!
//! DASH manifests carry parallel `video`/`audio` representation arrays, each
//! entry a primary URL plus ordered mirrors. Every URL becomes its own
//! [`StreamVariant`] — mirrors are independently playable and are never
//! folded into one entry. Legacy progressive-only responses fall back to a
//! flat `durl` list exposed as muxed `"Best"` variants.

use crate::error::{ResolveError, Result};
use crate::model::{DeliveryMethod, MediaContainer, StreamVariant, VariantSet};
use crate::wire::PlayInfo;
use tracing::debug;

/// Highest quality id handed out to unauthenticated playback requests.
/// Representations above this are reserved tiers and are skipped.
pub const QUALITY_CEILING: i64 = 64;

/// Audio bitrate is fixed per platform tier.
pub const AUDIO_BITRATE: u32 = 192_000;

/// Map a platform quality id onto its resolution label.
pub fn resolution_label(id: i64) -> &'static str {
    match id {
        6 => "240P",
        16 => "360P",
        32 => "480P",
        64 => "720P",
        74 => "720P60",
        80 => "1080P",
        112 => "1080P+",
        116 => "1080P60",
        120 => "4K",
        125 => "HDR",
        126 => "Dolby Vision",
        127 => "8K",
        _ => "Unknown",
    }
}

/// Build the variant set for one decoded manifest.
///
/// `stream_id` seeds the per-variant player ids; `paid` is the content's
/// payment flag and decides how an empty manifest is reported.
///
/// # Errors
///
/// [`ResolveError::PaidContent`] when the manifest is empty and the content
/// is flagged paid, or when a paid manifest yields zero variants;
/// [`ResolveError::Unavailable`] for an empty manifest on free content.
pub fn build_variant_set(play: &PlayInfo, stream_id: &str, paid: bool) -> Result<VariantSet> {
    if let Some(dash) = play.dash.as_ref().filter(|d| !d.is_empty()) {
        let mut video_only = Vec::new();
        for rep in &dash.video {
            if rep.id > QUALITY_CEILING {
                debug!("skipping reserved quality tier {}", rep.id);
                continue;
            }
            let label = resolution_label(rep.id);
            for url in std::iter::once(&rep.base_url).chain(rep.mirrors()) {
                video_only.push(StreamVariant {
                    id: format!("{stream_id}-video"),
                    url: url.clone(),
                    container: MediaContainer::Mpeg4,
                    video_only: true,
                    label: label.to_string(),
                    bitrate: None,
                    delivery: DeliveryMethod::ProgressiveHttp,
                });
            }
        }

        let mut audio = Vec::new();
        for rep in &dash.audio {
            for url in std::iter::once(&rep.base_url).chain(rep.mirrors()) {
                audio.push(StreamVariant {
                    id: format!("{stream_id}-audio"),
                    url: url.clone(),
                    container: MediaContainer::M4a,
                    video_only: false,
                    label: "192kbps".to_string(),
                    bitrate: Some(AUDIO_BITRATE),
                    delivery: DeliveryMethod::ProgressiveHttp,
                });
            }
        }

        let set = VariantSet::new(video_only, audio, Vec::new());
        if paid && set.video_only_count() + set.audio_count() == 0 {
            return Err(ResolveError::PaidContent(
                "paid content yields no playable representation".to_string(),
            ));
        }
        return Ok(set);
    }

    if let Some(first) = play.durl.first() {
        let muxed = std::iter::once(&first.url)
            .chain(first.mirrors())
            .filter(|url| !url.is_empty())
            .map(|url| StreamVariant {
                id: stream_id.to_string(),
                url: url.clone(),
                container: MediaContainer::Mpeg4,
                video_only: false,
                label: "Best".to_string(),
                bitrate: None,
                delivery: DeliveryMethod::ProgressiveHttp,
            })
            .collect::<Vec<_>>();
        if !muxed.is_empty() {
            return Ok(VariantSet::new(Vec::new(), Vec::new(), muxed));
        }
    }

    if paid {
        Err(ResolveError::PaidContent("paid content".to_string()))
    } else {
        Err(ResolveError::Unavailable(
            "manifest carries no representations".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{DashManifest, Durl, Representation};

    fn rep(id: i64, base: &str, mirrors: &[&str]) -> Representation {
        Representation {
            id,
            base_url: base.to_string(),
            backup_url: Some(mirrors.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn dash_play(video: Vec<Representation>, audio: Vec<Representation>) -> PlayInfo {
        PlayInfo {
            dash: Some(DashManifest {
                duration: 120,
                video,
                audio,
            }),
            durl: vec![],
        }
    }

    #[test]
    fn primary_and_mirrors_become_separate_variants() {
        let play = dash_play(
            vec![rep(64, "https://cdn/v.m4s", &["https://mirror-1/v.m4s", "https://mirror-2/v.m4s"])],
            vec![rep(30280, "https://cdn/a.m4s", &[])],
        );
        let set = build_variant_set(&play, "bilibili-BV1-1", false).unwrap();
        assert_eq!(set.video_only_count(), 3);
        assert_eq!(set.audio_count(), 1);

        let exposed = set.video_only_streams();
        assert_eq!(exposed[0].url, "https://cdn/v.m4s");
        assert_eq!(exposed[1].url, "https://mirror-1/v.m4s");
        assert_eq!(exposed[0].label, "720P");
        assert!(exposed[0].video_only);
    }

    #[test]
    fn reserved_quality_tiers_are_skipped() {
        let play = dash_play(
            vec![
                rep(112, "https://cdn/1080plus.m4s", &[]),
                rep(64, "https://cdn/720.m4s", &[]),
                rep(32, "https://cdn/480.m4s", &[]),
            ],
            vec![rep(30216, "https://cdn/a.m4s", &[])],
        );
        let set = build_variant_set(&play, "id", false).unwrap();
        assert_eq!(set.video_only_count(), 2);
        let labels: Vec<String> = set
            .video_only_streams()
            .into_iter()
            .map(|v| v.label)
            .collect();
        assert_eq!(labels, ["720P", "480P"]);
    }

    #[test]
    fn audio_variants_carry_fixed_bitrate() {
        let play = dash_play(
            vec![rep(16, "https://cdn/v.m4s", &[])],
            vec![rep(30232, "https://cdn/a.m4s", &["https://mirror/a.m4s"])],
        );
        let set = build_variant_set(&play, "id", false).unwrap();
        for variant in set.audio_streams() {
            assert_eq!(variant.bitrate, Some(AUDIO_BITRATE));
            assert_eq!(variant.container, MediaContainer::M4a);
            assert!(!variant.video_only);
        }
    }

    #[test]
    fn durl_fallback_builds_muxed_best_variants() {
        let play = PlayInfo {
            dash: None,
            durl: vec![Durl {
                url: "https://cdn/legacy.flv".to_string(),
                backup_url: Some(vec!["https://mirror/legacy.flv".to_string()]),
            }],
        };
        let set = build_variant_set(&play, "id", false).unwrap();
        assert_eq!(set.video_only_count(), 0);
        assert_eq!(set.audio_count(), 0);
        let muxed = set.video_streams();
        assert_eq!(muxed.len(), 2);
        assert_eq!(muxed[0].label, "Best");
        assert!(!muxed[0].video_only);
        assert_eq!(muxed[0].delivery, DeliveryMethod::ProgressiveHttp);
    }

    #[test]
    fn empty_manifest_paid_flag_decides_error() {
        let play = PlayInfo::default();
        let err = build_variant_set(&play, "id", true).unwrap_err();
        assert!(matches!(err, ResolveError::PaidContent(_)));

        let err = build_variant_set(&play, "id", false).unwrap_err();
        assert!(matches!(err, ResolveError::Unavailable(_)));
    }

    #[test]
    fn empty_dash_object_falls_through_to_paid_check() {
        let play = PlayInfo {
            dash: Some(DashManifest::default()),
            durl: vec![],
        };
        let err = build_variant_set(&play, "id", true).unwrap_err();
        assert!(matches!(err, ResolveError::PaidContent(_)));
    }
}
