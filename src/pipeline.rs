//! Content resolution pipeline.
//!
//! One [`ContentResolver`] drives the mode-specific fetch sequence for an
//! identifier and produces the final normalized [`ResolvedContent`]. Each
//! mode is a strict sequential chain — later requests need fields decoded
//! from earlier responses — so there is no fan-out within one resolution.
//! Repeat resolutions of the same identifier short-circuit through the
//! caller-owned [`WatchDataCache`].

use crate::cache::WatchDataCache;
use crate::captions::{normalize_language, transcode};
use crate::cursor::PageCursor;
use crate::endpoints::{Endpoints, to_https};
use crate::error::{ResolveError, Result};
use crate::fetch::Fetcher;
use crate::listing::{ListingItem, ListingPage};
use crate::manifest::build_variant_set;
use crate::mode::{ClassifiedId, ContentMode, classify};
use crate::model::{
    CaptionTrack, ContentDescriptor, DeliveryMethod, LIVE_DURATION, MediaContainer, ModeDetails,
    RelatedItem, ResolvedContent, StreamVariant, TranscodedCaption, Uploader, VariantSet,
    cst_timestamp,
};
use crate::wire;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use url::Url;

const CHANNEL_BASE_URL: &str = "https://space.bilibili.com/";

/// Stock avatar used when a premium series exposes no uploader info.
const FALLBACK_AVATAR: &str =
    "https://i2.hdslb.com/bfs/face/0c84b9f4ad546d3f20324809d45fc439a2a8ddab.jpg@240w_240h_1c_1s.webp";

const FALLBACK_PREMIUM_UPLOADER: &str = "BiliBili";

/// Resolves content identifiers into player-ready descriptors.
pub struct ContentResolver<F: Fetcher> {
    fetcher: F,
    endpoints: Endpoints,
}

impl<F: Fetcher> ContentResolver<F> {
    /// Resolver against the production API hosts.
    pub fn new(fetcher: F) -> Self {
        Self::with_endpoints(fetcher, Endpoints::default())
    }

    /// Resolver with explicit endpoint bases (tests, mirrors).
    pub fn with_endpoints(fetcher: F, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolve an identifier into its content descriptor and stream set.
    ///
    /// Idempotent for a given cache: a repeat call with the identifier still
    /// in the slot returns the cached result without any network traffic.
    ///
    /// # Errors
    ///
    /// Any classification or fetch failure aborts the resolution; no partial
    /// descriptor is returned.
    pub async fn resolve(
        &self,
        identifier: &str,
        cache: &mut WatchDataCache,
    ) -> Result<ResolvedContent> {
        if let Some(hit) = cache.lookup(identifier) {
            return Ok(hit.clone());
        }

        info!("resolving {}", identifier);
        let resolved = match classify(identifier)? {
            ClassifiedId::Live {
                room_id,
                timestamp_ms,
            } => self.resolve_live(identifier, &room_id, timestamp_ms).await?,
            ClassifiedId::Premium { id, season } => {
                self.resolve_premium(identifier, &id, season).await?
            }
            ClassifiedId::Standard { bvid, part } => {
                self.resolve_standard(identifier, &bvid, part).await?
            }
        };

        cache.store(identifier, resolved.clone());
        Ok(resolved)
    }

    /// Transcode the caption tracks of a resolution, lazily and on demand.
    ///
    /// Empty for live, round-play and premium content. A track that fails to
    /// fetch or transcode is skipped with a warning — degraded output is
    /// acceptable, aborting the batch is not.
    pub async fn subtitles(&self, content: &ResolvedContent) -> Vec<TranscodedCaption> {
        if content.descriptor.mode != ContentMode::Standard {
            return Vec::new();
        }

        let mut transcoded = Vec::new();
        for track in &content.captions {
            match self.transcode_track(track).await {
                Ok(caption) => transcoded.push(caption),
                Err(e) => warn!("caption track '{}' skipped: {}", track.language, e),
            }
        }
        transcoded
    }

    /// Fetch one listing page and advance the cursor.
    ///
    /// A page with zero items signals end-of-listing: `next` is `None` and
    /// the cursor must not be advanced again. Every page is enriched with
    /// the channel owner's card; the card fetch degrades to no uploader.
    pub async fn list_page(&self, cursor: &PageCursor) -> Result<ListingPage> {
        let data: wire::ListingData = self.get(cursor.url()).await?;
        let total = data.page.as_ref().map(|p| p.total);
        let uploader = self.listing_uploader(cursor.url()).await;

        if data.archives.is_empty() {
            info!("listing exhausted at {}", cursor.url());
            return Ok(ListingPage {
                items: Vec::new(),
                next: None,
                total,
                uploader,
            });
        }

        let items: Vec<ListingItem> = data.archives.into_iter().map(ListingItem::from).collect();
        let next = cursor.advance()?;
        Ok(ListingPage {
            items,
            next: Some(next),
            total,
            uploader,
        })
    }

    /// Items adjacent to a resolution.
    ///
    /// Premium content returns the sibling episodes captured at resolve
    /// time; round-play returns one pointer at the next round; plain live
    /// has none. Standard VOD fetches the part list, and when the video has
    /// a single part, the platform's recommendations instead. Fetch failures
    /// degrade to an empty list.
    pub async fn related_items(&self, content: &ResolvedContent) -> Vec<RelatedItem> {
        match &content.details {
            ModeDetails::Premium { .. } => content.related.clone(),
            ModeDetails::Live { .. } => Vec::new(),
            ModeDetails::RoundPlay { next_timestamp, .. } => {
                vec![next_round_item(&content.descriptor, *next_timestamp)]
            }
            ModeDetails::Standard { bvid, .. } => {
                match self.standard_related(bvid, &content.descriptor).await {
                    Ok(items) => items,
                    Err(e) => {
                        warn!("related fetch failed for {}: {}", bvid, e);
                        Vec::new()
                    }
                }
            }
        }
    }

    /// GET a URL and unwrap the platform envelope.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetcher.fetch(url).await?;
        wire::decode_payload(&body)
    }

    // ---- standard VOD ----

    async fn resolve_standard(
        &self,
        identifier: &str,
        bvid: &str,
        part: usize,
    ) -> Result<ResolvedContent> {
        let watch: wire::WatchDoc = self.get(&self.endpoints.watch_url(bvid)).await?;

        let page_count = watch.pages.len();
        let page = watch
            .pages
            .get(part - 1)
            .cloned()
            .ok_or_else(|| {
                ResolveError::NotFound(format!(
                    "part {part} absent from {bvid} ({page_count} parts)"
                ))
            })?;
        let paid = watch.rights.pay == 1;

        let play: wire::PlayInfo = self
            .get(&self.endpoints.free_manifest_url(page.cid, bvid))
            .await?;
        let variants = build_variant_set(&play, &format!("bilibili-{bvid}"), paid)?;

        let tags = self.fetch_tags(bvid).await;

        let mut title = watch.title.clone();
        if page_count > 1 {
            title = format!("{title} | P{} {}", page.page, page.part);
        }

        let captions: Vec<CaptionTrack> = watch
            .subtitle
            .list
            .iter()
            .map(|track| CaptionTrack {
                url: to_https(&track.subtitle_url),
                language: normalize_language(&track.lan),
                auto_generated: track.ai_status != 0,
            })
            .collect();

        Ok(ResolvedContent {
            descriptor: ContentDescriptor {
                identifier: identifier.to_string(),
                mode: ContentMode::Standard,
                title,
                uploader: Uploader {
                    name: watch.owner.name.clone(),
                    url: Some(format!("{CHANNEL_BASE_URL}{}", watch.owner.mid)),
                    avatar: Some(to_https(&watch.owner.face)),
                },
                thumbnail: Some(to_https(&watch.pic)),
                description: Some(watch.desc.clone()),
                duration_secs: page.duration,
                published_at: cst_timestamp(watch.ctime),
                paid,
                view_count: watch.stat.view,
                like_count: watch.stat.coin,
                tags,
            },
            variants,
            captions,
            related: Vec::new(),
            details: ModeDetails::Standard {
                bvid: bvid.to_string(),
                cid: page.cid,
                part,
                page_count,
            },
        })
    }

    // ---- premium (bangumi) ----

    async fn resolve_premium(
        &self,
        identifier: &str,
        id: &str,
        season: bool,
    ) -> Result<ResolvedContent> {
        let numeric_id = id
            .get(2..)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResolveError::Parse(format!("malformed season/episode id: {id}")))?;
        let doc: wire::SeasonDoc = self
            .get(&self.endpoints.season_url(numeric_id, season))
            .await?;

        let episode = if season {
            doc.episodes.first().cloned().ok_or_else(|| {
                ResolveError::NotFound(format!("season {id} carries no episodes"))
            })?
        } else {
            doc.episodes
                .iter()
                .find(|ep| ep.share_url.ends_with(id))
                .cloned()
                .ok_or_else(|| {
                    ResolveError::NotFound(format!("episode {id} absent from series data"))
                })?
        };
        let paid = episode.rights.pay == 1;

        let play: wire::PlayInfo = self
            .get(
                &self
                    .endpoints
                    .premium_manifest_url(episode.cid, &episode.bvid),
            )
            .await?;
        let variants = build_variant_set(&play, &format!("bilibili-{}", episode.bvid), paid)?;

        let tags = self.fetch_tags(&episode.bvid).await;

        // Sibling episodes double as the related items of the resolution.
        let related: Vec<RelatedItem> = doc
            .episodes
            .iter()
            .map(|ep| RelatedItem {
                title: ep.share_copy.clone(),
                url: ep.share_url.clone(),
                thumbnail: Some(to_https(&ep.cover)),
                uploader: None,
                duration_secs: Some(ep.duration / 1000),
                view_count: None,
            })
            .collect();

        let uploader = match &doc.up_info {
            Some(up) => Uploader {
                name: up
                    .uname
                    .clone()
                    .unwrap_or_else(|| FALLBACK_PREMIUM_UPLOADER.to_string()),
                url: Some(format!("{CHANNEL_BASE_URL}{}", up.mid)),
                avatar: Some(
                    up.avatar
                        .as_deref()
                        .map(to_https)
                        .unwrap_or_else(|| FALLBACK_AVATAR.to_string()),
                ),
            },
            None => Uploader {
                name: FALLBACK_PREMIUM_UPLOADER.to_string(),
                url: None,
                avatar: Some(FALLBACK_AVATAR.to_string()),
            },
        };

        Ok(ResolvedContent {
            descriptor: ContentDescriptor {
                identifier: identifier.to_string(),
                mode: ContentMode::Premium,
                title: episode.share_copy.clone(),
                uploader,
                thumbnail: Some(to_https(&episode.cover)),
                description: Some(doc.evaluate.clone()),
                // Premium episode durations are reported in milliseconds.
                duration_secs: episode.duration / 1000,
                published_at: cst_timestamp(episode.pub_time),
                paid,
                view_count: doc.stat.views,
                like_count: doc.stat.coins,
                tags,
            },
            variants,
            captions: Vec::new(),
            related,
            details: ModeDetails::Premium {
                bvid: episode.bvid.clone(),
                cid: episode.cid,
                episode_id: episode.id,
            },
        })
    }

    // ---- live & round-play ----

    async fn resolve_live(
        &self,
        identifier: &str,
        room_id: &str,
        timestamp_ms: Option<i64>,
    ) -> Result<ResolvedContent> {
        let room: wire::RoomInit = self.get(&self.endpoints.room_init_url(room_id)).await?;

        // Fail fast before any further fetch is attempted.
        if room.live_status == 0 {
            return Err(ResolveError::NotStarted("live is not started".to_string()));
        }

        let status_map: wire::RoomStatusMap =
            self.get(&self.endpoints.room_status_url(room.uid)).await?;
        let status = status_map
            .get(&room.uid.to_string())
            .cloned()
            .unwrap_or_default();

        match room.live_status {
            1 => self.resolve_live_broadcast(identifier, room_id, &room, &status).await,
            2 => {
                self.resolve_round_play(identifier, &room, &status, timestamp_ms)
                    .await
            }
            other => Err(ResolveError::Unavailable(format!(
                "unknown live status {other} for room {room_id}"
            ))),
        }
    }

    async fn resolve_live_broadcast(
        &self,
        identifier: &str,
        room_id: &str,
        room: &wire::RoomInit,
        status: &wire::RoomStatus,
    ) -> Result<ResolvedContent> {
        let play: wire::LivePlayInfo = self.get(&self.endpoints.live_play_url(room_id)).await?;
        let hls_url = play
            .durl
            .first()
            .map(|d| d.url.clone())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ResolveError::Unavailable(format!(
                    "live playback document for room {room_id} carries no URL"
                ))
            })?;

        let variant = StreamVariant {
            id: format!("bilibili-{}-live", room.uid),
            url: hls_url.clone(),
            container: MediaContainer::MpegTs,
            video_only: false,
            label: "720P".to_string(),
            bitrate: None,
            delivery: DeliveryMethod::Hls,
        };

        Ok(ResolvedContent {
            descriptor: live_descriptor(identifier, ContentMode::Live, status),
            variants: VariantSet::new(Vec::new(), Vec::new(), vec![variant]),
            captions: Vec::new(),
            related: Vec::new(),
            details: ModeDetails::Live {
                room_id: room.room_id,
                hls_url,
                started_at: room.live_time,
            },
        })
    }

    async fn resolve_round_play(
        &self,
        identifier: &str,
        room: &wire::RoomInit,
        status: &wire::RoomStatus,
        timestamp_ms: Option<i64>,
    ) -> Result<ResolvedContent> {
        let ts = timestamp_ms.unwrap_or_else(|| Utc::now().timestamp_millis());
        let round: wire::RoundPlayInfo = self
            .get(&self.endpoints.round_play_url(room.room_id, ts))
            .await?;

        let play: wire::PlayInfo = self
            .get(&self.endpoints.free_manifest_url(round.cid, &round.bvid))
            .await?;
        let variants = build_variant_set(&play, &format!("bilibili-{}", round.bvid), false)?;

        // Next round starts when the current one runs out.
        let round_duration = play.dash.as_ref().map_or(0, |d| d.duration);
        let next_timestamp = ts + round_duration * 1000;

        let mut descriptor = live_descriptor(identifier, ContentMode::RoundPlay, status);
        if !round.title.is_empty() {
            descriptor.title = round.title.clone();
        }

        Ok(ResolvedContent {
            descriptor,
            variants,
            captions: Vec::new(),
            related: Vec::new(),
            details: ModeDetails::RoundPlay {
                room_id: room.room_id,
                bvid: round.bvid.clone(),
                cid: round.cid,
                play_time: round.play_time,
                next_timestamp,
            },
        })
    }

    // ---- degraded enrichment ----

    /// Tag fetch is best-effort: failures shrink the tag list, never abort.
    async fn fetch_tags(&self, bvid: &str) -> Vec<String> {
        match self.get::<Vec<wire::TagItem>>(&self.endpoints.tags_url(bvid)).await {
            Ok(items) => items.into_iter().map(|t| t.tag_name).collect(),
            Err(e) => {
                warn!("tag fetch failed for {}: {}", bvid, e);
                Vec::new()
            }
        }
    }

    /// Related items for a standard video: the other parts, or the
    /// platform's recommendations for single-part videos.
    async fn standard_related(
        &self,
        bvid: &str,
        descriptor: &ContentDescriptor,
    ) -> Result<Vec<RelatedItem>> {
        let parts: Vec<wire::PartInfo> = self.get(&self.endpoints.pagelist_url(bvid)).await?;
        if parts.len() > 1 {
            return Ok(parts
                .iter()
                .map(|part| RelatedItem {
                    title: part.part.clone(),
                    url: format!("https://www.bilibili.com/video/{bvid}?p={}", part.page),
                    thumbnail: descriptor.thumbnail.clone(),
                    uploader: Some(descriptor.uploader.name.clone()),
                    duration_secs: Some(part.duration),
                    view_count: None,
                })
                .collect());
        }

        let archives: Vec<wire::Archive> = self.get(&self.endpoints.related_url(bvid)).await?;
        Ok(archives
            .into_iter()
            .map(|archive| RelatedItem {
                url: format!("https://www.bilibili.com/video/{}", archive.bvid),
                thumbnail: Some(to_https(&archive.pic)),
                uploader: Some(archive.owner.name),
                duration_secs: Some(archive.duration),
                view_count: Some(archive.stat.view),
                title: archive.title,
            })
            .collect())
    }

    /// Channel owner for a listing page, from the card document. `None`
    /// when the listing URL carries no `mid` or the card fetch fails.
    async fn listing_uploader(&self, listing_url: &str) -> Option<Uploader> {
        let mid = Url::parse(listing_url).ok().and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "mid")
                .map(|(_, v)| v.into_owned())
        })?;

        match self.get::<wire::CardDoc>(&self.endpoints.card_url(&mid)).await {
            Ok(doc) => Some(Uploader {
                name: doc.card.name,
                url: Some(format!("{CHANNEL_BASE_URL}{mid}")),
                avatar: Some(to_https(&doc.card.face)),
            }),
            Err(e) => {
                warn!("card fetch failed for mid {}: {}", mid, e);
                None
            }
        }
    }

    async fn transcode_track(&self, track: &CaptionTrack) -> Result<TranscodedCaption> {
        let raw = self.fetcher.fetch(&track.url).await?;
        Ok(TranscodedCaption {
            markup: transcode(&raw)?,
            language: track.language.clone(),
            auto_generated: track.auto_generated,
        })
    }
}

/// The one related item of a round-play room: the same room at the moment
/// the next round begins.
fn next_round_item(descriptor: &ContentDescriptor, next_timestamp: i64) -> RelatedItem {
    let base = descriptor
        .identifier
        .split('?')
        .next()
        .unwrap_or(&descriptor.identifier);
    RelatedItem {
        title: format!("{}的投稿视频轮播", descriptor.uploader.name),
        url: format!("{base}?timestamp={next_timestamp}"),
        thumbnail: descriptor.thumbnail.clone(),
        uploader: Some(descriptor.uploader.name.clone()),
        duration_secs: None,
        view_count: Some(descriptor.view_count),
    }
}

/// Shared descriptor fields of the two live-room modes.
fn live_descriptor(
    identifier: &str,
    mode: ContentMode,
    status: &wire::RoomStatus,
) -> ContentDescriptor {
    ContentDescriptor {
        identifier: identifier.to_string(),
        mode,
        title: status.title.clone(),
        uploader: Uploader {
            name: status.uname.clone(),
            url: Some(format!("{CHANNEL_BASE_URL}{}", status.uid)),
            avatar: Some(to_https(&status.face)),
        },
        thumbnail: Some(to_https(&status.cover_from_user)),
        description: None,
        duration_secs: LIVE_DURATION,
        published_at: None,
        paid: false,
        view_count: status.online,
        like_count: -1,
        tags: live_tags(status),
    }
}

/// Room tags come as two CSV strings on the status document.
fn live_tags(status: &wire::RoomStatus) -> Vec<String> {
    format!("{},{}", status.tag_name, status.tags)
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_tags_merge_both_csv_fields() {
        let status = wire::RoomStatus {
            tag_name: "电台,聊天".to_string(),
            tags: "唱歌".to_string(),
            ..Default::default()
        };
        assert_eq!(live_tags(&status), ["电台", "聊天", "唱歌"]);
    }

    #[test]
    fn live_tags_skip_empty_entries() {
        let status = wire::RoomStatus::default();
        assert!(live_tags(&status).is_empty());
    }

    #[test]
    fn next_round_item_replaces_the_timestamp_query() {
        let status = wire::RoomStatus {
            title: "room".to_string(),
            uname: "up".to_string(),
            ..Default::default()
        };
        let descriptor = live_descriptor(
            "https://live.bilibili.com/100?timestamp=1700000000000",
            ContentMode::RoundPlay,
            &status,
        );
        let item = next_round_item(&descriptor, 1_700_003_600_000);
        assert_eq!(
            item.url,
            "https://live.bilibili.com/100?timestamp=1700003600000"
        );
        assert_eq!(item.title, "up的投稿视频轮播");
        assert_eq!(item.uploader.as_deref(), Some("up"));
    }

    #[test]
    fn live_descriptor_marks_unbounded_duration() {
        let status = wire::RoomStatus {
            title: "room".to_string(),
            uname: "up".to_string(),
            uid: 42,
            online: 1000,
            ..Default::default()
        };
        let descriptor = live_descriptor("https://live.bilibili.com/1", ContentMode::Live, &status);
        assert_eq!(descriptor.duration_secs, LIVE_DURATION);
        assert_eq!(descriptor.published_at, None);
        assert_eq!(descriptor.view_count, 1000);
        assert_eq!(descriptor.like_count, -1);
        assert_eq!(
            descriptor.uploader.url.as_deref(),
            Some("https://space.bilibili.com/42")
        );
    }
}
