//! Platform endpoint bases and URL builders.
//!
//! The resolution pipeline never hardcodes hosts; everything goes through an
//! [`Endpoints`] value so integration tests can point the whole engine at a
//! mock server. `Default` targets the production hosts.

/// Fixed stream-quality request parameters (DASH, 720p cap for guests).
const PLAYURL_PARAMS: &str = "fnval=16&qn=64";

/// Base URLs for the two platform API hosts.
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// Main API host (`https://api.bilibili.com`).
    pub api_base: String,
    /// Live API host (`https://api.live.bilibili.com`).
    pub live_api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.bilibili.com".to_string(),
            live_api_base: "https://api.live.bilibili.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point both API bases at one host. Used by tests against a mock server.
    pub fn with_base(base: &str) -> Self {
        let trimmed = base.trim_end_matches('/');
        Self {
            api_base: trimmed.to_string(),
            live_api_base: trimmed.to_string(),
        }
    }

    /// Watch document for a standard video.
    pub fn watch_url(&self, bvid: &str) -> String {
        format!("{}/x/web-interface/view?bvid={}", self.api_base, bvid)
    }

    /// Manifest for free content.
    pub fn free_manifest_url(&self, cid: i64, bvid: &str) -> String {
        format!(
            "{}/x/player/playurl?cid={}&bvid={}&{}",
            self.api_base, cid, bvid, PLAYURL_PARAMS
        )
    }

    /// Manifest for premium (bangumi) content.
    pub fn premium_manifest_url(&self, cid: i64, bvid: &str) -> String {
        format!(
            "{}/pgc/player/web/playurl?cid={}&bvid={}&{}",
            self.api_base, cid, bvid, PLAYURL_PARAMS
        )
    }

    /// Season/episode document for premium content.
    ///
    /// `season` selects the `season_id` query form; otherwise `ep_id`.
    pub fn season_url(&self, id: &str, season: bool) -> String {
        let key = if season { "season_id" } else { "ep_id" };
        format!("{}/pgc/view/web/season?{}={}", self.api_base, key, id)
    }

    /// Live room basics: uid, room id, live status, start time.
    pub fn room_init_url(&self, room_id: &str) -> String {
        format!("{}/room/v1/Room/room_init?id={}", self.live_api_base, room_id)
    }

    /// Live room presentation metadata, keyed by uploader uid.
    pub fn room_status_url(&self, uid: i64) -> String {
        format!(
            "{}/room/v1/Room/get_status_info_by_uids?uids[]={}",
            self.live_api_base, uid
        )
    }

    /// Current round of a looping (round-play) room at the given timestamp.
    pub fn round_play_url(&self, room_id: i64, timestamp_ms: i64) -> String {
        format!(
            "{}/live/getRoundPlayVideo?room_id={}&a={}&type=flv",
            self.live_api_base, room_id, timestamp_ms
        )
    }

    /// Playback-URL document for an active live broadcast.
    pub fn live_play_url(&self, room_id: &str) -> String {
        format!(
            "{}/room/v1/Room/playUrl?qn=10000&platform=h5&cid={}",
            self.live_api_base, room_id
        )
    }

    /// Tag list for a video.
    pub fn tags_url(&self, bvid: &str) -> String {
        format!("{}/x/tag/archive/tags?bvid={}", self.api_base, bvid)
    }

    /// Part list of a video.
    pub fn pagelist_url(&self, bvid: &str) -> String {
        format!("{}/x/player/pagelist?bvid={}", self.api_base, bvid)
    }

    /// Recommendations next to a video.
    pub fn related_url(&self, bvid: &str) -> String {
        format!("{}/x/web-interface/archive/related?bvid={}", self.api_base, bvid)
    }

    /// Channel owner's card document.
    pub fn card_url(&self, mid: &str) -> String {
        format!("{}/x/web-interface/card?photo=true&mid={}", self.api_base, mid)
    }
}

/// Upgrade a scheme-relative or plain-http thumbnail URL to https.
pub fn to_https(url: &str) -> String {
    url.replacen("http:", "https:", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bases_are_production_hosts() {
        let ep = Endpoints::default();
        assert_eq!(ep.api_base, "https://api.bilibili.com");
        assert_eq!(ep.live_api_base, "https://api.live.bilibili.com");
    }

    #[test]
    fn with_base_trims_trailing_slash() {
        let ep = Endpoints::with_base("http://127.0.0.1:3000/");
        assert_eq!(ep.api_base, "http://127.0.0.1:3000");
    }

    #[test]
    fn manifest_urls_carry_fixed_params() {
        let ep = Endpoints::default();
        assert_eq!(
            ep.free_manifest_url(1176840, "BV1xx411c7mD"),
            "https://api.bilibili.com/x/player/playurl?cid=1176840&bvid=BV1xx411c7mD&fnval=16&qn=64"
        );
        assert!(ep.premium_manifest_url(1, "BV1").contains("/pgc/player/web/playurl?"));
    }

    #[test]
    fn season_url_selects_query_key() {
        let ep = Endpoints::default();
        assert!(ep.season_url("33802", true).ends_with("season_id=33802"));
        assert!(ep.season_url("249470", false).ends_with("ep_id=249470"));
    }

    #[test]
    fn enrichment_urls() {
        let ep = Endpoints::default();
        assert_eq!(
            ep.pagelist_url("BV1xx411c7mD"),
            "https://api.bilibili.com/x/player/pagelist?bvid=BV1xx411c7mD"
        );
        assert!(ep.related_url("BV1").contains("/x/web-interface/archive/related?"));
        assert_eq!(
            ep.card_url("123"),
            "https://api.bilibili.com/x/web-interface/card?photo=true&mid=123"
        );
    }

    #[test]
    fn https_upgrade() {
        assert_eq!(
            to_https("http://i0.hdslb.com/bfs/archive/x.jpg"),
            "https://i0.hdslb.com/bfs/archive/x.jpg"
        );
        assert_eq!(to_https("https://already.example/x"), "https://already.example/x");
    }
}
