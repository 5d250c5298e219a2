//! Timed-caption transcoding: raw BCC payload → cue list → TTML markup.
//!
//! The platform serves captions as a compact JSON payload (`body` array of
//! `{from, to, content}` cues, seconds as floats). Transcoding parses that
//! into an intermediate [`SubtitleCue`] model and serializes TTML with the
//! fixed styling the player expects: a center-aligned subtitle region and a
//! small high-contrast font. Stateless, one call per caption track.

use crate::error::{ResolveError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Deserialize;

/// Marker prefix on machine-generated caption language codes.
const AUTO_LANGUAGE_PREFIX: &str = "ai-";

#[derive(Debug, Deserialize)]
struct BccPayload {
    body: Option<Vec<BccCue>>,
}

#[derive(Debug, Deserialize)]
struct BccCue {
    #[serde(default)]
    from: f64,
    #[serde(default)]
    to: f64,
    #[serde(default)]
    content: String,
}

/// One parsed caption cue.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Strip the auto-generated marker prefix from a language code.
pub fn normalize_language(lan: &str) -> String {
    lan.strip_prefix(AUTO_LANGUAGE_PREFIX).unwrap_or(lan).to_string()
}

/// Parse a raw BCC payload into the cue list.
///
/// # Errors
///
/// [`ResolveError::SubtitleFormat`] when the payload is not JSON or lacks
/// the cue body.
pub fn parse_cues(raw: &str) -> Result<Vec<SubtitleCue>> {
    let payload: BccPayload = serde_json::from_str(raw)
        .map_err(|e| ResolveError::SubtitleFormat(format!("invalid caption payload: {e}")))?;
    let body = payload
        .body
        .ok_or_else(|| ResolveError::SubtitleFormat("caption payload has no cue body".to_string()))?;

    Ok(body
        .into_iter()
        .map(|cue| SubtitleCue {
            start_ms: seconds_to_ms(cue.from),
            end_ms: seconds_to_ms(cue.to),
            text: cue.content,
        })
        .collect())
}

/// Transcode one raw caption payload into TTML markup.
///
/// Cue count is preserved: one `<p>` element per input cue.
pub fn transcode(raw: &str) -> Result<String> {
    cues_to_ttml(&parse_cues(raw)?)
}

/// Serialize a cue list as TTML with the fixed style and layout blocks.
pub fn cues_to_ttml(cues: &[SubtitleCue]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut tt = BytesStart::new("tt");
    tt.push_attribute(("xmlns", "http://www.w3.org/ns/ttml"));
    tt.push_attribute(("xmlns:tts", "http://www.w3.org/ns/ttml#styling"));
    write_event(&mut writer, Event::Start(tt))?;

    write_event(&mut writer, Event::Start(BytesStart::new("head")))?;

    // Center-aligned subtitle region.
    write_event(&mut writer, Event::Start(BytesStart::new("styling")))?;
    let mut s1 = BytesStart::new("style");
    s1.push_attribute(("xml:id", "s1"));
    s1.push_attribute(("tts:textAlign", "center"));
    s1.push_attribute(("tts:extent", "90% 90%"));
    s1.push_attribute(("tts:origin", "5% 5%"));
    s1.push_attribute(("tts:displayAlign", "after"));
    write_event(&mut writer, Event::Empty(s1))?;

    // Fixed font sizing and contrast.
    let mut s2 = BytesStart::new("style");
    s2.push_attribute(("xml:id", "s2"));
    s2.push_attribute(("tts:fontSize", ".72c"));
    s2.push_attribute(("tts:backgroundColor", "black"));
    s2.push_attribute(("tts:color", "white"));
    write_event(&mut writer, Event::Empty(s2))?;
    write_event(&mut writer, Event::End(BytesEnd::new("styling")))?;

    write_event(&mut writer, Event::Start(BytesStart::new("layout")))?;
    let mut region = BytesStart::new("region");
    region.push_attribute(("xml:id", "r1"));
    region.push_attribute(("style", "s1"));
    write_event(&mut writer, Event::Empty(region))?;
    write_event(&mut writer, Event::End(BytesEnd::new("layout")))?;

    write_event(&mut writer, Event::End(BytesEnd::new("head")))?;

    let mut body = BytesStart::new("body");
    body.push_attribute(("region", "r1"));
    write_event(&mut writer, Event::Start(body))?;
    write_event(&mut writer, Event::Start(BytesStart::new("div")))?;

    for cue in cues {
        let mut p = BytesStart::new("p");
        p.push_attribute(("begin", format_timestamp(cue.start_ms).as_str()));
        p.push_attribute(("end", format_timestamp(cue.end_ms).as_str()));
        p.push_attribute(("style", "s2"));
        write_event(&mut writer, Event::Start(p))?;
        write_event(&mut writer, Event::Text(BytesText::new(&cue.text)))?;
        write_event(&mut writer, Event::End(BytesEnd::new("p")))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("div")))?;
    write_event(&mut writer, Event::End(BytesEnd::new("body")))?;
    write_event(&mut writer, Event::End(BytesEnd::new("tt")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| ResolveError::SubtitleFormat(format!("TTML is not UTF-8: {e}")))
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ResolveError::SubtitleFormat(format!("TTML write failed: {e}")))
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

/// `HH:MM:SS.mmm` clock time.
fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "font_size": 0.4,
        "body": [
            {"from": 0.0, "to": 2.5, "location": 2, "content": "第一句"},
            {"from": 2.5, "to": 4.0, "location": 2, "content": "second <line> & more"},
            {"from": 4.0, "to": 7.25, "location": 2, "content": "third"}
        ]
    }"#;

    #[test]
    fn parse_preserves_cue_count_and_timing() {
        let cues = parse_cues(SAMPLE).unwrap();
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 2500);
        assert_eq!(cues[2].end_ms, 7250);
        assert_eq!(cues[0].text, "第一句");
    }

    #[test]
    fn transcode_emits_one_paragraph_per_cue() {
        let ttml = transcode(SAMPLE).unwrap();
        assert_eq!(ttml.matches("<p ").count(), 3);
        assert!(ttml.contains("begin=\"00:00:02.500\""));
        assert!(ttml.contains("end=\"00:00:07.250\""));
    }

    #[test]
    fn transcode_injects_style_and_layout_blocks() {
        let ttml = transcode(SAMPLE).unwrap();
        assert!(ttml.contains("tts:textAlign=\"center\""));
        assert!(ttml.contains("tts:fontSize=\".72c\""));
        assert!(ttml.contains("<region xml:id=\"r1\" style=\"s1\"/>"));
        assert!(ttml.contains("<body region=\"r1\">"));
    }

    #[test]
    fn cue_text_is_escaped() {
        let ttml = transcode(SAMPLE).unwrap();
        assert!(ttml.contains("second &lt;line&gt; &amp; more"));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(
            transcode("not json"),
            Err(ResolveError::SubtitleFormat(_))
        ));
        assert!(matches!(
            transcode(r#"{"font_size": 0.4}"#),
            Err(ResolveError::SubtitleFormat(_))
        ));
    }

    #[test]
    fn empty_cue_body_yields_empty_document() {
        let ttml = transcode(r#"{"body": []}"#).unwrap();
        assert_eq!(ttml.matches("<p ").count(), 0);
        assert!(ttml.contains("<tt "));
    }

    #[test]
    fn language_normalization_strips_auto_prefix() {
        assert_eq!(normalize_language("ai-zh"), "zh");
        assert_eq!(normalize_language("zh-CN"), "zh-CN");
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(61_005), "00:01:01.005");
        assert_eq!(format_timestamp(3_600_000 + 123), "01:00:00.123");
    }
}
