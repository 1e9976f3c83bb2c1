//! The content decoder.
//!
//! Input is the last message with role "user". Policy by content shape:
//! plain strings become the sole text fragment (trimmed); part lists are
//! dispatched by their `type` tag. Recoverable problems (unknown schemes,
//! malformed payloads, oversized rasters, unknown part types) are logged
//! and skipped; explicit limit violations fail the whole request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use lmbridge_core::domain::{ChatMessage, ContentPart, DecodedAudio, DecodedContent, DecodedImage, MessageContent};
use lmbridge_core::ports::LogSink;
use lmbridge_core::status::{LogLevel, ServerLog};

use crate::error::{DecodeError, MediaKind};
use crate::limits::DecodeLimits;

/// Prefix for the bare-payload scheme, `base64://<payload>`.
const BASE64_SCHEME: &str = "base64://";

/// Decode the last user message of a request into normalized content.
///
/// # Errors
///
/// Returns `DecodeError` when the request violates a hard rule: no user
/// message, an empty parts list, a URL or payload over its size cap, more
/// images than allowed, or nothing usable left after decoding. Soft
/// problems are skipped with a warning instead.
pub fn decode_messages(
    messages: &[ChatMessage],
    limits: &DecodeLimits,
    log: &dyn LogSink,
) -> Result<DecodedContent, DecodeError> {
    let message = messages
        .iter()
        .rev()
        .find(|m| m.is_user())
        .ok_or(DecodeError::NoUserMessage)?;

    let mut content = DecodedContent::default();

    match &message.content {
        MessageContent::Text(text) => {
            content.text = text.trim().to_string();
        }
        MessageContent::Parts(parts) => {
            if parts.is_empty() {
                return Err(DecodeError::EmptyParts);
            }
            decode_parts(parts, limits, log, &mut content)?;
        }
    }

    if content.is_empty() {
        return Err(DecodeError::EmptyContent);
    }
    Ok(content)
}

fn decode_parts(
    parts: &[ContentPart],
    limits: &DecodeLimits,
    log: &dyn LogSink,
    content: &mut DecodedContent,
) -> Result<(), DecodeError> {
    let mut fragments: Vec<&str> = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text } => {
                if !text.trim().is_empty() {
                    fragments.push(text);
                }
            }
            ContentPart::ImageUrl { image_url } => {
                if let Some(image) = decode_image(image_url.url(), limits, log)? {
                    if content.images.len() >= limits.max_images {
                        return Err(DecodeError::TooManyImages {
                            limit: limits.max_images,
                        });
                    }
                    content.images.push(image);
                }
            }
            ContentPart::AudioUrl { audio_url } => {
                if let Some(audio) = decode_audio(audio_url.url(), limits, log)? {
                    if content.audio.is_some() {
                        debug!("multiple audio parts in message, keeping the last clip");
                    }
                    content.audio = Some(audio);
                }
            }
            ContentPart::Unknown(value) => {
                let tag = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("<missing>");
                skip(log, format!("skipping content part with unknown type '{tag}'"));
            }
        }
    }

    content.text = fragments.join("\n");
    Ok(())
}

/// Decode one image URL. `Ok(None)` means the part was skipped.
fn decode_image(
    url: &str,
    limits: &DecodeLimits,
    log: &dyn LogSink,
) -> Result<Option<DecodedImage>, DecodeError> {
    let Some(bytes) = decode_payload(url, MediaKind::Image, limits, log)? else {
        return Ok(None);
    };

    let (width, height) = match probe_dimensions(&bytes) {
        Ok(dims) => dims,
        Err(err) => {
            skip(log, format!("skipping undecodable image: {err}"));
            return Ok(None);
        }
    };

    if width > limits.max_image_dimension || height > limits.max_image_dimension {
        skip(
            log,
            format!(
                "skipping {width}x{height} image: exceeds {} pixel limit",
                limits.max_image_dimension
            ),
        );
        return Ok(None);
    }

    Ok(Some(DecodedImage {
        bytes,
        width,
        height,
    }))
}

/// Decode one audio URL. `Ok(None)` means the part was skipped.
fn decode_audio(
    url: &str,
    limits: &DecodeLimits,
    log: &dyn LogSink,
) -> Result<Option<DecodedAudio>, DecodeError> {
    let Some(bytes) = decode_payload(url, MediaKind::Audio, limits, log)? else {
        return Ok(None);
    };
    Ok(Some(DecodedAudio { bytes }))
}

/// Shared URL-to-bytes path: length cap, scheme extraction, base64 decode,
/// emptiness and payload-size checks.
fn decode_payload(
    url: &str,
    kind: MediaKind,
    limits: &DecodeLimits,
    log: &dyn LogSink,
) -> Result<Option<Vec<u8>>, DecodeError> {
    if url.len() > limits.max_url_chars {
        return Err(DecodeError::UrlTooLong {
            kind,
            limit: limits.max_url_chars,
        });
    }

    let Some(payload) = base64_payload(url) else {
        let scheme = url.split(':').next().unwrap_or("");
        skip(log, format!("skipping {kind} with unsupported URL scheme '{scheme}'"));
        return Ok(None);
    };

    let bytes = match STANDARD.decode(payload) {
        Ok(bytes) => bytes,
        Err(err) => {
            skip(log, format!("skipping {kind} with invalid base64 payload: {err}"));
            return Ok(None);
        }
    };

    if bytes.is_empty() {
        skip(log, format!("skipping {kind} with empty payload"));
        return Ok(None);
    }

    if bytes.len() > limits.max_payload_bytes {
        return Err(DecodeError::PayloadTooLarge {
            kind,
            limit: limits.max_payload_bytes,
        });
    }

    Ok(Some(bytes))
}

/// Extract the base64 payload from a supported media URL.
///
/// `data:<mime>;base64,<payload>` yields the substring after the first
/// comma; `base64://<payload>` yields everything after the prefix. Any
/// other scheme (or a `data:` URL with no comma) yields `None`.
fn base64_payload(url: &str) -> Option<&str> {
    if let Some(rest) = url.strip_prefix(BASE64_SCHEME) {
        return Some(rest);
    }
    if url.starts_with("data:") {
        return url.split_once(',').map(|(_, payload)| payload);
    }
    None
}

/// Probe raster dimensions without decoding pixel data.
fn probe_dimensions(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_dimensions()
}

/// Record a soft skip in both the tracing log and the operational ring.
fn skip(log: &dyn LogSink, message: String) {
    warn!("{message}");
    log.append(ServerLog::new(LogLevel::Warning, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmbridge_core::ports::NoopLogSink;
    use std::sync::Mutex;

    /// Valid 1x1 RGBA PNG.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGP4z8DwHwAFAAH/iZk9HQAAAABJRU5ErkJggg==";
    /// Valid 16x16 RGBA PNG.
    const PNG_16X16: &str = "iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAAGUlEQVR4nGP4z8DwnxLMMGrAqAGjBgwXAwAwxP4QHCfkAAAAAABJRU5ErkJggg==";

    #[derive(Default)]
    struct CapturingSink(Mutex<Vec<ServerLog>>);

    impl LogSink for CapturingSink {
        fn append(&self, entry: ServerLog) {
            self.0.lock().unwrap().push(entry);
        }
    }

    impl CapturingSink {
        fn warnings(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.level == LogLevel::Warning)
                .map(|e| e.message.clone())
                .collect()
        }
    }

    fn messages(json: &str) -> Vec<ChatMessage> {
        serde_json::from_str(json).unwrap()
    }

    fn decode(json: &str) -> Result<DecodedContent, DecodeError> {
        decode_messages(&messages(json), &DecodeLimits::default(), &NoopLogSink)
    }

    #[test]
    fn plain_string_becomes_trimmed_text() {
        let content = decode(r#"[{"role": "user", "content": "  Hello there \n"}]"#).unwrap();
        assert_eq!(content.text, "Hello there");
        assert!(content.images.is_empty());
        assert!(content.audio.is_none());
    }

    #[test]
    fn blank_plain_string_is_empty_content() {
        let result = decode(r#"[{"role": "user", "content": "   "}]"#);
        assert_eq!(result, Err(DecodeError::EmptyContent));
    }

    #[test]
    fn missing_user_message_is_rejected() {
        let result = decode(r#"[{"role": "assistant", "content": "hi"}]"#);
        assert_eq!(result, Err(DecodeError::NoUserMessage));
        assert_eq!(decode("[]"), Err(DecodeError::NoUserMessage));
    }

    #[test]
    fn last_user_message_wins() {
        let content = decode(
            r#"[
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "reply"},
                {"role": "user", "content": "second"}
            ]"#,
        )
        .unwrap();
        assert_eq!(content.text, "second");
    }

    #[test]
    fn empty_parts_list_is_rejected() {
        let result = decode(r#"[{"role": "user", "content": []}]"#);
        assert_eq!(result, Err(DecodeError::EmptyParts));
    }

    #[test]
    fn text_fragments_join_with_newline_in_order() {
        let content = decode(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "one"},
                {"type": "text", "text": "   "},
                {"type": "text", "text": "two"}
            ]}]"#,
        )
        .unwrap();
        assert_eq!(content.text, "one\ntwo");
    }

    #[test]
    fn data_and_base64_schemes_decode_identically() {
        let json = format!(
            r#"[{{"role": "user", "content": [
                {{"type": "image_url", "image_url": {{"url": "data:image/png;base64,{PNG_1X1}"}}}},
                {{"type": "image_url", "image_url": {{"url": "base64://{PNG_1X1}"}}}}
            ]}}]"#
        );
        let content = decode(&json).unwrap();
        assert_eq!(content.images.len(), 2);
        assert_eq!(content.images[0], content.images[1]);
        assert_eq!(content.images[0].width, 1);
        assert_eq!(content.images[0].height, 1);
    }

    #[test]
    fn unsupported_scheme_is_skipped_with_warning() {
        let sink = CapturingSink::default();
        let msgs = messages(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}}
            ]}]"#,
        );
        let content = decode_messages(&msgs, &DecodeLimits::default(), &sink).unwrap();
        assert_eq!(content.text, "look");
        assert!(content.images.is_empty());
        assert!(sink.warnings().iter().any(|w| w.contains("https")));
    }

    #[test]
    fn data_url_without_comma_is_skipped() {
        let sink = CapturingSink::default();
        let msgs = messages(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "x"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64"}}
            ]}]"#,
        );
        let content = decode_messages(&msgs, &DecodeLimits::default(), &sink).unwrap();
        assert!(content.images.is_empty());
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn invalid_base64_is_skipped() {
        let content = decode(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "x"},
                {"type": "image_url", "image_url": {"url": "base64://not!!valid"}}
            ]}]"#,
        )
        .unwrap();
        assert!(content.images.is_empty());
    }

    #[test]
    fn non_raster_payload_is_skipped() {
        // "aGVsbG8=" is "hello": decodes fine, is no image.
        let content = decode(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "x"},
                {"type": "image_url", "image_url": {"url": "base64://aGVsbG8="}}
            ]}]"#,
        )
        .unwrap();
        assert!(content.images.is_empty());
    }

    #[test]
    fn oversized_raster_is_skipped_not_fatal() {
        let limits = DecodeLimits {
            max_image_dimension: 8,
            ..DecodeLimits::default()
        };
        let sink = CapturingSink::default();
        let msgs = messages(&format!(
            r#"[{{"role": "user", "content": [
                {{"type": "text", "text": "x"}},
                {{"type": "image_url", "image_url": {{"url": "base64://{PNG_16X16}"}}}}
            ]}}]"#
        ));
        let content = decode_messages(&msgs, &limits, &sink).unwrap();
        assert!(content.images.is_empty());
        assert!(sink.warnings().iter().any(|w| w.contains("16x16")));
    }

    #[test]
    fn over_length_url_is_a_hard_failure() {
        let limits = DecodeLimits {
            max_url_chars: 32,
            ..DecodeLimits::default()
        };
        let msgs = messages(&format!(
            r#"[{{"role": "user", "content": [
                {{"type": "image_url", "image_url": {{"url": "base64://{PNG_1X1}"}}}}
            ]}}]"#
        ));
        let result = decode_messages(&msgs, &limits, &NoopLogSink);
        assert_eq!(
            result,
            Err(DecodeError::UrlTooLong {
                kind: MediaKind::Image,
                limit: 32
            })
        );
    }

    #[test]
    fn over_size_payload_is_a_hard_failure() {
        let limits = DecodeLimits {
            max_payload_bytes: 16,
            ..DecodeLimits::default()
        };
        let msgs = messages(&format!(
            r#"[{{"role": "user", "content": [
                {{"type": "audio_url", "audio_url": {{"url": "base64://{PNG_1X1}"}}}}
            ]}}]"#
        ));
        let result = decode_messages(&msgs, &limits, &NoopLogSink);
        assert_eq!(
            result,
            Err(DecodeError::PayloadTooLarge {
                kind: MediaKind::Audio,
                limit: 16
            })
        );
    }

    #[test]
    fn eleventh_image_is_a_hard_failure() {
        let part = format!(
            r#"{{"type": "image_url", "image_url": {{"url": "base64://{PNG_1X1}"}}}}"#
        );
        let parts = vec![part; 11].join(",");
        let result = decode(&format!(r#"[{{"role": "user", "content": [{parts}]}}]"#));
        assert_eq!(result, Err(DecodeError::TooManyImages { limit: 10 }));
    }

    #[test]
    fn ten_images_are_accepted() {
        let part = format!(
            r#"{{"type": "image_url", "image_url": {{"url": "base64://{PNG_1X1}"}}}}"#
        );
        let parts = vec![part; 10].join(",");
        let content = decode(&format!(r#"[{{"role": "user", "content": [{parts}]}}]"#)).unwrap();
        assert_eq!(content.images.len(), 10);
    }

    #[test]
    fn last_audio_clip_wins() {
        // "YQ==" is "a", "Yg==" is "b".
        let content = decode(
            r#"[{"role": "user", "content": [
                {"type": "audio_url", "audio_url": {"url": "base64://YQ=="}},
                {"type": "audio_url", "audio_url": {"url": "base64://Yg=="}}
            ]}]"#,
        )
        .unwrap();
        assert_eq!(content.audio.unwrap().bytes, b"b");
    }

    #[test]
    fn unknown_part_type_is_skipped_with_warning() {
        let sink = CapturingSink::default();
        let msgs = messages(
            r#"[{"role": "user", "content": [
                {"type": "text", "text": "x"},
                {"type": "video_url", "video_url": {"url": "base64://AA=="}}
            ]}]"#,
        );
        let content = decode_messages(&msgs, &DecodeLimits::default(), &sink).unwrap();
        assert_eq!(content.text, "x");
        assert!(sink.warnings().iter().any(|w| w.contains("video_url")));
    }

    #[test]
    fn media_only_message_is_not_empty() {
        let json = format!(
            r#"[{{"role": "user", "content": [
                {{"type": "image_url", "image_url": {{"url": "base64://{PNG_1X1}"}}}}
            ]}}]"#
        );
        let content = decode(&json).unwrap();
        assert!(content.text.is_empty());
        assert_eq!(content.images.len(), 1);
    }

    #[test]
    fn all_parts_skipped_is_empty_content() {
        let result = decode(
            r#"[{"role": "user", "content": [
                {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}}
            ]}]"#,
        );
        assert_eq!(result, Err(DecodeError::EmptyContent));
    }
}
