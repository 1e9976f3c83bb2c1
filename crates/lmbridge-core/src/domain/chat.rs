//! Chat message and content types.
//!
//! The OpenAI wire format allows message content to be either a plain string
//! or an ordered list of typed parts. That duck-typed union is modeled here
//! as an explicit tagged variant ([`MessageContent`]) decoded via a
//! discriminated parse, never by runtime type inspection.

use serde::{Deserialize, Serialize};

/// Role string for user messages.
pub const ROLE_USER: &str = "user";

/// Role string for assistant messages.
pub const ROLE_ASSISTANT: &str = "assistant";

/// A single chat message as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user" or "assistant".
    pub role: String,
    /// Message content: plain string or ordered list of typed parts.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Whether this message was sent by the user role.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == ROLE_USER
    }
}

/// Message content: a plain string or an ordered list of content parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multimodal content parts, dispatched by their `type` tag.
    Parts(Vec<ContentPart>),
}

/// One typed fragment of a multimodal message.
///
/// Unknown `type` tags deserialize into [`ContentPart::Unknown`] so a single
/// unrecognized part never rejects the whole request; the decoder warns and
/// skips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text fragment.
    Text {
        /// The text value.
        text: String,
    },
    /// Inline image, base64-encoded behind a media URL.
    ImageUrl {
        /// The image URL payload.
        image_url: MediaUrl,
    },
    /// Inline audio clip, base64-encoded behind a media URL.
    AudioUrl {
        /// The audio URL payload.
        audio_url: MediaUrl,
    },
    /// Any part with an unrecognized `type` tag.
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

/// A media URL carrying inline base64 data.
///
/// Clients send either the OpenAI object form `{"url": "..."}` or the bare
/// string; both carry a `data:<mime>;base64,<payload>` or
/// `base64://<payload>` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaUrl {
    /// Object form: `{"url": "data:..."}`.
    Detailed {
        /// The URL string.
        url: String,
    },
    /// Bare string form.
    Plain(String),
}

impl MediaUrl {
    /// The underlying URL string, whichever form it arrived in.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Detailed { url } | Self::Plain(url) => url,
        }
    }
}

/// Sampling parameters forwarded to the inference runtime.
///
/// All fields are optional; the runtime applies its own defaults for any
/// field left unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold.
    pub top_p: Option<f32>,
    /// Top-k sampling cutoff.
    pub top_k: Option<u32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

/// A decoded raster image extracted from a message.
///
/// `bytes` is the base64-decoded payload exactly as it arrived; the raster
/// was probed only for validity and dimensions. How the runtime turns it
/// into model inputs is outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Decoded payload bytes.
    pub bytes: Vec<u8>,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

/// A decoded audio clip extracted from a message.
///
/// Audio is opaque to lmbridge: bytes pass through to the runtime untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Decoded payload bytes.
    pub bytes: Vec<u8>,
}

/// Normalized result of decoding one user message.
///
/// Invariant: never all-empty when returned successfully from the decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedContent {
    /// Text fragments joined with newlines, in arrival order.
    pub text: String,
    /// Decoded images, in arrival order.
    pub images: Vec<DecodedImage>,
    /// At most one audio clip (last one parsed wins).
    pub audio: Option<DecodedAudio>,
}

impl DecodedContent {
    /// Whether the decode produced nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.images.is_empty() && self.audio.is_none()
    }
}
