//! Decoder error types.

use thiserror::Error;

/// Which media kind a limit violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Hard decoding failures.
///
/// Every variant is a caller error: the router maps these to
/// `invalid_request`/400 and they never reach the inference bridge.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No message with role "user" in the request.
    #[error("request contains no user message")]
    NoUserMessage,

    /// The content parts list was present but empty.
    #[error("message content parts must not be empty")]
    EmptyParts,

    /// Nothing usable after decoding: no text, no image, no audio.
    #[error("empty content: message contains no text, images or audio")]
    EmptyContent,

    /// A media URL exceeded the character-length cap.
    #[error("{kind} URL exceeds the maximum length of {limit} characters")]
    UrlTooLong { kind: MediaKind, limit: usize },

    /// A decoded payload exceeded the byte-size cap.
    #[error("decoded {kind} payload exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { kind: MediaKind, limit: usize },

    /// The request accumulated more images than allowed.
    #[error("too many images: at most {limit} are allowed per request")]
    TooManyImages { limit: usize },
}
