//! Multimodal content decoding for lmbridge.
//!
//! Turns a request's message content (string or ordered list of typed
//! parts) into normalized text/image/audio payloads, enforcing size and
//! count limits. Content-shape problems are caller errors: everything this
//! crate rejects maps to an invalid-request response, never a server error.

pub mod decoder;
pub mod error;
pub mod limits;

pub use decoder::decode_messages;
pub use error::{DecodeError, MediaKind};
pub use limits::DecodeLimits;
