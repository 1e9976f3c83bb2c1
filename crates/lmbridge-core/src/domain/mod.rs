//! Domain types for chat content and inference parameters.
//!
//! These types represent chat messages and their decoded media payloads in
//! the domain model, independent of any infrastructure concerns.

mod chat;

pub use chat::{
    ChatMessage, ContentPart, DecodedAudio, DecodedContent, DecodedImage, MediaUrl,
    MessageContent, SamplingParams, ROLE_ASSISTANT, ROLE_USER,
};
