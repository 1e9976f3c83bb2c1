//! Core domain crate for lmbridge.
//!
//! Contains the pure domain model (chat messages, decoded content, status
//! and log types), the port traits that adapters implement (inference
//! runtime, log sink), and the service layer that orchestrates them (the
//! synchronous inference bridge). No HTTP, no media codecs, no process
//! management lives here.

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;
pub mod status;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, ContentPart, DecodedAudio, DecodedContent, DecodedImage, MediaUrl,
    MessageContent, SamplingParams, ROLE_ASSISTANT, ROLE_USER,
};
pub use ports::{
    EchoRuntime, InferenceEvent, InferenceRuntime, LogSink, NoopLogSink, RunHandle, RunRequest,
    RuntimeError,
};
pub use services::{BridgeError, COMPLETION_TIMEOUT, complete};
pub use settings::{DEFAULT_HOST, DEFAULT_PORT, ServerSettings, SettingsError};
pub use status::{LogLevel, ServerLog, ServiceState, ServiceStatus};
