//! OpenAI-compatible HTTP adapter for lmbridge.
//!
//! Exposes `GET /health`, `GET /v1/models` and `POST /v1/chat/completions`
//! over axum. The chat pipeline composes the admission gate, the content
//! decoder and the inference bridge, and formats protocol-compliant
//! success and error bodies. Streaming responses are not supported: one
//! complete response per request.

pub mod admission;
pub mod api;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod usage;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use error::ApiError;
pub use routes::{build_router, serve};
pub use state::{RuntimeSlot, ServerContext, SharedState};
