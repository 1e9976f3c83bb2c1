//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from infrastructure. They
//! contain no implementation details and use only domain types.

mod inference_runtime;
mod log_sink;

pub use inference_runtime::{
    EchoRuntime, InferenceEvent, InferenceRuntime, RunHandle, RunRequest, RuntimeError,
};
pub use log_sink::{LogSink, NoopLogSink};
