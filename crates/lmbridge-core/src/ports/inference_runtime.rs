//! Inference runtime port.
//!
//! This port abstracts the underlying model engine: load state, prompt
//! execution and incremental text deltas. The engine is a black box to the
//! rest of the system; its only obligations are to emit deltas in generation
//! order and to finish every run with exactly one terminal event.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{DecodedAudio, DecodedImage, SamplingParams};

/// One submission to the inference runtime.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Prompt text (already normalized by the content decoder).
    pub prompt: String,
    /// Decoded images, in message order.
    pub images: Vec<DecodedImage>,
    /// Optional decoded audio clip.
    pub audio: Option<DecodedAudio>,
    /// Sampling parameters from the request.
    pub params: SamplingParams,
}

/// Incremental output of a running inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceEvent {
    /// One text delta, to be concatenated in arrival order.
    Delta(String),
    /// Generation finished normally.
    Done,
    /// Generation failed; carries the runtime's message.
    Error(String),
}

/// Receiving end of a single run's event stream.
#[derive(Debug)]
pub struct RunHandle {
    events: mpsc::Receiver<InferenceEvent>,
}

impl RunHandle {
    /// Wrap an event receiver produced by a runtime implementation.
    #[must_use]
    pub fn new(events: mpsc::Receiver<InferenceEvent>) -> Self {
        Self { events }
    }

    /// Await the next event. `None` means the runtime dropped the stream
    /// without a terminal event, which callers treat as a failure.
    pub async fn next_event(&mut self) -> Option<InferenceEvent> {
        self.events.recv().await
    }
}

/// Errors raised when submitting a run to the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine exists but cannot accept work right now.
    #[error("inference runtime is not ready: {0}")]
    NotReady(String),

    /// Internal engine failure during submission.
    #[error("inference runtime failure: {0}")]
    Internal(String),
}

/// Port for the external inference engine.
///
/// Implementations wrap a concrete model runtime (process, FFI library,
/// remote endpoint). `run` submits a prompt with its media and returns a
/// handle streaming [`InferenceEvent`]s; the caller owns the wait policy.
#[async_trait]
pub trait InferenceRuntime: Send + Sync + fmt::Debug {
    /// Submit a prompt and return the event stream for this run.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError` if the run could not be started at all;
    /// failures after submission arrive as [`InferenceEvent::Error`].
    async fn run(&self, request: RunRequest) -> Result<RunHandle, RuntimeError>;
}

/// Deterministic runtime that echoes the prompt back, one whitespace token
/// per delta, then signals completion.
///
/// Used by the CLI `--echo` smoke-test flag and by test suites that need a
/// predictable engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRuntime;

#[async_trait]
impl InferenceRuntime for EchoRuntime {
    async fn run(&self, request: RunRequest) -> Result<RunHandle, RuntimeError> {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut first = true;
            for token in request.prompt.split_whitespace() {
                let delta = if first {
                    token.to_string()
                } else {
                    format!(" {token}")
                };
                first = false;
                if tx.send(InferenceEvent::Delta(delta)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(InferenceEvent::Done).await;
        });
        Ok(RunHandle::new(rx))
    }
}
