//! Synchronous bridge over the streaming inference runtime.
//!
//! The runtime emits incremental text deltas through a channel; callers of
//! this module want one complete string. `complete` submits a run and awaits
//! the stream until a terminal event or the timeout, whichever comes first.
//! The wait is a plain future await on the channel, bounded by a single
//! deadline covering the whole run.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::ports::{InferenceEvent, InferenceRuntime, RunRequest, RuntimeError};

/// Upper bound on one completion, submission to terminal event.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(300);

/// Failures of a bridged completion.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The runtime reported a generation failure.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Neither completion nor error arrived within the bound.
    #[error("inference timed out after {} seconds", COMPLETION_TIMEOUT.as_secs())]
    Timeout,

    /// The run could not be submitted.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Run one completion to the end and return the concatenated text.
///
/// Deltas are concatenated in arrival order. Outcomes:
/// completion signal returns the accumulated text; an error signal fails
/// with the runtime's message; silence past [`COMPLETION_TIMEOUT`] fails
/// with [`BridgeError::Timeout`]. A stream dropped without a terminal event
/// counts as an inference error.
///
/// There is no cancellation path: once submitted, the run proceeds on the
/// runtime's side regardless of what happens to the caller.
pub async fn complete(
    runtime: &dyn InferenceRuntime,
    request: RunRequest,
) -> Result<String, BridgeError> {
    let deadline = Instant::now() + COMPLETION_TIMEOUT;
    let mut handle = runtime.run(request).await?;

    let mut completion = String::new();
    let mut deltas = 0usize;
    loop {
        let event = tokio::time::timeout_at(deadline, handle.next_event())
            .await
            .map_err(|_| BridgeError::Timeout)?;

        match event {
            Some(InferenceEvent::Delta(delta)) => {
                deltas += 1;
                completion.push_str(&delta);
            }
            Some(InferenceEvent::Done) => {
                debug!(deltas, chars = completion.len(), "completion finished");
                return Ok(completion);
            }
            Some(InferenceEvent::Error(message)) => {
                return Err(BridgeError::Inference(message));
            }
            None => {
                return Err(BridgeError::Inference(
                    "runtime closed the event stream without completing".to_string(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplingParams;
    use crate::ports::{EchoRuntime, RunHandle};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    fn request(prompt: &str) -> RunRequest {
        RunRequest {
            prompt: prompt.to_string(),
            images: vec![],
            audio: None,
            params: SamplingParams::default(),
        }
    }

    /// Runtime that emits a scripted event sequence.
    #[derive(Debug)]
    struct ScriptedRuntime {
        events: Vec<InferenceEvent>,
    }

    #[async_trait]
    impl InferenceRuntime for ScriptedRuntime {
        async fn run(&self, _request: RunRequest) -> Result<RunHandle, RuntimeError> {
            let (tx, rx) = mpsc::channel(16);
            let events = self.events.clone();
            tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            });
            Ok(RunHandle::new(rx))
        }
    }

    /// Runtime that accepts the run but never signals anything.
    #[derive(Debug)]
    struct SilentRuntime;

    #[async_trait]
    impl InferenceRuntime for SilentRuntime {
        async fn run(&self, _request: RunRequest) -> Result<RunHandle, RuntimeError> {
            let (tx, rx) = mpsc::channel(1);
            // Keep the sender alive forever so the stream never closes.
            tokio::spawn(async move {
                let _tx = tx;
                std::future::pending::<()>().await;
            });
            Ok(RunHandle::new(rx))
        }
    }

    #[tokio::test]
    async fn echo_round_trip() {
        let text = complete(&EchoRuntime, request("one two three")).await.unwrap();
        assert_eq!(text, "one two three");
    }

    #[tokio::test]
    async fn deltas_concatenate_in_arrival_order() {
        let runtime = ScriptedRuntime {
            events: vec![
                InferenceEvent::Delta("a".to_string()),
                InferenceEvent::Delta("b".to_string()),
                InferenceEvent::Delta("c".to_string()),
                InferenceEvent::Done,
            ],
        };
        let text = complete(&runtime, request("x")).await.unwrap();
        assert_eq!(text, "abc");
    }

    #[tokio::test]
    async fn error_signal_carries_runtime_message() {
        let runtime = ScriptedRuntime {
            events: vec![
                InferenceEvent::Delta("partial".to_string()),
                InferenceEvent::Error("out of memory".to_string()),
            ],
        };
        match complete(&runtime, request("x")).await {
            Err(BridgeError::Inference(msg)) => assert_eq!(msg, "out of memory"),
            other => panic!("expected inference error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_stream_is_an_inference_error() {
        let runtime = ScriptedRuntime {
            events: vec![InferenceEvent::Delta("hi".to_string())],
        };
        assert!(matches!(
            complete(&runtime, request("x")).await,
            Err(BridgeError::Inference(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_runtime_times_out_at_the_bound() {
        let started = Instant::now();
        let result = complete(&SilentRuntime, request("x")).await;
        assert!(matches!(result, Err(BridgeError::Timeout)));
        // Paused time auto-advances straight to the deadline, so the
        // observed wait is exactly the configured bound.
        assert_eq!(started.elapsed(), COMPLETION_TIMEOUT);
    }
}
