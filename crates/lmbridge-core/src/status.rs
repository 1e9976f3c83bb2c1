//! Service status and operational log types.
//!
//! `ServiceStatus` is owned and mutated exclusively by the host supervisor;
//! observers receive read-only snapshots over a broadcast channel, never a
//! handle they could mutate.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Severity of an operational log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}

/// One entry in the operational log ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLog {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Entry severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Optional detail string (error text, request id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServerLog {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            level,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach a detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Listener lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        };
        write!(f, "{label}")
    }
}

/// Snapshot of the service, published to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Current lifecycle state.
    pub state: ServiceState,
    /// Whether the listener is accepting connections.
    pub running: bool,
    /// Whether a completion is currently in flight.
    pub busy: bool,
    /// Actual bound port (not the requested one).
    pub port: u16,
    /// Actual bound address.
    pub address: String,
    /// Completions admitted since start.
    pub requests_processed: u64,
    /// Seconds since the listener came up.
    pub uptime_seconds: u64,
    /// Snapshot of the operational log ring.
    pub logs: Vec<ServerLog>,
}

impl ServiceStatus {
    /// Status for a stopped service: counters zeroed, logs retained.
    #[must_use]
    pub fn stopped(logs: Vec<ServerLog>) -> Self {
        Self {
            state: ServiceState::Stopped,
            running: false,
            busy: false,
            port: 0,
            address: String::new(),
            requests_processed: 0,
            uptime_seconds: 0,
            logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_serializes_uppercase() {
        let entry = ServerLog::new(LogLevel::Warning, "port in use");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "WARNING");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn stopped_status_is_zeroed() {
        let status = ServiceStatus::stopped(vec![]);
        assert_eq!(status.state, ServiceState::Stopped);
        assert!(!status.running);
        assert_eq!(status.requests_processed, 0);
        assert_eq!(status.uptime_seconds, 0);
    }
}
