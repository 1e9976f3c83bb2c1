//! Server settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. The host binary
//! builds these from CLI flags; embedders construct them directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default base port for the listener (first port in the retry range).
pub const DEFAULT_PORT: u16 = 8080;

/// Settings for one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to (e.g. "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Base port; bind conflicts retry sequentially from here.
    pub port: u16,
    /// The single model name this server advertises and accepts.
    pub model_name: String,
}

impl ServerSettings {
    /// Settings for a named model with default host and port.
    #[must_use]
    pub fn for_model(model_name: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_name: model_name.into(),
        }
    }
}

/// Settings validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("model name must not be blank")]
    BlankModelName,

    #[error("host must not be blank")]
    BlankHost,
}

impl ServerSettings {
    /// Validate settings before starting a server.
    ///
    /// Port 0 is allowed (OS-assigned, used by tests); a blank model name or
    /// host is not.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model_name.trim().is_empty() {
            return Err(SettingsError::BlankModelName);
        }
        if self.host.trim().is_empty() {
            return Err(SettingsError::BlankHost);
        }
        Ok(())
    }
}
