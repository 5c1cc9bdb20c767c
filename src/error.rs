//! Error types for service dispatch and registry loading.
//!
//! Call faults are represented as a closed enum that travels inside the
//! call outcome, so report rendering can switch on the kind instead of
//! probing message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fault that prevented one service call from producing a response.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchError {
    /// The registry has no service under the requested id.
    #[error("service not configured: {0}")]
    UnknownService(String),

    /// The service exists but is switched off in the registry.
    #[error("service not enabled: {0}")]
    ServiceDisabled(String),

    /// The service carries an empty credential.
    #[error("no API key configured for service: {0}")]
    MissingCredential(String),

    /// The requested model is not in the service's catalog.
    #[error("model not configured for {service}: {model}")]
    UnknownModel {
        /// Service id the lookup ran against.
        service: String,
        /// Model name that was requested.
        model: String,
    },

    /// The call exceeded the per-target time bound.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// The configured bound in whole seconds.
        seconds: u64,
    },

    /// Connection, body read, or decode fault below the HTTP status layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-200 status.
    #[error("HTTP {status}: {body}")]
    Remote {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body text, unparsed.
        body: String,
    },
}

impl DispatchError {
    /// True for faults detected before any network activity.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownService(_)
                | DispatchError::ServiceDisabled(_)
                | DispatchError::MissingCredential(_)
                | DispatchError::UnknownModel { .. }
        )
    }
}

/// A fault while loading or validating the service registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    /// The registry content is not valid JSON for the expected shape.
    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),

    /// The registry parsed but an entry breaks a structural rule.
    #[error("invalid registry entry for service '{service}': {reason}")]
    Invalid {
        /// Service id of the offending entry.
        service: String,
        /// What rule the entry breaks.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        let error = DispatchError::UnknownService("zhipu".to_string());
        assert_eq!(error.to_string(), "service not configured: zhipu");

        let error = DispatchError::MissingCredential("openai".to_string());
        assert!(error.to_string().contains("API key"));

        let error = DispatchError::Timeout { seconds: 30 };
        assert!(error.to_string().contains("timed out"));
        assert!(error.to_string().contains("30"));

        let error = DispatchError::Remote {
            status: 429,
            body: "rate limit exceeded".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 429: rate limit exceeded");

        let error = DispatchError::UnknownModel {
            service: "silicon".to_string(),
            model: "qwen-72b".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "model not configured for silicon: qwen-72b"
        );
    }

    #[test]
    fn test_validation_errors_are_flagged() {
        assert!(DispatchError::UnknownService("x".to_string()).is_validation());
        assert!(DispatchError::ServiceDisabled("x".to_string()).is_validation());
        assert!(DispatchError::MissingCredential("x".to_string()).is_validation());
        assert!(DispatchError::UnknownModel {
            service: "x".to_string(),
            model: "y".to_string(),
        }
        .is_validation());

        assert!(!DispatchError::Timeout { seconds: 30 }.is_validation());
        assert!(!DispatchError::Transport("boom".to_string()).is_validation());
        assert!(!DispatchError::Remote {
            status: 500,
            body: String::new(),
        }
        .is_validation());
    }

    #[test]
    fn test_registry_error_display() {
        let error = RegistryError::Invalid {
            service: "zhipu".to_string(),
            reason: "api_base must start with http:// or https://".to_string(),
        };
        assert!(error.to_string().contains("zhipu"));
        assert!(error.to_string().contains("api_base"));
    }

    #[test]
    fn test_dispatch_error_round_trips_through_json() {
        let error = DispatchError::Remote {
            status: 503,
            body: "unavailable".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        let back: DispatchError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<DispatchError>();
        assert_sync::<DispatchError>();
        assert_send::<RegistryError>();
        assert_sync::<RegistryError>();
    }
}
