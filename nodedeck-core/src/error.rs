//! Error types for nodedeck operations

use thiserror::Error;

/// Cache layer errors. Never shown to the user: the cache is best-effort.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },

    #[error("Failed to encode payload: {reason}")]
    Encode { reason: String },

    #[error("Failed to decode payload: {reason}")]
    Decode { reason: String },

    #[error("Cache I/O error: {reason}")]
    Io { reason: String },
}

/// Errors from a remote device read or write.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Device unreachable: {reason}")]
    Transport { reason: String },

    #[error("Device returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Invalid response from device: {reason}")]
    Decode { reason: String },

    #[error("Request rejected: {reason}")]
    Rejected { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_status() {
        let err = FetchError::Status {
            code: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Device returned status 503: busy");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "cache.path".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid config value for cache.path: must not be empty"
        );
    }
}
