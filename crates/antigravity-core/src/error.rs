//! Error types for settings loading.

use thiserror::Error;

/// Startup configuration problems. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Bot token missing or left at the template placeholder.
    #[error("TELEGRAM_BOT_TOKEN is not set. Copy .env.example to .env and add your token.")]
    MissingToken,

    /// A credential required by the selected backend is missing.
    #[error("{var} is not set. Add it to your .env file.")]
    MissingCredential {
        /// Environment variable that should hold the credential.
        var: &'static str,
    },

    /// A variable holds a value that cannot be used.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingCredential {
            var: "GEMINI_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "GEMINI_API_KEY is not set. Add it to your .env file."
        );

        let err = ConfigError::InvalidValue {
            var: "BOT_MODE",
            value: "loud".into(),
            reason: "expected echo, assistant or bridge".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for BOT_MODE: \"loud\" (expected echo, assistant or bridge)"
        );
    }
}
