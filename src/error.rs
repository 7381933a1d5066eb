//! Unified error types for tally with fail-open philosophy.
//!
//! No failure in this crate is allowed to disturb the host process: a push
//! that fails means "statistic not recorded", a hook that fails to enable
//! means "integration unavailable". Errors are logged as warnings and the
//! caller continues with a safe default rather than propagating a failure
//! that would block gameplay.

use thiserror::Error;

/// The main error type for tally operations.
#[derive(Error, Debug)]
pub enum TallyError {
    /// Persistent store operation failed (select/update/insert).
    #[error("store error on {table}: {message}")]
    Store { table: String, message: String },

    /// Schema patch lookup or application failed.
    #[error("patch error for {extension}: {message}")]
    Patch { extension: String, message: String },

    /// Hook instantiation or enable failed.
    #[error("hook error for {module}: {message}")]
    Hook { module: String, message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// JSON/TOML parsing or serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },
}

/// A specialized Result type for tally operations.
pub type Result<T> = std::result::Result<T, TallyError>;

impl TallyError {
    /// Create a store error.
    pub fn store(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a patch error.
    pub fn patch(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Patch {
            extension: extension.into(),
            message: message.into(),
        }
    }

    /// Create a hook error.
    pub fn hook(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and return a safe default instead of propagating it.
/// Used at every boundary where a failure must degrade to "statistic not
/// recorded" rather than surface to the host.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = TallyError::store("total_pvp_kills", "connection reset");
        assert!(err.to_string().contains("store error"));
        assert!(err.to_string().contains("total_pvp_kills"));
    }

    #[test]
    fn test_patch_error_display() {
        let err = TallyError::patch("mcmmo", "table already exists");
        assert_eq!(
            err.to_string(),
            "patch error for mcmmo: table already exists"
        );
    }

    #[test]
    fn test_hook_error_display() {
        let err = TallyError::hook("vault", "no provider registered");
        assert_eq!(
            err.to_string(),
            "hook error for vault: no provider registered"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = TallyError::config("invalid TOML");
        assert_eq!(err.to_string(), "config error: invalid TOML");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let tally_err: TallyError = json_err.into();
        assert!(matches!(tally_err, TallyError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(TallyError::store("t", "boom"));
        let value = result.fail_open_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<bool> = Err(TallyError::store("t", "boom"));
        assert!(!result.fail_open_with("test context", false));
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<i32> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }
}
