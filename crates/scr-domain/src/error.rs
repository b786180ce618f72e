//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Service Component Runtime
///
/// The first three variants are creation-time failures reported
/// synchronously by the factory; `CallbackFailure` is the only variant
/// raised after an instance is live, and it is always recovered locally
/// (logged and isolated per provider) rather than propagated to the
/// registry thread that triggered it.
#[derive(Error, Debug)]
pub enum Error {
    /// A declared handler type is unknown to the factory
    #[error("Missing handler: {handler}")]
    MissingHandler {
        /// Name of the handler type that could not be resolved
        handler: String,
    },

    /// A configuration value failed validation
    #[error("Unacceptable configuration: {message}")]
    UnacceptableConfiguration {
        /// Description of the rejected configuration value
        message: String,
    },

    /// Any other setup-time failure during instance creation
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the setup failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bind or unbind callback raised during normal operation
    #[error("Callback failure: {callback} for dependency '{dependency}': {message}")]
    CallbackFailure {
        /// Which callback failed ("bind" or "unbind")
        callback: String,
        /// Dependency the callback belongs to
        dependency: String,
        /// Description of the failure
        message: String,
    },
}

impl Error {
    /// Create a missing handler error
    pub fn missing_handler<S: Into<String>>(handler: S) -> Self {
        Self::MissingHandler {
            handler: handler.into(),
        }
    }

    /// Create an unacceptable configuration error
    pub fn unacceptable<S: Into<String>>(message: S) -> Self {
        Self::UnacceptableConfiguration {
            message: message.into(),
        }
    }

    /// Create a configuration error (no source)
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a bind callback failure
    pub fn bind_failure<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::CallbackFailure {
            callback: "bind".to_string(),
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    /// Create an unbind callback failure
    pub fn unbind_failure<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::CallbackFailure {
            callback: "unbind".to_string(),
            dependency: dependency.into(),
            message: message.into(),
        }
    }
}
