//! Shared constants
//!
//! Well-known configuration property keys and built-in handler-type names.
//! Centralized here so the factory, handlers, and embedders agree on the
//! exact strings.

/// Configuration property carrying an explicit instance name.
///
/// When absent, the factory derives a unique name from the implementation
/// id and a random suffix.
pub const INSTANCE_NAME_PROPERTY: &str = "instance.name";

/// Name of the built-in handler type that tracks service dependencies.
///
/// This handler type is implied whenever a configuration declares at least
/// one dependency; it never has to be listed explicitly.
pub const DEPENDENCIES_HANDLER: &str = "dependencies";
