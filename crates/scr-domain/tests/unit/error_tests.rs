//! Unit tests for domain error types

use scr_domain::Error;

#[test]
fn test_missing_handler_error() {
    let error = Error::missing_handler("whiteboard");
    match error {
        Error::MissingHandler { handler } => assert_eq!(handler, "whiteboard"),
        _ => panic!("Expected MissingHandler error"),
    }
}

#[test]
fn test_unacceptable_configuration_error() {
    let error = Error::unacceptable("property 'port' is not accepted");
    match error {
        Error::UnacceptableConfiguration { message } => {
            assert_eq!(message, "property 'port' is not accepted");
        }
        _ => panic!("Expected UnacceptableConfiguration error"),
    }
}

#[test]
fn test_configuration_error_display() {
    let error = Error::configuration("component constructor failed");
    let display = format!("{}", error);
    assert!(display.contains("Configuration error"));
    assert!(display.contains("component constructor failed"));
}

#[test]
fn test_configuration_error_with_source() {
    let source = std::io::Error::other("boom");
    let error = Error::configuration_with_source("initial bind failed", source);
    match &error {
        Error::Configuration { source, .. } => assert!(source.is_some()),
        _ => panic!("Expected Configuration error"),
    }
    // Source is reachable through the error chain
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_callback_failure_display() {
    let error = Error::bind_failure("users", "target refused the provider");
    let display = format!("{}", error);
    assert!(display.contains("bind"));
    assert!(display.contains("users"));
    assert!(display.contains("target refused the provider"));
}

#[test]
fn test_unbind_failure_names_the_callback() {
    let error = Error::unbind_failure("users", "boom");
    match error {
        Error::CallbackFailure { callback, .. } => assert_eq!(callback, "unbind"),
        _ => panic!("Expected CallbackFailure error"),
    }
}
