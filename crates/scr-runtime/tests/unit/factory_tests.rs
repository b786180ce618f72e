//! Factory tests: validation, creation errors, live-instance registry

use scr_domain::{
    ComponentConfiguration, DependencySpec, Error, InstanceState, ProviderDescriptor,
};

use crate::support::{CallLog, GreeterProvider, greeter_factory};
use scr_registry::InMemoryServiceRegistry;
use scr_runtime::ComponentFactory;

#[test]
fn unknown_handler_type_fails_with_missing_handler() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter").with_handler("whiteboard");
    let error = factory.create_instance(config).expect_err("must fail");

    assert!(matches!(error, Error::MissingHandler { handler } if handler == "whiteboard"));
    assert_eq!(factory.count(), 0);
}

#[test]
fn rejected_property_name_fails_with_unacceptable_configuration() {
    let log = CallLog::new();
    let registry = InMemoryServiceRegistry::new_shared();
    let provider = GreeterProvider::accepting(log, &["greeting"]);
    let factory = ComponentFactory::new(provider, registry);

    let accepted = ComponentConfiguration::new("greeter")
        .with_property("greeting", serde_json::json!("hello"));
    assert!(factory.create_instance(accepted).is_ok());

    let rejected =
        ComponentConfiguration::new("greeter").with_property("port", serde_json::json!(8080));
    let error = factory.create_instance(rejected).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn null_property_value_is_malformed() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config =
        ComponentConfiguration::new("greeter").with_property("greeting", serde_json::Value::Null);
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn wrong_implementation_is_rejected() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("calculator");
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn duplicate_dependency_ids_are_rejected() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_dependency(DependencySpec::new("users", "user"))
        .with_dependency(DependencySpec::new("users", "admin"));
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn empty_dependency_id_is_rejected() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config =
        ComponentConfiguration::new("greeter").with_dependency(DependencySpec::new("", "user"));
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn duplicate_instance_names_are_rejected() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let first = ComponentConfiguration::new("greeter").with_instance_name("solo");
    factory.create_instance(first).expect("creation succeeds");

    let second = ComponentConfiguration::new("greeter").with_instance_name("solo");
    let error = factory.create_instance(second).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
    assert_eq!(factory.count(), 1);
}

#[test]
fn instance_name_property_must_be_a_string() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_property("instance.name", serde_json::json!(42));
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::UnacceptableConfiguration { .. }));
}

#[test]
fn instance_name_property_is_honored() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_property("instance.name", serde_json::json!("named-by-property"));
    let instance = factory.create_instance(config).expect("creation succeeds");
    assert_eq!(instance.name(), "named-by-property");
    assert!(factory.contains("named-by-property"));
}

#[test]
fn generated_names_are_unique() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let a = factory
        .create_instance(ComponentConfiguration::new("greeter"))
        .expect("creation succeeds");
    let b = factory
        .create_instance(ComponentConfiguration::new("greeter"))
        .expect("creation succeeds");

    assert_ne!(a.name(), b.name());
    assert!(a.name().starts_with("greeter-"));
}

#[test]
fn failing_component_constructor_is_a_configuration_error() {
    let log = CallLog::new();
    let (_registry, provider, factory) = greeter_factory(&log);

    provider.set_fail_create(true);
    let error = factory
        .create_instance(ComponentConfiguration::new("greeter"))
        .expect_err("must fail");
    assert!(matches!(error, Error::Configuration { .. }));
    assert_eq!(factory.count(), 0);
}

#[test]
fn broken_handler_initialization_is_a_configuration_error() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter").with_handler("broken");
    let error = factory.create_instance(config).expect_err("must fail");
    assert!(matches!(error, Error::Configuration { .. }));
    assert_eq!(factory.count(), 0);
}

#[test]
fn failed_initial_population_unwinds_partial_bindings() {
    let log = CallLog::new();
    let (registry, provider, factory) = greeter_factory(&log);

    let _first = registry.register(ProviderDescriptor::new("user"));
    let _second = registry.register(ProviderDescriptor::new("log"));

    let config = ComponentConfiguration::new("greeter")
        .with_instance_name("doomed")
        .with_dependency(DependencySpec::new("users", "user"))
        .with_dependency(DependencySpec::new("audit", "log"));

    // "users" binds, "audit" refuses: creation fails and the partial
    // binding is unwound before the error propagates
    provider.set_fail_bind_dependency(Some("audit"));
    let error = factory.create_instance(config).expect_err("must fail");

    assert!(matches!(error, Error::Configuration { .. }));
    assert_eq!(factory.count(), 0);
    assert_eq!(log.count("bind"), 1);
    assert_eq!(log.count("unbind"), 1);
    assert_eq!(log.count_for("unbind", "users"), 1);
}

#[test]
fn list_get_contains_count() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    factory
        .create_instance(ComponentConfiguration::new("greeter").with_instance_name("a"))
        .expect("creation succeeds");
    factory
        .create_instance(ComponentConfiguration::new("greeter").with_instance_name("b"))
        .expect("creation succeeds");

    assert_eq!(factory.count(), 2);
    assert!(factory.contains("a"));
    assert!(!factory.contains("c"));

    let info = factory.get("a").expect("a exists");
    assert_eq!(info.name, "a");
    assert_eq!(info.state, InstanceState::Valid);
    assert!(factory.get("c").is_none());

    let mut names: Vec<String> = factory.list().into_iter().map(|info| info.name).collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn disposing_an_instance_leaves_the_live_registry() {
    let log = CallLog::new();
    let (_registry, _provider, factory) = greeter_factory(&log);

    let instance = factory
        .create_instance(ComponentConfiguration::new("greeter").with_instance_name("transient"))
        .expect("creation succeeds");
    assert!(factory.contains("transient"));

    instance.dispose();
    assert!(!factory.contains("transient"));
    assert_eq!(factory.count(), 0);
}

#[test]
fn dispose_all_disposes_in_creation_order_and_aggregates_failures() {
    let log = CallLog::new();
    let (registry, provider, factory) = greeter_factory(&log);

    for name in ["first", "second", "third"] {
        factory
            .create_instance(
                ComponentConfiguration::new("greeter")
                    .with_instance_name(name)
                    .with_dependency(DependencySpec::new("users", "user")),
            )
            .expect("creation succeeds");
    }
    let _registration = registry.register(ProviderDescriptor::new("user"));
    assert_eq!(log.count("bind"), 3);

    // The middle instance refuses unbinds; the sweep must not stop there
    provider.binder("second").set_fail_unbind(true);

    let failures = factory.dispose_all();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "second");
    assert_eq!(factory.count(), 0);

    // Unbinds ran in creation order for the instances that accepted them
    let unbinds: Vec<String> = log
        .records()
        .into_iter()
        .filter(|record| record.callback == "unbind")
        .map(|record| record.instance)
        .collect();
    assert_eq!(unbinds, vec!["first".to_string(), "third".to_string()]);
}
