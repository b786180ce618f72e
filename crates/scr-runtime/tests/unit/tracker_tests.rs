//! Dependency tracker tests: cardinality, substitution, callback failures

use scr_domain::{
    Cardinality, ComponentConfiguration, DependencySpec, InstanceState, ProviderDescriptor,
    ProviderFilter,
};

use crate::support::{CallLog, greeter_factory, probe};

fn user_dependency() -> DependencySpec {
    DependencySpec::new("users", "user")
}

#[test]
fn single_mandatory_scenario_with_ten_providers() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_instance_name("ten")
        .with_handler("probe")
        .with_dependency(user_dependency());
    let instance = factory.create_instance(config).expect("creation succeeds");

    // Created with zero matching providers: INVALID, zero bind calls
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(log.count("bind"), 0);

    // Register 10 matching providers one at a time: only the first binds
    let registrations: Vec<_> = (0..10)
        .map(|_| registry.register(ProviderDescriptor::new("user")))
        .collect();
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 1);

    // Unregister the bound provider first: unbind once, the tracker
    // auto-binds the next available match in the same step
    registrations[0].unregister();
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("unbind"), 1);
    assert_eq!(log.count("bind"), 2);

    // Unregister everything else: the bound set eventually empties
    for registration in &registrations[1..] {
        registration.unregister();
    }
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(log.count("bind"), log.count("unbind"));

    // No flicker anywhere: VALID was held across every substitution
    assert_eq!(
        probe("ten").transitions(),
        vec![
            (InstanceState::Instantiated, InstanceState::Invalid),
            (InstanceState::Invalid, InstanceState::Valid),
            (InstanceState::Valid, InstanceState::Invalid),
        ]
    );
}

#[test]
fn non_matching_providers_never_change_state() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter").with_dependency(
        user_dependency()
            .with_filter(ProviderFilter::attribute_equals("admin", serde_json::json!(true))),
    );
    let instance = factory.create_instance(config).expect("creation succeeds");
    assert_eq!(instance.state(), InstanceState::Invalid);

    // Same namespace, but the predicate rejects them
    let _plain = registry.register(ProviderDescriptor::new("user"));
    let _other = registry
        .register(ProviderDescriptor::new("user").with_attribute("admin", serde_json::json!(false)));
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(log.count("bind"), 0);

    let _admin = registry
        .register(ProviderDescriptor::new("user").with_attribute("admin", serde_json::json!(true)));
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 1);
}

#[test]
fn multiple_cardinality_binds_every_matching_provider() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter").with_dependency(
        user_dependency().with_cardinality(Cardinality::MultipleMandatory),
    );
    let instance = factory.create_instance(config).expect("creation succeeds");

    let registrations: Vec<_> = (0..10)
        .map(|_| registry.register(ProviderDescriptor::new("user")))
        .collect();
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 10);

    // Every distinct provider was bound exactly once
    let mut bound = log.providers_seen("bind");
    bound.sort_unstable();
    bound.dedup();
    assert_eq!(bound.len(), 10);

    for registration in &registrations {
        registration.unregister();
    }
    assert_eq!(log.count("unbind"), 10);
    assert_eq!(instance.state(), InstanceState::Invalid);
}

#[test]
fn providers_present_before_creation_bind_without_flicker() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let _registration = registry.register(ProviderDescriptor::new("user"));
    let _second = registry.register(ProviderDescriptor::new("user"));

    let config = ComponentConfiguration::new("greeter")
        .with_instance_name("prebound")
        .with_handler("probe")
        .with_dependency(user_dependency());
    let instance = factory.create_instance(config).expect("creation succeeds");

    // Single cardinality: first match wins, the second waits
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 1);

    // The very first committed state is VALID - no transient INVALID
    assert_eq!(
        probe("prebound").transitions(),
        vec![(InstanceState::Instantiated, InstanceState::Valid)]
    );
}

#[test]
fn aggregate_population_at_creation_binds_all() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let registrations: Vec<_> = (0..10)
        .map(|_| registry.register(ProviderDescriptor::new("user")))
        .collect();

    let config = ComponentConfiguration::new("greeter").with_dependency(
        user_dependency().with_cardinality(Cardinality::MultipleMandatory),
    );
    let instance = factory.create_instance(config).expect("creation succeeds");

    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 10);

    for registration in &registrations {
        registration.unregister();
    }
    assert_eq!(log.count("unbind"), 10);
    assert_eq!(instance.state(), InstanceState::Invalid);
}

#[test]
fn unbind_order_follows_removal_order() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter").with_dependency(
        user_dependency().with_cardinality(Cardinality::MultipleOptional),
    );
    let _instance = factory.create_instance(config).expect("creation succeeds");

    let a = registry.register(ProviderDescriptor::new("user"));
    let b = registry.register(ProviderDescriptor::new("user"));
    let c = registry.register(ProviderDescriptor::new("user"));
    assert_eq!(
        log.providers_seen("bind"),
        vec![a.provider().id(), b.provider().id(), c.provider().id()]
    );

    // Remove in an order unrelated to bind order
    b.unregister();
    c.unregister();
    a.unregister();
    assert_eq!(
        log.providers_seen("unbind"),
        vec![b.provider().id(), c.provider().id(), a.provider().id()]
    );
}

#[test]
fn removing_an_unbound_candidate_is_ignored() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_instance_name("waiting")
        .with_handler("probe")
        .with_dependency(user_dependency());
    let instance = factory.create_instance(config).expect("creation succeeds");

    let first = registry.register(ProviderDescriptor::new("user"));
    let waiting = registry.register(ProviderDescriptor::new("user"));
    assert_eq!(log.count("bind"), 1);

    // The waiting candidate disappears: no callback, no transition
    waiting.unregister();
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("unbind"), 0);

    // The bound provider disappears with no replacement left
    first.unregister();
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(log.count("unbind"), 1);
    assert_eq!(
        probe("waiting").transitions(),
        vec![
            (InstanceState::Instantiated, InstanceState::Invalid),
            (InstanceState::Invalid, InstanceState::Valid),
            (InstanceState::Valid, InstanceState::Invalid),
        ]
    );
}

#[test]
fn failed_bind_callback_is_isolated() {
    let log = CallLog::new();
    let (registry, provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_instance_name("flaky")
        .with_dependency(user_dependency());
    let instance = factory.create_instance(config).expect("creation succeeds");
    let binder = provider.binder("flaky");

    // The component refuses the first provider; the runtime logs the
    // failure, treats it as not bound, and keeps processing
    binder.set_fail_bind(true);
    let _rejected = registry.register(ProviderDescriptor::new("user"));
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(log.count("bind"), 0);

    binder.set_fail_bind(false);
    let _accepted = registry.register(ProviderDescriptor::new("user"));
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 1);
}

#[test]
fn dispose_unbinds_every_bound_provider() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config = ComponentConfiguration::new("greeter")
        .with_dependency(DependencySpec::new("users", "user"))
        .with_dependency(DependencySpec::new("audit", "log"));
    let instance = factory.create_instance(config).expect("creation succeeds");

    let _user = registry.register(ProviderDescriptor::new("user"));
    let _log_provider = registry.register(ProviderDescriptor::new("log"));
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(log.count("bind"), 2);

    // Exactly one unbind per bound provider, before dispose returns
    instance.dispose();
    assert_eq!(log.count("unbind"), 2);
    assert_eq!(log.count_for("unbind", "users"), 1);
    assert_eq!(log.count_for("unbind", "audit"), 1);
    assert_eq!(instance.state(), InstanceState::Disposed);
}

#[test]
fn no_callback_repeats_without_an_intervening_opposite() {
    let log = CallLog::new();
    let (registry, _provider, factory) = greeter_factory(&log);

    let config =
        ComponentConfiguration::new("greeter").with_dependency(user_dependency());
    let _instance = factory.create_instance(config).expect("creation succeeds");

    let registration = registry.register(ProviderDescriptor::new("user"));
    registration.unregister();
    let again = registry.register(ProviderDescriptor::new("user"));
    again.unregister();

    // bind/unbind strictly alternate per provider
    let records = log.records();
    let callbacks: Vec<&str> = records.iter().map(|record| record.callback).collect();
    assert_eq!(callbacks, vec!["bind", "unbind", "bind", "unbind"]);
}
