use strip_graph::telemetry::{DEFAULT_DIRECTIVE, LOG_ENV_VAR, init_default_tracing};

#[test]
fn second_initialization_is_refused() {
    let _ = init_default_tracing();
    assert!(!init_default_tracing());
}

#[test]
fn filter_defaults_target_this_crate() {
    assert_eq!(LOG_ENV_VAR, "STRIP_GRAPH_LOG");
    assert!(DEFAULT_DIRECTIVE.starts_with("strip_graph="));
}
