//! Tracing setup for applications embedding `strip-graph`.
//!
//! The engine only emits `tracing` events (document mutations at `debug`,
//! per-panel render decisions at `trace`, provider drift at `warn`).
//! Installing a subscriber stays with the host; the helpers here are a
//! convenience for small viewers and are compiled in with the `telemetry`
//! feature.

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "STRIP_GRAPH_LOG";

/// Default directive used when neither environment variable is set.
pub const DEFAULT_DIRECTIVE: &str = "strip_graph=info";

/// Installs a compact `tracing` subscriber filtered by `STRIP_GRAPH_LOG`,
/// then `RUST_LOG`, then [`DEFAULT_DIRECTIVE`].
///
/// Returns `false` when the `telemetry` feature is disabled or a global
/// subscriber was already installed by the host.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_DIRECTIVE)
}

/// Same as [`init_default_tracing`] with a caller-chosen fallback directive.
#[must_use]
pub fn init_tracing(fallback_directive: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(fallback_directive));

        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_directive;
        false
    }
}
