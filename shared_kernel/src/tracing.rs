use anyhow::Context;
use tracing::Span;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs the JSON subscriber for the whole process. Honours `RUST_LOG`, defaulting to `info`.
///
/// Returns the root span; events recorded inside it carry `service.name`.
pub fn config_telemetry(service_name: &'static str) -> anyhow::Result<Span> {
    // Needed to forward ordinary log statements to our tracing subscriber.
    tracing_log::LogTracer::init().context("Failed to initialize log tracer")?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_thread_names(true),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber")?;

    let root = root_span(service_name);
    root.in_scope(|| tracing::info!("telemetry configured"));
    Ok(root)
}

fn root_span(service_name: &'static str) -> Span {
    tracing::info_span!("service", service.name = service_name)
}
