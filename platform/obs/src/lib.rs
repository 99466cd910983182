use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();

pub const DEFAULT_FILTER: &str = "info,tower_http=warn,sqlx=warn";

/// Tracing settings; unset fields fall back to `RUST_LOG` and `OTLP_ENDPOINT`.
#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self::for_service("hr-server")
    }
}

impl ObsConfig {
    pub fn for_service(service_name: &'static str) -> Self {
        Self {
            service_name,
            env_filter: None,
            otlp_endpoint: None,
        }
    }

    /// Effective filter directive: explicit config, then `env`, then the default.
    pub fn resolve_filter(&self, env: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(env)
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }

    pub fn resolve_endpoint(&self, env: Option<String>) -> Option<String> {
        self.otlp_endpoint
            .clone()
            .or(env)
            .filter(|e| !e.trim().is_empty())
    }
}

/// Install the fmt subscriber and, when an endpoint is known, an OTLP span
/// exporter. Calling it twice is a no-op.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(config.resolve_filter(std::env::var("RUST_LOG").ok()))?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    match config.resolve_endpoint(std::env::var("OTLP_ENDPOINT").ok()) {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_endpoint(endpoint)
                .build()?;

            let resource = Resource::builder()
                .with_service_name(config.service_name)
                .build();

            let provider = sdk::trace::SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build();
            let tracer = provider.tracer(config.service_name);

            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
        }
        None => registry.try_init()?,
    }

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(())
}
