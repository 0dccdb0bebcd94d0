//! Log output on stderr, plus trace export over OTLP/gRPC when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::OnceCell;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracerProvider, Tracer},
    Resource,
};
use std::{env::var, time::Duration};
use tonic::{
    metadata::{Ascii, Binary, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use ulid::Ulid;

const ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const HEADERS_VAR: &str = "OTEL_EXPORTER_OTLP_HEADERS";
const INSTANCE_VAR: &str = "OTEL_SERVICE_INSTANCE_ID";

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Exporter settings from the standard OTLP variables.
#[derive(Debug, PartialEq, Eq)]
struct ExportSettings {
    endpoint: String,
    headers: Vec<(String, String)>,
    instance_id: String,
}

impl ExportSettings {
    /// `None` unless an endpoint is configured. Endpoints without a scheme are
    /// treated as https.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let endpoint = lookup(ENDPOINT_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;
        let endpoint = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint
        } else {
            format!("https://{}", endpoint.trim_end_matches('/'))
        };

        let headers = lookup(HEADERS_VAR)
            .map(|raw| {
                raw.split(',')
                    .filter_map(|pair| {
                        let (key, value) = pair.split_once('=')?;
                        let key = key.trim();
                        (!key.is_empty())
                            .then(|| (key.to_ascii_lowercase(), value.trim().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let instance_id = lookup(INSTANCE_VAR).unwrap_or_else(|| Ulid::new().to_string());

        Some(Self {
            endpoint,
            headers,
            instance_id,
        })
    }

    fn tls_domain(&self) -> Option<&str> {
        self.endpoint
            .strip_prefix("https://")?
            .split(['/', ':'])
            .next()
            .filter(|host| !host.is_empty())
    }

    /// gRPC metadata for the exporter; `-bin` keys carry base64 values.
    fn metadata(&self) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::with_capacity(self.headers.len());

        for (key, value) in &self.headers {
            if key.ends_with("-bin") {
                let bytes = STANDARD
                    .decode(value)
                    .map_err(|e| anyhow!("{HEADERS_VAR}: {key} is not valid base64: {e}"))?;
                let key = MetadataKey::<Binary>::from_bytes(key.as_bytes())
                    .map_err(|e| anyhow!("{HEADERS_VAR}: invalid key {key}: {e}"))?;
                metadata.insert_bin(key, MetadataValue::from_bytes(&bytes));
            } else {
                let name = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
                    .map_err(|e| anyhow!("{HEADERS_VAR}: invalid key {key}: {e}"))?;
                let value = value
                    .parse::<MetadataValue<Ascii>>()
                    .map_err(|e| anyhow!("{HEADERS_VAR}: invalid value for {key}: {e}"))?;
                metadata.insert(name, value);
            }
        }

        Ok(metadata)
    }

    fn tracer(&self) -> Result<Tracer> {
        let mut builder = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&self.endpoint)
            .with_compression(Compression::Gzip)
            .with_timeout(Duration::from_secs(3));

        if let Some(domain) = self.tls_domain() {
            builder = builder.with_tls_config(
                ClientTlsConfig::new()
                    .domain_name(domain.to_string())
                    .with_native_roots(),
            );
        }
        if !self.headers.is_empty() {
            builder = builder.with_metadata(self.metadata()?);
        }

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(builder.build()?)
            .with_resource(
                Resource::builder_empty()
                    .with_attributes([
                        KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                        KeyValue::new("service.instance.id", self.instance_id.clone()),
                    ])
                    .build(),
            )
            .build();

        let _ = TRACER_PROVIDER.set(provider.clone());
        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]));

        Ok(provider.tracer(env!("CARGO_PKG_NAME")))
    }
}

/// Initialize logging at `verbosity_level` (default: errors only).
///
/// # Errors
///
/// Returns an error if the exporter or the subscriber cannot be set up
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.unwrap_or(Level::ERROR).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let otel_layer = match ExportSettings::from_lookup(|name| var(name).ok()) {
        Some(settings) => Some(tracing_opentelemetry::layer().with_tracer(settings.tracer()?)),
        None => None,
    };

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush pending spans. Does nothing when traces are not exported.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            debug!("tracer shutdown: {err}");
        }
    }
}
