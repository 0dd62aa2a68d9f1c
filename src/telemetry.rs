use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
};
use rocket::{
    Data, Request, Response,
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
};
use std::time::Instant;
use tonic::metadata::{MetadataMap, MetadataValue};
use tracing::{Span, info_span};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const HONEYCOMB_ENDPOINT: &str = "https://api.honeycomb.io:443";

/// Per-request span plus the instant the request arrived.
struct RequestTrace {
    span: Span,
    started: Instant,
}

/// Wraps every request in an `http_request` span. The matched route and
/// outcome are only known once routing is done, so they are recorded when the
/// response goes out.
pub struct TelemetryFairing;

#[rocket::async_trait]
impl Fairing for TelemetryFairing {
    fn info(&self) -> Info {
        Info {
            name: "Request tracing",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let method = request.method();
        let path = request.uri().path().to_string();

        let span = info_span!(
            "http_request",
            otel.name = format!("{} {}", method, path),
            http.method = %method,
            http.target = %request.uri(),
            http.route = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            http.duration_ms = tracing::field::Empty,
        );

        request.local_cache(|| RequestTrace {
            span,
            started: Instant::now(),
        });
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let trace = request.local_cache(|| RequestTrace {
            span: info_span!("http_request"),
            started: Instant::now(),
        });

        let elapsed_ms = trace.started.elapsed().as_millis() as i64;
        let status = response.status();

        if let Some(route) = request.route() {
            trace.span.record("http.route", route.uri.to_string());
            trace.span.record("otel.name", format!("{} {}", request.method(), route.uri));
        }
        trace.span.record("http.status_code", status.code);
        trace.span.record("http.duration_ms", elapsed_ms);

        let _entered = trace.span.enter();
        match status.class() {
            StatusClass::ServerError => {
                tracing::error!(status = status.code, elapsed_ms, "Request failed")
            }
            StatusClass::ClientError => {
                tracing::warn!(status = status.code, elapsed_ms, "Request rejected")
            }
            _ => tracing::info!(status = status.code, elapsed_ms, "Request completed"),
        }
    }
}

fn deployment_environment() -> String {
    dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string())
}

fn resource() -> Resource {
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_environment()),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(api_key: &str) -> anyhow::Result<SdkTracerProvider> {
    let mut metadata = MetadataMap::new();
    metadata.insert("x-honeycomb-team", MetadataValue::try_from(api_key)?);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(HONEYCOMB_ENDPOINT)
        .with_tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

/// Flushes and shuts down the span exporter when dropped.
pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {:?}", err);
        }
    }
}

/// Installs the global subscriber: env-filtered fmt output, plus OTLP export
/// to Honeycomb when `HONEYCOMB_API_KEY` is set. Keep the returned guard alive
/// for the lifetime of the process.
pub fn init_tracing() -> Option<OtelGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let api_key = dotenvy::var("HONEYCOMB_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());

    let tracer_provider = match api_key.as_deref().map(init_tracer_provider) {
        Some(Ok(provider)) => Some(provider),
        Some(Err(err)) => {
            eprintln!("OpenTelemetry export disabled: {:#}", err);
            None
        }
        None => None,
    };

    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer(env!("CARGO_PKG_NAME"))));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init();

    if let Err(err) = installed {
        eprintln!("Tracing subscriber already installed: {}", err);
    }

    tracer_provider.map(|tracer_provider| OtelGuard { tracer_provider })
}
