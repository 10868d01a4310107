use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderValue, Uri,
};
use prometheus::{Encoder, TextEncoder};
use tower::ServiceBuilder;
use tower_http::{
    cors::{
        AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders,
    },
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use tokend_slo::errors;

use crate::{
    controllers::{self, jwks, token},
    middlewares::MakeSpanWithTrace,
    var::{HTTP_REQUESTS_DURATION_SECONDS, HTTP_REQUESTS_TOTAL},
    AppState,
};

const TRACE_ID: &str = "X-Trace-Id";

pub struct AppRouter;

impl AppRouter {
    pub fn build(state: AppState) -> Result<Router> {
        let cors = state
            .config
            .cors_origin
            .as_deref()
            .map(Self::cors)
            .transpose()?;
        let metrics_enabled = state.config.metrics_enabled;

        let mut router = Router::new()
            .nest(
                "/api/v1",
                Router::new()
                    .merge(controllers::new_router())
                    .merge(jwks::new_router(state.clone()))
                    .merge(token::new_router(state)),
            )
            .layer(
                ServiceBuilder::new().layer(
                    TraceLayer::new_for_http()
                        .make_span_with(
                            MakeSpanWithTrace::new().level(Level::INFO),
                        )
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                ),
            )
            .layer(middleware::from_fn(Self::trace))
            .fallback(Self::not_found);

        if let Some(cors) = cors {
            router = router.layer(cors);
        }
        if metrics_enabled {
            router = router
                .route_layer(middleware::from_fn(Self::track_metrics))
                .route("/metrics", get(Self::metrics));
        }

        Ok(router)
    }

    fn cors(origin: &str) -> Result<CorsLayer> {
        let layer = CorsLayer::new()
            .expose_headers(ExposeHeaders::list(vec![HeaderName::from_static(
                "x-trace-id",
            )]))
            .allow_headers(AllowHeaders::mirror_request())
            .allow_methods(AllowMethods::mirror_request())
            .max_age(Duration::from_secs(60) * 60 * 12);
        // credentials cannot be combined with a wildcard origin
        if origin == "*" {
            return Ok(layer.allow_origin(AllowOrigin::any()));
        }
        let origin = origin
            .parse::<HeaderValue>()
            .context("could not parse the cors origin")?;
        Ok(layer.allow_origin(origin).allow_credentials(true))
    }

    async fn trace(request: Request, next: Next) -> Response {
        let (mut head, body) = request.into_parts();
        let trace_header = match head.headers.get(TRACE_ID) {
            Some(v) => v.clone(),
            None => {
                let generated = HeaderValue::from_str(
                    &uuid::Uuid::new_v4().hyphenated().to_string(),
                )
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
                head.headers.insert(TRACE_ID, generated.clone());
                generated
            }
        };
        let mut response = next.run(Request::from_parts(head, body)).await;
        response.headers_mut().insert(TRACE_ID, trace_header);
        response
    }

    async fn track_metrics(request: Request, next: Next) -> Response {
        let path = if let Some(matched_path) =
            request.extensions().get::<MatchedPath>()
        {
            matched_path.as_str().to_owned()
        } else {
            request.uri().path().to_owned()
        };
        let start = Instant::now();
        let method = request.method().to_string();
        let response = next.run(request).await;
        let latency = start.elapsed();
        let status = response.status().as_u16().to_string();

        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method.as_str(), path.as_str(), &status])
            .inc();
        HTTP_REQUESTS_DURATION_SECONDS
            .with_label_values(&[method.as_str(), path.as_str()])
            .observe(latency.as_secs_f64());

        response
    }

    async fn metrics() -> Response {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
            return errors::any(err).into_response();
        }

        (
            [(CONTENT_TYPE, encoder.format_type().to_owned())],
            Body::from(buffer),
        )
            .into_response()
    }

    async fn not_found(uri: Uri) -> impl IntoResponse {
        errors::not_found(&format!("no route for {}", uri))
    }
}
