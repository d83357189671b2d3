//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared forwarding components from config (fail fast)
//! - Create Axum Router with the forward, gateway and health handlers
//! - Wire up middleware (request ID, tracing, timeout, forwarded-port filter)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use mime::Mime;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ForwarderConfig;
use crate::forwarding::{
    outbound_headers, ForwardingDecision, ForwardingDecisionEngine, HeaderValidator, PortHeaderRules,
    RequestScopeContext, RulesError,
};
use crate::http::middleware::forwarded_port_filter;
use crate::http::response::{relay, ForwardError};
use crate::observability::metrics;
use crate::outbound::{
    parse_media_type, DescriptorError, OutboundClient, OutboundRequestDescriptor, RequestStrategyFactory,
    ResponseType,
};

/// Liveness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Errors building the server from config.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid forwarding header rules: {0}")]
    Rules(#[from] RulesError),

    #[error("failed to build outbound client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid upstream media type: {0}")]
    MediaType(#[from] DescriptorError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ForwarderConfig>,
    pub engine: Arc<ForwardingDecisionEngine>,
    pub strategies: Arc<RequestStrategyFactory>,
    pub media_type: Mime,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    config: Arc<ForwarderConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the built-in request strategies.
    pub fn new(config: ForwarderConfig) -> Result<Self, ServerError> {
        let client = Arc::new(OutboundClient::from_config(&config.timeouts)?);
        Self::with_strategies(config, RequestStrategyFactory::with_defaults(client))
    }

    /// Create a server using a caller-provided strategy registry.
    pub fn with_strategies(config: ForwarderConfig, strategies: RequestStrategyFactory) -> Result<Self, ServerError> {
        let rules = Arc::new(PortHeaderRules::from_config(&config.forwarding.headers)?);
        let mut validator = HeaderValidator::new(rules);
        if config.upstream.enforce_allowlist {
            validator = validator.with_allowlist(config.upstream.header.ports.iter().copied());
        }

        let media_type = parse_media_type(&config.upstream.media_type)?;
        if !strategies.supports_media_type(&media_type) {
            tracing::warn!(
                media_type = %media_type,
                ?strategies,
                "No registered strategy handles the upstream media type; forwarded calls will fail"
            );
        }

        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            engine: Arc::new(ForwardingDecisionEngine::new(config.upstream.header.key.clone())),
            strategies: Arc::new(strategies),
            media_type,
        };

        let router = Self::build_router(&config, state, Arc::new(validator));
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ForwarderConfig, state: AppState, validator: Arc<HeaderValidator>) -> Router {
        Router::new()
            .route(&config.endpoints.forward_path, get(forward_handler))
            .route(&config.endpoints.gateway_path, get(gateway_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(from_fn_with_state(validator, forwarded_port_filter))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.name,
            header_key = %self.config.upstream.header.key,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }
}

/// Forward-only endpoint: a valid port for the upstream header is required.
async fn forward_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestScopeContext>,
) -> Response {
    let result = match state.engine.decide_required(&context) {
        Ok(port) => forward(&state, &context, port).await,
        Err(e) => Err(e.into()),
    };
    finish(&state.config.endpoints.forward_path, result)
}

/// Gateway endpoint: answers locally unless the upstream header is present.
async fn gateway_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestScopeContext>,
) -> Response {
    let result = match state.engine.decide(&context) {
        ForwardingDecision::LocalHandle => {
            Ok((StatusCode::OK, state.config.endpoints.local_body.clone()).into_response())
        }
        ForwardingDecision::Forward(port) => forward(&state, &context, port).await,
    };
    finish(&state.config.endpoints.gateway_path, result)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn forward(state: &AppState, context: &RequestScopeContext, port: u16) -> Result<Response, ForwardError> {
    let upstream = &state.config.upstream;
    let descriptor = OutboundRequestDescriptor::builder()
        .media_type(state.media_type.clone())
        .domain(upstream.domain.clone())
        .path(upstream.destination.clone())
        .port(Some(port))
        .headers(outbound_headers(context, state.engine.header_key()))
        .method(Method::GET)
        .response_type(ResponseType::Text)
        .build()?;

    tracing::info!(
        upstream = %upstream.name,
        port,
        forwarded_headers = descriptor.headers().len(),
        "Forwarding request"
    );
    let response = state.strategies.execute(&descriptor).await?;
    Ok(relay(response))
}

fn finish(endpoint: &str, result: Result<Response, ForwardError>) -> Response {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(endpoint, kind = e.kind(), error = %e, "Request failed");
            e.into_response()
        }
    };
    metrics::record_request(endpoint, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(ForwarderConfig::default()).unwrap()
    }

    async fn get_body(router: Router, req: Request<Body>) -> (StatusCode, String) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::get(HEALTH_PATH).body(Body::empty()).unwrap();
        let response = server().router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_gateway_answers_locally_without_header() {
        let req = Request::get("/target/path/a").body(Body::empty()).unwrap();
        let (status, body) = get_body(server().router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Destination A");
    }

    #[tokio::test]
    async fn test_gateway_ignores_out_of_range_port() {
        let req = Request::get("/target/path/a")
            .header("service-a-forwarded-port", "65536")
            .body(Body::empty())
            .unwrap();
        let (status, body) = get_body(server().router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Destination A");
    }

    #[tokio::test]
    async fn test_forward_without_port_is_bad_request() {
        let req = Request::get("/port/forward")
            .header("service-b-forwarded-port", "8082")
            .body(Body::empty())
            .unwrap();
        let (status, body) = get_body(server().router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid or missing port information."));
    }

    #[test]
    fn test_invalid_rules_fail_fast() {
        let mut config = ForwarderConfig::default();
        config.forwarding.headers.ports.range.min = Some(80);
        assert!(matches!(HttpServer::new(config), Err(ServerError::Rules(_))));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let req = Request::get("/nope").body(Body::empty()).unwrap();
        let (status, _) = get_body(server().router(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
