//! Request context isolation under concurrency.
//!
//! Drives the forwarded-port filter directly with `oneshot` so thousands of
//! requests can run at once without sockets.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::Request,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use tower::ServiceExt;

use port_forwarder::forwarding::{ContextScope, HeaderValidator, PortHeaderRules, RequestScopeContext};
use port_forwarder::http::middleware::forwarded_port_filter;

fn validator() -> Arc<HeaderValidator> {
    let rules = PortHeaderRules::new(
        "forwarded-port",
        "^[a-zA-Z0-9-]+-forwarded-port$",
        "^[0-9]+$",
        Some(1024),
        Some(65535),
    )
    .unwrap();
    Arc::new(HeaderValidator::new(Arc::new(rules)))
}

async fn echo_context(Extension(context): Extension<RequestScopeContext>) -> Json<BTreeMap<String, u16>> {
    tokio::task::yield_now().await;
    Json(context.get_attributes())
}

fn echo_router() -> Router {
    Router::new()
        .route("/echo", get(echo_context))
        .layer(from_fn_with_state(validator(), forwarded_port_filter))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_see_only_their_own_headers() {
    let router = echo_router();

    let mut handles = Vec::new();
    for i in 0..1000u16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("svc-{}-forwarded-port", i);
            let port = 2000 + i;
            let req = Request::get("/echo")
                .header(name.as_str(), port.to_string())
                .body(Body::empty())
                .unwrap();
            let response = router.oneshot(req).await.unwrap();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let seen: BTreeMap<String, u16> = serde_json::from_slice(&bytes).unwrap();
            (name, port, seen)
        }));
    }

    for handle in handles {
        let (name, port, seen) = handle.await.unwrap();
        assert_eq!(seen.len(), 1, "leaked entries: {:?}", seen);
        assert_eq!(seen.get(&name), Some(&port));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_with_same_key_keep_their_own_port() {
    let router = echo_router();
    let key = "service-a-forwarded-port";

    let mut handles = Vec::new();
    for i in 0..1000u16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let port = 2000 + i;
            let req = Request::get("/echo")
                .header(key, port.to_string())
                .body(Body::empty())
                .unwrap();
            let response = router.oneshot(req).await.unwrap();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let seen: BTreeMap<String, u16> = serde_json::from_slice(&bytes).unwrap();
            (port, seen)
        }));
    }

    for handle in handles {
        let (port, seen) = handle.await.unwrap();
        let expected = BTreeMap::from([(key.to_string(), port)]);
        assert_eq!(seen, expected);
    }
}

#[tokio::test]
async fn test_context_cleared_after_response() {
    let captured: Arc<Mutex<Option<RequestScopeContext>>> = Arc::new(Mutex::new(None));
    let slot = captured.clone();
    let router = Router::new()
        .route(
            "/capture",
            get(move |Extension(context): Extension<RequestScopeContext>| {
                let slot = slot.clone();
                async move {
                    let entries = context.len();
                    *slot.lock().unwrap() = Some(context);
                    entries.to_string()
                }
            }),
        )
        .layer(from_fn_with_state(validator(), forwarded_port_filter));

    let req = Request::get("/capture")
        .header("service-a-forwarded-port", "8081")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(req).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"1");

    let context = captured.lock().unwrap().take().unwrap();
    assert!(context.is_empty());
}

#[tokio::test]
async fn test_context_cleared_when_request_cancelled() {
    let captured: Arc<Mutex<Option<RequestScopeContext>>> = Arc::new(Mutex::new(None));
    let slot = captured.clone();
    let router = Router::new()
        .route(
            "/hang",
            get(move |Extension(context): Extension<RequestScopeContext>| {
                let slot = slot.clone();
                async move {
                    *slot.lock().unwrap() = Some(context);
                    std::future::pending::<&'static str>().await
                }
            }),
        )
        .layer(from_fn_with_state(validator(), forwarded_port_filter));

    let req = Request::get("/hang")
        .header("service-a-forwarded-port", "8081")
        .body(Body::empty())
        .unwrap();
    let result = tokio::time::timeout(Duration::from_millis(100), router.oneshot(req)).await;
    assert!(result.is_err());

    let context = captured.lock().unwrap().take().unwrap();
    assert!(context.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_scopes_do_not_leak_across_tasks() {
    let mut handles = Vec::new();
    for i in 0..10_000u32 {
        handles.push(tokio::spawn(async move {
            let scope = ContextScope::new();
            let context = scope.context();
            let key = format!("task-{}-forwarded-port", i);
            let port = 1024 + (i % 60_000) as u16;
            context.set_attribute(&key, port);
            tokio::task::yield_now().await;
            let attributes = context.get_attributes();
            drop(scope);
            (attributes.len() == 1 && attributes.get(&key) == Some(&port), context.is_empty())
        }));
    }

    for handle in handles {
        let (isolated, cleared) = handle.await.unwrap();
        assert!(isolated);
        assert!(cleared);
    }
}
