//! The axum HTTP surface.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ProxyError, ProxyResult};
use crate::orchestrator::{ProxyRequest, ProxyResponse, ProxyState};

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Build the gateway router: `/healthz` plus a catch-all proxy handler for
/// every other method and path.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(proxy)
        .with_state(state)
}

async fn healthz(State(state): State<Arc<ProxyState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "agent": state.agent().email,
    }))
}

async fn proxy(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    // The target URL is everything after the leading slash, query included:
    // the agent sends http://proxy:9090/https://api.github.com/repos/x
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();

    // Buffered once: the same bytes feed the fingerprint and the upstream
    // call, so an approval can never cover different payload bytes than the
    // ones forwarded.
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        },
    };

    state
        .handle(ProxyRequest {
            method: parts.method,
            target,
            headers: parts.headers,
            body,
        })
        .await
        .into_response()
}

/// Bind the listener and serve until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns [`ProxyError::Startup`] if the address cannot be bound or the
/// server fails while running.
pub async fn serve(state: Arc<ProxyState>, listen: &str) -> ProxyResult<()> {
    let listener =
        tokio::net::TcpListener::bind(listen)
            .await
            .map_err(|e| ProxyError::Startup {
                reason: format!("failed to bind {listen}: {e}"),
            })?;

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "gateway listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ProxyError::Startup {
            reason: format!("server error: {e}"),
        })
}

/// Resolve when the process is asked to stop.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::{ForwardRequest, ForwardResponse, Forwarder};
    use crate::identity::NullIdentityVerifier;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, Method};
    use bytes::Bytes;
    use outpost_audit::{AuditSink, MemoryAuditSink};
    use outpost_core::{AgentIdentity, DefaultAction};
    use outpost_grants::{Grant, GrantBroker, GrantResult, NewGrantRequest};
    use outpost_policy::{PolicySet, RulePattern};
    use tower::ServiceExt as _;

    struct EchoForwarder;

    #[async_trait]
    impl Forwarder for EchoForwarder {
        async fn forward(&self, request: ForwardRequest) -> crate::ProxyResult<ForwardResponse> {
            Ok(ForwardResponse {
                status: axum::http::StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from(request.url.to_string()),
            })
        }
    }

    struct NoBroker;

    #[async_trait]
    impl GrantBroker for NoBroker {
        async fn request_grant(&self, _request: &NewGrantRequest) -> GrantResult<Grant> {
            Err(outpost_grants::GrantError::BrokerUnavailable {
                reason: "unused".to_string(),
            })
        }

        async fn fetch_grant(&self, _grant_id: &str) -> GrantResult<Grant> {
            Err(outpost_grants::GrantError::BrokerUnavailable {
                reason: "unused".to_string(),
            })
        }

        async fn find_reusable_grant(
            &self,
            _requester: &str,
            _target: &str,
            _permissions: &[String],
        ) -> Option<Grant> {
            None
        }
    }

    fn test_router() -> Router {
        let policy = PolicySet::new(
            &[],
            &[RulePattern::new("api.github.com")],
            &[],
            DefaultAction::Block,
        )
        .unwrap();

        let state = ProxyState::new(
            AgentIdentity::new("agent@example.com"),
            policy,
            Arc::new(NoBroker),
            Arc::new(EchoForwarder),
            Arc::new(NullIdentityVerifier),
            Arc::new(MemoryAuditSink::new()) as Arc<dyn AuditSink>,
        );
        router(Arc::new(state))
    }

    #[tokio::test]
    async fn test_healthz_reports_agent() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["agent"], "agent@example.com");
    }

    #[tokio::test]
    async fn test_fallback_extracts_target_with_query() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/https://api.github.com/repos/x?state=open")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"https://api.github.com/repos/x?state=open");
    }

    #[tokio::test]
    async fn test_fallback_rejects_relative_target() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/this-is-not-a-url")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
