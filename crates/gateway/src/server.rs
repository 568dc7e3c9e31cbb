use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{Request, State},
        http::{HeaderValue, header},
        middleware::{self, Next},
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    tower_http::{services::ServeDir, trace::TraceLayer},
    tracing::info,
};

use opsgate_config::OpsgateConfig;

use crate::{proxy, state::GatewayState};

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
///
/// Routing: `/api/health` and `/api/run` are the only dynamic routes; every
/// other path falls through to the static UI tree.
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/run",
            post(proxy::run_handler).options(proxy::preflight_handler),
        )
        .fallback_service(ServeDir::new(&state.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(with_cors))
        .with_state(state)
}

/// Append the permissive CORS headers to every response.
///
/// Wrapped around the whole router (static fallback included) so each route,
/// current or future, carries the same policy. The pre-flight probe itself
/// is answered by the explicit OPTIONS route on `/api/run`.
async fn with_cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the gateway HTTP server. Runs until the process is stopped.
///
/// Failure to bind the listen address is fatal and propagates to the caller;
/// everything after the bind is per-request and never takes the process down.
pub async fn start_gateway(config: OpsgateConfig) -> anyhow::Result<()> {
    let state = GatewayState::new(&config.gateway)?;
    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = config.gateway.listen_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("opsgate gateway v{}", state.version),
        format!("listening on {addr}"),
        format!("proxying /api/run -> {}", state.supervisor_url),
        format!("serving ui from {}", state.static_dir.display()),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /api/health`: liveness probe for operators and tests. Reports the
/// configured upstream without ever calling it.
async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "upstream": state.supervisor_url,
    }))
}

#[cfg(test)]
mod tests {
    use {
        axum::{
            body::Body,
            http::{Method, Request, StatusCode},
        },
        tower::ServiceExt,
    };

    use super::*;

    fn test_app(static_dir: &std::path::Path) -> Router {
        let section = opsgate_config::GatewaySection {
            static_dir: static_dir.to_path_buf(),
            ..opsgate_config::GatewaySection::default()
        };
        build_gateway_app(GatewayState::new(&section).unwrap())
    }

    async fn get_path(app: Router, path: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok_and_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_path(test_app(dir.path()), "/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["upstream"], opsgate_config::schema::DEFAULT_SUPERVISOR_URL);
    }

    #[tokio::test]
    async fn every_route_carries_cors_headers() {
        let dir = tempfile::tempdir().unwrap();

        for path in ["/api/health", "/missing.css"] {
            let response = get_path(test_app(dir.path()), path).await;
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                "*",
                "missing CORS header on {path}"
            );
        }
    }

    #[tokio::test]
    async fn serves_static_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>console</h1>").unwrap();

        let response = get_path(test_app(dir.path()), "/index.html").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<h1>console</h1>");

        // "/" resolves to index.html as well.
        let response = get_path(test_app(dir.path()), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_static_path_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_path(test_app(dir.path()), "/nope.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn traversal_outside_static_root_is_rejected() {
        let parent = tempfile::tempdir().unwrap();
        std::fs::write(parent.path().join("secret.txt"), "top secret").unwrap();
        let root = parent.path().join("web");
        std::fs::create_dir(&root).unwrap();

        let response = get_path(test_app(&root), "/../secret.txt").await;
        assert_ne!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!body.windows(10).any(|w| w == b"top secret"));
    }
}
