//! Axum-based feed of the display state for the presentation layer

mod logs;

pub use logs::logs_stream;

use crate::error::{DashError, Result};
use crate::state::DisplayStore;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: DisplayStore,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({ "version": env!("APP_VERSION") }))
}

async fn gauges(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot().as_ref().clone())
}

/// One `gauges` event with the current snapshot, then one per change
async fn gauges_stream(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::new(state.store.subscribe()).filter_map(|snap| {
        Event::default()
            .event("gauges")
            .json_data(&*snap)
            .ok()
            .map(Ok::<Event, std::convert::Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/gauges", get(gauges))
        .route("/api/gauges/stream", get(gauges_stream))
        .merge(logs::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(store: DisplayStore, host: &str, port: u16) -> Result<()> {
    let router = build_router(AppState { store });

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr: SocketAddr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DashError::web(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (gauges /api/gauges, stream /api/gauges/stream)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .await
        .map_err(|e| DashError::web(format!("Server stopped: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> (DisplayStore, Router) {
        let store = DisplayStore::new();
        let app = build_router(AppState {
            store: store.clone(),
        });
        (store, app)
    }

    #[tokio::test]
    async fn health_and_version() {
        let (_, app) = router();
        let resp = app
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");

        let resp = app
            .oneshot(Request::get("/api/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["version"], env!("APP_VERSION"));
    }

    #[tokio::test]
    async fn serve_reports_bind_failure_as_web_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = serve(DisplayStore::new(), "127.0.0.1", port)
            .await
            .unwrap_err();
        assert!(matches!(err, DashError::Web { .. }));
        assert!(err.to_string().contains("Failed to bind"), "{}", err);
    }

    #[tokio::test]
    async fn gauges_reflect_store() {
        let (store, app) = router();
        store.set_soc(42.0);
        store.set_inverter_power(300.0);

        let resp = app
            .oneshot(Request::get("/api/gauges").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["soc"], 42.0);
        assert_eq!(json["inverter_power"], 300.0);
        assert_eq!(json["battery_power"], 0.0);
    }
}
