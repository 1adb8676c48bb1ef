use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Json, Router, extract::Query, http::StatusCode, response::IntoResponse};
use axum::{routing::get, routing::post};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::AppState;

pub async fn logs_stream() -> impl IntoResponse {
    let rx = crate::logging::subscribe_log_lines();
    let stream = BroadcastStream::new(rx).filter_map(|res| match res {
        Ok(line) if crate::logging::should_emit_to_web(&line) => {
            Some(Ok::<Event, std::convert::Infallible>(
                Event::default().event("log").data(line),
            ))
        }
        _ => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
struct WebLevelQuery {
    level: String,
}

async fn set_web_log_level(Query(q): Query<WebLevelQuery>) -> impl IntoResponse {
    match crate::logging::set_web_log_level_str(&q.level) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "level": q.level})),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        ),
    }
}

async fn get_web_log_level() -> impl IntoResponse {
    let lvl = crate::logging::get_web_log_level();
    Json(serde_json::json!({"level": lvl.to_string()}))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/logs/stream", get(logs_stream))
        .route(
            "/api/logs/web_level",
            post(set_web_log_level).get(get_web_log_level),
        )
}
