use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt as _;
use pwdash::config::LoggingConfig;
use pwdash::controller::PollingDataController;
use pwdash::error::DashError;
use pwdash::gateway::{AGGREGATES_PATH, AggregateReading, GatewayClient, SOC_PATH, SocReading};
use pwdash::logging::{get_logger, init_logging, set_web_log_level};
use pwdash::scheduler::TokioScheduler;
use pwdash::state::DisplayStore;
use pwdash::web::{AppState, build_router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tracing::Level;

/// Every request fails with `reason`
struct FailingGateway {
    reason: &'static str,
}

#[async_trait::async_trait]
impl GatewayClient for FailingGateway {
    async fn fetch_soc(&self) -> pwdash::Result<SocReading> {
        Err(DashError::fetch(SOC_PATH, self.reason))
    }

    async fn fetch_aggregates(&self) -> pwdash::Result<AggregateReading> {
        Err(DashError::fetch(AGGREGATES_PATH, self.reason))
    }
}

async fn refresh_against(reason: &'static str) {
    let controller = PollingDataController::new(
        Arc::new(FailingGateway { reason }),
        Arc::new(TokioScheduler::new()),
        Duration::from_secs(10),
    );
    controller.refresh_now().await;
}

async fn read_until(body: &mut Body, needle: &str) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(frame)) = body.frame().await {
            if let Some(data) = frame.data_ref() {
                buf.extend_from_slice(data);
                if String::from_utf8_lossy(&buf).contains(needle) {
                    break;
                }
            }
        }
    })
    .await;
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn fetch_failures_reach_log_stream_above_web_level() {
    init_logging(&LoggingConfig::default()).unwrap();

    let app = build_router(AppState {
        store: DisplayStore::new(),
    });
    let resp = app
        .oneshot(Request::get("/api/logs/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(ct.contains("text/event-stream"));
    let mut body = resp.into_body();

    // At ERROR the fetch warnings are filtered; the error line marks the point
    // the stream has caught up to
    set_web_log_level(Level::ERROR);
    refresh_against("gateway-busy-filtered").await;
    get_logger("test").error("caught-up-marker");
    let filtered = read_until(&mut body, "caught-up-marker").await;
    assert!(filtered.contains("caught-up-marker"), "{}", filtered);
    assert!(!filtered.contains("gateway-busy-filtered"), "{}", filtered);

    set_web_log_level(Level::WARN);
    refresh_against("gateway-busy-visible").await;
    let shown = read_until(&mut body, "gateway-busy-visible").await;
    assert!(shown.contains("event: log"), "{}", shown);
    assert!(
        shown.contains("Fetch error on /soc: gateway-busy-visible; keeping previous values"),
        "{}",
        shown
    );
}
