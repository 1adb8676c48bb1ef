use anyhow::Result;
use pwdash::config::Config;
use pwdash::controller::PollingDataController;
use pwdash::gateway::HttpGatewayClient;
use pwdash::logging::{get_logger, init_logging};
use pwdash::scheduler::TokioScheduler;
use std::sync::Arc;

/// Set to `1` to run a single cycle, print the snapshot and exit
const ENV_ONCE: &str = "PWDASH_ONCE";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;
    let logger = get_logger("main");

    let client = HttpGatewayClient::from_config(&config.dashboard)
        .map_err(|e| anyhow::anyhow!("Failed to create gateway client: {}", e))?;
    logger.info(&format!(
        "pwdash {} starting; gateway {}",
        env!("APP_VERSION"),
        client.location()
    ));

    let controller = PollingDataController::new(
        Arc::new(client),
        Arc::new(TokioScheduler::new()),
        config.dashboard.poll_interval(),
    );

    if std::env::var(ENV_ONCE).is_ok_and(|v| v == "1") {
        let report = controller.refresh_now().await;
        println!("{}", serde_json::to_string_pretty(&*controller.store().snapshot())?);
        if !report.all_applied() {
            anyhow::bail!("Refresh incomplete: {:?}", report);
        }
        return Ok(());
    }

    let web_task = config.web.enabled.then(|| {
        let store = controller.store().clone();
        let (host, port) = (config.web.host.clone(), config.web.port);
        let web_logger = get_logger("web");
        tokio::spawn(async move {
            if let Err(e) = pwdash::web::serve(store, &host, port).await {
                web_logger.error(&format!("Web server error: {}", e));
            }
        })
    });

    controller
        .activate()
        .map_err(|e| anyhow::anyhow!("Failed to activate controller: {}", e))?;

    tokio::signal::ctrl_c().await?;
    logger.info("Shutdown requested");

    controller.deactivate();
    controller.drain().await;
    if let Some(task) = web_task {
        task.abort();
    }
    logger.info("Shutdown complete");
    Ok(())
}
