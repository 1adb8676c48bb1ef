use pwdash::controller::PollingDataController;
use pwdash::gateway::{AggregateReading, GatewayClient, SocReading};
use pwdash::scheduler::TokioScheduler;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Records when each fetch started; `/soc` can be made to hang forever
#[derive(Default)]
struct RecordingGateway {
    soc_at: Mutex<Vec<Instant>>,
    aggregates_at: Mutex<Vec<Instant>>,
    hang_soc: bool,
}

#[async_trait::async_trait]
impl GatewayClient for RecordingGateway {
    async fn fetch_soc(&self) -> pwdash::Result<SocReading> {
        self.soc_at.lock().unwrap().push(Instant::now());
        if self.hang_soc {
            std::future::pending::<()>().await;
        }
        Ok(SocReading {
            raw_soc: 50.0,
            adjusted_soc: 42.0,
        })
    }

    async fn fetch_aggregates(&self) -> pwdash::Result<AggregateReading> {
        self.aggregates_at.lock().unwrap().push(Instant::now());
        Ok(AggregateReading {
            battery: 100.0,
            load: 5.0,
            site: -20.0,
            solar: 300.0,
        })
    }
}

fn offsets(times: &Mutex<Vec<Instant>>, start: Instant) -> Vec<Duration> {
    times.lock().unwrap().iter().map(|t| *t - start).collect()
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_every_period_until_deactivated() {
    let gw = Arc::new(RecordingGateway::default());
    let controller = PollingDataController::new(
        gw.clone(),
        Arc::new(TokioScheduler::new()),
        Duration::from_secs(10),
    );

    let start = Instant::now();
    controller.activate().unwrap();
    tokio::time::sleep(Duration::from_secs(25)).await;

    let expected = vec![
        Duration::ZERO,
        Duration::from_secs(10),
        Duration::from_secs(20),
    ];
    assert_eq!(offsets(&gw.soc_at, start), expected);
    assert_eq!(offsets(&gw.aggregates_at, start), expected);
    assert_eq!(controller.store().gauges().soc, 42.0);
    assert_eq!(controller.store().gauges().grid_power, -20.0);

    controller.deactivate();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gw.soc_at.lock().unwrap().len(), 3);
    assert_eq!(gw.aggregates_at.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_does_not_stall_the_timer() {
    let gw = Arc::new(RecordingGateway {
        hang_soc: true,
        ..RecordingGateway::default()
    });
    let controller = PollingDataController::new(
        gw.clone(),
        Arc::new(TokioScheduler::new()),
        Duration::from_secs(10),
    );

    controller.activate().unwrap();
    tokio::time::sleep(Duration::from_secs(35)).await;

    // Every cycle still starts; aggregates keep landing while /soc hangs
    assert_eq!(gw.soc_at.lock().unwrap().len(), 4);
    assert_eq!(gw.aggregates_at.lock().unwrap().len(), 4);
    assert_eq!(controller.store().gauges().soc, 0.0);
    assert_eq!(controller.store().gauges().inverter_power, 300.0);

    controller.deactivate();
    assert!(controller.drain().await.is_empty());
}
