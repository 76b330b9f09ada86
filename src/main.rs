use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use devicesense::{MonitorConfig, ResourceMonitor, SystemPlatform};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let platform = Arc::new(SystemPlatform::new());
    let config = MonitorConfig {
        sample_interval: Duration::from_secs(2),
        ..MonitorConfig::default()
    };
    let mut monitor = ResourceMonitor::start(platform, config);

    println!("{}", monitor.snapshot().summary());

    let mut updates = monitor.subscribe();
    for _ in 0..3 {
        if updates.changed().await.is_err() {
            break;
        }
        let snapshot = updates.borrow_and_update().clone();
        println!("{}", snapshot.summary());
        if snapshot.is_low_end_device {
            println!("low-end because: {}", snapshot.low_end_reasons.join(", "));
        }
    }

    monitor.stop().await
}
