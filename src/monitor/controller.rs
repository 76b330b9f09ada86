use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::platform::Platform;
use crate::snapshot::ResourceSnapshot;

use super::worker::MonitorWorker;

/// Continuously-updated view of the host device's resources.
///
/// Starting a monitor takes a synchronous first snapshot from whatever
/// probes answer, then spawns a worker that folds in network changes,
/// long-task batches, and periodic memory samples until [`stop`](Self::stop)
/// (or drop) tears it down. Must be started from within a tokio runtime.
pub struct ResourceMonitor {
    snapshot_rx: watch::Receiver<ResourceSnapshot>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl ResourceMonitor {
    /// Starts monitoring `platform`. Never fails: absent capabilities simply
    /// degrade to absent snapshot fields.
    pub fn start(platform: Arc<dyn Platform>, config: MonitorConfig) -> Self {
        info!(
            "resource monitor starting (sample interval {:?})",
            config.sample_interval
        );

        let initial = initial_snapshot(platform.as_ref());
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let events = platform.take_events();

        let worker = MonitorWorker::new(platform, config, snapshot_tx, cancel.clone());
        let handle = tokio::spawn(worker.run(events));

        Self {
            snapshot_rx,
            cancel,
            worker: Some(handle),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> ResourceSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Change stream for consumers that re-render on updates. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Tears all update sources down. Once this returns, no further update
    /// is applied; an in-flight sample is discarded on arrival.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(handle) = self.worker.take() {
            handle
                .await
                .context("resource monitor worker failed to join")?;
        }
        info!("resource monitor stopped");
        Ok(())
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Synchronous best-effort read of the static, network, and heap probes.
/// Long-task count starts at zero and agent memory waits for the first
/// async sample.
fn initial_snapshot(platform: &dyn Platform) -> ResourceSnapshot {
    let mut snapshot = ResourceSnapshot::empty(Utc::now());
    snapshot.device_memory_gb = platform.device_memory_gb();
    snapshot.hardware_concurrency = platform.hardware_concurrency();

    if let Some(network) = platform.network_status() {
        snapshot.effective_type = network.effective_type;
        snapshot.save_data = Some(network.save_data);
        snapshot.rtt_ms = network.rtt_ms;
        snapshot.downlink_mbps = network.downlink_mbps;
    }

    if let Some(heap) = platform.heap_stats() {
        snapshot.js_heap_size_limit = Some(heap.js_heap_size_limit);
        snapshot.total_js_heap_size = Some(heap.total_js_heap_size);
        snapshot.used_js_heap_size = Some(heap.used_js_heap_size);
    }

    snapshot.reclassify();
    snapshot
}
