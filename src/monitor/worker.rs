use std::sync::Arc;

use chrono::Utc;
use log::debug;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::platform::{Platform, PlatformEvents};
use crate::snapshot::ResourceSnapshot;

/// Update loop behind a running monitor.
///
/// One task owns the snapshot: every update source funnels through its
/// `select!` loop, so a merge never interleaves with another.
pub(crate) struct MonitorWorker {
    platform: Arc<dyn Platform>,
    config: MonitorConfig,
    publisher: watch::Sender<ResourceSnapshot>,
    cancel: CancellationToken,
    long_tasks_count: u32,
}

impl MonitorWorker {
    pub(crate) fn new(
        platform: Arc<dyn Platform>,
        config: MonitorConfig,
        publisher: watch::Sender<ResourceSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            platform,
            config,
            publisher,
            cancel,
            long_tasks_count: 0,
        }
    }

    pub(crate) async fn run(mut self, events: PlatformEvents) {
        let cancel = self.cancel.clone();
        let mut network_changes = events.network_changes;
        let mut long_task_batches = if self.config.observe_long_tasks {
            events.long_task_batches
        } else {
            None
        };

        let mut ticker = sample_ticker(self.config.sample_interval);

        // The startup sample covers the ticker's first period.
        self.sample().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = next_tick(&mut ticker) => self.sample().await,
                changed = next_event(&mut network_changes) => match changed {
                    Some(()) => self.on_network_change(),
                    None => network_changes = None,
                },
                batch = next_event(&mut long_task_batches) => match batch {
                    Some(size) => self.on_long_task_batch(size),
                    None => long_task_batches = None,
                },
            }
        }

        debug!("resource monitor loop shut down");
    }

    /// Async sample: agent memory off-thread, then the heap probe. New values
    /// overwrite, absent values leave the previous reading in place.
    async fn sample(&mut self) {
        let cancel = self.cancel.clone();
        let probe = {
            let platform = Arc::clone(&self.platform);
            tokio::task::spawn_blocking(move || platform.measure_ua_memory_mb())
        };

        let ua_memory_mb = tokio::select! {
            _ = cancel.cancelled() => return,
            measured = probe => measured.unwrap_or(None),
        };
        if cancel.is_cancelled() {
            return;
        }

        let mut next = self.publisher.borrow().clone();
        if ua_memory_mb.is_some() {
            next.ua_memory_mb = ua_memory_mb;
        }
        if let Some(heap) = self.platform.heap_stats() {
            next.js_heap_size_limit = Some(heap.js_heap_size_limit);
            next.total_js_heap_size = Some(heap.total_js_heap_size);
            next.used_js_heap_size = Some(heap.used_js_heap_size);
        }
        self.publish(next);
    }

    fn on_network_change(&mut self) {
        let Some(status) = self.platform.network_status() else {
            return;
        };

        let mut next = self.publisher.borrow().clone();
        if status.effective_type.is_some() {
            next.effective_type = status.effective_type;
        }
        next.save_data = Some(status.save_data);
        next.rtt_ms = status.rtt_ms;
        next.downlink_mbps = status.downlink_mbps;
        self.publish(next);
        debug!("network change applied");
    }

    fn on_long_task_batch(&mut self, batch: u32) {
        if batch == 0 {
            return;
        }
        self.long_tasks_count = self
            .long_tasks_count
            .saturating_add(batch)
            .min(self.config.long_tasks_buffer);
        let next = self.publisher.borrow().clone();
        self.publish(next);
        debug!("long task batch of {batch} applied");
    }

    fn publish(&self, mut next: ResourceSnapshot) {
        next.long_tasks_count = self.long_tasks_count;
        next.last_updated = Utc::now();
        next.reclassify();
        self.publisher.send_replace(next);
    }
}

fn sample_ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_event<T>(stream: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match stream {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}
