//! Capability probes behind one injected seam.
//!
//! Every host capability is optional: probing an absent one yields `None`,
//! never an error. The monitor is constructed against `Arc<dyn Platform>`,
//! so tests can drive it with fake probe values and hand-injected events.

mod system;

pub use system::SystemPlatform;

use tokio::sync::mpsc;

/// Connection state as reported by a network-information capability.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkStatus {
    /// Coarse connection label, e.g. "2g", "3g", "4g".
    pub effective_type: Option<String>,
    pub save_data: bool,
    pub rtt_ms: Option<u32>,
    pub downlink_mbps: Option<f64>,
}

/// Heap usage as reported by a heap-introspection capability, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub js_heap_size_limit: u64,
    pub total_js_heap_size: u64,
    pub used_js_heap_size: u64,
}

/// Change streams a platform may deliver. `None` means the capability is
/// unavailable and the monitor carries on without it.
#[derive(Debug, Default)]
pub struct PlatformEvents {
    /// Fires whenever the network-information values may have changed.
    pub network_changes: Option<mpsc::UnboundedReceiver<()>>,
    /// Batches of observed long tasks, delivered as batch sizes.
    pub long_task_batches: Option<mpsc::UnboundedReceiver<u32>>,
}

/// Host capability access for the resource monitor.
///
/// Implementations must not fail: an unsupported or broken capability reads
/// as `None` and the monitor degrades silently. There is deliberately no
/// error type anywhere on this trait.
pub trait Platform: Send + Sync + 'static {
    /// Installed memory in gigabytes, when the host exposes it.
    fn device_memory_gb(&self) -> Option<f64>;

    /// Logical core count, when the host exposes it.
    fn hardware_concurrency(&self) -> Option<u32>;

    /// Current network-information values, when supported.
    fn network_status(&self) -> Option<NetworkStatus>;

    /// Current heap usage, when supported.
    fn heap_stats(&self) -> Option<HeapStats>;

    /// Memory attributed to this agent, rounded to megabytes. Allowed to
    /// block; the monitor always calls it from a blocking worker.
    fn measure_ua_memory_mb(&self) -> Option<u64>;

    /// Hands over the platform's change streams. Called once per monitor.
    /// A platform whose observer setup fails must return `None` streams
    /// rather than panic.
    fn take_events(&self) -> PlatformEvents {
        PlatformEvents::default()
    }
}
