//! Device resource sensing for adaptive consumers.
//!
//! `devicesense` watches the resources of the device it runs on (installed
//! memory, core count, network conditions, heap usage, long tasks) and
//! folds them into a single [`ResourceSnapshot`] with a low-end verdict
//! attached. Every capability is optional: hosts that cannot measure
//! something report it absent, and the monitor carries on with the rest.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use devicesense::{MonitorConfig, ResourceMonitor, SystemPlatform};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let platform = Arc::new(SystemPlatform::new());
//! let mut monitor = ResourceMonitor::start(platform, MonitorConfig::default());
//!
//! let snapshot = monitor.snapshot();
//! if snapshot.is_low_end_device {
//!     println!("going conservative: {}", snapshot.low_end_reasons.join(", "));
//! }
//!
//! monitor.stop().await.unwrap();
//! # }
//! ```

mod config;
mod heuristics;
mod monitor;
mod platform;
mod snapshot;
mod store;

pub use config::MonitorConfig;
pub use heuristics::{classify_low_end, HeuristicInput, LowEndVerdict, LOW_END_SCORE_THRESHOLD};
pub use monitor::ResourceMonitor;
pub use platform::{HeapStats, NetworkStatus, Platform, PlatformEvents, SystemPlatform};
pub use snapshot::ResourceSnapshot;
pub use store::{KvStore, StoreChange};
