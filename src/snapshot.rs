use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::heuristics::{classify_low_end, HeuristicInput};

/// Point-in-time aggregate of every probe plus the derived classification.
///
/// Snapshots are replaced wholesale on every update and never mutated after
/// publication. Optional fields read `None` when the platform cannot measure
/// them; the verdict fields are always derived from this snapshot's own
/// values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub device_memory_gb: Option<f64>,
    pub hardware_concurrency: Option<u32>,
    /// Coarse connection label, e.g. "2g", "3g", "4g".
    pub effective_type: Option<String>,
    pub save_data: Option<bool>,
    pub rtt_ms: Option<u32>,
    pub downlink_mbps: Option<f64>,
    /// Heap figures in bytes.
    pub js_heap_size_limit: Option<u64>,
    pub total_js_heap_size: Option<u64>,
    pub used_js_heap_size: Option<u64>,
    /// Memory attributed to this agent, in megabytes.
    pub ua_memory_mb: Option<u64>,
    pub long_tasks_count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
    pub is_low_end_device: bool,
    pub low_end_reasons: Vec<String>,
}

impl ResourceSnapshot {
    /// Snapshot with nothing measured yet.
    pub(crate) fn empty(now: DateTime<Utc>) -> Self {
        Self {
            device_memory_gb: None,
            hardware_concurrency: None,
            effective_type: None,
            save_data: None,
            rtt_ms: None,
            downlink_mbps: None,
            js_heap_size_limit: None,
            total_js_heap_size: None,
            used_js_heap_size: None,
            ua_memory_mb: None,
            long_tasks_count: 0,
            last_updated: now,
            is_low_end_device: false,
            low_end_reasons: Vec::new(),
        }
    }

    /// Recompute the low-end verdict from this snapshot's own fields.
    pub(crate) fn reclassify(&mut self) {
        let verdict = classify_low_end(&HeuristicInput {
            device_memory_gb: self.device_memory_gb,
            hardware_concurrency: self.hardware_concurrency,
            effective_type: self.effective_type.as_deref(),
            save_data: self.save_data,
            ua_memory_mb: self.ua_memory_mb,
            js_heap_size_limit: self.js_heap_size_limit,
            long_tasks_count: self.long_tasks_count,
        });
        self.is_low_end_device = verdict.is_low_end_device;
        self.low_end_reasons = verdict.reasons;
    }

    /// One-line summary suitable for logging or CLI display.
    ///
    /// # Example output
    /// ```text
    /// Device: mem 16GB, 8 cores, net n/a, ua mem 412MB, long tasks 0, verdict OK
    /// ```
    pub fn summary(&self) -> String {
        let memory = self
            .device_memory_gb
            .map(|gb| format!("{gb}GB"))
            .unwrap_or_else(|| "n/a".to_string());
        let cores = self
            .hardware_concurrency
            .map(|n| n.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let network = self.effective_type.as_deref().unwrap_or("n/a");
        let ua_memory = self
            .ua_memory_mb
            .map(|mb| format!("{mb}MB"))
            .unwrap_or_else(|| "n/a".to_string());
        let verdict = if self.is_low_end_device {
            "LOW-END"
        } else {
            "OK"
        };

        format!(
            "Device: mem {memory}, {cores} cores, net {network}, ua mem {ua_memory}, \
             long tasks {}, verdict {verdict}",
            self.long_tasks_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> ResourceSnapshot {
        let mut snapshot = ResourceSnapshot::empty(Utc::now());
        snapshot.device_memory_gb = Some(4.0);
        snapshot.hardware_concurrency = Some(4);
        snapshot.effective_type = Some("4g".to_string());
        snapshot.reclassify();
        snapshot
    }

    #[test]
    fn empty_snapshot_is_valid_and_not_low_end() {
        let snapshot = ResourceSnapshot::empty(Utc::now());
        assert_eq!(snapshot.long_tasks_count, 0);
        assert!(!snapshot.is_low_end_device);
        assert!(snapshot.low_end_reasons.is_empty());
    }

    #[test]
    fn reclassify_tracks_own_fields() {
        let mut snapshot = sample_snapshot();
        assert!(snapshot.is_low_end_device);
        assert_eq!(snapshot.low_end_reasons, ["deviceMemory ≤ 4GB", "CPU ≤ 4 cores"]);

        snapshot.device_memory_gb = Some(16.0);
        snapshot.hardware_concurrency = Some(12);
        snapshot.reclassify();
        assert!(!snapshot.is_low_end_device);
        assert!(snapshot.low_end_reasons.is_empty());
    }

    #[test]
    fn summary_mentions_the_interesting_fields() {
        let snapshot = sample_snapshot();
        let summary = snapshot.summary();
        assert!(summary.contains("4GB"));
        assert!(summary.contains("4 cores"));
        assert!(summary.contains("net 4g"));
        assert!(summary.contains("LOW-END"));
    }

    #[test]
    fn serializes_with_camel_case_keys_and_millisecond_timestamps() {
        let snapshot = sample_snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("isLowEndDevice").is_some());
        assert!(value.get("longTasksCount").is_some());
        assert!(value.get("jsHeapSizeLimit").is_some());
        assert!(value["lastUpdated"].is_i64());
    }
}
