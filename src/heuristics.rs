//! Low-end device classification.
//!
//! A fixed weighted rule table: each matched rule adds its score and a
//! human-readable reason, and the device is classified low-end when the
//! total reaches [`LOW_END_SCORE_THRESHOLD`]. Reasons come back in rule
//! order, matched rules only.

/// Score at or above which a device is classified low-end.
pub const LOW_END_SCORE_THRESHOLD: u32 = 2;

const UA_MEMORY_LOW_MB: u64 = 1500;
const HEAP_LIMIT_LOW_BYTES: u64 = 512 * 1024 * 1024;
const LONG_TASKS_LOW_WATERMARK: u32 = 5;

/// Probe values the scorer looks at. Everything optional except the
/// long-task count; absent values match no rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicInput<'a> {
    pub device_memory_gb: Option<f64>,
    pub hardware_concurrency: Option<u32>,
    pub effective_type: Option<&'a str>,
    pub save_data: Option<bool>,
    pub ua_memory_mb: Option<u64>,
    pub js_heap_size_limit: Option<u64>,
    pub long_tasks_count: u32,
}

/// Outcome of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowEndVerdict {
    pub is_low_end_device: bool,
    pub reasons: Vec<String>,
}

/// Evaluate the rule table. Deterministic and side-effect free.
pub fn classify_low_end(input: &HeuristicInput<'_>) -> LowEndVerdict {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    if let Some(memory_gb) = input.device_memory_gb {
        if memory_gb <= 2.0 {
            score += 2;
            reasons.push("deviceMemory ≤ 2GB".to_string());
        } else if memory_gb <= 4.0 {
            score += 1;
            reasons.push("deviceMemory ≤ 4GB".to_string());
        }
    }

    if let Some(cores) = input.hardware_concurrency {
        if cores <= 2 {
            score += 2;
            reasons.push("CPU ≤ 2 cores".to_string());
        } else if cores <= 4 {
            score += 1;
            reasons.push("CPU ≤ 4 cores".to_string());
        }
    }

    if let Some(effective_type) = input.effective_type {
        if is_slow_effective_type(effective_type) {
            score += 1;
            reasons.push(format!("effectiveType {effective_type}"));
        }
    }

    if input.save_data == Some(true) {
        score += 1;
        reasons.push("Save-Data enabled".to_string());
    }

    if matches!(input.ua_memory_mb, Some(mb) if mb < UA_MEMORY_LOW_MB) {
        score += 1;
        reasons.push("UA memory < 1.5GB".to_string());
    }

    if matches!(input.js_heap_size_limit, Some(bytes) if bytes < HEAP_LIMIT_LOW_BYTES) {
        score += 1;
        reasons.push("JS heap limit < 512MB".to_string());
    }

    if input.long_tasks_count >= LONG_TASKS_LOW_WATERMARK {
        score += 1;
        reasons.push("Multiple long tasks observed".to_string());
    }

    LowEndVerdict {
        is_low_end_device: score >= LOW_END_SCORE_THRESHOLD,
        reasons,
    }
}

/// Whole-label match; "slow-2g" and friends do not count.
fn is_slow_effective_type(label: &str) -> bool {
    label.eq_ignore_ascii_case("2g") || label.eq_ignore_ascii_case("3g")
}
