use std::time::Duration;

/// Configuration for the resource monitor with tunable sampling behavior.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Period between async memory samples. `Duration::ZERO` disables
    /// periodic sampling (the startup sample still runs once).
    pub sample_interval: Duration,

    /// Subscribe to long-task batches when the platform delivers them.
    pub observe_long_tasks: bool,

    /// Upper bound for the running long-task count.
    pub long_tasks_buffer: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(30),
            observe_long_tasks: true,
            long_tasks_buffer: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MonitorConfig::default();
        assert_eq!(config.sample_interval, Duration::from_secs(30));
        assert!(config.observe_long_tasks);
        assert_eq!(config.long_tasks_buffer, 50);
    }
}
