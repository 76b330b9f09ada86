use std::sync::Mutex;

use sysinfo::{Pid, ProcessesToUpdate, System};

use super::{HeapStats, NetworkStatus, Platform};

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;
const BYTES_PER_MB: f64 = (1u64 << 20) as f64;

/// Probe backend for the host this process actually runs on.
///
/// Installed memory maps to the device-memory probe, logical cores to the
/// concurrency probe, and this process's resident memory to the agent-memory
/// measurement. Network information, heap introspection, and long-task
/// observation have no host equivalent here, so those probes read absent;
/// the monitor treats that the same as any other unsupported capability.
pub struct SystemPlatform {
    system: Mutex<System>,
    pid: Pid,
}

impl SystemPlatform {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SystemPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for SystemPlatform {
    fn device_memory_gb(&self) -> Option<f64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        let bytes = system.total_memory();
        if bytes == 0 {
            return None;
        }
        Some(bytes as f64 / BYTES_PER_GB)
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        std::thread::available_parallelism()
            .ok()
            .map(|n| n.get() as u32)
    }

    fn network_status(&self) -> Option<NetworkStatus> {
        None
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        None
    }

    fn measure_ua_memory_mb(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
        let bytes = system.process(self.pid)?.memory();
        if bytes == 0 {
            return None;
        }
        Some((bytes as f64 / BYTES_PER_MB).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_probes_report_something_plausible() {
        let platform = SystemPlatform::new();

        let cores = platform.hardware_concurrency().unwrap();
        assert!(cores >= 1);

        if let Some(memory_gb) = platform.device_memory_gb() {
            assert!(memory_gb > 0.0);
        }
    }

    #[test]
    fn unsupported_probes_read_absent() {
        let platform = SystemPlatform::new();
        assert!(platform.network_status().is_none());
        assert!(platform.heap_stats().is_none());

        let events = platform.take_events();
        assert!(events.network_changes.is_none());
        assert!(events.long_task_batches.is_none());
    }

    #[test]
    fn own_process_memory_is_measurable() {
        let platform = SystemPlatform::new();
        if let Some(mb) = platform.measure_ua_memory_mb() {
            assert!(mb > 0);
        }
    }
}
