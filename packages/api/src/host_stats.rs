// ABOUTME: Point-in-time CPU, memory and disk snapshot of the host
// ABOUTME: Collected with sysinfo on the blocking pool

use serde::Serialize;
use sysinfo::{Disks, System};

#[derive(Debug, Clone, Serialize)]
pub struct MemorySnapshot {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskSnapshot {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuSnapshot {
    pub cores: usize,
    pub usage_percent: f32,
    pub load_average: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub memory: MemorySnapshot,
    pub disk: DiskSnapshot,
    pub cpu: CpuSnapshot,
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64) * 100.0
    }
}

/// Blocking; samples CPU usage twice around the minimum update interval
pub fn collect() -> HostSnapshot {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();

    let memory = MemorySnapshot {
        total: sys.total_memory(),
        used: sys.used_memory(),
        available: sys.available_memory(),
        usage_percent: percent(sys.used_memory(), sys.total_memory()),
    };

    // Root filesystem, else the largest disk
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|d| d.total_space()))
        .map(|d| {
            let used = d.total_space().saturating_sub(d.available_space());
            DiskSnapshot {
                total: d.total_space(),
                used,
                available: d.available_space(),
                usage_percent: percent(used, d.total_space()),
            }
        })
        .unwrap_or(DiskSnapshot {
            total: 0,
            used: 0,
            available: 0,
            usage_percent: 0.0,
        });

    let load = System::load_average();
    let cpu = CpuSnapshot {
        cores: sys.cpus().len(),
        usage_percent: sys.global_cpu_info().cpu_usage(),
        load_average: [load.one, load.five, load.fifteen],
    };

    HostSnapshot { memory, disk, cpu }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_handles_zero_total() {
        assert_eq!(percent(10, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }

    #[test]
    fn test_collect_reports_memory() {
        let snapshot = collect();
        assert!(snapshot.memory.total >= snapshot.memory.used);
        assert!(snapshot.disk.total >= snapshot.disk.used);
    }
}
