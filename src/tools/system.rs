//! Machine health: CPU, memory, disk and battery

use std::path::Path;

use async_trait::async_trait;
use sysinfo::{Disks, System};

use crate::actions::{Action, ActionArgs, ActionContext};
use crate::{Error, Result};

/// Battery reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    pub percent: f32,
    pub plugged_in: bool,
}

/// Point-in-time usage figures, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSnapshot {
    pub cpu: f32,
    pub memory: f32,
    pub disk: f32,
    pub battery: Option<Battery>,
}

impl SystemSnapshot {
    /// Sample the machine; blocks for the CPU measurement interval
    #[must_use]
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            cpu: sys.global_cpu_usage(),
            memory: percent(sys.used_memory(), sys.total_memory()),
            disk: root_disk_usage(),
            battery: read_battery(Path::new("/sys/class/power_supply")),
        }
    }

    /// Spoken multi-line report
    #[must_use]
    pub fn report(&self) -> String {
        let battery = self.battery.map_or_else(
            || "Battery: Not available (desktop system)".to_string(),
            |b| {
                let source = if b.plugged_in { "plugged in" } else { "on battery" };
                format!("Battery: {:.0}% ({source})", b.percent)
            },
        );
        format!(
            "System Status:\n- CPU Usage: {:.1}%\n- Memory Usage: {:.1}%\n- Disk Usage: {:.1}%\n- {battery}",
            self.cpu, self.memory, self.disk
        )
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}

/// Usage of the volume mounted at `/` (or the first disk elsewhere)
fn root_disk_usage() -> f32 {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first());
    disk.map_or(0.0, |d| {
        percent(d.total_space().saturating_sub(d.available_space()), d.total_space())
    })
}

/// First battery under a Linux `power_supply` sysfs directory
fn read_battery(power_supply: &Path) -> Option<Battery> {
    let entries = std::fs::read_dir(power_supply).ok()?;
    entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("BAT"))
        .find_map(|entry| {
            let dir = entry.path();
            let percent = std::fs::read_to_string(dir.join("capacity"))
                .ok()?
                .trim()
                .parse::<f32>()
                .ok()?;
            let status = std::fs::read_to_string(dir.join("status")).unwrap_or_default();
            Some(Battery {
                percent,
                plugged_in: status.trim() != "Discharging",
            })
        })
}

/// `get_system_status` action
#[derive(Debug, Default)]
pub struct SystemStatusTool;

#[async_trait]
impl Action for SystemStatusTool {
    async fn run(&self, _args: &ActionArgs, _ctx: &ActionContext) -> Result<String> {
        let snapshot = tokio::task::spawn_blocking(SystemSnapshot::collect)
            .await
            .map_err(|e| Error::External(format!("Could not retrieve system status: {e}")))?;

        tracing::info!(
            cpu = snapshot.cpu,
            memory = snapshot.memory,
            disk = snapshot.disk,
            "system status retrieved"
        );
        Ok(snapshot.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_with_battery() {
        let snapshot = SystemSnapshot {
            cpu: 12.34,
            memory: 56.0,
            disk: 78.91,
            battery: Some(Battery {
                percent: 80.0,
                plugged_in: false,
            }),
        };
        assert_eq!(
            snapshot.report(),
            "System Status:\n- CPU Usage: 12.3%\n- Memory Usage: 56.0%\n- Disk Usage: 78.9%\n- Battery: 80% (on battery)"
        );
    }

    #[test]
    fn report_without_battery() {
        let snapshot = SystemSnapshot {
            cpu: 0.0,
            memory: 0.0,
            disk: 0.0,
            battery: None,
        };
        assert!(snapshot.report().ends_with("- Battery: Not available (desktop system)"));
    }

    #[test]
    fn percent_handles_zero_total() {
        assert!((percent(5, 0) - 0.0).abs() < f32::EPSILON);
        assert!((percent(1, 4) - 25.0).abs() < 0.001);
    }

    #[test]
    fn reads_sysfs_battery() {
        let dir = tempfile::tempdir().unwrap();
        let bat = dir.path().join("BAT0");
        std::fs::create_dir(&bat).unwrap();
        std::fs::write(bat.join("capacity"), "64\n").unwrap();
        std::fs::write(bat.join("status"), "Charging\n").unwrap();
        std::fs::create_dir(dir.path().join("AC")).unwrap();

        assert_eq!(
            read_battery(dir.path()),
            Some(Battery {
                percent: 64.0,
                plugged_in: true
            })
        );
    }

    #[test]
    fn no_battery_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_battery(&dir.path().join("missing")), None);
    }

    #[tokio::test]
    async fn action_reports_live_figures() {
        let text = SystemStatusTool
            .run(&ActionArgs::default(), &crate::testsupport::context())
            .await
            .unwrap();
        assert!(text.starts_with("System Status:\n- CPU Usage: "));
    }
}
