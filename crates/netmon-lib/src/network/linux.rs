//! Linux host queries
//!
//! Reads the routing table from `/proc/net/route` and interface flags from
//! `/sys/class/net/<iface>/flags`.

use super::HostNetwork;
use crate::error::LivenessError;
use std::fs;
use std::path::{Path, PathBuf};

/// Interface is administratively up
pub const IFF_UP: u32 = 0x1;

const RTF_UP: u32 = 0x1;

/// Host network state read from procfs and sysfs
pub struct LinuxHostNetwork {
    proc_path: PathBuf,
    sys_net_path: PathBuf,
}

impl Default for LinuxHostNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHostNetwork {
    pub fn new() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sys_net_path: PathBuf::from("/sys/class/net"),
        }
    }

    /// Create with custom procfs and `/sys/class/net` roots (for testing)
    pub fn with_paths(proc_path: impl Into<PathBuf>, sys_net_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            sys_net_path: sys_net_path.into(),
        }
    }
}

impl HostNetwork for LinuxHostNetwork {
    fn default_route_interface(&self) -> Result<Option<String>, LivenessError> {
        let path = self.proc_path.join("net/route");
        let content = read(&path)?;
        Ok(parse_default_route(&content))
    }

    fn interface_up(&self, name: &str) -> Result<bool, LivenessError> {
        let entries = fs::read_dir(&self.sys_net_path).map_err(|source| LivenessError::Io {
            path: self.sys_net_path.clone(),
            source,
        })?;

        let present = entries
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name() == name);
        if !present {
            return Ok(false);
        }

        let path = self.sys_net_path.join(name).join("flags");
        let flags = parse_interface_flags(&read(&path)?).ok_or_else(|| LivenessError::Parse {
            path: path.clone(),
            reason: "expected a hexadecimal flags value".to_string(),
        })?;

        Ok(flags & IFF_UP != 0)
    }
}

fn read(path: &Path) -> Result<String, LivenessError> {
    fs::read_to_string(path).map_err(|source| LivenessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Find the interface of the lowest-metric default route in `/proc/net/route`
pub fn parse_default_route(content: &str) -> Option<String> {
    let mut best: Option<(&str, u32)> = None;

    // First line is the column header
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 {
            continue;
        }

        let (iface, destination, flags, metric, mask) =
            (fields[0], fields[1], fields[3], fields[6], fields[7]);
        if destination != "00000000" || mask != "00000000" {
            continue;
        }

        let flags = u32::from_str_radix(flags, 16).unwrap_or(0);
        if flags & RTF_UP == 0 {
            continue;
        }

        let metric = metric.parse().unwrap_or(u32::MAX);
        if best.map_or(true, |(_, best_metric)| metric < best_metric) {
            best = Some((iface, metric));
        }
    }

    best.map(|(iface, _)| iface.to_string())
}

/// Parse a sysfs flags value such as `0x1003`
pub fn parse_interface_flags(content: &str) -> Option<u32> {
    let trimmed = content.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(hex, 16).ok()
}
