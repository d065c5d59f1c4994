//! Volume descriptions and the writable-volume listing

use crate::io::probe_writable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::{DiskKind, Disks};
use tracing::debug;

/// Hardware descriptors of the device behind a volume
///
/// Fields the host cannot report are left empty / zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub media_type: String,
    pub smart_status: String,
    /// Spindle speed in RPM, 0 for solid state or unknown
    pub rotation_rate: u32,
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
}

/// Snapshot of a benchmark target taken at selection time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    /// Directory the test file is written into
    pub path: PathBuf,
    pub capacity: u64,
    pub free_space: u64,
    pub filesystem: String,
    pub is_internal: bool,
    pub is_removable: bool,
    pub hardware: HardwareInfo,
}

impl Volume {
    /// Volume for an arbitrary directory, without device metadata
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            name,
            path,
            capacity: 0,
            free_space: 0,
            filesystem: String::new(),
            is_internal: false,
            is_removable: false,
            hardware: HardwareInfo::default(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.path.display())
    }
}

/// Source of selectable volumes
pub trait VolumeProvider {
    /// Point-in-time list of volumes that passed the writability probe
    fn list_writable_volumes(&self) -> Vec<Volume>;
}

/// Mounted volumes of the host, discovered through `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeProvider for SystemVolumes {
    fn list_writable_volumes(&self) -> Vec<Volume> {
        let disks = Disks::new_with_refreshed_list();
        let mut volumes: Vec<Volume> = Vec::new();

        for disk in disks.list() {
            let mount = disk.mount_point();
            let is_root = is_root_mount(mount);

            // the root filesystem is tested through the temp directory
            let path = if is_root {
                std::env::temp_dir()
            } else {
                mount.to_path_buf()
            };

            if volumes.iter().any(|v| v.path == path) {
                continue;
            }
            if !probe_writable(&path) {
                debug!(path = %path.display(), "skipping volume that failed the writability probe");
                continue;
            }

            let mut name = disk.name().to_string_lossy().into_owned();
            if name.is_empty() {
                name = mount.display().to_string();
            }
            if is_root {
                name.push_str(" (Main Disk)");
            }

            let media_type = match disk.kind() {
                DiskKind::HDD => "HDD".to_string(),
                DiskKind::SSD => "SSD".to_string(),
                DiskKind::Unknown(_) => String::new(),
            };

            volumes.push(Volume {
                name,
                path,
                capacity: disk.total_space(),
                free_space: disk.available_space(),
                filesystem: disk.file_system().to_string_lossy().into_owned(),
                is_internal: !disk.is_removable(),
                is_removable: disk.is_removable(),
                hardware: HardwareInfo {
                    media_type,
                    ..HardwareInfo::default()
                },
            });
        }

        volumes
    }
}

fn is_root_mount(mount: &Path) -> bool {
    cfg!(unix) && mount == Path::new("/")
}
