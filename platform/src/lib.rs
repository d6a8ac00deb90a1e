//! Per-OS device opening (C1, spec §1): turns a device path into a
//! `Box<dyn BlockDevice>` plus the `DeviceGeometry` the engine needs,
//! and nothing else. Enumerating every device on the system, checking
//! mount state, or deciding whether a disk is "safe to format" belongs
//! to the host, not this crate (spec §9).

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

use ptable_core::{BlockDevice, DeviceGeometry, Result};

/// Open `path` for sector I/O and discover its geometry, dispatching to
/// the per-OS implementation compiled for this target.
pub fn open_device(path: &str, read_only: bool) -> Result<(Box<dyn BlockDevice>, DeviceGeometry)> {
    #[cfg(target_os = "linux")]
    {
        linux::open(path, read_only)
    }
    #[cfg(target_os = "windows")]
    {
        windows::open(path, read_only)
    }
    #[cfg(target_os = "macos")]
    {
        macos::open(path, read_only)
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        let _ = (path, read_only);
        Err(ptable_core::PtableError::Unsupported(
            "no platform device backend compiled for this target".into(),
        ))
    }
}

/// The platform-specific default probe list used when the CLI is given
/// no device path (spec §6: "Default: probe a platform-specific list").
pub fn default_probe_paths() -> &'static [&'static str] {
    #[cfg(target_os = "linux")]
    {
        &["/dev/sda", "/dev/vda", "/dev/nvme0n1", "/dev/hda"]
    }
    #[cfg(target_os = "windows")]
    {
        &["\\\\.\\PhysicalDrive0", "\\\\.\\PhysicalDrive1"]
    }
    #[cfg(target_os = "macos")]
    {
        &["/dev/disk0", "/dev/disk1"]
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        &[]
    }
}
