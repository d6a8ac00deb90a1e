//! The narrow sector I/O interface (C1) the engine is built on.
//!
//! `BlockDevice` is deliberately small: absolute-sector read/write plus
//! the handful of geometry facts the alignment engine and label drivers
//! need. Locking, rereading the kernel's view of the table after a
//! write, and anything beyond this interface belongs to the host
//! (spec §1, out of scope).

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Geometry and I/O facts discovered about a device, independent of any
/// particular label format (spec §3 "Device context").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceGeometry {
    pub logical_sector_size: u32,
    pub physical_sector_size: u32,
    pub minimum_io_size: u32,
    pub optimal_io_size: u32,
    pub alignment_offset: u32,
    pub total_sectors: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    /// Alignment grain in bytes, typically the larger of the optimal
    /// I/O size and 1 MiB (spec §4.1, GLOSSARY "Grain").
    pub grain: u64,
}

impl DeviceGeometry {
    /// Build a geometry record for a plain file or block device of
    /// `total_sectors` sectors of `logical_sector_size` bytes, with no
    /// reported physical/optimal-I/O hints (the common case for a disk
    /// image or a device whose topology ioctls are unavailable).
    pub fn simple(logical_sector_size: u32, total_sectors: u64) -> Self {
        let grain_sectors = (1024 * 1024 / logical_sector_size as u64).max(1);
        Self {
            logical_sector_size,
            physical_sector_size: logical_sector_size,
            minimum_io_size: logical_sector_size,
            optimal_io_size: logical_sector_size,
            alignment_offset: 0,
            total_sectors,
            first_usable_lba: grain_sectors,
            last_usable_lba: total_sectors.saturating_sub(1),
            grain: grain_sectors * logical_sector_size as u64,
        }
    }

    /// `max(physical_sector_size, minimum_io_size, grain)`, in bytes
    /// (spec §4.1).
    pub fn granularity(&self) -> u64 {
        (self.physical_sector_size as u64)
            .max(self.minimum_io_size as u64)
            .max(self.grain)
    }
}

/// Absolute-sector read/write/size, the only I/O surface the engine
/// calls into (spec §1, §5).
pub trait BlockDevice: Send + Sync {
    /// Read exactly one logical sector starting at `lba`.
    fn read_sector(&mut self, lba: u64) -> Result<Vec<u8>>;

    /// Write exactly one logical sector's worth of bytes at `lba`.
    /// `data.len()` must equal the device's logical sector size.
    fn write_sector(&mut self, lba: u64, data: &[u8]) -> Result<()>;

    /// Total sector count as last discovered.
    fn sector_count(&self) -> u64;

    /// Logical sector size in bytes.
    fn sector_size(&self) -> u32;

    fn is_read_only(&self) -> bool {
        false
    }
}

/// Lets a host hand a `Box<dyn BlockDevice>` (what `ptable-platform`
/// returns) straight to `Context::new`, which wants the device behind
/// an `Rc<RefCell<_>>` for nested-context sharing.
impl BlockDevice for Box<dyn BlockDevice> {
    fn read_sector(&mut self, lba: u64) -> Result<Vec<u8>> {
        (**self).read_sector(lba)
    }

    fn write_sector(&mut self, lba: u64, data: &[u8]) -> Result<()> {
        (**self).write_sector(lba, data)
    }

    fn sector_count(&self) -> u64 {
        (**self).sector_count()
    }

    fn sector_size(&self) -> u32 {
        (**self).sector_size()
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }
}
