//! Linux device opening and geometry discovery: sysfs for the facts
//! `blockdev`/`fdisk` would otherwise shell out for, raw `File` I/O for
//! sector reads/writes (grounded on the teacher's own preference for
//! reading `/sys/block/*` directly over parsing command output where
//! possible, `platform/src/linux/device.rs`'s `is_removable`/
//! `get_device_type`).

use ptable_core::{BlockDevice, DeviceGeometry, PtableError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub struct LinuxBlockDevice {
    file: File,
    sector_size: u32,
    sector_count: u64,
    read_only: bool,
}

impl BlockDevice for LinuxBlockDevice {
    fn read_sector(&mut self, lba: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.sector_size as usize];
        self.file
            .seek(SeekFrom::Start(lba * self.sector_size as u64))
            .map_err(PtableError::IoError)?;
        self.file.read_exact(&mut buf).map_err(PtableError::IoError)?;
        Ok(buf)
    }

    fn write_sector(&mut self, lba: u64, data: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(PtableError::BusyInUse("device opened read-only".into()));
        }
        self.file
            .seek(SeekFrom::Start(lba * self.sector_size as u64))
            .map_err(PtableError::IoError)?;
        self.file.write_all(data).map_err(PtableError::IoError)?;
        Ok(())
    }

    fn sector_count(&self) -> u64 {
        self.sector_count
    }

    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

fn sysfs_u64(block_name: &str, leaf: &str) -> Option<u64> {
    std::fs::read_to_string(format!("/sys/block/{}/{}", block_name, leaf))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn block_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn open(path: &str, read_only: bool) -> Result<(Box<dyn BlockDevice>, DeviceGeometry)> {
    let file = OpenOptions::new()
        .read(true)
        .write(!read_only)
        .open(path)
        .map_err(PtableError::IoError)?;

    let name = block_name_from_path(path);
    // `/sys/block/<name>/size` is always in 512-byte units regardless
    // of the device's logical sector size.
    let sectors_512 = sysfs_u64(&name, "size").unwrap_or(0);
    let logical_sector_size = sysfs_u64(&name, "queue/logical_block_size").unwrap_or(512) as u32;
    let physical_sector_size = sysfs_u64(&name, "queue/physical_block_size").unwrap_or(logical_sector_size as u64) as u32;
    let minimum_io_size = sysfs_u64(&name, "queue/minimum_io_size").unwrap_or(logical_sector_size as u64) as u32;
    let optimal_io_size = sysfs_u64(&name, "queue/optimal_io_size").unwrap_or(0) as u32;
    let alignment_offset = sysfs_u64(&name, "alignment_offset").unwrap_or(0) as u32;

    let total_bytes = sectors_512 * 512;
    let total_sectors = if logical_sector_size > 0 {
        total_bytes / logical_sector_size as u64
    } else {
        0
    };

    let mut geometry = DeviceGeometry::simple(logical_sector_size.max(512), total_sectors.max(1));
    geometry.physical_sector_size = physical_sector_size.max(geometry.logical_sector_size);
    geometry.minimum_io_size = minimum_io_size.max(geometry.logical_sector_size);
    geometry.optimal_io_size = if optimal_io_size > 0 { optimal_io_size } else { geometry.minimum_io_size };
    geometry.alignment_offset = alignment_offset;
    geometry.grain = geometry.granularity().max(1024 * 1024);

    log::info!(
        "opened {} as {} sectors of {} bytes (physical {}, grain {})",
        path, geometry.total_sectors, geometry.logical_sector_size, geometry.physical_sector_size, geometry.grain
    );

    Ok((
        Box::new(LinuxBlockDevice {
            file,
            sector_size: geometry.logical_sector_size,
            sector_count: geometry.total_sectors,
            read_only,
        }),
        geometry,
    ))
}
