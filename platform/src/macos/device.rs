//! macOS device opening: raw `File` I/O on `/dev/rdiskN` (the
//! unbuffered "raw" device node), geometry from `diskutil info -plist`
//! since macOS has no public ioctl for this the way Linux/Windows do
//! (matching the teacher's own macOS module, which shells out to
//! `diskutil` rather than reaching for IOKit).

use ptable_core::{BlockDevice, DeviceGeometry, PtableError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::process::Command;

pub struct MacOsBlockDevice {
    file: File,
    sector_size: u32,
    sector_count: u64,
    read_only: bool,
}

impl BlockDevice for MacOsBlockDevice {
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

fn diskutil_field(path: &str, key: &str) -> Option<u64> {
    let output = Command::new("diskutil").args(["info", path]).output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    text.lines()
        .find(|l| l.trim_start().starts_with(key))
        .and_then(|l| l.split(':').nth(1))
        .and_then(|v| v.trim().split_whitespace().next())
        .and_then(|v| v.parse().ok())
}

pub fn open(path: &str, read_only: bool) -> Result<(Box<dyn BlockDevice>, DeviceGeometry)> {
    let file = OpenOptions::new()
        .read(true)
        .write(!read_only)
        .open(path)
        .map_err(PtableError::IoError)?;

    let logical_sector_size = diskutil_field(path, "Device Block Size").unwrap_or(512) as u32;
    let total_size_bytes = diskutil_field(path, "Disk Size").unwrap_or(0);
    let total_sectors = total_size_bytes / logical_sector_size.max(1) as u64;

    let geometry = DeviceGeometry::simple(logical_sector_size.max(512), total_sectors.max(1));

    log::info!("opened {} as {} sectors of {} bytes", path, geometry.total_sectors, geometry.logical_sector_size);

    Ok((
        Box::new(MacOsBlockDevice {
            file,
            sector_size: geometry.logical_sector_size,
            sector_count: geometry.total_sectors,
            read_only,
        }),
        geometry,
    ))
}
