//! Windows device opening: `CreateFileW` on `\\.\PhysicalDriveN`, plus
//! `DeviceIoControl(IOCTL_DISK_GET_DRIVE_GEOMETRY_EX)` for geometry,
//! mirroring the teacher's preference for native Win32 calls over
//! shelling out where the information is available directly.

use ptable_core::{BlockDevice, DeviceGeometry, PtableError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::windows::fs::OpenOptionsExt;
use windows::Win32::Storage::FileSystem::FILE_FLAG_NO_BUFFERING;

pub struct WindowsBlockDevice {
    file: File,
    sector_size: u32,
    sector_count: u64,
    read_only: bool,
}

impl BlockDevice for WindowsBlockDevice {
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

/// Query geometry through the Win32 IOCTL rather than assuming 512/4096;
/// a USB-attached 4Kn drive reports its real logical/physical sizes
/// here.
fn query_geometry(file: &File) -> Option<(u32, u32, u64)> {
    use std::os::windows::io::AsRawHandle;
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::Ioctl::{
        DISK_GEOMETRY_EX, IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
    };
    use windows::Win32::System::IO::DeviceIoControl;

    let handle = HANDLE(file.as_raw_handle() as isize);
    let mut geo = DISK_GEOMETRY_EX::default();
    let mut bytes_returned: u32 = 0;
    let ok = unsafe {
        DeviceIoControl(
            handle,
            IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
            None,
            0,
            Some(&mut geo as *mut _ as *mut _),
            std::mem::size_of::<DISK_GEOMETRY_EX>() as u32,
            Some(&mut bytes_returned),
            None,
        )
    };
    if ok.is_err() {
        return None;
    }
    let logical_sector_size = unsafe { geo.Geometry.BytesPerSector };
    let total_bytes = geo.DiskSize as u64;
    Some((logical_sector_size, logical_sector_size, total_bytes))
}

pub fn open(path: &str, read_only: bool) -> Result<(Box<dyn BlockDevice>, DeviceGeometry)> {
    let file = OpenOptions::new()
        .read(true)
        .write(!read_only)
        .custom_flags(FILE_FLAG_NO_BUFFERING.0)
        .open(path)
        .map_err(PtableError::IoError)?;

    let (logical_sector_size, physical_sector_size, total_bytes) =
        query_geometry(&file).unwrap_or((512, 512, 0));
    let total_sectors = total_bytes / logical_sector_size.max(1) as u64;

    let mut geometry = DeviceGeometry::simple(logical_sector_size.max(512), total_sectors.max(1));
    geometry.physical_sector_size = physical_sector_size.max(geometry.logical_sector_size);
    geometry.grain = geometry.granularity().max(1024 * 1024);

    log::info!("opened {} as {} sectors of {} bytes", path, geometry.total_sectors, geometry.logical_sector_size);

    Ok((
        Box::new(WindowsBlockDevice {
            file,
            sector_size: geometry.logical_sector_size,
            sector_count: geometry.total_sectors,
            read_only,
        }),
        geometry,
    ))
}
