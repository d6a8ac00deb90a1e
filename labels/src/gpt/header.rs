//! The GPT header (spec §4.2 GLOSSARY "GPT"): signature, CRC32 over
//! itself and the partition array, and the usable-LBA range.

use super::guid::{from_mixed_endian_bytes, to_mixed_endian_bytes};
use ptable_core::{PtableError, Result};
use uuid::Uuid;

pub const SIGNATURE: &[u8; 8] = b"EFI PART";
pub const HEADER_SIZE: usize = 92;
pub const ENTRY_SIZE: u32 = 128;
pub const ENTRY_COUNT: u32 = 128;

#[derive(Debug, Clone, Copy)]
pub struct GptHeader {
    pub current_lba: u64,
    pub backup_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_guid: Uuid,
    pub entries_lba: u64,
    pub entry_count: u32,
    pub entry_size: u32,
}

impl GptHeader {
    pub fn to_bytes(self, array_crc: u32) -> Vec<u8> {
        let mut b = vec![0u8; HEADER_SIZE];
        b[0..8].copy_from_slice(SIGNATURE);
        b[8..10].copy_from_slice(&0u16.to_le_bytes());
        b[10..12].copy_from_slice(&1u16.to_le_bytes()); // revision 1.0 = 00 00 01 00
        b[12..16].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        // bytes 16..20 header CRC32, filled in last
        b[24..32].copy_from_slice(&self.current_lba.to_le_bytes());
        b[32..40].copy_from_slice(&self.backup_lba.to_le_bytes());
        b[40..48].copy_from_slice(&self.first_usable_lba.to_le_bytes());
        b[48..56].copy_from_slice(&self.last_usable_lba.to_le_bytes());
        b[56..72].copy_from_slice(&to_mixed_endian_bytes(self.disk_guid));
        b[72..80].copy_from_slice(&self.entries_lba.to_le_bytes());
        b[80..84].copy_from_slice(&self.entry_count.to_le_bytes());
        b[84..88].copy_from_slice(&self.entry_size.to_le_bytes());
        b[88..92].copy_from_slice(&array_crc.to_le_bytes());

        let mut crc_input = b.clone();
        crc_input[16..20].copy_from_slice(&[0, 0, 0, 0]);
        let crc = crc32fast::hash(&crc_input);
        b[16..20].copy_from_slice(&crc.to_le_bytes());
        b
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() < HEADER_SIZE || &b[0..8] != SIGNATURE {
            return Err(PtableError::NotFound("no GPT signature".into()));
        }
        let stored_crc = u32::from_le_bytes([b[16], b[17], b[18], b[19]]);
        let mut crc_input = b[0..HEADER_SIZE].to_vec();
        crc_input[16..20].copy_from_slice(&[0, 0, 0, 0]);
        if crc32fast::hash(&crc_input) != stored_crc {
            return Err(PtableError::InvalidOnDisk("GPT header CRC32 mismatch".into()));
        }
        let disk_guid = from_mixed_endian_bytes(&b[56..72]);
        Ok(Self {
            current_lba: u64::from_le_bytes(b[24..32].try_into().unwrap()),
            backup_lba: u64::from_le_bytes(b[32..40].try_into().unwrap()),
            first_usable_lba: u64::from_le_bytes(b[40..48].try_into().unwrap()),
            last_usable_lba: u64::from_le_bytes(b[48..56].try_into().unwrap()),
            disk_guid,
            entries_lba: u64::from_le_bytes(b[72..80].try_into().unwrap()),
            entry_count: u32::from_le_bytes(b[80..84].try_into().unwrap()),
            entry_size: u32::from_le_bytes(b[84..88].try_into().unwrap()),
        })
    }

    pub fn array_crc_of(b: &[u8]) -> u32 {
        u32::from_le_bytes([b[88], b[89], b[90], b[91]])
    }
}

/// The protective MBR GPT expects at sector 0: a single 0xee entry
/// spanning the disk (clamped to 32 bits), boot signature present.
pub fn protective_mbr_sector(sector_size: usize, total_sectors: u64) -> Vec<u8> {
    let mut sector = vec![0u8; sector_size];
    let size = total_sectors.saturating_sub(1).min(u32::MAX as u64) as u32;
    sector[446] = 0x00;
    sector[446 + 4] = 0xee;
    sector[446 + 8..446 + 12].copy_from_slice(&1u32.to_le_bytes());
    sector[446 + 12..446 + 16].copy_from_slice(&size.to_le_bytes());
    sector[510] = 0x55;
    sector[511] = 0xaa;
    sector
}
