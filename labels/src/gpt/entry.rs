//! The 128-byte GPT partition entry.

use super::guid::{from_mixed_endian_bytes, to_mixed_endian_bytes};
use uuid::Uuid;

pub const ENTRY_SIZE: usize = 128;

#[derive(Debug, Clone)]
pub struct GptEntry {
    pub type_guid: Uuid,
    pub unique_guid: Uuid,
    pub first_lba: u64,
    pub last_lba: u64,
    pub attributes: u64,
    pub name: String,
}

impl GptEntry {
    pub fn is_empty(&self) -> bool {
        self.type_guid.is_nil()
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut b = [0u8; ENTRY_SIZE];
        if self.is_empty() {
            return b;
        }
        b[0..16].copy_from_slice(&to_mixed_endian_bytes(self.type_guid));
        b[16..32].copy_from_slice(&to_mixed_endian_bytes(self.unique_guid));
        b[32..40].copy_from_slice(&self.first_lba.to_le_bytes());
        b[40..48].copy_from_slice(&self.last_lba.to_le_bytes());
        b[48..56].copy_from_slice(&self.attributes.to_le_bytes());
        let utf16: Vec<u16> = self.name.encode_utf16().take(36).collect();
        for (i, unit) in utf16.iter().enumerate() {
            let off = 56 + i * 2;
            b[off..off + 2].copy_from_slice(&unit.to_le_bytes());
        }
        b
    }

    pub fn from_bytes(b: &[u8]) -> Self {
        let type_guid = from_mixed_endian_bytes(&b[0..16]);
        if type_guid.is_nil() {
            return Self::empty();
        }
        let unique_guid = from_mixed_endian_bytes(&b[16..32]);
        let mut units = Vec::with_capacity(36);
        for i in 0..36 {
            let off = 56 + i * 2;
            let u = u16::from_le_bytes([b[off], b[off + 1]]);
            if u == 0 {
                break;
            }
            units.push(u);
        }
        let name = String::from_utf16_lossy(&units);
        Self {
            type_guid,
            unique_guid,
            first_lba: u64::from_le_bytes(b[32..40].try_into().unwrap()),
            last_lba: u64::from_le_bytes(b[40..48].try_into().unwrap()),
            attributes: u64::from_le_bytes(b[48..56].try_into().unwrap()),
            name,
        }
    }

    pub fn empty() -> Self {
        Self {
            type_guid: Uuid::nil(),
            unique_guid: Uuid::nil(),
            first_lba: 0,
            last_lba: 0,
            attributes: 0,
            name: String::new(),
        }
    }
}
