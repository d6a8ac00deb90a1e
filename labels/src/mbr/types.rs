//! The MBR partition-type catalog (C4): codes 0-255, plus the
//! shortcut letters spec §4.7 lists for script type fields
//! (`L`/`S`/`E`/`X`/`U`/`R`/`V`).

use ptable_core::{PartitionType, TypeId, TypeRegistry};

const KNOWN: &[(u8, &str)] = &[
    (0x00, "Empty"),
    (0x05, "Extended"),
    (0x06, "FAT16"),
    (0x07, "HPFS/NTFS/exFAT"),
    (0x0b, "W95 FAT32"),
    (0x0c, "W95 FAT32 (LBA)"),
    (0x0f, "W95 Extended (LBA)"),
    (0x11, "Hidden FAT12"),
    (0x82, "Linux swap"),
    (0x83, "Linux"),
    (0x85, "Linux extended"),
    (0x8e, "Linux LVM"),
    (0xa5, "FreeBSD"),
    (0xa6, "OpenBSD"),
    (0xa8, "Darwin UFS"),
    (0xa9, "NetBSD"),
    (0xaf, "Darwin HFS+"),
    (0xee, "GPT protective"),
    (0xef, "EFI (FAT-12/16/32)"),
];

pub struct MbrTypeRegistry;

impl MbrTypeRegistry {
    /// Shortcut letter -> code, per spec §4.7.
    pub fn shortcut_code(shortcut: &str) -> Option<u8> {
        match shortcut {
            "L" => Some(0x83), // Linux
            "S" => Some(0x82), // Linux swap
            "E" => Some(0x05), // Extended
            "X" => Some(0x05), // Extended (Linux conventional alias)
            "U" => Some(0xef), // EFI system
            "R" => Some(0xa5), // FreeBSD / "raid"-adjacent BSD slice
            "V" => Some(0x8e), // Linux LVM
            _ => None,
        }
    }
}

impl TypeRegistry for MbrTypeRegistry {
    fn by_id(&self, id: &TypeId) -> PartitionType {
        let code = match id {
            TypeId::Code(c) => *c,
            TypeId::TypeStr(_) => return PartitionType::unknown(id.clone()),
        };
        match KNOWN.iter().find(|(c, _)| *c == code) {
            Some((_, name)) => PartitionType::known(TypeId::Code(code), *name),
            None => PartitionType::unknown(TypeId::Code(code)),
        }
    }

    fn by_shortcut(&self, shortcut: &str) -> Option<PartitionType> {
        Self::shortcut_code(shortcut).map(|code| self.by_id(&TypeId::Code(code)))
    }

    fn all(&self) -> Vec<PartitionType> {
        KNOWN
            .iter()
            .map(|(c, name)| PartitionType::known(TypeId::Code(*c), *name))
            .collect()
    }
}

pub fn type_name(code: u8) -> &'static str {
    KNOWN.iter().find(|(c, _)| *c == code).map(|(_, n)| *n).unwrap_or("unknown")
}

pub fn is_extended(code: u8) -> bool {
    code == 0x05 || code == 0x0f || code == 0x85
}
