//! GPT partition-type GUID catalog (C4).

use ptable_core::{PartitionType, TypeId, TypeRegistry};
use uuid::Uuid;

const KNOWN: &[(&str, &str)] = &[
    ("00000000-0000-0000-0000-000000000000", "Unused"),
    ("c12a7328-f81f-11d2-ba4b-00a0c93ec93b", "EFI System"),
    ("0fc63daf-8483-4772-8e79-3d69d8477de4", "Linux filesystem"),
    ("0657fd6d-a4ab-43c4-84e5-0933c84b4f4f", "Linux swap"),
    ("e6d6d379-f507-44c2-a23c-238f2a3df928", "Linux LVM"),
    ("a19d880f-05fc-4d3b-a006-743f0f84911e", "Linux RAID"),
    ("48465300-0000-11aa-aa11-00306543ecac", "Apple HFS+"),
    ("7c3457ef-0000-11aa-aa11-00306543ecac", "Apple APFS"),
    ("ebd0a0a2-b9e5-4433-87c0-68b6b72699c7", "Microsoft basic data"),
    ("e3c9e316-0b5c-4db8-817d-f92df00215ae", "Microsoft reserved"),
    ("de94bba4-06d1-4d40-a16a-bfd50179d6ac", "Windows recovery"),
    ("21686148-6449-6e6f-744e-656564454649", "BIOS boot"),
];

/// Shortcut letters shared with the MBR catalog where they carry an
/// obvious GPT equivalent (spec §4.7).
pub fn shortcut_guid(shortcut: &str) -> Option<Uuid> {
    let s = match shortcut {
        "L" => "0fc63daf-8483-4772-8e79-3d69d8477de4",
        "S" => "0657fd6d-a4ab-43c4-84e5-0933c84b4f4f",
        "U" => "c12a7328-f81f-11d2-ba4b-00a0c93ec93b",
        "V" => "e6d6d379-f507-44c2-a23c-238f2a3df928",
        _ => return None,
    };
    Uuid::parse_str(s).ok()
}

pub struct GptTypeRegistry;

impl TypeRegistry for GptTypeRegistry {
    fn by_id(&self, id: &TypeId) -> PartitionType {
        let guid = match id {
            TypeId::TypeStr(s) => s.clone(),
            TypeId::Code(_) => return PartitionType::unknown(id.clone()),
        };
        match KNOWN.iter().find(|(g, _)| g.eq_ignore_ascii_case(&guid)) {
            Some((_, name)) => PartitionType::known(TypeId::TypeStr(guid), *name),
            None => PartitionType::unknown(TypeId::TypeStr(guid)),
        }
    }

    fn by_shortcut(&self, shortcut: &str) -> Option<PartitionType> {
        shortcut_guid(shortcut).map(|g| self.by_id(&TypeId::TypeStr(g.to_string())))
    }

    fn all(&self) -> Vec<PartitionType> {
        KNOWN
            .iter()
            .map(|(g, name)| PartitionType::known(TypeId::TypeStr(g.to_string()), *name))
            .collect()
    }
}

pub fn default_data_guid() -> Uuid {
    Uuid::parse_str("0fc63daf-8483-4772-8e79-3d69d8477de4").unwrap()
}
