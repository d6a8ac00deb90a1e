//! Partition-type catalog entries (C4).
//!
//! The catalogs themselves are per-label static tables owned by
//! `ptable-labels`; this module only defines the shared value type a
//! catalog entry resolves to and the registry trait a label driver
//! implements to look one up.

use std::fmt;

/// Either an MBR-style numeric code or a GPT/BSD-style GUID/string,
/// never both (spec §3 "Partition type catalog entry").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeId {
    Code(u8),
    TypeStr(String),
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeId::Code(c) => write!(f, "{:02x}", c),
            TypeId::TypeStr(s) => write!(f, "{}", s),
        }
    }
}

/// A resolved partition type: its id plus a human-readable name.
/// `is_unknown` marks a type synthesized for an id the static catalog
/// didn't recognize (spec §3: "unknown-type synthesis").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionType {
    pub id: TypeId,
    pub name: String,
    pub is_unknown: bool,
}

impl PartitionType {
    pub fn known(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_unknown: false,
        }
    }

    pub fn unknown(id: TypeId) -> Self {
        let name = format!("unknown ({})", id);
        Self {
            id,
            name,
            is_unknown: true,
        }
    }
}

/// A per-label catalog: looks a type up by id, by shortcut alias (e.g.
/// MBR's `L`/`S`/`E`/`X`/`U`/`R`/`V`), and lists everything it knows
/// about for menu display.
pub trait TypeRegistry: Send + Sync {
    fn by_id(&self, id: &TypeId) -> PartitionType;
    fn by_shortcut(&self, shortcut: &str) -> Option<PartitionType>;
    fn all(&self) -> Vec<PartitionType>;
}
