//! The partition entity (spec §3 "Partition").
//!
//! Cyclic references in the source (partition -> owning table,
//! partition -> context) are replaced per spec §9 with arena storage:
//! a `PartitionTable` owns plain `Partition` values and parent/child
//! relationships are tracked by ordinal, never by pointer.

use crate::types::PartitionType;
use std::cell::RefCell;
use std::rc::Rc;

/// Exactly one of `Size`/`End` is authoritative for a bound partition;
/// setting one clears the other (spec §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Size(u64),
    End(u64),
}

bitflags::bitflags! {
    /// "Follow default" flags used when a partition is a template for
    /// `add_partition` (spec §3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FollowDefault: u8 {
        const START  = 0b001;
        const END    = 0b010;
        const PARTNO = 0b100;
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    /// Ordinal within its table; `None` means "next free" when used as
    /// a template.
    pub partno: Option<u32>,
    pub start: u64,
    pub extent: Extent,
    pub ptype: PartitionType,
    pub name: Option<String>,
    pub uuid: Option<uuid::Uuid>,
    pub attrs: Option<String>,
    pub chs_start: Option<(u32, u32, u32)>,
    pub chs_end: Option<(u32, u32, u32)>,
    pub bootable: bool,

    pub is_freespace: bool,
    pub is_container: bool,
    pub is_nested: bool,
    pub parent_partno: Option<u32>,

    pub follow_default: FollowDefault,
}

impl Partition {
    pub fn new(start: u64, extent: Extent, ptype: PartitionType) -> Self {
        Self {
            partno: None,
            start,
            extent,
            ptype,
            name: None,
            uuid: None,
            attrs: None,
            chs_start: None,
            chs_end: None,
            bootable: false,
            is_freespace: false,
            is_container: false,
            is_nested: false,
            parent_partno: None,
            follow_default: FollowDefault::empty(),
        }
    }

    pub fn freespace(start: u64, end: u64) -> Self {
        let mut p = Self::new(start, Extent::End(end), PartitionType::unknown(crate::types::TypeId::Code(0)));
        p.is_freespace = true;
        p
    }

    /// Size in sectors, derived from whichever of `Size`/`End` is
    /// authoritative.
    pub fn size(&self) -> u64 {
        match self.extent {
            Extent::Size(s) => s,
            Extent::End(end) => end.saturating_sub(self.start) + 1,
        }
    }

    /// Inclusive end LBA.
    pub fn end(&self) -> u64 {
        match self.extent {
            Extent::Size(s) => self.start + s.saturating_sub(1),
            Extent::End(end) => end,
        }
    }

    pub fn set_size(&mut self, size: u64) {
        self.extent = Extent::Size(size);
    }

    pub fn set_end(&mut self, end: u64) {
        self.extent = Extent::End(end);
    }

    /// Whether `[start, end]` overlaps `other`'s range.
    pub fn overlaps(&self, other: &Partition) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }
}

/// A reference-counted handle for partitions held standalone by callers
/// (spec §3 lifecycle: "held as stand-alone templates by callers").
/// Value semantics: `Clone` shares the same underlying partition rather
/// than incrementing a manual refcount, per spec §9.
pub type PartitionHandle = Rc<RefCell<Partition>>;

pub fn handle(p: Partition) -> PartitionHandle {
    Rc::new(RefCell::new(p))
}

/// A request passed to `add_partition`/`set_partition`: every field is
/// optional so the allocator can fall back to label-specific defaults.
/// `add_partition` consumes its template (spec §9: "the engine
/// guarantees it never retains a caller's partition beyond the call it
/// was passed into unless the caller explicitly hands it over").
#[derive(Debug, Clone, Default)]
pub struct PartitionTemplate {
    pub partno: Option<u32>,
    pub start: Option<u64>,
    pub size: Option<u64>,
    pub end: Option<u64>,
    /// True when `size` came from a "+N" relative expression (spec
    /// §4.3 step 4/5 and §9 "Unit parsing").
    pub size_is_relative: bool,
    pub ptype: Option<crate::types::TypeId>,
    pub name: Option<String>,
    pub uuid: Option<uuid::Uuid>,
    pub attrs: Option<String>,
    pub bootable: Option<bool>,
}
