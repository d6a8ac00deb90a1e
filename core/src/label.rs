//! The label-driver contract (C6, spec §4.2).
//!
//! Dispatch over label formats is a trait-object table, not the
//! source's deep struct embedding (spec §9): `ptable-labels` registers
//! one `Arc<dyn LabelDriver>` per format, the same shape as the
//! teacher's `FormatterRegistry` (`HashMap<String, Arc<dyn
//! FilesystemFormatter>>`) in `core/src/registry.rs`.

use crate::context::Context;
use crate::error::Result;
use crate::partition::{Partition, PartitionTemplate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Dos,
    Gpt,
    Bsd,
    Sgi,
    Sun,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LabelKind::Dos => "dos",
            LabelKind::Gpt => "gpt",
            LabelKind::Bsd => "bsd",
            LabelKind::Sgi => "sgi",
            LabelKind::Sun => "sun",
        };
        write!(f, "{}", s)
    }
}

/// One entry accumulated by `verify` (spec §4.2, §8). Unlike a bare
/// error count, each issue names which invariant it violates so a host
/// can display or a test can assert on it individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    Overlap { a: u32, b: u32 },
    NotContainedInParent { partno: u32, parent: u32 },
    ChsMismatch { partno: u32 },
    BackwardEbrLink { ebr_lba: u64 },
    BadChecksum { description: String },
    Other(String),
}

impl fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyIssue::Overlap { a, b } => write!(f, "partitions {} and {} overlap", a, b),
            VerifyIssue::NotContainedInParent { partno, parent } => {
                write!(f, "partition {} is not contained in parent {}", partno, parent)
            }
            VerifyIssue::ChsMismatch { partno } => {
                write!(f, "partition {} has inconsistent CHS fields", partno)
            }
            VerifyIssue::BackwardEbrLink { ebr_lba } => {
                write!(f, "EBR at LBA {} links backward in the chain", ebr_lba)
            }
            VerifyIssue::BadChecksum { description } => write!(f, "bad checksum: {}", description),
            VerifyIssue::Other(s) => write!(f, "{}", s),
        }
    }
}

/// The uniform operation set every label driver exposes (spec §4.2).
/// A driver that doesn't support an operation returns
/// `PtableError::Unsupported` rather than omitting the method.
pub trait LabelDriver: Send + Sync {
    fn kind(&self) -> LabelKind;

    /// Inspect the first sector (and, for nested labels, the parent's
    /// assigned partition) and decide whether this label is present.
    fn probe(&self, ctx: &mut Context) -> Result<bool>;

    /// Wipe in-memory state and seed a fresh header/entry array.
    fn create(&self, ctx: &mut Context) -> Result<()>;

    /// Populate the in-memory partition set from on-disk bytes.
    fn read(&self, ctx: &mut Context) -> Result<()>;

    /// Serialize every dirty sector owned by this label to the device.
    fn write(&self, ctx: &mut Context) -> Result<()>;

    /// Run all invariants, returning every violation found (spec §8).
    fn verify(&self, ctx: &Context) -> Vec<VerifyIssue>;

    fn add_partition(&self, ctx: &mut Context, template: PartitionTemplate) -> Result<u32>;

    fn delete_partition(&self, ctx: &mut Context, partno: u32) -> Result<()>;

    fn get_partition(&self, ctx: &Context, partno: u32) -> Result<Partition>;

    fn set_partition(&self, ctx: &mut Context, partno: u32, template: PartitionTemplate) -> Result<()>;

    /// Permute partitions by start sector (spec §4.2: "label-specific").
    fn reorder(&self, ctx: &mut Context) -> Result<()>;

    fn list_freespace(&self, ctx: &Context) -> Vec<Partition>;

    fn toggle_bootable(&self, ctx: &mut Context, partno: u32) -> Result<()> {
        let _ = (ctx, partno);
        Err(crate::error::PtableError::Unsupported(
            "bootable toggle not supported by this label".into(),
        ))
    }
}
