//! The collision-probe interface (C9, spec §4 C9): an opaque "does
//! this device already carry a recognized signature" query, used to
//! warn the user or offer an optional wipe before a destructive write.
//!
//! Trimmed down from the teacher's `safety.rs` family (device-lock
//! detection, mount-point checks, OS-specific safety heuristics) to the
//! single signature question this engine actually needs; the rest of
//! that machinery belongs to the host, not the label engine (spec §9).

use ptable_core::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub description: String,
    pub byte_offset: u64,
}

/// Scan known foreign-filesystem/label magic numbers inside `range`
/// (start..=end sector, inclusive) and report what was found. This is
/// advisory only: the engine never refuses a write on its own account,
/// it only surfaces what it found through the ask channel (spec §4.6).
pub trait CollisionProbe: Send + Sync {
    fn scan(&self, ctx: &mut Context, start: u64, end: u64) -> ptable_core::Result<Vec<Collision>>;
}

/// Probes for the handful of signatures this engine's own label
/// drivers recognize, so re-creating a label over another one always
/// gets flagged even without a full filesystem-signature database.
pub struct LabelSignatureProbe;

impl CollisionProbe for LabelSignatureProbe {
    fn scan(&self, ctx: &mut Context, start: u64, _end: u64) -> ptable_core::Result<Vec<Collision>> {
        let mut found = Vec::new();
        let sector = ctx.read_sector(start)?;
        if sector.len() > 511 && sector[510] == 0x55 && sector[511] == 0xaa {
            found.push(Collision {
                description: "DOS/MBR boot signature".into(),
                byte_offset: start * ctx.geometry.logical_sector_size as u64,
            });
        }
        if sector.len() >= 8 && &sector[0..8] == b"EFI PART" {
            found.push(Collision {
                description: "GPT header signature".into(),
                byte_offset: start * ctx.geometry.logical_sector_size as u64,
            });
        }
        Ok(found)
    }
}
