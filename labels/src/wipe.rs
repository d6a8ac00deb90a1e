//! The wipe-area registry (C10, spec §4 C10): byte ranges a driver has
//! marked to be zeroed immediately before the final write, so an
//! obsolete signature (e.g. a stale GPT backup header after shrinking
//! a disk) doesn't linger and confuse a later probe.

use ptable_core::Context;

/// Zero every range `ctx` has accumulated via `mark_wipe`, then clear
/// the registry. Called by the host immediately before (or as part of)
/// a label driver's `write` (spec §4.8 write path).
pub fn apply_wipes(ctx: &mut Context) -> ptable_core::Result<()> {
    let sector_size = ctx.geometry.logical_sector_size as u64;
    let ranges: Vec<(u64, u64)> = ctx.wipe_ranges().to_vec();
    for (start_byte, end_byte) in ranges {
        let first_lba = start_byte / sector_size;
        let last_lba = end_byte / sector_size;
        for lba in first_lba..=last_lba {
            ctx.stage_sector(lba, vec![0u8; sector_size as usize]);
        }
    }
    ctx.clear_wipe_ranges();
    Ok(())
}
