//! The DOS/MBR label driver (C2, spec §4.4): primary partitions in the
//! boot sector's four-entry table, plus an EBR chain for logicals
//! nested inside an extended container.
//!
//! Grounded on `filesystems/src/partitioner.rs`'s
//! `create_mbr_single_partition` (sector layout, boot signature) and
//! `filesystems/src/partitioner/mbr_verifier.rs`'s `parse_partition_entry`
//! (decode side, magic-byte check).

use ptable_core::{
    Context, Extent, LabelDriver, LabelKind, Partition, PartitionTemplate, PartitionType,
    PtableError, Result, TypeId, VerifyIssue,
};
use std::any::Any;
use std::collections::HashMap;

use super::chs;
use super::entry::{self, MbrEntry, ENTRY_COUNT};
use super::types::{is_extended, MbrTypeRegistry};
use crate::alloc;
use crate::collision::{CollisionProbe, LabelSignatureProbe};
use crate::wipe::apply_wipes;

const PRIMARY_SLOTS: u32 = 4;
const FIRST_LOGICAL_PARTNO: u32 = 5;
/// MBR start/size fields are 32-bit (spec §4.3 "Numeric semantics").
const MBR_MAX_LBA: u64 = u32::MAX as u64;

/// Scratch state the driver stashes on `Context::label_state` between
/// calls (spec §9: "opaque per-label scratch state").
#[derive(Default)]
struct MbrState {
    /// Partno of the primary slot holding the extended container, if
    /// any.
    container_partno: Option<u32>,
    /// Absolute LBA of the EBR sector describing each logical partno.
    ebr_lba: HashMap<u32, u64>,
}

impl MbrState {
    fn get(ctx: &Context) -> Option<&MbrState> {
        ctx.label_state.as_ref().and_then(|b| b.downcast_ref())
    }

    fn get_or_init(ctx: &mut Context) -> &mut MbrState {
        if ctx.label_state.as_ref().and_then(|b| b.downcast_ref::<MbrState>()).is_none() {
            ctx.label_state = Some(Box::new(MbrState::default()));
        }
        ctx.label_state.as_mut().unwrap().downcast_mut().unwrap()
    }
}

fn as_any(state: MbrState) -> Box<dyn Any> {
    Box::new(state)
}

/// A disk that previously carried GPT leaves its backup header at the
/// last sector; creating a DOS label never touches that sector, so a
/// stale GPT signature would linger there and confuse a later probe
/// (spec §4.8 step 2). Mark it for `write` to zero.
fn mark_stale_gpt_backup_for_wipe(ctx: &mut Context) -> Result<()> {
    let last_lba = ctx.geometry.total_sectors.saturating_sub(1);
    let found = LabelSignatureProbe.scan(ctx, last_lba, last_lba)?;
    if !found.is_empty() {
        let sector_size = ctx.geometry.logical_sector_size as u64;
        let start_byte = last_lba * sector_size;
        ctx.mark_wipe(start_byte, start_byte + sector_size - 1);
    }
    Ok(())
}

pub struct MbrDriver;

impl MbrDriver {
    fn registry(&self) -> MbrTypeRegistry {
        MbrTypeRegistry
    }

    fn type_for_code(&self, code: u8) -> PartitionType {
        use ptable_core::TypeRegistry;
        self.registry().by_id(&TypeId::Code(code))
    }

    fn code_for_template(&self, template: &PartitionTemplate) -> u8 {
        match &template.ptype {
            Some(TypeId::Code(c)) => *c,
            Some(TypeId::TypeStr(s)) => MbrTypeRegistry::shortcut_code(s).unwrap_or(0x83),
            None => 0x83,
        }
    }

    /// Walk the EBR chain starting at `first_ebr_lba`, populating
    /// `ctx.table` with logical partitions and `state.ebr_lba`.
    fn read_ebr_chain(
        &self,
        ctx: &mut Context,
        container_start: u64,
        first_ebr_lba: u64,
    ) -> Result<()> {
        let mut ebr_lba = first_ebr_lba;
        let mut next_partno = FIRST_LOGICAL_PARTNO;
        let mut seen = std::collections::HashSet::new();

        loop {
            if !seen.insert(ebr_lba) {
                // A chain that revisits an LBA would loop forever; stop
                // rather than hang (spec §8: "EBR chain closure").
                break;
            }
            let sector = ctx.read_sector(ebr_lba)?;
            if !entry::has_valid_signature(&sector) {
                ptable_core::ask::notify(
                    ctx.ask(),
                    ptable_core::ask::Ask::Warn {
                        message: format!(
                            "EBR at sector {} has an invalid boot signature; stopping chain walk",
                            ebr_lba
                        ),
                    },
                );
                break;
            }
            let entries = entry::read_entries(&sector);
            let data_entry = entries[0];
            let link_entry = entries[1];

            if !data_entry.is_empty() {
                let start = ebr_lba + data_entry.start_lba as u64;
                let mut p = Partition::new(
                    start,
                    Extent::Size(data_entry.size_sectors as u64),
                    self.type_for_code(data_entry.sys_ind),
                );
                p.partno = Some(next_partno);
                p.bootable = data_entry.bootable;
                p.chs_start = Some((0, 0, 0));
                p.is_nested = false;
                p.parent_partno = MbrState::get(ctx).and_then(|s| s.container_partno);
                ctx.table.add(p);
                MbrState::get_or_init(ctx).ebr_lba.insert(next_partno, ebr_lba);
                next_partno += 1;
            }

            if link_entry.is_empty() {
                break;
            }
            ebr_lba = container_start + link_entry.start_lba as u64;
        }
        Ok(())
    }

    /// Gaps among primary slots and the extended container, not
    /// descending into the container's interior (used when placing a
    /// new primary/container, as opposed to `list_freespace`'s
    /// display-oriented view which also shows the interior).
    fn top_level_freespace(&self, ctx: &Context) -> Vec<Partition> {
        let top_level: Vec<&Partition> = ctx.table.iter().filter(|p| p.parent_partno.is_none()).collect();
        crate::freespace::gaps_in_range(&top_level, ctx.geometry.first_usable_lba, ctx.geometry.last_usable_lba)
    }

    /// Gaps inside an extended container, including the reserved EBR
    /// sector at the head of each existing logical (spec §4.5: the
    /// free-space enumerator reserves that sector for a future EBR).
    fn logical_freespace(&self, ctx: &Context, container: &Partition, container_partno: u32) -> Vec<Partition> {
        let used: Vec<Partition> = ctx
            .table
            .iter()
            .filter(|p| p.parent_partno == Some(container_partno))
            .map(|p| Partition::freespace(p.start.saturating_sub(1), p.end()))
            .collect();
        let refs: Vec<&Partition> = used.iter().collect();
        crate::freespace::gaps_in_range(&refs, container.start + 1, container.end())
    }
}

impl LabelDriver for MbrDriver {
    fn kind(&self) -> LabelKind {
        LabelKind::Dos
    }

    fn probe(&self, ctx: &mut Context) -> Result<bool> {
        let sector = ctx.read_sector(0)?;
        if sector.len() < 512 || !entry::has_valid_signature(&sector) {
            return Ok(false);
        }
        // A GPT protective MBR carries type 0xee in its single entry;
        // the registry probes GPT first, so reaching here with 0xee
        // present means GPT declined (corrupt GPT header) and this
        // driver should not also claim it.
        let entries = entry::read_entries(&sector);
        if entries.iter().any(|e| e.sys_ind == 0xee) {
            return Ok(false);
        }
        Ok(true)
    }

    fn create(&self, ctx: &mut Context) -> Result<()> {
        ctx.table.clear();
        ctx.label_state = Some(as_any(MbrState::default()));
        mark_stale_gpt_backup_for_wipe(ctx)?;
        let mut sector = vec![0u8; ctx.geometry.logical_sector_size as usize];
        entry::write_entries(&mut sector[..512.min(sector.len())], &[MbrEntry::default(); ENTRY_COUNT]);
        *ctx.first_sector.borrow_mut() = sector.clone();
        ctx.stage_sector(0, sector);
        ctx.active_label = Some(LabelKind::Dos);
        Ok(())
    }

    fn read(&self, ctx: &mut Context) -> Result<()> {
        let sector = ctx.read_sector(0)?;
        if !entry::has_valid_signature(&sector) {
            return Err(PtableError::NotFound("no DOS/MBR signature at sector 0".into()));
        }
        *ctx.first_sector.borrow_mut() = sector.clone();
        ctx.table.clear();
        ctx.label_state = Some(as_any(MbrState::default()));

        let entries = entry::read_entries(&sector);
        let mut container: Option<(u32, u64, u64)> = None;
        for (i, e) in entries.iter().enumerate() {
            if e.is_empty() {
                continue;
            }
            let partno = i as u32 + 1;
            let mut p = Partition::new(
                e.start_lba as u64,
                Extent::Size(e.size_sectors as u64),
                self.type_for_code(e.sys_ind),
            );
            p.partno = Some(partno);
            p.bootable = e.bootable;
            let off = entry::TABLE_OFFSET + i * 16;
            p.chs_start = Some(chs::unpack([sector[off + 1], sector[off + 2], sector[off + 3]]));
            p.chs_end = Some(chs::unpack([sector[off + 5], sector[off + 6], sector[off + 7]]));
            if is_extended(e.sys_ind) {
                p.is_container = true;
                container = Some((partno, e.start_lba as u64, e.size_sectors as u64));
            }
            ctx.table.add(p);
        }

        if let Some((partno, start, _size)) = container {
            MbrState::get_or_init(ctx).container_partno = Some(partno);
            self.read_ebr_chain(ctx, start, start)?;
        }
        ctx.active_label = Some(LabelKind::Dos);
        Ok(())
    }

    fn write(&self, ctx: &mut Context) -> Result<()> {
        apply_wipes(ctx)?;
        let mut primary = [MbrEntry::default(); ENTRY_COUNT];
        let container_partno = MbrState::get(ctx).and_then(|s| s.container_partno);

        let mut logicals: Vec<Partition> = ctx
            .table
            .iter()
            .filter(|p| p.partno.map(|n| n >= FIRST_LOGICAL_PARTNO).unwrap_or(false))
            .cloned()
            .collect();
        logicals.sort_by_key(|p| p.start);

        for p in ctx.table.iter() {
            let partno = match p.partno {
                Some(n) if n >= 1 && n <= PRIMARY_SLOTS => n,
                _ => continue,
            };
            let code = match &p.ptype.id {
                TypeId::Code(c) => *c,
                TypeId::TypeStr(_) => 0x83,
            };
            primary[(partno - 1) as usize] = MbrEntry {
                bootable: p.bootable,
                sys_ind: code,
                start_lba: p.start as u32,
                size_sectors: p.size() as u32,
            };
        }

        let mut sector = ctx.first_sector.borrow().clone();
        if sector.len() < 512 {
            sector.resize(ctx.geometry.logical_sector_size as usize, 0);
        }
        entry::write_entries(&mut sector, &primary);
        ctx.stage_sector(0, sector.clone());
        *ctx.first_sector.borrow_mut() = sector;

        // Re-link the EBR chain. Convention: each logical partition's
        // EBR sector sits one sector before its data, and every EBR's
        // link entry points at the next EBR (or is empty for the last).
        if let Some(container_partno) = container_partno {
            let container_start = ctx
                .table
                .get(container_partno)
                .map(|p| p.start)
                .ok_or_else(|| PtableError::InvalidOnDisk("extended container missing".into()))?;

            let mut new_ebr_lba = HashMap::new();
            for (idx, logical) in logicals.iter().enumerate() {
                let ebr_lba = logical.start.saturating_sub(1);
                new_ebr_lba.insert(logical.partno.unwrap(), ebr_lba);

                let mut ebr_sector = vec![0u8; ctx.geometry.logical_sector_size as usize];
                let data_code = match &logical.ptype.id {
                    TypeId::Code(c) => *c,
                    TypeId::TypeStr(_) => 0x83,
                };
                let data = MbrEntry {
                    bootable: logical.bootable,
                    sys_ind: data_code,
                    start_lba: (logical.start - ebr_lba) as u32,
                    size_sectors: logical.size() as u32,
                };
                let mut entries = [MbrEntry::default(); ENTRY_COUNT];
                entries[0] = data;
                if let Some(next) = logicals.get(idx + 1) {
                    let next_ebr = next.start.saturating_sub(1);
                    entries[1] = MbrEntry {
                        bootable: false,
                        sys_ind: 0x05,
                        start_lba: (next_ebr - container_start) as u32,
                        size_sectors: 1,
                    };
                }
                entry::write_entries(&mut ebr_sector, &entries);
                ctx.stage_sector(ebr_lba, ebr_sector);
            }
            MbrState::get_or_init(ctx).ebr_lba = new_ebr_lba;
        }

        ctx.flush_dirty_ordered(&[0])
    }

    fn verify(&self, ctx: &Context) -> Vec<VerifyIssue> {
        let mut issues = Vec::new();
        let entries: Vec<&Partition> = ctx.table.iter().collect();
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let a = entries[i];
                let b = entries[j];
                if a.parent_partno != b.parent_partno {
                    continue;
                }
                if a.overlaps(b) {
                    issues.push(VerifyIssue::Overlap {
                        a: a.partno.unwrap_or(0),
                        b: b.partno.unwrap_or(0),
                    });
                }
            }
        }
        for p in ctx.table.iter().filter(|p| p.parent_partno.is_some()) {
            let parent_no = p.parent_partno.unwrap();
            match ctx.table.get(parent_no) {
                Some(parent) if p.start >= parent.start && p.end() <= parent.end() => {}
                _ => issues.push(VerifyIssue::NotContainedInParent {
                    partno: p.partno.unwrap_or(0),
                    parent: parent_no,
                }),
            }
        }
        issues
    }

    fn add_partition(&self, ctx: &mut Context, template: PartitionTemplate) -> Result<u32> {
        let code = self.code_for_template(&template);
        let requested_start = template
            .start
            .ok_or_else(|| PtableError::InvalidArgument("start is required".into()))?;

        let container = MbrState::get(ctx)
            .and_then(|s| s.container_partno)
            .and_then(|n| ctx.table.get(n).cloned());
        let wants_logical = container
            .as_ref()
            .map(|c| requested_start >= c.start && requested_start <= c.end())
            .unwrap_or(false);

        let partno = if wants_logical {
            let container = container.unwrap();
            let container_partno = container.partno.unwrap();
            let gaps = self.logical_freespace(ctx, &container, container_partno);
            // Each free sub-range's first sector is reserved for the new
            // logical's own EBR (spec §4.5), so only the remainder is
            // placeable as data.
            let usable: Vec<Partition> = gaps
                .iter()
                .filter(|g| g.size() >= 2)
                .map(|g| Partition::freespace(g.start + 1, g.end()))
                .collect();
            let (start, end) = alloc::place_in_freespace(
                ctx,
                &usable,
                Some(requested_start),
                template.size,
                template.size_is_relative,
                template.end,
                MBR_MAX_LBA,
            )?;

            let partno = ctx.table.next_free_ordinal(FIRST_LOGICAL_PARTNO);
            let mut p = Partition::new(start, Extent::End(end), self.type_for_code(code));
            p.partno = Some(partno);
            p.bootable = template.bootable.unwrap_or(false);
            p.name = template.name;
            p.parent_partno = Some(container_partno);
            ctx.table.add(p);
            partno
        } else {
            let free_slot = (1..=PRIMARY_SLOTS)
                .find(|n| ctx.table.get(*n).is_none())
                .ok_or_else(|| PtableError::OutOfSpace("all four primary slots are in use".into()))?;

            let top_level_gaps = self.top_level_freespace(ctx);
            let (start, end) = alloc::place_in_freespace(
                ctx,
                &top_level_gaps,
                Some(requested_start),
                template.size,
                template.size_is_relative,
                template.end,
                MBR_MAX_LBA,
            )?;

            let mut p = Partition::new(start, Extent::End(end), self.type_for_code(code));
            p.partno = Some(free_slot);
            p.bootable = template.bootable.unwrap_or(false);
            p.name = template.name;
            if is_extended(code) {
                p.is_container = true;
                MbrState::get_or_init(ctx).container_partno = Some(free_slot);
            }
            ctx.table.add(p);
            free_slot
        };
        Ok(partno)
    }

    fn delete_partition(&self, ctx: &mut Context, partno: u32) -> Result<()> {
        let was_container = ctx.table.get(partno).map(|p| p.is_container).unwrap_or(false);
        ctx.table
            .remove(partno)
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))?;
        if was_container {
            let logical_partnos: Vec<u32> = ctx
                .table
                .iter()
                .filter(|p| p.parent_partno == Some(partno))
                .filter_map(|p| p.partno)
                .collect();
            for n in logical_partnos {
                ctx.table.remove(n);
            }
            if let Some(state) = MbrState::get_or_init(ctx).container_partno.take() {
                let _ = state;
            }
        }
        Ok(())
    }

    fn get_partition(&self, ctx: &Context, partno: u32) -> Result<Partition> {
        ctx.table
            .get(partno)
            .cloned()
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))
    }

    fn set_partition(&self, ctx: &mut Context, partno: u32, template: PartitionTemplate) -> Result<()> {
        let existing = ctx
            .table
            .get(partno)
            .cloned()
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))?;
        let start = template.start.unwrap_or(existing.start);
        let size = match (template.size, template.end) {
            (Some(s), _) => s,
            (None, Some(end)) => end.saturating_sub(start) + 1,
            (None, None) => existing.size(),
        };
        let ptype = match template.ptype {
            Some(id) => match id {
                TypeId::Code(c) => self.type_for_code(c),
                TypeId::TypeStr(ref s) => MbrTypeRegistry::shortcut_code(s)
                    .map(|c| self.type_for_code(c))
                    .unwrap_or(existing.ptype.clone()),
            },
            None => existing.ptype.clone(),
        };
        let mut updated = Partition::new(start, Extent::Size(size), ptype);
        updated.partno = Some(partno);
        updated.bootable = template.bootable.unwrap_or(existing.bootable);
        updated.name = template.name.or(existing.name);
        updated.is_container = existing.is_container;
        updated.parent_partno = existing.parent_partno;
        ctx.table.replace(partno, updated);
        Ok(())
    }

    fn reorder(&self, ctx: &mut Context) -> Result<()> {
        let entries: Vec<Partition> = ctx.table.iter().cloned().collect();
        let old_container_partno = MbrState::get(ctx).and_then(|s| s.container_partno);

        let mut primaries: Vec<Partition> = entries
            .iter()
            .filter(|p| p.parent_partno.is_none())
            .cloned()
            .collect();
        primaries.sort_by_key(|p| p.start);

        let mut renumbered_container = None;
        let mut primary_map: HashMap<u32, u32> = HashMap::new();
        for (i, p) in primaries.iter_mut().enumerate() {
            let old = p.partno.unwrap();
            let new = i as u32 + 1;
            primary_map.insert(old, new);
            if old_container_partno == Some(old) {
                renumbered_container = Some(new);
            }
            p.partno = Some(new);
        }

        let mut logicals: Vec<Partition> = entries
            .iter()
            .filter(|p| p.parent_partno.is_some())
            .cloned()
            .collect();
        logicals.sort_by_key(|p| p.start);
        for (i, p) in logicals.iter_mut().enumerate() {
            p.partno = Some(FIRST_LOGICAL_PARTNO + i as u32);
            if let Some(parent) = p.parent_partno {
                p.parent_partno = primary_map.get(&parent).copied().or(Some(parent));
            }
        }

        ctx.table.clear();
        for p in primaries.into_iter().chain(logicals) {
            ctx.table.add(p);
        }

        let state = MbrState::get_or_init(ctx);
        state.container_partno = renumbered_container;
        state.ebr_lba.clear();
        Ok(())
    }

    fn list_freespace(&self, ctx: &Context) -> Vec<Partition> {
        let mut gaps = self.top_level_freespace(ctx);
        // Gaps inside the extended container are otherwise invisible
        // to a top-level scan, since the container itself counts as
        // "used" there (spec §8 "Freespace closure").
        if let Some(container) = ctx.table.iter().find(|p| p.is_container) {
            let container_partno = container.partno.unwrap_or(0);
            gaps.extend(self.logical_freespace(ctx, container, container_partno));
        }
        gaps
    }

    fn toggle_bootable(&self, ctx: &mut Context, partno: u32) -> Result<()> {
        let p = ctx
            .table
            .get_mut(partno)
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))?;
        p.bootable = !p.bootable;
        Ok(())
    }
}
