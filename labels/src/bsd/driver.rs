//! The BSD disklabel driver (C2): typically nested inside a DOS slice
//! (`ptable_core::Context::nested`), sharing the parent's device handle
//! rather than opening a second file descriptor (spec §3).

use ptable_core::{
    Context, Extent, LabelDriver, LabelKind, Partition, PartitionTemplate, PartitionType,
    PtableError, Result, TypeId, VerifyIssue,
};

use crate::alloc;
use crate::wipe::apply_wipes;
use super::layout::{BsdLabel, BsdPartitionEntry, MAX_PARTITIONS};

/// BSD disklabel offset/size fields are 32-bit sector counts.
const BSD_MAX_LBA: u64 = u32::MAX as u64;

fn type_for_fstype(code: u8) -> PartitionType {
    let name = match code {
        0 => "unused",
        1 => "swap",
        7 => "4.2BSD",
        8 => "MSDOS",
        _ => "unknown",
    };
    PartitionType::known(TypeId::Code(code), name)
}

pub struct BsdDriver;

impl LabelDriver for BsdDriver {
    fn kind(&self) -> LabelKind {
        LabelKind::Bsd
    }

    fn probe(&self, ctx: &mut Context) -> Result<bool> {
        let sector = ctx.read_sector(0)?;
        Ok(BsdLabel::from_sector(&sector).is_some())
    }

    fn create(&self, ctx: &mut Context) -> Result<()> {
        ctx.table.clear();
        let label = BsdLabel::empty(ctx.geometry.logical_sector_size);
        ctx.stage_sector(0, pad(label.to_bytes(), ctx.geometry.logical_sector_size as usize));
        ctx.active_label = Some(LabelKind::Bsd);
        Ok(())
    }

    fn read(&self, ctx: &mut Context) -> Result<()> {
        let sector = ctx.read_sector(0)?;
        let label = BsdLabel::from_sector(&sector)
            .ok_or_else(|| PtableError::NotFound("no BSD disklabel magic/checksum match".into()))?;
        ctx.table.clear();
        for (i, p) in label.partitions.iter().enumerate() {
            if p.is_empty() {
                continue;
            }
            let mut part = Partition::new(
                p.offset_sectors as u64,
                Extent::Size(p.size_sectors as u64),
                type_for_fstype(p.fstype),
            );
            part.partno = Some(i as u32 + 1);
            ctx.table.add(part);
        }
        ctx.active_label = Some(LabelKind::Bsd);
        Ok(())
    }

    fn write(&self, ctx: &mut Context) -> Result<()> {
        apply_wipes(ctx)?;
        let mut label = BsdLabel::empty(ctx.geometry.logical_sector_size);
        for p in ctx.table.iter() {
            let idx = match p.partno {
                Some(n) if n >= 1 && (n as usize) <= MAX_PARTITIONS => (n - 1) as usize,
                _ => continue,
            };
            label.partitions[idx] = BsdPartitionEntry {
                size_sectors: p.size() as u32,
                offset_sectors: p.start as u32,
                fstype: match &p.ptype.id {
                    TypeId::Code(c) => *c,
                    TypeId::TypeStr(_) => 7,
                },
                frag: 0,
                cpg: 0,
            };
        }
        ctx.stage_sector(0, pad(label.to_bytes(), ctx.geometry.logical_sector_size as usize));
        ctx.flush_dirty_ordered(&[0])
    }

    fn verify(&self, ctx: &Context) -> Vec<VerifyIssue> {
        let mut issues = Vec::new();
        let parts: Vec<&Partition> = ctx.table.iter().collect();
        for i in 0..parts.len() {
            for j in (i + 1)..parts.len() {
                if parts[i].overlaps(parts[j]) {
                    issues.push(VerifyIssue::Overlap {
                        a: parts[i].partno.unwrap_or(0),
                        b: parts[j].partno.unwrap_or(0),
                    });
                }
            }
        }
        issues
    }

    fn add_partition(&self, ctx: &mut Context, template: PartitionTemplate) -> Result<u32> {
        let requested_start = template
            .start
            .ok_or_else(|| PtableError::InvalidArgument("start is required".into()))?;
        let partno = (1..=MAX_PARTITIONS as u32)
            .find(|n| ctx.table.get(*n).is_none())
            .ok_or_else(|| PtableError::OutOfSpace("all 16 BSD partition slots are in use".into()))?;

        let freespace = self.list_freespace(ctx);
        let (start, end) = alloc::place_in_freespace(
            ctx,
            &freespace,
            Some(requested_start),
            template.size,
            template.size_is_relative,
            template.end,
            BSD_MAX_LBA,
        )?;

        let code = match &template.ptype {
            Some(TypeId::Code(c)) => *c,
            _ => 7,
        };
        let mut p = Partition::new(start, Extent::End(end), type_for_fstype(code));
        p.partno = Some(partno);
        p.name = template.name;
        ctx.table.add(p);
        Ok(partno)
    }

    fn delete_partition(&self, ctx: &mut Context, partno: u32) -> Result<()> {
        ctx.table
            .remove(partno)
            .map(|_| ())
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))
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
        let mut updated = Partition::new(start, Extent::Size(size), existing.ptype.clone());
        updated.partno = Some(partno);
        updated.name = template.name.or(existing.name);
        ctx.table.replace(partno, updated);
        Ok(())
    }

    fn reorder(&self, ctx: &mut Context) -> Result<()> {
        let mut entries: Vec<Partition> = ctx.table.iter().cloned().collect();
        entries.sort_by_key(|p| p.start);
        ctx.table.clear();
        for (i, mut p) in entries.into_iter().enumerate() {
            p.partno = Some(i as u32 + 1);
            ctx.table.add(p);
        }
        Ok(())
    }

    fn list_freespace(&self, ctx: &Context) -> Vec<Partition> {
        let mut used: Vec<&Partition> = ctx.table.iter().collect();
        used.sort_by_key(|p| p.start);
        let mut gaps = Vec::new();
        let mut cursor = ctx.geometry.first_usable_lba;
        for p in used {
            if p.start > cursor {
                gaps.push(Partition::freespace(cursor, p.start - 1));
            }
            cursor = cursor.max(p.end() + 1);
        }
        if cursor <= ctx.geometry.last_usable_lba {
            gaps.push(Partition::freespace(cursor, ctx.geometry.last_usable_lba));
        }
        gaps
    }
}

fn pad(mut v: Vec<u8>, size: usize) -> Vec<u8> {
    v.resize(size, 0);
    v
}
