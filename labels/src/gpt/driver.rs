//! The GPT label driver (C2, spec §4.2 GLOSSARY "GPT"): protective MBR,
//! primary header + array, backup header + array, CRC32 closure over
//! both (spec §8 "checksum closure").

use ptable_core::{
    Context, Extent, LabelDriver, LabelKind, Partition, PartitionTemplate, PartitionType,
    PtableError, Result, TypeId, VerifyIssue,
};
use uuid::Uuid;

use super::entry::{GptEntry, ENTRY_SIZE as GPT_ENTRY_BYTE_LEN};
use super::header::{self, GptHeader, ENTRY_COUNT, ENTRY_SIZE};
use super::types::{default_data_guid, GptTypeRegistry};
use crate::alloc;
use crate::wipe::apply_wipes;

fn array_sectors(ctx: &Context) -> u64 {
    let bytes = ENTRY_COUNT as u64 * ENTRY_SIZE as u64;
    (bytes + ctx.geometry.logical_sector_size as u64 - 1) / ctx.geometry.logical_sector_size as u64
}

fn read_array(ctx: &mut Context, entries_lba: u64) -> Result<Vec<GptEntry>> {
    let sectors = array_sectors(ctx);
    let mut raw = Vec::new();
    for i in 0..sectors {
        raw.extend(ctx.read_sector(entries_lba + i)?);
    }
    let mut out = Vec::with_capacity(ENTRY_COUNT as usize);
    for i in 0..ENTRY_COUNT as usize {
        let off = i * GPT_ENTRY_BYTE_LEN;
        out.push(GptEntry::from_bytes(&raw[off..off + GPT_ENTRY_BYTE_LEN]));
    }
    Ok(out)
}

fn write_array(ctx: &mut Context, entries_lba: u64, entries: &[GptEntry]) -> u32 {
    let mut raw = Vec::with_capacity(ENTRY_COUNT as usize * GPT_ENTRY_BYTE_LEN);
    for e in entries {
        raw.extend_from_slice(&e.to_bytes());
    }
    let crc = crc32fast::hash(&raw);
    let sectors = array_sectors(ctx);
    let sector_size = ctx.geometry.logical_sector_size as usize;
    for i in 0..sectors {
        let start = i as usize * sector_size;
        let chunk = raw[start..(start + sector_size).min(raw.len())].to_vec();
        let mut padded = chunk;
        padded.resize(sector_size, 0);
        ctx.stage_sector(entries_lba + i, padded);
    }
    crc
}

pub struct GptDriver;

impl GptDriver {
    fn registry(&self) -> GptTypeRegistry {
        GptTypeRegistry
    }

    fn type_for_guid(&self, guid: Uuid) -> PartitionType {
        use ptable_core::TypeRegistry;
        self.registry().by_id(&TypeId::TypeStr(guid.to_string()))
    }
}

impl LabelDriver for GptDriver {
    fn kind(&self) -> LabelKind {
        LabelKind::Gpt
    }

    fn probe(&self, ctx: &mut Context) -> Result<bool> {
        let header_sector = ctx.read_sector(1)?;
        Ok(header_sector.len() >= 8 && &header_sector[0..8] == header::SIGNATURE)
    }

    fn create(&self, ctx: &mut Context) -> Result<()> {
        ctx.table.clear();
        let total = ctx.geometry.total_sectors;
        let array_len = array_sectors(ctx);
        let hdr = GptHeader {
            current_lba: 1,
            backup_lba: total - 1,
            first_usable_lba: 2 + array_len,
            last_usable_lba: total - 2 - array_len,
            disk_guid: Uuid::new_v4(),
            entries_lba: 2,
            entry_count: ENTRY_COUNT,
            entry_size: ENTRY_SIZE,
        };
        let entries = vec![GptEntry::empty(); ENTRY_COUNT as usize];
        let array_crc = write_array(ctx, hdr.entries_lba, &entries);
        ctx.stage_sector(0, header::protective_mbr_sector(ctx.geometry.logical_sector_size as usize, total));
        ctx.stage_sector(1, pad(hdr.to_bytes(array_crc), ctx.geometry.logical_sector_size as usize));

        let backup_entries_lba = total - 1 - array_len;
        write_array(ctx, backup_entries_lba, &entries);
        let backup_hdr = GptHeader {
            current_lba: total - 1,
            backup_lba: 1,
            entries_lba: backup_entries_lba,
            ..hdr
        };
        ctx.stage_sector(total - 1, pad(backup_hdr.to_bytes(array_crc), ctx.geometry.logical_sector_size as usize));
        ctx.active_label = Some(LabelKind::Gpt);
        Ok(())
    }

    fn read(&self, ctx: &mut Context) -> Result<()> {
        let sector = ctx.read_sector(1)?;
        let hdr = GptHeader::from_bytes(&sector)?;
        let entries = read_array(ctx, hdr.entries_lba)?;
        ctx.table.clear();
        for (i, e) in entries.iter().enumerate() {
            if e.is_empty() {
                continue;
            }
            let mut p = Partition::new(
                e.first_lba,
                Extent::End(e.last_lba),
                self.type_for_guid(e.type_guid),
            );
            p.partno = Some(i as u32 + 1);
            p.uuid = Some(e.unique_guid);
            p.name = if e.name.is_empty() { None } else { Some(e.name.clone()) };
            ctx.table.add(p);
        }
        ctx.active_label = Some(LabelKind::Gpt);
        Ok(())
    }

    fn write(&self, ctx: &mut Context) -> Result<()> {
        apply_wipes(ctx)?;
        let total = ctx.geometry.total_sectors;
        let array_len = array_sectors(ctx);
        let mut entries = vec![GptEntry::empty(); ENTRY_COUNT as usize];
        for p in ctx.table.iter() {
            let idx = match p.partno {
                Some(n) if n >= 1 && n <= ENTRY_COUNT => (n - 1) as usize,
                _ => continue,
            };
            entries[idx] = GptEntry {
                type_guid: match &p.ptype.id {
                    TypeId::TypeStr(s) => Uuid::parse_str(s).unwrap_or_else(|_| default_data_guid()),
                    TypeId::Code(_) => default_data_guid(),
                },
                unique_guid: p.uuid.unwrap_or_else(Uuid::new_v4),
                first_lba: p.start,
                last_lba: p.end(),
                attributes: 0,
                name: p.name.clone().unwrap_or_default(),
            };
        }

        let entries_lba = 2u64;
        let array_crc = write_array(ctx, entries_lba, &entries);
        let hdr = GptHeader {
            current_lba: 1,
            backup_lba: total - 1,
            first_usable_lba: 2 + array_len,
            last_usable_lba: total - 2 - array_len,
            disk_guid: Uuid::new_v4(),
            entries_lba,
            entry_count: ENTRY_COUNT,
            entry_size: ENTRY_SIZE,
        };
        ctx.stage_sector(1, pad(hdr.to_bytes(array_crc), ctx.geometry.logical_sector_size as usize));

        let backup_entries_lba = total - 1 - array_len;
        write_array(ctx, backup_entries_lba, &entries);
        let backup_hdr = GptHeader {
            current_lba: total - 1,
            backup_lba: 1,
            entries_lba: backup_entries_lba,
            ..hdr
        };
        ctx.stage_sector(total - 1, pad(backup_hdr.to_bytes(array_crc), ctx.geometry.logical_sector_size as usize));

        // Primary header and array before the backup, so an interrupted
        // write still leaves a re-probeable primary table (spec §4.8).
        let mut order = vec![1u64];
        order.extend(entries_lba..entries_lba + array_len);
        ctx.flush_dirty_ordered(&order)
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
        for p in &parts {
            if p.start < ctx.geometry.first_usable_lba || p.end() > ctx.geometry.last_usable_lba {
                issues.push(VerifyIssue::Other(format!(
                    "partition {} falls outside the usable LBA range",
                    p.partno.unwrap_or(0)
                )));
            }
        }
        issues
    }

    fn add_partition(&self, ctx: &mut Context, template: PartitionTemplate) -> Result<u32> {
        let requested_start = template
            .start
            .ok_or_else(|| PtableError::InvalidArgument("start is required".into()))?;
        let partno = template
            .partno
            .unwrap_or_else(|| ctx.table.next_free_ordinal(1));
        if partno > ENTRY_COUNT {
            return Err(PtableError::OutOfSpace(format!(
                "GPT array holds only {} entries",
                ENTRY_COUNT
            )));
        }

        let freespace = self.list_freespace(ctx);
        let (start, end) = alloc::place_in_freespace(
            ctx,
            &freespace,
            Some(requested_start),
            template.size,
            template.size_is_relative,
            template.end,
            u64::MAX,
        )?;

        let ptype = match &template.ptype {
            Some(TypeId::TypeStr(s)) => Uuid::parse_str(s)
                .map(|g| self.type_for_guid(g))
                .unwrap_or_else(|_| self.type_for_guid(default_data_guid())),
            _ => self.type_for_guid(default_data_guid()),
        };
        let mut p = Partition::new(start, Extent::End(end), ptype);
        p.partno = Some(partno);
        p.uuid = Some(template.uuid.unwrap_or_else(Uuid::new_v4));
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
        let ptype = match template.ptype {
            Some(TypeId::TypeStr(s)) => Uuid::parse_str(&s)
                .map(|g| self.type_for_guid(g))
                .unwrap_or(existing.ptype.clone()),
            _ => existing.ptype.clone(),
        };
        let mut updated = Partition::new(start, Extent::Size(size), ptype);
        updated.partno = Some(partno);
        updated.uuid = template.uuid.or(existing.uuid);
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
