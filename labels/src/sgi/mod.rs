//! SGI disklabel stub (spec supplement): recognizes the volume header
//! magic so the registry's probe loop correctly identifies foreign
//! disks it doesn't edit, but declines every mutating operation.

use ptable_core::{
    Context, LabelDriver, LabelKind, Partition, PartitionTemplate, PtableError, Result,
    VerifyIssue,
};

const MAGIC: u32 = 0x0be5_a941;

pub struct SgiDriver;

impl LabelDriver for SgiDriver {
    fn kind(&self) -> LabelKind {
        LabelKind::Sgi
    }

    fn probe(&self, ctx: &mut Context) -> Result<bool> {
        let sector = ctx.read_sector(0)?;
        Ok(sector.len() >= 4 && u32::from_be_bytes([sector[0], sector[1], sector[2], sector[3]]) == MAGIC)
    }

    fn create(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("creating an SGI volume header is not supported".into()))
    }

    fn read(&self, ctx: &mut Context) -> Result<()> {
        if !self.probe(ctx)? {
            return Err(PtableError::NotFound("no SGI volume header magic".into()));
        }
        ctx.table.clear();
        ctx.active_label = Some(LabelKind::Sgi);
        Ok(())
    }

    fn write(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("writing an SGI volume header is not supported".into()))
    }

    fn verify(&self, _ctx: &Context) -> Vec<VerifyIssue> {
        Vec::new()
    }

    fn add_partition(&self, _ctx: &mut Context, _template: PartitionTemplate) -> Result<u32> {
        Err(PtableError::Unsupported("SGI labels are read-only in this engine".into()))
    }

    fn delete_partition(&self, _ctx: &mut Context, _partno: u32) -> Result<()> {
        Err(PtableError::Unsupported("SGI labels are read-only in this engine".into()))
    }

    fn get_partition(&self, ctx: &Context, partno: u32) -> Result<Partition> {
        ctx.table
            .get(partno)
            .cloned()
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))
    }

    fn set_partition(&self, _ctx: &mut Context, _partno: u32, _template: PartitionTemplate) -> Result<()> {
        Err(PtableError::Unsupported("SGI labels are read-only in this engine".into()))
    }

    fn reorder(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("SGI labels are read-only in this engine".into()))
    }

    fn list_freespace(&self, _ctx: &Context) -> Vec<Partition> {
        Vec::new()
    }
}
