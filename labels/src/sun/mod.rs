//! Sun disklabel stub (spec supplement): same shape as the SGI stub,
//! recognizing the `0xdabe` magic at the end of the label sector.

use ptable_core::{
    Context, LabelDriver, LabelKind, Partition, PartitionTemplate, PtableError, Result,
    VerifyIssue,
};

const MAGIC_OFFSET: usize = 508;
const MAGIC: u16 = 0xdabe;

pub struct SunDriver;

impl LabelDriver for SunDriver {
    fn kind(&self) -> LabelKind {
        LabelKind::Sun
    }

    fn probe(&self, ctx: &mut Context) -> Result<bool> {
        let sector = ctx.read_sector(0)?;
        Ok(sector.len() > MAGIC_OFFSET + 1
            && u16::from_be_bytes([sector[MAGIC_OFFSET], sector[MAGIC_OFFSET + 1]]) == MAGIC)
    }

    fn create(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("creating a Sun disklabel is not supported".into()))
    }

    fn read(&self, ctx: &mut Context) -> Result<()> {
        if !self.probe(ctx)? {
            return Err(PtableError::NotFound("no Sun disklabel magic".into()));
        }
        ctx.table.clear();
        ctx.active_label = Some(LabelKind::Sun);
        Ok(())
    }

    fn write(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("writing a Sun disklabel is not supported".into()))
    }

    fn verify(&self, _ctx: &Context) -> Vec<VerifyIssue> {
        Vec::new()
    }

    fn add_partition(&self, _ctx: &mut Context, _template: PartitionTemplate) -> Result<u32> {
        Err(PtableError::Unsupported("Sun labels are read-only in this engine".into()))
    }

    fn delete_partition(&self, _ctx: &mut Context, _partno: u32) -> Result<()> {
        Err(PtableError::Unsupported("Sun labels are read-only in this engine".into()))
    }

    fn get_partition(&self, ctx: &Context, partno: u32) -> Result<Partition> {
        ctx.table
            .get(partno)
            .cloned()
            .ok_or_else(|| PtableError::InvalidArgument(format!("no such partition {}", partno)))
    }

    fn set_partition(&self, _ctx: &mut Context, _partno: u32, _template: PartitionTemplate) -> Result<()> {
        Err(PtableError::Unsupported("Sun labels are read-only in this engine".into()))
    }

    fn reorder(&self, _ctx: &mut Context) -> Result<()> {
        Err(PtableError::Unsupported("Sun labels are read-only in this engine".into()))
    }

    fn list_freespace(&self, _ctx: &Context) -> Vec<Partition> {
        Vec::new()
    }
}
