//! `apply_script` (spec §4.7 "Apply-to-context").

use super::dsl::Script;
use ptable_core::{Context, LabelDriver, LabelKind, PartitionTemplate, PtableError, Result, TypeId};
use ptable_labels::mbr::MbrTypeRegistry;
use ptable_labels::LabelRegistry;
use std::str::FromStr;
use std::sync::Arc;

fn label_kind_from_name(name: &str) -> Result<LabelKind> {
    match name.to_ascii_lowercase().as_str() {
        "dos" | "mbr" => Ok(LabelKind::Dos),
        "gpt" => Ok(LabelKind::Gpt),
        "bsd" => Ok(LabelKind::Bsd),
        "sgi" => Ok(LabelKind::Sgi),
        "sun" => Ok(LabelKind::Sun),
        other => Err(PtableError::InvalidArgument(format!("unknown label kind in script: {}", other))),
    }
}

/// Resolve a script's `type=`/`Id=` field text into a `TypeId` for the
/// label kind being created. MBR accepts a bare hex code or a
/// shortcut letter; GPT accepts a GUID or a shortcut letter.
fn resolve_type(kind: LabelKind, text: &str) -> TypeId {
    match kind {
        LabelKind::Dos => {
            if let Ok(code) = u8::from_str_radix(text.trim_start_matches("0x"), 16) {
                TypeId::Code(code)
            } else if let Some(code) = MbrTypeRegistry::shortcut_code(text) {
                TypeId::Code(code)
            } else {
                TypeId::Code(0x83)
            }
        }
        _ => {
            if uuid::Uuid::from_str(text).is_ok() {
                TypeId::TypeStr(text.to_string())
            } else {
                TypeId::TypeStr(text.to_string())
            }
        }
    }
}

/// Create the label named by the script's own `label:` header (spec
/// §4.7: "apply-to-context ... calls `create(ctx, label_from_header)`"),
/// then add every partition line in order. The first failure rolls the
/// context's table back to its pre-apply snapshot rather than leaving
/// a partially-applied table. Returns the driver the script resolved
/// to, since it may differ from whatever label was active before.
pub fn apply_script(
    ctx: &mut Context,
    registry: &LabelRegistry,
    script: &Script,
) -> Result<Arc<dyn LabelDriver>> {
    let kind = label_kind_for_header(script)?;
    let driver = registry
        .get(kind)
        .ok_or_else(|| PtableError::Unsupported(format!("no driver registered for label kind {}", kind)))?;

    let snapshot = ctx.table.clone();

    let result = (|| -> Result<()> {
        driver.create(ctx)?;
        for line in &script.partitions {
            let template = PartitionTemplate {
                partno: line.partno,
                start: line.start,
                size: line.size,
                size_is_relative: line.size_is_relative,
                end: None,
                ptype: line.type_field.as_deref().map(|t| resolve_type(kind, t)),
                name: line.name.clone(),
                uuid: line.uuid.as_deref().and_then(|u| uuid::Uuid::from_str(u).ok()),
                attrs: line.attrs.clone(),
                bootable: Some(line.bootable),
            };
            driver.add_partition(ctx, template)?;
        }
        Ok(())
    })();

    if result.is_err() {
        ctx.table = snapshot;
        return Err(result.unwrap_err());
    }
    Ok(driver)
}

pub fn label_kind_for_header(script: &Script) -> Result<LabelKind> {
    let name = script
        .header
        .label
        .as_deref()
        .ok_or_else(|| PtableError::InvalidArgument("script has no label: header".into()))?;
    label_kind_from_name(name)
}
