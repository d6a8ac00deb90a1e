//! The interactive command-key loop (spec §6 "Interactive command
//! keys"): a line-oriented stand-in for the curses menu the teacher's
//! own `cli` crate also leaves to a higher layer. Each command key maps
//! directly onto one `LabelDriver`/`ptable-script` operation; this
//! module owns none of the partition-table semantics itself.

use ptable_core::{
    ask::{ask_number, ask_yesno},
    Ask, Context, LabelDriver, NumberSpec, PartitionTemplate, PtableError, Result, TypeId,
};
use ptable_labels::{fields, LabelRegistry};
use std::io::{self, Write};

/// Probe every registered label in order, or offer to create a fresh
/// one if none claims the device (spec §1 dataflow, §4.2 `probe`).
fn find_or_create_label<'a>(
    ctx: &mut Context,
    registry: &'a LabelRegistry,
    force_zero: bool,
) -> Result<std::sync::Arc<dyn LabelDriver>> {
    if !force_zero {
        for kind in registry.probe_order() {
            let driver = registry.get(*kind).expect("registered kind");
            if driver.probe(ctx)? {
                driver.read(ctx)?;
                ptable_core::ask::notify(
                    ctx.ask(),
                    Ask::Info {
                        message: format!("Found an existing {} label on {}.", kind, ctx.device_path.clone().unwrap_or_default()),
                    },
                );
                return Ok(driver);
            }
        }
    }

    let items: Vec<ptable_core::MenuItem> = registry
        .probe_order()
        .iter()
        .map(|k| ptable_core::MenuItem {
            key: k.to_string(),
            name: k.to_string(),
            description: format!("create a new {} label", k),
        })
        .collect();
    let reply = ctx.ask().ask(Ask::Menu {
        query: "No partition table found. Create one".into(),
        spec: ptable_core::MenuSpec {
            items,
            default_key: Some("dos".into()),
        },
    })?;
    let key = match reply {
        ptable_core::AskResult::MenuKey(k) => k,
        _ => return Err(PtableError::Other("ask host returned the wrong result kind for Menu".into())),
    };
    let kind = registry
        .probe_order()
        .iter()
        .find(|k| k.to_string() == key)
        .copied()
        .ok_or_else(|| PtableError::InvalidArgument(format!("unknown label kind: {}", key)))?;
    let driver = registry.get(kind).expect("registered kind");
    driver.create(ctx)?;
    Ok(driver)
}

fn print_table(ctx: &Context, driver: &dyn LabelDriver) {
    let device_path = ctx.device_path.clone().unwrap_or_default();
    println!(
        "{}",
        fields::DEFAULT_COLUMNS
            .iter()
            .map(|f| f.header())
            .collect::<Vec<_>>()
            .join("  ")
    );
    for p in ctx.table.by_start() {
        println!("{}", fields::format_row(p, &device_path, fields::DEFAULT_COLUMNS));
    }
    for gap in driver.list_freespace(ctx) {
        println!("  {:<10} {:<10} {:<10} Free space", gap.start, gap.end(), gap.size());
    }
}

fn print_help() {
    println!("Command actions:");
    println!("   b   toggle a bootable flag");
    println!("   d   delete a partition");
    println!("   n   add a new partition");
    println!("   p   print the partition table");
    println!("   r   resize a partition");
    println!("   s   sort partitions by start sector");
    println!("   t   change a partition type");
    println!("   u   dump the table to a script file");
    println!("   i   apply a script file to this table");
    println!("   v   verify the table");
    println!("   W   write table to disk and exit");
    println!("   q   quit without saving changes");
    println!("   h   print this help");
}

fn read_command() -> Result<String> {
    print!("\nCommand (m for help): ");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(PtableError::IoError)?;
    Ok(line.trim().to_string())
}

fn do_new(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    let freespace = driver.list_freespace(ctx);
    if freespace.is_empty() {
        ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: "No free space left on this device.".into() });
        return Ok(());
    }
    let biggest = freespace.iter().max_by_key(|f| f.size()).unwrap();
    let start = ask_number(
        ctx.ask(),
        "First sector",
        NumberSpec {
            low: biggest.start,
            default: biggest.start,
            high: biggest.end(),
            unit: 1,
            allow_relative: false,
        },
    )?;
    let size = ask_number(
        ctx.ask(),
        "Size in sectors",
        NumberSpec {
            low: 1,
            default: biggest.end() - start + 1,
            high: biggest.end() - start + 1,
            unit: 1,
            allow_relative: true,
        },
    )?;
    let template = PartitionTemplate {
        start: Some(start),
        size: Some(size),
        ptype: Some(TypeId::Code(0x83)),
        ..Default::default()
    };
    match driver.add_partition(ctx, template) {
        Ok(partno) => ptable_core::ask::notify(
            ctx.ask(),
            Ask::Info { message: format!("Partition {} created.", partno) },
        ),
        Err(e) => ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: e.to_string() }),
    }
    Ok(())
}

fn do_delete(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    let partno = ask_number(
        ctx.ask(),
        "Partition number to delete",
        NumberSpec { low: 1, default: 1, high: u32::MAX as u64, unit: 1, allow_relative: false },
    )? as u32;
    match driver.delete_partition(ctx, partno) {
        Ok(()) => ptable_core::ask::notify(ctx.ask(), Ask::Info { message: format!("Partition {} deleted.", partno) }),
        Err(e) => ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: e.to_string() }),
    }
    Ok(())
}

fn do_toggle_bootable(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    let partno = ask_number(
        ctx.ask(),
        "Partition number",
        NumberSpec { low: 1, default: 1, high: u32::MAX as u64, unit: 1, allow_relative: false },
    )? as u32;
    match driver.toggle_bootable(ctx, partno) {
        Ok(()) => {}
        Err(e) => ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: e.to_string() }),
    }
    Ok(())
}

fn do_verify(ctx: &Context, driver: &dyn LabelDriver) {
    let issues = driver.verify(ctx);
    if issues.is_empty() {
        ptable_core::ask::notify(ctx.ask(), Ask::Info { message: "No problems found in the partition table.".into() });
        return;
    }
    for issue in issues {
        ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: issue.to_string() });
    }
}

fn do_dump(ctx: &Context) -> Result<()> {
    let path = match ctx.ask().ask(Ask::String { query: "Script file to write".into(), hint: None })? {
        ptable_core::AskResult::String(s) => s,
        _ => return Err(PtableError::Other("ask host returned the wrong result kind for String".into())),
    };
    let label_name = ctx.active_label.map(|k| k.to_string()).unwrap_or_default();
    let script = ptable_script::Script {
        header: ptable_script::ScriptHeader {
            label: Some(label_name),
            label_id: None,
            device: ctx.device_path.clone(),
            unit: Some("sectors".into()),
        },
        partitions: ctx
            .table
            .iter()
            .filter(|p| !p.is_freespace)
            .map(|p| ptable_script::ScriptPartitionLine {
                partno: p.partno,
                start: Some(p.start),
                size: Some(p.size()),
                size_is_relative: false,
                end: None,
                type_field: Some(p.ptype.id.to_string()),
                uuid: p.uuid.map(|u| u.to_string()),
                name: p.name.clone(),
                attrs: p.attrs.clone(),
                bootable: p.bootable,
            })
            .collect(),
    };
    std::fs::write(&path, ptable_script::emit(&script)).map_err(PtableError::IoError)?;
    ptable_core::ask::notify(ctx.ask(), Ask::Info { message: format!("Script written to {}.", path) });
    Ok(())
}

fn do_apply(ctx: &mut Context, registry: &LabelRegistry) -> Result<std::sync::Arc<dyn LabelDriver>> {
    let path = match ctx.ask().ask(Ask::String { query: "Script file to apply".into(), hint: None })? {
        ptable_core::AskResult::String(s) => s,
        _ => return Err(PtableError::Other("ask host returned the wrong result kind for String".into())),
    };
    let text = std::fs::read_to_string(&path).map_err(PtableError::IoError)?;
    let script = ptable_script::parse(&text, ctx.geometry.logical_sector_size)?;
    // The script's own `label:` header picks the driver (spec §4.7), which
    // may differ from whatever label was active before applying it.
    let driver = ptable_script::apply_script(ctx, registry, &script)?;
    ptable_core::ask::notify(ctx.ask(), Ask::Info { message: format!("Applied {}.", path) });
    Ok(driver)
}

fn do_change_type(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    let partno = ask_number(
        ctx.ask(),
        "Partition number",
        NumberSpec { low: 1, default: 1, high: u32::MAX as u64, unit: 1, allow_relative: false },
    )? as u32;
    let type_text = match ctx.ask().ask(Ask::String { query: "New type (hex code, GUID or shortcut)".into(), hint: None })? {
        ptable_core::AskResult::String(s) => s,
        _ => return Err(PtableError::Other("ask host returned the wrong result kind for String".into())),
    };
    let ptype = if let Ok(code) = u8::from_str_radix(type_text.trim_start_matches("0x"), 16) {
        TypeId::Code(code)
    } else {
        TypeId::TypeStr(type_text)
    };
    match driver.set_partition(ctx, partno, PartitionTemplate { ptype: Some(ptype), ..Default::default() }) {
        Ok(()) => ptable_core::ask::notify(ctx.ask(), Ask::Info { message: format!("Partition {} type changed.", partno) }),
        Err(e) => ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: e.to_string() }),
    }
    Ok(())
}

fn do_resize(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    let partno = ask_number(
        ctx.ask(),
        "Partition number to resize",
        NumberSpec { low: 1, default: 1, high: u32::MAX as u64, unit: 1, allow_relative: false },
    )? as u32;
    let existing = driver.get_partition(ctx, partno)?;
    let size = ask_number(
        ctx.ask(),
        "New size in sectors",
        NumberSpec { low: 1, default: existing.size(), high: u64::MAX, unit: 1, allow_relative: true },
    )?;
    match driver.set_partition(ctx, partno, PartitionTemplate { size: Some(size), ..Default::default() }) {
        Ok(()) => ptable_core::ask::notify(ctx.ask(), Ask::Info { message: format!("Partition {} resized.", partno) }),
        Err(e) => ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: e.to_string() }),
    }
    Ok(())
}

fn do_reorder(ctx: &mut Context, driver: &dyn LabelDriver) -> Result<()> {
    driver.reorder(ctx)?;
    ptable_core::ask::notify(ctx.ask(), Ask::Info { message: "Partitions sorted by start sector.".into() });
    Ok(())
}

/// Drive the command loop until the user writes or quits. Returns
/// whether the table was written (spec §6: exit codes distinguish a
/// write from a plain quit, even though both exit 0 interactively).
pub fn run(ctx: &mut Context, registry: &LabelRegistry, force_zero: bool) -> Result<bool> {
    let mut driver = find_or_create_label(ctx, registry, force_zero)?;

    loop {
        print_table(ctx, driver.as_ref());
        match read_command()?.as_str() {
            "p" => {}
            "n" => do_new(ctx, driver.as_ref())?,
            "d" => do_delete(ctx, driver.as_ref())?,
            "b" => do_toggle_bootable(ctx, driver.as_ref())?,
            "t" => do_change_type(ctx, driver.as_ref())?,
            "r" => do_resize(ctx, driver.as_ref())?,
            "s" => do_reorder(ctx, driver.as_ref())?,
            "v" => do_verify(ctx, driver.as_ref()),
            "u" => do_dump(ctx)?,
            "i" => driver = do_apply(ctx, registry)?,
            "h" | "m" | "?" => print_help(),
            "q" => return Ok(false),
            "W" => {
                if ctx.read_only {
                    ptable_core::ask::notify(ctx.ask(), Ask::Warn { message: "Device was opened read-only; not writing.".into() });
                    continue;
                }
                let confirmed = ask_yesno(ctx.ask(), "Write the new table to disk and exit")?;
                if !confirmed {
                    continue;
                }
                driver.write(ctx)?;
                return Ok(true);
            }
            other => {
                ptable_core::ask::notify(
                    ctx.ask(),
                    Ask::Warn { message: format!("{}: unknown command (m for help)", other) },
                );
            }
        }
    }
}
