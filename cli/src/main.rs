//! A thin host for the partition-table engine (spec §6): option
//! parsing, device opening, and the interactive command-key loop. The
//! full-screen presentation stays out of scope (spec §1) — this is the
//! minimal line-oriented driver needed to exercise the engine, the way
//! the teacher's `cli` crate drives its core/platform crates without
//! reimplementing a GUI.

mod ask;
mod commands;

use ask::StdioAskChannel;
use clap::Parser;
use ptable_core::{Context, DeviceGeometry};
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ptable", version, about = "Interactive partition-table editor")]
struct Cli {
    /// Device path to open. Defaults to the first platform probe path
    /// that opens successfully.
    device: Option<String>,

    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Ignore any existing label and start from a blank in-memory table.
    #[arg(long)]
    zero: bool,

    #[arg(long)]
    read_only: bool,

    #[arg(long, value_parser = ["512", "1024", "2048", "4096"])]
    sector_size: Option<String>,

    #[arg(long, value_name = "MODE", default_value = "yes")]
    lock: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let device_path = match cli.device.clone().or_else(find_probe_path) {
        Some(p) => p,
        None => {
            eprintln!("ptable: no device path given and no default device could be opened");
            return ExitCode::FAILURE;
        }
    };

    let (device, mut geometry) = match ptable_platform::open_device(&device_path, cli.read_only) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("ptable: failed to open {}: {}", device_path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(sector_size) = cli.sector_size.as_deref() {
        let sector_size: u32 = sector_size.parse().unwrap_or(geometry.logical_sector_size);
        geometry = DeviceGeometry::simple(sector_size, geometry.total_sectors);
    }

    if cli.lock == "yes" && !cli.read_only {
        log::debug!("advisory lock requested for {} (host-level locking is out of engine scope)", device_path);
    }

    let ask_channel: Arc<dyn ptable_core::AskChannel> = Arc::new(StdioAskChannel);
    let shared_device: Rc<RefCell<dyn ptable_core::BlockDevice>> = Rc::new(RefCell::new(device));
    let mut ctx = Context::new(shared_device, geometry, ask_channel);
    ctx.device_path = Some(device_path.clone());
    ctx.read_only = cli.read_only;

    let registry = ptable_labels::LabelRegistry::standard();

    match commands::run(&mut ctx, &registry, cli.zero) {
        Ok(wrote) => {
            if wrote {
                println!("The partition table has been altered.");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ptable: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn find_probe_path() -> Option<String> {
    ptable_platform::default_probe_paths()
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .map(|p| p.to_string())
}
