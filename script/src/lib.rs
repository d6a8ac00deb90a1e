//! The script (dump) engine (C8, spec §4.7): parse/emit the partition
//! table DSL and apply a parsed script to a device context.

pub mod apply;
pub mod dsl;
pub mod emit;
pub mod parse;
pub mod units;

pub use apply::{apply_script, label_kind_for_header};
pub use dsl::{Script, ScriptHeader, ScriptPartitionLine};
pub use emit::emit;
pub use parse::parse;
