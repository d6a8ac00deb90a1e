//! The in-memory representation of a parsed script (spec §4.7).

#[derive(Debug, Clone, Default)]
pub struct ScriptHeader {
    pub label: Option<String>,
    pub label_id: Option<String>,
    pub device: Option<String>,
    pub unit: Option<String>,
}

/// One partition line, already split into fields but not yet resolved
/// against a type registry (that happens in `apply`, which has access
/// to the label-specific catalog).
#[derive(Debug, Clone, Default)]
pub struct ScriptPartitionLine {
    /// `Some(n)` when the line named an explicit ordinal or device
    /// suffix; `None` means "next free" (spec §4.7 parsing rules).
    pub partno: Option<u32>,
    pub start: Option<u64>,
    pub size: Option<u64>,
    pub size_is_relative: bool,
    pub type_field: Option<String>,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub attrs: Option<String>,
    pub bootable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub header: ScriptHeader,
    pub partitions: Vec<ScriptPartitionLine>,
}
