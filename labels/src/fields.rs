//! Partition-field formatting (C11, spec §4 C11): per-label column
//! descriptions plus a generic partition-to-string formatter used by
//! the CLI's list view.

use ptable_core::Partition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Device,
    Start,
    End,
    Size,
    Type,
    Attrs,
    Uuid,
    Name,
    Bootable,
}

impl Field {
    pub fn header(self) -> &'static str {
        match self {
            Field::Device => "Device",
            Field::Start => "Start",
            Field::End => "End",
            Field::Size => "Sectors",
            Field::Type => "Type",
            Field::Attrs => "Attrs",
            Field::Uuid => "UUID",
            Field::Name => "Name",
            Field::Bootable => "Boot",
        }
    }
}

/// The default column set every driver offers (spec §4 C11); a driver
/// may narrow it (SGI/SUN stubs never populate UUID/attrs, for
/// instance) but the formatter tolerates a missing value either way.
pub const DEFAULT_COLUMNS: &[Field] = &[
    Field::Device,
    Field::Bootable,
    Field::Start,
    Field::End,
    Field::Size,
    Field::Type,
    Field::Uuid,
    Field::Name,
];

pub fn format_field(p: &Partition, device_path: &str, field: Field) -> String {
    match field {
        Field::Device => match p.partno {
            Some(n) => format!("{}{}", device_path, n),
            None => device_path.to_string(),
        },
        Field::Start => p.start.to_string(),
        Field::End => p.end().to_string(),
        Field::Size => p.size().to_string(),
        Field::Type => p.ptype.name.clone(),
        Field::Attrs => p.attrs.clone().unwrap_or_default(),
        Field::Uuid => p.uuid.map(|u| u.to_string()).unwrap_or_default(),
        Field::Name => p.name.clone().unwrap_or_default(),
        Field::Bootable => if p.bootable { "*".to_string() } else { String::new() },
    }
}

pub fn format_row(p: &Partition, device_path: &str, columns: &[Field]) -> String {
    columns
        .iter()
        .map(|f| format_field(p, device_path, *f))
        .collect::<Vec<_>>()
        .join("  ")
}
