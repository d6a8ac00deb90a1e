//! Script parsing (spec §4.7 "Parsing rules").

use super::dsl::{Script, ScriptHeader, ScriptPartitionLine};
use super::units::parse_size;
use ptable_core::{PtableError, Result};

/// Parse a full script body. `sector_size` is used to convert
/// unit-suffixed size fields to sectors.
pub fn parse(text: &str, sector_size: u32) -> Result<Script> {
    let mut lines = text.lines().peekable();
    let mut header = ScriptHeader::default();

    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.next();
            continue;
        }
        if !is_header_line(trimmed) {
            break;
        }
        let (key, value) = trimmed.split_once(':').unwrap();
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        match key.as_str() {
            "label" => header.label = Some(value),
            "label-id" => header.label_id = Some(value),
            "device" => header.device = Some(value),
            "unit" => header.unit = Some(value),
            _ => {}
        }
        lines.next();
    }

    let mut partitions = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        partitions.push(parse_partition_line(trimmed, sector_size)?);
    }

    Ok(Script { header, partitions })
}

/// A header line is `name: value` with no `=` appearing before the
/// colon (distinguishing it from a partition line using the
/// `<device> : start=..., size=...` shape, spec §4.7).
fn is_header_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((key, _)) => !key.contains('='),
        None => false,
    }
}

fn parse_partition_line(line: &str, sector_size: u32) -> Result<ScriptPartitionLine> {
    if !line.contains('=') {
        return parse_commas_line(line, sector_size);
    }

    let (prefix, rest) = line.split_once(':').unwrap_or(("", line));
    let mut out = ScriptPartitionLine::default();
    out.partno = parse_partno(prefix.trim());

    for field in split_fields(rest) {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        if field.eq_ignore_ascii_case("bootable") {
            out.bootable = true;
            continue;
        }
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| PtableError::InvalidArgument(format!("malformed field: {}", field)))?;
        let key = key.trim().to_ascii_lowercase();
        let value = strip_quotes(value.trim());
        match key.as_str() {
            "start" => {
                out.start = Some(
                    value
                        .parse()
                        .map_err(|_| PtableError::InvalidArgument(format!("bad start: {}", value)))?,
                )
            }
            "size" => {
                let (sectors, relative) = parse_size(value, sector_size)
                    .ok_or_else(|| PtableError::InvalidArgument(format!("bad size: {}", value)))?;
                out.size = Some(sectors);
                out.size_is_relative = relative;
            }
            // `Id=` is a legacy alias for `type=`, accepted on parse
            // but never emitted (spec §9 Open Question, decided).
            "type" | "id" => out.type_field = Some(value.to_string()),
            "uuid" => out.uuid = Some(value.to_string()),
            "name" => out.name = Some(value.to_string()),
            "attrs" => out.attrs = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(out)
}

fn parse_commas_line(line: &str, sector_size: u32) -> Result<ScriptPartitionLine> {
    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
    let mut out = ScriptPartitionLine::default();
    if let Some(start) = parts.first().filter(|s| !s.is_empty()) {
        out.start = Some(
            start
                .parse()
                .map_err(|_| PtableError::InvalidArgument(format!("bad start: {}", start)))?,
        );
    }
    if let Some(size) = parts.get(1).filter(|s| !s.is_empty()) {
        let (sectors, relative) = parse_size(size, sector_size)
            .ok_or_else(|| PtableError::InvalidArgument(format!("bad size: {}", size)))?;
        out.size = Some(sectors);
        out.size_is_relative = relative;
    }
    if let Some(ty) = parts.get(2).filter(|s| !s.is_empty()) {
        out.type_field = Some(ty.to_string());
    }
    if let Some(boot) = parts.get(3).filter(|s| !s.is_empty()) {
        out.bootable = boot.eq_ignore_ascii_case("*") || boot.eq_ignore_ascii_case("bootable");
    }
    Ok(out)
}

fn parse_partno(prefix: &str) -> Option<u32> {
    if prefix.is_empty() {
        return None;
    }
    if let Ok(n) = prefix.parse::<u32>() {
        return Some(n);
    }
    // trailing digits on a device path (e.g. "/dev/sda3") name ordinal
    // n - 1 in zero-based partno terms is NOT how the engine counts;
    // the script format's partnos are 1-based like everywhere else, so
    // the trailing digits are the partno directly.
    let digits: String = prefix.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.chars().rev().collect::<String>().parse().ok()
    }
}

fn split_fields(rest: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in rest.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        fields.push(current);
    }
    fields
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_then_partitions() {
        let text = "label: gpt\ndevice: /dev/sda\nunit: sectors\n\n1 : start=2048, size=1000000, type=L, name=\"root\"\n";
        let script = parse(text, 512).unwrap();
        assert_eq!(script.header.label.as_deref(), Some("gpt"));
        assert_eq!(script.partitions.len(), 1);
        let p = &script.partitions[0];
        assert_eq!(p.partno, Some(1));
        assert_eq!(p.start, Some(2048));
        assert_eq!(p.size, Some(1_000_000));
        assert_eq!(p.name.as_deref(), Some("root"));
    }

    #[test]
    fn parses_commas_positional_form() {
        let script = parse("label: dos\n\n2048, 1000000, L, *\n", 512).unwrap();
        let p = &script.partitions[0];
        assert_eq!(p.start, Some(2048));
        assert_eq!(p.size, Some(1_000_000));
        assert_eq!(p.type_field.as_deref(), Some("L"));
        assert!(p.bootable);
    }

    #[test]
    fn accepts_legacy_id_alias_for_type() {
        let script = parse("label: dos\n\n1 : start=2048, size=2048, Id=L\n", 512).unwrap();
        assert_eq!(script.partitions[0].type_field.as_deref(), Some("L"));
    }

    #[test]
    fn relative_size_marker_survives_suffix_parsing() {
        let script = parse("label: dos\n\n1 : start=2048, size=+1G\n", 512).unwrap();
        assert!(script.partitions[0].size_is_relative);
    }
}
