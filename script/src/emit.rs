//! Script emission (spec §4.7): headers, a blank line, then one
//! aligned `key=value` line per partition. Always emits the canonical
//! `type=` field name, even when the source script used the `Id=`
//! alias on the way in (spec §9 Open Question, decided in DESIGN.md).

use super::dsl::Script;

pub fn emit(script: &Script) -> String {
    let mut out = String::new();
    if let Some(label) = &script.header.label {
        out.push_str(&format!("label: {}\n", label));
    }
    if let Some(label_id) = &script.header.label_id {
        out.push_str(&format!("label-id: {}\n", label_id));
    }
    if let Some(device) = &script.header.device {
        out.push_str(&format!("device: {}\n", device));
    }
    out.push_str(&format!("unit: {}\n", script.header.unit.as_deref().unwrap_or("sectors")));
    out.push('\n');

    for (i, p) in script.partitions.iter().enumerate() {
        let partno = p.partno.unwrap_or(i as u32 + 1);
        let mut fields = Vec::new();
        if let Some(start) = p.start {
            fields.push(format!("start={}", start));
        }
        if let Some(size) = p.size {
            fields.push(format!("size={}", size));
        }
        if let Some(ty) = &p.type_field {
            fields.push(format!("type={}", ty));
        }
        if let Some(uuid) = &p.uuid {
            fields.push(format!("uuid={}", uuid));
        }
        if let Some(name) = &p.name {
            fields.push(format!("name=\"{}\"", name));
        }
        if let Some(attrs) = &p.attrs {
            fields.push(format!("attrs=\"{}\"", attrs));
        }
        if p.bootable {
            fields.push("bootable".to_string());
        }
        out.push_str(&format!("{} : {}\n", partno, fields.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse;
    use super::*;

    #[test]
    fn parse_then_emit_round_trips_modulo_whitespace() {
        let text = "label: gpt\ndevice: /dev/sda\nunit: sectors\n\n1 : start=2048, size=1000000, type=L, name=\"root\"\n";
        let script = parse(text, 512).unwrap();
        let emitted = emit(&script);
        let reparsed = parse(&emitted, 512).unwrap();
        assert_eq!(reparsed.header.label, script.header.label);
        assert_eq!(reparsed.partitions.len(), script.partitions.len());
        assert_eq!(reparsed.partitions[0].start, script.partitions[0].start);
        assert_eq!(reparsed.partitions[0].size, script.partitions[0].size);
    }

    #[test]
    fn id_alias_is_emitted_as_type() {
        let text = "label: dos\n\n1 : start=2048, size=2048, Id=L\n";
        let script = parse(text, 512).unwrap();
        let emitted = emit(&script);
        assert!(emitted.contains("type=L"));
        assert!(!emitted.to_lowercase().contains("id="));
    }
}
