//! Size unit parsing (spec §4.7: "Size may carry a unit suffix from
//! the set {K,M,G,T,P, KiB/MiB/...}").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Sectors,
    Decimal(u64),
    Binary(u64),
}

impl Unit {
    pub fn bytes_per_unit(self) -> u64 {
        match self {
            Unit::Sectors => 1,
            Unit::Decimal(n) | Unit::Binary(n) => n,
        }
    }
}

const DECIMAL_SUFFIXES: &[(&str, u64)] = &[
    ("K", 1_000),
    ("M", 1_000_000),
    ("G", 1_000_000_000),
    ("T", 1_000_000_000_000),
    ("P", 1_000_000_000_000_000),
];

const BINARY_SUFFIXES: &[(&str, u64)] = &[
    ("KiB", 1024),
    ("MiB", 1024 * 1024),
    ("GiB", 1024 * 1024 * 1024),
    ("TiB", 1024u64.pow(4)),
    ("PiB", 1024u64.pow(5)),
];

/// Parse a size field like `"2048"`, `"+8G"`, or `"512MiB"` into a
/// sector count given the context's sector size. The leading `+` marks
/// a size as relative, which the caller records on the template (spec
/// §4.3 step 4/5 and §9 "Unit parsing").
pub fn parse_size(text: &str, sector_size: u32) -> Option<(u64, bool)> {
    let trimmed = text.trim();
    let (relative, rest) = match trimmed.strip_prefix('+') {
        Some(r) => (true, r),
        None => (false, trimmed),
    };

    for (suffix, bytes_per_unit) in BINARY_SUFFIXES {
        if let Some(num) = rest.strip_suffix(suffix) {
            let value: f64 = num.trim().parse().ok()?;
            let bytes = value * *bytes_per_unit as f64;
            return Some(((bytes / sector_size as f64).ceil() as u64, relative));
        }
    }
    for (suffix, bytes_per_unit) in DECIMAL_SUFFIXES {
        if let Some(num) = rest.strip_suffix(suffix) {
            let value: f64 = num.trim().parse().ok()?;
            let bytes = value * *bytes_per_unit as f64;
            return Some(((bytes / sector_size as f64).ceil() as u64, relative));
        }
    }
    rest.trim().parse::<u64>().ok().map(|n| (n, relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_sector_count() {
        assert_eq!(parse_size("2048", 512), Some((2048, false)));
    }

    #[test]
    fn parses_decimal_suffix() {
        let (sectors, relative) = parse_size("1G", 512).unwrap();
        assert!(!relative);
        assert_eq!(sectors, 1_000_000_000 / 512);
    }

    #[test]
    fn parses_binary_suffix_and_relative_marker() {
        let (sectors, relative) = parse_size("+512MiB", 512).unwrap();
        assert!(relative);
        assert_eq!(sectors, (512 * 1024 * 1024) as u64 / 512);
    }
}
