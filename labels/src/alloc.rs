//! The allocation algorithm (C3, spec §4.3): turn a partial
//! `PartitionTemplate` into concrete start/size values by walking free
//! space, applying alignment, and asking the host to resolve whatever
//! the template left implicit.

use ptable_core::{align, Context, Direction, PtableError, Result};

/// Resolve a requested start within `[range_start, range_end]`,
/// aligning up to the device's grain (spec §4.3 step 3).
pub fn resolve_start(ctx: &Context, requested: Option<u64>, range_start: u64, range_end: u64) -> Result<u64> {
    let candidate = requested.unwrap_or(range_start);
    let aligned = align(&ctx.geometry, candidate, Direction::Up);
    if aligned > range_end {
        return Err(PtableError::OutOfSpace(format!(
            "no aligned start fits between {} and {}",
            range_start, range_end
        )));
    }
    Ok(aligned.max(range_start))
}

/// Resolve an end sector from an explicit end, an explicit size, or "as
/// much as fits", aligning down to the grain (spec §4.3 steps 4-5).
pub fn resolve_end(
    ctx: &Context,
    start: u64,
    size: Option<u64>,
    size_is_relative: bool,
    end: Option<u64>,
    range_end: u64,
) -> Result<u64> {
    let resolved = if let Some(e) = end {
        // An explicit end (e.g. from a script) is clamped to the free
        // range but otherwise taken as-is.
        e.min(range_end)
    } else if let Some(s) = size {
        let raw_end = (start + s - 1).min(range_end);
        if size_is_relative && raw_end < range_end {
            // "+8G" semantics (spec §4.3 step 5): align the end down
            // so the next partition starts on a grain boundary.
            align(&ctx.geometry, raw_end, Direction::Down)
        } else {
            // An explicit absolute size is honored exactly, only
            // clamped to the free range's end (spec §4.3 step 5).
            raw_end
        }
    } else {
        range_end
    };
    if resolved < start {
        return Err(PtableError::OutOfSpace(
            "requested size leaves no room in this free range".into(),
        ));
    }
    Ok(resolved)
}

/// Reject a size that would overflow a label's field width (spec §4.3
/// step 6, e.g. MBR's 32-bit LBA/size fields).
pub fn check_overflow(start: u64, end: u64, max_value: u64) -> Result<()> {
    if start > max_value || end > max_value {
        return Err(PtableError::OutOfSpace(format!(
            "partition range [{}, {}] exceeds this label's {}-sector field width",
            start, end, max_value
        )));
    }
    Ok(())
}

/// The full allocation walk (spec §4.3 steps 2-6): given the label's
/// current freespace, place a request entirely inside the lowest-
/// address free range that can hold it, aligning start up and end
/// down. Returns the resolved, aligned `[start, end]` or `OutOfSpace`
/// when nothing fits.
pub fn place_in_freespace(
    ctx: &Context,
    freespace: &[ptable_core::Partition],
    requested_start: Option<u64>,
    requested_size: Option<u64>,
    size_is_relative: bool,
    requested_end: Option<u64>,
    max_value: u64,
) -> Result<(u64, u64)> {
    let mut ranges: Vec<(u64, u64)> = freespace.iter().map(|f| (f.start, f.end())).collect();
    ranges.sort_by_key(|r| r.0);

    for (lo, hi) in ranges {
        if let Some(rs) = requested_start {
            if rs < lo || rs > hi {
                continue;
            }
        }
        let start = match resolve_start(ctx, requested_start, lo, hi) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let end = match resolve_end(ctx, start, requested_size, size_is_relative, requested_end, hi) {
            Ok(e) => e,
            Err(_) => continue,
        };
        if start < lo || end > hi {
            continue;
        }
        check_overflow(start, end, max_value)?;
        return Ok((start, end));
    }
    Err(PtableError::OutOfSpace(
        "no free range large enough for this request".into(),
    ))
}
