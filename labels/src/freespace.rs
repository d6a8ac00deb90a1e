//! The free-space enumerator (C7, spec §4.5): a label-agnostic helper
//! that every driver's `list_freespace` can share, given the used
//! ranges it should leave gaps around.

use ptable_core::Partition;

/// Compute the gaps between `used` (assumed already filtered to the
/// scope the caller cares about, e.g. "top-level only" or "inside this
/// container") within `[lo, hi]` inclusive.
pub fn gaps_in_range(used: &[&Partition], lo: u64, hi: u64) -> Vec<Partition> {
    let mut sorted: Vec<&Partition> = used.to_vec();
    sorted.sort_by_key(|p| p.start);
    let mut out = Vec::new();
    let mut cursor = lo;
    for p in sorted {
        if p.start > cursor {
            out.push(Partition::freespace(cursor, p.start - 1));
        }
        cursor = cursor.max(p.end() + 1);
    }
    if cursor <= hi {
        out.push(Partition::freespace(cursor, hi));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptable_core::{Extent, TypeId, PartitionType};

    fn part(start: u64, end: u64) -> Partition {
        Partition::new(start, Extent::End(end), PartitionType::unknown(TypeId::Code(0)))
    }

    #[test]
    fn reports_gap_before_after_and_between() {
        let a = part(100, 199);
        let b = part(300, 399);
        let gaps = gaps_in_range(&[&a, &b], 0, 499);
        assert_eq!(gaps.len(), 3);
        assert_eq!((gaps[0].start, gaps[0].end()), (0, 99));
        assert_eq!((gaps[1].start, gaps[1].end()), (200, 299));
        assert_eq!((gaps[2].start, gaps[2].end()), (400, 499));
    }

    #[test]
    fn no_gap_when_fully_used() {
        let a = part(0, 499);
        let gaps = gaps_in_range(&[&a], 0, 499);
        assert!(gaps.is_empty());
    }
}
