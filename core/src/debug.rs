//! A process-wide debug mask (spec §9 "Global mutable state"):
//! initialized once, never mutated again, never torn down. Resize/die
//! signal handling stays in the host UI, as spec §9 directs.

use std::sync::OnceLock;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugMask: u32 {
        const LABEL    = 0b0001;
        const ALLOC    = 0b0010;
        const SCRIPT   = 0b0100;
        const ASK      = 0b1000;
        const ALL      = 0b1111;
    }
}

static DEBUG_MASK: OnceLock<DebugMask> = OnceLock::new();

/// Set the process-wide debug mask. Only the first call has any
/// effect; later calls are silently ignored, matching the "init once,
/// never change" lifecycle spec §9 calls for.
pub fn init(mask: DebugMask) {
    let _ = DEBUG_MASK.set(mask);
}

pub fn mask() -> DebugMask {
    *DEBUG_MASK.get_or_init(|| DebugMask::empty())
}

pub fn enabled(flag: DebugMask) -> bool {
    mask().contains(flag)
}
