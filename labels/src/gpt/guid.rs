//! Mixed-endian GUID encoding (spec §6: "GUIDs in mixed-endian
//! canonical form"): the first three RFC 4122 fields (time_low,
//! time_mid, time_hi_and_version) are stored little-endian on disk;
//! clock_seq and node stay byte-for-byte as `Uuid::as_bytes` gives
//! them.

use uuid::Uuid;

pub fn to_mixed_endian_bytes(u: Uuid) -> [u8; 16] {
    let b = u.as_bytes();
    let mut out = [0u8; 16];
    out[0] = b[3];
    out[1] = b[2];
    out[2] = b[1];
    out[3] = b[0];
    out[4] = b[5];
    out[5] = b[4];
    out[6] = b[7];
    out[7] = b[6];
    out[8..16].copy_from_slice(&b[8..16]);
    out
}

pub fn from_mixed_endian_bytes(b: &[u8]) -> Uuid {
    let mut be = [0u8; 16];
    be[0] = b[3];
    be[1] = b[2];
    be[2] = b[1];
    be[3] = b[0];
    be[4] = b[5];
    be[5] = b[4];
    be[6] = b[7];
    be[7] = b[6];
    be[8..16].copy_from_slice(&b[8..16]);
    Uuid::from_bytes(be)
}
