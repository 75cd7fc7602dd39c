//! Shared helpers for names handed to ESP-IDF.
//!
//! Partition labels, NVS namespaces and keys cross into C as
//! NUL-terminated strings; these helpers pack them without allocating.
//! Callers validate lengths first (see [`crate::config`]).

/// Copy `s` into a zeroed `N`-byte buffer, truncating so the last byte
/// always stays NUL.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(crate) fn c_name<const N: usize>(s: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let len = s.len().min(N.saturating_sub(1));
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}

/// Fixed-capacity owned copy of a label, for backends that outlive the
/// caller's borrowed config.
pub(crate) fn fixed_string<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
