//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compare two byte buffers without early exit on the first differing byte.
///
/// Buffers of different length are rejected before any byte is compared; the
/// lengths compared here are public (fixed-size digests), so that branch leaks
/// nothing secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
