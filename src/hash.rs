//! The hash module is the builder's one external collaborator: a pure function
//! `hash(bytes) -> u64`, plus the index arithmetic (`radix`, `bucket`, `base_bucket`) that is
//! derived purely from a hash code and the bucket power `P`. Nothing downstream of this module
//! ever re-derives a hash from a key; everything else consumes `(h, offset)` pairs.

use highway::{HighwayHash, HighwayHasher, Key};

/// Fixed HighwayHash key. HighwayHash is the SIMD-oriented, Murmur-family-class,
/// non-cryptographic hash the teacher crate already depends on; taking the leading `u64` of its
/// 256-bit digest gives the spec's "64-bit hash code" while keeping determinism across runs and
/// processes (the key must never vary, or two builders fed identical input would diverge).
fn hash_key() -> Key {
    Key([
        0x9e37_79b9_7f4a_7c15,
        0xc2b2_ae3d_27d4_eb4f,
        0x1656_67b1_9e37_79f9,
        0x27d4_eb2f_1656_67c5,
    ])
}

/// Derives the 64-bit hash code for a key.
pub fn hash(bytes: &[u8]) -> u64 {
    let hasher = HighwayHasher::new(hash_key());
    let digest = hasher.hash256(bytes);
    digest[0]
}

/// Top 8 bits of `h`; selects one of 256 spill files / radix partitions.
#[inline]
pub fn radix(h: u64) -> u8 {
    (h >> 56) as u8
}

/// Selects one of `2^p` logical buckets. Buckets are drawn from the *top* `p` bits of `h` (not
/// the bottom), so that a bucket's top 8 bits always equal `radix(h)` for `p >= 8` — this is
/// what makes `base_bucket` below a cheap bit-shift rather than a re-derivation. See DESIGN.md
/// for why this reading of "h mod 2^P" was chosen over a literal low-bits mask.
#[inline]
pub fn bucket(h: u64, p: u32) -> u64 {
    if p == 0 {
        0
    } else {
        h >> (64 - p)
    }
}

/// First bucket index belonging to the same radix as `h`, i.e. `bucket(h, p)` with the bits that
/// select within the radix cleared. Requires `p >= 8`.
#[inline]
pub fn base_bucket(h: u64, p: u32) -> u64 {
    debug_assert!(p >= 8, "base_bucket is only defined for p >= 8");
    (radix(h) as u64) << (p - 8)
}

/// The sealer's initial probe into a bucket's region: `|h| mod n`, treating `h` as signed.
/// `i64::MIN` has no positive absolute value; it is mapped to 0 deterministically, matching the
/// reader's mirror-image probe (see spec "Absolute-value probing quirk").
#[inline]
pub fn initial_probe(h: u64, n: u64) -> u64 {
    debug_assert!(n > 0, "initial_probe requires a non-empty bucket region");
    let signed = h as i64;
    let abs = signed.checked_abs().unwrap_or(0);
    (abs as u64) % n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"hello"), hash(b"hello"));
        assert_ne!(hash(b"hello"), hash(b"world"));
    }

    #[test]
    fn radix_is_top_byte() {
        let h = 0xAB00_0000_0000_0001u64;
        assert_eq!(radix(h), 0xAB);
    }

    #[test]
    fn bucket_base_bucket_share_radix_prefix() {
        let h = 0xAB12_3456_789A_BCDEu64;
        for p in 8..=28u32 {
            let b = bucket(h, p);
            let base = base_bucket(h, p);
            // base is the low end of the contiguous range of buckets sharing this radix.
            assert!(base <= b);
            assert!(b < base + (1u64 << (p - 8)));
            assert_eq!(base >> (p - 8), radix(h) as u64);
        }
    }

    #[test]
    fn bucket_zero_power_is_always_zero() {
        assert_eq!(bucket(0xFFFF_FFFF_FFFF_FFFF, 0), 0);
    }

    #[test]
    fn initial_probe_handles_i64_min() {
        let h = i64::MIN as u64;
        assert_eq!(initial_probe(h, 7), 0);
    }

    #[test]
    fn initial_probe_is_bounded() {
        for h in [0u64, 1, u64::MAX, 0x8000_0000_0000_0000] {
            let p = initial_probe(h, 5);
            assert!(p < 5);
        }
    }
}
