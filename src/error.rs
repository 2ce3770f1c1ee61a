use std::io;
use thiserror::Error;

/// Error taxonomy for the builder. Every fallible operation on [`crate::HashFileBuilder`]
/// returns one of these variants; none are retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// `expected_elements` (combined with the configured load factor) implies a bucket power
    /// outside `[8, 28]`.
    #[error("expected_elements implies a bucket power outside [8, 28]")]
    InvalidBucketPower,

    /// `add` or `finish` was called after a prior `finish` already sealed the file.
    #[error("operation attempted after the builder was already sealed")]
    AlreadySealed,

    /// A file position or byte-length computation would wrap past the supported range.
    #[error("file position or byte arithmetic overflowed")]
    Overflow,

    /// A single radix's spill file exceeded the 2 GiB (i32) limit.
    #[error("radix {radix:#04x} spill file is {len} bytes, exceeding the 2^31 byte limit")]
    RadixTooLarge { radix: u8, len: u64 },

    /// Open addressing failed to place a pair into its bucket's region. Indicates a corrupted
    /// `bucket_counts` accounting; this is a fatal bug, not a user error.
    #[error("open addressing could not place a pair in bucket {bucket} (bucket_counts is corrupted)")]
    InternalInvariantViolated { bucket: u64 },

    /// Underlying I/O failure, surfaced unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The reader (a companion to the builder, not part of its closed error taxonomy) found a
    /// file that is not a sealed hash file: bad magic, truncated header, or an out-of-range
    /// bucket power.
    #[error("not a valid sealed hash file: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
