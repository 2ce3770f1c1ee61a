//! Builder for an immutable, on-disk, content-addressed hash file — a CDB-style persistent
//! key/value map generalized to 64-bit hash codes and 64-bit file offsets.
//!
//! The file is written in a single streaming pass: [`builder::HashFileBuilder`] appends records
//! to a data segment while sharding `(hash, offset)` pairs across 256 radix spill files, then
//! [`builder::HashFileBuilder::finish`] merges those shards into a contiguous, per-bucket
//! open-addressed hash-table segment, writes the bucket directory, and patches the header last.
//! [`reader::Reader`] is the minimal read-only companion used to exercise the round trip.

pub mod builder;
pub mod calculations;
pub mod config;
pub mod error;
pub mod hash;
pub mod reader;
pub mod record;
pub mod slot;
pub mod spill;

pub use builder::HashFileBuilder;
pub use config::BuilderConfig;
pub use error::{Error, Result};
pub use reader::Reader;
