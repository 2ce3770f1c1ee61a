//! The minimal read-only companion named in the crate's module docs: memory-maps a sealed file
//! and re-derives the builder's `bucket`/`base_bucket` functions to answer `get(key)`. Carries
//! none of the sealing/merge logic — it exists only so the builder's invariants can be checked
//! end-to-end.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::calculations::{self, MAGIC};
use crate::error::{Error, Result};
use crate::hash;
use crate::record;
use crate::slot::Slot;

/// A memory-mapped, read-only view of a sealed hash file.
pub struct Reader {
    mmap: Mmap,
    bucket_power: u32,
    count: u64,
    header_size: u64,
    data_segment_end: u64,
}

impl Reader {
    /// Opens and validates a sealed file's header, then memory-maps the whole thing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < MAGIC.len() + 8 + 8 + 4 {
            return Err(Error::InvalidFormat("file shorter than the fixed header".into()));
        }
        if &mmap[0..MAGIC.len()] != MAGIC {
            return Err(Error::InvalidFormat("bad magic bytes".into()));
        }
        let mut offset = MAGIC.len();
        let version = u64::from_be_bytes(mmap[offset..offset + 8].try_into().unwrap());
        offset += 8;
        if version != calculations::VERSION {
            return Err(Error::InvalidFormat(format!("unsupported version {version}")));
        }
        let count = u64::from_be_bytes(mmap[offset..offset + 8].try_into().unwrap());
        offset += 8;
        let bucket_power = i32::from_be_bytes(mmap[offset..offset + 4].try_into().unwrap());
        if !(calculations::MIN_BUCKET_POWER as i32..=calculations::MAX_BUCKET_POWER as i32)
            .contains(&bucket_power)
        {
            return Err(Error::InvalidFormat(format!("bucket power {bucket_power} out of range")));
        }
        let bucket_power = bucket_power as u32;
        let bucket_count = 1u64 << bucket_power;
        let header_size = calculations::header_size(bucket_count);
        if (mmap.len() as u64) < header_size {
            return Err(Error::InvalidFormat("file shorter than its declared header".into()));
        }
        // The hash-table segment is exactly `count * 16` bytes and sits at the very tail of the
        // file (see the sealed file layout table), so this is exact without re-deriving it from
        // the bucket directory.
        let data_segment_end = (mmap.len() as u64)
            .checked_sub(count * calculations::SLOT_SIZE)
            .ok_or_else(|| Error::InvalidFormat("file too short for its record count".into()))?;
        if data_segment_end < header_size {
            return Err(Error::InvalidFormat("hash-table segment overlaps the header".into()));
        }

        Ok(Reader {
            mmap,
            bucket_power,
            count,
            header_size,
            data_segment_end,
        })
    }

    /// Number of records in the file.
    pub fn count(&self) -> u64 {
        self.count
    }

    fn directory_entry(&self, bucket: u64) -> (u64, u64) {
        let base = (MAGIC.len() + 8 + 8 + 4) as u64 + bucket * calculations::DIRECTORY_ENTRY_SIZE;
        let base = base as usize;
        let offset = u64::from_be_bytes(self.mmap[base..base + 8].try_into().unwrap());
        let size = u64::from_be_bytes(self.mmap[base + 8..base + 16].try_into().unwrap());
        (offset, size)
    }

    /// Looks up `key`, returning its value if present. If the same key was inserted more than
    /// once, the first match found while walking the bucket region is returned; use
    /// [`Reader::iter`] to see every record.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let h = hash::hash(key);
        let bucket = hash::bucket(h, self.bucket_power);
        let (region_offset, region_size) = self.directory_entry(bucket);
        if region_size == 0 {
            return None;
        }
        let p = hash::initial_probe(h, region_size);
        for step in 0..region_size {
            let slot_index = (p + step) % region_size;
            let slot_offset = (region_offset + slot_index * calculations::SLOT_SIZE) as usize;
            let slot = Slot::from_bytes(&self.mmap[slot_offset..slot_offset + 16]);
            if slot.is_empty() {
                break;
            }
            if slot.hash != h {
                continue;
            }
            if let Some((record_key, value)) = record::read_record(&self.mmap, slot.offset as usize) {
                if record_key == key {
                    return Some(value.to_vec());
                }
            }
        }
        None
    }

    /// Iterates every framed record in data-segment (insertion) order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            mmap: &self.mmap,
            offset: self.header_size as usize,
            end: self.data_segment_end as usize,
        }
    }
}

/// Iterator over `(key, value)` pairs in insertion order.
pub struct Iter<'a> {
    mmap: &'a [u8],
    offset: usize,
    end: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }
        let (key, value) = record::read_record(self.mmap, self.offset)?;
        self.offset += 8 + key.len() + value.len();
        Some((key, value))
    }
}
