//! The builder: the append phase (`add`) and the one-shot seal phase (`finish`) that together
//! implement the file layout described in the crate's module docs. This is the core the rest of
//! the crate exists to support.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::PathBuf;

use log::{debug, info, trace};
use memmap2::Mmap;

use crate::calculations::{self, DIRECTORY_ENTRY_SIZE, MAGIC, RADIX_COUNT, SLOT_SIZE, VERSION};
use crate::config::BuilderConfig;
use crate::error::{Error, Result};
use crate::hash;
use crate::record;
use crate::slot::Slot;
use crate::spill::SpillFiles;

/// Builds one sealed hash file. Created empty, fed any number of [`add`](Self::add) calls, then
/// sealed with exactly one [`finish`](Self::finish) call. Both `add` and `finish` fail with
/// [`Error::AlreadySealed`] once a prior `finish` call has succeeded or failed.
pub struct HashFileBuilder {
    path: PathBuf,
    data_file: Option<BufWriter<File>>,
    spill: Option<SpillFiles>,
    bucket_power: u32,
    bucket_count: u64,
    bucket_counts: Vec<u64>,
    position: u64,
    count: u64,
    sealed: bool,
}

impl HashFileBuilder {
    /// Convenience constructor over [`BuilderConfig::new`].
    pub fn new(path: impl Into<PathBuf>, expected_elements: u64) -> Result<Self> {
        Self::with_config(BuilderConfig::new(path, expected_elements))
    }

    /// Creates the output file, reserves its zero-filled header region, and opens the spill-file
    /// manager. Fails with [`Error::InvalidBucketPower`] if `expected_elements` (at the
    /// configured load factor) would need a bucket power outside `[8, 28]`.
    pub fn with_config(config: BuilderConfig) -> Result<Self> {
        let bucket_power =
            calculations::bucket_power_from_expected(config.expected_elements, config.load_factor())?;
        let bucket_count = 1u64 << bucket_power;
        let header_size = calculations::header_size(bucket_count);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&config.path)?;
        // Reserve the header region as a sparse hole rather than materializing and writing
        // `header_size` zero bytes: at P=28 that's ~4.3 GiB we don't need to touch up front, the
        // same concern the teacher's own `MMapDirectory::init` solves with `file.set_len(5)`.
        file.set_len(header_size)?;
        let mut data_file = BufWriter::with_capacity(config.data_buf_size(), file);
        data_file.seek(SeekFrom::Start(header_size))?;

        let spill = SpillFiles::new(config.path.clone(), config.spill_buf_size());
        info!(
            "initialized builder at {}: P={} B={} header_size={}",
            config.path.display(),
            bucket_power,
            bucket_count,
            header_size
        );
        Ok(HashFileBuilder {
            path: config.path,
            data_file: Some(data_file),
            spill: Some(spill),
            bucket_power,
            bucket_count,
            bucket_counts: vec![0u64; bucket_count as usize],
            position: header_size,
            count: 0,
            sealed: false,
        })
    }

    /// Number of records appended so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bucket power `P` this builder was sized for.
    pub fn bucket_power(&self) -> u32 {
        self.bucket_power
    }

    /// Appends `(key, value)` to the data segment and records its `(hash, offset)` pair in the
    /// appropriate radix spill file.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed);
        }
        let h = hash::hash(key);
        let radix = hash::radix(h);
        let bucket = hash::bucket(h, self.bucket_power);
        let record_offset = self.position;

        let data_file = self.data_file.as_mut().expect("data file open before finish");
        let written = record::write_record(data_file, key, value)?;
        self.position = calculations::advance(self.position, written)?;
        self.spill
            .as_mut()
            .expect("spill files live until finish")
            .record(radix, Slot { hash: h, offset: record_offset })?;
        self.bucket_counts[bucket as usize] += 1;
        self.count += 1;
        trace!(
            "add: offset={} radix={:#04x} bucket={} len={}",
            record_offset, radix, bucket, written
        );
        Ok(())
    }

    /// Seals the file: merges the spill files into the hash-table segment, writes the bucket
    /// directory, and patches the header. Idempotent is not required — a second call fails with
    /// [`Error::AlreadySealed`], as does any subsequent `add`.
    pub fn finish(&mut self) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed);
        }
        self.sealed = true;
        info!("sealing {}: {} records", self.path.display(), self.count);

        // Step 1: flush and close the data stream and every spill writer.
        let data_file = self.data_file.take().expect("data file open before finish");
        let mut data_file = data_file.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        let data_segment_end = self.position;
        let spill = self.spill.take().expect("spill files live until finish");
        let spill_paths = spill.close_for_reading()?;

        if let Err(e) = self.seal_body(&mut data_file, data_segment_end, &spill_paths) {
            SpillFiles::delete_all(&spill_paths);
            return Err(e);
        }

        // Step 6: delete spill files.
        SpillFiles::delete_all(&spill_paths);
        info!(
            "sealed {}: {} records, P={}, size={}",
            self.path.display(),
            self.count,
            self.bucket_power,
            data_file.metadata().map(|m| m.len()).unwrap_or(0)
        );
        Ok(())
    }

    fn seal_body(
        &self,
        data_file: &mut File,
        data_segment_end: u64,
        spill_paths: &[Option<PathBuf>],
    ) -> Result<()> {
        // Step 2: prefix sum over bucket_counts.
        let bucket_count = self.bucket_count as usize;
        let mut bucket_offsets = vec![0u64; bucket_count];
        for b in 1..bucket_count {
            bucket_offsets[b] = bucket_offsets[b - 1] + self.bucket_counts[b - 1];
        }

        // Step 3: build the hash-table segment, one radix at a time.
        data_file.seek(SeekFrom::Start(data_segment_end))?;
        for radix in 0..RADIX_COUNT {
            let Some(path) = &spill_paths[radix] else {
                continue;
            };
            self.merge_radix(radix as u8, path, &bucket_offsets, data_file)?;
        }

        // Step 4: bucket directory.
        let mut directory = vec![0u8; bucket_count * DIRECTORY_ENTRY_SIZE as usize];
        for b in 0..bucket_count {
            let entry_offset = data_segment_end + bucket_offsets[b] * SLOT_SIZE;
            let entry = &mut directory[b * 16..b * 16 + 16];
            entry[0..8].copy_from_slice(&entry_offset.to_be_bytes());
            entry[8..16].copy_from_slice(&self.bucket_counts[b].to_be_bytes());
        }

        // Step 5: patch the header.
        data_file.seek(SeekFrom::Start(0))?;
        data_file.write_all(MAGIC)?;
        data_file.write_all(&VERSION.to_be_bytes())?;
        data_file.write_all(&self.count.to_be_bytes())?;
        data_file.write_all(&(self.bucket_power as i32).to_be_bytes())?;
        data_file.write_all(&directory)?;
        data_file.flush()?;
        Ok(())
    }

    /// Reads radix `i`'s spill file (memory-mapped, to keep peak sealing memory down to one
    /// `output` block rather than two) and places every `(h, offset)` pair into its bucket's
    /// open-addressed region of a freshly zeroed block, which is then appended to `data_file`.
    fn merge_radix(
        &self,
        radix: u8,
        path: &std::path::Path,
        bucket_offsets: &[u64],
        data_file: &mut File,
    ) -> Result<()> {
        let input_file = File::open(path)?;
        let len = input_file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }
        if len > i32::MAX as u64 {
            return Err(Error::RadixTooLarge { radix, len });
        }
        // Safety: `input_file` is exclusively owned by this builder for the duration of the
        // merge and is never concurrently written to.
        let input = unsafe { Mmap::map(&input_file)? };
        let pair_count = (len / SLOT_SIZE) as usize;
        let mut output = vec![0u8; len as usize];

        for i in 0..pair_count {
            let start = i * SLOT_SIZE as usize;
            let pair = Slot::from_bytes(&input[start..start + 16]);
            let b = hash::bucket(pair.hash, self.bucket_power) as usize;
            let base = hash::base_bucket(pair.hash, self.bucket_power) as usize;
            let region_start = (bucket_offsets[b] - bucket_offsets[base]) as usize;
            let n = self.bucket_counts[b] as usize;
            debug_assert!(n >= 1, "a recorded pair must belong to a non-empty bucket");

            let p = hash::initial_probe(pair.hash, n as u64) as usize;
            let mut placed = false;
            for step in 0..n {
                let slot_index = region_start + (p + step) % n;
                let byte_off = slot_index * 16;
                if Slot::from_bytes(&output[byte_off..byte_off + 16]).is_empty() {
                    pair.write_into(&mut output[byte_off..byte_off + 16]);
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(Error::InternalInvariantViolated { bucket: b as u64 });
            }
        }

        debug!("merged radix {:#04x}: {} pairs, {} bytes", radix, pair_count, len);
        data_file.write_all(&output)?;
        Ok(())
    }

    /// Closes the data and spill streams and deletes whichever spill files were opened, without
    /// producing a sealed file. Not part of the core `add`/`finish` contract, but recommended so
    /// a caller abandoning a build doesn't leave 257 file handles and partial spill files behind.
    pub fn abort(&mut self) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed);
        }
        self.sealed = true;
        if let Some(mut data_file) = self.data_file.take() {
            data_file.flush().ok();
        }
        if let Some(spill) = self.spill.take() {
            if let Ok(paths) = spill.close_for_reading() {
                SpillFiles::delete_all(&paths);
            }
        }
        let _ = fs::remove_file(&self.path);
        Ok(())
    }
}
