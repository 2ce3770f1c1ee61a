//! The 256 radix spill files `R_i`. Written append-only during `add`, read back (memory-mapped)
//! during `finish`. Handles are opened lazily on first write to a given radix — most datasets
//! won't touch all 256 — so an untouched radix costs nothing but a `None` slot.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::trace;

use crate::calculations::RADIX_COUNT;
use crate::error::Result;
use crate::slot::Slot;

fn spill_path(base_path: &Path, radix: u8) -> PathBuf {
    let mut name = base_path.as_os_str().to_owned();
    name.push(format!(".list.{radix:02X}"));
    PathBuf::from(name)
}

/// Owns the (up to) 256 buffered writers used during the append phase.
pub struct SpillFiles {
    base_path: PathBuf,
    buf_size: usize,
    writers: Vec<Option<BufWriter<File>>>,
}

impl SpillFiles {
    pub fn new(base_path: PathBuf, buf_size: usize) -> Self {
        let mut writers = Vec::with_capacity(RADIX_COUNT);
        writers.resize_with(RADIX_COUNT, || None);
        SpillFiles {
            base_path,
            buf_size,
            writers,
        }
    }

    /// Appends `slot` to radix `i`'s spill file, opening it on first use.
    pub fn record(&mut self, radix: u8, slot: Slot) -> Result<()> {
        if self.writers[radix as usize].is_none() {
            let path = spill_path(&self.base_path, radix);
            trace!("opening spill file {}", path.display());
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            self.writers[radix as usize] = Some(BufWriter::with_capacity(self.buf_size, file));
        }
        let writer = self.writers[radix as usize].as_mut().unwrap();
        writer.write_all(&slot.to_bytes())?;
        Ok(())
    }

    /// Flushes and closes every open writer, returning the path of each radix that was actually
    /// touched (the rest stay `None` and cost the sealer nothing).
    pub fn close_for_reading(mut self) -> Result<Vec<Option<PathBuf>>> {
        let mut paths = Vec::with_capacity(RADIX_COUNT);
        for (radix, writer) in self.writers.iter_mut().enumerate() {
            if let Some(w) = writer {
                w.flush()?;
                paths.push(Some(spill_path(&self.base_path, radix as u8)));
            } else {
                paths.push(None);
            }
        }
        // Dropping `self` here closes every remaining file handle.
        Ok(paths)
    }

    /// Deletes whichever spill files were created, best-effort (a missing file is not an error).
    pub fn delete_all(paths: &[Option<PathBuf>]) {
        for path in paths.iter().flatten() {
            let _ = fs::remove_file(path);
        }
    }
}
