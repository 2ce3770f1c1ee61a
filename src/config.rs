//! Construction-time configuration for [`crate::builder::HashFileBuilder`]. Grouping the knobs
//! into one struct (instead of a growing positional-argument constructor) lets every default live
//! in one place and be overridden independently, mirroring the teacher's own
//! `MMapDirectoryConfig` pattern of a plain config struct passed to an `init`/`with_config`
//! constructor.

use std::path::PathBuf;

use crate::calculations::DEFAULT_LOAD_FACTOR;

/// Data-segment write buffer: large, since every `add` call touches it.
pub const DEFAULT_DATA_BUF_SIZE: usize = 64 * 1024;

/// Per-radix spill write buffer: small, since 256 of these may be live at once.
pub const DEFAULT_SPILL_BUF_SIZE: usize = 8 * 1024;

/// Construction parameters for a [`crate::builder::HashFileBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Path of the sealed output file. Spill files are written alongside it as
    /// `<path>.list.<HH>`.
    pub path: PathBuf,
    /// Expected number of records, used to pick the bucket power `P` (see
    /// [`crate::calculations::bucket_power_from_expected`]).
    pub expected_elements: u64,
    /// Overrides [`DEFAULT_LOAD_FACTOR`] when set.
    pub load_factor: Option<f64>,
    /// Overrides [`DEFAULT_DATA_BUF_SIZE`] when set.
    pub data_buf_size: Option<usize>,
    /// Overrides [`DEFAULT_SPILL_BUF_SIZE`] when set.
    pub spill_buf_size: Option<usize>,
}

impl BuilderConfig {
    /// Convenience constructor equivalent to `BuilderConfig { path, expected_elements,
    /// ..Default::default() }`.
    pub fn new(path: impl Into<PathBuf>, expected_elements: u64) -> Self {
        BuilderConfig {
            path: path.into(),
            expected_elements,
            ..Default::default()
        }
    }

    pub(crate) fn load_factor(&self) -> f64 {
        self.load_factor.unwrap_or(DEFAULT_LOAD_FACTOR)
    }

    pub(crate) fn data_buf_size(&self) -> usize {
        self.data_buf_size.unwrap_or(DEFAULT_DATA_BUF_SIZE)
    }

    pub(crate) fn spill_buf_size(&self) -> usize {
        self.spill_buf_size.unwrap_or(DEFAULT_SPILL_BUF_SIZE)
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            path: PathBuf::new(),
            expected_elements: 0,
            load_factor: None,
            data_buf_size: None,
            spill_buf_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let cfg = BuilderConfig::new("out.cdbx", 100);
        assert_eq!(cfg.load_factor(), DEFAULT_LOAD_FACTOR);
        assert_eq!(cfg.data_buf_size(), DEFAULT_DATA_BUF_SIZE);
        assert_eq!(cfg.spill_buf_size(), DEFAULT_SPILL_BUF_SIZE);
    }

    #[test]
    fn overrides_stick() {
        let cfg = BuilderConfig {
            load_factor: Some(0.5),
            data_buf_size: Some(4096),
            ..BuilderConfig::new("out.cdbx", 100)
        };
        assert_eq!(cfg.load_factor(), 0.5);
        assert_eq!(cfg.data_buf_size(), 4096);
        assert_eq!(cfg.spill_buf_size(), DEFAULT_SPILL_BUF_SIZE);
    }
}
