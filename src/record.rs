//! Framed record encoding: `keyLen: i32 || valueLen: i32 || keyBytes || valueBytes`, big-endian,
//! shared by the appender (writing) and the reader (reading back a candidate slot's record).

use std::io::Write;

use crate::error::{Error, Result};

/// Writes one framed record to `w` and returns the number of bytes it occupies
/// (`8 + key.len() + value.len()`).
pub fn write_record<W: Write>(w: &mut W, key: &[u8], value: &[u8]) -> Result<u64> {
    let key_len = i32::try_from(key.len()).map_err(|_| Error::Overflow)?;
    let value_len = i32::try_from(value.len()).map_err(|_| Error::Overflow)?;
    w.write_all(&key_len.to_be_bytes())?;
    w.write_all(&value_len.to_be_bytes())?;
    w.write_all(key)?;
    w.write_all(value)?;
    Ok(8 + key.len() as u64 + value.len() as u64)
}

/// Reads one framed record out of `bytes` starting at `offset`, returning `(key, value)` slices
/// borrowed from `bytes`. Used by the reader against a memory-mapped file, so no copy is made
/// until a caller decides to keep the value.
pub fn read_record(bytes: &[u8], offset: usize) -> Option<(&[u8], &[u8])> {
    let header = bytes.get(offset..offset + 8)?;
    let key_len = i32::from_be_bytes(header[0..4].try_into().ok()?);
    let value_len = i32::from_be_bytes(header[4..8].try_into().ok()?);
    if key_len < 0 || value_len < 0 {
        return None;
    }
    let key_start = offset + 8;
    let key_end = key_start + key_len as usize;
    let value_end = key_end + value_len as usize;
    let key = bytes.get(key_start..key_end)?;
    let value = bytes.get(key_end..value_end)?;
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_record() {
        let mut buf = Cursor::new(Vec::new());
        let len = write_record(&mut buf, b"hello", b"world").unwrap();
        assert_eq!(len, 8 + 5 + 5);
        let bytes = buf.into_inner();
        let (key, value) = read_record(&bytes, 0).unwrap();
        assert_eq!(key, b"hello");
        assert_eq!(value, b"world");
    }

    #[test]
    fn empty_key_and_value_are_legal() {
        let mut buf = Cursor::new(Vec::new());
        let len = write_record(&mut buf, b"", b"").unwrap();
        assert_eq!(len, 8);
        let bytes = buf.into_inner();
        let (key, value) = read_record(&bytes, 0).unwrap();
        assert!(key.is_empty());
        assert!(value.is_empty());
    }

    #[test]
    fn reads_are_big_endian() {
        let mut buf = Cursor::new(Vec::new());
        write_record(&mut buf, b"ab", b"c").unwrap();
        let bytes = buf.into_inner();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 1]);
    }

    #[test]
    fn truncated_buffer_fails_to_read() {
        assert!(read_record(&[0, 0, 0, 1], 0).is_none());
    }
}
