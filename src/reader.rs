//! Cursor over a loaded resource blob
//!
//! Game databases and table files are big-endian; the VGA data of the newer
//! games is little-endian. The reader carries its byte order so callers never
//! branch on it.

use crate::error::{EngineError, EngineResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader {
            data,
            pos: 0,
            little_endian: false,
        }
    }

    pub fn little_endian(data: &'a [u8]) -> Self {
        ByteReader {
            data,
            pos: 0,
            little_endian: true,
        }
    }

    pub fn with_order(data: &'a [u8], little_endian: bool) -> Self {
        ByteReader {
            data,
            pos: 0,
            little_endian,
        }
    }

    pub fn at(mut self, pos: usize) -> Self {
        self.pos = pos;
        self
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> EngineResult<&'a [u8]> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(EngineError::BadResource(format!(
                "read of {} bytes at offset {} past end ({} bytes)",
                n,
                self.pos,
                self.data.len()
            )));
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> EngineResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> EngineResult<u16> {
        let bytes = self.take(2)?;
        Ok(if self.little_endian {
            LittleEndian::read_u16(bytes)
        } else {
            BigEndian::read_u16(bytes)
        })
    }

    pub fn read_i16(&mut self) -> EngineResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> EngineResult<u32> {
        let bytes = self.take(4)?;
        Ok(if self.little_endian {
            LittleEndian::read_u32(bytes)
        } else {
            BigEndian::read_u32(bytes)
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> EngineResult<&'a [u8]> {
        self.take(n)
    }

    /// Read a NUL-terminated string, consuming the terminator
    pub fn read_cstr(&mut self) -> EngineResult<&'a [u8]> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            EngineError::BadResource(format!("unterminated string at offset {}", self.pos))
        })?;
        let s = &rest[..len];
        self.pos += len + 1;
        Ok(s)
    }
}

/// Read a word at an absolute offset
pub fn read_u16_at(data: &[u8], pos: usize, little_endian: bool) -> EngineResult<u16> {
    ByteReader::with_order(data, little_endian).at(pos).read_u16()
}

/// Read a double word at an absolute offset
pub fn read_u32_at(data: &[u8], pos: usize, little_endian: bool) -> EngineResult<u32> {
    ByteReader::with_order(data, little_endian).at(pos).read_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_and_little_endian() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(ByteReader::new(&data).read_u16().unwrap(), 0x1234);
        assert_eq!(ByteReader::little_endian(&data).read_u16().unwrap(), 0x3412);
        assert_eq!(read_u32_at(&data, 0, false).unwrap(), 0x12345678);
        assert_eq!(read_u32_at(&data, 0, true).unwrap(), 0x78563412);
    }

    #[test]
    fn test_read_past_end_is_error() {
        let data = [1u8];
        let mut r = ByteReader::new(&data);
        assert!(r.read_u16().is_err());
        assert_eq!(r.read_u8().unwrap(), 1);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn test_cstr() {
        let data = b"TABLES01\0\x00\x05";
        let mut r = ByteReader::new(data);
        assert_eq!(r.read_cstr().unwrap(), b"TABLES01");
        assert_eq!(r.read_u16().unwrap(), 5);
        assert!(r.is_empty());
    }
}
