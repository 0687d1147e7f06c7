//! GME packed resource archive
//!
//! The archive starts with a little-endian `u32` offset table. Its first entry
//! is also the size of the table in bytes, so the table length is implied.
//! Resource `id` spans `offsets[id]..offsets[id + 1]`.

use crate::error::{EngineError, EngineResult};
use byteorder::{ByteOrder, LittleEndian};
use log::debug;

#[derive(Debug, Clone)]
pub struct GmeArchive {
    data: Vec<u8>,
    offsets: Vec<u32>,
}

impl GmeArchive {
    pub fn from_bytes(data: Vec<u8>) -> EngineResult<GmeArchive> {
        if data.len() < 4 {
            return Err(EngineError::BadResource("GME archive too short".to_string()));
        }
        let table_size = LittleEndian::read_u32(&data[0..4]) as usize;
        if table_size < 4 || table_size % 4 != 0 || table_size > data.len() {
            return Err(EngineError::BadResource(format!(
                "GME offset table size {} invalid for {} byte archive",
                table_size,
                data.len()
            )));
        }
        let offsets: Vec<u32> = data[..table_size]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
            .collect();
        debug!("GME archive: {} resources", offsets.len().saturating_sub(1));
        Ok(GmeArchive { data, offsets })
    }

    /// Number of addressable resources
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read_resource(&self, id: usize) -> EngineResult<&[u8]> {
        if id + 1 >= self.offsets.len() {
            return Err(EngineError::MissingResource(format!("GME resource {}", id)));
        }
        let start = self.offsets[id] as usize;
        let end = self.offsets[id + 1] as usize;
        if start > end || end > self.data.len() {
            return Err(EngineError::BadResource(format!(
                "GME resource {} spans {}..{} of {}",
                id,
                start,
                end,
                self.data.len()
            )));
        }
        Ok(&self.data[start..end])
    }

    /// Pack resources into an archive
    pub fn build(resources: &[Vec<u8>]) -> Vec<u8> {
        let table_size = (resources.len() + 1) * 4;
        let mut offsets = Vec::with_capacity(resources.len() + 1);
        let mut pos = table_size;
        offsets.push(pos as u32);
        for r in resources {
            pos += r.len();
            offsets.push(pos as u32);
        }
        let mut out = vec![0u8; table_size];
        for (i, &o) in offsets.iter().enumerate() {
            LittleEndian::write_u32(&mut out[i * 4..i * 4 + 4], o);
        }
        for r in resources {
            out.extend_from_slice(r);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources_by_id() {
        let packed = GmeArchive::build(&[b"tables".to_vec(), Vec::new(), b"text".to_vec()]);
        let gme = GmeArchive::from_bytes(packed).unwrap();
        assert_eq!(gme.len(), 3);
        assert_eq!(gme.read_resource(0).unwrap(), b"tables");
        assert!(gme.read_resource(1).unwrap().is_empty());
        assert_eq!(gme.read_resource(2).unwrap(), b"text");
        assert!(matches!(
            gme.read_resource(3),
            Err(EngineError::MissingResource(_))
        ));
    }

    #[test]
    fn test_bad_table_size() {
        let mut packed = GmeArchive::build(&[b"x".to_vec()]);
        packed[0] = 0xFF;
        assert!(GmeArchive::from_bytes(packed).is_err());
    }
}
