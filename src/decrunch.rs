//! Backward bitstream decompressor for crunched resource files
//!
//! A crunched file ends with the big-endian length of the unpacked data. The
//! word before it seeds the bit buffer: its highest set bit is a marker and
//! only the bits below it are payload. Further payload comes from big-endian
//! words read backwards from there, each consumed least significant bit
//! first. Output is also produced backwards, from the end of the buffer
//! toward the start.
//!
//! Each step reads a one-bit selector and then a code:
//!
//! | bits  | meaning                                        |
//! |-------|------------------------------------------------|
//! | 1 00  | match, 9-bit offset, 3 bytes                   |
//! | 1 01  | match, 10-bit offset, 4 bytes                  |
//! | 1 10  | match, 8-bit length `n`, 12-bit offset, n + 1  |
//! | 1 11  | literal run, 8-bit count `n`, n + 9 bytes      |
//! | 0 1   | match, 8-bit offset, 2 bytes                   |
//! | 0 0   | literal run, 3-bit count `n`, n + 1 bytes      |
//!
//! A match copies forward-written bytes: `out[d] = out[d + offset]`.

use crate::error::{EngineError, EngineResult};
use byteorder::{BigEndian, ByteOrder};
use log::debug;

/// Output bytes one packed byte can yield at most: a 23-bit code copying
/// 256 bytes, rounded up
const MAX_EXPANSION: usize = 90;

struct BitSource<'a> {
    src: &'a [u8],
    pos: usize,
    buffer: u32,
    bits: u32,
}

impl<'a> BitSource<'a> {
    fn bit(&mut self) -> EngineResult<u32> {
        if self.bits == 0 {
            if self.pos < 4 {
                return Err(EngineError::Decrunch("bitstream underrun".to_string()));
            }
            self.pos -= 4;
            self.buffer = BigEndian::read_u32(&self.src[self.pos..self.pos + 4]);
            self.bits = 32;
        }
        self.bits -= 1;
        let bit = self.buffer & 1;
        self.buffer >>= 1;
        Ok(bit)
    }

    /// Assemble `n` bits, first bit read is most significant
    fn bits(&mut self, n: u32) -> EngineResult<u32> {
        let mut value = 0;
        for _ in 0..n {
            value = (value << 1) | self.bit()?;
        }
        Ok(value)
    }
}

/// Length of the data a crunched file unpacks to
pub fn unpacked_len(src: &[u8]) -> EngineResult<usize> {
    if src.len() < 8 {
        return Err(EngineError::Decrunch(format!(
            "crunched file too short ({} bytes)",
            src.len()
        )));
    }
    Ok(BigEndian::read_u32(&src[src.len() - 4..]) as usize)
}

/// Unpack a crunched resource
pub fn decrunch(src: &[u8]) -> EngineResult<Vec<u8>> {
    let dest_len = unpacked_len(src)?;
    if dest_len > src.len().saturating_mul(MAX_EXPANSION) {
        return Err(EngineError::Decrunch(format!(
            "{} packed bytes cannot unpack to {}",
            src.len(),
            dest_len
        )));
    }
    let seed_pos = src.len() - 8;
    let seed = BigEndian::read_u32(&src[seed_pos..seed_pos + 4]);
    if seed == 0 {
        return Err(EngineError::Decrunch("empty bit buffer seed".to_string()));
    }

    let mut input = BitSource {
        src,
        pos: seed_pos,
        buffer: seed,
        bits: 31 - seed.leading_zeros(),
    };
    let mut out = vec![0u8; dest_len];
    let mut d = dest_len;

    while d > 0 {
        let (is_match, offset_bits, count) = if input.bit()? == 1 {
            match input.bits(2)? {
                0 => (true, 9, 2),
                1 => (true, 10, 3),
                2 => {
                    let count = input.bits(8)?;
                    (true, 12, count)
                }
                _ => (false, 8, 8),
            }
        } else if input.bit()? == 1 {
            (true, 8, 1)
        } else {
            (false, 3, 0)
        };

        if is_match {
            let len = count as usize + 1;
            if len > d {
                return Err(EngineError::Decrunch(format!(
                    "match of {} bytes overflows output at {}",
                    len, d
                )));
            }
            let offset = input.bits(offset_bits)? as usize;
            if d + offset > dest_len {
                return Err(EngineError::Decrunch(format!(
                    "match offset {} points past end at {}",
                    offset, d
                )));
            }
            for _ in 0..len {
                d -= 1;
                out[d] = out[d + offset];
            }
        } else {
            let len = (count + input.bits(offset_bits)?) as usize + 1;
            if len > d {
                return Err(EngineError::Decrunch(format!(
                    "literal run of {} bytes overflows output at {}",
                    len, d
                )));
            }
            for _ in 0..len {
                d -= 1;
                out[d] = input.bits(8)? as u8;
            }
        }
    }

    debug!("decrunched {} bytes into {}", src.len(), dest_len);
    Ok(out)
}
