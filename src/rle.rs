//! Signed run-length codec used by VGA images
//!
//! A compressed image is one byte stream covering the image column by
//! column. Each run starts with a signed header byte `a`:
//! - `a >= 0`: the next byte is a colour repeated `a + 1` times
//! - `a < 0`: the next `-a` bytes are copied verbatim
//!
//! Runs freely cross column boundaries, so a decoder that stops at the bottom
//! of a column has to remember how far into the current run it got. That
//! state is the pair (`pos`, `cont`); `cont == NO_RUN` means the next byte is
//! a fresh run header.

use crate::error::{EngineError, EngineResult};

/// Sentinel for "no run in progress"
pub const NO_RUN: i8 = -0x80;

/// Streaming decoder with explicit suspend/resume state
#[derive(Debug, Clone)]
pub struct ColumnDecoder<'a> {
    src: &'a [u8],
    pos: usize,
    cont: i8,
}

impl<'a> ColumnDecoder<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        ColumnDecoder {
            src,
            pos: 0,
            cont: NO_RUN,
        }
    }

    /// Start decoding at an offset inside `src`
    pub fn at(src: &'a [u8], pos: usize) -> Self {
        ColumnDecoder {
            src,
            pos,
            cont: NO_RUN,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// True while a run is suspended mid-way
    pub fn more(&self) -> bool {
        self.cont != NO_RUN
    }

    fn next_byte(&mut self) -> EngineResult<u8> {
        let b = *self
            .src
            .get(self.pos)
            .ok_or_else(|| EngineError::BadResource(format!("RLE data ends at {}", self.pos)))?;
        self.pos += 1;
        Ok(b)
    }

    /// Fill `out` completely, resuming any suspended run first
    pub fn feed(&mut self, out: &mut [u8]) -> EngineResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        let mut a = self.cont;
        if a == NO_RUN {
            a = self.next_byte()? as i8;
        }
        let mut i = 0;
        'runs: loop {
            if a >= 0 {
                let color = self.next_byte()?;
                loop {
                    out[i] = color;
                    i += 1;
                    if i == out.len() {
                        a -= 1;
                        if a < 0 {
                            a = NO_RUN;
                        } else {
                            // colour byte is re-read on resume
                            self.pos -= 1;
                        }
                        break 'runs;
                    }
                    a -= 1;
                    if a < 0 {
                        break;
                    }
                }
            } else {
                loop {
                    out[i] = self.next_byte()?;
                    i += 1;
                    if i == out.len() {
                        a += 1;
                        if a == 0 {
                            a = NO_RUN;
                        }
                        break 'runs;
                    }
                    a += 1;
                    if a == 0 {
                        break;
                    }
                }
            }
            a = self.next_byte()? as i8;
        }
        self.cont = a;
        Ok(())
    }

    /// Decode and discard `count` columns of `height` bytes
    pub fn skip_columns(&mut self, count: usize, height: usize) -> EngineResult<()> {
        let mut scratch = vec![0u8; height];
        for _ in 0..count {
            self.feed(&mut scratch)?;
        }
        Ok(())
    }
}

/// Compress a byte stream with the signed run-length rule
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 64 + 2);
    let mut literal: Vec<u8> = Vec::new();
    let mut i = 0;

    let flush = |literal: &mut Vec<u8>, out: &mut Vec<u8>| {
        for chunk in literal.chunks(128) {
            out.push((-(chunk.len() as i16)) as u8);
            out.extend_from_slice(chunk);
        }
        literal.clear();
    };

    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && data[i + run] == data[i] && run < 128 {
            run += 1;
        }
        if run >= 3 || (run == 2 && literal.is_empty()) {
            flush(&mut literal, &mut out);
            out.push((run - 1) as u8);
            out.push(data[i]);
        } else {
            literal.extend_from_slice(&data[i..i + run]);
        }
        i += run;
    }
    flush(&mut literal, &mut out);
    out
}

/// Compress a `width` x `height` pixel grid (row-major) column by column
pub fn encode_columns(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut column_major = Vec::with_capacity(width * height);
    for x in 0..width {
        for y in 0..height {
            column_major.push(pixels[y * width + x]);
        }
    }
    encode(&column_major)
}

/// Decode an 8-pixel-wide strip of `height` rows into `dst`, starting at
/// `origin` with row stride `pitch`
pub fn decode_column(
    dst: &mut [u8],
    origin: usize,
    pitch: usize,
    src: &[u8],
    height: usize,
) -> EngineResult<()> {
    let mut decoder = ColumnDecoder::new(src);
    let mut column = vec![0u8; height];
    for x in 0..8 {
        decoder.feed(&mut column)?;
        for (y, &color) in column.iter().enumerate() {
            if let Some(p) = dst.get_mut(origin + x + y * pitch) {
                *p = color;
            }
        }
    }
    Ok(())
}

/// Decode an 8-row band of `width` pixels into `dst`, row by row
pub fn decode_row(
    dst: &mut [u8],
    origin: usize,
    pitch: usize,
    src: &[u8],
    width: usize,
) -> EngineResult<()> {
    let mut decoder = ColumnDecoder::new(src);
    let mut row = vec![0u8; width];
    for y in 0..8 {
        decoder.feed(&mut row)?;
        let start = origin + y * pitch;
        if let Some(line) = dst.get_mut(start..start + width) {
            line.copy_from_slice(&row);
        }
    }
    Ok(())
}
