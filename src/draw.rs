//! Compositor: blits VGA images into the back and front surfaces
//!
//! Images come in two layouts. The Simon games pack two 4-bit pixels per
//! byte (high nibble on the left) and add the sprite palette to every pixel;
//! the later games store one 8-bit pixel per byte. Either layout may be
//! run-length compressed, in which case the data is a stream of byte columns
//! fed through `ColumnDecoder`. Colour 0 is transparent unless the sprite asks
//! for `NON_TRANS`.
//!
//! All coordinates are screen pixels. Clipping is against the active window
//! rectangle intersected with the surface.

use crate::error::{EngineError, EngineResult};
use crate::reader::read_u32_at;
use crate::rle::{decode_column, ColumnDecoder};
use bitflags::bitflags;
use log::debug;

bitflags! {
    pub struct DrawFlags: u16 {
        const FLIP = 0x1;
        const NON_TRANS = 0x2;
        const MASKED = 0x4;
        const COMPRESSED = 0x8;
        const COMPRESSED_FLIP = 0x10;
        const USE_FRONT_BUF = 0x20;
        const SCALED = 0x40;
        const OVERLAYED = 0x80;
    }
}

/// An 8-bit indexed pixel plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Surface {
        Surface {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn clear(&mut self, color: u8) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn copy_from(&mut self, other: &Surface) {
        self.pixels.copy_from_slice(&other.pixels);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect { x, y, w, h }
    }
}

pub const WINDOW_COUNT: usize = 8;

/// Video windows as `[x, y, width, height]`; x and width count 16-pixel units
pub const DEFAULT_WINDOWS: [[u16; 4]; 5] = [
    [0, 0, 20, 200],
    [0, 0, 3, 136],
    [17, 0, 3, 136],
    [0, 0, 20, 200],
    [0, 0, 20, 134],
];

pub fn default_windows() -> [[u16; 4]; WINDOW_COUNT] {
    let mut windows = [[0, 0, 20, 200]; WINDOW_COUNT];
    windows[..DEFAULT_WINDOWS.len()].copy_from_slice(&DEFAULT_WINDOWS);
    windows
}

/// Pixel rectangle of a video window
pub fn window_rect(window: [u16; 4], four_bit: bool, screen: (usize, usize)) -> Rect {
    if !four_bit {
        return Rect::new(0, 0, screen.0 as i32, screen.1 as i32);
    }
    Rect::new(
        window[0] as i32 * 16,
        window[1] as i32,
        window[2] as i32 * 16,
        window[3] as i32,
    )
}

/// One image placed on screen
#[derive(Debug, Clone, Copy)]
pub struct ImageBlit<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub x: i32,
    pub y: i32,
    /// Added to every 4-bit pixel
    pub palette: u8,
    pub flags: DrawFlags,
    pub four_bit: bool,
}

struct Plotter<'s> {
    back: &'s mut Surface,
    front: &'s mut Surface,
    flags: DrawFlags,
    palette: u8,
    four_bit: bool,
    /// Only reveal the front buffer over pixels whose high nibble is 0x20
    mask_filter: bool,
}

impl<'s> Plotter<'s> {
    fn put(&mut self, sx: usize, sy: usize, value: u8) {
        let p = sy * self.back.width + sx;
        if self.flags.contains(DrawFlags::MASKED) {
            if value != 0 && (!self.mask_filter || self.back.pixels[p] & 0xF0 == 0x20) {
                self.back.pixels[p] = self.front.pixels[p];
            }
            return;
        }
        if value == 0 && !self.flags.contains(DrawFlags::NON_TRANS) {
            return;
        }
        let color = if self.four_bit {
            value | self.palette
        } else {
            value
        };
        if self
            .flags
            .intersects(DrawFlags::USE_FRONT_BUF | DrawFlags::OVERLAYED)
        {
            self.front.pixels[p] = color;
        } else {
            self.back.pixels[p] = color;
        }
    }
}

fn pixel_of(byte: u8, k: usize, four_bit: bool) -> u8 {
    match (four_bit, k) {
        (false, _) => byte,
        (true, 0) => byte >> 4,
        (true, _) => byte & 0x0F,
    }
}

/// Draw `img` clipped to `clip`
pub fn blit(
    img: &ImageBlit,
    clip: Rect,
    back: &mut Surface,
    front: &mut Surface,
    mask_filter: bool,
) -> EngineResult<()> {
    if img.width == 0 || img.height == 0 {
        return Ok(());
    }
    let w = img.width as i32;
    let h = img.height as i32;
    let cx0 = clip.x.max(0);
    let cy0 = clip.y.max(0);
    let cx1 = (clip.x + clip.w).min(back.width as i32);
    let cy1 = (clip.y + clip.h).min(back.height as i32);
    if cx0 >= cx1 || cy0 >= cy1 {
        return Ok(());
    }

    let flip = img
        .flags
        .intersects(DrawFlags::FLIP | DrawFlags::COMPRESSED_FLIP);
    let compressed = img
        .flags
        .intersects(DrawFlags::COMPRESSED | DrawFlags::COMPRESSED_FLIP);

    // visible range in image coordinates
    let (ix0, ix1) = if flip {
        (img.x + w - cx1, img.x + w - cx0)
    } else {
        (cx0 - img.x, cx1 - img.x)
    };
    let ix0 = ix0.max(0) as usize;
    let ix1 = ix1.min(w).max(0) as usize;
    let iy0 = (cy0 - img.y).max(0) as usize;
    let iy1 = (cy1 - img.y).min(h).max(0) as usize;
    if ix0 >= ix1 || iy0 >= iy1 {
        return Ok(());
    }

    let screen_x = |ix: usize| -> usize {
        if flip {
            (img.x + w - 1 - ix as i32) as usize
        } else {
            (img.x + ix as i32) as usize
        }
    };
    let screen_y = |iy: usize| (img.y + iy as i32) as usize;

    let ppb = if img.four_bit { 2 } else { 1 };
    let mut plotter = Plotter {
        back,
        front,
        flags: img.flags,
        palette: img.palette,
        four_bit: img.four_bit,
        mask_filter,
    };

    let first_col = ix0 / ppb;
    let last_col = (ix1 + ppb - 1) / ppb;

    if compressed {
        let mut decoder = ColumnDecoder::new(img.data);
        decoder.skip_columns(first_col, img.height)?;
        let mut column = vec![0u8; img.height];
        for col in first_col..last_col {
            decoder.feed(&mut column)?;
            for iy in iy0..iy1 {
                for k in 0..ppb {
                    let ix = col * ppb + k;
                    if ix < ix0 || ix >= ix1 {
                        continue;
                    }
                    let value = pixel_of(column[iy], k, img.four_bit);
                    plotter.put(screen_x(ix), screen_y(iy), value);
                }
            }
        }
    } else {
        let row_bytes = (img.width + ppb - 1) / ppb;
        for iy in iy0..iy1 {
            let row = img
                .data
                .get(iy * row_bytes..(iy + 1) * row_bytes)
                .ok_or_else(|| {
                    EngineError::BadResource(format!("image data ends in row {}", iy))
                })?;
            for ix in ix0..ix1 {
                let value = pixel_of(row[ix / ppb], ix % ppb, img.four_bit);
                plotter.put(screen_x(ix), screen_y(iy), value);
            }
        }
    }
    Ok(())
}

/// Every pixel of `img` as one value, row-major
fn expand(img: &ImageBlit) -> EngineResult<Vec<u8>> {
    let ppb = if img.four_bit { 2 } else { 1 };
    let columns = (img.width + ppb - 1) / ppb;
    let mut out = vec![0u8; img.width * img.height];
    let compressed = img
        .flags
        .intersects(DrawFlags::COMPRESSED | DrawFlags::COMPRESSED_FLIP);
    if compressed {
        let mut decoder = ColumnDecoder::new(img.data);
        let mut column = vec![0u8; img.height];
        for col in 0..columns {
            decoder.feed(&mut column)?;
            for (iy, byte) in column.iter().enumerate() {
                for k in 0..ppb {
                    let ix = col * ppb + k;
                    if ix < img.width {
                        out[iy * img.width + ix] = pixel_of(*byte, k, img.four_bit);
                    }
                }
            }
        }
    } else {
        for iy in 0..img.height {
            let row = img
                .data
                .get(iy * columns..(iy + 1) * columns)
                .ok_or_else(|| {
                    EngineError::BadResource(format!("image data ends in row {}", iy))
                })?;
            for ix in 0..img.width {
                out[iy * img.width + ix] = pixel_of(row[ix / ppb], ix % ppb, img.four_bit);
            }
        }
    }
    Ok(out)
}

/// Draw `img` resized by `factor`, standing on (`img.x`, `img.y`)
///
/// The position is the bottom centre of the scaled image. Sampling is
/// nearest neighbour.
pub fn blit_scaled(
    img: &ImageBlit,
    factor: f32,
    clip: Rect,
    back: &mut Surface,
    front: &mut Surface,
    mask_filter: bool,
) -> EngineResult<()> {
    let sw = (img.width as f32 * factor) as usize;
    let sh = (img.height as f32 * factor) as usize;
    if sw == 0 || sh == 0 {
        return Ok(());
    }
    let pixels = expand(img)?;
    let x0 = img.x - sw as i32 / 2;
    let y0 = img.y - sh as i32;
    let cx0 = clip.x.max(0);
    let cy0 = clip.y.max(0);
    let cx1 = (clip.x + clip.w).min(back.width as i32);
    let cy1 = (clip.y + clip.h).min(back.height as i32);
    let flip = img
        .flags
        .intersects(DrawFlags::FLIP | DrawFlags::COMPRESSED_FLIP);

    let mut plotter = Plotter {
        back,
        front,
        flags: img.flags,
        palette: img.palette,
        four_bit: img.four_bit,
        mask_filter,
    };
    for sy in 0..sh {
        let py = y0 + sy as i32;
        if py < cy0 || py >= cy1 {
            continue;
        }
        let iy = sy * img.height / sh;
        for sx in 0..sw {
            let px = x0 + sx as i32;
            if px < cx0 || px >= cx1 {
                continue;
            }
            let mut ix = sx * img.width / sw;
            if flip {
                ix = img.width - 1 - ix;
            }
            plotter.put(px as usize, py as usize, pixels[iy * img.width + ix]);
        }
    }
    Ok(())
}

/// Decode the visible part of a wide background
///
/// `data` starts with one `u32` per 8-pixel strip, each the distance from
/// that table entry to the strip's compressed columns.
pub fn draw_scroll_strips(
    dst: &mut Surface,
    data: &[u8],
    first_strip: usize,
    height: usize,
    little_endian: bool,
) -> EngineResult<()> {
    let height = height.min(dst.height);
    debug!("scroll strips from {}", first_strip);
    for s in 0..dst.width / 8 {
        let entry = (first_strip + s) * 4;
        let offset = read_u32_at(data, entry, little_endian)? as usize;
        let src = data.get(entry + offset..).ok_or_else(|| {
            EngineError::BadResource(format!("scroll strip {} out of range", first_strip + s))
        })?;
        let pitch = dst.width;
        decode_column(&mut dst.pixels, s * 8, pitch, src, height)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rle::encode_columns;
    use test_log::test;

    fn pack4(pixels: &[u8]) -> Vec<u8> {
        pixels.chunks(2).map(|p| (p[0] << 4) | p[1]).collect()
    }

    fn surfaces() -> (Surface, Surface) {
        (Surface::new(32, 8), Surface::new(32, 8))
    }

    fn full() -> Rect {
        Rect::new(0, 0, 32, 8)
    }

    #[test]
    fn test_four_bit_blit_adds_palette_and_skips_zero() {
        let (mut back, mut front) = surfaces();
        back.clear(0xEE);
        let data = pack4(&[1, 0, 2, 3]);
        let img = ImageBlit {
            data: &data,
            width: 4,
            height: 1,
            x: 2,
            y: 1,
            palette: 0x30,
            flags: DrawFlags::empty(),
            four_bit: true,
        };
        blit(&img, full(), &mut back, &mut front, false).unwrap();
        assert_eq!(&back.row(1)[2..6], &[0x31, 0xEE, 0x32, 0x33]);
    }

    #[test]
    fn test_non_trans_writes_zero() {
        let (mut back, mut front) = surfaces();
        back.clear(9);
        let data = [0u8, 5];
        let img = ImageBlit {
            data: &data,
            width: 2,
            height: 1,
            x: 0,
            y: 0,
            palette: 0,
            flags: DrawFlags::NON_TRANS,
            four_bit: false,
        };
        blit(&img, full(), &mut back, &mut front, false).unwrap();
        assert_eq!(&back.row(0)[..3], &[0, 5, 9]);
    }

    #[test]
    fn test_compressed_matches_raw_when_clipped() {
        let width = 6;
        let height = 4;
        let pixels: Vec<u8> = (0..width * height).map(|i| (i % 5 + 1) as u8).collect();
        let compressed = encode_columns(&pixels, width, height);
        let clip = Rect::new(3, 1, 20, 2);

        let mut results = Vec::new();
        for (data, flags) in [
            (pixels.clone(), DrawFlags::empty()),
            (compressed, DrawFlags::COMPRESSED),
        ] {
            let (mut back, mut front) = surfaces();
            let img = ImageBlit {
                data: &data,
                width,
                height,
                x: 1,
                y: 0,
                palette: 0,
                flags,
                four_bit: false,
            };
            blit(&img, clip, &mut back, &mut front, false).unwrap();
            results.push(back);
        }
        assert_eq!(results[0], results[1]);
        // left of the clip and outside the rows nothing is drawn
        assert_eq!(results[0].pixel(2, 1), Some(0));
        assert_eq!(results[0].pixel(3, 0), Some(0));
        assert_eq!(results[0].pixel(3, 1), Some(pixels[width + 2]));
    }

    #[test]
    fn test_flip_mirrors_columns() {
        let (mut back, mut front) = surfaces();
        let data = pack4(&[1, 2, 3, 4]);
        let img = ImageBlit {
            data: &data,
            width: 4,
            height: 1,
            x: 0,
            y: 0,
            palette: 0,
            flags: DrawFlags::FLIP,
            four_bit: true,
        };
        blit(&img, full(), &mut back, &mut front, false).unwrap();
        assert_eq!(&back.row(0)[..4], &[4, 3, 2, 1]);
    }

    #[test]
    fn test_masked_reveals_front_buffer() {
        let (mut back, mut front) = surfaces();
        front.clear(7);
        back.clear(0x21);
        back.pixels[1] = 0x11;
        let data = pack4(&[1, 1, 0, 1]);
        let img = ImageBlit {
            data: &data,
            width: 4,
            height: 1,
            x: 0,
            y: 0,
            palette: 0,
            flags: DrawFlags::MASKED,
            four_bit: true,
        };
        blit(&img, full(), &mut back, &mut front, true).unwrap();
        assert_eq!(&back.row(0)[..4], &[7, 0x11, 0x21, 7]);
    }

    #[test]
    fn test_window_units() {
        let r = window_rect([17, 0, 3, 136], true, (320, 200));
        assert_eq!(r, Rect::new(272, 0, 48, 136));
        let r = window_rect([17, 0, 3, 136], false, (640, 480));
        assert_eq!(r, Rect::new(0, 0, 640, 480));
    }

    #[test]
    fn test_scroll_strips() {
        let height = 2;
        let strips: Vec<Vec<u8>> = (0..3u8)
            .map(|s| encode_columns(&[s + 1; 16], 8, height))
            .collect();
        let mut data = Vec::new();
        let table_len = strips.len() * 4;
        let mut at = table_len;
        for (i, strip) in strips.iter().enumerate() {
            data.extend_from_slice(&((at - i * 4) as u32).to_be_bytes());
            at += strip.len();
        }
        for strip in &strips {
            data.extend_from_slice(strip);
        }
        let mut dst = Surface::new(16, 2);
        draw_scroll_strips(&mut dst, &data, 1, height, false).unwrap();
        assert_eq!(dst.row(1)[0], 2);
        assert_eq!(dst.row(0)[15], 3);
    }

    #[test]
    fn test_overlayed_draws_on_background() {
        let (mut back, mut front) = surfaces();
        let data = [4u8, 5];
        let img = ImageBlit {
            data: &data,
            width: 2,
            height: 1,
            x: 3,
            y: 2,
            palette: 0,
            flags: DrawFlags::OVERLAYED,
            four_bit: false,
        };
        blit(&img, full(), &mut back, &mut front, false).unwrap();
        assert_eq!(&front.row(2)[3..5], &[4, 5]);
        assert!(back.pixels.iter().all(|p| *p == 0));
    }

    #[test]
    fn test_scaled_doubles_from_bottom_centre() {
        let (mut back, mut front) = surfaces();
        let pixels = [1u8, 2, 3, 4];
        for (data, flags) in [
            (pixels.to_vec(), DrawFlags::SCALED),
            (
                encode_columns(&pixels, 2, 2),
                DrawFlags::SCALED | DrawFlags::COMPRESSED,
            ),
        ] {
            back.clear(0);
            let img = ImageBlit {
                data: &data,
                width: 2,
                height: 2,
                x: 10,
                y: 6,
                palette: 0,
                flags,
                four_bit: false,
            };
            blit_scaled(&img, 2.0, full(), &mut back, &mut front, false).unwrap();
            // 4x4 block covering x 8..12, y 2..6
            assert_eq!(&back.row(2)[8..12], &[1, 1, 2, 2]);
            assert_eq!(&back.row(5)[8..12], &[3, 3, 4, 4]);
            assert_eq!(back.pixel(12, 5), Some(0));
            assert_eq!(back.pixel(8, 6), Some(0));
        }
    }

    #[test]
    fn test_scaled_down_to_nothing() {
        let (mut back, mut front) = surfaces();
        let data = [1u8; 4];
        let img = ImageBlit {
            data: &data,
            width: 2,
            height: 2,
            x: 4,
            y: 4,
            palette: 0,
            flags: DrawFlags::SCALED,
            four_bit: false,
        };
        blit_scaled(&img, 0.2, full(), &mut back, &mut front, false).unwrap();
        assert!(back.pixels.iter().all(|p| *p == 0));
    }
}
