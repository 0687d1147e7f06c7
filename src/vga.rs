//! VGA animation machine
//!
//! Each sprite runs a private script out of its zone. A script runs until it
//! returns, halts its sprite, or parks itself on a timer or a sync id; the
//! frame pump later resumes it from the saved cursor. There is no stack to
//! save: a suspended script is nothing but a `VgaCursor` in a timer entry or
//! a sleeper.
//!
//! Sprite x coordinates are in 8-pixel columns on the 4-bit games and in
//! pixels on the later ones; y is always in pixels. The scroll offset uses
//! the same unit as x.

use crate::config::{EngineConfig, GameVariant};
use crate::draw::{
    blit, blit_scaled, default_windows, draw_scroll_strips, window_rect, DrawFlags, ImageBlit,
    Rect, Surface, WINDOW_COUNT,
};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::opcode_tables::{vga_opcode_count, vga_opcode_name, vga_param_lengths};
use crate::sprite::{SpriteTable, VgaSprite, PERSISTENT_SPRITE};
use crate::timers::{Sleeper, SleeperList, VgaTimerList};
use crate::zone::{VgaCursor, ZoneCache};
use log::{debug, warn};

/// Path tables a zone script may register with the path opcodes
pub const PATH_SLOTS: usize = 20;

/// Variable holding the scroll position, in scroll units
pub const SCROLL_X_VAR: usize = 251;

/// What a VGA opcode asks of the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgaFlow {
    Continue,
    /// The script parked itself or its sprite is gone
    Exit,
}

/// Horizontal scroll of a wide background
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub x: i16,
    pub x_max: i16,
    /// Steps still to go; the sign is the direction
    pub count: i16,
    /// Direction of the step the next frame performs, 0 when idle
    pub flag: i16,
    /// Zone and image number of the background being scrolled
    pub image: Option<(u16, u16)>,
    pub height: usize,
}

/// Byte stream consumed by the get-path-value opcode
#[derive(Debug, Clone, Default)]
pub struct PathValues {
    values: Vec<u8>,
    next: usize,
}

impl PathValues {
    pub fn load(&mut self, values: &[u8]) {
        self.values = values.to_vec();
        self.next = 0;
    }

    pub fn next_value(&mut self) -> u8 {
        let v = self.values.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        v
    }
}

/// One image to place, in script coordinates
#[derive(Debug, Clone, Copy)]
pub struct DrawRequest {
    pub zone: u16,
    pub image: u16,
    /// Palette number; 4-bit pixels are offset by 16 per palette
    pub palette: u16,
    pub x: i16,
    pub y: i16,
    pub flags: DrawFlags,
    pub window: u16,
}

/// Everything the VGA machine owns
pub struct VgaState {
    pub zones: ZoneCache,
    pub sprites: SpriteTable,
    pub timers: VgaTimerList,
    pub sleepers: SleeperList,
    pub cursor: VgaCursor,
    pub sprite_id: u16,
    pub zone: u16,
    pub palette: [[u8; 3]; 256],
    pub palette_dirty: bool,
    pub faded: bool,
    /// Composed frame
    pub back: Surface,
    /// Persistent background the frame starts from
    pub front: Surface,
    pub windows: [[u16; 4]; WINDOW_COUNT],
    pub window_num: u16,
    pub frame_rate: u16,
    pub scroll: ScrollState,
    /// Sync id the script machine is blocked on, 0 when none
    pub wait_for: u16,
    pub paths: [Option<VgaCursor>; PATH_SLOTS],
    pub path_values: PathValues,
    pub path_values1: PathValues,
    pub marks: u32,
    pub scale_base_y: i16,
    pub scale: f32,
    pub mouse_hide: u16,
    pub queued_music: Option<u16>,
}

impl VgaState {
    pub fn new(config: &EngineConfig) -> VgaState {
        let game = config.game;
        let (w, h) = game.screen_size();
        VgaState {
            zones: ZoneCache::new(config.zone_cache_limit, game.little_endian()),
            sprites: SpriteTable::new(game.sprites_keyed_by_zone()),
            timers: VgaTimerList::new(),
            sleepers: SleeperList::new(),
            cursor: VgaCursor { zone: 0, pos: 0 },
            sprite_id: 0,
            zone: 0,
            palette: [[0; 3]; 256],
            palette_dirty: true,
            faded: false,
            back: Surface::new(w, h),
            front: Surface::new(w, h),
            windows: default_windows(),
            window_num: 0,
            frame_rate: 1,
            scroll: ScrollState::default(),
            wait_for: 0,
            paths: [None; PATH_SLOTS],
            path_values: PathValues::default(),
            path_values1: PathValues::default(),
            marks: 0,
            scale_base_y: 0,
            scale: 0.0,
            mouse_hide: 0,
            queued_music: None,
        }
    }

    pub fn window(&self, n: u16) -> [u16; 4] {
        self.windows
            .get(n as usize)
            .copied()
            .unwrap_or([0, 0, 20, 200])
    }
}

/// Size factor of a scaled sprite standing at `y`
pub fn perspective_factor(y: i16, base_y: i16, scale: f32) -> f32 {
    (1.0 + (y as f32 - base_y as f32) * scale).max(0.0)
}

/// Scaled offset for the perspective opcodes
pub fn scaled_offset(y: i16, x: i16, base_y: i16, scale: f32) -> i16 {
    let (y, x, base_y) = (y as f32, x as i32, base_y as f32);
    if y > base_y {
        return (x as f32 * (1.0 + (y - base_y) * scale)) as i16;
    }
    if x == 0 {
        return 0;
    }
    let factor = 1.0 - (base_y - y) * scale;
    if x < 0 {
        let z = (x as f32 * factor - 0.5) as i32;
        return if z > -2 { -2 } else { z as i16 };
    }
    let z = (x as f32 * factor + 0.5) as i32;
    if z < 2 {
        2
    } else {
        z as i16
    }
}

impl Engine {
    /// Zone files share one byte order; Simon 1 and older use word opcodes
    /// and word flags
    pub(crate) fn vga_word_layout(&self) -> bool {
        self.game.vga_word_opcodes()
    }

    pub fn load_zone(&mut self, number: u16) -> EngineResult<()> {
        let vga = &mut self.vga;
        let (sprites, timers, sleepers, cursor) =
            (&vga.sprites, &vga.timers, &vga.sleepers, vga.cursor);
        vga.zones.ensure_loaded(number, self.res.as_mut(), |z| {
            sprites.uses_zone(z)
                || timers.references_zone(z)
                || sleepers.references_zone(z)
                || cursor.zone == z
        })
    }

    pub(crate) fn vc_read_byte(&mut self) -> EngineResult<u8> {
        let vga = &mut self.vga;
        vga.zones.read_u8(&mut vga.cursor)
    }

    pub(crate) fn vc_read_word(&mut self) -> EngineResult<u16> {
        let vga = &mut self.vga;
        vga.zones.read_u16(&mut vga.cursor)
    }

    pub(crate) fn vc_read_opcode(&mut self) -> EngineResult<u16> {
        if self.vga_word_layout() {
            self.vc_read_word()
        } else {
            Ok(self.vc_read_byte()? as u16)
        }
    }

    /// A word; negative words name a variable
    pub(crate) fn vc_read_var_or_word(&mut self) -> EngineResult<i16> {
        let w = self.vc_read_word()? as i16;
        if w < 0 {
            self.read_variable(w.unsigned_abs() as usize)
        } else {
            Ok(w)
        }
    }

    pub(crate) fn vc_skip_next_instruction(&mut self) -> EngineResult<()> {
        let opcode = self.vc_read_opcode()?;
        let len = *vga_param_lengths(self.game)
            .get(opcode as usize)
            .ok_or(EngineError::InvalidOpcode(VmKind::Vga, opcode))?;
        self.vga.cursor.pos += len as usize;
        debug!("vc skip {}", vga_opcode_name(opcode));
        Ok(())
    }

    /// Run the current script until it returns or parks
    pub fn run_vga_script(&mut self) -> EngineResult<()> {
        let count = vga_opcode_count(self.game);
        loop {
            let opcode = self.vc_read_opcode()?;
            if opcode as usize >= count {
                return Err(EngineError::InvalidOpcode(VmKind::Vga, opcode));
            }
            if opcode == 0 {
                return Ok(());
            }
            debug!(
                "vc{} {} (sprite {}, zone {})",
                opcode,
                vga_opcode_name(opcode),
                self.vga.sprite_id,
                self.vga.zone
            );
            if self.execute_vga_op(opcode)? == VgaFlow::Exit {
                return Ok(());
            }
        }
    }

    /// Continue a parked script
    pub fn resume_vga(&mut self, cursor: VgaCursor, sprite_id: u16, zone: u16) -> EngineResult<()> {
        self.load_zone(cursor.zone)?;
        self.vga.cursor = cursor;
        self.vga.sprite_id = sprite_id;
        self.vga.zone = zone;
        self.run_vga_script()
    }

    /// Run a script nested inside the current one and come back
    pub(crate) fn call_vga_script(&mut self, cursor: VgaCursor) -> EngineResult<()> {
        let saved = self.vga.cursor;
        self.vga.cursor = cursor;
        let result = self.run_vga_script();
        self.vga.cursor = saved;
        result
    }

    /// Look up the image script `id`; a missing one is a content error
    pub(crate) fn image_script_cursor(&mut self, id: u16) -> EngineResult<VgaCursor> {
        let zone = id / 100;
        self.load_zone(zone)?;
        let pos = self.vga.zones.get(zone)?.image_script(id)?.ok_or_else(|| {
            EngineError::BadResource(format!("zone {} has no image script {}", zone, id))
        })?;
        Ok(VgaCursor { zone, pos })
    }

    /// Create a sprite and schedule its animation script
    ///
    /// Does nothing if the sprite already exists. A zone without the
    /// animation drops the sprite again.
    pub fn start_vga_code(
        &mut self,
        window: u16,
        zone: u16,
        sprite_id: u16,
        x: i16,
        y: i16,
        palette: u16,
    ) -> EngineResult<()> {
        if self.vga.sprites.contains(sprite_id, zone) {
            debug!("sprite {} already running", sprite_id);
            return Ok(());
        }
        self.vga.sprites.add(sprite_id, zone, x, y, palette, window);
        self.load_zone(zone)?;
        match self.vga.zones.get(zone)?.animation_script(sprite_id)? {
            Some(pos) => {
                let base = self.game.vga_base_delay();
                self.vga
                    .timers
                    .add(base, Some(VgaCursor { zone, pos }), sprite_id, zone);
            }
            None => {
                warn!("zone {} has no animation {}", zone, sprite_id);
                self.vga.sprites.remove(sprite_id, zone);
            }
        }
        Ok(())
    }

    /// Switch a window to a new scene by running an image script
    pub fn set_window_image(&mut self, window: u16, vga_res: u16) -> EngineResult<()> {
        debug!("set_window_image {} -> {}", window, vga_res);
        self.vga.window_num = window;
        if self.game == GameVariant::Simon2 {
            self.vga.scroll = ScrollState {
                height: 134,
                ..ScrollState::default()
            };
            if self.read_variable(34)? != -1 {
                self.write_variable(SCROLL_X_VAR, 0)?;
            }
        }
        let cursor = self.image_script_cursor(vga_res)?;
        let (sprite, zone) = (self.vga.sprite_id, self.vga.zone);
        self.vga.zone = cursor.zone;
        let result = self.call_vga_script(cursor);
        self.vga.sprite_id = sprite;
        self.vga.zone = zone;
        result
    }

    pub(crate) fn current_sprite(&mut self) -> Option<&mut VgaSprite> {
        let (id, zone) = (self.vga.sprite_id, self.vga.zone);
        let sprite = self.vga.sprites.find_mut(id, zone);
        if sprite.is_none() {
            debug!("no current sprite {} in zone {}", id, zone);
        }
        sprite
    }

    /// Wake every script sleeping on `id`
    pub fn wake_sleepers(&mut self, id: u16) {
        let base = self.game.vga_base_delay();
        for s in self.vga.sleepers.wake(id) {
            self.vga
                .timers
                .add(base, Some(s.cursor), s.sprite_id, s.zone);
        }
        if id == self.vga.wait_for {
            self.vga.wait_for = 0;
        }
    }

    pub(crate) fn sleep_current(&mut self, ident: u16) {
        self.vga.sleepers.sleep(Sleeper {
            ident,
            cursor: self.vga.cursor,
            sprite_id: self.vga.sprite_id,
            zone: self.vga.zone,
        });
    }

    /// Remove a sprite with its sleeper and timers
    pub fn kill_sprite(&mut self, zone: u16, sprite_id: u16) {
        let keyed = if self.game == GameVariant::Simon1 {
            None
        } else {
            Some(zone)
        };
        self.vga.sleepers.remove_sprite(sprite_id, keyed);
        if self.vga.sprites.remove(sprite_id, zone).is_some() {
            self.vga.timers.remove_sprite(sprite_id, keyed);
        }
    }

    /// Drop every sprite, sleeper and script timer
    pub fn reset_sprites(&mut self) -> EngineResult<()> {
        let keep_persistent = self.game == GameVariant::Simon1;
        self.vga
            .sprites
            .retain(|s| keep_persistent && s.id == PERSISTENT_SPRITE);
        self.vga.sleepers.clear();
        self.vga
            .timers
            .retain_scripts(|t| keep_persistent && t.sprite_id == PERSISTENT_SPRITE);
        self.write_variable(254, 0)?;
        if self.game == GameVariant::Feeble {
            self.write_variable(42, 1)?;
        }
        Ok(())
    }

    fn scroll_px(&self) -> i32 {
        if self.game.eight_bit_images() {
            self.vga.scroll.x as i32
        } else {
            self.vga.scroll.x as i32 * 8
        }
    }

    fn is_wide(&self, width: usize) -> bool {
        match self.game {
            GameVariant::Simon2 => width > 320,
            GameVariant::Feeble | GameVariant::PuzzlePack => width > 640,
            _ => false,
        }
    }

    /// Compose one image into the frame or, for `to_background`, into the
    /// persistent background
    pub fn draw_image(&mut self, req: DrawRequest, to_background: bool) -> EngineResult<()> {
        if req.image == 0 {
            return Ok(());
        }
        self.load_zone(req.zone)?;
        let four_bit = !self.game.eight_bit_images();
        let header = self.vga.zones.get(req.zone)?.image_header(req.image)?;

        if self.is_wide(header.width) {
            return self.horizontal_scroll(req.zone, req.image, req.x);
        }

        let mut flags = req.flags;
        if header.compressed {
            if self.game.eight_bit_images() {
                flags |= DrawFlags::COMPRESSED;
            } else if !flags.contains(DrawFlags::COMPRESSED_FLIP) {
                if flags.contains(DrawFlags::FLIP) {
                    flags.remove(DrawFlags::FLIP);
                    flags |= DrawFlags::COMPRESSED_FLIP;
                } else {
                    flags |= DrawFlags::COMPRESSED;
                }
            }
        }
        if to_background && !flags.contains(DrawFlags::MASKED) {
            flags |= DrawFlags::USE_FRONT_BUF;
        }

        let screen = self.game.screen_size();
        let clip = window_rect(self.vga.window(req.window & 0x7FFF), four_bit, screen);
        let unit = if four_bit { 8 } else { 1 };
        let x = clip.x + req.x as i32 * unit - self.scroll_px();
        let y = clip.y + req.y as i32;
        let mask_filter = self.game == GameVariant::Simon1 && self.vm.bit(88);

        let vga = &mut self.vga;
        let zone = vga.zones.get(req.zone)?;
        let img = ImageBlit {
            data: zone.image_data(&header)?,
            width: header.width,
            height: header.height,
            x,
            y,
            palette: (req.palette as u8).wrapping_mul(16),
            flags,
            four_bit,
        };
        if flags.contains(DrawFlags::SCALED) {
            let factor = perspective_factor(req.y, vga.scale_base_y, vga.scale);
            return blit_scaled(&img, factor, clip, &mut vga.back, &mut vga.front, mask_filter);
        }
        blit(&img, clip, &mut vga.back, &mut vga.front, mask_filter)
    }

    /// Take over a wide image as the scrolling background
    pub(crate) fn horizontal_scroll(&mut self, zone: u16, image: u16, x: i16) -> EngineResult<()> {
        let header = self.vga.zones.get(zone)?.image_header(image)?;
        let x_max = if self.game.eight_bit_images() {
            header.width as i16 - 640
        } else {
            (header.width / 8) as i16 - 40
        };
        let x = if self.read_variable(34)? < 0 {
            self.read_variable(SCROLL_X_VAR)?
        } else {
            x
        };
        self.vga.scroll.x_max = x_max;
        self.vga.scroll.image = Some((zone, image));
        self.vga.scroll.height = header.height;
        self.vga.scroll.x = x;
        self.write_variable(SCROLL_X_VAR, x)?;
        self.draw_scroll_background()
    }

    pub(crate) fn draw_scroll_background(&mut self) -> EngineResult<()> {
        let (zone, image) = match self.vga.scroll.image {
            Some(v) => v,
            None => return Ok(()),
        };
        self.load_zone(zone)?;
        let first_strip = if self.game.eight_bit_images() {
            self.vga.scroll.x.max(0) as usize / 8
        } else {
            self.vga.scroll.x.max(0) as usize
        };
        let le = self.game.little_endian();
        let height = self.vga.scroll.height;
        let vga = &mut self.vga;
        let z = vga.zones.get(zone)?;
        let header = z.image_header(image)?;
        draw_scroll_strips(&mut vga.front, z.image_data(&header)?, first_strip, height, le)
    }

    /// Move the background one step in the pending direction
    pub(crate) fn scroll_step(&mut self) -> EngineResult<()> {
        let step = if self.game.eight_bit_images() { 8 } else { 1 };
        let scroll = &mut self.vga.scroll;
        scroll.x = (scroll.x + scroll.flag * step).clamp(0, scroll.x_max.max(0));
        scroll.flag = 0;
        let x = scroll.x;
        self.write_variable(SCROLL_X_VAR, x)?;
        self.draw_scroll_background()
    }

    /// Expiry of the scroll timer: arm the next step and re-arm
    pub fn scroll_timeout(&mut self) {
        let step = if self.game.eight_bit_images() { 8 } else { 1 };
        let scroll = &mut self.vga.scroll;
        if scroll.count == 0 {
            return;
        }
        if scroll.count < 0 {
            if scroll.flag != -1 {
                scroll.flag = -1;
                scroll.count = (scroll.count + step).min(0);
                if scroll.count == 0 {
                    return;
                }
            }
        } else if scroll.flag != 1 {
            scroll.flag = 1;
            scroll.count = (scroll.count - step).max(0);
            if scroll.count == 0 {
                return;
            }
        }
        self.vga.timers.add(10, None, 0, 0);
    }

    /// Arm a scroll toward `value` when it nears an edge of the view
    ///
    /// Used by the add and subtract opcodes on variable 15 in Simon 2.
    pub(crate) fn check_scroll_edge(&mut self, forward: bool, value: i16) {
        let scroll = &mut self.vga.scroll;
        if forward {
            if scroll.count != 0 {
                if scroll.count >= 0 {
                    return;
                }
                scroll.count = 0;
            } else if scroll.flag != 0 {
                return;
            }
            if value.wrapping_sub(scroll.x) >= 30 {
                scroll.count = 20.min(scroll.x_max - scroll.x);
                self.vga.timers.add(6, None, 0, 0);
            }
        } else {
            if scroll.count != 0 {
                if scroll.count < 0 {
                    return;
                }
                scroll.count = 0;
            } else if scroll.flag != 0 {
                return;
            }
            if (value.wrapping_sub(scroll.x) as u16) < 11 {
                scroll.count = if scroll.x < 20 { -scroll.x } else { -20 };
                self.vga.timers.add(6, None, 0, 0);
            }
        }
    }

    /// Feeble's pixel scroll check for the scaled move opcodes
    pub(crate) fn check_scroll_x(&mut self, dx: i16, xpos: i16) {
        if self.vga.scroll.x_max == 0 || self.vm.bit(80) || self.vm.bit(82) || dx == 0 {
            return;
        }
        let scroll = &mut self.vga.scroll;
        if dx > 0 {
            if scroll.count != 0 {
                if scroll.count >= 0 {
                    return;
                }
                scroll.count = 0;
            } else if scroll.flag != 0 {
                return;
            }
            if xpos.wrapping_sub(scroll.x) >= 480 {
                scroll.count = 320.min(scroll.x_max - scroll.x);
            }
        } else {
            if scroll.count != 0 {
                if scroll.count < 0 {
                    return;
                }
                scroll.count = 0;
            } else if scroll.flag != 0 {
                return;
            }
            if (xpos.wrapping_sub(scroll.x) as u16) < 161 {
                scroll.count = if scroll.x < 320 { -scroll.x } else { -320 };
            }
        }
        if scroll.count != 0 && !self.vga.timers.has_scroll_timer() {
            self.vga.timers.add(6, None, 0, 0);
        }
    }

    /// Bring the sprite held in variable 15 back toward the middle
    pub(crate) fn centre_scroll(&mut self) -> EngineResult<()> {
        if self.vga.scroll.x_max == 0 {
            return Ok(());
        }
        let far = self.vm.bit(85);
        let value = self.read_variable(15)?;
        let scroll = &mut self.vga.scroll;
        scroll.count = 0;
        let x = value.wrapping_sub(scroll.x);
        if far || x >= 624 {
            scroll.count = (x - 320).min(scroll.x_max - scroll.x);
        } else if x < 17 {
            let x = x - 320;
            scroll.count = if scroll.x < -x { -scroll.x } else { x };
        }
        if scroll.count != 0 && !self.vga.timers.has_scroll_timer() {
            self.vga.timers.add(6, None, 0, 0);
        }
        Ok(())
    }

    /// Word `index` of a registered path table
    pub(crate) fn path_word(&self, table: i16, index: usize) -> EngineResult<u16> {
        let slot = (table as u16 as usize)
            .checked_sub(1)
            .and_then(|i| self.vga.paths.get(i).copied().flatten())
            .ok_or_else(|| EngineError::BadResource(format!("no path table {}", table)))?;
        let mut cursor = VgaCursor {
            zone: slot.zone,
            pos: slot.pos + index * 2,
        };
        self.vga.zones.read_u16(&mut cursor)
    }

    /// Compose the frame: pending scroll step, background, then sprites in
    /// priority order
    pub fn draw_all_sprites(&mut self) -> EngineResult<()> {
        if self.vga.scroll.flag != 0 {
            self.scroll_step()?;
        }
        let vga = &mut self.vga;
        vga.back.copy_from(&vga.front);
        for sprite in self.vga.sprites.to_vec() {
            let image = if sprite.image < 0 {
                self.read_variable(sprite.image.unsigned_abs() as usize)?
            } else {
                sprite.image
            };
            if image == 0 {
                continue;
            }
            self.draw_image(
                DrawRequest {
                    zone: sprite.zone,
                    image: image as u16,
                    palette: sprite.palette,
                    x: sprite.x,
                    y: sprite.y,
                    flags: sprite.flags,
                    window: sprite.window_num,
                },
                false,
            )?;
        }
        Ok(())
    }

    /// Blank the top `lines` rows of both surfaces
    pub(crate) fn clear_surfaces(&mut self, lines: usize) {
        for surface in [&mut self.vga.back, &mut self.vga.front] {
            let end = (lines.min(surface.height)) * surface.width;
            surface.pixels[..end].iter_mut().for_each(|p| *p = 0);
        }
    }

    /// Fill a window rectangle of the background
    pub(crate) fn clear_window_rect(&mut self, rect: Rect, color: u8) {
        let surface = &mut self.vga.front;
        let x0 = rect.x.max(0) as usize;
        let y0 = rect.y.max(0) as usize;
        let x1 = ((rect.x + rect.w).max(0) as usize).min(surface.width);
        let y1 = ((rect.y + rect.h).max(0) as usize).min(surface.height);
        for y in y0..y1 {
            let row = y * surface.width;
            for p in &mut surface.pixels[row + x0.min(x1)..row + x1] {
                *p = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_scaled_offset_clamps_near_horizon() {
        assert_eq!(scaled_offset(100, 0, 200, 0.001), 0);
        assert_eq!(scaled_offset(190, 1, 200, 0.001), 2);
        assert_eq!(scaled_offset(190, -1, 200, 0.001), -2);
        assert_eq!(scaled_offset(300, 10, 200, 0.01), 20);
    }

    #[test]
    fn test_perspective_factor_grows_below_base() {
        assert_eq!(perspective_factor(200, 200, 0.01), 1.0);
        assert_eq!(perspective_factor(202, 200, 0.5), 2.0);
        assert_eq!(perspective_factor(0, 200, 0.01), 0.0);
    }

    #[test]
    fn test_path_values_run_dry_as_zero() {
        let mut p = PathValues::default();
        p.load(&[4, 9]);
        assert_eq!(p.next_value(), 4);
        assert_eq!(p.next_value(), 9);
        assert_eq!(p.next_value(), 0);
    }
}
