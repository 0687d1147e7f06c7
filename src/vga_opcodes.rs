//! VGA opcode handlers
//!
//! One arm per opcode number. Handlers read their own operands through the
//! cursor helpers in `vga`, so an arm always consumes exactly the parameter
//! length listed for the variant. Operations on the current sprite are
//! silently dropped when the sprite is gone.

use crate::config::GameVariant;
use crate::draw::{window_rect, DrawFlags};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::item::{ItemId, PLAYER_ITEM};
use crate::opcode_tables::vga_param_lengths;
use crate::sprite::PERSISTENT_SPRITE;
use crate::vga::{scaled_offset, DrawRequest, VgaFlow};
use crate::zone::VgaCursor;
use log::{debug, warn};

/// Path tables end at this x value
const PATH_END: u16 = 999;
const PATH_END_FEEBLE: u16 = 9999;

impl Engine {
    fn vc_var(&self, index: u16) -> EngineResult<i16> {
        self.read_variable(index as usize)
    }

    fn vc_set_var(&mut self, index: u16, value: i16) -> EngineResult<()> {
        self.write_variable(index as usize, value)
    }

    /// Flags operand: a word on the word-layout games, a byte otherwise
    fn vc_read_flags(&mut self) -> EngineResult<DrawFlags> {
        let raw = if self.vga_word_layout() {
            self.vc_read_word()?
        } else {
            self.vc_read_byte()? as u16
        };
        Ok(DrawFlags::from_bits_truncate(raw))
    }

    fn vc_skip_unless(&mut self, keep: bool) -> EngineResult<()> {
        if !keep {
            self.vc_skip_next_instruction()?;
        }
        Ok(())
    }

    /// Item named by a VGA item operand: an item slot, or on Simon 1 and
    /// older a plain item number
    fn vc_item(&mut self) -> EngineResult<ItemId> {
        let a = self.vc_read_word()?;
        if self.vga_word_layout() {
            return Ok(a);
        }
        self.vm
            .item_store
            .get(a as usize)
            .copied()
            .ok_or(EngineError::BadVariable(a as usize))
    }

    fn vc_parent(&self, item: ItemId) -> Option<ItemId> {
        self.items.deref(item).map(|i| i.parent)
    }

    fn vc_add_delay(&mut self, delay: i16) {
        let cursor = self.vga.cursor;
        let (sprite, zone) = (self.vga.sprite_id, self.vga.zone);
        self.vga.timers.add(delay, Some(cursor), sprite, zone);
    }

    fn vc_path_end(&self) -> u16 {
        if self.game.eight_bit_images() {
            PATH_END_FEEBLE
        } else {
            PATH_END
        }
    }

    /// Execute opcode `opcode`; its number has already been consumed
    pub(crate) fn execute_vga_op(&mut self, opcode: u16) -> EngineResult<VgaFlow> {
        let game = self.game;
        let word_layout = self.vga_word_layout();
        match opcode {
            1 | 4 => self.vga.cursor.pos += 6,
            2 => {
                let id = self.vc_read_var_or_word()? as u16;
                let cursor = self.image_script_cursor(id)?;
                self.call_vga_script(cursor)?;
            }
            3 => {
                let window = self.vc_read_word()?;
                let (zone, id) = if game == GameVariant::Simon1 {
                    let id = self.vc_read_word()?;
                    (id / 100, id)
                } else {
                    let zone = self.vc_read_word()?;
                    (zone, self.vc_read_word()?)
                };
                let x = self.vc_read_word()? as i16;
                let y = self.vc_read_word()? as i16;
                let palette = self.vc_read_word()?;
                self.start_vga_code(window, zone, id, x, y, palette)?;
            }
            5 => {
                let var = self.vc_read_word()?;
                let value = self.vc_read_word()?;
                let keep = self.vc_var(var)? as u16 == value;
                self.vc_skip_unless(keep)?;
            }
            6 | 7 => {
                let item = self.vc_item()?;
                let sibling = match (self.vc_parent(item), self.vc_parent(PLAYER_ITEM)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                self.vc_skip_unless(sibling == (opcode == 6))?;
            }
            8 => {
                let a = self.vc_item()?;
                let b = self.vc_item()?;
                let keep = self.vc_parent(a) == Some(b);
                self.vc_skip_unless(keep)?;
            }
            9 => {
                let a = self.vc_item()?;
                let state = self.vc_read_word()? as i16;
                let keep = self.items.deref(a).map_or(false, |i| i.state == state);
                self.vc_skip_unless(keep)?;
            }
            10 => {
                let mut image = self.vc_read_word()? as i16;
                if image == 0 {
                    let rest = vga_param_lengths(game).get(10).copied().unwrap_or(2) as usize - 2;
                    self.vga.cursor.pos += rest;
                    return Ok(VgaFlow::Continue);
                }
                let hi = self.vc_read_byte()?;
                let lo = self.vc_read_byte()?;
                let palette = if game.little_endian() { hi } else { lo } as u16;
                let x = self.vc_read_word()? as i16;
                let y = self.vc_read_word()? as i16;
                let flags = self.vc_read_flags()?;
                if image < 0 {
                    image = self.read_variable(image.unsigned_abs() as usize)?;
                }
                let req = DrawRequest {
                    zone: self.vga.cursor.zone,
                    image: image as u16,
                    palette,
                    x,
                    y,
                    flags,
                    window: self.vga.window_num,
                };
                self.draw_image(req, true)?;
            }
            11 => self.vga.paths = Default::default(),
            12 => {
                let delay = if word_layout {
                    self.vc_read_var_or_word()?
                } else {
                    self.vc_read_byte()? as i16 * self.vga.frame_rate as i16
                };
                // the persistent sprite parks for good and keeps its image
                if game != GameVariant::Simon1 || self.vga.sprite_id != PERSISTENT_SPRITE {
                    self.vc_add_delay(delay.wrapping_add(game.vga_base_delay()));
                }
                return Ok(VgaFlow::Exit);
            }
            13 | 14 => {
                let d = self.vc_read_word()? as i16;
                if let Some(s) = self.current_sprite() {
                    if opcode == 13 {
                        s.x = s.x.wrapping_add(d);
                    } else {
                        s.y = s.y.wrapping_add(d);
                    }
                }
            }
            15 => {
                let id = self.vc_read_word()?;
                self.wake_sleepers(id);
            }
            16 => {
                let id = self.vc_read_word()?;
                self.sleep_current(id);
                return Ok(VgaFlow::Exit);
            }
            17 => {
                let slot = self.vc_read_word()? as usize;
                let entry = slot
                    .checked_sub(1)
                    .and_then(|i| self.vga.paths.get_mut(i))
                    .ok_or_else(|| EngineError::BadResource(format!("path slot {}", slot)))?;
                *entry = Some(self.vga.cursor);
                let end = self.vc_path_end();
                loop {
                    let mut peek = self.vga.cursor;
                    if self.vga.zones.read_u16(&mut peek)? == end {
                        break;
                    }
                    self.vga.cursor.pos += 4;
                }
                self.vga.cursor.pos += 2;
            }
            18 => {
                let offset = self.vc_read_word()? as i16;
                self.vga.cursor.pos = jump(self.vga.cursor.pos, offset as isize)?;
            }
            19 => return Err(EngineError::UnregisteredOpcode(VmKind::Vga, 19)),
            20 => {
                let count = self.vc_read_word()?;
                let VgaCursor { zone, pos } = self.vga.cursor;
                self.vga.zones.write_u16_le(zone, pos, count)?;
                self.vga.cursor.pos += 2;
            }
            21 => {
                let offset = self.vc_read_word()? as i16 as isize;
                let extra = if word_layout { 4 } else { 3 };
                let VgaCursor { zone, pos } = self.vga.cursor;
                let counter = jump(pos, offset + extra)?;
                let value = self.vga.zones.read_u16_le(zone, counter)?;
                if value != 0 {
                    self.vga.zones.write_u16_le(zone, counter, value - 1)?;
                    self.vga.cursor.pos = counter + 2;
                }
            }
            22 => {
                let mut a = self.vc_read_word()? as usize;
                let b = self.vc_read_word()? as usize;
                let (count, size) = if game.eight_bit_images() {
                    a = 0;
                    (256, 768)
                } else {
                    (if a == 0 { 32 } else { 16 }, 96)
                };
                let zone = self.vga.cursor.zone;
                let vga = &mut self.vga;
                let raw = vga.zones.get(zone)?.palette(b, size)?;
                for (i, rgb) in raw.chunks_exact(3).take(count).enumerate() {
                    if let Some(entry) = vga.palette.get_mut(a * 16 + i) {
                        *entry = [rgb[0] << 2, rgb[1] << 2, rgb[2] << 2];
                    }
                }
                vga.palette_dirty = true;
            }
            23 => {
                let priority = self.vc_read_word()?;
                let (id, zone) = (self.vga.sprite_id, self.vga.zone);
                self.vga.sprites.set_priority(id, zone, priority);
            }
            24 => {
                let image = self.vc_read_var_or_word()?;
                let dx = self.vc_read_word()? as i16;
                let dy = self.vc_read_word()? as i16;
                let flags = self.vc_read_flags()?;
                if let Some(s) = self.current_sprite() {
                    s.image = image;
                    s.x = s.x.wrapping_add(dx);
                    s.y = s.y.wrapping_add(dy);
                    s.flags = flags;
                }
            }
            25 => {
                let (id, zone) = (self.vga.sprite_id, self.vga.zone);
                self.vga.sprites.remove(id, zone);
                return Ok(VgaFlow::Exit);
            }
            26 => {
                let n = self.vc_read_word()? as usize;
                let mut rect = [0u16; 4];
                for v in &mut rect {
                    *v = self.vc_read_word()?;
                }
                match self.vga.windows.get_mut(n) {
                    Some(w) => *w = rect,
                    None => warn!("vc26: no window {}", n),
                }
            }
            27 => self.reset_sprites()?,
            28 => self.vga.cursor.pos += 8,
            29 => self.sound.stop_all(),
            30 => self.vga.frame_rate = self.vc_read_word()?,
            31 => self.vga.window_num = self.vc_read_word()?,
            32 => {
                let from = self.vc_read_word()?;
                let to = self.vc_read_word()?;
                let value = self.vc_var(from)?;
                self.vc_set_var(to, value)?;
            }
            33 => {
                if self.vga.mouse_hide != 0 {
                    self.vga.mouse_hide = 0;
                }
            }
            34 => {
                self.vga.mouse_hide = 200;
                self.input.left_button_down = 0;
                self.last_click = 0;
            }
            35 => {
                let window = self.vc_read_word()?;
                let color = self.vc_read_word()?;
                let rect = window_rect(
                    self.vga.window(window),
                    !game.eight_bit_images(),
                    game.screen_size(),
                );
                self.clear_window_rect(rect, color as u8);
            }
            36 => {
                let vga_res = self.vc_read_word()?;
                let window = self.vc_read_word()?;
                let ignored =
                    game == GameVariant::Feeble || (game == GameVariant::Simon1 && window == 16);
                if !ignored {
                    self.set_window_image(window, vga_res)?;
                }
            }
            37 => {
                let var = self.vc_read_word()?;
                let dy = self.vc_var(var)?;
                if let Some(s) = self.current_sprite() {
                    s.y = s.y.wrapping_add(dy);
                }
            }
            38 => {
                let var = self.vc_read_word()?;
                let keep = self.vc_var(var)? != 0;
                self.vc_skip_unless(keep)?;
            }
            39 => {
                let var = self.vc_read_word()?;
                let value = self.vc_read_word()? as i16;
                self.vc_set_var(var, value)?;
            }
            40 | 41 => {
                let var = self.vc_read_word()?;
                let d = self.vc_read_word()? as i16;
                let old = self.vc_var(var)?;
                let value = if opcode == 40 {
                    old.wrapping_add(d)
                } else {
                    old.wrapping_sub(d)
                };
                if game == GameVariant::Simon2 && var == 15 && !self.vm.bit(80) {
                    self.check_scroll_edge(opcode == 40, value);
                }
                self.vc_set_var(var, value)?;
            }
            42 => {
                let start = self.vga.cursor.pos - if word_layout { 2 } else { 1 };
                let var = self.vc_read_word()?;
                let value = self.vc_read_word()?;
                if self.vc_var(var)? as u16 != value {
                    let delay = self.vga.frame_rate as i16 + 1;
                    let cursor = VgaCursor {
                        zone: self.vga.cursor.zone,
                        pos: start,
                    };
                    let (sprite, zone) = (self.vga.sprite_id, self.vga.zone);
                    self.vga.timers.add(delay, Some(cursor), sprite, zone);
                    return Ok(VgaFlow::Exit);
                }
            }
            43 | 44 => {
                let bit = self.vc_read_word()? as usize;
                let set = self.vm.bit(bit);
                self.vc_skip_unless(set == (opcode == 43))?;
            }
            45 | 46 => {
                let var = self.vc_read_word()?;
                let value = self.vc_var(var)?;
                if let Some(s) = self.current_sprite() {
                    if opcode == 45 {
                        s.x = value;
                    } else {
                        s.y = value;
                    }
                }
            }
            47 => {
                let a = self.vc_read_word()?;
                let b = self.vc_read_word()?;
                let value = self.vc_var(a)?.wrapping_add(self.vc_var(b)?);
                self.vc_set_var(a, value)?;
            }
            48 => {
                if game.eight_bit_images() {
                    self.vc48_follow_path()?;
                } else {
                    self.vc48_path_deltas()?;
                }
            }
            49 | 50 => {
                let bit = self.vc_read_word()? as usize;
                self.vm.set_bit(bit, opcode == 49);
            }
            51 => {
                let id = self.vc_read_word()?;
                self.hit_areas.enable(id);
            }
            52 => {
                let raw = self.vc_read_word()?;
                let (ambient, id) = if raw >= 0x8000 {
                    (true, raw.wrapping_neg())
                } else {
                    (false, raw)
                };
                match game {
                    GameVariant::Feeble => {
                        let pan = self.vc_read_word()? as i16;
                        let vol = self.vc_read_word()? as i16;
                        debug!("vc52: pan {} volume {}", pan, vol);
                        if ambient {
                            self.sound.play_ambient(id);
                        } else {
                            self.sound.play_effect(id);
                        }
                    }
                    GameVariant::Simon2 if ambient => self.sound.play_ambient(id),
                    _ => self.sound.play_effect(id),
                }
            }
            53 => {
                let count = if game == GameVariant::Feeble { 3 } else { 2 };
                let mut args = Vec::with_capacity(count);
                for _ in 0..count {
                    args.push(self.vc_read_word()?);
                }
                debug!("vc53 dissolve {:?}: not supported", args);
            }
            54 => self.vga.cursor.pos += 6,
            55 => {
                let id = self.vc_read_word()?;
                let dx = self.vc_read_word()? as i16;
                let dy = self.vc_read_word()? as i16;
                self.hit_areas.move_by(id, dx, dy);
            }
            56 => {
                let n = self.vc_read_var_or_word()?;
                let delay = n
                    .wrapping_mul(self.vga.frame_rate as i16)
                    .wrapping_add(game.vga_base_delay());
                self.vc_add_delay(delay);
                return Ok(VgaFlow::Exit);
            }
            57 => {}
            58 => {
                let zone = self.vc_read_word()?;
                let id = self.vc_read_word()?;
                let priority = self.vc_read_word()?;
                self.vga.sprites.set_priority(id, zone, priority);
            }
            59 => {
                if game == GameVariant::Simon1 {
                    let keep = self.sound.is_voice_active();
                    self.vc_skip_unless(keep)?;
                } else {
                    let zone = self.vc_read_word()?;
                    let first = self.vc_read_word()?;
                    let last = self.vc_read_word()?;
                    for id in first..=last {
                        self.kill_sprite(zone, id);
                    }
                }
            }
            60 => {
                let zone = if game == GameVariant::Simon1 {
                    self.vga.zone
                } else {
                    self.vc_read_word()?
                };
                let id = self.vc_read_word()?;
                self.kill_sprite(zone, id);
            }
            61 | 80 => {
                let image = self.vc_read_var_or_word()?;
                let dx = self.vc_read_word()? as i16;
                let dy = self.vc_read_word()? as i16;
                let flags = if opcode == 61 {
                    DrawFlags::MASKED | DrawFlags::USE_FRONT_BUF
                } else {
                    DrawFlags::OVERLAYED
                };
                if let Some(s) = self.current_sprite() {
                    s.image = image;
                    s.x = s.x.wrapping_add(dx);
                    s.y = s.y.wrapping_add(dy);
                    s.flags = flags;
                }
            }
            62 => self.vc62_fade_out()?,
            63 | 65 => {
                self.vga.faded = false;
                self.vga.palette_dirty = true;
            }
            64 => {
                let keep = !self.sound.is_voice_active();
                self.vc_skip_unless(keep)?;
            }
            66 | 67 | 68 => {
                let a = self.vc_read_word()?;
                let b = self.vc_read_word()?;
                let (x, y) = (self.vc_var(a)? as u16, self.vc_var(b)? as u16);
                let keep = match opcode {
                    66 => x == y,
                    67 => x < y,
                    _ => x > y,
                };
                self.vc_skip_unless(keep)?;
            }
            69 => {
                let track = self.vc_read_word()?;
                let looping = self.vc_read_word()?;
                self.sound.play_music(track, looping != 0);
            }
            70 => {
                let track = self.vc_read_word()?;
                let _looping = self.vc_read_word()?;
                if track != 0xFFFF && track != 999 {
                    self.vga.queued_music = Some(track);
                }
            }
            71 => {
                let keep = self.sound.is_music_active();
                self.vc_skip_unless(keep)?;
            }
            72 => {
                let track = self.vc_read_word()?;
                let looping = self.vc_read_word()?;
                if track == 0xFFFF || track == 999 {
                    self.sound.stop_music();
                } else {
                    self.sound.play_music(track, looping != 0);
                }
            }
            73 | 74 => {
                let _ = self.vc_read_byte()?;
                let bit = self.vc_read_byte()? as u32;
                let mask = 1u32.checked_shl(bit).unwrap_or(0);
                if opcode == 73 {
                    self.vga.marks |= mask;
                } else {
                    self.vga.marks &= !mask;
                }
            }
            75 => {
                self.vga.scale_base_y = self.vc_read_word()? as i16;
                self.vga.scale = self.vc_read_word()? as f32 / 1_000_000.0;
            }
            76 | 77 => {
                let image = self.vc_read_word()? as i16;
                let d = self.vc_read_word()? as i16;
                let var = self.vc_read_word()?;
                let (base_y, scale) = (self.vga.scale_base_y, self.vga.scale);
                let moved = match self.current_sprite() {
                    Some(s) => {
                        let step = scaled_offset(s.y, d, base_y, scale);
                        s.image = image;
                        s.flags = DrawFlags::SCALED;
                        if opcode == 76 {
                            s.x = s.x.wrapping_add(step);
                            Some(s.x)
                        } else {
                            s.y = s.y.wrapping_add(step);
                            Some(s.y)
                        }
                    }
                    None => None,
                };
                if let Some(pos) = moved {
                    self.vc_set_var(var, pos)?;
                    if opcode == 76 {
                        self.check_scroll_x(d, pos);
                    }
                }
            }
            78 => {
                let table = self.read_variable(12)?;
                let index = self.read_variable(13)? as u16 as usize;
                let x = self.path_word(table, index * 2)? as i16;
                let y = self.path_word(table, index * 2 + 1)? as i16;
                self.write_variable(15, x)?;
                self.write_variable(16, y)?;
                if let Some(s) = self.current_sprite() {
                    s.x = x;
                    s.y = y;
                }
                self.vm.set_bit(85, false);
                if self.vm.bit(74) {
                    self.centre_scroll()?;
                }
            }
            79 => {
                let table = self.read_variable(12)?;
                let y = self.read_variable(16)? as i32;
                let mut index = 0usize;
                while y > self.path_word(table, index * 2 + 1)? as i32 {
                    index += 1;
                }
                self.write_variable(13, index as i16)?;
            }
            81 => {
                let var = self.vc_read_word()?;
                let range = self.vc_read_word()?;
                let value = self.rng.rnd(range.saturating_sub(1)) as i16;
                self.vc_set_var(var, value)?;
            }
            82 => {
                let var = self.vc_read_word()?;
                let value = if self.vm.bit(82) {
                    self.vga.path_values1.next_value()
                } else {
                    self.vga.path_values.next_value()
                };
                self.vc_set_var(var, value as i16)?;
            }
            83 => {
                let a = self.vc_read_word()?;
                let b = self.vc_read_word()?;
                let c = self.vc_read_word()?;
                debug!("vc83 sound volume {} {} {}: not supported", a, b, c);
            }
            84 => debug!("vc84 stop sound loop: not supported"),
            _ => return Err(EngineError::InvalidOpcode(VmKind::Vga, opcode)),
        }
        Ok(VgaFlow::Continue)
    }

    /// Split the y steps of a path into variable pairs
    fn vc48_path_deltas(&mut self) -> EngineResult<()> {
        let table = self.read_variable(12)?;
        let start = self.read_variable(13)? as isize;
        let mut count = self.read_variable(14)?;
        let step: isize = if count < 0 {
            count = count.wrapping_neg();
            -2
        } else {
            2
        };
        let count = count.max(1) as usize;
        let mut p = start * 2 + 1;
        for k in 0..count {
            let here = self.path_word(table, path_index(p)?)? as i32;
            p += step;
            let delta = self.path_word(table, path_index(p)?)? as i32 - here;
            let base = 20 + 2 * k;
            self.write_variable(base, (delta / 2) as i16)?;
            self.write_variable(base + 1, (delta - delta / 2) as i16)?;
        }
        Ok(())
    }

    /// Place the current sprite on the path at its x position
    fn vc48_follow_path(&mut self) -> EngineResult<()> {
        let table = self.read_variable(12)?;
        let sx = match self.current_sprite() {
            Some(s) => s.x,
            None => return Ok(()),
        };
        let mut p = 0usize;
        let mut segment = 0i16;
        while sx as i32 >= self.path_word(table, p + 2)? as i32 {
            p += 2;
            segment += 1;
        }
        let mut y1 = self.path_word(table, p + 1)? as i32;
        let x2 = self.path_word(table, p + 2)?;
        let y2 = self.path_word(table, p + 3)? as i32;
        if x2 != PATH_END_FEEBLE {
            let frac = (sx & 7) as i32;
            let dy = y2 - y1;
            y1 += if dy < 0 {
                -((-dy * frac) / 8)
            } else {
                dy * frac / 8
            };
        }
        let x1 = self.path_word(table, p)? as i16;
        if let Some(s) = self.current_sprite() {
            s.y = y1 as i16;
        }
        self.write_variable(11, x1)?;
        self.write_variable(13, segment)?;
        Ok(())
    }

    fn vc62_fade_out(&mut self) -> EngineResult<()> {
        self.sound.stop_all();
        if self.vga.faded {
            return Ok(());
        }
        self.vga.faded = true;
        self.vga.palette_dirty = true;
        let lines = if self.game == GameVariant::Feeble {
            480
        } else if self.vga.window_num == 4 {
            134
        } else {
            200
        };
        self.clear_surfaces(lines);

        if self.game == GameVariant::Simon1 {
            let zone = self.vga.zone;
            let persistent = self
                .vga
                .sprites
                .iter()
                .find(|s| s.id == PERSISTENT_SPRITE)
                .cloned();
            if let Some(s) = persistent.filter(|s| s.image > 0) {
                debug!("vc62: keeping sprite {} of zone {}", s.id, zone);
                self.draw_image(
                    DrawRequest {
                        zone: s.zone,
                        image: s.image as u16,
                        palette: s.palette,
                        x: s.x,
                        y: s.y,
                        flags: s.flags,
                        window: s.window_num,
                    },
                    true,
                )?;
            }
        }
        if self.game == GameVariant::Simon2 {
            if let Some(track) = self.vga.queued_music.take() {
                self.sound.play_music(track, true);
            }
        }
        Ok(())
    }
}

fn jump(pos: usize, offset: isize) -> EngineResult<usize> {
    pos.checked_add_signed(offset)
        .ok_or_else(|| EngineError::BadResource(format!("vga jump {} from {}", offset, pos)))
}

fn path_index(p: isize) -> EngineResult<usize> {
    usize::try_from(p).map_err(|_| EngineError::BadResource(format!("path index {}", p)))
}

#[cfg(test)]
mod tests {
    use crate::builder::{GameBuilder, ZoneBuilder};
    use crate::config::GameVariant;
    use crate::error::{EngineError, VmKind};
    use crate::sound::SoundCommand;
    use crate::sprite::PERSISTENT_SPRITE;
    use test_log::test;

    /// Big-endian word stream as the Simon 1 zone scripts use it
    fn words(ws: &[i32]) -> Vec<u8> {
        ws.iter().flat_map(|w| (*w as u16).to_be_bytes()).collect()
    }

    fn simon1(zone: ZoneBuilder) -> crate::engine::Engine {
        let mut b = GameBuilder::new(GameVariant::Simon1);
        b.zone(zone);
        b.engine()
    }

    #[test]
    fn test_set_var_then_return() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[39, 5, 7, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[5], 7);
        assert!(engine.vga.sprites.contains(101, 1));
        assert!(engine.vga.timers.is_empty());
    }

    #[test]
    fn test_repeat_loop_runs_count_plus_one_times() {
        let mut zone = ZoneBuilder::new(1, false);
        // setRepeat 2 with its counter slot; v5 += 1; loop back to the body
        zone.animation(101, &words(&[20, 2, 0, 40, 5, 1, 21, -16, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[5], 3);
    }

    #[test]
    fn test_wake_reaches_sleeper_in_same_pass() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[16, 7, 39, 5, 9, 0]));
        zone.animation(102, &words(&[15, 7, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.start_vga_code(0, 1, 102, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[5], 9);
    }

    #[test]
    fn test_delay_parks_and_resumes() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[12, 2, 39, 5, 1, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[5], 0);
        assert_eq!(engine.vga.timers.len(), 1);
        for _ in 0..3 {
            engine.expire_vga_timers().unwrap();
        }
        assert_eq!(engine.vm.variables[5], 1);
    }

    #[test]
    fn test_wait_on_variable_retries_the_opcode() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[42, 5, 1, 39, 6, 1, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        engine.expire_vga_timers().unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[6], 0);

        engine.vm.variables[5] = 1;
        for _ in 0..3 {
            engine.expire_vga_timers().unwrap();
        }
        assert_eq!(engine.vm.variables[6], 1);
        assert!(engine.vga.timers.is_empty());
    }

    #[test]
    fn test_draw_lands_on_background() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.image(2, 1, &[0, 0], false);
        zone.image(4, 2, &[1, 2, 3, 4, 5, 6, 7, 8], false);
        zone.animation(101, &words(&[10, 1, 1, 1, 2, 0, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vga.front.pixel(8, 2), Some(0x11));
        assert_eq!(engine.vga.front.pixel(11, 3), Some(0x18));
    }

    #[test]
    fn test_path_deltas() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(
            101,
            &words(&[17, 1, 10, 100, 20, 110, 30, 130, 999, 48, 0]),
        );
        let mut engine = simon1(zone);
        engine.vm.variables[12] = 1;
        engine.vm.variables[13] = 0;
        engine.vm.variables[14] = 2;
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[20..24], [5, 5, 10, 10]);
    }

    #[test]
    fn test_palette_load_and_fade() {
        let mut zone = ZoneBuilder::new(1, false);
        let mut colors = vec![[0u8; 3]; 32];
        colors[1] = [63, 32, 1];
        zone.palette(&colors);
        zone.animation(101, &words(&[22, 0, 0, 62, 0]));
        let (mut engine, host, sound) = {
            let mut b = GameBuilder::new(GameVariant::Simon1);
            b.zone(zone);
            b.engine_with_handles()
        };
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vga.palette[1], [252, 128, 4]);
        assert!(engine.vga.faded);
        engine.present().unwrap();
        assert_eq!(host.palette()[1], [0, 0, 0]);
        assert_eq!(sound.commands(), vec![SoundCommand::StopAll]);
    }

    #[test]
    fn test_fade_out_redraws_persistent_sprite() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.image(2, 1, &[0, 0], false);
        zone.image(4, 2, &[1, 2, 3, 4, 5, 6, 7, 8], false);
        zone.animation(101, &words(&[62, 0]));
        let mut engine = simon1(zone);
        engine.vga.sprites.add(PERSISTENT_SPRITE, 1, 1, 2, 1, 0);
        if let Some(s) = engine.vga.sprites.find_mut(PERSISTENT_SPRITE, 1) {
            s.image = 1;
        }
        engine.vga.front.pixels.iter_mut().for_each(|p| *p = 0x77);

        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert!(engine.vga.faded);
        assert_eq!(engine.vga.front.pixel(8, 2), Some(0x11));
        assert_eq!(engine.vga.front.pixel(0, 0), Some(0));
    }

    #[test]
    fn test_palette_bytes_past_six_bits_wrap() {
        let mut zone = ZoneBuilder::new(1, false);
        let mut colors = vec![[0u8; 3]; 32];
        colors[2] = [255, 64, 65];
        zone.palette(&colors);
        zone.animation(101, &words(&[22, 0, 0, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vga.palette[2], [252, 0, 4]);
    }

    #[test]
    fn test_halt_sprite_removes_it() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[25, 39, 5, 1, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert!(!engine.vga.sprites.contains(101, 1));
        assert_eq!(engine.vm.variables[5], 0);
    }

    #[test]
    fn test_skip_on_bit_and_variable() {
        let mut zone = ZoneBuilder::new(1, false);
        // skip the set when bit 3 is clear, then when v9 is zero
        zone.animation(
            101,
            &words(&[43, 3, 39, 5, 1, 38, 9, 39, 6, 1, 44, 3, 39, 7, 1, 0]),
        );
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(engine.vm.variables[5..8], [0, 0, 1]);
    }

    #[test]
    fn test_unused_opcode_is_fatal() {
        let mut zone = ZoneBuilder::new(1, false);
        zone.animation(101, &words(&[19, 0]));
        let mut engine = simon1(zone);
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        assert!(matches!(
            engine.expire_vga_timers(),
            Err(EngineError::UnregisteredOpcode(VmKind::Vga, 19))
        ));
    }

    #[test]
    fn test_music_queue_and_sound_effects_simon2() {
        let mut zone = ZoneBuilder::new(1, false);
        // byte opcodes on Simon 2
        let mut code = vec![70u8];
        code.extend(words(&[4, 0]));
        code.push(52);
        code.extend(words(&[-3]));
        code.push(52);
        code.extend(words(&[8]));
        code.push(62);
        code.push(0);
        zone.animation(101, &code);
        let (mut engine, _, sound) = {
            let mut b = GameBuilder::new(GameVariant::Simon2);
            b.zone(zone);
            b.engine_with_handles()
        };
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.expire_vga_timers().unwrap();
        engine.expire_vga_timers().unwrap();
        assert_eq!(
            sound.commands(),
            vec![
                SoundCommand::Ambient(3),
                SoundCommand::Effect(8),
                SoundCommand::StopAll,
                SoundCommand::Music(4, true),
            ]
        );
        assert_eq!(engine.vga.queued_music, None);
    }
}
