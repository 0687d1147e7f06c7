//! Save games
//!
//! A save is a flat big-endian dump in the order the original engine wrote
//! it: caption, item count marker, time events, per-item state, variables,
//! item slots and bit flags. Which parts are present depends on the game
//! variant. Windows and sprites are not saved; the game scripts rebuild them
//! after a restore.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::item::{ObjectFlags, SubBlock};
use crate::script::{ITEM_SLOTS, VARIABLE_COUNT};
use crate::timers::TimeEvent;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, warn};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

pub const CAPTION_LEN: usize = 18;
const MARKER: u32 = 0xFFFF_FFFF;
const SAVED_VARIABLES: usize = VARIABLE_COUNT - 1;

/// Object properties that are saved; the text property never changes
fn saved_props(flags: ObjectFlags, props: &[i16]) -> &[i16] {
    if flags.contains(ObjectFlags::TEXT) && !props.is_empty() {
        &props[1..]
    } else {
        props
    }
}

/// A complete save image
#[derive(Debug, Clone)]
pub struct SaveGame {
    data: Vec<u8>,
}

impl SaveGame {
    /// Snapshot the persistent state of `engine`
    pub fn capture(engine: &Engine, caption: &str) -> EngineResult<SaveGame> {
        let mut w = Vec::new();
        let mut name = [0u8; CAPTION_LEN];
        for (dst, src) in name.iter_mut().zip(caption.bytes()) {
            *dst = src;
        }
        w.write_all(&name)?;

        let count = engine.items.len().saturating_sub(1) as u32;
        w.write_u32::<BigEndian>(count)?;
        w.write_u32::<BigEndian>(MARKER)?;
        w.write_u32::<BigEndian>(0)?;
        w.write_u32::<BigEndian>(0)?;

        w.write_u32::<BigEndian>(engine.time_events.len() as u32)?;
        for event in engine.time_events.iter() {
            w.write_u32::<BigEndian>(event.time.wrapping_add(engine.clock_base))?;
            w.write_u16::<BigEndian>(event.subroutine)?;
        }

        for id in 1..engine.items.len() as u16 {
            let item = match engine.items.deref(id) {
                Some(item) => item,
                None => {
                    // parent, next, state and class flags of an empty slot
                    w.write_all(&[0; 10])?;
                    continue;
                }
            };
            w.write_u16::<BigEndian>(item.parent)?;
            w.write_u16::<BigEndian>(item.next)?;
            w.write_i16::<BigEndian>(item.state)?;
            w.write_u32::<BigEndian>(item.class_flags)?;
            for block in &item.sub_blocks {
                match block {
                    SubBlock::Room { exit_states, .. } => {
                        w.write_u16::<BigEndian>(*exit_states)?;
                    }
                    SubBlock::Object { flags, props, .. } => {
                        w.write_u32::<BigEndian>(flags.bits())?;
                        for value in saved_props(*flags, props) {
                            w.write_i16::<BigEndian>(*value)?;
                        }
                    }
                    SubBlock::UserFlag(values) => {
                        for value in values {
                            w.write_i16::<BigEndian>(*value)?;
                        }
                    }
                    _ => {}
                }
            }
        }

        for value in &engine.vm.variables[..SAVED_VARIABLES] {
            w.write_i16::<BigEndian>(*value)?;
        }
        if engine.game.saves_item_slots() {
            for item in &engine.vm.item_store {
                w.write_u16::<BigEndian>(*item)?;
            }
        }
        let words = engine.game.saved_bit_words();
        for word in engine.vm.bits.as_raw_slice().iter().take(words) {
            w.write_u16::<BigEndian>(*word)?;
        }

        debug!("save image: {} bytes", w.len());
        Ok(SaveGame { data: w })
    }

    pub fn from_bytes(data: Vec<u8>) -> SaveGame {
        SaveGame { data }
    }

    pub fn from_file(path: &Path) -> EngineResult<SaveGame> {
        info!("Loading save game from {:?}", path);
        Ok(SaveGame {
            data: fs::read(path)?,
        })
    }

    pub fn write_to_file(&self, path: &Path) -> EngineResult<()> {
        info!("Writing save game to {:?}", path);
        fs::write(path, &self.data)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn caption(&self) -> String {
        let raw = &self.data[..CAPTION_LEN.min(self.data.len())];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    /// Put the saved state back into `engine`
    ///
    /// Returns `Ok(false)`, leaving the engine untouched, when the image was
    /// written by a different game. A truncated image is an error.
    pub fn restore_to(&self, engine: &mut Engine) -> EngineResult<bool> {
        let mut r = Cursor::new(self.data.as_slice());
        let mut caption = [0u8; CAPTION_LEN];
        r.read_exact(&mut caption).map_err(truncated)?;

        let count = r.read_u32::<BigEndian>().map_err(truncated)?;
        let marker = r.read_u32::<BigEndian>().map_err(truncated)?;
        let expected = engine.items.len().saturating_sub(1) as u32;
        if marker != MARKER || count != expected {
            warn!(
                "save game does not match: {} items (expected {}), marker {:#x}",
                count, expected, marker
            );
            return Ok(false);
        }
        r.read_u32::<BigEndian>().map_err(truncated)?;
        r.read_u32::<BigEndian>().map_err(truncated)?;

        let events = r.read_u32::<BigEndian>().map_err(truncated)?;
        let mut loaded = Vec::with_capacity(events as usize);
        for _ in 0..events {
            let time = r.read_u32::<BigEndian>().map_err(truncated)?;
            let subroutine = r.read_u16::<BigEndian>().map_err(truncated)?;
            loaded.push(TimeEvent {
                time: time.wrapping_sub(engine.clock_base),
                subroutine,
            });
        }
        engine.time_events.clear();
        for event in loaded {
            engine.time_events.insert(event);
        }

        for id in 1..engine.items.len() as u16 {
            let parent = r.read_u16::<BigEndian>().map_err(truncated)?;
            let next = r.read_u16::<BigEndian>().map_err(truncated)?;
            let state = r.read_i16::<BigEndian>().map_err(truncated)?;
            let class_flags = r.read_u32::<BigEndian>().map_err(truncated)?;
            let item = match engine.items.get_mut(id) {
                Ok(item) => item,
                Err(_) => continue,
            };
            item.parent = parent;
            item.next = next;
            item.state = state;
            item.class_flags = class_flags;
            for block in &mut item.sub_blocks {
                match block {
                    SubBlock::Room { exit_states, .. } => {
                        *exit_states = r.read_u16::<BigEndian>().map_err(truncated)?;
                    }
                    SubBlock::Object { flags, props, .. } => {
                        let new_flags = ObjectFlags::from_bits_truncate(
                            r.read_u32::<BigEndian>().map_err(truncated)?,
                        );
                        let text = if flags.contains(ObjectFlags::TEXT) {
                            props.first().copied().unwrap_or(0)
                        } else {
                            0
                        };
                        let values = (new_flags.bits() & 0xFFFE).count_ones() as usize;
                        let mut restored = Vec::with_capacity(values + 1);
                        if new_flags.contains(ObjectFlags::TEXT) {
                            restored.push(text);
                        }
                        for _ in 0..values {
                            restored.push(r.read_i16::<BigEndian>().map_err(truncated)?);
                        }
                        *flags = new_flags;
                        *props = restored;
                    }
                    SubBlock::UserFlag(values) => {
                        for value in values.iter_mut() {
                            *value = r.read_i16::<BigEndian>().map_err(truncated)?;
                        }
                    }
                    _ => {}
                }
            }
        }
        rebuild_children(engine);

        for i in 0..SAVED_VARIABLES {
            engine.vm.variables[i] = r.read_i16::<BigEndian>().map_err(truncated)?;
        }
        if engine.game.saves_item_slots() {
            for i in 0..ITEM_SLOTS {
                engine.vm.item_store[i] = r.read_u16::<BigEndian>().map_err(truncated)?;
            }
        }
        let words = engine.game.saved_bit_words();
        for i in 0..words {
            let word = r.read_u16::<BigEndian>().map_err(truncated)?;
            if let Some(slot) = engine.vm.bits.as_raw_mut_slice().get_mut(i) {
                *slot = word;
            }
        }
        info!("restored save game \"{}\"", self.caption());
        Ok(true)
    }
}

fn truncated(e: std::io::Error) -> EngineError {
    EngineError::SaveFormat(format!("save game is truncated: {}", e))
}

/// Child links are not saved; each parent's first child is the first item
/// whose parent it is and whom no sibling points to
fn rebuild_children(engine: &mut Engine) {
    let ids: Vec<u16> = engine.items.ids().collect();
    let mut pointed = vec![false; engine.items.len()];
    for &id in &ids {
        if let Some(item) = engine.items.deref(id) {
            if let Some(flag) = pointed.get_mut(item.next as usize) {
                *flag = item.next != 0;
            }
        }
    }
    let mut first_child = vec![0u16; engine.items.len()];
    for &id in &ids {
        if let Some(item) = engine.items.deref(id) {
            let parent = item.parent as usize;
            if parent != 0 && !pointed[id as usize] && parent < first_child.len() {
                first_child[parent] = id;
            }
        }
    }
    for &id in &ids {
        if let Ok(item) = engine.items.get_mut(id) {
            item.child = first_child[id as usize];
        }
    }
}

impl Engine {
    /// File of save slot `slot` in the configured save directory
    pub fn save_path(&self, slot: u16) -> PathBuf {
        self.config
            .save_dir
            .join(format!("{}.{:03}", self.game.name(), slot))
    }

    pub fn save_game(&self, slot: u16, caption: &str) -> EngineResult<()> {
        SaveGame::capture(self, caption)?.write_to_file(&self.save_path(slot))
    }

    /// Restore slot `slot`; false when the file belongs to another game
    pub fn load_game(&mut self, slot: u16) -> EngineResult<bool> {
        let path = self.save_path(slot);
        SaveGame::from_file(&path)?.restore_to(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GameBuilder;
    use crate::config::GameVariant;
    use crate::item::PLAYER_ITEM;
    use test_log::test;

    fn game() -> GameBuilder {
        let mut b = GameBuilder::new(GameVariant::Simon1);
        let room = b.room(0);
        let other = b.room(0);
        b.object(room, 2, 1, ObjectFlags::empty());
        b.object(other, 2, 1, ObjectFlags::empty());
        b.player_in(room);
        b
    }

    #[test]
    fn test_round_trip_restores_state() {
        let mut engine = game().engine();
        engine.vm.variables[3] = 77;
        engine.vm.variables[254] = -5;
        engine.vm.item_store[2] = 4;
        engine.vm.set_bit(40, true);
        engine.items.set_item_parent(5, 2).unwrap();
        engine.items.get_mut(4).unwrap().state = 12;
        engine.add_time_event(30, 9);
        let image = SaveGame::capture(&engine, "at the tower").unwrap();
        assert_eq!(image.caption(), "at the tower");

        let mut fresh = game().engine();
        assert!(image.restore_to(&mut fresh).unwrap());
        assert_eq!(fresh.vm.variables[3], 77);
        assert_eq!(fresh.vm.variables[254], -5);
        assert_eq!(fresh.vm.item_store[2], 4);
        assert!(fresh.vm.bit(40));
        assert_eq!(fresh.items.get(5).unwrap().parent, 2);
        assert_eq!(fresh.items.get(4).unwrap().state, 12);
        assert_eq!(fresh.items.children(2), engine.items.children(2));
        assert_eq!(fresh.items.children(3), engine.items.children(3));
        assert_eq!(fresh.time_events.len(), 1);
        assert_eq!(fresh.items.get(PLAYER_ITEM).unwrap().parent, 2);
    }

    #[test]
    fn test_other_game_is_rejected() {
        let engine = game().engine();
        let image = SaveGame::capture(&engine, "x").unwrap();
        let mut b = game();
        b.room(0);
        let mut bigger = b.engine();
        bigger.vm.variables[1] = 5;
        assert!(!image.restore_to(&mut bigger).unwrap());
        assert_eq!(bigger.vm.variables[1], 5);
    }

    #[test]
    fn test_truncated_image_is_an_error() {
        let engine = game().engine();
        let image = SaveGame::capture(&engine, "x").unwrap();
        let short = SaveGame::from_bytes(image.as_bytes()[..40].to_vec());
        let mut fresh = game().engine();
        assert!(matches!(
            short.restore_to(&mut fresh),
            Err(EngineError::SaveFormat(_))
        ));
    }
}
