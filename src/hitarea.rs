//! Clickable screen regions
//!
//! A fixed-capacity table scanned linearly. Deleting an area zeroes its slot
//! in place; an id of 0 marks a free slot.

use crate::error::{EngineError, EngineResult};
use crate::item::{ItemId, NULL_ITEM};
use bitflags::bitflags;
use log::debug;

pub const HIT_AREA_CAPACITY: usize = 250;

bitflags! {
    pub struct BoxFlags: u16 {
        const TEXT_BOX = 0x1;
        const SELECTED = 0x2;
        const NO_TOUCH_NAME = 0x4;
        const INVERT_TOUCH = 0x8;
        const DRAG_BOX = 0x10;
        const IN_USE = 0x20;
        const DEAD = 0x40;
        const ITEM = 0x80;
    }
}

impl BoxFlags {
    /// Flags encoded in the thousands digit of a script box id
    pub fn from_script_params(params: u16) -> BoxFlags {
        let mut flags = BoxFlags::empty();
        if params & 1 != 0 {
            flags |= BoxFlags::INVERT_TOUCH;
        }
        if params & 2 != 0 {
            flags |= BoxFlags::NO_TOUCH_NAME;
        }
        if params & 4 != 0 {
            flags |= BoxFlags::ITEM;
        }
        if params & 8 != 0 {
            flags |= BoxFlags::TEXT_BOX;
        }
        if params & 16 != 0 {
            flags |= BoxFlags::DRAG_BOX;
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitArea {
    pub id: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub flags: BoxFlags,
    pub priority: u16,
    pub verb: u16,
    pub item: ItemId,
}

impl HitArea {
    pub const EMPTY: HitArea = HitArea {
        id: 0,
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        flags: BoxFlags::empty(),
        priority: 0,
        verb: 0,
        item: NULL_ITEM,
    };

    pub fn is_free(&self) -> bool {
        self.id == 0 && self.flags.is_empty()
    }

    pub fn is_live(&self) -> bool {
        self.flags.contains(BoxFlags::IN_USE) && !self.flags.contains(BoxFlags::DEAD)
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && (x as u32) < self.x as u32 + self.width as u32
            && (y as u32) < self.y as u32 + self.height as u32
    }
}

#[derive(Debug, Clone)]
pub struct HitAreaTable {
    areas: Vec<HitArea>,
}

impl Default for HitAreaTable {
    fn default() -> Self {
        HitAreaTable {
            areas: vec![HitArea::EMPTY; HIT_AREA_CAPACITY],
        }
    }
}

impl HitAreaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: u16) -> Option<&HitArea> {
        self.areas.iter().find(|h| h.id == id && !h.is_free())
    }

    fn find_mut(&mut self, id: u16) -> Option<&mut HitArea> {
        self.areas.iter_mut().find(|h| h.id == id && !h.is_free())
    }

    /// Define a box, replacing any existing box with the same id
    pub fn define(
        &mut self,
        id: u16,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        flags: BoxFlags,
        verb: u16,
        item: ItemId,
    ) -> EngineResult<()> {
        self.undefine(id);
        let slot = self
            .areas
            .iter_mut()
            .find(|h| h.is_free())
            .ok_or(EngineError::TableFull("hit area table"))?;
        *slot = HitArea {
            id,
            x,
            y,
            width,
            height,
            flags: flags | BoxFlags::IN_USE,
            priority: id,
            verb,
            item,
        };
        debug!("define box {} at ({},{}) {}x{} verb {}", id, x, y, width, height, verb);
        Ok(())
    }

    pub fn undefine(&mut self, id: u16) {
        if let Some(h) = self.find_mut(id) {
            *h = HitArea::EMPTY;
        }
    }

    pub fn enable(&mut self, id: u16) {
        if let Some(h) = self.find_mut(id) {
            h.flags.remove(BoxFlags::DEAD);
        }
    }

    pub fn disable(&mut self, id: u16) {
        if let Some(h) = self.find_mut(id) {
            h.flags.insert(BoxFlags::DEAD);
        }
    }

    pub fn move_by(&mut self, id: u16, dx: i16, dy: i16) {
        if let Some(h) = self.find_mut(id) {
            h.x = h.x.wrapping_add(dx as u16);
            h.y = h.y.wrapping_add(dy as u16);
        }
    }

    pub fn clear(&mut self) {
        self.areas.iter_mut().for_each(|h| *h = HitArea::EMPTY);
    }

    pub fn live(&self) -> impl Iterator<Item = &HitArea> {
        self.areas.iter().filter(|h| h.is_live())
    }

    /// Highest-priority live area under the point; later entries win ties
    pub fn area_at(&self, x: u16, y: u16) -> Option<&HitArea> {
        let mut best: Option<&HitArea> = None;
        for h in self.live().filter(|h| h.contains(x, y)) {
            if best.map_or(true, |b| h.priority >= b.priority) {
                best = Some(h);
            }
        }
        best
    }

    /// Raw slots, for saving
    pub fn slots(&self) -> &[HitArea] {
        &self.areas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_replaces_same_id() {
        let mut t = HitAreaTable::new();
        t.define(5, 0, 0, 10, 10, BoxFlags::empty(), 1, 0).unwrap();
        t.define(5, 20, 20, 10, 10, BoxFlags::empty(), 2, 0).unwrap();
        assert_eq!(t.live().count(), 1);
        assert_eq!(t.find(5).unwrap().verb, 2);
    }

    #[test]
    fn test_area_at_prefers_priority_and_skips_dead() {
        let mut t = HitAreaTable::new();
        t.define(3, 0, 0, 100, 100, BoxFlags::empty(), 1, 0).unwrap();
        t.define(9, 10, 10, 20, 20, BoxFlags::empty(), 2, 0).unwrap();
        assert_eq!(t.area_at(15, 15).unwrap().id, 9);
        assert_eq!(t.area_at(50, 50).unwrap().id, 3);

        t.disable(9);
        assert_eq!(t.area_at(15, 15).unwrap().id, 3);
        t.enable(9);
        assert_eq!(t.area_at(15, 15).unwrap().id, 9);

        t.undefine(3);
        assert!(t.area_at(50, 50).is_none());
        assert!(t.find(3).is_none());
    }

    #[test]
    fn test_script_params_flags() {
        let flags = BoxFlags::from_script_params(5);
        assert!(flags.contains(BoxFlags::INVERT_TOUCH | BoxFlags::ITEM));
        assert!(!flags.contains(BoxFlags::NO_TOUCH_NAME));
    }

    #[test]
    fn test_table_full() {
        let mut t = HitAreaTable::new();
        for id in 1..=HIT_AREA_CAPACITY as u16 {
            t.define(id, 0, 0, 1, 1, BoxFlags::empty(), 0, 0).unwrap();
        }
        assert!(matches!(
            t.define(999, 0, 0, 1, 1, BoxFlags::empty(), 0, 0),
            Err(EngineError::TableFull(_))
        ));
    }
}
