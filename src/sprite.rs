//! The active sprite table
//!
//! Sprites are kept ordered by priority, lowest first, which is also draw
//! order. Among equal priorities the sprite added first stays first; every
//! sprite carries an insertion serial, and the table is ordered by the pair
//! (priority, serial). A priority change removes the sprite and reinserts it
//! under that key, so neighbours of equal priority never swap.

use crate::draw::DrawFlags;
use log::debug;

/// Sprite id that Simon 1 keeps alive across a sprite reset
pub const PERSISTENT_SPRITE: u16 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgaSprite {
    pub id: u16,
    pub zone: u16,
    pub image: i16,
    pub x: i16,
    pub y: i16,
    pub palette: u16,
    pub flags: DrawFlags,
    pub priority: u16,
    pub window_num: u16,
    seq: u64,
}

impl VgaSprite {
    fn key(&self) -> (u16, u64) {
        (self.priority, self.seq)
    }
}

#[derive(Debug, Clone)]
pub struct SpriteTable {
    sprites: Vec<VgaSprite>,
    next_seq: u64,
    keyed_by_zone: bool,
}

impl SpriteTable {
    /// `keyed_by_zone` selects whether a sprite is identified by id alone
    pub fn new(keyed_by_zone: bool) -> SpriteTable {
        SpriteTable {
            sprites: Vec::new(),
            next_seq: 0,
            keyed_by_zone,
        }
    }

    fn matches(&self, sprite: &VgaSprite, id: u16, zone: u16) -> bool {
        sprite.id == id && (!self.keyed_by_zone || sprite.zone == zone)
    }

    fn insert_sorted(&mut self, sprite: VgaSprite) {
        let key = sprite.key();
        let at = self.sprites.partition_point(|s| s.key() < key);
        self.sprites.insert(at, sprite);
    }

    /// Add a sprite with priority 0 and no flags
    pub fn add(&mut self, id: u16, zone: u16, x: i16, y: i16, palette: u16, window_num: u16) {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!("sprite {} (zone {}) added at {},{}", id, zone, x, y);
        self.insert_sorted(VgaSprite {
            id,
            zone,
            image: 0,
            x,
            y,
            palette,
            flags: DrawFlags::empty(),
            priority: 0,
            window_num,
            seq,
        });
    }

    pub fn position(&self, id: u16, zone: u16) -> Option<usize> {
        self.sprites.iter().position(|s| self.matches(s, id, zone))
    }

    pub fn contains(&self, id: u16, zone: u16) -> bool {
        self.position(id, zone).is_some()
    }

    pub fn find(&self, id: u16, zone: u16) -> Option<&VgaSprite> {
        self.position(id, zone).map(|i| &self.sprites[i])
    }

    pub fn find_mut(&mut self, id: u16, zone: u16) -> Option<&mut VgaSprite> {
        match self.position(id, zone) {
            Some(i) => Some(&mut self.sprites[i]),
            None => None,
        }
    }

    /// Move a sprite to its place for a new priority
    pub fn set_priority(&mut self, id: u16, zone: u16, priority: u16) -> bool {
        match self.position(id, zone) {
            Some(i) => {
                let mut sprite = self.sprites.remove(i);
                sprite.priority = priority;
                self.insert_sorted(sprite);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: u16, zone: u16) -> Option<VgaSprite> {
        self.position(id, zone).map(|i| self.sprites.remove(i))
    }

    /// Remove every sprite `keep` rejects
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&VgaSprite) -> bool,
    {
        self.sprites.retain(keep);
    }

    pub fn uses_zone(&self, zone: u16) -> bool {
        self.sprites.iter().any(|s| s.zone == zone)
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VgaSprite> {
        self.sprites.iter()
    }

    /// Snapshot in draw order
    pub fn to_vec(&self) -> Vec<VgaSprite> {
        self.sprites.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn ids(table: &SpriteTable) -> Vec<u16> {
        table.iter().map(|s| s.id).collect()
    }

    fn with_priorities(priorities: &[u16]) -> SpriteTable {
        let mut table = SpriteTable::new(true);
        for (i, &p) in priorities.iter().enumerate() {
            let id = i as u16 + 1;
            table.add(id, 1, 0, 0, 0, 0);
            table.set_priority(id, 1, p);
        }
        table
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut table = with_priorities(&[5, 5, 3, 5]);
        assert_eq!(ids(&table), vec![3, 1, 2, 4]);

        // raising and lowering never reorders ties
        table.set_priority(3, 1, 5);
        assert_eq!(ids(&table), vec![1, 2, 3, 4]);
        table.set_priority(2, 1, 3);
        assert_eq!(ids(&table), vec![2, 1, 3, 4]);
        table.set_priority(2, 1, 5);
        assert_eq!(ids(&table), vec![1, 2, 3, 4]);
        table.set_priority(1, 1, 5);
        assert_eq!(ids(&table), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_new_sprites_draw_below_raised_ones() {
        let mut table = with_priorities(&[2]);
        table.add(9, 1, 0, 0, 0, 0);
        assert_eq!(ids(&table), vec![9, 1]);
    }

    #[test]
    fn test_zone_keying() {
        let mut keyed = SpriteTable::new(true);
        keyed.add(4, 1, 0, 0, 0, 0);
        keyed.add(4, 2, 0, 0, 0, 0);
        assert_eq!(keyed.remove(4, 2).map(|s| s.zone), Some(2));
        assert!(keyed.contains(4, 1));
        assert!(!keyed.contains(4, 2));

        let mut by_id = SpriteTable::new(false);
        by_id.add(4, 1, 0, 0, 0, 0);
        assert!(by_id.contains(4, 7));
        assert!(by_id.uses_zone(1));
    }
}
