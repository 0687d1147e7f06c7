//! Item forest and sub-block capabilities
//!
//! Items live in one arena indexed by small integers; id 0 is the null item
//! and id 1 is the player. Parent, child and sibling links are ids into the
//! same arena, so the whole forest can be saved and restored as plain words.
//!
//! Capabilities such as "is a room" or "can hold things" are sub-blocks
//! attached to an item and looked up by their tag.

use crate::error::{EngineError, EngineResult};
use bitflags::bitflags;
use log::debug;

pub type ItemId = u16;

pub const NULL_ITEM: ItemId = 0;
pub const PLAYER_ITEM: ItemId = 1;

/// Base allocation charged to the item heap per item
const ITEM_HEAP_SIZE: usize = 20;
/// Recursion guard for contents walks
const MAX_CONTENT_DEPTH: usize = 32;

bitflags! {
    /// Which object properties are present on an Object sub-block
    pub struct ObjectFlags: u32 {
        const TEXT = 0x1;
        const SIZE = 0x2;
        const WORN = 0x4;
        const WEIGHT = 0x8;
        const VOLUME = 0x10;
        const ICON = 0x20;
        const KEY_COLOR1 = 0x40;
        const KEY_COLOR2 = 0x80;
        const MENU = 0x100;
        const NUMBER = 0x200;
        const SOFT = 0x400;
        const VOICE = 0x800;
        /// State bits with no property value
        const MARKS = 0xFFFF_0000;
    }
}

/// Sub-block type tags as stored in the game database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SubBlockKind {
    Room = 1,
    Object = 2,
    Player = 3,
    SuperRoom = 4,
    Container = 7,
    Chain = 8,
    UserFlag = 9,
    Inherit = 255,
}

impl SubBlockKind {
    pub fn from_tag(tag: u16) -> Option<SubBlockKind> {
        match tag {
            1 => Some(SubBlockKind::Room),
            2 => Some(SubBlockKind::Object),
            3 => Some(SubBlockKind::Player),
            4 => Some(SubBlockKind::SuperRoom),
            7 => Some(SubBlockKind::Container),
            8 => Some(SubBlockKind::Chain),
            9 => Some(SubBlockKind::UserFlag),
            255 => Some(SubBlockKind::Inherit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubBlock {
    Room {
        subroutine: u16,
        exit_states: u16,
        exits: [ItemId; 6],
    },
    Object {
        name: u16,
        flags: ObjectFlags,
        props: Vec<i16>,
    },
    Player {
        strength: i16,
        weight: i16,
        score: i16,
        level: i16,
    },
    SuperRoom {
        subroutine: u16,
        x: u16,
        y: u16,
        z: u16,
        exits: Vec<u16>,
    },
    Container {
        volume: i16,
        flags: u16,
    },
    Chain {
        item: ItemId,
    },
    UserFlag([i16; 8]),
    Inherit {
        item: ItemId,
    },
}

impl SubBlock {
    pub fn kind(&self) -> SubBlockKind {
        match self {
            SubBlock::Room { .. } => SubBlockKind::Room,
            SubBlock::Object { .. } => SubBlockKind::Object,
            SubBlock::Player { .. } => SubBlockKind::Player,
            SubBlock::SuperRoom { .. } => SubBlockKind::SuperRoom,
            SubBlock::Container { .. } => SubBlockKind::Container,
            SubBlock::Chain { .. } => SubBlockKind::Chain,
            SubBlock::UserFlag(_) => SubBlockKind::UserFlag,
            SubBlock::Inherit { .. } => SubBlockKind::Inherit,
        }
    }

    /// Bytes charged to the item heap
    pub fn heap_size(&self) -> usize {
        match self {
            SubBlock::Room { .. } => 20,
            SubBlock::Object { props, .. } => 10 + props.len() * 2,
            SubBlock::Player { .. } => 12,
            SubBlock::SuperRoom { exits, .. } => 12 + exits.len() * 2,
            SubBlock::Container { .. } => 8,
            SubBlock::Chain { .. } | SubBlock::Inherit { .. } => 6,
            SubBlock::UserFlag(_) => 20,
        }
    }
}

/// Slot of `prop` in the packed property array of an object with `flags`
pub fn prop_index(flags: ObjectFlags, prop: ObjectFlags) -> usize {
    let below = prop.bits().wrapping_sub(1);
    (flags.bits() & below).count_ones() as usize
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub adjective: i16,
    pub noun: i16,
    pub state: i16,
    pub class_flags: u32,
    pub parent: ItemId,
    pub child: ItemId,
    pub next: ItemId,
    pub sub_blocks: Vec<SubBlock>,
}

impl Item {
    pub fn find_sub(&self, kind: SubBlockKind) -> Option<&SubBlock> {
        self.sub_blocks.iter().find(|s| s.kind() == kind)
    }

    pub fn find_sub_mut(&mut self, kind: SubBlockKind) -> Option<&mut SubBlock> {
        self.sub_blocks.iter_mut().find(|s| s.kind() == kind)
    }

    pub fn has_sub(&self, kind: SubBlockKind) -> bool {
        self.find_sub(kind).is_some()
    }

    /// Value of an object property, if the item is an object carrying it
    pub fn object_prop(&self, prop: ObjectFlags) -> Option<i16> {
        match self.find_sub(SubBlockKind::Object) {
            Some(SubBlock::Object { flags, props, .. }) if flags.contains(prop) => {
                props.get(prop_index(*flags, prop)).copied()
            }
            _ => None,
        }
    }

    pub fn object_flags(&self) -> ObjectFlags {
        match self.find_sub(SubBlockKind::Object) {
            Some(SubBlock::Object { flags, .. }) => *flags,
            _ => ObjectFlags::empty(),
        }
    }

    /// Set or clear object flag `bit`, keeping the property array packed
    ///
    /// Returns false when the item is not an object.
    pub fn set_object_flag(&mut self, bit: u16, on: bool) -> bool {
        let flag = match 1u32.checked_shl(bit as u32) {
            Some(b) => ObjectFlags::from_bits_truncate(b),
            None => ObjectFlags::empty(),
        };
        match self.find_sub_mut(SubBlockKind::Object) {
            Some(SubBlock::Object { flags, props, .. }) => {
                let has_value = !flag.is_empty() && !ObjectFlags::MARKS.contains(flag);
                if on && !flags.contains(flag) {
                    if has_value {
                        let at = prop_index(*flags, flag).min(props.len());
                        props.insert(at, 0);
                    }
                    flags.insert(flag);
                } else if !on && flags.contains(flag) {
                    let at = prop_index(*flags, flag);
                    if has_value && at < props.len() {
                        props.remove(at);
                    }
                    flags.remove(flag);
                }
                true
            }
            _ => false,
        }
    }

    pub fn user_flags_mut(&mut self) -> Option<&mut [i16; 8]> {
        match self.find_sub_mut(SubBlockKind::UserFlag) {
            Some(SubBlock::UserFlag(values)) => Some(values),
            _ => None,
        }
    }
}

/// Flat arena of items with item heap accounting
#[derive(Debug, Clone)]
pub struct ItemArena {
    items: Vec<Option<Item>>,
    heap_used: usize,
    heap_capacity: usize,
}

impl ItemArena {
    /// Create `count` slots; slot 0 stays null, the rest are blank items
    pub fn new(count: usize, heap_capacity: usize) -> EngineResult<ItemArena> {
        let mut arena = ItemArena {
            items: Vec::with_capacity(count.max(2)),
            heap_used: 0,
            heap_capacity,
        };
        arena.items.push(None);
        for _ in 1..count.max(2) {
            arena.charge(ITEM_HEAP_SIZE)?;
            arena.items.push(Some(Item::default()));
        }
        Ok(arena)
    }

    fn charge(&mut self, size: usize) -> EngineResult<()> {
        self.heap_used += (size + 3) & !3;
        if self.heap_used > self.heap_capacity {
            return Err(EngineError::HeapOverflow {
                heap: "item heap",
                used: self.heap_used,
                capacity: self.heap_capacity,
            });
        }
        Ok(())
    }

    /// Number of slots including the null slot
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.len() <= 1
    }

    pub fn heap_used(&self) -> usize {
        self.heap_used
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (1..self.items.len()).map(|i| i as ItemId)
    }

    /// Look up a live item; the null item yields None
    pub fn deref(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id as usize).and_then(|i| i.as_ref())
    }

    pub fn get(&self, id: ItemId) -> EngineResult<&Item> {
        self.deref(id).ok_or(EngineError::BadItem(id))
    }

    pub fn get_mut(&mut self, id: ItemId) -> EngineResult<&mut Item> {
        self.items
            .get_mut(id as usize)
            .and_then(|i| i.as_mut())
            .ok_or(EngineError::BadItem(id))
    }

    /// Attach a sub-block, replacing one of the same kind
    pub fn attach(&mut self, id: ItemId, block: SubBlock) -> EngineResult<()> {
        self.charge(block.heap_size())?;
        let item = self.get_mut(id)?;
        let kind = block.kind();
        item.sub_blocks.retain(|s| s.kind() != kind);
        item.sub_blocks.push(block);
        Ok(())
    }

    /// Detach `id` from its parent's child list
    pub fn unlink_item(&mut self, id: ItemId) -> EngineResult<()> {
        let (parent_id, next) = {
            let item = self.get(id)?;
            (item.parent, item.next)
        };
        if parent_id == NULL_ITEM {
            return Ok(());
        }

        let first = self.get(parent_id)?.child;
        if first == id {
            self.get_mut(parent_id)?.child = next;
        } else {
            let mut cur = first;
            loop {
                if cur == NULL_ITEM {
                    return Err(EngineError::UnlinkInconsistent(id));
                }
                let sibling = self.get(cur)?.next;
                if sibling == id {
                    self.get_mut(cur)?.next = next;
                    break;
                }
                cur = sibling;
            }
        }

        let item = self.get_mut(id)?;
        item.parent = NULL_ITEM;
        item.next = NULL_ITEM;
        Ok(())
    }

    /// Make `id` the first child of `parent`; an already linked item is left alone
    pub fn link_item(&mut self, id: ItemId, parent: ItemId) -> EngineResult<()> {
        if self.get(id)?.parent != NULL_ITEM {
            return Ok(());
        }
        let next = if parent != NULL_ITEM {
            let p = self.get_mut(parent)?;
            let old = p.child;
            p.child = id;
            old
        } else {
            NULL_ITEM
        };
        let item = self.get_mut(id)?;
        item.parent = parent;
        item.next = next;
        Ok(())
    }

    /// True if `ancestor` is reachable from `id` by following parents
    pub fn is_descendant_of(&self, id: ItemId, ancestor: ItemId) -> bool {
        let mut cur = id;
        let mut steps = 0;
        while cur != NULL_ITEM && steps < self.items.len() {
            if cur == ancestor {
                return true;
            }
            cur = self.deref(cur).map(|i| i.parent).unwrap_or(NULL_ITEM);
            steps += 1;
        }
        false
    }

    /// Move `id` under `parent`
    ///
    /// A no-op when `parent` is already the parent. Moving an item under
    /// itself or one of its own descendants is an error.
    pub fn set_item_parent(&mut self, id: ItemId, parent: ItemId) -> EngineResult<()> {
        let old_parent = self.get(id)?.parent;
        if old_parent == parent {
            return Ok(());
        }
        if parent != NULL_ITEM {
            self.get(parent)?;
            if self.is_descendant_of(parent, id) {
                return Err(EngineError::ItemCycle(id, parent));
            }
        }
        debug!("set_item_parent: {} from {} to {}", id, old_parent, parent);
        self.unlink_item(id)?;
        self.link_item(id, parent)
    }

    pub fn children(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut cur = self.deref(id).map(|i| i.child).unwrap_or(NULL_ITEM);
        while cur != NULL_ITEM && out.len() < self.items.len() {
            out.push(cur);
            cur = self.deref(cur).map(|i| i.next).unwrap_or(NULL_ITEM);
        }
        out
    }

    /// Space an item takes up: its size, plus its contents when soft
    pub fn size_of_rec(&self, id: ItemId, depth: usize) -> i16 {
        let item = match self.deref(id) {
            Some(item) => item,
            None => return 0,
        };
        let own = item.object_prop(ObjectFlags::SIZE).unwrap_or(0);
        if item.object_flags().contains(ObjectFlags::SOFT) {
            own.saturating_add(self.size_rec(id, depth + 1))
        } else {
            own
        }
    }

    fn size_rec(&self, id: ItemId, depth: usize) -> i16 {
        if depth > MAX_CONTENT_DEPTH {
            return 0;
        }
        self.children(id)
            .into_iter()
            .fold(0i16, |n, c| n.saturating_add(self.size_of_rec(c, depth)))
    }

    pub fn size_contents(&self, id: ItemId) -> i16 {
        self.size_rec(id, 0)
    }

    /// Weight of an item including everything inside it
    pub fn weight_of(&self, id: ItemId) -> i16 {
        self.weight_rec(id, 0)
    }

    fn weight_rec(&self, id: ItemId, depth: usize) -> i16 {
        if depth > MAX_CONTENT_DEPTH {
            return 0;
        }
        let own = self
            .deref(id)
            .and_then(|i| i.object_prop(ObjectFlags::WEIGHT))
            .unwrap_or(0);
        self.children(id)
            .into_iter()
            .fold(own, |w, c| w.saturating_add(self.weight_rec(c, depth + 1)))
    }

    /// Whether `x` fits into `y`: 0 fits, -1 too big, -2 too heavy
    pub fn can_place(&self, x: ItemId, y: ItemId) -> EngineResult<i16> {
        let target = match self.deref(y) {
            Some(target) => target,
            None => return Ok(0),
        };
        self.get(x)?;

        if let Some(SubBlock::Container { volume, .. }) = target.find_sub(SubBlockKind::Container)
        {
            let free = volume.saturating_sub(self.size_contents(y));
            if free < self.size_of_rec(x, 0) {
                debug!("can_place: {} does not fit into {} (free {})", x, y, free);
                return Ok(-1);
            }
        }

        if let Some(SubBlock::Player { strength, .. }) = target.find_sub(SubBlockKind::Player) {
            let carried = self.weight_of(y).saturating_sub(
                target.object_prop(ObjectFlags::WEIGHT).unwrap_or(0),
            );
            if carried.saturating_add(self.weight_of(x)) > *strength {
                debug!("can_place: {} too heavy for {}", x, y);
                return Ok(-2);
            }
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn arena(count: usize) -> ItemArena {
        ItemArena::new(count, 10_000).unwrap()
    }

    fn object(size: i16, weight: i16, soft: bool) -> SubBlock {
        let mut flags = ObjectFlags::SIZE | ObjectFlags::WEIGHT;
        if soft {
            flags |= ObjectFlags::SOFT;
        }
        SubBlock::Object {
            name: 0,
            flags,
            props: vec![size, weight],
        }
    }

    fn assert_consistent(a: &ItemArena) {
        for id in a.ids() {
            let item = a.get(id).unwrap();
            if item.parent != NULL_ITEM {
                assert!(a.children(item.parent).contains(&id), "{} missing from parent", id);
            }
            for c in a.children(id) {
                assert_eq!(a.get(c).unwrap().parent, id);
            }
            assert!(!a.is_descendant_of(item.parent, id) || item.parent == NULL_ITEM);
        }
    }

    #[test]
    fn test_move_keeps_sibling_lists() {
        let mut a = arena(7);
        for id in 3..=6 {
            a.set_item_parent(id, 2).unwrap();
        }
        assert_eq!(a.children(2), vec![6, 5, 4, 3]);

        // middle child moves away
        a.set_item_parent(5, 1).unwrap();
        assert_eq!(a.children(2), vec![6, 4, 3]);
        assert_eq!(a.children(1), vec![5]);

        // first and last children
        a.set_item_parent(6, 1).unwrap();
        a.set_item_parent(3, 1).unwrap();
        assert_eq!(a.children(2), vec![4]);
        assert_eq!(a.children(1), vec![3, 6, 5]);
        assert_consistent(&a);
    }

    #[test]
    fn test_same_parent_is_noop() {
        let mut a = arena(5);
        a.set_item_parent(3, 2).unwrap();
        a.set_item_parent(4, 2).unwrap();
        a.set_item_parent(3, 2).unwrap();
        assert_eq!(a.children(2), vec![4, 3]);
        assert_consistent(&a);
    }

    #[test]
    fn test_cycles_rejected() {
        let mut a = arena(5);
        a.set_item_parent(3, 2).unwrap();
        a.set_item_parent(4, 3).unwrap();
        assert!(matches!(a.set_item_parent(2, 4), Err(EngineError::ItemCycle(2, 4))));
        assert!(matches!(a.set_item_parent(2, 2), Err(EngineError::ItemCycle(2, 2))));
        assert_eq!(a.get(2).unwrap().parent, NULL_ITEM);
        assert_consistent(&a);
    }

    #[test]
    fn test_detach_to_null() {
        let mut a = arena(4);
        a.set_item_parent(3, 2).unwrap();
        a.set_item_parent(3, NULL_ITEM).unwrap();
        assert!(a.children(2).is_empty());
        assert_eq!(a.get(3).unwrap().next, NULL_ITEM);
    }

    #[test]
    fn test_prop_index_counts_lower_bits() {
        let flags = ObjectFlags::TEXT | ObjectFlags::SIZE | ObjectFlags::WEIGHT;
        assert_eq!(prop_index(flags, ObjectFlags::TEXT), 0);
        assert_eq!(prop_index(flags, ObjectFlags::SIZE), 1);
        assert_eq!(prop_index(flags, ObjectFlags::WEIGHT), 2);
    }

    #[test]
    fn test_can_place_too_big_for_container() {
        let mut a = arena(4);
        a.attach(2, SubBlock::Container { volume: 10, flags: 0 }).unwrap();
        a.attach(3, object(12, 1, false)).unwrap();
        assert_eq!(a.can_place(3, 2).unwrap(), -1);

        a.attach(3, object(4, 1, false)).unwrap();
        assert_eq!(a.can_place(3, 2).unwrap(), 0);
    }

    #[test]
    fn test_soft_items_count_contents() {
        let mut a = arena(5);
        a.attach(2, SubBlock::Container { volume: 10, flags: 0 }).unwrap();
        a.attach(3, object(2, 0, true)).unwrap();
        a.attach(4, object(9, 0, false)).unwrap();
        a.set_item_parent(4, 3).unwrap();
        assert_eq!(a.size_of_rec(3, 0), 11);
        assert_eq!(a.can_place(3, 2).unwrap(), -1);
    }

    #[test]
    fn test_can_place_too_heavy_for_player() {
        let mut a = arena(5);
        a.attach(
            1,
            SubBlock::Player {
                strength: 10,
                weight: 0,
                score: 0,
                level: 0,
            },
        )
        .unwrap();
        a.attach(3, object(1, 6, false)).unwrap();
        a.attach(4, object(1, 5, false)).unwrap();
        a.set_item_parent(3, 1).unwrap();
        assert_eq!(a.can_place(4, 1).unwrap(), -2);
        assert_eq!(a.weight_of(1), 6);
    }

    #[test]
    fn test_item_heap_overflow() {
        let err = ItemArena::new(10, 100).unwrap_err();
        assert!(matches!(err, EngineError::HeapOverflow { heap: "item heap", .. }));
    }

    #[test]
    fn test_object_flags_keep_props_packed() {
        let mut item = Item::default();
        item.sub_blocks.push(object(4, 9, false));
        assert!(item.set_object_flag(0, true));
        assert_eq!(item.object_prop(ObjectFlags::TEXT), Some(0));
        assert_eq!(item.object_prop(ObjectFlags::SIZE), Some(4));
        assert!(item.set_object_flag(20, true));
        assert!(item.object_flags().bits() & (1 << 20) != 0);
        assert!(item.set_object_flag(1, false));
        assert_eq!(item.object_prop(ObjectFlags::WEIGHT), Some(9));
        assert!(!Item::default().set_object_flag(1, true));
    }
}
