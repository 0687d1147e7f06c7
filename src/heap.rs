//! Bump heaps with checkpoint/rollback
//!
//! Paged-in subroutines and local string tables are charged against a fixed
//! capacity. Loading a scene rolls the heap back to a checkpoint, discarding
//! everything allocated after it.

use crate::error::{EngineError, EngineResult};

/// Position in a heap that can be rolled back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Checkpoint {
    blocks: usize,
    used: usize,
}

#[derive(Debug, Clone)]
pub struct TableHeap<T> {
    name: &'static str,
    capacity: usize,
    used: usize,
    blocks: Vec<(usize, T)>,
}

impl<T> TableHeap<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        TableHeap {
            name,
            capacity,
            used: 0,
            blocks: Vec::new(),
        }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Charge `size` bytes (rounded to a word) and store the block
    pub fn alloc(&mut self, size: usize, block: T) -> EngineResult<&T> {
        let size = (size + 1) & !1;
        if self.used + size > self.capacity {
            return Err(EngineError::HeapOverflow {
                heap: self.name,
                used: self.used + size,
                capacity: self.capacity,
            });
        }
        self.used += size;
        self.blocks.push((size, block));
        Ok(&self.blocks[self.blocks.len() - 1].1)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            blocks: self.blocks.len(),
            used: self.used,
        }
    }

    /// Drop everything allocated after `mark`
    pub fn rollback_to(&mut self, mark: Checkpoint) {
        if mark.blocks <= self.blocks.len() {
            self.blocks.truncate(mark.blocks);
            self.used = mark.used;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.blocks.iter().map(|(_, b)| b)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.blocks.iter_mut().map(|(_, b)| b)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.used = 0;
    }
}
