//! The two timer queues
//!
//! `TimeEventQueue` fires subroutines after wall-clock seconds. It is kept
//! sorted by fire time; a new event goes in front of events due at the same
//! second.
//!
//! `VgaTimerList` resumes VGA scripts after a number of frame ticks. Entries
//! are only ever appended, so table order is also age order. Each entry
//! carries a serial number; a pass walks the table by serial, which lets the
//! resumed scripts add and remove entries without any entry being skipped or
//! visited twice.
//!
//! `SleeperList` parks VGA scripts until a sync id is broadcast.

use crate::zone::VgaCursor;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEvent {
    /// Seconds relative to the stopped-clock base
    pub time: u32,
    pub subroutine: u16,
}

#[derive(Debug, Clone, Default)]
pub struct TimeEventQueue {
    events: Vec<TimeEvent>,
}

impl TimeEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `subroutine` to run `timeout` seconds after `now`
    pub fn add(&mut self, now: u32, base: u32, timeout: u32, subroutine: u16) {
        let time = now.wrapping_add(timeout).wrapping_sub(base);
        self.insert(TimeEvent { time, subroutine });
    }

    /// Insert an event whose time is already relative to the base
    pub fn insert(&mut self, event: TimeEvent) {
        let at = self
            .events
            .iter()
            .position(|e| event.time <= e.time)
            .unwrap_or(self.events.len());
        debug!(
            "time event: subroutine {} at {} (slot {})",
            event.subroutine, event.time, at
        );
        self.events.insert(at, event);
    }

    /// Remove and return the head if it is due
    pub fn pop_due(&mut self, now: u32, base: u32) -> Option<TimeEvent> {
        let due = now.wrapping_sub(base);
        match self.events.first() {
            Some(e) if e.time <= due => Some(self.events.remove(0)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeEvent> {
        self.events.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgaTimerEntry {
    pub delay: i16,
    /// `None` marks the scroll timer
    pub cursor: Option<VgaCursor>,
    pub sprite_id: u16,
    pub zone: u16,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct VgaTimerList {
    entries: Vec<VgaTimerEntry>,
    next_seq: u64,
}

impl VgaTimerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, delay: i16, cursor: Option<VgaCursor>, sprite_id: u16, zone: u16) {
        debug!(
            "vga timer: sprite {} zone {} in {} ticks",
            sprite_id, zone, delay
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(VgaTimerEntry {
            delay,
            cursor,
            sprite_id,
            zone,
            seq,
        });
    }

    /// Continue a pass: tick every entry after `last` until one expires,
    /// remove it and return it
    ///
    /// Start a pass with `last = None`. Entries added while the pass runs are
    /// visited in the same pass.
    pub fn next_expired(&mut self, last: &mut Option<u64>, base: i16) -> Option<VgaTimerEntry> {
        let start = match *last {
            Some(seq) => self.entries.partition_point(|e| e.seq <= seq),
            None => 0,
        };
        for i in start..self.entries.len() {
            let entry = &mut self.entries[i];
            *last = Some(entry.seq);
            entry.delay = entry.delay.saturating_sub(base);
            if entry.delay <= 0 {
                return Some(self.entries.remove(i));
            }
        }
        None
    }

    /// Drop the timers of one sprite
    pub fn remove_sprite(&mut self, sprite_id: u16, zone: Option<u16>) {
        self.entries.retain(|e| {
            !(e.cursor.is_some() && e.sprite_id == sprite_id && zone.map_or(true, |z| z == e.zone))
        });
    }

    /// Drop every script timer, keeping the scroll timer and those `keep` selects
    pub fn retain_scripts<F>(&mut self, mut keep: F)
    where
        F: FnMut(&VgaTimerEntry) -> bool,
    {
        self.entries.retain(|e| e.cursor.is_none() || keep(e));
    }

    pub fn has_scroll_timer(&self) -> bool {
        self.entries.iter().any(|e| e.cursor.is_none())
    }

    pub fn references_zone(&self, zone: u16) -> bool {
        self.entries
            .iter()
            .any(|e| e.cursor.map_or(false, |c| c.zone == zone))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VgaTimerEntry> {
        self.entries.iter()
    }
}

/// A VGA script parked on a sync id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sleeper {
    pub ident: u16,
    pub cursor: VgaCursor,
    pub sprite_id: u16,
    pub zone: u16,
}

#[derive(Debug, Clone, Default)]
pub struct SleeperList {
    sleepers: Vec<Sleeper>,
}

impl SleeperList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleep(&mut self, sleeper: Sleeper) {
        debug!("sprite {} sleeps on {}", sleeper.sprite_id, sleeper.ident);
        self.sleepers.push(sleeper);
    }

    /// Remove every sleeper waiting on `ident`, oldest first
    pub fn wake(&mut self, ident: u16) -> Vec<Sleeper> {
        let (woken, rest): (Vec<Sleeper>, Vec<Sleeper>) =
            self.sleepers.drain(..).partition(|s| s.ident == ident);
        self.sleepers = rest;
        woken
    }

    pub fn remove_sprite(&mut self, sprite_id: u16, zone: Option<u16>) {
        self.sleepers
            .retain(|s| !(s.sprite_id == sprite_id && zone.map_or(true, |z| z == s.zone)));
    }

    pub fn references_zone(&self, zone: u16) -> bool {
        self.sleepers.iter().any(|s| s.cursor.zone == zone)
    }

    pub fn clear(&mut self) {
        self.sleepers.clear();
    }

    pub fn len(&self) -> usize {
        self.sleepers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sleepers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn cursor(pos: usize) -> Option<VgaCursor> {
        Some(VgaCursor { zone: 1, pos })
    }

    #[test]
    fn test_time_events_sorted() {
        let mut q = TimeEventQueue::new();
        for (timeout, sub) in [(10, 100), (3, 101), (7, 102)] {
            q.add(1000, 0, timeout, sub);
        }
        let order: Vec<u16> = q.iter().map(|e| e.subroutine).collect();
        assert_eq!(order, vec![101, 102, 100]);

        assert!(q.pop_due(1002, 0).is_none());
        assert_eq!(q.pop_due(1003, 0).unwrap().subroutine, 101);
        assert!(q.pop_due(1003, 0).is_none());
    }

    #[test]
    fn test_new_event_goes_before_equal_times() {
        let mut q = TimeEventQueue::new();
        q.add(0, 0, 5, 1);
        q.add(0, 0, 5, 2);
        assert_eq!(q.iter().next().unwrap().subroutine, 2);
    }

    #[test]
    fn test_stopped_clock_base() {
        let mut q = TimeEventQueue::new();
        q.add(100, 40, 10, 7);
        assert_eq!(q.iter().next().unwrap().time, 70);
        assert!(q.pop_due(109, 40).is_none());
        assert!(q.pop_due(110, 40).is_some());
    }

    #[test]
    fn test_vga_pass_visits_each_entry_once() {
        let mut list = VgaTimerList::new();
        list.add(1, cursor(0), 1, 1);
        list.add(3, cursor(10), 2, 1);
        list.add(1, cursor(20), 3, 1);

        let mut last = None;
        let first = list.next_expired(&mut last, 1).unwrap();
        assert_eq!(first.sprite_id, 1);
        // a resumed script adds a timer that is due at once
        list.add(1, cursor(30), 4, 1);
        let second = list.next_expired(&mut last, 1).unwrap();
        assert_eq!(second.sprite_id, 3);
        let third = list.next_expired(&mut last, 1).unwrap();
        assert_eq!(third.sprite_id, 4);
        assert!(list.next_expired(&mut last, 1).is_none());

        assert_eq!(list.len(), 1);
        assert_eq!(list.iter().next().unwrap().delay, 2);
    }

    #[test]
    fn test_removal_during_pass_does_not_skip() {
        let mut list = VgaTimerList::new();
        list.add(1, cursor(0), 1, 1);
        list.add(5, cursor(0), 2, 1);
        list.add(1, cursor(0), 3, 1);

        let mut last = None;
        assert_eq!(list.next_expired(&mut last, 1).unwrap().sprite_id, 1);
        list.remove_sprite(2, None);
        assert_eq!(list.next_expired(&mut last, 1).unwrap().sprite_id, 3);
        assert!(list.is_empty());
    }

    #[test]
    fn test_sleepers_wake_by_ident() {
        let mut sleepers = SleeperList::new();
        for (ident, sprite) in [(5, 1), (6, 2), (5, 3)] {
            sleepers.sleep(Sleeper {
                ident,
                cursor: VgaCursor { zone: 2, pos: 0 },
                sprite_id: sprite,
                zone: 2,
            });
        }
        let woken: Vec<u16> = sleepers.wake(5).iter().map(|s| s.sprite_id).collect();
        assert_eq!(woken, vec![1, 3]);
        assert_eq!(sleepers.len(), 1);
        assert!(sleepers.references_zone(2));
    }
}
