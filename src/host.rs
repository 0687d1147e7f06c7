//! Platform seam: clock, input, palette upload and present
//!
//! The engine composes every frame itself; a host only shows the finished
//! 8-bit indexed surface with the current palette and hands back input.

use crate::draw::Surface;
use crate::error::EngineResult;
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    KeyDown(u16),
    KeyUp(u16),
    MouseMove { x: u16, y: u16 },
    LeftButtonDown,
    LeftButtonUp,
    RightButtonDown,
    Quit,
}

/// Last-value input state
///
/// Each slot holds the most recent event of its class; a second key press
/// before the first is consumed overwrites it. Releases change nothing: a
/// key let go before the engine reads it still counts as pressed, and a
/// click counts on the press.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub key_pressed: Option<u16>,
    pub mouse_x: u16,
    pub mouse_y: u16,
    pub left_button_down: u16,
    pub quit: bool,
}

impl InputState {
    /// Fold one event into the state; returns true for a right click
    pub fn apply(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::KeyDown(key) => self.key_pressed = Some(key),
            HostEvent::KeyUp(_) | HostEvent::LeftButtonUp => {}
            HostEvent::MouseMove { x, y } => {
                self.mouse_x = x;
                self.mouse_y = y;
            }
            HostEvent::LeftButtonDown => {
                self.left_button_down = self.left_button_down.wrapping_add(1);
            }
            HostEvent::RightButtonDown => return true,
            HostEvent::Quit => self.quit = true,
        }
        false
    }

    pub fn take_key(&mut self) -> Option<u16> {
        self.key_pressed.take()
    }
}

pub trait Host {
    /// Milliseconds since the host started
    fn millis(&self) -> u64;

    fn sleep(&mut self, ms: u64);

    fn poll_event(&mut self) -> Option<HostEvent>;

    /// Upload 256 RGB entries with 8 bits per channel
    fn set_palette(&mut self, palette: &[[u8; 3]]) -> EngineResult<()>;

    fn present(&mut self, frame: &Surface) -> EngineResult<()>;

    /// Game text printed by the message opcodes
    fn print_text(&mut self, text: &str) -> EngineResult<()>;
}

/// Host with a simulated clock and scripted input
///
/// Sleeping advances the clock, so a run is deterministic and instant. The
/// state sits behind a shared handle: keep a clone to inspect what the engine
/// presented after handing the host over.
#[derive(Debug, Default, Clone)]
pub struct HeadlessHost {
    state: Rc<RefCell<HeadlessState>>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    now: u64,
    events: VecDeque<(u64, HostEvent)>,
    text: Vec<String>,
    frames: usize,
    last_frame: Option<Surface>,
    palette: Vec<[u8; 3]>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` once the clock reaches `at_ms`
    pub fn schedule(&self, at_ms: u64, event: HostEvent) {
        let mut state = self.state.borrow_mut();
        let at = state
            .events
            .iter()
            .position(|(t, _)| *t > at_ms)
            .unwrap_or(state.events.len());
        state.events.insert(at, (at_ms, event));
    }

    pub fn advance(&self, ms: u64) {
        self.state.borrow_mut().now += ms;
    }

    pub fn output(&self) -> Vec<String> {
        self.state.borrow().text.clone()
    }

    pub fn frames_presented(&self) -> usize {
        self.state.borrow().frames
    }

    pub fn last_frame(&self) -> Option<Surface> {
        self.state.borrow().last_frame.clone()
    }

    pub fn palette(&self) -> Vec<[u8; 3]> {
        self.state.borrow().palette.clone()
    }
}

impl Host for HeadlessHost {
    fn millis(&self) -> u64 {
        self.state.borrow().now
    }

    fn sleep(&mut self, ms: u64) {
        self.state.borrow_mut().now += ms;
    }

    fn poll_event(&mut self) -> Option<HostEvent> {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        match state.events.front() {
            Some((at, _)) if *at <= now => state.events.pop_front().map(|(_, e)| e),
            _ => None,
        }
    }

    fn set_palette(&mut self, palette: &[[u8; 3]]) -> EngineResult<()> {
        self.state.borrow_mut().palette = palette.to_vec();
        Ok(())
    }

    fn present(&mut self, frame: &Surface) -> EngineResult<()> {
        let mut state = self.state.borrow_mut();
        state.frames += 1;
        match &mut state.last_frame {
            Some(last) if last.pixels.len() == frame.pixels.len() => last.copy_from(frame),
            _ => state.last_frame = Some(frame.clone()),
        }
        Ok(())
    }

    fn print_text(&mut self, text: &str) -> EngineResult<()> {
        debug!("Headless: print {:?}", text);
        self.state.borrow_mut().text.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_second_key_overwrites_first() {
        let mut input = InputState::default();
        input.apply(HostEvent::KeyDown(b'a' as u16));
        input.apply(HostEvent::KeyDown(b'b' as u16));
        assert_eq!(input.take_key(), Some(b'b' as u16));
        assert_eq!(input.take_key(), None);
    }

    #[test]
    fn test_release_keeps_unread_press() {
        let mut input = InputState::default();
        input.apply(HostEvent::KeyDown(b'p' as u16));
        input.apply(HostEvent::KeyUp(b'p' as u16));
        assert_eq!(input.take_key(), Some(b'p' as u16));
        input.apply(HostEvent::KeyUp(b'q' as u16));
        assert_eq!(input.take_key(), None);
    }

    #[test]
    fn test_clicks_count_up() {
        let mut input = InputState::default();
        input.apply(HostEvent::LeftButtonDown);
        input.apply(HostEvent::LeftButtonUp);
        input.apply(HostEvent::LeftButtonDown);
        assert_eq!(input.left_button_down, 2);
        assert!(input.apply(HostEvent::RightButtonDown));
    }

    #[test]
    fn test_scripted_events_wait_for_the_clock() {
        let mut host = HeadlessHost::new();
        let handle = host.clone();
        handle.schedule(100, HostEvent::Quit);
        host.schedule(50, HostEvent::LeftButtonDown);
        assert_eq!(host.poll_event(), None);
        host.sleep(60);
        assert_eq!(host.poll_event(), Some(HostEvent::LeftButtonDown));
        assert_eq!(host.poll_event(), None);
        handle.advance(40);
        assert_eq!(host.poll_event(), Some(HostEvent::Quit));
    }
}
