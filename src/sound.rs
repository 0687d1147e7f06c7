//! Sound collaborator
//!
//! The engine only fires sound commands and, for the speech opcodes, asks
//! whether a voice is still playing.

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

pub trait SoundDriver {
    fn play_effect(&mut self, id: u16);
    fn play_voice(&mut self, id: u16);
    fn play_ambient(&mut self, id: u16);
    fn stop_ambient(&mut self, id: u16);
    fn play_music(&mut self, track: u16, looping: bool);
    fn stop_music(&mut self);
    fn stop_all(&mut self);
    fn is_voice_active(&self) -> bool;
    fn is_music_active(&self) -> bool;

    /// Whether an effect bank exists; a missing one is not an error
    fn has_effects(&self) -> bool {
        false
    }
}

/// Silent driver
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundDriver for NullSound {
    fn play_effect(&mut self, id: u16) {
        debug!("sound: effect {} (muted)", id);
    }
    fn play_voice(&mut self, _id: u16) {}
    fn play_ambient(&mut self, _id: u16) {}
    fn stop_ambient(&mut self, _id: u16) {}
    fn play_music(&mut self, _track: u16, _looping: bool) {}
    fn stop_music(&mut self) {}
    fn stop_all(&mut self) {}

    fn is_voice_active(&self) -> bool {
        false
    }

    fn is_music_active(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCommand {
    Effect(u16),
    Voice(u16),
    Ambient(u16),
    StopAmbient(u16),
    Music(u16, bool),
    StopMusic,
    StopAll,
}

/// Driver that records every command, for tests
///
/// Clones share one log, so a test keeps a handle while the engine owns the
/// driver.
#[derive(Debug, Default, Clone)]
pub struct RecordingSound {
    log: Rc<RefCell<SoundLog>>,
}

#[derive(Debug, Default)]
struct SoundLog {
    commands: Vec<SoundCommand>,
    voice_active: bool,
    music_active: bool,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<SoundCommand> {
        self.log.borrow().commands.clone()
    }

    /// Make `is_voice_active` report `active` until the next stop
    pub fn set_voice_active(&self, active: bool) {
        self.log.borrow_mut().voice_active = active;
    }

    fn push(&self, command: SoundCommand) {
        self.log.borrow_mut().commands.push(command);
    }
}

impl SoundDriver for RecordingSound {
    fn play_effect(&mut self, id: u16) {
        self.push(SoundCommand::Effect(id));
    }

    fn play_voice(&mut self, id: u16) {
        self.log.borrow_mut().voice_active = true;
        self.push(SoundCommand::Voice(id));
    }

    fn play_ambient(&mut self, id: u16) {
        self.push(SoundCommand::Ambient(id));
    }

    fn stop_ambient(&mut self, id: u16) {
        self.push(SoundCommand::StopAmbient(id));
    }

    fn play_music(&mut self, track: u16, looping: bool) {
        self.log.borrow_mut().music_active = true;
        self.push(SoundCommand::Music(track, looping));
    }

    fn stop_music(&mut self) {
        self.log.borrow_mut().music_active = false;
        self.push(SoundCommand::StopMusic);
    }

    fn stop_all(&mut self) {
        {
            let mut log = self.log.borrow_mut();
            log.voice_active = false;
            log.music_active = false;
        }
        self.push(SoundCommand::StopAll);
    }

    fn is_voice_active(&self) -> bool {
        self.log.borrow().voice_active
    }

    fn is_music_active(&self) -> bool {
        self.log.borrow().music_active
    }

    fn has_effects(&self) -> bool {
        true
    }
}
