/// Display, animation, box and sound opcodes of the script machine
///
/// These opcodes are the script machine's only way into the VGA machine:
/// they start and stop sprite animations, switch the window image, manage
/// clickable boxes and text windows, and fire sound commands.
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::config::GameVariant;
use crate::hitarea::BoxFlags;
use crate::item::ItemId;
use crate::opcode_tables::ScriptOp;
use log::{debug, warn};

pub const TEXT_WINDOW_COUNT: usize = 8;

/// A text window defined by a script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextWindow {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub fill_color: u8,
    pub text_color: u8,
    /// Lines printed since the last clear
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TextWindows {
    pub windows: [Option<TextWindow>; TEXT_WINDOW_COUNT],
    pub current: usize,
}

impl TextWindows {
    pub fn current_mut(&mut self) -> Option<&mut TextWindow> {
        self.windows.get_mut(self.current).and_then(|w| w.as_mut())
    }

    pub fn get(&self, n: usize) -> Option<&TextWindow> {
        self.windows.get(n).and_then(|w| w.as_ref())
    }
}

impl Engine {
    fn print_line(&mut self, text: &str) -> EngineResult<()> {
        if let Some(window) = self.text_windows.current_mut() {
            window.lines.push(text.to_string());
        }
        self.host.print_text(text)
    }

    /// Handle display, animation and sound opcodes
    pub fn execute_display_op(&mut self, op: ScriptOp, args: &[i16]) -> EngineResult<()> {
        debug!("{} {:?}", op.name(), args);
        let w = |i: usize| args[i] as u16;
        match op {
            // ---- text ----
            ScriptOp::Print => {
                let value = self.read_variable(w(0) as usize)?;
                self.print_line(&value.to_string())?;
            }
            ScriptOp::Message | ScriptOp::Msg => {
                let raw = self.pager.get_string(w(0), self.res.as_mut())?;
                self.print_line(&String::from_utf8_lossy(&raw))?;
            }

            // ---- animation ----
            ScriptOp::HaltAnimation => self.animation_halted = true,
            ScriptOp::RestartAnimation => self.animation_halted = false,
            ScriptOp::Picture => self.set_window_image(w(1), w(0))?,
            ScriptOp::LoadZone => self.load_zone(w(0))?,
            ScriptOp::Animate => {
                let id = w(1);
                let zone = if self.game == GameVariant::Simon1 {
                    id / 100
                } else {
                    self.vga.zone
                };
                self.start_vga_code(w(0), zone, id, args[2], args[3], w(4))?;
            }
            ScriptOp::Animate2 => {
                self.start_vga_code(w(0), w(1), w(2), args[3], args[4], w(5))?;
            }
            ScriptOp::StopAnimate => self.kill_sprite(w(0) / 100, w(0)),
            ScriptOp::StopAnimate2 => self.kill_sprite(w(0), w(1)),
            ScriptOp::KillAnimate => self.reset_sprites()?,

            // ---- text windows ----
            ScriptOp::DefWindow => {
                let n = w(0) as usize;
                let slot = self
                    .text_windows
                    .windows
                    .get_mut(n)
                    .ok_or(EngineError::TableFull("text windows"))?;
                *slot = Some(TextWindow {
                    x: w(1),
                    y: w(2),
                    width: w(3),
                    height: w(4),
                    fill_color: w(5) as u8,
                    text_color: w(6) as u8,
                    lines: Vec::new(),
                });
            }
            ScriptOp::Window => {
                let n = w(0) as usize;
                if self.text_windows.get(n).is_some() {
                    self.text_windows.current = n;
                } else {
                    warn!("window {} is not defined", n);
                }
            }
            ScriptOp::Cls => {
                if let Some(window) = self.text_windows.current_mut() {
                    window.lines.clear();
                }
            }
            ScriptOp::CloseWindow => {
                let n = w(0) as usize;
                if let Some(slot) = self.text_windows.windows.get_mut(n) {
                    *slot = None;
                }
            }

            // ---- boxes ----
            ScriptOp::AddBox => {
                let flags = BoxFlags::from_script_params(w(0) / 1000);
                self.hit_areas.define(
                    w(0) % 1000,
                    w(1),
                    w(2),
                    w(3),
                    w(4),
                    flags,
                    w(6),
                    w(5) as ItemId,
                )?;
            }
            ScriptOp::DelBox => self.hit_areas.undefine(w(0)),
            ScriptOp::EnableBox => self.hit_areas.enable(w(0)),
            ScriptOp::DisableBox => self.hit_areas.disable(w(0)),
            ScriptOp::MoveBox => self.hit_areas.move_by(w(0), args[1], args[2]),
            ScriptOp::IsBox => {
                self.vm.condition = self.hit_areas.find(w(0)).map_or(false, |h| h.is_live());
            }

            // ---- zones ----
            ScriptOp::FreezeZones => self.vga.zones.freeze(),
            ScriptOp::LockZones => {
                let loaded: Vec<u16> = self.vga.zones.loaded().collect();
                for zone in loaded {
                    self.vga.zones.lock(zone);
                }
            }
            ScriptOp::UnlockZones => self.vga.zones.unlock_all(),

            // ---- mouse ----
            ScriptOp::MouseOn => self.vga.mouse_hide = self.vga.mouse_hide.saturating_sub(1),
            ScriptOp::MouseOff => self.vga.mouse_hide = self.vga.mouse_hide.saturating_add(1),

            // ---- sound ----
            ScriptOp::PlayTune => self.sound.play_music(w(0), args[1] != 0),
            ScriptOp::IfEndTune => self.vm.condition = !self.sound.is_music_active(),
            ScriptOp::StopTune => self.sound.stop_music(),
            ScriptOp::Speech => self.sound.play_voice(w(0)),
            ScriptOp::PlayEffect => {
                if self.sound.has_effects() {
                    self.sound.play_effect(w(0));
                } else {
                    debug!("no effects bank for effect {}", w(0));
                }
            }
            ScriptOp::PlayAmbient => self.sound.play_ambient(w(0)),
            ScriptOp::WaitEndSpeech => {
                self.skip_speech = false;
                while self.sound.is_voice_active() && !self.quit {
                    if self.skip_speech || self.exit_cutscene {
                        self.sound.stop_all();
                        break;
                    }
                    self.delay(10)?;
                }
            }

            _ => {
                return Err(EngineError::UnregisteredOpcode(
                    VmKind::Script,
                    self.opcodes.opcode_of(op).unwrap_or(0),
                ))
            }
        }
        Ok(())
    }
}
