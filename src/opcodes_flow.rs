//! Control-flow opcodes: line and subroutine returns, nested calls, time
//! events, VGA sync and the quick-save slot

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::opcode_tables::ScriptOp;
use crate::script::RESCAN;
use log::{debug, info, warn};

/// Slot used by the in-game save and load opcodes
pub const QUICK_SAVE_SLOT: u16 = 0;

impl Engine {
    /// Handle flow opcodes
    pub fn execute_flow_op(&mut self, op: ScriptOp, args: &[i16]) -> EngineResult<()> {
        debug!("{} {:?}", op.name(), args);
        match op {
            ScriptOp::End => self.vm.script_return = 1,
            ScriptOp::Done => self.vm.script_return = -1,
            ScriptOp::Rescan => self.vm.script_return = RESCAN,
            ScriptOp::Comment => {}
            ScriptOp::Process => {
                self.start_subroutine_by_id(args[0] as u16)?;
            }
            ScriptOp::When => {
                self.add_time_event(args[0] as u16 as u32, args[1] as u16);
            }
            ScriptOp::ClearTimers => self.time_events.clear(),
            ScriptOp::WaitSync => self.wait_for_sync(args[0] as u16)?,
            ScriptOp::Sync => self.wake_sleepers(args[0] as u16),
            ScriptOp::Save => {
                let caption = self.game.name();
                self.save_game(QUICK_SAVE_SLOT, caption)?;
                info!("saved to {:?}", self.save_path(QUICK_SAVE_SLOT));
            }
            ScriptOp::Load => {
                let path = self.save_path(QUICK_SAVE_SLOT);
                if !path.exists() {
                    warn!("no save game at {:?}", path);
                } else if !self.load_game(QUICK_SAVE_SLOT)? {
                    warn!("{:?} belongs to another game", path);
                }
            }
            ScriptOp::PauseGame => {
                self.paused = !self.paused;
                debug!("paused: {}", self.paused);
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

#[cfg(test)]
mod tests {
    use crate::builder::{GameBuilder, ScriptBuilder};
    use crate::config::GameVariant;
    use crate::opcode_tables::ScriptOp;
    use test_log::test;

    fn line() -> ScriptBuilder {
        ScriptBuilder::new(GameVariant::Simon1)
    }

    #[test]
    fn test_end_stops_the_subroutine() {
        let mut b = GameBuilder::new(GameVariant::Simon1);
        b.subroutine(
            5,
            &[
                line().op(ScriptOp::Let, &[1, 1]).op(ScriptOp::End, &[]).build(),
                line().op(ScriptOp::Let, &[2, 1]).build(),
            ],
        );
        let mut engine = b.engine();
        assert_eq!(engine.start_subroutine_by_id(5).unwrap(), Some(1));
        assert_eq!(engine.vm.variables[1..3], [1, 0]);
    }

    #[test]
    fn test_process_runs_nested_and_continues() {
        let mut b = GameBuilder::new(GameVariant::Simon1);
        b.subroutine(6, &[line().op(ScriptOp::Let, &[3, 4]).build()]);
        b.subroutine(
            5,
            &[line()
                .op(ScriptOp::Process, &[6])
                .op(ScriptOp::Let, &[4, 1])
                .build()],
        );
        let mut engine = b.engine();
        engine.start_subroutine_by_id(5).unwrap();
        assert_eq!(engine.vm.variables[3..5], [4, 1]);
    }

    #[test]
    fn test_process_of_missing_subroutine_is_skipped() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        let code = line()
            .op(ScriptOp::Process, &[999])
            .op(ScriptOp::Let, &[1, 2])
            .build();
        engine.run_line(&code).unwrap();
        assert_eq!(engine.vm.variables[1], 2);
    }

    #[test]
    fn test_when_and_clear_timers() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        let code = line()
            .op(ScriptOp::When, &[5, 20])
            .op(ScriptOp::When, &[2, 21])
            .build();
        engine.run_line(&code).unwrap();
        let order: Vec<u16> = engine.time_events.iter().map(|e| e.subroutine).collect();
        assert_eq!(order, vec![21, 20]);

        engine
            .run_line(&line().op(ScriptOp::ClearTimers, &[]).build())
            .unwrap();
        assert!(engine.time_events.is_empty());
    }

    #[test]
    fn test_sync_releases_wait() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        engine.vga.wait_for = 12;
        engine
            .run_line(&line().op(ScriptOp::Sync, &[12]).build())
            .unwrap();
        assert_eq!(engine.vga.wait_for, 0);
    }

    #[test]
    fn test_pause_toggles() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        let code = line().op(ScriptOp::PauseGame, &[]).build();
        engine.run_line(&code).unwrap();
        assert!(engine.paused);
        engine.run_line(&code).unwrap();
        assert!(!engine.paused);
    }

    #[test]
    fn test_quick_save_and_load() {
        let dir = std::env::temp_dir().join(format!("agos-flow-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut b = GameBuilder::new(GameVariant::Simon1);
        b.save_dir(&dir);
        let mut engine = b.engine();
        engine.vm.variables[10] = 42;
        engine
            .run_line(&line().op(ScriptOp::Save, &[]).build())
            .unwrap();
        engine.vm.variables[10] = 0;
        engine
            .run_line(&line().op(ScriptOp::Load, &[]).build())
            .unwrap();
        assert_eq!(engine.vm.variables[10], 42);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
