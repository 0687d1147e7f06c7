//! Game-logic script machine
//!
//! A subroutine is a list of lines; each line is an opcode stream ending at
//! the variant's terminator. `run_script` executes one line. Every opcode
//! resets the shared script condition to true before it runs; a condition
//! opcode may clear it, and the line stops once the condition no longer
//! differs from the invert flag. A non-zero script return ends the line and
//! is handed back to `start_subroutine`.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::item::{ItemId, NULL_ITEM, PLAYER_ITEM};
use crate::opcode_tables::{OpGroup, ScriptOp};
use crate::subroutine::{ScriptCursor, Subroutine, KEY_NONE};
use bitvec::prelude::*;
use log::{debug, warn};
use std::rc::Rc;

pub const VARIABLE_COUNT: usize = 256;
pub const ITEM_SLOTS: usize = 10;
/// Bit flags addressable by the bit opcodes, 64 words of 16
pub const BIT_COUNT: usize = 1024;
pub const MAX_RECURSION: usize = 40;
/// Script return that restarts the current subroutine from its first line
pub const RESCAN: i16 = -10;

/// Word arguments in this range read variable `value - 30000`
const VAR_WORD_BASE: u16 = 30000;
const VAR_WORD_END: u16 = 30512;

/// State the script machine shares with the VGA machine
#[derive(Debug, Clone)]
pub struct ScriptState {
    pub variables: [i16; VARIABLE_COUNT],
    pub bits: BitVec<u16, Lsb0>,
    /// Numbered item slots, also read by the VGA item tests
    pub item_store: [ItemId; ITEM_SLOTS],
    pub subject_item: ItemId,
    pub object_item: ItemId,
    pub verb: i16,
    pub noun1: i16,
    pub noun2: i16,
    pub condition: bool,
    pub script_return: i16,
    /// Forces every running line to return 1 at its next opcode
    pub return_1: bool,
    pub depth: usize,
}

impl Default for ScriptState {
    fn default() -> Self {
        ScriptState {
            variables: [0; VARIABLE_COUNT],
            bits: bitvec![u16, Lsb0; 0; BIT_COUNT],
            item_store: [NULL_ITEM; ITEM_SLOTS],
            subject_item: NULL_ITEM,
            object_item: NULL_ITEM,
            verb: KEY_NONE,
            noun1: KEY_NONE,
            noun2: KEY_NONE,
            condition: true,
            script_return: 0,
            return_1: false,
            depth: 0,
        }
    }
}

impl ScriptState {
    pub fn bit(&self, bit: usize) -> bool {
        self.bits.get(bit).map_or(false, |b| *b)
    }

    pub fn set_bit(&mut self, bit: usize, value: bool) {
        if bit < self.bits.len() {
            self.bits.set(bit, value);
        }
    }
}

impl Engine {
    pub fn read_variable(&self, index: usize) -> EngineResult<i16> {
        if index >= VARIABLE_COUNT - 1 {
            return Err(EngineError::BadVariable(index));
        }
        Ok(self.vm.variables[index])
    }

    pub fn write_variable(&mut self, index: usize, value: i16) -> EngineResult<()> {
        let slot = self
            .vm
            .variables
            .get_mut(index)
            .ok_or(EngineError::BadVariable(index))?;
        *slot = value;
        Ok(())
    }

    fn read_opcode(&self, cursor: &mut ScriptCursor) -> EngineResult<u16> {
        if self.game.word_opcodes() {
            Ok(cursor.read_word()? as u16)
        } else {
            Ok(cursor.read_u8()? as u16)
        }
    }

    /// A byte, or `0xFF` and a variable index
    pub fn get_var_or_byte(&self, cursor: &mut ScriptCursor) -> EngineResult<i16> {
        if self.game.word_opcodes() {
            return self.get_var_or_word(cursor);
        }
        match cursor.read_u8()? {
            0xFF => self.read_variable(cursor.read_u8()? as usize),
            b => Ok(b as i16),
        }
    }

    pub fn get_var_or_word(&self, cursor: &mut ScriptCursor) -> EngineResult<i16> {
        let a = cursor.read_word()? as u16;
        if (VAR_WORD_BASE..VAR_WORD_END).contains(&a) {
            self.read_variable((a - VAR_WORD_BASE) as usize)
        } else {
            Ok(a as i16)
        }
    }

    /// An item reference; small negative words name the parse slots
    pub fn get_next_item(&self, cursor: &mut ScriptCursor) -> EngineResult<ItemId> {
        let a = cursor.read_word()?;
        Ok(match a {
            -1 => self.vm.subject_item,
            -3 => self.vm.object_item,
            -5 => PLAYER_ITEM,
            -7 => NULL_ITEM,
            -9 => self.items.get(PLAYER_ITEM)?.parent,
            id => id as ItemId,
        })
    }

    fn read_args(&self, cursor: &mut ScriptCursor, signature: &str) -> EngineResult<Vec<i16>> {
        let mut args = Vec::with_capacity(signature.len());
        for kind in signature.bytes() {
            let value = match kind {
                b'B' | b'F' => self.get_var_or_byte(cursor)?,
                b'W' => self.get_var_or_word(cursor)?,
                b'I' => self.get_next_item(cursor)? as i16,
                _ => cursor.read_word()?,
            };
            args.push(value);
        }
        Ok(args)
    }

    /// Execute one line; returns the script return value
    pub fn run_script(&mut self, cursor: &mut ScriptCursor) -> EngineResult<i16> {
        let terminator = self.game.line_terminator();
        let invert = self.game.invert_prefix();
        loop {
            if cursor.at_end() {
                return Ok(0);
            }
            let mut opcode = self.read_opcode(cursor)?;
            if opcode == terminator {
                return Ok(0);
            }
            if self.vm.return_1 {
                return Ok(1);
            }

            let mut flag = false;
            if opcode == invert {
                flag = true;
                opcode = self.read_opcode(cursor)?;
                if opcode == terminator {
                    return Ok(0);
                }
            }

            if opcode as usize >= self.opcodes.len() {
                return Err(EngineError::InvalidOpcode(VmKind::Script, opcode));
            }
            let op = self
                .opcodes
                .entry(opcode)
                .ok_or(EngineError::UnregisteredOpcode(VmKind::Script, opcode))?;
            let args = self.read_args(cursor, op.args())?;

            self.vm.condition = true;
            self.vm.script_return = 0;
            self.execute_op(op, &args)?;

            if self.vm.script_return != 0 {
                return Ok(self.vm.script_return);
            }
            if self.vm.condition == flag {
                return Ok(0);
            }
        }
    }

    fn execute_op(&mut self, op: ScriptOp, args: &[i16]) -> EngineResult<()> {
        match op.group() {
            OpGroup::Object => self.execute_object_op(op, args),
            OpGroup::Math => self.execute_math_op(op, args),
            OpGroup::Flow => self.execute_flow_op(op, args),
            OpGroup::Display => self.execute_display_op(op, args),
        }
    }

    fn should_run_line(&self, sub: &Subroutine, line: usize) -> bool {
        match sub.lines[line].key {
            Some(key) if sub.is_verb_subroutine() => {
                key.matches(self.vm.verb, self.vm.noun1, self.vm.noun2)
            }
            _ => true,
        }
    }

    /// Run the lines of `sub` that match the current parse
    ///
    /// Lines run in order until one returns non-zero. A rescan return yields
    /// to the frame pump once and starts over from the first line.
    pub fn start_subroutine(&mut self, sub: Rc<Subroutine>) -> EngineResult<i16> {
        if self.vm.depth >= MAX_RECURSION {
            return Err(EngineError::RecursionLimit(MAX_RECURSION));
        }
        self.vm.depth += 1;
        debug!("start_subroutine {} (depth {})", sub.id, self.vm.depth);

        let mut result = 0;
        let mut line = 0;
        while line < sub.lines.len() {
            if self.should_run_line(&sub, line) {
                let mut cursor = ScriptCursor::new(Rc::clone(&sub.lines[line].code));
                result = self.run_script(&mut cursor)?;
                if result == RESCAN {
                    debug!("subroutine {} rescans", sub.id);
                    self.delay(0)?;
                    line = 0;
                    continue;
                }
                if result != 0 {
                    break;
                }
            }
            line += 1;
        }

        self.vm.depth -= 1;
        Ok(result)
    }

    /// Look a subroutine up and run it; a missing one is skipped
    pub fn start_subroutine_by_id(&mut self, id: u16) -> EngineResult<Option<i16>> {
        match self.pager.get_subroutine(id, self.res.as_mut())? {
            Some(sub) => Ok(Some(self.start_subroutine(sub)?)),
            None => {
                warn!("subroutine {} not found", id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GameBuilder;
    use crate::config::GameVariant;
    use test_log::test;

    #[test]
    fn test_var_or_word_reads_variables() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        engine.vm.variables[7] = 123;
        let code: Rc<[u8]> = vec![0x75, 0x37, 0x00, 0x05].into();
        let mut cursor = ScriptCursor::new(code);
        // 30007
        assert_eq!(engine.get_var_or_word(&mut cursor).unwrap(), 123);
        assert_eq!(engine.get_var_or_word(&mut cursor).unwrap(), 5);
    }

    #[test]
    fn test_var_or_byte_escape() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        engine.vm.variables[3] = -4;
        let code: Rc<[u8]> = vec![0xFF, 3, 9].into();
        let mut cursor = ScriptCursor::new(code);
        assert_eq!(engine.get_var_or_byte(&mut cursor).unwrap(), -4);
        assert_eq!(engine.get_var_or_byte(&mut cursor).unwrap(), 9);
    }

    #[test]
    fn test_item_sentinels() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        engine.vm.subject_item = 4;
        engine.vm.object_item = 5;
        let words: Vec<u8> = [-1i16, -3, -5, -7, 9]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect();
        let mut cursor = ScriptCursor::new(words.into());
        let got: Vec<ItemId> = (0..5)
            .map(|_| engine.get_next_item(&mut cursor).unwrap())
            .collect();
        assert_eq!(got, vec![4, 5, PLAYER_ITEM, NULL_ITEM, 9]);
    }

    #[test]
    fn test_variable_bounds() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        assert!(engine.write_variable(255, 1).is_ok());
        assert!(matches!(
            engine.read_variable(255),
            Err(EngineError::BadVariable(255))
        ));
        assert!(matches!(
            engine.write_variable(256, 1),
            Err(EngineError::BadVariable(256))
        ));
    }

    #[test]
    fn test_gap_and_out_of_range_opcodes_are_fatal() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        let mut gap = ScriptCursor::new(vec![3u8, 0xFF].into());
        assert!(matches!(
            engine.run_script(&mut gap),
            Err(EngineError::UnregisteredOpcode(VmKind::Script, 3))
        ));

        let mut engine = GameBuilder::new(GameVariant::Elvira1).engine();
        let mut past = ScriptCursor::new(vec![0x01, 0x2C, 0x27, 0x10].into());
        assert!(matches!(
            engine.run_script(&mut past),
            Err(EngineError::InvalidOpcode(VmKind::Script, 300))
        ));
    }

    #[test]
    fn test_return_1_stops_lines() {
        let mut engine = GameBuilder::new(GameVariant::Simon1).engine();
        engine.vm.return_1 = true;
        // let v1 = 5
        let mut cursor = ScriptCursor::new(vec![42u8, 1, 0, 5, 0xFF].into());
        assert_eq!(engine.run_script(&mut cursor).unwrap(), 1);
        assert_eq!(engine.vm.variables[1], 0);
    }
}
