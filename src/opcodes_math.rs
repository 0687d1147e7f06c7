/// Variable, arithmetic and bit-flag opcodes
///
/// Variables are signed 16-bit and arithmetic wraps. The `F` forms take two
/// variable indices; the others take a variable index and a value.
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::opcode_tables::ScriptOp;
use log::debug;

impl Engine {
    fn var_pair(&self, args: &[i16]) -> EngineResult<(i16, i16)> {
        Ok((
            self.read_variable(args[0] as u16 as usize)?,
            self.read_variable(args[1] as u16 as usize)?,
        ))
    }

    fn store(&mut self, index: i16, value: i16) -> EngineResult<()> {
        self.write_variable(index as u16 as usize, value)
    }

    /// Handle variable and arithmetic opcodes
    pub fn execute_math_op(&mut self, op: ScriptOp, args: &[i16]) -> EngineResult<()> {
        debug!("{} {:?}", op.name(), args);
        match op {
            // ---- conditions ----
            ScriptOp::Zero => {
                self.vm.condition = self.read_variable(args[0] as u16 as usize)? == 0;
            }
            ScriptOp::NotZero => {
                self.vm.condition = self.read_variable(args[0] as u16 as usize)? != 0;
            }
            ScriptOp::Eq | ScriptOp::NotEq | ScriptOp::Gt | ScriptOp::Lt => {
                let a = self.read_variable(args[0] as u16 as usize)?;
                let b = args[1];
                self.vm.condition = match op {
                    ScriptOp::Eq => a == b,
                    ScriptOp::NotEq => a != b,
                    ScriptOp::Gt => a > b,
                    _ => a < b,
                };
            }
            ScriptOp::EqF | ScriptOp::NotEqF | ScriptOp::LtF | ScriptOp::GtF => {
                let (a, b) = self.var_pair(args)?;
                self.vm.condition = match op {
                    ScriptOp::EqF => a == b,
                    ScriptOp::NotEqF => a != b,
                    ScriptOp::LtF => a < b,
                    _ => a > b,
                };
            }
            ScriptOp::Chance => {
                let a = args[0];
                self.vm.condition = match a {
                    0 => false,
                    100 => true,
                    _ => (self.rng.rnd(99) as i16) < a,
                };
            }
            ScriptOp::BitTest => {
                self.vm.condition = self.vm.bit(args[0] as u16 as usize);
            }

            // ---- assignment ----
            ScriptOp::CopyFF => {
                let value = self.read_variable(args[0] as u16 as usize)?;
                self.store(args[1], value)?;
            }
            ScriptOp::Clear => self.store(args[0], 0)?,
            ScriptOp::Let => self.store(args[0], args[1])?,
            ScriptOp::Random => {
                let range = args[1];
                let value = if range > 1 {
                    self.rng.rnd(range as u16 - 1) as i16
                } else {
                    0
                };
                self.store(args[0], value)?;
            }
            ScriptOp::Inc => {
                let value = self.read_variable(args[0] as u16 as usize)?;
                if value != -1 {
                    self.store(args[0], value.wrapping_add(1))?;
                }
            }
            ScriptOp::Dec => {
                let value = self.read_variable(args[0] as u16 as usize)?;
                if value != 0 {
                    self.store(args[0], value.wrapping_sub(1))?;
                }
            }

            // ---- arithmetic ----
            ScriptOp::Add
            | ScriptOp::Sub
            | ScriptOp::Mul
            | ScriptOp::Div
            | ScriptOp::Mod
            | ScriptOp::AddF
            | ScriptOp::SubF
            | ScriptOp::MulF
            | ScriptOp::DivF
            | ScriptOp::ModF => {
                let a = self.read_variable(args[0] as u16 as usize)?;
                let b = match op {
                    ScriptOp::AddF
                    | ScriptOp::SubF
                    | ScriptOp::MulF
                    | ScriptOp::DivF
                    | ScriptOp::ModF => self.read_variable(args[1] as u16 as usize)?,
                    _ => args[1],
                };
                let result = match op {
                    ScriptOp::Add | ScriptOp::AddF => a.wrapping_add(b),
                    ScriptOp::Sub | ScriptOp::SubF => a.wrapping_sub(b),
                    ScriptOp::Mul | ScriptOp::MulF => a.wrapping_mul(b),
                    ScriptOp::Div | ScriptOp::DivF => {
                        if b == 0 {
                            return Err(EngineError::DivisionByZero);
                        }
                        a.wrapping_div(b)
                    }
                    _ => {
                        if b == 0 {
                            return Err(EngineError::DivisionByZero);
                        }
                        a.wrapping_rem(b)
                    }
                };
                self.store(args[0], result)?;
            }

            // ---- bit flags ----
            ScriptOp::BitClear => self.vm.set_bit(args[0] as u16 as usize, false),
            ScriptOp::BitSet => self.vm.set_bit(args[0] as u16 as usize, true),

            _ => {
                return Err(EngineError::UnregisteredOpcode(
                    crate::error::VmKind::Script,
                    self.opcodes.opcode_of(op).unwrap_or(0),
                ))
            }
        }
        Ok(())
    }
}
