//! Subroutines, their lines, and the script code cursor

use crate::config::GameVariant;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::opcode_tables::{OpcodeTable, COMMENT_OPCODE};
use crate::reader::ByteReader;
use log::debug;
use std::rc::Rc;

/// Parser match key carried by lines of the verb subroutine (id 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineKey {
    pub verb: i16,
    pub noun1: i16,
    pub noun2: i16,
}

/// Matches anything
pub const KEY_ANY: i16 = -2;
/// Unset parse slot
pub const KEY_NONE: i16 = -1;

impl LineKey {
    pub fn new(verb: i16, noun1: i16, noun2: i16) -> Self {
        LineKey { verb, noun1, noun2 }
    }

    /// Whether this line should run for the current parse
    ///
    /// `-2` in any slot matches every value. A verb of `-1` marks an idle
    /// line that only runs when nothing at all has been parsed. On a line
    /// with a concrete verb, a noun of `-1` does not constrain that slot.
    pub fn matches(&self, verb: i16, noun1: i16, noun2: i16) -> bool {
        match self.verb {
            KEY_ANY => {}
            KEY_NONE => return verb == KEY_NONE && noun1 == KEY_NONE && noun2 == KEY_NONE,
            v if v != verb => return false,
            _ => {}
        }
        let slot = |key: i16, value: i16| key == KEY_ANY || key == KEY_NONE || key == value;
        slot(self.noun1, noun1) && slot(self.noun2, noun2)
    }
}

#[derive(Debug, Clone)]
pub struct SubroutineLine {
    pub key: Option<LineKey>,
    pub code: Rc<[u8]>,
}

#[derive(Debug, Clone)]
pub struct Subroutine {
    pub id: u16,
    pub lines: Vec<SubroutineLine>,
}

impl Subroutine {
    pub fn new(id: u16) -> Self {
        Subroutine {
            id,
            lines: Vec::new(),
        }
    }

    pub fn is_verb_subroutine(&self) -> bool {
        self.id == 0
    }

    /// Insert a line before position `at`; positions past the end append
    pub fn insert_line(&mut self, at: usize, line: SubroutineLine) {
        let at = at.min(self.lines.len());
        self.lines.insert(at, line);
    }

    /// Bytes this subroutine occupies in a table heap
    pub fn heap_size(&self) -> usize {
        let per_line = if self.is_verb_subroutine() { 8 } else { 2 };
        6 + self
            .lines
            .iter()
            .map(|l| per_line + l.code.len())
            .sum::<usize>()
    }
}

/// Read position inside one line's code
#[derive(Debug, Clone)]
pub struct ScriptCursor {
    code: Rc<[u8]>,
    pos: usize,
}

impl ScriptCursor {
    pub fn new(code: Rc<[u8]>) -> Self {
        ScriptCursor { code, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.code.len()
    }

    pub fn read_u8(&mut self) -> EngineResult<u8> {
        let b = *self.code.get(self.pos).ok_or(EngineError::CodeOverrun(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_word(&mut self) -> EngineResult<i16> {
        let hi = self.read_u8()? as u16;
        let lo = self.read_u8()? as u16;
        Ok(((hi << 8) | lo) as i16)
    }
}

fn copy_arg(
    r: &mut ByteReader,
    out: &mut Vec<u8>,
    kind: u8,
    game: GameVariant,
) -> EngineResult<()> {
    match kind {
        b'B' | b'F' if !game.word_opcodes() => {
            let b = r.read_u8()?;
            out.push(b);
            if b == 0xFF {
                out.push(r.read_u8()?);
            }
        }
        b'B' | b'F' | b'N' | b'I' | b'S' | b'T' | b'W' => {
            out.extend_from_slice(&r.read_u16()?.to_be_bytes());
        }
        other => {
            return Err(EngineError::BadResource(format!(
                "bad argument signature '{}'",
                other as char
            )))
        }
    }
    Ok(())
}

/// Copy one line body up to and including its terminator
pub fn read_line_code(
    r: &mut ByteReader,
    table: &OpcodeTable,
    game: GameVariant,
) -> EngineResult<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let opcode = if game.word_opcodes() {
            let w = r.read_u16()?;
            out.extend_from_slice(&w.to_be_bytes());
            w
        } else {
            let b = r.read_u8()?;
            out.push(b);
            b as u16
        };
        if opcode == game.line_terminator() {
            return Ok(out);
        }
        if !game.word_opcodes() && opcode == COMMENT_OPCODE {
            out.pop();
            r.read_u16()?;
            continue;
        }
        if opcode == game.invert_prefix() {
            continue;
        }
        let signature = table
            .signature(opcode)
            .ok_or(EngineError::UnregisteredOpcode(VmKind::Script, opcode))?;
        for kind in signature.bytes() {
            copy_arg(r, &mut out, kind, game)?;
        }
    }
}

/// Read one subroutine's lines; each line is introduced by a zero word
pub fn read_subroutine(
    r: &mut ByteReader,
    id: u16,
    table: &OpcodeTable,
    game: GameVariant,
) -> EngineResult<Subroutine> {
    let mut sub = Subroutine::new(id);
    while r.read_u16()? == 0 {
        let key = if sub.is_verb_subroutine() {
            Some(LineKey::new(r.read_i16()?, r.read_i16()?, r.read_i16()?))
        } else {
            None
        };
        let code = read_line_code(r, table, game)?;
        sub.insert_line(usize::MAX, SubroutineLine {
            key,
            code: code.into(),
        });
    }
    Ok(sub)
}

/// Read a block of subroutines; each is introduced by a zero word
pub fn read_subroutine_block(
    r: &mut ByteReader,
    table: &OpcodeTable,
    game: GameVariant,
) -> EngineResult<Vec<Subroutine>> {
    let mut subs = Vec::new();
    while !r.is_empty() && r.read_u16()? == 0 {
        let id = r.read_u16()?;
        let sub = read_subroutine(r, id, table, game)?;
        debug!("loaded subroutine {} with {} lines", id, sub.lines.len());
        subs.push(sub);
    }
    Ok(subs)
}
