//! Text listings of script subroutines and VGA scripts
//!
//! Used by the `--dump-subroutines` and `--dump-vga` flags of the binary.

use crate::config::GameVariant;
use crate::error::{EngineError, EngineResult, VmKind};
use crate::opcode_tables::{vga_opcode_name, vga_param_lengths, OpcodeTable};
use crate::reader::ByteReader;
use crate::subroutine::Subroutine;
use crate::zone::Zone;
use std::fmt::Write;

/// Upper bound on instructions listed from one VGA entry point
const MAX_VGA_INSTRUCTIONS: usize = 500;

fn format_arg(r: &mut ByteReader, kind: u8, game: GameVariant) -> EngineResult<String> {
    if game.word_opcodes() || !matches!(kind, b'B' | b'F') {
        let w = r.read_u16()?;
        return Ok(match kind {
            b'W' | b'B' | b'F' if (30000..30512).contains(&w) => format!("v{}", w - 30000),
            b'I' => format!("item({})", w as i16),
            b'T' => format!("str{}", w),
            _ => format!("{}", w as i16),
        });
    }
    Ok(match r.read_u8()? {
        0xFF => format!("v{}", r.read_u8()?),
        b => format!("{}", b),
    })
}

/// Decode one line of script code into `out`, one opcode per row
pub fn dump_line(out: &mut String, code: &[u8], game: GameVariant) -> EngineResult<()> {
    let table = OpcodeTable::for_game(game);
    let mut r = ByteReader::new(code);
    let mut invert = false;
    while !r.is_empty() {
        let pos = r.pos();
        let opcode = if game.word_opcodes() {
            r.read_u16()?
        } else {
            r.read_u8()? as u16
        };
        if opcode == game.line_terminator() {
            break;
        }
        if opcode == game.invert_prefix() {
            invert = true;
            continue;
        }
        let op = table
            .entry(opcode)
            .ok_or(EngineError::UnregisteredOpcode(VmKind::Script, opcode))?;
        let mut args = Vec::new();
        for kind in op.args().bytes() {
            args.push(format_arg(&mut r, kind, game)?);
        }
        let _ = writeln!(
            out,
            "    {:04x}: {}{} {}",
            pos,
            if invert { "!" } else { "" },
            op.name(),
            args.join(", ")
        );
        invert = false;
    }
    Ok(())
}

/// List every line of a subroutine
pub fn dump_subroutine(sub: &Subroutine, game: GameVariant) -> EngineResult<String> {
    let mut out = String::new();
    let _ = writeln!(out, "subroutine {} ({} lines)", sub.id, sub.lines.len());
    for (n, line) in sub.lines.iter().enumerate() {
        match line.key {
            Some(key) => {
                let _ = writeln!(
                    out,
                    "  line {} [verb {} nouns {} {}]",
                    n, key.verb, key.noun1, key.noun2
                );
            }
            None => {
                let _ = writeln!(out, "  line {}", n);
            }
        }
        dump_line(&mut out, &line.code, game)?;
    }
    Ok(out)
}

/// List the VGA script starting at `pos` up to its return
pub fn dump_vga_script(zone: &Zone, pos: usize, game: GameVariant) -> EngineResult<String> {
    let le = game.little_endian();
    let word_opcodes = game.vga_word_opcodes();
    let params = vga_param_lengths(game);
    let mut r = ByteReader::with_order(&zone.script, le).at(pos);
    let mut out = String::new();
    for _ in 0..MAX_VGA_INSTRUCTIONS {
        let at = r.pos();
        let opcode = if word_opcodes {
            r.read_u16()?
        } else {
            r.read_u8()? as u16
        };
        let len = *params
            .get(opcode as usize)
            .ok_or(EngineError::InvalidOpcode(VmKind::Vga, opcode))? as usize;
        let mut operands = Vec::new();
        if opcode == 17 {
            // path table: a slot, then x/y pairs up to the end marker
            let end = if game.eight_bit_images() { 9999 } else { 999 };
            operands.push(r.read_u16()?.to_string());
            loop {
                let x = r.read_u16()?;
                if x == end {
                    break;
                }
                operands.push(format!("({},{})", x, r.read_u16()?));
            }
        } else if word_opcodes && len % 2 == 0 {
            for _ in 0..len / 2 {
                operands.push((r.read_u16()? as i16).to_string());
            }
        } else {
            for b in r.read_bytes(len)? {
                operands.push(format!("{:02x}", b));
            }
        }
        let _ = writeln!(
            out,
            "  {:04x}: vc{:<2} {:<20} {}",
            at,
            opcode,
            vga_opcode_name(opcode),
            operands.join(" ")
        );
        if opcode == 0 {
            break;
        }
    }
    Ok(out)
}

/// List every image script and animation of a zone
pub fn dump_zone(zone: &Zone, game: GameVariant) -> EngineResult<String> {
    let mut out = String::new();
    let _ = writeln!(out, "zone {}", zone.number);
    for id in zone.image_script_ids()? {
        if let Some(pos) = zone.image_script(id)? {
            let _ = writeln!(out, "image script {} at {:04x}", id, pos);
            out.push_str(&dump_vga_script(zone, pos, game)?);
        }
    }
    for id in zone.animation_ids()? {
        if let Some(pos) = zone.animation_script(id)? {
            let _ = writeln!(out, "animation {} at {:04x}", id, pos);
            out.push_str(&dump_vga_script(zone, pos, game)?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ScriptBuilder, ZoneBuilder};
    use crate::opcode_tables::ScriptOp;
    use crate::subroutine::SubroutineLine;
    use test_log::test;

    #[test]
    fn test_line_listing() {
        let code = ScriptBuilder::new(GameVariant::Simon1)
            .not()
            .op(ScriptOp::Eq, &[4, 2])
            .op(ScriptOp::Message, &[17])
            .build();
        let mut sub = Subroutine::new(9);
        sub.insert_line(0, SubroutineLine {
            key: None,
            code: code.into(),
        });
        let text = dump_subroutine(&sub, GameVariant::Simon1).unwrap();
        assert!(text.contains("subroutine 9"));
        assert!(text.contains("!eq 4, 2"), "{}", text);
        assert!(text.contains("message str17"), "{}", text);
    }

    #[test]
    fn test_vga_listing_stops_at_return() {
        let code: Vec<u8> = [39u16, 5, 7, 0, 39, 1, 1]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect();
        let mut zb = ZoneBuilder::new(1, false);
        zb.animation(101, &code);
        let (script, images) = zb.build();
        let zone = Zone::parse(1, script, images, false).unwrap();
        let text = dump_zone(&zone, GameVariant::Simon1).unwrap();
        assert!(text.contains("animation 101"));
        assert_eq!(text.matches("vc39").count(), 1);
        assert!(text.contains("vc0"));
    }
}
