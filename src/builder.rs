//! In-memory game construction
//!
//! Builds the resource files of a small game (database, table files, VGA
//! zones) in their on-disk formats and boots an engine on them, usually
//! with a headless host. Used by the unit tests, the integration tests and the
//! `--demo` mode of the binary.
//!
//! The builders panic on input they cannot encode; they only ever see
//! fixtures written by hand.

use crate::config::{EngineConfig, GameVariant};
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::gamepc::{item_to_ref, DATABASE_FILE, PREDEFINED_ITEMS, RUNTIME_VERSION};
use crate::host::{HeadlessHost, Host};
use crate::item::{ItemId, ObjectFlags, SubBlock, NULL_ITEM, PLAYER_ITEM};
use crate::opcode_tables::{OpcodeTable, ScriptOp};
use crate::resources::{vga_file_name, MemoryFiles};
use crate::rle::encode_columns;
use crate::sound::{RecordingSound, SoundDriver};
use crate::subroutine::LineKey;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use log::debug;
use std::path::Path;

/// Encodes one subroutine line for a game variant
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    game: GameVariant,
    table: &'static OpcodeTable,
    code: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new(game: GameVariant) -> Self {
        ScriptBuilder {
            game,
            table: OpcodeTable::for_game(game),
            code: Vec::new(),
        }
    }

    fn push_opcode(&mut self, opcode: u16) {
        if self.game.word_opcodes() {
            self.code.extend_from_slice(&opcode.to_be_bytes());
        } else {
            self.code.push(opcode as u8);
        }
    }

    /// Append `op` with its arguments encoded per its signature
    pub fn op(mut self, op: ScriptOp, args: &[i16]) -> Self {
        let opcode = match self.table.opcode_of(op) {
            Some(opcode) => opcode,
            None => panic!("{} has no {} opcode", self.game, op.name()),
        };
        let signature = op.args();
        assert_eq!(
            signature.len(),
            args.len(),
            "{} takes {} arguments",
            op.name(),
            signature.len()
        );
        self.push_opcode(opcode);
        let word_args = self.game.word_opcodes();
        for (kind, &value) in signature.bytes().zip(args) {
            match kind {
                b'B' | b'F' if !word_args => {
                    assert!(
                        (0..0xFF).contains(&value),
                        "byte argument {} out of range",
                        value
                    );
                    self.code.push(value as u8);
                }
                _ => self.code.extend_from_slice(&value.to_be_bytes()),
            }
        }
        self
    }

    /// Invert the sense of the next condition
    pub fn not(mut self) -> Self {
        let prefix = self.game.invert_prefix();
        self.push_opcode(prefix);
        self
    }

    /// Finish the line with the variant's terminator
    pub fn build(mut self) -> Vec<u8> {
        let terminator = self.game.line_terminator();
        self.push_opcode(terminator);
        self.code
    }
}

#[derive(Debug, Clone)]
struct ItemSpec {
    adjective: i16,
    noun: i16,
    state: i16,
    parent: ItemId,
    class_flags: u32,
    blocks: Vec<SubBlock>,
}

type Lines = Vec<(Option<LineKey>, Vec<u8>)>;

fn write_item_ref(out: &mut Vec<u8>, id: ItemId) {
    let _ = out.write_u32::<BigEndian>(item_to_ref(id));
}

fn write_sub_block(out: &mut Vec<u8>, block: &SubBlock) {
    let _ = out.write_u16::<BigEndian>(block.kind() as u16);
    match block {
        SubBlock::Room {
            subroutine,
            exit_states,
            exits,
        } => {
            let _ = out.write_u16::<BigEndian>(*subroutine);
            let _ = out.write_u16::<BigEndian>(*exit_states);
            for &exit in exits {
                write_item_ref(out, exit);
            }
        }
        SubBlock::Object { name, flags, props } => {
            let _ = out.write_u32::<BigEndian>(flags.bits());
            let mut values = props.iter();
            for bit in 0..16 {
                let prop = ObjectFlags::from_bits_truncate(1 << bit);
                if prop.is_empty() || !flags.contains(prop) {
                    continue;
                }
                let value = values.next().copied().unwrap_or(0);
                if prop == ObjectFlags::TEXT {
                    let _ = out.write_u32::<BigEndian>(*name as u32);
                } else {
                    let _ = out.write_i16::<BigEndian>(value);
                }
            }
        }
        SubBlock::Player {
            strength,
            weight,
            score,
            level,
        } => {
            for v in [strength, weight, score, level] {
                let _ = out.write_i16::<BigEndian>(*v);
            }
        }
        SubBlock::SuperRoom {
            subroutine,
            x,
            y,
            z,
            exits,
        } => {
            for v in [subroutine, x, y, z] {
                let _ = out.write_u16::<BigEndian>(*v);
            }
            for &exit in exits {
                let _ = out.write_u16::<BigEndian>(exit);
            }
        }
        SubBlock::Container { volume, flags } => {
            let _ = out.write_i16::<BigEndian>(*volume);
            let _ = out.write_u16::<BigEndian>(*flags);
        }
        SubBlock::Chain { item } | SubBlock::Inherit { item } => write_item_ref(out, *item),
        SubBlock::UserFlag(values) => {
            for &v in values {
                let _ = out.write_i16::<BigEndian>(v);
            }
        }
    }
}

/// Append one subroutine: a zero word, its id, then its lines
fn write_subroutine(out: &mut Vec<u8>, id: u16, lines: &Lines) {
    let _ = out.write_u16::<BigEndian>(0);
    let _ = out.write_u16::<BigEndian>(id);
    for (key, code) in lines {
        let _ = out.write_u16::<BigEndian>(0);
        if id == 0 {
            let key = key.unwrap_or(LineKey::new(-2, -2, -2));
            for v in [key.verb, key.noun1, key.noun2] {
                let _ = out.write_i16::<BigEndian>(v);
            }
        }
        out.extend_from_slice(code);
    }
    let _ = out.write_u16::<BigEndian>(1);
}

fn write_subroutine_block(out: &mut Vec<u8>, subs: &[(u16, Lines)]) {
    for (id, lines) in subs {
        write_subroutine(out, *id, lines);
    }
    let _ = out.write_u16::<BigEndian>(1);
}

/// Builds a game database plus whatever resources the test needs
pub struct GameBuilder {
    game: GameVariant,
    config: EngineConfig,
    items: Vec<ItemSpec>,
    player_room: ItemId,
    strings: Vec<String>,
    subroutines: Vec<(u16, Lines)>,
    table_files: Vec<(String, Vec<(u16, u16)>)>,
    files: MemoryFiles,
}

impl GameBuilder {
    pub fn new(game: GameVariant) -> Self {
        let config = EngineConfig {
            game,
            seed: Some(1),
            ..EngineConfig::default()
        };
        GameBuilder {
            game,
            config,
            items: Vec::new(),
            player_room: NULL_ITEM,
            strings: Vec::new(),
            subroutines: Vec::new(),
            table_files: Vec::new(),
            files: MemoryFiles::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn save_dir(&mut self, dir: &Path) {
        self.config.save_dir = dir.to_path_buf();
    }

    fn add_item(&mut self, spec: ItemSpec) -> ItemId {
        self.items.push(spec);
        (self.items.len() - 1 + PREDEFINED_ITEMS) as ItemId
    }

    fn spec_mut(&mut self, id: ItemId) -> &mut ItemSpec {
        let index = (id as usize)
            .checked_sub(PREDEFINED_ITEMS)
            .filter(|&i| i < self.items.len());
        match index {
            Some(i) => &mut self.items[i],
            None => panic!("item {} was not built here", id),
        }
    }

    /// A room whose entry subroutine is `subroutine`
    pub fn room(&mut self, subroutine: u16) -> ItemId {
        self.add_item(ItemSpec {
            adjective: -1,
            noun: -1,
            state: 0,
            parent: NULL_ITEM,
            class_flags: 0,
            blocks: vec![SubBlock::Room {
                subroutine,
                exit_states: 0,
                exits: [NULL_ITEM; 6],
            }],
        })
    }

    /// An object inside `parent`; every property named in `flags` starts at 0
    pub fn object(
        &mut self,
        parent: ItemId,
        noun: i16,
        adjective: i16,
        flags: ObjectFlags,
    ) -> ItemId {
        let count = (flags & !ObjectFlags::MARKS).bits().count_ones() as usize;
        self.add_item(ItemSpec {
            adjective,
            noun,
            state: 0,
            parent,
            class_flags: 0,
            blocks: vec![SubBlock::Object {
                name: 0,
                flags,
                props: vec![0; count],
            }],
        })
    }

    /// An object that can hold `volume` worth of other items
    pub fn container(&mut self, parent: ItemId, noun: i16, volume: i16) -> ItemId {
        let id = self.object(parent, noun, -1, ObjectFlags::SIZE | ObjectFlags::VOLUME);
        self.prop(id, ObjectFlags::VOLUME, volume);
        self.spec_mut(id).blocks.push(SubBlock::Container { volume, flags: 0 });
        id
    }

    /// Set one object property declared at creation
    pub fn prop(&mut self, id: ItemId, prop: ObjectFlags, value: i16) {
        for block in self.spec_mut(id).blocks.iter_mut() {
            if let SubBlock::Object { flags, props, .. } = block {
                if flags.contains(prop) {
                    let at = crate::item::prop_index(*flags, prop);
                    props[at] = value;
                    return;
                }
            }
        }
        panic!("item {} has no property {:?}", id, prop);
    }

    pub fn noun(&mut self, id: ItemId, noun: i16, adjective: i16) {
        let spec = self.spec_mut(id);
        spec.noun = noun;
        spec.adjective = adjective;
    }

    pub fn state(&mut self, id: ItemId, state: i16) {
        self.spec_mut(id).state = state;
    }

    pub fn player_in(&mut self, room: ItemId) {
        self.player_room = room;
    }

    /// Add a global string; returns its id
    pub fn string(&mut self, text: &str) -> u16 {
        self.strings.push(text.to_string());
        (self.strings.len() - 1) as u16
    }

    /// A resident subroutine made of the given encoded lines
    pub fn subroutine(&mut self, id: u16, lines: &[Vec<u8>]) {
        let lines = lines.iter().map(|l| (None, l.clone())).collect();
        self.subroutines.push((id, lines));
    }

    /// Append a line to the verb subroutine (id 0)
    pub fn verb_line(&mut self, verb: i16, noun1: i16, noun2: i16, code: Vec<u8>) {
        let key = Some(LineKey::new(verb, noun1, noun2));
        match self.subroutines.iter_mut().find(|(id, _)| *id == 0) {
            Some((_, lines)) => lines.push((key, code)),
            None => self.subroutines.push((0, vec![(key, code)])),
        }
    }

    /// A pageable tables file holding `subs`, listed in `TBLLIST`
    pub fn table_file(&mut self, number: usize, subs: &[(u16, Vec<Vec<u8>>)]) {
        let name = format!("TABLES{:02}", number);
        let mut data = Vec::new();
        let block: Vec<(u16, Lines)> = subs
            .iter()
            .map(|(id, lines)| (*id, lines.iter().map(|l| (None, l.clone())).collect()))
            .collect();
        write_subroutine_block(&mut data, &block);
        let ranges = subs.iter().map(|(id, _)| (*id, *id)).collect();
        self.files.insert(&name, data);
        self.table_files.push((name, ranges));
    }

    pub fn file(&mut self, name: &str, data: Vec<u8>) {
        self.files.insert(name, data);
    }

    pub fn zone(&mut self, zone: ZoneBuilder) {
        let number = zone.number;
        let (script, images) = zone.build();
        self.files.insert(&vga_file_name(number, 1), script);
        self.files.insert(&vga_file_name(number, 2), images);
    }

    fn database(&self) -> Vec<u8> {
        let mut text = Vec::new();
        for s in &self.strings {
            text.extend_from_slice(s.as_bytes());
            text.push(0);
        }

        // child lists, newest first like a runtime link
        let count = self.items.len();
        let mut child = vec![NULL_ITEM; count + PREDEFINED_ITEMS];
        let mut next = vec![NULL_ITEM; count + PREDEFINED_ITEMS];
        for (i, spec) in self.items.iter().enumerate() {
            let id = (i + PREDEFINED_ITEMS) as ItemId;
            if spec.parent as usize >= PREDEFINED_ITEMS {
                next[id as usize] = child[spec.parent as usize];
                child[spec.parent as usize] = id;
            }
        }

        let mut out = Vec::new();
        for w in [count as u32, RUNTIME_VERSION, count as u32, self.strings.len() as u32] {
            let _ = out.write_u32::<BigEndian>(w);
        }
        let _ = out.write_u32::<BigEndian>(text.len() as u32);
        out.extend_from_slice(&text);

        for (i, spec) in self.items.iter().enumerate() {
            let id = i + PREDEFINED_ITEMS;
            let parent = if spec.parent as usize >= PREDEFINED_ITEMS {
                spec.parent
            } else {
                NULL_ITEM
            };
            for v in [spec.adjective, spec.noun, spec.state] {
                let _ = out.write_i16::<BigEndian>(v);
            }
            write_item_ref(&mut out, next[id]);
            write_item_ref(&mut out, child[id]);
            write_item_ref(&mut out, parent);
            let _ = out.write_u16::<BigEndian>((spec.class_flags >> 16) as u16);
            let _ = out.write_u16::<BigEndian>(spec.class_flags as u16);
            for block in &spec.blocks {
                write_sub_block(&mut out, block);
            }
            let _ = out.write_u16::<BigEndian>(0);
        }

        write_subroutine_block(&mut out, &self.subroutines);
        out
    }

    fn table_list(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, ranges) in &self.table_files {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            for &(min, max) in ranges {
                let _ = out.write_u16::<BigEndian>(min);
                let _ = out.write_u16::<BigEndian>(max);
            }
            let _ = out.write_u16::<BigEndian>(0);
        }
        out.push(0);
        out
    }

    /// Every resource file of the game
    pub fn files(&self) -> MemoryFiles {
        let mut files = self.files.clone();
        files.insert(DATABASE_FILE, self.database());
        if !self.table_files.is_empty() {
            files.insert("TBLLIST", self.table_list());
        }
        files
    }

    /// Boot an engine on any host and sound driver
    pub fn boot(self, host: Box<dyn Host>, sound: Box<dyn SoundDriver>) -> EngineResult<Engine> {
        debug!(
            "building {} game: {} items, {} subroutines",
            self.game,
            self.items.len(),
            self.subroutines.len()
        );
        let files = self.files();
        let mut engine = Engine::new(
            self.config.clone(),
            Box::new(files),
            host,
            sound,
        )?;
        if self.player_room != NULL_ITEM {
            engine.items.set_item_parent(PLAYER_ITEM, self.player_room)?;
        }
        for (i, spec) in self.items.iter().enumerate() {
            if spec.parent == PLAYER_ITEM {
                let id = (i + PREDEFINED_ITEMS) as ItemId;
                engine.items.set_item_parent(id, PLAYER_ITEM)?;
            }
        }
        Ok(engine)
    }

    /// Boot an engine with the given host and sound handles
    pub fn try_engine_with(
        self,
        host: HeadlessHost,
        sound: RecordingSound,
    ) -> EngineResult<Engine> {
        self.boot(Box::new(host), Box::new(sound))
    }

    pub fn try_engine(self) -> EngineResult<Engine> {
        self.try_engine_with(HeadlessHost::new(), RecordingSound::new())
    }

    /// # Panics
    ///
    /// If the built game does not load.
    pub fn engine(self) -> Engine {
        match self.try_engine() {
            Ok(engine) => engine,
            Err(e) => panic!("built game failed to load: {}", e),
        }
    }

    /// The engine plus handles on its host and sound driver
    ///
    /// # Panics
    ///
    /// If the built game does not load.
    pub fn engine_with_handles(self) -> (Engine, HeadlessHost, RecordingSound) {
        let host = HeadlessHost::new();
        let sound = RecordingSound::new();
        match self.try_engine_with(host.clone(), sound.clone()) {
            Ok(engine) => (engine, host, sound),
            Err(e) => panic!("built game failed to load: {}", e),
        }
    }
}

const HDR2_SIZE: usize = 16;
const TABLE_ENTRY_SIZE: usize = 6;
const IMAGE_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone)]
struct ImageSpec {
    width: usize,
    height: usize,
    compressed: bool,
    data: Vec<u8>,
}

/// Builds the two files of one VGA zone
#[derive(Debug, Clone)]
pub struct ZoneBuilder {
    number: u16,
    little_endian: bool,
    palettes: Vec<u8>,
    image_scripts: Vec<(u16, Vec<u8>)>,
    animations: Vec<(u16, Vec<u8>)>,
    images: Vec<ImageSpec>,
}

impl ZoneBuilder {
    /// `little_endian` selects the Feeble Files layout, with 8-bit images
    pub fn new(number: u16, little_endian: bool) -> Self {
        ZoneBuilder {
            number,
            little_endian,
            palettes: Vec::new(),
            image_scripts: Vec::new(),
            animations: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Append a palette of 6-bit RGB triples
    pub fn palette(&mut self, colors: &[[u8; 3]]) {
        for rgb in colors {
            self.palettes.extend_from_slice(rgb);
        }
    }

    pub fn image_script(&mut self, id: u16, code: &[u8]) {
        self.image_scripts.push((id, code.to_vec()));
    }

    pub fn animation(&mut self, id: u16, code: &[u8]) {
        self.animations.push((id, code.to_vec()));
    }

    /// Add an image from one color index per pixel, row-major; returns its
    /// number
    ///
    /// Four-bit zones pack two pixels per byte, high nibble first.
    /// Compressed images are run-length coded column by column.
    pub fn image(&mut self, width: usize, height: usize, pixels: &[u8], compress: bool) -> u16 {
        assert_eq!(pixels.len(), width * height, "pixel count");
        let (columns, bytes) = if self.little_endian {
            (width, pixels.to_vec())
        } else {
            let row_bytes = (width + 1) / 2;
            let mut packed = Vec::with_capacity(row_bytes * height);
            for row in pixels.chunks(width) {
                for pair in row.chunks(2) {
                    let lo = pair.get(1).copied().unwrap_or(0);
                    packed.push((pair[0] << 4) | (lo & 0x0F));
                }
            }
            (row_bytes, packed)
        };
        let data = if compress {
            encode_columns(&bytes, columns, height)
        } else {
            bytes
        };
        self.images.push(ImageSpec {
            width,
            height,
            compressed: compress,
            data,
        });
        (self.images.len() - 1) as u16
    }

    /// Add a wide scrolling background: a table of strip offsets, then each
    /// 8-pixel strip run-length coded
    pub fn scroll_image(&mut self, width: usize, height: usize, pixels: &[u8]) -> u16 {
        assert_eq!(pixels.len(), width * height, "pixel count");
        let strips: Vec<Vec<u8>> = (0..width / 8)
            .map(|s| {
                let mut strip = Vec::with_capacity(8 * height);
                for row in pixels.chunks(width) {
                    strip.extend_from_slice(&row[s * 8..s * 8 + 8]);
                }
                encode_columns(&strip, 8, height)
            })
            .collect();
        let mut data = vec![0u8; strips.len() * 4];
        let mut at = data.len();
        for (i, strip) in strips.iter().enumerate() {
            let entry = &mut data[i * 4..i * 4 + 4];
            let offset = (at - i * 4) as u32;
            if self.little_endian {
                LittleEndian::write_u32(entry, offset);
            } else {
                BigEndian::write_u32(entry, offset);
            }
            at += strip.len();
        }
        for strip in &strips {
            data.extend_from_slice(strip);
        }
        self.images.push(ImageSpec {
            width,
            height,
            compressed: true,
            data,
        });
        (self.images.len() - 1) as u16
    }

    fn put_u16(&self, out: &mut Vec<u8>, v: u16) {
        let _ = if self.little_endian {
            out.write_u16::<LittleEndian>(v)
        } else {
            out.write_u16::<BigEndian>(v)
        };
    }

    fn put_u32(&self, out: &mut Vec<u8>, v: u32) {
        let _ = if self.little_endian {
            out.write_u32::<LittleEndian>(v)
        } else {
            out.write_u32::<BigEndian>(v)
        };
    }

    /// The script file and the image file
    pub fn build(&self) -> (Vec<u8>, Vec<u8>) {
        let hdr2 = 6 + self.palettes.len();
        let image_table = hdr2 + HDR2_SIZE;
        let anim_table = image_table + self.image_scripts.len() * TABLE_ENTRY_SIZE;
        let mut code_at = anim_table + self.animations.len() * TABLE_ENTRY_SIZE;

        let mut script = Vec::new();
        self.put_u16(&mut script, 0);
        self.put_u16(&mut script, 0);
        self.put_u16(&mut script, hdr2 as u16);
        script.extend_from_slice(&self.palettes);
        for v in [
            0,
            self.image_scripts.len() as u16,
            0,
            self.animations.len() as u16,
            0,
            image_table as u16,
            0,
            anim_table as u16,
        ] {
            self.put_u16(&mut script, v);
        }
        for (id, code) in self.image_scripts.iter().chain(&self.animations) {
            self.put_u16(&mut script, *id);
            self.put_u16(&mut script, 0);
            self.put_u16(&mut script, code_at as u16);
            code_at += code.len();
        }
        for (_, code) in self.image_scripts.iter().chain(&self.animations) {
            script.extend_from_slice(code);
        }

        let mut images = Vec::new();
        let mut data_at = self.images.len() * IMAGE_HEADER_SIZE;
        for img in &self.images {
            self.put_u32(&mut images, data_at as u32);
            if self.little_endian {
                let mut height = img.height as u16 & 0x7FFF;
                if img.compressed {
                    height |= 0x8000;
                }
                self.put_u16(&mut images, height);
            } else {
                images.push(if img.compressed { 0x80 } else { 0 });
                images.push(img.height as u8);
            }
            self.put_u16(&mut images, img.width as u16);
            data_at += img.data.len();
        }
        for img in &self.images {
            images.extend_from_slice(&img.data);
        }
        (script, images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::SubBlockKind;
    use test_log::test;

    #[test]
    fn test_script_line_encoding_per_variant() {
        let simon = ScriptBuilder::new(GameVariant::Simon1)
            .op(ScriptOp::Let, &[3, 500])
            .build();
        let let_op = OpcodeTable::for_game(GameVariant::Simon1)
            .opcode_of(ScriptOp::Let)
            .unwrap() as u8;
        assert_eq!(simon, vec![let_op, 3, 0x01, 0xF4, 0xFF]);

        let elvira = ScriptBuilder::new(GameVariant::Elvira1)
            .op(ScriptOp::Let, &[3, 500])
            .build();
        assert_eq!(elvira.len(), 8);
        assert_eq!(&elvira[6..], &10000u16.to_be_bytes());
    }

    #[test]
    fn test_database_round_trip() {
        let mut b = GameBuilder::new(GameVariant::Simon1);
        let room = b.room(7);
        let lamp = b.object(room, 12, 3, ObjectFlags::WEIGHT);
        b.prop(lamp, ObjectFlags::WEIGHT, 4);
        let bag = b.container(PLAYER_ITEM, 13, 20);
        b.player_in(room);
        b.string("hello");
        let engine = b.engine();

        assert_eq!(engine.items.get(lamp).unwrap().noun, 12);
        assert_eq!(engine.items.weight_of(lamp), 4);
        assert!(engine.items.get(bag).unwrap().has_sub(SubBlockKind::Container));
        assert_eq!(engine.items.children(PLAYER_ITEM), vec![bag]);
        assert!(engine.items.children(room).contains(&PLAYER_ITEM));
        assert!(engine.items.children(room).contains(&lamp));
    }

    #[test]
    fn test_zone_layout_in_both_byte_orders() {
        for le in [false, true] {
            let mut zb = ZoneBuilder::new(2, le);
            zb.animation(201, &[1, 2, 3]);
            let n = zb.image(3, 2, &[1, 2, 3, 4, 5, 6], true);
            let (script, images) = zb.build();
            let zone = crate::zone::Zone::parse(2, script, images, le).unwrap();
            let pos = zone.animation_script(201).unwrap().unwrap();
            assert_eq!(&zone.script[pos..pos + 3], &[1, 2, 3]);
            let header = zone.image_header(n).unwrap();
            assert_eq!((header.width, header.height), (3, 2));
            assert!(header.compressed);
        }
    }
}
