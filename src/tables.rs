//! Subroutine and local string paging
//!
//! Only the subroutines and strings of the current scene are resident. They
//! live in two bump heaps:
//! - the tables heap holds the block from the game database, then (after the
//!   *Org* checkpoint) one paged-in tables file, then (after the *New*
//!   checkpoint) the local strings of one text file;
//! - the extension heap holds one file named by `XTBLLIST`.
//!
//! Paging a tables file rolls the heap back to *Org*, which also drops the
//! local strings. Paging a text file rolls back to *New* only.

use crate::config::{EngineConfig, GameVariant};
use crate::error::{EngineError, EngineResult};
use crate::heap::{Checkpoint, TableHeap};
use crate::opcode_tables::OpcodeTable;
use crate::reader::ByteReader;
use crate::resources::ResourceSource;
use crate::subroutine::{read_subroutine_block, Subroutine};
use crate::text::{split_strings, StringTable, TokenTable};
use log::{debug, info, warn};
use std::rc::Rc;

/// First string id served from a local string file
pub const LOCAL_STRING_BASE: u16 = 0x8000;

/// One entry of `TBLLIST`/`XTBLLIST`: a file and the subroutine ids it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub name: String,
    pub ranges: Vec<(u16, u16)>,
}

impl TableFile {
    pub fn covers(&self, id: u16) -> bool {
        self.ranges.iter().any(|&(min, max)| id >= min && id <= max)
    }
}

fn read_name(r: &mut ByteReader) -> EngineResult<String> {
    Ok(String::from_utf8_lossy(r.read_cstr()?).into_owned())
}

/// Parse a table list; it ends at an empty name
pub fn parse_table_list(data: &[u8]) -> EngineResult<Vec<TableFile>> {
    let mut r = ByteReader::new(data);
    let mut files = Vec::new();
    while !r.is_empty() {
        let name = read_name(&mut r)?;
        if name.is_empty() {
            break;
        }
        let mut ranges = Vec::new();
        loop {
            let min = r.read_u16()?;
            if min == 0 {
                break;
            }
            ranges.push((min, r.read_u16()?));
        }
        files.push(TableFile { name, ranges });
    }
    Ok(files)
}

/// Parse `STRIPPED.TXT`: text file names with the exclusive upper string id
pub fn parse_stripped(data: &[u8]) -> EngineResult<Vec<(String, u16)>> {
    let mut r = ByteReader::new(data);
    let mut entries = Vec::new();
    while !r.is_empty() {
        let name = read_name(&mut r)?;
        if name.is_empty() {
            break;
        }
        entries.push((name, r.read_u16()?));
    }
    Ok(entries)
}

/// Something charged to a table heap
#[derive(Debug, Clone)]
pub enum TableBlock {
    Subroutine(Rc<Subroutine>),
    Strings { first: u16, strings: Vec<Vec<u8>> },
}

pub struct Pager {
    game: GameVariant,
    opcodes: &'static OpcodeTable,
    tables: TableHeap<TableBlock>,
    xtables: TableHeap<TableBlock>,
    org: Checkpoint,
    new: Checkpoint,
    tbl_list: Vec<TableFile>,
    xtbl_list: Vec<TableFile>,
    stripped: Vec<(String, u16)>,
    strings: StringTable,
    tokens: Option<TokenTable>,
}

impl Pager {
    pub fn new(config: &EngineConfig) -> Pager {
        Pager {
            game: config.game,
            opcodes: OpcodeTable::for_game(config.game),
            tables: TableHeap::new("tables heap", config.tables_heap_size),
            xtables: TableHeap::new("extension tables heap", config.xtables_heap_size),
            org: Checkpoint::default(),
            new: Checkpoint::default(),
            tbl_list: Vec::new(),
            xtbl_list: Vec::new(),
            stripped: Vec::new(),
            strings: StringTable::default(),
            tokens: None,
        }
    }

    pub fn set_strings(&mut self, strings: StringTable) {
        self.strings = strings;
    }

    pub fn set_tokens(&mut self, tokens: TokenTable) {
        self.tokens = Some(tokens);
    }

    /// Read the optional list files that drive paging
    pub fn load_lists(&mut self, res: &mut dyn ResourceSource) -> EngineResult<()> {
        if res.exists("TBLLIST") {
            self.tbl_list = parse_table_list(&res.read_file("TBLLIST")?)?;
        }
        if res.exists("XTBLLIST") {
            self.xtbl_list = parse_table_list(&res.read_file("XTBLLIST")?)?;
        }
        if res.exists("STRIPPED.TXT") {
            self.stripped = parse_stripped(&res.read_file("STRIPPED.TXT")?)?;
        }
        info!(
            "paging lists: {} table files, {} extension files, {} text files",
            self.tbl_list.len(),
            self.xtbl_list.len(),
            self.stripped.len()
        );
        Ok(())
    }

    fn read_block(&self, data: &[u8]) -> EngineResult<Vec<Subroutine>> {
        read_subroutine_block(&mut ByteReader::new(data), self.opcodes, self.game)
    }

    fn charge(heap: &mut TableHeap<TableBlock>, subs: Vec<Subroutine>) -> EngineResult<()> {
        for sub in subs {
            let size = sub.heap_size();
            heap.alloc(size, TableBlock::Subroutine(Rc::new(sub)))?;
        }
        Ok(())
    }

    /// Install the game database's own subroutines and set both checkpoints
    /// after them
    pub fn load_base_block(&mut self, r: &mut ByteReader) -> EngineResult<()> {
        let subs = read_subroutine_block(r, self.opcodes, self.game)?;
        info!("{} resident subroutines", subs.len());
        Self::charge(&mut self.tables, subs)?;
        self.org = self.tables.checkpoint();
        self.new = self.org;
        Ok(())
    }

    /// Add one subroutine to the resident set ahead of the checkpoints
    pub fn add_resident(&mut self, sub: Subroutine) -> EngineResult<()> {
        self.tables.rollback_to(self.org);
        Self::charge(&mut self.tables, vec![sub])?;
        self.org = self.tables.checkpoint();
        self.new = self.org;
        Ok(())
    }

    fn find_loaded(&self, id: u16) -> Option<Rc<Subroutine>> {
        self.xtables
            .iter()
            .chain(self.tables.iter())
            .find_map(|block| match block {
                TableBlock::Subroutine(sub) if sub.id == id => Some(Rc::clone(sub)),
                _ => None,
            })
    }

    /// Look a subroutine up, paging in the file that holds it if needed
    ///
    /// A subroutine that exists nowhere is `None`; callers skip the action.
    pub fn get_subroutine(
        &mut self,
        id: u16,
        res: &mut dyn ResourceSource,
    ) -> EngineResult<Option<Rc<Subroutine>>> {
        if let Some(sub) = self.find_loaded(id) {
            return Ok(Some(sub));
        }
        if !self.load_xtables_into_mem(id, res)? {
            self.load_tables_into_mem(id, res)?;
        }
        let found = self.find_loaded(id);
        if found.is_none() {
            debug!("get_subroutine: subroutine {} not found", id);
        }
        Ok(found)
    }

    fn load_xtables_into_mem(&mut self, id: u16, res: &mut dyn ResourceSource) -> EngineResult<bool> {
        let file = match self.xtbl_list.iter().find(|f| f.covers(id)) {
            Some(f) => f.name.clone(),
            None => return Ok(false),
        };
        debug!("paging extension tables {} for subroutine {}", file, id);
        let subs = self.read_block(&res.read_file(&file)?)?;
        self.xtables.clear();
        Self::charge(&mut self.xtables, subs)?;
        Ok(true)
    }

    fn load_tables_into_mem(&mut self, id: u16, res: &mut dyn ResourceSource) -> EngineResult<bool> {
        let file = match self.tbl_list.iter().find(|f| f.covers(id)) {
            Some(f) => f.name.clone(),
            None => return Ok(false),
        };
        debug!("paging tables {} for subroutine {}", file, id);
        let subs = self.read_block(&res.read_file(&file)?)?;
        self.tables.rollback_to(self.org);
        Self::charge(&mut self.tables, subs)?;
        self.new = self.tables.checkpoint();
        Ok(true)
    }

    /// Text of a string id, expanded if the game compresses its text
    pub fn get_string(&mut self, id: u16, res: &mut dyn ResourceSource) -> EngineResult<Vec<u8>> {
        let raw = if id < LOCAL_STRING_BASE {
            match self.strings.get(id) {
                Some(s) => s.to_vec(),
                None => {
                    warn!("string {} past end of string table", id);
                    Vec::new()
                }
            }
        } else {
            self.get_local_string(id, res)?
        };
        match &self.tokens {
            Some(tokens) if self.game.compressed_text() => tokens.uncompress_text(&raw),
            _ => Ok(raw),
        }
    }

    fn local_string(&self, id: u16) -> Option<&Vec<u8>> {
        self.tables.iter().find_map(|block| match block {
            TableBlock::Strings { first, strings } if id >= *first => {
                strings.get((id - first) as usize)
            }
            _ => None,
        })
    }

    fn get_local_string(&mut self, id: u16, res: &mut dyn ResourceSource) -> EngineResult<Vec<u8>> {
        if self.local_string(id).is_none() {
            self.load_text_into_mem(id, res)?;
        }
        self.local_string(id)
            .cloned()
            .ok_or_else(|| EngineError::BadResource(format!("local string {} missing", id)))
    }

    fn load_text_into_mem(&mut self, id: u16, res: &mut dyn ResourceSource) -> EngineResult<()> {
        let mut base_min = LOCAL_STRING_BASE;
        let mut target = None;
        for (name, base_max) in &self.stripped {
            if id < *base_max {
                target = Some((name.clone(), *base_max));
                break;
            }
            base_min = *base_max;
        }
        let (name, base_max) = target.ok_or_else(|| {
            EngineError::BadResource(format!("string {} is in no text file", id))
        })?;

        debug!("paging text {} for strings {}..{}", name, base_min, base_max);
        let data = res.read_file(&name)?;
        let count = (base_max - base_min) as usize;
        let strings = split_strings(&data, count);
        self.tables.rollback_to(self.new);
        self.tables.alloc(
            count * 4 + data.len(),
            TableBlock::Strings {
                first: base_min,
                strings,
            },
        )?;
        Ok(())
    }

    /// Every resident subroutine, extension heap first
    pub fn subroutines(&self) -> Vec<Rc<Subroutine>> {
        self.xtables
            .iter()
            .chain(self.tables.iter())
            .filter_map(|block| match block {
                TableBlock::Subroutine(sub) => Some(Rc::clone(sub)),
                _ => None,
            })
            .collect()
    }

    pub fn tables_used(&self) -> usize {
        self.tables.used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MemoryFiles;
    use test_log::test;

    /// A block holding one subroutine whose only line is `done`
    fn block(ids: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for &id in ids {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&id.to_be_bytes());
            out.extend_from_slice(&[0, 0, 69, 0xFF]);
            out.extend_from_slice(&[0, 1]);
        }
        out.extend_from_slice(&[0, 1]);
        out
    }

    fn list(entries: &[(&str, &[(u16, u16)])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, ranges) in entries {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            for (min, max) in ranges.iter() {
                out.extend_from_slice(&min.to_be_bytes());
                out.extend_from_slice(&max.to_be_bytes());
            }
            out.extend_from_slice(&[0, 0]);
        }
        out.push(0);
        out
    }

    fn pager(files: &mut MemoryFiles) -> Pager {
        let mut p = Pager::new(&EngineConfig::default());
        p.load_base_block(&mut ByteReader::new(&block(&[1]))).unwrap();
        p.load_lists(files).unwrap();
        p
    }

    #[test]
    fn test_parse_table_list() {
        let files = parse_table_list(&list(&[("TABLES01", &[(10, 19), (40, 40)])])).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].covers(15));
        assert!(files[0].covers(40));
        assert!(!files[0].covers(20));
    }

    #[test]
    fn test_paging_replaces_previous_scene() {
        let mut files = MemoryFiles::new();
        files.insert(
            "TBLLIST",
            list(&[("TABLES01", &[(10, 19)]), ("TABLES02", &[(20, 29)])]),
        );
        files.insert("TABLES01", block(&[10, 11]));
        files.insert("TABLES02", block(&[20]));
        let mut p = pager(&mut files);

        assert!(p.get_subroutine(1, &mut files).unwrap().is_some());
        assert!(p.get_subroutine(11, &mut files).unwrap().is_some());
        assert_eq!(p.subroutines().len(), 3);

        assert!(p.get_subroutine(20, &mut files).unwrap().is_some());
        let ids: Vec<u16> = p.subroutines().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 20]);

        assert!(p.get_subroutine(99, &mut files).unwrap().is_none());
    }

    #[test]
    fn test_running_subroutine_survives_paging() {
        let mut files = MemoryFiles::new();
        files.insert(
            "TBLLIST",
            list(&[("TABLES01", &[(10, 10)]), ("TABLES02", &[(20, 20)])]),
        );
        files.insert("TABLES01", block(&[10]));
        files.insert("TABLES02", block(&[20]));
        let mut p = pager(&mut files);
        let running = p.get_subroutine(10, &mut files).unwrap().unwrap();
        p.get_subroutine(20, &mut files).unwrap();
        assert_eq!(&*running.lines[0].code, &[69, 0xFF]);
    }

    #[test]
    fn test_local_strings_page_by_range() {
        let mut files = MemoryFiles::new();
        let mut stripped = Vec::new();
        for (name, max) in [("TEXT01", 0x8003u16), ("TEXT02", 0x8010)] {
            stripped.extend_from_slice(name.as_bytes());
            stripped.push(0);
            stripped.extend_from_slice(&max.to_be_bytes());
        }
        stripped.push(0);
        files.insert("STRIPPED.TXT", stripped);
        files.insert("TEXT01", b"zero\0one\0two\0".to_vec());
        files.insert("TEXT02", b"three\0four\0".to_vec());
        let mut p = pager(&mut files);
        p.set_strings(StringTable::from_bytes(b"global\0", 1));

        assert_eq!(p.get_string(0, &mut files).unwrap(), b"global");
        assert_eq!(p.get_string(0x8001, &mut files).unwrap(), b"one");
        assert_eq!(p.get_string(0x8004, &mut files).unwrap(), b"four");
        assert_eq!(p.get_string(0x8002, &mut files).unwrap(), b"two");
        assert!(p.get_string(0x9000, &mut files).is_err());
    }

    #[test]
    fn test_table_overflow_is_fatal() {
        let mut files = MemoryFiles::new();
        files.insert("TBLLIST", list(&[("TABLES01", &[(10, 10)])]));
        files.insert("TABLES01", block(&[10]));
        let mut config = EngineConfig::default();
        config.tables_heap_size = 16;
        let mut p = Pager::new(&config);
        p.load_base_block(&mut ByteReader::new(&block(&[1]))).unwrap();
        p.load_lists(&mut files).unwrap();
        assert!(matches!(
            p.get_subroutine(10, &mut files),
            Err(EngineError::HeapOverflow { .. })
        ));
    }
}
