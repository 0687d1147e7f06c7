//! Where resource files come from
//!
//! The engine asks for resources by their DOS file name (`GAMEPC`,
//! `TABLES03`, `TEXT01`, `0121.VGA`). A game installed as loose files serves
//! them from disk, optionally crunched; a game packed into a GME archive maps
//! each numbered name onto an archive index and keeps its list files loose.
//! Tests and the demo serve them from memory.

use crate::config::EngineConfig;
use crate::decrunch::decrunch;
use crate::error::{EngineError, EngineResult};
use crate::gme::GmeArchive;
use indexmap::IndexMap;
use log::{debug, info};
use std::path::PathBuf;

pub trait ResourceSource {
    /// Read a whole resource; a missing file is `MissingResource`
    fn read_file(&mut self, name: &str) -> EngineResult<Vec<u8>>;

    fn exists(&self, name: &str) -> bool;
}

/// Name of one half of a VGA zone: part 1 holds scripts, part 2 image data
pub fn vga_file_name(zone: u16, part: u8) -> String {
    format!("{:03}{}.VGA", zone, part)
}

/// Trailing decimal number of a file name, e.g. 3 for `TABLES03`
fn file_number(name: &str, prefix: &str) -> Option<usize> {
    name.strip_prefix(prefix)?.parse().ok()
}

/// Installed game: a directory of loose files or one GME archive
pub struct GameFiles {
    dir: PathBuf,
    gme: Option<GmeArchive>,
    crunched: bool,
    table_index_base: usize,
    text_index_base: usize,
    vga_index_base: usize,
}

impl GameFiles {
    pub fn open(config: &EngineConfig) -> EngineResult<GameFiles> {
        let gme = match &config.gme_file {
            Some(name) => {
                let path = config.data_dir.join(name);
                info!("Opening GME archive {}", path.display());
                Some(GmeArchive::from_bytes(std::fs::read(&path)?)?)
            }
            None => None,
        };
        Ok(GameFiles {
            dir: config.data_dir.clone(),
            gme,
            crunched: config.crunched,
            table_index_base: config.table_index_base,
            text_index_base: config.text_index_base,
            vga_index_base: config.vga_index_base,
        })
    }

    /// Archive index of a named resource
    fn gme_index(&self, name: &str) -> Option<usize> {
        if name == "GAMEPC" {
            return Some(0);
        }
        if let Some(n) = file_number(name, "TABLES") {
            return Some(n + self.table_index_base - 1);
        }
        if let Some(n) = file_number(name, "TEXT") {
            return Some(n + self.text_index_base - 1);
        }
        let stem = name.strip_suffix(".VGA")?;
        if stem.len() != 4 {
            return None;
        }
        let zone: usize = stem[..3].parse().ok()?;
        let part: usize = stem[3..].parse().ok()?;
        Some(self.vga_index_base + zone * 2 + part - 1)
    }
}

impl ResourceSource for GameFiles {
    fn read_file(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        let name = name.to_ascii_uppercase();
        if let (Some(gme), Some(index)) = (&self.gme, self.gme_index(&name)) {
            debug!("{} -> GME resource {}", name, index);
            return Ok(gme.read_resource(index)?.to_vec());
        }
        let path = self.dir.join(&name);
        let data = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::MissingResource(name.clone()),
            _ => EngineError::Io(e),
        })?;
        if self.crunched {
            decrunch(&data)
        } else {
            Ok(data)
        }
    }

    fn exists(&self, name: &str) -> bool {
        let name = name.to_ascii_uppercase();
        match (&self.gme, self.gme_index(&name)) {
            (Some(gme), Some(index)) => index < gme.len(),
            _ => self.dir.join(&name).exists(),
        }
    }
}

/// Resources held in memory, keyed by upper-case name
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: IndexMap<String, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.files.insert(name.to_ascii_uppercase(), data);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|k| k.as_str())
    }
}

impl ResourceSource for MemoryFiles {
    fn read_file(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        let name = name.to_ascii_uppercase();
        self.files
            .get(&name)
            .cloned()
            .ok_or(EngineError::MissingResource(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(&name.to_ascii_uppercase())
    }
}
