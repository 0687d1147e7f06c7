//! Game variant selection and engine configuration
//!
//! The seven AGOS games share one engine but differ in opcode encoding,
//! timing, endianness and save layout. All of those differences are data on
//! `GameVariant`, selected once at startup. Everything a player may want to
//! tweak lives in `EngineConfig`, read from an optional `agos.toml` and then
//! overridden from the environment.

use crate::error::{EngineError, EngineResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The supported games, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameVariant {
    Elvira1,
    Elvira2,
    Waxworks,
    Simon1,
    Simon2,
    Feeble,
    PuzzlePack,
}

impl GameVariant {
    pub const ALL: [GameVariant; 7] = [
        GameVariant::Elvira1,
        GameVariant::Elvira2,
        GameVariant::Waxworks,
        GameVariant::Simon1,
        GameVariant::Simon2,
        GameVariant::Feeble,
        GameVariant::PuzzlePack,
    ];

    pub fn from_name(name: &str) -> Option<GameVariant> {
        match name.to_ascii_lowercase().as_str() {
            "elvira1" | "elvira" => Some(GameVariant::Elvira1),
            "elvira2" => Some(GameVariant::Elvira2),
            "waxworks" | "ww" => Some(GameVariant::Waxworks),
            "simon1" | "simon" => Some(GameVariant::Simon1),
            "simon2" => Some(GameVariant::Simon2),
            "feeble" | "ff" => Some(GameVariant::Feeble),
            "puzzlepack" | "pp" => Some(GameVariant::PuzzlePack),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameVariant::Elvira1 => "elvira1",
            GameVariant::Elvira2 => "elvira2",
            GameVariant::Waxworks => "waxworks",
            GameVariant::Simon1 => "simon1",
            GameVariant::Simon2 => "simon2",
            GameVariant::Feeble => "feeble",
            GameVariant::PuzzlePack => "puzzlepack",
        }
    }

    /// Elvira 1 encodes script opcodes and most arguments as 16-bit words
    pub fn word_opcodes(&self) -> bool {
        *self == GameVariant::Elvira1
    }

    /// Value that ends a subroutine line
    pub fn line_terminator(&self) -> u16 {
        if self.word_opcodes() {
            10000
        } else {
            0xFF
        }
    }

    /// Prefix that inverts the sense of the next condition opcode
    pub fn invert_prefix(&self) -> u16 {
        if self.word_opcodes() {
            203
        } else {
            0
        }
    }

    /// VGA scripts of the older games use big-endian word opcodes
    pub fn vga_word_opcodes(&self) -> bool {
        matches!(
            self,
            GameVariant::Elvira1 | GameVariant::Elvira2 | GameVariant::Waxworks | GameVariant::Simon1
        )
    }

    /// Feeble Files and the Puzzle Pack store VGA data little-endian
    pub fn little_endian(&self) -> bool {
        matches!(self, GameVariant::Feeble | GameVariant::PuzzlePack)
    }

    pub fn is_simon_family(&self) -> bool {
        matches!(self, GameVariant::Simon1 | GameVariant::Simon2)
    }

    /// Newer games decode 8 bits per pixel and draw on a 640x480 screen
    pub fn eight_bit_images(&self) -> bool {
        self.little_endian()
    }

    /// Host frame period for the timer callback
    pub fn frame_period_ms(&self, fast_mode: bool) -> u32 {
        if fast_mode {
            10
        } else if self.newer_timing() {
            45
        } else {
            50
        }
    }

    /// Amount subtracted from every VGA timer per processed pass
    pub fn vga_base_delay(&self) -> i16 {
        if self.newer_timing() {
            5
        } else {
            1
        }
    }

    /// How often the VGA timer list is processed per timer callback
    pub fn vga_passes_per_tick(&self) -> usize {
        if self.newer_timing() {
            1
        } else {
            2
        }
    }

    /// Ticks a blocking sync wait may take before it gives up
    pub fn sync_timeout_ticks(&self) -> u32 {
        if self.newer_timing() {
            1000
        } else {
            500
        }
    }

    fn newer_timing(&self) -> bool {
        matches!(
            self,
            GameVariant::Simon2 | GameVariant::Feeble | GameVariant::PuzzlePack
        )
    }

    pub fn screen_size(&self) -> (usize, usize) {
        if self.eight_bit_images() {
            (640, 480)
        } else {
            (320, 200)
        }
    }

    /// Number of entries in the script opcode table
    pub fn script_opcode_count(&self) -> usize {
        if self.word_opcodes() {
            300
        } else {
            256
        }
    }

    /// Bit-flag words persisted in a save game
    pub fn saved_bit_words(&self) -> usize {
        match self {
            GameVariant::Elvira1 | GameVariant::Elvira2 | GameVariant::Waxworks => 16,
            GameVariant::Simon1 | GameVariant::Simon2 => 32,
            GameVariant::Feeble | GameVariant::PuzzlePack => 64,
        }
    }

    /// Whether the save game carries the 10 item slots
    pub fn saves_item_slots(&self) -> bool {
        !matches!(
            self,
            GameVariant::Elvira1 | GameVariant::Elvira2 | GameVariant::Waxworks
        )
    }

    /// Elvira 2 and Waxworks token-compress their string tables
    pub fn compressed_text(&self) -> bool {
        matches!(self, GameVariant::Elvira2 | GameVariant::Waxworks)
    }

    /// Sprites are looked up by id alone in Simon 1, by id and zone elsewhere
    pub fn sprites_keyed_by_zone(&self) -> bool {
        *self != GameVariant::Simon1
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// User-tunable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub game: GameVariant,
    pub data_dir: PathBuf,
    pub gme_file: Option<String>,
    pub crunched: bool,
    pub fast_mode: bool,
    pub seed: Option<u64>,
    pub table_index_base: usize,
    pub text_index_base: usize,
    pub vga_index_base: usize,
    pub tables_heap_size: usize,
    pub xtables_heap_size: usize,
    pub item_heap_size: usize,
    pub zone_cache_limit: usize,
    pub save_dir: PathBuf,
    pub start_subroutine: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            game: GameVariant::Simon1,
            data_dir: PathBuf::from("."),
            gme_file: None,
            crunched: false,
            fast_mode: false,
            seed: None,
            table_index_base: 1,
            text_index_base: 100,
            vga_index_base: 200,
            tables_heap_size: 150_000,
            xtables_heap_size: 64_000,
            item_heap_size: 20_000,
            zone_cache_limit: 16,
            save_dir: PathBuf::from("."),
            start_subroutine: 1,
        }
    }
}

impl EngineConfig {
    pub const FILE_NAME: &'static str = "agos.toml";

    pub fn from_toml(text: &str) -> EngineResult<EngineConfig> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load `agos.toml` from the game directory if present, then apply
    /// environment overrides
    pub fn load(data_dir: &Path) -> EngineResult<EngineConfig> {
        let path = data_dir.join(Self::FILE_NAME);
        let mut config = if path.exists() {
            debug!("Reading configuration from {}", path.display());
            let text = std::fs::read_to_string(&path)?;
            Self::from_toml(&text)?
        } else {
            EngineConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply AGOS_GAME, AGOS_FAST and AGOS_SEED overrides
    pub fn apply_env<F>(&mut self, lookup: F) -> EngineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(game) = lookup("AGOS_GAME") {
            self.game = GameVariant::from_name(&game)
                .ok_or_else(|| EngineError::Config(format!("unknown game '{}'", game)))?;
        }
        if let Some(fast) = lookup("AGOS_FAST") {
            self.fast_mode = matches!(fast.as_str(), "1" | "true" | "yes");
        }
        if let Some(seed) = lookup("AGOS_SEED") {
            let seed = seed
                .parse::<u64>()
                .map_err(|_| EngineError::Config(format!("bad AGOS_SEED '{}'", seed)))?;
            self.seed = Some(seed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_variant_encoding_constants() {
        assert_eq!(GameVariant::Elvira1.line_terminator(), 10000);
        assert_eq!(GameVariant::Elvira1.invert_prefix(), 203);
        assert_eq!(GameVariant::Simon2.line_terminator(), 0xFF);
        assert_eq!(GameVariant::Simon2.invert_prefix(), 0);
        assert!(GameVariant::Simon1.vga_word_opcodes());
        assert!(!GameVariant::Simon2.vga_word_opcodes());
    }

    #[test]
    fn test_frame_periods() {
        assert_eq!(GameVariant::Simon1.frame_period_ms(false), 50);
        assert_eq!(GameVariant::Simon2.frame_period_ms(false), 45);
        assert_eq!(GameVariant::Simon2.frame_period_ms(true), 10);
    }

    #[test]
    fn test_toml_with_env_override() {
        let mut config = EngineConfig::from_toml(
            r#"
            game = "simon2"
            fast_mode = true
            zone_cache_limit = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.game, GameVariant::Simon2);
        assert_eq!(config.zone_cache_limit, 4);
        assert_eq!(config.tables_heap_size, 150_000);

        config
            .apply_env(|key| match key {
                "AGOS_GAME" => Some("waxworks".to_string()),
                "AGOS_SEED" => Some("42".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.game, GameVariant::Waxworks);
        assert_eq!(config.seed, Some(42));
        assert!(config.fast_mode);
    }

    #[test]
    fn test_unknown_game_is_config_error() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env(|key| (key == "AGOS_GAME").then(|| "zork".to_string()))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
