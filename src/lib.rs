//! AGOS: the Adventure Graphics Operating System engine
//!
//! Two bytecode machines share one engine object. The script machine runs
//! game logic out of subroutines paged in from the table files; the VGA
//! machine drives sprite animation from per-zone scripts on a fixed timer.

#![crate_name = "agos"]

pub mod config;
pub mod error;

// data formats
pub mod decrunch;
pub mod gamepc;
pub mod gme;
pub mod heap;
pub mod reader;
pub mod resources;
pub mod rle;
pub mod subroutine;
pub mod tables;
pub mod text;

// world model
pub mod hitarea;
pub mod item;
pub mod random;
pub mod timers;

// script machine
pub mod opcode_tables;
pub mod opcodes_display;
pub mod opcodes_flow;
pub mod opcodes_math;
pub mod opcodes_object;
pub mod script;

// VGA machine
pub mod draw;
pub mod sprite;
pub mod vga;
pub mod vga_opcodes;
pub mod zone;

pub mod engine;
pub mod save;

// platform
pub mod display_manager;
pub mod display_ratatui;
pub mod host;
pub mod sound;

pub mod builder;
pub mod disasm;

pub use config::{EngineConfig, GameVariant};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
