//! String tables and token-compressed text
//!
//! String tables are runs of NUL-separated strings addressed by position.
//! Elvira 2 and Waxworks additionally compress text with a token table:
//! bytes `0x80..=0xFC` stand for a whole token, and the prefixes `0xFD`,
//! `0xFE` and `0xFF` select one of 256 tokens on a second page.

use crate::error::{EngineError, EngineResult};
use log::{debug, trace};

/// Token table of the games that compress their text
pub const TOKEN_FILE: &str = "TOKENS";

/// First byte value that stands for a single token
pub const FIRST_TOKEN: u8 = 0x80;
/// Prefix bytes selecting a token page, lowest first
pub const TOKEN_PAGES: [u8; 3] = [0xFD, 0xFE, 0xFF];

const SINGLE_TOKENS: usize = (0xFD - FIRST_TOKEN) as usize;
const PAGE_SIZE: usize = 256;
/// Guard against runaway output from corrupt data
const MAX_TEXT_LEN: usize = 4096;

/// Split a NUL-separated blob into at most `count` strings
///
/// Missing trailing strings are empty. A final string without its NUL is kept.
pub fn split_strings(data: &[u8], count: usize) -> Vec<Vec<u8>> {
    let mut strings: Vec<Vec<u8>> = data
        .split(|&b| b == 0)
        .take(count)
        .map(|s| s.to_vec())
        .collect();
    strings.resize(count, Vec::new());
    strings
}

/// The global string table loaded with the game database
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<Vec<u8>>,
}

impl StringTable {
    pub fn from_bytes(data: &[u8], count: usize) -> StringTable {
        let strings = split_strings(data, count);
        debug!("string table: {} strings from {} bytes", strings.len(), data.len());
        StringTable { strings }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn get(&self, id: u16) -> Option<&[u8]> {
        self.strings.get(id as usize).map(|s| s.as_slice())
    }
}

/// Expansion table for compressed text
#[derive(Debug, Clone)]
pub struct TokenTable {
    single: Vec<Vec<u8>>,
    pages: [Vec<Vec<u8>>; 3],
}

impl TokenTable {
    /// Read single tokens for `0x80..=0xFC`, then the three 256-entry pages
    pub fn from_bytes(data: &[u8]) -> TokenTable {
        let mut all = split_strings(data, SINGLE_TOKENS + 3 * PAGE_SIZE).into_iter();
        let single: Vec<Vec<u8>> = all.by_ref().take(SINGLE_TOKENS).collect();
        let mut page = || all.by_ref().take(PAGE_SIZE).collect::<Vec<_>>();
        let pages = [page(), page(), page()];
        TokenTable { single, pages }
    }

    fn token(&self, prefix: Option<u8>, index: u8) -> &[u8] {
        let table = match prefix {
            None => &self.single,
            Some(p) => &self.pages[(p - TOKEN_PAGES[0]) as usize],
        };
        let slot = match prefix {
            None => (index - FIRST_TOKEN) as usize,
            Some(_) => index as usize,
        };
        table.get(slot).map(|t| t.as_slice()).unwrap_or(&[])
    }

    /// Expand a NUL-terminated token stream
    pub fn uncompress_text(&self, src: &[u8]) -> EngineResult<Vec<u8>> {
        let mut out = Vec::with_capacity(src.len() * 2);
        let mut bytes = src.iter().copied();
        while let Some(b) = bytes.next() {
            match b {
                0 => break,
                p if TOKEN_PAGES.contains(&p) => {
                    let index = bytes.next().ok_or_else(|| {
                        EngineError::BadResource(format!("token prefix {:02x} at end of text", p))
                    })?;
                    trace!("token {:02x}:{:02x}", p, index);
                    out.extend_from_slice(self.token(Some(p), index));
                }
                t if t >= FIRST_TOKEN => out.extend_from_slice(self.token(None, t)),
                c => out.push(c),
            }
            if out.len() > MAX_TEXT_LEN {
                return Err(EngineError::BadResource(
                    "compressed text expands past limit".to_string(),
                ));
            }
        }
        Ok(out)
    }
}
