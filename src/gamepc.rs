//! Runtime game database loader
//!
//! The database file (`GAMEPC`) holds the global string table, every item
//! with its sub-blocks, and the block of subroutines that stays resident for
//! the whole game. All fields are big-endian.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::item::{ItemArena, ItemId, ObjectFlags, SubBlock, SubBlockKind, NULL_ITEM, PLAYER_ITEM};
use crate::reader::ByteReader;
use crate::tables::Pager;
use crate::text::StringTable;
use log::{debug, info};

pub const DATABASE_FILE: &str = "GAMEPC";
pub const RUNTIME_VERSION: u32 = 0x80;
/// Items 0 (null) and 1 (player) are not stored in the file
pub const PREDEFINED_ITEMS: usize = 2;
pub const NULL_REF: u32 = 0xFFFF_FFFF;

/// Strength given to the player at login
const PLAYER_STRENGTH: i16 = 10000;

/// File item reference to arena id
pub fn item_from_ref(v: u32) -> ItemId {
    if v == NULL_REF {
        NULL_ITEM
    } else {
        (v as usize + PREDEFINED_ITEMS) as ItemId
    }
}

/// Arena id to file item reference
pub fn item_to_ref(id: ItemId) -> u32 {
    if id == NULL_ITEM {
        NULL_REF
    } else {
        id as u32 - PREDEFINED_ITEMS as u32
    }
}

fn read_item_ref(r: &mut ByteReader) -> EngineResult<ItemId> {
    Ok(item_from_ref(r.read_u32()?))
}

fn read_object(r: &mut ByteReader) -> EngineResult<SubBlock> {
    let flags = ObjectFlags::from_bits_truncate(r.read_u32()?);
    let mut name = 0;
    let mut props = Vec::new();
    for bit in 0..16 {
        let prop = ObjectFlags::from_bits_truncate(1 << bit);
        if prop.is_empty() || !flags.contains(prop) {
            continue;
        }
        if prop == ObjectFlags::TEXT {
            name = r.read_u32()? as u16;
            props.push(name as i16);
        } else {
            props.push(r.read_i16()?);
        }
    }
    Ok(SubBlock::Object { name, flags, props })
}

fn read_sub_block(r: &mut ByteReader, kind: SubBlockKind) -> EngineResult<SubBlock> {
    Ok(match kind {
        SubBlockKind::Room => {
            let subroutine = r.read_u16()?;
            let exit_states = r.read_u16()?;
            let mut exits = [NULL_ITEM; 6];
            for exit in exits.iter_mut() {
                *exit = read_item_ref(r)?;
            }
            SubBlock::Room {
                subroutine,
                exit_states,
                exits,
            }
        }
        SubBlockKind::Object => read_object(r)?,
        SubBlockKind::Player => SubBlock::Player {
            strength: r.read_i16()?,
            weight: r.read_i16()?,
            score: r.read_i16()?,
            level: r.read_i16()?,
        },
        SubBlockKind::SuperRoom => {
            let subroutine = r.read_u16()?;
            let (x, y, z) = (r.read_u16()?, r.read_u16()?, r.read_u16()?);
            let count = x as usize * y as usize * z as usize;
            let mut exits = Vec::with_capacity(count);
            for _ in 0..count {
                exits.push(r.read_u16()?);
            }
            SubBlock::SuperRoom {
                subroutine,
                x,
                y,
                z,
                exits,
            }
        }
        SubBlockKind::Container => SubBlock::Container {
            volume: r.read_i16()?,
            flags: r.read_u16()?,
        },
        SubBlockKind::Chain => SubBlock::Chain {
            item: read_item_ref(r)?,
        },
        SubBlockKind::UserFlag => {
            let mut values = [0i16; 8];
            for v in values.iter_mut() {
                *v = r.read_i16()?;
            }
            SubBlock::UserFlag(values)
        }
        SubBlockKind::Inherit => SubBlock::Inherit {
            item: read_item_ref(r)?,
        },
    })
}

fn read_item(r: &mut ByteReader, items: &mut ItemArena, id: ItemId) -> EngineResult<()> {
    {
        let item = items.get_mut(id)?;
        item.adjective = r.read_i16()?;
        item.noun = r.read_i16()?;
        item.state = r.read_i16()?;
        item.next = read_item_ref(r)?;
        item.child = read_item_ref(r)?;
        item.parent = read_item_ref(r)?;
        let hi = r.read_u16()? as u32;
        let lo = r.read_u16()? as u32;
        item.class_flags = (hi << 16) | lo;
    }
    loop {
        let tag = r.read_u16()?;
        if tag == 0 {
            break;
        }
        let kind = SubBlockKind::from_tag(tag).ok_or_else(|| {
            EngineError::BadResource(format!("item {} has unknown sub-block type {}", id, tag))
        })?;
        let block = read_sub_block(r, kind)?;
        items.attach(id, block)?;
    }
    Ok(())
}

/// Give item 1 its player capabilities
pub fn login_player(items: &mut ItemArena) -> EngineResult<()> {
    {
        let player = items.get_mut(PLAYER_ITEM)?;
        player.adjective = -1;
        player.noun = 10000;
    }
    items.attach(
        PLAYER_ITEM,
        SubBlock::Player {
            strength: PLAYER_STRENGTH,
            weight: 0,
            score: 0,
            level: 1,
        },
    )?;
    items.attach(PLAYER_ITEM, SubBlock::UserFlag([0; 8]))
}

/// Load the database: items come back, strings and resident subroutines go
/// into the pager
pub fn load_game_database(
    data: &[u8],
    config: &EngineConfig,
    pager: &mut Pager,
) -> EngineResult<ItemArena> {
    let mut r = ByteReader::new(data);
    let item_array_size = r.read_u32()? as usize + PREDEFINED_ITEMS;
    let version = r.read_u32()?;
    let item_array_inited = r.read_u32()? as usize + PREDEFINED_ITEMS;
    let string_count = r.read_u32()? as usize;
    if version != RUNTIME_VERSION {
        return Err(EngineError::BadResource(format!(
            "not a runtime database (version {:#x})",
            version
        )));
    }
    if item_array_inited > item_array_size {
        return Err(EngineError::BadResource(format!(
            "{} initialised items but only {} slots",
            item_array_inited, item_array_size
        )));
    }

    let text_size = r.read_u32()? as usize;
    let text = r.read_bytes(text_size)?;
    pager.set_strings(StringTable::from_bytes(text, string_count));

    let mut items = ItemArena::new(item_array_size, config.item_heap_size)?;
    for id in PREDEFINED_ITEMS..item_array_inited {
        read_item(&mut r, &mut items, id as ItemId)?;
    }
    debug!("read {} items", item_array_inited - PREDEFINED_ITEMS);

    pager.load_base_block(&mut r)?;
    login_player(&mut items)?;
    info!(
        "game database: {} item slots, {} strings, item heap {} bytes",
        item_array_size,
        string_count,
        items.heap_used()
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn header(size: u32, version: u32, inited: u32, strings: u32) -> Vec<u8> {
        let mut out = Vec::new();
        for w in [size, version, inited, strings] {
            out.extend_from_slice(&w.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_item_refs() {
        assert_eq!(item_from_ref(NULL_REF), NULL_ITEM);
        assert_eq!(item_from_ref(0), 2);
        assert_eq!(item_to_ref(2), 0);
        assert_eq!(item_to_ref(NULL_ITEM), NULL_REF);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let data = header(1, 0x81, 1, 0);
        let mut pager = Pager::new(&EngineConfig::default());
        assert!(matches!(
            load_game_database(&data, &EngineConfig::default(), &mut pager),
            Err(EngineError::BadResource(_))
        ));
    }

    #[test]
    fn test_loads_item_with_object_block() {
        let mut data = header(1, RUNTIME_VERSION, 1, 1);
        data.extend_from_slice(&5u32.to_be_bytes());
        data.extend_from_slice(b"lamp\0");
        // item 2
        for w in [3u16, 4, 7] {
            data.extend_from_slice(&w.to_be_bytes());
        }
        for r in [NULL_REF, NULL_REF, 0xFFFF_FFFF] {
            data.extend_from_slice(&r.to_be_bytes());
        }
        data.extend_from_slice(&[0, 1, 0, 2]);
        data.extend_from_slice(&2u16.to_be_bytes());
        let flags = ObjectFlags::TEXT | ObjectFlags::SIZE | ObjectFlags::WEIGHT;
        data.extend_from_slice(&flags.bits().to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // name
        data.extend_from_slice(&6i16.to_be_bytes()); // size
        data.extend_from_slice(&2i16.to_be_bytes()); // weight
        data.extend_from_slice(&0u16.to_be_bytes()); // end of sub-blocks
        data.extend_from_slice(&1u16.to_be_bytes()); // empty subroutine block

        let config = EngineConfig::default();
        let mut pager = Pager::new(&config);
        let items = load_game_database(&data, &config, &mut pager).unwrap();
        let lamp = items.get(2).unwrap();
        assert_eq!(lamp.state, 7);
        assert_eq!(lamp.class_flags, 0x0001_0002);
        assert_eq!(lamp.object_prop(ObjectFlags::SIZE), Some(6));
        assert_eq!(lamp.object_prop(ObjectFlags::WEIGHT), Some(2));
        assert!(items.get(PLAYER_ITEM).unwrap().has_sub(SubBlockKind::Player));
        assert!(pager.subroutines().is_empty());
    }
}
