//! VGA zones: loaded banks of animation scripts, palettes and images
//!
//! A zone `n` is two resources. `NNN1.VGA` starts with three words, the last
//! pointing at a second header; palettes follow at offset 6. The second
//! header gives the image and animation tables, whose entries are
//! `{id, x, script offset}` triples. `NNN2.VGA` starts with one 8-byte header
//! per image.
//!
//! Script bytes are kept mutable: the repeat opcodes store their loop
//! counters inside the script itself.

use crate::error::{EngineError, EngineResult};
use crate::reader::{read_u16_at, read_u32_at};
use crate::resources::{vga_file_name, ResourceSource};
use indexmap::IndexMap;
use log::{debug, info};

const HDR2_POINTER: usize = 4;
const PALETTE_START: usize = 6;
const TABLE_ENTRY_SIZE: usize = 6;
const IMAGE_HEADER_SIZE: usize = 8;

/// Saved position inside a zone's script bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgaCursor {
    pub zone: u16,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub offset: usize,
    pub width: usize,
    pub height: usize,
    pub compressed: bool,
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub number: u16,
    pub script: Vec<u8>,
    pub images: Vec<u8>,
    little_endian: bool,
    pub locked: bool,
    pub frozen: bool,
}

impl Zone {
    pub fn parse(
        number: u16,
        script: Vec<u8>,
        images: Vec<u8>,
        little_endian: bool,
    ) -> EngineResult<Zone> {
        let zone = Zone {
            number,
            script,
            images,
            little_endian,
            locked: false,
            frozen: false,
        };
        let hdr2 = zone.hdr2()?;
        // the two table pointers must lie inside the file
        zone.word(hdr2 + 10)?;
        zone.word(hdr2 + 14)?;
        Ok(zone)
    }

    fn word(&self, pos: usize) -> EngineResult<u16> {
        read_u16_at(&self.script, pos, self.little_endian)
            .map_err(|_| EngineError::BadResource(format!("zone {} header truncated", self.number)))
    }

    fn hdr2(&self) -> EngineResult<usize> {
        Ok(self.word(HDR2_POINTER)? as usize)
    }

    pub fn image_count(&self) -> EngineResult<usize> {
        Ok(self.word(self.hdr2()? + 2)? as usize)
    }

    pub fn animation_count(&self) -> EngineResult<usize> {
        Ok(self.word(self.hdr2()? + 6)? as usize)
    }

    fn lookup(&self, table_ptr: usize, count: usize, id: u16) -> EngineResult<Option<usize>> {
        let table = self.word(table_ptr)? as usize;
        for i in 0..count {
            let entry = table + i * TABLE_ENTRY_SIZE;
            if self.word(entry)? == id {
                return Ok(Some(self.word(entry + 4)? as usize));
            }
        }
        Ok(None)
    }

    /// Script offset of an image table entry
    pub fn image_script(&self, id: u16) -> EngineResult<Option<usize>> {
        let hdr2 = self.hdr2()?;
        self.lookup(hdr2 + 10, self.image_count()?, id)
    }

    /// Script offset of an animation table entry
    pub fn animation_script(&self, id: u16) -> EngineResult<Option<usize>> {
        let hdr2 = self.hdr2()?;
        self.lookup(hdr2 + 14, self.animation_count()?, id)
    }

    fn ids(&self, table_ptr: usize, count: usize) -> EngineResult<Vec<u16>> {
        let table = self.word(table_ptr)? as usize;
        (0..count)
            .map(|i| self.word(table + i * TABLE_ENTRY_SIZE))
            .collect()
    }

    /// Ids in the image table, in file order
    pub fn image_script_ids(&self) -> EngineResult<Vec<u16>> {
        let hdr2 = self.hdr2()?;
        self.ids(hdr2 + 10, self.image_count()?)
    }

    pub fn animation_ids(&self) -> EngineResult<Vec<u16>> {
        let hdr2 = self.hdr2()?;
        self.ids(hdr2 + 14, self.animation_count()?)
    }

    /// Raw 6-bit RGB triples of palette `index`
    pub fn palette(&self, index: usize, size: usize) -> EngineResult<&[u8]> {
        let start = PALETTE_START + index * size;
        self.script.get(start..start + size).ok_or_else(|| {
            EngineError::BadResource(format!("zone {} has no palette {}", self.number, index))
        })
    }

    pub fn image_header(&self, image: u16) -> EngineResult<ImageHeader> {
        let p = image as usize * IMAGE_HEADER_SIZE;
        let raw = self.images.get(p..p + IMAGE_HEADER_SIZE).ok_or_else(|| {
            EngineError::BadResource(format!("zone {} has no image {}", self.number, image))
        })?;
        let offset = read_u32_at(raw, 0, self.little_endian)? as usize;
        let header = if self.little_endian {
            ImageHeader {
                offset,
                height: (read_u16_at(raw, 4, true)? & 0x7FFF) as usize,
                compressed: raw[5] & 0x80 != 0,
                width: read_u16_at(raw, 6, true)? as usize,
            }
        } else {
            ImageHeader {
                offset,
                compressed: raw[4] & 0x80 != 0,
                height: raw[5] as usize,
                width: read_u16_at(raw, 6, false)? as usize,
            }
        };
        Ok(header)
    }

    pub fn image_data(&self, header: &ImageHeader) -> EngineResult<&[u8]> {
        self.images.get(header.offset..).ok_or_else(|| {
            EngineError::BadResource(format!(
                "zone {} image data offset {} out of range",
                self.number, header.offset
            ))
        })
    }
}

/// Loaded zones in load order
#[derive(Debug, Clone)]
pub struct ZoneCache {
    zones: IndexMap<u16, Zone>,
    limit: usize,
    little_endian: bool,
}

impl ZoneCache {
    pub fn new(limit: usize, little_endian: bool) -> Self {
        ZoneCache {
            zones: IndexMap::new(),
            limit: limit.max(1),
            little_endian,
        }
    }

    pub fn get(&self, zone: u16) -> EngineResult<&Zone> {
        self.zones.get(&zone).ok_or(EngineError::ZoneNotFound(zone))
    }

    pub fn get_mut(&mut self, zone: u16) -> EngineResult<&mut Zone> {
        self.zones.get_mut(&zone).ok_or(EngineError::ZoneNotFound(zone))
    }

    pub fn contains(&self, zone: u16) -> bool {
        self.zones.contains_key(&zone)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn loaded(&self) -> impl Iterator<Item = u16> + '_ {
        self.zones.keys().copied()
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.insert(zone.number, zone);
    }

    /// Load a zone unless it is resident, evicting old zones first
    ///
    /// `in_use` reports zones that sprites, timers or sleepers still point into.
    pub fn ensure_loaded<F>(
        &mut self,
        number: u16,
        res: &mut dyn ResourceSource,
        in_use: F,
    ) -> EngineResult<()>
    where
        F: Fn(u16) -> bool,
    {
        if self.contains(number) {
            return Ok(());
        }
        while self.zones.len() >= self.limit {
            let victim = self
                .zones
                .values()
                .find(|z| !z.locked && !z.frozen && !in_use(z.number))
                .map(|z| z.number);
            match victim {
                Some(v) => {
                    debug!("evicting zone {}", v);
                    self.zones.shift_remove(&v);
                }
                None => break,
            }
        }
        let script = res
            .read_file(&vga_file_name(number, 1))
            .map_err(|_| EngineError::ZoneNotFound(number))?;
        let images = match res.read_file(&vga_file_name(number, 2)) {
            Ok(data) => data,
            Err(EngineError::MissingResource(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let zone = Zone::parse(number, script, images, self.little_endian)?;
        info!(
            "loaded zone {} ({} script bytes, {} image bytes)",
            number,
            zone.script.len(),
            zone.images.len()
        );
        self.zones.insert(number, zone);
        Ok(())
    }

    /// Pin every zone loaded so far
    pub fn freeze(&mut self) {
        self.zones.values_mut().for_each(|z| z.frozen = true);
    }

    pub fn lock(&mut self, zone: u16) {
        if let Some(z) = self.zones.get_mut(&zone) {
            z.locked = true;
        }
    }

    /// Release every lock and freeze
    pub fn unlock_all(&mut self) {
        for z in self.zones.values_mut() {
            z.locked = false;
            z.frozen = false;
        }
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    fn script(&self, cursor: &VgaCursor) -> EngineResult<&[u8]> {
        Ok(&self.get(cursor.zone)?.script)
    }

    pub fn read_u8(&self, cursor: &mut VgaCursor) -> EngineResult<u8> {
        let b = *self
            .script(cursor)?
            .get(cursor.pos)
            .ok_or(EngineError::CodeOverrun(cursor.pos))?;
        cursor.pos += 1;
        Ok(b)
    }

    pub fn read_u16(&self, cursor: &mut VgaCursor) -> EngineResult<u16> {
        let w = read_u16_at(self.script(cursor)?, cursor.pos, self.little_endian)
            .map_err(|_| EngineError::CodeOverrun(cursor.pos))?;
        cursor.pos += 2;
        Ok(w)
    }

    /// Read a word stored little-endian regardless of the zone's byte order
    pub fn read_u16_le(&self, zone: u16, pos: usize) -> EngineResult<u16> {
        read_u16_at(&self.get(zone)?.script, pos, true).map_err(|_| EngineError::CodeOverrun(pos))
    }

    pub fn write_u16_le(&mut self, zone: u16, pos: usize, value: u16) -> EngineResult<()> {
        let script = &mut self.get_mut(zone)?.script;
        let slot = script
            .get_mut(pos..pos + 2)
            .ok_or(EngineError::CodeOverrun(pos))?;
        slot.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ZoneBuilder;
    use crate::resources::MemoryFiles;
    use test_log::test;

    fn sample(number: u16) -> (Vec<u8>, Vec<u8>) {
        let mut zb = ZoneBuilder::new(number, false);
        zb.palette(&[[63, 0, 0]; 32]);
        zb.image_script(number * 100 + 1, &[0, 0]);
        zb.animation(number * 100 + 2, &[0, 0]);
        zb.image(4, 3, &[1; 12], false);
        zb.build()
    }

    fn files_with(zones: &[u16]) -> MemoryFiles {
        let mut files = MemoryFiles::new();
        for &n in zones {
            let (script, images) = sample(n);
            files.insert(&vga_file_name(n, 1), script);
            files.insert(&vga_file_name(n, 2), images);
        }
        files
    }

    #[test]
    fn test_table_lookups() {
        let (script, images) = sample(3);
        let zone = Zone::parse(3, script, images, false).unwrap();
        assert_eq!(zone.image_count().unwrap(), 1);
        assert!(zone.image_script(301).unwrap().is_some());
        assert!(zone.image_script(302).unwrap().is_none());
        assert!(zone.animation_script(302).unwrap().is_some());
        let palette = zone.palette(0, 96).unwrap();
        assert_eq!((palette[0], palette[95]), (63, 0));
        assert!(zone.palette(500, 96).is_err());
        assert_eq!(zone.image_script_ids().unwrap(), vec![301]);
        assert_eq!(zone.animation_ids().unwrap(), vec![302]);

        let header = zone.image_header(0).unwrap();
        assert_eq!((header.width, header.height), (4, 3));
        assert!(!header.compressed);
        // two 4-bit pixels per byte
        assert_eq!(zone.image_data(&header).unwrap()[0], 0x11);
    }

    #[test]
    fn test_truncated_header_is_rejected() {
        assert!(Zone::parse(1, vec![0, 0, 0], Vec::new(), false).is_err());
    }

    #[test]
    fn test_eviction_skips_pinned_zones() {
        let mut files = files_with(&[1, 2, 3, 4]);
        let mut cache = ZoneCache::new(2, false);
        cache.ensure_loaded(1, &mut files, |_| false).unwrap();
        cache.freeze();
        cache.ensure_loaded(2, &mut files, |_| false).unwrap();
        cache.ensure_loaded(3, &mut files, |_| false).unwrap();
        let loaded: Vec<u16> = cache.loaded().collect();
        assert_eq!(loaded, vec![1, 3]);

        // zone 3 is in use, zone 1 frozen: nothing can go
        cache.ensure_loaded(4, &mut files, |z| z == 3).unwrap();
        assert_eq!(cache.len(), 3);

        cache.unlock_all();
        cache.ensure_loaded(2, &mut files, |z| z == 3).unwrap();
        assert!(!cache.contains(1));
    }

    #[test]
    fn test_missing_zone() {
        let mut files = MemoryFiles::new();
        let mut cache = ZoneCache::new(4, false);
        assert!(matches!(
            cache.ensure_loaded(9, &mut files, |_| false),
            Err(EngineError::ZoneNotFound(9))
        ));
    }

    #[test]
    fn test_counter_written_in_place() {
        let mut files = files_with(&[1]);
        let mut cache = ZoneCache::new(4, false);
        cache.ensure_loaded(1, &mut files, |_| false).unwrap();
        cache.write_u16_le(1, 0, 0x0102).unwrap();
        assert_eq!(cache.read_u16_le(1, 0).unwrap(), 0x0102);
        let mut cursor = VgaCursor { zone: 1, pos: 0 };
        assert_eq!(cache.read_u16(&mut cursor).unwrap(), 0x0201);
        assert_eq!(cursor.pos, 2);
    }
}
