//! Walking the three-level PE resource directory (C8, §4.4).

use crate::bytes::{ByteSliceExt, FromBytes};
use crate::section::SectionTable;

const SUBDIRECTORY_BIT: u32 = 0x8000_0000;
const NAME_BIT: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy)]
struct DirectoryHeader {
  #[allow(dead_code)]
  characteristics: u32,
  #[allow(dead_code)]
  time_date_stamp: u32,
  #[allow(dead_code)]
  major_version: u16,
  #[allow(dead_code)]
  minor_version: u16,
  number_of_named_entries: u16,
  number_of_id_entries: u16,
}

impl<'a> FromBytes<'a> for DirectoryHeader {
  fn from_bytes(buf: &'a [u8], offset: &mut usize, _: ()) -> Option<Self> {
    Some(Self {
      characteristics: buf.read(offset)?,
      time_date_stamp: buf.read(offset)?,
      major_version: buf.read(offset)?,
      minor_version: buf.read(offset)?,
      number_of_named_entries: buf.read(offset)?,
      number_of_id_entries: buf.read(offset)?,
    })
  }
}

#[derive(Debug, Clone, Copy)]
struct DirectoryEntry {
  name_or_id: u32,
  offset: u32,
}

impl<'a> FromBytes<'a> for DirectoryEntry {
  fn from_bytes(buf: &'a [u8], offset: &mut usize, _: ()) -> Option<Self> {
    Some(Self {
      name_or_id: buf.read(offset)?,
      offset: buf.read(offset)?,
    })
  }
}

impl DirectoryEntry {
  fn is_named(&self) -> bool {
    self.name_or_id & NAME_BIT != 0
  }

  fn is_subdirectory(&self) -> bool {
    self.offset & SUBDIRECTORY_BIT != 0
  }

  fn relative_offset(&self) -> usize {
    (self.offset & !SUBDIRECTORY_BIT) as usize
  }
}

/// A resource's data, located but not yet copied out. `data_offset` has already been translated
/// from an RVA to a raw file offset via the image's section table.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDataEntry {
  pub data_offset: usize,
  pub size: u32,
  pub codepage: u32,
  pub reserved: u32,
}

fn read_directory(bytes: &[u8], at: usize) -> Option<(DirectoryHeader, usize)> {
  let mut offset = at;
  let header = bytes.read::<DirectoryHeader>(&mut offset)?;

  Some((header, offset))
}

fn entry_matches(level: u8, entry: &DirectoryEntry, res_id: u32, lang_id: u32) -> bool {
  match level {
    // Level 0: match the resource type id; name-keyed types are not supported by this walker.
    0 => !entry.is_named() && entry.name_or_id == res_id,
    // Level 1: the optional name match is a stub upstream (see spec §9's open question);
    // the first entry in document order is accepted regardless of name or id.
    1 => true,
    // Level 2: match the requested language, or accept any language when `lang_id == 0`.
    2 => !entry.is_named() && (entry.name_or_id == lang_id || lang_id == 0),
    _ => false,
  }
}

fn descend(
  bytes: &[u8],
  root: usize,
  dir_at: usize,
  level: u8,
  res_id: u32,
  lang_id: u32,
) -> Option<ResourceDataEntry> {
  let (header, mut entries_at) = read_directory(bytes, dir_at)?;
  let count = header.number_of_named_entries as usize + header.number_of_id_entries as usize;

  for _ in 0..count {
    let entry = bytes.read::<DirectoryEntry>(&mut entries_at)?;

    if !entry_matches(level, &entry, res_id, lang_id) {
      continue;
    }

    let child_at = root + entry.relative_offset();

    return if entry.is_subdirectory() {
      if level >= 2 {
        None
      } else {
        descend(bytes, root, child_at, level + 1, res_id, lang_id)
      }
    } else {
      let mut offset = child_at;
      let data_rva: u32 = bytes.read(&mut offset)?;
      let size: u32 = bytes.read(&mut offset)?;
      let codepage: u32 = bytes.read(&mut offset)?;
      let reserved: u32 = bytes.read(&mut offset)?;

      Some(ResourceDataEntry {
        // The RVA is translated to a file offset by the caller, which holds the section table.
        data_offset: data_rva as usize,
        size,
        codepage,
        reserved,
      })
    };
  }

  None
}

/// Walks the PE resource tree rooted at `root_rva` looking for `(res_id, lang_id)`, optionally
/// further filtered by `name` at level 1 (currently unused — see §9's open question).
///
/// Returns the first hit in document order, with `data_offset` translated from an RVA to a raw
/// file offset via `sections`.
pub fn lookup_resource(
  raw: &[u8],
  sections: &SectionTable,
  root_rva: u32,
  res_id: u32,
  lang_id: u32,
  _name: Option<&str>,
) -> Option<ResourceDataEntry> {
  let root_offset = sections.rva_to_offset(root_rva)?;
  let mut found = descend(raw, root_offset, root_offset, 0, res_id, lang_id)?;

  found.data_offset = sections.rva_to_offset(found.data_offset as u32)?;

  Some(found)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::section::SectionDescriptor;

  fn one_section(len: u32) -> SectionTable {
    SectionTable::new(vec![SectionDescriptor {
      name: *b".rsrc\0\0\0",
      virtual_size: len,
      virtual_address: 0x2000,
      raw_data_size: len,
      raw_data_ptr: 0x400,
      characteristics: 0,
    }])
  }

  fn push_dir_header(buf: &mut Vec<u8>, named: u16, id: u16) {
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&named.to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
  }

  fn push_entry(buf: &mut Vec<u8>, name_or_id: u32, offset: u32) {
    buf.extend_from_slice(&name_or_id.to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
  }

  #[test]
  fn three_level_walk_finds_the_leaf() {
    // Layout (offsets relative to the resource directory root):
    // 0:  level0 dir header, 1 id entry -> type 3 at 16
    // 16: level0 entry {id=3, subdir offset=24}
    // 24: level1 dir header, 1 id entry -> name 1 at 40
    // 40: level1 entry {id=1, subdir offset=48}
    // 48: level2 dir header, 1 id entry -> lang 0 at 64
    // 64: level2 entry {id=0, data offset=72}
    // 72: data entry {rva=0x2000, size=4, codepage=0, reserved=0}
    let mut buf = Vec::new();

    push_dir_header(&mut buf, 0, 1); // level 0 @ 0
    push_entry(&mut buf, 3, SUBDIRECTORY_BIT | 24);

    push_dir_header(&mut buf, 0, 1); // level 1 @ 24
    push_entry(&mut buf, 1, SUBDIRECTORY_BIT | 48);

    push_dir_header(&mut buf, 0, 1); // level 2 @ 48
    push_entry(&mut buf, 0, 72);

    buf.extend_from_slice(&0x2000u32.to_le_bytes());
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());

    let mut raw = vec![0u8; 0x400];
    raw.extend_from_slice(&buf);

    let sections = one_section(buf.len() as u32);
    let found = lookup_resource(&raw, &sections, 0x2000, 3, 0, None).unwrap();

    assert_eq!(found.size, 4);
    assert_eq!(found.data_offset, 0x400); // rva 0x2000 -> file offset 0x400
  }

  #[test]
  fn missing_type_id_returns_none() {
    let mut buf = Vec::new();

    push_dir_header(&mut buf, 0, 1);
    push_entry(&mut buf, 3, SUBDIRECTORY_BIT | 24);
    push_dir_header(&mut buf, 0, 0);

    let mut raw = vec![0u8; 0x400];
    raw.extend_from_slice(&buf);

    let sections = one_section(buf.len() as u32);

    assert!(lookup_resource(&raw, &sections, 0x2000, 99, 0, None).is_none());
  }
}
