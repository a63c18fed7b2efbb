//! The PE/COFF section table (C3) and RVA-to-file-offset translation (C2).

use crate::bytes::{ByteSliceExt, FromBytes};
use crate::status::FormatError;

/// One entry of the PE section table, copied into host-endian fields.
#[derive(Debug, Clone, Copy)]
pub struct SectionDescriptor {
  /// The raw 8-byte section name, e.g. `.text\0\0\0`.
  pub name: [u8; 8],
  pub virtual_size: u32,
  pub virtual_address: u32,
  pub raw_data_size: u32,
  pub raw_data_ptr: u32,
  pub characteristics: u32,
}

impl SectionDescriptor {
  /// The section name with trailing NULs trimmed, lossily decoded as UTF-8.
  pub fn name_str(&self) -> std::borrow::Cow<'_, str> {
    let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
    String::from_utf8_lossy(&self.name[..end])
  }

  fn contains_rva(&self, rva: u32) -> bool {
    rva >= self.virtual_address && rva < self.virtual_address.saturating_add(self.raw_data_size)
  }
}

impl<'a> FromBytes<'a> for SectionDescriptor {
  fn from_bytes(buf: &'a [u8], offset: &mut usize, _: ()) -> Option<Self> {
    Some(Self {
      name: buf.read(offset)?,
      virtual_size: buf.read(offset)?,
      virtual_address: buf.read(offset)?,
      raw_data_size: buf.read(offset)?,
      raw_data_ptr: buf.read(offset)?,
      characteristics: {
        // pointer_to_relocations, pointer_to_linenumbers, number_of_relocations,
        // number_of_linenumbers: u32, u32, u16, u16 — skipped, not needed by this loader.
        *offset += 4 + 4 + 2 + 2;
        buf.read(offset)?
      },
    })
  }
}

/// The section table of one image, and the RVA mapper (C2) built over it.
#[derive(Debug, Clone, Default)]
pub struct SectionTable {
  sections: Vec<SectionDescriptor>,
}

impl SectionTable {
  pub fn new(sections: Vec<SectionDescriptor>) -> Self {
    Self { sections }
  }

  pub fn iter(&self) -> impl Iterator<Item = &SectionDescriptor> {
    self.sections.iter()
  }

  pub fn get(&self, idx: usize) -> Option<&SectionDescriptor> {
    self.sections.get(idx)
  }

  pub fn by_name(&self, name: &str) -> Option<&SectionDescriptor> {
    self.sections.iter().find(|s| s.name_str() == name)
  }

  /// Translates an RVA into a raw file offset using the unique section that contains it.
  ///
  /// Returns `None` (the sentinel **INVALID** of §4.1) when no section contains `rva`.
  pub fn rva_to_offset(&self, rva: u32) -> Option<usize> {
    let section = self.sections.iter().find(|s| s.contains_rva(rva))?;

    Some((rva - section.virtual_address) as usize + section.raw_data_ptr as usize)
  }

  /// Maps `rva` into a slice of `raw`, mapping the owning section on first touch.
  ///
  /// "Mapping" has no separate state to establish in this in-memory model (the whole file is
  /// already resident), so this degenerates to the bounds check described in §4.1: idempotent,
  /// and fails if the section's raw data would run past the end of `raw`.
  pub fn ensure_section<'a>(&self, raw: &'a [u8], rva: u32, len: usize) -> Option<&'a [u8]> {
    let offset = self.rva_to_offset(rva)?;

    raw.get(offset..offset.checked_add(len)?)
  }

  pub fn from_raw_table(buf: &[u8], count: u16) -> Result<Self, FormatError> {
    let offset = &mut 0;
    let mut sections = Vec::with_capacity(count as usize);

    for _ in 0..count {
      sections.push(buf.read::<SectionDescriptor>(offset).ok_or(FormatError::TooShort)?);
    }

    Ok(Self { sections })
  }
}
