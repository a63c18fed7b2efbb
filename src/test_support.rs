//! Hand-built minimal CLI image fixtures shared by `image`, `registry` and the integration tests.
//! Exercises the same byte layout `pe::format`/`image::load_cli` parse, without depending on a
//! binary checked into the repository.

const MACHINE_I386: u16 = 0x14C;
const OPTIONAL_HEADER_MAGIC_PE32: u16 = 0x10B;
const FIXED_OPTIONAL_HEADER_SIZE: u16 = 96 + 16 * 8;
const SECTION_HEADER_SIZE: usize = 40;
const DOS_STUB_SIZE: usize = 0x40;
const PE_OFFSET_FIELD: usize = 0x3c;

fn pad4(mut bytes: Vec<u8>) -> Vec<u8> {
  while bytes.len() % 4 != 0 {
    bytes.push(0);
  }

  bytes
}

fn length_prefixed_cstr(s: &str) -> Vec<u8> {
  let mut body = s.as_bytes().to_vec();

  body.push(0);

  let body = pad4(body);
  let mut out = (body.len() as u32).to_le_bytes().to_vec();

  out.extend_from_slice(&body);
  out
}

fn stream_name(name: &str) -> Vec<u8> {
  let mut bytes = name.as_bytes().to_vec();

  bytes.push(0);
  pad4(bytes)
}

struct Stream {
  name: &'static str,
  data: Vec<u8>,
}

/// One `Module` row, 2-byte (narrow) heap indices: `generation`, `name`, `mvid`, `enc_id`,
/// `enc_base_id`.
fn module_row(name_index: u16) -> Vec<u8> {
  let mut row = Vec::new();

  row.extend_from_slice(&0u16.to_le_bytes()); // generation
  row.extend_from_slice(&name_index.to_le_bytes()); // name
  row.extend_from_slice(&0u16.to_le_bytes()); // mvid
  row.extend_from_slice(&0u16.to_le_bytes()); // enc_id
  row.extend_from_slice(&0u16.to_le_bytes()); // enc_base_id
  row
}

fn tables_stream(uncompressed: bool, module_name_index: u16) -> Stream {
  let mut bytes = Vec::new();

  bytes.extend_from_slice(&0u32.to_le_bytes()); // reserved
  bytes.push(2); // major_version
  bytes.push(0); // minor_version
  bytes.push(0); // heap_sizes: all heaps narrow
  bytes.push(1); // reserved, always 1
  bytes.extend_from_slice(&1u64.to_le_bytes()); // valid: bit 0 (Module) set
  bytes.extend_from_slice(&0u64.to_le_bytes()); // sorted
  bytes.extend_from_slice(&1u32.to_le_bytes()); // Module row count
  bytes.extend_from_slice(&module_row(module_name_index));

  Stream {
    name: if uncompressed { "#-" } else { "#~" },
    data: bytes,
  }
}

fn strings_heap(module_name: &str) -> Vec<u8> {
  let mut heap = vec![0u8]; // index 0 is conventionally the empty string

  heap.extend_from_slice(module_name.as_bytes());
  heap.push(0);
  heap
}

fn guids_heap(guid: [u8; 16]) -> Vec<u8> {
  guid.to_vec()
}

/// Assembles the metadata root (`BSJB` signature, version string, stream headers, stream data)
/// for the given streams, in the order given.
fn metadata_root(streams: &[Stream]) -> Vec<u8> {
  let mut root = Vec::new();

  root.extend_from_slice(b"BSJB");
  root.extend_from_slice(&1u16.to_le_bytes()); // major_version
  root.extend_from_slice(&1u16.to_le_bytes()); // minor_version
  root.extend_from_slice(&0u32.to_le_bytes()); // reserved
  root.extend_from_slice(&length_prefixed_cstr("v4.0.30319"));
  root.extend_from_slice(&0u16.to_le_bytes()); // flags
  root.extend_from_slice(&(streams.len() as u16).to_le_bytes());

  let header_len: usize = streams.iter().map(|s| 8 + stream_name(s.name).len()).sum();
  let mut data_offset = root.len() + header_len;

  for stream in streams {
    root.extend_from_slice(&(data_offset as u32).to_le_bytes());
    root.extend_from_slice(&(stream.data.len() as u32).to_le_bytes());
    root.extend_from_slice(&stream_name(stream.name));
    data_offset += stream.data.len();
  }

  for stream in streams {
    root.extend_from_slice(&stream.data);
  }

  root
}

/// Builds a minimal well-formed PE32/CLI image: one section holding the CLI header and metadata
/// root, one `Module` row, a `#GUID` heap with the given identity. Mirrors `pe::format::parse`'s
/// and `image::load_cli`'s expectations byte-for-byte.
pub(crate) fn minimal_cli_image_with(uncompressed: bool, guid: [u8; 16], module_name: &str) -> Vec<u8> {
  let strings = strings_heap(module_name);
  let module_name_index = 1u16; // offset 0 is the empty string

  let streams = [
    tables_stream(uncompressed, module_name_index),
    Stream { name: "#Strings", data: strings },
    Stream { name: "#GUID", data: guids_heap(guid) },
  ];
  let metadata = metadata_root(&streams);

  let header_size = DOS_STUB_SIZE + 4 + 20 + FIXED_OPTIONAL_HEADER_SIZE as usize + SECTION_HEADER_SIZE;
  let section_va = 0x2000u32;
  let cli_header_va = section_va;
  let metadata_va = cli_header_va + 72;
  let payload_len = 72 + metadata.len();

  let mut buf = vec![0u8; header_size];

  buf[0..2].copy_from_slice(b"MZ");
  buf[PE_OFFSET_FIELD..PE_OFFSET_FIELD + 4].copy_from_slice(&(DOS_STUB_SIZE as u32).to_le_bytes());

  let pe_offset = DOS_STUB_SIZE;

  buf[pe_offset..pe_offset + 4].copy_from_slice(b"PE\0\0");
  buf[pe_offset + 4..pe_offset + 6].copy_from_slice(&MACHINE_I386.to_le_bytes());
  buf[pe_offset + 6..pe_offset + 8].copy_from_slice(&1u16.to_le_bytes()); // number_of_sections
  buf[pe_offset + 8..pe_offset + 12].copy_from_slice(&0u32.to_le_bytes()); // timestamp
  buf[pe_offset + 12..pe_offset + 16].copy_from_slice(&0u32.to_le_bytes()); // symbol table ptr
  buf[pe_offset + 16..pe_offset + 20].copy_from_slice(&0u32.to_le_bytes()); // number of symbols
  buf[pe_offset + 20..pe_offset + 22].copy_from_slice(&FIXED_OPTIONAL_HEADER_SIZE.to_le_bytes());
  buf[pe_offset + 22..pe_offset + 24].copy_from_slice(&0u16.to_le_bytes()); // characteristics

  let optional_header_start = pe_offset + 24;

  buf[optional_header_start..optional_header_start + 2].copy_from_slice(&OPTIONAL_HEADER_MAGIC_PE32.to_le_bytes());

  let mut dd_offset = optional_header_start + 96;

  for dir in 0..16u32 {
    let (rva, size) = if dir == 14 { (cli_header_va, 72u32) } else { (0, 0) };

    buf[dd_offset..dd_offset + 4].copy_from_slice(&rva.to_le_bytes());
    buf[dd_offset + 4..dd_offset + 8].copy_from_slice(&size.to_le_bytes());
    dd_offset += 8;
  }

  let section_table_offset = optional_header_start + FIXED_OPTIONAL_HEADER_SIZE as usize;

  buf[section_table_offset..section_table_offset + 8].copy_from_slice(b".cli\0\0\0\0");
  buf[section_table_offset + 8..section_table_offset + 12].copy_from_slice(&(payload_len as u32).to_le_bytes());
  buf[section_table_offset + 12..section_table_offset + 16].copy_from_slice(&section_va.to_le_bytes());
  buf[section_table_offset + 16..section_table_offset + 20].copy_from_slice(&(payload_len as u32).to_le_bytes());
  buf[section_table_offset + 20..section_table_offset + 24].copy_from_slice(&(header_size as u32).to_le_bytes());
  // relocations ptr, linenumbers ptr, relocation count, linenumber count: left zero
  buf[section_table_offset + 36..section_table_offset + 40].copy_from_slice(&0u32.to_le_bytes()); // characteristics

  assert_eq!(buf.len(), header_size);

  // CLI header (72 bytes): cb, major/minor runtime version, metadata dir, flags, entry point,
  // resources dir, strong name dir, code manager table, vtable fixups, export jumps, managed
  // native header.
  let mut cli_header = Vec::with_capacity(72);

  cli_header.extend_from_slice(&72u32.to_le_bytes());
  cli_header.extend_from_slice(&2u16.to_le_bytes());
  cli_header.extend_from_slice(&0u16.to_le_bytes());
  cli_header.extend_from_slice(&metadata_va.to_le_bytes());
  cli_header.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
  cli_header.extend_from_slice(&1u32.to_le_bytes()); // flags: COMIMAGE_FLAGS_ILONLY
  cli_header.extend_from_slice(&0x0600_0001u32.to_le_bytes()); // entry_point_token
  cli_header.extend_from_slice(&[0u8; 8]); // resources
  cli_header.extend_from_slice(&[0u8; 8]); // strong_name_signature
  cli_header.extend_from_slice(&[0u8; 8]); // code_manager_table
  cli_header.extend_from_slice(&[0u8; 8]); // vtable_fixups
  cli_header.extend_from_slice(&[0u8; 8]); // export_address_table_jumps
  cli_header.extend_from_slice(&[0u8; 8]); // managed_native_header

  assert_eq!(cli_header.len(), 72);

  buf.extend_from_slice(&cli_header);
  buf.extend_from_slice(&metadata);

  buf
}

/// A minimal `#~` (compressed) image with one `Module` row named `"Module1.dll"`.
pub(crate) fn minimal_cli_image() -> Vec<u8> {
  minimal_cli_image_with(false, sample_guid(), "Module1.dll")
}

/// As [`minimal_cli_image`], but with the `#-` (uncompressed) tables stream name.
pub(crate) fn minimal_cli_image_uncompressed() -> Vec<u8> {
  minimal_cli_image_with(true, sample_guid(), "Module1.dll")
}

pub(crate) fn sample_guid() -> [u8; 16] {
  [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::OpenOptions;
  use crate::image::Image;

  #[test]
  fn minimal_image_parses_and_exposes_module_row() {
    let bytes = minimal_cli_image();
    let image = Image::open_from_bytes(bytes, "test.dll".to_string(), OpenOptions::default()).unwrap();

    assert_eq!(image.table_rows(crate::metadata::streams::tables::rows::ModuleRow::ID), 1);
    assert!(!image.uncompressed_metadata());
    assert_eq!(image.entry_point(), Some(0x0600_0001));
    assert_eq!(image.guid(), sample_guid());
  }

  #[test]
  fn uncompressed_variant_sets_the_flag() {
    let bytes = minimal_cli_image_uncompressed();
    let image = Image::open_from_bytes(bytes, "test.dll".to_string(), OpenOptions::default()).unwrap();

    assert!(image.uncompressed_metadata());
  }
}
