//! The image object (C5, §3, §4.5, §4.6, §4.8, §4.9): the central entity this crate loads,
//! registers, and hands back to collaborators. Aggregates the PE/COFF envelope (C3), the CLI
//! header and metadata root (C4), the per-image cache registry, and the module/file sub-image
//! slots, and owns their lifecycle from `do_open` through `close`.

use core::fmt;
use std::ffi::CStr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::bytes::ByteSliceExt;
use crate::cache::CacheRegistry;
use crate::config::OpenOptions;
use crate::metadata::headers::MetadataTablesHeader;
use crate::metadata::streams::blobs::{BlobId, BlobsHeap};
use crate::metadata::streams::guids::GuidsHeap;
use crate::metadata::streams::strings::{StringId, StringsHeap};
use crate::metadata::streams::tables::flags::FileAttributes;
use crate::metadata::streams::tables::id::RowId;
use crate::metadata::streams::tables::rows::{FileRow, ModuleRefRow};
use crate::metadata::streams::tables::TablesStream;
use crate::metadata::streams::user_strings::UserStringsHeap;
use crate::metadata::streams::{MetadataStream, MetadataStreamIter};
use crate::metadata::MetadataReader;
use crate::pe::format::{self, PeHeaders};
use crate::pe::headers::CliHeader;
use crate::resource::{self, ResourceDataEntry};
use crate::section::SectionTable;
use crate::status::{Error, FormatError};

use std::sync::Arc;

/// The last defined table index (`GenericParamConstraint`, ECMA-335 §II.22); `valid_mask` bits
/// above this are tolerated with a warning rather than treated as a hard error (§3, §4.3).
const LAST_DEFINED_TABLE: u32 = 44;

/// Heap descriptors: absolute `(offset, len)` pairs into the owning image's raw buffer (§3).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapDescriptors {
  pub strings: Option<(usize, usize)>,
  pub user_strings: Option<(usize, usize)>,
  pub blobs: Option<(usize, usize)>,
  pub guids: Option<(usize, usize)>,
}

/// Everything the CLI parser (C4) produces, stored with absolute offsets into the image's raw
/// buffer rather than borrowed slices, so [`Image`] needs no lifetime parameter (§9 "ownership of
/// the raw buffer").
#[derive(Clone)]
pub struct CliInfo {
  pub header: CliHeader,
  pub major_version: u16,
  pub minor_version: u16,
  pub version: String,
  pub flags: u16,
  pub uncompressed_metadata: bool,
  pub heaps: HeapDescriptors,
  pub tables_header: MetadataTablesHeader,
  /// Absolute offset and length, in the raw buffer, of the tables stream (`#~`/`#-`).
  pub tables_stream: (usize, usize),
  /// Absolute offset, in the raw buffer, of the first table row (after the tables header and its
  /// row-count array) — §4.3's `tables_base`.
  pub tables_base: usize,
}

/// A resolved, lazily-loaded module or file sub-image slot (§3, §4.8). Distinguishes "never
/// attempted" from "attempted and failed", so a failed load is not retried on every call.
#[derive(Clone)]
enum SubImageSlot {
  Unloaded,
  Loaded(Option<Arc<Image>>),
}

/// State shared between the `Regular` and `Dynamic` image variants (§9 "prefer a tagged variant").
struct Common {
  path: String,
  assembly_name: Option<String>,
  guid: [u8; 16],
  guid_string: String,
  ref_only: bool,
  ref_count: AtomicU32,
  unloaded: AtomicBool,
  caches: CacheRegistry,
  modules: Mutex<Vec<SubImageSlot>>,
  files: Mutex<Vec<SubImageSlot>>,
  assembly: Mutex<Option<Arc<Image>>>,
}

impl Common {
  fn new(path: String, guid: [u8; 16], ref_only: bool) -> Self {
    Self {
      path,
      assembly_name: None,
      guid_string: guid_to_string(&guid),
      guid,
      ref_only,
      ref_count: AtomicU32::new(1),
      unloaded: AtomicBool::new(false),
      caches: CacheRegistry::new(),
      modules: Mutex::new(Vec::new()),
      files: Mutex::new(Vec::new()),
      assembly: Mutex::new(None),
    }
  }
}

impl fmt::Debug for Common {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Common")
      .field("path", &self.path)
      .field("guid", &self.guid_string)
      .field("ref_only", &self.ref_only)
      .finish()
  }
}

/// A fully parsed, disk- or byte-backed CLI image: the C1–C4 products plus the per-image caches
/// and sub-image slots C5 owns.
pub struct RegularImage {
  common: Common,
  raw: Arc<[u8]>,
  pe: PeHeaders,
  cli: Option<CliInfo>,
  module_cctor: OnceLock<bool>,
}

/// Extra storage a reflection-emit collaborator attaches to an in-memory, runtime-constructed
/// image. This crate does not construct dynamic images (§1 Non-goals); it only models the
/// variant so the close path destructures exhaustively (§4.5, §9) and releases this storage.
#[derive(Debug, Default)]
pub struct DynamicExtra {
  pub token_to_table: std::collections::HashMap<u32, u32>,
  pub blob_cache: std::collections::HashMap<Vec<u8>, u32>,
  pub strings: Vec<String>,
  pub user_strings: Vec<Vec<u16>>,
  pub blobs: Vec<Vec<u8>>,
  pub guids: Vec<[u8; 16]>,
  pub generic_params: Vec<u32>,
  pub strong_name: Option<Vec<u8>>,
  pub resources: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct DynamicImage {
  common: Common,
  extra: Mutex<DynamicExtra>,
}

/// The loader's central entity (C5): either a regular disk/byte-backed image, or a dynamic,
/// runtime-emitted one (§4.5, §9).
#[derive(Debug)]
pub enum Image {
  Regular(RegularImage),
  Dynamic(DynamicImage),
}

impl Image {
  fn common(&self) -> &Common {
    match self {
      Self::Regular(image) => &image.common,
      Self::Dynamic(image) => &image.common,
    }
  }

  /// Constructs a dynamic image for a reflection-emit collaborator (§4.5). `guid` is whatever
  /// identity the collaborator has assigned; `path`/`name` are typically synthetic.
  pub fn new_dynamic(path: String, guid: [u8; 16], ref_only: bool) -> Arc<Self> {
    Arc::new(Self::Dynamic(DynamicImage {
      common: Common::new(path, guid, ref_only),
      extra: Mutex::new(DynamicExtra::default()),
    }))
  }

  /// Two-phase `do_open`: construct an empty image, then run the PE/CLI parsers (§4.5).
  pub(crate) fn open_from_bytes(bytes: Vec<u8>, path: String, opts: OpenOptions) -> Result<Self, Error> {
    let raw: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());

    Self::open_from_raw(raw, path, opts)
  }

  pub(crate) fn open_from_raw(raw: Arc<[u8]>, path: String, opts: OpenOptions) -> Result<Self, Error> {
    let pe = format::parse(&raw)?;

    let cli = if opts.care_about_cli {
      Some(load_cli(&raw, &pe)?)
    } else {
      None
    };

    let guid = match &cli {
      Some(cli) => read_first_guid(&raw, cli)?,
      None => [0u8; 16],
    };

    let mut common = Common::new(path, guid, opts.ref_only);

    if let Some(cli) = &cli {
      if let Some(tables) = tables_stream_of(&raw, cli) {
        if let Some(assembly) = tables.assemblies().into_iter().next() {
          if let Some(name) = strings_heap_of(&raw, cli).and_then(|h| h.get(assembly.name())) {
            common.assembly_name = Some(name.to_string_lossy().into_owned());
          }
        }

        let module_count = tables.module_refs().into_iter().count();
        let file_count = tables.files().into_iter().count();

        common.modules = Mutex::new(vec![SubImageSlot::Unloaded; module_count]);
        common.files = Mutex::new(vec![SubImageSlot::Unloaded; file_count]);
      }
    }

    Ok(Self::Regular(RegularImage {
      common,
      raw,
      pe,
      cli,
      module_cctor: OnceLock::new(),
    }))
  }

  // -- identity -------------------------------------------------------------------------------

  /// The assembly's display name (from `Assembly` row 0), or `None` for a module-only image.
  pub fn name(&self) -> Option<&str> {
    self.common().assembly_name.as_deref()
  }

  /// The canonical path this image was opened from (or the synthetic `data-<ptr>` name).
  pub fn filename(&self) -> &str {
    &self.common().path
  }

  pub fn guid(&self) -> [u8; 16] {
    self.common().guid
  }

  /// The module GUID as a 36-character hyphenated hex string.
  pub fn guid_string(&self) -> &str {
    &self.common().guid_string
  }

  pub fn ref_only(&self) -> bool {
    self.common().ref_only
  }

  pub fn is_dynamic(&self) -> bool {
    matches!(self, Self::Dynamic(_))
  }

  pub fn assembly(&self) -> Option<Arc<Image>> {
    self.common().assembly.lock().unwrap().clone()
  }

  pub(crate) fn set_assembly(&self, assembly: Arc<Image>) {
    *self.common().assembly.lock().unwrap() = Some(assembly);
  }

  // -- ref counting -----------------------------------------------------------------------------

  pub(crate) fn addref(&self) {
    self.common().ref_count.fetch_add(1, Ordering::SeqCst);
  }

  /// Decrements the ref count and returns the value *after* decrementing (§4.6, §5).
  pub(crate) fn release(&self) -> u32 {
    self.common().ref_count.fetch_sub(1, Ordering::SeqCst) - 1
  }

  pub(crate) fn mark_unloaded(&self) {
    self.common().unloaded.store(true, Ordering::SeqCst);
  }

  pub fn is_unloaded(&self) -> bool {
    self.common().unloaded.load(Ordering::SeqCst)
  }

  /// The debug-retention diagnostic name (§4.6): `filename()` with `" - UNLOADED"` appended once
  /// the image has been marked unloaded, matching the original's rename-on-retain convention.
  /// `filename()` itself never changes, since the registry has already deregistered the image
  /// under its original path by the time this is set.
  pub fn display_name(&self) -> String {
    if self.is_unloaded() {
      format!("{} - UNLOADED", self.filename())
    } else {
      self.filename().to_string()
    }
  }

  // -- PE/CLI accessors -------------------------------------------------------------------------

  fn as_regular(&self) -> Option<&RegularImage> {
    match self {
      Self::Regular(image) => Some(image),
      Self::Dynamic(_) => None,
    }
  }

  pub fn sections(&self) -> Option<&SectionTable> {
    self.as_regular().map(|image| &image.pe.sections)
  }

  pub fn has_authenticode_entry(&self) -> bool {
    self.as_regular().map_or(false, |image| image.pe.has_authenticode_entry())
  }

  /// Translates `rva` to a raw byte offset via the section table (C2, §4.1).
  pub fn rva_map(&self, rva: u32) -> Option<usize> {
    self.sections()?.rva_to_offset(rva)
  }

  /// Idempotent "ensure section mapped" (§4.1): bounds-checks and returns the slice, doing
  /// nothing stateful on repeat calls since the whole file is already resident.
  pub fn ensure_section(&self, rva: u32, len: usize) -> Option<&[u8]> {
    let image = self.as_regular()?;

    image.pe.sections.ensure_section(&image.raw, rva, len)
  }

  pub fn raw(&self) -> Option<&[u8]> {
    self.as_regular().map(|image| &image.raw[..])
  }

  fn cli_info(&self) -> Option<&CliInfo> {
    self.as_regular()?.cli.as_ref()
  }

  pub fn entry_point(&self) -> Option<u32> {
    Some(self.cli_info()?.header.entry_point_token)
  }

  pub fn uncompressed_metadata(&self) -> bool {
    self.cli_info().map_or(false, |cli| cli.uncompressed_metadata)
  }

  /// The row count of logical table `id` (0 if the table is absent or there is no CLI info).
  pub fn table_rows(&self, id: usize) -> u32 {
    self.cli_info().and_then(|cli| cli.tables_header.rows.get(id).copied()).unwrap_or(0)
  }

  /// Row count plus the three heap-width flags for table `id`.
  pub fn table_info(&self, id: usize) -> Option<(u32, crate::metadata::headers::HeapSizes)> {
    let cli = self.cli_info()?;

    Some((*cli.tables_header.rows.get(id)?, cli.tables_header.heap_sizes))
  }

  fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
    self.raw()?.get(offset..offset.checked_add(len)?)
  }

  pub fn strings_heap(&self) -> Option<StringsHeap<'_>> {
    strings_heap_of(self.raw()?, self.cli_info()?)
  }

  pub fn user_strings_heap(&self) -> Option<UserStringsHeap<'_>> {
    let (offset, len) = self.cli_info()?.heaps.user_strings?;

    Some(UserStringsHeap(self.slice(offset, len)?))
  }

  pub fn blobs_heap(&self) -> Option<BlobsHeap<'_>> {
    let (offset, len) = self.cli_info()?.heaps.blobs?;

    Some(BlobsHeap(self.slice(offset, len)?))
  }

  pub fn guids_heap(&self) -> Option<GuidsHeap<'_>> {
    let (offset, len) = self.cli_info()?.heaps.guids?;

    Some(GuidsHeap(self.slice(offset, len)?))
  }

  /// Rebuilds a [`TablesStream`] view over the tables stream bytes. Cheap: this only re-slices
  /// and re-reads the fixed-size header, it allocates nothing.
  pub fn tables(&self) -> Option<TablesStream<'_>> {
    tables_stream_of(self.raw()?, self.cli_info()?)
  }

  pub fn string(&self, id: StringId) -> Option<&CStr> {
    self.strings_heap()?.get(id)
  }

  pub fn blob(&self, id: BlobId) -> Option<&[u8]> {
    self.blobs_heap()?.get(id)
  }

  /// The public key embedded in `Assembly` row 0 (§6 `public_key`).
  pub fn public_key(&self) -> Option<&[u8]> {
    let assembly = self.tables()?.assemblies().into_iter().next()?;

    self.blob(assembly.public_key())
  }

  /// The strong-name signature bytes, RVA-mapped from the CLI header's directory entry (§6
  /// `strong_name`).
  pub fn strong_name(&self) -> Option<&[u8]> {
    let dir = self.cli_info()?.header.strong_name_signature;

    if dir.size == 0 || dir.virtual_address == 0 {
      return None;
    }

    self.ensure_section(dir.virtual_address, dir.size as usize)
  }

  /// The raw file offset of the strong-name signature, and its size (§6
  /// `strong_name_position`).
  pub fn strong_name_position(&self) -> Option<(usize, u32)> {
    let dir = self.cli_info()?.header.strong_name_signature;

    if dir.size == 0 || dir.virtual_address == 0 {
      return None;
    }

    Some((self.rva_map(dir.virtual_address)?, dir.size))
  }

  /// A resource blob at `offset` within the CLI resources directory, length-prefixed on disk
  /// (§6 `resource`); mirrors `mono_image_get_resource`.
  pub fn resource(&self, offset: u32) -> Option<&[u8]> {
    let dir = self.cli_info()?.header.resources;
    let data = self.ensure_section(dir.virtual_address, dir.size as usize)?;
    let data = data.get(offset as usize..)?;
    let mut cursor = 0usize;
    let size: u32 = data.read(&mut cursor)?;

    data.get(cursor..cursor.checked_add(size as usize)?)
  }

  /// Walks the PE resource tree (C8, §4.4) for `(res_id, lang_id)`.
  pub fn lookup_resource(&self, res_id: u32, lang_id: u32, name: Option<&str>) -> Option<ResourceDataEntry> {
    let image = self.as_regular()?;
    let directory = image.pe.resource_directory()?;

    resource::lookup_resource(&image.raw, &image.pe.sections, directory.virtual_address, res_id, lang_id, name)
  }

  // -- module static constructor (§4.9, EXPANSION) ----------------------------------------------

  /// Whether the module's `<Module>` type (`TypeDef` row 0) declares a `.cctor`. Memoized: the
  /// `TypeDef`/`MethodDef` scan only runs once, on the first call (§8 idempotence).
  pub fn has_module_cctor(&self) -> bool {
    let regular = match self.as_regular() {
      Some(regular) => regular,
      None => return false,
    };

    *regular.module_cctor.get_or_init(|| self.compute_module_cctor())
  }

  fn compute_module_cctor(&self) -> bool {
    let tables = match self.tables() {
      Some(tables) => tables,
      None => return false,
    };

    let mut type_defs = tables.type_defs().into_iter();
    let first = match type_defs.next() {
      Some(row) => row,
      None => return false,
    };

    let is_module_type = self
      .string(first.name())
      .map(|name| name.to_bytes() == b"<Module>")
      .unwrap_or(false);

    if !is_module_type {
      return false;
    }

    let method_count = tables.method_defs().into_iter().count() as u32;
    let first_method = first.method_list().index() as u32;
    let first_method = first_method.saturating_sub(1);

    let last_method = match type_defs.next() {
      Some(second) => (second.method_list().index() as u32).saturating_sub(1),
      None => method_count,
    };

    tables
      .method_defs()
      .into_iter()
      .skip(first_method as usize)
      .take(last_method.saturating_sub(first_method) as usize)
      .any(|method| {
        self
          .string(method.name())
          .map(|name| name.to_bytes() == b".cctor")
          .unwrap_or(false)
      })
  }

  // -- sub-module / file loading (C7, §4.8) -------------------------------------------------------

  /// Loads the module referenced by one-based index `idx` from the `ModuleRef` table, if not
  /// already loaded (§4.8). Returns `None` if the index is out of range or the load fails (or
  /// previously failed).
  pub fn load_module(self: &Arc<Self>, registry: &crate::registry::Registry, idx: usize) -> Option<Arc<Image>> {
    if idx == 0 {
      return None;
    }

    let slot_idx = idx - 1;

    {
      let modules = self.common().modules.lock().unwrap();

      match modules.get(slot_idx)? {
        SubImageSlot::Loaded(image) => return image.clone(),
        SubImageSlot::Unloaded => {}
      }
    }

    let result = self.resolve_module(registry, slot_idx);

    let mut modules = self.common().modules.lock().unwrap();

    if slot_idx < modules.len() {
      modules[slot_idx] = SubImageSlot::Loaded(result.clone());
    }

    result
  }

  fn resolve_module(self: &Arc<Self>, registry: &crate::registry::Registry, slot_idx: usize) -> Option<Arc<Image>> {
    let tables = self.tables()?;
    let module_ref = tables.module_refs().get(RowId::<ModuleRefRow>::new(slot_idx))?;
    let name = self.string(module_ref.name())?.to_string_lossy().into_owned();

    let files: Vec<_> = tables.files().into_iter().collect();
    let valid = files.is_empty()
      || files.iter().any(|file| {
        !file.flags().contains(FileAttributes::CONTAINS_NO_META_DATA)
          && self.string(file.name()).map(|n| n.to_bytes() == name.as_bytes()).unwrap_or(false)
      });

    if !valid {
      return None;
    }

    let path = join_with_dirname(self.filename(), &name);
    let opened = registry.open(&path, self.ref_only()).ok()?;

    opened.set_assembly(self.assembly().unwrap_or_else(|| self.clone()));

    Some(opened)
  }

  /// Loads the file referenced by one-based index `idx` from the `File` table, if not already
  /// loaded (§4.8).
  pub fn load_file(self: &Arc<Self>, registry: &crate::registry::Registry, idx: usize) -> Option<Arc<Image>> {
    if idx == 0 {
      return None;
    }

    let slot_idx = idx - 1;

    {
      let files = self.common().files.lock().unwrap();

      match files.get(slot_idx)? {
        SubImageSlot::Loaded(image) => return image.clone(),
        SubImageSlot::Unloaded => {}
      }
    }

    let result = self.resolve_file(registry, slot_idx);

    let mut files = self.common().files.lock().unwrap();

    if slot_idx < files.len() {
      files[slot_idx] = SubImageSlot::Loaded(result.clone());
    }

    result
  }

  fn resolve_file(self: &Arc<Self>, registry: &crate::registry::Registry, slot_idx: usize) -> Option<Arc<Image>> {
    let tables = self.tables()?;
    let file = tables.files().get(RowId::<FileRow>::new(slot_idx))?;
    let name = self.string(file.name())?.to_string_lossy().into_owned();
    let path = join_with_dirname(self.filename(), &name);

    let opened = registry.open(&path, self.ref_only()).ok()?;

    opened.set_assembly(self.assembly().unwrap_or_else(|| self.clone()));

    Some(opened)
  }

  pub(crate) fn loaded_modules(&self) -> Vec<Arc<Image>> {
    self
      .common()
      .modules
      .lock()
      .unwrap()
      .iter()
      .filter_map(|slot| match slot {
        SubImageSlot::Loaded(Some(image)) => Some(image.clone()),
        _ => None,
      })
      .collect()
  }

  pub(crate) fn loaded_files(&self) -> Vec<Arc<Image>> {
    self
      .common()
      .files
      .lock()
      .unwrap()
      .iter()
      .filter_map(|slot| match slot {
        SubImageSlot::Loaded(Some(image)) => Some(image.clone()),
        _ => None,
      })
      .collect()
  }

  // -- caches (§4.5, §4.6, §9) -------------------------------------------------------------------

  pub fn caches(&self) -> &CacheRegistry {
    &self.common().caches
  }

  pub(crate) fn destroy_caches(&self) {
    self.common().caches.destroy_all();
  }
}

impl Clone for SubImageSlot {
  fn clone(&self) -> Self {
    match self {
      Self::Unloaded => Self::Unloaded,
      Self::Loaded(image) => Self::Loaded(image.clone()),
    }
  }
}

impl fmt::Debug for RegularImage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegularImage")
      .field("path", &self.common.path)
      .field("len", &self.raw.len())
      .finish()
  }
}

fn join_with_dirname(parent: &str, name: &str) -> String {
  Path::new(parent)
    .parent()
    .unwrap_or_else(|| Path::new(""))
    .join(name)
    .to_string_lossy()
    .into_owned()
}

/// Stringifies a 16-byte GUID as a 36-character hyphenated hex string, using the standard
/// little-endian-prefixed layout (`Data1-Data2-Data3-Data4`) the `#GUID` heap's binary format
/// follows.
fn guid_to_string(guid: &[u8; 16]) -> String {
  format!(
    "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
    guid[3], guid[2], guid[1], guid[0],
    guid[5], guid[4],
    guid[7], guid[6],
    guid[8], guid[9],
    guid[10], guid[11], guid[12], guid[13], guid[14], guid[15],
  )
}

fn read_first_guid(raw: &[u8], cli: &CliInfo) -> Result<[u8; 16], Error> {
  let (offset, len) = cli.heaps.guids.ok_or(FormatError::MissingGuidHeap)?;

  if len < 16 {
    return Err(FormatError::GuidHeapTooShort.into());
  }

  let bytes = raw.get(offset..offset + 16).ok_or(FormatError::GuidHeapTooShort)?;

  Ok(bytes.try_into().expect("checked length above"))
}

fn offset_within(outer: &[u8], inner: &[u8]) -> usize {
  (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

/// Re-slices `raw` into a [`TablesStream`] view using the offsets [`load_cli`] recorded, without
/// requiring a fully constructed [`Image`]. Used both while building a new image (to pre-size the
/// module/file slots and resolve the assembly name) and, via [`Image::tables`], afterwards.
fn tables_stream_of<'a>(raw: &'a [u8], cli: &CliInfo) -> Option<TablesStream<'a>> {
  let (offset, len) = cli.tables_stream;

  TablesStream::from_bytes(raw.get(offset..offset.checked_add(len)?)?).ok()
}

fn strings_heap_of<'a>(raw: &'a [u8], cli: &CliInfo) -> Option<StringsHeap<'a>> {
  let (offset, len) = cli.heaps.strings?;

  Some(StringsHeap(raw.get(offset..offset.checked_add(len)?)?))
}

/// Runs the CLI parser (C4, §4.3): locates the CLI header, the metadata root, the five heaps, and
/// the tables-stream header, recording absolute offsets into `raw` rather than borrowed slices.
fn load_cli(raw: &[u8], pe: &PeHeaders) -> Result<CliInfo, Error> {
  let cli_dir = pe.cli_header_directory().ok_or(FormatError::MissingCliHeader)?;
  let cli_offset = pe.sections.rva_to_offset(cli_dir.virtual_address).ok_or(FormatError::MissingCliHeader)?;
  let cli_bytes = raw
    .get(cli_offset..cli_offset + cli_dir.size.max(72) as usize)
    .ok_or(FormatError::MissingCliHeader)?;
  let header: CliHeader = cli_bytes.read(&mut 0).ok_or(FormatError::MissingCliHeader)?;

  let metadata_dir = header.metadata;
  let metadata_offset = pe
    .sections
    .rva_to_offset(metadata_dir.virtual_address)
    .ok_or(FormatError::MissingCliHeader)?;
  let metadata_bytes = raw
    .get(metadata_offset..metadata_offset + metadata_dir.size as usize)
    .ok_or(FormatError::TooShort)?;

  let reader = MetadataReader::from_bytes(metadata_bytes).map_err(|err| match err {
    crate::metadata::errors::MetadataReadError::NotEnough => FormatError::TooShort,
    crate::metadata::errors::MetadataReadError::BadSignature(sig) => FormatError::BadMetadataSignature(sig),
  })?;

  let major_version = reader.header().major_version;
  let minor_version = reader.header().minor_version;
  let version = reader.header().version.to_string_lossy().into_owned();
  let flags = reader.header().flags;

  let mut heaps = HeapDescriptors::default();
  let mut tables_stream: Option<(usize, usize, bool)> = None;

  for stream in streams_of(&reader) {
    let (name, data) = stream?;

    match name {
      b"#~" => tables_stream = Some((offset_within(raw, data), data.len(), false)),
      b"#-" => {
        log::info!("image has uncompressed (#-) metadata tables stream");
        tables_stream = Some((offset_within(raw, data), data.len(), true));
      }
      b"#Strings" => heaps.strings = Some((offset_within(raw, data), data.len())),
      b"#US" => heaps.user_strings = Some((offset_within(raw, data), data.len())),
      b"#Blob" => heaps.blobs = Some((offset_within(raw, data), data.len())),
      b"#GUID" => heaps.guids = Some((offset_within(raw, data), data.len())),
      other => log::warn!("unrecognized metadata stream {:?}", String::from_utf8_lossy(other)),
    }
  }

  let (tables_offset, tables_len, uncompressed_metadata) =
    tables_stream.ok_or(FormatError::MissingTablesStream)?;

  let tables_bytes = raw.get(tables_offset..tables_offset + tables_len).ok_or(FormatError::TooShort)?;
  let tables_header: MetadataTablesHeader =
    tables_bytes.read(&mut 0).ok_or(FormatError::TooShort)?;

  if tables_header.valid & !((1u64 << (LAST_DEFINED_TABLE + 1)) - 1) != 0 {
    log::warn!("valid_mask has bits set above table {LAST_DEFINED_TABLE}; ignoring them");
  }

  let mut header_len_cursor = 0usize;
  let _: MetadataTablesHeader = tables_bytes.read(&mut header_len_cursor).ok_or(FormatError::TooShort)?;
  let tables_base = tables_offset + header_len_cursor;

  Ok(CliInfo {
    header,
    major_version,
    minor_version,
    version,
    flags,
    uncompressed_metadata,
    heaps,
    tables_header,
    tables_stream: (tables_offset, tables_len),
    tables_base,
  })
}

/// Iterates metadata streams, yielding `(name, data)` for both recognized streams (via
/// [`MetadataStreamIter`]'s enum dispatch) and unrecognized ones (including `#-`, which the
/// dispatch in [`crate::metadata::streams`] only classifies as `#~`).
fn streams_of<'a>(reader: &'a MetadataReader<'a>) -> impl Iterator<Item = Result<(&'a [u8], &'a [u8]), FormatError>> {
  StreamsOf { iter: reader.streams() }
}

struct StreamsOf<'a> {
  iter: MetadataStreamIter<'a>,
}

impl<'a> Iterator for StreamsOf<'a> {
  type Item = Result<(&'a [u8], &'a [u8]), FormatError>;

  fn next(&mut self) -> Option<Self::Item> {
    let item = self.iter.next()?;

    Some(match item {
      Ok(MetadataStream::Tables(tables)) => Ok((&b"#~"[..], tables.bytes())),
      Ok(MetadataStream::Strings(strings)) => Ok((&b"#Strings"[..], strings.0)),
      Ok(MetadataStream::UserStrings(user_strings)) => Ok((&b"#US"[..], user_strings.0)),
      Ok(MetadataStream::Blobs(blobs)) => Ok((&b"#Blob"[..], blobs.0)),
      Ok(MetadataStream::Guids(guids)) => Ok((&b"#GUID"[..], guids.0)),
      Ok(MetadataStream::Unrecognized { header, data }) => Ok((header.name.to_bytes(), data)),
      Err(_) => Err(FormatError::TooShort),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guid_to_string_matches_dotnet_layout() {
    let guid = [
      0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
    ];

    assert_eq!(guid_to_string(&guid), "04030201-0605-0807-090a-0b0c0d0e0f10");
  }
}
