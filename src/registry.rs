//! The process-wide, deduplicating image registry (C6, §3, §4.7, §5).
//!
//! Four maps partitioned by the ref-only flag: `{path → image}` and `{guid-string → image}`,
//! each in a regular and a ref-only variant, behind one [`Mutex`]. The GUID side is a
//! `HashMap<String, Vec<Arc<Image>>>` rather than Mono's single-valued map rebuilt quadratically
//! on every close — `spec.md` §9 flags that rebuild as an open question and recommends exactly
//! this multimap (see `DESIGN.md`).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::{OpenOptions, RegistryOptions};
use crate::image::Image;
use crate::status::Error;

#[derive(Default)]
struct Maps {
  path: HashMap<String, Arc<Image>>,
  guid: HashMap<String, Vec<Arc<Image>>>,
}

#[derive(Default)]
struct RegistryState {
  regular: Maps,
  ref_only: Maps,
  /// Images retained past their logical last close when `debug_assembly_unload` is set (§4.6).
  retained: Vec<Arc<Image>>,
}

impl RegistryState {
  fn maps(&self, ref_only: bool) -> &Maps {
    if ref_only {
      &self.ref_only
    } else {
      &self.regular
    }
  }

  fn maps_mut(&mut self, ref_only: bool) -> &mut Maps {
    if ref_only {
      &mut self.ref_only
    } else {
      &mut self.regular
    }
  }
}

/// A process-wide registry of open images (§4.7). Abstracted as a value rather than a hidden
/// global (§9 "Global state") — callers hold a `Registry` and pass it to every open/close.
pub struct Registry {
  state: Mutex<RegistryState>,
  options: RegistryOptions,
}

impl Registry {
  /// Creates a registry with default options.
  pub fn new() -> Self {
    Self::with_options(RegistryOptions::default())
  }

  /// Creates a registry reading `MONO_DEBUG_ASSEMBLY_UNLOAD` once, as `mono_images_init` does.
  pub fn from_env() -> Self {
    Self::with_options(RegistryOptions::from_env())
  }

  pub fn with_options(options: RegistryOptions) -> Self {
    Self {
      state: Mutex::new(RegistryState::default()),
      options,
    }
  }

  // -- open protocol (§4.7) ----------------------------------------------------------------------

  /// Opens the image at `path`, or returns the already-registered one with an added reference
  /// (§4.7's cache-miss protocol). Canonicalizes `path` first so the same file reached through two
  /// different spellings still dedupes.
  pub fn open(&self, path: impl AsRef<Path>, ref_only: bool) -> Result<Arc<Image>, Error> {
    self.open_with(path, OpenOptions { ref_only, ..OpenOptions::default() })
  }

  /// As [`open`](Self::open), with full control over [`OpenOptions`].
  pub fn open_with(&self, path: impl AsRef<Path>, opts: OpenOptions) -> Result<Arc<Image>, Error> {
    let canonical = std::fs::canonicalize(path.as_ref())?;
    let canonical = canonical.to_string_lossy().into_owned();

    if let Some(existing) = self.loaded(&canonical, opts.ref_only) {
      existing.addref();
      return Ok(existing);
    }

    // Parse outside the lock (§5): this is the expensive step, and the only one that may race.
    let bytes = std::fs::read(&canonical)?;
    let image = Arc::new(Image::open_from_bytes(bytes, canonical, opts)?);

    Ok(self.register(image))
  }

  /// Opens `bytes` as an in-memory image, moving ownership of the `Vec` (the zero-copy path;
  /// `copy = false` in `spec.md` §4.7's "in-memory open"). The synthetic path is `data-<ptr>`.
  pub fn open_from_bytes(&self, bytes: Vec<u8>, ref_only: bool) -> Result<Arc<Image>, Error> {
    self.open_bytes_with(bytes, OpenOptions { ref_only, copy: false, ..OpenOptions::default() })
  }

  /// As [`open_from_bytes`](Self::open_from_bytes), cloning `bytes` first (`copy = true`) for a
  /// caller that cannot give up ownership of the slice.
  pub fn open_from_bytes_copied(&self, bytes: &[u8], ref_only: bool) -> Result<Arc<Image>, Error> {
    self.open_bytes_with(bytes.to_vec(), OpenOptions { ref_only, copy: true, ..OpenOptions::default() })
  }

  fn open_bytes_with(&self, bytes: Vec<u8>, opts: OpenOptions) -> Result<Arc<Image>, Error> {
    let path = format!("data-{:p}", bytes.as_ptr());
    let image = Arc::new(Image::open_from_bytes(bytes, path, opts)?);

    Ok(self.register(image))
  }

  /// Parses the PE/COFF envelope only, skipping the CLI parser entirely and bypassing the
  /// registry (§4.7 "raw PE open"). Used for version-info extraction, where CLI awareness and
  /// deduplication are both unwanted.
  pub fn open_pe_only(path: impl AsRef<Path>) -> Result<Arc<Image>, Error> {
    let canonical = std::fs::canonicalize(path.as_ref())?;
    let canonical_str = canonical.to_string_lossy().into_owned();
    let bytes = std::fs::read(&canonical)?;

    Ok(Arc::new(Image::open_from_bytes(bytes, canonical_str, OpenOptions::pe_only())?))
  }

  /// Publishes a freshly parsed image, folding it into an existing registration if another
  /// thread won the race for the same path in the meantime (§4.7 step 4, §5 "ordering").
  fn register(&self, image: Arc<Image>) -> Arc<Image> {
    let ref_only = image.ref_only();
    let path = image.filename().to_string();

    let mut state = self.state.lock().unwrap();

    if let Some(existing) = state.maps(ref_only).path.get(&path) {
      // Another thread published first; discard the fresh parse by letting `image` drop once
      // this function returns (it was never inserted anywhere, so nothing to deregister).
      existing.addref();
      return existing.clone();
    }

    if let Some(name) = image.name() {
      if name != path && !state.maps(ref_only).path.contains_key(name) {
        state.maps_mut(ref_only).path.insert(name.to_string(), image.clone());
      }
    }

    state.maps_mut(ref_only).path.insert(path, image.clone());
    state
      .maps_mut(ref_only)
      .guid
      .entry(image.guid_string().to_string())
      .or_default()
      .push(image.clone());

    image
  }

  fn deregister(&self, image: &Arc<Image>) {
    let ref_only = image.ref_only();
    let path = image.filename();
    let guid = image.guid_string().to_string();

    let mut state = self.state.lock().unwrap();

    if matches!(state.maps(ref_only).path.get(path), Some(existing) if Arc::ptr_eq(existing, image)) {
      state.maps_mut(ref_only).path.remove(path);
    }

    if let Some(name) = image.name() {
      if matches!(state.maps(ref_only).path.get(name), Some(existing) if Arc::ptr_eq(existing, image)) {
        state.maps_mut(ref_only).path.remove(name);
      }
    }

    if let Some(bucket) = state.maps_mut(ref_only).guid.get_mut(&guid) {
      bucket.retain(|candidate| !Arc::ptr_eq(candidate, image));

      if bucket.is_empty() {
        state.maps_mut(ref_only).guid.remove(&guid);
      }
    }
  }

  // -- lookup (no parse) --------------------------------------------------------------------------

  pub fn loaded(&self, path: &str, ref_only: bool) -> Option<Arc<Image>> {
    self.state.lock().unwrap().maps(ref_only).path.get(path).cloned()
  }

  /// The first image registered under `guid` (document order), or `None`. Several images may
  /// legitimately share a GUID (§4.7's multimap resolves this rather than Mono's last-wins hash).
  pub fn loaded_by_guid(&self, guid: &str, ref_only: bool) -> Option<Arc<Image>> {
    self.state.lock().unwrap().maps(ref_only).guid.get(guid).and_then(|bucket| bucket.first()).cloned()
  }

  /// All images currently registered under `guid`, in insertion order.
  pub fn all_loaded_by_guid(&self, guid: &str, ref_only: bool) -> Vec<Arc<Image>> {
    self.state.lock().unwrap().maps(ref_only).guid.get(guid).cloned().unwrap_or_default()
  }

  // -- ref counting (§4.6, §5) ---------------------------------------------------------------------

  /// Increments `image`'s reference count. Never holds the registry lock (§5).
  pub fn addref(&self, image: &Arc<Image>) {
    image.addref();
  }

  /// Decrements `image`'s reference count; when it reaches zero, deregisters, destroys the
  /// per-image caches, recursively closes loaded sub-images, and (absent debug retention) lets
  /// the last `Arc` drop (§4.6).
  pub fn close(&self, image: Arc<Image>) {
    if image.release() != 0 {
      return;
    }

    self.deregister(&image);
    image.destroy_caches();

    let subs: Vec<Arc<Image>> = image.loaded_modules().into_iter().chain(image.loaded_files()).collect();

    for sub in subs {
      self.close(sub);
    }

    if self.options.debug_assembly_unload {
      image.mark_unloaded();
      self.state.lock().unwrap().retained.push(image);
    }
  }
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::minimal_cli_image;
  use std::io::Write;

  fn write_fixture(dir: &std::path::Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();

    file.write_all(bytes).unwrap();

    path
  }

  #[test]
  fn open_close_balances_ref_count() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Registry::new();

    let first = registry.open(&path, false).unwrap();
    let canonical = first.filename().to_string();

    assert!(registry.loaded(&canonical, false).is_some());

    registry.close(first);

    assert!(registry.loaded(&canonical, false).is_none());
  }

  #[test]
  fn second_open_returns_same_image_and_addrefs() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Registry::new();

    let first = registry.open(&path, false).unwrap();
    let second = registry.open(&path, false).unwrap();

    assert!(Arc::ptr_eq(&first, &second));

    registry.close(first);
    assert!(registry.loaded(second.filename(), false).is_some());

    registry.close(second);
  }

  #[test]
  fn ref_only_and_regular_are_distinct_images() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Registry::new();

    let regular = registry.open(&path, false).unwrap();
    let ref_only = registry.open(&path, true).unwrap();

    assert!(!Arc::ptr_eq(&regular, &ref_only));

    registry.close(regular);
    registry.close(ref_only);
  }

  #[test]
  fn loaded_by_guid_finds_the_registered_image() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Registry::new();

    let image = registry.open(&path, false).unwrap();
    let found = registry.loaded_by_guid(image.guid_string(), false).unwrap();

    assert!(Arc::ptr_eq(&image, &found));

    registry.close(image);
    assert!(registry.loaded_by_guid(found.guid_string(), false).is_none());
  }

  #[test]
  fn concurrent_opens_converge_on_one_image() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..16)
      .map(|_| {
        let registry = registry.clone();
        let path = path.clone();

        std::thread::spawn(move || registry.open(&path, false).unwrap())
      })
      .collect();

    let images: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &images[0];

    assert!(images.iter().all(|image| Arc::ptr_eq(image, first)));

    for image in images {
      registry.close(image);
    }

    assert!(registry.loaded(first.filename(), false).is_none());
  }

  #[test]
  fn debug_retention_keeps_image_marked_unloaded_but_unreachable() {
    let dir = tempdir();
    let path = write_fixture(dir.path(), "a.dll", &minimal_cli_image());
    let registry = Registry::with_options(RegistryOptions { debug_assembly_unload: true });

    let image = registry.open(&path, false).unwrap();
    let canonical = image.filename().to_string();

    registry.close(image);

    assert!(registry.loaded(&canonical, false).is_none());
    assert_eq!(registry.state.lock().unwrap().retained.len(), 1);
    assert!(registry.state.lock().unwrap().retained[0].is_unloaded());
  }

  #[test]
  fn open_from_bytes_uses_synthetic_path() {
    let registry = Registry::new();
    let image = registry.open_from_bytes(minimal_cli_image(), false).unwrap();

    assert!(image.filename().starts_with("data-"));

    registry.close(image);
  }

  fn tempdir() -> TempDir {
    let path = std::env::temp_dir().join(format!("ecma335-registry-test-{:p}", &path_marker()));

    std::fs::create_dir_all(&path).unwrap();

    TempDir(path)
  }

  fn path_marker() -> Box<u8> {
    Box::new(0)
  }

  struct TempDir(std::path::PathBuf);

  impl TempDir {
    fn path(&self) -> &std::path::Path {
      &self.0
    }
  }

  impl Drop for TempDir {
    fn drop(&mut self) {
      let _ = std::fs::remove_dir_all(&self.0);
    }
  }
}
