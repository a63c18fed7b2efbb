//! The per-image cache registry (§3, §4.5, §4.6, §9 "Per-image caches").
//!
//! The core only owns the *lifecycle* of these caches — create empty at open, destroy at close —
//! not their semantics, which belong to collaborators outside this crate's scope. They are
//! modeled here as opaque handles rather than typed maps so the loader never needs to know what a
//! collaborator stores in them.

use std::sync::Mutex;

/// The kind of cache an image owns one instance of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheKind {
  Method,
  Class,
  Field,
  Wrapper,
  Signature,
}

const KINDS: [CacheKind; 5] = [
  CacheKind::Method,
  CacheKind::Class,
  CacheKind::Field,
  CacheKind::Wrapper,
  CacheKind::Signature,
];

/// An opaque handle to one per-image cache. Has no accessible state: collaborators that know what
/// to store address it through their own, separately-maintained side tables keyed by this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHandle(CacheKind);

impl CacheHandle {
  pub fn kind(&self) -> CacheKind {
    self.0
  }
}

/// The set of per-image caches, created empty at open and destroyed at close.
#[derive(Debug)]
pub struct CacheRegistry {
  live: Mutex<Vec<CacheKind>>,
}

impl CacheRegistry {
  /// Creates every known cache kind, empty, as `do_open`'s construct phase does.
  pub fn new() -> Self {
    Self {
      live: Mutex::new(KINDS.to_vec()),
    }
  }

  /// Returns the handle for `kind`, or `None` if it has already been destroyed.
  pub fn get(&self, kind: CacheKind) -> Option<CacheHandle> {
    let live = self.live.lock().unwrap();

    live.contains(&kind).then_some(CacheHandle(kind))
  }

  /// Destroys every live cache handle. Called once, from `close`, when the image's ref count
  /// reaches zero.
  pub fn destroy_all(&self) {
    self.live.lock().unwrap().clear();
  }
}

impl Default for CacheRegistry {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_registry_has_every_kind_live() {
    let caches = CacheRegistry::new();

    for kind in KINDS {
      assert!(caches.get(kind).is_some());
    }
  }

  #[test]
  fn destroy_all_empties_the_registry() {
    let caches = CacheRegistry::new();

    caches.destroy_all();

    assert!(caches.get(CacheKind::Method).is_none());
  }
}
