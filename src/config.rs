//! Per-call open options and process-wide registry configuration.

/// Options controlling a single `open`/`open_from_bytes` call.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
  /// Load for inspection only; partitions the registry (§4.7) from fully executable opens.
  pub ref_only: bool,
  /// Run the CLI parser (C4). When `false`, only the PE/COFF envelope is parsed.
  pub care_about_cli: bool,
  /// For `open_from_bytes`: clone the caller's slice instead of taking ownership of a `Vec<u8>`.
  pub copy: bool,
}

impl Default for OpenOptions {
  fn default() -> Self {
    Self {
      ref_only: false,
      care_about_cli: true,
      copy: false,
    }
  }
}

impl OpenOptions {
  /// The options used by `open_pe_only`: no CLI parsing, no registry.
  pub fn pe_only() -> Self {
    Self {
      care_about_cli: false,
      ..Self::default()
    }
  }
}

/// Process-wide configuration read once when a [Registry](crate::registry::Registry) is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
  /// When set, `close` retains the last reference to a fully-unreferenced image instead of
  /// dropping it, renaming it with an `" - UNLOADED"` suffix, to aid use-after-free diagnosis.
  /// Mirrors the `MONO_DEBUG_ASSEMBLY_UNLOAD` environment variable.
  pub debug_assembly_unload: bool,
}

impl RegistryOptions {
  /// Reads [RegistryOptions] from the environment, the way `mono_images_init` reads
  /// `MONO_DEBUG_ASSEMBLY_UNLOAD` once at process start.
  pub fn from_env() -> Self {
    Self {
      debug_assembly_unload: std::env::var_os("MONO_DEBUG_ASSEMBLY_UNLOAD").is_some(),
    }
  }
}
