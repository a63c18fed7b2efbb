//! Bit-field and enumeration column types shared by several metadata table rows.
//!
//! Values are transcribed from ECMA-335 partition II, §23.1.

use crate::bytes::bitflags;

bitflags! {
  /// `TypeAttributes`, ECMA-335 §II.23.1.15.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct TypeAttributes : u32 {
    const VISIBILITY_MASK = 0x0000_0007;
    const NOT_PUBLIC = 0x0000_0000;
    const PUBLIC = 0x0000_0001;
    const NESTED_PUBLIC = 0x0000_0002;
    const NESTED_PRIVATE = 0x0000_0003;
    const NESTED_FAMILY = 0x0000_0004;
    const NESTED_ASSEMBLY = 0x0000_0005;
    const NESTED_FAM_AND_ASSEM = 0x0000_0006;
    const NESTED_FAM_OR_ASSEM = 0x0000_0007;
    const LAYOUT_MASK = 0x0000_0018;
    const SEQUENTIAL_LAYOUT = 0x0000_0008;
    const EXPLICIT_LAYOUT = 0x0000_0010;
    const CLASS_SEMANTICS_MASK = 0x0000_0020;
    const INTERFACE = 0x0000_0020;
    const ABSTRACT = 0x0000_0080;
    const SEALED = 0x0000_0100;
    const SPECIAL_NAME = 0x0000_0400;
    const IMPORT = 0x0000_1000;
    const SERIALIZABLE = 0x0000_2000;
    const STRING_FORMAT_MASK = 0x0003_0000;
    const UNICODE_CLASS = 0x0001_0000;
    const AUTO_CLASS = 0x0002_0000;
    const CUSTOM_FORMAT_CLASS = 0x0003_0000;
    const CUSTOM_FORMAT_MASK = 0x00C0_0000;
    const BEFORE_FIELD_INIT = 0x0010_0000;
    const RT_SPECIAL_NAME = 0x0000_0800;
    const HAS_SECURITY = 0x0004_0000;
    const IS_TYPE_FORWARDER = 0x0020_0000;
  }
}

bitflags! {
  /// `FieldAttributes`, ECMA-335 §II.23.1.5.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct FieldAttributes : u16 {
    const FIELD_ACCESS_MASK = 0x0007;
    const PRIVATE_SCOPE = 0x0000;
    const PRIVATE = 0x0001;
    const FAM_AND_ASSEM = 0x0002;
    const ASSEMBLY = 0x0003;
    const FAMILY = 0x0004;
    const FAM_OR_ASSEM = 0x0005;
    const PUBLIC = 0x0006;
    const STATIC = 0x0010;
    const INIT_ONLY = 0x0020;
    const LITERAL = 0x0040;
    const NOT_SERIALIZED = 0x0080;
    const SPECIAL_NAME = 0x0200;
    const PINVOKE_IMPL = 0x2000;
    const RT_SPECIAL_NAME = 0x0400;
    const HAS_FIELD_MARSHAL = 0x1000;
    const HAS_DEFAULT = 0x8000;
    const HAS_FIELD_RVA = 0x0100;
  }
}

bitflags! {
  /// `MethodAttributes`, ECMA-335 §II.23.1.10.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct MethodAttributes : u16 {
    const MEMBER_ACCESS_MASK = 0x0007;
    const COMPILER_CONTROLLED = 0x0000;
    const PRIVATE = 0x0001;
    const FAM_AND_ASSEM = 0x0002;
    const ASSEMBLY = 0x0003;
    const FAMILY = 0x0004;
    const FAM_OR_ASSEM = 0x0005;
    const PUBLIC = 0x0006;
    const STATIC = 0x0010;
    const FINAL = 0x0020;
    const VIRTUAL = 0x0040;
    const HIDE_BY_SIG = 0x0080;
    const VTABLE_LAYOUT_MASK = 0x0100;
    const NEW_SLOT = 0x0100;
    const STRICT = 0x0200;
    const ABSTRACT = 0x0400;
    const SPECIAL_NAME = 0x0800;
    const PINVOKE_IMPL = 0x2000;
    const UNMANAGED_EXPORT = 0x0008;
    const RT_SPECIAL_NAME = 0x1000;
    const HAS_SECURITY = 0x4000;
    const REQUIRE_SEC_OBJECT = 0x8000;
  }
}

bitflags! {
  /// `MethodImplAttributes`, ECMA-335 §II.23.1.10.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct MethodImplAttributes : u16 {
    const CODE_TYPE_MASK = 0x0003;
    const IL = 0x0000;
    const NATIVE = 0x0001;
    const OPTIL = 0x0002;
    const RUNTIME = 0x0003;
    const MANAGED_MASK = 0x0004;
    const UNMANAGED = 0x0004;
    const FORWARD_REF = 0x0010;
    const PRESERVE_SIG = 0x0080;
    const INTERNAL_CALL = 0x1000;
    const SYNCHRONIZED = 0x0020;
    const NO_INLINING = 0x0008;
    const NO_OPTIMIZATION = 0x0040;
    const AGGRESSIVE_INLINING = 0x0100;
    const AGGRESSIVE_OPTIMIZATION = 0x0200;
    const SECURITY_MITIGATIONS = 0x0400;
  }
}

bitflags! {
  /// `AssemblyFlags`, ECMA-335 §II.23.1.2.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct AssemblyFlags : u32 {
    const PUBLIC_KEY = 0x0001;
    const CONTENT_TYPE_WINDOWS_RUNTIME = 0x0200;
    const RETARGETABLE = 0x0100;
    const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
    const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
  }
}

bitflags! {
  /// `EventAttributes`, ECMA-335 §II.23.1.4.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct EventAttributes : u16 {
    const SPECIAL_NAME = 0x0200;
    const RT_SPECIAL_NAME = 0x0400;
  }
}

bitflags! {
  /// `FileAttributes`, ECMA-335 §II.23.1.6.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct FileAttributes : u32 {
    const CONTAINS_META_DATA = 0x0000;
    const CONTAINS_NO_META_DATA = 0x0001;
  }
}

bitflags! {
  /// `GenericParamAttributes`, ECMA-335 §II.23.1.7.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct GenericParamAttributes : u16 {
    const VARIANCE_MASK = 0x0003;
    const COVARIANT = 0x0001;
    const CONTRAVARIANT = 0x0002;
    const SPECIAL_CONSTRAINT_MASK = 0x001C;
    const REFERENCE_TYPE_CONSTRAINT = 0x0004;
    const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
    const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
  }
}

bitflags! {
  /// `PInvokeAttributes`, ECMA-335 §II.23.1.8.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct PInvokeAttributes : u16 {
    const NO_MANGLE = 0x0001;
    const CHAR_SET_MASK = 0x0006;
    const CHAR_SET_ANSI = 0x0002;
    const CHAR_SET_UNICODE = 0x0004;
    const CHAR_SET_AUTO = 0x0006;
    const SUPPORTS_LAST_ERROR = 0x0040;
    const CALL_CONV_MASK = 0x0700;
    const CALL_CONV_WINAPI = 0x0100;
    const CALL_CONV_CDECL = 0x0200;
    const CALL_CONV_STDCALL = 0x0300;
    const CALL_CONV_THISCALL = 0x0400;
    const CALL_CONV_FASTCALL = 0x0500;
    const BEST_FIT_MASK = 0x0030;
    const BEST_FIT_ENABLED = 0x0010;
    const BEST_FIT_DISABLED = 0x0020;
    const THROW_ON_UNMAPPABLE_MASK = 0x3000;
    const THROW_ON_UNMAPPABLE_ENABLED = 0x1000;
    const THROW_ON_UNMAPPABLE_DISABLED = 0x2000;
  }
}

bitflags! {
  /// `ManifestResourceAttributes`, ECMA-335 §II.23.1.9.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct ManifestResourceAttributes : u32 {
    const VISIBILITY_MASK = 0x0007;
    const PUBLIC = 0x0001;
    const PRIVATE = 0x0002;
  }
}

bitflags! {
  /// `MethodSemanticsAttributes`, ECMA-335 §II.23.1.12.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct MethodSemanticsAttributes : u16 {
    const SETTER = 0x0001;
    const GETTER = 0x0002;
    const OTHER = 0x0004;
    const ADD_ON = 0x0008;
    const REMOVE_ON = 0x0010;
    const FIRE = 0x0020;
  }
}

bitflags! {
  /// `ParamAttributes`, ECMA-335 §II.23.1.13.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct ParamAttributes : u16 {
    const IN = 0x0001;
    const OUT = 0x0002;
    const OPTIONAL = 0x0010;
    const HAS_DEFAULT = 0x1000;
    const HAS_FIELD_MARSHAL = 0x2000;
  }
}

bitflags! {
  /// `PropertyAttributes`, ECMA-335 §II.23.1.14.
  #[derive(Default, Copy, Clone, Debug)]
  pub struct PropertyAttributes : u16 {
    const SPECIAL_NAME = 0x0200;
    const RT_SPECIAL_NAME = 0x0400;
    const HAS_DEFAULT = 0x1000;
  }
}

/// `AssemblyHashAlgorithm`, ECMA-335 §II.23.1.1.
///
/// Not a bit field: exactly one algorithm is named per assembly. Unrecognized values are
/// preserved rather than rejected, mirroring how the rest of this crate treats unknown wire
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyHashAlgorithm {
  None,
  Md5,
  Sha1,
  Sha256,
  Sha384,
  Sha512,
  Unknown(u32),
}

impl From<u32> for AssemblyHashAlgorithm {
  fn from(val: u32) -> Self {
    match val {
      0x0000_0000 => Self::None,
      0x0000_8003 => Self::Md5,
      0x0000_8004 => Self::Sha1,
      0x0000_8008 => Self::Sha256,
      0x0000_8009 => Self::Sha384,
      0x0000_800C => Self::Sha512,
      other => Self::Unknown(other),
    }
  }
}

/// The subset of `ELEMENT_TYPE_*` constants (ECMA-335 §II.23.1.16) that can appear as the `Type`
/// column of the `Constant` table. Signature-only element types (arrays, generics, modifiers) are
/// decoded by the signature collaborator, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ElementType {
  Boolean,
  Char,
  I1,
  U1,
  I2,
  U2,
  I4,
  U4,
  I8,
  U8,
  R4,
  R8,
  String,
  Class,
  Unknown(u8),
}

impl From<u8> for ElementType {
  fn from(val: u8) -> Self {
    match val {
      0x02 => Self::Boolean,
      0x03 => Self::Char,
      0x04 => Self::I1,
      0x05 => Self::U1,
      0x06 => Self::I2,
      0x07 => Self::U2,
      0x08 => Self::I4,
      0x09 => Self::U4,
      0x0a => Self::I8,
      0x0b => Self::U8,
      0x0c => Self::R4,
      0x0d => Self::R8,
      0x0e => Self::String,
      0x12 => Self::Class,
      other => Self::Unknown(other),
    }
  }
}

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {
  use super::{AssemblyHashAlgorithm, ElementType};
  use crate::bytes::{ByteSliceExt, ByteSize, FromBytes};

  impl FromBytes<'_> for AssemblyHashAlgorithm {
    fn from_bytes(buf: &[u8], offset: &mut usize, _: ()) -> Option<Self> {
      Some(buf.read::<u32>(offset)?.into())
    }
  }

  impl ByteSize<()> for AssemblyHashAlgorithm {
    fn byte_size(_: ()) -> usize {
      core::mem::size_of::<u32>()
    }
  }

  impl FromBytes<'_> for ElementType {
    fn from_bytes(buf: &[u8], offset: &mut usize, _: ()) -> Option<Self> {
      Some(buf.read::<u8>(offset)?.into())
    }
  }

  impl ByteSize<()> for ElementType {
    fn byte_size(_: ()) -> usize {
      core::mem::size_of::<u8>()
    }
  }
}

#[cfg(feature = "read")]
pub use read::*;
