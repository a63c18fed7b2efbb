//! External status codes and the internal error type they summarize.
//!
//! Parsers return the richer [Error]/[FormatError] so a caller that wants detail can get it;
//! [Registry](crate::registry::Registry) and [Image](crate::image::Image) collapse any failure to
//! a [Status] at the public boundary, matching the small external status enum loader consumers
//! expect.

use core::fmt;

/// Status returned by the loader's open entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Status {
  /// The operation succeeded.
  Ok,
  /// A file I/O operation failed; the operating-system error has been discarded.
  ErrorErrno,
  /// The image violates the PE/COFF or CLI format in some way.
  ImageInvalid,
  /// Reserved for the assembly binder: an `AssemblyRef` could not be resolved.
  MissingAssemblyRef,
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Ok => write!(f, "ok"),
      Self::ErrorErrno => write!(f, "file i/o error"),
      Self::ImageInvalid => write!(f, "invalid image"),
      Self::MissingAssemblyRef => write!(f, "missing assembly reference"),
    }
  }
}

#[cfg(any(feature = "std", test))]
impl std::error::Error for Status {}

/// A parse-time failure, in more detail than [Status] carries.
#[derive(Debug)]
pub enum Error {
  /// A file I/O operation failed.
  Io(std::io::Error),
  /// The image violates the PE/COFF or CLI format.
  Format(FormatError),
  /// A referenced sub-module or file could not be opened.
  MissingSubImage,
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(err) => write!(f, "i/o error: {err}"),
      Self::Format(err) => write!(f, "format error: {err}"),
      Self::MissingSubImage => write!(f, "referenced sub-image could not be opened"),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io(err) => Some(err),
      Self::Format(err) => Some(err),
      Self::MissingSubImage => None,
    }
  }
}

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<FormatError> for Error {
  fn from(err: FormatError) -> Self {
    Self::Format(err)
  }
}

impl From<Error> for Status {
  fn from(err: Error) -> Self {
    match err {
      Error::Io(_) => Status::ErrorErrno,
      Error::Format(_) => Status::ImageInvalid,
      Error::MissingSubImage => Status::ImageInvalid,
    }
  }
}

/// The specific way an image failed the §4.2/§4.3 validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
  /// The buffer is too short to contain the structure being read.
  TooShort,
  /// The MS-DOS stub's signature was not `MZ`.
  BadDosSignature,
  /// The `pe_offset` field points past the end of the buffer.
  PeOffsetOutOfBounds,
  /// The PE signature was not `PE\0\0`.
  BadPeSignature,
  /// The COFF machine field was not `0x14C` (x86).
  UnsupportedMachine(u16),
  /// The optional header magic was not `0x10B` (PE32).
  BadOptionalHeaderMagic,
  /// The optional header's declared size is smaller than the fields this parser requires.
  BadOptionalHeaderSize,
  /// The image has no CLI header data directory entry, or it is empty.
  MissingCliHeader,
  /// The metadata root signature was not `BSJB`.
  BadMetadataSignature(u32),
  /// The `#GUID` heap is absent.
  MissingGuidHeap,
  /// The `#GUID` heap is shorter than 16 bytes.
  GuidHeapTooShort,
  /// Neither a `#~` nor a `#-` tables stream was present. The tables stream is the only metadata
  /// stream ECMA-335 requires, so its absence fails the whole parse.
  MissingTablesStream,
}

impl fmt::Display for FormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::TooShort => write!(f, "buffer too short"),
      Self::BadDosSignature => write!(f, "bad MS-DOS stub signature"),
      Self::PeOffsetOutOfBounds => write!(f, "pe_offset out of bounds"),
      Self::BadPeSignature => write!(f, "bad PE signature"),
      Self::UnsupportedMachine(machine) => write!(f, "unsupported COFF machine {machine:#06x}"),
      Self::BadOptionalHeaderMagic => write!(f, "expected PE32 optional header magic"),
      Self::BadOptionalHeaderSize => write!(f, "optional header too small"),
      Self::MissingCliHeader => write!(f, "missing CLI header"),
      Self::BadMetadataSignature(sig) => write!(f, "bad metadata root signature {sig:#010x}"),
      Self::MissingGuidHeap => write!(f, "missing #GUID heap"),
      Self::GuidHeapTooShort => write!(f, "#GUID heap shorter than 16 bytes"),
      Self::MissingTablesStream => write!(f, "missing #~/#- tables stream"),
    }
  }
}

impl std::error::Error for FormatError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_error_collapses_to_image_invalid() {
    let status: Status = Error::Format(FormatError::BadDosSignature).into();
    assert_eq!(status, Status::ImageInvalid);
  }

  #[test]
  fn missing_sub_image_collapses_to_image_invalid() {
    let status: Status = Error::MissingSubImage.into();
    assert_eq!(status, Status::ImageInvalid);
  }
}
