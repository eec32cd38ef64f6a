use core::num::TryFromIntError;

/// Why some input data couldn't be decoded.
///
/// These are always reported to the caller. The decoder never tries to
/// recover from any of them and never hands back a partially filled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
  /// The first bytes of the stream aren't the expected file signature.
  #[error("the stream doesn't start with the expected signature")]
  BadSignature,

  /// The stream ended in the middle of a field or a chunk.
  #[error("the stream ended unexpectedly")]
  Truncated,

  /// A chunk declared more data than the decoder is willing to allocate.
  #[error("chunk declares {declared} bytes, but the limit is {max}")]
  ChunkTooLarge { declared: u32, max: u32 },

  /// The CRC stored after a chunk doesn't match its contents.
  #[error("CRC mismatch in {chunk} chunk (declared {declared:#010X}, actual {actual:#010X})")]
  CrcMismatch { chunk: crate::AsciiArray<4>, declared: u32, actual: u32 },

  /// The header chunk was missing or wasn't the right size.
  #[error("the image header is missing or malformed")]
  MissingHeader,

  /// The color type isn't one of the legal values.
  #[error("color type {0} is not supported or not valid")]
  IllegalColorType(u8),

  /// The bit depth isn't allowed for the color type.
  #[error("bit depth {bit_depth} is not valid for color type {color_type}")]
  IllegalBitDepth { color_type: u8, bit_depth: u8 },

  /// Only compression method 0 (zlib) is defined.
  #[error("compression method {0} is not defined")]
  IllegalCompressionMethod(u8),

  /// Only filter method 0 (adaptive) is defined.
  #[error("filter method {0} is not defined")]
  IllegalFilterMethod(u8),

  /// Interlaced data can't be decoded.
  #[error("interlaced images are not supported")]
  InterlaceNotSupported,

  /// A scanline's filter tag wasn't in `0..=4`.
  #[error("scanline filter type {0} is not defined")]
  IllegalFilterType(u8),

  /// The image width or height is zero.
  #[error("the image has a zero width or height")]
  ZeroDimension,

  /// An indexed color image has no palette.
  #[error("indexed color image has no palette")]
  MissingPalette,

  /// The palette chunk has a bad length.
  #[error("the palette is malformed")]
  MalformedPalette,

  /// A pixel refers to a palette entry that doesn't exist.
  #[error("palette index {index} is out of range for {len} entries")]
  PaletteIndexOutOfRange { index: u8, len: usize },

  /// Another chunk was found after the end chunk.
  #[error("the image does not end with the end chunk")]
  ChunkAfterEnd,

  /// The compressed image data couldn't be inflated.
  #[error("the compressed image data is corrupt")]
  Decompression,

  /// The image data ended before every row was present.
  #[error("the image data is incomplete")]
  IncompleteImageData,

  /// There's far more compressed image data than the image could need.
  #[error("{len} bytes of compressed image data, but at most {max} are allowed")]
  ImageDataTooLarge { len: usize, max: usize },
}

/// An error from the `pixmill` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ImagingError {
  /// The input data is malformed, corrupt, or uses an unsupported feature.
  #[error(transparent)]
  Format(#[from] FormatError),

  /// The declared image dimensions exceed the configured maximum.
  ///
  /// This is checked before any pixel buffer is allocated.
  #[error("image of {width}x{height} exceeds the allowed {max_width}x{max_height}")]
  SizeLimit { width: u32, height: u32, max_width: u32, max_height: u32 },

  /// A parameter given to a constructor or operation was invalid.
  #[error("invalid argument: {0}")]
  Argument(&'static str),

  /// None of the available codecs could handle the data or extension.
  #[error("no codec supports this image format")]
  UnsupportedFormat,

  /// The underlying reader or writer failed.
  #[error("i/o error: {0:?}")]
  Io(std::io::ErrorKind),
}

impl From<std::io::Error> for ImagingError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    match e.kind() {
      std::io::ErrorKind::UnexpectedEof => Self::Format(FormatError::Truncated),
      kind => Self::Io(kind),
    }
  }
}
impl From<TryFromIntError> for ImagingError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::Argument("value does not fit the target integer type")
  }
}

/// Shorthand for results from this crate.
pub type ImagingResult<T> = Result<T, ImagingError>;
