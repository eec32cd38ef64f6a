//! The decoder/encoder contracts and a registry to pick between them.

use std::io::{Cursor, Read, Write};

use crate::{ImagingError, ImagingResult, PixelBuffer};

/// Something that can turn a byte stream into a [`PixelBuffer`].
pub trait ImageDecoder: Send + Sync {
  /// How many leading bytes [`is_supported_file_format`](Self::is_supported_file_format)
  /// needs to see.
  fn header_size(&self) -> usize;

  /// If files with this extension are expected to be handled.
  fn is_supported_file_extension(&self, extension: &str) -> bool;

  /// If the leading bytes look like this decoder's format.
  fn is_supported_file_format(&self, header: &[u8]) -> bool;

  /// Decodes a whole image.
  ///
  /// On any error no image is produced.
  fn decode(&self, reader: &mut dyn Read) -> ImagingResult<PixelBuffer>;
}

/// Something that can write a [`PixelBuffer`] as a byte stream.
pub trait ImageEncoder: Send + Sync {
  /// The preferred file extension, without a dot.
  fn extension(&self) -> &str;

  /// If files with this extension are written by this encoder.
  fn is_supported_file_extension(&self, extension: &str) -> bool {
    extension_matches(self.extension(), extension)
  }

  /// Encodes a whole image.
  fn encode(&self, image: &PixelBuffer, writer: &mut dyn Write) -> ImagingResult<()>;
}

/// Compares file extensions, ignoring a leading `.` and ASCII case.
#[inline]
#[must_use]
pub fn extension_matches(expected: &str, extension: &str) -> bool {
  let extension = extension.strip_prefix('.').unwrap_or(extension);
  expected.eq_ignore_ascii_case(extension)
}

/// The set of codecs used to load and save images.
///
/// Build one of these at startup and pass it around. `Codecs::default()` has
/// every codec enabled by the crate's features, `Codecs::new()` has none.
pub struct Codecs {
  decoders: Vec<Box<dyn ImageDecoder>>,
  encoders: Vec<Box<dyn ImageEncoder>>,
}
impl core::fmt::Debug for Codecs {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Codecs")
      .field("decoders", &self.decoders.len())
      .field("encoders", &self.encoders.iter().map(|e| e.extension()).collect::<Vec<_>>())
      .finish()
  }
}
impl Default for Codecs {
  #[inline]
  fn default() -> Self {
    Self::with_builtin()
  }
}
impl Codecs {
  /// An empty registry.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { decoders: Vec::new(), encoders: Vec::new() }
  }

  /// The registry with all built in codecs.
  #[must_use]
  pub fn with_builtin() -> Self {
    #[allow(unused_mut)]
    let mut codecs = Self::new();
    #[cfg(feature = "png")]
    {
      codecs.add_decoder(crate::png::PngDecoder::default());
      codecs.add_encoder(crate::png::PngEncoder::default());
    }
    codecs
  }

  /// Adds a decoder. Earlier decoders win when several accept a stream.
  #[inline]
  pub fn add_decoder(&mut self, decoder: impl ImageDecoder + 'static) -> &mut Self {
    self.decoders.push(Box::new(decoder));
    self
  }

  /// Adds an encoder. Earlier encoders win when several accept an extension.
  #[inline]
  pub fn add_encoder(&mut self, encoder: impl ImageEncoder + 'static) -> &mut Self {
    self.encoders.push(Box::new(encoder));
    self
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn decoders(&self) -> &[Box<dyn ImageDecoder>] {
    &self.decoders
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn encoders(&self) -> &[Box<dyn ImageEncoder>] {
    &self.encoders
  }

  /// The first decoder accepting files with this extension.
  #[must_use]
  pub fn decoder_for_extension(&self, extension: &str) -> Option<&dyn ImageDecoder> {
    self.decoders.iter().find(|d| d.is_supported_file_extension(extension)).map(|d| &**d)
  }

  /// The first encoder accepting files with this extension.
  #[must_use]
  pub fn encoder_for_extension(&self, extension: &str) -> Option<&dyn ImageEncoder> {
    self.encoders.iter().find(|e| e.is_supported_file_extension(extension)).map(|e| &**e)
  }

  /// Detects the format from the leading bytes and decodes the stream.
  ///
  /// ## Failure
  /// * [`ImagingError::UnsupportedFormat`] if no decoder accepts the header.
  /// * Anything the chosen decoder reports.
  pub fn load(&self, reader: &mut dyn Read) -> ImagingResult<PixelBuffer> {
    let header_size = self.decoders.iter().map(|d| d.header_size()).max().unwrap_or(0);
    let mut header = Vec::with_capacity(header_size);
    Read::take(&mut *reader, header_size as u64).read_to_end(&mut header)?;
    let decoder = self
      .decoders
      .iter()
      .find(|d| header.len() >= d.header_size() && d.is_supported_file_format(&header))
      .ok_or(ImagingError::UnsupportedFormat)?;
    log::debug!("loading image with a decoder for {header_size} header bytes");
    let mut chained = Cursor::new(header).chain(reader);
    decoder.decode(&mut chained)
  }

  /// [`load`](Self::load) from a byte slice.
  #[inline]
  pub fn load_bytes(&self, mut bytes: &[u8]) -> ImagingResult<PixelBuffer> {
    self.load(&mut bytes)
  }

  /// Encodes with the encoder for `extension`.
  ///
  /// ## Failure
  /// * [`ImagingError::UnsupportedFormat`] if no encoder takes the extension.
  pub fn save(&self, image: &PixelBuffer, extension: &str, writer: &mut dyn Write) -> ImagingResult<()> {
    self.encoder_for_extension(extension).ok_or(ImagingError::UnsupportedFormat)?.encode(image, writer)
  }
}

#[test]
fn test_extension_matches() {
  assert!(extension_matches("png", "PNG"));
  assert!(extension_matches("png", ".png"));
  assert!(!extension_matches("png", "..png"));
  assert!(!extension_matches("png", "pngx"));
}

#[test]
fn test_empty_registry_is_unsupported() {
  let codecs = Codecs::new();
  assert_eq!(codecs.load_bytes(&[1, 2, 3]), Err(ImagingError::UnsupportedFormat));
  let mut out = Vec::new();
  assert_eq!(codecs.save(&PixelBuffer::new(1, 1), "png", &mut out), Err(ImagingError::UnsupportedFormat));
}
