use std::io::Write;

use super::{
  chunk::{write_chunk, PngChunkType},
  header::{PngColorType, PngHeader},
  unfilter::{filter_row_with, FilterStrategy},
  PNG_SIGNATURE,
};
use crate::{codec::ImageEncoder, unpremultiply_pixels, ImagingError, ImagingResult, PixelBuffer};

/// The most compressed bytes put in one `IDAT` chunk.
pub const MAX_IDAT_LEN: usize = 65535;

/// Writes 8-bit RGBA PNG files.
///
/// The buffer's premultiplied pixels are converted back to straight alpha,
/// fully transparent pixels are written as `(0, 0, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngEncoder {
  /// zlib level, `0..=10`.
  pub compression_level: u8,
  pub filter_strategy: FilterStrategy,
  /// If the input buffer is premultiplied. Set this to `false` for buffers
  /// decoded with [`DecodeOptions::premultiply`](crate::DecodeOptions::premultiply)
  /// off, and the pixels are written as they are.
  pub premultiplied: bool,
}
impl Default for PngEncoder {
  #[inline]
  fn default() -> Self {
    Self { compression_level: 6, filter_strategy: FilterStrategy::Naive, premultiplied: true }
  }
}
impl PngEncoder {
  /// Sets if the input pixels are premultiplied.
  #[inline]
  #[must_use]
  pub const fn with_premultiplied(mut self, premultiplied: bool) -> Self {
    self.premultiplied = premultiplied;
    self
  }

  /// Sets the zlib level.
  #[inline]
  #[must_use]
  pub const fn with_compression_level(mut self, compression_level: u8) -> Self {
    self.compression_level = compression_level;
    self
  }

  /// Sets how row filters are chosen.
  #[inline]
  #[must_use]
  pub const fn with_filter_strategy(mut self, filter_strategy: FilterStrategy) -> Self {
    self.filter_strategy = filter_strategy;
    self
  }

  /// Encodes into a fresh byte vec.
  pub fn encode_to_vec(&self, image: &PixelBuffer) -> ImagingResult<Vec<u8>> {
    let mut out = Vec::new();
    self.encode_into(image, &mut out)?;
    Ok(out)
  }

  fn encode_into(&self, image: &PixelBuffer, writer: &mut dyn Write) -> ImagingResult<()> {
    if image.width() == 0 || image.height() == 0 {
      return Err(ImagingError::Argument("can't encode an empty image as PNG"));
    }
    let header = PngHeader {
      width: image.width(),
      height: image.height(),
      bit_depth: 8,
      color_type: PngColorType::RGBA,
    };
    let mut straight = image.pixels().to_vec();
    if self.premultiplied {
      unpremultiply_pixels(&mut straight);
    }

    let pitch = image.pitch();
    let mut filtered = Vec::with_capacity((pitch + 1) * image.height() as usize);
    let zeros = vec![0_u8; pitch];
    let mut prev: &[u8] = &zeros;
    for (y, row) in straight.chunks_exact(pitch).enumerate() {
      filter_row_with(self.filter_strategy, y as u32, 4, prev, row, &mut filtered);
      prev = row;
    }
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&filtered, self.compression_level);
    log::debug!(
      "encoding {}x{} PNG, {} filtered bytes deflated to {}",
      header.width,
      header.height,
      filtered.len(),
      compressed.len()
    );

    writer.write_all(&PNG_SIGNATURE)?;
    write_chunk(writer, PngChunkType::IHDR, &header.to_bytes())?;
    for part in compressed.chunks(MAX_IDAT_LEN) {
      write_chunk(writer, PngChunkType::IDAT, part)?;
    }
    write_chunk(writer, PngChunkType::IEND, &[])?;
    Ok(())
  }
}
impl ImageEncoder for PngEncoder {
  #[inline]
  fn extension(&self) -> &str {
    "png"
  }

  #[inline]
  fn encode(&self, image: &PixelBuffer, writer: &mut dyn Write) -> ImagingResult<()> {
    self.encode_into(image, writer)
  }
}
