use std::io::Read;

use miniz_oxide::inflate::TINFLStatus;

use super::{
  chunk::{PngChunkReader, PngChunkType},
  color_reader::ColorReader,
  header::PngHeader,
  is_png_header_correct,
  unfilter::ScanlineDefilterer,
  PNG_SIGNATURE,
};
use crate::{
  codec::{extension_matches, ImageDecoder},
  premultiply_pixels, DecodeOptions, FormatError, ImagingError, ImagingResult, PixelBuffer,
};

/// The most zlib data that can reasonably encode `len` bytes.
///
/// Stored deflate blocks cost 5 bytes per 65535, so 1/64 extra plus a fixed
/// allowance for the zlib header and trailer is always enough.
#[inline]
#[must_use]
pub(crate) const fn compressed_len_bound(len: usize) -> usize {
  len.saturating_add(len / 64).saturating_add(1024)
}

/// Decodes non-interlaced PNG streams of any color type and bit depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PngDecoder {
  options: DecodeOptions,
}
impl PngDecoder {
  /// A decoder with the given limits.
  #[inline]
  #[must_use]
  pub const fn with_options(options: DecodeOptions) -> Self {
    Self { options }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn options(&self) -> &DecodeOptions {
    &self.options
  }

  /// Decodes a stream that starts with the PNG signature.
  pub fn decode_stream<R: Read>(&self, mut reader: R) -> ImagingResult<PixelBuffer> {
    let mut signature = [0_u8; 8];
    reader.read_exact(&mut signature)?;
    if !is_png_header_correct(&signature) {
      return Err(FormatError::BadSignature.into());
    }
    let mut chunks = PngChunkReader::new(reader, self.options.max_chunk_size);

    let header = match chunks.next_chunk()? {
      Some(chunk) if chunk.type_ == PngChunkType::IHDR => PngHeader::parse(&chunk.data)?,
      _ => return Err(FormatError::MissingHeader.into()),
    };
    log::debug!("{header:?}");
    self.options.check_dimensions(header.width, header.height)?;
    let zlib_len = header.decompressed_len().ok_or(ImagingError::SizeLimit {
      width: header.width,
      height: header.height,
      max_width: self.options.max_width,
      max_height: self.options.max_height,
    })?;

    let max_idat = compressed_len_bound(zlib_len);
    let mut plte: Option<Vec<u8>> = None;
    let mut trns: Option<Vec<u8>> = None;
    let mut idat: Vec<u8> = Vec::new();
    while let Some(chunk) = chunks.next_chunk()? {
      match chunk.type_ {
        PngChunkType::IDAT => {
          let len = idat.len().saturating_add(chunk.data.len());
          if len > max_idat {
            return Err(FormatError::ImageDataTooLarge { len, max: max_idat }.into());
          }
          idat.extend_from_slice(&chunk.data);
        }
        PngChunkType::PLTE => plte = Some(chunk.data),
        PngChunkType::tRNS => trns = Some(chunk.data),
        PngChunkType::IEND => (),
        PngChunkType::IHDR => log::warn!("ignoring a second IHDR chunk"),
        other if other.is_critical() => log::warn!("ignoring unknown critical chunk {other:?}"),
        other => log::trace!("skipping ancillary chunk {other:?}"),
      }
    }
    if !chunks.seen_end() {
      log::warn!("PNG stream ended without an IEND chunk");
    }
    if idat.is_empty() {
      return Err(FormatError::IncompleteImageData.into());
    }
    let reader = ColorReader::for_header(&header, plte.as_deref(), trns.as_deref())?;

    let mut zlib_buffer: Vec<u8> = Vec::new();
    zlib_buffer
      .try_reserve_exact(zlib_len)
      .map_err(|_| ImagingError::Argument("image data is too large to allocate"))?;
    zlib_buffer.resize(zlib_len, 0);
    match miniz_oxide::inflate::decompress_slice_iter_to_slice(
      &mut zlib_buffer,
      core::iter::once(idat.as_slice()),
      true,
      true,
    ) {
      Ok(count) if count < zlib_len => {
        log::debug!("inflated {count} bytes, expected {zlib_len}");
        return Err(FormatError::IncompleteImageData.into());
      }
      Ok(_) => (),
      Err(TINFLStatus::HasMoreOutput) => {
        log::warn!("ignoring compressed data past the end of the image");
      }
      Err(e) => {
        log::debug!("inflate failed: {e:?}");
        return Err(FormatError::Decompression.into());
      }
    }
    drop(idat);

    let mut image = PixelBuffer::zeroed(header.width, header.height)?;
    let pitch = image.pitch();
    let mut defilter = ScanlineDefilterer::new(header.stride(), header.bytes_per_pixel());
    let mut scratch = Vec::new();
    for (line, out_row) in
      zlib_buffer.chunks_exact(header.stride() + 1).zip(image.pixels_mut().chunks_exact_mut(pitch))
    {
      let (_row, samples) = defilter.next_row(line)?;
      reader.read_row(&header, samples, &mut scratch, out_row)?;
    }
    if self.options.premultiply {
      premultiply_pixels(image.pixels_mut());
    }
    Ok(image)
  }
}
impl ImageDecoder for PngDecoder {
  #[inline]
  fn header_size(&self) -> usize {
    PNG_SIGNATURE.len()
  }

  #[inline]
  fn is_supported_file_extension(&self, extension: &str) -> bool {
    extension_matches("png", extension)
  }

  #[inline]
  fn is_supported_file_format(&self, header: &[u8]) -> bool {
    is_png_header_correct(header)
  }

  #[inline]
  fn decode(&self, reader: &mut dyn Read) -> ImagingResult<PixelBuffer> {
    self.decode_stream(reader)
  }
}

/// Decodes PNG bytes with the default options.
#[inline]
pub fn decode_png(bytes: &[u8]) -> ImagingResult<PixelBuffer> {
  PngDecoder::default().decode_stream(bytes)
}
