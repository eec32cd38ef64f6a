use crate::{FormatError, ImagingResult};

/// The way the samples of a pixel map to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Grayscale
  Y = 0,
  /// Red, green, blue
  RGB = 2,
  /// Palette index
  Index = 3,
  /// Grayscale, alpha
  YA = 4,
  /// Red, green, blue, alpha
  RGBA = 6,
}
impl PngColorType {
  /// Samples per pixel.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y | Self::Index => 1,
      Self::YA => 2,
      Self::RGB => 3,
      Self::RGBA => 4,
    }
  }

  /// The bit depths a PNG may use with this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::RGB | Self::YA | Self::RGBA => &[8, 16],
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = FormatError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Y,
      2 => Self::RGB,
      3 => Self::Index,
      4 => Self::YA,
      6 => Self::RGBA,
      other => return Err(FormatError::IllegalColorType(other)),
    })
  }
}

/// The contents of the `IHDR` chunk, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct PngHeader {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: PngColorType,
}
impl PngHeader {
  /// Parses the 13 data bytes of an `IHDR` chunk.
  ///
  /// ## Failure
  /// Every field is checked before any image data is looked at:
  /// * [`FormatError::MissingHeader`] if the data isn't 13 bytes.
  /// * [`FormatError::ZeroDimension`] for a zero width or height.
  /// * [`FormatError::IllegalColorType`] / [`FormatError::IllegalBitDepth`]
  ///   when the pair isn't in the allowed table.
  /// * Compression, filter, and interlace methods must all be 0.
  pub fn parse(data: &[u8]) -> ImagingResult<Self> {
    match *data {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression, filter, interlace] => {
        let width = u32::from_be_bytes([w0, w1, w2, w3]);
        let height = u32::from_be_bytes([h0, h1, h2, h3]);
        if width == 0 || height == 0 {
          return Err(FormatError::ZeroDimension.into());
        }
        let color = PngColorType::try_from(color_type)?;
        if !color.allowed_bit_depths().contains(&bit_depth) {
          return Err(FormatError::IllegalBitDepth { color_type, bit_depth }.into());
        }
        if compression != 0 {
          return Err(FormatError::IllegalCompressionMethod(compression).into());
        }
        if filter != 0 {
          return Err(FormatError::IllegalFilterMethod(filter).into());
        }
        if interlace != 0 {
          return Err(FormatError::InterlaceNotSupported.into());
        }
        Ok(Self { width, height, bit_depth, color_type: color })
      }
      _ => Err(FormatError::MissingHeader.into()),
    }
  }

  /// The 13 data bytes of the `IHDR` chunk for this header.
  #[inline]
  #[must_use]
  pub fn to_bytes(&self) -> [u8; 13] {
    let mut out = [0_u8; 13];
    out[0..4].copy_from_slice(&self.width.to_be_bytes());
    out[4..8].copy_from_slice(&self.height.to_be_bytes());
    out[8] = self.bit_depth;
    out[9] = self.color_type as u8;
    out
  }

  /// The distance in bytes to the matching byte of the previous pixel.
  ///
  /// Sub-byte formats still use 1.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    let bits = self.color_type.channel_count() * self.bit_depth as usize;
    if bits < 8 {
      1
    } else {
      bits / 8
    }
  }

  /// Bytes per row of samples, not counting the filter type byte.
  #[inline]
  #[must_use]
  pub const fn stride(&self) -> usize {
    (self.width as usize * self.bit_depth as usize * self.color_type.channel_count() + 7) / 8
  }

  /// Bytes of decompressed data the whole image needs.
  #[inline]
  #[must_use]
  pub fn decompressed_len(&self) -> Option<usize> {
    (self.stride() + 1).checked_mul(self.height as usize)
  }
}
