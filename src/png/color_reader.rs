use bitfrob::u8_replicate_bits;

use super::header::{PngColorType, PngHeader};
use crate::{unpack_samples, FormatError, ImagingResult, SampleScaling, RGB8};

/// Turns unfiltered scanlines into straight (not premultiplied) RGBA8 rows.
///
/// One variant per family of color types. 16-bit samples keep only their high
/// byte, sub-byte samples are unpacked first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorReader {
  /// Color types 0 and 4.
  Grayscale {
    alpha: bool,
    /// The sample value (at the image's bit depth) that means "transparent".
    transparent: Option<u16>,
  },
  /// Color types 2 and 6.
  TrueColor {
    alpha: bool,
    /// The sample values (at the image's bit depth) that mean "transparent".
    transparent: Option<[u16; 3]>,
  },
  /// Color type 3.
  Palette {
    palette: Vec<RGB8>,
    /// Alpha per palette entry, entries past the end are opaque.
    alphas: Vec<u8>,
  },
}
impl ColorReader {
  /// Picks the reader for a header, given the data of the `PLTE` and `tRNS`
  /// chunks if the image had them.
  ///
  /// ## Failure
  /// * [`FormatError::MissingPalette`] for an indexed image without `PLTE`.
  /// * [`FormatError::MalformedPalette`] if the `PLTE` length isn't a whole
  ///   number of entries, or has more than 256 of them.
  pub fn for_header(header: &PngHeader, plte: Option<&[u8]>, trns: Option<&[u8]>) -> ImagingResult<Self> {
    Ok(match header.color_type {
      PngColorType::Y | PngColorType::YA => {
        let alpha = header.color_type == PngColorType::YA;
        let transparent = match trns {
          Some(&[y0, y1]) if !alpha => {
            let y = u16::from_be_bytes([y0, y1]);
            if header.bit_depth < 8 {
              // compared after scaling, so scale the key the same way
              let max = (1_u16 << header.bit_depth) - 1;
              (y <= max).then(|| u16::from(u8_replicate_bits(u32::from(header.bit_depth), y as u8)))
            } else {
              Some(y)
            }
          }
          Some(_) => {
            log::warn!("ignoring a tRNS chunk that doesn't fit color type {:?}", header.color_type);
            None
          }
          None => None,
        };
        Self::Grayscale { alpha, transparent }
      }
      PngColorType::RGB | PngColorType::RGBA => {
        let alpha = header.color_type == PngColorType::RGBA;
        let transparent = match trns {
          Some(&[r0, r1, g0, g1, b0, b1]) if !alpha => Some([
            u16::from_be_bytes([r0, r1]),
            u16::from_be_bytes([g0, g1]),
            u16::from_be_bytes([b0, b1]),
          ]),
          Some(_) => {
            log::warn!("ignoring a tRNS chunk that doesn't fit color type {:?}", header.color_type);
            None
          }
          None => None,
        };
        Self::TrueColor { alpha, transparent }
      }
      PngColorType::Index => {
        let plte = plte.ok_or(FormatError::MissingPalette)?;
        if plte.is_empty() || plte.len() % 3 != 0 || plte.len() > 256 * 3 {
          return Err(FormatError::MalformedPalette.into());
        }
        let palette: Vec<RGB8> = bytemuck::cast_slice(plte).to_vec();
        let mut alphas = trns.unwrap_or(&[]).to_vec();
        if alphas.len() > palette.len() {
          log::warn!("tRNS has {} entries for a palette of {}", alphas.len(), palette.len());
          alphas.truncate(palette.len());
        }
        Self::Palette { palette, alphas }
      }
    })
  }

  /// Converts one row of unfiltered samples into `out_row`, which is
  /// `width * 4` bytes.
  ///
  /// `scratch` is reused between rows to hold unpacked sub-byte samples.
  ///
  /// ## Failure
  /// * [`FormatError::PaletteIndexOutOfRange`] for an index past the end of
  ///   the palette.
  pub fn read_row(
    &self, header: &PngHeader, samples: &[u8], scratch: &mut Vec<u8>, out_row: &mut [u8],
  ) -> ImagingResult<()> {
    let data: &[u8] = if header.bit_depth < 8 {
      // sub-byte depths only exist for single channel color types
      let scaling =
        if matches!(self, Self::Palette { .. }) { SampleScaling::Raw } else { SampleScaling::Scaled };
      scratch.resize(header.width as usize, 0);
      unpack_samples(header.bit_depth, samples, scaling, scratch);
      &scratch[..]
    } else {
      samples
    };
    let sample_bytes = if header.bit_depth == 16 { 2 } else { 1 };
    let pixel_bytes = sample_bytes * header.color_type.channel_count();
    for (px, out) in data.chunks_exact(pixel_bytes).zip(out_row.chunks_exact_mut(4)) {
      let hi = |i: usize| px[i * sample_bytes];
      let full = |i: usize| {
        if sample_bytes == 2 {
          u16::from_be_bytes([px[i * 2], px[i * 2 + 1]])
        } else {
          u16::from(px[i])
        }
      };
      let rgba: [u8; 4] = match self {
        Self::Grayscale { alpha: true, .. } => [hi(0), hi(0), hi(0), hi(1)],
        Self::Grayscale { alpha: false, transparent } => {
          let a = if *transparent == Some(full(0)) { 0 } else { 255 };
          [hi(0), hi(0), hi(0), a]
        }
        Self::TrueColor { alpha: true, .. } => [hi(0), hi(1), hi(2), hi(3)],
        Self::TrueColor { alpha: false, transparent } => {
          let a = if *transparent == Some([full(0), full(1), full(2)]) { 0 } else { 255 };
          [hi(0), hi(1), hi(2), a]
        }
        Self::Palette { palette, alphas } => {
          let index = px[0];
          let RGB8 { r, g, b } = *palette
            .get(usize::from(index))
            .ok_or(FormatError::PaletteIndexOutOfRange { index, len: palette.len() })?;
          [r, g, b, alphas.get(usize::from(index)).copied().unwrap_or(255)]
        }
      };
      out.copy_from_slice(&rgba);
    }
    Ok(())
  }
}
