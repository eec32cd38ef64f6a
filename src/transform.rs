//! Geometry operations that move pixels without blending them.
//!
//! Each operation returns a new buffer and leaves the source untouched.

use crate::{xy_width_to_index, ImagingError, ImagingResult, PixelBuffer, Rectangle, RGBA8};

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RotationType {
  #[default]
  None,
  Rotate90,
  Rotate180,
  Rotate270,
}

/// Mirroring of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FlippingType {
  /// No change.
  #[default]
  None,
  /// Mirror left to right.
  Horizontal,
  /// Mirror top to bottom.
  Vertical,
}

/// Copies out the part of the image inside `bounds`.
///
/// ## Failure
/// * [`ImagingError::Argument`] if `bounds` isn't inside the image.
pub fn crop(source: &PixelBuffer, bounds: Rectangle) -> ImagingResult<PixelBuffer> {
  if !source.bounds().contains_rect(&bounds) {
    return Err(ImagingError::Argument("crop rectangle is outside of the image"));
  }
  let mut target = PixelBuffer::zeroed(bounds.width, bounds.height)?;
  let row_bytes = bounds.width as usize * 4;
  if row_bytes == 0 {
    return Ok(target);
  }
  let src = source.pixels();
  for (i, dst_row) in target.pixels_mut().chunks_exact_mut(row_bytes).enumerate() {
    let start = xy_width_to_index(bounds.x, bounds.y + i as u32, source.width()) * 4;
    dst_row.copy_from_slice(&src[start..start + row_bytes]);
  }
  Ok(target)
}

/// Rotates the image clockwise.
pub fn rotate(source: &PixelBuffer, rotation: RotationType) -> ImagingResult<PixelBuffer> {
  let (w, h) = (source.width(), source.height());
  let (tw, th) = match rotation {
    RotationType::None | RotationType::Rotate180 => (w, h),
    RotationType::Rotate90 | RotationType::Rotate270 => (h, w),
  };
  let mut target = PixelBuffer::zeroed(tw, th)?;
  let src = source.as_rgba8();
  let dst = target.as_rgba8_mut();
  for y in 0..h {
    for x in 0..w {
      let (nx, ny) = match rotation {
        RotationType::None => (x, y),
        RotationType::Rotate90 => (h - y - 1, x),
        RotationType::Rotate180 => (w - x - 1, h - y - 1),
        RotationType::Rotate270 => (y, w - x - 1),
      };
      dst[xy_width_to_index(nx, ny, tw)] = src[xy_width_to_index(x, y, w)];
    }
  }
  Ok(target)
}

/// Mirrors the image.
#[must_use]
pub fn flip(source: &PixelBuffer, flipping: FlippingType) -> PixelBuffer {
  let mut target = source.clone();
  match flipping {
    FlippingType::None => (),
    FlippingType::Vertical => target.vertical_flip(),
    FlippingType::Horizontal => {
      let w = target.width() as usize;
      if w > 0 {
        target.as_rgba8_mut().chunks_exact_mut(w).for_each(<[RGBA8]>::reverse);
      }
    }
  }
  target
}

/// Rotates, then flips.
pub fn transform(
  source: &PixelBuffer, rotation: RotationType, flipping: FlippingType,
) -> ImagingResult<PixelBuffer> {
  let rotated = rotate(source, rotation)?;
  Ok(match flipping {
    FlippingType::None => rotated,
    _ => flip(&rotated, flipping),
  })
}

/// The size an image must be resized to so that its longer edge is `size`
/// while keeping the aspect ratio.
///
/// The shorter edge is rounded to the nearest pixel and is never less than 1.
///
/// ## Failure
/// * [`ImagingError::Argument`] if the source is empty or `size` is 0.
pub fn fit_dimensions(src_width: u32, src_height: u32, size: u32) -> ImagingResult<(u32, u32)> {
  if src_width == 0 || src_height == 0 || size == 0 {
    return Err(ImagingError::Argument("can't fit an empty image or to a zero size"));
  }
  let ratio = f64::from(src_width) / f64::from(src_height);
  Ok(if src_width > src_height {
    (size, ((f64::from(size) / ratio).round() as u32).max(1))
  } else {
    (((f64::from(size) * ratio).round() as u32).max(1), size)
  })
}

#[cfg(test)]
fn numbered(w: u32, h: u32) -> PixelBuffer {
  let pixels = (0..w * h).flat_map(|i| [i as u8, 0, 0, 255]).collect();
  PixelBuffer::from_pixels(w, h, pixels).unwrap()
}

#[cfg(test)]
fn reds(image: &PixelBuffer) -> Vec<u8> {
  image.as_rgba8().iter().map(|p| p.r).collect()
}

#[test]
fn test_rotate_quarter_turns() {
  // 0 1 2
  // 3 4 5
  let image = numbered(3, 2);
  let r90 = rotate(&image, RotationType::Rotate90).unwrap();
  assert_eq!((r90.width(), r90.height()), (2, 3));
  assert_eq!(reds(&r90), [3, 0, 4, 1, 5, 2]);
  let r180 = rotate(&image, RotationType::Rotate180).unwrap();
  assert_eq!(reds(&r180), [5, 4, 3, 2, 1, 0]);
  let r270 = rotate(&image, RotationType::Rotate270).unwrap();
  assert_eq!(reds(&r270), [2, 5, 1, 4, 0, 3]);
  let back = rotate(&r90, RotationType::Rotate270).unwrap();
  assert_eq!(back, image);
}

#[test]
fn test_flip_and_transform() {
  let image = numbered(3, 2);
  assert_eq!(reds(&flip(&image, FlippingType::Horizontal)), [2, 1, 0, 5, 4, 3]);
  assert_eq!(reds(&flip(&image, FlippingType::Vertical)), [3, 4, 5, 0, 1, 2]);
  let t = transform(&image, RotationType::Rotate180, FlippingType::Horizontal).unwrap();
  assert_eq!(t, flip(&image, FlippingType::Vertical));
}

#[test]
fn test_crop() {
  let image = numbered(4, 3);
  let c = crop(&image, Rectangle::new(1, 1, 2, 2)).unwrap();
  assert_eq!(reds(&c), [5, 6, 9, 10]);
  assert!(matches!(crop(&image, Rectangle::new(3, 0, 2, 1)), Err(ImagingError::Argument(_))));
}

#[test]
fn test_fit_dimensions() {
  assert_eq!(fit_dimensions(400, 200, 100), Ok((100, 50)));
  assert_eq!(fit_dimensions(200, 400, 100), Ok((50, 100)));
  assert_eq!(fit_dimensions(300, 300, 64), Ok((64, 64)));
  assert_eq!(fit_dimensions(1000, 1, 10), Ok((10, 1)));
  assert!(fit_dimensions(0, 4, 10).is_err());
}
