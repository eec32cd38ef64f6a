//! The in-memory image type that every operation reads and produces.

use crate::{ImagingError, ImagingResult, RGBA8};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
///
/// This is how [`PixelBuffer`] turns 2d coordinates into pixel positions. Use
/// the same function if you index the raw byte data yourself (then multiply
/// by 4).
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  y as usize * width as usize + x as usize
}

/// An axis-aligned rectangle of pixels.
///
/// The rectangle covers columns `left()..right()` and rows
/// `top()..bottom()`, so `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Rectangle {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}
impl Rectangle {
  /// Makes a rectangle.
  #[inline]
  #[must_use]
  pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
    Self { x, y, width, height }
  }

  /// A rectangle at the origin.
  #[inline]
  #[must_use]
  pub const fn from_size(width: u32, height: u32) -> Self {
    Self { x: 0, y: 0, width, height }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn left(&self) -> u32 {
    self.x
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn top(&self) -> u32 {
    self.y
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn right(&self) -> u32 {
    self.x.saturating_add(self.width)
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn bottom(&self) -> u32 {
    self.y.saturating_add(self.height)
  }

  /// If the rectangle covers no pixels.
  #[inline]
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// The overlap of two rectangles, or `None` if they don't overlap.
  #[inline]
  #[must_use]
  pub fn intersect(&self, other: &Self) -> Option<Self> {
    let left = self.left().max(other.left());
    let top = self.top().max(other.top());
    let right = self.right().min(other.right());
    let bottom = self.bottom().min(other.bottom());
    if left < right && top < bottom {
      Some(Self::new(left, top, right - left, bottom - top))
    } else {
      None
    }
  }

  /// If `other` lies entirely inside of `self`.
  #[inline]
  #[must_use]
  pub const fn contains_rect(&self, other: &Self) -> bool {
    other.left() >= self.left()
      && other.top() >= self.top()
      && other.right() <= self.right()
      && other.bottom() <= self.bottom()
  }
}

/// An RGBA8888 image with premultiplied alpha.
///
/// The one exception is a buffer decoded with
/// [`DecodeOptions::premultiply`](crate::DecodeOptions::premultiply) turned
/// off, which holds straight alpha until the caller converts it.
///
/// The byte length is always `width * height * 4`, rows are stored top to
/// bottom with no padding. Operations never modify a source buffer in place,
/// they allocate a fresh destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
  width: u32,
  height: u32,
  pixels: Vec<u8>,
}
impl PixelBuffer {
  /// Makes a buffer of fully transparent pixels.
  ///
  /// ## Panics
  /// * If the byte size doesn't fit in `usize`. Use [`PixelBuffer::zeroed`]
  ///   for a fallible version.
  #[inline]
  #[must_use]
  #[track_caller]
  pub fn new(width: u32, height: u32) -> Self {
    match Self::zeroed(width, height) {
      Ok(image) => image,
      Err(e) => panic!("{e}"),
    }
  }

  /// Makes a buffer of fully transparent pixels.
  ///
  /// ## Failure
  /// * [`ImagingError::Argument`] if the byte size overflows.
  #[inline]
  pub fn zeroed(width: u32, height: u32) -> ImagingResult<Self> {
    let len = byte_len(width, height)?;
    Ok(Self { width, height, pixels: vec![0; len] })
  }

  /// Wraps existing RGBA8888 bytes.
  ///
  /// ## Failure
  /// * [`ImagingError::Argument`] if `pixels` isn't exactly
  ///   `width * height * 4` bytes.
  #[inline]
  pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> ImagingResult<Self> {
    if pixels.len() != byte_len(width, height)? {
      return Err(ImagingError::Argument("pixel data length doesn't match the dimensions"));
    }
    Ok(Self { width, height, pixels })
  }

  /// Makes a buffer with every pixel set to one color.
  #[inline]
  pub fn filled(width: u32, height: u32, color: RGBA8) -> ImagingResult<Self> {
    let mut image = Self::zeroed(width, height)?;
    image.as_rgba8_mut().fill(color);
    Ok(image)
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// The raw bytes.
  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  /// The raw bytes, mutably.
  #[inline]
  #[must_use]
  pub fn pixels_mut(&mut self) -> &mut [u8] {
    &mut self.pixels
  }

  /// Unwraps into the raw bytes.
  #[inline]
  #[must_use]
  pub fn into_pixels(self) -> Vec<u8> {
    self.pixels
  }

  /// The rectangle of the whole image.
  #[inline]
  #[must_use]
  pub const fn bounds(&self) -> Rectangle {
    Rectangle::from_size(self.width, self.height)
  }

  /// Bytes per row.
  #[inline]
  #[must_use]
  pub const fn pitch(&self) -> usize {
    self.width as usize * 4
  }

  /// Views the bytes as pixels.
  #[inline]
  #[must_use]
  pub fn as_rgba8(&self) -> &[RGBA8] {
    bytemuck::cast_slice(&self.pixels)
  }

  /// Views the bytes as pixels, mutably.
  #[inline]
  #[must_use]
  pub fn as_rgba8_mut(&mut self) -> &mut [RGBA8] {
    bytemuck::cast_slice_mut(&mut self.pixels)
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn pixel(&self, x: u32, y: u32) -> Option<RGBA8> {
    if x < self.width && y < self.height {
      Some(self.as_rgba8()[xy_width_to_index(x, y, self.width)])
    } else {
      None
    }
  }

  /// Sets the pixel at the position, returning `false` if it's out of bounds.
  #[inline]
  pub fn set_pixel(&mut self, x: u32, y: u32, color: RGBA8) -> bool {
    if x < self.width && y < self.height {
      let i = xy_width_to_index(x, y, self.width);
      self.as_rgba8_mut()[i] = color;
      true
    } else {
      false
    }
  }

  /// The bytes of one row, or `None` if `y` is out of bounds.
  #[inline]
  #[must_use]
  pub fn row(&self, y: u32) -> Option<&[u8]> {
    if y < self.height {
      let start = y as usize * self.pitch();
      Some(&self.pixels[start..start + self.pitch()])
    } else {
      None
    }
  }

  /// Flips the image top to bottom, in place.
  #[inline]
  pub fn vertical_flip(&mut self) {
    let pitch = self.pitch();
    let mut data: &mut [u8] = self.pixels.as_mut_slice();
    let mut temp_height = self.height;
    while temp_height > 1 {
      let (low, mid) = data.split_at_mut(pitch);
      let (mid, high) = mid.split_at_mut(mid.len() - pitch);
      low.swap_with_slice(high);
      data = mid;
      temp_height -= 2;
    }
  }
}

#[inline]
fn byte_len(width: u32, height: u32) -> ImagingResult<usize> {
  usize::try_from(width)?
    .checked_mul(usize::try_from(height)?)
    .and_then(|n| n.checked_mul(4))
    .ok_or(ImagingError::Argument("image dimensions overflow"))
}

#[test]
fn test_pixel_buffer_bounds_checks() {
  let mut image = PixelBuffer::new(3, 2);
  assert_eq!(image.pixels().len(), 24);
  assert!(image.set_pixel(2, 1, RGBA8::WHITE));
  assert!(!image.set_pixel(3, 0, RGBA8::WHITE));
  assert_eq!(image.pixel(2, 1), Some(RGBA8::WHITE));
  assert_eq!(image.pixel(0, 2), None);
  assert_eq!(&image.row(1).unwrap()[8..], &[255; 4]);
  assert!(PixelBuffer::from_pixels(2, 2, vec![0; 15]).is_err());
  assert!(PixelBuffer::from_pixels(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn test_vertical_flip() {
  let mut image = PixelBuffer::from_pixels(1, 3, (0..12).collect()).unwrap();
  image.vertical_flip();
  assert_eq!(image.pixels(), &[8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3]);
}

#[test]
fn test_rectangle_intersect() {
  let a = Rectangle::new(0, 0, 10, 10);
  let b = Rectangle::new(5, 8, 10, 10);
  assert_eq!(a.intersect(&b), Some(Rectangle::new(5, 8, 5, 2)));
  assert_eq!(a.intersect(&Rectangle::new(10, 0, 1, 1)), None);
  assert!(a.contains_rect(&Rectangle::new(2, 2, 8, 8)));
  assert!(!a.contains_rect(&b));
  assert!(Rectangle::from_size(0, 4).is_empty());
}
