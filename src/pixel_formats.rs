//! Module for pixel formats.
//!
//! Every image in this crate ends up as [`RGBA8`] pixels, with the alpha
//! channel already multiplied into the color channels ("premultiplied
//! alpha"). Compositing and resampling premultiplied pixels is just a
//! weighted sum per channel, so the filters never need to look at alpha to
//! avoid color bleeding from transparent neighbors.
//!
//! Decoders premultiply as their last step, and encoders for formats that
//! store straight alpha undo it on the way out.
//!
//! ### Between Gray and RGB
//! When going from grayscale to RGB one just simply copies the gray value to
//! each of the RGB channels. The reverse is a weighted sum, because human
//! eyes don't respond equally to all three colors, see
//! [`Grayscale`](crate::filtering::Grayscale).

use bytemuck::{Pod, Zeroable};

/// An RGB value, 8-bits per channel.
///
/// This is the layout of PNG palette entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// An 8-bits per channel RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl RGBA8 {
  /// Opaque white.
  pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
  /// Opaque black.
  pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
  /// Fully transparent.
  pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

  /// Makes an opaque color.
  #[inline]
  #[must_use]
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  /// Scales the color channels by `a / 255`.
  #[inline]
  #[must_use]
  pub const fn premultiplied(self) -> Self {
    let a = self.a;
    Self { r: premultiply_channel(self.r, a), g: premultiply_channel(self.g, a), b: premultiply_channel(self.b, a), a }
  }

  /// Divides the color channels by `a / 255`.
  ///
  /// A fully transparent pixel comes out as all zero.
  #[inline]
  #[must_use]
  pub const fn unpremultiplied(self) -> Self {
    let a = self.a;
    Self {
      r: unpremultiply_channel(self.r, a),
      g: unpremultiply_channel(self.g, a),
      b: unpremultiply_channel(self.b, a),
      a,
    }
  }
}
impl From<RGB8> for RGBA8 {
  #[inline]
  #[must_use]
  fn from(RGB8 { r, g, b }: RGB8) -> Self {
    Self { r, g, b, a: 255 }
  }
}
impl From<[u8; 4]> for RGBA8 {
  #[inline]
  #[must_use]
  fn from([r, g, b, a]: [u8; 4]) -> Self {
    Self { r, g, b, a }
  }
}
impl From<RGBA8> for [u8; 4] {
  #[inline]
  #[must_use]
  fn from(RGBA8 { r, g, b, a }: RGBA8) -> Self {
    [r, g, b, a]
  }
}

/// `round(c * a / 255)` with integer math.
#[inline]
#[must_use]
pub const fn premultiply_channel(c: u8, a: u8) -> u8 {
  ((c as u32 * a as u32 + 127) / 255) as u8
}

/// `round(c * 255 / a)` with integer math, saturating at 255.
///
/// For any `c <= a` this is the exact inverse of [`premultiply_channel`].
#[inline]
#[must_use]
pub const fn unpremultiply_channel(c: u8, a: u8) -> u8 {
  if a == 0 {
    0
  } else {
    let v = (c as u32 * 255 + (a as u32 / 2)) / a as u32;
    if v > 255 {
      255
    } else {
      v as u8
    }
  }
}

/// Premultiplies a whole buffer of RGBA bytes in place.
pub fn premultiply_pixels(pixels: &mut [u8]) {
  bytemuck::cast_slice_mut::<u8, RGBA8>(pixels).iter_mut().for_each(|p| *p = p.premultiplied());
}

/// Undoes [`premultiply_pixels`] in place.
pub fn unpremultiply_pixels(pixels: &mut [u8]) {
  bytemuck::cast_slice_mut::<u8, RGBA8>(pixels).iter_mut().for_each(|p| *p = p.unpremultiplied());
}

#[test]
fn test_premultiply_round_trip() {
  for a in 0..=255_u8 {
    for c in 0..=a {
      let straight = unpremultiply_channel(c, a);
      assert_eq!(premultiply_channel(straight, a), c, "c: {c}, a: {a}");
    }
  }
}

#[test]
fn test_premultiply_opaque_is_identity() {
  let p = RGBA8 { r: 12, g: 200, b: 255, a: 255 };
  assert_eq!(p.premultiplied(), p);
  assert_eq!(p.unpremultiplied(), p);
  assert_eq!(RGBA8 { r: 90, g: 1, b: 2, a: 0 }.premultiplied(), RGBA8::TRANSPARENT);
}
