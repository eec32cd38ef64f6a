//! Per pixel color adjustments.
//!
//! These all work on straight (non-premultiplied) color: each pixel is
//! unpremultiplied, adjusted, and premultiplied again. Only [`CropCircle`]
//! touches alpha.

use core::ops::Range;

use super::filter::{for_each_rect_pixel, ParallelImageFilter};
use crate::{ImagingError, ImagingResult, Parallelism, PixelBuffer, Rectangle, RGBA8};

/// Runs `op` on the straight color of every pixel in the band.
#[inline]
fn map_straight(
  pitch: usize, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8], op: impl Fn(u32, u32, RGBA8) -> RGBA8,
) {
  for_each_rect_pixel(pitch, rect, rows, target_rows, |x, y, px| {
    let straight = RGBA8 { r: px[0], g: px[1], b: px[2], a: px[3] }.unpremultiplied();
    let out = op(x, y, straight).premultiplied();
    px.copy_from_slice(&<[u8; 4]>::from(out));
  })
}

#[inline]
fn clamp_u8(v: f64) -> u8 {
  v.clamp(0.0, 255.0) as u8
}

/// Adds a fixed amount to every color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
  amount: i16,
  pub parallelism: Parallelism,
}
impl Brightness {
  /// ## Failure
  /// * [`ImagingError::Argument`] unless `amount` is in `-255..=255`.
  #[inline]
  pub fn new(amount: i32) -> ImagingResult<Self> {
    if !(-255..=255).contains(&amount) {
      return Err(ImagingError::Argument("brightness must be within -255..=255"));
    }
    Ok(Self { amount: amount as i16, parallelism: Parallelism::default() })
  }

  #[inline]
  #[must_use]
  pub const fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub const fn amount(&self) -> i16 {
    self.amount
  }
}
impl ParallelImageFilter for Brightness {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    let shift = |c: u8| (i16::from(c) + self.amount).clamp(0, 255) as u8;
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| RGBA8 {
      r: shift(c.r),
      g: shift(c.g),
      b: shift(c.b),
      a: c.a,
    })
  }
}

/// Pushes color channels away from (or towards) the middle gray.
///
/// Each channel becomes `((c / 255 - 0.5) * (100 + amount) / 100 + 0.5) * 255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contrast {
  amount: i16,
  pub parallelism: Parallelism,
}
impl Contrast {
  /// ## Failure
  /// * [`ImagingError::Argument`] unless `amount` is in `-100..=100`.
  #[inline]
  pub fn new(amount: i32) -> ImagingResult<Self> {
    if !(-100..=100).contains(&amount) {
      return Err(ImagingError::Argument("contrast must be within -100..=100"));
    }
    Ok(Self { amount: amount as i16, parallelism: Parallelism::default() })
  }

  #[inline]
  #[must_use]
  pub const fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub const fn amount(&self) -> i16 {
    self.amount
  }
}
impl ParallelImageFilter for Contrast {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    let factor = (100.0 + f64::from(self.amount)) / 100.0;
    let stretch = |c: u8| clamp_u8(((f64::from(c) / 255.0 - 0.5) * factor + 0.5) * 255.0);
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| RGBA8 {
      r: stretch(c.r),
      g: stretch(c.g),
      b: stretch(c.b),
      a: c.a,
    })
  }
}

/// Multiplies each color channel by a tint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
  /// Only the color channels are used.
  pub color: RGBA8,
  pub parallelism: Parallelism,
}
impl Default for Tint {
  #[inline]
  fn default() -> Self {
    Self::new(RGBA8::WHITE)
  }
}
impl Tint {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub fn new(color: RGBA8) -> Self {
    Self { color, parallelism: Parallelism::default() }
  }
}
impl ParallelImageFilter for Tint {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    let scale = |c: u8, t: u8| (u16::from(c) * u16::from(t) / 255) as u8;
    let t = self.color;
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| RGBA8 {
      r: scale(c.r, t.r),
      g: scale(c.g, t.g),
      b: scale(c.b, t.b),
      a: c.a,
    })
  }
}

/// Replaces the color with a weighted sum of its channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grayscale {
  /// Red, green, and blue weights.
  pub coefficients: [f64; 3],
  pub parallelism: Parallelism,
}
impl Grayscale {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  /// ITU-R BT.709 luma.
  pub const BT709: [f64; 3] = [0.2125, 0.7154, 0.0721];
  /// The "R-Y" weights.
  pub const RMY: [f64; 3] = [0.5, 0.419, 0.081];
  /// ITU-R BT.601 luma.
  pub const BT601: [f64; 3] = [0.299, 0.587, 0.114];

  #[inline]
  #[must_use]
  pub fn new(coefficients: [f64; 3]) -> Self {
    Self { coefficients, parallelism: Parallelism::default() }
  }

  #[inline]
  #[must_use]
  pub fn bt709() -> Self {
    Self::new(Self::BT709)
  }

  #[inline]
  #[must_use]
  pub fn rmy() -> Self {
    Self::new(Self::RMY)
  }

  #[inline]
  #[must_use]
  pub fn bt601() -> Self {
    Self::new(Self::BT601)
  }
}
impl ParallelImageFilter for Grayscale {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    let [cr, cg, cb] = self.coefficients;
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| {
      let v = clamp_u8(f64::from(c.r) * cr + f64::from(c.g) * cg + f64::from(c.b) * cb);
      RGBA8 { r: v, g: v, b: v, a: c.a }
    })
  }
}

/// Inverts the color channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inverter {
  pub parallelism: Parallelism,
}
impl Inverter {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for Inverter {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| RGBA8 {
      r: 255 - c.r,
      g: 255 - c.g,
      b: 255 - c.b,
      a: c.a,
    })
  }
}

/// A brown old-photo tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sepia {
  pub parallelism: Parallelism,
}
impl Sepia {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for Sepia {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    map_straight(source.pitch(), rect, rows, target_rows, |_, _, c| {
      let t = clamp_u8(0.299 * f64::from(c.r) + 0.587 * f64::from(c.g) + 0.114 * f64::from(c.b));
      RGBA8 { r: t.saturating_add(49), g: t.saturating_sub(14), b: t.saturating_sub(56), a: c.a }
    })
  }
}

/// Mixes another image over this one.
///
/// The overlay is placed at the origin, pixels outside of it are left alone.
/// The mix factor is [`alpha`](Self::alpha) when set, otherwise the overlay
/// pixel's own alpha. The result keeps the base image's alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
  pub overlay: PixelBuffer,
  /// A fixed mix factor, `0.0..=1.0`.
  pub alpha: Option<f64>,
  pub parallelism: Parallelism,
}
impl Blend {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub fn new(overlay: PixelBuffer) -> Self {
    Self { overlay, alpha: None, parallelism: Parallelism::default() }
  }

  #[inline]
  #[must_use]
  pub fn with_alpha(mut self, alpha: f64) -> Self {
    self.alpha = Some(alpha);
    self
  }
}
impl ParallelImageFilter for Blend {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn prepare(&self, _source: &PixelBuffer, _rect: Rectangle) -> ImagingResult<()> {
    match self.alpha {
      Some(a) if !(0.0..=1.0).contains(&a) => Err(ImagingError::Argument("blend alpha must be within 0.0..=1.0")),
      _ => Ok(()),
    }
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    map_straight(source.pitch(), rect, rows, target_rows, |x, y, c| {
      let Some(over) = self.overlay.pixel(x, y) else {
        return c;
      };
      let over = over.unpremultiplied();
      let f = self.alpha.unwrap_or(f64::from(over.a) / 255.0);
      let mix = |a: u8, b: u8| clamp_u8((f64::from(a) * (1.0 - f)).trunc() + (f64::from(b) * f).trunc());
      RGBA8 { r: mix(c.r, over.r), g: mix(c.g, over.g), b: mix(c.b, over.b), a: c.a }
    })
  }
}

/// Fades out everything outside a circle centred in the rectangle.
///
/// Coverage is estimated from five points per pixel (the four corners and the
/// middle). Partly covered pixels are faded by the covered fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropCircle {
  /// Defaults to half the rectangle's shorter side.
  pub radius: Option<f64>,
  pub parallelism: Parallelism,
}
impl CropCircle {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  const OFFSETS: [(f64, f64); 5] = [(0.0, 0.0), (0.0, 1.0), (0.5, 0.5), (1.0, 1.0), (1.0, 0.0)];

  #[inline]
  #[must_use]
  pub fn with_radius(radius: f64) -> Self {
    Self { radius: Some(radius), parallelism: Parallelism::default() }
  }
}
impl ParallelImageFilter for CropCircle {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    let radius = match self.radius {
      Some(r) if r >= 0.0 => r,
      _ => f64::from(rect.width.min(rect.height)) * 0.5,
    };
    let radius_sq = radius * radius;
    let centre_x = (f64::from(rect.left()) + f64::from(rect.right())) * 0.5;
    let centre_y = (f64::from(rect.top()) + f64::from(rect.bottom())) * 0.5;
    for_each_rect_pixel(source.pitch(), rect, rows, target_rows, |x, y, px| {
      let inside = Self::OFFSETS
        .iter()
        .filter(|(ox, oy)| {
          let cx = f64::from(x) + ox - centre_x;
          let cy = f64::from(y) + oy - centre_y;
          radius_sq > cx * cx + cy * cy
        })
        .count();
      if inside < Self::OFFSETS.len() {
        let coverage = inside as f64 / Self::OFFSETS.len() as f64;
        // premultiplied, so fading alpha fades every channel
        for c in px.iter_mut() {
          *c = (f64::from(*c) * coverage) as u8;
        }
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filtering::ImageFilter;

  fn run(filter: &dyn ImageFilter, color: RGBA8) -> RGBA8 {
    let image = PixelBuffer::filled(1, 1, color).unwrap();
    filter.apply(&image, image.bounds()).unwrap().pixel(0, 0).unwrap()
  }

  #[test]
  fn test_brightness() {
    assert!(Brightness::new(256).is_err());
    assert!(Brightness::new(-256).is_err());
    let up = Brightness::new(100).unwrap();
    assert_eq!(run(&up, RGBA8::rgb(10, 200, 0)), RGBA8::rgb(110, 255, 100));
    let down = Brightness::new(-50).unwrap();
    assert_eq!(run(&down, RGBA8::rgb(10, 200, 60)), RGBA8::rgb(0, 150, 10));
    assert_eq!(run(&up, RGBA8::TRANSPARENT), RGBA8::TRANSPARENT);
  }

  #[test]
  fn test_contrast() {
    assert!(Contrast::new(101).is_err());
    let flat = Contrast::new(-100).unwrap();
    assert_eq!(run(&flat, RGBA8::rgb(0, 90, 255)), RGBA8::rgb(127, 127, 127));
    let none = Contrast::new(0).unwrap();
    assert_eq!(run(&none, RGBA8::rgb(0, 0, 255)), RGBA8::rgb(0, 0, 255));
    let max = Contrast::new(100).unwrap();
    assert_eq!(run(&max, RGBA8::rgb(0, 60, 255)), RGBA8::rgb(0, 0, 255));
  }

  #[test]
  fn test_tint_inverter_sepia() {
    let tint = Tint::new(RGBA8::rgb(255, 128, 0));
    assert_eq!(run(&tint, RGBA8::rgb(200, 200, 200)), RGBA8::rgb(200, 100, 0));
    assert_eq!(run(&Tint::default(), RGBA8::rgb(1, 2, 3)), RGBA8::rgb(1, 2, 3));
    assert_eq!(run(&Inverter::default(), RGBA8::rgb(0, 100, 255)), RGBA8::rgb(255, 155, 0));
    assert_eq!(run(&Sepia::default(), RGBA8::rgb(200, 0, 0)), RGBA8::rgb(108, 45, 3));
    assert_eq!(run(&Sepia::default(), RGBA8::BLACK), RGBA8::rgb(49, 0, 0));
  }

  #[test]
  fn test_grayscale_keeps_alpha() {
    let gray = Grayscale::bt601();
    assert_eq!(run(&gray, RGBA8::rgb(0, 255, 0)), RGBA8::rgb(149, 149, 149));
    assert_eq!(run(&Grayscale::bt709(), RGBA8::rgb(255, 0, 0)), RGBA8::rgb(54, 54, 54));
    assert_eq!(run(&Grayscale::rmy(), RGBA8::rgb(255, 0, 0)), RGBA8::rgb(127, 127, 127));
    let half = RGBA8 { r: 255, g: 255, b: 255, a: 128 }.premultiplied();
    assert_eq!(run(&gray, half).a, 128);
  }

  #[test]
  fn test_blend() {
    let base = PixelBuffer::filled(3, 1, RGBA8::rgb(200, 0, 100)).unwrap();
    let overlay = PixelBuffer::filled(2, 1, RGBA8::rgb(0, 200, 100)).unwrap();
    let out = Blend::new(overlay.clone()).with_alpha(0.5).apply(&base, base.bounds()).unwrap();
    assert_eq!(out.pixel(0, 0), Some(RGBA8::rgb(100, 100, 100)));
    assert_eq!(out.pixel(1, 0), Some(RGBA8::rgb(100, 100, 100)));
    assert_eq!(out.pixel(2, 0), Some(RGBA8::rgb(200, 0, 100)));
    // without a fixed alpha an opaque overlay replaces the color
    let out = Blend::new(overlay).apply(&base, base.bounds()).unwrap();
    assert_eq!(out.pixel(0, 0), Some(RGBA8::rgb(0, 200, 100)));
    let bad = Blend::new(PixelBuffer::new(1, 1)).with_alpha(1.5);
    assert!(bad.apply(&base, base.bounds()).is_err());
  }

  #[test]
  fn test_crop_circle() {
    let image = PixelBuffer::filled(10, 10, RGBA8::WHITE).unwrap();
    let out = CropCircle::default().apply(&image, image.bounds()).unwrap();
    assert_eq!(out.pixel(0, 0), Some(RGBA8::TRANSPARENT));
    assert_eq!(out.pixel(5, 5), Some(RGBA8::WHITE));
    assert_eq!(out.pixel(4, 4), Some(RGBA8::WHITE));
    // the top middle pixel is cut by the circle
    let edge = out.pixel(4, 0).unwrap();
    assert!(edge.a > 0 && edge.a < 255, "{edge:?}");
    assert_eq!(edge.r, edge.a);
    let small = CropCircle::with_radius(1.0).apply(&image, image.bounds()).unwrap();
    assert_eq!(small.pixel(2, 2), Some(RGBA8::TRANSPARENT));
    assert_eq!(small.pixel(4, 4).map(|p| p.a), Some(102));
  }
}
