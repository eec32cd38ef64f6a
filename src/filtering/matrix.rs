//! Convolution with square kernels.
//!
//! Neighborhood lookups wrap around the edges of the filtered rectangle
//! (toroidally), so a pixel on the left edge of the rectangle sees pixels from
//! its right edge. Nothing outside the rectangle is ever read.
//!
//! Sums are taken over the stored (premultiplied) channels. Each color result
//! is rounded, then clamped to `0..=alpha` so the output stays a valid
//! premultiplied pixel. The alpha channel is kept from the centre pixel.

use core::ops::Range;
use std::sync::OnceLock;

use super::filter::{for_each_rect_pixel, ParallelImageFilter};
use crate::{xy_width_to_index, ImagingError, ImagingResult, Parallelism, PixelBuffer, Rectangle};

/// A square grid of weights with an odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
  side: usize,
  weights: Vec<f64>,
}
impl Kernel {
  /// Makes a kernel from row-major weights.
  ///
  /// ## Failure
  /// * [`ImagingError::Argument`] if `side` is even, or `weights` doesn't have
  ///   `side * side` entries.
  pub fn new(side: usize, weights: Vec<f64>) -> ImagingResult<Self> {
    if side % 2 == 0 {
      return Err(ImagingError::Argument("kernel side must be odd"));
    }
    if side.checked_mul(side) != Some(weights.len()) {
      return Err(ImagingError::Argument("kernel weights must fill a side by side square"));
    }
    Ok(Self { side, weights })
  }

  /// Builds a Gaussian kernel.
  ///
  /// The variance is raised to at least 1. The side is
  /// `2 * floor(2 * variance) + 1`, and the weights are the 2D normal density
  /// at each offset from the centre. They are *not* normalized, so the kernel
  /// sums to a bit under 1.
  #[must_use]
  pub fn gaussian(variance: f64) -> Self {
    let v = variance.max(1.0);
    let side = (2.0 * v) as usize * 2 + 1;
    let half = (side / 2) as f64;
    let v2 = v * v;
    let factor = 1.0 / (2.0 * core::f64::consts::PI * v2);
    let mut weights = Vec::with_capacity(side * side);
    for y in 0..side {
      for x in 0..side {
        let dx = x as f64 - half;
        let dy = y as f64 - half;
        weights.push(factor * (-(dx * dx + dy * dy) / (2.0 * v2)).exp());
      }
    }
    Self { side, weights }
  }

  fn fixed(weights: [f64; 9]) -> Self {
    Self { side: 3, weights: weights.to_vec() }
  }

  #[inline]
  #[must_use]
  pub fn side(&self) -> usize {
    self.side
  }

  #[inline]
  #[must_use]
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  /// Weighted sum of the RGB channels of the neighborhood around `(x, y)`.
  fn sum_at(&self, source: &PixelBuffer, rect: Rectangle, x: u32, y: u32) -> [f64; 3] {
    let half = (self.side / 2) as i64;
    let pixels = source.pixels();
    let mut sum = [0.0; 3];
    for (ky, weight_row) in self.weights.chunks_exact(self.side).enumerate() {
      let sy = wrap(rect.y, rect.height, y, ky as i64 - half);
      for (kx, weight) in weight_row.iter().enumerate() {
        let sx = wrap(rect.x, rect.width, x, kx as i64 - half);
        let i = xy_width_to_index(sx, sy, source.width()) * 4;
        for (s, c) in sum.iter_mut().zip(&pixels[i..i + 3]) {
          *s += f64::from(*c) * weight;
        }
      }
    }
    sum
  }
}

/// Moves `pos` by `offset` inside `start..start+len`, wrapping around.
#[inline]
fn wrap(start: u32, len: u32, pos: u32, offset: i64) -> u32 {
  let local = i64::from(pos - start) + offset;
  start + local.rem_euclid(i64::from(len)) as u32
}

#[inline]
fn store(px: &mut [u8], rgb: [f64; 3]) {
  let alpha = f64::from(px[3]);
  for (c, v) in px.iter_mut().zip(rgb) {
    *c = v.round().clamp(0.0, alpha) as u8;
  }
}

/// Convolves one band of rows with a single kernel.
pub fn convolve_rows(
  kernel: &Kernel, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8],
) {
  for_each_rect_pixel(source.pitch(), rect, rows, target_rows, |x, y, px| {
    store(px, kernel.sum_at(source, rect, x, y));
  });
}

/// Convolves one band of rows with two kernels, combining each channel as
/// `sqrt(gx² + gy²)`.
pub fn convolve2d_rows(
  kernel_x: &Kernel, kernel_y: &Kernel, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>,
  target_rows: &mut [u8],
) {
  for_each_rect_pixel(source.pitch(), rect, rows, target_rows, |x, y, px| {
    let gx = kernel_x.sum_at(source, rect, x, y);
    let gy = kernel_y.sum_at(source, rect, x, y);
    store(px, [0, 1, 2].map(|i| gx[i].hypot(gy[i])));
  });
}

/// Convolves with any kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFilter {
  kernel: Kernel,
  pub parallelism: Parallelism,
}
impl MatrixFilter {
  #[inline]
  #[must_use]
  pub fn new(kernel: Kernel) -> Self {
    Self { kernel, parallelism: Parallelism::default() }
  }

  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub fn kernel(&self) -> &Kernel {
    &self.kernel
  }
}
impl ParallelImageFilter for MatrixFilter {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve_rows(&self.kernel, source, rect, rows, target_rows)
  }
}

/// Gaussian blur.
///
/// The kernel is built the first time the filter runs and reused until the
/// variance changes.
#[derive(Debug, Clone, Default)]
pub struct GaussianBlur {
  variance: f64,
  kernel: OnceLock<Kernel>,
  pub parallelism: Parallelism,
}
impl GaussianBlur {
  #[inline]
  #[must_use]
  pub fn new(variance: f64) -> Self {
    Self { variance, kernel: OnceLock::new(), parallelism: Parallelism::default() }
  }

  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub fn variance(&self) -> f64 {
    self.variance
  }

  /// Changes the variance, dropping the cached kernel if it differs.
  #[inline]
  pub fn set_variance(&mut self, variance: f64) {
    if variance != self.variance {
      self.variance = variance;
      self.kernel = OnceLock::new();
    }
  }

  /// The kernel for the current variance.
  #[inline]
  pub fn kernel(&self) -> &Kernel {
    self.kernel.get_or_init(|| {
      log::debug!("building gaussian kernel, variance {}", self.variance);
      Kernel::gaussian(self.variance)
    })
  }
}
impl ParallelImageFilter for GaussianBlur {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  #[inline]
  fn prepare(&self, _source: &PixelBuffer, _rect: Rectangle) -> ImagingResult<()> {
    self.kernel();
    Ok(())
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve_rows(self.kernel(), source, rect, rows, target_rows)
  }
}

const SOBEL_X: [f64; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
const SOBEL_Y: [f64; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const PREWITT_X: [f64; 9] = [-1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
const PREWITT_Y: [f64; 9] = [-1.0, 0.0, 1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0];

/// Sobel edge response along one axis (changes between rows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SobelX {
  pub parallelism: Parallelism,
}
impl SobelX {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for SobelX {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve_rows(&Kernel::fixed(SOBEL_X), source, rect, rows, target_rows)
  }
}

/// Sobel edge response along the other axis (changes between columns).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SobelY {
  pub parallelism: Parallelism,
}
impl SobelY {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for SobelY {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve_rows(&Kernel::fixed(SOBEL_Y), source, rect, rows, target_rows)
  }
}

/// Sobel edge detection, the gradient magnitude of [`SobelX`] and [`SobelY`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sobel {
  pub parallelism: Parallelism,
}
impl Sobel {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for Sobel {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve2d_rows(&Kernel::fixed(SOBEL_X), &Kernel::fixed(SOBEL_Y), source, rect, rows, target_rows)
  }
}

/// Prewitt edge detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prewitt {
  pub parallelism: Parallelism,
}
impl Prewitt {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ParallelImageFilter for Prewitt {
  #[inline]
  fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]) {
    convolve2d_rows(&Kernel::fixed(PREWITT_X), &Kernel::fixed(PREWITT_Y), source, rect, rows, target_rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{filtering::ImageFilter, RGBA8};

  fn box_blur() -> MatrixFilter {
    MatrixFilter::new(Kernel::new(3, vec![1.0 / 9.0; 9]).unwrap())
  }

  #[test]
  fn test_kernel_rejects_bad_shapes() {
    assert!(Kernel::new(2, vec![0.0; 4]).is_err());
    assert!(Kernel::new(3, vec![0.0; 8]).is_err());
    assert!(Kernel::new(1, vec![1.0]).is_ok());
  }

  #[test]
  fn test_gaussian_kernel_shape() {
    assert_eq!(Kernel::gaussian(0.2).side(), 5);
    assert_eq!(Kernel::gaussian(1.0).side(), 5);
    assert_eq!(Kernel::gaussian(1.6).side(), 7);
    assert_eq!(Kernel::gaussian(2.0).side(), 9);
    let k = Kernel::gaussian(1.0);
    let centre = k.weights()[12];
    assert!((centre - 1.0 / (2.0 * core::f64::consts::PI)).abs() < 1e-12);
    assert!(k.weights().iter().all(|w| *w <= centre));
    assert_eq!(k.weights()[0], k.weights()[24]);
  }

  #[test]
  fn test_gaussian_kernel_is_cached_per_variance() {
    let mut blur = GaussianBlur::new(1.0);
    let first: *const Kernel = blur.kernel();
    assert!(core::ptr::eq(first, blur.kernel()));
    blur.set_variance(1.0);
    assert_eq!(blur.kernel().side(), 5);
    blur.set_variance(3.0);
    assert_eq!(blur.kernel().side(), 13);
  }

  #[test]
  fn test_wraparound_reads_the_far_edge() {
    // a single column, so every horizontal neighbor is the pixel itself
    let mut image = PixelBuffer::filled(1, 3, RGBA8::rgb(90, 90, 90)).unwrap();
    image.set_pixel(0, 0, RGBA8::rgb(0, 0, 0));
    let out = box_blur().apply(&image, image.bounds()).unwrap();
    // each row sees all three rows once, three times over
    for y in 0..3 {
      assert_eq!(out.pixel(0, y), Some(RGBA8::rgb(60, 60, 60)));
    }
  }

  #[test]
  fn test_solid_image_is_unchanged_by_box_blur() {
    let image = PixelBuffer::filled(5, 4, RGBA8::rgb(10, 200, 33)).unwrap();
    assert_eq!(box_blur().apply(&image, image.bounds()).unwrap(), image);
  }

  #[test]
  fn test_single_column_solid_image_is_unchanged() {
    let color = RGBA8 { r: 40, g: 120, b: 7, a: 200 };
    let image = PixelBuffer::filled(1, 6, color).unwrap();
    assert_eq!(box_blur().apply(&image, image.bounds()).unwrap(), image);
    let wide = MatrixFilter::new(Kernel::new(5, vec![1.0 / 25.0; 25]).unwrap());
    let out = wide.apply(&image, image.bounds()).unwrap();
    assert!(out.as_rgba8().iter().all(|p| *p == color));
    let row = PixelBuffer::filled(7, 1, color).unwrap();
    assert_eq!(box_blur().apply(&row, row.bounds()).unwrap(), row);
  }

  #[test]
  fn test_only_the_rectangle_changes() {
    let mut image = PixelBuffer::filled(4, 4, RGBA8::rgb(100, 100, 100)).unwrap();
    image.set_pixel(1, 1, RGBA8::rgb(255, 255, 255));
    let rect = Rectangle::new(1, 1, 2, 2);
    let out = Sobel::default().apply(&image, rect).unwrap();
    for y in 0..4 {
      for x in 0..4 {
        if !(1..3).contains(&x) || !(1..3).contains(&y) {
          assert_eq!(out.pixel(x, y), image.pixel(x, y), "({x},{y})");
        }
      }
    }
  }

  #[test]
  fn test_edge_detectors_find_a_step() {
    // left half black, right half white
    let mut image = PixelBuffer::filled(6, 3, RGBA8::BLACK).unwrap();
    for y in 0..3 {
      for x in 3..6 {
        image.set_pixel(x, y, RGBA8::WHITE);
      }
    }
    let sobel = Sobel::default().apply(&image, image.bounds()).unwrap();
    let prewitt = Prewitt::default().apply(&image, image.bounds()).unwrap();
    for out in [sobel, prewitt] {
      assert_eq!(out.pixel(1, 1), Some(RGBA8::BLACK));
      assert_eq!(out.pixel(2, 1), Some(RGBA8::WHITE));
      assert_eq!(out.pixel(3, 1), Some(RGBA8::WHITE));
      assert_eq!(out.pixel(4, 1), Some(RGBA8::BLACK));
    }
    // the rows are all the same, so there's no response between rows
    let rows_only = SobelX::default().apply(&image, image.bounds()).unwrap();
    assert!(rows_only.as_rgba8().iter().all(|px| *px == RGBA8::BLACK));
    let cols_only = SobelY::default().apply(&image, image.bounds()).unwrap();
    assert_eq!(cols_only.pixel(2, 0), Some(RGBA8::WHITE));
  }

  #[test]
  fn test_output_stays_premultiplied() {
    let mut image = PixelBuffer::filled(3, 3, RGBA8 { r: 0, g: 0, b: 0, a: 100 }).unwrap();
    image.set_pixel(1, 1, RGBA8 { r: 100, g: 100, b: 100, a: 100 });
    let out = Sobel::default().apply(&image, image.bounds()).unwrap();
    assert!(out.as_rgba8().iter().all(|px| px.r <= px.a && px.a == 100));
  }
}
