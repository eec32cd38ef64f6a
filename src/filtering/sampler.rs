//! Resampling an image to a new size.

use super::{filter::for_each_rect_pixel, tiling::for_each_partition};
use crate::{
  transform::fit_dimensions, xy_width_to_index, ImagingError, ImagingResult, Parallelism, PixelBuffer, Rectangle,
  RGBA8,
};

/// Makes a resized copy of an image.
pub trait ImageSampler {
  /// ## Failure
  /// * [`ImagingError::Argument`] if the source or the target size is empty.
  fn sample(&self, source: &PixelBuffer, width: u32, height: u32) -> ImagingResult<PixelBuffer>;
}

/// Allocates the target and calls `op(x, y, pixel)` for each of its pixels,
/// spread over `parallelism` row bands.
fn sample_pixels<F>(
  source: &PixelBuffer, width: u32, height: u32, parallelism: Parallelism, op: F,
) -> ImagingResult<PixelBuffer>
where
  F: Fn(u32, u32, &mut [u8]) + Sync,
{
  if width == 0 || height == 0 {
    return Err(ImagingError::Argument("can't sample to a zero size"));
  }
  if source.width() == 0 || source.height() == 0 {
    return Err(ImagingError::Argument("can't sample an empty image"));
  }
  log::trace!("sampling {}x{} to {width}x{height}", source.width(), source.height());
  let mut target = PixelBuffer::zeroed(width, height)?;
  let pitch = target.pitch();
  let all = Rectangle::from_size(width, height);
  for_each_partition(target.pixels_mut(), pitch, 0..height, parallelism, |rows, bytes| {
    for_each_rect_pixel(pitch, all, rows, bytes, |x, y, px| op(x, y, px))
  });
  Ok(target)
}

#[inline]
fn source_px(source: &PixelBuffer, x: u32, y: u32) -> &[u8] {
  let i = xy_width_to_index(x, y, source.width()) * 4;
  &source.pixels()[i..i + 4]
}

/// Picks the closest source pixel. Same size sampling is an exact copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestNeighborSampler {
  pub parallelism: Parallelism,
}
impl NearestNeighborSampler {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ImageSampler for NearestNeighborSampler {
  fn sample(&self, source: &PixelBuffer, width: u32, height: u32) -> ImagingResult<PixelBuffer> {
    let (src_w, src_h) = (u64::from(source.width()), u64::from(source.height()));
    sample_pixels(source, width, height, self.parallelism, |x, y, px| {
      let sx = (u64::from(x) * src_w / u64::from(width)) as u32;
      let sy = (u64::from(y) * src_h / u64::from(height)) as u32;
      px.copy_from_slice(source_px(source, sx, sy));
    })
  }
}

/// The two source positions to either side of `pos`, and how far along it is.
///
/// At the last position both sides are the same.
#[inline]
fn bilinear_axis(pos: u32, factor: f64, len: u32) -> (u32, u32, f64) {
  let p = f64::from(pos) * factor;
  let lo = (p.floor() as u32).min(len - 1);
  let hi = if lo + 1 < len { lo + 1 } else { lo };
  (lo, hi, p - f64::from(lo))
}

/// Blends the four closest source pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BilinearSampler {
  /// Weight each pixel's color by its alpha, so transparent neighbors don't
  /// darken the result.
  pub alpha_aware: bool,
  pub parallelism: Parallelism,
}
impl BilinearSampler {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }

  #[inline]
  #[must_use]
  pub fn alpha_aware() -> Self {
    Self { alpha_aware: true, parallelism: Parallelism::default() }
  }
}
impl ImageSampler for BilinearSampler {
  fn sample(&self, source: &PixelBuffer, width: u32, height: u32) -> ImagingResult<PixelBuffer> {
    let factor_x = f64::from(source.width()) / f64::from(width);
    let factor_y = f64::from(source.height()) / f64::from(height);
    sample_pixels(source, width, height, self.parallelism, |x, y, px| {
      let (t, b, fy) = bilinear_axis(y, factor_y, source.height());
      let (l, r, fx) = bilinear_axis(x, factor_x, source.width());
      let corners = [source_px(source, l, t), source_px(source, r, t), source_px(source, l, b), source_px(source, r, b)];
      if self.alpha_aware {
        let weights = [(1.0 - fx) * (1.0 - fy), fx * (1.0 - fy), (1.0 - fx) * fy, fx * fy];
        let straight = corners.map(|c| RGBA8 { r: c[0], g: c[1], b: c[2], a: c[3] }.unpremultiplied());
        let alpha: f64 = weights.iter().zip(&straight).map(|(w, c)| w * f64::from(c.a)).sum();
        if alpha <= 0.0 {
          px.fill(0);
          return;
        }
        let channel = |get: fn(&RGBA8) -> u8| {
          let sum: f64 = weights.iter().zip(&straight).map(|(w, c)| w * f64::from(c.a) * f64::from(get(c))).sum();
          (sum / alpha).round().clamp(0.0, 255.0) as u8
        };
        let out = RGBA8 { r: channel(|c| c.r), g: channel(|c| c.g), b: channel(|c| c.b), a: alpha.round() as u8 };
        px.copy_from_slice(&<[u8; 4]>::from(out.premultiplied()));
      } else {
        for (i, out) in px.iter_mut().enumerate() {
          let mix = |a: u8, b: u8, f: f64| {
            ((1.0 - f) * f64::from(a) + f * f64::from(b)).round().clamp(0.0, 255.0) as u8
          };
          let top = mix(corners[0][i], corners[1][i], fx);
          let bottom = mix(corners[2][i], corners[3][i], fx);
          *out = mix(top, bottom, fy);
        }
      }
    })
  }
}

/// One axis of a super sampling footprint.
///
/// The output pixel covers source positions `first..=last`, with `first`
/// partly covered by `first_weight` and `last` by `last_weight`. Everything
/// between is fully covered.
#[derive(Debug, Clone, Copy)]
struct Footprint {
  first: u32,
  first_weight: f64,
  last: u32,
  last_weight: f64,
}
impl Footprint {
  #[inline]
  fn new(pos: u32, factor: f64) -> Self {
    let start = f64::from(pos) * factor;
    let first = start.floor();
    let end = f64::from(pos + 1) * factor;
    let last = (end - 0.000001).floor();
    Self { first: first as u32, first_weight: 1.0 - (start - first), last: last as u32, last_weight: end - last }
  }

  /// The fully covered positions.
  #[inline]
  fn inner(&self) -> core::ops::Range<u32> {
    self.first + 1..self.last
  }

  #[inline]
  fn inner_len(&self) -> f64 {
    f64::from(self.last.saturating_sub(self.first + 1))
  }
}

/// Averages all the source pixels under each target pixel (area averaging).
///
/// Only used when shrinking in both directions, anything else is handed to a
/// plain [`BilinearSampler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperSamplingSampler {
  pub parallelism: Parallelism,
}
impl SuperSamplingSampler {
  #[inline]
  #[must_use]
  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}
impl ImageSampler for SuperSamplingSampler {
  fn sample(&self, source: &PixelBuffer, width: u32, height: u32) -> ImagingResult<PixelBuffer> {
    if !(width < source.width() && height < source.height()) {
      return BilinearSampler { alpha_aware: false, parallelism: self.parallelism }.sample(source, width, height);
    }
    let factor_x = f64::from(source.width()) / f64::from(width);
    let factor_y = f64::from(source.height()) / f64::from(height);
    sample_pixels(source, width, height, self.parallelism, |x, y, px| {
      let v = Footprint::new(y, factor_y);
      let h = Footprint::new(x, factor_x);
      let mut sum = [0.0_f64; 4];
      let mut add = |sx: u32, sy: u32, weight: f64| {
        for (s, c) in sum.iter_mut().zip(source_px(source, sx, sy)) {
          *s += f64::from(*c) * weight;
        }
      };
      for sy in v.inner() {
        add(h.first, sy, h.first_weight);
        add(h.last, sy, h.last_weight);
      }
      for sx in h.inner() {
        add(sx, v.first, v.first_weight);
        add(sx, v.last, v.last_weight);
      }
      for sy in v.inner() {
        for sx in h.inner() {
          add(sx, sy, 1.0);
        }
      }
      add(h.first, v.first, v.first_weight * h.first_weight);
      add(h.last, v.first, v.first_weight * h.last_weight);
      add(h.first, v.last, v.last_weight * h.first_weight);
      add(h.last, v.last, v.last_weight * h.last_weight);

      let total = v.inner_len() * (h.first_weight + h.last_weight)
        + h.inner_len() * (v.first_weight + v.last_weight)
        + v.inner_len() * h.inner_len()
        + (v.first_weight + v.last_weight) * (h.first_weight + h.last_weight);
      for (out, s) in px.iter_mut().zip(sum) {
        *out = (s / total).round().clamp(0.0, 255.0) as u8;
      }
    })
  }
}

/// Resizes an image, with super sampling unless another sampler is given.
pub fn resize(
  image: &PixelBuffer, width: u32, height: u32, sampler: Option<&dyn ImageSampler>,
) -> ImagingResult<PixelBuffer> {
  match sampler {
    Some(sampler) => sampler.sample(image, width, height),
    None => SuperSamplingSampler::default().sample(image, width, height),
  }
}

/// Resizes an image so its longer edge is `size`, keeping the aspect ratio.
pub fn resize_to_fit(image: &PixelBuffer, size: u32, sampler: Option<&dyn ImageSampler>) -> ImagingResult<PixelBuffer> {
  let (width, height) = fit_dimensions(image.width(), image.height(), size)?;
  resize(image, width, height, sampler)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn reds(image: &PixelBuffer) -> Vec<u8> {
    image.as_rgba8().iter().map(|p| p.r).collect()
  }

  fn gradient(w: u32, h: u32) -> PixelBuffer {
    let pixels = (0..w * h).flat_map(|i| [(i * 10) as u8, 0, 0, 255]).collect();
    PixelBuffer::from_pixels(w, h, pixels).unwrap()
  }

  #[test]
  fn test_zero_sizes_are_rejected() {
    let image = gradient(4, 4);
    let samplers: [&dyn ImageSampler; 3] =
      [&NearestNeighborSampler::default(), &BilinearSampler::default(), &SuperSamplingSampler::default()];
    for sampler in samplers {
      assert!(sampler.sample(&image, 0, 3).is_err());
      assert!(sampler.sample(&image, 3, 0).is_err());
      assert!(sampler.sample(&PixelBuffer::new(0, 0), 3, 3).is_err());
    }
  }

  #[test]
  fn test_nearest_neighbor() {
    let image = gradient(5, 3);
    assert_eq!(NearestNeighborSampler::default().sample(&image, 5, 3).unwrap(), image);
    let half = NearestNeighborSampler::default().sample(&gradient(4, 1), 2, 1).unwrap();
    assert_eq!(reds(&half), [0, 20]);
    let double = NearestNeighborSampler::default().sample(&gradient(2, 1), 4, 1).unwrap();
    assert_eq!(reds(&double), [0, 0, 10, 10]);
  }

  #[test]
  fn test_bilinear_upscale() {
    let image = PixelBuffer::from_pixels(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
    let out = BilinearSampler::default().sample(&image, 4, 1).unwrap();
    assert_eq!(reds(&out), [0, 128, 255, 255]);
    assert!(out.as_rgba8().iter().all(|p| p.a == 255));
  }

  #[test]
  fn test_alpha_aware_bilinear() {
    let image = PixelBuffer::from_pixels(2, 1, vec![0, 0, 0, 0, 255, 0, 0, 255]).unwrap();
    let out = BilinearSampler::alpha_aware().sample(&image, 4, 1).unwrap();
    assert_eq!(out.pixel(0, 0), Some(RGBA8::TRANSPARENT));
    assert_eq!(out.pixel(1, 0), Some(RGBA8 { r: 128, g: 0, b: 0, a: 128 }));
    assert_eq!(out.pixel(2, 0), Some(RGBA8::rgb(255, 0, 0)));
  }

  #[test]
  fn test_super_sampling_averages_blocks() {
    let image = gradient(4, 4);
    let out = SuperSamplingSampler::default().sample(&image, 2, 2).unwrap();
    assert_eq!(reds(&out), [25, 45, 105, 125]);
    assert!(out.as_rgba8().iter().all(|p| p.a == 255));
  }

  #[test]
  fn test_super_sampling_uneven_footprint() {
    // 3 to 2 columns: the middle source column is split between both outputs
    let pixels = [0, 90, 180].repeat(3).into_iter().flat_map(|r| [r, 0, 0, 255]).collect();
    let image = PixelBuffer::from_pixels(3, 3, pixels).unwrap();
    let out = SuperSamplingSampler::default().sample(&image, 2, 2).unwrap();
    let left = out.pixel(0, 0).unwrap().r;
    let right = out.pixel(1, 0).unwrap().r;
    assert!((29..=31).contains(&left), "{left}");
    assert!((149..=151).contains(&right), "{right}");
  }

  #[test]
  fn test_solid_opaque_image_keeps_its_color() {
    let samplers: [&dyn ImageSampler; 3] =
      [&BilinearSampler::default(), &BilinearSampler::alpha_aware(), &SuperSamplingSampler::default()];
    for color in [RGBA8::rgb(200, 77, 13), RGBA8::rgb(255, 200, 3), RGBA8::WHITE] {
      let big = PixelBuffer::filled(10, 10, color).unwrap();
      let small = PixelBuffer::filled(3, 3, color).unwrap();
      for sampler in samplers {
        for (source, (w, h)) in [(&small, (7, 7)), (&big, (6, 9)), (&big, (3, 3)), (&big, (7, 13))] {
          let out = sampler.sample(source, w, h).unwrap();
          assert!(out.as_rgba8().iter().all(|p| *p == color), "{color:?} to {w}x{h}");
        }
      }
    }
  }

  #[test]
  fn test_super_sampling_falls_back_when_growing() {
    let image = gradient(3, 2);
    let ss = SuperSamplingSampler::default().sample(&image, 6, 1).unwrap();
    let bl = BilinearSampler::default().sample(&image, 6, 1).unwrap();
    assert_eq!(ss, bl);
  }

  #[test]
  fn test_resize_helpers() {
    let image = gradient(8, 4);
    let out = resize(&image, 4, 2, None).unwrap();
    assert_eq!(out, SuperSamplingSampler::default().sample(&image, 4, 2).unwrap());
    let fit = resize_to_fit(&image, 2, Some(&NearestNeighborSampler::default())).unwrap();
    assert_eq!((fit.width(), fit.height()), (2, 1));
    assert!(resize_to_fit(&image, 0, None).is_err());
  }
}
