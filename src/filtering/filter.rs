use core::ops::Range;

use super::tiling::for_each_partition;
use crate::{ImagingResult, Parallelism, PixelBuffer, Rectangle};

/// An operation that makes a new image from a source image.
///
/// Only the pixels inside the rectangle change, everything else is copied
/// from the source.
pub trait ImageFilter {
  /// Applies the filter within `rect` (clipped to the image).
  fn apply(&self, source: &PixelBuffer, rect: Rectangle) -> ImagingResult<PixelBuffer>;
}

/// A filter that works one band of rows at a time.
///
/// Implementors get [`ImageFilter`] for free. The target starts as a copy of
/// the source, then each band of the rectangle's rows is handed to
/// [`apply_rows`](Self::apply_rows), possibly on different threads.
pub trait ParallelImageFilter: Sync {
  /// How many bands to split the rows into.
  fn parallelism(&self) -> Parallelism;

  /// Called once on the calling thread before any rows are processed.
  ///
  /// Validation and any per-call setup go here, since `apply_rows` can't fail.
  fn prepare(&self, _source: &PixelBuffer, _rect: Rectangle) -> ImagingResult<()> {
    Ok(())
  }

  /// Fills in the pixels of `rows` that are inside `rect`.
  ///
  /// `target_rows` holds exactly the full-width rows in `rows`, already
  /// holding a copy of the source. Reads must only come from `source`.
  fn apply_rows(&self, source: &PixelBuffer, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8]);
}

impl<T: ParallelImageFilter> ImageFilter for T {
  fn apply(&self, source: &PixelBuffer, rect: Rectangle) -> ImagingResult<PixelBuffer> {
    let Some(rect) = rect.intersect(&source.bounds()) else {
      return Ok(source.clone());
    };
    self.prepare(source, rect)?;
    let mut target = source.clone();
    let pitch = target.pitch();
    for_each_partition(target.pixels_mut(), pitch, rect.top()..rect.bottom(), self.parallelism(), |rows, bytes| {
      self.apply_rows(source, rect, rows, bytes)
    });
    Ok(target)
  }
}

/// Runs each filter in turn over the whole image.
pub fn apply_filters(image: &PixelBuffer, filters: &[&dyn ImageFilter]) -> ImagingResult<PixelBuffer> {
  apply_filters_in(image, image.bounds(), filters)
}

/// Runs each filter in turn over one rectangle of the image.
pub fn apply_filters_in(
  image: &PixelBuffer, rect: Rectangle, filters: &[&dyn ImageFilter],
) -> ImagingResult<PixelBuffer> {
  let mut current = image.clone();
  for filter in filters {
    current = filter.apply(&current, rect)?;
  }
  Ok(current)
}

/// Helper for the common case of a per pixel loop inside `apply_rows`.
///
/// Calls `op(x, y, pixel)` for every pixel of `rows` inside `rect`, where
/// `pixel` is the target's 4 bytes and rows are `pitch` bytes.
#[inline]
pub(crate) fn for_each_rect_pixel(
  pitch: usize, rect: Rectangle, rows: Range<u32>, target_rows: &mut [u8],
  mut op: impl FnMut(u32, u32, &mut [u8]),
) {
  if pitch == 0 {
    return;
  }
  let span = rect.left() as usize * 4..rect.right() as usize * 4;
  for (y, row) in rows.zip(target_rows.chunks_exact_mut(pitch)) {
    for (x, px) in (rect.left()..).zip(row[span.clone()].chunks_exact_mut(4)) {
      op(x, y, px);
    }
  }
}
