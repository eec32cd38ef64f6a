//! Scanline filtering, in both directions.

use crate::{FormatError, ImagingResult};

/// The predictor used by the Paeth filter.
#[inline]
#[must_use]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The order of these tests decides ties and must not change.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// The five PNG scanline filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl FilterType {
  /// All filters, in tag order.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];
}
impl TryFrom<u8> for FilterType {
  type Error = FormatError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::ALL.get(usize::from(value)).copied().ok_or(FormatError::IllegalFilterType(value))
  }
}

/// Undoes the filtering of one row at a time.
///
/// Holds the previous (already unfiltered) row, which starts as all zero. After
/// each row the two row buffers trade places, so nothing is copied between
/// rows.
#[derive(Debug, Clone)]
pub struct ScanlineDefilterer {
  bytes_per_pixel: usize,
  previous: Vec<u8>,
  current: Vec<u8>,
  row: u32,
}
impl ScanlineDefilterer {
  /// A defilterer for rows of `stride` bytes.
  #[inline]
  #[must_use]
  pub fn new(stride: usize, bytes_per_pixel: usize) -> Self {
    Self { bytes_per_pixel, previous: vec![0; stride], current: vec![0; stride], row: 0 }
  }

  /// Unfilters one `stride + 1` byte line (filter tag then samples).
  ///
  /// Gives back the index of the row and the unfiltered samples.
  ///
  /// ## Failure
  /// * [`FormatError::IllegalFilterType`] for a tag outside `0..=4`.
  /// * [`FormatError::IncompleteImageData`] if `line` is the wrong length.
  pub fn next_row(&mut self, line: &[u8]) -> ImagingResult<(u32, &[u8])> {
    let (tag, filtered) = line.split_first().ok_or(FormatError::IncompleteImageData)?;
    if filtered.len() != self.current.len() {
      return Err(FormatError::IncompleteImageData.into());
    }
    let filter = FilterType::try_from(*tag)?;
    core::mem::swap(&mut self.previous, &mut self.current);
    let (prev, cur, bpp) = (&self.previous, &mut self.current, self.bytes_per_pixel);
    match filter {
      FilterType::None => cur.copy_from_slice(filtered),
      FilterType::Sub => {
        for i in 0..cur.len() {
          let a = if i >= bpp { cur[i - bpp] } else { 0 };
          cur[i] = filtered[i].wrapping_add(a);
        }
      }
      FilterType::Up => {
        for ((c, f), b) in cur.iter_mut().zip(filtered).zip(prev) {
          *c = f.wrapping_add(*b);
        }
      }
      FilterType::Average => {
        for i in 0..cur.len() {
          let a = if i >= bpp { cur[i - bpp] } else { 0 };
          let avg = ((u16::from(a) + u16::from(prev[i])) / 2) as u8;
          cur[i] = filtered[i].wrapping_add(avg);
        }
      }
      FilterType::Paeth => {
        for i in 0..cur.len() {
          let (a, c) = if i >= bpp { (cur[i - bpp], prev[i - bpp]) } else { (0, 0) };
          cur[i] = filtered[i].wrapping_add(paeth_predictor(a, prev[i], c));
        }
      }
    }
    let row = self.row;
    self.row += 1;
    Ok((row, &self.current))
  }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterStrategy {
  /// No filter on the first row, `Up` on every other row.
  #[default]
  Naive,
  /// Per row, the filter with the smallest sum of absolute residuals (each
  /// output byte read as an `i8`).
  Adaptive,
}

/// Filters one row into `out`, which gets the tag byte then the residuals.
///
/// `prev` is the previous raw row, or all zero for the first row.
pub fn filter_row(filter: FilterType, bpp: usize, prev: &[u8], cur: &[u8], out: &mut Vec<u8>) {
  out.push(filter as u8);
  match filter {
    FilterType::None => out.extend_from_slice(cur),
    FilterType::Sub => out.extend(
      cur.iter().enumerate().map(|(i, x)| x.wrapping_sub(if i >= bpp { cur[i - bpp] } else { 0 })),
    ),
    FilterType::Up => out.extend(cur.iter().zip(prev).map(|(x, b)| x.wrapping_sub(*b))),
    FilterType::Average => out.extend(cur.iter().enumerate().map(|(i, x)| {
      let a = if i >= bpp { cur[i - bpp] } else { 0 };
      x.wrapping_sub(((u16::from(a) + u16::from(prev[i])) / 2) as u8)
    })),
    FilterType::Paeth => out.extend(cur.iter().enumerate().map(|(i, x)| {
      let (a, c) = if i >= bpp { (cur[i - bpp], prev[i - bpp]) } else { (0, 0) };
      x.wrapping_sub(paeth_predictor(a, prev[i], c))
    })),
  }
}

/// Filters one row with whatever `strategy` picks.
pub fn filter_row_with(
  strategy: FilterStrategy, row: u32, bpp: usize, prev: &[u8], cur: &[u8], out: &mut Vec<u8>,
) {
  match strategy {
    FilterStrategy::Naive => {
      let filter = if row == 0 { FilterType::None } else { FilterType::Up };
      filter_row(filter, bpp, prev, cur, out);
    }
    FilterStrategy::Adaptive => {
      let mut best: Option<(u64, Vec<u8>)> = None;
      for filter in FilterType::ALL {
        let mut candidate = Vec::with_capacity(cur.len() + 1);
        filter_row(filter, bpp, prev, cur, &mut candidate);
        let score: u64 = candidate[1..].iter().map(|b| u64::from((*b as i8).unsigned_abs())).sum();
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
          best = Some((score, candidate));
        }
      }
      if let Some((_, bytes)) = best {
        out.extend_from_slice(&bytes);
      }
    }
  }
}

#[test]
fn test_paeth_predictor() {
  assert_eq!(paeth_predictor(0, 0, 0), 0);
  // a == b == c makes all three distances equal, `a` wins
  assert_eq!(paeth_predictor(7, 7, 7), 7);
  // p = 10, pa = 0, pb = 10, pc = 0: the tie between a and c goes to a
  assert_eq!(paeth_predictor(10, 0, 0), 10);
  // p = 10, pa = 10, pb = 0, pc = 0: the tie between b and c goes to b
  assert_eq!(paeth_predictor(0, 10, 0), 10);
  // p = -10, pa = 10, pb = 10, pc = 20: the tie between a and b goes to a
  assert_eq!(paeth_predictor(0, 0, 10), 0);
  assert_eq!(paeth_predictor(5, 0, 10), 0);
}

#[test]
fn test_defilter_reverses_every_filter() {
  let bpp = 3;
  let rows: [&[u8]; 3] = [&[1, 2, 3, 250, 251, 252], &[9, 200, 3, 4, 0, 255], &[128, 127, 126, 0, 1, 2]];
  for filter in FilterType::ALL {
    let mut defilter = ScanlineDefilterer::new(6, bpp);
    let mut prev = vec![0_u8; 6];
    for (y, row) in rows.iter().enumerate() {
      let mut line = Vec::new();
      filter_row(filter, bpp, &prev, row, &mut line);
      let (r, out) = defilter.next_row(&line).unwrap();
      assert_eq!(r as usize, y);
      assert_eq!(out, *row, "{filter:?}");
      prev = row.to_vec();
    }
  }
}

#[test]
fn test_none_filter_is_identity() {
  let row = [3_u8, 1, 4, 1, 5, 9, 2, 6];
  let mut line = Vec::new();
  filter_row(FilterType::None, 4, &[0; 8], &row, &mut line);
  assert_eq!(&line[1..], &row);
  let mut defilter = ScanlineDefilterer::new(8, 4);
  assert_eq!(defilter.next_row(&line).unwrap().1, &row);
}

#[test]
fn test_defilter_rejects_bad_tag() {
  let mut defilter = ScanlineDefilterer::new(2, 1);
  assert_eq!(defilter.next_row(&[5, 0, 0]), Err(crate::ImagingError::Format(FormatError::IllegalFilterType(5))));
  assert_eq!(defilter.next_row(&[0, 0]), Err(crate::ImagingError::Format(FormatError::IncompleteImageData)));
}

#[test]
fn test_adaptive_filter_picks_smallest_residuals() {
  // a smooth ramp: Sub leaves all 1s
  let row: Vec<u8> = (0..16).collect();
  let mut out = Vec::new();
  filter_row_with(FilterStrategy::Adaptive, 0, 1, &[0; 16], &row, &mut out);
  assert_eq!(out[0], FilterType::Sub as u8);
  let mut defilter = ScanlineDefilterer::new(16, 1);
  assert_eq!(defilter.next_row(&out).unwrap().1, row.as_slice());
}
