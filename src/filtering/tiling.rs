//! Splitting an image's rows into partitions that run at the same time.
//!
//! Every worker gets its own `&mut` slice of the destination rows (carved out
//! with `split_at_mut`), and shares the source only by `&`. So no worker can
//! see another's writes, and the output can't depend on how many partitions
//! there were.

use core::ops::Range;

use rayon::prelude::*;

use crate::Parallelism;

/// Splits `rows` into `partitions` contiguous ranges.
///
/// Each range has `len / partitions` rows, except the last one which also
/// takes the remainder. Together they cover every row exactly once. Some
/// ranges are empty when there are more partitions than rows.
#[must_use]
pub fn partition_rows(rows: Range<u32>, partitions: usize) -> Vec<Range<u32>> {
  let partitions = partitions.max(1);
  let len = rows.end.saturating_sub(rows.start);
  let batch = (len as usize / partitions) as u32;
  let mut out = Vec::with_capacity(partitions);
  let mut start = rows.start;
  for _ in 1..partitions {
    out.push(start..start + batch);
    start += batch;
  }
  out.push(start..rows.end.max(start));
  out
}

/// Runs `op` over the given `rows` of `target`, one call per partition.
///
/// `target` holds whole rows of `pitch` bytes. Each call gets its range of
/// rows and exactly the bytes of those rows. With a parallelism of 1 the only
/// call happens on the current thread, otherwise the calls go to the rayon
/// pool and this returns once they've all finished.
///
/// ## Panics
/// * If `rows` goes past the end of `target`.
pub fn for_each_partition<F>(target: &mut [u8], pitch: usize, rows: Range<u32>, parallelism: Parallelism, op: F)
where
  F: Fn(Range<u32>, &mut [u8]) + Sync,
{
  if rows.is_empty() {
    return;
  }
  let (_, rest) = target.split_at_mut(rows.start as usize * pitch);
  let (mut rest, _) = rest.split_at_mut((rows.end - rows.start) as usize * pitch);
  if parallelism.get() == 1 {
    op(rows, rest);
    return;
  }
  let ranges = partition_rows(rows, parallelism.get());
  log::trace!("dispatching {} row partitions", ranges.len());
  let mut jobs: Vec<(Range<u32>, &mut [u8])> = Vec::with_capacity(ranges.len());
  for range in ranges {
    let (here, later) = core::mem::take(&mut rest).split_at_mut((range.end - range.start) as usize * pitch);
    jobs.push((range, here));
    rest = later;
  }
  jobs.into_par_iter().filter(|(range, _)| !range.is_empty()).for_each(|(range, rows)| op(range, rows));
}

#[test]
fn test_partition_rows_covers_everything() {
  assert_eq!(partition_rows(0..10, 3), [0..3, 3..6, 6..10]);
  assert_eq!(partition_rows(5..13, 4), [5..7, 7..9, 9..11, 11..13]);
  assert_eq!(partition_rows(0..2, 4), [0..0, 0..0, 0..0, 0..2]);
  assert_eq!(partition_rows(0..7, 1), [0..7]);
  for n in 1..=9 {
    for h in 0..=20 {
      let parts = partition_rows(0..h, n);
      assert_eq!(parts.len(), n);
      let mut next = 0;
      for p in parts {
        assert_eq!(p.start, next);
        next = p.end;
      }
      assert_eq!(next, h);
    }
  }
}

#[test]
fn test_for_each_partition_touches_only_given_rows() {
  for n in [1, 2, 3, 8] {
    let mut buffer = vec![0_u8; 6 * 2];
    for_each_partition(&mut buffer, 2, 1..5, Parallelism::new(n).unwrap(), |rows, bytes| {
      assert_eq!(bytes.len(), (rows.end - rows.start) as usize * 2);
      for (y, row) in rows.zip(bytes.chunks_exact_mut(2)) {
        row.fill(y as u8);
      }
    });
    assert_eq!(buffer, [0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 0, 0], "n = {n}");
  }
}
