//! Unpacking of samples that are smaller than a byte.
//!
//! Formats with 1, 2, or 4 bit samples pack them into bytes starting from the
//! most significant bits. These helpers spread them out to one sample per
//! byte, either as raw values (for palette indexes) or scaled up to the full
//! `0..=255` range (for intensities).

use bitfrob::u8_replicate_bits;

/// How unpacked samples are stored in the output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleScaling {
  /// Keep the numeric value as-is, eg: a 2-bit `0b11` becomes `3`.
  Raw,
  /// Stretch to the full byte range, eg: a 2-bit `0b11` becomes `255`.
  ///
  /// This equals `v * 255 / (2^bits - 1)` for every sample value.
  Scaled,
}

/// Unpacks `out.len()` samples of `bit_depth` bits each out of `packed`.
///
/// * A depth of 8 copies the bytes straight across (scaling is the identity).
/// * Samples that would run past the end of `packed` come out as 0.
///
/// ## Panics
/// * If `bit_depth` is not 1, 2, 4, or 8.
#[inline]
#[track_caller]
pub fn unpack_samples(bit_depth: u8, packed: &[u8], scaling: SampleScaling, out: &mut [u8]) {
  match bit_depth {
    8 => {
      let n = out.len().min(packed.len());
      out[..n].copy_from_slice(&packed[..n]);
      out[n..].fill(0);
    }
    1 | 2 | 4 => {
      let bits = u32::from(bit_depth);
      let per_byte = (8 / bits) as usize;
      let mask = (1_u8 << bits) - 1;
      for (i, o) in out.iter_mut().enumerate() {
        let byte = packed.get(i / per_byte).copied().unwrap_or(0);
        let shift = 8 - bits * (1 + (i % per_byte) as u32);
        let raw = (byte >> shift) & mask;
        *o = match scaling {
          SampleScaling::Raw => raw,
          SampleScaling::Scaled => u8_replicate_bits(bits, raw),
        };
      }
    }
    _ => panic!("illegal sub-byte sample depth: {bit_depth}"),
  }
}

/// How many bytes a row of `count` samples at `bit_depth` bits occupies.
#[inline]
#[must_use]
pub const fn packed_len(bit_depth: u8, count: usize) -> usize {
  (count * bit_depth as usize + 7) / 8
}

#[test]
fn test_unpack_samples_scaled_matches_formula() {
  for bit_depth in [1_u8, 2, 4] {
    let max = (1_u32 << bit_depth) - 1;
    // every value of this depth, packed in order
    let values: Vec<u8> = (0..=max as u8).collect();
    let mut packed = vec![0_u8; packed_len(bit_depth, values.len())];
    for (i, v) in values.iter().enumerate() {
      let bit = i * bit_depth as usize;
      packed[bit / 8] |= v << (8 - bit_depth as usize - (bit % 8));
    }
    let mut scaled = vec![0_u8; values.len()];
    unpack_samples(bit_depth, &packed, SampleScaling::Scaled, &mut scaled);
    let mut raw = vec![0_u8; values.len()];
    unpack_samples(bit_depth, &packed, SampleScaling::Raw, &mut raw);
    for (i, v) in values.iter().copied().enumerate() {
      assert_eq!(u32::from(scaled[i]), u32::from(v) * 255 / max, "depth {bit_depth}, value {v}");
      assert_eq!(raw[i], v);
    }
  }
}

#[test]
fn test_unpack_samples_msb_first() {
  let mut out = [0_u8; 8];
  unpack_samples(1, &[0b1000_0001], SampleScaling::Raw, &mut out);
  assert_eq!(out, [1, 0, 0, 0, 0, 0, 0, 1]);
  let mut out = [9_u8; 3];
  unpack_samples(4, &[0xA5], SampleScaling::Raw, &mut out);
  assert_eq!(out, [0xA, 0x5, 0]);
  let mut out = [0_u8; 2];
  unpack_samples(8, &[7, 8, 9], SampleScaling::Scaled, &mut out);
  assert_eq!(out, [7, 8]);
}
