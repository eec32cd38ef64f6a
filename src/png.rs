//! Module for working with PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## Decoding
//!
//! [`PngDecoder`] reads a stream front to back:
//!
//! 1) The 8 byte signature is checked.
//! 2) [`PngChunkReader`] pulls out one chunk at a time, checking each chunk's
//!    declared length against [`DecodeOptions::max_chunk_size`] *before*
//!    reading the data, and each chunk's CRC after.
//! 3) The `IHDR` is validated (color type, bit depth, and the three method
//!    bytes) and the dimensions are checked against the limits before any
//!    image sized buffer is allocated.
//! 4) All `IDAT` data is joined and inflated into a buffer of exactly
//!    `(stride + 1) * height` bytes.
//! 5) [`ScanlineDefilterer`] undoes the per-row filter, and [`ColorReader`]
//!    turns each row into RGBA8.
//! 6) Alpha is premultiplied (see [`DecodeOptions::premultiply`]).
//!
//! Any error stops the decode and no image is returned.
//!
//! ## Parsing Errors
//!
//! Quoting [section 13.2 of the PNG
//! spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors):
//!
//! > Errors that have little or no effect on the processing of the image may be
//! > ignored, while those that affect critical data shall be dealt with in a
//! > manner appropriate to the application.
//!
//! Things that are only logged and otherwise ignored:
//!
//! * A missing `IEND` at the end of the stream.
//! * Extra zlib data after the image's last row.
//! * Ancillary chunks other than `tRNS`, unknown critical chunks, and a `tRNS`
//!   of the wrong size for its color type.
//! * The Adler-32 of the zlib stream.
//!
//! Interlaced images are rejected.
//!
//! ## Encoding
//!
//! [`PngEncoder`] always writes 8-bit RGBA, non-interlaced.
//!
//! [`DecodeOptions::max_chunk_size`]: crate::DecodeOptions::max_chunk_size
//! [`DecodeOptions::premultiply`]: crate::DecodeOptions::premultiply

mod chunk;
mod color_reader;
mod crc32;
mod decoder;
mod encoder;
mod header;
mod unfilter;

pub use chunk::*;
pub use color_reader::*;
pub use crc32::*;
pub use decoder::*;
pub use encoder::*;
pub use header::*;
pub use unfilter::*;

#[cfg(test)]
mod tests;

/// The first eight bytes of every PNG stream.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG signature is correct.
///
/// PNG data should begin with the bytes `[137, 80, 78, 71, 13, 10, 26, 10]`.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}
