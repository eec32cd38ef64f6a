use std::io::{Read, Write};

use super::crc32::png_crc;
use crate::{AsciiArray, FormatError, ImagingResult};

/// The four byte tag of a chunk.
///
/// Each tag byte is an ascii letter, and the case of each letter carries a
/// flag. Only the first one (critical vs ancillary) matters when decoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl PngChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
}
impl PngChunkType {
  /// Critical chunks must be understood to show the image correctly.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0x20) == 0
  }
}
impl core::fmt::Debug for PngChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(&AsciiArray(self.0), f)
  }
}
impl From<PngChunkType> for AsciiArray<4> {
  #[inline]
  fn from(t: PngChunkType) -> Self {
    AsciiArray(t.0)
  }
}

/// A chunk pulled out of a stream, with its CRC already checked.
#[derive(Clone, PartialEq, Eq)]
pub struct PngChunk {
  pub type_: PngChunkType,
  pub data: Vec<u8>,
  pub crc: u32,
}
impl core::fmt::Debug for PngChunk {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("crc", &self.crc)
      .finish()
  }
}

/// Reads chunks one at a time from a stream that's already past the file
/// signature.
///
/// The sequence ends at a clean end of stream on a chunk boundary. Any chunk
/// after the `IEND` chunk is an error.
#[derive(Debug)]
pub struct PngChunkReader<R> {
  reader: R,
  max_chunk_size: u32,
  seen_end: bool,
}
impl<R: Read> PngChunkReader<R> {
  /// Wraps a stream. Chunks declaring more than `max_chunk_size` bytes are
  /// rejected.
  #[inline]
  pub const fn new(reader: R, max_chunk_size: u32) -> Self {
    Self { reader, max_chunk_size, seen_end: false }
  }

  /// If the `IEND` chunk has been read.
  #[inline]
  #[must_use]
  pub const fn seen_end(&self) -> bool {
    self.seen_end
  }

  /// Reads the next chunk, or `None` at the end of the stream.
  ///
  /// ## Failure
  /// * [`FormatError::Truncated`] if the stream stops inside a chunk.
  /// * [`FormatError::ChunkTooLarge`] before reading the data of an oversized
  ///   chunk.
  /// * [`FormatError::CrcMismatch`] when the data doesn't match its CRC.
  /// * [`FormatError::ChunkAfterEnd`] for anything after `IEND`.
  pub fn next_chunk(&mut self) -> ImagingResult<Option<PngChunk>> {
    let mut length_bytes = [0_u8; 4];
    match read_fully(&mut self.reader, &mut length_bytes)? {
      0 => return Ok(None),
      4 => (),
      _ => return Err(FormatError::Truncated.into()),
    }
    if self.seen_end {
      return Err(FormatError::ChunkAfterEnd.into());
    }
    let declared = u32::from_be_bytes(length_bytes);
    let mut type_bytes = [0_u8; 4];
    self.reader.read_exact(&mut type_bytes)?;
    let type_ = PngChunkType(type_bytes);
    if declared > self.max_chunk_size {
      return Err(FormatError::ChunkTooLarge { declared, max: self.max_chunk_size }.into());
    }
    let mut data = Vec::with_capacity(declared as usize);
    (&mut self.reader).take(u64::from(declared)).read_to_end(&mut data)?;
    if data.len() != declared as usize {
      return Err(FormatError::Truncated.into());
    }
    let mut crc_bytes = [0_u8; 4];
    self.reader.read_exact(&mut crc_bytes)?;
    let crc = u32::from_be_bytes(crc_bytes);
    let actual = png_crc(type_.0, &data);
    if actual != crc {
      return Err(FormatError::CrcMismatch { chunk: type_.into(), declared: crc, actual }.into());
    }
    log::trace!("read chunk {type_:?} of {declared} bytes");
    if type_ == PngChunkType::IEND {
      self.seen_end = true;
    }
    Ok(Some(PngChunk { type_, data, crc }))
  }
}

/// Reads until `buf` is full or the stream ends, giving the count read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
  let mut filled = 0;
  while filled < buf.len() {
    match reader.read(&mut buf[filled..]) {
      Ok(0) => break,
      Ok(n) => filled += n,
      Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  Ok(filled)
}

/// Writes one chunk: length, type, data, then the CRC of type and data.
///
/// ## Failure
/// * [`ImagingError::Argument`](crate::ImagingError::Argument) if the data is
///   longer than a chunk can declare.
pub fn write_chunk(writer: &mut dyn Write, type_: PngChunkType, data: &[u8]) -> ImagingResult<()> {
  let len = u32::try_from(data.len())?;
  writer.write_all(&len.to_be_bytes())?;
  writer.write_all(&type_.0)?;
  writer.write_all(data)?;
  writer.write_all(&png_crc(type_.0, data).to_be_bytes())?;
  Ok(())
}
