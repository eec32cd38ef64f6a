use super::*;
use crate::{DecodeOptions, FormatError, ImagingError, PixelBuffer, RGBA8};

/// Wraps bytes in a zlib stream made of stored (uncompressed) blocks.
fn zlib_stored(data: &[u8]) -> Vec<u8> {
  let mut out = vec![0x78, 0x01];
  let mut blocks = data.chunks(65535).peekable();
  if blocks.peek().is_none() {
    out.extend_from_slice(&[1, 0, 0, 0xFF, 0xFF]);
  }
  while let Some(block) = blocks.next() {
    out.push(u8::from(blocks.peek().is_none()));
    let len = block.len() as u16;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(block);
  }
  let (mut a, mut b) = (1_u32, 0_u32);
  for byte in data {
    a = (a + u32::from(*byte)) % 65521;
    b = (b + a) % 65521;
  }
  out.extend_from_slice(&((b << 16) | a).to_be_bytes());
  out
}

fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
  let mut data = Vec::new();
  data.extend_from_slice(&width.to_be_bytes());
  data.extend_from_slice(&height.to_be_bytes());
  data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
  data
}

/// Builds a stream: signature, chunks, then `IEND` from [`PngBuilder::end`].
struct PngBuilder(Vec<u8>);
impl PngBuilder {
  fn new() -> Self {
    Self(PNG_SIGNATURE.to_vec())
  }
  fn chunk(mut self, type_: PngChunkType, data: &[u8]) -> Self {
    write_chunk(&mut self.0, type_, data).unwrap();
    self
  }
  fn end(self) -> Vec<u8> {
    self.chunk(PngChunkType::IEND, &[]).0
  }
}

fn simple_png(header: &[u8], raw: &[u8]) -> Vec<u8> {
  PngBuilder::new().chunk(PngChunkType::IHDR, header).chunk(PngChunkType::IDAT, &zlib_stored(raw)).end()
}

fn format_err(e: FormatError) -> ImagingError {
  ImagingError::Format(e)
}

#[test]
fn test_decode_2x2_rgba() {
  #[rustfmt::skip]
  let raw = [
    0, 255, 0, 0, 255,    0, 255, 0, 255,
    0, 0, 0, 255, 255,    255, 255, 255, 255,
  ];
  let image = decode_png(&simple_png(&ihdr(2, 2, 8, 6), &raw)).unwrap();
  assert_eq!((image.width(), image.height()), (2, 2));
  assert_eq!(image.pixels(), &[255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255]);
}

#[test]
fn test_decode_premultiplies_unless_disabled() {
  let raw = [0, 200, 100, 50, 128];
  let png = simple_png(&ihdr(1, 1, 8, 6), &raw);
  let image = decode_png(&png).unwrap();
  assert_eq!(image.pixel(0, 0), Some(RGBA8 { r: 200, g: 100, b: 50, a: 128 }.premultiplied()));
  let straight =
    PngDecoder::with_options(DecodeOptions::default().with_premultiply(false)).decode_stream(&png[..]).unwrap();
  assert_eq!(straight.pixels(), &[200, 100, 50, 128]);
}

#[test]
fn test_decode_split_idat() {
  let raw = [0, 1, 2, 3, 4, 0, 5, 6, 7, 8];
  let z = zlib_stored(&raw);
  let (z0, z1) = z.split_at(5);
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &ihdr(1, 2, 8, 6))
    .chunk(PngChunkType::IDAT, z0)
    .chunk(PngChunkType::IDAT, z1)
    .end();
  let image = PngDecoder::with_options(DecodeOptions::default().with_premultiply(false))
    .decode_stream(&png[..])
    .unwrap();
  assert_eq!(image.pixels(), &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_oversized_chunk_rejected_before_data() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend_from_slice(&2_000_000_u32.to_be_bytes());
  png.extend_from_slice(b"IHDR");
  // no data at all follows, so reading any would be `Truncated`
  assert_eq!(decode_png(&png), Err(format_err(FormatError::ChunkTooLarge { declared: 2_000_000, max: 1_048_576 })));
}

#[test]
fn test_crc_bit_flip_rejected() {
  let mut png = simple_png(&ihdr(1, 1, 8, 6), &[0, 1, 2, 3, 4]);
  // first data byte of the IHDR chunk
  png[8 + 8] ^= 0b0000_0100;
  assert!(matches!(decode_png(&png), Err(ImagingError::Format(FormatError::CrcMismatch { .. }))));
}

#[test]
fn test_bad_signature_and_truncation() {
  let mut png = simple_png(&ihdr(1, 1, 8, 6), &[0, 1, 2, 3, 4]);
  png[0] = 0;
  assert_eq!(decode_png(&png), Err(format_err(FormatError::BadSignature)));
  let png = simple_png(&ihdr(1, 1, 8, 6), &[0, 1, 2, 3, 4]);
  assert_eq!(decode_png(&png[..png.len() - 14]), Err(format_err(FormatError::Truncated)));
  assert_eq!(decode_png(&png[..4]), Err(format_err(FormatError::Truncated)));
}

#[test]
fn test_header_validation() {
  let raw = [0, 0];
  assert_eq!(
    decode_png(&simple_png(&ihdr(1, 1, 4, 2), &raw)),
    Err(format_err(FormatError::IllegalBitDepth { color_type: 2, bit_depth: 4 }))
  );
  assert_eq!(decode_png(&simple_png(&ihdr(1, 1, 8, 5), &raw)), Err(format_err(FormatError::IllegalColorType(5))));
  assert_eq!(decode_png(&simple_png(&ihdr(0, 1, 8, 0), &raw)), Err(format_err(FormatError::ZeroDimension)));
  let mut interlaced = ihdr(1, 1, 8, 0);
  interlaced[12] = 1;
  assert_eq!(decode_png(&simple_png(&interlaced, &raw)), Err(format_err(FormatError::InterlaceNotSupported)));
  let mut filter = ihdr(1, 1, 8, 0);
  filter[11] = 1;
  assert_eq!(decode_png(&simple_png(&filter, &raw)), Err(format_err(FormatError::IllegalFilterMethod(1))));
  let no_header = PngBuilder::new().chunk(PngChunkType::IDAT, &zlib_stored(&raw)).end();
  assert_eq!(decode_png(&no_header), Err(format_err(FormatError::MissingHeader)));
}

#[test]
fn test_every_legal_depth_is_accepted() {
  let table: [(u8, &[u8]); 5] =
    [(0, &[1, 2, 4, 8, 16]), (2, &[8, 16]), (3, &[1, 2, 4, 8]), (4, &[8, 16]), (6, &[8, 16])];
  for (color_type, depths) in table {
    for bit_depth in 1..=16_u8 {
      let result = PngHeader::parse(&ihdr(3, 3, bit_depth, color_type));
      assert_eq!(result.is_ok(), depths.contains(&bit_depth), "color type {color_type}, depth {bit_depth}");
    }
  }
}

#[test]
fn test_size_limit_checked_before_allocation() {
  // declares a huge image with no image data at all
  let png = PngBuilder::new().chunk(PngChunkType::IHDR, &ihdr(100_000, 100_000, 8, 6)).end();
  let decoder = PngDecoder::with_options(DecodeOptions::default().with_max_width(4096).with_max_height(4096));
  assert_eq!(
    decoder.decode_stream(&png[..]),
    Err(ImagingError::SizeLimit { width: 100_000, height: 100_000, max_width: 4096, max_height: 4096 })
  );
}

#[test]
fn test_grayscale_sub_byte_scaled() {
  // 1-bit: 1 0 1 1, then 2-bit: 0 1 2 3
  let image = decode_png(&simple_png(&ihdr(4, 1, 1, 0), &[0, 0b1011_0000])).unwrap();
  let reds: Vec<u8> = image.as_rgba8().iter().map(|p| p.r).collect();
  assert_eq!(reds, [255, 0, 255, 255]);
  let image = decode_png(&simple_png(&ihdr(4, 1, 2, 0), &[0, 0b0001_1011])).unwrap();
  let reds: Vec<u8> = image.as_rgba8().iter().map(|p| p.r).collect();
  assert_eq!(reds, [0, 85, 170, 255]);
}

#[test]
fn test_grayscale_transparency_key() {
  let header = ihdr(2, 1, 2, 0);
  let z = zlib_stored(&[0, 0b1001_0000]);
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &header)
    .chunk(PngChunkType::tRNS, &[0, 1])
    .chunk(PngChunkType::IDAT, &z)
    .end();
  let image = decode_png(&png).unwrap();
  assert_eq!(image.as_rgba8(), &[RGBA8 { r: 170, g: 170, b: 170, a: 255 }, RGBA8::TRANSPARENT]);
}

#[test]
fn test_truecolor_16_bit_keeps_high_byte() {
  let raw = [0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  let image = decode_png(&simple_png(&ihdr(1, 1, 16, 2), &raw)).unwrap();
  assert_eq!(image.pixels(), &[0x12, 0x56, 0x9A, 255]);
  let key = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &ihdr(1, 1, 16, 2))
    .chunk(PngChunkType::tRNS, &key)
    .chunk(PngChunkType::IDAT, &zlib_stored(&raw))
    .end();
  assert_eq!(decode_png(&png).unwrap().pixels(), &[0, 0, 0, 0]);
}

#[test]
fn test_palette_with_alpha() {
  let plte = [255, 0, 0, 0, 255, 0, 0, 0, 255];
  let trns = [0, 128];
  // 2-bit indexes 0 1 2
  let raw = [0, 0b0001_1000];
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &ihdr(3, 1, 2, 3))
    .chunk(PngChunkType::PLTE, &plte)
    .chunk(PngChunkType::tRNS, &trns)
    .chunk(PngChunkType::IDAT, &zlib_stored(&raw))
    .end();
  let image = PngDecoder::with_options(DecodeOptions::default().with_premultiply(false))
    .decode_stream(&png[..])
    .unwrap();
  assert_eq!(image.pixels(), &[255, 0, 0, 0, 0, 255, 0, 128, 0, 0, 255, 255]);
}

#[test]
fn test_palette_errors() {
  let header = ihdr(1, 1, 8, 3);
  let z = zlib_stored(&[0, 2]);
  let missing = PngBuilder::new().chunk(PngChunkType::IHDR, &header).chunk(PngChunkType::IDAT, &z).end();
  assert_eq!(decode_png(&missing), Err(format_err(FormatError::MissingPalette)));
  let short = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &header)
    .chunk(PngChunkType::PLTE, &[1, 2, 3, 4, 5, 6])
    .chunk(PngChunkType::IDAT, &z)
    .end();
  assert_eq!(decode_png(&short), Err(format_err(FormatError::PaletteIndexOutOfRange { index: 2, len: 2 })));
  let malformed = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &header)
    .chunk(PngChunkType::PLTE, &[1, 2])
    .chunk(PngChunkType::IDAT, &z)
    .end();
  assert_eq!(decode_png(&malformed), Err(format_err(FormatError::MalformedPalette)));
}

#[test]
fn test_chunk_after_end_rejected() {
  let mut png = simple_png(&ihdr(1, 1, 8, 0), &[0, 9]);
  write_chunk(&mut png, PngChunkType::IDAT, &[]).unwrap();
  assert_eq!(decode_png(&png), Err(format_err(FormatError::ChunkAfterEnd)));
}

#[test]
fn test_missing_end_tolerated() {
  let png = simple_png(&ihdr(1, 1, 8, 0), &[0, 9]);
  let without_end = &png[..png.len() - 12];
  assert_eq!(decode_png(without_end).unwrap().pixels(), &[9, 9, 9, 255]);
}

#[test]
fn test_incomplete_and_corrupt_image_data() {
  // one row short
  let png = simple_png(&ihdr(1, 2, 8, 0), &[0, 9]);
  assert_eq!(decode_png(&png), Err(format_err(FormatError::IncompleteImageData)));
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &ihdr(1, 1, 8, 0))
    .chunk(PngChunkType::IDAT, &[0xFF, 0xFF, 0xFF])
    .end();
  assert_eq!(decode_png(&png), Err(format_err(FormatError::Decompression)));
  let png = simple_png(&ihdr(1, 1, 8, 0), &[7, 9]);
  assert_eq!(decode_png(&png), Err(format_err(FormatError::IllegalFilterType(7))));
}

#[test]
fn test_round_trip_with_each_strategy() {
  let pixels: Vec<u8> = (0..13_u32 * 7).flat_map(|i| [(i * 3) as u8, (i * 7) as u8, (i * 11) as u8, 255]).collect();
  let image = PixelBuffer::from_pixels(13, 7, pixels).unwrap();
  for strategy in [FilterStrategy::Naive, FilterStrategy::Adaptive] {
    let encoded = PngEncoder::default().with_filter_strategy(strategy).encode_to_vec(&image).unwrap();
    assert_eq!(decode_png(&encoded).unwrap(), image);
  }
}

#[test]
fn test_transparent_pixels_encode_as_zero() {
  let image = PixelBuffer::from_pixels(2, 1, vec![0, 0, 0, 0, 64, 32, 16, 128]).unwrap();
  let encoded = PngEncoder::default().encode_to_vec(&image).unwrap();
  let straight = PngDecoder::with_options(DecodeOptions::default().with_premultiply(false))
    .decode_stream(&encoded[..])
    .unwrap();
  assert_eq!(&straight.pixels()[..4], &[0, 0, 0, 0]);
  assert_eq!(decode_png(&encoded).unwrap(), image);
}

#[test]
fn test_large_output_splits_idat() {
  let mut noise = vec![0_u8; 300 * 300 * 4];
  let mut x = 0x1234_5678_u32;
  for b in noise.iter_mut() {
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *b = x as u8;
  }
  noise.chunks_exact_mut(4).for_each(|p| p[3] = 255);
  let image = PixelBuffer::from_pixels(300, 300, noise).unwrap();
  let encoded = PngEncoder::default().with_compression_level(0).encode_to_vec(&image).unwrap();
  let mut reader = PngChunkReader::new(&encoded[8..], u32::MAX);
  let mut idat_lens = Vec::new();
  while let Some(chunk) = reader.next_chunk().unwrap() {
    if chunk.type_ == PngChunkType::IDAT {
      idat_lens.push(chunk.data.len());
    }
  }
  assert!(idat_lens.len() > 1);
  assert!(idat_lens.iter().all(|len| *len <= MAX_IDAT_LEN));
  assert_eq!(decode_png(&encoded).unwrap(), image);
}

#[test]
fn test_straight_alpha_round_trip() {
  let image = PixelBuffer::from_pixels(2, 1, vec![200, 100, 50, 128, 9, 8, 7, 0]).unwrap();
  let encoded = PngEncoder::default().with_premultiplied(false).encode_to_vec(&image).unwrap();
  let straight = PngDecoder::with_options(DecodeOptions::default().with_premultiply(false));
  let back = straight.decode_stream(&encoded[..]).unwrap();
  assert_eq!(back, image);
  let again = PngEncoder::default().with_premultiplied(false).encode_to_vec(&back).unwrap();
  assert_eq!(straight.decode_stream(&again[..]).unwrap(), image);
  assert_eq!(decode_png(&encoded).unwrap().pixel(0, 0), Some(RGBA8 { r: 200, g: 100, b: 50, a: 128 }.premultiplied()));
}

#[test]
fn test_endless_image_data_rejected() {
  let filler = vec![0_u8; 600];
  let png = PngBuilder::new()
    .chunk(PngChunkType::IHDR, &ihdr(1, 1, 8, 0))
    .chunk(PngChunkType::IDAT, &zlib_stored(&[0, 9]))
    .chunk(PngChunkType::IDAT, &filler)
    .chunk(PngChunkType::IDAT, &filler)
    .chunk(PngChunkType::IDAT, &filler)
    .end();
  assert_eq!(decode_png(&png), Err(format_err(FormatError::ImageDataTooLarge { len: 1213, max: 1026 })));
  // a big stored (uncompressed) stream is still under the bound
  let raw: Vec<u8> = (0..200).flat_map(|y| core::iter::once(0).chain((0..200).map(move |x| (x ^ y) as u8))).collect();
  let image = decode_png(&simple_png(&ihdr(200, 200, 8, 0), &raw)).unwrap();
  assert_eq!(image.pixel(3, 5), Some(RGBA8 { r: 6, g: 6, b: 6, a: 255 }));
}
