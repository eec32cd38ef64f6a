use pixmill::{
  png::{decode_png, is_png_header_correct, PngChunkReader, PngEncoder},
  Codecs, PixelBuffer, DEFAULT_MAX_CHUNK_SIZE, RGBA8,
};
use walkdir::WalkDir;

#[test]
fn test_PngChunkReader_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    let mut reader = PngChunkReader::new(v.as_slice(), DEFAULT_MAX_CHUNK_SIZE);
    while let Ok(Some(_)) = reader.next_chunk() {
      //
    }
    let _ = decode_png(&v);
  }
  // even totally random data should never panic the reader!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    let mut reader = PngChunkReader::new(v.as_slice(), DEFAULT_MAX_CHUNK_SIZE);
    while let Ok(Some(_)) = reader.next_chunk() {
      //
    }
  }
}

#[test]
fn test_decode_png_random_tails_no_panics() {
  // a valid signature followed by garbage has to fail cleanly
  for _ in 0..10 {
    let mut v = vec![137, 80, 78, 71, 13, 10, 26, 10];
    v.extend(super::rand_bytes(512));
    assert!(decode_png(&v).is_err());
  }
}

fn sample_image() -> PixelBuffer {
  let mut image = PixelBuffer::new(7, 5);
  for y in 0..5 {
    for x in 0..7 {
      let color = RGBA8 { r: (x * 30) as u8, g: (y * 50) as u8, b: 200, a: 255 };
      image.set_pixel(x, y, color);
    }
  }
  image.set_pixel(3, 2, RGBA8::TRANSPARENT);
  image
}

#[test]
fn test_Codecs_round_trip() {
  let codecs = Codecs::default();
  let image = sample_image();
  let mut bytes = Vec::new();
  codecs.save(&image, ".PNG", &mut bytes).unwrap();
  assert!(is_png_header_correct(&bytes));
  let back = codecs.load(&mut bytes.as_slice()).unwrap();
  assert_eq!(back, image);
  assert_eq!(codecs.load_bytes(&bytes).unwrap(), image);
  assert!(codecs.save(&image, "bmp", &mut Vec::new()).is_err());
  assert!(codecs.load_bytes(b"GIF89a not really").is_err());
}

#[test]
fn test_PngEncoder_compression_levels_decode_the_same() {
  let image = sample_image();
  for level in [0, 1, 6, 10] {
    let bytes = PngEncoder::default().with_compression_level(level).encode_to_vec(&image).unwrap();
    assert_eq!(decode_png(&bytes).unwrap(), image, "level {level}");
  }
}
