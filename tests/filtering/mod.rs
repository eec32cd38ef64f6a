use pixmill::{filtering::*, Parallelism, PixelBuffer, Rectangle, RGBA8};

fn random_image(width: u32, height: u32) -> PixelBuffer {
  let mut pixels = super::rand_bytes((width * height * 4) as usize);
  // keep the data valid premultiplied pixels
  for px in pixels.chunks_exact_mut(4) {
    let a = px[3];
    for c in &mut px[..3] {
      *c = (*c).min(a);
    }
  }
  PixelBuffer::from_pixels(width, height, pixels).unwrap()
}

fn each_parallelism() -> impl Iterator<Item = Parallelism> {
  [1, 2, 4, 8].into_iter().map(|n| Parallelism::new(n).unwrap())
}

#[test]
fn test_filters_are_the_same_at_any_parallelism() {
  let image = random_image(13, 11);
  let overlay = random_image(9, 9);
  let rects = [image.bounds(), Rectangle::new(2, 3, 7, 5), Rectangle::new(10, 0, 10, 20)];
  for rect in rects {
    let mut expected: Vec<PixelBuffer> = Vec::new();
    for (i, parallelism) in each_parallelism().enumerate() {
      let filters: Vec<Box<dyn ImageFilter>> = vec![
        Box::new(Brightness::new(40).unwrap().with_parallelism(parallelism)),
        Box::new(Contrast::new(-30).unwrap().with_parallelism(parallelism)),
        Box::new(Tint { color: RGBA8::rgb(200, 150, 50), parallelism }),
        Box::new(Grayscale { coefficients: Grayscale::BT709, parallelism }),
        Box::new(Inverter::default().with_parallelism(parallelism)),
        Box::new(Sepia::default().with_parallelism(parallelism)),
        Box::new(Blend { overlay: overlay.clone(), alpha: Some(0.25), parallelism }),
        Box::new(CropCircle { radius: None, parallelism }),
        Box::new(GaussianBlur::new(1.5).with_parallelism(parallelism)),
        Box::new(SobelX { parallelism }),
        Box::new(SobelY { parallelism }),
        Box::new(Sobel::default().with_parallelism(parallelism)),
        Box::new(Prewitt::default().with_parallelism(parallelism)),
      ];
      for (f, filter) in filters.iter().enumerate() {
        let out = filter.apply(&image, rect).unwrap();
        if i == 0 {
          expected.push(out);
        } else {
          assert_eq!(out, expected[f], "filter {f}, {parallelism:?}, {rect:?}");
        }
      }
    }
  }
}

#[test]
fn test_samplers_are_the_same_at_any_parallelism() {
  let image = random_image(17, 9);
  let sizes = [(5, 3), (17, 9), (40, 23), (3, 30)];
  for (width, height) in sizes {
    let mut expected: Vec<PixelBuffer> = Vec::new();
    for (i, parallelism) in each_parallelism().enumerate() {
      let samplers: [&dyn ImageSampler; 4] = [
        &NearestNeighborSampler { parallelism },
        &BilinearSampler { alpha_aware: false, parallelism },
        &BilinearSampler { alpha_aware: true, parallelism },
        &SuperSamplingSampler::default().with_parallelism(parallelism),
      ];
      for (s, sampler) in samplers.iter().enumerate() {
        let out = sampler.sample(&image, width, height).unwrap();
        assert_eq!((out.width(), out.height()), (width, height));
        if i == 0 {
          expected.push(out);
        } else {
          assert_eq!(out, expected[s], "sampler {s}, {parallelism:?}, {width}x{height}");
        }
      }
    }
  }
}

#[test]
fn test_outputs_stay_premultiplied() {
  let image = random_image(12, 12);
  let filters: [&dyn ImageFilter; 4] =
    [&Sobel::default(), &GaussianBlur::new(1.0), &Contrast::new(80).unwrap(), &CropCircle::default()];
  for filter in filters {
    let out = filter.apply(&image, image.bounds()).unwrap();
    assert!(out.as_rgba8().iter().all(|p| p.r <= p.a && p.g <= p.a && p.b <= p.a));
  }
  let samplers: [&dyn ImageSampler; 2] = [&SuperSamplingSampler::default(), &BilinearSampler::alpha_aware()];
  for sampler in samplers {
    let out = sampler.sample(&image, 5, 7).unwrap();
    assert!(out.as_rgba8().iter().all(|p| p.r <= p.a && p.g <= p.a && p.b <= p.a));
  }
}

#[test]
fn test_apply_filters_chains_in_order() {
  let image = PixelBuffer::filled(4, 4, RGBA8::rgb(10, 20, 30)).unwrap();
  let up = Brightness::new(100).unwrap();
  let invert = Inverter::default();
  let out = apply_filters(&image, &[&up, &invert]).unwrap();
  assert_eq!(out.pixel(2, 2), Some(RGBA8::rgb(145, 135, 125)));
  let out = apply_filters(&image, &[&invert, &up]).unwrap();
  assert_eq!(out.pixel(2, 2), Some(RGBA8::rgb(255, 255, 255)));
  let corner = apply_filters_in(&image, Rectangle::new(0, 0, 1, 1), &[&invert]).unwrap();
  assert_eq!(corner.pixel(0, 0), Some(RGBA8::rgb(245, 235, 225)));
  assert_eq!(corner.pixel(1, 1), Some(RGBA8::rgb(10, 20, 30)));
}
