//! Configuration values that are passed into decoders and pixel operations.
//!
//! Nothing here is global: every decoder and every filter or sampler owns
//! its own copy of the settings it uses.

use core::num::NonZeroUsize;

use crate::{ImagingError, ImagingResult};

/// The largest chunk a decoder will allocate for by default (1 MiB).
pub const DEFAULT_MAX_CHUNK_SIZE: u32 = 1024 * 1024;

/// Limits and switches used while decoding one image.
///
/// ```
/// use pixmill::DecodeOptions;
///
/// let options = DecodeOptions::default().with_max_width(4096).with_max_height(4096);
/// assert!(options.check_dimensions(4096, 100).is_ok());
/// assert!(options.check_dimensions(4097, 100).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  /// Widest image that will be decoded.
  pub max_width: u32,
  /// Tallest image that will be decoded.
  pub max_height: u32,
  /// Largest declared chunk length that will be read.
  pub max_chunk_size: u32,
  /// If the decoded pixels get their alpha multiplied into the color
  /// channels, which is the storage convention of [`PixelBuffer`](crate::PixelBuffer).
  ///
  /// With this off the buffer holds straight alpha. Filters and samplers
  /// expect premultiplied pixels, and such a buffer has to be encoded with
  /// `PngEncoder::with_premultiplied(false)`.
  pub premultiply: bool,
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    Self {
      max_width: u32::MAX,
      max_height: u32::MAX,
      max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
      premultiply: true,
    }
  }
}
impl DecodeOptions {
  /// Sets the maximum image width.
  #[inline]
  #[must_use]
  pub const fn with_max_width(mut self, max_width: u32) -> Self {
    self.max_width = max_width;
    self
  }

  /// Sets the maximum image height.
  #[inline]
  #[must_use]
  pub const fn with_max_height(mut self, max_height: u32) -> Self {
    self.max_height = max_height;
    self
  }

  /// Sets the maximum declared chunk length.
  #[inline]
  #[must_use]
  pub const fn with_max_chunk_size(mut self, max_chunk_size: u32) -> Self {
    self.max_chunk_size = max_chunk_size;
    self
  }

  /// Sets if decoded pixels are premultiplied.
  #[inline]
  #[must_use]
  pub const fn with_premultiply(mut self, premultiply: bool) -> Self {
    self.premultiply = premultiply;
    self
  }

  /// Checks declared dimensions against the limits.
  ///
  /// ## Failure
  /// * [`ImagingError::SizeLimit`] when either dimension is over its limit.
  #[inline]
  pub const fn check_dimensions(&self, width: u32, height: u32) -> ImagingResult<()> {
    if width > self.max_width || height > self.max_height {
      Err(ImagingError::SizeLimit {
        width,
        height,
        max_width: self.max_width,
        max_height: self.max_height,
      })
    } else {
      Ok(())
    }
  }
}

/// How many row partitions a pixel operation is split into.
///
/// The default is the width of the global rayon pool, which normally is the
/// number of logical CPUs. A value of 1 runs on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Parallelism(NonZeroUsize);
impl Parallelism {
  /// Run everything on the calling thread.
  pub const SINGLE: Self = Self(match NonZeroUsize::new(1) {
    Some(n) => n,
    None => unreachable!(),
  });

  /// Makes a new parallelism setting.
  ///
  /// ## Failure
  /// * [`ImagingError::Argument`] if `partitions` is 0.
  #[inline]
  pub fn new(partitions: usize) -> ImagingResult<Self> {
    NonZeroUsize::new(partitions)
      .map(Self)
      .ok_or(ImagingError::Argument("parallelism must be at least 1"))
  }

  /// The number of partitions.
  #[inline]
  #[must_use]
  pub const fn get(self) -> usize {
    self.0.get()
  }
}
impl Default for Parallelism {
  #[inline]
  fn default() -> Self {
    Self(NonZeroUsize::new(rayon::current_num_threads()).unwrap_or(NonZeroUsize::MIN))
  }
}

#[test]
fn test_parallelism_rejects_zero() {
  assert_eq!(Parallelism::new(0), Err(ImagingError::Argument("parallelism must be at least 1")));
  assert_eq!(Parallelism::new(3).map(Parallelism::get), Ok(3));
  assert_eq!(Parallelism::SINGLE.get(), 1);
  assert!(Parallelism::default().get() >= 1);
}

#[test]
fn test_decode_options_size_limit() {
  let options = DecodeOptions::default().with_max_width(10).with_max_height(20);
  assert_eq!(options.check_dimensions(10, 20), Ok(()));
  assert_eq!(
    options.check_dimensions(11, 1),
    Err(ImagingError::SizeLimit { width: 11, height: 1, max_width: 10, max_height: 20 })
  );
  assert_eq!(DecodeOptions::default().max_chunk_size, 1_048_576);
}
