//! Filters and resamplers for [`PixelBuffer`](crate::PixelBuffer) images.
//!
//! Everything here reads a source image and writes a freshly allocated
//! target. The work is split into bands of rows (see [`for_each_partition`])
//! which run on the rayon pool at the same time. The number of bands is a
//! [`Parallelism`](crate::Parallelism) value on each filter or sampler, and
//! the output never depends on it.
//!
//! * Filters implement [`ImageFilter`], usually through
//!   [`ParallelImageFilter`], and only change pixels inside a rectangle.
//! * Samplers implement [`ImageSampler`] and produce an image of a new size.

mod color;
mod filter;
mod matrix;
mod sampler;
mod tiling;

pub use color::*;
pub use filter::{apply_filters, apply_filters_in, ImageFilter, ParallelImageFilter};
pub use matrix::*;
pub use sampler::*;
pub use tiling::*;
