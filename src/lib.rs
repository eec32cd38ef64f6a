#![forbid(unsafe_code)]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_debug_implementations)]

//! A crate for decoding, processing, and re-encoding raster images.
//!
//! * Decoding and encoding go through the [`ImageDecoder`] and
//!   [`ImageEncoder`] traits, and a [`Codecs`] registry picks the right one
//!   for a stream. PNG support is in the [`png`] module (enabled by default
//!   with the `png` feature).
//! * Every decoded image is a [`PixelBuffer`] of premultiplied [`RGBA8`]
//!   pixels.
//! * The [`filtering`] module has color and convolution filters and
//!   resamplers, which run in parallel over bands of rows.
//! * The [`transform`] module has crop, rotate, and flip.
//!
//! Decoders are limited by [`DecodeOptions`], so hostile input can't make
//! them allocate without bound.

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod error;
pub use error::*;

pub mod config;
pub use config::*;

pub mod pixel_formats;
pub use pixel_formats::*;

pub mod ascii_array;
pub use ascii_array::*;

#[cfg(feature = "png")]
pub mod bit_depth_changes;
#[cfg(feature = "png")]
pub use bit_depth_changes::*;

pub mod image;
pub use image::*;

pub mod codec;
pub use codec::*;

pub mod transform;

pub mod filtering;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;
