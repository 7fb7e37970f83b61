//! Convenience helpers for decoding images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::PixelBuffer;
use crate::util::{MagsnapError, MagsnapResult};
use std::path::Path;

/// Creates a single-channel buffer from a grayscale image.
pub fn pixel_buffer_from_gray(img: &image::GrayImage) -> MagsnapResult<PixelBuffer> {
    PixelBuffer::from_luma(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Creates an RGBA buffer from any decoded image.
pub fn pixel_buffer_from_dynamic(img: &image::DynamicImage) -> MagsnapResult<PixelBuffer> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    PixelBuffer::from_rgba(rgba.into_raw(), width, height)
}

/// Loads an image from disk as an RGBA pixel buffer.
pub fn load_pixel_buffer<P: AsRef<Path>>(path: P) -> MagsnapResult<PixelBuffer> {
    let img = image::open(path).map_err(|err| MagsnapError::ImageIo {
        reason: err.to_string(),
    })?;
    pixel_buffer_from_dynamic(&img)
}
