//! Owned pixel buffers and luminance conversion.

use crate::image::ImageView;
use crate::util::{MagsnapError, MagsnapResult};

/// Owned row-major pixel grid with 1 to 4 interleaved `u8` channels.
///
/// Channel layouts: 1 = luma, 2 = luma + alpha, 3 = RGB, 4 = RGBA. A buffer
/// always holds exactly `width * height * channels` samples; construction
/// rejects anything else, so a `PixelBuffer` that exists is valid input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl PixelBuffer {
    /// Wraps interleaved samples after validating the layout.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> MagsnapResult<Self> {
        if width == 0 || height == 0 {
            return Err(MagsnapError::InvalidDimensions { width, height });
        }
        if !(1..=4).contains(&channels) {
            return Err(MagsnapError::InvalidChannels { channels });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(MagsnapError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(MagsnapError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Single-channel luminance buffer.
    pub fn from_luma(data: Vec<u8>, width: usize, height: usize) -> MagsnapResult<Self> {
        Self::new(data, width, height, 1)
    }

    /// Four-channel RGBA buffer, the layout canvas readbacks produce.
    pub fn from_rgba(data: Vec<u8>, width: usize, height: usize) -> MagsnapResult<Self> {
        Self::new(data, width, height, 4)
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts to single-channel luminance.
    ///
    /// Colour input uses fixed-point BT.601 weights; alpha is ignored.
    pub fn to_luma(&self) -> LumaImage {
        let data = match self.channels {
            1 => self.data.clone(),
            2 => self.data.chunks_exact(2).map(|px| px[0]).collect(),
            _ => self
                .data
                .chunks_exact(self.channels)
                .map(|px| rgb_to_luma(px[0], px[1], px[2]))
                .collect(),
        };
        LumaImage {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

/// Owned contiguous single-channel image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LumaImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl LumaImage {
    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the contiguous samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

#[inline]
fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    // 14-bit fixed point: 0.299, 0.587, 0.114.
    let sum = 4899 * u32::from(r) + 9617 * u32::from(g) + 1868 * u32::from(b) + 8192;
    (sum >> 14) as u8
}
