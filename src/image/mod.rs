//! Pixel buffers and borrowed grayscale views.
//!
//! `PixelBuffer` is the owned, possibly multi-channel input handed over by the
//! image-acquisition collaborator. Detectors work on single-channel luminance,
//! exposed as an `ImageView` with an explicit stride: the number of elements
//! between the starts of consecutive rows, which may exceed the width when
//! rows are padded.

use crate::util::{MagsnapError, MagsnapResult};

mod buffer;
#[cfg(feature = "image-io")]
pub mod io;

pub use buffer::{LumaImage, PixelBuffer};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> MagsnapResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> MagsnapResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(MagsnapError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

impl<T: Copy> ImageView<'_, T> {
    /// Returns the element at `(x, y)` with coordinates clamped to the image,
    /// i.e. replicated borders.
    #[inline]
    pub(crate) fn at_clamped(&self, x: isize, y: isize) -> T {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cy * self.stride + cx]
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> MagsnapResult<usize> {
    if width == 0 || height == 0 {
        return Err(MagsnapError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(MagsnapError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(MagsnapError::InvalidDimensions { width, height })
}
