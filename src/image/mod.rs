//! Borrowed image views over interleaved 8-bit pixel buffers.
//!
//! `ImageView` is a 2D view into a 1D buffer with an explicit stride and a
//! channel count. The stride counts bytes between the starts of consecutive
//! rows, so a stride larger than `width * channels` represents padded rows.
//! ROI slices are zero-copy views into the same backing slice and retain the
//! original stride.

use crate::util::{XqError, XqResult};

pub mod io;

/// Largest channel count the correlation kernels accept.
pub const MAX_CHANNELS: usize = 4;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a> ImageView<'a> {
    /// Creates a contiguous view with `stride == width * channels`.
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> XqResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(XqError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, channels, stride)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> XqResult<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(XqError::InvalidInput("channel count must be between 1 and 4"));
        }
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(XqError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
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

    /// Returns the number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the channel values of pixel `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        self.data.get(start..start + self.channels)
    }

    /// Returns row `y` as a slice of `width * channels` bytes.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> XqResult<ImageView<'a>> {
        if width == 0 || height == 0 {
            return Err(XqError::InvalidDimensions { width, height });
        }

        let out_of_bounds = XqError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y * self.stride + x * self.channels;
        let data = self.data.get(start..).ok_or(XqError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.channels, self.stride)
    }
}

fn required_len(width: usize, height: usize, channels: usize, stride: usize) -> XqResult<usize> {
    if width == 0 || height == 0 {
        return Err(XqError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(XqError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(XqError::InvalidStride { row_len, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(XqError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::ImageView;
    use crate::XqError;

    #[test]
    fn rejects_invalid_dimensions() {
        let data = [0u8; 4];
        let err = ImageView::from_slice(&data, 0, 1, 1).unwrap_err();
        assert_eq!(err, XqError::InvalidDimensions { width: 0, height: 1 });
    }

    #[test]
    fn rejects_short_stride() {
        let data = [0u8; 12];
        let err = ImageView::new(&data, 2, 2, 3, 5).unwrap_err();
        assert_eq!(err, XqError::InvalidStride { row_len: 6, stride: 5 });
    }

    #[test]
    fn rejects_small_buffer() {
        let data = [0u8; 11];
        let err = ImageView::from_slice(&data, 2, 2, 3).unwrap_err();
        assert_eq!(err, XqError::BufferTooSmall { needed: 12, got: 11 });
    }

    #[test]
    fn roi_keeps_stride_and_channels() {
        let data: Vec<u8> = (0u8..48).collect();
        let view = ImageView::from_slice(&data, 4, 4, 3).unwrap();
        let roi = view.roi(1, 2, 2, 2).unwrap();
        assert_eq!(roi.stride(), 12);
        assert_eq!(roi.channels(), 3);
        assert_eq!(roi.row(0).unwrap(), &[27, 28, 29, 30, 31, 32]);
        assert_eq!(roi.pixel(1, 1).unwrap(), &[42, 43, 44]);
        assert!(roi.pixel(2, 0).is_none());

        let err = view.roi(3, 3, 2, 2).unwrap_err();
        assert!(matches!(err, XqError::RoiOutOfBounds { .. }));
    }
}
