// THEORY:
// `Frame` is the hand-off type between the outside world (decoders, cameras, video
// readers) and the sieve. It is a flat, row-major 3-channel byte buffer that knows its
// own dimensions and channel order, nothing more. Decoders produce RGB while video
// readers produce BGR; recording the order on the frame lets the HSV conversion stay
// correct without an extra copy.

use crate::core_modules::hsv::HsvColor;
use image::{ImageBuffer, Rgb, RgbImage, imageops::FilterType};
use thiserror::Error;

/// Channel order of a 3-byte-per-pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Bgr8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        3
    }

    /// Reorders a raw pixel into (r, g, b).
    #[inline]
    fn rgb(&self, px: &[u8]) -> (u8, u8, u8) {
        match self {
            PixelFormat::Rgb8 => (px[0], px[1], px[2]),
            PixelFormat::Bgr8 => (px[2], px[1], px[0]),
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("buffer holds {actual} bytes but {width}x{height} needs {expected}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A decoded image or video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Frame {
    /// Validates the buffer length against the dimensions.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(FrameError::InvalidDimensions {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, format, data })
    }

    /// An all-black frame.
    pub fn black(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self { width, height, format, data: vec![0; len] }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: image.into_raw(),
        }
    }

    /// Copies the frame into an `RgbImage`, swapping channels if the frame is BGR.
    pub fn to_rgb_image(&self) -> RgbImage {
        let data = match self.format {
            PixelFormat::Rgb8 => self.data.clone(),
            PixelFormat::Bgr8 => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };
        // The length was validated at construction.
        ImageBuffer::from_raw(self.width, self.height, data).unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Same pixels with the given channel order.
    pub fn converted(&self, format: PixelFormat) -> Frame {
        if self.format == format {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        Frame {
            width: self.width,
            height: self.height,
            format,
            data,
        }
    }

    /// Pixel count of the classified plane, channel count excluded.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn same_shape(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Converts every pixel to HSV, row-major.
    pub fn to_hsv(&self) -> Vec<HsvColor> {
        self.data
            .chunks_exact(3)
            .map(|px| {
                let (r, g, b) = self.format.rgb(px);
                HsvColor::from_rgb(r, g, b)
            })
            .collect()
    }

    /// Bilinear resample, the same interpolation `cv2.resize` uses by default.
    /// Channel order is preserved.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.same_shape(width, height) {
            return self.clone();
        }
        // Resampling is channel-agnostic, so the raw bytes go through as if they were RGB.
        let raw: RgbImage = match ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, self.data.clone()) {
            Some(image) => image,
            None => return Frame::black(width, height, self.format),
        };
        let scaled = image::imageops::resize(&raw, width, height, FilterType::Triangle);
        Frame {
            width,
            height,
            format: self.format,
            data: scaled.into_raw(),
        }
    }

    /// Copies `src` into this frame with its top-left corner at (`x`, `y`), clipping at the edges.
    pub fn blit(&mut self, src: &Frame, x: u32, y: u32) {
        let stride = self.width as usize * 3;
        let src_stride = src.width as usize * 3;
        for row in 0..src.height {
            let dst_y = y + row;
            if dst_y >= self.height || x >= self.width {
                break;
            }
            let cols = src.width.min(self.width - x) as usize;
            let dst_start = dst_y as usize * stride + x as usize * 3;
            let src_start = row as usize * src_stride;
            let same_order = src.format == self.format;
            for col in 0..cols {
                let s = &src.data[src_start + col * 3..src_start + col * 3 + 3];
                let d = &mut self.data[dst_start + col * 3..dst_start + col * 3 + 3];
                if same_order {
                    d.copy_from_slice(s);
                } else {
                    d[0] = s[2];
                    d[1] = s[1];
                    d[2] = s[0];
                }
            }
        }
    }
}
