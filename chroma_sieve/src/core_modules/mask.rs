//! Boolean pixel grids and the set algebra the compositor needs.

use crate::frame::{Frame, PixelFormat};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("mask shapes differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
pub struct MaskShapeError {
    pub left_width: u32,
    pub left_height: u32,
    pub right_width: u32,
    pub right_height: u32,
}

/// A 2D boolean grid, row-major. `true` means "inside the associated band(s)".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// All-false mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Builds a mask by evaluating `f` over a row-major sequence of cells.
    pub fn from_cells<T, F>(width: u32, height: u32, cells: &[T], mut f: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let mut bits: Vec<bool> = cells.iter().map(&mut f).collect();
        bits.resize(width as usize * height as usize, false);
        Self { width, height, bits }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.bits.get((y * self.width + x) as usize).copied()
    }

    pub fn count_true(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    fn check_shape(&self, other: &Mask) -> Result<(), MaskShapeError> {
        if self.width == other.width && self.height == other.height {
            Ok(())
        } else {
            Err(MaskShapeError {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            })
        }
    }

    /// In-place logical OR.
    pub fn union_with(&mut self, other: &Mask) -> Result<(), MaskShapeError> {
        self.check_shape(other)?;
        for (dst, &src) in self.bits.iter_mut().zip(other.bits.iter()) {
            *dst |= src;
        }
        Ok(())
    }

    /// `self AND NOT other`.
    pub fn minus(&self, other: &Mask) -> Result<Mask, MaskShapeError> {
        self.check_shape(other)?;
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(&a, &b)| a && !b)
            .collect();
        Ok(Mask {
            width: self.width,
            height: self.height,
            bits,
        })
    }

    /// True when every set cell of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Mask) -> bool {
        self.check_shape(other).is_ok() && self.bits.iter().zip(other.bits.iter()).all(|(&a, &b)| !a || b)
    }

    /// Nearest-neighbor resample: destination cell (x, y) reads source cell
    /// (`x * src_w / dst_w`, `y * src_h / dst_h`), using integer floor division.
    pub fn resized_nearest(&self, width: u32, height: u32) -> Mask {
        if self.width == width && self.height == height {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return Mask::empty(width, height);
        }
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                bits.push(self.bits[(sy * self.width + sx) as usize]);
            }
        }
        Mask { width, height, bits }
    }

    /// Grayscale rendering: set cells are white, the rest black.
    pub fn to_frame(&self, format: PixelFormat) -> Frame {
        let data = self
            .bits
            .iter()
            .flat_map(|&b| if b { [255u8; 3] } else { [0u8; 3] })
            .collect();
        Frame {
            width: self.width,
            height: self.height,
            format,
            data,
        }
    }
}
