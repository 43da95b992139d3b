// THEORY:
// The compositor turns one frame into the three masks the rest of the system reasons
// about, plus the masked picture an operator actually looks at:
//
//   desired          = pixels inside the configured band
//   undesired_total  = OR over every undesired exclusion band
//   final            = desired AND NOT undesired_total
//   masked_output    = frame with every pixel outside `final` zeroed
//
// It owns no state between frames. The same `MaskCompositor` can be reused for every
// frame of a video because it only holds the bands, which never change during a run.
//
// Shape policy: when a final mask and the frame it is applied to disagree on size
// (a mask computed at one resolution, a frame delivered at another), the mask is
// resampled to the frame with nearest-neighbor before it is applied. Nearest keeps
// the mask strictly binary.

use crate::core_modules::hsv::{HsvBand, HsvColor};
use crate::core_modules::mask::{Mask, MaskShapeError};
use crate::frame::Frame;
use tracing::{debug, trace};

/// Everything derived from one frame.
#[derive(Debug, Clone)]
pub struct Composite {
    pub desired: Mask,
    pub undesired_total: Mask,
    pub final_mask: Mask,
    pub masked_output: Frame,
}

pub struct MaskCompositor {
    desired: HsvBand,
    undesired: Vec<HsvBand>,
}

impl MaskCompositor {
    /// `undesired_colors` are single points; each is widened into its exclusion band here.
    pub fn new(desired: HsvBand, undesired_colors: &[HsvColor]) -> Self {
        let undesired: Vec<HsvBand> = undesired_colors.iter().map(|&c| HsvBand::undesired(c)).collect();
        debug!(desired = %desired, undesired_bands = undesired.len(), "mask compositor ready");
        Self { desired, undesired }
    }

    /// Pointwise form of the final mask: inside the desired band and outside every exclusion band.
    pub fn is_visible(&self, color: HsvColor) -> bool {
        self.desired.contains(color) && !self.undesired.iter().any(|band| band.contains(color))
    }

    pub fn compose(&self, frame: &Frame) -> Result<Composite, MaskShapeError> {
        let hsv = frame.to_hsv();
        let (width, height) = (frame.width, frame.height);

        let desired = Mask::from_cells(width, height, &hsv, |&c| self.desired.contains(c));

        let mut undesired_total = Mask::empty(width, height);
        for band in &self.undesired {
            let band_mask = Mask::from_cells(width, height, &hsv, |&c| band.contains(c));
            undesired_total.union_with(&band_mask)?;
        }

        let final_mask = desired.minus(&undesired_total)?;
        let (final_mask, masked_output) = apply_mask(frame, final_mask);

        trace!(
            desired = desired.count_true(),
            undesired = undesired_total.count_true(),
            visible = final_mask.count_true(),
            "frame composed"
        );

        Ok(Composite {
            desired,
            undesired_total,
            final_mask,
            masked_output,
        })
    }
}

/// Zeroes every pixel of `frame` outside `mask`, resampling the mask first if its
/// shape differs. Returns the mask actually applied together with the masked frame.
pub fn apply_mask(frame: &Frame, mask: Mask) -> (Mask, Frame) {
    let mask = if mask.width() == frame.width && mask.height() == frame.height {
        mask
    } else {
        debug!(
            mask_width = mask.width(),
            mask_height = mask.height(),
            frame_width = frame.width,
            frame_height = frame.height,
            "resampling mask to frame shape"
        );
        mask.resized_nearest(frame.width, frame.height)
    };

    let mut data = frame.data.clone();
    for (px, &keep) in data.chunks_exact_mut(3).zip(mask.bits().iter()) {
        if !keep {
            px.fill(0);
        }
    }
    let masked = Frame {
        width: frame.width,
        height: frame.height,
        format: frame.format,
        data,
    };
    (mask, masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    // RGB (255, 255, 0) is HSV (30, 255, 255); RGB (0, 255, 0) is HSV (60, 255, 255).
    const YELLOW: [u8; 3] = [255, 255, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const DARK_YELLOW: [u8; 3] = [100, 100, 0];

    fn frame(pixels: &[[u8; 3]], width: u32) -> Frame {
        let height = pixels.len() as u32 / width;
        Frame::new(width, height, PixelFormat::Rgb8, pixels.concat()).unwrap()
    }

    fn band() -> HsvBand {
        HsvBand::new(HsvColor::new(30, 160, 180), HsvColor::new(30, 255, 255))
    }

    #[test]
    fn empty_undesired_list_keeps_every_desired_pixel() {
        let compositor = MaskCompositor::new(band(), &[]);
        let out = compositor.compose(&frame(&[YELLOW, GREEN, DARK_YELLOW, YELLOW], 2)).unwrap();

        assert_eq!(out.undesired_total.count_true(), 0);
        assert_eq!(out.desired.count_true(), 2);
        assert_eq!(out.final_mask, out.desired);
        assert_eq!(out.masked_output.data, [YELLOW, [0; 3], [0; 3], YELLOW].concat());
    }

    #[test]
    fn undesired_band_removes_pixels_from_the_final_mask() {
        let compositor = MaskCompositor::new(band(), &[HsvColor::new(28, 250, 250)]);
        let out = compositor.compose(&frame(&[YELLOW, GREEN, YELLOW, GREEN], 2)).unwrap();

        assert_eq!(out.desired.count_true(), 2);
        assert_eq!(out.undesired_total.count_true(), 2);
        assert_eq!(out.final_mask.count_true(), 0);
        assert!(out.masked_output.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn undesired_bands_outside_the_desired_band_do_not_change_final() {
        let compositor = MaskCompositor::new(band(), &[HsvColor::new(60, 255, 255)]);
        let out = compositor.compose(&frame(&[YELLOW, GREEN], 2)).unwrap();

        assert_eq!(out.undesired_total.count_true(), 1);
        assert_eq!(out.final_mask.count_true(), 1);
        assert!(out.final_mask.is_subset_of(&out.desired));
    }

    #[test]
    fn final_mask_is_always_a_subset_of_desired() {
        let undesired: Vec<HsvColor> = (0..=179).step_by(7).map(|h| HsvColor::new(h, 250, 250)).collect();
        let wide = HsvBand::new(HsvColor::MIN, HsvColor::MAX);
        let compositor = MaskCompositor::new(wide, &undesired);

        let pixels: Vec<[u8; 3]> = (0..64u32)
            .map(|i| [(i * 4) as u8, (255 - i * 3) as u8, (i * 11 % 256) as u8])
            .collect();
        let out = compositor.compose(&frame(&pixels, 8)).unwrap();

        assert!(out.final_mask.is_subset_of(&out.desired));
        assert!(out.final_mask.count_true() <= out.desired.count_true());
    }

    #[test]
    fn pointwise_visibility_matches_the_final_mask() {
        let compositor = MaskCompositor::new(band(), &[HsvColor::new(30, 200, 200)]);
        assert!(!compositor.is_visible(HsvColor::new(30, 200, 200)));
        assert!(compositor.is_visible(HsvColor::new(30, 255, 255)));
        assert!(!compositor.is_visible(HsvColor::new(60, 200, 200)));
    }

    #[test]
    fn mismatched_mask_is_resampled_before_application() {
        let img = frame(&[YELLOW, YELLOW, YELLOW, YELLOW], 4);
        let small = Mask::from_cells(2, 1, &[true, false], |&b| b);
        let (applied, masked) = apply_mask(&img, small);

        assert_eq!(applied.width(), 4);
        assert_eq!(applied.count_true(), 2);
        assert_eq!(masked.data, [YELLOW, YELLOW, [0; 3], [0; 3]].concat());
    }
}
