// THEORY:
// Two different numbers in this system are both shown to operators as "accuracy".
// They are kept apart here on purpose, each with its own name:
//
// - `AccuracyReport` is per frame and counts pixels: how much of the frame survives
//   the final mask (`accuracy_percentage`) and how much falls in the desired band at
//   all (`tracking_efficiency_percentage`).
// - `simulated_accuracy` is per corpus and counts distinct colors: the share of all
//   observed colors that fall in the desired band.
//
// Both guard their denominators and report 0 for an empty input.

use crate::core_modules::mask::Mask;
use serde::Serialize;

/// Pixel-ratio metrics for one processed frame or image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Share of the frame inside the final mask, in percent.
    pub accuracy_percentage: f64,
    /// Share of the frame inside the desired band, in percent.
    pub tracking_efficiency_percentage: f64,
}

impl AccuracyReport {
    /// `total_pixels` is width * height of the classified plane.
    pub fn from_counts(total_pixels: usize, desired_pixels: usize, final_pixels: usize) -> Self {
        Self {
            accuracy_percentage: percentage(final_pixels, total_pixels),
            tracking_efficiency_percentage: percentage(desired_pixels, total_pixels),
        }
    }

    pub fn from_masks(total_pixels: usize, desired: &Mask, final_mask: &Mask) -> Self {
        Self::from_counts(total_pixels, desired.count_true(), final_mask.count_true())
    }
}

/// Corpus-level ratio of distinct desired colors to all distinct observed colors, in percent.
pub fn simulated_accuracy(desired_unique: usize, undesired_unique: usize) -> f64 {
    percentage(desired_unique, desired_unique + undesired_unique)
}

/// `100 * part / whole`, or 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pixel_ratios() {
        let report = AccuracyReport::from_counts(200, 50, 20);
        assert_relative_eq!(report.accuracy_percentage, 10.0);
        assert_relative_eq!(report.tracking_efficiency_percentage, 25.0);
    }

    #[test]
    fn zero_pixels_yield_zero_not_nan() {
        let report = AccuracyReport::from_counts(0, 0, 0);
        assert_eq!(report.accuracy_percentage, 0.0);
        assert_eq!(report.tracking_efficiency_percentage, 0.0);
    }

    #[test]
    fn ratios_stay_within_percent_bounds() {
        for total in 1..40usize {
            for desired in 0..=total {
                for visible in (0..=desired).step_by(3) {
                    let r = AccuracyReport::from_counts(total, desired, visible);
                    assert!((0.0..=100.0).contains(&r.accuracy_percentage));
                    assert!((0.0..=100.0).contains(&r.tracking_efficiency_percentage));
                    assert!(r.accuracy_percentage <= r.tracking_efficiency_percentage);
                }
            }
        }
    }

    #[test]
    fn from_masks_counts_set_cells() {
        let desired = Mask::from_cells(2, 2, &[1, 1, 1, 0], |&c| c == 1);
        let visible = Mask::from_cells(2, 2, &[1, 0, 0, 0], |&c| c == 1);
        let r = AccuracyReport::from_masks(4, &desired, &visible);
        assert_relative_eq!(r.accuracy_percentage, 25.0);
        assert_relative_eq!(r.tracking_efficiency_percentage, 75.0);
    }

    #[test]
    fn simulated_accuracy_edges() {
        assert_eq!(simulated_accuracy(0, 0), 0.0);
        assert_eq!(simulated_accuracy(5, 0), 100.0);
        assert_eq!(simulated_accuracy(0, 5), 0.0);
        assert_relative_eq!(simulated_accuracy(1, 3), 25.0);
    }
}
