//! The batch calibration step: from a scanned corpus and an operator target to the
//! numbers and the color subset the calibrator writes out.

use crate::core_modules::color_set::ColorSetPartition;
use crate::core_modules::hsv::HsvColor;
use crate::core_modules::metrics::simulated_accuracy;
use crate::core_modules::reducer::{required_count, required_undesired, select_required};
use crate::error::{Result, SieveError};
use rand::Rng;
use serde::Serialize;
use tracing::info;

/// Everything derived from one corpus for one target accuracy.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub target_accuracy: u8,
    pub desired_unique: usize,
    pub undesired_unique: usize,
    pub total_unique: usize,
    /// Distinct-color ratio over the whole corpus, in percent. Not the per-frame pixel accuracy.
    pub simulated_accuracy: f64,
    pub required_undesired: f64,
    pub required_count: usize,
    pub required_colors: Vec<HsvColor>,
}

pub fn calibrate<R: Rng + ?Sized>(colors: &ColorSetPartition, target_accuracy: u8, rng: &mut R) -> CalibrationReport {
    let desired_unique = colors.desired.len();
    let undesired_unique = colors.undesired.len();
    let total_unique = colors.total_unique();

    let required_undesired = required_undesired(total_unique, target_accuracy);
    let required_count = required_count(total_unique, target_accuracy);
    let required_colors = select_required(&colors.undesired, required_count, rng);

    let report = CalibrationReport {
        target_accuracy,
        desired_unique,
        undesired_unique,
        total_unique,
        simulated_accuracy: simulated_accuracy(desired_unique, undesired_unique),
        required_undesired,
        required_count,
        required_colors,
    };
    info!(
        target = target_accuracy,
        total = total_unique,
        simulated_accuracy = report.simulated_accuracy,
        required_count,
        selected = report.required_colors.len(),
        "calibration computed"
    );
    report
}

/// Validates operator input for the target accuracy: a whole number in `0..=100`.
pub fn parse_target_accuracy(input: &str) -> Result<u8> {
    let trimmed = input.trim();
    match trimmed.parse::<u8>() {
        Ok(value) if value <= 100 => Ok(value),
        _ => Err(SieveError::InvalidTargetAccuracy {
            input: trimmed.to_string(),
        }),
    }
}
