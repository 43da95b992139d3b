use anyhow::{Context, Result};
use chroma_sieve::CalibrationReport;
use chroma_sieve::ColorSetPartition;
use chroma_sieve::core_modules::wire::{self, ACCURACY_FILE, HSV_COLORS_FILE, REQUIRED_UNDESIRED_FILE};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE: &str = "calibration_summary.json";

fn write_text(path: PathBuf, body: &str) -> Result<PathBuf> {
    std::fs::write(&path, body).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "saved");
    Ok(path)
}

/// Writes the three wire-format text files and the JSON summary into `dir`.
/// Returns the written paths in the order they were saved.
pub fn write_all(dir: &Path, colors: &ColorSetPartition, report: &CalibrationReport) -> Result<Vec<PathBuf>> {
    let hsv = wire::hsv_colors_file(colors.undesired.iter(), colors.desired.iter(), colors.total_unique());
    let accuracy = wire::accuracy_file(
        report.desired_unique,
        report.undesired_unique,
        report.target_accuracy,
        report.required_undesired,
    );
    let required = wire::required_undesired_file(report.required_colors.iter().copied());
    let summary = serde_json::to_string_pretty(report).context("cannot serialize calibration summary")?;

    Ok(vec![
        write_text(dir.join(HSV_COLORS_FILE), &hsv)?,
        write_text(dir.join(ACCURACY_FILE), &accuracy)?,
        write_text(dir.join(REQUIRED_UNDESIRED_FILE), &required)?,
        write_text(dir.join(SUMMARY_FILE), &summary)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_sieve::core_modules::wire::load_undesired_colors;
    use chroma_sieve::{HsvBand, HsvColor, calibrate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn written_required_file_loads_back_as_exclusions() {
        let band = HsvBand::new(HsvColor::new(35, 50, 50), HsvColor::new(85, 255, 255));
        let mut colors = ColorSetPartition::new();
        for h in 0..20 {
            colors.observe(HsvColor::new(h, 200, 200), &band);
        }
        colors.observe(HsvColor::new(60, 200, 200), &band);
        let report = calibrate(&colors, 50, &mut StdRng::seed_from_u64(9));

        let dir = tempfile::tempdir().unwrap();
        let written = write_all(dir.path(), &colors, &report).unwrap();
        assert_eq!(written.len(), 4);

        let loaded = load_undesired_colors(&dir.path().join(REQUIRED_UNDESIRED_FILE));
        assert_eq!(loaded, report.required_colors);

        let accuracy = std::fs::read_to_string(dir.path().join(ACCURACY_FILE)).unwrap();
        assert!(accuracy.starts_with("Simulated accuracy: 4.76%"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["target_accuracy"], 50);
        assert_eq!(summary["total_unique"], 21);
    }
}
