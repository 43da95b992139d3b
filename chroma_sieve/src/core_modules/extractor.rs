// THEORY:
// The extractor is the batch half of the system. It walks a folder of images once,
// strictly one file at a time, and records every distinct HSV triple it sees, split
// into "inside the desired band" and "outside it". The resulting `ColorSetPartition`
// is the only state that survives from one image to the next, and the extractor is
// its sole writer for the duration of the scan.
//
// Key architectural principles:
// 1.  **Per-item failure is not fatal**: a file that cannot be decoded is logged and
//     skipped. Only an unreadable corpus directory aborts the scan.
// 2.  **Side output through a sink**: every scanned image also produces a picture of
//     its desired pixels tagged with the running simulated accuracy. Where that
//     picture goes (disk, nowhere, a test buffer) is up to the `FilteredImageSink`.
// 3.  **Cooperative stop**: an optional flag is checked between files. Files already
//     handed to the sink stay written; the remaining files are never opened.

use crate::core_modules::color_set::ColorSetPartition;
use crate::core_modules::compositor::apply_mask;
use crate::core_modules::hsv::HsvBand;
use crate::core_modules::mask::Mask;
use crate::core_modules::metrics::simulated_accuracy;
use crate::error::{Result, SieveError};
use crate::frame::Frame;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Extensions the scan picks up, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Receives the filtered desired image produced for each scanned file.
pub trait FilteredImageSink {
    fn on_filtered(&mut self, source: &Path, filtered: &Frame, running_accuracy: f64) -> Result<()>;
}

/// Discards every filtered image.
pub struct NullSink;

impl FilteredImageSink for NullSink {
    fn on_filtered(&mut self, _source: &Path, _filtered: &Frame, _running_accuracy: f64) -> Result<()> {
        Ok(())
    }
}

/// Outcome of a corpus scan.
#[derive(Debug, Clone, Default)]
pub struct CorpusScan {
    pub colors: ColorSetPartition,
    pub images_scanned: usize,
    pub images_skipped: usize,
    /// Set when the stop flag ended the scan early.
    pub stopped: bool,
}

pub struct CorpusExtractor {
    band: HsvBand,
    stop: Option<Arc<AtomicBool>>,
}

impl CorpusExtractor {
    pub fn new(band: HsvBand) -> Self {
        Self { band, stop: None }
    }

    /// Installs a flag that ends the scan before the next file once set.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Scans every image file directly inside `dir`.
    pub fn scan_dir(&self, dir: &Path, sink: &mut dyn FilteredImageSink) -> Result<CorpusScan> {
        let files = discover_images(dir)?;
        info!(dir = %dir.display(), files = files.len(), band = %self.band, "scanning corpus");
        self.scan_files(&files, sink)
    }

    /// Scans `files` in order.
    pub fn scan_files(&self, files: &[PathBuf], sink: &mut dyn FilteredImageSink) -> Result<CorpusScan> {
        let mut scan = CorpusScan::default();

        for path in files {
            if self.stop_requested() {
                info!(scanned = scan.images_scanned, "stop requested, ending corpus scan");
                scan.stopped = true;
                break;
            }

            let frame = match decode(path) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable image");
                    scan.images_skipped += 1;
                    continue;
                }
            };

            let desired = self.accumulate(&frame, &mut scan.colors);
            scan.images_scanned += 1;

            let running = simulated_accuracy(scan.colors.desired.len(), scan.colors.undesired.len());
            debug!(
                path = %path.display(),
                desired_unique = scan.colors.desired.len(),
                undesired_unique = scan.colors.undesired.len(),
                running_accuracy = running,
                "image scanned"
            );

            let (_, filtered) = apply_mask(&frame, desired);
            if let Err(e) = sink.on_filtered(path, &filtered, running) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!(path = %path.display(), error = %e, "could not store filtered image");
            }
        }

        info!(
            scanned = scan.images_scanned,
            skipped = scan.images_skipped,
            desired_unique = scan.colors.desired.len(),
            undesired_unique = scan.colors.undesired.len(),
            "corpus scan finished"
        );
        Ok(scan)
    }

    /// Adds every pixel of `frame` to `colors` and returns the frame's desired mask.
    pub fn accumulate(&self, frame: &Frame, colors: &mut ColorSetPartition) -> Mask {
        let hsv = frame.to_hsv();
        Mask::from_cells(frame.width, frame.height, &hsv, |&c| colors.observe(c, &self.band))
    }
}

fn decode(path: &Path) -> Result<Frame> {
    let image = image::open(path).map_err(|source| SieveError::ItemDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Frame::from_rgb_image(image.to_rgb8()))
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Regular files in `dir` with an image extension, sorted by path.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SieveError::source_unavailable(dir, "cannot read corpus directory", e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::hsv::HsvColor;
    use crate::frame::PixelFormat;

    fn band() -> HsvBand {
        HsvBand::new(HsvColor::new(30, 160, 180), HsvColor::new(30, 255, 255))
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(has_image_extension(Path::new("a/b.JPG")));
        assert!(has_image_extension(Path::new("b.jpeg")));
        assert!(has_image_extension(Path::new("c.Png")));
        assert!(has_image_extension(Path::new("d.gif")));
        assert!(!has_image_extension(Path::new("e.txt")));
        assert!(!has_image_extension(Path::new("noext")));
    }

    #[test]
    fn accumulate_dedupes_and_returns_the_desired_mask() {
        // yellow, yellow, green, yellow
        let data = [[255u8, 255, 0], [255, 255, 0], [0, 255, 0], [255, 255, 0]].concat();
        let frame = Frame::new(2, 2, PixelFormat::Rgb8, data).unwrap();
        let extractor = CorpusExtractor::new(band());
        let mut colors = ColorSetPartition::new();

        let mask = extractor.accumulate(&frame, &mut colors);
        assert_eq!(mask.count_true(), 3);
        assert_eq!(colors.desired.len(), 1);
        assert_eq!(colors.undesired.len(), 1);

        extractor.accumulate(&frame, &mut colors);
        assert_eq!(colors.total_unique(), 2);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let err = discover_images(Path::new("/definitely/not/a/corpus")).unwrap_err();
        assert!(!err.is_recoverable());
        assert!(matches!(err, SieveError::SourceUnavailable { .. }));
    }

    #[test]
    fn stop_flag_prevents_any_file_from_opening() {
        let stop = Arc::new(AtomicBool::new(true));
        let extractor = CorpusExtractor::new(band()).with_stop_flag(stop);
        let files = vec![PathBuf::from("/nope/a.png")];
        let scan = extractor.scan_files(&files, &mut NullSink).unwrap();
        assert!(scan.stopped);
        assert_eq!(scan.images_scanned + scan.images_skipped, 0);
    }
}
