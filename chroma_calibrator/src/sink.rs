use chroma_sieve::core_modules::extractor::FilteredImageSink;
use chroma_sieve::{Frame, Result, SieveError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of every filtered image written next to the corpus.
pub const FILTERED_PREFIX: &str = "filtered_desired_";

/// Writes each filtered desired image as `filtered_desired_{name}` under `dir`.
pub struct DiskSink {
    dir: PathBuf,
    written: usize,
}

impl DiskSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn target_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.png", self.written));
        self.dir.join(format!("{FILTERED_PREFIX}{name}"))
    }
}

/// Caption for a filtered image. Glyphs are not rendered onto the saved file; the
/// caption is reported alongside the path instead.
pub fn accuracy_caption(running_accuracy: f64) -> String {
    format!("Accuracy: {running_accuracy:.2}%")
}

impl FilteredImageSink for DiskSink {
    fn on_filtered(&mut self, source: &Path, filtered: &Frame, running_accuracy: f64) -> Result<()> {
        let target = self.target_for(source);
        filtered
            .to_rgb_image()
            .save(&target)
            .map_err(|e| SieveError::write(&target, e))?;
        self.written += 1;
        info!(path = %target.display(), caption = %accuracy_caption(running_accuracy), "wrote filtered image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_sieve::PixelFormat;

    #[test]
    fn writes_prefixed_copy_of_the_source_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DiskSink::new(dir.path());
        let frame = Frame::black(4, 3, PixelFormat::Rgb8);

        sink.on_filtered(Path::new("corpus/leaf.png"), &frame, 42.0).unwrap();

        let written = dir.path().join("filtered_desired_leaf.png");
        assert!(written.exists());
        assert_eq!(sink.written(), 1);
        let reloaded = image::open(written).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (4, 3));
    }

    #[test]
    fn caption_uses_two_decimals() {
        assert_eq!(accuracy_caption(42.0), "Accuracy: 42.00%");
        assert_eq!(accuracy_caption(4.761_904), "Accuracy: 4.76%");
    }

    #[test]
    fn saved_image_is_the_filtered_frame_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DiskSink::new(dir.path());
        let frame = Frame::new(2, 1, PixelFormat::Rgb8, vec![255, 255, 0, 0, 0, 0]).unwrap();

        sink.on_filtered(Path::new("b.png"), &frame, 50.0).unwrap();

        let saved = image::open(dir.path().join("filtered_desired_b.png")).unwrap().to_rgb8();
        assert_eq!(saved.into_raw(), frame.data);
    }

    #[test]
    fn missing_target_directory_is_a_recoverable_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DiskSink::new(dir.path().join("absent"));
        let frame = Frame::black(2, 2, PixelFormat::Rgb8);

        let err = sink.on_filtered(Path::new("a.png"), &frame, 0.0).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(sink.written(), 0);
    }
}
