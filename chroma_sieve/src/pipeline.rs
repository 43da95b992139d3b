// THEORY:
// The `pipeline` module is the top-level API for per-frame work. It wraps the whole
// stack (HSV conversion, band masks, exclusion, metrics, visual layout) behind one
// call so that a front end only has to hand in frames and draw what comes back.
//
// The pipeline is stateless across frames: `process` reads the frame and the bands
// fixed at construction and nothing else, so frames can be fed in any order.

use crate::config::SieveConfig;
use crate::core_modules::compositor::MaskCompositor;
use crate::core_modules::hsv::{HsvBand, HsvColor};
use crate::core_modules::layout;
use crate::error::Result;
use crate::frame::Frame;

// Re-export key data structures for the public API.
pub use crate::core_modules::compositor::Composite;
pub use crate::core_modules::layout::{Layout, OverlayLine};
pub use crate::core_modules::metrics::AccuracyReport;

/// Everything the pipeline derives from one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub composite: Composite,
    pub report: AccuracyReport,
}

impl FrameAnalysis {
    /// The operator view for `layout`, together with the labels to draw on it.
    pub fn view(&self, original: &Frame, layout: Layout) -> (Frame, Vec<OverlayLine>) {
        let canvas = layout::render(layout, original, &self.composite);
        let lines = layout::overlay_lines(layout, &self.report, original.width, original.height);
        (canvas, lines)
    }
}

/// The main per-frame entry point.
pub struct SievePipeline {
    compositor: MaskCompositor,
}

impl SievePipeline {
    pub fn new(desired: HsvBand, undesired_colors: &[HsvColor]) -> Self {
        Self {
            compositor: MaskCompositor::new(desired, undesired_colors),
        }
    }

    pub fn from_config(config: &SieveConfig, undesired_colors: &[HsvColor]) -> Self {
        Self::new(config.desired_band, undesired_colors)
    }

    pub fn process(&self, frame: &Frame) -> Result<FrameAnalysis> {
        let composite = self.compositor.compose(frame)?;
        let report = AccuracyReport::from_masks(frame.pixel_count(), &composite.desired, &composite.final_mask);
        Ok(FrameAnalysis { composite, report })
    }
}
