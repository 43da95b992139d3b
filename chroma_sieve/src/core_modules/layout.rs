//! Composited views for operators, and where their metric labels go.
//!
//! Only the pixel arrangement and label geometry live here. Drawing glyphs is up to
//! whichever front end owns a text renderer.

use crate::core_modules::compositor::Composite;
use crate::core_modules::metrics::AccuracyReport;
use crate::frame::Frame;

/// Canvas width the base font scale is tuned for.
const BASE_CANVAS_WIDTH: f64 = 900.0;
const BASE_FONT_SCALE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Original | masked output on top, bottom half left for text. Used for video.
    SideBySide,
    /// Desired, undesired total, final mask, masked output in a 2x2 grid. Used for stills.
    QuadGrid,
}

/// One label to draw onto a composited canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub text: String,
    /// Baseline-left anchor, in canvas pixels.
    pub x: i32,
    pub y: i32,
    pub scale: f64,
}

/// Builds the `2w x 2h` canvas for `layout` from the original frame and its composite.
pub fn render(layout: Layout, original: &Frame, composite: &Composite) -> Frame {
    let (w, h) = (original.width, original.height);
    let mut canvas = Frame::black(w * 2, h * 2, original.format);
    match layout {
        Layout::SideBySide => {
            canvas.blit(original, 0, 0);
            canvas.blit(&composite.masked_output, w, 0);
        }
        Layout::QuadGrid => {
            canvas.blit(&composite.desired.to_frame(original.format), 0, 0);
            canvas.blit(&composite.undesired_total.to_frame(original.format), w, 0);
            canvas.blit(&composite.final_mask.to_frame(original.format), 0, h);
            canvas.blit(&composite.masked_output, w, h);
        }
    }
    canvas
}

/// Font scale for a canvas of `canvas_width` pixels.
pub fn font_scale(canvas_width: u32) -> f64 {
    BASE_FONT_SCALE * canvas_width as f64 / BASE_CANVAS_WIDTH
}

/// The accuracy and tracking-efficiency labels for a canvas built from a `w x h` frame.
pub fn overlay_lines(layout: Layout, report: &AccuracyReport, w: u32, h: u32) -> Vec<OverlayLine> {
    let scale = font_scale(w * 2);
    let y = match layout {
        Layout::SideBySide => h as i32 + 20,
        Layout::QuadGrid => 20,
    };
    vec![
        OverlayLine {
            text: format!("Accuracy: {:.2}%", report.accuracy_percentage),
            x: 10,
            y,
            scale,
        },
        OverlayLine {
            text: format!("Tracking Efficiency: {:.2}%", report.tracking_efficiency_percentage),
            x: w as i32 + 10,
            y,
            scale,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::compositor::MaskCompositor;
    use crate::core_modules::hsv::{HsvBand, HsvColor};
    use crate::frame::PixelFormat;
    use approx::assert_relative_eq;

    fn sample() -> (Frame, Composite) {
        let frame = Frame::new(2, 1, PixelFormat::Rgb8, vec![255, 255, 0, 0, 255, 0]).unwrap();
        let band = HsvBand::new(HsvColor::new(30, 160, 180), HsvColor::new(30, 255, 255));
        let composite = MaskCompositor::new(band, &[]).compose(&frame).unwrap();
        (frame, composite)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> &[u8] {
        let i = ((y * frame.width + x) * 3) as usize;
        &frame.data[i..i + 3]
    }

    #[test]
    fn side_by_side_places_original_and_masked_on_top() {
        let (frame, composite) = sample();
        let canvas = render(Layout::SideBySide, &frame, &composite);
        assert_eq!((canvas.width, canvas.height), (4, 2));
        assert_eq!(pixel(&canvas, 1, 0), &[0, 255, 0]);
        assert_eq!(pixel(&canvas, 2, 0), &[255, 255, 0]);
        assert_eq!(pixel(&canvas, 3, 0), &[0, 0, 0]);
        assert!(canvas.data[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn quad_grid_shows_masks_as_grayscale() {
        let (frame, composite) = sample();
        let canvas = render(Layout::QuadGrid, &frame, &composite);
        assert_eq!(pixel(&canvas, 0, 0), &[255, 255, 255]);
        assert_eq!(pixel(&canvas, 1, 0), &[0, 0, 0]);
        assert_eq!(pixel(&canvas, 2, 0), &[0, 0, 0]);
        assert_eq!(pixel(&canvas, 0, 1), &[255, 255, 255]);
        assert_eq!(pixel(&canvas, 2, 1), &[255, 255, 0]);
    }

    #[test]
    fn labels_scale_with_canvas_width() {
        let report = AccuracyReport::from_counts(4, 2, 1);
        let lines = overlay_lines(Layout::SideBySide, &report, 450, 100);
        assert_relative_eq!(lines[0].scale, 0.5);
        assert_eq!(lines[0].text, "Accuracy: 25.00%");
        assert_eq!(lines[1].text, "Tracking Efficiency: 50.00%");
        assert_eq!((lines[0].x, lines[0].y), (10, 120));
        assert_eq!(lines[1].x, 460);
        assert_eq!(overlay_lines(Layout::QuadGrid, &report, 450, 100)[0].y, 20);
    }
}
