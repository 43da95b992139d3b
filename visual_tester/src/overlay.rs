//! Drawing metric labels onto composited canvases.
//!
//! Glyph rendering comes from opencv, so it is only available with the `video`
//! feature. Without it the labels are logged and the canvas is saved unlabelled.

use anyhow::Result;
use chroma_sieve::Frame;
use chroma_sieve::pipeline::OverlayLine;

#[cfg(feature = "video")]
pub fn draw(canvas: Frame, lines: &[OverlayLine]) -> Result<Frame> {
    use chroma_sieve::PixelFormat;
    use opencv::core::{Point, Scalar};
    use opencv::imgproc;

    let original_format = canvas.format;
    let mut mat = cv::frame_to_mat(&canvas.converted(PixelFormat::Bgr8))?;
    for line in lines {
        imgproc::put_text(
            &mut mat,
            &line.text,
            Point::new(line.x, line.y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            line.scale,
            Scalar::new(255.0, 255.0, 255.0, 0.0),
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(cv::mat_to_frame(&mat)?.converted(original_format))
}

#[cfg(not(feature = "video"))]
pub fn draw(canvas: Frame, lines: &[OverlayLine]) -> Result<Frame> {
    for line in lines {
        tracing::debug!(text = %line.text, x = line.x, y = line.y, "overlay text not rendered without the video feature");
    }
    Ok(canvas)
}

/// Conversions between sieve frames and opencv matrices (always BGR, 8-bit, 3 channels).
#[cfg(feature = "video")]
pub mod cv {
    use anyhow::{Context, Result, bail};
    use chroma_sieve::{Frame, PixelFormat};
    use opencv::core::{self, Mat, Scalar};
    use opencv::prelude::*;

    pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
        if frame.format != PixelFormat::Bgr8 {
            return frame_to_mat(&frame.converted(PixelFormat::Bgr8));
        }
        let mut mat = Mat::new_rows_cols_with_default(
            frame.height as i32,
            frame.width as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        mat.data_bytes_mut()?.copy_from_slice(&frame.data);
        Ok(mat)
    }

    pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
        if mat.typ() != core::CV_8UC3 {
            bail!("expected an 8-bit 3-channel matrix, got type {}", mat.typ());
        }
        let owned;
        let continuous = if mat.is_continuous() {
            mat
        } else {
            owned = mat.try_clone()?;
            &owned
        };
        let data = continuous.data_bytes()?.to_vec();
        Frame::new(mat.cols() as u32, mat.rows() as u32, PixelFormat::Bgr8, data)
            .context("frame buffer does not match matrix size")
    }
}
