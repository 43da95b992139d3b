use crate::StillArgs;
use crate::overlay;
use anyhow::{Context, Result};
use chroma_sieve::core_modules::wire::load_undesired_colors;
use chroma_sieve::pipeline::Layout;
use chroma_sieve::{Frame, SieveConfig, SieveError, SievePipeline};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub fn run(config: &SieveConfig, args: StillArgs) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.paths.image_path.clone());
    let output_dir = args.output_dir.unwrap_or_else(|| config.paths.output_dir.clone());

    let undesired = load_undesired_colors(&config.paths.undesired_colors_file);
    info!(count = undesired.len(), "undesired colors loaded");
    for color in &undesired {
        tracing::debug!(%color, "undesired color");
    }

    let frame = open_image(&input)?;
    let pipeline = SievePipeline::from_config(config, &undesired);
    let analysis = pipeline.process(&frame)?;

    info!(
        accuracy = format_args!("{:.2}%", analysis.report.accuracy_percentage),
        tracking_efficiency = format_args!("{:.2}%", analysis.report.tracking_efficiency_percentage),
        "image classified"
    );

    let (canvas, lines) = analysis.view(&frame, Layout::QuadGrid);
    let canvas = overlay::draw(canvas, &lines)?;

    let path = save_result(&canvas, &output_dir)?;
    info!(path = %path.display(), "result image saved");

    if args.show {
        show(&canvas)?;
    }
    Ok(())
}

fn open_image(path: &Path) -> Result<Frame> {
    let image = image::open(path).map_err(|e| SieveError::source_unavailable(path, "cannot load image", e))?;
    Ok(Frame::from_rgb_image(image.to_rgb8()))
}

/// Writes `result_{unix seconds}.png` into `dir`, creating it if needed.
fn save_result(canvas: &Frame, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create output directory {}", dir.display()))?;
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    let path = dir.join(format!("result_{stamp}.png"));
    canvas
        .to_rgb_image()
        .save(&path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

#[cfg(feature = "video")]
fn show(canvas: &Frame) -> Result<()> {
    use opencv::highgui;

    const WINDOW: &str = "Combined Color View";
    const KEY_F9: i32 = 133;

    highgui::named_window(WINDOW, highgui::WINDOW_NORMAL)?;
    highgui::resize_window(WINDOW, 900, 600)?;
    highgui::imshow(WINDOW, &crate::overlay::cv::frame_to_mat(canvas)?)?;
    loop {
        let key = highgui::wait_key(50)?;
        if key == 'q' as i32 || key == KEY_F9 {
            info!(key, "closing preview");
            break;
        }
    }
    highgui::destroy_all_windows()?;
    Ok(())
}

#[cfg(not(feature = "video"))]
fn show(_canvas: &Frame) -> Result<()> {
    tracing::warn!("preview window needs the `video` feature; skipping");
    Ok(())
}
