use crate::VideoArgs;
use crate::overlay::{self, cv};
use anyhow::{Context, Result};
use chroma_sieve::core_modules::wire::load_undesired_colors;
use chroma_sieve::pipeline::Layout;
use chroma_sieve::{SieveConfig, SieveError, SievePipeline};
use opencv::{
    core::{Mat, Size},
    highgui,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use tracing::{debug, error, info};

const WINDOW: &str = "Original vs Processed";

pub fn run(config: &SieveConfig, args: VideoArgs) -> Result<()> {
    // --- 1. Inputs ---
    let input = args.input.unwrap_or_else(|| config.paths.video_path.clone());
    let output = args
        .output
        .unwrap_or_else(|| config.paths.output_dir.join("processed_video.mp4"));

    let undesired = load_undesired_colors(&config.paths.undesired_colors_file);
    info!(count = undesired.len(), "undesired colors loaded");

    // --- 2. Video I/O Initialization ---
    let input_str = input.to_string_lossy();
    let mut cap = VideoCapture::from_file(&input_str, videoio::CAP_ANY)
        .map_err(|e| SieveError::source_unavailable(&input, "cannot open video", e))?;
    if !cap.is_opened()? {
        return Err(SieveError::SourceUnavailable {
            path: input,
            message: "video could not be opened".to_string(),
            source: None,
        }
        .into());
    }

    let fps = cap.get(videoio::CAP_PROP_FPS)?;
    let fps = if fps > 0.0 { fps } else { 30.0 };
    let delay = (1000.0 / fps).round().max(1.0) as i32;

    let (proc_width, proc_height) = config.video_size;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let mut writer = VideoWriter::new(
        &output.to_string_lossy(),
        fourcc,
        fps,
        Size::new(proc_width as i32 * 2, proc_height as i32 * 2),
        true,
    )?;
    if !writer.is_opened()? {
        anyhow::bail!("cannot create video writer at {}", output.display());
    }

    // --- 3. Sieve Initialization ---
    let pipeline = SievePipeline::from_config(config, &undesired);
    if !args.headless {
        highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
    }

    // --- 4. Main Processing Loop ---
    let mut raw = Mat::default();
    let mut frames: u64 = 0;
    loop {
        match cap.read(&mut raw) {
            Ok(true) if !raw.empty() => {}
            Ok(_) => {
                info!(frames, "end of video");
                break;
            }
            Err(e) => {
                error!(frames, error = %e, "error reading frame");
                break;
            }
        }

        // --- 5. Frame Conversion & Classification ---
        let frame = cv::mat_to_frame(&raw)?.resized(proc_width, proc_height);
        let analysis = pipeline.process(&frame)?;
        debug!(
            frame = frames,
            accuracy = analysis.report.accuracy_percentage,
            tracking_efficiency = analysis.report.tracking_efficiency_percentage,
            "frame classified"
        );

        // --- 6. Visualization ---
        let (canvas, lines) = analysis.view(&frame, Layout::SideBySide);
        let canvas = overlay::draw(canvas, &lines)?;
        let output_frame = cv::frame_to_mat(&canvas)?;

        // --- 7. Write Output Frame ---
        writer.write(&output_frame)?;
        frames += 1;

        if !args.headless {
            highgui::imshow(WINDOW, &output_frame)?;
            if highgui::wait_key(delay)? & 0xFF == 'q' as i32 {
                info!(frames, "stopped by operator");
                break;
            }
        }
    }

    writer.release()?;
    cap.release()?;
    if !args.headless {
        highgui::destroy_all_windows()?;
    }

    info!(path = %output.display(), frames, "processing complete");
    Ok(())
}
