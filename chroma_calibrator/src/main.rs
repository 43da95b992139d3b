use anyhow::{Context, Result};
use chroma_sieve::config::DEFAULT_CONFIG_FILE;
use chroma_sieve::core_modules::extractor::{CorpusExtractor, CorpusScan, FilteredImageSink};
use chroma_sieve::{HsvBand, SieveConfig, calibrate, parse_target_accuracy};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod interrupt;
mod outputs;
mod sink;

#[derive(Parser)]
#[command(
    name = "chroma_calibrator",
    version,
    about = "Scan an image corpus and pick the undesired colors to exclude for a target accuracy"
)]
struct Cli {
    /// Configuration file (TOML); created with defaults if missing
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Target accuracy 0-100; prompted for when omitted
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    target: Option<u8>,

    /// Seed for the undesired-color sampler, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Corpus directory; overrides `paths.corpus_dir`
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Directory for the text and JSON results; overrides `paths.output_dir`
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory for filtered desired images; overrides `paths.filtered_dir`
    #[arg(long)]
    filtered_dir: Option<PathBuf>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Asks the operator for the target accuracy on stdin.
fn prompt_target(input: &mut impl BufRead, out: &mut impl Write) -> Result<u8> {
    write!(out, "Enter the target accuracy (0-100): ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("cannot read target accuracy")?;
    Ok(parse_target_accuracy(&line)?)
}

/// Scans `corpus`, ending early (with whatever was gathered) once `stop` is set.
fn scan_corpus(band: HsvBand, corpus: &Path, sink: &mut dyn FilteredImageSink, stop: Arc<AtomicBool>) -> Result<CorpusScan> {
    let scan = CorpusExtractor::new(band).with_stop_flag(stop).scan_dir(corpus, sink)?;
    if scan.stopped {
        warn!(
            scanned = scan.images_scanned,
            "corpus scan interrupted, results cover only the images read so far"
        );
    }
    Ok(scan)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SieveConfig::load_or_create(&cli.config)
        .with_context(|| format!("cannot load configuration {}", cli.config.display()))?;
    init_logging(&config.log_level);
    info!(
        config = %cli.config.display(),
        lower = %config.desired_band.lower,
        upper = %config.desired_band.upper,
        "loaded HSV band"
    );

    let corpus = cli.corpus.unwrap_or_else(|| config.paths.corpus_dir.clone());
    let output_dir = cli.output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
    let filtered_dir = cli.filtered_dir.unwrap_or_else(|| config.paths.filtered_dir.clone());
    for dir in [&corpus, &output_dir, &filtered_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }

    let target = match cli.target {
        Some(target) => target,
        None => prompt_target(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let mut sink = sink::DiskSink::new(filtered_dir);
    let stop = interrupt::stop_on_ctrl_c();
    info!(corpus = %corpus.display(), "scanning corpus, press Ctrl-C to stop after the current image");
    let scan = scan_corpus(config.desired_band, &corpus, &mut sink, stop)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = calibrate(&scan.colors, target, &mut rng);

    let written = outputs::write_all(&output_dir, &scan.colors, &report)?;

    println!("\nColor analysis results:");
    println!("  Images scanned: {} ({} skipped)", scan.images_scanned, scan.images_skipped);
    println!("  Total colors: {}", report.total_unique);
    println!("  Desired colors: {}", report.desired_unique);
    println!("  Undesired colors: {}", report.undesired_unique);
    println!("  Simulated accuracy: {:.2}%", report.simulated_accuracy);
    println!(
        "  Undesired colors to avoid for target accuracy ({}%): {:.2}",
        target, report.required_undesired
    );
    println!("\nResults saved in files:");
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_accepts_a_valid_answer() {
        let mut out = Vec::new();
        let target = prompt_target(&mut "85\n".as_bytes(), &mut out).unwrap();
        assert_eq!(target, 85);
        assert!(String::from_utf8(out).unwrap().contains("0-100"));
    }

    #[test]
    fn prompt_rejects_out_of_range_answers() {
        let err = prompt_target(&mut "150\n".as_bytes(), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("0 to 100"));
    }

    #[test]
    fn raised_stop_flag_leaves_the_filtered_directory_empty() {
        let corpus = tempfile::tempdir().unwrap();
        let filtered = tempfile::tempdir().unwrap();
        image::RgbImage::new(2, 2).save(corpus.path().join("a.png")).unwrap();
        let band = HsvBand::new(chroma_sieve::HsvColor::MIN, chroma_sieve::HsvColor::MAX);

        let mut sink = sink::DiskSink::new(filtered.path());
        let scan = scan_corpus(band, corpus.path(), &mut sink, Arc::new(AtomicBool::new(true))).unwrap();
        assert!(scan.stopped);
        assert_eq!(scan.images_scanned, 0);
        assert_eq!(sink.written(), 0);

        let scan = scan_corpus(band, corpus.path(), &mut sink, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(!scan.stopped);
        assert_eq!(sink.written(), 1);
    }

    #[test]
    fn cli_rejects_targets_above_100() {
        assert!(Cli::try_parse_from(["chroma_calibrator", "--target", "101"]).is_err());
        let cli = Cli::try_parse_from(["chroma_calibrator", "--target", "80", "--seed", "4"]).unwrap();
        assert_eq!(cli.target, Some(80));
        assert_eq!(cli.seed, Some(4));
    }
}
