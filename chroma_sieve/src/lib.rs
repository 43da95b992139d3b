// THEORY:
// This file is the entry point for the `chroma_sieve` library crate. It exposes two
// high-level workflows and keeps the building blocks in `core_modules`:
//
// - Per frame: `pipeline::SievePipeline` classifies every pixel against a desired HSV
//   band and a list of undesired colors, and reports the pixel-ratio metrics.
// - Per corpus: `core_modules::extractor::CorpusExtractor` collects the distinct
//   colors of an image folder, and `calibration::calibrate` reduces the undesired
//   ones to the subset that should be excluded for a target accuracy.
//
// The two meet through the undesired-color text file (`core_modules::wire`): the
// calibrator writes it, the per-frame front end reads it back.
//
// Decoding, display, and text rendering stay with the binaries.

pub mod calibration;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame;
pub mod pipeline;

pub use calibration::{CalibrationReport, calibrate, parse_target_accuracy};
pub use config::{ConfigError, SieveConfig};
pub use core_modules::color_set::{ColorSet, ColorSetPartition};
pub use core_modules::hsv::{HsvBand, HsvColor};
pub use error::{Result, SieveError};
pub use frame::{Frame, PixelFormat};
pub use pipeline::{FrameAnalysis, SievePipeline};
