//! Typed configuration for the sieve front ends.
//!
//! The file is TOML. It is read into a loose schema where every field is optional,
//! then validated in one pass into an immutable [`SieveConfig`]. Missing fields take
//! their documented defaults; every malformed field is reported together in a single
//! [`ConfigError::Invalid`].
//!
//! ```toml
//! [system]
//! log_level = "info"
//!
//! [hsv]
//! lower = [30, 160, 180]
//! upper = [30, 255, 255]
//!
//! [paths]
//! video_path = "input.mp4"
//! image_path = "input.png"
//! corpus_dir = "M"
//! filtered_dir = "F"
//! output_dir = "Out_Put"
//! undesired_colors_file = "Out_Put/required_undesired_colors.txt"
//!
//! [video]
//! width = 640
//! height = 360
//! ```

use crate::core_modules::hsv::{HsvBand, HsvColor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "chroma_sieve.toml";
pub const DEFAULT_LOWER: [u8; 3] = [30, 160, 180];
pub const DEFAULT_UPPER: [u8; 3] = [30, 255, 255];
pub const DEFAULT_VIDEO_SIZE: (u32, u32) = (640, 360);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration:\n  - {}", problems.join("\n  - "))]
    Invalid { problems: Vec<String> },
}

/// Validated, immutable configuration. Built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SieveConfig {
    pub log_level: String,
    pub desired_band: HsvBand,
    pub paths: PathsConfig,
    /// Processing resolution frames are resampled to in video mode.
    pub video_size: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub video_path: PathBuf,
    pub image_path: PathBuf,
    pub corpus_dir: PathBuf,
    pub filtered_dir: PathBuf,
    pub output_dir: PathBuf,
    pub undesired_colors_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::from("input.mp4"),
            image_path: PathBuf::from("input.png"),
            corpus_dir: PathBuf::from("M"),
            filtered_dir: PathBuf::from("F"),
            output_dir: PathBuf::from("Out_Put"),
            undesired_colors_file: PathBuf::from("Out_Put/required_undesired_colors.txt"),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    system: RawSystem,
    #[serde(default)]
    hsv: RawHsv,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    video: RawVideo,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSystem {
    log_level: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHsv {
    lower: Option<Vec<i64>>,
    upper: Option<Vec<i64>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPaths {
    video_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    corpus_dir: Option<PathBuf>,
    filtered_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    undesired_colors_file: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVideo {
    width: Option<i64>,
    height: Option<i64>,
}

impl Default for SieveConfig {
    fn default() -> Self {
        let [lh, ls, lv] = DEFAULT_LOWER;
        let [uh, us, uv] = DEFAULT_UPPER;
        Self {
            log_level: "info".to_string(),
            desired_band: HsvBand::new(HsvColor::new(lh, ls, lv), HsvColor::new(uh, us, uv)),
            paths: PathsConfig::default(),
            video_size: DEFAULT_VIDEO_SIZE,
        }
    }
}

impl SieveConfig {
    /// Parses and validates TOML text. `origin` is only used in error messages.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::validate(raw)
    }

    /// Loads a config file that must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        info!(path = %path.display(), band = %config.desired_band, "configuration loaded");
        Ok(config)
    }

    /// Loads `path`, first writing a file with every default if it does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let defaults = SieveConfig::default();
            fs::write(path, defaults.to_toml_string()).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "created configuration file with default values");
            return Ok(defaults);
        }
        Self::load(path)
    }

    pub fn to_toml_string(&self) -> String {
        let raw = RawConfig {
            system: RawSystem {
                log_level: Some(self.log_level.clone()),
            },
            hsv: RawHsv {
                lower: Some(channels(self.desired_band.lower)),
                upper: Some(channels(self.desired_band.upper)),
            },
            paths: RawPaths {
                video_path: Some(self.paths.video_path.clone()),
                image_path: Some(self.paths.image_path.clone()),
                corpus_dir: Some(self.paths.corpus_dir.clone()),
                filtered_dir: Some(self.paths.filtered_dir.clone()),
                output_dir: Some(self.paths.output_dir.clone()),
                undesired_colors_file: Some(self.paths.undesired_colors_file.clone()),
            },
            video: RawVideo {
                width: Some(self.video_size.0 as i64),
                height: Some(self.video_size.1 as i64),
            },
        };
        // Every field is a plain string, path, or integer, so serialization cannot fail.
        toml::to_string_pretty(&raw).unwrap_or_default()
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = SieveConfig::default();
        let mut problems = Vec::new();

        let log_level = match raw.system.log_level {
            Some(level) if level.trim().is_empty() => {
                problems.push("system.log_level must not be empty".to_string());
                defaults.log_level
            }
            Some(level) => level,
            None => defaults.log_level,
        };

        let lower = parse_color("hsv.lower", raw.hsv.lower, defaults.desired_band.lower, &mut problems);
        let upper = parse_color("hsv.upper", raw.hsv.upper, defaults.desired_band.upper, &mut problems);
        let desired_band = HsvBand::new(lower, upper);

        let width = parse_dimension("video.width", raw.video.width, defaults.video_size.0, &mut problems);
        let height = parse_dimension("video.height", raw.video.height, defaults.video_size.1, &mut problems);

        let fallback = defaults.paths;
        let paths = PathsConfig {
            video_path: raw.paths.video_path.unwrap_or(fallback.video_path),
            image_path: raw.paths.image_path.unwrap_or(fallback.image_path),
            corpus_dir: raw.paths.corpus_dir.unwrap_or(fallback.corpus_dir),
            filtered_dir: raw.paths.filtered_dir.unwrap_or(fallback.filtered_dir),
            output_dir: raw.paths.output_dir.unwrap_or(fallback.output_dir),
            undesired_colors_file: raw.paths.undesired_colors_file.unwrap_or(fallback.undesired_colors_file),
        };

        if !problems.is_empty() {
            return Err(ConfigError::Invalid { problems });
        }

        if desired_band.is_empty() {
            warn!(band = %desired_band, "desired band has lower > upper on some channel and will match nothing");
        }

        Ok(Self {
            log_level,
            desired_band,
            paths,
            video_size: (width, height),
        })
    }
}

fn channels(color: HsvColor) -> Vec<i64> {
    vec![color.h() as i64, color.s() as i64, color.v() as i64]
}

fn parse_color(key: &str, raw: Option<Vec<i64>>, default: HsvColor, problems: &mut Vec<String>) -> HsvColor {
    let Some(values) = raw else {
        return default;
    };
    let [h, s, v] = values.as_slice() else {
        problems.push(format!("{key} must have exactly 3 integers (H,S,V), found {}", values.len()));
        return default;
    };
    HsvColor::try_new(*h, *s, *v).unwrap_or_else(|| {
        problems.push(format!("{key} = {values:?} is outside H 0..=179, S 0..=255, V 0..=255"));
        default
    })
}

fn parse_dimension(key: &str, raw: Option<i64>, default: u32, problems: &mut Vec<String>) -> u32 {
    match raw {
        None => default,
        Some(value) => match u32::try_from(value) {
            Ok(value) if value > 0 => value,
            _ => {
                problems.push(format!("{key} must be a positive integer, found {value}"));
                default
            }
        },
    }
}
