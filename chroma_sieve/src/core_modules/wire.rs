//! Plain-text color lists shared between the calibrator (writer) and the
//! tester (reader).
//!
//! A list is one line: a label, `": "`, then every color as `[H,S,V]` followed by
//! `;`. The reader is lenient: a wrong label is a warning, a bad group is skipped,
//! and nothing here ever aborts a run.

use crate::core_modules::hsv::HsvColor;
use crate::core_modules::metrics::simulated_accuracy;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

pub const UNDESIRED_LABEL: &str = "Undesired colors";
pub const DESIRED_LABEL: &str = "Desired colors";

pub const HSV_COLORS_FILE: &str = "hsv_colors_output.txt";
pub const ACCURACY_FILE: &str = "accuracy_output.txt";
pub const REQUIRED_UNDESIRED_FILE: &str = "required_undesired_colors.txt";

/// `"{label}: [h,s,v];[h,s,v];"`. An empty list still ends with a lone `;`.
pub fn format_color_line<I>(label: &str, colors: I) -> String
where
    I: IntoIterator<Item = HsvColor>,
{
    let mut line = format!("{label}: ");
    let mut first = true;
    for color in colors {
        if !first {
            line.push(';');
        }
        first = false;
        let _ = write!(line, "{color}");
    }
    line.push(';');
    line
}

/// Result of parsing one color line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedColors {
    pub colors: Vec<HsvColor>,
    /// Non-empty groups that could not be read as three in-domain integers.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line does not begin with the expected label.
    MissingPrefix,
}

/// Parses a line written by [`format_color_line`] with `label`.
pub fn parse_color_line(line: &str, label: &str) -> Result<ParsedColors, LineError> {
    let body = line
        .trim_end_matches(['\r', '\n'])
        .strip_prefix(label)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or(LineError::MissingPrefix)?;

    let mut parsed = ParsedColors::default();
    for group in body.trim().split(';') {
        let group = group.trim();
        if group.is_empty() {
            continue;
        }
        match parse_group(group) {
            Some(color) => parsed.colors.push(color),
            None => {
                debug!(group, "skipping malformed color group");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

pub fn parse_undesired_line(line: &str) -> Result<ParsedColors, LineError> {
    parse_color_line(line, UNDESIRED_LABEL)
}

fn parse_group(group: &str) -> Option<HsvColor> {
    let inner = group.trim_start_matches('[').trim_end_matches(']');
    let mut values = inner.split(',').map(|v| v.trim().parse::<i64>());
    let (h, s, v) = match (values.next(), values.next(), values.next(), values.next()) {
        (Some(Ok(h)), Some(Ok(s)), Some(Ok(v)), None) => (h, s, v),
        _ => return None,
    };
    HsvColor::try_new(h, s, v)
}

/// Reads the undesired-color list the tester consumes.
///
/// Every failure is recoverable: a missing or unreadable file, or a first line with
/// the wrong label, logs a warning and yields an empty list.
pub fn load_undesired_colors(path: &Path) -> Vec<HsvColor> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "undesired color file not found, continuing without exclusions");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read undesired color file, continuing without exclusions");
            return Vec::new();
        }
    };

    let first_line = content.lines().next().unwrap_or_default();
    match parse_undesired_line(first_line) {
        Ok(parsed) => {
            if parsed.skipped > 0 {
                warn!(path = %path.display(), skipped = parsed.skipped, "skipped malformed undesired color groups");
            }
            if parsed.colors.is_empty() {
                warn!(path = %path.display(), "undesired color file lists no colors");
            }
            parsed.colors
        }
        Err(LineError::MissingPrefix) => {
            warn!(
                path = %path.display(),
                expected = UNDESIRED_LABEL,
                "undesired color file has an unexpected format, continuing without exclusions"
            );
            Vec::new()
        }
    }
}

/// Body of `required_undesired_colors.txt`.
pub fn required_undesired_file<I>(colors: I) -> String
where
    I: IntoIterator<Item = HsvColor>,
{
    let mut out = format_color_line(UNDESIRED_LABEL, colors);
    out.push('\n');
    out
}

/// Body of `hsv_colors_output.txt`: undesired list, desired list, total unique count.
pub fn hsv_colors_file<U, D>(undesired: U, desired: D, total_unique: usize) -> String
where
    U: IntoIterator<Item = HsvColor>,
    D: IntoIterator<Item = HsvColor>,
{
    format!(
        "{}\n{}\nTotal unique colors: {total_unique}\n",
        format_color_line(UNDESIRED_LABEL, undesired),
        format_color_line(DESIRED_LABEL, desired),
    )
}

/// Body of `accuracy_output.txt`.
pub fn accuracy_file(desired_unique: usize, undesired_unique: usize, target_accuracy: u8, required_undesired: f64) -> String {
    let total = desired_unique + undesired_unique;
    format!(
        "Simulated accuracy: {:.2}%\n\
         Total colors: {total}\n\
         Desired colors: {desired_unique}\n\
         Undesired colors: {undesired_unique}\n\
         Undesired colors to avoid for target accuracy ({target_accuracy}%): {required_undesired:.2}\n",
        simulated_accuracy(desired_unique, undesired_unique),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn colors(raw: &[(u8, u8, u8)]) -> Vec<HsvColor> {
        raw.iter().map(|&(h, s, v)| HsvColor::new(h, s, v)).collect()
    }

    #[test]
    fn writes_the_documented_line_shape() {
        let line = format_color_line(UNDESIRED_LABEL, colors(&[(1, 2, 3), (179, 255, 0)]));
        assert_eq!(line, "Undesired colors: [1,2,3];[179,255,0];");
    }

    #[test]
    fn empty_list_is_a_lone_semicolon() {
        let line = format_color_line(UNDESIRED_LABEL, Vec::new());
        assert_eq!(line, "Undesired colors: ;");
        assert_eq!(parse_undesired_line(&line).unwrap(), ParsedColors::default());
    }

    #[test]
    fn written_lines_parse_back_to_the_same_set() {
        let original = colors(&[(0, 0, 0), (30, 200, 200), (60, 200, 200), (179, 255, 255)]);
        let parsed = parse_undesired_line(&required_undesired_file(original.clone())).unwrap();
        assert_eq!(parsed.skipped, 0);
        let a: HashSet<_> = original.into_iter().collect();
        let b: HashSet<_> = parsed.colors.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_groups_are_skipped_individually() {
        let line = "Undesired colors: [1,2,3];[4,5];[x,1,1];[180,0,0];[7,8,9,10];[ 10 , 20 , 30 ];";
        let parsed = parse_undesired_line(line).unwrap();
        assert_eq!(parsed.colors, colors(&[(1, 2, 3), (10, 20, 30)]));
        assert_eq!(parsed.skipped, 4);
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        assert_eq!(parse_undesired_line("Desired colors: [1,2,3];"), Err(LineError::MissingPrefix));
        assert_eq!(parse_undesired_line(""), Err(LineError::MissingPrefix));
        assert!(parse_color_line("Desired colors: [1,2,3];", DESIRED_LABEL).is_ok());
    }

    #[test]
    fn loader_degrades_to_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_undesired_colors(&dir.path().join("missing.txt")).is_empty());

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "Something else: [1,2,3];\n").unwrap();
        assert!(load_undesired_colors(&bad).is_empty());

        let good = dir.path().join("good.txt");
        std::fs::write(&good, "Undesired colors: [1,2,3];[oops];\n").unwrap();
        assert_eq!(load_undesired_colors(&good), colors(&[(1, 2, 3)]));
    }

    #[test]
    fn report_files_have_the_expected_lines() {
        let hsv = hsv_colors_file(colors(&[(1, 1, 1)]), colors(&[(30, 200, 200)]), 2);
        assert_eq!(
            hsv,
            "Undesired colors: [1,1,1];\nDesired colors: [30,200,200];\nTotal unique colors: 2\n"
        );

        let acc = accuracy_file(3, 1, 80, 0.8);
        let lines: Vec<&str> = acc.lines().collect();
        assert_eq!(lines[0], "Simulated accuracy: 75.00%");
        assert_eq!(lines[1], "Total colors: 4");
        assert_eq!(lines[4], "Undesired colors to avoid for target accuracy (80%): 0.80");
    }
}
