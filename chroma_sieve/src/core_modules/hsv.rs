// THEORY:
// The `hsv` module is the lowest layer of the sieve. It defines the two value types
// every other layer speaks in, `HsvColor` and `HsvBand`, and the single predicate
// the whole system is built on: inclusive, per-channel range membership.
//
// Key architectural principles:
// 1.  **8-bit OpenCV convention**: Hue lives in [0,179] (degrees halved), saturation
//     and value in [0,255]. Every color that enters the system, whether decoded from
//     an image, parsed from a text file, or read from configuration, is normalized
//     into this domain before it is classified.
// 2.  **Linear hue**: Hue is treated as an ordinary bounded axis. A band whose lower
//     hue exceeds its upper hue matches nothing; there is no wraparound at 0/179.
// 3.  **Points become cubes**: Undesired colors are stored as single points and only
//     widened into a band (`HsvBand::around`) at classification time, clamped to the
//     channel domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest legal hue in the 8-bit convention.
pub const H_MAX: u8 = 179;
/// Largest legal saturation or value.
pub const SV_MAX: u8 = 255;
/// Half-width of the exclusion cube built around each undesired color.
pub const UNDESIRED_TOLERANCE: u8 = 5;
/// Number of distinct colors in the HSV domain (180 * 256 * 256).
pub const HSV_DOMAIN_SIZE: usize = (H_MAX as usize + 1) * 256 * 256;

/// Fixed-point precision of the OpenCV 8-bit conversion tables.
const HSV_SHIFT: u32 = 12;

/// `round((255 << 12) / v)`; integer form has no ties for `v <= 255`.
const SDIV_TABLE: [i32; 256] = {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        let n = 255 << HSV_SHIFT;
        table[i] = (2 * n + i as i32) / (2 * i as i32);
        i += 1;
    }
    table
};

/// `round((180 << 12) / (6 * d))`.
const HDIV_TABLE: [i32; 256] = {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        let n = 180 << HSV_SHIFT;
        table[i] = (2 * n + 6 * i as i32) / (12 * i as i32);
        i += 1;
    }
    table
};

/// A single color in 8-bit HSV space.
///
/// The channels are private so every value stays inside the domain; deserialization
/// goes through the same check as [`HsvColor::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawHsvColor")]
pub struct HsvColor {
    h: u8,
    s: u8,
    v: u8,
}

#[derive(Deserialize)]
struct RawHsvColor {
    h: i64,
    s: i64,
    v: i64,
}

impl TryFrom<RawHsvColor> for HsvColor {
    type Error = String;

    fn try_from(raw: RawHsvColor) -> Result<Self, Self::Error> {
        HsvColor::try_new(raw.h, raw.s, raw.v)
            .ok_or_else(|| format!("HSV color [{},{},{}] is outside [0-179, 0-255, 0-255]", raw.h, raw.s, raw.v))
    }
}

impl HsvColor {
    /// The channel-wise minimum of the domain.
    pub const MIN: HsvColor = HsvColor { h: 0, s: 0, v: 0 };
    /// The channel-wise maximum of the domain.
    pub const MAX: HsvColor = HsvColor { h: H_MAX, s: SV_MAX, v: SV_MAX };

    /// Builds a color, saturating a hue above 179 down to 179.
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        let h = if h > H_MAX { H_MAX } else { h };
        Self { h, s, v }
    }

    /// Strict constructor for untrusted integers; `None` when any channel is out of range.
    pub fn try_new(h: i64, s: i64, v: i64) -> Option<Self> {
        let in_range = |x: i64, max: u8| (0..=max as i64).contains(&x);
        if in_range(h, H_MAX) && in_range(s, SV_MAX) && in_range(v, SV_MAX) {
            Some(Self { h: h as u8, s: s as u8, v: v as u8 })
        } else {
            None
        }
    }

    pub const fn h(&self) -> u8 {
        self.h
    }

    pub const fn s(&self) -> u8 {
        self.s
    }

    pub const fn v(&self) -> u8 {
        self.v
    }

    /// Packs the triple into a single key: `h << 16 | s << 8 | v`.
    ///
    /// Because `s` and `v` each occupy a full byte, the key is also a dense index
    /// into a table of `HSV_DOMAIN_SIZE` entries.
    pub const fn packed(&self) -> u32 {
        ((self.h as u32) << 16) | ((self.s as u32) << 8) | self.v as u32
    }

    /// Inverse of [`HsvColor::packed`]. Keys outside the domain yield `None`.
    pub fn from_packed(key: u32) -> Option<Self> {
        if key as usize >= HSV_DOMAIN_SIZE {
            return None;
        }
        Some(Self {
            h: (key >> 16) as u8,
            s: (key >> 8) as u8,
            v: key as u8,
        })
    }

    /// Converts an 8-bit RGB triple exactly as OpenCV's `BGR2HSV` does for 8-bit
    /// images: integer channel differences scaled through 12-bit fixed-point tables.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);
        let half = 1 << (HSV_SHIFT - 1);

        let s = (diff * SDIV_TABLE[v as usize] + half) >> HSV_SHIFT;

        let h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        // Arithmetic shift floors negative hues, which then wrap by 180.
        let h = (h * HDIV_TABLE[diff as usize] + half) >> HSV_SHIFT;
        let h = if h < 0 { h + H_MAX as i32 + 1 } else { h };

        Self {
            h: h as u8,
            s: s as u8,
            v: v as u8,
        }
    }
}

impl fmt::Display for HsvColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.h, self.s, self.v)
    }
}

/// An axis-aligned, inclusive box in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: HsvColor,
    pub upper: HsvColor,
}

impl HsvBand {
    pub const fn new(lower: HsvColor, upper: HsvColor) -> Self {
        Self { lower, upper }
    }

    /// The exclusion band for a single undesired color: `color ± tolerance`,
    /// clamped to `[HsvColor::MIN, HsvColor::MAX]` on every channel.
    pub fn around(color: HsvColor, tolerance: u8) -> Self {
        let lower = HsvColor {
            h: color.h.saturating_sub(tolerance),
            s: color.s.saturating_sub(tolerance),
            v: color.v.saturating_sub(tolerance),
        };
        let upper = HsvColor {
            h: color.h.saturating_add(tolerance).min(H_MAX),
            s: color.s.saturating_add(tolerance),
            v: color.v.saturating_add(tolerance),
        };
        Self { lower, upper }
    }

    /// [`HsvBand::around`] with the standard five-step tolerance.
    pub fn undesired(color: HsvColor) -> Self {
        Self::around(color, UNDESIRED_TOLERANCE)
    }

    /// Inclusive membership on all three channels.
    #[inline]
    pub fn contains(&self, color: HsvColor) -> bool {
        self.lower.h <= color.h
            && color.h <= self.upper.h
            && self.lower.s <= color.s
            && color.s <= self.upper.s
            && self.lower.v <= color.v
            && color.v <= self.upper.v
    }

    /// True when some channel has `lower > upper`, so nothing can ever match.
    pub fn is_empty(&self) -> bool {
        self.lower.h > self.upper.h || self.lower.s > self.upper.s || self.lower.v > self.upper.v
    }
}

impl fmt::Display for HsvBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}
