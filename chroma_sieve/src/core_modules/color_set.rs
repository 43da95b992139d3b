// THEORY:
// A `ColorSet` records which distinct HSV triples have been seen. The corpus scan
// visits every pixel of every image, so inserts are the hot path and the set can in
// principle grow to the whole HSV domain (about 11.8M colors).
//
// The set is a bit table indexed by the packed key (`h << 16 | s << 8 | v`), which
// is already a dense index into the domain. That gives O(1) inserts with no hashing,
// a hard memory ceiling of ~1.5 MB per set regardless of corpus size, and ascending
// packed-key iteration order. The stable order is what lets a seeded generator pick
// the same subset on every run.

use crate::core_modules::hsv::{HSV_DOMAIN_SIZE, HsvBand, HsvColor};

const WORD_BITS: usize = 64;
const WORDS: usize = HSV_DOMAIN_SIZE.div_ceil(WORD_BITS);

/// A deduplicated set of HSV colors.
#[derive(Clone, PartialEq, Eq)]
pub struct ColorSet {
    words: Vec<u64>,
    len: usize,
}

impl Default for ColorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ColorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorSet").field("len", &self.len).finish()
    }
}

impl ColorSet {
    pub fn new() -> Self {
        Self {
            words: vec![0; WORDS],
            len: 0,
        }
    }

    /// Adds `color`; returns `true` if it was not already present.
    #[inline]
    pub fn insert(&mut self, color: HsvColor) -> bool {
        let key = color.packed() as usize;
        let (word, bit) = (key / WORD_BITS, key % WORD_BITS);
        let mask = 1u64 << bit;
        if self.words[word] & mask != 0 {
            return false;
        }
        self.words[word] |= mask;
        self.len += 1;
        true
    }

    pub fn contains(&self, color: HsvColor) -> bool {
        let key = color.packed() as usize;
        self.words[key / WORD_BITS] & (1u64 << (key % WORD_BITS)) != 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Colors in ascending packed-key order.
    pub fn iter(&self) -> impl Iterator<Item = HsvColor> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                HsvColor::from_packed((index * WORD_BITS + bit) as u32)
            })
        })
    }

    pub fn to_vec(&self) -> Vec<HsvColor> {
        self.iter().collect()
    }
}

impl FromIterator<HsvColor> for ColorSet {
    fn from_iter<I: IntoIterator<Item = HsvColor>>(iter: I) -> Self {
        let mut set = ColorSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<HsvColor> for ColorSet {
    fn extend<I: IntoIterator<Item = HsvColor>>(&mut self, iter: I) {
        for color in iter {
            self.insert(color);
        }
    }
}

/// Distinct colors split by membership in the desired band.
///
/// Each color lands in exactly one of the two sets, since membership is a
/// deterministic predicate of the color alone.
#[derive(Debug, Clone, Default)]
pub struct ColorSetPartition {
    pub desired: ColorSet,
    pub undesired: ColorSet,
}

impl ColorSetPartition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observed color; returns `true` when it lands in `desired`.
    #[inline]
    pub fn observe(&mut self, color: HsvColor, band: &HsvBand) -> bool {
        if band.contains(color) {
            self.desired.insert(color);
            true
        } else {
            self.undesired.insert(color);
            false
        }
    }

    pub fn total_unique(&self) -> usize {
        self.desired.len() + self.undesired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_deduplicate_by_value() {
        let mut set = ColorSet::new();
        assert!(set.insert(HsvColor::new(1, 2, 3)));
        assert!(!set.insert(HsvColor::new(1, 2, 3)));
        assert!(set.insert(HsvColor::new(3, 2, 1)));
        assert_eq!(set.len(), 2);
        assert!(set.contains(HsvColor::new(3, 2, 1)));
        assert!(!set.contains(HsvColor::new(0, 0, 0)));
    }

    #[test]
    fn iteration_is_sorted_by_packed_key_and_covers_domain_edges() {
        let colors = [
            HsvColor::MAX,
            HsvColor::new(0, 0, 63),
            HsvColor::new(0, 0, 64),
            HsvColor::MIN,
            HsvColor::new(90, 1, 0),
        ];
        let set: ColorSet = colors.iter().copied().collect();
        let mut expected = colors.to_vec();
        expected.sort_by_key(HsvColor::packed);
        assert_eq!(set.to_vec(), expected);
    }

    #[test]
    fn partition_places_each_color_exactly_once() {
        let band = HsvBand::new(HsvColor::new(30, 160, 180), HsvColor::new(30, 255, 255));
        let mut partition = ColorSetPartition::new();
        for _ in 0..3 {
            assert!(partition.observe(HsvColor::new(30, 200, 200), &band));
            assert!(!partition.observe(HsvColor::new(60, 200, 200), &band));
        }
        assert_eq!(partition.desired.len(), 1);
        assert_eq!(partition.undesired.len(), 1);
        assert_eq!(partition.total_unique(), 2);
        for color in partition.desired.iter() {
            assert!(!partition.undesired.contains(color));
        }
    }

    #[test]
    fn empty_set() {
        let set = ColorSet::default();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
