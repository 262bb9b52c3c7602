// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inclusive copper-layer intervals.

/// An inclusive interval of copper layers.
///
/// Construction normalises the endpoints so `start() <= end()` always holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerRange {
    start: i32,
    end: i32,
}

impl LayerRange {
    /// Create a range spanning both endpoints, in any order.
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The range covering a single layer.
    pub const fn single(layer: i32) -> Self {
        Self {
            start: layer,
            end: layer,
        }
    }

    /// First layer of the range.
    pub const fn start(&self) -> i32 {
        self.start
    }

    /// Last layer of the range.
    pub const fn end(&self) -> i32 {
        self.end
    }

    /// Whether `layer` lies within the range.
    pub const fn contains(&self, layer: i32) -> bool {
        self.start <= layer && layer <= self.end
    }

    /// Whether the two ranges share at least one layer.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The smallest range covering both inputs.
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalised_and_overlap() {
        let r = LayerRange::new(3, 0);
        assert_eq!((r.start(), r.end()), (0, 3));
        assert!(r.overlaps(&LayerRange::single(3)));
        assert!(!r.overlaps(&LayerRange::new(4, 7)));
    }

    #[test]
    fn merge_extends() {
        let m = LayerRange::single(0).merged(&LayerRange::single(5));
        assert_eq!((m.start(), m.end()), (0, 5));
        assert!(m.contains(2));
    }
}
