//! Satisfaction evaluation - how content an occupant is with its neighbors.
//!
//! The evaluator counts same-kind neighbors among the occupied cells of the
//! Moore neighborhood and classifies the resulting ratio against a band:
//! inside `[lower, upper]` is Satisfied, anything outside (too few OR too
//! many similar neighbors) is Unsatisfied. A classic single threshold `t` is
//! the band `[t, 1.0]`.
//!
//! An occupant with no occupied neighbors has no ratio at all; the
//! [`ZeroNeighborPolicy`] decides what that means.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SatisfactionState {
    Satisfied,
    Unsatisfied,
    #[default]
    Neutral,
}

impl SatisfactionState {
    /// Whether the occupant is content enough to stay put.
    pub fn is_content(&self) -> bool {
        !matches!(self, SatisfactionState::Unsatisfied)
    }
}

/// Classification for an occupant with zero occupied neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroNeighborPolicy {
    Satisfied,
    #[default]
    Neutral,
}

/// Inclusive acceptance band for the same-kind ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionBand {
    pub lower: f32,
    pub upper: f32,
}

impl SatisfactionBand {
    pub fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Single lower threshold: satisfied whenever `ratio >= threshold`.
    pub fn at_least(threshold: f32) -> Self {
        Self::new(threshold, 1.0)
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.lower)
            && (0.0..=1.0).contains(&self.upper)
            && self.lower <= self.upper
    }

    pub fn contains(&self, ratio: f32) -> bool {
        ratio >= self.lower && ratio <= self.upper
    }

    pub fn classify(&self, ratio: f32) -> SatisfactionState {
        if self.contains(ratio) {
            SatisfactionState::Satisfied
        } else {
            SatisfactionState::Unsatisfied
        }
    }
}

impl Default for SatisfactionBand {
    fn default() -> Self {
        Self::new(0.33, 0.9)
    }
}

/// Count of occupied neighbors and how many share the occupant's kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborTally {
    pub same: u32,
    pub occupied: u32,
}

impl NeighborTally {
    /// Tally neighbors; `None` entries are empty cells and are skipped.
    pub fn count<T, I>(own: &T, neighbors: I) -> Self
    where
        T: PartialEq,
        I: IntoIterator<Item = Option<T>>,
    {
        let mut tally = Self::default();
        for neighbor in neighbors.into_iter().flatten() {
            tally.occupied += 1;
            if neighbor == *own {
                tally.same += 1;
            }
        }
        tally
    }

    pub fn ratio(&self) -> Option<f32> {
        (self.occupied > 0).then(|| self.same as f32 / self.occupied as f32)
    }
}

/// A band plus the zero-neighbor policy: everything needed to classify.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SatisfactionRule {
    pub band: SatisfactionBand,
    pub zero_neighbors: ZeroNeighborPolicy,
}

impl SatisfactionRule {
    pub fn new(band: SatisfactionBand, zero_neighbors: ZeroNeighborPolicy) -> Self {
        Self {
            band,
            zero_neighbors,
        }
    }

    pub fn evaluate(&self, tally: NeighborTally) -> SatisfactionState {
        match tally.ratio() {
            Some(ratio) => self.band.classify(ratio),
            None => match self.zero_neighbors {
                ZeroNeighborPolicy::Satisfied => SatisfactionState::Satisfied,
                ZeroNeighborPolicy::Neutral => SatisfactionState::Neutral,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_classification() {
        let band = SatisfactionBand::new(0.2, 0.8);
        assert_eq!(band.classify(0.1), SatisfactionState::Unsatisfied);
        assert_eq!(band.classify(0.5), SatisfactionState::Satisfied);
        assert_eq!(band.classify(0.9), SatisfactionState::Unsatisfied);
        // Edges are inclusive.
        assert_eq!(band.classify(0.2), SatisfactionState::Satisfied);
        assert_eq!(band.classify(0.8), SatisfactionState::Satisfied);
    }

    #[test]
    fn test_single_threshold_is_open_band() {
        let band = SatisfactionBand::at_least(0.5);
        assert_eq!(band.classify(0.49), SatisfactionState::Unsatisfied);
        assert_eq!(band.classify(1.0), SatisfactionState::Satisfied);
    }

    #[test]
    fn test_tally_skips_empty_cells() {
        let neighbors = vec![Some('a'), None, Some('b'), Some('a'), None];
        let tally = NeighborTally::count(&'a', neighbors);
        assert_eq!(tally, NeighborTally { same: 2, occupied: 3 });
        assert!((tally.ratio().unwrap() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_neighbor_policy_is_stable() {
        let isolated = NeighborTally::count(&1u8, vec![None, None, None]);
        assert_eq!(isolated.ratio(), None);

        let neutral = SatisfactionRule::new(SatisfactionBand::default(), ZeroNeighborPolicy::Neutral);
        let content = SatisfactionRule::new(SatisfactionBand::default(), ZeroNeighborPolicy::Satisfied);
        for _ in 0..5 {
            assert_eq!(neutral.evaluate(isolated), SatisfactionState::Neutral);
            assert_eq!(content.evaluate(isolated), SatisfactionState::Satisfied);
        }
    }

    #[test]
    fn test_band_validity() {
        assert!(SatisfactionBand::new(0.2, 0.8).is_valid());
        assert!(!SatisfactionBand::new(0.8, 0.2).is_valid());
        assert!(!SatisfactionBand::new(-0.1, 0.5).is_valid());
    }

    #[test]
    fn test_neutral_counts_as_content() {
        assert!(SatisfactionState::Neutral.is_content());
        assert!(SatisfactionState::Satisfied.is_content());
        assert!(!SatisfactionState::Unsatisfied.is_content());
    }
}
