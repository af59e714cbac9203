//! Actor labels and initial population rolls.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of occupant. `Main` is the majority population; `Target` is the
/// minority that zones may close their doors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Main,
    Target,
}

impl Label {
    pub fn name(&self) -> &'static str {
        match self {
            Label::Main => "main",
            Label::Target => "target",
        }
    }
}

/// Spawn ratios. Each cell rolls once: below `empty_ratio` stays empty,
/// the next `main_ratio` spawns a Main actor, the remainder spawns Target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub empty_ratio: f32,
    pub main_ratio: f32,
    /// Bias range for Main actors; Target actors carry no bias.
    pub bias_min: f32,
    pub bias_max: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            empty_ratio: 0.60,
            main_ratio: 0.30,
            bias_min: 0.0,
            bias_max: 1.0,
        }
    }
}

impl PopulationConfig {
    pub fn target_ratio(&self) -> f32 {
        (1.0 - self.empty_ratio - self.main_ratio).max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        self.empty_ratio >= 0.0
            && self.main_ratio >= 0.0
            && self.empty_ratio + self.main_ratio <= 1.0
            && (0.0..=1.0).contains(&self.bias_min)
            && (0.0..=1.0).contains(&self.bias_max)
            && self.bias_min <= self.bias_max
    }

    /// Roll one cell. `None` means the cell stays empty.
    pub fn roll(&self, rng: &mut impl Rng) -> Option<Label> {
        let r: f32 = rng.gen();
        if r < self.empty_ratio {
            None
        } else if r < self.empty_ratio + self.main_ratio {
            Some(Label::Main)
        } else {
            Some(Label::Target)
        }
    }

    pub fn draw_bias(&self, label: Label, rng: &mut impl Rng) -> f32 {
        match label {
            Label::Target => 0.0,
            Label::Main if self.bias_max > self.bias_min => {
                rng.gen_range(self.bias_min..=self.bias_max)
            }
            Label::Main => self.bias_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roll_respects_ratios() {
        let config = PopulationConfig {
            empty_ratio: 0.5,
            main_ratio: 0.25,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let (mut empty, mut main, mut target) = (0, 0, 0);
        for _ in 0..10_000 {
            match config.roll(&mut rng) {
                None => empty += 1,
                Some(Label::Main) => main += 1,
                Some(Label::Target) => target += 1,
            }
        }
        assert!((4_700..5_300).contains(&empty), "empty = {}", empty);
        assert!((2_200..2_800).contains(&main), "main = {}", main);
        assert!((2_200..2_800).contains(&target), "target = {}", target);
    }

    #[test]
    fn test_full_ratio_spawns_nothing() {
        let config = PopulationConfig {
            empty_ratio: 1.0,
            main_ratio: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| config.roll(&mut rng).is_none()));
    }

    #[test]
    fn test_target_has_no_bias() {
        let config = PopulationConfig {
            bias_min: 0.4,
            bias_max: 0.9,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(config.draw_bias(Label::Target, &mut rng), 0.0);
        for _ in 0..100 {
            let bias = config.draw_bias(Label::Main, &mut rng);
            assert!((0.4..=0.9).contains(&bias));
        }
    }

    #[test]
    fn test_overfull_ratios_are_invalid() {
        let config = PopulationConfig {
            empty_ratio: 0.8,
            main_ratio: 0.3,
            ..Default::default()
        };
        assert!(!config.is_valid());
        assert!(PopulationConfig::default().is_valid());
    }
}
