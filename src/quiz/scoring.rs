use crate::config::config::QuizConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub base_points: u32,
    pub max_bonus: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_points: 200,
            max_bonus: 200,
        }
    }
}

impl From<&QuizConfig> for ScoringRules {
    fn from(config: &QuizConfig) -> Self {
        Self {
            base_points: config.base_points,
            max_bonus: config.max_bonus,
        }
    }
}

impl ScoringRules {
    /// Expects `time_remaining` already clamped to `[0, total_time]`.
    pub fn score(&self, correct: bool, time_remaining: f64, total_time: u32) -> u32 {
        if !correct {
            return 0;
        }

        if total_time == 0 {
            return self.base_points;
        }

        let bonus = (self.max_bonus as f64 * time_remaining / total_time as f64).floor();
        self.base_points + bonus as u32
    }
}

/// Clamps a client reported time into `[0, total_time]`.
pub fn clamp_time(time_remaining: f64, total_time: u32) -> f64 {
    if time_remaining.is_nan() {
        return 0.0;
    }

    time_remaining.clamp(0.0, total_time as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_answers_score_nothing() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score(false, 15.0, 15), 0);
        assert_eq!(rules.score(false, 0.0, 15), 0);
        assert_eq!(rules.score(false, 7.5, 60), 0);
    }

    #[test]
    fn correct_answers_get_base_plus_floored_bonus() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score(true, 10.0, 15), 333);
        assert_eq!(rules.score(true, 15.0, 15), 400);
        assert_eq!(rules.score(true, 0.0, 15), 200);
        assert_eq!(rules.score(true, 1.0, 3), 266);
    }

    #[test]
    fn zero_total_time_only_awards_base() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score(true, 0.0, 0), 200);
    }

    #[test]
    fn custom_rules_are_respected() {
        let rules = ScoringRules {
            base_points: 100,
            max_bonus: 50,
        };
        assert_eq!(rules.score(true, 5.0, 10), 125);
    }

    #[test]
    fn clamp_time_bounds_input() {
        assert_eq!(clamp_time(999.0, 15), 15.0);
        assert_eq!(clamp_time(-3.0, 15), 0.0);
        assert_eq!(clamp_time(f64::NAN, 15), 0.0);
        assert_eq!(clamp_time(7.25, 15), 7.25);
    }
}
