//! # Evolution Calculator
//!
//! Month-over-month change of a KPI and its trend classification.
//!
//! Two input shapes exist for the same KPI and they are not interchangeable:
//!
//! - [`evolution_from_absolutes`]: `previous` is the prior absolute value.
//! - [`evolution_from_percentage`]: the second number is already a
//!   percentage of change; the prior value is back-computed from it.
//!
//! ## Trend buckets
//!
//! The primary classifier ([`classify_trend5`]) is deliberately asymmetric:
//!
//! | Signed change | Bucket |
//! |---------------|--------|
//! | `> 10` | positive |
//! | `(0, 10]` | positive_moderate |
//! | `[-10, 0]` | stable |
//! | `(-20, -10)` | negative_moderate |
//! | `≤ -20` | negative |
//!
//! Template selection depends on the exact bucket, so these boundaries must
//! not move. [`classify_trend3`] is the simpler up/down/stable split at ±10 %.

use serde::{Deserialize, Serialize};

/// Five-bucket trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    PositiveModerate,
    Stable,
    NegativeModerate,
    Negative,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Positive,
        Direction::PositiveModerate,
        Direction::Stable,
        Direction::NegativeModerate,
        Direction::Negative,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::PositiveModerate => "positive_moderate",
            Direction::Stable => "stable",
            Direction::NegativeModerate => "negative_moderate",
            Direction::Negative => "negative",
        }
    }

    /// Accepted JSON keys for this bucket in stored templates.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Direction::Positive => &["positive"],
            Direction::PositiveModerate => &["positive_moderate", "positiveModerate"],
            Direction::Stable => &["stable"],
            Direction::NegativeModerate => &["negative_moderate", "negativeModerate"],
            Direction::Negative => &["negative"],
        }
    }

    /// The bucket to try when this one has no template. `Stable` is terminal.
    pub fn fallback(self) -> Option<Direction> {
        match self {
            Direction::Positive => Some(Direction::PositiveModerate),
            Direction::PositiveModerate => Some(Direction::Stable),
            Direction::Stable => None,
            Direction::NegativeModerate => Some(Direction::Stable),
            Direction::Negative => Some(Direction::NegativeModerate),
        }
    }

    /// Whether the trend is good news (for binary phrasing).
    pub fn is_favorable(self) -> bool {
        matches!(
            self,
            Direction::Positive | Direction::PositiveModerate | Direction::Stable
        )
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Three-bucket trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend3 {
    Up,
    Stable,
    Down,
}

/// Result of comparing a current value to a previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    /// `current - previous` (or `current` when previous is zero).
    pub difference: f64,
    /// Absolute percentage of change.
    pub percentage: f64,
    /// Signed percentage of change, used for classification.
    pub signed_percentage: f64,
    pub direction: Direction,
}

/// Classify a signed percentage of change into five buckets.
pub fn classify_trend5(raw: f64) -> Direction {
    if raw > 10.0 {
        Direction::Positive
    } else if raw > 0.0 {
        Direction::PositiveModerate
    } else if raw >= -10.0 {
        Direction::Stable
    } else if raw > -20.0 {
        Direction::NegativeModerate
    } else {
        Direction::Negative
    }
}

/// Classify a signed percentage of change into up / stable / down at ±10 %.
pub fn classify_trend3(raw: f64) -> Trend3 {
    if raw > 10.0 {
        Trend3::Up
    } else if raw < -10.0 {
        Trend3::Down
    } else {
        Trend3::Stable
    }
}

/// Compare a current value with the previous absolute value.
pub fn compute_evolution(current: f64, previous: f64) -> Evolution {
    if previous == 0.0 {
        let percentage = if current > 0.0 { 100.0 } else { 0.0 };
        return Evolution {
            difference: current,
            percentage,
            signed_percentage: percentage,
            direction: if current > 0.0 {
                Direction::Positive
            } else {
                Direction::Stable
            },
        };
    }

    let difference = current - previous;
    let raw = difference / previous * 100.0;
    Evolution {
        difference,
        percentage: raw.abs(),
        signed_percentage: raw,
        direction: classify_trend5(raw),
    }
}

/// Explicit name for [`compute_evolution`]: `previous` is an absolute value.
pub fn evolution_from_absolutes(current: f64, previous: f64) -> Evolution {
    compute_evolution(current, previous)
}

/// Prior absolute value implied by `current` and a percentage of change,
/// rounded to a whole count. A −100 % change has no finite prior value and
/// yields 0.
pub fn previous_from_percentage(current: f64, percentage: f64) -> f64 {
    let factor = 1.0 + percentage / 100.0;
    if factor.abs() < f64::EPSILON {
        return 0.0;
    }
    (current / factor).round()
}

/// Evolution when the second value is already a percentage of change.
///
/// The bucket comes from the given percentage itself, not from the rounded
/// back-computed prior value.
pub fn evolution_from_percentage(current: f64, percentage: f64) -> Evolution {
    let previous = previous_from_percentage(current, percentage);
    Evolution {
        difference: current - previous,
        percentage: percentage.abs(),
        signed_percentage: percentage,
        direction: classify_trend5(percentage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direction(current: f64, previous: f64) -> Direction {
        compute_evolution(current, previous).direction
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(direction(110.0, 100.0), Direction::PositiveModerate);
        assert_eq!(direction(111.0, 100.0), Direction::Positive);
        assert_eq!(direction(100.0, 100.0), Direction::Stable);
        assert_eq!(direction(90.0, 100.0), Direction::Stable);
        assert_eq!(direction(89.0, 100.0), Direction::NegativeModerate);
        assert_eq!(direction(81.0, 100.0), Direction::NegativeModerate);
        assert_eq!(direction(80.0, 100.0), Direction::Negative);
        assert_eq!(direction(10.0, 100.0), Direction::Negative);
    }

    #[test]
    fn test_previous_zero() {
        let e = compute_evolution(5.0, 0.0);
        assert_eq!(e.difference, 5.0);
        assert_eq!(e.percentage, 100.0);
        assert_eq!(e.direction, Direction::Positive);

        let e = compute_evolution(0.0, 0.0);
        assert_eq!(e.difference, 0.0);
        assert_eq!(e.percentage, 0.0);
        assert_eq!(e.direction, Direction::Stable);
    }

    #[test]
    fn test_percentage_is_absolute_and_signed_kept() {
        let e = compute_evolution(75.0, 100.0);
        assert_eq!(e.difference, -25.0);
        assert_eq!(e.percentage, 25.0);
        assert_eq!(e.signed_percentage, -25.0);
        assert_eq!(e.direction, Direction::Negative);
    }

    #[test]
    fn test_negative_previous_uses_signed_ratio() {
        // -50 → -40: difference +10, ratio 10 / -50 = -20 %
        let e = compute_evolution(-40.0, -50.0);
        assert_eq!(e.difference, 10.0);
        assert_eq!(e.direction, Direction::Negative);
    }

    #[test]
    fn test_classify_trend3() {
        assert_eq!(classify_trend3(10.0), Trend3::Stable);
        assert_eq!(classify_trend3(10.5), Trend3::Up);
        assert_eq!(classify_trend3(-10.0), Trend3::Stable);
        assert_eq!(classify_trend3(-10.5), Trend3::Down);
    }

    #[test]
    fn test_from_percentage_back_computes_previous() {
        assert_eq!(previous_from_percentage(120.0, 20.0), 100.0);
        assert_eq!(previous_from_percentage(50.0, -50.0), 100.0);
        assert_eq!(previous_from_percentage(0.0, -100.0), 0.0);

        let e = evolution_from_percentage(120.0, 20.0);
        assert_eq!(e.difference, 20.0);
        assert_eq!(e.percentage, 20.0);
        assert_eq!(e.direction, Direction::Positive);
    }

    #[test]
    fn test_from_percentage_differs_from_absolutes() {
        // Same numbers, different meaning.
        let abs = evolution_from_absolutes(120.0, 20.0);
        let pct = evolution_from_percentage(120.0, 20.0);
        assert_eq!(abs.difference, 100.0);
        assert_eq!(pct.difference, 20.0);
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(Direction::Positive.fallback(), Some(Direction::PositiveModerate));
        assert_eq!(Direction::PositiveModerate.fallback(), Some(Direction::Stable));
        assert_eq!(Direction::Negative.fallback(), Some(Direction::NegativeModerate));
        assert_eq!(Direction::NegativeModerate.fallback(), Some(Direction::Stable));
        assert_eq!(Direction::Stable.fallback(), None);
    }
}
