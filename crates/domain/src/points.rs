//! Threshold point tables
//!
//! A table maps a nutrient amount to integer points. Amounts below the first
//! threshold score 0, so every table covers the whole real line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of a band boundary an amount equal to the threshold falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Bands are `[lo, hi)`: reaching a threshold earns its points
    LowerInclusive,
    /// Bands are `(lo, hi]`: an amount must exceed a threshold to earn its points
    UpperInclusive,
}

/// One band step: amounts past `threshold` earn `points`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub threshold: f64,
    pub points: u8,
}

/// Errors from building a point table
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Point table has no steps")]
    Empty,
    #[error("Threshold {0} is not finite")]
    NonFinite(f64),
    #[error("Thresholds must strictly ascend: {previous} then {next}")]
    NotAscending { previous: f64, next: f64 },
    #[error("Points must not decrease: {previous} then {next}")]
    PointsDecrease { previous: u8, next: u8 },
}

/// Ordered threshold table for a single nutrient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    boundary: Boundary,
    steps: Vec<Step>,
    /// Decimal places the amount is rounded to before comparison
    precision: Option<u32>,
}

impl PointTable {
    /// Build a validated table
    pub fn new(boundary: Boundary, steps: Vec<Step>) -> Result<Self, TableError> {
        let table = Self {
            boundary,
            steps,
            precision: None,
        };
        table.validate()?;
        Ok(table)
    }

    /// Table from `(threshold, points)` literals; checked by [`PointTable::validate`]
    pub(crate) fn from_pairs(boundary: Boundary, pairs: &[(f64, u8)]) -> Self {
        Self {
            boundary,
            steps: pairs
                .iter()
                .map(|&(threshold, points)| Step { threshold, points })
                .collect(),
            precision: None,
        }
    }

    /// Round amounts to `decimals` places before comparing
    pub fn with_precision(mut self, decimals: u32) -> Self {
        self.precision = Some(decimals);
        self
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Highest value this table can return
    pub fn max_points(&self) -> u8 {
        self.steps.last().map(|s| s.points).unwrap_or(0)
    }

    /// Check ordering invariants
    pub fn validate(&self) -> Result<(), TableError> {
        if self.steps.is_empty() {
            return Err(TableError::Empty);
        }

        for step in &self.steps {
            if !step.threshold.is_finite() {
                return Err(TableError::NonFinite(step.threshold));
            }
        }

        for pair in self.steps.windows(2) {
            let [previous, next] = pair else { continue };
            if next.threshold <= previous.threshold {
                return Err(TableError::NotAscending {
                    previous: previous.threshold,
                    next: next.threshold,
                });
            }
            if next.points < previous.points {
                return Err(TableError::PointsDecrease {
                    previous: previous.points,
                    next: next.points,
                });
            }
        }

        Ok(())
    }

    /// Points for an amount; absent amounts count as 0
    pub fn points_for(&self, amount: Option<f64>) -> u8 {
        let amount = self.normalize(amount.unwrap_or(0.0));

        self.steps
            .iter()
            .take_while(|step| match self.boundary {
                Boundary::LowerInclusive => amount >= step.threshold,
                Boundary::UpperInclusive => amount > step.threshold,
            })
            .last()
            .map(|step| step.points)
            .unwrap_or(0)
    }

    fn normalize(&self, amount: f64) -> f64 {
        match self.precision {
            Some(decimals) => {
                let factor = 10f64.powi(decimals as i32);
                (amount * factor).round() / factor
            }
            None => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower() -> PointTable {
        PointTable::from_pairs(Boundary::LowerInclusive, &[(1.0, 1), (2.0, 2), (3.0, 5)])
    }

    fn upper() -> PointTable {
        PointTable::from_pairs(Boundary::UpperInclusive, &[(1.0, 1), (2.0, 2), (3.0, 5)])
    }

    #[test]
    fn test_below_first_threshold_scores_zero() {
        assert_eq!(lower().points_for(Some(0.5)), 0);
        assert_eq!(lower().points_for(Some(-100.0)), 0);
    }

    #[test]
    fn test_absent_amount_counts_as_zero() {
        assert_eq!(lower().points_for(None), 0);
    }

    #[test]
    fn test_lower_inclusive_boundary() {
        assert_eq!(lower().points_for(Some(1.0)), 1);
        assert_eq!(lower().points_for(Some(1.999)), 1);
        assert_eq!(lower().points_for(Some(2.0)), 2);
        assert_eq!(lower().points_for(Some(3.0)), 5);
    }

    #[test]
    fn test_upper_inclusive_boundary() {
        assert_eq!(upper().points_for(Some(1.0)), 0);
        assert_eq!(upper().points_for(Some(1.001)), 1);
        assert_eq!(upper().points_for(Some(2.0)), 1);
        assert_eq!(upper().points_for(Some(3.0)), 2);
        assert_eq!(upper().points_for(Some(3.5)), 5);
    }

    #[test]
    fn test_caps_at_last_step() {
        assert_eq!(lower().points_for(Some(1_000_000.0)), 5);
        assert_eq!(lower().max_points(), 5);
    }

    #[test]
    fn test_precision_rounds_before_comparison() {
        let table = PointTable::from_pairs(Boundary::LowerInclusive, &[(8.0, 5)]);
        assert_eq!(table.points_for(Some(7.96)), 0);

        let rounded = table.with_precision(1);
        assert_eq!(rounded.points_for(Some(7.96)), 5);
        assert_eq!(rounded.points_for(Some(7.94)), 0);
    }

    #[test]
    fn test_new_rejects_bad_tables() {
        assert_eq!(
            PointTable::new(Boundary::LowerInclusive, vec![]),
            Err(TableError::Empty)
        );

        let descending = vec![
            Step { threshold: 2.0, points: 1 },
            Step { threshold: 1.0, points: 2 },
        ];
        assert!(matches!(
            PointTable::new(Boundary::LowerInclusive, descending),
            Err(TableError::NotAscending { .. })
        ));

        let decreasing = vec![
            Step { threshold: 1.0, points: 2 },
            Step { threshold: 2.0, points: 1 },
        ];
        assert!(matches!(
            PointTable::new(Boundary::LowerInclusive, decreasing),
            Err(TableError::PointsDecrease { .. })
        ));

        let nan = vec![Step { threshold: f64::NAN, points: 1 }];
        assert!(matches!(
            PointTable::new(Boundary::LowerInclusive, nan),
            Err(TableError::NonFinite(_))
        ));
    }
}
