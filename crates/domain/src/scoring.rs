//! Score aggregation: nutrient profile + category flags -> grade

use serde::Serialize;
use thiserror::Error;

use crate::model::{CategoryFlags, Grade, NullReason, NutrientProfile, PointBreakdown};
use crate::revision::{CategoryPolicy, Revision};

/// Why a product is outside the grading scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    Alcoholic,
    MissingEnergy,
    Cheese,
    Beverage,
    FatsOilsNutsOrSeeds,
}

impl Exclusion {
    /// Reason tag stored alongside a cached `None`
    pub fn null_reason(&self) -> NullReason {
        match self {
            Exclusion::MissingEnergy => NullReason::DataUnavailable,
            _ => NullReason::NotApplicable,
        }
    }
}

/// Final-score formula that produced a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// A-points minus all C-points
    Cheese,
    /// A-points minus the larger of protein and fiber + fruit/veg
    FatsOilsNutsOrSeeds,
    /// A-points minus all C-points
    Beverage,
    /// A-points minus fiber and fruit/veg only
    GeneralWithoutProtein,
    /// A-points minus all C-points
    General,
}

/// A produced grade with the numbers behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Graded {
    pub grade: Grade,
    pub final_score: i32,
    pub breakdown: PointBreakdown,
    pub formula: Formula,
}

/// Outcome of scoring one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assessment {
    Graded(Graded),
    NotApplicable { exclusion: Exclusion },
}

impl Assessment {
    pub fn grade(&self) -> Option<Grade> {
        match self {
            Assessment::Graded(graded) => Some(graded.grade),
            Assessment::NotApplicable { .. } => None,
        }
    }

    /// Reason tag when no grade was produced
    pub fn null_reason(&self) -> Option<NullReason> {
        match self {
            Assessment::Graded(_) => None,
            Assessment::NotApplicable { exclusion } => Some(exclusion.null_reason()),
        }
    }
}

/// Errors from scoring malformed input
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Nutrient {field} is not a finite number: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Grade a product under the given revision
pub fn score(
    profile: &NutrientProfile,
    flags: &CategoryFlags,
    revision: &Revision,
) -> Result<Assessment, ScoreError> {
    if let Some((field, value)) = profile.amounts().find(|(_, v)| !v.is_finite()) {
        return Err(ScoreError::NonFinite { field, value });
    }

    if let Some(exclusion) = exclusion(profile, flags, revision) {
        return Ok(Assessment::NotApplicable { exclusion });
    }

    let dedicated_fats =
        flags.is_fats_oils_nuts_or_seeds && revision.fats_policy == CategoryPolicy::Dedicated;

    let negative = if dedicated_fats {
        &revision.fats
    } else {
        &revision.solid
    };
    let [energy_points, sugar_points, saturates_points, salt_points] = negative.points(profile);

    let mut protein_points = revision.positive.proteins.points_for(profile.proteins);
    if flags.is_red_meat {
        if let Some(cap) = revision.red_meat_protein_cap {
            protein_points = protein_points.min(cap);
        }
    }

    let breakdown = PointBreakdown {
        energy_points,
        sugar_points,
        saturates_points,
        salt_points,
        protein_points,
        fiber_points: revision.positive.fiber.points_for(profile.fiber),
        fruit_veg_points: revision
            .positive
            .fruit_veg_legumes
            .points_for(profile.fruit_veg_legumes_percent),
    };

    let points_a = breakdown.points_a();
    let points_c = breakdown.points_c();
    let fiber_and_fruit =
        i32::from(breakdown.fiber_points) + i32::from(breakdown.fruit_veg_points);

    let (formula, final_score, bands) = if flags.is_cheese
        && revision.cheese_policy == CategoryPolicy::Dedicated
    {
        (Formula::Cheese, points_a - points_c, revision.bands)
    } else if dedicated_fats {
        (
            Formula::FatsOilsNutsOrSeeds,
            points_a - i32::from(breakdown.protein_points).max(fiber_and_fruit),
            revision.fats_bands,
        )
    } else if flags.is_beverage && revision.beverage_policy == CategoryPolicy::Dedicated {
        (Formula::Beverage, points_a - points_c, revision.bands)
    } else if excludes_protein(points_a, &breakdown, revision) {
        (
            Formula::GeneralWithoutProtein,
            points_a - fiber_and_fruit,
            revision.bands,
        )
    } else {
        (Formula::General, points_a - points_c, revision.bands)
    };

    let grade = bands.grade(final_score);

    tracing::trace!(
        revision = %revision.id,
        ?formula,
        points_a,
        points_c,
        final_score,
        grade = %grade,
        "Scored product"
    );

    Ok(Assessment::Graded(Graded {
        grade,
        final_score,
        breakdown,
        formula,
    }))
}

/// Grade or `None`; malformed input is logged and yields `None`
pub fn compute_grade(
    profile: &NutrientProfile,
    flags: &CategoryFlags,
    revision: &Revision,
) -> Option<Grade> {
    match score(profile, flags, revision) {
        Ok(assessment) => assessment.grade(),
        Err(e) => {
            tracing::warn!(error = %e, "Scoring failed");
            None
        }
    }
}

fn exclusion(
    profile: &NutrientProfile,
    flags: &CategoryFlags,
    revision: &Revision,
) -> Option<Exclusion> {
    if flags.is_alcoholic {
        return Some(Exclusion::Alcoholic);
    }
    if profile.energy.is_none_or(|energy| energy <= 0.0) {
        return Some(Exclusion::MissingEnergy);
    }
    if flags.is_cheese && revision.cheese_policy == CategoryPolicy::Excluded {
        return Some(Exclusion::Cheese);
    }
    if flags.is_beverage && revision.beverage_policy == CategoryPolicy::Excluded {
        return Some(Exclusion::Beverage);
    }
    if flags.is_fats_oils_nuts_or_seeds && revision.fats_policy == CategoryPolicy::Excluded {
        return Some(Exclusion::FatsOilsNutsOrSeeds);
    }
    None
}

fn excludes_protein(points_a: i32, breakdown: &PointBreakdown, revision: &Revision) -> bool {
    let rule = revision.protein_rule;
    if points_a < rule.exclusion_threshold {
        return false;
    }
    match rule.waived_at_fruit_veg_points {
        Some(waiver) => breakdown.fruit_veg_points < waiver,
        None => true,
    }
}
