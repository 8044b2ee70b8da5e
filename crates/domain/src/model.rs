//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Per-100g nutrient composition of a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientProfile {
    /// Energy in kJ; a profile without energy cannot be graded
    pub energy: Option<f64>,
    /// Sugars in g
    pub sugars: Option<f64>,
    /// Saturated fatty acids in g
    pub saturated_fats: Option<f64>,
    /// Salt in g
    pub salt: Option<f64>,
    /// Proteins in g
    pub proteins: Option<f64>,
    /// Dietary fiber in g
    pub fiber: Option<f64>,
    /// Share of fruit, vegetables and legumes (0-100)
    pub fruit_veg_legumes_percent: Option<f64>,
}

impl NutrientProfile {
    /// Iterate over every amount that is present, with its field name
    pub fn amounts(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("energy", self.energy),
            ("sugars", self.sugars),
            ("saturated_fats", self.saturated_fats),
            ("salt", self.salt),
            ("proteins", self.proteins),
            ("fiber", self.fiber),
            ("fruit_veg_legumes_percent", self.fruit_veg_legumes_percent),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// Product class attributes derived from category names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryFlags {
    pub is_cheese: bool,
    pub is_red_meat: bool,
    pub is_beverage: bool,
    pub is_fats_oils_nuts_or_seeds: bool,
    pub is_alcoholic: bool,
}

impl CategoryFlags {
    /// Set a single flag
    pub fn set(&mut self, flag: CategoryFlag) {
        match flag {
            CategoryFlag::Cheese => self.is_cheese = true,
            CategoryFlag::RedMeat => self.is_red_meat = true,
            CategoryFlag::Beverage => self.is_beverage = true,
            CategoryFlag::FatsOilsNutsOrSeeds => self.is_fats_oils_nuts_or_seeds = true,
            CategoryFlag::Alcoholic => self.is_alcoholic = true,
        }
    }

    /// Build a flag set from individual flags
    pub fn from_flags(flags: impl IntoIterator<Item = CategoryFlag>) -> Self {
        let mut set = Self::default();
        for flag in flags {
            set.set(flag);
        }
        set
    }

    /// Flags that are currently set, in declaration order
    pub fn active(&self) -> Vec<CategoryFlag> {
        CategoryFlag::ALL
            .into_iter()
            .filter(|flag| match flag {
                CategoryFlag::Cheese => self.is_cheese,
                CategoryFlag::RedMeat => self.is_red_meat,
                CategoryFlag::Beverage => self.is_beverage,
                CategoryFlag::FatsOilsNutsOrSeeds => self.is_fats_oils_nuts_or_seeds,
                CategoryFlag::Alcoholic => self.is_alcoholic,
            })
            .collect()
    }
}

/// A single category attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFlag {
    Cheese,
    RedMeat,
    Beverage,
    FatsOilsNutsOrSeeds,
    Alcoholic,
}

impl CategoryFlag {
    pub const ALL: [CategoryFlag; 5] = [
        CategoryFlag::Cheese,
        CategoryFlag::RedMeat,
        CategoryFlag::Beverage,
        CategoryFlag::FatsOilsNutsOrSeeds,
        CategoryFlag::Alcoholic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFlag::Cheese => "cheese",
            CategoryFlag::RedMeat => "red_meat",
            CategoryFlag::Beverage => "beverage",
            CategoryFlag::FatsOilsNutsOrSeeds => "fats_oils_nuts_or_seeds",
            CategoryFlag::Alcoholic => "alcoholic",
        }
    }
}

impl fmt::Display for CategoryFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s.trim())
            .ok_or_else(|| format!("unknown category flag: {}", s))
    }
}

/// Nutritional grade, A best and E worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        }
    }

    /// Badge background colour
    pub fn color_hex(&self) -> &'static str {
        match self {
            Grade::A => "#038141",
            Grade::B => "#85BB2F",
            Grade::C => "#FECC03",
            Grade::D => "#EF8200",
            Grade::E => "#E63E11",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Grade::A),
            "B" | "b" => Ok(Grade::B),
            "C" | "c" => Ok(Grade::C),
            "D" | "d" => Ok(Grade::D),
            "E" | "e" => Ok(Grade::E),
            other => Err(format!("invalid grade: {}", other)),
        }
    }
}

/// Component points behind a grade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBreakdown {
    pub energy_points: u8,
    pub sugar_points: u8,
    pub saturates_points: u8,
    pub salt_points: u8,
    pub protein_points: u8,
    pub fiber_points: u8,
    pub fruit_veg_points: u8,
}

impl PointBreakdown {
    /// Sum of the negative (penalty) components
    pub fn points_a(&self) -> i32 {
        i32::from(self.energy_points)
            + i32::from(self.sugar_points)
            + i32::from(self.saturates_points)
            + i32::from(self.salt_points)
    }

    /// Sum of the positive (credit) components
    pub fn points_c(&self) -> i32 {
        i32::from(self.protein_points)
            + i32::from(self.fiber_points)
            + i32::from(self.fruit_veg_points)
    }
}

/// Why a product carries no grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullReason {
    /// Legitimately outside the grading scheme (alcohol, excluded category)
    NotApplicable,
    /// Source data missing, incomplete or unusable
    DataUnavailable,
}

impl NullReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullReason::NotApplicable => "not_applicable",
            NullReason::DataUnavailable => "data_unavailable",
        }
    }
}

impl FromStr for NullReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_applicable" => Ok(NullReason::NotApplicable),
            "data_unavailable" => Ok(NullReason::DataUnavailable),
            other => Err(format!("invalid null reason: {}", other)),
        }
    }
}

/// A memoized grade computation for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Catalog product identifier
    pub id: String,
    /// Computed grade; `None` means computed but no grade available
    pub grade: Option<Grade>,
    /// Reason tag for `grade = None`
    #[serde(default)]
    pub reason: Option<NullReason>,
    /// When the computation happened
    #[serde(with = "time::serde::rfc3339")]
    pub computed_at: OffsetDateTime,
}

impl CacheEntry {
    /// Entry for a graded product
    pub fn graded(id: impl Into<String>, grade: Grade, computed_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            grade: Some(grade),
            reason: None,
            computed_at,
        }
    }

    /// Entry for a product without a grade
    pub fn ungraded(id: impl Into<String>, reason: NullReason, computed_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            grade: None,
            reason: Some(reason),
            computed_at,
        }
    }
}

/// Result of looking up one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupOutcome {
    pub product_id: String,
    pub grade: Option<Grade>,
    pub reason: Option<NullReason>,
    /// Whether the result came from the cache
    pub cached: bool,
}
