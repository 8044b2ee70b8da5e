//! Named scoring revisions
//!
//! Each historical version of the grading algorithm is an immutable
//! [`Revision`] value: point tables, category policies and grade bands. The
//! aggregator never hard-codes a "current" table; callers pick a
//! [`RevisionId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Grade, NutrientProfile};
use crate::points::{Boundary, PointTable, TableError};

/// Identifier of a built-in revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RevisionId {
    /// Range tables with sodium-converted salt and no category formulas
    #[serde(rename = "legacy-2017")]
    Legacy2017,
    /// Category-aware tables; fats, oils, nuts and seeds are not graded
    #[default]
    #[serde(rename = "2022")]
    Nutri2022,
    /// Category-aware tables with the dedicated fats, oils, nuts and seeds formula
    #[serde(rename = "2022-fats")]
    Nutri2022Fats,
}

impl RevisionId {
    pub const ALL: [RevisionId; 3] = [
        RevisionId::Legacy2017,
        RevisionId::Nutri2022,
        RevisionId::Nutri2022Fats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionId::Legacy2017 => "legacy-2017",
            RevisionId::Nutri2022 => "2022",
            RevisionId::Nutri2022Fats => "2022-fats",
        }
    }

    /// Identifier-safe form used in storage namespaces
    pub fn slug(&self) -> &'static str {
        match self {
            RevisionId::Legacy2017 => "legacy_2017",
            RevisionId::Nutri2022 => "nutri_2022",
            RevisionId::Nutri2022Fats => "nutri_2022_fats",
        }
    }

    /// Materialize the revision's configuration
    pub fn revision(&self) -> Revision {
        match self {
            RevisionId::Legacy2017 => Revision::legacy_2017(),
            RevisionId::Nutri2022 => Revision::nutri_2022(),
            RevisionId::Nutri2022Fats => Revision::nutri_2022_fats(),
        }
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevisionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RevisionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown revision '{}', expected one of: {}",
                    s,
                    RevisionId::ALL.map(|id| id.as_str()).join(", ")
                )
            })
    }
}

/// Unit the salt table is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaltBasis {
    /// Thresholds in grams of salt
    SaltGrams,
    /// Thresholds in milligrams of sodium (`salt_g * 400`)
    SodiumMilligrams,
}

impl SaltBasis {
    pub fn convert(&self, salt_grams: Option<f64>) -> Option<f64> {
        match self {
            SaltBasis::SaltGrams => salt_grams,
            SaltBasis::SodiumMilligrams => salt_grams.map(|g| g * 400.0),
        }
    }
}

/// Tables for the penalty nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeTables {
    pub energy: PointTable,
    pub sugars: PointTable,
    pub saturated_fats: PointTable,
    pub salt: PointTable,
    pub salt_basis: SaltBasis,
}

impl NegativeTables {
    /// Energy, sugar, saturates and salt points, in that order
    pub fn points(&self, profile: &NutrientProfile) -> [u8; 4] {
        [
            self.energy.points_for(profile.energy),
            self.sugars.points_for(profile.sugars),
            self.saturated_fats.points_for(profile.saturated_fats),
            self.salt.points_for(self.salt_basis.convert(profile.salt)),
        ]
    }

    fn tables(&self) -> [&PointTable; 4] {
        [&self.energy, &self.sugars, &self.saturated_fats, &self.salt]
    }
}

/// Tables for the credit nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveTables {
    pub proteins: PointTable,
    pub fiber: PointTable,
    pub fruit_veg_legumes: PointTable,
}

impl PositiveTables {
    fn tables(&self) -> [&PointTable; 3] {
        [&self.proteins, &self.fiber, &self.fruit_veg_legumes]
    }
}

/// Inclusive upper score limits for grades A through D; anything above is E
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBands {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
}

impl GradeBands {
    pub const GENERAL: GradeBands = GradeBands {
        a: 0,
        b: 2,
        c: 10,
        d: 18,
    };

    pub const FATS_OILS_NUTS_SEEDS: GradeBands = GradeBands {
        a: -6,
        b: 2,
        c: 10,
        d: 18,
    };

    pub const LEGACY: GradeBands = GradeBands {
        a: -2,
        b: 1,
        c: 9,
        d: 17,
    };

    pub fn grade(&self, final_score: i32) -> Grade {
        if final_score <= self.a {
            Grade::A
        } else if final_score <= self.b {
            Grade::B
        } else if final_score <= self.c {
            Grade::C
        } else if final_score <= self.d {
            Grade::D
        } else {
            Grade::E
        }
    }

    /// Limits must strictly ascend for the bands to partition the integers
    pub fn is_ordered(&self) -> bool {
        self.a < self.b && self.b < self.c && self.c < self.d
    }
}

/// How a revision treats a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// The category is not graded
    Excluded,
    /// Graded like ordinary solid food
    General,
    /// Graded with the category's own formula
    Dedicated,
}

/// When protein may offset penalty points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinRule {
    /// At or above this many A-points protein stops counting
    pub exclusion_threshold: i32,
    /// Protein counts again when fruit/veg points reach this value
    pub waived_at_fruit_veg_points: Option<u8>,
}

/// A complete, immutable scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub solid: NegativeTables,
    pub positive: PositiveTables,
    /// Penalty tables for fats, oils, nuts and seeds under a dedicated policy
    pub fats: NegativeTables,
    pub cheese_policy: CategoryPolicy,
    pub beverage_policy: CategoryPolicy,
    pub fats_policy: CategoryPolicy,
    pub red_meat_protein_cap: Option<u8>,
    pub protein_rule: ProteinRule,
    pub bands: GradeBands,
    pub fats_bands: GradeBands,
}

impl Revision {
    /// Range tables from the first published scheme
    pub fn legacy_2017() -> Self {
        use Boundary::LowerInclusive as L;

        Self {
            id: RevisionId::Legacy2017,
            solid: NegativeTables {
                energy: energy_335_steps(),
                sugars: PointTable::from_pairs(
                    L,
                    &[
                        (4.5, 1),
                        (9.0, 2),
                        (13.5, 3),
                        (18.0, 4),
                        (22.5, 5),
                        (27.0, 6),
                        (31.0, 7),
                        (36.0, 8),
                        (40.0, 9),
                        (45.0, 10),
                    ],
                ),
                saturated_fats: saturates_1g_steps(),
                salt: PointTable::from_pairs(
                    L,
                    &[
                        (90.0, 1),
                        (180.0, 2),
                        (270.0, 3),
                        (360.0, 4),
                        (450.0, 5),
                        (540.0, 6),
                        (630.0, 7),
                        (720.0, 8),
                        (810.0, 9),
                        (900.0, 10),
                    ],
                ),
                salt_basis: SaltBasis::SodiumMilligrams,
            },
            positive: PositiveTables {
                proteins: PointTable::from_pairs(
                    L,
                    &[(1.6, 1), (3.2, 2), (4.8, 3), (6.4, 4), (8.0, 5)],
                )
                .with_precision(1),
                fiber: PointTable::from_pairs(
                    L,
                    &[(0.9, 1), (1.9, 2), (2.8, 3), (3.7, 4), (4.7, 5)],
                ),
                fruit_veg_legumes: PointTable::from_pairs(L, &[(40.0, 1), (60.0, 2), (80.0, 5)]),
            },
            fats: fats_2022_tables(),
            cheese_policy: CategoryPolicy::General,
            beverage_policy: CategoryPolicy::Excluded,
            fats_policy: CategoryPolicy::General,
            red_meat_protein_cap: None,
            protein_rule: ProteinRule {
                exclusion_threshold: 11,
                waived_at_fruit_veg_points: Some(5),
            },
            bands: GradeBands::LEGACY,
            fats_bands: GradeBands::FATS_OILS_NUTS_SEEDS,
        }
    }

    /// Category-aware scheme; fats, oils, nuts and seeds are not graded
    pub fn nutri_2022() -> Self {
        use Boundary::UpperInclusive as U;

        Self {
            id: RevisionId::Nutri2022,
            solid: NegativeTables {
                energy: energy_335_steps(),
                sugars: sugars_3_4_steps(),
                saturated_fats: saturates_1g_steps(),
                salt: salt_0_2_steps(),
                salt_basis: SaltBasis::SaltGrams,
            },
            positive: PositiveTables {
                proteins: PointTable::from_pairs(
                    U,
                    &[
                        (2.4, 1),
                        (4.8, 2),
                        (7.2, 3),
                        (9.6, 4),
                        (12.0, 5),
                        (14.0, 6),
                        (17.0, 7),
                    ],
                ),
                fiber: PointTable::from_pairs(
                    U,
                    &[(3.0, 1), (4.1, 2), (5.2, 3), (6.3, 4), (7.4, 5)],
                ),
                fruit_veg_legumes: PointTable::from_pairs(U, &[(40.0, 1), (60.0, 2), (80.0, 5)]),
            },
            fats: fats_2022_tables(),
            cheese_policy: CategoryPolicy::Dedicated,
            beverage_policy: CategoryPolicy::Excluded,
            fats_policy: CategoryPolicy::Excluded,
            red_meat_protein_cap: Some(2),
            protein_rule: ProteinRule {
                exclusion_threshold: 11,
                waived_at_fruit_veg_points: None,
            },
            bands: GradeBands::GENERAL,
            fats_bands: GradeBands::FATS_OILS_NUTS_SEEDS,
        }
    }

    /// Same as [`Revision::nutri_2022`] but grades fats, oils, nuts and seeds
    pub fn nutri_2022_fats() -> Self {
        Self {
            id: RevisionId::Nutri2022Fats,
            fats_policy: CategoryPolicy::Dedicated,
            ..Self::nutri_2022()
        }
    }

    /// Validate every table and band set
    pub fn validate(&self) -> Result<(), TableError> {
        self.solid
            .tables()
            .into_iter()
            .chain(self.fats.tables())
            .chain(self.positive.tables())
            .try_for_each(PointTable::validate)
    }
}

fn energy_335_steps() -> PointTable {
    PointTable::from_pairs(
        Boundary::LowerInclusive,
        &[
            (335.0, 1),
            (670.0, 2),
            (1005.0, 3),
            (1340.0, 4),
            (1675.0, 5),
            (2010.0, 6),
            (2345.0, 7),
            (2680.0, 8),
            (3015.0, 9),
            (3350.0, 10),
        ],
    )
}

fn saturates_1g_steps() -> PointTable {
    PointTable::from_pairs(
        Boundary::LowerInclusive,
        &[
            (1.0, 1),
            (2.0, 2),
            (3.0, 3),
            (4.0, 4),
            (5.0, 5),
            (6.0, 6),
            (7.0, 7),
            (8.0, 8),
            (9.0, 9),
            (10.0, 10),
        ],
    )
}

fn sugars_3_4_steps() -> PointTable {
    PointTable::from_pairs(
        Boundary::LowerInclusive,
        &[
            (3.4, 1),
            (6.8, 2),
            (10.2, 3),
            (13.6, 4),
            (17.0, 5),
            (20.4, 6),
            (23.8, 7),
            (27.2, 8),
            (30.6, 9),
            (34.0, 10),
        ],
    )
}

fn salt_0_2_steps() -> PointTable {
    PointTable::from_pairs(
        Boundary::LowerInclusive,
        &[
            (0.2, 1),
            (0.4, 2),
            (0.6, 3),
            (0.8, 4),
            (1.0, 5),
            (1.2, 6),
            (1.4, 7),
            (1.6, 8),
            (1.8, 9),
            (2.0, 10),
        ],
    )
}

fn fats_2022_tables() -> NegativeTables {
    NegativeTables {
        energy: PointTable::from_pairs(
            Boundary::LowerInclusive,
            &[
                (120.0, 1),
                (240.0, 2),
                (360.0, 3),
                (480.0, 4),
                (600.0, 5),
                (720.0, 6),
                (840.0, 7),
                (960.0, 8),
                (1080.0, 9),
                (1200.0, 10),
            ],
        ),
        sugars: sugars_3_4_steps(),
        // floor(g * 100 / 10), so each tenth of a gram is one point
        saturated_fats: PointTable::from_pairs(
            Boundary::LowerInclusive,
            &[
                (0.1, 1),
                (0.2, 2),
                (0.3, 3),
                (0.4, 4),
                (0.5, 5),
                (0.6, 6),
                (0.7, 7),
                (0.8, 8),
                (0.9, 9),
                (1.0, 10),
            ],
        ),
        salt: salt_0_2_steps(),
        salt_basis: SaltBasis::SaltGrams,
    }
}
