use serde::{Deserialize, Serialize};

use crate::census::Census;

/// One scraped result row, untyped. Every field is present; empty means missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Race")]
    pub race: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Overall Place")]
    pub overall_place: String,
    #[serde(rename = "Gender Place")]
    pub gender_place: String,
    #[serde(rename = "Age Group Place")]
    pub age_group_place: String,
    #[serde(rename = "Finish Time")]
    pub finish_time: String,
    #[serde(rename = "Pace")]
    pub pace: String,
}

/// Upper bounds of the age bins; a bin holds ages above the previous bound
/// up to and including its own.
const AGE_BOUNDS: [i32; 14] = [19, 24, 29, 34, 39, 44, 49, 54, 59, 64, 69, 74, 79, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeGroup {
    Under20,
    A20to24,
    A25to29,
    A30to34,
    A35to39,
    A40to44,
    A45to49,
    A50to54,
    A55to59,
    A60to64,
    A65to69,
    A70to74,
    A75to79,
    Over80,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 14] = [
        AgeGroup::Under20,
        AgeGroup::A20to24,
        AgeGroup::A25to29,
        AgeGroup::A30to34,
        AgeGroup::A35to39,
        AgeGroup::A40to44,
        AgeGroup::A45to49,
        AgeGroup::A50to54,
        AgeGroup::A55to59,
        AgeGroup::A60to64,
        AgeGroup::A65to69,
        AgeGroup::A70to74,
        AgeGroup::A75to79,
        AgeGroup::Over80,
    ];

    /// Ages outside 0..=100 have no group.
    pub fn for_age(age: i32) -> Option<AgeGroup> {
        if !(0..=100).contains(&age) {
            return None;
        }
        AGE_BOUNDS
            .iter()
            .position(|&upper| age <= upper)
            .map(|i| Self::ALL[i])
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Under20 => "0-19",
            AgeGroup::A20to24 => "20-24",
            AgeGroup::A25to29 => "25-29",
            AgeGroup::A30to34 => "30-34",
            AgeGroup::A35to39 => "35-39",
            AgeGroup::A40to44 => "40-44",
            AgeGroup::A45to49 => "45-49",
            AgeGroup::A50to54 => "50-54",
            AgeGroup::A55to59 => "55-59",
            AgeGroup::A60to64 => "60-64",
            AgeGroup::A65to69 => "65-69",
            AgeGroup::A70to74 => "70-74",
            AgeGroup::A75to79 => "75-79",
            AgeGroup::Over80 => "80+",
        }
    }
}

/// A typed, enriched result. Always has a finish time in the admitted range
/// and a pace once it leaves the cleaning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub race: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub overall_place: Option<u32>,
    pub gender_place: Option<u32>,
    pub age_group_place: Option<u32>,
    pub finish_time: String,
    pub pace: String,
    pub is_us: bool,
    pub finish_seconds: i64,
    pub pace_seconds: i64,
    pub age_group: Option<AgeGroup>,
    pub census: Option<Census>,
    pub is_local: bool,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Percentiles {
    pub overall: Option<f64>,
    pub gender: Option<f64>,
    pub age_group: Option<f64>,
}

impl CleanRecord {
    pub fn finish_minutes(&self) -> f64 {
        crate::parser::time::to_minutes(self.finish_seconds)
    }

    pub fn pace_minutes(&self) -> f64 {
        crate::parser::time::to_minutes(self.pace_seconds)
    }
}

// ── Tests ──
