use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::census;
use crate::parser::time;
use crate::records::{AgeGroup, CleanRecord, Percentiles, RawRow};

/// Admitted finish times for a 10-mile race: 40 minutes to 3 hours.
pub const MIN_FINISH_SECS: i64 = 40 * 60;
pub const MAX_FINISH_SECS: i64 = 180 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub original: usize,
    pub military_removed: usize,
    pub missing_removed: usize,
    pub outliers_removed: usize,
    pub retained: usize,
}

/// A row between coercion and admission: times may still be missing.
struct Typed {
    raw: RawRow,
    gender: Option<String>,
    age: Option<i32>,
    state: Option<String>,
    country: Option<String>,
    places: [Option<u32>; 3],
    is_us: bool,
    finish_seconds: Option<i64>,
    pace_seconds: Option<i64>,
    age_group: Option<AgeGroup>,
}

fn normalized(value: &str) -> Option<String> {
    let v = value.trim().to_uppercase();
    (!v.is_empty()).then_some(v)
}

fn numeric<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

fn coerce(raw: RawRow) -> Typed {
    let country = normalized(&raw.country);
    let age = numeric::<i32>(&raw.age);
    Typed {
        gender: normalized(&raw.gender),
        age,
        state: normalized(&raw.state),
        is_us: country.as_deref() == Some("USA"),
        country,
        places: [
            numeric(&raw.overall_place),
            numeric(&raw.gender_place),
            numeric(&raw.age_group_place),
        ],
        finish_seconds: None,
        pace_seconds: None,
        age_group: None,
        raw,
    }
}

fn with_times(mut row: Typed) -> Typed {
    row.finish_seconds = time::to_seconds(&row.raw.finish_time);
    row.pace_seconds = time::to_seconds(&row.raw.pace);
    row.age_group = row.age.and_then(AgeGroup::for_age);
    row
}

fn admit(row: Typed, finish_seconds: i64, pace_seconds: i64) -> CleanRecord {
    let census = row.state.as_deref().map(census::classify);
    let is_local = row.state.as_deref().is_some_and(census::is_local);
    let [overall_place, gender_place, age_group_place] = row.places;
    CleanRecord {
        name: row.raw.name,
        gender: row.gender,
        age: row.age,
        race: row.raw.race,
        state: row.state,
        country: row.country,
        overall_place,
        gender_place,
        age_group_place,
        finish_time: row.raw.finish_time,
        pace: row.raw.pace,
        is_us: row.is_us,
        finish_seconds,
        pace_seconds,
        age_group: row.age_group,
        census,
        is_local,
        percentiles: Percentiles::default(),
    }
}

/// Type, filter, and enrich scraped rows.
///
/// Military postal codes are removed for every row, US or not.
pub fn clean(raw: Vec<RawRow>) -> (Vec<CleanRecord>, CleanReport) {
    info!("Cleaning data...");
    let mut report = CleanReport {
        original: raw.len(),
        ..Default::default()
    };

    let rows: Vec<Typed> = raw.into_iter().map(coerce).collect();
    log_profile(&rows);

    let before = rows.len();
    let rows: Vec<Typed> = rows
        .into_iter()
        .filter(|r| !r.state.as_deref().is_some_and(census::is_military))
        .collect();
    report.military_removed = before - rows.len();
    info!("Removed {} records with military postal codes", report.military_removed);

    let rows: Vec<Typed> = rows.into_iter().map(with_times).collect();
    let missing_finish = rows.iter().filter(|r| r.finish_seconds.is_none()).count();
    info!("Finish time conversion - Missing: {}", missing_finish);
    log_age_groups(&rows);

    let before = rows.len();
    let timed: Vec<(Typed, i64, i64)> = rows
        .into_iter()
        .filter_map(|r| {
            let (finish, pace) = (r.finish_seconds?, r.pace_seconds?);
            Some((r, finish, pace))
        })
        .collect();
    report.missing_removed = before - timed.len();
    info!("Removed {} records with missing finish time or pace", report.missing_removed);

    let before = timed.len();
    let records: Vec<CleanRecord> = timed
        .into_iter()
        .filter(|(_, finish, _)| (MIN_FINISH_SECS..=MAX_FINISH_SECS).contains(finish))
        .map(|(row, finish, pace)| admit(row, finish, pace))
        .collect();
    report.outliers_removed = before - records.len();
    info!("Removed {} outliers (times outside 40min-3hr)", report.outliers_removed);

    report.retained = records.len();
    (records, report)
}

fn log_profile(rows: &[Typed]) {
    let genders: BTreeMap<&str, usize> = rows
        .iter()
        .filter_map(|r| r.gender.as_deref())
        .counts()
        .into_iter()
        .collect();
    info!("Gender distribution: {:?}", genders);

    match rows.iter().filter_map(|r| r.age).minmax().into_option() {
        Some((lo, hi)) => info!("Age range: {} to {}", lo, hi),
        None => info!("Age range: none"),
    }
    info!("Missing ages: {}", rows.iter().filter(|r| r.age.is_none()).count());

    let countries: HashSet<&str> = rows.iter().filter_map(|r| r.country.as_deref()).collect();
    info!("Countries represented: {}", countries.len());

    let us_states: HashSet<&str> = rows
        .iter()
        .filter(|r| r.is_us)
        .filter_map(|r| r.state.as_deref())
        .collect();
    info!("US runners: {}", rows.iter().filter(|r| r.is_us).count());
    info!("US States represented: {}", us_states.len());
}

fn log_age_groups(rows: &[Typed]) {
    let counts = rows.iter().filter_map(|r| r.age_group).counts();
    let line = AgeGroup::ALL
        .iter()
        .map(|g| format!("{}={}", g.label(), counts.get(g).copied().unwrap_or(0)))
        .join(", ");
    info!("Age group distribution: {}", line);
}

// ── Tests ──
