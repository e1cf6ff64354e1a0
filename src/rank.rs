use std::collections::HashMap;
use std::hash::Hash;

use itertools::Itertools;

use crate::records::{AgeGroup, CleanRecord};

/// Percentile rank of each value, `average_rank / count * 100`, tied values
/// sharing the mean of their positions. `None` values get no rank and do not
/// count toward the total.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let ranked: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .sorted_by(|a, b| a.1.total_cmp(&b.1))
        .collect();
    let count = ranked.len() as f64;

    let mut start = 0;
    while start < ranked.len() {
        let value = ranked[start].1;
        let end = ranked[start..]
            .iter()
            .position(|(_, v)| *v != value)
            .map_or(ranked.len(), |n| start + n);
        // positions start..end are 1-based ranks start+1..=end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for (idx, _) in &ranked[start..end] {
            out[*idx] = Some(avg_rank / count * 100.0);
        }
        start = end;
    }
    out
}

/// Rank `value` within groups of `key`. Rows without a key get no percentile.
fn grouped_percentiles<K, F, V>(records: &[CleanRecord], key: F, value: V) -> Vec<Option<f64>>
where
    K: Eq + Hash,
    F: Fn(&CleanRecord) -> Option<K>,
    V: Fn(&CleanRecord) -> Option<u32>,
{
    let groups: HashMap<K, Vec<usize>> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| key(r).map(|k| (k, i)))
        .into_group_map();

    let mut out = vec![None; records.len()];
    for members in groups.values() {
        let places: Vec<Option<f64>> = members
            .iter()
            .map(|&i| value(&records[i]).map(f64::from))
            .collect();
        for (&i, pct) in members.iter().zip(percentile_ranks(&places)) {
            out[i] = pct;
        }
    }
    out
}

/// Add overall, gender, and gender × age-group percentiles.
pub fn rank(mut records: Vec<CleanRecord>) -> Vec<CleanRecord> {
    let overall = grouped_percentiles(&records, |_| Some(()), |r| r.overall_place);
    let gender = grouped_percentiles(&records, |r| r.gender.clone(), |r| r.gender_place);
    let age_group = grouped_percentiles(
        &records,
        |r| -> Option<(String, AgeGroup)> { Some((r.gender.clone()?, r.age_group?)) },
        |r| r.age_group_place,
    );

    for (i, record) in records.iter_mut().enumerate() {
        record.percentiles.overall = overall[i];
        record.percentiles.gender = gender[i];
        record.percentiles.age_group = age_group[i];
    }
    records
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Percentiles;

    fn record(gender: &str, age_group: AgeGroup, places: (u32, u32, u32)) -> CleanRecord {
        CleanRecord {
            name: String::new(),
            gender: Some(gender.to_string()),
            age: None,
            race: String::new(),
            state: None,
            country: None,
            overall_place: Some(places.0),
            gender_place: Some(places.1),
            age_group_place: Some(places.2),
            finish_time: String::new(),
            pace: String::new(),
            is_us: false,
            finish_seconds: 4000,
            pace_seconds: 400,
            age_group: Some(age_group),
            census: None,
            is_local: false,
            percentiles: Percentiles::default(),
        }
    }

    #[test]
    fn distinct_values() {
        let pct = percentile_ranks(&[Some(3.0), Some(1.0), Some(2.0), Some(4.0)]);
        assert_eq!(pct, vec![Some(75.0), Some(25.0), Some(50.0), Some(100.0)]);
    }

    #[test]
    fn ties_share_the_average_rank() {
        let pct = percentile_ranks(&[Some(1.0), Some(2.0), Some(2.0), Some(4.0)]);
        assert_eq!(pct, vec![Some(25.0), Some(62.5), Some(62.5), Some(100.0)]);

        let pct = percentile_ranks(&[Some(5.0), Some(5.0)]);
        assert_eq!(pct, vec![Some(75.0), Some(75.0)]);
    }

    #[test]
    fn missing_values_stay_missing() {
        let pct = percentile_ranks(&[None, Some(10.0), Some(20.0)]);
        assert_eq!(pct, vec![None, Some(50.0), Some(100.0)]);
    }

    #[test]
    fn single_member_group_is_one_hundred() {
        let records = vec![
            record("M", AgeGroup::A30to34, (1, 1, 1)),
            record("M", AgeGroup::A30to34, (3, 2, 2)),
            record("F", AgeGroup::A40to44, (2, 1, 1)),
        ];
        let ranked = rank(records);
        assert_eq!(ranked[2].percentiles.gender, Some(100.0));
        assert_eq!(ranked[2].percentiles.age_group, Some(100.0));
        assert_eq!(ranked[0].percentiles.gender, Some(50.0));
        assert_eq!(ranked[1].percentiles.overall, Some(100.0));
    }

    #[test]
    fn missing_group_key_yields_missing_percentile() {
        let mut no_gender = record("M", AgeGroup::A30to34, (2, 2, 2));
        no_gender.gender = None;
        let mut no_place = record("M", AgeGroup::A30to34, (3, 1, 1));
        no_place.overall_place = None;
        let ranked = rank(vec![record("M", AgeGroup::A30to34, (1, 1, 1)), no_gender, no_place]);

        assert_eq!(ranked[1].percentiles.gender, None);
        assert_eq!(ranked[1].percentiles.age_group, None);
        assert_eq!(ranked[1].percentiles.overall, Some(100.0));
        assert_eq!(ranked[2].percentiles.overall, None);
        assert_eq!(ranked[0].percentiles.gender, Some(75.0));
    }
}
