//! Output layout of the cleaned dataset and its data dictionary.

use crate::census::Census;
use crate::records::CleanRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Bool,
    Category,
}

impl ColumnType {
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Category => "category",
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub cell: fn(&CleanRecord) -> Option<String>,
}

fn text(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn float(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

fn flag(b: bool) -> Option<String> {
    Some(if b { "True" } else { "False" }.to_string())
}

pub const COLUMNS: [Column; 23] = [
    Column { name: "Name", kind: ColumnType::Text, cell: |r| text(&r.name) },
    Column { name: "Gender", kind: ColumnType::Text, cell: |r| r.gender.clone() },
    Column { name: "Age", kind: ColumnType::Integer, cell: |r| r.age.map(|v| v.to_string()) },
    Column { name: "Race", kind: ColumnType::Text, cell: |r| text(&r.race) },
    Column { name: "State", kind: ColumnType::Text, cell: |r| r.state.clone() },
    Column { name: "Country", kind: ColumnType::Text, cell: |r| r.country.clone() },
    Column {
        name: "Overall Place",
        kind: ColumnType::Integer,
        cell: |r| r.overall_place.map(|v| v.to_string()),
    },
    Column {
        name: "Gender Place",
        kind: ColumnType::Integer,
        cell: |r| r.gender_place.map(|v| v.to_string()),
    },
    Column {
        name: "Age Group Place",
        kind: ColumnType::Integer,
        cell: |r| r.age_group_place.map(|v| v.to_string()),
    },
    Column { name: "Finish Time", kind: ColumnType::Text, cell: |r| text(&r.finish_time) },
    Column { name: "Pace", kind: ColumnType::Text, cell: |r| text(&r.pace) },
    Column { name: "Is_US", kind: ColumnType::Bool, cell: |r| flag(r.is_us) },
    Column {
        name: "Finish Time (seconds)",
        kind: ColumnType::Integer,
        cell: |r| Some(r.finish_seconds.to_string()),
    },
    Column {
        name: "Finish Time (minutes)",
        kind: ColumnType::Float,
        cell: |r| Some(float(r.finish_minutes())),
    },
    Column {
        name: "Pace (sec/mile)",
        kind: ColumnType::Integer,
        cell: |r| Some(r.pace_seconds.to_string()),
    },
    Column {
        name: "Pace (min/mile)",
        kind: ColumnType::Float,
        cell: |r| Some(float(r.pace_minutes())),
    },
    Column {
        name: "Age Group",
        kind: ColumnType::Category,
        cell: |r| r.age_group.map(|g| g.label().to_string()),
    },
    Column {
        name: "Census Region",
        kind: ColumnType::Category,
        cell: |r| r.census.map(|c| Census::region_label(c).to_string()),
    },
    Column {
        name: "Census Division",
        kind: ColumnType::Category,
        cell: |r| r.census.map(|c| Census::division_label(c).to_string()),
    },
    Column { name: "Is_Local", kind: ColumnType::Bool, cell: |r| flag(r.is_local) },
    Column {
        name: "Overall Percentile",
        kind: ColumnType::Float,
        cell: |r| r.percentiles.overall.map(float),
    },
    Column {
        name: "Gender Percentile",
        kind: ColumnType::Float,
        cell: |r| r.percentiles.gender.map(float),
    },
    Column {
        name: "Age Group Percentile",
        kind: ColumnType::Float,
        cell: |r| r.percentiles.age_group.map(float),
    },
];

pub fn header() -> Vec<&'static str> {
    COLUMNS.iter().map(|c| c.name).collect()
}

/// One output line; missing values are empty cells.
pub fn row(record: &CleanRecord) -> Vec<String> {
    COLUMNS
        .iter()
        .map(|c| (c.cell)(record).unwrap_or_default())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub column: &'static str,
    pub kind: &'static str,
    pub non_null: usize,
    pub sample: Option<String>,
}

/// Per column: type, non-missing count, and the first record's value.
pub fn dictionary(records: &[CleanRecord]) -> Vec<DictionaryEntry> {
    COLUMNS
        .iter()
        .map(|c| DictionaryEntry {
            column: c.name,
            kind: c.kind.label(),
            non_null: records.iter().filter(|r| (c.cell)(r).is_some()).count(),
            sample: records.first().and_then(c.cell),
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean;
    use crate::rank::rank;
    use crate::records::RawRow;

    fn cleaned() -> Vec<CleanRecord> {
        let rows = vec![
            RawRow {
                name: "Jane Doe".into(),
                gender: "F".into(),
                age: "34".into(),
                race: "10 Mile".into(),
                state: "VA".into(),
                country: "USA".into(),
                overall_place: "12".into(),
                gender_place: "3".into(),
                age_group_place: "1".into(),
                finish_time: "1:15:30".into(),
                pace: "7:33".into(),
            },
            RawRow {
                name: "Ken".into(),
                gender: "M".into(),
                age: "".into(),
                country: "KEN".into(),
                finish_time: "0:50:00".into(),
                pace: "5:00".into(),
                ..Default::default()
            },
        ];
        rank(clean(rows).0)
    }

    #[test]
    fn header_and_row_line_up() {
        let records = cleaned();
        let line = row(&records[0]);
        assert_eq!(line.len(), header().len());
        let get = |name: &str| {
            let idx = header().iter().position(|h| *h == name).unwrap();
            line[idx].clone()
        };
        assert_eq!(get("Finish Time (seconds)"), "4530");
        assert_eq!(get("Finish Time (minutes)"), "75.5");
        assert_eq!(get("Census Region"), "South");
        assert_eq!(get("Census Division"), "South Atlantic");
        assert_eq!(get("Is_Local"), "True");
        assert_eq!(get("Age Group"), "30-34");
        assert_eq!(get("Overall Percentile"), "100.0");
    }

    #[test]
    fn missing_values_are_empty_cells() {
        let records = cleaned();
        let line = row(&records[1]);
        let idx = header().iter().position(|h| *h == "State").unwrap();
        assert_eq!(line[idx], "");
        let idx = header().iter().position(|h| *h == "Overall Percentile").unwrap();
        assert_eq!(line[idx], "");
    }

    #[test]
    fn dictionary_counts_and_samples() {
        let dict = dictionary(&cleaned());
        assert_eq!(dict.len(), COLUMNS.len());
        let state = dict.iter().find(|d| d.column == "State").unwrap();
        assert_eq!(state.non_null, 1);
        assert_eq!(state.sample.as_deref(), Some("VA"));
        let pace = dict.iter().find(|d| d.column == "Pace (sec/mile)").unwrap();
        assert_eq!(pace.non_null, 2);
        assert_eq!(pace.kind, "integer");
    }

    #[test]
    fn empty_dataset_has_no_samples() {
        let dict = dictionary(&[]);
        assert!(dict.iter().all(|d| d.sample.is_none() && d.non_null == 0));
    }
}
