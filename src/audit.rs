use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;

use crate::census;

static STATE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// Codes seen this rarely are worth a second look.
const SUSPICIOUS_MAX: usize = 5;

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(rename = "State")]
    state: Option<String>,
    #[serde(rename = "Is_US", default)]
    is_us: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StateAudit {
    /// (code, runners), most common first.
    pub counts: Vec<(String, usize)>,
    pub suspicious: Vec<(String, usize)>,
    /// Codes that are not one of the 50 states or DC.
    pub unknown: Vec<String>,
}

pub fn audit_states<'a>(us_states: impl IntoIterator<Item = &'a str>) -> StateAudit {
    let counts: Vec<(String, usize)> = us_states
        .into_iter()
        .counts()
        .into_iter()
        .map(|(code, n)| (code.to_string(), n))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();
    let suspicious = counts
        .iter()
        .filter(|(_, n)| *n <= SUSPICIOUS_MAX)
        .cloned()
        .collect();
    let unknown = counts
        .iter()
        .map(|(code, _)| code)
        .filter(|code| !STATE_CODE_RE.is_match(code) || !census::is_known_state(code))
        .cloned()
        .collect();
    StateAudit {
        counts,
        suspicious,
        unknown,
    }
}

/// Audit the `State` column of US rows in a cleaned dataset.
pub fn audit_file(path: &Path) -> Result<StateAudit> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let rows: Vec<StateRow> = rdr
        .deserialize()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to parse {:?}", path))?;
    Ok(audit_states(
        rows.iter()
            .filter(|r| r.is_us.eq_ignore_ascii_case("true"))
            .filter_map(|r| r.state.as_deref()),
    ))
}

impl StateAudit {
    pub fn print(&self) {
        println!("All US 'States' found:");
        for (code, n) in &self.counts {
            println!("  {:<4} {:>6}", code, n);
        }
        println!("\nTotal unique: {}", self.counts.len());

        println!("\n'States' with only 1-{} runners (might be errors):", SUSPICIOUS_MAX);
        for (code, n) in &self.suspicious {
            println!("  {:<4} {:>6}", code, n);
        }
        if !self.unknown.is_empty() {
            println!("\nNot a US state or DC: {}", self.unknown.join(", "));
        }
    }
}

// ── Tests ──
