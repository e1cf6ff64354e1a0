use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("info block has {found} segments, expected 4")]
    InfoSegments { found: usize },
    #[error("gender/age token {0:?} has no age")]
    MissingAge(String),
    #[error("location {0:?} has no country")]
    MissingCountry(String),
}

/// The four `|`-separated parts of a runner's info line:
/// "M-34 | | Run | Arlington, VA USA".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoBlock {
    pub gender_age: String,
    pub race: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub state: String,
    pub country: String,
}

/// Blank out empty values and the ", " placeholder the viewer shows for
/// runners without a city.
pub fn checked_text(value: &str) -> String {
    if value.is_empty() || value == ", " {
        String::new()
    } else {
        value.to_string()
    }
}

/// Collapse runs of whitespace the way rendered element text reads.
pub fn rendered_text<'a>(pieces: impl IntoIterator<Item = &'a str>) -> String {
    let joined: String = pieces.into_iter().collect();
    joined.split_whitespace().join(" ")
}

pub fn split_info(info: &str) -> Result<InfoBlock, FieldError> {
    let parts: Vec<&str> = info.split('|').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(FieldError::InfoSegments { found: parts.len() });
    }
    Ok(InfoBlock {
        gender_age: parts[0].to_string(),
        race: parts[2].to_string(),
        location: parts[3].to_string(),
    })
}

/// "M-34" -> ("M", "34"). The age stays text; typing happens during cleaning.
pub fn split_gender_age(token: &str) -> Result<(String, String), FieldError> {
    let mut segments = token.split('-');
    let gender = segments.next().unwrap_or_default().trim().to_string();
    let age = segments
        .next()
        .ok_or_else(|| FieldError::MissingAge(token.to_string()))?
        .trim()
        .to_string();
    Ok((gender, age))
}

/// "Arlington, VA USA" -> state "VA", country "USA".
///
/// The country is the last space-separated word. The state is the last two
/// characters of what precedes it, so a city that ends in two capitals reads
/// as a state.
pub fn split_location(location: &str) -> Result<Location, FieldError> {
    let (fragment, country) = location
        .rsplit_once(' ')
        .ok_or_else(|| FieldError::MissingCountry(location.to_string()))?;
    Ok(Location {
        state: last_two_chars(fragment),
        country: country.to_string(),
    })
}

fn last_two_chars(s: &str) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(2)).collect()
}

// ── Tests ──
