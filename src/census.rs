//! US Census Bureau regions and divisions keyed by two-letter state code.

pub const MILITARY_CODES: [&str; 3] = ["AA", "AE", "AP"];
pub const LOCAL_CODES: [&str; 3] = ["DC", "MD", "VA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Northeast,
    Midwest,
    South,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Division {
    NewEngland,
    MiddleAtlantic,
    EastNorthCentral,
    WestNorthCentral,
    SouthAtlantic,
    EastSouthCentral,
    WestSouthCentral,
    Mountain,
    Pacific,
}

const DIVISION_STATES: [(Division, &[&str]); 9] = [
    (Division::NewEngland, &["CT", "ME", "MA", "NH", "RI", "VT"]),
    (Division::MiddleAtlantic, &["NJ", "NY", "PA"]),
    (Division::EastNorthCentral, &["IL", "IN", "MI", "OH", "WI"]),
    (Division::WestNorthCentral, &["IA", "KS", "MN", "MO", "NE", "ND", "SD"]),
    (
        Division::SouthAtlantic,
        &["DE", "FL", "GA", "MD", "NC", "SC", "VA", "DC", "WV"],
    ),
    (Division::EastSouthCentral, &["AL", "KY", "MS", "TN"]),
    (Division::WestSouthCentral, &["AR", "LA", "OK", "TX"]),
    (Division::Mountain, &["AZ", "CO", "ID", "MT", "NV", "NM", "UT", "WY"]),
    (Division::Pacific, &["AK", "CA", "HI", "OR", "WA"]),
];

impl Division {
    pub fn region(self) -> Region {
        match self {
            Division::NewEngland | Division::MiddleAtlantic => Region::Northeast,
            Division::EastNorthCentral | Division::WestNorthCentral => Region::Midwest,
            Division::SouthAtlantic | Division::EastSouthCentral | Division::WestSouthCentral => {
                Region::South
            }
            Division::Mountain | Division::Pacific => Region::West,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Division::NewEngland => "New England",
            Division::MiddleAtlantic => "Middle Atlantic",
            Division::EastNorthCentral => "East North Central",
            Division::WestNorthCentral => "West North Central",
            Division::SouthAtlantic => "South Atlantic",
            Division::EastSouthCentral => "East South Central",
            Division::WestSouthCentral => "West South Central",
            Division::Mountain => "Mountain",
            Division::Pacific => "Pacific",
        }
    }
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::Midwest => "Midwest",
            Region::South => "South",
            Region::West => "West",
        }
    }
}

/// Outcome of classifying a state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Census {
    Division(Division),
    Military,
    Other,
}

impl Census {
    pub fn region_label(self) -> &'static str {
        match self {
            Census::Division(d) => d.region().label(),
            Census::Military => "U.S. Military",
            Census::Other => "Other",
        }
    }

    pub fn division_label(self) -> &'static str {
        match self {
            Census::Division(d) => d.label(),
            Census::Military => "U.S. Military",
            Census::Other => "Other",
        }
    }
}

pub fn is_military(code: &str) -> bool {
    MILITARY_CODES.contains(&code)
}

pub fn is_local(code: &str) -> bool {
    LOCAL_CODES.contains(&code)
}

/// Classify a state code. Unknown codes fall into `Census::Other`.
pub fn classify(code: &str) -> Census {
    let code = code.trim().to_uppercase();
    if is_military(&code) {
        return Census::Military;
    }
    DIVISION_STATES
        .iter()
        .find(|(_, states)| states.contains(&code.as_str()))
        .map(|(division, _)| Census::Division(*division))
        .unwrap_or(Census::Other)
}

/// True for the 50 states and DC.
pub fn is_known_state(code: &str) -> bool {
    matches!(classify(code), Census::Division(_))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virginia_is_south_atlantic_and_local() {
        let c = classify("VA");
        assert_eq!(c.division_label(), "South Atlantic");
        assert_eq!(c.region_label(), "South");
        assert!(is_local("VA"));
    }

    #[test]
    fn military_codes() {
        for code in MILITARY_CODES {
            assert_eq!(classify(code), Census::Military);
        }
        assert_eq!(classify("AE").region_label(), "U.S. Military");
    }

    #[test]
    fn unknown_code_is_other() {
        assert_eq!(classify("ZZ"), Census::Other);
        assert_eq!(classify("ZZ").region_label(), "Other");
        assert_eq!(classify("ZZ").division_label(), "Other");
    }

    #[test]
    fn lowercase_and_padding_are_normalized() {
        assert_eq!(classify(" ca "), Census::Division(Division::Pacific));
    }

    #[test]
    fn table_covers_fifty_states_and_dc() {
        let total: usize = DIVISION_STATES.iter().map(|(_, s)| s.len()).sum();
        assert_eq!(total, 51);
        assert!(is_known_state("DC"));
        assert!(!is_known_state("PR"));
    }
}
