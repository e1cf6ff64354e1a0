/// Convert "H:MM:SS" or "MM:SS" to total seconds.
///
/// Never fails: empty, malformed, or wrongly shaped input is `None`, the same
/// as a missing value. Downstream filtering drops those rows.
pub fn to_seconds(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<i64> = text
        .split(':')
        .map(|p| p.trim().parse::<i64>().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [h, m, s] => h
            .checked_mul(3600)?
            .checked_add(m.checked_mul(60)?)?
            .checked_add(*s),
        [m, s] => m.checked_mul(60)?.checked_add(*s),
        _ => None,
    }
}

pub fn to_minutes(seconds: i64) -> f64 {
    seconds as f64 / 60.0
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_minutes_seconds() {
        assert_eq!(to_seconds("1:02:03"), Some(3723));
        assert_eq!(to_seconds(" 1:15:30 "), Some(4530));
    }

    #[test]
    fn minutes_seconds() {
        assert_eq!(to_seconds("45:10"), Some(2710));
        assert_eq!(to_seconds("7:05"), Some(425));
    }

    #[test]
    fn missing_and_malformed_degrade_to_none() {
        assert_eq!(to_seconds(""), None);
        assert_eq!(to_seconds("   "), None);
        assert_eq!(to_seconds("abc"), None);
        assert_eq!(to_seconds("1:xx:03"), None);
        assert_eq!(to_seconds("3723"), None);
        assert_eq!(to_seconds("1:02:03:04"), None);
    }

    #[test]
    fn oversized_components_are_none() {
        assert_eq!(to_seconds("9999999999999999:00:00"), None);
        assert_eq!(to_seconds("1:9223372036854775807:00"), None);
        assert_eq!(to_seconds("9223372036854775807:00"), None);
        assert_eq!(to_seconds("0:00:9223372036854775807"), Some(i64::MAX));
    }

    #[test]
    fn minutes_are_exact_division() {
        assert_eq!(to_minutes(2710), 2710.0 / 60.0);
        assert_eq!(to_minutes(5400), 90.0);
    }
}
