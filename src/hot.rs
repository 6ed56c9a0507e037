use serde::Deserialize;

/// A magnitude marker found in upstream popularity strings, e.g. `万` (×10 000).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HotUnit {
    pub marker: String,
    pub factor: f64,
}

impl HotUnit {
    pub fn new(marker: &str, factor: f64) -> Self {
        Self {
            marker: marker.to_string(),
            factor,
        }
    }
}

pub const MYRIAD: &str = "万";
pub const MYRIAD_FACTOR: f64 = 10_000.0;

pub fn default_units() -> Vec<HotUnit> {
    vec![HotUnit::new(MYRIAD, MYRIAD_FACTOR)]
}

/// Derive a numeric hotness score from a human-readable popularity string.
///
/// Every character other than ASCII digits and `.` is discarded and the rest is
/// parsed as a float (0 when nothing parseable remains). If the original text
/// contains a unit marker, the value is scaled by that unit's factor; the first
/// matching unit in `units` wins.
pub fn parse_hot_score(extra: Option<&str>, units: &[HotUnit]) -> f64 {
    let Some(extra) = extra else {
        return 0.0;
    };

    let digits: String = extra.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let value = parse_leading_float(&digits);
    if value == 0.0 {
        return 0.0;
    }

    match units.iter().find(|u| !u.marker.is_empty() && extra.contains(u.marker.as_str())) {
        Some(unit) => value * unit.factor,
        None => value,
    }
}

/// Parse the longest valid float prefix, the way `parseFloat` on "1.2.3" yields 1.2.
fn parse_leading_float(s: &str) -> f64 {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Render a score back to the abbreviated form shown in lists. Not an exact inverse of
/// [`parse_hot_score`]: precision beyond one decimal myriad is lost.
pub fn format_hot_score(score: f64) -> String {
    if score >= MYRIAD_FACTOR {
        // Halves round up, not to even.
        let tenths = (score / (MYRIAD_FACTOR / 10.0)).round() / 10.0;
        format!("{:.1}{}", tenths, MYRIAD)
    } else if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}
