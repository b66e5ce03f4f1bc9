//! Marker-line extraction from generated text

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{Estimates, RiskLevel};

const WEEKS_PER_MONTH: f64 = 52.0 / 12.0;

// A number or a range such as "12-14" or "12 to 14", followed by a unit
const DURATION_AMOUNT: &str =
    r"([0-9]+(?:\.[0-9]+)?)(?:\s*(?:-|\u{2013}|to)\s*([0-9]+(?:\.[0-9]+)?))?[\s-]*(day|week|month)s?\b";

struct Patterns {
    duration_marker: Regex,
    duration_value: Regex,
    duration_phrase: Regex,
    takt_marker: Regex,
    takt_value: Regex,
    risk_marker: Regex,
    recommendations_header: Regex,
    bullet: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        // Markers may be wrapped in markdown emphasis or headings
        Ok(Self {
            duration_marker: Regex::new(r"(?im)^[\s*#>_-]*ESTIMATED DURATION[\s*_]*:(.*)$")?,
            duration_value: Regex::new(&format!(r"(?i)^[\s*_]*{}", DURATION_AMOUNT))?,
            duration_phrase: Regex::new(&format!(r"(?i)\b{}", DURATION_AMOUNT))?,
            takt_marker: Regex::new(r"(?im)^[\s*#>_-]*TAKT TIME[\s*_]*:(.*)$")?,
            takt_value: Regex::new(r"(?i)^[\s*_]*([0-9]+(?:\.[0-9]+)?)\s*([a-z]+)?")?,
            risk_marker: Regex::new(r"(?im)^[\s*#>_-]*RISK LEVEL[\s*_]*:[\s*_]*(low|medium|moderate|high)\b")?,
            recommendations_header: Regex::new(r"(?im)^[\s*#>_-]*RECOMMENDATIONS[\s*_]*:[\s*_]*$")?,
            bullet: Regex::new(r"^\s*(?:[-*\u{2022}]|[0-9]+[.)])\s+(.+?)\s*$")?,
        })
    }
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(Patterns::compile);

fn to_weeks(value: f64, unit: &str, working_days_per_week: u32) -> f64 {
    match unit.to_lowercase().as_str() {
        "day" => value / f64::from(working_days_per_week.max(1)),
        "month" => value * WEEKS_PER_MONTH,
        _ => value,
    }
}

/// Weeks from a `DURATION_AMOUNT` match; a range counts as its midpoint
fn duration_weeks(caps: &regex::Captures, working_days_per_week: u32) -> Option<f64> {
    let low: f64 = caps.get(1)?.as_str().parse().ok()?;
    let value = match caps.get(2) {
        Some(high) => (low + high.as_str().parse::<f64>().ok()?) / 2.0,
        None => low,
    };
    Some(to_weeks(value, caps.get(3)?.as_str(), working_days_per_week))
}

/// Hours from a takt value; only hours and minutes are understood
fn takt_hours(value: f64, unit: Option<&str>) -> Option<f64> {
    match unit.map(str::to_lowercase).as_deref() {
        None | Some("h" | "hr" | "hrs" | "hour" | "hours") => Some(value),
        Some("min" | "mins" | "minute" | "minutes") => Some(value / 60.0),
        Some(other) => {
            debug!(unit = other, "takt_hours: unrecognized unit");
            None
        }
    }
}

/// Extract estimates from an agent's text
///
/// Days are working days, converted with the project's days per week, and a
/// range such as "12-14 weeks" counts as its midpoint. When no
/// `ESTIMATED DURATION` line is present the first "<n> days|weeks|months"
/// phrase is used; a marker line that cannot be read yields `None`.
pub fn extract_estimates(text: &str, working_days_per_week: u32) -> Result<Estimates, regex::Error> {
    debug!(text_len = text.len(), "extract_estimates: called");
    let patterns = PATTERNS.as_ref().map_err(Clone::clone)?;

    let duration = match patterns.duration_marker.captures(text) {
        Some(marker) => {
            let line = marker.get(1).map_or("", |m| m.as_str());
            let weeks = patterns
                .duration_value
                .captures(line)
                .and_then(|caps| duration_weeks(&caps, working_days_per_week));
            if weeks.is_none() {
                debug!(line, "extract_estimates: unreadable duration marker");
            }
            weeks
        }
        None => {
            debug!("extract_estimates: no duration marker, trying free text");
            patterns
                .duration_phrase
                .captures(text)
                .and_then(|caps| duration_weeks(&caps, working_days_per_week))
        }
    };

    let takt_time = patterns.takt_marker.captures(text).and_then(|marker| {
        let caps = patterns.takt_value.captures(marker.get(1)?.as_str())?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        takt_hours(value, caps.get(2).map(|m| m.as_str()))
    });

    let risk_level = patterns
        .risk_marker
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<RiskLevel>().ok());

    let recommendations = match patterns.recommendations_header.find(text) {
        Some(header) => {
            let mut items = Vec::new();
            for line in text[header.end()..].lines() {
                if let Some(caps) = patterns.bullet.captures(line) {
                    if let Some(item) = caps.get(1) {
                        items.push(item.as_str().to_string());
                    }
                } else if line.trim().is_empty() && items.is_empty() {
                    continue;
                } else {
                    break;
                }
            }
            items
        }
        None => Vec::new(),
    };

    Ok(Estimates {
        duration_weeks: duration,
        takt_time_hours: takt_time,
        risk_level,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_all_markers() {
        let text = "\
Analysis of the flow...

ESTIMATED DURATION: 12 weeks
TAKT TIME: 2.5 hours
RISK LEVEL: Medium
RECOMMENDATIONS:
- Split framing into two zones
- Add a buffer crew
";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(12.0));
        assert_eq!(estimates.takt_time_hours, Some(2.5));
        assert_eq!(estimates.risk_level, Some(RiskLevel::Medium));
        assert_eq!(
            estimates.recommendations,
            vec!["Split framing into two zones", "Add a buffer crew"]
        );
    }

    #[test]
    fn test_markdown_wrapped_markers() {
        let text = "**ESTIMATED DURATION:** 45 days\n**RISK LEVEL:** high\n";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(9.0));
        assert_eq!(estimates.risk_level, Some(RiskLevel::High));
    }

    #[test]
    fn test_free_text_duration_fallback() {
        let text = "We expect the work to take roughly 3 months once crews are staffed, then 2 weeks of punch list.";
        let estimates = extract_estimates(text, 5).unwrap();
        let weeks = estimates.duration_weeks.unwrap();
        assert!((weeks - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_preferred_over_free_text() {
        let text = "Phase one takes 4 weeks.\nESTIMATED DURATION: 10 weeks\n";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(10.0));
    }

    #[test]
    fn test_duration_range_uses_midpoint() {
        let text = "Mobilization takes 2 weeks.\n\nESTIMATED DURATION: 12-14 weeks\n";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(13.0));

        let estimates = extract_estimates("**ESTIMATED DURATION:** 12 to 14 weeks", 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(13.0));
    }

    #[test]
    fn test_unreadable_duration_marker_skips_free_text() {
        let text = "Mobilization takes 2 weeks.\nESTIMATED DURATION: roughly a quarter\n";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.duration_weeks, None);
    }

    #[test]
    fn test_free_text_range() {
        let estimates = extract_estimates("Expect 10-20 days of site work.", 5).unwrap();
        assert_eq!(estimates.duration_weeks, Some(3.0));
    }

    #[test]
    fn test_takt_in_minutes() {
        let estimates = extract_estimates("TAKT TIME: 30 minutes", 5).unwrap();
        assert_eq!(estimates.takt_time_hours, Some(0.5));
    }

    #[test]
    fn test_takt_hour_spellings() {
        for text in ["TAKT TIME: 2", "TAKT TIME: 2 hrs", "TAKT TIME: 2h", "**TAKT TIME:** 2 Hours per zone"] {
            let estimates = extract_estimates(text, 5).unwrap();
            assert_eq!(estimates.takt_time_hours, Some(2.0), "{}", text);
        }
    }

    #[test]
    fn test_takt_in_other_units_is_ignored() {
        let estimates = extract_estimates("TAKT TIME: 1.5 days", 5).unwrap();
        assert_eq!(estimates.takt_time_hours, None);

        let estimates = extract_estimates("TAKT TIME: 3 shifts", 5).unwrap();
        assert_eq!(estimates.takt_time_hours, None);
    }

    #[test]
    fn test_absent_markers_yield_none() {
        let estimates = extract_estimates("No figures here at all.", 5).unwrap();
        assert!(estimates.is_empty());
    }

    #[test]
    fn test_recommendations_stop_at_prose() {
        let text = "RECOMMENDATIONS:\n\n1. Stage materials per zone\n2) Daily huddles\nThat concludes the review.\n- not a recommendation";
        let estimates = extract_estimates(text, 5).unwrap();
        assert_eq!(estimates.recommendations, vec!["Stage materials per zone", "Daily huddles"]);
    }
}
