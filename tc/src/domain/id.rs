//! Domain ID generation
//!
//! All IDs use the format: `{6-char-hex}-{type}-{slug}`
//! Example: `019774-session-riverside-tower`
//!
//! The hex prefix is the leading time field of a UUIDv7 for the given
//! instant, so the same instant and title always give the same ID.

use chrono::{DateTime, Utc};
use uuid::{NoContext, Timestamp, Uuid};

/// Generate a domain ID from type, title and creation time
pub fn generate_id(domain_type: &str, title: &str, at: DateTime<Utc>) -> String {
    let seconds = u64::try_from(at.timestamp()).unwrap_or(0);
    let uuid = Uuid::new_v7(Timestamp::from_unix(NoContext, seconds, at.timestamp_subsec_nanos()));
    let hex_prefix = &uuid.simple().to_string()[..6];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex_prefix, domain_type)
    } else {
        format!("{}-{}-{}", hex_prefix, domain_type, slug)
    }
}

/// Slugify a title for use in IDs
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Riverside Tower"), "riverside-tower");
        assert_eq!(slugify("Bob's  Plant #2"), "bobs-plant-2");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("session", "Riverside Tower", at(1_750_000_000));
        assert_eq!(id, "019774-session-riverside-tower");
    }

    #[test]
    fn test_generate_id_same_instant_same_id() {
        let first = generate_id("session", "Riverside Tower", at(1_750_000_000));
        let second = generate_id("session", "Riverside Tower", at(1_750_000_000));
        assert_eq!(first, second);

        let later = generate_id("session", "Riverside Tower", at(1_760_000_000));
        assert_ne!(first, later);
    }

    #[test]
    fn test_generate_id_empty_title() {
        let id = generate_id("session", "!!!", at(1_750_000_000));
        assert_eq!(id, "019774-session");
    }
}
