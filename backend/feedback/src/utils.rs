use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rand::Rng;

use crate::models::FeedbackRound;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// `<prefix>_<unix millis>_<7 base36 chars>`
pub fn generate_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!("{prefix}_{}_{suffix}", Utc::now().timestamp_millis())
}

/// UTC, millisecond precision, `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date.and_utc());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// Newest `date` first, unparseable dates last.
pub fn sort_newest_first(rounds: &mut [FeedbackRound]) {
    rounds.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoundStatus;

    fn round(id: &str, date: &str) -> FeedbackRound {
        FeedbackRound {
            id: id.to_string(),
            name: id.to_string(),
            date: date.to_string(),
            status: RoundStatus::Active,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id("fb");
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "fb");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 7);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id("gf"), generate_id("gf"));
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = timestamp_now();

        assert!(stamp.ends_with('Z'));
        assert!(parse_date(&stamp).is_some());
        // 2025-01-31T12:00:00.000Z
        assert_eq!(stamp.len(), 24);
    }

    #[test]
    fn test_parse_date_variants() {
        assert!(parse_date("2024-03-01").is_some());
        assert!(parse_date("2024-03-01T10:00:00Z").is_some());
        assert!(parse_date("2024-03-01T10:00:00.250").is_some());
        assert!(parse_date("last tuesday").is_none());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut rounds = vec![
            round("old", "2024-01-01"),
            round("broken", "soon"),
            round("new", "2024-06-01T08:00:00Z"),
            round("mid", "2024-03-15"),
        ];

        sort_newest_first(&mut rounds);

        let order: Vec<&str> = rounds.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, ["new", "mid", "old", "broken"]);
    }
}
