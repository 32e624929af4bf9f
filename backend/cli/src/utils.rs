use std::path::{Path, PathBuf};

use chrono::Local;
use feedback::{FeedbackPoint, FeedbackRound, RoundStatus, utils::generate_id};
use regex::Regex;

pub const ROUND_ID_PREFIX: &str = "round";

pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Lowercase name with every run of other characters collapsed to `-`.
pub fn slugify(name: &str) -> anyhow::Result<String> {
    let separators = Regex::new(r"[^a-z0-9]+")?;
    let lowered = name.to_lowercase();

    Ok(separators
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string())
}

pub fn parse_status(input: &str) -> Result<RoundStatus, String> {
    serde_json::from_value(serde_json::Value::String(input.to_lowercase()))
        .map_err(|_| format!("unknown status '{input}', expected active, completed or archived"))
}

pub fn build_round(
    name: &str,
    date: String,
    status: RoundStatus,
    items: Vec<FeedbackPoint>,
) -> FeedbackRound {
    FeedbackRound {
        id: generate_id(ROUND_ID_PREFIX),
        name: name.trim().to_string(),
        date,
        status,
        items,
    }
}

/// `<dir>/<slug>.json`, falling back to the round id for names without letters or digits.
pub fn round_path(dir: &Path, round: &FeedbackRound) -> anyhow::Result<PathBuf> {
    let slug = slugify(&round.name)?;
    let stem = if slug.is_empty() { &round.id } else { &slug };

    Ok(dir.join(format!("{stem}.json")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str) -> FeedbackPoint {
        FeedbackPoint {
            id: id.to_string(),
            x: 12.5,
            y: 300.0,
            comment: "Spacing is off".to_string(),
            page: "/".to_string(),
            timestamp: "2024-09-01T10:00:00.000Z".to_string(),
            resolved: Some(true),
            resolution: None,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sprint 12 Review").unwrap(), "sprint-12-review");
        assert_eq!(slugify("  Q3: design/copy pass!  ").unwrap(), "q3-design-copy-pass");
        assert_eq!(slugify("***").unwrap(), "");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("completed"), Ok(RoundStatus::Completed));
        assert_eq!(parse_status("Archived"), Ok(RoundStatus::Archived));
        assert!(parse_status("done").is_err());
    }

    #[test]
    fn test_build_round() {
        let round = build_round(
            " Launch ",
            "2024-09-02".to_string(),
            RoundStatus::Completed,
            vec![point("fb_1"), point("fb_2")],
        );

        assert!(round.id.starts_with("round_"));
        assert_eq!(round.name, "Launch");
        assert_eq!(round.items.len(), 2);
    }

    #[test]
    fn test_round_path() {
        let dir = Path::new("rounds");
        let named = build_round("Launch Review", today(), RoundStatus::Active, Vec::new());
        let unnamed = build_round("!!", today(), RoundStatus::Active, Vec::new());

        assert_eq!(
            round_path(dir, &named).unwrap(),
            dir.join("launch-review.json")
        );
        assert_eq!(
            round_path(dir, &unnamed).unwrap(),
            dir.join(format!("{}.json", unnamed.id))
        );
    }

    #[test]
    fn test_today_format() {
        let today = today();

        assert_eq!(today.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
    }
}
