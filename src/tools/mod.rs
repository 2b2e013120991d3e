pub mod auth;
pub mod chat;
pub mod diary;
pub mod success;

use chrono::NaiveDate;

/// Parse a `YYYY-MM-DD` calendar date from a tool argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("invalid date (expected YYYY-MM-DD): {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("2024-05-08").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()
        );
        assert_eq!(parse_date(" 2024-05-08 ").unwrap().to_string(), "2024-05-08");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("05/08/2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }
}
