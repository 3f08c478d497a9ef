//! Shared utility functions for Butterfly crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a date string in "YYYYMMDD" format (compact observation-row format)
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y%m%d")?)
    }

    /// Parse either supported format, compact first.
    pub fn parse_date_lenient(s: &str) -> anyhow::Result<NaiveDate> {
        parse_date_compact(s).or_else(|_| parse_date(s))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_compact() {
            let parsed = parse_date_compact("20230615").unwrap();
            assert_eq!(parsed, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
            assert!(parse_date_compact("2023-06-15").is_err());
        }

        #[test]
        fn test_parse_lenient_accepts_both() {
            let expected = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            assert_eq!(parse_date_lenient("20230615").unwrap(), expected);
            assert_eq!(parse_date_lenient(" 2023-06-15 ").unwrap(), expected);
        }
    }
}

/// Numeric parsing helpers for CSV fields
pub mod fields {
    /// Parse an optional numeric field: empty or whitespace-only is None.
    pub fn parse_optional_f64(s: &str) -> anyhow::Result<Option<f64>> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(trimmed.parse::<f64>()?))
    }

    /// Parse a boolean flag field: "1", "true", "yes" (any case) are true;
    /// empty, "0", "false", "no" are false.
    pub fn parse_flag(s: &str) -> bool {
        matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_optional_f64() {
            assert_eq!(parse_optional_f64("").unwrap(), None);
            assert_eq!(parse_optional_f64("  ").unwrap(), None);
            assert_eq!(parse_optional_f64("1.5").unwrap(), Some(1.5));
            assert!(parse_optional_f64("abc").is_err());
        }

        #[test]
        fn test_parse_flag() {
            assert!(parse_flag("1"));
            assert!(parse_flag("TRUE"));
            assert!(!parse_flag(""));
            assert!(!parse_flag("0"));
        }
    }
}
