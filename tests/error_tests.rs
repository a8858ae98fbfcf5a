//! Error creation, message formatting and conversion

use rusty_fundamentals::error::FundamentalsError;
use rusty_fundamentals::prelude::*;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_filter_message() {
        let err = FundamentalsError::InvalidFilter("page must be at least 1".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Invalid filter"));
        assert!(msg.contains("page must be at least 1"));
    }

    #[test]
    fn test_cancelled_message() {
        let err = FundamentalsError::Cancelled {
            completed: 12,
            total: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("40"));
        assert!(msg.contains("cancelled"));
    }

    #[test]
    fn test_company_not_found() {
        let err = FundamentalsError::CompanyNotFound(2330);
        assert_eq!(err.to_string(), "Company not found: 2330");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: FundamentalsError = io.into();
        assert!(matches!(err, FundamentalsError::IoError(_)));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_serde_conversion() {
        let parse: std::result::Result<ScreenerFilter, _> =
            serde_json::from_str("{\"signal\": [\"bullish\"]}");
        let err: FundamentalsError = parse.unwrap_err().into();
        assert!(matches!(err, FundamentalsError::SerdeError(_)));
    }

    #[test]
    fn test_toml_conversion() {
        let err = EngineConfig::from_toml_str("[trend\nwindow_size = 3").unwrap_err();
        assert!(matches!(err, FundamentalsError::TomlError(_)));
    }

    #[test]
    fn test_config_validation_error() {
        let err = EngineConfig::from_toml_str("[trend]\nwindow_size = 1")
            .and_then(|c| c.validate().map(|_| c))
            .unwrap_err();
        assert!(matches!(err, FundamentalsError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "nowhere".parse::<Market>(),
            Err(FundamentalsError::ParseError(_))
        ));
        assert!(matches!(
            "2024Q0".parse::<PeriodKey>(),
            Err(FundamentalsError::ParseError(_))
        ));
    }

    #[test]
    fn test_result_alias_with_question_mark() {
        fn parse_period(s: &str) -> Result<PeriodKey> {
            let key: PeriodKey = s.parse()?;
            Ok(key.prior())
        }
        assert_eq!(parse_period("2024Q1").unwrap(), PeriodKey::new(2023, 4).unwrap());
        assert!(parse_period("garbage").is_err());
    }
}
