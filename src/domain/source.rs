use crate::utils::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backing system that owns a test case. Requests are routed on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Source {
    Csv,
    Jira,
    Database,
}

impl Source {
    pub const COUNT: usize = 3;
    pub const ALL: [Source; Source::COUNT] = [Source::Csv, Source::Jira, Source::Database];

    /// Dense slot in a binding table.
    pub const fn index(self) -> usize {
        match self {
            Source::Csv => 0,
            Source::Jira => 1,
            Source::Database => 2,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Source::Csv => "csv",
            Source::Jira => "jira",
            Source::Database => "database",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Source::Csv),
            "jira" => Ok(Source::Jira),
            "database" | "db" => Ok(Source::Database),
            _ => Err(ServiceError::InvalidSource {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Source {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Anything that carries a source discriminator.
pub trait Routed {
    fn source(&self) -> Source;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorCategory;

    #[test]
    fn test_parse_known_sources() {
        assert_eq!("csv".parse::<Source>().unwrap(), Source::Csv);
        assert_eq!(" JIRA ".parse::<Source>().unwrap(), Source::Jira);
        assert_eq!("Database".parse::<Source>().unwrap(), Source::Database);
        assert_eq!("db".parse::<Source>().unwrap(), Source::Database);
    }

    #[test]
    fn test_parse_unknown_source_is_invalid_source() {
        let err = "excel".parse::<Source>().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidSource);
        assert!(err.to_string().contains("excel"));
    }

    #[test]
    fn test_indices_are_dense_and_unique() {
        let mut seen = [false; Source::COUNT];
        for source in Source::ALL {
            assert!(!seen[source.index()]);
            seen[source.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_serde_round_trip_and_rejection() {
        assert_eq!(serde_json::to_string(&Source::Jira).unwrap(), "\"jira\"");
        let parsed: Source = serde_json::from_str("\"database\"").unwrap();
        assert_eq!(parsed, Source::Database);
        assert!(serde_json::from_str::<Source>("\"sharepoint\"").is_err());
    }
}
