use crate::utils::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCaseId(String);

impl TestCaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestCaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TestCaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCaseStatus {
    Draft,
    Active,
    Deprecated,
}

impl TestCaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseStatus::Draft => "draft",
            TestCaseStatus::Active => "active",
            TestCaseStatus::Deprecated => "deprecated",
        }
    }

    /// Lenient parse for values coming out of spreadsheets and tables.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(TestCaseStatus::Draft),
            "active" => Some(TestCaseStatus::Active),
            "deprecated" => Some(TestCaseStatus::Deprecated),
            _ => None,
        }
    }
}

impl fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub title: String,
    pub status: TestCaseStatus,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TestCase {
    pub fn new(id: impl Into<TestCaseId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: TestCaseStatus::Draft,
            priority: None,
            labels: Vec::new(),
            updated_at: None,
        }
    }

    pub fn with_status(mut self, status: TestCaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn activate(&mut self) -> Result<()> {
        match self.status {
            TestCaseStatus::Draft => {
                self.status = TestCaseStatus::Active;
                self.touch();
                Ok(())
            }
            TestCaseStatus::Active => Err(ServiceError::conflict(&self.id, "already active")),
            TestCaseStatus::Deprecated => Err(ServiceError::rule_violated(format!(
                "deprecated test case {} cannot be activated",
                self.id
            ))),
        }
    }

    pub fn deactivate(&mut self) -> Result<()> {
        match self.status {
            TestCaseStatus::Active => {
                self.status = TestCaseStatus::Draft;
                self.touch();
                Ok(())
            }
            other => Err(ServiceError::conflict(
                &self.id,
                format!("cannot deactivate a {} test case", other),
            )),
        }
    }

    pub fn apply(&mut self, changes: &TestCaseUpdate) -> Result<()> {
        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(ServiceError::rule_violated("title cannot be empty"));
            }
        }
        if let Some(labels) = &changes.labels {
            if labels.iter().any(|l| l.trim().is_empty()) {
                return Err(ServiceError::rule_violated("labels cannot be blank"));
            }
        }

        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(priority) = &changes.priority {
            self.priority = Some(priority.clone());
        }
        if let Some(labels) = &changes.labels {
            self.labels = labels.clone();
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseUpdate {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl TestCaseUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none() && self.labels.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseFilter {
    pub status: Option<TestCaseStatus>,
    pub label: Option<String>,
    pub title_contains: Option<String>,
    pub limit: Option<usize>,
}

impl TestCaseFilter {
    pub fn matches(&self, test_case: &TestCase) -> bool {
        if let Some(status) = self.status {
            if test_case.status != status {
                return false;
            }
        }
        if let Some(label) = &self.label {
            if !test_case.labels.iter().any(|l| l == label) {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !test_case
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Filters in memory and truncates to `limit`, for gateways that cannot push filters down.
    pub fn apply<I>(&self, test_cases: I) -> Vec<TestCase>
    where
        I: IntoIterator<Item = TestCase>,
    {
        let matching = test_cases.into_iter().filter(|tc| self.matches(tc));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorCategory;

    #[test]
    fn test_activate_draft() {
        let mut tc = TestCase::new("tc-1", "Login works");
        tc.activate().unwrap();
        assert_eq!(tc.status, TestCaseStatus::Active);
        assert!(tc.updated_at.is_some());
    }

    #[test]
    fn test_activate_active_is_conflict() {
        let mut tc = TestCase::new("tc-1", "Login works").with_status(TestCaseStatus::Active);
        let err = tc.activate().unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[test]
    fn test_activate_deprecated_violates_rule() {
        let mut tc = TestCase::new("tc-1", "Login works").with_status(TestCaseStatus::Deprecated);
        let err = tc.activate().unwrap_err();
        assert!(matches!(err, ServiceError::RuleViolated { .. }));
        assert_eq!(tc.status, TestCaseStatus::Deprecated);
    }

    #[test]
    fn test_deactivate_requires_active() {
        let mut tc = TestCase::new("tc-1", "Login works").with_status(TestCaseStatus::Active);
        tc.deactivate().unwrap();
        assert_eq!(tc.status, TestCaseStatus::Draft);
        assert_eq!(tc.deactivate().unwrap_err().category(), ErrorCategory::Business);
    }

    #[test]
    fn test_apply_rejects_blank_title() {
        let mut tc = TestCase::new("tc-1", "Login works");
        let changes = TestCaseUpdate {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            tc.apply(&changes),
            Err(ServiceError::RuleViolated { .. })
        ));
        assert_eq!(tc.title, "Login works");
    }

    #[test]
    fn test_apply_rejects_blank_label_without_partial_change() {
        let mut tc = TestCase::new("tc-1", "Login works").with_labels(["smoke"]);
        let changes = TestCaseUpdate {
            title: Some("Login with SSO".to_string()),
            labels: Some(vec!["auth".to_string(), " ".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            tc.apply(&changes),
            Err(ServiceError::RuleViolated { .. })
        ));
        assert_eq!(tc.title, "Login works");
        assert_eq!(tc.labels, vec!["smoke"]);
        assert!(tc.updated_at.is_none());
    }

    #[test]
    fn test_filter_matches_and_limits() {
        let cases = vec![
            TestCase::new("tc-1", "Login works").with_labels(["smoke"]),
            TestCase::new("tc-2", "Logout works")
                .with_labels(["smoke"])
                .with_status(TestCaseStatus::Active),
            TestCase::new("tc-3", "Checkout").with_labels(["regression"]),
        ];

        let filter = TestCaseFilter {
            label: Some("smoke".to_string()),
            title_contains: Some("LOG".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(cases.clone()).len(), 2);

        let limited = TestCaseFilter {
            limit: Some(1),
            ..filter
        };
        let result = limited.apply(cases);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "tc-1");
    }
}
