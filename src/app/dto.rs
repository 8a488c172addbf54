//! Request and result DTOs for the test case use cases.
//!
//! Requests are built once by the calling layer and consumed by value. Results
//! carry data only.

use crate::domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseStatus, TestCaseUpdate};
use crate::domain::source::{Routed, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateTestCaseRequest {
    test_case_id: TestCaseId,
    source: Source,
}

impl ActivateTestCaseRequest {
    pub fn new(test_case_id: impl Into<TestCaseId>, source: Source) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            source,
        }
    }

    pub fn test_case_id(&self) -> &TestCaseId {
        &self.test_case_id
    }
}

impl Routed for ActivateTestCaseRequest {
    fn source(&self) -> Source {
        self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateTestCaseRequest {
    test_case_id: TestCaseId,
    source: Source,
}

impl DeactivateTestCaseRequest {
    pub fn new(test_case_id: impl Into<TestCaseId>, source: Source) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            source,
        }
    }

    pub fn test_case_id(&self) -> &TestCaseId {
        &self.test_case_id
    }
}

impl Routed for DeactivateTestCaseRequest {
    fn source(&self) -> Source {
        self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTestCaseRequest {
    test_case_id: TestCaseId,
    changes: TestCaseUpdate,
    source: Source,
}

impl UpdateTestCaseRequest {
    pub fn new(test_case_id: impl Into<TestCaseId>, changes: TestCaseUpdate, source: Source) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            changes,
            source,
        }
    }

    pub fn test_case_id(&self) -> &TestCaseId {
        &self.test_case_id
    }

    pub fn changes(&self) -> &TestCaseUpdate {
        &self.changes
    }
}

impl Routed for UpdateTestCaseRequest {
    fn source(&self) -> Source {
        self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTestCaseRequest {
    test_case_id: TestCaseId,
    source: Source,
}

impl GetTestCaseRequest {
    pub fn new(test_case_id: impl Into<TestCaseId>, source: Source) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            source,
        }
    }

    pub fn test_case_id(&self) -> &TestCaseId {
        &self.test_case_id
    }
}

impl Routed for GetTestCaseRequest {
    fn source(&self) -> Source {
        self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTestCasesRequest {
    #[serde(default)]
    filter: TestCaseFilter,
    source: Source,
}

impl ListTestCasesRequest {
    pub fn new(filter: TestCaseFilter, source: Source) -> Self {
        Self { filter, source }
    }

    pub fn filter(&self) -> &TestCaseFilter {
        &self.filter
    }
}

impl Routed for ListTestCasesRequest {
    fn source(&self) -> Source {
        self.source
    }
}

/// Confirmation returned by activate / deactivate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReceipt {
    pub test_case_id: TestCaseId,
    pub status: TestCaseStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TestCase> for CommandReceipt {
    fn from(test_case: TestCase) -> Self {
        Self {
            test_case_id: test_case.id,
            status: test_case.status,
            updated_at: test_case.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseView {
    pub id: String,
    pub title: String,
    pub status: TestCaseStatus,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TestCase> for TestCaseView {
    fn from(test_case: TestCase) -> Self {
        Self {
            id: test_case.id.as_str().to_string(),
            title: test_case.title,
            status: test_case.status,
            priority: test_case.priority,
            labels: test_case.labels,
            updated_at: test_case.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseListView {
    pub source: Source,
    pub items: Vec<TestCaseView>,
    pub total: usize,
}
