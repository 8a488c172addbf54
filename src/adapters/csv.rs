//! Test cases kept in a spreadsheet export.
//!
//! Layout: `id,title,status,priority,labels,updated_at`, labels separated by `;`,
//! timestamps in RFC 3339. Every mutation rewrites the whole file.

use crate::domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseStatus, TestCaseUpdate};
use crate::domain::ports::{Storage, TestCaseCommandGateway, TestCaseQueryGateway};
use crate::domain::source::Source;
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const LABEL_SEPARATOR: char = ';';

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    title: String,
    status: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    labels: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl CsvRow {
    fn into_test_case(self) -> Result<TestCase> {
        let status = TestCaseStatus::parse(&self.status).ok_or_else(|| {
            ServiceError::integration(
                Source::Csv,
                format!("row {} has unknown status '{}'", self.id, self.status),
            )
        })?;

        let updated_at = match self.updated_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|e| {
                        ServiceError::integration(
                            Source::Csv,
                            format!("row {} has invalid updated_at '{}': {}", self.id, raw, e),
                        )
                    })?
                    .with_timezone(&Utc),
            ),
            _ => None,
        };

        let labels = self
            .labels
            .as_deref()
            .map(|raw| {
                raw.split(LABEL_SEPARATOR)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(TestCase {
            id: TestCaseId::new(self.id),
            title: self.title,
            status,
            priority: self.priority.filter(|p| !p.trim().is_empty()),
            labels,
            updated_at,
        })
    }

    fn from_test_case(test_case: &TestCase) -> Self {
        Self {
            id: test_case.id.to_string(),
            title: test_case.title.clone(),
            status: test_case.status.as_str().to_string(),
            priority: test_case.priority.clone(),
            labels: Some(test_case.labels.join(&LABEL_SEPARATOR.to_string())),
            updated_at: test_case.updated_at.map(|ts| ts.to_rfc3339()),
        }
    }
}

/// Labels must survive being joined with the separator and read back trimmed.
fn check_labels(changes: &TestCaseUpdate) -> Result<()> {
    for label in changes.labels.iter().flatten() {
        if label.contains(LABEL_SEPARATOR) || label.trim() != label.as_str() {
            return Err(ServiceError::rule_violated(format!(
                "label '{}' cannot contain '{}' or surrounding whitespace",
                label, LABEL_SEPARATOR
            )));
        }
    }
    Ok(())
}

pub struct CsvTestCaseGateway<S: Storage> {
    storage: S,
    file_name: String,
    write_lock: Mutex<()>,
}

impl<S: Storage> CsvTestCaseGateway<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<TestCase>> {
        let data = self.storage.read_file(&self.file_name).await?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());

        let mut test_cases = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            test_cases.push(row?.into_test_case()?);
        }

        tracing::debug!(file = %self.file_name, rows = test_cases.len(), "Loaded CSV test cases");
        Ok(test_cases)
    }

    async fn save(&self, test_cases: &[TestCase]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for test_case in test_cases {
            writer.serialize(CsvRow::from_test_case(test_case))?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| ServiceError::integration(Source::Csv, e.to_string()))?;

        self.storage.write_file(&self.file_name, &data).await
    }

    /// Loads, changes one row and writes the file back under the write lock.
    async fn mutate<F>(&self, id: &TestCaseId, change: F) -> Result<TestCase>
    where
        F: FnOnce(&mut TestCase) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut test_cases = self.load().await?;
        let test_case = test_cases
            .iter_mut()
            .find(|tc| &tc.id == id)
            .ok_or_else(|| ServiceError::not_found(id))?;

        change(test_case)?;
        let changed = test_case.clone();

        self.save(&test_cases).await?;
        Ok(changed)
    }
}

#[async_trait]
impl<S: Storage> TestCaseCommandGateway for CsvTestCaseGateway<S> {
    async fn activate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.mutate(id, TestCase::activate).await
    }

    async fn deactivate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.mutate(id, TestCase::deactivate).await
    }

    async fn update(&self, id: &TestCaseId, changes: &TestCaseUpdate) -> Result<TestCase> {
        check_labels(changes)?;
        self.mutate(id, |tc| tc.apply(changes)).await
    }
}

#[async_trait]
impl<S: Storage> TestCaseQueryGateway for CsvTestCaseGateway<S> {
    async fn get(&self, id: &TestCaseId) -> Result<TestCase> {
        self.load()
            .await?
            .into_iter()
            .find(|tc| &tc.id == id)
            .ok_or_else(|| ServiceError::not_found(id))
    }

    async fn list(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>> {
        Ok(filter.apply(self.load().await?))
    }
}
