use crate::domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseUpdate};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// State-changing operations on test cases, identical for every backing source.
///
/// Failures use the shared taxonomy: `NotFound`, `Conflict` and `RuleViolated` for
/// business outcomes, integration variants when the backend itself misbehaves.
#[async_trait]
pub trait TestCaseCommandGateway: Send + Sync {
    async fn activate(&self, id: &TestCaseId) -> Result<TestCase>;
    async fn deactivate(&self, id: &TestCaseId) -> Result<TestCase>;
    async fn update(&self, id: &TestCaseId, changes: &TestCaseUpdate) -> Result<TestCase>;
}

/// Read-only operations on test cases.
#[async_trait]
pub trait TestCaseQueryGateway: Send + Sync {
    async fn get(&self, id: &TestCaseId) -> Result<TestCase>;
    async fn list(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>>;
}
