use crate::app::dto::{GetTestCaseRequest, ListTestCasesRequest, TestCaseListView, TestCaseView};
use crate::app::{report_failure, QueryRouter};
use crate::domain::model::TestCase;
use crate::domain::source::Routed;
use crate::utils::error::Result;
use std::sync::Arc;

/// Reads a single test case from the source named in the request.
pub struct GetTestCaseQueryService {
    router: Arc<QueryRouter>,
}

impl GetTestCaseQueryService {
    const USE_CASE: &'static str = "Get test case";

    pub fn new(router: Arc<QueryRouter>) -> Self {
        Self { router }
    }

    pub async fn execute(&self, request: GetTestCaseRequest) -> Result<TestCaseView> {
        let source = request.source();
        tracing::info!(%source, test_case_id = %request.test_case_id(), "{}: started.", Self::USE_CASE);

        let test_case = self
            .fetch(&request)
            .await
            .inspect_err(|e| report_failure(Self::USE_CASE, e))?;

        let view = TestCaseView::from(test_case);
        tracing::info!(
            %source,
            test_case_id = %view.id,
            title = %view.title,
            "{}: done.",
            Self::USE_CASE
        );
        Ok(view)
    }

    async fn fetch(&self, request: &GetTestCaseRequest) -> Result<TestCase> {
        let gateway = self.router.select(request)?;
        gateway.get(request.test_case_id()).await
    }
}

/// Lists test cases matching a filter. Never mutates the backing source.
pub struct ListTestCasesQueryService {
    router: Arc<QueryRouter>,
}

impl ListTestCasesQueryService {
    const USE_CASE: &'static str = "List test cases";

    pub fn new(router: Arc<QueryRouter>) -> Self {
        Self { router }
    }

    pub async fn execute(&self, request: ListTestCasesRequest) -> Result<TestCaseListView> {
        let source = request.source();
        tracing::info!(%source, filter = ?request.filter(), "{}: started.", Self::USE_CASE);

        let test_cases = self
            .fetch(&request)
            .await
            .inspect_err(|e| report_failure(Self::USE_CASE, e))?;

        let items: Vec<TestCaseView> = test_cases.into_iter().map(TestCaseView::from).collect();
        let view = TestCaseListView {
            source,
            total: items.len(),
            items,
        };
        tracing::info!(%source, total = view.total, "{}: done.", Self::USE_CASE);
        Ok(view)
    }

    async fn fetch(&self, request: &ListTestCasesRequest) -> Result<Vec<TestCase>> {
        let gateway = self.router.select(request)?;
        gateway.list(request.filter()).await
    }
}
