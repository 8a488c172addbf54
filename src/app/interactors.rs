//! Command-side use cases.
//!
//! Each interactor resolves the gateway for the request's source, calls the
//! port with the business fields only, and shapes the result. Errors from the
//! router or the gateway are returned unchanged.

use crate::app::dto::{
    ActivateTestCaseRequest, CommandReceipt, DeactivateTestCaseRequest, TestCaseView,
    UpdateTestCaseRequest,
};
use crate::app::{report_failure, CommandRouter};
use crate::domain::source::Routed;
use crate::utils::error::{Result, ServiceError};
use std::sync::Arc;

pub struct ActivateTestCaseInteractor {
    router: Arc<CommandRouter>,
}

impl ActivateTestCaseInteractor {
    const USE_CASE: &'static str = "Activate test case";

    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }

    pub async fn execute(&self, request: ActivateTestCaseRequest) -> Result<CommandReceipt> {
        self.run(&request)
            .await
            .inspect_err(|e| report_failure(Self::USE_CASE, e))
    }

    async fn run(&self, request: &ActivateTestCaseRequest) -> Result<CommandReceipt> {
        let source = request.source();
        tracing::debug!(%source, test_case_id = %request.test_case_id(), "{}: received.", Self::USE_CASE);

        let gateway = self.router.select(request)?;
        tracing::debug!(%source, "{}: gateway resolved.", Self::USE_CASE);

        let activated = gateway.activate(request.test_case_id()).await?;
        tracing::debug!(%source, "{}: executed.", Self::USE_CASE);

        let receipt = CommandReceipt::from(activated);
        tracing::info!(
            %source,
            test_case_id = %receipt.test_case_id,
            status = %receipt.status,
            "{}: done.",
            Self::USE_CASE
        );
        Ok(receipt)
    }
}

pub struct DeactivateTestCaseInteractor {
    router: Arc<CommandRouter>,
}

impl DeactivateTestCaseInteractor {
    const USE_CASE: &'static str = "Deactivate test case";

    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }

    pub async fn execute(&self, request: DeactivateTestCaseRequest) -> Result<CommandReceipt> {
        self.run(&request)
            .await
            .inspect_err(|e| report_failure(Self::USE_CASE, e))
    }

    async fn run(&self, request: &DeactivateTestCaseRequest) -> Result<CommandReceipt> {
        let source = request.source();
        tracing::debug!(%source, test_case_id = %request.test_case_id(), "{}: received.", Self::USE_CASE);

        let gateway = self.router.select(request)?;
        tracing::debug!(%source, "{}: gateway resolved.", Self::USE_CASE);
        let deactivated = gateway.deactivate(request.test_case_id()).await?;
        tracing::debug!(%source, "{}: executed.", Self::USE_CASE);

        let receipt = CommandReceipt::from(deactivated);
        tracing::info!(
            %source,
            test_case_id = %receipt.test_case_id,
            status = %receipt.status,
            "{}: done.",
            Self::USE_CASE
        );
        Ok(receipt)
    }
}

pub struct UpdateTestCaseInteractor {
    router: Arc<CommandRouter>,
}

impl UpdateTestCaseInteractor {
    const USE_CASE: &'static str = "Update test case";

    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }

    pub async fn execute(&self, request: UpdateTestCaseRequest) -> Result<TestCaseView> {
        self.run(&request)
            .await
            .inspect_err(|e| report_failure(Self::USE_CASE, e))
    }

    async fn run(&self, request: &UpdateTestCaseRequest) -> Result<TestCaseView> {
        let source = request.source();
        tracing::debug!(%source, test_case_id = %request.test_case_id(), "{}: received.", Self::USE_CASE);

        // Checked before routing so no backend sees a no-op write.
        if request.changes().is_empty() {
            return Err(ServiceError::rule_violated(
                "update must change at least one field",
            ));
        }

        let gateway = self.router.select(request)?;
        tracing::debug!(%source, "{}: gateway resolved.", Self::USE_CASE);
        let updated = gateway
            .update(request.test_case_id(), request.changes())
            .await?;
        tracing::debug!(%source, "{}: executed.", Self::USE_CASE);

        tracing::info!(%source, test_case_id = %updated.id, "{}: done.", Self::USE_CASE);
        Ok(TestCaseView::from(updated))
    }
}
