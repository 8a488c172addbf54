// Application layer: routing, use case orchestration and wiring.

pub mod assembly;
pub mod dto;
pub mod interactors;
pub mod queries;
pub mod router;

use crate::domain::ports::{TestCaseCommandGateway, TestCaseQueryGateway};
use crate::utils::error::{ErrorCategory, ServiceError};

pub type CommandRouter = router::GatewayRouter<dyn TestCaseCommandGateway>;
pub type QueryRouter = router::GatewayRouter<dyn TestCaseQueryGateway>;

/// Logs a failed use case: business rejections at info, everything else at error.
pub(crate) fn report_failure(use_case: &str, err: &ServiceError) {
    match err.category() {
        ErrorCategory::Business => {
            tracing::info!(use_case, error = %err, "{}: rejected.", use_case);
        }
        category => {
            tracing::error!(use_case, ?category, error = %err, "{}: failed.", use_case);
        }
    }
}
