mod common;

use anyhow::Result;
use common::{fixture, fixture_with, Call, LogCapture, Outcome};
use std::sync::Arc;
use tc_router::app::dto::{
    ActivateTestCaseRequest, DeactivateTestCaseRequest, UpdateTestCaseRequest,
};
use tc_router::utils::error::ErrorCategory;
use tc_router::{ServiceError, Source, TestCaseStatus, TestCaseUpdate};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_activate_reaches_only_the_csv_gateway() -> Result<()> {
    let fx = fixture();

    let receipt = fx
        .routers
        .activate_test_case()
        .execute(ActivateTestCaseRequest::new("tc-1", Source::Csv))
        .await?;

    assert_eq!(receipt.test_case_id.as_str(), "tc-1");
    assert_eq!(receipt.status, TestCaseStatus::Active);
    assert_eq!(fx.csv.calls(), vec![Call::Activate("tc-1".into())]);
    assert!(fx.jira.calls().is_empty());
    assert!(fx.database.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_not_found_from_jira_is_propagated_unchanged() {
    let fx = fixture_with(Outcome::Succeed, Outcome::NotFound, Outcome::Succeed);

    let err = fx
        .routers
        .deactivate_test_case()
        .execute(DeactivateTestCaseRequest::new("QA-404", Source::Jira))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { ref id } if id == "QA-404"));
    assert_eq!(err.category(), ErrorCategory::Business);
    assert_eq!(err.status_code(), 404);
    assert_eq!(fx.jira.calls(), vec![Call::Deactivate("QA-404".into())]);
}

#[tokio::test]
async fn test_integration_failure_keeps_its_backend() {
    let fx = fixture_with(Outcome::Succeed, Outcome::Unavailable, Outcome::Succeed);

    let err = fx
        .routers
        .activate_test_case()
        .execute(ActivateTestCaseRequest::new("QA-1", Source::Jira))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Integration {
            backend: Source::Jira,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(err.category(), ErrorCategory::Integration);
}

#[tokio::test]
async fn test_csv_integration_failure_names_csv() {
    let fx = fixture_with(Outcome::Unavailable, Outcome::Succeed, Outcome::Succeed);

    let err = fx
        .routers
        .update_test_case()
        .execute(UpdateTestCaseRequest::new(
            "tc-1",
            TestCaseUpdate {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
            Source::Csv,
        ))
        .await
        .unwrap_err();

    match &err {
        ServiceError::Integration { backend, message } => {
            assert_eq!(*backend, Source::Csv);
            assert!(message.contains("csv is down"));
        }
        other => panic!("expected Integration, got {:?}", other),
    }
    assert!(fx.jira.calls().is_empty());
}

#[tokio::test]
async fn test_every_command_logs_resolution_and_execution() -> Result<()> {
    let fx = fixture();
    let logs = LogCapture::default();
    let _guard = logs.install();

    fx.routers
        .activate_test_case()
        .execute(ActivateTestCaseRequest::new("tc-1", Source::Csv))
        .await?;
    fx.routers
        .deactivate_test_case()
        .execute(DeactivateTestCaseRequest::new("QA-1", Source::Jira))
        .await?;
    fx.routers
        .update_test_case()
        .execute(UpdateTestCaseRequest::new(
            "tc-1",
            TestCaseUpdate {
                priority: Some("Low".to_string()),
                ..Default::default()
            },
            Source::Database,
        ))
        .await?;

    let output = logs.contents();
    for use_case in ["Activate test case", "Deactivate test case", "Update test case"] {
        for step in ["received.", "gateway resolved.", "executed.", "done."] {
            let line = format!("{}: {}", use_case, step);
            assert!(output.contains(&line), "missing `{}` in:\n{}", line, output);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_update_never_reaches_a_gateway() {
    let fx = fixture();

    let result = fx
        .routers
        .update_test_case()
        .execute(UpdateTestCaseRequest::new(
            "tc-1",
            TestCaseUpdate::default(),
            Source::Database,
        ))
        .await;

    let err = assert_err!(result);
    assert!(matches!(err, ServiceError::RuleViolated { .. }));
    assert!(fx.database.calls().is_empty());
}

#[tokio::test]
async fn test_update_passes_only_business_fields() -> Result<()> {
    let fx = fixture();
    let changes = TestCaseUpdate {
        title: Some("Login with SSO".to_string()),
        labels: Some(vec!["smoke".to_string(), "sso".to_string()]),
        ..Default::default()
    };

    let view = fx
        .routers
        .update_test_case()
        .execute(UpdateTestCaseRequest::new(
            "tc-9",
            changes.clone(),
            Source::Database,
        ))
        .await?;

    assert_eq!(view.id, "tc-9");
    assert_eq!(view.title, "Login with SSO");
    assert_eq!(view.labels, vec!["smoke", "sso"]);
    assert_eq!(
        fx.database.calls(),
        vec![Call::Update("tc-9".into(), changes)]
    );
    Ok(())
}

#[tokio::test]
async fn test_concurrent_commands_share_one_router() -> Result<()> {
    let fx = fixture();
    let interactor = Arc::new(fx.routers.activate_test_case());

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let interactor = Arc::clone(&interactor);
            let source = Source::ALL[i % Source::COUNT];
            tokio::spawn(async move {
                interactor
                    .execute(ActivateTestCaseRequest::new(format!("tc-{}", i), source))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await?);
    }

    assert_eq!(fx.csv.calls().len(), 4);
    assert_eq!(fx.jira.calls().len(), 4);
    assert_eq!(fx.database.calls().len(), 4);
    let mut csv_ids: Vec<String> = fx
        .csv
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Activate(id) => id,
            other => panic!("unexpected call: {:?}", other),
        })
        .collect();
    csv_ids.sort();
    assert_eq!(csv_ids, vec!["tc-0", "tc-3", "tc-6", "tc-9"]);
    Ok(())
}
