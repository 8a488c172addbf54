use anyhow::Result;
use std::sync::Arc;
use tc_router::adapters::{CsvTestCaseGateway, LocalStorage};
use tc_router::{
    TestCaseCommandGateway, TestCaseFilter, TestCaseId, TestCaseQueryGateway, TestCaseStatus,
    TestCaseUpdate,
};
use tempfile::TempDir;
use tokio_test::assert_ok;

const ROWS: usize = 8;

fn sheet() -> String {
    let mut content = String::from("id,title,status,priority,labels,updated_at\n");
    for i in 0..ROWS {
        content.push_str(&format!("tc-{},Case {},draft,,smoke,\n", i, i));
    }
    content
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_keep_every_change() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("cases.csv"), sheet())?;
    let gateway = Arc::new(CsvTestCaseGateway::new(
        LocalStorage::new(temp_dir.path()),
        "cases.csv",
    ));

    let handles: Vec<_> = (0..ROWS)
        .map(|i| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                let changes = TestCaseUpdate {
                    title: Some(format!("Renamed {}", i)),
                    ..Default::default()
                };
                gateway
                    .update(&TestCaseId::new(format!("tc-{}", i)), &changes)
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await?);
    }

    let test_cases = gateway.list(&TestCaseFilter::default()).await?;
    assert_eq!(test_cases.len(), ROWS);
    for (i, test_case) in test_cases.iter().enumerate() {
        assert_eq!(test_case.id.as_str(), format!("tc-{}", i));
        assert_eq!(test_case.title, format!("Renamed {}", i));
        assert!(test_case.updated_at.is_some());
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_commands_on_one_sheet() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("cases.csv"), sheet())?;
    let gateway = Arc::new(CsvTestCaseGateway::new(
        LocalStorage::new(temp_dir.path()),
        "cases.csv",
    ));

    let handles: Vec<_> = (0..ROWS)
        .map(|i| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                let id = TestCaseId::new(format!("tc-{}", i));
                if i % 2 == 0 {
                    gateway.activate(&id).await
                } else {
                    let changes = TestCaseUpdate {
                        labels: Some(vec!["smoke".to_string(), format!("batch-{}", i)]),
                        ..Default::default()
                    };
                    gateway.update(&id, &changes).await
                }
            })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await?);
    }

    let active = gateway
        .list(&TestCaseFilter {
            status: Some(TestCaseStatus::Active),
            ..Default::default()
        })
        .await?;
    assert_eq!(active.len(), ROWS / 2);

    for i in (1..ROWS).step_by(2) {
        let test_case = gateway.get(&TestCaseId::new(format!("tc-{}", i))).await?;
        assert_eq!(test_case.labels, vec!["smoke".to_string(), format!("batch-{}", i)]);
        assert_eq!(test_case.status, TestCaseStatus::Draft);
    }
    Ok(())
}
