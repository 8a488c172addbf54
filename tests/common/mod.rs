#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex};
use tc_router::{
    GatewayBindings, Result, Routers, ServiceError, Source, TestCase, TestCaseCommandGateway,
    TestCaseFilter, TestCaseId, TestCaseQueryGateway, TestCaseStatus, TestCaseUpdate,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Activate(String),
    Deactivate(String),
    Update(String, TestCaseUpdate),
    Get(String),
    List(TestCaseFilter),
}

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Succeed,
    NotFound,
    Unavailable,
}

/// Gateway double that records every call and answers with a fixed outcome.
pub struct MockGateway {
    pub name: &'static str,
    pub source: Source,
    outcome: Outcome,
    cases: Vec<TestCase>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new(name: &'static str, source: Source) -> Arc<Self> {
        Self::with_outcome(name, source, Outcome::Succeed)
    }

    pub fn with_outcome(name: &'static str, source: Source, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name,
            source,
            outcome,
            cases: vec![
                TestCase::new("tc-1", format!("{} login", name)).with_labels(["smoke"]),
                TestCase::new("tc-2", format!("{} logout", name)).with_status(TestCaseStatus::Active),
            ],
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn answer(&self, id: &TestCaseId, status: TestCaseStatus) -> Result<TestCase> {
        match self.outcome {
            Outcome::Succeed => Ok(TestCase::new(id.clone(), self.name).with_status(status)),
            Outcome::NotFound => Err(ServiceError::not_found(id)),
            Outcome::Unavailable => Err(ServiceError::integration(
                self.source,
                format!("{} is down", self.name),
            )),
        }
    }
}

#[async_trait]
impl TestCaseCommandGateway for MockGateway {
    async fn activate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.record(Call::Activate(id.to_string()))?;
        self.answer(id, TestCaseStatus::Active)
    }

    async fn deactivate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.record(Call::Deactivate(id.to_string()))?;
        self.answer(id, TestCaseStatus::Draft)
    }

    async fn update(&self, id: &TestCaseId, changes: &TestCaseUpdate) -> Result<TestCase> {
        self.record(Call::Update(id.to_string(), changes.clone()))?;
        let mut test_case = self.answer(id, TestCaseStatus::Draft)?;
        test_case.apply(changes)?;
        Ok(test_case)
    }
}

#[async_trait]
impl TestCaseQueryGateway for MockGateway {
    async fn get(&self, id: &TestCaseId) -> Result<TestCase> {
        self.record(Call::Get(id.to_string()))?;
        match self.outcome {
            Outcome::Succeed => self
                .cases
                .iter()
                .find(|tc| &tc.id == id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found(id)),
            _ => self.answer(id, TestCaseStatus::Draft),
        }
    }

    async fn list(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>> {
        self.record(Call::List(filter.clone()))?;
        Ok(filter.apply(self.cases.clone()))
    }
}

pub struct Fixture {
    pub csv: Arc<MockGateway>,
    pub jira: Arc<MockGateway>,
    pub database: Arc<MockGateway>,
    pub routers: Routers,
}

pub fn fixture_with(csv: Outcome, jira: Outcome, database: Outcome) -> Fixture {
    let csv = MockGateway::with_outcome("csv", Source::Csv, csv);
    let jira = MockGateway::with_outcome("jira", Source::Jira, jira);
    let database = MockGateway::with_outcome("database", Source::Database, database);

    let routers = GatewayBindings::new()
        .bind(Source::Csv, csv.clone())
        .bind(Source::Jira, jira.clone())
        .bind(Source::Database, database.clone())
        .build()
        .unwrap();

    Fixture {
        csv,
        jira,
        database,
        routers,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(Outcome::Succeed, Outcome::Succeed, Outcome::Succeed)
}

/// Collects formatted log output so tests can assert on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a debug-level subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
