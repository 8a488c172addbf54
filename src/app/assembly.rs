//! Wiring: builds gateways from configuration and binds them into routers.
//!
//! This is the only place that knows which concrete gateway serves which source.
//! It makes no business decisions.

use crate::adapters::{CsvTestCaseGateway, JiraTestCaseGateway, LocalStorage, SqliteTestCaseGateway};
use crate::app::interactors::{
    ActivateTestCaseInteractor, DeactivateTestCaseInteractor, UpdateTestCaseInteractor,
};
use crate::app::queries::{GetTestCaseQueryService, ListTestCasesQueryService};
use crate::app::router::RouterBuilder;
use crate::app::{CommandRouter, QueryRouter};
use crate::config::toml_config::RouterConfig;
use crate::domain::ports::{TestCaseCommandGateway, TestCaseQueryGateway};
use crate::domain::source::Source;
use crate::utils::error::Result;
use std::sync::Arc;

/// Process-scoped routers, shared by every interactor and query service.
#[derive(Debug, Clone)]
pub struct Routers {
    pub commands: Arc<CommandRouter>,
    pub queries: Arc<QueryRouter>,
}

impl Routers {
    pub fn new(commands: CommandRouter, queries: QueryRouter) -> Self {
        Self {
            commands: Arc::new(commands),
            queries: Arc::new(queries),
        }
    }

    pub fn activate_test_case(&self) -> ActivateTestCaseInteractor {
        ActivateTestCaseInteractor::new(Arc::clone(&self.commands))
    }

    pub fn deactivate_test_case(&self) -> DeactivateTestCaseInteractor {
        DeactivateTestCaseInteractor::new(Arc::clone(&self.commands))
    }

    pub fn update_test_case(&self) -> UpdateTestCaseInteractor {
        UpdateTestCaseInteractor::new(Arc::clone(&self.commands))
    }

    pub fn get_test_case(&self) -> GetTestCaseQueryService {
        GetTestCaseQueryService::new(Arc::clone(&self.queries))
    }

    pub fn list_test_cases(&self) -> ListTestCasesQueryService {
        ListTestCasesQueryService::new(Arc::clone(&self.queries))
    }
}

/// Collects gateways that implement both ports and binds each to both routers.
pub struct GatewayBindings {
    commands: RouterBuilder<dyn TestCaseCommandGateway>,
    queries: RouterBuilder<dyn TestCaseQueryGateway>,
}

impl Default for GatewayBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayBindings {
    pub fn new() -> Self {
        Self {
            commands: CommandRouter::builder(),
            queries: QueryRouter::builder(),
        }
    }

    pub fn bind<G>(self, source: Source, gateway: Arc<G>) -> Self
    where
        G: TestCaseCommandGateway + TestCaseQueryGateway + 'static,
    {
        tracing::debug!(%source, "Binding gateway");
        let commands: Arc<dyn TestCaseCommandGateway> = gateway.clone();
        let queries: Arc<dyn TestCaseQueryGateway> = gateway;
        Self {
            commands: self.commands.bind(source, commands),
            queries: self.queries.bind(source, queries),
        }
    }

    pub fn build(self) -> Result<Routers> {
        Ok(Routers::new(self.commands.build()?, self.queries.build()?))
    }

    pub fn build_partial(self) -> Result<Routers> {
        Ok(Routers::new(
            self.commands.build_partial()?,
            self.queries.build_partial()?,
        ))
    }
}

/// Builds every configured gateway once and returns the routers that serve them.
pub async fn assemble(config: &RouterConfig) -> Result<Routers> {
    let mut bindings = GatewayBindings::new();

    if let Some(csv) = &config.sources.csv {
        let (dir, file) = csv.split_path();
        tracing::info!(path = %csv.path, "Assembling CSV gateway");
        let gateway = CsvTestCaseGateway::new(LocalStorage::new(dir), file);
        bindings = bindings.bind(Source::Csv, Arc::new(gateway));
    }

    if let Some(jira) = &config.sources.jira {
        tracing::info!(base_url = %jira.base_url, project = %jira.project_key, "Assembling Jira gateway");
        let gateway = JiraTestCaseGateway::new(jira.clone())?;
        bindings = bindings.bind(Source::Jira, Arc::new(gateway));
    }

    if let Some(database) = &config.sources.database {
        tracing::info!(path = %database.path, "Assembling database gateway");
        let gateway = SqliteTestCaseGateway::open(&database.path).await?;
        bindings = bindings.bind(Source::Database, Arc::new(gateway));
    }

    let routers = if config.router.require_all_sources {
        bindings.build()?
    } else {
        bindings.build_partial()?
    };

    tracing::info!(
        sources = ?routers.commands.bound_sources().collect::<Vec<_>>(),
        "Gateway routers assembled"
    );
    Ok(routers)
}
