pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::RouterConfig;

pub use app::assembly::{assemble, GatewayBindings, Routers};
pub use app::router::{GatewayRouter, RouterBuilder};
pub use app::{CommandRouter, QueryRouter};
pub use domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseStatus, TestCaseUpdate};
pub use domain::ports::{TestCaseCommandGateway, TestCaseQueryGateway};
pub use domain::source::{Routed, Source};
pub use utils::error::{Result, ServiceError};
