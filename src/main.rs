use clap::Parser;
use serde::Serialize;
use tc_router::app::dto::{
    ActivateTestCaseRequest, DeactivateTestCaseRequest, GetTestCaseRequest, ListTestCasesRequest,
    UpdateTestCaseRequest,
};
use tc_router::config::cli::{Command, ListArgs, UpdateArgs};
use tc_router::utils::error::ErrorSeverity;
use tc_router::utils::{logger, validation::Validate};
use tc_router::{
    assemble, CliArgs, RouterConfig, Routers, ServiceError, Source, TestCaseFilter, TestCaseStatus,
    TestCaseUpdate,
};

fn exit_code(e: &ServiceError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 4,      // 請求被業務規則拒絕
        ErrorSeverity::Medium => 2,   // 後端暫時不可用，可重試
        ErrorSeverity::High => 1,     // 呼叫端輸入錯誤
        ErrorSeverity::Critical => 3, // 設定錯誤
    }
}

fn fail(e: &ServiceError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_request(args: ListArgs) -> Result<ListTestCasesRequest, ServiceError> {
    let source: Source = args.source.parse()?;
    let status = match args.status.as_deref() {
        Some(raw) => Some(TestCaseStatus::parse(raw).ok_or_else(|| {
            ServiceError::rule_violated(format!("unknown status filter '{}'", raw))
        })?),
        None => None,
    };
    let filter = TestCaseFilter {
        status,
        label: args.label,
        title_contains: args.title_contains,
        limit: args.limit,
    };
    Ok(ListTestCasesRequest::new(filter, source))
}

fn update_request(args: UpdateArgs) -> Result<UpdateTestCaseRequest, ServiceError> {
    let source: Source = args.target.source.parse()?;
    let changes = TestCaseUpdate {
        title: args.title,
        priority: args.priority,
        labels: args.labels,
    };
    Ok(UpdateTestCaseRequest::new(args.target.id, changes, source))
}

async fn run(command: Command, routers: &Routers) -> Result<(), ServiceError> {
    match command {
        Command::Activate(target) => {
            let request = ActivateTestCaseRequest::new(target.id, target.source.parse()?);
            print_json(&routers.activate_test_case().execute(request).await?)
        }
        Command::Deactivate(target) => {
            let request = DeactivateTestCaseRequest::new(target.id, target.source.parse()?);
            print_json(&routers.deactivate_test_case().execute(request).await?)
        }
        Command::Update(args) => {
            let request = update_request(args)?;
            print_json(&routers.update_test_case().execute(request).await?)
        }
        Command::Get(target) => {
            let request = GetTestCaseRequest::new(target.id, target.source.parse()?);
            print_json(&routers.get_test_case().execute(request).await?)
        }
        Command::List(args) => {
            let request = list_request(args)?;
            print_json(&routers.list_test_cases().execute(request).await?)
        }
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match RouterConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", args.config.display(), e);
            std::process::exit(exit_code(&e));
        }
    };

    if args.json_logs || config.json_logs() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("Starting tc-router CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let routers = match assemble(&config).await {
        Ok(routers) => routers,
        Err(e) => fail(&e),
    };

    if let Err(e) = run(args.command, &routers).await {
        fail(&e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_exits_as_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RouterConfig::from_file(dir.path().join("router.toml")).unwrap_err();
        assert_eq!(exit_code(&err), 3);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(exit_code(&ServiceError::rule_violated("no")), 4);
        assert_eq!(
            exit_code(&ServiceError::integration(Source::Jira, "down")),
            2
        );
    }
}
