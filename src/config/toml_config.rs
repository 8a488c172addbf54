use crate::domain::source::Source;
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_JIRA_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_JIRA_MAX_RESULTS: u32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSection {
    /// 為 true 時每個 source 都必須有 gateway，否則組裝失敗
    #[serde(default = "default_true")]
    pub require_all_sources: bool,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            require_all_sources: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub csv: Option<CsvSourceConfig>,
    pub jira: Option<JiraSourceConfig>,
    pub database: Option<DatabaseSourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSourceConfig {
    pub path: String,
}

impl CsvSourceConfig {
    /// 拆成 (base 目錄, 檔名)，供 LocalStorage 使用
    pub fn split_path(&self) -> (PathBuf, String) {
        let path = Path::new(&self.path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        (dir, file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraSourceConfig {
    pub base_url: String,
    pub project_key: String,
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_results: Option<u32>,
    pub activate_transition_id: String,
    pub deactivate_transition_id: String,
    pub active_status: Option<String>,
    pub deprecated_status: Option<String>,
}

impl JiraSourceConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_JIRA_TIMEOUT_SECONDS)
    }

    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_JIRA_MAX_RESULTS)
    }

    pub fn active_status(&self) -> &str {
        self.active_status.as_deref().unwrap_or("Active")
    }

    pub fn deprecated_status(&self) -> &str {
        self.deprecated_status.as_deref().unwrap_or("Deprecated")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSourceConfig {
    pub path: String,
}

impl RouterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        // 讀不到設定檔屬於配置錯誤，不是後端整合失敗
        let content =
            std::fs::read_to_string(&path).map_err(|e| ServiceError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ServiceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${JIRA_TOKEN})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ServiceError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn configured_sources(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|source| match source {
                Source::Csv => self.sources.csv.is_some(),
                Source::Jira => self.sources.jira.is_some(),
                Source::Database => self.sources.database.is_some(),
            })
            .collect()
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl Validate for RouterConfig {
    fn validate(&self) -> Result<()> {
        if self.configured_sources().is_empty() {
            return Err(ServiceError::MissingConfigError {
                field: "sources".to_string(),
            });
        }

        if let Some(csv) = &self.sources.csv {
            validation::validate_path("sources.csv.path", &csv.path)?;
            validation::validate_file_extension("sources.csv.path", &csv.path, &["csv"])?;
        }

        if let Some(jira) = &self.sources.jira {
            validation::validate_url("sources.jira.base_url", &jira.base_url)?;
            validation::validate_non_empty_string("sources.jira.project_key", &jira.project_key)?;
            validation::validate_non_empty_string(
                "sources.jira.activate_transition_id",
                &jira.activate_transition_id,
            )?;
            validation::validate_non_empty_string(
                "sources.jira.deactivate_transition_id",
                &jira.deactivate_transition_id,
            )?;
            validation::validate_range("sources.jira.timeout_seconds", jira.timeout_seconds(), 1, 300)?;
            validation::validate_range("sources.jira.max_results", jira.max_results(), 1, 1000)?;
            if jira.username.is_some() {
                validation::validate_required_field("sources.jira.api_token", &jira.api_token)?;
            }
        }

        if let Some(database) = &self.sources.database {
            validation::validate_path("sources.database.path", &database.path)?;
        }

        if let Some(level) = self.log_level() {
            if tracing_subscriber::EnvFilter::try_new(level).is_err() {
                return Err(ServiceError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: "not a valid log filter directive".to_string(),
                });
            }
        }

        Ok(())
    }
}
