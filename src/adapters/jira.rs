//! Test cases tracked as issues in Jira (REST API v2).

use crate::config::toml_config::JiraSourceConfig;
use crate::domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseStatus, TestCaseUpdate};
use crate::domain::ports::{TestCaseCommandGateway, TestCaseQueryGateway};
use crate::domain::source::Source;
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

const ISSUE_FIELDS: &str = "summary,status,priority,labels,updated";

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    #[serde(default)]
    summary: String,
    status: Option<JiraNamed>,
    priority: Option<JiraNamed>,
    #[serde(default)]
    labels: Vec<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JiraNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JiraSearchResult {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Default, Deserialize)]
struct JiraErrorBody {
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: Map<String, Value>,
}

impl JiraErrorBody {
    fn summary(&self, raw: &str) -> String {
        let mut parts: Vec<String> = self.error_messages.clone();
        parts.extend(self.errors.iter().map(|(field, msg)| match msg {
            Value::String(s) => format!("{}: {}", field, s),
            other => format!("{}: {}", field, other),
        }));
        if parts.is_empty() {
            raw.trim().to_string()
        } else {
            parts.join("; ")
        }
    }
}

pub struct JiraTestCaseGateway {
    client: Client,
    base_url: Url,
    config: JiraSourceConfig,
}

impl JiraTestCaseGateway {
    pub fn new(config: JiraSourceConfig) -> Result<Self> {
        let base_url = validation::validate_base_url("sources.jira.base_url", &config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::ConfigError {
                message: format!("Jira base URL cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(["rest", "api", "2"])
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.config.username, &self.config.api_token) {
            (Some(user), token) => request.basic_auth(user, token.as_deref()),
            (None, Some(token)) => request.bearer_auth(token),
            (None, None) => request,
        }
    }

    /// Maps a non-success response onto the shared error taxonomy.
    async fn check(&self, response: Response, id: Option<&TestCaseId>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<JiraErrorBody>(&raw)
            .unwrap_or_default()
            .summary(&raw);
        let subject = id.map(ToString::to_string).unwrap_or_default();

        tracing::debug!(status = %status, id = %subject, message = %message, "Jira request rejected");

        Err(match status {
            StatusCode::NOT_FOUND if id.is_some() => ServiceError::not_found(subject),
            StatusCode::CONFLICT => ServiceError::conflict(subject, message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ServiceError::rule_violated(message)
            }
            _ => ServiceError::integration(Source::Jira, format!("HTTP {}: {}", status, message)),
        })
    }

    fn map_status(&self, name: Option<&str>) -> TestCaseStatus {
        match name {
            Some(n) if n.eq_ignore_ascii_case(self.config.active_status()) => TestCaseStatus::Active,
            Some(n) if n.eq_ignore_ascii_case(self.config.deprecated_status()) => {
                TestCaseStatus::Deprecated
            }
            _ => TestCaseStatus::Draft,
        }
    }

    fn to_test_case(&self, issue: JiraIssue) -> TestCase {
        let status = self.map_status(issue.fields.status.as_ref().map(|s| s.name.as_str()));
        TestCase {
            id: TestCaseId::new(issue.key),
            title: issue.fields.summary,
            status,
            priority: issue.fields.priority.map(|p| p.name),
            labels: issue.fields.labels,
            updated_at: issue.fields.updated.as_deref().and_then(parse_jira_timestamp),
        }
    }

    async fn fetch(&self, id: &TestCaseId) -> Result<TestCase> {
        let url = self.endpoint(&["issue", id.as_str()])?;
        tracing::debug!(url = %url, "Fetching Jira issue");

        let response = self
            .authorize(self.client.get(url).query(&[("fields", ISSUE_FIELDS)]))
            .send()
            .await?;
        let issue: JiraIssue = self.check(response, Some(id)).await?.json().await?;
        Ok(self.to_test_case(issue))
    }

    async fn transition(&self, id: &TestCaseId, transition_id: &str) -> Result<()> {
        let url = self.endpoint(&["issue", id.as_str(), "transitions"])?;
        tracing::debug!(url = %url, transition_id, "Posting Jira transition");

        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await?;
        self.check(response, Some(id)).await?;
        Ok(())
    }

    /// Pushes every filter Jira can evaluate into the query, so paging never hides matches.
    fn search_jql(&self, filter: &TestCaseFilter) -> String {
        let mut jql = format!("project = {}", jql_string(&self.config.project_key));
        if let Some(label) = &filter.label {
            jql.push_str(&format!(" AND labels = {}", jql_string(label)));
        }
        if let Some(status) = filter.status {
            let active = jql_string(self.config.active_status());
            let deprecated = jql_string(self.config.deprecated_status());
            let clause = match status {
                TestCaseStatus::Active => format!(" AND status = {}", active),
                TestCaseStatus::Deprecated => format!(" AND status = {}", deprecated),
                TestCaseStatus::Draft => format!(" AND status not in ({}, {})", active, deprecated),
            };
            jql.push_str(&clause);
        }
        if let Some(needle) = &filter.title_contains {
            jql.push_str(&format!(" AND summary ~ {}", jql_string(needle)));
        }
        jql.push_str(" ORDER BY key ASC");
        jql
    }

    /// `summary ~` is a word search, so the page size only follows `limit` when
    /// the exact substring check left in memory cannot drop results.
    fn page_size(&self, filter: &TestCaseFilter) -> u32 {
        let max_results = self.config.max_results();
        match filter.limit {
            Some(limit) if filter.title_contains.is_none() => {
                u32::try_from(limit).unwrap_or(u32::MAX).min(max_results)
            }
            _ => max_results,
        }
    }
}

fn jql_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Jira renders timestamps like `2025-01-02T03:04:05.000+0000`.
fn parse_jira_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

#[async_trait]
impl TestCaseCommandGateway for JiraTestCaseGateway {
    async fn activate(&self, id: &TestCaseId) -> Result<TestCase> {
        let mut test_case = self.fetch(id).await?;
        test_case.activate()?;
        self.transition(id, &self.config.activate_transition_id).await?;
        Ok(test_case)
    }

    async fn deactivate(&self, id: &TestCaseId) -> Result<TestCase> {
        let mut test_case = self.fetch(id).await?;
        test_case.deactivate()?;
        self.transition(id, &self.config.deactivate_transition_id).await?;
        Ok(test_case)
    }

    async fn update(&self, id: &TestCaseId, changes: &TestCaseUpdate) -> Result<TestCase> {
        let mut test_case = self.fetch(id).await?;
        test_case.apply(changes)?;

        let mut fields = Map::new();
        if let Some(title) = &changes.title {
            fields.insert("summary".to_string(), json!(title));
        }
        if let Some(priority) = &changes.priority {
            fields.insert("priority".to_string(), json!({ "name": priority }));
        }
        if let Some(labels) = &changes.labels {
            fields.insert("labels".to_string(), json!(labels));
        }

        let url = self.endpoint(&["issue", id.as_str()])?;
        let response = self
            .authorize(self.client.put(url))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        self.check(response, Some(id)).await?;

        Ok(test_case)
    }
}

#[async_trait]
impl TestCaseQueryGateway for JiraTestCaseGateway {
    async fn get(&self, id: &TestCaseId) -> Result<TestCase> {
        self.fetch(id).await
    }

    async fn list(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>> {
        let url = self.endpoint(&["search"])?;
        let jql = self.search_jql(filter);
        tracing::debug!(url = %url, jql = %jql, "Searching Jira issues");

        let max_results = self.page_size(filter).to_string();
        let response = self
            .authorize(self.client.get(url).query(&[
                ("jql", jql.as_str()),
                ("fields", ISSUE_FIELDS),
                ("maxResults", max_results.as_str()),
            ]))
            .send()
            .await?;
        let result: JiraSearchResult = self.check(response, None).await?.json().await?;

        Ok(filter.apply(result.issues.into_iter().map(|issue| self.to_test_case(issue))))
    }
}
