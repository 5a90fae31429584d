use log::{debug, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::types::{ApiProject, ApiUser};
use crate::auth::Token;
use crate::error::{GlabTuiError, Result};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_SECONDS: u64 = 2;
const REQUEST_TIMEOUT_SECONDS: u64 = 30;
const JOBS_PER_PAGE: usize = 100;

/// How often and how long to wait before repeating a failed request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Thin wrapper over the GitLab REST API (`/api/v4`).
pub struct GitLabClient {
    client: Client,
    base_url: Url,
    api_url: Url,
    token: Option<Token>,
    retry: RetryPolicy,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("glab-tui/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| GlabTuiError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Without a trailing slash `join` would drop the last path segment.
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GlabTuiError::Config(format!("Invalid base URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let api_url = base_url
            .join("api/v4/")
            .map_err(|e| GlabTuiError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_url,
            token,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Instance URL without a trailing slash, for building web links.
    pub fn web_base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Project base URL; `project` is either a numeric ID or a full path.
    pub fn project_url(&self, project: &str) -> Result<Url> {
        self.api_url
            .join(&format!("projects/{}/", urlencoding::encode(project)))
            .map_err(|e| GlabTuiError::Config(format!("Invalid project URL: {e}")))
    }

    fn endpoint(&self, base: &Url, path: &str) -> Result<Url> {
        base.join(path)
            .map_err(|e| GlabTuiError::Config(format!("Invalid endpoint URL '{path}': {e}")))
    }

    /// GET with retries on rate limiting, server errors and transient network errors.
    async fn get(&self, url: Url) -> Result<Response> {
        let mut retry_count = 0;
        loop {
            debug!("GET {url}");
            let request = self.auth_request(self.client.get(url.clone()));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    if retry_count >= self.retry.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {:?} ({}/{})...",
                        e,
                        self.retry.delay,
                        retry_count + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == 429 || status.is_server_error() {
                if retry_count >= self.retry.max_retries {
                    return Err(GlabTuiError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: self.retry.max_retries,
                    });
                }

                warn!(
                    "GitLab API error (status {status}). Waiting {:?} before retry {}/{}...",
                    self.retry.delay,
                    retry_count + 1,
                    self.retry.max_retries
                );

                tokio::time::sleep(self.retry.delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(GlabTuiError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            return Ok(response);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    /// Looks a project up by path or numeric ID.
    pub async fn project(&self, project: &str) -> Result<ApiProject> {
        // The project resource itself has no trailing slash.
        let url = self.endpoint(
            &self.api_url,
            &format!("projects/{}", urlencoding::encode(project)),
        )?;

        match self.get_json(url).await {
            Err(err) if err.is_not_found() => {
                Err(GlabTuiError::ProjectNotFound(project.to_string()))
            }
            other => other,
        }
    }

    /// Raw JSON array of the most recently updated pipelines.
    pub async fn pipelines(&self, project_id: u64, per_page: usize) -> Result<String> {
        let mut url = self.endpoint(&self.project_url(&project_id.to_string())?, "pipelines")?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("order_by", "updated_at")
            .append_pair("sort", "desc");
        self.get_text(url).await
    }

    /// Raw JSON array of a pipeline's jobs.
    pub async fn pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> Result<String> {
        let mut url = self.endpoint(
            &self.project_url(&project_id.to_string())?,
            &format!("pipelines/{pipeline_id}/jobs"),
        )?;
        url.query_pairs_mut()
            .append_pair("per_page", &JOBS_PER_PAGE.to_string());
        self.get_text(url).await
    }

    /// Raw JSON array of a pipeline's bridge (trigger) jobs.
    pub async fn pipeline_bridges(&self, project_id: u64, pipeline_id: u64) -> Result<String> {
        let mut url = self.endpoint(
            &self.project_url(&project_id.to_string())?,
            &format!("pipelines/{pipeline_id}/bridges"),
        )?;
        url.query_pairs_mut()
            .append_pair("per_page", &JOBS_PER_PAGE.to_string());
        self.get_text(url).await
    }

    /// Raw JSON object of one job.
    pub async fn job(&self, project_id: u64, job_id: u64) -> Result<String> {
        let url = self.endpoint(
            &self.project_url(&project_id.to_string())?,
            &format!("jobs/{job_id}"),
        )?;
        self.get_text(url).await
    }

    pub async fn job_trace(&self, project_id: u64, job_id: u64) -> Result<String> {
        let url = self.endpoint(
            &self.project_url(&project_id.to_string())?,
            &format!("jobs/{job_id}/trace"),
        )?;
        self.get_text(url).await
    }

    /// The authenticated user; used as a connectivity check.
    pub async fn current_user(&self) -> Result<ApiUser> {
        let url = self.endpoint(&self.api_url, "user")?;
        self.get_json(url).await
    }
}
