mod client;
pub mod links;
mod types;

use async_trait::async_trait;

pub use client::{GitLabClient, RetryPolicy};
pub use types::{ApiProject, ApiUser};

use crate::error::{GlabTuiError, Result};
use crate::model::{Job, Pipeline};
use crate::parser::{
    parse_downstream_json, parse_job_json, parse_jobs_json, parse_pipelines_json,
};

/// Operations the data source needs from the platform's HTTP API.
#[async_trait]
pub trait CiApi: Send + Sync {
    /// Numeric project ID for a project path (or ID string).
    async fn resolve_project(&self, project: &str) -> Result<u64>;

    async fn pipelines(
        &self,
        project_id: u64,
        project_name: &str,
        limit: usize,
    ) -> Result<Vec<Pipeline>>;

    async fn pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>>;

    /// Downstream pipelines triggered by a pipeline, as job-like rows.
    async fn downstream_pipelines(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>>;

    async fn job(&self, project_id: u64, job_id: u64) -> Result<Job>;

    async fn job_trace(&self, project_id: u64, job_id: u64) -> Result<String>;

    /// Username of the token's owner.
    async fn current_user(&self) -> Result<String>;
}

#[async_trait]
impl CiApi for GitLabClient {
    async fn resolve_project(&self, project: &str) -> Result<u64> {
        let found = self.project(project).await?;
        if found.id == 0 {
            return Err(GlabTuiError::ProjectContext(format!(
                "{} has no numeric ID",
                found.path_with_namespace
            )));
        }
        Ok(found.id)
    }

    async fn pipelines(
        &self,
        project_id: u64,
        project_name: &str,
        limit: usize,
    ) -> Result<Vec<Pipeline>> {
        let body = GitLabClient::pipelines(self, project_id, limit).await?;
        parse_pipelines_json(&body, project_name)
    }

    async fn pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>> {
        let body = GitLabClient::pipeline_jobs(self, project_id, pipeline_id).await?;
        parse_jobs_json(&body)
    }

    async fn downstream_pipelines(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>> {
        let body = GitLabClient::pipeline_bridges(self, project_id, pipeline_id).await?;
        parse_downstream_json(&body)
    }

    async fn job(&self, project_id: u64, job_id: u64) -> Result<Job> {
        let body = GitLabClient::job(self, project_id, job_id).await?;
        parse_job_json(&body)
    }

    async fn job_trace(&self, project_id: u64, job_id: u64) -> Result<String> {
        GitLabClient::job_trace(self, project_id, job_id).await
    }

    async fn current_user(&self) -> Result<String> {
        Ok(GitLabClient::current_user(self).await?.username)
    }
}
