//! The `glab` command-line client as a data collaborator.
//!
//! Every call returns glab's raw stdout; decoding happens in `crate::parser`
//! so that the same parsers serve glab and REST responses alike.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::{GlabTuiError, Result};

const COMMAND_TIMEOUT_SECONDS: u64 = 30;
const PAGE_SIZE: u32 = 100;

/// Operations the data source needs from a local CI command-line tool.
#[async_trait]
pub trait CiTool: Send + Sync {
    /// Human-oriented pipeline listing text.
    async fn list_pipelines(&self, project_path: &str, limit: usize) -> Result<String>;

    /// JSON array of the jobs of one pipeline.
    async fn pipeline_jobs(&self, project_path: &str, pipeline_id: u64) -> Result<String>;

    /// JSON array of the trigger jobs of one pipeline.
    async fn pipeline_bridges(&self, project_path: &str, pipeline_id: u64) -> Result<String>;

    /// JSON object describing one job.
    async fn job(&self, project_path: &str, job_id: u64) -> Result<String>;

    /// Raw log trace of one job, as far as it has been written.
    async fn job_trace(&self, project_path: &str, job_id: u64) -> Result<String>;
}

/// Runs the `glab` binary as a subprocess.
pub struct GlabCli {
    binary: String,
    timeout: Duration,
}

impl GlabCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(COMMAND_TIMEOUT_SECONDS),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command_line = format!("{} {}", self.binary, args.join(" "));
        debug!("Running {command_line}");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| GlabTuiError::Command {
                command: command_line.clone(),
                status: format!("timed out after {}s", self.timeout.as_secs()),
                stderr: String::new(),
            })??;

        if !output.status.success() {
            return Err(GlabTuiError::Command {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn api_path(project_path: &str, rest: &str) -> String {
    format!("projects/{}/{rest}", urlencoding::encode(project_path))
}

#[async_trait]
impl CiTool for GlabCli {
    async fn list_pipelines(&self, project_path: &str, limit: usize) -> Result<String> {
        let per_page = limit.to_string();
        self.run(&["ci", "list", "-R", project_path, "--per-page", &per_page])
            .await
    }

    async fn pipeline_jobs(&self, project_path: &str, pipeline_id: u64) -> Result<String> {
        let path = api_path(
            project_path,
            &format!("pipelines/{pipeline_id}/jobs?per_page={PAGE_SIZE}"),
        );
        self.run(&["api", &path]).await
    }

    async fn pipeline_bridges(&self, project_path: &str, pipeline_id: u64) -> Result<String> {
        let path = api_path(
            project_path,
            &format!("pipelines/{pipeline_id}/bridges?per_page={PAGE_SIZE}"),
        );
        self.run(&["api", &path]).await
    }

    async fn job(&self, project_path: &str, job_id: u64) -> Result<String> {
        let path = api_path(project_path, &format!("jobs/{job_id}"));
        self.run(&["api", &path]).await
    }

    async fn job_trace(&self, project_path: &str, job_id: u64) -> Result<String> {
        // `glab ci trace` streams until the job ends; the API returns a snapshot.
        let path = api_path(project_path, &format!("jobs/{job_id}/trace"));
        self.run(&["api", &path]).await
    }
}
