//! Where pipelines, jobs and logs come from.
//!
//! A [`DataSource`] is built once per session in one of three modes. Listing
//! calls walk a ladder (glab, then REST, then built-in samples) and always
//! answer; every answer is tagged with a [`Provenance`] so the user can see
//! which tier produced it. Targeted lookups of a single job stop before the
//! sample tier and report an error instead.

pub mod sample;

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::error::{GlabTuiError, Result};
use crate::model::{project_name, Job, Pipeline};
use crate::parser::{parse_downstream_json, parse_job_json, parse_jobs_json, parse_listing};
use crate::providers::gitlab::links;
use crate::providers::{CiApi, CiTool};

/// Why a call ended up on sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Demo,
    NoProjectContext,
    ConfigError,
    NoToken,
    ClientError,
    ProjectNotFound,
    NoProjectId,
    ApiError,
    NoPipelinesFound,
}

impl FallbackReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Demo => "Demo",
            Self::NoProjectContext => "No Project Context",
            Self::ConfigError => "Config Error",
            Self::NoToken => "No Token",
            Self::ClientError => "Client Error",
            Self::ProjectNotFound => "Project Not Found",
            Self::NoProjectId => "No Project ID",
            Self::ApiError => "API Error",
            Self::NoPipelinesFound => "No Pipelines Found",
        }
    }

    /// Classifies a failed REST call.
    pub fn from_error(err: &GlabTuiError) -> Self {
        match err {
            GlabTuiError::NoToken => Self::NoToken,
            GlabTuiError::Config(_) => Self::ConfigError,
            GlabTuiError::ProjectContext(_) => Self::NoProjectId,
            err if err.is_not_found() => Self::ProjectNotFound,
            _ => Self::ApiError,
        }
    }

    fn into_error(self) -> GlabTuiError {
        match self {
            Self::NoToken => GlabTuiError::NoToken,
            Self::ConfigError | Self::ClientError => {
                GlabTuiError::Config(format!("REST API unavailable ({})", self.label()))
            }
            other => GlabTuiError::ProjectContext(other.label().to_string()),
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which tier produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Glab { project: String },
    Api { project: String },
    Sample(FallbackReason),
}

impl Provenance {
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Sample(_))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glab { project } => write!(f, "Real Data via glab - {project}"),
            Self::Api { project } => write!(f, "Real Data via API - {project}"),
            Self::Sample(reason) => write!(f, "Mock Data - {reason}"),
        }
    }
}

/// A value together with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn new(value: T, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    fn sample(value: T, reason: FallbackReason) -> Self {
        Self::new(value, Provenance::Sample(reason))
    }
}

/// REST access with the project's numeric ID resolved on first use.
pub struct ApiBackend {
    api: Arc<dyn CiApi>,
    project_id: OnceCell<u64>,
}

impl ApiBackend {
    pub fn new(api: Arc<dyn CiApi>) -> Self {
        Self {
            api,
            project_id: OnceCell::new(),
        }
    }

    async fn project_id(&self, project: &str) -> Result<u64> {
        self.project_id
            .get_or_try_init(|| async {
                let id = self.api.resolve_project(project).await?;
                info!("Resolved project {project} to ID {id}");
                Ok(id)
            })
            .await
            .copied()
    }
}

/// The REST tier, or the reason it could not be set up.
pub enum ApiTier {
    Ready(ApiBackend),
    Missing(FallbackReason),
}

impl ApiTier {
    pub fn ready(api: Arc<dyn CiApi>) -> Self {
        Self::Ready(ApiBackend::new(api))
    }

    /// The backend and resolved project ID, or the label to show instead.
    async fn resolve(
        &self,
        project: &str,
    ) -> std::result::Result<(&dyn CiApi, u64), (FallbackReason, Option<GlabTuiError>)> {
        match self {
            Self::Missing(reason) => Err((*reason, None)),
            Self::Ready(backend) => match backend.project_id(project).await {
                Ok(id) => Ok((backend.api.as_ref(), id)),
                Err(err) => {
                    warn!("Could not resolve project {project} via the API: {err}");
                    Err((FallbackReason::from_error(&err), Some(err)))
                }
            },
        }
    }
}

/// The data-fetching strategy of a session.
pub enum SourceMode {
    /// Project known and glab enabled: glab, then REST, then samples.
    LocalTool {
        project: String,
        tool: Arc<dyn CiTool>,
        api: ApiTier,
    },
    /// glab disabled: REST, then samples.
    RemoteApi { project: String, api: ApiTier },
    /// Nothing live to ask.
    StaticSample { reason: FallbackReason },
}

pub struct DataSource {
    mode: SourceMode,
    limit: usize,
    web_base: String,
}

impl DataSource {
    pub fn new(mode: SourceMode, limit: usize, web_base: impl Into<String>) -> Self {
        Self {
            mode,
            limit,
            web_base: web_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn demo() -> Self {
        Self::new(
            SourceMode::StaticSample {
                reason: FallbackReason::Demo,
            },
            0,
            "",
        )
    }

    pub fn project(&self) -> Option<&str> {
        match &self.mode {
            SourceMode::LocalTool { project, .. } | SourceMode::RemoteApi { project, .. } => {
                Some(project)
            }
            SourceMode::StaticSample { .. } => None,
        }
    }

    /// Short description of the ladder for banners and logs.
    pub fn describe(&self) -> String {
        match &self.mode {
            SourceMode::LocalTool { project, api, .. } => match api {
                ApiTier::Ready(_) => format!("{project} (glab → API → sample)"),
                ApiTier::Missing(reason) => format!("{project} (glab → sample, API: {reason})"),
            },
            SourceMode::RemoteApi { project, .. } => format!("{project} (API → sample)"),
            SourceMode::StaticSample { reason } => format!("sample data ({reason})"),
        }
    }

    fn parts(&self) -> std::result::Result<(&str, Option<&dyn CiTool>, &ApiTier), FallbackReason> {
        match &self.mode {
            SourceMode::LocalTool { project, tool, api } => Ok((project, Some(tool.as_ref()), api)),
            SourceMode::RemoteApi { project, api } => Ok((project, None, api)),
            SourceMode::StaticSample { reason } => Err(*reason),
        }
    }

    /// Pipelines of the session's project. Never fails.
    pub async fn pipelines(&self) -> Sourced<Vec<Pipeline>> {
        let (project, tool, api) = match self.parts() {
            Ok(parts) => parts,
            Err(reason) => return Sourced::sample(sample::sample_pipelines(), reason),
        };

        if let Some(tool) = tool {
            match tool.list_pipelines(project, self.limit).await {
                Ok(output) => {
                    let listing = parse_listing(&output);
                    if listing.rejected > 0 {
                        debug!("{} listing rows could not be parsed", listing.rejected);
                    }
                    if !listing.pipelines.is_empty() {
                        let pipelines = listing
                            .pipelines
                            .into_iter()
                            .map(|pipeline| self.link_pipeline(project, pipeline))
                            .collect();
                        return Sourced::new(pipelines, glab(project));
                    }
                    warn!("glab listed no pipelines for {project}, trying the API");
                }
                Err(err) => warn!("glab pipeline listing failed for {project}: {err}"),
            }
        }

        let (api, project_id) = match api.resolve(project).await {
            Ok(resolved) => resolved,
            Err((reason, _)) => return Sourced::sample(sample::sample_pipelines(), reason),
        };

        match api.pipelines(project_id, project_name(project), self.limit).await {
            Ok(pipelines) if !pipelines.is_empty() => {
                let pipelines = pipelines
                    .into_iter()
                    .map(|pipeline| self.link_pipeline(project, pipeline))
                    .collect();
                Sourced::new(pipelines, Provenance::Api { project: project.to_string() })
            }
            Ok(_) => {
                warn!("The API returned no pipelines for {project}");
                Sourced::sample(sample::sample_pipelines(), FallbackReason::NoPipelinesFound)
            }
            Err(err) => {
                warn!("API pipeline listing failed for {project}: {err}");
                Sourced::sample(sample::sample_pipelines(), FallbackReason::from_error(&err))
            }
        }
    }

    /// Jobs of one pipeline, followed by its downstream pipelines. Never fails.
    ///
    /// An empty answer from a live tier is returned as is once no other live
    /// tier has anything better; samples only replace failures.
    pub async fn pipeline_jobs(&self, pipeline_id: u64) -> Sourced<Vec<Job>> {
        let (project, tool, api) = match self.parts() {
            Ok(parts) => parts,
            Err(reason) => return Sourced::sample(sample::sample_jobs(pipeline_id), reason),
        };

        let mut glab_was_empty = false;
        if let Some(tool) = tool {
            match tool
                .pipeline_jobs(project, pipeline_id)
                .await
                .and_then(|body| parse_jobs_json(&body))
            {
                Ok(mut jobs) => {
                    jobs.extend(tool_downstream(tool, project, pipeline_id).await);
                    if !jobs.is_empty() {
                        return Sourced::new(self.link_jobs(project, jobs), glab(project));
                    }
                    warn!("glab listed no jobs for pipeline {pipeline_id}, trying the API");
                    glab_was_empty = true;
                }
                Err(err) => warn!("glab job listing failed for pipeline {pipeline_id}: {err}"),
            }
        }

        let fallback = |reason| {
            if glab_was_empty {
                Sourced::new(Vec::new(), glab(project))
            } else {
                Sourced::sample(sample::sample_jobs(pipeline_id), reason)
            }
        };

        let (api, project_id) = match api.resolve(project).await {
            Ok(resolved) => resolved,
            Err((reason, _)) => return fallback(reason),
        };

        match api.pipeline_jobs(project_id, pipeline_id).await {
            Ok(mut jobs) => {
                match api.downstream_pipelines(project_id, pipeline_id).await {
                    Ok(children) => jobs.extend(children),
                    Err(err) => debug!("No downstream pipelines for {pipeline_id}: {err}"),
                }
                if jobs.is_empty() {
                    info!("Pipeline {pipeline_id} has no jobs");
                }
                let provenance = Provenance::Api {
                    project: project.to_string(),
                };
                Sourced::new(self.link_jobs(project, jobs), provenance)
            }
            Err(err) => {
                warn!("API job listing failed for pipeline {pipeline_id}: {err}");
                fallback(FallbackReason::from_error(&err))
            }
        }
    }

    /// Log trace of one job. Never fails.
    pub async fn job_logs(&self, job_id: u64) -> Sourced<String> {
        match self.trace_without_samples(job_id).await {
            Ok(sourced) => sourced,
            Err((reason, err)) => {
                if let Some(err) = err {
                    debug!("Falling back to sample log for job {job_id}: {err}");
                }
                Sourced::sample(sample::sample_logs(job_id), reason)
            }
        }
    }

    /// Log trace of one job, without the sample tier.
    pub async fn job_trace(&self, job_id: u64) -> Result<Sourced<String>> {
        match self.parts() {
            Err(FallbackReason::Demo) => {
                return Ok(Sourced::sample(sample::sample_logs(job_id), FallbackReason::Demo));
            }
            Err(reason) => return Err(reason.into_error()),
            Ok(_) => {}
        }

        self.trace_without_samples(job_id)
            .await
            .map_err(|(reason, err)| err.unwrap_or_else(|| reason.into_error()))
    }

    async fn trace_without_samples(
        &self,
        job_id: u64,
    ) -> std::result::Result<Sourced<String>, (FallbackReason, Option<GlabTuiError>)> {
        let (project, tool, api) = self.parts().map_err(|reason| (reason, None))?;

        let mut tool_error = None;
        let mut empty_trace = None;
        if let Some(tool) = tool {
            match tool.job_trace(project, job_id).await {
                Ok(trace) if !trace.trim().is_empty() => {
                    return Ok(Sourced::new(trace, glab(project)));
                }
                Ok(trace) => {
                    warn!("glab returned an empty trace for job {job_id}, trying the API");
                    empty_trace = Some(trace);
                }
                Err(err) => {
                    warn!("glab trace failed for job {job_id}: {err}");
                    tool_error = Some(err);
                }
            }
        }

        let (api, project_id) = match api.resolve(project).await {
            Ok(resolved) => resolved,
            // A job that has not written anything yet still has a live log.
            Err(_) if empty_trace.is_some() => {
                return Ok(Sourced::new(empty_trace.unwrap_or_default(), glab(project)));
            }
            Err((reason, err)) => return Err((reason, err.or(tool_error))),
        };

        match api.job_trace(project_id, job_id).await {
            Ok(trace) => Ok(Sourced::new(trace, Provenance::Api { project: project.to_string() })),
            Err(err) => {
                warn!("API trace failed for job {job_id}: {err}");
                match empty_trace {
                    Some(trace) => Ok(Sourced::new(trace, glab(project))),
                    None => Err((FallbackReason::from_error(&err), Some(err))),
                }
            }
        }
    }

    /// Details of one job, without the sample tier.
    pub async fn job_details(&self, job_id: u64) -> Result<Sourced<Job>> {
        let (project, tool, api) = match self.parts() {
            Ok(parts) => parts,
            Err(FallbackReason::Demo) => {
                return Ok(Sourced::sample(sample::sample_job(job_id), FallbackReason::Demo));
            }
            Err(reason) => return Err(reason.into_error()),
        };

        let mut tool_error = None;
        if let Some(tool) = tool {
            match tool.job(project, job_id).await.and_then(|body| parse_job_json(&body)) {
                Ok(job) => {
                    return Ok(Sourced::new(self.link_job(project, job), glab(project)));
                }
                Err(err) => {
                    warn!("glab job lookup failed for job {job_id}: {err}");
                    tool_error = Some(err);
                }
            }
        }

        let (api, project_id) = api
            .resolve(project)
            .await
            .map_err(|(reason, err)| err.or(tool_error).unwrap_or_else(|| reason.into_error()))?;

        let job = api.job(project_id, job_id).await?;
        Ok(Sourced::new(
            self.link_job(project, job),
            Provenance::Api { project: project.to_string() },
        ))
    }

    fn link_pipeline(&self, project: &str, mut pipeline: Pipeline) -> Pipeline {
        if pipeline.web_url.is_none() && !self.web_base.is_empty() {
            pipeline.web_url = Some(links::pipeline_url(&self.web_base, project, pipeline.id));
        }
        pipeline
    }

    fn link_job(&self, project: &str, mut job: Job) -> Job {
        if job.web_url.is_none() && !self.web_base.is_empty() {
            job.web_url = Some(if job.child_pipeline {
                links::pipeline_url(&self.web_base, project, job.id)
            } else {
                links::job_url(&self.web_base, project, job.id)
            });
        }
        job
    }

    fn link_jobs(&self, project: &str, jobs: Vec<Job>) -> Vec<Job> {
        jobs.into_iter().map(|job| self.link_job(project, job)).collect()
    }
}

fn glab(project: &str) -> Provenance {
    Provenance::Glab {
        project: project.to_string(),
    }
}

/// Downstream pipelines of `pipeline_id` via glab, or none when the lookup fails.
async fn tool_downstream(tool: &dyn CiTool, project: &str, pipeline_id: u64) -> Vec<Job> {
    match tool
        .pipeline_bridges(project, pipeline_id)
        .await
        .and_then(|body| parse_downstream_json(&body))
    {
        Ok(children) => children,
        Err(err) => {
            debug!("No downstream pipelines for {pipeline_id}: {err}");
            Vec::new()
        }
    }
}
