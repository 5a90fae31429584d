use log::debug;

use super::cursor::Cursor;
use crate::model::{Job, Pipeline};
use crate::source::{Provenance, Sourced};

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    PipelineList,
    JobList,
    LogView,
}

/// User intents, already decoded from key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    First,
    Last,
    Enter,
    Back,
    Refresh,
    ToggleAutoRefresh,
    Follow,
    Quit,
}

/// Identifies one issued fetch so that its result can be matched.
pub type RequestId = u64;

/// Failure text of a fetch that produced nothing.
pub type FetchResult<T> = Result<Sourced<T>, String>;

/// Everything the navigator reacts to.
#[derive(Debug)]
pub enum NavEvent {
    Key(Action),
    Tick,
    PipelinesLoaded {
        request: RequestId,
        result: FetchResult<Vec<Pipeline>>,
    },
    JobsLoaded {
        request: RequestId,
        pipeline_id: u64,
        result: FetchResult<Vec<Job>>,
    },
    LogsLoaded {
        request: RequestId,
        job_id: u64,
        result: FetchResult<String>,
    },
}

/// Work the event loop must carry out on behalf of the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPipelines { request: RequestId },
    FetchJobs { request: RequestId, pipeline_id: u64 },
    FetchLogs { request: RequestId, job_id: u64 },
    /// Start the refresh interval over from now.
    RestartTicker,
    /// Leave the UI and stream this job's log.
    FollowLogs { job_id: u64 },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Jobs { request: RequestId, pipeline_id: u64 },
    Logs { request: RequestId, job_id: u64 },
}

/// Drill-down state of an interactive session.
///
/// `handle` is the only mutating entry point. It never performs I/O; fetches
/// are returned as [`Effect`]s and their results come back as [`NavEvent`]s.
/// A view change happens only when the result of the matching request
/// arrives successfully, so a failed or superseded fetch never moves the
/// user into a view without data.
#[derive(Debug)]
pub struct Navigator {
    view: View,
    pipelines: Vec<Pipeline>,
    pipeline_cursor: Cursor,
    pipelines_provenance: Option<Provenance>,
    jobs: Vec<Job>,
    job_cursor: Cursor,
    jobs_provenance: Option<Provenance>,
    selected_pipeline_id: Option<u64>,
    selected_job_id: Option<u64>,
    logs: String,
    logs_provenance: Option<Provenance>,
    /// Lines scrolled up from the end of the log
    log_offset: usize,
    auto_refresh: bool,
    error: Option<String>,
    next_request: RequestId,
    pipelines_request: Option<RequestId>,
    pending: Option<Pending>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            view: View::PipelineList,
            pipelines: Vec::new(),
            pipeline_cursor: Cursor::default(),
            pipelines_provenance: None,
            jobs: Vec::new(),
            job_cursor: Cursor::default(),
            jobs_provenance: None,
            selected_pipeline_id: None,
            selected_job_id: None,
            logs: String::new(),
            logs_provenance: None,
            log_offset: 0,
            auto_refresh: true,
            error: None,
            next_request: 1,
            pipelines_request: None,
            pending: None,
        }
    }

    /// Effects of session start: the initial one-shot pipeline fetch.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.fetch_pipelines()]
    }

    pub fn handle(&mut self, event: NavEvent) -> Vec<Effect> {
        match event {
            NavEvent::Key(action) => self.on_action(action),
            NavEvent::Tick => self.on_tick(),
            NavEvent::PipelinesLoaded { request, result } => {
                self.on_pipelines(request, result);
                Vec::new()
            }
            NavEvent::JobsLoaded {
                request,
                pipeline_id,
                result,
            } => {
                self.on_jobs(request, pipeline_id, result);
                Vec::new()
            }
            NavEvent::LogsLoaded {
                request,
                job_id,
                result,
            } => {
                self.on_logs(request, job_id, result);
                Vec::new()
            }
        }
    }

    fn issue(&mut self) -> RequestId {
        let request = self.next_request;
        self.next_request += 1;
        request
    }

    fn fetch_pipelines(&mut self) -> Effect {
        let request = self.issue();
        self.pipelines_request = Some(request);
        Effect::FetchPipelines { request }
    }

    fn on_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Quit => return vec![Effect::Quit],
            Action::ToggleAutoRefresh => return self.toggle_auto_refresh(),
            Action::Refresh => {
                if self.view == View::PipelineList {
                    // Supersedes any outstanding listing request.
                    return vec![self.fetch_pipelines()];
                }
                return Vec::new();
            }
            Action::Follow => {
                return self
                    .follow_target()
                    .map(|job_id| vec![Effect::FollowLogs { job_id }])
                    .unwrap_or_default();
            }
            Action::Enter => return self.enter(),
            Action::Back => self.back(),
            Action::MoveUp
            | Action::MoveDown
            | Action::PageUp
            | Action::PageDown
            | Action::First
            | Action::Last => self.move_cursor(action),
        }
        self.error = None;
        Vec::new()
    }

    fn toggle_auto_refresh(&mut self) -> Vec<Effect> {
        self.auto_refresh = !self.auto_refresh;
        debug!("Auto-refresh {}", if self.auto_refresh { "on" } else { "off" });

        if !self.auto_refresh {
            return Vec::new();
        }
        if self.view == View::PipelineList && self.pipelines_request.is_none() {
            vec![self.fetch_pipelines(), Effect::RestartTicker]
        } else {
            vec![Effect::RestartTicker]
        }
    }

    fn follow_target(&self) -> Option<u64> {
        match self.view {
            View::JobList => self
                .selected_job()
                .filter(|job| !job.child_pipeline)
                .map(|job| job.id),
            View::LogView => self.selected_job_id,
            View::PipelineList => None,
        }
    }

    fn enter(&mut self) -> Vec<Effect> {
        match self.view {
            View::PipelineList => match self.selected_pipeline().map(|p| p.id) {
                Some(pipeline_id) => self.fetch_jobs(pipeline_id),
                None => Vec::new(),
            },
            View::JobList => match self.selected_job().map(|j| (j.id, j.child_pipeline)) {
                // A downstream pipeline row opens that pipeline's jobs.
                Some((pipeline_id, true)) => self.fetch_jobs(pipeline_id),
                Some((job_id, false)) => {
                    let request = self.issue();
                    self.pending = Some(Pending::Logs { request, job_id });
                    vec![Effect::FetchLogs { request, job_id }]
                }
                None => Vec::new(),
            },
            View::LogView => Vec::new(),
        }
    }

    fn fetch_jobs(&mut self, pipeline_id: u64) -> Vec<Effect> {
        let request = self.issue();
        self.pending = Some(Pending::Jobs {
            request,
            pipeline_id,
        });
        vec![Effect::FetchJobs {
            request,
            pipeline_id,
        }]
    }

    fn back(&mut self) {
        self.pending = None;
        self.view = match self.view {
            View::PipelineList | View::JobList => View::PipelineList,
            View::LogView => View::JobList,
        };
    }

    fn move_cursor(&mut self, action: Action) {
        match self.view {
            View::PipelineList => {
                apply_move(&mut self.pipeline_cursor, action, self.pipelines.len());
            }
            View::JobList => apply_move(&mut self.job_cursor, action, self.jobs.len()),
            View::LogView => self.scroll_logs(action),
        }
    }

    fn scroll_logs(&mut self, action: Action) {
        let max = self.logs.lines().count().saturating_sub(1);
        self.log_offset = match action {
            Action::MoveUp => self.log_offset + 1,
            Action::MoveDown => self.log_offset.saturating_sub(1),
            Action::PageUp => self.log_offset + super::cursor::PAGE_ROWS,
            Action::PageDown => self.log_offset.saturating_sub(super::cursor::PAGE_ROWS),
            Action::First => max,
            _ => 0,
        }
        .min(max);
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        if !self.auto_refresh || self.view != View::PipelineList {
            return Vec::new();
        }
        if self.pipelines_request.is_some() {
            debug!("Skipping refresh tick, a pipeline fetch is still running");
            return Vec::new();
        }
        vec![self.fetch_pipelines()]
    }

    fn on_pipelines(&mut self, request: RequestId, result: FetchResult<Vec<Pipeline>>) {
        if self.pipelines_request != Some(request) {
            debug!("Ignoring superseded pipeline result {request}");
            return;
        }
        self.pipelines_request = None;

        match result {
            Ok(sourced) => {
                self.pipelines = sourced.value;
                self.pipelines_provenance = Some(sourced.provenance);
                self.pipeline_cursor.clamp(self.pipelines.len());
                self.error = None;
            }
            Err(err) => self.error = Some(format!("Failed to load pipelines: {err}")),
        }
    }

    fn on_jobs(&mut self, request: RequestId, pipeline_id: u64, result: FetchResult<Vec<Job>>) {
        if self.pending
            != Some(Pending::Jobs {
                request,
                pipeline_id,
            })
        {
            debug!("Ignoring stale jobs result for pipeline {pipeline_id}");
            return;
        }
        self.pending = None;

        match result {
            Ok(sourced) => {
                self.jobs = sourced.value;
                self.jobs_provenance = Some(sourced.provenance);
                self.job_cursor.reset();
                self.selected_pipeline_id = Some(pipeline_id);
                self.view = View::JobList;
                self.error = None;
            }
            Err(err) => {
                self.error = Some(format!(
                    "Failed to load jobs for pipeline #{pipeline_id}: {err}"
                ));
            }
        }
    }

    fn on_logs(&mut self, request: RequestId, job_id: u64, result: FetchResult<String>) {
        if self.pending != Some(Pending::Logs { request, job_id }) {
            debug!("Ignoring stale log result for job {job_id}");
            return;
        }
        self.pending = None;

        match result {
            Ok(sourced) => {
                self.logs = sourced.value;
                self.logs_provenance = Some(sourced.provenance);
                self.log_offset = 0;
                self.selected_job_id = Some(job_id);
                self.view = View::LogView;
                self.error = None;
            }
            Err(err) => self.error = Some(format!("Failed to load logs for job #{job_id}: {err}")),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipeline_cursor(&self) -> Cursor {
        self.pipeline_cursor
    }

    pub fn selected_pipeline(&self) -> Option<&Pipeline> {
        self.pipeline_cursor.selected(&self.pipelines)
    }

    pub fn pipelines_provenance(&self) -> Option<&Provenance> {
        self.pipelines_provenance.as_ref()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job_cursor(&self) -> Cursor {
        self.job_cursor
    }

    pub fn selected_job(&self) -> Option<&Job> {
        self.job_cursor.selected(&self.jobs)
    }

    pub fn jobs_provenance(&self) -> Option<&Provenance> {
        self.jobs_provenance.as_ref()
    }

    pub fn selected_pipeline_id(&self) -> Option<u64> {
        self.selected_pipeline_id
    }

    pub fn selected_job_id(&self) -> Option<u64> {
        self.selected_job_id
    }

    pub fn logs(&self) -> &str {
        &self.logs
    }

    pub fn log_offset(&self) -> usize {
        self.log_offset
    }

    pub fn logs_provenance(&self) -> Option<&Provenance> {
        self.logs_provenance.as_ref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while any fetch issued by the navigator is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pipelines_request.is_some() || self.pending.is_some()
    }
}

fn apply_move(cursor: &mut Cursor, action: Action, len: usize) {
    match action {
        Action::MoveUp => cursor.up(),
        Action::MoveDown => cursor.down(len),
        Action::PageUp => cursor.page_up(),
        Action::PageDown => cursor.page_down(len),
        Action::First => cursor.first(),
        Action::Last => cursor.last(len),
        _ => {}
    }
}
