use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MERGE_REQUEST_REF_PREFIX: &str = "refs/merge-requests/";

/// Pipeline or job status as reported by GitLab.
///
/// Pipelines only ever use the first four variants plus `Unknown`; jobs use
/// the whole vocabulary. Unrecognised strings map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Running,
    Success,
    Failed,
    WaitingForResource,
    Pending,
    Created,
    Canceled,
    Skipped,
    Manual,
    #[default]
    Unknown,
}

impl Status {
    /// Statuses recognised in the glab listing's status marker, in match order.
    pub const LISTING_KEYWORDS: [Status; 4] = [
        Status::Running,
        Status::Success,
        Status::Failed,
        Status::WaitingForResource,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "waiting_for_resource" => Self::WaitingForResource,
            "pending" => Self::Pending,
            "created" => Self::Created,
            "canceled" | "cancelled" => Self::Canceled,
            "skipped" => Self::Skipped,
            "manual" => Self::Manual,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::WaitingForResource => "waiting_for_resource",
            Self::Pending => "pending",
            Self::Created => "created",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Unknown => "unknown",
        }
    }

    /// A job in a terminal status will not produce more log output.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Canceled)
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Running => "●",
            Self::Success => "✓",
            Self::Failed => "✗",
            _ => "○",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Human-readable progress text shown next to a pipeline.
pub fn jobs_summary(status: Status) -> &'static str {
    match status {
        Status::Running => "in progress",
        Status::Success => "completed",
        Status::Failed => "failed",
        Status::WaitingForResource => "queued",
        _ => "pending",
    }
}

/// Shortens `refs/merge-requests/<n>/head` style refs to `MR-<n>`.
///
/// Any other ref is returned trimmed but otherwise untouched.
pub fn normalize_ref(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(MERGE_REQUEST_REF_PREFIX) {
        if let Some(number) = trimmed.split('/').nth(2).filter(|n| !n.is_empty()) {
            return format!("MR-{number}");
        }
    }
    trimmed.to_string()
}

/// Last path segment of a project path (`group/sub/project` -> `project`).
pub fn project_name(project_path: &str) -> &str {
    project_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("project")
}

/// Formats a duration in seconds as `42s`, `3m 05s` or `1h 02m`.
pub fn format_duration(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

/// A single CI pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Platform-wide pipeline ID; zero means the row could not be parsed
    pub id: u64,
    /// Project-scoped pipeline number, when the source reports it
    pub iid: Option<u64>,
    pub status: Status,
    /// Branch, tag or `MR-<n>`
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Display label derived from where the data came from
    pub project_name: String,
    /// Progress text derived from `status`
    pub jobs_summary: String,
    /// Relative creation time as printed by glab (e.g. "about 4 minutes ago")
    pub created: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub web_url: Option<String>,
}

impl Pipeline {
    pub fn new(id: u64, status: Status, ref_: &str, project_name: &str) -> Self {
        Self {
            id,
            iid: None,
            status,
            ref_: normalize_ref(ref_),
            project_name: project_name.to_string(),
            jobs_summary: jobs_summary(status).to_string(),
            created: None,
            created_at: None,
            web_url: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Creation time for display, preferring glab's relative text.
    pub fn created_display(&self) -> Option<String> {
        self.created.clone().or_else(|| {
            self.created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        })
    }
}

/// One job inside a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: Status,
    pub stage: String,
    /// Execution time in seconds, absent while the job has not run
    pub duration: Option<f64>,
    pub web_url: Option<String>,
    /// Row standing for a downstream pipeline; `id` is then a pipeline ID
    #[serde(default)]
    pub child_pipeline: bool,
}

impl Job {
    pub fn new(id: u64, name: &str, status: Status, stage: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            status,
            stage: stage.to_string(),
            duration: None,
            web_url: None,
            child_pipeline: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id != 0 && !self.name.is_empty()
    }

    pub fn duration_display(&self) -> Option<String> {
        self.duration.map(format_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_maps_unknown_strings() {
        assert_eq!(Status::parse("running"), Status::Running);
        assert_eq!(Status::parse("SUCCESS"), Status::Success);
        assert_eq!(Status::parse("waiting_for_resource"), Status::WaitingForResource);
        assert_eq!(Status::parse("cancelled"), Status::Canceled);
        assert_eq!(Status::parse("preparing-something"), Status::Unknown);
        assert_eq!(Status::parse(""), Status::Unknown);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(Status::Success.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(Status::Canceled.is_terminal());
        assert!(!Status::Running.is_terminal());
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Manual.is_terminal());
    }

    #[test]
    fn test_jobs_summary_table() {
        assert_eq!(jobs_summary(Status::Running), "in progress");
        assert_eq!(jobs_summary(Status::Success), "completed");
        assert_eq!(jobs_summary(Status::Failed), "failed");
        assert_eq!(jobs_summary(Status::WaitingForResource), "queued");
        assert_eq!(jobs_summary(Status::Unknown), "pending");
        assert_eq!(jobs_summary(Status::Canceled), "pending");
    }

    #[test]
    fn test_jobs_summary_is_stable_across_calls() {
        for status in Status::LISTING_KEYWORDS {
            assert_eq!(jobs_summary(status), jobs_summary(status));
        }
    }

    #[test]
    fn test_normalize_merge_request_ref() {
        assert_eq!(normalize_ref("refs/merge-requests/406/head"), "MR-406");
        assert_eq!(normalize_ref("refs/merge-requests/12"), "MR-12");
        assert_eq!(normalize_ref("  main "), "main");
        assert_eq!(normalize_ref("feat/zap-c3"), "feat/zap-c3");
    }

    #[test]
    fn test_normalize_ref_without_number_is_kept() {
        assert_eq!(normalize_ref("refs/merge-requests/"), "refs/merge-requests/");
    }

    #[test]
    fn test_project_name() {
        assert_eq!(project_name("group/sub/frontend-apps"), "frontend-apps");
        assert_eq!(project_name("solo"), "solo");
        assert_eq!(project_name("group/project/"), "project");
        assert_eq!(project_name(""), "project");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.4), "42s");
        assert_eq!(format_duration(185.0), "3m 05s");
        assert_eq!(format_duration(3720.0), "1h 02m");
        assert_eq!(format_duration(-3.0), "0s");
    }

    #[test]
    fn test_pipeline_new_derives_summary_and_ref() {
        let pipeline = Pipeline::new(7, Status::Running, "refs/merge-requests/9/head", "api");
        assert_eq!(pipeline.ref_, "MR-9");
        assert_eq!(pipeline.jobs_summary, "in progress");
        assert!(pipeline.is_valid());
        assert!(!Pipeline::new(0, Status::Success, "main", "api").is_valid());
    }

    #[test]
    fn test_job_validity() {
        assert!(Job::new(55, "build", Status::Success, "build").is_valid());
        assert!(!Job::new(0, "build", Status::Success, "build").is_valid());
        assert!(!Job::new(55, "", Status::Success, "build").is_valid());
    }
}
