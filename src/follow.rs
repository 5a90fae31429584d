//! `logs --follow`: poll a job's trace and print what is new until the job ends.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Interval;

use crate::error::Result;
use crate::model::{Job, Status};
use crate::output::{dim, provenance_line};
use crate::source::{DataSource, Sourced};

/// How a follow session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Completed(Status),
    Interrupted,
}

/// Tracks what has already been printed for one job.
#[derive(Debug, Default)]
pub struct LogFollower {
    printed: usize,
    finished: bool,
}

impl LogFollower {
    /// The part of `trace` not printed yet.
    ///
    /// A trace that shrank or changed below the printed mark (job retried,
    /// log truncated) is printed again from the start.
    pub fn new_content<'a>(&mut self, trace: &'a str) -> Option<&'a str> {
        let fresh = match trace.get(self.printed..) {
            Some(rest) => rest,
            None => {
                debug!("Trace shrank below {} bytes, starting over", self.printed);
                trace
            }
        };
        self.printed = trace.len();
        (!fresh.is_empty()).then_some(fresh)
    }

    /// Completion banner, returned once when the job reaches a terminal status.
    pub fn completion(&mut self, job: &Job) -> Option<String> {
        if self.finished || !job.status.is_terminal() {
            return None;
        }
        self.finished = true;
        let icon = match job.status {
            Status::Success => "✅",
            Status::Failed => "❌",
            _ => "🚫",
        };
        Some(format!("{icon} Job {} completed with status: {}", job.id, job.status))
    }
}

/// Streams a job's log to `out` until it finishes or ctrl-c is pressed.
///
/// The first trace fetch is fatal on failure; later poll errors are printed
/// and polling continues.
pub async fn follow_job<W: Write>(
    source: &DataSource,
    job_id: u64,
    interval: Duration,
    out: &mut W,
) -> Result<FollowOutcome> {
    follow_until(source, job_id, interval, out, tokio::signal::ctrl_c()).await
}

/// Like [`follow_job`], stopping as soon as `stop` resolves, even mid-fetch.
async fn follow_until<W: Write, S: Future>(
    source: &DataSource,
    job_id: u64,
    interval: Duration,
    out: &mut W,
    stop: S,
) -> Result<FollowOutcome> {
    let mut follower = LogFollower::default();

    let trace = source.job_trace(job_id).await?;
    eprintln!("{}", provenance_line(&trace.provenance));
    eprintln!(
        "{}",
        dim(format!(
            "Following job {job_id}, polling every {}s (ctrl-c to stop)",
            interval.as_secs()
        ))
    );
    if let Some(text) = follower.new_content(&trace.value) {
        write!(out, "{text}")?;
        out.flush()?;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    tokio::pin!(stop);

    let details = tokio::select! {
        _ = &mut stop => return stopped(out),
        details = source.job_details(job_id) => details,
    };
    if let Some(status) = report_status(job_id, details, &mut follower, out)? {
        return Ok(FollowOutcome::Completed(status));
    }

    loop {
        let (trace, details) = tokio::select! {
            _ = &mut stop => return stopped(out),
            polled = poll(source, job_id, &mut ticker) => polled,
        };

        match trace {
            Ok(trace) => {
                if let Some(text) = follower.new_content(&trace.value) {
                    write!(out, "{text}")?;
                    out.flush()?;
                }
            }
            Err(err) => writeln!(out, "⚠️  Failed to fetch logs for job {job_id}: {err}")?,
        }

        if let Some(status) = report_status(job_id, details, &mut follower, out)? {
            return Ok(FollowOutcome::Completed(status));
        }
    }
}

/// Waits for the next tick, then fetches the trace and the job's status.
async fn poll(
    source: &DataSource,
    job_id: u64,
    ticker: &mut Interval,
) -> (Result<Sourced<String>>, Result<Sourced<Job>>) {
    ticker.tick().await;
    let trace = source.job_trace(job_id).await;
    let details = source.job_details(job_id).await;
    (trace, details)
}

fn stopped<W: Write>(out: &mut W) -> Result<FollowOutcome> {
    writeln!(out, "\n🛑 Log streaming stopped")?;
    Ok(FollowOutcome::Interrupted)
}

fn report_status<W: Write>(
    job_id: u64,
    details: Result<Sourced<Job>>,
    follower: &mut LogFollower,
    out: &mut W,
) -> Result<Option<Status>> {
    match details {
        Ok(job) => {
            if let Some(banner) = follower.completion(&job.value) {
                writeln!(out, "\n{banner}")?;
                return Ok(Some(job.value.status));
            }
            Ok(None)
        }
        Err(err) => {
            warn!("Could not check status of job {job_id}: {err}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CiTool;
    use crate::source::{ApiTier, FallbackReason, SourceMode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_only_new_content_is_returned() {
        let mut follower = LogFollower::default();
        assert_eq!(follower.new_content("line 1\n"), Some("line 1\n"));
        assert_eq!(follower.new_content("line 1\n"), None);
        assert_eq!(follower.new_content("line 1\nline 2\n"), Some("line 2\n"));
    }

    #[test]
    fn test_shrunk_trace_starts_over() {
        let mut follower = LogFollower::default();
        follower.new_content("a long first attempt\n");
        assert_eq!(follower.new_content("retry\n"), Some("retry\n"));
    }

    #[test]
    fn test_offset_inside_multibyte_char_starts_over() {
        let mut follower = LogFollower::default();
        follower.new_content("ab");
        // Byte 2 falls inside the three-byte check mark.
        assert_eq!(follower.new_content("a✓"), Some("a✓"));
    }

    #[test]
    fn test_completion_banner_once() {
        let mut follower = LogFollower::default();
        let mut job = Job::new(1001, "build", Status::Running, "build");
        assert_eq!(follower.completion(&job), None);

        job.status = Status::Failed;
        assert_eq!(
            follower.completion(&job).as_deref(),
            Some("❌ Job 1001 completed with status: failed")
        );
        assert_eq!(follower.completion(&job), None);
    }

    #[tokio::test]
    async fn test_follow_finished_job_prints_log_and_banner() {
        let source = DataSource::demo();
        let mut out = Vec::new();

        let outcome = follow_job(&source, 1001, Duration::from_millis(10), &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(outcome, FollowOutcome::Completed(Status::Success));
        assert!(printed.contains("npm-preparation"));
        assert_eq!(printed.matches("completed with status: success").count(), 1);
    }

    /// glab stand-in whose trace answers once and then hangs.
    struct HangingTool {
        traces: AtomicUsize,
    }

    #[async_trait]
    impl CiTool for HangingTool {
        async fn list_pipelines(&self, _project: &str, _limit: usize) -> Result<String> {
            Ok(String::new())
        }

        async fn pipeline_jobs(&self, _project: &str, _pipeline_id: u64) -> Result<String> {
            Ok("[]".to_string())
        }

        async fn pipeline_bridges(&self, _project: &str, _pipeline_id: u64) -> Result<String> {
            Ok("[]".to_string())
        }

        async fn job(&self, _project: &str, job_id: u64) -> Result<String> {
            Ok(format!(
                r#"{{"id": {job_id}, "name": "deploy", "status": "running", "stage": "deploy"}}"#
            ))
        }

        async fn job_trace(&self, _project: &str, _job_id: u64) -> Result<String> {
            if self.traces.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok("$ ./deploy.sh\n".to_string());
            }
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_a_hanging_poll() {
        let tool = HangingTool {
            traces: AtomicUsize::new(0),
        };
        let source = DataSource::new(
            SourceMode::LocalTool {
                project: "group/project".to_string(),
                tool: Arc::new(tool),
                api: ApiTier::Missing(FallbackReason::NoToken),
            },
            20,
            "",
        );
        let mut out = Vec::new();

        let stop = tokio::time::sleep(Duration::from_secs(5));
        let outcome = follow_until(&source, 7, Duration::from_secs(1), &mut out, stop)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(outcome, FollowOutcome::Interrupted);
        assert!(printed.starts_with("$ ./deploy.sh\n"));
        assert!(printed.ends_with("Log streaming stopped\n"));
    }
}
