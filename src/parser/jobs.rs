//! Tolerant decoding of GitLab job JSON.
//!
//! Both glab's `api` passthrough and the REST API return the same job
//! objects. Fields are pulled out one by one so a missing or mistyped field
//! degrades that field instead of rejecting the whole response.

use serde_json::Value;

use super::{kind, truncate_id};
use crate::error::{GlabTuiError, Result};
use crate::model::{Job, Status};

/// Decodes a JSON array of jobs, keeping only entries with an ID and a name.
///
/// Fails only when the text is not a JSON array.
pub fn parse_jobs_json(text: &str) -> Result<Vec<Job>> {
    let value: Value = serde_json::from_str(text.trim())?;
    let Value::Array(entries) = value else {
        return Err(GlabTuiError::Parse {
            what: "job list",
            reason: format!("expected a JSON array, got {}", kind(&value)),
        });
    };

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(job_from_value)
        .filter(Job::is_valid)
        .collect())
}

/// Decodes a single job object.
pub fn parse_job_json(text: &str) -> Result<Job> {
    let value: Value = serde_json::from_str(text.trim())?;
    if !value.is_object() {
        return Err(GlabTuiError::Parse {
            what: "job",
            reason: format!("expected a JSON object, got {}", kind(&value)),
        });
    }

    let job = job_from_value(&value);
    if job.is_valid() {
        Ok(job)
    } else {
        Err(GlabTuiError::Parse {
            what: "job",
            reason: "missing id or name".to_string(),
        })
    }
}

/// Builds a job from an object, defaulting every field that is absent or mistyped.
pub fn job_from_value(value: &Value) -> Job {
    let text = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default();

    Job {
        id: value.get("id").and_then(Value::as_f64).map_or(0, truncate_id),
        name: text("name").to_string(),
        status: Status::parse(text("status")),
        stage: text("stage").to_string(),
        duration: value.get("duration").and_then(Value::as_f64),
        web_url: value
            .get("web_url")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        child_pipeline: false,
    }
}

/// Downstream pipelines of a pipeline's bridge (trigger) jobs, as job-like rows.
///
/// Bridges that have not created a pipeline yet are skipped. Fails only when
/// the text is not a JSON array.
pub fn parse_downstream_json(text: &str) -> Result<Vec<Job>> {
    let value: Value = serde_json::from_str(text.trim())?;
    let Value::Array(bridges) = value else {
        return Err(GlabTuiError::Parse {
            what: "bridge list",
            reason: format!("expected a JSON array, got {}", kind(&value)),
        });
    };

    Ok(bridges
        .iter()
        .filter_map(|bridge| bridge.get("downstream_pipeline").filter(|d| d.is_object()))
        .map(downstream_row)
        .filter(|row| row.id != 0)
        .collect())
}

fn downstream_row(pipeline: &Value) -> Job {
    let id = pipeline.get("id").and_then(Value::as_f64).map_or(0, truncate_id);
    let text = |key: &str| pipeline.get(key).and_then(Value::as_str).unwrap_or_default();
    let ref_ = Some(text("ref")).filter(|r| !r.is_empty()).unwrap_or("unknown");

    Job {
        child_pipeline: true,
        web_url: pipeline
            .get("web_url")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        ..Job::new(
            id,
            &format!("🔗 Child Pipeline #{id}"),
            Status::parse(text("status")),
            &format!("child-{ref_}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_id_is_accepted() {
        let jobs = parse_jobs_json(
            r#"[{"id": 55.0, "name": "build", "status": "success", "stage": "build"}]"#,
        )
        .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, 55);
        assert_eq!(jobs[0].name, "build");
        assert_eq!(jobs[0].status, Status::Success);
        assert_eq!(jobs[0].stage, "build");
    }

    #[test]
    fn test_entries_without_name_or_id_are_dropped() {
        let text = r#"[
            {"id": 1, "name": "lint", "status": "failed", "stage": "test"},
            {"id": 2, "status": "success", "stage": "build"},
            {"name": "orphan", "status": "success"},
            {"id": 0, "name": "zero"},
            "not an object",
            {"id": 3, "name": "deploy", "status": "manual", "stage": "deploy", "duration": 12.5}
        ]"#;
        let jobs = parse_jobs_json(text).unwrap();

        let names: Vec<&str> = jobs.iter().map(|job| job.name.as_str()).collect();
        assert_eq!(names, ["lint", "deploy"]);
        assert_eq!(jobs[1].duration, Some(12.5));
        assert_eq!(jobs[1].status, Status::Manual);
    }

    #[test]
    fn test_mistyped_fields_degrade_to_defaults() {
        let text = r#"[{"id": 9, "name": "build", "status": 42, "stage": null, "web_url": 7}]"#;
        let jobs = parse_jobs_json(text).unwrap();

        assert_eq!(jobs[0].status, Status::Unknown);
        assert_eq!(jobs[0].stage, "");
        assert_eq!(jobs[0].web_url, None);
    }

    #[test]
    fn test_string_id_is_not_a_number() {
        let jobs = parse_jobs_json(r#"[{"id": "12", "name": "build"}]"#).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_non_array_is_an_error() {
        assert!(parse_jobs_json(r#"{"message": "404 Not found"}"#).is_err());
        assert!(parse_jobs_json("not json").is_err());
        assert!(parse_jobs_json("").is_err());
        assert!(parse_jobs_json("  [] ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_job() {
        let job = parse_job_json(
            r#"{"id": 1002, "name": "nx-mono-repo-affected", "status": "running",
                "stage": "build", "duration": 61.2,
                "web_url": "https://gitlab.com/group/project/-/jobs/1002"}"#,
        )
        .unwrap();

        assert_eq!(job.id, 1002);
        assert_eq!(job.status, Status::Running);
        assert_eq!(job.duration_display().as_deref(), Some("1m 01s"));
        assert_eq!(
            job.web_url.as_deref(),
            Some("https://gitlab.com/group/project/-/jobs/1002")
        );
    }

    #[test]
    fn test_parse_single_job_rejects_arrays_and_nameless_jobs() {
        assert!(parse_job_json("[]").is_err());
        assert!(parse_job_json(r#"{"id": 4}"#).is_err());
    }

    #[test]
    fn test_downstream_pipelines_become_child_rows() {
        let text = r#"[
            {"id": 501, "name": "trigger-e2e", "stage": "test", "status": "success",
             "downstream_pipeline": {
                 "id": 1996900001, "status": "running", "ref": "main",
                 "web_url": "https://gitlab.com/group/e2e/-/pipelines/1996900001"}},
            {"id": 502, "name": "trigger-docs", "stage": "deploy", "status": "manual",
             "downstream_pipeline": null},
            {"id": 503, "name": "trigger-broken", "downstream_pipeline": {"status": "failed"}}
        ]"#;
        let rows = parse_downstream_json(text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1_996_900_001);
        assert_eq!(rows[0].name, "🔗 Child Pipeline #1996900001");
        assert_eq!(rows[0].stage, "child-main");
        assert_eq!(rows[0].status, Status::Running);
        assert!(rows[0].child_pipeline);
        assert!(rows[0].web_url.as_deref().unwrap().ends_with("/pipelines/1996900001"));
    }

    #[test]
    fn test_downstream_without_bridges() {
        assert!(parse_downstream_json("[]").unwrap().is_empty());
        assert!(parse_downstream_json(r#"{"message": "403 Forbidden"}"#).is_err());
    }

    #[test]
    fn test_negative_and_fractional_ids() {
        assert_eq!(truncate_id(-5.0), 0);
        assert_eq!(truncate_id(77.9), 77);
        assert_eq!(truncate_id(f64::NAN), 0);
    }
}
