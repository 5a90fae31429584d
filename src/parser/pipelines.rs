//! Tolerant decoding of the REST pipeline list.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{kind, truncate_id};
use crate::error::{GlabTuiError, Result};
use crate::model::{Pipeline, Status};

/// Decodes `GET /projects/:id/pipelines`, dropping entries without an ID.
///
/// Fails only when the text is not a JSON array.
pub fn parse_pipelines_json(text: &str, project_name: &str) -> Result<Vec<Pipeline>> {
    let value: Value = serde_json::from_str(text.trim())?;
    let Value::Array(entries) = value else {
        return Err(GlabTuiError::Parse {
            what: "pipeline list",
            reason: format!("expected a JSON array, got {}", kind(&value)),
        });
    };

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| pipeline_from_value(entry, project_name))
        .filter(Pipeline::is_valid)
        .collect())
}

fn pipeline_from_value(value: &Value, project_name: &str) -> Pipeline {
    let text = |key: &str| value.get(key).and_then(Value::as_str);
    let number = |key: &str| value.get(key).and_then(Value::as_f64).map_or(0, truncate_id);

    let mut pipeline = Pipeline::new(
        number("id"),
        Status::parse(text("status").unwrap_or_default()),
        text("ref").filter(|r| !r.is_empty()).unwrap_or("unknown"),
        project_name,
    );
    pipeline.iid = Some(number("iid")).filter(|iid| *iid != 0);
    pipeline.created_at = text("created_at")
        .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
        .map(|at| at.with_timezone(&Utc));
    pipeline.web_url = text("web_url").map(ToString::to_string);
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_pipeline_fields() {
        let pipelines = parse_pipelines_json(
            r#"[{"id": 12, "iid": 3, "status": "canceled", "ref": "refs/merge-requests/9/head",
                 "created_at": "2024-05-01T10:00:00Z", "sha": "abc",
                 "web_url": "https://gitlab.com/group/api/-/pipelines/12"}]"#,
            "api",
        )
        .unwrap();

        let pipeline = &pipelines[0];
        assert_eq!(pipeline.id, 12);
        assert_eq!(pipeline.iid, Some(3));
        assert_eq!(pipeline.status, Status::Canceled);
        assert_eq!(pipeline.ref_, "MR-9");
        assert_eq!(pipeline.project_name, "api");
        assert_eq!(pipeline.jobs_summary, "pending");
        assert_eq!(
            pipeline.created_display().as_deref(),
            Some("2024-05-01 10:00")
        );
        assert!(pipeline.web_url.is_some());
    }

    #[test]
    fn test_one_malformed_entry_keeps_the_rest() {
        let pipelines = parse_pipelines_json(
            r#"[{"id": 9, "status": "failed", "ref": "main"},
                {"id": 10, "status": null, "ref": "dev", "created_at": 17},
                {"id": "11", "status": "success"},
                {"status": "running"},
                42]"#,
            "frontend-apps",
        )
        .unwrap();

        let ids: Vec<u64> = pipelines.iter().map(|p| p.id).collect();
        assert_eq!(ids, [9, 10]);
        assert_eq!(pipelines[1].status, Status::Unknown);
        assert_eq!(pipelines[1].ref_, "dev");
        assert_eq!(pipelines[1].created_at, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let pipelines = parse_pipelines_json(r#"[{"id": 5}]"#, "api").unwrap();
        assert_eq!(pipelines[0].status, Status::Unknown);
        assert_eq!(pipelines[0].ref_, "unknown");
        assert_eq!(pipelines[0].iid, None);
        assert_eq!(pipelines[0].web_url, None);
    }

    #[test]
    fn test_non_array_is_an_error() {
        assert!(parse_pipelines_json(r#"{"message": "401 Unauthorized"}"#, "api").is_err());
    }
}
