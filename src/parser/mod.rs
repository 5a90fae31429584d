mod jobs;
mod listing;
mod pipelines;

pub use jobs::{parse_downstream_json, parse_job_json, parse_jobs_json};
pub use listing::parse_listing;
pub use pipelines::parse_pipelines_json;

use serde_json::Value;

// GitLab sends integers, but some encoders emit them as floats (55.0).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_id(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.trunc() as u64
    } else {
        0
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
