/// Web page of a pipeline, e.g. `https://gitlab.com/group/project/-/pipelines/123`.
pub fn pipeline_url(base_url: &str, project_path: &str, pipeline_id: u64) -> String {
    format!(
        "{}/{}/-/pipelines/{pipeline_id}",
        base_url.trim_end_matches('/'),
        project_path.trim_matches('/')
    )
}

/// Web page of a job, e.g. `https://gitlab.com/group/project/-/jobs/456`.
pub fn job_url(base_url: &str, project_path: &str, job_id: u64) -> String {
    format!(
        "{}/{}/-/jobs/{job_id}",
        base_url.trim_end_matches('/'),
        project_path.trim_matches('/')
    )
}
