//! Built-in records shown when no live source answers.

use crate::model::{Job, Pipeline, Status};

pub fn sample_pipelines() -> Vec<Pipeline> {
    [
        (1_996_879_423, Status::Running, "feat/zap-c3", "frontend-app", "about 2 minutes ago"),
        (
            1_996_867_272,
            Status::Running,
            "refs/merge-requests/406/head",
            "backend-api",
            "about 5 minutes ago",
        ),
        (1_996_733_511, Status::Success, "fix/supplier-bug", "frontend-app", "about 1 hour ago"),
        (1_996_723_026, Status::Failed, "fix/supplier-bug", "data-pipeline", "about 1 hour ago"),
        (1_996_719_037, Status::Success, "main", "backend-api", "about 2 hours ago"),
        (
            1_996_719_038,
            Status::WaitingForResource,
            "feature/auth",
            "auth-service",
            "about 2 hours ago",
        ),
        (1_996_719_039, Status::Success, "main", "data-pipeline", "about 3 hours ago"),
    ]
    .into_iter()
    .map(|(id, status, ref_, project, created)| {
        let mut pipeline = Pipeline::new(id, status, ref_, project);
        pipeline.created = Some(created.to_string());
        pipeline
    })
    .collect()
}

/// The same job layout is used for every sample pipeline.
pub fn sample_jobs(_pipeline_id: u64) -> Vec<Job> {
    [
        (1001, "npm-preparation", Status::Success, "prepare", Some(48.0)),
        (1002, "nx-mono-repo-affected", Status::Running, "build", Some(131.0)),
        (1003, "cloudflare-deploy", Status::Pending, "deploy", None),
        (1004, "zap-security-scan", Status::Pending, "test", None),
        (1005, "cypress-e2e", Status::Pending, "test", None),
    ]
    .into_iter()
    .map(|(id, name, status, stage, duration)| Job {
        duration,
        ..Job::new(id, name, status, stage)
    })
    .collect()
}

pub fn sample_job(job_id: u64) -> Job {
    sample_jobs(0)
        .into_iter()
        .find(|job| job.id == job_id)
        .unwrap_or_else(|| Job::new(job_id, "sample-job", Status::Success, "test"))
}

pub fn sample_logs(job_id: u64) -> String {
    let job = sample_job(job_id);
    format!(
        "🎯 Demo Mode - Sample Job Log\n\
         \n\
         📋 Job: {name} (#{id})\n\
         📊 Status: {status}\n\
         🏗️  Stage: {stage}\n\
         \n\
         Running with gitlab-runner 16.11.0\n\
         Preparing the \"docker\" executor\n\
         [INFO] Starting job execution...\n\
         [INFO] Installing dependencies...\n\
         $ npm ci\n\
         added 1342 packages in 38s\n\
         [INFO] Running tests...\n\
         [SUCCESS] All tests passed!\n\
         [INFO] Job completed successfully\n\
         \n\
         💡 Real GitLab projects show the actual job trace here.\n",
        name = job.name,
        id = job.id,
        status = job.status,
        stage = job.stage,
    )
}
