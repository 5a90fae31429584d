use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::{Job, Pipeline, Status};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_cell(status: Status) -> Cell {
    let cell = Cell::new(format!("{} {status}", status.icon()));
    match status {
        Status::Success => cell.fg(TableColor::Green),
        Status::Failed => cell.fg(TableColor::Red),
        Status::Running => cell.fg(TableColor::Cyan),
        Status::WaitingForResource | Status::Pending | Status::Created => {
            cell.fg(TableColor::Yellow)
        }
        _ => cell.fg(TableColor::DarkGrey),
    }
}

pub fn pipelines_table(pipelines: &[Pipeline]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Pipeline", "Status", "Ref", "Project", "Jobs", "Created"]);

    for pipeline in pipelines {
        table.add_row(vec![
            Cell::new(format!("#{}", pipeline.id)),
            status_cell(pipeline.status),
            Cell::new(&pipeline.ref_),
            Cell::new(&pipeline.project_name),
            Cell::new(&pipeline.jobs_summary),
            Cell::new(pipeline.created_display().unwrap_or_default()),
        ]);
    }

    table
}

pub fn job_table(job: &Job) -> Table {
    let mut table = create_table();
    table.add_row(vec![Cell::new("Job"), Cell::new(format!("#{} {}", job.id, job.name))]);
    table.add_row(vec![Cell::new("Status"), status_cell(job.status)]);
    table.add_row(vec![Cell::new("Stage"), Cell::new(&job.stage)]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(job.duration_display().unwrap_or_else(|| "-".to_string())),
    ]);
    if let Some(url) = &job.web_url {
        table.add_row(vec![Cell::new("URL"), Cell::new(url)]);
    }
    table
}
