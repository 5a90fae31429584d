mod progress;
mod styling;
mod tables;

pub use progress::Spinner;
pub use styling::{bright_green, bright_red, dim};

use styling::{bright_yellow, magenta_bold};
use tables::{job_table, pipelines_table};

use crate::model::{Job, Pipeline};
use crate::source::{Provenance, Sourced};

/// Prints the `glab-tui` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🦊 glab-tui"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab CI/CD pipelines in your terminal")
    );
}

/// One-line data provenance, highlighted when the data is not live.
pub fn provenance_line(provenance: &Provenance) -> String {
    if provenance.is_live() {
        format!("📡 {}", bright_green(provenance))
    } else {
        format!("🎭 {}", bright_yellow(provenance))
    }
}

pub fn print_pipelines(pipelines: &Sourced<Vec<Pipeline>>) {
    println!("{}", provenance_line(&pipelines.provenance));
    println!("{}", pipelines_table(&pipelines.value));
    println!(
        "{}",
        dim(format!("{} pipelines", pipelines.value.len()))
    );
}

pub fn print_job(job: &Sourced<Job>) {
    println!("{}", provenance_line(&job.provenance));
    println!("{}", job_table(&job.value));
}
