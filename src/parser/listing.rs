//! Parser for glab's human-oriented pipeline listing.
//!
//! A listing looks like:
//!
//! ```text
//! Showing 30 pipelines on group/project (Page 1)
//!
//! State   IID     Ref     Created
//! (running) • #1997196243	(#6866)	refs/merge-requests/406/head	(less than a minute ago)
//! (success) • #1996941196	(#6785)	feat/zap-c3	(about 4 minutes ago)
//! ```
//!
//! Rows are tab separated: status marker and ID, IID, ref, relative time.
//! Parsing is per line and never fails as a whole; rows that cannot be
//! understood are counted and dropped.

use log::debug;

use crate::model::{Pipeline, Status};

const HEADER_PREFIXES: [&str; 3] = ["Showing", "State", "---"];
const DEFAULT_PROJECT_NAME: &str = "current-project";
const UNKNOWN_REF: &str = "unknown";

/// Result of parsing a whole listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub project_name: String,
    pub pipelines: Vec<Pipeline>,
    /// Candidate rows (containing `#`) that did not yield a pipeline
    pub rejected: usize,
}

/// Parses the full output of `glab ci list`.
pub fn parse_listing(output: &str) -> Listing {
    let project_name =
        parse_project_name(output).unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

    let mut pipelines = Vec::new();
    let mut rejected = 0;

    for line in output.lines() {
        let line = line.trim();
        if is_banner(line) || !line.contains('#') {
            continue;
        }

        match parse_pipeline_line(line, &project_name) {
            Some(pipeline) => pipelines.push(pipeline),
            None => {
                debug!("Skipping unparseable listing row: {line:?}");
                rejected += 1;
            }
        }
    }

    Listing {
        project_name,
        pipelines,
        rejected,
    }
}

/// Extracts the project name from the `Showing N pipelines on group/project` banner.
pub fn parse_project_name(output: &str) -> Option<String> {
    let header = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Showing") && line.contains(" on "))?;

    let (_, path) = header.split_once(" on ")?;
    let path = path
        .split(" (Page")
        .next()
        .unwrap_or(path)
        .trim()
        .trim_end_matches('.')
        .trim();

    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}

/// Blank lines and the listing's banner/column-header lines.
pub fn is_banner(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Parses one listing row into a pipeline.
///
/// Returns `None` for banner lines, lines without `#`, and rows whose ID is
/// missing or zero.
pub fn parse_pipeline_line(line: &str, project_name: &str) -> Option<Pipeline> {
    let line = line.trim();
    if is_banner(line) || !line.contains('#') {
        return None;
    }

    let id = parse_id(line);
    if id == 0 {
        return None;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    let status = fields
        .first()
        .map_or(Status::Unknown, |field| parse_status_marker(field));
    let ref_ = fields.get(2).map_or(UNKNOWN_REF, |field| field.trim());

    let mut pipeline = Pipeline::new(id, status, ref_, project_name);
    pipeline.iid = fields.get(1).and_then(|field| parse_iid(field));
    pipeline.created = fields.get(3).and_then(|field| parse_created(field));
    Some(pipeline)
}

/// Finds the parenthesised status keyword inside the status field.
///
/// Only the leading field (before the first tab) is searched so that a ref
/// or timestamp containing e.g. `(running)` cannot override the real status.
pub fn parse_status_marker(status_field: &str) -> Status {
    Status::LISTING_KEYWORDS
        .into_iter()
        .find(|status| status_field.contains(&format!("({})", status.as_str())))
        .unwrap_or(Status::Unknown)
}

/// Digits immediately following the first `#`; zero when there are none.
fn parse_id(line: &str) -> u64 {
    let Some((_, rest)) = line.split_once('#') else {
        return 0;
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn parse_iid(field: &str) -> Option<u64> {
    field
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim_start_matches('#')
        .parse()
        .ok()
}

fn parse_created(field: &str) -> Option<String> {
    let text = field
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}
