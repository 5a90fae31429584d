use console::style;

use crate::model::Status;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Icon and name of a status in its status colour.
pub fn status(status: Status) -> console::StyledObject<String> {
    let text = format!("{} {}", status.icon(), status);
    match status {
        Status::Success => bright_green(text),
        Status::Failed => bright_red(text),
        Status::Running => cyan(text),
        Status::WaitingForResource | Status::Pending | Status::Created => bright_yellow(text),
        _ => dim(text),
    }
}
