use ratatui::style::{Color, Modifier, Style};

use crate::model::Status;

/// Styles used by the renderer. Built once per session.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub border: Style,
    pub selected: Style,
    pub dim: Style,
    pub key: Style,
    pub error: Style,
    pub live: Style,
    pub sample: Style,
    running: Style,
    success: Style,
    failed: Style,
    queued: Style,
    other: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    pub fn new() -> Self {
        Self {
            title: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            border: Style::default().fg(Color::DarkGray),
            selected: Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            key: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            live: Style::default().fg(Color::Green),
            sample: Style::default().fg(Color::Yellow),
            running: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            failed: Style::default().fg(Color::Red),
            queued: Style::default().fg(Color::Yellow),
            other: Style::default().fg(Color::Gray),
        }
    }

    pub fn status(&self, status: Status) -> Style {
        match status {
            Status::Running => self.running,
            Status::Success => self.success,
            Status::Failed => self.failed,
            Status::WaitingForResource | Status::Pending | Status::Created => self.queued,
            _ => self.other,
        }
    }
}
