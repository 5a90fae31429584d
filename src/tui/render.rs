use indexmap::IndexMap;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use super::theme::Theme;
use crate::model::{Job, Pipeline, Status};
use crate::navigation::{Navigator, View};
use crate::source::Provenance;

/// Session facts shown in the header that the navigator does not own.
#[derive(Debug, Clone)]
pub struct Header {
    /// What is being watched, e.g. `group/project (glab → API → sample)`
    pub source: String,
    pub refresh_secs: u64,
}

pub fn render(frame: &mut Frame, nav: &Navigator, header: &Header, theme: &Theme) {
    let [top, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, top, nav, header, theme);
    match nav.view() {
        View::PipelineList => render_pipelines(frame, body, nav, theme),
        View::JobList => render_jobs(frame, body, nav, theme),
        View::LogView => render_logs(frame, body, nav, theme),
    }
    render_footer(frame, footer, nav, header, theme);
}

fn render_header(frame: &mut Frame, area: Rect, nav: &Navigator, header: &Header, theme: &Theme) {
    let provenance = match nav.view() {
        View::PipelineList => nav.pipelines_provenance(),
        View::JobList => nav.jobs_provenance(),
        View::LogView => nav.logs_provenance(),
    };

    let mut spans = vec![
        Span::styled("🦊 glab-tui ", theme.title),
        Span::styled(header.source.clone(), theme.dim),
    ];
    if let Some(provenance) = provenance {
        let style = if provenance.is_live() {
            theme.live
        } else {
            theme.sample
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(provenance_label(provenance), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn provenance_label(provenance: &Provenance) -> String {
    if provenance.is_live() {
        format!("📡 {provenance}")
    } else {
        format!("🎭 {provenance}")
    }
}

fn status_counts<'a>(statuses: impl Iterator<Item = &'a Status>) -> String {
    let (mut running, mut success, mut failed, mut other) = (0, 0, 0, 0);
    for status in statuses {
        match status {
            Status::Running => running += 1,
            Status::Success => success += 1,
            Status::Failed => failed += 1,
            _ => other += 1,
        }
    }
    format!("● {running} running  ✓ {success} passed  ✗ {failed} failed  ○ {other} other")
}

fn titled_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(title, theme.title))
}

fn render_pipelines(frame: &mut Frame, area: Rect, nav: &Navigator, theme: &Theme) {
    let pipelines = nav.pipelines();
    let block = titled_block(
        format!(
            " Pipelines ({}) · {} ",
            pipelines.len(),
            status_counts(pipelines.iter().map(|p| &p.status))
        ),
        theme,
    );

    if pipelines.is_empty() {
        let text = if nav.is_loading() {
            "⏳ Loading pipelines..."
        } else {
            "No pipelines yet. Press r to refresh, q to quit."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(text, theme.dim)).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = pipelines.iter().map(|p| pipeline_item(p, theme)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selected)
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(Some(nav.pipeline_cursor().index()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn pipeline_item<'a>(pipeline: &'a Pipeline, theme: &Theme) -> ListItem<'a> {
    let status_style = theme.status(pipeline.status);
    let mut spans = vec![
        Span::styled(format!("{} ", pipeline.status.icon()), status_style),
        Span::raw(format!("#{:<12}", pipeline.id)),
        Span::styled(format!("{:<22}", pipeline.status.as_str()), status_style),
        Span::raw(format!("{:<28} ", pipeline.ref_)),
        Span::styled(format!("{:<18} ", pipeline.project_name), theme.dim),
        Span::raw(format!("{:<12}", pipeline.jobs_summary)),
    ];
    if let Some(created) = pipeline.created_display() {
        spans.push(Span::styled(created, theme.dim));
    }
    ListItem::new(Line::from(spans))
}

/// Stage names in order of first appearance with their jobs' statuses.
fn stage_summary(jobs: &[Job]) -> String {
    let mut stages: IndexMap<&str, Vec<Status>> = IndexMap::new();
    for job in jobs {
        stages.entry(job.stage.as_str()).or_default().push(job.status);
    }

    stages
        .iter()
        .map(|(stage, statuses)| {
            let icons: String = statuses.iter().map(|status| status.icon()).collect();
            format!("{stage} {icons}")
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

fn render_jobs(frame: &mut Frame, area: Rect, nav: &Navigator, theme: &Theme) {
    let jobs = nav.jobs();
    let pipeline = nav
        .selected_pipeline_id()
        .map_or_else(String::new, |id| format!("#{id}"));
    let block = titled_block(
        format!(
            " Pipeline {pipeline} · {} jobs · {} ",
            jobs.len(),
            status_counts(jobs.iter().map(|j| &j.status))
        ),
        theme,
    );

    let [stages, list_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(block.inner(area));
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Line::styled(stage_summary(jobs), theme.dim)),
        stages,
    );

    if jobs.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled("This pipeline has no jobs.", theme.dim)),
            list_area,
        );
        return;
    }

    let items: Vec<ListItem> = jobs
        .iter()
        .map(|job| {
            let status_style = theme.status(job.status);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", job.status.icon()), status_style),
                Span::raw(format!("#{:<12}", job.id)),
                Span::raw(format!("{:<32} ", job.name)),
                Span::styled(format!("{:<12} ", job.stage), theme.dim),
                Span::styled(format!("{:<22}", job.status.as_str()), status_style),
                Span::styled(job.duration_display().unwrap_or_default(), theme.dim),
            ]))
        })
        .collect();
    let list = List::new(items)
        .highlight_style(theme.selected)
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(Some(nav.job_cursor().index()));
    frame.render_stateful_widget(list, list_area, &mut state);
}

/// Drops ANSI escape sequences and carriage returns from a CI trace line.
pub fn strip_ansi(line: &str) -> String {
    let stripped = strip_ansi_escapes::strip(line.as_bytes());
    String::from_utf8_lossy(&stripped).replace('\r', "")
}

fn render_logs(frame: &mut Frame, area: Rect, nav: &Navigator, theme: &Theme) {
    let job = nav
        .selected_job_id()
        .map_or_else(String::new, |id| format!("#{id}"));
    let block = titled_block(format!(" Job {job} log "), theme);
    let height = usize::from(block.inner(area).height);

    let lines: Vec<&str> = nav.logs().lines().collect();
    let end = lines.len().saturating_sub(nav.log_offset());
    let start = end.saturating_sub(height);
    let visible: Vec<Line> = lines[start..end]
        .iter()
        .map(|line| Line::raw(strip_ansi(line)))
        .collect();

    frame.render_widget(
        Paragraph::new(visible)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, nav: &Navigator, header: &Header, theme: &Theme) {
    if let Some(error) = nav.error() {
        frame.render_widget(
            Paragraph::new(Line::styled(format!("⚠ {error}"), theme.error)),
            area,
        );
        return;
    }

    let keys: &[(&str, &str)] = match nav.view() {
        View::PipelineList => &[
            ("↑↓", "move"),
            ("enter", "jobs"),
            ("r", "refresh"),
            ("space", "auto"),
            ("q", "quit"),
        ],
        View::JobList => &[
            ("↑↓", "move"),
            ("enter", "open"),
            ("l", "follow"),
            ("esc", "back"),
            ("q", "quit"),
        ],
        View::LogView => &[
            ("↑↓", "scroll"),
            ("l", "follow"),
            ("esc", "back"),
            ("q", "quit"),
        ],
    };

    let mut spans = Vec::new();
    for (key, label) in keys {
        spans.push(Span::styled(*key, theme.key));
        spans.push(Span::styled(format!(" {label}  "), theme.dim));
    }
    let refresh = if nav.auto_refresh() {
        format!("⟳ auto {}s", header.refresh_secs)
    } else {
        "⏸ auto-refresh paused".to_string()
    };
    spans.push(Span::styled(refresh, theme.dim));
    if nav.is_loading() {
        spans.push(Span::styled("  ⏳ loading", theme.sample));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Action, Effect, NavEvent};
    use crate::source::{FallbackReason, Sourced};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn header() -> Header {
        Header {
            source: "group/frontend-apps (glab → API → sample)".to_string(),
            refresh_secs: 3,
        }
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(nav: &Navigator) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 20)).unwrap();
        let theme = Theme::new();
        terminal
            .draw(|frame| render(frame, nav, &header(), &theme))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn request_of(effects: &[Effect]) -> u64 {
        match effects.first() {
            Some(
                Effect::FetchPipelines { request }
                | Effect::FetchJobs { request, .. }
                | Effect::FetchLogs { request, .. },
            ) => *request,
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    fn with_pipelines(provenance: Provenance) -> Navigator {
        let mut nav = Navigator::new();
        let request = request_of(&nav.start());
        nav.handle(NavEvent::PipelinesLoaded {
            request,
            result: Ok(Sourced::new(
                vec![
                    Pipeline::new(
                        1_997_196_243,
                        Status::Running,
                        "refs/merge-requests/406/head",
                        "frontend-apps",
                    ),
                    Pipeline::new(1_996_941_196, Status::Failed, "feat/zap-c3", "frontend-apps"),
                ],
                provenance,
            )),
        });
        nav
    }

    #[test]
    fn test_loading_screen_before_first_result() {
        let mut nav = Navigator::new();
        nav.start();
        let screen = draw(&nav);
        assert!(screen.contains("Loading pipelines"));
        assert!(screen.contains("loading"));
    }

    #[test]
    fn test_pipeline_list_shows_rows_and_provenance() {
        let nav = with_pipelines(Provenance::Sample(FallbackReason::NoToken));
        let screen = draw(&nav);

        assert!(screen.contains("Pipelines (2)"));
        assert!(screen.contains("1997196243"));
        assert!(screen.contains("MR-406"));
        assert!(screen.contains("Mock Data - No Token"));
        assert!(screen.contains("auto 3s"));
    }

    #[test]
    fn test_job_list_with_stage_summary() {
        let mut nav = with_pipelines(Provenance::Glab {
            project: "group/frontend-apps".to_string(),
        });
        let effects = nav.handle(NavEvent::Key(Action::Enter));
        nav.handle(NavEvent::JobsLoaded {
            request: request_of(&effects),
            pipeline_id: 1_997_196_243,
            result: Ok(Sourced::new(
                crate::source::sample::sample_jobs(1_997_196_243),
                Provenance::Glab {
                    project: "group/frontend-apps".to_string(),
                },
            )),
        });

        let screen = draw(&nav);
        assert!(screen.contains("Pipeline #1997196243"));
        assert!(screen.contains("npm-preparation"));
        assert!(screen.contains("prepare ✓"));
        assert!(screen.contains("Real Data via glab"));
    }

    #[test]
    fn test_error_replaces_key_help() {
        let mut nav = with_pipelines(Provenance::Sample(FallbackReason::Demo));
        let effects = nav.handle(NavEvent::Key(Action::Enter));
        nav.handle(NavEvent::JobsLoaded {
            request: request_of(&effects),
            pipeline_id: 1_997_196_243,
            result: Err("timed out after 60s".to_string()),
        });

        let screen = draw(&nav);
        assert!(screen.contains("timed out after 60s"));
        assert!(screen.contains("Pipelines (2)"));
    }

    #[test]
    fn test_log_view_shows_tail() {
        let mut nav = with_pipelines(Provenance::Sample(FallbackReason::Demo));
        let effects = nav.handle(NavEvent::Key(Action::Enter));
        nav.handle(NavEvent::JobsLoaded {
            request: request_of(&effects),
            pipeline_id: 1_997_196_243,
            result: Ok(Sourced::new(
                vec![Job::new(1002, "build", Status::Running, "build")],
                Provenance::Sample(FallbackReason::Demo),
            )),
        });
        let effects = nav.handle(NavEvent::Key(Action::Enter));
        let log: String = (1..=100).map(|n| format!("log line {n}\n")).collect();
        nav.handle(NavEvent::LogsLoaded {
            request: request_of(&effects),
            job_id: 1002,
            result: Ok(Sourced::new(log, Provenance::Sample(FallbackReason::Demo))),
        });

        let screen = draw(&nav);
        assert!(screen.contains("Job #1002 log"));
        // 14 rows fit inside the log block.
        assert!(screen.contains("log line 100"));
        assert!(screen.contains("log line 87 "));
        assert!(!screen.contains("log line 86 "));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(
            strip_ansi("\u{1b}[32;1m$ npm ci\u{1b}[0;m\r"),
            "$ npm ci"
        );
        assert_eq!(strip_ansi("plain ✓"), "plain ✓");
    }

    #[test]
    fn test_strip_ansi_drops_title_sequences() {
        assert_eq!(strip_ansi("\u{1b}]0;title\u{7}visible"), "visible");
        assert_eq!(
            strip_ansi("section_start:1\r\u{1b}[0K\u{1b}[36;1mFetching\u{1b}[0;m"),
            "section_start:1Fetching"
        );
    }

    #[test]
    fn test_stage_summary_keeps_first_seen_order() {
        let jobs = crate::source::sample::sample_jobs(1);
        assert_eq!(
            stage_summary(&jobs),
            "prepare ✓ → build ● → deploy ○ → test ○○"
        );
    }
}
