//! Interactive pipeline browser.

mod keys;
mod render;
mod theme;

pub use render::Header;

use keys::map_key;
use render::render;
use theme::Theme;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use futures::StreamExt;
use log::{debug, info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::navigation::{Effect, NavEvent, Navigator};
use crate::source::DataSource;

/// Fetches that take longer than this are reported as failed.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Why the interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    /// Leave the TUI and stream this job's log in the plain terminal.
    Follow(u64),
}

#[derive(Debug, Clone)]
pub struct TuiOptions {
    pub refresh_interval: Duration,
    pub header: Header,
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn enter_terminal() -> Result<Tui> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the browser until the user quits or asks to follow a job.
///
/// The terminal is restored on every exit path, including errors.
pub async fn run(source: Arc<DataSource>, options: TuiOptions) -> Result<Exit> {
    let mut terminal = enter_terminal()?;
    let outcome = event_loop(&mut terminal, source, &options).await;
    let restored = leave_terminal(&mut terminal);
    let exit = outcome?;
    restored?;
    Ok(exit)
}

fn refresh_ticker(period: Duration) -> Interval {
    // The first tick lands one period from now; start() already fetched.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn event_loop(
    terminal: &mut Tui,
    source: Arc<DataSource>,
    options: &TuiOptions,
) -> Result<Exit> {
    let theme = Theme::new();
    let mut nav = Navigator::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<NavEvent>();
    let mut events = EventStream::new();
    let mut ticker = refresh_ticker(options.refresh_interval);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Starting TUI for {}", source.describe());
    let mut pending = nav.start();

    loop {
        for effect in pending.drain(..) {
            match effect {
                Effect::Quit => return Ok(Exit::Quit),
                Effect::FollowLogs { job_id } => return Ok(Exit::Follow(job_id)),
                Effect::RestartTicker => ticker = refresh_ticker(options.refresh_interval),
                fetch => spawn_fetch(Arc::clone(&source), fetch, tx.clone()),
            }
        }

        terminal.draw(|frame| render(frame, &nav, &options.header, &theme))?;

        let event = tokio::select! {
            _ = &mut ctrl_c => return Ok(Exit::Quit),
            maybe = events.next() => match maybe {
                Some(Ok(Event::Key(key))) => match map_key(key) {
                    Some(action) => NavEvent::Key(action),
                    None => continue,
                },
                // Resize and other terminal events only need a redraw.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("Failed to read terminal events"),
                None => return Ok(Exit::Quit),
            },
            Some(loaded) = rx.recv() => loaded,
            _ = ticker.tick() => NavEvent::Tick,
        };

        pending = nav.handle(event);
    }
}

/// Runs one fetch effect in the background and reports its result.
fn spawn_fetch(source: Arc<DataSource>, effect: Effect, tx: mpsc::UnboundedSender<NavEvent>) {
    tokio::spawn(async move {
        let Some(event) = fetch(&source, effect).await else {
            return;
        };
        if tx.send(event).is_err() {
            debug!("TUI closed before a fetch result arrived");
        }
    });
}

async fn fetch(source: &DataSource, effect: Effect) -> Option<NavEvent> {
    let event = match effect {
        Effect::FetchPipelines { request } => NavEvent::PipelinesLoaded {
            request,
            result: with_timeout(source.pipelines()).await,
        },
        Effect::FetchJobs { request, pipeline_id } => NavEvent::JobsLoaded {
            request,
            pipeline_id,
            result: with_timeout(source.pipeline_jobs(pipeline_id)).await,
        },
        Effect::FetchLogs { request, job_id } => NavEvent::LogsLoaded {
            request,
            job_id,
            result: with_timeout(source.job_logs(job_id)).await,
        },
        Effect::RestartTicker | Effect::FollowLogs { .. } | Effect::Quit => return None,
    };
    Some(event)
}

async fn with_timeout<T>(
    fetch: impl std::future::Future<Output = T>,
) -> std::result::Result<T, String> {
    tokio::time::timeout(FETCH_TIMEOUT, fetch).await.map_err(|_| {
        warn!("Fetch timed out after {}s", FETCH_TIMEOUT.as_secs());
        format!("timed out after {}s", FETCH_TIMEOUT.as_secs())
    })
}
