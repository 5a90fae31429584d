use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{glab_config_path, host_of, resolve_token, ResolvedToken};
use crate::config::{Config, UiConfig};
use crate::follow::{follow_job, FollowOutcome};
use crate::output::{self, bright_green, bright_red, dim, provenance_line, Spinner};
use crate::parser::parse_listing;
use crate::providers::{git, CiApi, CiTool, GitLabClient, GlabCli};
use crate::source::{ApiTier, DataSource, FallbackReason, SourceMode};
use crate::tui::{self, Exit, Header, TuiOptions};

#[derive(Parser)]
#[command(name = "glab-tui")]
#[command(
    author,
    version,
    about = "GitLab CI/CD pipelines, jobs and logs in your terminal",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project path (e.g. 'group/project'); detected from git when absent
    #[arg(short = 'R', long, global = true)]
    repo: Option<String>,

    /// GitLab instance base URL
    #[arg(long, global = true, env = "GITLAB_URL")]
    url: Option<String>,

    /// GitLab personal access token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Interactive pipeline browser (default)
    Tui,

    /// List recent pipelines
    #[command(alias = "p")]
    Pipelines,

    /// Show one job
    #[command(alias = "j")]
    Job { id: u64 },

    /// Print a job's log
    #[command(alias = "l")]
    Logs {
        id: u64,

        /// Keep streaming until the job finishes
        #[arg(short, long)]
        follow: bool,
    },

    /// Check glab and API connectivity
    #[command(alias = "test-real")]
    Test,

    /// Interactive browser on sample data
    #[command(alias = "d")]
    Demo,

    /// Print version information
    #[command(alias = "v")]
    Version,
}

/// Everything a session needs, settled once before any data is fetched.
struct Session {
    config: Config,
    project: Option<String>,
    base_url: String,
    token: Option<ResolvedToken>,
}

impl Cli {
    /// True when the session takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Tui | Commands::Demo))
    }

    async fn session(&self, config: Config) -> Session {
        let base_url = self
            .url
            .clone()
            .unwrap_or_else(|| config.gitlab.base_url.clone());
        let host = host_of(&base_url);

        let project = match self.repo.clone().or_else(|| config.gitlab.project.clone()) {
            Some(project) => Some(project),
            None => git::detect_project_path(Some(&host)).await,
        };

        let explicit = self.token.as_deref().or(config.gitlab.token.as_deref());
        let token = resolve_token(explicit, &host, glab_config_path().as_deref(), |name| {
            std::env::var(name).ok()
        });
        match &token {
            Some(resolved) => info!("Using GitLab token from {}", resolved.source),
            None => info!("No GitLab token found for {host}"),
        }

        Session {
            config,
            project,
            base_url,
            token,
        }
    }

    fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref()).context("Failed to load configuration")
    }

    /// The session's data source, or sample data when the configuration
    /// file cannot be used.
    async fn source_or_sample(&self) -> (DataSource, UiConfig) {
        match self.load_config() {
            Ok(config) => {
                let ui = config.ui.clone();
                (self.session(config).await.into_source(), ui)
            }
            Err(err) => {
                warn!("{err:#}");
                let mode = SourceMode::StaticSample {
                    reason: FallbackReason::ConfigError,
                };
                (DataSource::new(mode, 0, ""), UiConfig::default())
            }
        }
    }

    async fn execute_tui(&self) -> Result<()> {
        let (source, ui) = self.source_or_sample().await;
        self.run_tui(Arc::new(source), &ui).await
    }

    async fn execute_demo(&self) -> Result<()> {
        let ui = self.load_config().unwrap_or_default().ui;
        self.run_tui(Arc::new(DataSource::demo()), &ui).await
    }

    async fn run_tui(&self, source: Arc<DataSource>, ui: &UiConfig) -> Result<()> {
        let refresh_interval = ui.refresh_interval();
        let options = TuiOptions {
            refresh_interval,
            header: Header {
                source: source.describe(),
                refresh_secs: refresh_interval.as_secs(),
            },
        };

        match tui::run(Arc::clone(&source), options).await? {
            Exit::Quit => Ok(()),
            Exit::Follow(job_id) => {
                info!("Leaving the TUI to follow job {job_id}");
                self.stream_logs(&source, job_id, ui.follow_interval()).await
            }
        }
    }

    async fn execute_pipelines(&self) -> Result<()> {
        let (source, _) = self.source_or_sample().await;
        info!("Listing pipelines of {}", source.describe());

        let spinner = Spinner::start("Fetching pipelines...");
        let pipelines = source.pipelines().await;
        spinner.clear();

        output::print_pipelines(&pipelines);
        Ok(())
    }

    async fn execute_job(&self, job_id: u64) -> Result<()> {
        let session = self.session(self.load_config()?).await;
        let source = session.into_source();

        let spinner = Spinner::start(format!("Fetching job {job_id}..."));
        match source.job_details(job_id).await {
            Ok(job) => {
                spinner.clear();
                output::print_job(&job);
                Ok(())
            }
            Err(err) => {
                spinner.fail(format!("Job {job_id}"));
                if err.is_not_found() {
                    let project = source.project().unwrap_or("this project");
                    bail!("Job {job_id} not found in {project}");
                }
                Err(err).with_context(|| format!("Failed to fetch job {job_id}"))
            }
        }
    }

    async fn execute_logs(&self, job_id: u64, follow: bool) -> Result<()> {
        let session = self.session(self.load_config()?).await;
        let follow_interval = session.config.ui.follow_interval();
        let source = session.into_source();

        if follow {
            return self.stream_logs(&source, job_id, follow_interval).await;
        }

        let trace = source
            .job_trace(job_id)
            .await
            .with_context(|| format!("Failed to fetch logs for job {job_id}"))?;
        eprintln!("{}", provenance_line(&trace.provenance));
        print!("{}", trace.value);
        Ok(())
    }

    async fn stream_logs(
        &self,
        source: &DataSource,
        job_id: u64,
        interval: std::time::Duration,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        match follow_job(source, job_id, interval, &mut stdout)
            .await
            .with_context(|| format!("Failed to stream logs for job {job_id}"))?
        {
            FollowOutcome::Completed(status) => info!("Job {job_id} finished: {status}"),
            FollowOutcome::Interrupted => info!("Stopped following job {job_id}"),
        }
        Ok(())
    }

    async fn execute_test(&self) -> Result<()> {
        let session = self.session(self.load_config()?).await;

        let glab_ok = match &session.project {
            Some(project) if session.config.gitlab.use_glab => {
                let glab = GlabCli::new(session.config.gitlab.glab_binary.as_str());
                check_glab(&glab, project, session.config.ui.pipeline_limit()).await
            }
            Some(_) => {
                println!("{}", dim("glab: disabled in configuration"));
                false
            }
            None => {
                println!("{}", bright_red("glab: no project detected (use --repo)"));
                false
            }
        };

        let api_ok = match session.api_client() {
            Ok(client) => check_api(&client).await,
            Err(reason) => {
                println!("{}", bright_red(format!("API: {reason}")));
                false
            }
        };

        if !glab_ok && !api_ok {
            bail!("Neither glab nor the GitLab API could be reached");
        }
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match self.command.clone().unwrap_or(Commands::Tui) {
            Commands::Tui => self.execute_tui().await,
            Commands::Demo => self.execute_demo().await,
            Commands::Pipelines => self.execute_pipelines().await,
            Commands::Job { id } => self.execute_job(id).await,
            Commands::Logs { id, follow } => self.execute_logs(id, follow).await,
            Commands::Test => self.execute_test().await,
            Commands::Version => {
                println!("glab-tui {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

impl Session {
    /// A REST client when a token resolved, otherwise the reason there is none.
    fn api_client(&self) -> std::result::Result<GitLabClient, FallbackReason> {
        let Some(resolved) = &self.token else {
            return Err(FallbackReason::NoToken);
        };
        GitLabClient::new(&self.base_url, Some(resolved.token.clone())).map_err(|err| {
            warn!("Could not create GitLab client for {}: {err}", self.base_url);
            FallbackReason::ClientError
        })
    }

    fn into_source(self) -> DataSource {
        let api = match self.api_client() {
            Ok(client) => ApiTier::ready(Arc::new(client)),
            Err(reason) => ApiTier::Missing(reason),
        };
        let mode = source_mode(
            self.project,
            self.config.gitlab.use_glab,
            &self.config.gitlab.glab_binary,
            api,
        );
        DataSource::new(mode, self.config.ui.pipeline_limit(), self.base_url)
    }
}

/// Picks the data-fetching strategy once per session.
fn source_mode(
    project: Option<String>,
    use_glab: bool,
    glab_binary: &str,
    api: ApiTier,
) -> SourceMode {
    match project {
        None => SourceMode::StaticSample {
            reason: FallbackReason::NoProjectContext,
        },
        Some(project) if use_glab => SourceMode::LocalTool {
            project,
            tool: Arc::new(GlabCli::new(glab_binary)),
            api,
        },
        Some(project) => SourceMode::RemoteApi { project, api },
    }
}

async fn check_glab(glab: &dyn CiTool, project: &str, limit: usize) -> bool {
    let spinner = Spinner::start(format!("glab: listing pipelines of {project}"));
    match glab.list_pipelines(project, limit).await {
        Ok(output) => {
            let listing = parse_listing(&output);
            spinner.finish(format!("glab: {} pipelines", listing.pipelines.len()));
            true
        }
        Err(err) => {
            spinner.fail(format!("glab: {err}"));
            false
        }
    }
}

async fn check_api(client: &GitLabClient) -> bool {
    let spinner = Spinner::start(format!("API: {}", client.web_base()));
    match CiApi::current_user(client).await {
        Ok(username) => {
            spinner.finish(format!("API: authenticated as {}", bright_green(username)));
            true
        }
        Err(err) => {
            spinner.fail(format!("API: {err}"));
            false
        }
    }
}
