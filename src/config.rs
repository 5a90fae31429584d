use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CANDIDATES: [&str; 4] = [
    "glab-tui.toml",
    "glab-tui.json",
    "glab-tui.yaml",
    "glab-tui.yml",
];
const USER_CANDIDATES: [&str; 2] = ["config.toml", "config.yaml"];

/// Configuration file structure for glab-tui.
///
/// Every key is optional; command-line flags override what is loaded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// GitLab connection settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Terminal UI and streaming settings
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab instance base URL
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,

    /// GitLab personal access token
    pub token: Option<String>,

    /// Project path (e.g. 'group/project'); detected from git when absent
    pub project: Option<String>,

    /// glab executable name or path
    #[serde(default = "default_glab_binary")]
    pub glab_binary: String,

    /// Query the glab CLI before falling back to the REST API
    #[serde(default = "default_true")]
    pub use_glab: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UiConfig {
    /// Pipeline list auto-refresh period
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Poll period of `logs --follow`
    #[serde(default = "default_follow_interval_secs")]
    pub follow_interval_secs: u64,

    /// Number of pipelines requested per listing
    #[serde(default = "default_pipeline_limit")]
    pub pipeline_limit: usize,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_base_url(),
            token: None,
            project: None,
            glab_binary: default_glab_binary(),
            use_glab: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            follow_interval_secs: default_follow_interval_secs(),
            pipeline_limit: default_pipeline_limit(),
        }
    }
}

impl UiConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn follow_interval(&self) -> Duration {
        Duration::from_secs(self.follow_interval_secs.max(1))
    }

    pub fn pipeline_limit(&self) -> usize {
        self.pipeline_limit.max(1)
    }
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_glab_binary() -> String {
    "glab".to_string()
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    3
}

fn default_follow_interval_secs() -> u64 {
    2
}

fn default_pipeline_limit() -> usize {
    20
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./glab-tui.toml, ./glab-tui.json, ./glab-tui.yaml, ./glab-tui.yml
    /// 3. `<config dir>/glab-tui/config.toml`, `<config dir>/glab-tui/config.yaml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        Self::load_first(&Self::candidate_paths())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let local = LOCAL_CANDIDATES.iter().map(PathBuf::from);
        let user = dirs::config_dir()
            .map(|dir| dir.join("glab-tui"))
            .into_iter()
            .flat_map(|dir| USER_CANDIDATES.iter().map(move |name| dir.join(name)));
        local.chain(user).collect()
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|path| path.exists()) {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gitlab.base_url, "https://gitlab.com");
        assert_eq!(config.gitlab.glab_binary, "glab");
        assert!(config.gitlab.use_glab);
        assert_eq!(config.ui.refresh_interval(), Duration::from_secs(3));
        assert_eq!(config.ui.follow_interval(), Duration::from_secs(2));
        assert_eq!(config.ui.pipeline_limit(), 20);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gitlab]
token = "glpat-test-token"
base-url = "https://gitlab.example.com"
project = "group/project"
use-glab = false

[ui]
refresh-interval-secs = 10
"#;
        write!(temp_file, "{toml_content}").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-test-token"));
        assert_eq!(config.gitlab.base_url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.project.as_deref(), Some("group/project"));
        assert!(!config.gitlab.use_glab);
        assert_eq!(config.ui.refresh_interval_secs, 10);
        assert_eq!(config.ui.follow_interval_secs, 2);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "gitlab": {
    "glab-binary": "/opt/glab/bin/glab"
  },
  "ui": {
    "pipeline-limit": 50
  }
}"#;
        write!(temp_file, "{json_content}").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.gitlab.glab_binary, "/opt/glab/bin/glab");
        assert_eq!(config.ui.pipeline_limit(), 50);
        assert_eq!(config.gitlab.base_url, "https://gitlab.com");
    }

    #[test]
    fn test_load_yaml_config_without_extension() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "ui:\n  follow-interval-secs: 5\n").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.ui.follow_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let err = Config::load(Some(Path::new("nonexistent-glab-tui.toml"))).unwrap_err();
        assert!(err.to_string().contains("nonexistent-glab-tui.toml"));
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("glab-tui.toml");
        let yaml = temp_dir.path().join("glab-tui.yaml");
        let toml = temp_dir.path().join("config.toml");
        std::fs::write(&yaml, "gitlab:\n  project: from/yaml\n").unwrap();
        std::fs::write(&toml, "[gitlab]\nproject = \"from/toml\"\n").unwrap();

        let config = Config::load_first(&[missing.clone(), yaml, toml]).unwrap();
        assert_eq!(config.gitlab.project.as_deref(), Some("from/yaml"));

        let config = Config::load_first(&[missing]).unwrap();
        assert!(config.gitlab.project.is_none());
    }

    #[test]
    fn test_zero_intervals_are_raised_to_one_second() {
        let config: Config =
            toml::from_str("[ui]\nrefresh-interval-secs = 0\npipeline-limit = 0\n").unwrap();
        assert_eq!(config.ui.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.ui.pipeline_limit(), 1);
    }
}
