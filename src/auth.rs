use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_yaml::Value;

pub const GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";
pub const GLAB_TOKEN_ENV: &str = "GLAB_TOKEN";

/// A GitLab access token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Explicit,
    GlabConfig,
    Env(&'static str),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("command line / config file"),
            Self::GlabConfig => f.write_str("glab credentials"),
            Self::Env(name) => write!(f, "${name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedToken {
    pub token: Token,
    pub source: TokenSource,
}

/// Default location of glab's configuration file.
///
/// glab keeps it under `~/.config/glab-cli` on every platform unless
/// `GLAB_CONFIG_DIR` points elsewhere.
pub fn glab_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("GLAB_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("config.yml"));
    }
    dirs::home_dir().map(|home| home.join(".config").join("glab-cli").join("config.yml"))
}

/// Host name of a base URL, e.g. `https://gitlab.com` -> `gitlab.com`.
pub fn host_of(base_url: &str) -> String {
    url::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(ToString::to_string))
        .unwrap_or_else(|| base_url.to_string())
}

/// Resolves a token in priority order: explicit value, glab's stored
/// credential for `host`, `GITLAB_TOKEN`, `GLAB_TOKEN`.
///
/// `env` looks up environment variables so callers and tests decide what the
/// environment is.
pub fn resolve_token(
    explicit: Option<&str>,
    host: &str,
    glab_config: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<ResolvedToken> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(ResolvedToken {
            token: Token::from(token),
            source: TokenSource::Explicit,
        });
    }

    if let Some(token) = glab_config.and_then(|path| read_glab_token(path, host)) {
        return Some(ResolvedToken {
            token,
            source: TokenSource::GlabConfig,
        });
    }

    [GITLAB_TOKEN_ENV, GLAB_TOKEN_ENV].into_iter().find_map(|name| {
        env(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| ResolvedToken {
                token: Token::from(value),
                source: TokenSource::Env(name),
            })
    })
}

/// Reads the token glab stored for `host`.
///
/// glab writes unset-but-encrypted values as `!!null <token>`, which is not
/// valid YAML for a string; the tag is stripped before parsing.
pub fn read_glab_token(path: &Path, host: &str) -> Option<Token> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("No glab config at {}: {e}", path.display());
            return None;
        }
    };

    let cleaned = text.replace("!!null ", "");
    let config: Value = match serde_yaml::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not parse glab config {}: {e}", path.display());
            return None;
        }
    };

    let token = config
        .get("hosts")?
        .get(host)?
        .get("token")?
        .as_str()?
        .trim();

    (!token.is_empty()).then(|| Token::from(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn glab_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const GLAB_CONFIG: &str = "git_protocol: ssh\n\
        hosts:\n    \
            gitlab.com:\n        \
                token: !!null glpat-from-glab\n        \
                api_host: gitlab.com\n    \
            gitlab.example.com:\n        \
                token: glpat-self-hosted\n";

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::from("glpat-secret");
        assert_eq!(format!("{token:?}"), "Token(***)");
        assert_eq!(token.as_str(), "glpat-secret");
    }

    #[test]
    fn test_reads_null_tagged_glab_token() {
        let file = glab_config(GLAB_CONFIG);
        let token = read_glab_token(file.path(), "gitlab.com").unwrap();
        assert_eq!(token.as_str(), "glpat-from-glab");

        let token = read_glab_token(file.path(), "gitlab.example.com").unwrap();
        assert_eq!(token.as_str(), "glpat-self-hosted");

        assert!(read_glab_token(file.path(), "other.host").is_none());
    }

    #[test]
    fn test_explicit_token_wins() {
        let file = glab_config(GLAB_CONFIG);
        let resolved = resolve_token(
            Some("cli-token"),
            "gitlab.com",
            Some(file.path()),
            env_from(&[(GITLAB_TOKEN_ENV, "env-token")]),
        )
        .unwrap();
        assert_eq!(resolved.token.as_str(), "cli-token");
        assert_eq!(resolved.source, TokenSource::Explicit);
    }

    #[test]
    fn test_glab_credential_before_environment() {
        let file = glab_config(GLAB_CONFIG);
        let resolved = resolve_token(
            None,
            "gitlab.com",
            Some(file.path()),
            env_from(&[(GITLAB_TOKEN_ENV, "env-token")]),
        )
        .unwrap();
        assert_eq!(resolved.source, TokenSource::GlabConfig);
    }

    #[test]
    fn test_environment_fallback_order() {
        let resolved = resolve_token(
            None,
            "gitlab.com",
            None,
            env_from(&[(GITLAB_TOKEN_ENV, "primary"), (GLAB_TOKEN_ENV, "alias")]),
        )
        .unwrap();
        assert_eq!(resolved.token.as_str(), "primary");

        let resolved = resolve_token(
            Some("  "),
            "gitlab.com",
            None,
            env_from(&[(GITLAB_TOKEN_ENV, ""), (GLAB_TOKEN_ENV, "alias")]),
        )
        .unwrap();
        assert_eq!(resolved.token.as_str(), "alias");
        assert_eq!(resolved.source, TokenSource::Env(GLAB_TOKEN_ENV));
    }

    #[test]
    fn test_nothing_resolves_to_none() {
        let missing = Path::new("/nonexistent/glab-cli/config.yml");
        assert!(resolve_token(None, "gitlab.com", Some(missing), env_from(&[])).is_none());
    }

    #[test]
    fn test_malformed_glab_config_is_ignored() {
        let file = glab_config("hosts: [unterminated");
        assert!(read_glab_token(file.path(), "gitlab.com").is_none());
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://gitlab.com"), "gitlab.com");
        assert_eq!(host_of("https://gitlab.example.com:8443/sub"), "gitlab.example.com");
        assert_eq!(host_of("gitlab.local"), "gitlab.local");
    }
}
