use serde::{de::Visitor, Deserialize};
use std::{
    fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("couldn't parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_base: Url,
    pub token: Option<String>,
    pub repo_path: Option<RepoPath>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_base: Url::parse("https://api.github.com").expect("static url"),
            token: None,
            repo_path: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub api_secret: Option<String>,
    pub provider: ProviderConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8888)),
            api_secret: None,
            provider: ProviderConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub gateway_url: Url,
    pub tags_url: Url,
    pub state_dir: Option<PathBuf>,
    pub auth_ttl_hours: u32,
    /// Keep the authoring time of a reloaded draft instead of resetting it to now.
    pub restore_timestamp: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            gateway_url: Url::parse("http://127.0.0.1:8888/api/submit").expect("static url"),
            tags_url: Url::parse("http://staffordwilliams.com/tags.json").expect("static url"),
            state_dir: None,
            auth_ttl_hours: 24,
            restore_timestamp: false,
        }
    }
}

impl ClientConfig {
    pub fn state_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("notepost"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Reads the TOML file if one was given, then applies the environment
    /// overrides that carry the secrets.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            None => Config::default(),
        };

        config.apply_env(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// An empty or malformed `REPO_PATH` leaves the repository unset, which
    /// only the publish path treats as fatal.
    pub fn apply_env(&mut self, lookup: impl Fn(&'static str) -> Option<String>) {
        if let Some(token) = lookup("GITHUB_PAT") {
            self.gateway.provider.token = Some(token);
        }

        if let Some(secret) = lookup("API_SECRET") {
            self.gateway.api_secret = Some(secret);
        }

        if let Some(repo_path) = lookup("REPO_PATH") {
            self.gateway.provider.repo_path = if repo_path.trim().is_empty() {
                None
            } else {
                match repo_path.parse() {
                    Ok(repo_path) => Some(repo_path),
                    Err(message) => {
                        tracing::error!(%message, "ignoring invalid REPO_PATH");
                        None
                    }
                }
            };
        }
    }
}

/// Where published files go: `owner/repo` followed by any number of
/// directory segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPath {
    pub owner: String,
    pub repo: String,
    pub dir: Vec<String>,
}

impl std::str::FromStr for RepoPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.trim().trim_matches('/').split('/');

        let owner = segments.next().filter(|s| !s.is_empty());
        let repo = segments.next().filter(|s| !s.is_empty());
        let (Some(owner), Some(repo)) = (owner, repo) else {
            return Err(format!("expected owner/repo[/path], got {:?}", s));
        };

        let dir: Vec<String> = segments.map(String::from).collect();
        if dir.iter().any(String::is_empty) {
            return Err(format!("empty path segment in {:?}", s));
        }

        Ok(RepoPath {
            owner: owner.to_string(),
            repo: repo.to_string(),
            dir,
        })
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        for segment in &self.dir {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for RepoPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RepoPathVisitor;
        impl Visitor<'_> for RepoPathVisitor {
            type Value = RepoPath;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a repository path like owner/repo/dir")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(RepoPathVisitor)
    }
}
