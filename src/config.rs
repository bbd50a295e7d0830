use crate::domain::version::Version;
use crate::error::{GitPromoteError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "gitpromote.toml";
const USER_CONFIG_FILE: &str = ".gitpromote.toml";
const WORK_DIR: &str = ".git-promote";

/// Represents the complete configuration for git-promote.
///
/// Names the application being promoted and the downstream repository it is
/// promoted into.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Identity of the promoted application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ApplicationConfig {
    /// Namespace prefix of this application's tags in the downstream repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version being promoted, e.g. "1.4.0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_remote_name() -> String {
    "origin".to_string()
}

fn default_trunk_branch() -> String {
    "master".to_string()
}

fn is_default_dist(value: &str) -> bool {
    value == default_dist()
}

fn is_default_remote_name(value: &str) -> bool {
    value == default_remote_name()
}

fn is_default_trunk_branch(value: &str) -> bool {
    value == default_trunk_branch()
}

/// Where and how artifacts are promoted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeployConfig {
    /// URL of the downstream repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// Build output directory copied into the downstream repository
    #[serde(default = "default_dist", skip_serializing_if = "is_default_dist")]
    pub dist: String,

    /// Subdirectory of the downstream checkout receiving the artifact
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    #[serde(
        default = "default_remote_name",
        skip_serializing_if = "is_default_remote_name"
    )]
    pub remote_name: String,

    /// Branch new destination branches are created from
    #[serde(
        default = "default_trunk_branch",
        skip_serializing_if = "is_default_trunk_branch"
    )]
    pub trunk_branch: String,

    /// Directory holding downstream checkouts, `~/.git-promote` by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            remote: None,
            dist: default_dist(),
            target: String::new(),
            remote_name: default_remote_name(),
            trunk_branch: default_trunk_branch(),
            work_dir: None,
        }
    }
}

impl Config {
    /// Application name, required for any tagging
    pub fn application_name(&self) -> Result<&str> {
        match self.application.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                if name.contains('/') {
                    Err(GitPromoteError::config(format!(
                        "application name '{}' must not contain '/'",
                        name
                    )))
                } else {
                    Ok(name)
                }
            }
            _ => Err(GitPromoteError::config(
                "application.name is not set, run `git-promote init`",
            )),
        }
    }

    /// Version being promoted
    pub fn candidate_version(&self) -> Result<Version> {
        let raw = self.application.version.as_deref().ok_or_else(|| {
            GitPromoteError::config("application.version is not set, run `git-promote init`")
        })?;
        Version::parse(raw)
    }

    /// URL of the downstream repository
    pub fn remote(&self) -> Result<&str> {
        match self.deploy.remote.as_deref().map(str::trim) {
            Some(remote) if !remote.is_empty() => Ok(remote),
            _ => Err(GitPromoteError::config(
                "deploy.remote is not set, run `git-promote init`",
            )),
        }
    }

    /// Directory holding downstream checkouts
    pub fn work_dir(&self) -> Result<PathBuf> {
        match &self.deploy.work_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(WORK_DIR))
                .ok_or_else(|| GitPromoteError::config("cannot determine home directory")),
        }
    }

    /// Local checkout of the downstream repository
    pub fn checkout_dir(&self) -> Result<PathBuf> {
        Ok(self.work_dir()?.join(repository_basename(self.remote()?)))
    }
}

/// Last path segment of a repository URL without `.git`
/// (`git@host:team/site.git` -> `site`).
pub fn repository_basename(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        "repo".to_string()
    } else {
        name.to_string()
    }
}

/// Locates the configuration file, if there is one.
///
/// Looks in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitpromote.toml` in current directory
/// 3. `.gitpromote.toml` in user config directory
pub fn find_config_file(config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(PathBuf::from(path));
    }
    if Path::new(CONFIG_FILE).exists() {
        return Some(PathBuf::from(CONFIG_FILE));
    }
    dirs::config_dir()
        .map(|config_dir| config_dir.join(USER_CONFIG_FILE))
        .filter(|user_path| user_path.exists())
}

/// Loads configuration from file or returns defaults.
///
/// The file is found by [find_config_file]; with no file the default
/// configuration is returned.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = match find_config_file(config_path) {
        Some(path) => path,
        None => return Ok(Config::default()),
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        GitPromoteError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&config_str)
        .map_err(|e| GitPromoteError::config(format!("cannot parse {}: {}", path.display(), e)))
}

/// Writes configuration as TOML, leaving out fields that hold their defaults.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| GitPromoteError::config(format!("cannot serialize config: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}
