use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

static RE_DEV_AZURE_ORG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://dev\.azure\.com/([^/]+)").unwrap());
static RE_FIRST_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^/]+/([^/]+)").unwrap());

const CONFIG_DIR_NAME: &str = "azure-devops-mcp";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    Pat,
    #[default]
    AzureIdentity,
    AzureCli,
}

impl FromStr for AuthMethod {
    type Err = std::convert::Infallible;

    /// Unknown methods resolve to the Azure identity credential chain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "pat" => AuthMethod::Pat,
            "azure-cli" => AuthMethod::AzureCli,
            "azure-identity" | "" => AuthMethod::AzureIdentity,
            other => {
                log::warn!(
                    "Unknown auth method '{}', falling back to azure-identity",
                    other
                );
                AuthMethod::AzureIdentity
            }
        })
    }
}

/// Partial settings as found in a TOML file or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub org_url: Option<String>,
    pub auth_method: Option<String>,
    pub pat: Option<String>,
    pub username: Option<String>,
    pub default_project: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config_dir>/azure-devops-mcp/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Field-wise merge; values in `self` win over `fallback`.
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            org_url: non_empty(self.org_url).or(non_empty(fallback.org_url)),
            auth_method: non_empty(self.auth_method).or(non_empty(fallback.auth_method)),
            pat: non_empty(self.pat).or(non_empty(fallback.pat)),
            username: non_empty(self.username).or(non_empty(fallback.username)),
            default_project: non_empty(self.default_project)
                .or(non_empty(fallback.default_project)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub org_url: String,
    pub auth_method: AuthMethod,
    pub pat: Option<String>,
    pub username: Option<String>,
    pub default_project: Option<String>,
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let org_url = non_empty(settings.org_url).ok_or(ConfigError::Missing("org_url"))?;
        if !org_url.starts_with("http://") && !org_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "org_url",
                reason: format!("'{}' is not an http(s) URL", org_url),
            });
        }

        let auth_method = non_empty(settings.auth_method)
            .map(|m| m.parse().unwrap_or_default())
            .unwrap_or_default();

        Ok(Config {
            org_url: org_url.trim_end_matches('/').to_string(),
            auth_method,
            pat: non_empty(settings.pat),
            username: non_empty(settings.username),
            default_project: non_empty(settings.default_project),
        })
    }
}

impl Config {
    pub fn org_name(&self) -> String {
        org_name_from_url(Some(&self.org_url))
    }

    /// Picks the project a tool call operates on.
    pub fn resolve_project(&self, project: Option<&str>) -> Result<String, ConfigError> {
        project
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_project.clone())
            .ok_or(ConfigError::Missing(
                "projectName (no default project configured)",
            ))
    }
}

pub fn org_name_from_url(url: Option<&str>) -> String {
    let Some(url) = url else {
        return "unknown-organization".to_string();
    };
    if let Some(caps) = RE_DEV_AZURE_ORG.captures(url) {
        return caps[1].to_string();
    }
    RE_FIRST_SEGMENT
        .captures(url)
        .map(|caps| caps[1].replace("%20", " "))
        .unwrap_or_else(|| "unknown-organization".to_string())
}
