//! Configuration management for docket.
//!
//! Credentials and defaults are resolved from the environment first and from
//! a `docket.toml` file second. The file is taken from `--config`, the
//! `DOCKET_CONFIG` variable, or discovered in the current directory and its
//! parents.
//!
//! ## Environment Variable Expansion
//!
//! Credential strings in the file support `${VAR}` and `${VAR:-default}`:
//!
//! - `jira.base_url`, `jira.username`, `jira.password`
//! - `confluence.base_url`, `confluence.username`, `confluence.password`

mod expand;
mod resolve;
mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

pub use resolve::{
    merge_lists, parse_assignments, parse_bool, process_env, resolve_bool, resolve_parsed,
    resolve_string, split_list,
};
pub use settings::{DEFAULT_TIMEOUT_SECS, Service, ServiceSettings};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docket.toml";

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "DOCKET_CONFIG";

/// Contents of `docket.toml`. Every section and field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[jira]` connection values.
    pub jira: ServiceConfig,
    /// `[confluence]` connection values and page traversal defaults.
    pub confluence: ConfluenceConfig,
    /// `[defaults]` for the Jira listing and transition commands.
    pub defaults: DefaultsConfig,
    /// `[labeler]` defaults for `confluence label`.
    pub labeler: LabelerConfig,
    /// `[update]` defaults for `jira update`.
    pub update: UpdateConfig,

    /// Path the configuration was loaded from.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Connection values for one service.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Server base URL.
    pub base_url: Option<String>,
    /// Login name.
    pub username: Option<String>,
    /// Password or API token.
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

/// `[confluence]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// Connection values.
    #[serde(flatten)]
    pub service: ServiceConfig,
    /// Treat the page argument as a parent and process its children.
    pub is_parent: Option<bool>,
    /// Maximum number of child pages to fetch.
    pub max_children: Option<usize>,
    /// Macro names extracted by `confluence content`.
    pub macros: Vec<String>,
}

/// `[defaults]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Project key.
    pub project: Option<String>,
    /// Service-desk queue identifier.
    pub queue_id: Option<String>,
    /// Explicit service desk id.
    pub service_desk_id: Option<u64>,
    /// Status names kept by `jira list`.
    #[serde(alias = "list_statuses")]
    pub statuses: Vec<String>,
    /// Precondition status for `jira transition`.
    pub only_status: Option<String>,
    /// Target status for `jira transition`.
    pub target_status: Option<String>,
    /// `[defaults.copy_field]` for `jira copy-field`.
    pub copy_field: CopyFieldConfig,
}

/// `[defaults.copy_field]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CopyFieldConfig {
    /// Only copy on tickets of this issue type.
    pub issue_type: Option<String>,
}

/// `[labeler]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LabelerConfig {
    /// Macro scanned for ticket references.
    #[serde(rename = "macro")]
    pub macro_name: Option<String>,
    /// Labels to add.
    pub add_labels: Vec<String>,
    /// Labels to remove.
    pub remove_labels: Vec<String>,
    /// Only touch tickets of this issue type.
    pub issue_type: Option<String>,
}

/// `[update]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Labels to add.
    pub add_labels: Vec<String>,
    /// Labels to remove.
    pub remove_labels: Vec<String>,
    /// Field values by display name or id.
    pub fields: BTreeMap<String, String>,
    /// New summary.
    pub summary: Option<String>,
    /// Assignee account id.
    pub assignee: Option<String>,
    /// Only touch tickets of this issue type.
    pub issue_type: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`jira.password`").
        field: String,
        /// Error message (e.g., "${`JIRA_TOKEN`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `config_path` (or `DOCKET_CONFIG`) must exist. Without one,
    /// `docket.toml` is searched upwards from the current directory; when
    /// nothing is found an empty configuration is returned.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit path doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| process_env(CONFIG_PATH_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            return Self::load_from_file(&path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No {CONFIG_FILENAME} found, using environment only");
                Ok(Self::default())
            }
        }
    }

    /// Search for `docket.toml` in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in credential strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let jira = &mut self.jira;
        expand::expand_opt(&mut jira.base_url, "jira.base_url")?;
        expand::expand_opt(&mut jira.username, "jira.username")?;
        expand::expand_opt(&mut jira.password, "jira.password")?;

        let confluence = &mut self.confluence.service;
        expand::expand_opt(&mut confluence.base_url, "confluence.base_url")?;
        expand::expand_opt(&mut confluence.username, "confluence.username")?;
        expand::expand_opt(&mut confluence.password, "confluence.password")?;
        Ok(())
    }

    /// Jira settings from `JIRA_*` variables, then `[jira]`.
    ///
    /// `timeout_override` (from the command line) wins over both.
    pub fn jira_settings<E>(&self, env: &E, timeout_override: Option<u64>) -> ServiceSettings
    where
        E: Fn(&str) -> Option<String>,
    {
        resolve_service(Service::Jira, &self.jira, env, timeout_override)
    }

    /// Confluence settings from `CONFLUENCE_*` variables, then `[confluence]`.
    pub fn confluence_settings<E>(&self, env: &E, timeout_override: Option<u64>) -> ServiceSettings
    where
        E: Fn(&str) -> Option<String>,
    {
        resolve_service(
            Service::Confluence,
            &self.confluence.service,
            env,
            timeout_override,
        )
    }
}

fn resolve_service<E>(
    service: Service,
    file: &ServiceConfig,
    env: &E,
    timeout_override: Option<u64>,
) -> ServiceSettings
where
    E: Fn(&str) -> Option<String>,
{
    let prefix = service.env_prefix();
    let var = |suffix: &str| format!("{prefix}_{suffix}");

    let timeout = timeout_override
        .or_else(|| resolve_parsed(env, &var("TIMEOUT"), file.timeout))
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    ServiceSettings {
        service,
        base_url: resolve_string(env, &var("BASE_URL"), file.base_url.as_deref())
            .unwrap_or_default(),
        username: resolve_string(env, &var("USERNAME"), file.username.as_deref())
            .unwrap_or_default(),
        password: resolve_string(env, &var("PASSWORD"), file.password.as_deref())
            .unwrap_or_default(),
        timeout: Duration::from_secs(timeout),
    }
}
