//! Configuration management for draftpress using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::{RecoveryReport, StorageLayout};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8081;
/// Default rebuild hook timeout in seconds.
pub const DEFAULT_REBUILD_TIMEOUT_SECS: u64 = 30;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Blog project root holding `admin/`, `static/` and `content/`.
    pub project_root: PathBuf,
    /// Address the HTTP server binds to.
    pub host: String,
    pub port: u16,
    /// Webhook that rebuilds the static site.
    pub rebuild_url: Option<String>,
    pub rebuild_timeout_secs: u64,
    /// Fire the rebuild hook after every successful publish.
    pub rebuild_on_publish: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rebuild_url: None,
            rebuild_timeout_secs: DEFAULT_REBUILD_TIMEOUT_SECS,
            rebuild_on_publish: false,
        }
    }
}

impl Settings {
    /// Create settings with a custom project root.
    pub fn with_project_root(project_root: PathBuf) -> Self {
        Self {
            project_root,
            ..Default::default()
        }
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.project_root)
    }

    pub fn rebuild_timeout(&self) -> Duration {
        Duration::from_secs(self.rebuild_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the directory layout exists and repair interrupted writes.
    pub fn prepare_storage(&self) -> crate::repository::Result<RecoveryReport> {
        let layout = self.layout();
        layout.ensure()?;
        layout.recover()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project root, relative to the config file unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild_on_publish: Option<bool>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers draftpress config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("draftpress").await {
            Ok(pref_config) => {
                let project_root: Option<String> = pref_config.get("project_root").ok();
                let host: Option<String> = pref_config.get("host").ok();
                let port: Option<u16> = pref_config.get("port").ok();
                let rebuild_url: Option<String> = pref_config.get("rebuild_url").ok();
                let rebuild_timeout_secs: Option<u64> =
                    pref_config.get("rebuild_timeout_secs").ok();
                let rebuild_on_publish: Option<bool> =
                    pref_config.get("rebuild_on_publish").ok();

                Config {
                    project_root,
                    host,
                    port,
                    rebuild_url,
                    rebuild_timeout_secs,
                    rebuild_on_publish,
                    source_path: pref_config.source_path().cloned(),
                }
            }
            // No config file found, use defaults
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config: Config = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref root) = self.project_root {
            settings.project_root = self.resolve_path(root, base_dir);
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(ref url) = self.rebuild_url {
            settings.rebuild_url = Some(url.clone());
        }
        if let Some(timeout) = self.rebuild_timeout_secs {
            settings.rebuild_timeout_secs = timeout;
        }
        if let Some(on_publish) = self.rebuild_on_publish {
            settings.rebuild_on_publish = on_publish;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Override project root (--project-root flag).
    pub project_root: Option<PathBuf>,
    /// Override bind host.
    pub host: Option<String>,
    /// Override port.
    pub port: Option<u16>,
    /// Override rebuild hook URL.
    pub rebuild_url: Option<String>,
}

/// Load settings with explicit options.
pub async fn load_settings_with_options(options: LoadOptions) -> Settings {
    let config = match &options.config_path {
        Some(path) => match Config::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd.clone()
    } else {
        config.base_dir().unwrap_or_else(|| cwd.clone())
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    // Flags and environment take precedence over the file
    if let Some(root) = options.project_root {
        settings.project_root = if root.is_absolute() {
            root
        } else {
            cwd.join(root)
        };
    }
    if let Some(host) = options.host {
        settings.host = host;
    }
    if let Some(port) = options.port {
        settings.port = port;
    }
    if let Some(url) = options.rebuild_url {
        settings.rebuild_url = Some(url);
    }

    settings
}
