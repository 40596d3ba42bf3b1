//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults (development profile)
//! 2. Global config: `$XDG_CONFIG_HOME/bomviz/bomviz.toml`
//! 3. Local config: `<project_dir>/.bomviz.toml`
//! 4. Environment variables: `BOMVIZ_*` prefix (`__` for nesting)
//! 5. Command line flags (`--profile`, `--base-url`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Default base URL of the development BOM API.
pub const DEV_BASE_URL: &str = "http://127.0.0.1:8000";

/// Deployment profile; selects the canvas preset and default base URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Local development server, large canvas
    #[default]
    Development,
    /// Served alongside the hosting page, compact canvas
    Production,
}

impl Profile {
    pub fn canvas(self) -> CanvasConfig {
        match self {
            Profile::Development => CanvasConfig {
                width: 1500.0,
                height: 800.0,
                margin_left: 200.0,
                margin_right: 200.0,
            },
            Profile::Production => CanvasConfig {
                width: 960.0,
                height: 600.0,
                margin_left: 40.0,
                margin_right: 120.0,
            },
        }
    }

    /// Production has no fixed origin; it must be configured.
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Profile::Development => Some(DEV_BASE_URL),
            Profile::Production => None,
        }
    }

    fn parse(value: &str) -> Result<Self, ApplicationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            other => Err(ApplicationError::Config {
                message: format!("unknown profile '{other}'"),
            }),
        }
    }
}

/// Canvas geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    /// Offset of the tree root from the left edge
    pub margin_left: f64,
    /// Room kept free right of the deepest level for labels
    pub margin_right: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Profile::default().canvas()
    }
}

impl CanvasConfig {
    /// Horizontal extent available to tree depth.
    pub fn layout_width(&self) -> f64 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        let all = [self.width, self.height, self.margin_left, self.margin_right];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ApplicationError::Config {
                message: format!("canvas values must be finite and non-negative: {:?}", self),
            });
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ApplicationError::Config {
                message: "canvas width and height must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Raw canvas settings for intermediate parsing (None → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCanvasConfig {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub margin_left: Option<f64>,
    pub margin_right: Option<f64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub profile: Option<Profile>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub output: Option<PathBuf>,
    pub canvas: RawCanvasConfig,
}

impl CanvasConfig {
    /// Overlay specified fields onto self.
    pub fn merge(&self, overlay: &RawCanvasConfig) -> Self {
        Self {
            width: overlay.width.unwrap_or(self.width),
            height: overlay.height.unwrap_or(self.height),
            margin_left: overlay.margin_left.unwrap_or(self.margin_left),
            margin_right: overlay.margin_right.unwrap_or(self.margin_right),
        }
    }
}

/// Unified configuration for bomviz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Deployment profile
    pub profile: Profile,
    /// BOM API base URL; falls back to the profile default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds, 0 waits indefinitely
    pub request_timeout_secs: u64,
    /// Default SVG output file
    pub output: PathBuf,
    /// Canvas geometry
    pub canvas: CanvasConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            base_url: None,
            request_timeout_secs: 30,
            output: PathBuf::from("bom_tree.svg"),
            canvas: Profile::default().canvas(),
        }
    }
}

/// Get the XDG config directory for bomviz.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bomviz").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bomviz.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".bomviz.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Effective base URL: explicit setting, else the profile default.
    pub fn base_url(&self) -> Result<&str, ApplicationError> {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.profile.default_base_url())
            .ok_or_else(|| ApplicationError::Config {
                message: format!(
                    "base_url must be set for the {:?} profile (BOMVIZ_BASE_URL or --base-url)",
                    self.profile
                ),
            })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Overlay a config file layer.
    ///
    /// A profile in the overlay resets the canvas to that profile's preset
    /// before the overlay's own canvas fields apply.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let profile = overlay.profile.unwrap_or(self.profile);
        let canvas_base = match overlay.profile {
            Some(p) => p.canvas(),
            None => self.canvas,
        };
        Self {
            profile,
            base_url: overlay.base_url.clone().or_else(|| self.base_url.clone()),
            request_timeout_secs: overlay
                .request_timeout_secs
                .unwrap_or(self.request_timeout_secs),
            output: overlay.output.clone().unwrap_or_else(|| self.output.clone()),
            canvas: canvas_base.merge(&overlay.canvas),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.bomviz.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        let env = Config::builder()
            .add_source(
                Environment::with_prefix("BOMVIZ")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;
        current = current.apply_overrides(&env)?;

        current.finish()
    }

    /// Load only the given config file on top of defaults (no global, no env).
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        Self::default().merge_with(&raw).finish()
    }

    /// Apply explicit overrides from a built `Config` (env vars in `load`).
    ///
    /// Values replace, profile first so that explicit canvas keys win over
    /// the preset it selects.
    pub fn apply_overrides(mut self, config: &Config) -> Result<Self, ApplicationError> {
        if let Some(val) = lookup::<String>(config, "profile")? {
            self.profile = Profile::parse(&val)?;
            self.canvas = self.profile.canvas();
        }
        if let Some(val) = lookup::<String>(config, "base_url")? {
            self.base_url = Some(val);
        }
        if let Some(val) = lookup::<u64>(config, "request_timeout_secs")? {
            self.request_timeout_secs = val;
        }
        if let Some(val) = lookup::<String>(config, "output")? {
            self.output = PathBuf::from(val);
        }
        if let Some(val) = lookup::<f64>(config, "canvas.width")? {
            self.canvas.width = val;
        }
        if let Some(val) = lookup::<f64>(config, "canvas.height")? {
            self.canvas.height = val;
        }
        if let Some(val) = lookup::<f64>(config, "canvas.margin_left")? {
            self.canvas.margin_left = val;
        }
        if let Some(val) = lookup::<f64>(config, "canvas.margin_right")? {
            self.canvas.margin_right = val;
        }
        Ok(self)
    }

    /// Command line overrides: a profile flag resets the canvas to its preset.
    pub fn with_cli_overrides(mut self, profile: Option<Profile>, base_url: Option<String>) -> Self {
        if let Some(profile) = profile {
            self.profile = profile;
            self.canvas = profile.canvas();
        }
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    fn finish(mut self) -> Result<Self, ApplicationError> {
        self.output = PathBuf::from(expand_env_vars(&self.output.to_string_lossy()));
        self.canvas.validate()?;
        Ok(self)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bomviz configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bomviz/bomviz.toml
#   Local:  <project_dir>/.bomviz.toml
#   Env:    BOMVIZ_* environment variables (BOMVIZ_CANVAS__WIDTH for nested keys)
#   Flags:  --profile, --base-url

# Deployment profile: "development" (1500x800, local API) or "production" (960x600)
# A profile resets the canvas to its preset; canvas keys below refine it.
# profile = "development"

# BOM API base URL (required for the production profile)
# base_url = "http://127.0.0.1:8000"

# Per-request timeout in seconds, 0 waits indefinitely
# request_timeout_secs = 30

# Default SVG output file
# output = "bom_tree.svg"

[canvas]
# width = 1500
# height = 800
# margin_left = 200
# margin_right = 200
"#
        .to_string()
    }
}

/// Absent keys are `None`; present but unconvertible values are errors.
fn lookup<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("{key}: {e}"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
