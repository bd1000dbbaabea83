// logmux - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for logmux configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logmux/ or %APPDATA%\logmux\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[sources]` section.
    pub sources: SourcesSection,
    /// `[tail]` section.
    pub tail: TailSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[sources]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    /// Directory whose sub-directories are the sources.
    pub root: Option<String>,
    /// Include glob patterns for sub-source files.
    pub include_patterns: Option<Vec<String>>,
    /// Exclude glob patterns.
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    /// Follow-mode re-check interval in ms.
    pub poll_interval_ms: Option<u64>,
    /// Fan-in channel capacity (0 = rendezvous).
    pub channel_capacity: Option<usize>,
    /// Read existing content before following.
    pub from_start: Option<bool>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// "auto", "always" or "never".
    pub color: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// When to colour source identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorMode {
    /// Colour when stdout is a terminal (and NO_COLOR is unset).
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Sources --
    pub source_root: PathBuf,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    // -- Tail --
    pub poll_interval: Duration,
    pub channel_capacity: usize,
    pub from_start: bool,

    // -- Output --
    pub color: ColorMode,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from(constants::DEFAULT_SOURCE_ROOT),
            include_patterns: to_strings(constants::DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: to_strings(constants::DEFAULT_EXCLUDE_PATTERNS),
            poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
            from_start: false,
            color: ColorMode::Auto,
            log_level: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// problems. A missing file yields defaults with no problems (first run). An
/// unreadable or unparseable file yields defaults plus one error.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<ConfigError>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            return (AppConfig::default(), vec![err]);
        }
    };

    match toml::from_str::<RawConfig>(&content) {
        Ok(raw) => {
            tracing::debug!(path = %config_path.display(), "Loaded config.toml");
            validate(raw)
        }
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            (AppConfig::default(), vec![err])
        }
    }
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<ConfigError>) {
    let mut config = AppConfig::default();
    let mut problems: Vec<ConfigError> = Vec::new();

    // -- Sources --
    if let Some(root) = raw.sources.root {
        if root.trim().is_empty() {
            problems.push(out_of_range("sources.root", "\"\"", "a directory path"));
        } else {
            config.source_root = PathBuf::from(root);
        }
    }
    if let Some(patterns) = raw.sources.include_patterns {
        config.include_patterns = patterns;
    }
    if let Some(patterns) = raw.sources.exclude_patterns {
        config.exclude_patterns = patterns;
    }

    // -- Tail: poll_interval_ms --
    if let Some(ms) = raw.tail.poll_interval_ms {
        if (constants::MIN_TAIL_POLL_INTERVAL_MS..=constants::MAX_TAIL_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            config.poll_interval = Duration::from_millis(ms);
        } else {
            problems.push(out_of_range(
                "tail.poll_interval_ms",
                &ms.to_string(),
                &format!(
                    "{}-{} (default {})",
                    constants::MIN_TAIL_POLL_INTERVAL_MS,
                    constants::MAX_TAIL_POLL_INTERVAL_MS,
                    constants::TAIL_POLL_INTERVAL_MS
                ),
            ));
        }
    }

    // -- Tail: channel_capacity --
    if let Some(capacity) = raw.tail.channel_capacity {
        if capacity <= constants::MAX_CHANNEL_CAPACITY {
            config.channel_capacity = capacity;
        } else {
            problems.push(out_of_range(
                "tail.channel_capacity",
                &capacity.to_string(),
                &format!(
                    "0-{} (default {})",
                    constants::MAX_CHANNEL_CAPACITY,
                    constants::DEFAULT_CHANNEL_CAPACITY
                ),
            ));
        }
    }

    if let Some(from_start) = raw.tail.from_start {
        config.from_start = from_start;
    }

    // -- Output: color --
    if let Some(ref color) = raw.output.color {
        match ColorMode::parse(color) {
            Some(mode) => config.color = mode,
            None => problems.push(out_of_range(
                "output.color",
                color,
                "\"auto\", \"always\" or \"never\"",
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            problems.push(out_of_range(
                "logging.level",
                level,
                "error, warn, info, debug or trace",
            ));
        }
    }

    (config, problems)
}

fn out_of_range(field: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}
