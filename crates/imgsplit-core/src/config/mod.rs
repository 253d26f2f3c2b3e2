//! Run configuration loaded from a directory of one-value-per-file settings.
//!
//! Every setting has a built-in default. A missing file silently selects the
//! default; a malformed one selects it too and records a [`ConfigError`]
//! warning on the returned [`ConfigHandle`]. Loading never writes to disk.

mod defaults;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{OutputFormat, SplitPlan};

pub use defaults::{write_default_config, InitAction, DEFAULT_EXTENSIONS, DEFAULT_FILES};

pub const EXTENSIONS_FILE: &str = "extensions.txt";
pub const OUTPUT_FORMAT_FILE: &str = "output_format.txt";
pub const RECURSIVE_FILE: &str = "recursive.txt";
pub const DOWNLOAD_LOCATION_FILE: &str = "download_location.txt";
pub const OUTPUT_LOCATION_FILE: &str = "output_location.txt";
pub const GRID_FILE: &str = "grid.txt";

/// Environment variable naming a config directory.
pub const CONFIG_DIR_ENV: &str = "IMGSPLIT_CONFIG_DIR";

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where remote inputs are downloaded to
    pub download_location: PathBuf,
    /// Lowercase extensions (no dot) eligible for splitting
    pub allowed_extensions: BTreeSet<String>,
    pub output_format: OutputFormat,
    /// Output directory used when none is given on the command line
    pub output_location: PathBuf,
    /// Whether directory inputs include nested subdirectories
    pub recursive: bool,
    pub grid: SplitPlan,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_location: defaults::default_download_location(),
            allowed_extensions: defaults::default_extensions(),
            output_format: OutputFormat::Preserve,
            output_location: defaults::default_output_location(),
            recursive: false,
            grid: SplitPlan::default(),
        }
    }
}

impl Config {
    /// Whether `path` carries one of the allowed extensions (case-insensitive).
    pub fn allows(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.allowed_extensions.contains(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

/// Loaded configuration together with where it came from and what went wrong.
#[derive(Debug)]
pub struct ConfigHandle {
    pub config: Config,
    pub source: Option<PathBuf>,
    pub warnings: Vec<ConfigError>,
}

/// Load configuration, optionally forcing a specific directory.
pub fn load_config(custom_dir: Option<&Path>) -> ConfigHandle {
    for candidate in config_candidates(custom_dir) {
        if candidate.is_dir() {
            let (config, warnings) = load_from_dir(&candidate);
            let source = fs::canonicalize(&candidate).unwrap_or(candidate);
            return ConfigHandle {
                config,
                source: Some(source),
                warnings,
            };
        }
    }

    ConfigHandle {
        config: Config::default(),
        source: None,
        warnings: vec![ConfigError::NoConfigDir],
    }
}

/// Directories searched for settings, most specific first.
pub fn config_candidates(custom_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = custom_dir {
        candidates.push(dir.to_path_buf());
    }

    if let Some(env_dir) = std::env::var_os(CONFIG_DIR_ENV) {
        candidates.push(PathBuf::from(env_dir));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config"));
    }

    if let Some(dir) = default_config_dir() {
        candidates.push(dir);
    }

    candidates
}

/// Per-user config directory, e.g. `~/.config/imgsplit` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("imgsplit"))
}

/// Read every setting file in `dir`, falling back per setting.
pub fn load_from_dir(dir: &Path) -> (Config, Vec<ConfigError>) {
    let mut config = Config::default();
    let mut warnings = Vec::new();

    if let Some(value) = read_setting(dir, EXTENSIONS_FILE, &mut warnings) {
        match parse_extensions(&value, &mut warnings) {
            Ok(exts) => config.allowed_extensions = exts,
            Err(err) => warnings.push(err),
        }
    }

    if let Some(value) = read_setting(dir, OUTPUT_FORMAT_FILE, &mut warnings) {
        match parse_output_format(&value) {
            Ok(format) => config.output_format = format,
            Err(err) => warnings.push(err),
        }
    }

    if let Some(value) = read_setting(dir, RECURSIVE_FILE, &mut warnings) {
        match parse_recursive(&value) {
            Ok(recursive) => config.recursive = recursive,
            Err(err) => warnings.push(err),
        }
    }

    if let Some(value) = read_setting(dir, DOWNLOAD_LOCATION_FILE, &mut warnings) {
        match parse_location(DOWNLOAD_LOCATION_FILE, &value) {
            Ok(Some(path)) => config.download_location = path,
            Ok(None) => {}
            Err(err) => warnings.push(err),
        }
    }

    if let Some(value) = read_setting(dir, OUTPUT_LOCATION_FILE, &mut warnings) {
        match parse_location(OUTPUT_LOCATION_FILE, &value) {
            Ok(Some(path)) => config.output_location = path,
            Ok(None) => {}
            Err(err) => warnings.push(err),
        }
    }

    if let Some(value) = read_setting(dir, GRID_FILE, &mut warnings) {
        match parse_grid(&value) {
            Ok(plan) => config.grid = plan,
            Err(err) => warnings.push(err),
        }
    }

    (config, warnings)
}

/// Contents of a setting file, or `None` when it is absent or unreadable.
fn read_setting(dir: &Path, name: &str, warnings: &mut Vec<ConfigError>) -> Option<String> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(contents) => Some(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            warnings.push(ConfigError::Read { path, source });
            None
        }
    }
}

fn first_token(contents: &str) -> Option<&str> {
    contents.split_whitespace().next()
}

fn is_extension_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Parse a newline-, comma- or whitespace-separated extension list.
///
/// Malformed tokens are dropped with a warning each; the list only falls back
/// when no valid extension is left.
pub fn parse_extensions(
    contents: &str,
    warnings: &mut Vec<ConfigError>,
) -> Result<BTreeSet<String>, ConfigError> {
    let mut extensions = BTreeSet::new();
    for raw in contents.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = raw.trim().trim_start_matches('.');
        if token.is_empty() {
            continue;
        }
        if !is_extension_token(token) {
            warnings.push(ConfigError::InvalidExtension {
                setting: EXTENSIONS_FILE,
                value: raw.trim().to_string(),
            });
            continue;
        }
        extensions.insert(token.to_ascii_lowercase());
    }

    if extensions.is_empty() {
        return Err(ConfigError::Empty {
            setting: EXTENSIONS_FILE,
        });
    }
    Ok(extensions)
}

/// Parse `default` or a single extension.
pub fn parse_output_format(contents: &str) -> Result<OutputFormat, ConfigError> {
    let token = first_token(contents).ok_or(ConfigError::Empty {
        setting: OUTPUT_FORMAT_FILE,
    })?;
    match OutputFormat::parse(token) {
        Some(OutputFormat::Override(ext)) if !is_extension_token(&ext) => {
            Err(ConfigError::InvalidExtension {
                setting: OUTPUT_FORMAT_FILE,
                value: token.to_string(),
            })
        }
        Some(format) => Ok(format),
        None => Err(ConfigError::InvalidExtension {
            setting: OUTPUT_FORMAT_FILE,
            value: token.to_string(),
        }),
    }
}

/// Parse `true`, `false`, `yes` or `no`, case-insensitively.
pub fn parse_recursive(contents: &str) -> Result<bool, ConfigError> {
    let value = contents.trim();
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            setting: RECURSIVE_FILE,
            value: value.to_string(),
        }),
    }
}

/// Parse a path setting. `default` yields `None` (keep the built-in value).
pub fn parse_location(
    setting: &'static str,
    contents: &str,
) -> Result<Option<PathBuf>, ConfigError> {
    let line = contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(ConfigError::Empty { setting })?;
    if line.eq_ignore_ascii_case(OutputFormat::DEFAULT_SENTINEL) {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(line)))
    }
}

/// Parse a grid such as `2x2`.
pub fn parse_grid(contents: &str) -> Result<SplitPlan, ConfigError> {
    let value = contents.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty { setting: GRID_FILE });
    }
    SplitPlan::parse(value).ok_or_else(|| ConfigError::InvalidGrid {
        setting: GRID_FILE,
        value: value.to_string(),
    })
}
