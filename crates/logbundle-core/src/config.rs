use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

const DEFAULT_TARGET_DICTIONARIES_SIZE: u64 = 32 * 1024 * 1024;
const DEFAULT_TARGET_SEGMENT_SIZE: u64 = 256 * 1024 * 1024;
const DEFAULT_TARGET_ENCODED_FILE_SIZE: u64 = 256 * 1024 * 1024;
const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub io: IoConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Where task rows are written. The serialized form is forwarded verbatim to
/// workers inside every task descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Job input/output settings. Serialized once per job into every task
/// descriptor, so field names are part of the worker contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix_to_remove: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub target_archive_size: u64,
    #[serde(default = "default_target_dictionaries_size")]
    pub target_dictionaries_size: u64,
    #[serde(default = "default_target_segment_size")]
    pub target_segment_size: u64,
    #[serde(default = "default_target_encoded_file_size")]
    pub target_encoded_file_size: u64,
}

impl OutputConfig {
    pub fn with_target_archive_size(target_archive_size: u64) -> Self {
        Self {
            tags: None,
            target_archive_size,
            target_dictionaries_size: DEFAULT_TARGET_DICTIONARIES_SIZE,
            target_segment_size: DEFAULT_TARGET_SEGMENT_SIZE,
            target_encoded_file_size: DEFAULT_TARGET_ENCODED_FILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub maintain_file_ordering: bool,
    #[serde(default = "default_true")]
    pub empty_directories_allowed: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            maintain_file_ordering: false,
            empty_directories_allowed: true,
            ignore_patterns: Vec::new(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

fn default_db_path() -> String {
    "logbundle.db".to_string()
}

fn default_target_dictionaries_size() -> u64 {
    DEFAULT_TARGET_DICTIONARIES_SIZE
}

fn default_target_segment_size() -> u64 {
    DEFAULT_TARGET_SEGMENT_SIZE
}

fn default_target_encoded_file_size() -> u64 {
    DEFAULT_TARGET_ENCODED_FILE_SIZE
}

fn default_compression_level() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_true() -> bool {
    true
}

impl IoConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let output = &self.output;
        if output.target_archive_size == 0 {
            return Err(Error::InvalidConfig(
                "io.output.target_archive_size must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("target_dictionaries_size", output.target_dictionaries_size),
            ("target_segment_size", output.target_segment_size),
            ("target_encoded_file_size", output.target_encoded_file_size),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!(
                    "io.output.{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.io.validate()?;
        if self.io.input.paths.is_empty() && self.io.input.list_path.is_none() {
            return Err(Error::InvalidConfig(
                "io.input needs at least one of `paths` or `list_path`".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `Config.toml` (if present) overlaid with `LOGBUNDLE__*` environment
/// variables, then validate.
pub fn load_configuration() -> Result<AppConfig, Error> {
    load_configuration_from("Config")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, Error> {
    let config = build_config(name)?.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

fn build_config(name: &str) -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("LOGBUNDLE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("io.input.paths")
                .with_list_parse_key("scheduler.ignore_patterns")
                .try_parsing(true),
        )
        .build()
}

/// Drop input roots nested under another root so no file is discovered twice.
/// Order of the surviving roots follows their first appearance.
pub fn non_overlapping_paths(paths: &[String]) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::new();

    for path in paths {
        let candidate = Path::new(path);
        if kept.iter().any(|root| candidate.starts_with(root)) {
            continue;
        }
        kept.retain(|root| !root.starts_with(candidate));
        kept.push(candidate.to_path_buf());
    }

    kept
}
