//! Run configuration and file filtering.
//!
//! Settings are loaded from a TOML file and may be overridden from the command
//! line. The `[organize]` table controls how dates are resolved and where files
//! go; the `[filters]` table controls which files are considered at all.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! output_root = "/home/me/Pictures/sorted"
//! trust_order = ["filename", "metadata", "user_input", "filesystem_created"]
//! escalation = "deferred"          # immediate | deferred | skip
//! alter_creation_time = true
//! collision = "reject"             # reject | suffix
//! folder_format = "%Y.%m"
//! timezone = "local"               # or an offset such as "+09:00"
//! parsers = ["metadata", "filename"]
//!
//! [filters]
//! extensions = ["jpg", "jpeg", "png", "heic", "mp4", "mov"]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["**/thumbnails/**"]
//! extensions = []
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::escalation::EscalationStrategy;
use crate::parser::{ParserKind, default_parser_kinds};
use crate::relocator::CollisionPolicy;
use crate::resolution::{DateSource, Zone};
use crate::trust::{PolicyError, TrustPolicy};
use chrono::format::{Item, StrftimeItems};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// The trust order is not a complete ranking of date sources.
    #[error(transparent)]
    InvalidPolicy(#[from] PolicyError),
    /// The bucket folder format is not a valid strftime pattern.
    #[error("Invalid folder format '{0}': not a strftime pattern")]
    InvalidFolderFormat(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeConfig,
    #[serde(default)]
    pub filters: FilterRules,
}

/// How dates are resolved and files relocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Root of the date buckets. Defaults to the scanned directory.
    pub output_root: Option<PathBuf>,
    /// Date sources, most trusted first. Must rank every source exactly once.
    pub trust_order: Vec<DateSource>,
    /// What to do with files whose date cannot be inferred.
    pub escalation: EscalationStrategy,
    /// Rewrite creation and modification times to the resolved date.
    pub alter_creation_time: bool,
    /// What to do when the destination name is taken.
    pub collision: CollisionPolicy,
    /// strftime pattern naming the bucket folder.
    pub folder_format: String,
    /// Zone used to interpret dates that carry no offset.
    pub timezone: Zone,
    /// Parsers to run, in registration order.
    pub parsers: Vec<ParserKind>,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            trust_order: TrustPolicy::default().order().to_vec(),
            escalation: EscalationStrategy::default(),
            alter_creation_time: true,
            collision: CollisionPolicy::default(),
            folder_format: DEFAULT_FOLDER_FORMAT.to_string(),
            timezone: Zone::default(),
            parsers: default_parser_kinds(),
        }
    }
}

impl OrganizeConfig {
    /// Validates the trust order into a [`TrustPolicy`].
    pub fn trust_policy(&self) -> Result<TrustPolicy, ConfigError> {
        Ok(TrustPolicy::new(self.trust_order.clone())?)
    }

    /// Builds validated run settings.
    ///
    /// `fallback_root` is used when no `output_root` is configured.
    pub fn run_settings(&self, fallback_root: &Path) -> Result<RunSettings, ConfigError> {
        validate_folder_format(&self.folder_format)?;

        Ok(RunSettings {
            output_root: self
                .output_root
                .clone()
                .unwrap_or_else(|| fallback_root.to_path_buf()),
            escalation: self.escalation,
            alter_creation_time: self.alter_creation_time,
            collision: self.collision,
            folder_format: self.folder_format.clone(),
            zone: self.timezone,
            dry_run: false,
        })
    }
}

/// Default bucket naming, e.g. `2021.03`.
pub const DEFAULT_FOLDER_FORMAT: &str = "%Y.%m";

fn validate_folder_format(format: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidFolderFormat(format.to_string());
    if format.trim().is_empty() || format.contains('/') || format.contains('\\') {
        return Err(invalid());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    Ok(())
}

/// Validated settings consumed by the relocation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub output_root: PathBuf,
    pub escalation: EscalationStrategy,
    pub alter_creation_time: bool,
    pub collision: CollisionPolicy,
    pub folder_format: String,
    pub zone: Zone,
    /// Report destinations without moving anything.
    pub dry_run: bool,
}

impl RunSettings {
    /// Defaults for everything except the output root.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let defaults = OrganizeConfig::default();
        Self {
            output_root: output_root.into(),
            escalation: defaults.escalation,
            alter_creation_time: defaults.alter_creation_time,
            collision: defaults.collision,
            folder_format: defaults.folder_format,
            zone: defaults.timezone,
            dry_run: false,
        }
    }
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Extensions considered at all (case-insensitive, without the dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Photo and video extensions handled out of the box.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "heic", "heif", "webp", "tif", "tiff", "dng", "cr2", "nef", "arw",
    "mp4", "mov", "m4v", "avi", "mkv", "3gp",
];

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_enable_hidden_files() -> bool {
    false
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "**/thumbnails/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude even if otherwise supported.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.datetidyrc.toml` in the current directory
    /// 3. Look for `~/.config/datetidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datetidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled filter rules.
///
/// Glob and regex patterns are parsed once so that matching a file costs one
/// pass over the rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    supported_extensions: HashSet<String>,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lowercase_set = |items: &[String]| -> HashSet<String> {
            items
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect()
        };

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            supported_extensions: lowercase_set(&rules.extensions),
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: lowercase_set(&rules.exclude.extensions),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a file should be considered for organization.
    ///
    /// `file_path` is matched as given; callers pass it relative to the scan
    /// root so that directory globs behave. Checks run in this order:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Supported extensions - if the set is non-empty and the extension is not in it, exclude
    /// 4. Exact filename match - if matched, exclude
    /// 5. Excluded extension - if matched, exclude
    /// 6. Glob pattern match - if matched, exclude
    /// 7. Regex pattern match - if matched, exclude
    /// 8. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let extension = file_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        if self.matches_include_patterns(file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if !self.supported_extensions.is_empty()
            && !extension
                .as_ref()
                .is_some_and(|ext| self.supported_extensions.contains(ext))
        {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if extension
            .as_ref()
            .is_some_and(|ext| self.exclude_extensions.contains(ext))
        {
            return false;
        }

        if self.matches_exclude_patterns(file_path) {
            return false;
        }

        !self.matches_exclude_regex(&file_name)
    }

    fn matches_include_patterns(&self, file_path: &Path) -> bool {
        self.include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
    }

    fn matches_exclude_patterns(&self, file_path: &Path) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
    }

    fn matches_exclude_regex(&self, file_name: &str) -> bool {
        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}
