//! Date parsers and the contract they share.
//!
//! A parser inspects one kind of evidence (EXIF tags, the file name, the
//! filesystem's birth time) and either votes for a date or declines with a
//! [`ParseError`]. Declining is never fatal: the resolver simply moves on to the
//! next parser.
//!
//! # Adding a parser
//!
//! Implement [`DateParser`] and register an instance with the orchestrator.
//! The parser must always tag its result with the source it reports from
//! [`DateParser::source`].

pub mod digits;
pub mod filename;
pub mod filesystem;
pub mod metadata;

pub use filename::FilenameDateParser;
pub use filesystem::FilesystemCreatedParser;
pub use metadata::MetadataDateParser;

use crate::resolution::{DateResolution, DateSource, Zone};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Why a parser had no opinion about a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file's extension or content is not something this parser reads.
    #[error("unsupported: {reason}")]
    Unsupported { reason: String },
    /// The evidence is present but does not form a valid date.
    #[error("malformed date: {reason}")]
    Malformed { reason: String },
}

impl ParseError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        ParseError::Unsupported {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            reason: reason.into(),
        }
    }
}

/// Read-only view of the settings a parser may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext {
    /// Zone used to anchor naive wall-clock dates.
    pub zone: Zone,
}

impl ParseContext {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }
}

/// A single source of date evidence.
pub trait DateParser {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The source every successful result of this parser is tagged with.
    fn source(&self) -> DateSource;

    /// Extracts a date from `path`.
    ///
    /// The caller guarantees the file exists and is readable. Implementations
    /// must not modify the file.
    fn parse(&self, path: &Path, context: &ParseContext) -> Result<DateResolution, ParseError>;
}

/// The built-in parsers, as named in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[serde(alias = "exif")]
    Metadata,
    #[serde(alias = "file_name")]
    Filename,
    #[serde(alias = "created_at")]
    FilesystemCreated,
}

impl ParserKind {
    pub fn build(self) -> Box<dyn DateParser> {
        match self {
            ParserKind::Metadata => Box::new(MetadataDateParser),
            ParserKind::Filename => Box::new(FilenameDateParser),
            ParserKind::FilesystemCreated => Box::new(FilesystemCreatedParser),
        }
    }
}

/// Instantiates parsers in the given registration order.
pub fn build_parsers(kinds: &[ParserKind]) -> Vec<Box<dyn DateParser>> {
    kinds.iter().map(|kind| kind.build()).collect()
}

/// Metadata and filename parsers, the set used when nothing is configured.
pub fn default_parser_kinds() -> Vec<ParserKind> {
    vec![ParserKind::Metadata, ParserKind::Filename]
}
