//! Dates from the filesystem's record of when a file was created.

use super::{DateParser, ParseContext, ParseError};
use crate::resolution::{DateResolution, DateSource};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Reports the file's birth time.
///
/// Not every platform or filesystem records one; those files are reported
/// as unsupported rather than falling back to the modification time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemCreatedParser;

impl DateParser for FilesystemCreatedParser {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn source(&self) -> DateSource {
        DateSource::FilesystemCreated
    }

    fn parse(&self, path: &Path, context: &ParseContext) -> Result<DateResolution, ParseError> {
        let metadata = fs::metadata(path)
            .map_err(|e| ParseError::unsupported(format!("cannot stat file: {}", e)))?;
        let created = metadata
            .created()
            .map_err(|e| ParseError::unsupported(format!("creation time unavailable: {}", e)))?;

        let utc: DateTime<Utc> = created.into();
        Ok(DateResolution::new(
            DateSource::FilesystemCreated,
            context.zone.from_utc(utc),
        ))
    }
}
