//! Dates embedded in file names, e.g. `IMG_20210305_141055.jpg`.

use super::digits::{extract_digits, parse_digit_run};
use super::{DateParser, ParseContext, ParseError};
use crate::resolution::{DateResolution, DateSource};
use std::path::Path;

/// Reads the digits of a file's stem as a date.
///
/// The extension is ignored so names like `clip.mp4` do not pick up a stray
/// digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameDateParser;

impl DateParser for FilenameDateParser {
    fn name(&self) -> &str {
        "filename"
    }

    fn source(&self) -> DateSource {
        DateSource::Filename
    }

    fn parse(&self, path: &Path, context: &ParseContext) -> Result<DateResolution, ParseError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .ok_or_else(|| ParseError::unsupported("path has no file name"))?;

        let digits = extract_digits(&stem);
        let timestamp = parse_digit_run(&digits, &context.zone)?;
        Ok(DateResolution::new(DateSource::Filename, timestamp))
    }
}
