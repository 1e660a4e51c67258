//! Dates from embedded EXIF metadata.
//!
//! The container type is sniffed from the file's magic bytes with `infer`, so a
//! mislabelled extension does not matter. The EXIF block itself is decoded by
//! `kamadak-exif`.

use super::digits::{extract_digits, parse_digit_run};
use super::{DateParser, ParseContext, ParseError};
use crate::resolution::{DateResolution, DateSource};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// MIME types of containers that can carry an EXIF block.
const EXIF_CONTAINERS: &[&str] = &[
    "image/jpeg",
    "image/tiff",
    "image/heif",
    "image/png",
    "image/webp",
    "image/x-canon-cr2",
];

/// Date tags in order of preference.
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Reads `DateTimeOriginal` (falling back to `DateTimeDigitized`, then
/// `DateTime`) from a photo's EXIF block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataDateParser;

impl DateParser for MetadataDateParser {
    fn name(&self) -> &str {
        "exif"
    }

    fn source(&self) -> DateSource {
        DateSource::Metadata
    }

    fn parse(&self, path: &Path, context: &ParseContext) -> Result<DateResolution, ParseError> {
        let kind = infer::get_from_path(path)
            .map_err(|e| ParseError::unsupported(format!("cannot sniff content: {}", e)))?
            .ok_or_else(|| ParseError::unsupported("unrecognised content type"))?;

        if !EXIF_CONTAINERS.contains(&kind.mime_type()) {
            return Err(ParseError::unsupported(format!(
                "{} does not carry EXIF metadata",
                kind.mime_type()
            )));
        }

        let file = File::open(path)
            .map_err(|e| ParseError::unsupported(format!("cannot open file: {}", e)))?;
        let exif = Reader::new()
            .read_from_container(&mut BufReader::new(file))
            .map_err(|e| match e {
                exif::Error::NotFound(_) => ParseError::unsupported("no EXIF block"),
                other => ParseError::malformed(format!("unreadable EXIF block: {}", other)),
            })?;

        let field = DATE_TAGS
            .iter()
            .find_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .ok_or_else(|| ParseError::unsupported("EXIF block has no date tag"))?;

        let raw = match &field.value {
            Value::Ascii(parts) => parts
                .first()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
        .ok_or_else(|| ParseError::malformed(format!("{} is not a text value", field.tag)))?;

        let timestamp = parse_digit_run(&extract_digits(&raw), &context.zone)?;
        Ok(DateResolution::new(DateSource::Metadata, timestamp))
    }
}
