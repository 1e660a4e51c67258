//! Date provenance and resolved-date value types.
//!
//! Every parser produces a [`DateResolution`] tagged with the [`DateSource`] it
//! read the date from. Naive wall-clock dates (EXIF tags, digits in file names,
//! manual entry) are anchored to a timezone through a [`Zone`].

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where a candidate date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Embedded metadata such as EXIF `DateTimeOriginal`.
    #[serde(alias = "exif")]
    Metadata,
    /// Digits embedded in the file name.
    #[serde(alias = "file_name")]
    Filename,
    /// The filesystem's birth time for the file.
    #[serde(alias = "created_at")]
    FilesystemCreated,
    /// A date typed in by the user during escalation.
    UserInput,
}

impl DateSource {
    /// Every known source, in declaration order.
    pub const ALL: [DateSource; 4] = [
        DateSource::Metadata,
        DateSource::Filename,
        DateSource::FilesystemCreated,
        DateSource::UserInput,
    ];

    /// Stable name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateSource::Metadata => "metadata",
            DateSource::Filename => "filename",
            DateSource::FilesystemCreated => "filesystem_created",
            DateSource::UserInput => "user_input",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DateSource::Metadata => 0,
            DateSource::Filename => 1,
            DateSource::FilesystemCreated => 2,
            DateSource::UserInput => 3,
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a source name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown date source '{0}' (expected metadata, filename, filesystem_created or user_input)")]
pub struct UnknownSource(pub String);

impl FromStr for DateSource {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "metadata" | "exif" => Ok(DateSource::Metadata),
            "filename" | "file_name" => Ok(DateSource::Filename),
            "filesystem_created" | "created_at" | "created" => Ok(DateSource::FilesystemCreated),
            "user_input" | "user" => Ok(DateSource::UserInput),
            _ => Err(UnknownSource(s.to_string())),
        }
    }
}

/// A single candidate date and where it came from.
///
/// Values are immutable once produced and are passed around by copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolution {
    pub source: DateSource,
    pub timestamp: DateTime<FixedOffset>,
}

impl DateResolution {
    pub fn new(source: DateSource, timestamp: DateTime<FixedOffset>) -> Self {
        Self { source, timestamp }
    }
}

impl fmt::Display for DateResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (from {})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S %:z"),
            self.source
        )
    }
}

/// Timezone used to interpret naive wall-clock dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The machine's local timezone, including its DST rules.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

/// Error returned when a timezone setting cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timezone '{0}' (expected \"local\", \"utc\" or an offset like +09:00)")]
pub struct InvalidZone(pub String);

impl Zone {
    /// UTC as a fixed zone.
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Anchors a naive wall-clock time in this zone.
    ///
    /// Returns `None` for local times skipped by a DST transition. Ambiguous
    /// local times resolve to the earlier instant.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        }
    }

    /// Converts an absolute instant into this zone.
    pub fn from_utc(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
        }
    }
}

impl FromStr for Zone {
    type Err = InvalidZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "local" | "" => Ok(Zone::Local),
            "utc" | "z" => Ok(Zone::utc()),
            _ => trimmed
                .parse::<FixedOffset>()
                .map(Zone::Fixed)
                .map_err(|_| InvalidZone(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Zone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Zone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Zone::Local => serializer.serialize_str("local"),
            Zone::Fixed(offset) => serializer.serialize_str(&offset.to_string()),
        }
    }
}
