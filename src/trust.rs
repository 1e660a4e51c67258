//! Source ranking used to arbitrate between conflicting dates.
//!
//! A [`TrustPolicy`] is a total order over every [`DateSource`]. It is
//! validated once at construction and never changes during a run.

use crate::resolution::{DateResolution, DateSource};
use std::fmt;
use thiserror::Error;

/// Errors raised when a trust order is not a complete ranking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The same source was listed more than once.
    #[error("invalid trust order: '{0}' is listed more than once")]
    Duplicate(DateSource),
    /// A known source was left out of the ordering.
    #[error("invalid trust order: '{0}' is not ranked")]
    Missing(DateSource),
}

/// Ordered ranking of date sources, most trusted first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    order: Vec<DateSource>,
    ranks: [usize; 4],
}

impl TrustPolicy {
    /// Builds a policy from an ordering, most trusted first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Duplicate`] if a source appears twice and
    /// [`PolicyError::Missing`] if any known source is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use datetidy::resolution::DateSource;
    /// use datetidy::trust::TrustPolicy;
    ///
    /// let policy = TrustPolicy::new(vec![
    ///     DateSource::Metadata,
    ///     DateSource::Filename,
    ///     DateSource::UserInput,
    ///     DateSource::FilesystemCreated,
    /// ])
    /// .unwrap();
    /// assert!(policy.rank(DateSource::Metadata) < policy.rank(DateSource::Filename));
    ///
    /// assert!(TrustPolicy::new(vec![DateSource::Metadata]).is_err());
    /// ```
    pub fn new(order: Vec<DateSource>) -> Result<Self, PolicyError> {
        let mut ranks = [usize::MAX; 4];

        for (position, source) in order.iter().enumerate() {
            let slot = &mut ranks[source.index()];
            if *slot != usize::MAX {
                return Err(PolicyError::Duplicate(*source));
            }
            *slot = position;
        }

        if let Some(missing) = DateSource::ALL
            .iter()
            .find(|source| ranks[source.index()] == usize::MAX)
        {
            return Err(PolicyError::Missing(*missing));
        }

        Ok(Self { order, ranks })
    }

    /// Position of `source` in the ordering. Lower is more trusted.
    pub fn rank(&self, source: DateSource) -> usize {
        self.ranks[source.index()]
    }

    /// Returns whichever resolution comes from the more trusted source.
    ///
    /// On equal rank the first argument wins.
    pub fn preferred(&self, a: DateResolution, b: DateResolution) -> DateResolution {
        if self.rank(b.source) < self.rank(a.source) {
            b
        } else {
            a
        }
    }

    /// The ordering this policy was built from.
    pub fn order(&self) -> &[DateSource] {
        &self.order
    }
}

impl Default for TrustPolicy {
    /// Filename digits first, then metadata, manual entry and filesystem time.
    fn default() -> Self {
        let order = vec![
            DateSource::Filename,
            DateSource::Metadata,
            DateSource::UserInput,
            DateSource::FilesystemCreated,
        ];
        let ranks = [1, 0, 3, 2];
        Self { order, ranks }
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.order.iter().map(DateSource::as_str).collect();
        f.write_str(&names.join(" > "))
    }
}
