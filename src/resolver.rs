//! Arbitration between competing parser votes for a single file.

use crate::parser::{DateParser, ParseContext};
use crate::resolution::DateResolution;
use crate::trust::TrustPolicy;
use std::path::Path;
use tracing::{debug, warn};

/// Runs every parser against `path` and returns the most trusted answer.
///
/// Parsers run in registration order and each failure is isolated: a parser
/// that declines never prevents the others from voting. When several parsers
/// answer, the votes are folded left to right through
/// [`TrustPolicy::preferred`]. Returns `None` when no parser had an opinion.
///
/// A result tagged with a source other than the parser's declared one breaks
/// the parser contract and is discarded.
pub fn resolve(
    path: &Path,
    parsers: &[Box<dyn DateParser>],
    policy: &TrustPolicy,
    context: &ParseContext,
) -> Option<DateResolution> {
    parsers
        .iter()
        .filter_map(|parser| match parser.parse(path, context) {
            Ok(resolution) if resolution.source != parser.source() => {
                warn!(
                    parser = parser.name(),
                    declared = %parser.source(),
                    reported = %resolution.source,
                    path = %path.display(),
                    "parser reported a foreign source, ignoring its vote"
                );
                None
            }
            Ok(resolution) => {
                debug!(parser = parser.name(), path = %path.display(), %resolution, "vote");
                Some(resolution)
            }
            Err(e) => {
                debug!(parser = parser.name(), path = %path.display(), error = %e, "no opinion");
                None
            }
        })
        .reduce(|best, candidate| policy.preferred(best, candidate))
}
