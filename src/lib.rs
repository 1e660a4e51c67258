//! datetidy - sort photos and videos into dated folders
//!
//! This library works out when a file was taken from several independent
//! sources (embedded metadata, digits in the file name, filesystem creation
//! time, or the user), picks the most trusted answer, and moves the file into
//! a `<output_root>/<YYYY>.<MM>/` folder. Files nobody can date are escalated
//! to the user, deferred to the end of the run, or skipped.

pub mod cli;
pub mod config;
pub mod escalation;
pub mod interaction;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod relocator;
pub mod resolution;
pub mod resolver;
pub mod scanner;
pub mod trust;

pub use config::{CompiledFilters, Config, ConfigError, RunSettings};
pub use escalation::{EscalationQueue, EscalationStrategy};
pub use interaction::{ConsoleInteraction, Interaction, InteractionError, ScriptedInteraction};
pub use orchestrator::{FileIssue, Orchestrator, RunSummary};
pub use parser::{DateParser, ParseContext, ParseError};
pub use relocator::{CollisionPolicy, RelocateError, Relocator};
pub use resolution::{DateResolution, DateSource, Zone};
pub use resolver::resolve;
pub use scanner::{ScanError, Scanner};
pub use trust::{PolicyError, TrustPolicy};

pub use cli::{Args, run_cli};
