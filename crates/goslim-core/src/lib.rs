//! # goslim-core
//!
//! Core types shared by every goslim crate.
//!
//! - File entities carrying their staging / published / backup path triple
//! - Slim aspects and their built-in GO slim term lists
//! - The pipeline run state machine and its ordered stage log
//! - The cross-crate error taxonomy and exit codes
//! - The run summary printed by the CLI

pub mod artifact;
pub mod errors;
pub mod responses;
pub mod run;
pub mod slim;
pub mod stage;

pub use artifact::{AnnotationFile, ArtifactPaths, OntologyFile, SlimAnnotationFile};
pub use errors::{CoreError, ErrorKind, StageError};
pub use responses::{NotificationStatus, RunSummary};
pub use run::{EntryStatus, LogEntry, PipelineRun, PublishRecord, RunStatus, SlimOutcome};
pub use slim::{SlimAspect, SlimSubsetDefinition};
pub use stage::Stage;
