//! Reproduction pipeline for repro
//!
//! Drives one run through its stages, in order:
//!
//! ```text
//! initialized → discovered → selected → analyzed → provisioned → executed → diagnosed → reported
//! ```
//!
//! Every stage appends an entry to the session checkpoint. A failing stage
//! halts the run, and the partial [`RunReport`] is still written and returned
//! so callers can see how far it got.
//!
//! Metadata lookup, repository discovery, cloning and analysis are supplied
//! by the caller through the traits in [`collaborators`].

pub mod checkpoint;
pub mod collaborators;
pub mod orchestrator;
pub mod report;
pub mod selection;
pub mod session;
pub mod stage;

pub use checkpoint::{Checkpoint, CheckpointEntry, CheckpointWriter};
pub use collaborators::{
    CandidateChooser, CandidateDiscovery, Collaborators, GitFetcher, MetadataSource,
    RepositoryAnalyzer, RepositoryFetcher,
};
pub use orchestrator::{Pipeline, RunRequest};
pub use report::RunReport;
pub use selection::select_candidate;
pub use session::SessionDir;
pub use stage::{Stage, StageTracker};
