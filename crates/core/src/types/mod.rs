//! Domain types shared across the reproduction pipeline
//!
//! Paper metadata, candidates and analyses are produced by external
//! collaborators and consumed read-only. Environment descriptors and
//! execution results are produced by the provisioner and executor.

pub mod analysis;
pub mod candidate;
pub mod environment;
pub mod execution;
pub mod paper;

pub use analysis::{Complexity, Dependencies, EntryPoint, NodeDependencies, PythonDependencies, RepositoryAnalysis};
pub use candidate::{CandidateSource, RepositoryCandidate};
pub use environment::{EnvironmentDescriptor, EnvironmentKind, EnvironmentPreference};
pub use execution::{ExecutionResult, TestRunSummary};
pub use paper::PaperMetadata;
