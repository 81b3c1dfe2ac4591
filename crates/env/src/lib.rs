//! Environment provisioning for repro
//!
//! Prepares an isolated execution environment for a cloned repository using
//! one of several strategies: a container image build, a Python virtual
//! environment, a conda environment, or an npm install. Strategy failures are
//! recorded on the returned `EnvironmentDescriptor` instead of being raised,
//! so callers can fall back to the next strategy.

pub mod provisioner;
pub mod runner;
mod strategies;

pub use provisioner::{ProvisionOptions, Provisioner};
pub use runner::{ScriptedRunner, SetupCommand, SetupOutput, SystemRunner, ToolRunner};
