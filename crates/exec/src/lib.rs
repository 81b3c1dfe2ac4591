//! Monitored command execution for repro
//!
//! Runs a shell command inside a repository with the activation implied by an
//! `EnvironmentDescriptor`, drains stdout and stderr concurrently, enforces a
//! timeout by killing the process group, mirrors output to an injected
//! console, and persists a per-run log.
//!
//! ## Key Components
//!
//! - **`MonitoredExecutor`**: the execute path plus its container and
//!   test-suite variants.
//! - **`scan`**: failure and warning markers found in captured output.
//! - **`gpu`**: detection of NVIDIA GPUs for container passthrough and
//!   diagnosis context.

mod capture;
pub mod container;
pub mod executor;
pub mod gpu;
pub mod log;
pub mod scan;

pub use container::container_command;
pub use executor::MonitoredExecutor;
pub use gpu::{GpuInfo, GpuProbe, GpuStatus, NvidiaSmiProbe, StaticGpuProbe};
pub use scan::{scan_errors, scan_warnings};
