//! NVIDIA GPU detection through `nvidia-smi`

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use repro_env::{SetupCommand, ToolRunner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const NVIDIA_SMI: &str = "nvidia-smi";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

static CUDA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CUDA Version:\s*(\d+\.\d+)").expect("static regex is valid"));

/// One detected GPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub index: u32,
    pub name: String,
    pub memory_total_mb: u64,
    pub memory_free_mb: u64,
}

/// Result of probing the host for GPUs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuStatus {
    pub gpus: Vec<GpuInfo>,
    pub cuda_version: Option<String>,
}

impl GpuStatus {
    pub fn available(&self) -> bool {
        !self.gpus.is_empty()
    }

    pub fn total_memory_mb(&self) -> u64 {
        self.gpus.iter().map(|g| g.memory_total_mb).sum()
    }
}

/// Parse `--query-gpu=index,name,memory.total,memory.free --format=csv,noheader,nounits`
pub fn parse_gpu_csv(text: &str) -> Vec<GpuInfo> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 4 {
                return None;
            }
            Some(GpuInfo {
                index: parts[0].parse().ok()?,
                name: parts[1].to_string(),
                memory_total_mb: parts[2].parse().ok()?,
                memory_free_mb: parts[3].parse().ok()?,
            })
        })
        .collect()
}

/// CUDA version from the plain `nvidia-smi` banner
pub fn parse_cuda_version(text: &str) -> Option<String> {
    CUDA_VERSION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Source of GPU information
#[async_trait]
pub trait GpuProbe: Send + Sync {
    async fn probe(&self) -> GpuStatus;
}

/// Probe that asks `nvidia-smi`; a missing tool means no GPU
pub struct NvidiaSmiProbe {
    runner: Arc<dyn ToolRunner>,
}

impl NvidiaSmiProbe {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl GpuProbe for NvidiaSmiProbe {
    async fn probe(&self) -> GpuStatus {
        let query = SetupCommand::new(NVIDIA_SMI, PROBE_TIMEOUT).args([
            "--query-gpu=index,name,memory.total,memory.free",
            "--format=csv,noheader,nounits",
        ]);
        let gpus = match self.runner.run(&query).await {
            Ok(output) if output.success() => parse_gpu_csv(&output.stdout),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "no NVIDIA GPUs available");
                return GpuStatus::default();
            }
        };

        let cuda_version = match self.runner.run(&SetupCommand::new(NVIDIA_SMI, PROBE_TIMEOUT)).await {
            Ok(output) if output.success() => parse_cuda_version(&output.stdout),
            _ => None,
        };

        tracing::debug!(count = gpus.len(), cuda = ?cuda_version, "probed GPUs");
        GpuStatus { gpus, cuda_version }
    }
}

/// Probe returning a fixed answer
#[derive(Debug, Clone, Default)]
pub struct StaticGpuProbe(pub GpuStatus);

impl StaticGpuProbe {
    pub fn none() -> Self {
        Self(GpuStatus::default())
    }
}

#[async_trait]
impl GpuProbe for StaticGpuProbe {
    async fn probe(&self) -> GpuStatus {
        self.0.clone()
    }
}
