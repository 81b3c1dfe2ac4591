//! The stage sequencer

use crate::checkpoint::CheckpointWriter;
use crate::collaborators::Collaborators;
use crate::report::RunReport;
use crate::selection::select_candidate;
use crate::session::SessionDir;
use crate::stage::{Stage, StageTracker};
use chrono::{Local, Utc};
use repro_cache::{CacheKind, ResultCache};
use repro_config::Settings;
use repro_core::{
    ConsoleSink, EnvironmentDescriptor, EnvironmentPreference, PaperMetadata, RepositoryAnalysis,
    Error, RepositoryCandidate, Result, StatusLevel, TOOL_PROBE_TIMEOUT,
};
use repro_diagnose::{format_diagnosis, DiagnosisContext, ErrorDiagnoser};
use repro_env::{ProvisionOptions, Provisioner, SetupCommand, SystemRunner, ToolRunner};
use repro_exec::{GpuProbe, MonitoredExecutor, NvidiaSmiProbe};
use repro_utils::tracing::stage_span;
use repro_utils::{Retrier, Sleeper};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// What to reproduce and how
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Paper reference handed to the metadata source
    pub reference: String,
    /// Overrides the analysis entry point
    pub command: Option<String>,
    /// Overrides the configured execution timeout
    pub timeout: Option<Duration>,
    pub environment: Option<EnvironmentPreference>,
    pub interactive: Option<bool>,
    /// Mounted at `/data` for container runs
    pub data_dir: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn environment(mut self, preference: EnvironmentPreference) -> Self {
        self.environment = Some(preference);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}

/// Reason a run stopped before reporting normally
struct Halt(String);

const INTERRUPTED_REASON: &str = "Interrupted by user";

impl Halt {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Mutable state of the run in progress
struct RunState {
    session: SessionDir,
    report: RunReport,
    tracker: StageTracker,
    checkpoint: CheckpointWriter,
}

impl RunState {
    fn complete<T: Serialize + ?Sized>(
        &mut self,
        stage: Stage,
        data: &T,
    ) -> std::result::Result<(), Halt> {
        self.tracker
            .advance(stage)
            .map_err(|e| Halt::new(e.to_string()))?;
        self.checkpoint.record(stage, data);
        self.report.last_stage = Some(stage);
        Ok(())
    }
}

/// Runs reproductions one at a time, stage by stage
pub struct Pipeline {
    settings: Settings,
    collaborators: Collaborators,
    console: Arc<dyn ConsoleSink>,
    runner: Arc<dyn ToolRunner>,
    gpu_probe: Arc<dyn GpuProbe>,
    cache: Option<ResultCache>,
    retrier: Retrier,
    diagnoser: ErrorDiagnoser,
}

impl Pipeline {
    pub fn new(
        settings: Settings,
        collaborators: Collaborators,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner::new());
        let cache = settings
            .use_cache
            .then(|| ResultCache::new(&settings.cache_dir));
        Self {
            retrier: Retrier::new(settings.backoff()),
            gpu_probe: Arc::new(NvidiaSmiProbe::new(Arc::clone(&runner))),
            runner,
            cache,
            settings,
            collaborators,
            console,
            diagnoser: ErrorDiagnoser::new(),
        }
    }

    /// Run setup tools and probes through `runner`
    pub fn with_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.gpu_probe = Arc::new(NvidiaSmiProbe::new(Arc::clone(&runner)));
        self.runner = runner;
        self
    }

    pub fn with_gpu_probe(mut self, probe: Arc<dyn GpuProbe>) -> Self {
        self.gpu_probe = probe;
        self
    }

    /// Sleep between collaborator retries with `sleeper`
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retrier = Retrier::with_sleeper(self.settings.backoff(), sleeper);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reproduce `request` and return its report
    ///
    /// Stage failures end the run early with `success = false` and a halt
    /// reason; only a session directory that cannot be created is an `Err`.
    /// The report is written to the session directory exactly once.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        self.run_until(request, std::future::pending()).await
    }

    /// Like [`Pipeline::run`], but stop early once `interrupt` resolves
    ///
    /// An interrupt after the session directory exists drops the stage in
    /// flight (killing any running command) and still writes a partial
    /// report marked `interrupted`. An earlier interrupt is
    /// `Error::Interrupted`.
    pub async fn run_until<F>(&self, request: &RunRequest, interrupt: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        self.run_inner(request, interrupt)
            .instrument(repro_utils::tracing::run_span(&request.reference))
            .await
    }

    async fn run_inner<F>(&self, request: &RunRequest, interrupt: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let clock = Instant::now();
        let started_at = Utc::now();
        self.console.status(
            StatusLevel::Info,
            &format!("Starting reproduction: {}", request.reference),
        );

        let paper = tokio::select! {
            paper = self.fetch_metadata(&request.reference) => paper,
            () = &mut interrupt => return Err(Error::Interrupted),
        };
        let title = paper
            .as_ref()
            .map_or("unknown", PaperMetadata::display_title);
        let session = SessionDir::create(&self.settings.work_dir, title, Local::now())?;
        self.console.status(
            StatusLevel::Info,
            &format!("Session directory: {}", session.root().display()),
        );

        let mut run = RunState {
            report: RunReport::new(&request.reference, session.root().to_path_buf(), started_at),
            checkpoint: CheckpointWriter::new(session.checkpoint()),
            tracker: StageTracker::new(),
            session,
        };

        let outcome = tokio::select! {
            outcome = self.drive(&mut run, request, paper) => Some(outcome),
            () = &mut interrupt => None,
        };
        let outcome = outcome.unwrap_or_else(|| {
            tracing::warn!(stage = ?run.tracker.current(), "interrupt received, abandoning the stage in flight");
            run.report.interrupted = true;
            Err(Halt::new(INTERRUPTED_REASON))
        });
        if let Err(Halt(reason)) = outcome {
            tracing::warn!(reason = %reason, stage = ?run.tracker.current(), "run halted");
            self.console.status(StatusLevel::Failure, &reason);
            run.report.halt_reason = Some(reason);
            run.report.success = false;
        }

        Ok(self.finish(run, clock))
    }

    async fn drive(
        &self,
        run: &mut RunState,
        request: &RunRequest,
        paper: Result<PaperMetadata>,
    ) -> std::result::Result<(), Halt> {
        let paper = paper.map_err(|e| Halt::new(format!("Failed to fetch paper metadata: {e}")))?;
        self.console
            .status(StatusLevel::Success, &format!("Paper: {}", paper.display_title()));
        run.report.paper = Some(paper.clone());
        run.complete(Stage::Initialized, &json!({ "paper": &paper }))?;

        let candidates = self
            .stage_discover(&paper)
            .instrument(stage_span("discover"))
            .await?;
        run.report.candidates = candidates.clone();
        run.complete(Stage::Discovered, &json!({ "candidates": &candidates }))?;

        let interactive = request.interactive.unwrap_or(self.settings.interactive);
        let selected = self
            .select(&candidates, interactive)
            .ok_or_else(|| Halt::new("No repository selected"))?;
        self.console
            .status(StatusLevel::Success, &format!("Selected repository: {}", selected.url));
        run.report.selected = Some(selected.clone());
        run.complete(Stage::Selected, &json!({ "repository": &selected }))?;

        let repo = run.session.repo();
        let analysis = self
            .stage_analyze(&selected, &repo)
            .instrument(stage_span("analyze"))
            .await?;
        run.report.analysis = Some(analysis.clone());
        run.complete(
            Stage::Analyzed,
            &json!({ "repoPath": &repo, "analysis": &analysis }),
        )?;

        let preference = request.environment.unwrap_or(self.settings.environment);
        let environment = self
            .stage_provision(&run.session, &repo, &analysis, preference)
            .instrument(stage_span("provision"))
            .await?;
        run.report.environment = Some(environment.clone());
        if !environment.success {
            for error in environment.all_errors() {
                self.console.status(StatusLevel::Failure, &format!("  • {error}"));
            }
            return Err(Halt::new("Environment setup failed"));
        }
        self.console.status(
            StatusLevel::Success,
            &format!("Environment ready ({})", environment.effective().kind),
        );
        run.complete(Stage::Provisioned, &json!({ "environment": &environment }))?;

        let Some(command) = request
            .command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| analysis.primary_command().map(str::to_string))
        else {
            self.console.status(
                StatusLevel::Warning,
                &format!("Please run the code manually from: {}", repo.display()),
            );
            return Err(Halt::new(format!(
                "No clear entry point found; run the code manually from {}",
                repo.display()
            )));
        };
        run.report.command = Some(command.clone());

        let timeout = request
            .timeout
            .unwrap_or_else(|| self.settings.execution_timeout());
        let console = Arc::clone(&self.console);
        let executor = MonitoredExecutor::new(&repo, environment.clone(), console)
            .with_log_dir(run.session.logs())
            .with_gpu_probe(Arc::clone(&self.gpu_probe))
            .with_max_capture(self.settings.max_captured_output_bytes);
        let result = match environment.container_image() {
            Some(image) => {
                executor
                    .execute_in_container(&command, image, timeout, request.data_dir.as_deref())
                    .instrument(stage_span("execute"))
                    .await
            }
            None => {
                executor
                    .execute(&command, timeout)
                    .instrument(stage_span("execute"))
                    .await
            }
        };
        run.report.success = result.success;
        run.complete(
            Stage::Executed,
            &json!({
                "command": &result.command,
                "exitCode": result.exit_code,
                "success": result.success,
                "timedOut": result.timed_out,
                "logFile": &result.log_file,
            }),
        )?;

        let context = self.diagnosis_context(&environment).await;
        let diagnosis = self
            .diagnoser
            .analyze_execution_result(&result, Some(&context));
        if !result.success {
            if let Some(primary) = diagnosis.primary() {
                for line in format_diagnosis(primary).lines().filter(|l| !l.is_empty()) {
                    self.console.status(StatusLevel::Info, line);
                }
            }
            for recommendation in &diagnosis.recommendations {
                self.console
                    .status(StatusLevel::Info, &format!("Recommendation: {recommendation}"));
            }
        }
        run.report.execution = Some(result);
        run.complete(Stage::Diagnosed, &diagnosis)?;
        run.report.diagnosis = Some(diagnosis);

        Ok(())
    }

    async fn stage_discover(
        &self,
        paper: &PaperMetadata,
    ) -> std::result::Result<Vec<RepositoryCandidate>, Halt> {
        let candidates = self
            .discover(paper)
            .await
            .map_err(|e| Halt::new(format!("Repository discovery failed: {e}")))?;
        if candidates.is_empty() {
            return Err(Halt::new(
                "No repositories found; the paper may not have publicly available code",
            ));
        }
        self.console.status(
            StatusLevel::Success,
            &format!("Found {} repository candidate(s)", candidates.len()),
        );
        Ok(candidates)
    }

    async fn stage_analyze(
        &self,
        selected: &RepositoryCandidate,
        repo: &Path,
    ) -> std::result::Result<RepositoryAnalysis, Halt> {
        self.console
            .status(StatusLevel::Info, &format!("Cloning {}", selected.url));
        self.collaborators
            .fetcher
            .fetch(selected, repo)
            .await
            .map_err(|e| Halt::new(format!("Failed to clone repository: {e}")))?;
        self.console.status(StatusLevel::Success, "Repository cloned");

        let analysis = self
            .analyze(selected, repo)
            .await
            .map_err(|e| Halt::new(format!("Repository analysis failed: {e}")))?;
        self.console.status(StatusLevel::Success, "Analysis complete");
        self.console.status(
            StatusLevel::Info,
            &format!("  Languages: {}", analysis.languages.join(", ")),
        );
        self.console.status(
            StatusLevel::Info,
            &format!("  Dependencies: {} packages", analysis.package_count()),
        );
        self.console.status(
            StatusLevel::Info,
            &format!("  Complexity: {}", analysis.estimated_complexity),
        );
        Ok(analysis)
    }

    async fn stage_provision(
        &self,
        session: &SessionDir,
        repo: &Path,
        analysis: &RepositoryAnalysis,
        preference: EnvironmentPreference,
    ) -> std::result::Result<EnvironmentDescriptor, Halt> {
        self.console.status(StatusLevel::Info, "Setting up environment");
        let provisioner = Provisioner::with_options(
            session.envs(),
            Arc::clone(&self.runner),
            self.provision_options(session),
        );
        provisioner
            .provision(repo, analysis, preference)
            .await
            .map_err(|e| Halt::new(format!("Environment setup failed: {e}")))
    }

    fn provision_options(&self, session: &SessionDir) -> ProvisionOptions {
        ProvisionOptions {
            image_name: session.image_tag(),
            python: self.settings.python.clone(),
            conda_python: self.settings.conda_python.clone(),
            install_timeout: self.settings.install_timeout(),
            docker_build_timeout: self.settings.docker_build_timeout(),
            prefer_docker: self.settings.prefer_docker,
            prefer_conda: self.settings.prefer_conda,
            ..ProvisionOptions::default()
        }
    }

    fn select(
        &self,
        candidates: &[RepositoryCandidate],
        interactive: bool,
    ) -> Option<RepositoryCandidate> {
        if interactive && candidates.len() > 1 {
            match &self.collaborators.chooser {
                Some(chooser) => return chooser.choose(candidates),
                None => tracing::warn!("interactive selection without a chooser, selecting automatically"),
            }
        }
        select_candidate(candidates).cloned()
    }

    async fn fetch_metadata(&self, reference: &str) -> Result<PaperMetadata> {
        if let Some(paper) = self
            .cache
            .as_ref()
            .and_then(|c| c.get::<PaperMetadata>(CacheKind::Paper, reference))
        {
            self.console.status(StatusLevel::Info, "Using cached paper metadata");
            return Ok(paper);
        }

        let paper = self
            .retrier
            .run("fetch_metadata", || {
                self.collaborators.metadata.fetch(reference)
            })
            .await?;
        if let Some(cache) = &self.cache {
            cache.set(CacheKind::Paper, reference, &paper);
        }
        Ok(paper)
    }

    async fn discover(&self, paper: &PaperMetadata) -> Result<Vec<RepositoryCandidate>> {
        let key = paper.cache_identifier();
        if let Some(candidates) = self
            .cache
            .as_ref()
            .and_then(|c| c.get::<Vec<RepositoryCandidate>>(CacheKind::Repository, &key))
        {
            self.console.status(StatusLevel::Info, "Using cached repository candidates");
            return Ok(candidates);
        }

        let candidates = self
            .retrier
            .run("discover_repositories", || {
                self.collaborators.discovery.discover(paper)
            })
            .await?;
        if let Some(cache) = self.cache.as_ref().filter(|_| !candidates.is_empty()) {
            cache.set(CacheKind::Repository, &key, &candidates);
        }
        Ok(candidates)
    }

    async fn analyze(
        &self,
        candidate: &RepositoryCandidate,
        repo: &Path,
    ) -> Result<RepositoryAnalysis> {
        if let Some(analysis) = self
            .cache
            .as_ref()
            .and_then(|c| c.get::<RepositoryAnalysis>(CacheKind::Analysis, &candidate.url))
        {
            self.console.status(StatusLevel::Info, "Using cached analysis");
            return Ok(analysis);
        }

        let analysis = self.collaborators.analyzer.analyze(repo).await?;
        if let Some(cache) = &self.cache {
            cache.set(CacheKind::Analysis, &candidate.url, &analysis);
        }
        Ok(analysis)
    }

    async fn diagnosis_context(&self, environment: &EnvironmentDescriptor) -> DiagnosisContext {
        let gpu = self.gpu_probe.probe().await;
        DiagnosisContext {
            gpu_available: Some(gpu.available()),
            python_version: self.python_version(environment).await,
            docker_available: self.runner.is_available("docker").await,
        }
    }

    /// Version reported by the environment's interpreter, if it has one
    async fn python_version(&self, environment: &EnvironmentDescriptor) -> Option<String> {
        let interpreter = environment.effective().interpreter.as_ref()?;
        let probe = SetupCommand::new(interpreter.to_string_lossy(), TOOL_PROBE_TIMEOUT)
            .arg("--version");
        let output = self.runner.run(&probe).await.ok().filter(|o| o.success())?;
        [&output.stdout, &output.stderr]
            .iter()
            .find_map(|text| text.trim().strip_prefix("Python "))
            .map(str::to_string)
    }

    /// Stamp, persist and summarize the report
    fn finish(&self, mut run: RunState, clock: Instant) -> RunReport {
        run.report.finished_at = Some(Utc::now());
        run.report.elapsed_seconds = clock.elapsed().as_secs_f64();

        let report_path = run.session.report();
        if !run.report.halted() {
            let data = json!({ "reportPath": &report_path, "success": run.report.success });
            if let Err(Halt(reason)) = run.complete(Stage::Reported, &data) {
                tracing::warn!(reason = %reason, "could not mark run as reported");
            }
        }

        match repro_utils::write_json_atomic(&report_path, &run.report) {
            Ok(()) => tracing::info!(path = %report_path.display(), "report saved"),
            Err(e) => tracing::error!(path = %report_path.display(), error = %e, "failed to save report"),
        }

        if run.report.success {
            self.console
                .status(StatusLevel::Success, "Reproduction completed successfully");
        } else {
            self.console.status(StatusLevel::Failure, "Reproduction failed");
        }
        self.console.status(
            StatusLevel::Info,
            &format!("Elapsed: {:.1}s", run.report.elapsed_seconds),
        );
        self.console.status(
            StatusLevel::Info,
            &format!("Report saved to: {}", report_path.display()),
        );

        run.report
    }
}
