use super::RunArgs;
use crate::sources::{FileAnalyzer, FileDiscovery, JsonPaperSource, PromptChooser};
use repro_config::Settings;
use repro_core::{
    ConsoleSink, EnvironmentPreference, Error, Result, TerminalConsole, EXIT_FAILURE,
    EXIT_INTERRUPTED, EXIT_SUCCESS,
};
use repro_env::SystemRunner;
use repro_pipeline::{Collaborators, GitFetcher, Pipeline, RunReport, RunRequest};
use std::sync::Arc;
use std::time::Duration;

/// Clone timeout for the git fetcher
const CLONE_TIMEOUT: Duration = Duration::from_secs(600);

pub async fn execute(mut settings: Settings, args: RunArgs) -> Result<i32> {
    let request = build_request(&mut settings, &args)?;
    tracing::info!(paper = %args.paper.display(), "starting reproduction run");

    let collaborators = Collaborators {
        metadata: Arc::new(JsonPaperSource),
        discovery: Arc::new(FileDiscovery::new(args.candidates.clone())),
        fetcher: Arc::new(GitFetcher::new(Arc::new(SystemRunner::new()), CLONE_TIMEOUT)),
        analyzer: Arc::new(FileAnalyzer::new(args.analysis.clone())),
        chooser: Some(Arc::new(PromptChooser)),
    };
    let console: Arc<dyn ConsoleSink> = Arc::new(TerminalConsole::new());
    let pipeline = Pipeline::new(settings, collaborators, console);

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    match pipeline.run_until(&request, interrupt).await {
        Ok(report) => Ok(exit_code(&report)),
        Err(Error::Interrupted) => {
            eprintln!("Interrupted");
            Ok(EXIT_INTERRUPTED)
        }
        Err(e) => Err(e),
    }
}

fn exit_code(report: &RunReport) -> i32 {
    if report.interrupted {
        EXIT_INTERRUPTED
    } else if report.success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// Fold command-line flags into the settings and the run request
pub(crate) fn build_request(settings: &mut Settings, args: &RunArgs) -> Result<RunRequest> {
    if args.no_cache {
        settings.use_cache = false;
    }

    let mut request = RunRequest::new(args.paper.to_string_lossy());
    if let Some(command) = &args.command {
        request = request.command(command);
    }
    if let Some(minutes) = args.timeout {
        request = request.timeout(Duration::from_secs(minutes.saturating_mul(60)));
    }
    if let Some(env) = &args.environment {
        request = request.environment(env.parse::<EnvironmentPreference>()?);
    }
    if args.interactive {
        request = request.interactive(true);
    }
    if let Some(dir) = &args.data_dir {
        request = request.data_dir(dir);
    }
    Ok(request)
}
