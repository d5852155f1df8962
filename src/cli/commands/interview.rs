//! `marginalia interview`

use anyhow::{Context, Result};
use marginalia_config::Config;
use marginalia_interview::{InterviewEngine, InterviewOptions, ProjectMetadata};
use marginalia_llm::ChatBackend;
use marginalia_utils::write_file_atomic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::cli::args::InterviewArgs;
use crate::error_report::{contextual_report, report_anyhow};
use crate::exit_codes::ExitCode;
use crate::session::{SessionOutcome, run_session};

/// First user turn when none is configured. The session CLI backend refuses
/// to run without a user message, so the terminal always sends one.
pub const DEFAULT_KICKOFF_MESSAGE: &str =
    "Hi! I'm ready to describe my project. Please ask your first question.";

pub fn execute(config: &Config, args: InterviewArgs) -> Result<(), ExitCode> {
    let root = match args.root.clone() {
        Some(root) => root,
        None => std::env::current_dir().map_err(|err| {
            eprintln!("✗ Cannot determine the current directory: {err}");
            ExitCode::INTERNAL
        })?,
    };
    let output = resolve_output(config, &root, args.output.as_deref());

    let mut options = InterviewOptions::from_config(config).map_err(|err| {
        eprintln!("{}", contextual_report(&err, "interview"));
        ExitCode::CONFIG
    })?;
    if options.kickoff_message.is_none() {
        options.kickoff_message = Some(DEFAULT_KICKOFF_MESSAGE.to_string());
    }

    let backend: Arc<dyn ChatBackend> = match marginalia_llm::from_config(config) {
        Ok(backend) => Arc::from(backend),
        Err(err) => {
            eprintln!("{}", contextual_report(&err, "interview"));
            return Err(ExitCode::from(&err));
        }
    };

    let metadata = ProjectMetadata::new(args.name, root, args.language, args.description);

    let runtime = tokio::runtime::Runtime::new().map_err(|err| {
        eprintln!("✗ Failed to create async runtime: {err}");
        ExitCode::INTERNAL
    })?;

    let auto_start = config.auto_start() && !args.no_auto_start;
    let outcome = runtime.block_on(interview(backend, metadata, options, auto_start));
    // A stdin read may still be parked on a blocking thread.
    runtime.shutdown_background();

    match outcome {
        Ok(SessionOutcome::Completed(document)) => {
            if let Err(err) = save(&output, &document) {
                eprintln!("{}", report_anyhow(&err, "interview"));
                return Err(ExitCode::INTERNAL);
            }
            println!("✓ Product description written to {}", output.display());
            Ok(())
        }
        Ok(SessionOutcome::Aborted) => {
            eprintln!("Interview abandoned; nothing was written.");
            Err(ExitCode::USER_ABORT)
        }
        Ok(SessionOutcome::InputClosed) => {
            eprintln!("Input closed before the interview finished; nothing was written.");
            Err(ExitCode::USER_ABORT)
        }
        Err(err) => {
            eprintln!("{}", report_anyhow(&err, "interview"));
            Err(ExitCode::INTERNAL)
        }
    }
}

async fn interview(
    backend: Arc<dyn ChatBackend>,
    metadata: ProjectMetadata,
    options: InterviewOptions,
    auto_start: bool,
) -> Result<SessionOutcome> {
    info!(
        project = %metadata.name(),
        provider = backend.provider(),
        "starting interview"
    );
    let engine = InterviewEngine::new(backend, metadata, options)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let outcome = tokio::select! {
        outcome = run_session(&engine, stdin, &mut stdout, auto_start) => outcome,
        _ = tokio::signal::ctrl_c() => Ok(SessionOutcome::Aborted),
    };
    engine.shutdown();
    outcome
}

fn resolve_output(config: &Config, root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => root.join(config.output_file()),
    }
}

fn save(path: &Path, document: &str) -> Result<()> {
    write_file_atomic(path, document)
        .with_context(|| format!("Failed to write {}", path.display()))
}
