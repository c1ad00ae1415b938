use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use loadrun::args::{CliArgs, Command, RunArgs, TargetArgs, ValidateArgs};
use loadrun::config::Settings;
use loadrun::domain::{
    DefinitionId, RunId, TestDefinition, TestReport, TestRun, TimeSeriesPoint,
};
use loadrun::error::{AppError, AppResult, ValidationError};
use loadrun::executor::{HttpExecutor, HttpExecutorSettings};
use loadrun::orchestrator::{OrchestratorSettings, RunOrchestrator};
use loadrun::repository::{InMemoryAllowedTargets, RunRepositories};
use loadrun::summary;
use loadrun::target::{SystemResolver, TargetValidator};

use crate::shutdown::{ShutdownSender, setup_signal_shutdown_handler, shutdown_channel};

#[derive(Serialize)]
struct RunOutput<'a> {
    run: &'a TestRun,
    report: &'a TestReport,
    time_series: &'a [TimeSeriesPoint],
}

pub(crate) fn run() -> AppResult<()> {
    let args = CliArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(ValidationError::RuntimeBuildFailed { source: err }))?;

    runtime.block_on(run_async(args))
}

async fn run_async(args: CliArgs) -> AppResult<()> {
    let settings = Settings::load(args.config.as_deref())?;
    match args.command {
        Command::Run(run_args) => run_load(&settings, run_args).await,
        Command::Validate(validate_args) => validate_target(&settings, &validate_args).await,
    }
}

fn build_validator(settings: &Settings, targets: &TargetArgs) -> TargetValidator {
    let hosts = settings
        .allowed_hosts
        .iter()
        .chain(&targets.allow_hosts)
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty());
    let ports = settings
        .allowed_ports
        .iter()
        .chain(&targets.allow_ports)
        .copied();
    TargetValidator::new(
        Arc::new(InMemoryAllowedTargets::new(hosts)),
        ports,
        Arc::new(SystemResolver),
    )
}

async fn validate_target(settings: &Settings, args: &ValidateArgs) -> AppResult<()> {
    let validator = build_validator(settings, &args.targets);
    let result = validator.validate(&args.url).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summary::validation_line(&args.url, &result));
    }
    if result.allowed {
        Ok(())
    } else {
        Err(AppError::validation(ValidationError::TargetBlocked))
    }
}

async fn run_load(settings: &Settings, args: RunArgs) -> AppResult<()> {
    let sample_interval = args
        .sample_interval_ms
        .map_or(settings.sample_interval, |ms| Duration::from_millis(ms.get()));
    let request_timeout = args
        .request_timeout_ms
        .map_or(settings.request_timeout, |ms| Duration::from_millis(ms.get()));

    let repositories = RunRepositories::in_memory();
    for definition in &settings.definitions {
        repositories.definitions.save(definition.clone()).await?;
    }
    let definition_id = match (args.url, args.definition) {
        (Some(url), _) => {
            let definition = TestDefinition::new(
                url,
                args.virtual_users.get(),
                args.duration.as_secs(),
            );
            repositories.definitions.save(definition).await?
        }
        (None, Some(id)) => id,
        (None, None) => return Err(AppError::validation(ValidationError::MissingTarget)),
    };

    let executor = HttpExecutor::new(HttpExecutorSettings {
        request_timeout,
        ..HttpExecutorSettings::default()
    });
    let orchestrator = RunOrchestrator::new(
        repositories,
        Arc::new(build_validator(settings, &args.targets)),
        Arc::new(executor),
        OrchestratorSettings { sample_interval },
    );

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let outcome = drive_run(
        &orchestrator,
        definition_id,
        &shutdown_tx,
        sample_interval,
        args.json,
    )
    .await;
    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        warn!("Signal handler task failed: {}", err);
    }
    outcome
}

async fn drive_run(
    orchestrator: &RunOrchestrator,
    definition_id: DefinitionId,
    shutdown_tx: &ShutdownSender,
    sample_interval: Duration,
    json: bool,
) -> AppResult<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let run_id = orchestrator.start(definition_id).await?;

    let mut ticker = tokio::time::interval(sample_interval);
    let mut printed = 0usize;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!(run_id = %run_id, "Shutdown requested, stopping run");
                orchestrator.stop(run_id).await?;
                break;
            }
            _ = ticker.tick() => {
                if !json {
                    printed = print_progress(orchestrator, run_id, printed).await?;
                }
                if !orchestrator.status(run_id).await?.is_running() {
                    break;
                }
            }
        }
    }

    let view = orchestrator.view(run_id).await?;
    let points = orchestrator.time_series_points(run_id).await?;
    if json {
        let output = RunOutput {
            run: &view.run,
            report: &view.report,
            time_series: &points,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in summary::summary_lines(&view) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn print_progress(
    orchestrator: &RunOrchestrator,
    run_id: RunId,
    printed: usize,
) -> AppResult<usize> {
    let points = orchestrator.time_series_points(run_id).await?;
    for point in points.iter().skip(printed) {
        println!("{}", summary::progress_line(point));
    }
    Ok(points.len().max(printed))
}
