use anyhow::{Context, Result};
use dragnet::cli::commands::{
    HistoryCommand, ResumeCommand, RunCommand, SearchArgs, ShowCommand, StepsCommand, StreamCommand, ValidateCommand,
};
use dragnet::cli::output::*;
use dragnet::cli::{Cli, Command};
use dragnet::connector::{ConnectorRegistry, FixtureSource};
use dragnet::core::{ExecutionStatus, PipelineConfig, PipelineResult, Settings};
use dragnet::delivery::{ErrorResponse, PipelineService, RunStream, StepsResponse};
use dragnet::error::PipelineError;
use dragnet::execution::{ExecutionEvent, PipelineEngine};
use dragnet::persistence::{InMemoryStore, ResultStore};
use std::sync::Arc;
use tracing::{warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    init_logging(cli.verbose)?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(&cli, &settings, cmd).await?,
        Command::Stream(cmd) => stream_pipeline(&cli, &settings, cmd).await?,
        Command::Show(cmd) => show_pipeline(&cli, &settings, cmd).await?,
        Command::Steps(cmd) => show_steps(&cli, &settings, cmd).await?,
        Command::Resume(cmd) => resume_pipeline(&cli, &settings, cmd).await?,
        Command::History(cmd) => show_history(&cli, &settings, cmd).await?,
        Command::Validate(cmd) => validate_settings(&cli, &settings, cmd)?,
    }

    Ok(())
}

/// `DRAGNET_LOG` takes an env-filter directive; otherwise INFO, or DEBUG with `--verbose`
fn init_logging(verbose: bool) -> Result<()> {
    let installed = match std::env::var("DRAGNET_LOG") {
        Ok(directive) => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(EnvFilter::new(directive))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        Err(_) => {
            let log_level = if verbose { Level::DEBUG } else { Level::INFO };
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };
    installed.context("Failed to set logging subscriber")
}

fn load_registry(cli: &Cli, settings: &Settings) -> Result<ConnectorRegistry> {
    let source = match cli.fixtures.as_ref().or(settings.sources.fixtures.as_ref()) {
        Some(path) => FixtureSource::from_file(path)?,
        None => {
            warn!("No record source configured; every search will return no matches");
            FixtureSource::default()
        }
    };
    Ok(ConnectorRegistry::with_source(Arc::new(source)))
}

async fn open_store(cli: &Cli, settings: &Settings) -> Result<Arc<dyn ResultStore>> {
    if cli.no_history {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    history_store(settings).await
}

#[cfg(feature = "sqlite")]
async fn history_store(settings: &Settings) -> Result<Arc<dyn ResultStore>> {
    use dragnet::persistence::SqliteResultStore;

    let path = settings
        .storage
        .database_path
        .clone()
        .unwrap_or_else(SqliteResultStore::default_path);
    let store = SqliteResultStore::open(&path)
        .await
        .with_context(|| format!("Failed to open history database {}", path.display()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn history_store(_settings: &Settings) -> Result<Arc<dyn ResultStore>> {
    warn!("Built without sqlite support; history is kept in memory");
    Ok(Arc::new(InMemoryStore::new()))
}

/// Service for commands that only read saved runs
async fn read_only_service(cli: &Cli, settings: &Settings) -> Result<PipelineService> {
    let engine = PipelineEngine::new(Arc::new(ConnectorRegistry::new()));
    Ok(PipelineService::new(Arc::new(engine), open_store(cli, settings).await?, settings))
}

fn search_config(service: &PipelineService, args: &SearchArgs) -> PipelineConfig {
    let defaults = service.defaults();
    let max_depth = args.max_depth.unwrap_or(defaults.max_depth);
    let skip_duplicates = defaults.skip_duplicates && !args.allow_duplicates;

    let mut config = PipelineConfig::new(&args.query, max_depth, skip_duplicates, defaults);
    if !args.domains.is_empty() {
        config.available_domains = args.domains.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_steps = concurrency;
    }
    if let Some(delay) = args.delay_ms {
        config.delay_between_steps = std::time::Duration::from_millis(delay);
    }
    config
}

fn fail(err: &PipelineError, json: bool) -> ! {
    if json {
        if let Ok(body) = serde_json::to_string_pretty(&ErrorResponse::from(err)) {
            println!("{}", body);
        }
    } else {
        println!("{}{}", CROSS, style(err).red());
    }
    std::process::exit(1);
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).context("Invalid pipeline ID format")
}

async fn run_pipeline(cli: &Cli, settings: &Settings, cmd: &RunCommand) -> Result<()> {
    let registry = Arc::new(load_registry(cli, settings)?);

    let spinner = create_spinner();
    let progress = spinner.clone();
    let engine = PipelineEngine::new(registry).with_event_handler(move |event| match event {
        ExecutionEvent::StepStarted(step) => {
            progress.set_message(format!("{} {:?}", step.domain_type, step.search_parameter));
        }
        ExecutionEvent::Step(_) => progress.inc(1),
        _ => {}
    });

    let service = PipelineService::new(Arc::new(engine), open_store(cli, settings).await?, settings);
    let config = search_config(&service, &cmd.search);

    let pipeline_id = match service.start_with(config) {
        Ok(id) => id,
        Err(e) => {
            spinner.finish_and_clear();
            fail(&e, cmd.search.json);
        }
    };
    spinner.println(format!("{}Started run {}", ROCKET, style(pipeline_id).dim()));

    let result = service.wait(pipeline_id).await;
    spinner.finish_and_clear();
    let result = match result {
        Ok(result) => result,
        Err(e) => fail(&e, cmd.search.json),
    };

    // The snapshot is what a poller would see; fall back to the in-memory result
    let snapshot = match service.poll(pipeline_id).await {
        Ok(response) => response.data,
        Err(e) => {
            println!("{}{}", WARN, style(&e).yellow());
            result
        }
    };

    if cmd.search.json {
        println!("{}", serde_json::to_string_pretty(&dragnet::delivery::PollResponse::new(snapshot))?);
    } else {
        print_result(&snapshot);
    }

    Ok(())
}

async fn stream_pipeline(cli: &Cli, settings: &Settings, cmd: &StreamCommand) -> Result<()> {
    let registry = Arc::new(load_registry(cli, settings)?);
    let service = PipelineService::new(
        Arc::new(PipelineEngine::new(registry)),
        open_store(cli, settings).await?,
        settings,
    );

    let config = search_config(&service, &cmd.search);
    let RunStream {
        pipeline_id,
        mut events,
        handle,
    } = match service.stream_with(config) {
        Ok(stream) => stream,
        Err(e) => fail(&e, cmd.search.json),
    };

    let mut steps_seen = 0;
    while let Some(event) = events.recv().await {
        if cmd.search.json {
            println!("{}", serde_json::to_string(&event)?);
        } else if let Some(line) = format_event(&event) {
            println!("{}", fit_to_terminal(&line));
        }

        if matches!(event, ExecutionEvent::Step(_)) {
            steps_seen += 1;
            if cmd.take.is_some_and(|limit| steps_seen >= limit) {
                break;
            }
        }
    }
    drop(events);

    let result = handle.await.context("Streaming run task failed")?;
    if result.status == ExecutionStatus::Cancelled && !cmd.search.json {
        println!(
            "{}Stopped after {} steps; continue with `dragnet resume {}`",
            WARN, steps_seen, pipeline_id
        );
    }

    Ok(())
}

async fn show_pipeline(cli: &Cli, settings: &Settings, cmd: &ShowCommand) -> Result<()> {
    let service = read_only_service(cli, settings).await?;
    let pipeline_id = parse_id(&cmd.pipeline_id)?;

    match service.poll(pipeline_id).await {
        Ok(response) if cmd.json => println!("{}", serde_json::to_string_pretty(&response)?),
        Ok(response) => print_result(&response.data),
        Err(e) => fail(&e, cmd.json),
    }

    Ok(())
}

async fn show_steps(cli: &Cli, settings: &Settings, cmd: &StepsCommand) -> Result<()> {
    let service = read_only_service(cli, settings).await?;
    let pipeline_id = parse_id(&cmd.pipeline_id)?;

    let response = match service.list_steps(pipeline_id).await {
        Ok(response) => response,
        Err(e) => fail(&e, cmd.json),
    };

    let steps = match cmd.depth {
        Some(depth) => response.steps.into_iter().filter(|s| s.depth == depth).collect(),
        None => response.steps,
    };
    let response = StepsResponse::new(pipeline_id, steps);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}{} steps", INFO, style(response.count).cyan());
        for step in &response.steps {
            println!("  {}", fit_to_terminal(&format_step(step)));
            for (category, keywords) in &step.keywords_per_category {
                println!("      {} {}", style(category).dim(), keywords.join(", "));
            }
        }
    }

    Ok(())
}

async fn resume_pipeline(cli: &Cli, settings: &Settings, cmd: &ResumeCommand) -> Result<()> {
    let registry = Arc::new(load_registry(cli, settings)?);
    let service = PipelineService::new(
        Arc::new(PipelineEngine::new(registry)),
        open_store(cli, settings).await?,
        settings,
    );
    let pipeline_id = parse_id(&cmd.pipeline_id)?;

    let result = match service.resume_run(pipeline_id).await {
        Ok(id) => service.wait(id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(result) => print_result(&result),
        Err(e) => fail(&e, false),
    }

    Ok(())
}

async fn show_history(cli: &Cli, settings: &Settings, cmd: &HistoryCommand) -> Result<()> {
    let service = read_only_service(cli, settings).await?;
    let runs = match service.history(cmd.limit).await {
        Ok(runs) => runs,
        Err(e) => fail(&e, cmd.json),
    };

    if cmd.json {
        let data = serde_json::json!({ "success": true, "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("{}No runs found", INFO);
        return Ok(());
    }

    println!("{}Run history (showing latest {}):", INFO, cmd.limit);
    for summary in &runs {
        println!("  {}", fit_to_terminal(&format_summary(summary)));
    }

    Ok(())
}

fn validate_settings(cli: &Cli, settings: &Settings, cmd: &ValidateCommand) -> Result<()> {
    println!("{}Validating settings...", INFO);

    if let Err(e) = settings.validate() {
        println!("{}Validation failed:", CROSS);
        println!("  {}", style(format!("{:#}", e)).red());
        std::process::exit(1);
    }

    let fixtures = cli.fixtures.as_ref().or(settings.sources.fixtures.as_ref());
    if let Some(path) = fixtures {
        match FixtureSource::from_file(path) {
            Ok(source) => println!("  Fixtures: {} ({} entries)", style(path.display()).bold(), style(source.len()).cyan()),
            Err(e) => {
                println!("{}Invalid fixtures:", CROSS);
                println!("  {}", style(format!("{:#}", e)).red());
                std::process::exit(1);
            }
        }
    }

    let defaults = &settings.defaults;
    println!("{}Settings are valid!", CHECK);
    println!("  Max depth: {}", style(defaults.max_depth).cyan());
    println!("  Concurrency: {}", style(defaults.max_concurrent_steps).cyan());
    println!(
        "  Domains: {}",
        defaults
            .available_domains
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if cmd.json {
        println!("\n{}", serde_json::to_string_pretty(settings)?);
    }

    Ok(())
}

fn print_result(result: &PipelineResult) {
    println!("{}Pipeline {}", INFO, style(result.id).cyan());
    println!("  Query: {}", style(&result.config.query).bold());
    println!("  Status: {}", format_status(result.status));
    println!("  Started: {}", style(result.started_at.to_rfc3339()).dim());
    if let Some(completed) = result.completed_at {
        if let Ok(duration) = completed.signed_duration_since(result.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }

    println!();
    for step in &result.steps {
        println!("  {}", fit_to_terminal(&format_step(step)));
    }

    println!("\n{}", format_summary(&result.summary()));
}
