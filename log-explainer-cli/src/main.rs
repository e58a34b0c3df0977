//! log-explainer: explain a log with the AI log explainer API
//!
//! Reads a log from a file, stdin or a canned sample, streams the analysis
//! from the backend and prints the result. Ctrl-C cancels the request.

mod observer;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use log_explainer_sdk::capture::{self, CaptureSurface};
use log_explainer_sdk::config::{self, ExplainerConfig, ServiceConfig};
use log_explainer_sdk::export::{self, ExportFormat};
use log_explainer_sdk::render::{self, ViewMode};
use log_explainer_sdk::util::{format_duration, parse_duration};
use log_explainer_sdk::{
    AnalysisOutcome, AnalysisResult, AnalysisSession, AnalyzeOptions, ClientBuilder,
    ServiceClient,
};

use observer::{print_error, TerminalObserver};

/// Explain a log with the AI log explainer API
#[derive(Parser, Debug)]
#[command(name = "log-explainer", version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    log-explainer app.log\n    kubectl logs deploy/api | log-explainer --context \"after deploy\"\n    log-explainer --sample db-timeout --export-md\n\nENVIRONMENT:\n    LOG_EXPLAINER_API_URL, LOG_EXPLAINER_TIMEOUT_SECONDS,\n    LOG_EXPLAINER_PREFER_STREAM, LOG_EXPLAINER_REDACT, RUST_LOG"
)]
struct Cli {
    /// Log file to analyze; stdin is read when omitted
    file: Option<PathBuf>,

    /// Free-form context sent with the log
    #[arg(long, short = 'c')]
    context: Option<String>,

    /// Analyze a canned sample log
    #[arg(long, conflicts_with = "file")]
    sample: Option<String>,

    /// List the canned sample logs
    #[arg(long)]
    list_samples: bool,

    /// Mask secrets before sending
    #[arg(long)]
    redact: bool,

    /// Print the raw view instead of the pretty view
    #[arg(long)]
    raw: bool,

    /// Skip the streaming transport
    #[arg(long)]
    no_stream: bool,

    /// API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Overall deadline, e.g. 90s or 2m; 0 disables it
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Retry a failed analysis up to N times
    #[arg(long, value_name = "N", default_value_t = 0)]
    retries: u32,

    /// Save the result as JSON (default name when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    export_json: Option<Option<PathBuf>>,

    /// Save the result as Markdown (default name when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    export_md: Option<Option<PathBuf>>,

    /// Print the outcome as JSON on stdout
    #[arg(long, short = 'j')]
    json: bool,

    /// Check that the backend is up and exit
    #[arg(long)]
    health: bool,

    /// Hide progress output
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn parse_timeout(value: &str) -> std::result::Result<Duration, String> {
    parse_duration(value).ok_or_else(|| format!("invalid duration: {}", value))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_samples {
        for sample in capture::SAMPLES {
            println!("{:<14} {}", sample.name, sample.title);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    let client = ClientBuilder::from_config(&config)
        .build()
        .context("failed to create API client")?;

    if cli.health {
        let healthy = client.health_check().await.unwrap_or_else(|e| {
            warn!("Health check failed: {}", e);
            false
        });
        println!(
            "{} {}",
            client.base_url(),
            if healthy { "ok" } else { "unavailable" }
        );
        return Ok(if healthy {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let surface = capture_input(&cli)?;
    if !surface.can_submit() {
        bail!("nothing to analyze: the log is empty");
    }

    let options = analyze_options(&cli, &config);
    debug!("Analyze options: {:?}", options);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let request = surface.to_request(false);
    let mut session = AnalysisSession::new();
    let mut observer = TerminalObserver::new(!cli.quiet && !cli.json);

    let started = Instant::now();
    let mut attempt = 0;
    let outcome = loop {
        let stop_ticker = CancellationToken::new();
        let ticker = observer.spawn_loading_ticker(stop_ticker.clone());

        let outcome = client
            .analyze(&request, &options, &mut session, &mut observer, &cancel)
            .await;

        stop_ticker.cancel();
        if let Some(ticker) = ticker {
            let _ = ticker.await;
        }

        match &outcome {
            AnalysisOutcome::Failed(error) if attempt < cli.retries => {
                attempt += 1;
                warn!("Attempt {} failed: {}", attempt, error.title);
                observer.retrying(attempt, cli.retries);
            }
            _ => break outcome,
        }
    };
    info!("Analysis finished in {}", format_duration(started.elapsed()));

    match outcome {
        AnalysisOutcome::Completed(result) => {
            write_exports(&cli, &result)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let mode = if cli.raw { ViewMode::Raw } else { ViewMode::Pretty };
                println!("{}", render::render(&result, mode));
            }
            Ok(ExitCode::SUCCESS)
        }
        AnalysisOutcome::Failed(error) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&error)?);
            } else {
                print_error(&error);
            }
            Ok(ExitCode::from(1))
        }
        AnalysisOutcome::Cancelled => {
            if !session.partial_output().is_empty() && !cli.json {
                println!("{}", session.partial_output());
            }
            Ok(ExitCode::from(130))
        }
        AnalysisOutcome::Skipped => bail!("nothing to analyze: the log is empty"),
    }
}

fn load_config(cli: &Cli) -> Result<ExplainerConfig> {
    let mut config = ExplainerConfig::from_provider(&**config::DEFAULT_PROVIDER)
        .context("invalid LOG_EXPLAINER_* configuration")?;

    if let Some(url) = &cli.api_url {
        config.base_url = url.trim().trim_end_matches('/').to_string();
        config.validate().context("invalid --api-url")?;
    }

    Ok(config)
}

fn analyze_options(cli: &Cli, config: &ExplainerConfig) -> AnalyzeOptions {
    let mut options = config.analyze_options();

    if cli.redact {
        options.redact = true;
    }
    if cli.no_stream {
        options.prefer_stream = false;
    }
    if let Some(timeout) = cli.timeout {
        options.timeout = (!timeout.is_zero()).then_some(timeout);
    }

    options
}

fn capture_input(cli: &Cli) -> Result<CaptureSurface> {
    let mut surface = CaptureSurface::new();

    if let Some(name) = &cli.sample {
        let sample = surface.load_sample(name)?;
        info!("Loaded sample '{}': {}", sample.name, sample.title);
    } else if let Some(path) = &cli.file {
        surface.load_file(path)?;
    } else if !io::stdin().is_terminal() {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read log from stdin")?;
        surface.load_bytes(&bytes);
    } else {
        bail!("no log given: pass a file, pipe a log on stdin, or use --sample");
    }

    if let Some(context) = &cli.context {
        surface.set_context(context.as_str());
    }

    Ok(surface)
}

fn write_exports(cli: &Cli, result: &AnalysisResult) -> Result<()> {
    let targets = [
        (&cli.export_json, ExportFormat::Json),
        (&cli.export_md, ExportFormat::Markdown),
    ];

    for (target, format) in targets {
        if let Some(path) = target {
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(export::default_file_name(format)));
            export::write_export(result, format, &path)
                .with_context(|| format!("failed to save {} export", format))?;
            eprintln!("Saved {} to {}", format, path.display());
        }
    }

    Ok(())
}
