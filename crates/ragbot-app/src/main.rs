mod backend;
mod catalog;
mod cli;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use ragbot_common::{ConfigError, RagbotError};
use ragbot_config::RagbotConfig;
use ragbot_slack::{AppState, MessageSink, SlackBridge, SlackWebClient};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};
use crate::console::Console;

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the environment win.
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Current directory
        std::path::PathBuf::from(".env"),
        // Workspace root, two levels up from crates/ragbot-app/
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return;
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.strip_prefix("export ").map_or(key, str::trim);
            (key, value.trim().trim_matches('"').trim_matches('\''))
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn init_logging(args: &Args) {
    let filter = match args.log_level.as_deref() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(args.command.default_log_directive())),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Load .env file before anything else
    load_dotenv();

    let args = cli::parse();
    init_logging(&args);

    tracing::info!("ragbot v{} starting...", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run(args));
    // A stdin read left pending by an interrupted chat must not hold exit.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), RagbotError> {
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = ragbot_config::load_config(args.config.as_deref())?;

    match args.command {
        Command::Chat => chat(&config).await,
        Command::Ask { prompt } => ask(&config, &prompt).await,
        Command::Serve { port } => serve(config, port).await,
        Command::Models => {
            backend::require_vertex(&config)?;
            let client = backend::gemini_client(&config)?;
            catalog::list_models(&client, &mut std::io::stdout()).await
        }
        Command::Corpora => {
            backend::require_vertex(&config)?;
            let client = backend::gemini_client(&config)?;
            let configured = config.vertex.rag_corpus.as_deref();
            catalog::list_corpora(&client, configured, &mut std::io::stdout()).await
        }
    }
}

fn require_corpus(config: &RagbotConfig) -> Result<&str, ConfigError> {
    config.vertex.rag_corpus.as_deref().ok_or_else(|| {
        ConfigError::MissingSetting(format!(
            "RAG_CORPUS_NAME (e.g. projects/{}/locations/{}/ragCorpora/<id>)",
            config.vertex.project_id, config.vertex.location
        ))
    })
}

/// Ctrl-C notifications for the console; the handler stays installed so a
/// second press is delivered too.
fn interrupt_signal() -> Arc<Notify> {
    let notify = Arc::new(Notify::new());
    let tx = Arc::clone(&notify);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tx.notify_one();
        }
    });
    notify
}

async fn chat(config: &RagbotConfig) -> Result<(), RagbotError> {
    backend::require_vertex(config)?;
    let corpus = require_corpus(config)?;
    let orchestrator = Arc::new(backend::build_orchestrator(config)?);

    let mut console = Console::new(orchestrator, std::io::stdout()).with_interrupt(interrupt_signal());
    console.print_banner(&config.vertex.model, corpus)?;
    tracing::debug!(conversation = %console.key(), "Chat session started");
    console.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

async fn ask(config: &RagbotConfig, prompt: &str) -> Result<(), RagbotError> {
    backend::require_vertex(config)?;
    require_corpus(config)?;
    let orchestrator = Arc::new(backend::build_orchestrator(config)?);

    Console::new(orchestrator, std::io::stdout())
        .with_interrupt(interrupt_signal())
        .ask(prompt)
        .await
}

async fn serve(config: RagbotConfig, port: Option<u16>) -> Result<(), RagbotError> {
    let missing = config.slack.missing_settings();
    if !missing.is_empty() {
        return Err(ConfigError::MissingSetting(missing.join(", ")).into());
    }

    let orchestrator = Arc::new(backend::build_orchestrator(&config)?);
    let sink: Arc<dyn MessageSink> = Arc::new(SlackWebClient::new(&config.slack.bot_token));
    let bridge = Arc::new(SlackBridge::new(orchestrator, sink));
    let state = AppState::new(bridge, config.slack.signing_secret.clone())
        .with_default_channel(config.slack.default_channel.clone());

    let mut server = config.server.clone();
    if let Some(port) = port {
        server.port = port;
    }
    let addr = server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RagbotError::Other(format!("failed to bind {addr}: {e}")))?;

    ragbot_slack::serve(listener, state).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
