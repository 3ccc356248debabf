use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use github::GitHubClient;
use openrouter::OpenRouterClient;
use orchestrator::{HttpEvaluationSink, HttpSiteProbe, Services, TaskOrchestrator};
use server::config::{ServiceConfig, DEFAULT_CONFIG_FILE};
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pages-deployer")]
#[command(about = "Generate single-page apps with an LLM and publish them to GitHub Pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the configuration and print it without secrets
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(&cli.config, port).await,
        Some(Commands::CheckConfig) => check_config(&cli.config),
        None => serve(&cli.config, None).await,
    }
}

fn load_config(path: &Path) -> Result<ServiceConfig> {
    let config = ServiceConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.validate().context("Configuration is incomplete")?;
    Ok(config)
}

fn build_orchestrator(config: &ServiceConfig) -> Result<TaskOrchestrator> {
    let github = Arc::new(
        GitHubClient::new(&config.github.token, config.github_config())
            .context("Failed to create GitHub client")?,
    );
    let model = OpenRouterClient::new(
        config.llm.api_key.clone(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.generation_timeout(),
    )
    .context("Failed to create OpenRouter client")?;
    let probe =
        HttpSiteProbe::new(config.http_timeout()).context("Failed to create site probe")?;
    let sink = HttpEvaluationSink::new(config.http_timeout())
        .context("Failed to create notification client")?;

    let services = Services {
        store: github.clone(),
        pages: github,
        model: Arc::new(model),
        probe: Arc::new(probe),
        sink: Arc::new(sink),
    };

    Ok(TaskOrchestrator::new(services, config.workflow_config()))
}

async fn serve(config_path: &Path, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("GitHub owner: {}", config.github.owner);
    tracing::info!("Model: {} via {}", config.llm.model, config.llm.base_url);

    let orchestrator = Arc::new(build_orchestrator(&config)?);
    let state = AppState::new(orchestrator, &config.server.secret);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    println!();
    println!("Pages Deployer");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://localhost:{}", config.server.port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", config.server.port);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

fn check_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;

    println!("Configuration OK ({})", config_path.display());
    println!();
    println!("{}", rendered);

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pages_deployer=info,server=info,orchestrator=info,tower_http=info".into()),
        )
        .init();
}
