use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wykra_analysis::AnalysisOrchestrator;
use wykra_core::{AppConfig, LlmBackend};

#[derive(Debug, Parser)]
#[command(name = "wykra-cli")]
#[command(about = "Wykra profile insight command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one Instagram profile and print the insight as JSON
    Analyze {
        /// Profile handle, with or without a leading `@`
        handle: String,
        /// Model identifier, overriding `WYKRA_LLM_MODEL`
        #[arg(long)]
        model: Option<String>,
        /// LLM backend (openrouter, openai or anthropic), overriding `WYKRA_LLM_BACKEND`
        #[arg(long)]
        backend: Option<LlmBackend>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            handle,
            model,
            backend,
        } => {
            let mut config = wykra_core::load_app_config_with_backend(backend)?;
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();

            apply_model_override(&mut config, model);
            run_analyze(&config, &handle).await
        }
    }
}

/// Applies `--model`; a blank value keeps the configured model.
fn apply_model_override(config: &mut AppConfig, model: Option<String>) {
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        config.llm_model = model;
    }
}

async fn run_analyze(config: &AppConfig, handle: &str) -> anyhow::Result<()> {
    let orchestrator = AnalysisOrchestrator::from_config(config)?;
    tracing::info!(
        handle,
        backend = %config.llm_backend,
        model = %config.llm_model,
        "running analysis"
    );
    let insight = orchestrator.analyze(handle).await?;
    println!("{}", serde_json::to_string_pretty(&insight)?);
    Ok(())
}
