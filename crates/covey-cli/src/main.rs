mod config;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use covey_agent::LlmClient;
use covey_orchestrator::{AnalysisKind, Swarm, WorkItem};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "covey", version, about = "Covey: multi-agent analysis swarm")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "covey.toml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a target with the agent swarm
    Run {
        /// What to analyze, e.g. a repository name or path
        #[arg(short, long)]
        target: String,
        /// Free-text request passed to every agent
        #[arg(short, long, default_value = "")]
        description: String,
        /// File whose contents are attached as context
        #[arg(long)]
        context_file: Option<PathBuf>,
        /// Comma-separated analysis kinds (default: all)
        #[arg(short, long, value_delimiter = ',')]
        kinds: Vec<AnalysisKind>,
        /// Override swarm.max_concurrency
        #[arg(long)]
        max_concurrency: Option<usize>,
        /// Print the run and metrics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured agents
    Agents,
    /// List analysis kinds and their priorities
    Kinds,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            target,
            description,
            context_file,
            kinds,
            max_concurrency,
            json,
        } => {
            let mut swarm_config = config.swarm.clone();
            if let Some(limit) = max_concurrency {
                swarm_config.max_concurrency = limit;
            }

            let backend = LlmClient::new(config.backend.resolve()?);
            let swarm = Swarm::new(config.registry()?, Arc::new(backend), swarm_config)?;

            let mut item = WorkItem::new(target, description);
            if let Some(path) = context_file {
                let context = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read context file '{}'", path.display()))?;
                item = item.with_context(context);
            }

            let kinds = if kinds.is_empty() {
                AnalysisKind::ALL.to_vec()
            } else {
                kinds
            };

            info!(analysis_target = %item.target, kinds = kinds.len(), "Submitting run");
            let run = swarm.submit_run(item, kinds).await?;
            let metrics = swarm.metrics();

            if json {
                let out = serde_json::json!({
                    "run": run,
                    "metrics": metrics.to_json(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", report::render(&run, &metrics));
            }
        }
        Commands::Agents => {
            let registry = config.registry()?;
            println!("Registered agents:");
            for agent in registry.agents() {
                let kinds: Vec<String> = agent.capabilities.iter().map(ToString::to_string).collect();
                println!("  {} ({})", agent.id, agent.name);
                if !agent.description.is_empty() {
                    println!("    {}", agent.description);
                }
                println!(
                    "    model: {} (max_tokens {}, temperature {})",
                    agent.model.model_id, agent.model.max_tokens, agent.model.temperature
                );
                println!("    kinds: {}", kinds.join(", "));
            }
            println!("\nTotal: {} agent(s)", registry.len());
        }
        Commands::Kinds => {
            for kind in AnalysisKind::ALL {
                println!("  {:<14} priority {}", kind.to_string(), kind.priority());
            }
        }
    }

    Ok(())
}
