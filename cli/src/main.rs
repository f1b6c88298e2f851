use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskweave_core::config::{self, Config};
use taskweave_core::{
    AgentLoop, ContextBuilder, FileWriteTool, GraphScheduler, RunEvent, ToolRegistry,
    WebSearchTool, WorkflowGraph, create_provider, create_recorder, create_search,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod onboard;

#[derive(Parser)]
#[command(name = "taskweave")]
#[command(about = "taskweave - run agent workflow graphs", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.taskweave/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow graph and stream NDJSON events to stdout
    Run {
        /// Workflow JSON file, or `-` for stdin
        file: String,
    },
    /// Print the execution order of a workflow without running it
    Schedule {
        /// Workflow JSON file, or `-` for stdin
        file: String,
    },
    /// Run a single agent goal and print its result
    Agent {
        #[arg(short, long)]
        goal: String,

        /// Findings from earlier steps to hand to the agent
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Write a config file interactively
    Onboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None if cli.config.is_none() && !config::config_exists() => Commands::Onboard,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    if let Commands::Onboard = command {
        let onboard_config = onboard::run_onboard()?;
        return match &cli.config {
            Some(path) => config::save_to(&onboard_config, path),
            None => config::save_config(&onboard_config),
        };
    }

    let config = load(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    match command {
        Commands::Run { file } => run_workflow(&config, &file).await,
        Commands::Schedule { file } => print_schedule(&file).await,
        Commands::Agent { goal, context } => {
            run_agent(&config, &goal, context.as_deref().unwrap_or("")).await
        }
        Commands::Onboard => Ok(()),
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_from(path),
        None => Config::load_or_init(),
    }
}

/// Logs go to stderr; stdout is reserved for results.
fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_agent(config: &Config) -> Result<Arc<AgentLoop>> {
    let provider = create_provider(config)?;
    let search = create_search(&config.search);

    let tool_registry = Arc::new(ToolRegistry::new());
    tool_registry.register(Arc::new(WebSearchTool::new(search)));
    tool_registry.register(Arc::new(FileWriteTool::new(&config.output_dir)));

    let agent = AgentLoop::new(
        provider,
        ContextBuilder::new(&config.output_dir),
        tool_registry,
    )
    .with_model(config.model.clone())
    .with_temperature(config.temperature)
    .with_max_iterations(config.max_iterations)
    .with_call_timeout(config.call_timeout());

    Ok(Arc::new(agent))
}

async fn read_graph(file: &str) -> Result<WorkflowGraph> {
    let raw = if file == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read workflow from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read workflow from {}", file))?
    };

    serde_json::from_str(&raw).context("Workflow is not a valid graph document")
}

async fn run_workflow(config: &Config, file: &str) -> Result<()> {
    let graph = read_graph(file).await?;

    let mut scheduler = GraphScheduler::new(build_agent(config)?);
    if let Some(recorder) = create_recorder(&config.recorder) {
        scheduler = scheduler.with_recorder(recorder);
    }
    let scheduler = Arc::new(scheduler);

    let mut events = scheduler.stream(graph);
    let cancel = events.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current node");
            cancel.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    let mut aborted = None;
    while let Some(event) = events.next().await {
        stdout.write_all(event.to_ndjson()?.as_bytes()).await?;
        stdout.flush().await?;

        if let RunEvent::Error {
            node_id: None,
            message,
            ..
        } = event
        {
            aborted = Some(message);
        }
    }

    match aborted {
        Some(message) => anyhow::bail!("Workflow run aborted: {}", message),
        None => Ok(()),
    }
}

async fn print_schedule(file: &str) -> Result<()> {
    let graph = read_graph(file).await?;
    let schedule = graph.schedule()?;

    let report = serde_json::json!({
        "order": schedule.order(),
        "dropped_edges": schedule.dropped_edges(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn run_agent(config: &Config, goal: &str, context: &str) -> Result<()> {
    let agent = build_agent(config)?;
    let outcome = agent.run_detailed(goal, context).await;

    info!(
        iterations = outcome.iterations,
        corrections = outcome.corrections,
        file_written = outcome.file_written,
        "agent finished"
    );
    println!("{}", serde_json::to_string_pretty(&outcome.result)?);

    if outcome.result.is_error() {
        anyhow::bail!("Agent failed");
    }
    Ok(())
}
