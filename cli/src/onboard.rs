use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use std::path::PathBuf;
use taskweave_core::config::{Config, MAX_ITERATIONS, MIN_ITERATIONS, SearchConfig};

const PROVIDERS: &[&str] = &["ollama", "openai"];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<(String, String, String)> {
    let selection = Select::new()
        .with_prompt("Select your LLM provider")
        .items(PROVIDERS)
        .default(0)
        .interact()
        .context("Failed to select provider")?;
    let provider = PROVIDERS[selection].to_string();

    let (default_model, api_key) = if provider == "openai" {
        let api_key: String = Input::new()
            .with_prompt("Enter your OpenAI API key")
            .interact_text()
            .context("Failed to read API key")?;
        if api_key.trim().is_empty() {
            anyhow::bail!("API key cannot be empty");
        }
        ("gpt-4o-mini", api_key)
    } else {
        ("llama3.1", String::new())
    };

    let model: String = Input::new()
        .with_prompt("Model")
        .default(default_model.to_string())
        .interact_text()
        .context("Failed to read model")?;

    Ok((provider, api_key, model))
}

fn setup_search() -> Result<SearchConfig> {
    let api_key: String = Input::new()
        .with_prompt("Tavily API key (leave empty to disable web search)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read search key")?;

    let provider = if api_key.trim().is_empty() {
        "none"
    } else {
        "tavily"
    };

    Ok(SearchConfig {
        provider: provider.to_string(),
        api_key: api_key.trim().to_string(),
        ..SearchConfig::default()
    })
}

fn setup_agent(defaults: &Config) -> Result<(PathBuf, usize)> {
    let output_dir: String = Input::new()
        .with_prompt("Directory the agent may write files to")
        .default(defaults.output_dir.display().to_string())
        .interact_text()
        .context("Failed to read output directory")?;

    let max_iterations: usize = Input::new()
        .with_prompt(format!(
            "Agent steps per node ({}-{})",
            MIN_ITERATIONS, MAX_ITERATIONS
        ))
        .default(defaults.max_iterations)
        .validate_with(|n: &usize| {
            if (MIN_ITERATIONS..=MAX_ITERATIONS).contains(n) {
                Ok(())
            } else {
                Err("out of range")
            }
        })
        .interact_text()
        .context("Failed to read step budget")?;

    Ok((PathBuf::from(output_dir), max_iterations))
}

pub fn run_onboard() -> Result<Config> {
    println!();
    println!("  {}", style("Welcome to taskweave!").white().bold());
    println!(
        "  {}",
        style("This wizard writes the config used by `taskweave run`.").dim()
    );

    let defaults = Config::default();

    print_step(1, 3, "LLM Provider");
    let (provider, api_key, model) = setup_provider()?;

    print_step(2, 3, "Web Search");
    let search = setup_search()?;

    print_step(3, 3, "Agent");
    let (output_dir, max_iterations) = setup_agent(&defaults)?;

    let mut config = Config {
        provider: Some(provider),
        api_key,
        model,
        output_dir,
        max_iterations,
        search,
        ..defaults
    };
    config.validate()?;

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        eprintln!(
            "  {} Warning: Could not create {}: {}",
            style("!").yellow(),
            config.output_dir.display(),
            e
        );
    }

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("taskweave run workflow.json").cyan().bold()
    );
    println!();

    Ok(config)
}
