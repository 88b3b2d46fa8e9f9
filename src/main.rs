mod analysis;
mod collect;
mod config;
mod dataset;
mod filter;
mod github;
mod report;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use crate::collect::{CheckpointStore, Collector, FileCheckpointStore};
use crate::config::Config;
use crate::filter::FilterRules;
use crate::github::GraphQlClient;

/// PR Insights — collects pull-request metadata for the most-starred GitHub
/// repositories, filters it, and analyzes what drives code review.
#[derive(Parser, Debug)]
#[command(name = "pr-insights", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover top repositories and collect their merged/closed pull requests
    Collect {
        /// 1-based index of the first repository to collect
        #[arg(long)]
        start_index: Option<usize>,

        /// Continue after the most recent checkpoint in the checkpoint directory
        #[arg(long)]
        resume: bool,

        /// Where to write the collected dataset
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep engaged, non-trivial pull requests and well-populated repositories
    Filter {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the list of surviving repository names
        #[arg(long)]
        names_output: Option<PathBuf>,
    },

    /// Compute correlations, charts and descriptive statistics
    Analyze {
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for the chart files
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Optional markdown report path (terminal output otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = Config::load()?;

    match cli.command {
        Command::Collect {
            start_index,
            resume,
            output,
        } => {
            if let Some(start_index) = start_index {
                config.collect.start_index = start_index;
            }
            if let Some(output) = output {
                config.collect.output = output;
            }
            run_collect(&config, resume)
                .instrument(info_span!("collect"))
                .await
        }
        Command::Filter {
            input,
            output,
            names_output,
        } => {
            if let Some(input) = input {
                config.filter.input = input;
            }
            if let Some(output) = output {
                config.filter.output = output;
            }
            if let Some(names_output) = names_output {
                config.filter.names_output = names_output;
            }
            run_filter(&config)
        }
        Command::Analyze {
            input,
            chart_dir,
            output,
        } => {
            if let Some(input) = input {
                config.analyze.input = input;
            }
            if let Some(chart_dir) = chart_dir {
                config.analyze.chart_dir = chart_dir;
            }
            run_analyze(&config, output)
        }
    }
}

async fn run_collect(config: &Config, resume: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Fatal configuration problems surface before any request is made.
    config.validate()?;
    let client = GraphQlClient::from_config(config)?;
    let store = FileCheckpointStore::new(&config.collect.checkpoint_dir);
    let checkpoint = if resume { store.load()? } else { None };
    if resume && checkpoint.is_none() {
        warn!("no checkpoint found, starting from the configured start index");
    }

    let collector = Collector::new(client, store, config.collect.clone());

    info!("discovering repositories");
    let repositories = collector.discover().await?;
    println!("{} {} repositories discovered", "✔".green(), repositories.len());

    info!("collecting pull requests");
    let collected = collector.collect(&repositories, checkpoint).await?;
    dataset::save(&config.collect.output, &collected)?;

    let records: usize = collected.iter().map(|r| r.pull_requests.len()).sum();
    println!(
        "{} {} pull requests from {} repositories saved to {}",
        "✔".green(),
        records,
        collected.len(),
        config.collect.output.display()
    );
    Ok(())
}

fn run_filter(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let _span = info_span!("filter").entered();

    let repositories = dataset::load(&config.filter.input)?;
    println!("Loaded {} repositories from {}", repositories.len(), config.filter.input.display());

    let outcome = FilterRules::from(&config.filter).apply(&repositories);
    if outcome.repositories.is_empty() {
        println!(
            "{} no repository met the filter criteria; nothing written",
            "⚠".yellow()
        );
        return Ok(());
    }

    dataset::save(&config.filter.output, &outcome.repositories)?;
    dataset::save_names(&config.filter.names_output, &outcome.names)?;
    println!(
        "{} {} repositories saved to {}",
        "✔".green(),
        outcome.repositories.len(),
        config.filter.output.display()
    );
    Ok(())
}

fn run_analyze(config: &Config, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let _span = info_span!("analyze").entered();

    let repositories = dataset::load(&config.analyze.input)?;
    info!(repositories = repositories.len(), "running analysis");
    let analysis = analysis::run(&repositories, &config.analyze.chart_dir)?;

    report::output(&analysis, output.as_deref())?;
    info!(charts = analysis.results.len(), "done");
    Ok(())
}
