use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use harvest_archive::{SearchChain, Scraper};
use harvest_common::Config;
use harvest_scout::{ResearchEvent, ResearchExecutor, ResearchPlan};

#[derive(Parser)]
#[command(name = "harvest", about = "Fetch, clean and aggregate web content")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape one URL and print the result as JSON.
    Scrape {
        url: String,
    },
    /// Search every query, scrape the best hits, print the harvested bundle.
    Research {
        #[arg(required = true)]
        queries: Vec<String>,
        #[arg(long)]
        max_scrapes: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("harvest=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let scraper = Arc::new(Scraper::from_config(&config)?);

    match cli.command {
        Command::Scrape { url } => {
            let result = scraper.scrape(&url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Research {
            queries,
            max_scrapes,
        } => {
            let searcher = Arc::new(SearchChain::from_config(&config)?);
            info!(providers = ?searcher.provider_names(), "Search chain ready");

            let mut plan = ResearchPlan::from_config(queries, &config);
            if let Some(max) = max_scrapes {
                plan = plan.with_max_scrapes(max);
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ResearchEvent>();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    info!(?event, "Research progress");
                }
            });

            let executor = ResearchExecutor::new(searcher, scraper);
            let outcome = executor.run(&plan, Some(&tx)).await;
            drop(tx);
            printer.await?;

            println!("{}", serde_json::to_string_pretty(&outcome.harvested)?);
        }
    }

    Ok(())
}
