mod cli;
mod config;
mod daemon;
mod error;
mod fetch;
mod hot;
mod models;
mod normalize;
mod poller;
mod registry;
mod server;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::{load_config_or_default, validate_config};
use crate::fetch::HotlistClient;
use crate::hot::format_hot_score;
use crate::models::{FetchResult, HotlistItem};
use crate::registry::PlatformRegistry;
use crate::store::HotlistQuery;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        load_config_or_default(&cli.config).with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.hotboard.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(config_path = %cli.config.display(), "config loaded");

    validate_config(&config).context("config validation failed")?;
    info!("config validated successfully");

    match cli.command {
        Some(Commands::Validate) => {
            println!("Configuration is valid.");
        }
        Some(Commands::Fetch {
            platforms,
            query,
            limit,
            source_order,
            json,
        }) => {
            let registry = PlatformRegistry::new();
            let client = HotlistClient::from_config(&config, registry).context("building hot list client")?;
            let result = client.fetch_hotlist().await?;

            let query = HotlistQuery {
                search: query,
                platforms,
                sort_by_hot: !source_order,
                limit,
            };
            let items = query.apply(&result.data);

            if json {
                let filtered = FetchResult {
                    data: items,
                    ..result
                };
                println!("{}", serde_json::to_string_pretty(&filtered).context("serializing fetch result")?);
            } else {
                print_items(&items, &result, client.registry().all().len());
            }
        }
        Some(Commands::Run) | None => {
            daemon::run(config).await?;
        }
    }

    Ok(())
}

fn print_items(items: &[HotlistItem], result: &FetchResult, platforms: usize) {
    if items.is_empty() {
        println!("No hot list items matched.");
        return;
    }

    for item in items {
        println!(
            "[{}] {}  {}  {}",
            item.platform_name,
            item.title,
            format_hot_score(item.hot),
            item.url
        );
    }

    println!(
        "\n{} of {} items across {} platforms from {} at {}",
        items.len(),
        result.data.len(),
        platforms,
        result.source,
        result.timestamp.to_rfc3339()
    );
}
