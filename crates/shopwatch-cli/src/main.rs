mod cycle;
mod query;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shopwatch_core::{AppConfig, EventType};
use shopwatch_db::PoolConfig;
use shopwatch_monitor::{Monitor, MonitorSettings, PgStore, SystemClock};
use shopwatch_scraper::{ClientOptions, ShopifyClient};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopwatch")]
#[command(about = "Storefront catalog change monitor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one reconciliation cycle and print the report
    Run,
    /// Run reconciliation cycles on the configured cron schedule
    Watch,
    /// Print the current catalog snapshot
    Catalog,
    /// Print recorded new/delisted events
    Events {
        /// Event type: `new` or `delisted`
        #[arg(long = "type")]
        event_type: EventType,
        /// Single day from the 7-day ledger (defaults to today)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        date: Option<NaiveDate>,
        /// Range start (inclusive) over the 30-day ledger
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Range end (inclusive) over the 30-day ledger
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Print products with an upcoming restock date
    Restocks {
        /// Only include restocks within this many days
        #[arg(long)]
        within_days: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

type LiveMonitor = Monitor<ShopifyClient, PgStore, SystemClock>;

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = PoolConfig::from_app_config(config);
    Ok(shopwatch_db::connect_pool(&config.database_url, pool_config).await?)
}

async fn build_monitor(config: &AppConfig) -> anyhow::Result<LiveMonitor> {
    let pool = connect(config).await?;
    let client = ShopifyClient::new(ClientOptions::from_app_config(config))?;
    Ok(Monitor::new(
        client,
        PgStore::new(pool, config.timezone),
        SystemClock,
        MonitorSettings::from_app_config(config),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("shopwatch: no command given; see --help");
        return Ok(());
    };

    let config = Arc::new(shopwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = shopwatch_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    shopwatch_db::ping(&pool).await?;
                    println!("database reachable");
                }
            }
        }
        Commands::Run => {
            let monitor = build_monitor(&config).await?;
            cycle::run_once(&monitor, &config).await?;
        }
        Commands::Watch => {
            let monitor = Arc::new(build_monitor(&config).await?);
            cycle::run_watch(monitor, Arc::clone(&config)).await?;
        }
        Commands::Catalog => {
            let monitor = build_monitor(&config).await?;
            query::print_catalog(&monitor).await?;
        }
        Commands::Events {
            event_type,
            date,
            from,
            to,
        } => {
            let monitor = build_monitor(&config).await?;
            query::print_events(&monitor, event_type, date, from.zip(to)).await?;
        }
        Commands::Restocks { within_days } => {
            let monitor = build_monitor(&config).await?;
            query::print_restocks(&monitor, within_days).await?;
        }
    }

    Ok(())
}
