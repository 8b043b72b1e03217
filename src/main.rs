//! Maison storefront server and maintenance CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maison_storefront::{
    api,
    config::Config,
    events::EventBus,
    maintenance,
    store::{PgStore, Store},
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "maison", about = "Maison storefront API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Delete guest identities, carts and wishlists nobody has touched in a while
    PruneGuests(PruneArgs),
    /// Recompute coupon usage counts from placed orders
    RecountCoupons,
}

#[derive(Debug, Args)]
struct PruneArgs {
    /// Age in days after which guest data is removed
    #[arg(long, default_value_t = 30)]
    older_than_days: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => {
            let url = config.database_url.as_deref().context("DATABASE_URL is required to migrate")?;
            PgStore::connect(url, config.database_max_connections).await?.migrate().await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Commands::PruneGuests(args) => {
            let store = open_store(&config).await?;
            let report = maintenance::prune_guests(&store, args.older_than_days).await?;
            println!("removed {} guests, {} carts, {} wishlists", report.guests, report.carts, report.wishlists);
            Ok(())
        }
        Commands::RecountCoupons => {
            let store = open_store(&config).await?;
            for r in maintenance::recount_coupons(&store).await? {
                println!("{}: {} -> {}", r.code, r.before, r.after);
            }
            Ok(())
        }
    }
}

async fn open_store(config: &Config) -> Result<Store> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pg = PgStore::connect(url, config.database_max_connections).await.context("connecting to postgres")?;
            pg.migrate().await?;
            Ok(Store::new(pg))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using an in-memory store; data is lost on exit");
            Ok(Store::memory())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let store = open_store(&config).await?;
    let events = match config.nats_url.as_deref() {
        Some(url) => EventBus::connect(url).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "NATS unavailable, domain events will only be logged");
            EventBus::default()
        }),
        None => EventBus::default(),
    };
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, admin endpoints are disabled");
    }

    let app = api::router(AppState::new(store, events, &config));
    let addr = config.socket_addr();
    tracing::info!("Maison storefront listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
