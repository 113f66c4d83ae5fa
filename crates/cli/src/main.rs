//! Shopfront CLI - browse the catalog, manage a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! shopfront products --search mug
//! shopfront product 6f1c
//!
//! # Cart (kept locally until you sign in)
//! shopfront cart add 6f1c
//! shopfront cart set 6f1c 3
//! shopfront cart show
//!
//! # Account and orders
//! shopfront login -e you@example.com -p secret
//! shopfront checkout
//! shopfront orders --page 0
//! shopfront pay <order-id>
//! ```
//!
//! Session and cart are saved to `SHOPFRONT_STATE_FILE` after every command.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::config::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod output;

use app::App;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally filtered
    Products {
        /// Case-insensitive text to match in name or description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        street: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        state: String,

        #[arg(long)]
        zip: String,
    },
    /// Sign out and empty the local cart
    Logout,
    /// Order everything in the cart
    Checkout,
    /// List past orders
    Orders {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Pay for an order
    Pay {
        /// Order ID
        order_id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and total
    Show,
    /// Add one unit of a product
    Add { id: String },
    /// Remove a product entirely
    Remove { id: String },
    /// Set a product's quantity; zero or less removes it
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the local cart
    Clear,
    /// Refresh from the remote cart
    Sync,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=info,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> shopfront_client::Result<()> {
    let app = App::load(config)?;

    let result = match cli.command {
        Commands::Products { search } => commands::catalog::list(&app, search.as_deref()).await,
        Commands::Product { id } => commands::catalog::show(&app, &id).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app),
            CartAction::Add { id } => commands::cart::add(&app, &id).await,
            CartAction::Remove { id } => commands::cart::remove(&app, &id).await,
            CartAction::Set { id, quantity } => commands::cart::set(&app, &id, quantity).await,
            CartAction::Clear => commands::cart::clear(&app),
            CartAction::Sync => commands::cart::sync(&app).await,
        },
        Commands::Login { email, password } => {
            commands::account::login(&app, &email, password).await
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
            street,
            city,
            state,
            zip,
        } => {
            let address = shopfront_client::api::Address {
                street,
                city,
                state,
                zip_code: zip,
            };
            commands::account::register(&app, name, &email, password, phone, address).await
        }
        Commands::Logout => commands::account::logout(&app),
        Commands::Checkout => commands::orders::checkout(&app).await,
        Commands::Orders { page } => commands::orders::history(&app, page).await,
        Commands::Pay { order_id } => commands::orders::pay(&app, &order_id).await,
    };

    // Persist whatever the command left behind, even on failure
    let saved = app.save();
    finish(result, saved)
}

/// Combine the command result with the save result. A command error wins;
/// a save failure behind it is logged instead of hiding it.
fn finish(
    result: shopfront_client::Result<()>,
    saved: shopfront_client::Result<()>,
) -> shopfront_client::Result<()> {
    match (result, saved) {
        (Err(e), Err(save_err)) => {
            tracing::error!(error = %save_err, "Failed to save state");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), saved) => saved,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_client::Error;

    use super::*;

    fn input(msg: &str) -> shopfront_client::Result<()> {
        Err(Error::InvalidInput(msg.to_string()))
    }

    #[test]
    fn test_command_error_wins_over_save_error() {
        let err = finish(input("command"), input("save")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: command");
    }

    #[test]
    fn test_save_error_surfaces_after_success() {
        let err = finish(Ok(()), input("save")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: save");
        assert!(finish(Ok(()), Ok(())).is_ok());
    }
}
