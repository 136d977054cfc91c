//! HOE CLI - shop, sell and administer the HOE marketplace from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! hoe catalog products --search saree --page 2
//!
//! # Shop
//! hoe auth login -e shopper@example.com
//! hoe cart add 64f1a9... -q 2
//! hoe checkout --near 12.9716,77.5946 --name "Asha Rao" --phone 9876543210
//!
//! # Sell and administer
//! hoe auth login --as vendor -e seller@example.com
//! hoe vendor orders list
//! hoe admin brands list
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in and out of the customer, vendor and admin sessions
//! - `catalog` - Brands, categories and products
//! - `cart`, `wishlist`, `orders` - The signed-in shopper's data
//! - `checkout` - Pay for the cart and place the order
//! - `admin`, `vendor` - Back office catalog and order management
//!
//! Configuration comes from the environment (see `hoe_storefront::config`).
//! Logs go to stderr; set `RUST_LOG` or pass `-v` for more.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hoe_storefront::Storefront;
use hoe_storefront::config::StorefrontConfig;
use hoe_storefront::session::FileTokenStore;

mod commands;
mod output;
mod telemetry;

use commands::admin::{AdminAction, VendorAction};
use commands::auth::AuthAction;
use commands::cart::CartAction;
use commands::catalog::CatalogAction;
use commands::checkout::CheckoutArgs;
use commands::orders::OrdersAction;
use commands::wishlist::WishlistAction;
use commands::{CommandError, Context};

#[derive(Parser)]
#[command(name = "hoe")]
#[command(author, version, about = "HOE marketplace storefront, vendor and admin client")]
struct Cli {
    /// Debug logging for HOE crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register and sign out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// View past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Pay for the cart and place an order
    Checkout(CheckoutArgs),
    /// Admin portal
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Vendor portal
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            output::error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(cli.verbose);

    match run(config, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            output::error(&err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(config: StorefrontConfig, command: Commands) -> Result<(), CommandError> {
    let tokens = FileTokenStore::open(config.token_file.clone())?;
    let storefront = Storefront::new(config, Arc::new(tokens))?;
    let ctx = Context::new(storefront);

    match command {
        Commands::Auth { action } => commands::auth::run(&ctx, action).await,
        Commands::Catalog { action } => commands::catalog::run(&ctx, action).await,
        Commands::Cart { action } => commands::cart::run(&ctx, action).await,
        Commands::Wishlist { action } => commands::wishlist::run(&ctx, action).await,
        Commands::Orders { action } => commands::orders::run(&ctx, action).await,
        Commands::Checkout(args) => commands::checkout::run(&ctx, args).await,
        Commands::Admin { action } => commands::admin::run_admin(&ctx, action).await,
        Commands::Vendor { action } => commands::admin::run_vendor(&ctx, action).await,
    }
}
