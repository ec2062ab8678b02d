//! Operator commands for a CMSECommerce database.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap the first superadmin. The password may also come from CMSE_ADMIN_PASSWORD.
//! cargo run -p cmse-admin -- create-superadmin --email root@example.com --full-name Root
//!
//! # Insert the default subscription tiers, skipping names that already exist
//! cargo run -p cmse-admin -- seed-tiers
//! ```
//!
//! `DATABASE_URL` is read from the environment or a `.env` file.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sea_orm::Database;

use cmse_core::tracing::init_tracing;

mod commands;

#[derive(Parser)]
#[command(about = "Administrative commands for the CMSECommerce marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a superadmin account, or promote the existing account with this email
    CreateSuperadmin {
        #[arg(long)]
        email: String,

        /// Password for a new account (at least 8 characters)
        #[arg(long, env = "CMSE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "Administrator")]
        full_name: String,
    },
    /// Insert the default subscription tiers
    SeedTiers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = Database::connect(&database_url)
        .await
        .context("connect to database")?;

    match cli.command {
        Command::CreateSuperadmin {
            email,
            password,
            full_name,
        } => commands::create_superadmin(db, &email, &password, &full_name).await,
        Command::SeedTiers => commands::seed_tiers(db).await,
    }
}
