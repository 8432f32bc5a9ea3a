//! KLYP CLI - database migrations, console accounts, and site content.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! klyp-cli migrate
//!
//! # Create a console account (prints a generated password if none is given)
//! klyp-cli admin create -e admin@klyp.travel
//!
//! # Reset a console password
//! klyp-cli admin set-password -e admin@klyp.travel -p 'new password'
//!
//! # Store the default copy for every section that has no document yet
//! klyp-cli content seed
//! ```
//!
//! All commands read `KLYP_DATABASE_URL` from the environment or `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "klyp-cli")]
#[command(author, version, about = "KLYP Workbench site tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage console accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage site content
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a console account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password; a random one is generated and printed when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Replace the password of an existing account
    SetPassword {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ContentAction {
    /// Store the default copy for sections without a document
    Seed {
        /// Overwrite sections that already have a document
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, password } => {
                commands::admin::create_user(&email, password).await?;
            }
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&email, password).await?;
            }
        },
        Commands::Content { action } => match action {
            ContentAction::Seed { force } => commands::content::seed(force).await?,
        },
    }
    Ok(())
}
