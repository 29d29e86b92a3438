//! Command line layer - argument parsing and the shared command context
//!
//! Every command returns the text to print, so the same handlers can be
//! exercised from tests without capturing stdout.

/// Command implementations (activity, catalog, invoice, user)
pub mod commands;

use crate::core::catalog::{Catalog, SharedCatalog};
use crate::errors::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// Shared data available to all commands.
/// This structure holds the database connection and the price catalog that
/// was loaded at startup.
pub struct AppContext {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Current price catalog, swapped on reseeding
    pub catalog: SharedCatalog,
}

impl AppContext {
    /// Creates a new `AppContext` with the given connection and catalog.
    #[must_use]
    pub fn new(database: DatabaseConnection, catalog: Catalog) -> Self {
        Self {
            database,
            catalog: SharedCatalog::new(catalog),
        }
    }
}

/// Bellevue activity ledger
#[derive(Debug, Parser)]
#[command(name = "bellevue", about = "Record and review Bellevue club activities", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed the price catalog from the config file
    Seed(SeedArgs),
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Activity(ActivityCommand),
    #[command(subcommand)]
    Invoice(InvoiceCommand),
}

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Config file to read instead of `$BELLEVUE_CONFIG` or ./config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Add a member
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        admin: bool,
        /// Password for a password login; without it the member uses OpenID Connect
        #[arg(long)]
        password: Option<String>,
    },
    /// Check a member's password login
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List all members
    List,
}

#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    /// Record a member's whole day from form fields
    Record {
        #[arg(long)]
        user: i64,
        /// Day to record, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Form field such as `activities[lunch][quantity]=2`
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Monthly overview of a member's activities
    Overview {
        #[arg(long)]
        user: i64,
    },
    /// A single day of a member, with the form prefilled from it
    Day {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Debug, Subcommand)]
pub enum InvoiceCommand {
    /// List a member's invoices
    List {
        #[arg(long)]
        user: i64,
    },
    /// Payment references of all members for the previous month
    References {
        /// Reference date, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid field '{raw}', expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid field '{raw}', key is empty"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Runs one command and returns its output.
pub async fn run(ctx: &AppContext, command: Command) -> Result<String> {
    match command {
        Command::Seed(args) => commands::catalog::seed(ctx, args.config).await,
        Command::User(UserCommand::Add {
            email,
            first_name,
            last_name,
            admin,
            password,
        }) => {
            commands::user::add(
                ctx,
                &email,
                &first_name,
                &last_name,
                admin,
                password.as_deref(),
            )
            .await
        }
        Command::User(UserCommand::Login { email, password }) => {
            commands::user::login(ctx, &email, &password).await
        }
        Command::User(UserCommand::List) => commands::user::list(ctx).await,
        Command::Activity(ActivityCommand::Record {
            user,
            date,
            fields,
            comment,
        }) => commands::activity::record(ctx, user, date, fields, comment).await,
        Command::Activity(ActivityCommand::Overview { user }) => {
            commands::activity::overview(ctx, user).await
        }
        Command::Activity(ActivityCommand::Day { user, date }) => {
            commands::activity::day(ctx, user, date).await
        }
        Command::Invoice(InvoiceCommand::List { user }) => commands::invoice::list(ctx, user).await,
        Command::Invoice(InvoiceCommand::References { today }) => {
            commands::invoice::references(ctx, today).await
        }
    }
}
