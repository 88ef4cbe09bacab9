use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use dbhandler::storage::sqlite::Database;
use dbhandler::{Config, DbHandler};
use dbhandler_core::storage::ListQuery;

/// dbhandler - inspect and migrate the VoIP platform database
#[derive(Parser, Debug)]
#[command(name = "dbhandler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, short = 'd', env = "DATABASE_PATH")]
    database_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create missing tables and indexes
    Migrate,
    /// Billing accounts
    Account {
        #[command(subcommand)]
        action: Action,
    },
    /// Customers
    Customer {
        #[command(subcommand)]
        action: Action,
    },
    /// Call queues
    Queue {
        #[command(subcommand)]
        action: Action,
    },
    /// Calls
    Call {
        #[command(subcommand)]
        action: Action,
    },
    /// Media-server channels
    Channel {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print one record
    Get {
        /// Record id
        id: String,
    },
    /// Print one page of records, newest first
    List {
        /// Page size
        #[arg(long, short, default_value_t = 10)]
        size: u64,

        /// `tm_create` of the last record of the previous page
        #[arg(long, short, default_value = "")]
        token: String,

        /// Equality filter, repeatable (e.g. `--filter deleted=false`)
        #[arg(long = "filter", short, value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

fn list_query(size: u64, token: String, filters: Vec<(String, String)>) -> ListQuery {
    filters
        .into_iter()
        .fold(ListQuery::new(size).with_token(token), |query, (k, v)| {
            query.with_filter(k, v)
        })
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("invalid id `{id}`"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbhandler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(path) = cli.database_path {
        config.database_path = path;
    }

    if let Command::Migrate = cli.command {
        let db = Database::open(&config.database_path).await?;
        db.migrate().await?;
        tracing::info!(path = %config.database_path, "Schema up to date");
        return Ok(());
    }

    let handler = DbHandler::from_config(&config).await?;

    match cli.command {
        Command::Migrate => Ok(()),
        Command::Account { action } => match action {
            Action::Get { id } => print_json(&handler.accounts.get(parse_id(&id)?).await?),
            Action::List {
                size,
                token,
                filters,
            } => print_json(&handler.accounts.list(&list_query(size, token, filters)).await?),
        },
        Command::Customer { action } => match action {
            Action::Get { id } => print_json(&handler.customers.get(parse_id(&id)?).await?),
            Action::List {
                size,
                token,
                filters,
            } => print_json(&handler.customers.list(&list_query(size, token, filters)).await?),
        },
        Command::Queue { action } => match action {
            Action::Get { id } => print_json(&handler.queues.get(parse_id(&id)?).await?),
            Action::List {
                size,
                token,
                filters,
            } => print_json(&handler.queues.list(&list_query(size, token, filters)).await?),
        },
        Command::Call { action } => match action {
            Action::Get { id } => print_json(&handler.calls.get(parse_id(&id)?).await?),
            Action::List {
                size,
                token,
                filters,
            } => print_json(&handler.calls.list(&list_query(size, token, filters)).await?),
        },
        Command::Channel { action } => match action {
            Action::Get { id } => print_json(&handler.channels.get(&id).await?),
            Action::List {
                size,
                token,
                filters,
            } => print_json(&handler.channels.list(&list_query(size, token, filters)).await?),
        },
    }
}
