use bellevue::{
    cli::{self, AppContext, Cli},
    config::database,
    core::catalog::Catalog,
    errors::{Error, Result},
};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Load the price catalog once; commands share it read-only
    let catalog = Catalog::load(&db).await?;
    let ctx = AppContext::new(db, catalog);

    match cli::run(&ctx, cli.command).await {
        Ok(output) => {
            println!("{}", output.trim_end());
            Ok(())
        }
        Err(Error::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            Err(Error::Validation(errors))
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e)
        }
    }
}
