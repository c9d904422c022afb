use clap::{Parser, Subcommand};
use tracing::{error, info};
use vinyldigger_orchestrator::{Config, Server};

#[derive(Parser)]
#[command(name = "vinyldigger-orchestrator")]
#[command(about = "Search orchestration service for VinylDigger")]
struct Cli {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.level))
        .init();

    if let Some(Commands::Migrate) = cli.command {
        if let Err(e) = migrate(&config).await {
            error!("Migration failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    info!("Starting VinylDigger search orchestrator");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn migrate(config: &Config) -> Result<(), vinyldigger_orchestrator::error::AppError> {
    use vinyldigger_orchestrator::database::{DatabaseManager, DatabaseManagerImpl};
    use vinyldigger_orchestrator::error::AppError;

    let database = DatabaseManagerImpl::new_from_config(config)
        .await
        .map_err(AppError::Database)?;
    database.migrate().await.map_err(AppError::Database)?;
    info!("Database migrations completed");
    Ok(())
}
