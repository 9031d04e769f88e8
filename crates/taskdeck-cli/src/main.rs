use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskdeck_application::TaskdeckClient;
use taskdeck_core::task::{SortOrder, TaskFilter};
use taskdeck_infrastructure::ConfigService;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version, about = "taskdeck - manage your to-do list from the terminal", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in with it
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List tasks
    List {
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// Case-insensitive text to look for in title and description
        #[arg(long)]
        search: Option<String>,
        /// newest_first (desc) or oldest_first (asc)
        #[arg(long, default_value = "newest_first")]
        order: SortOrder,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
    },
    /// Toggle a task between completed and active
    Done { id: String },
    /// Edit a task's title or description
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Delete a task
    Rm { id: String },
    /// Show completed and pending counts
    Stats,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service
        .load()
        .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

    init_tracing(&config.log.level);

    let (client, mut events) =
        TaskdeckClient::from_config(&config).context("Failed to set up the client")?;
    client.start().await;

    let result = match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&client, &email, &password).await
        }
        Commands::Register { email, password } => {
            commands::auth::register(&client, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(&client),
        Commands::Whoami => commands::auth::whoami(&client),
        Commands::Profile {
            name,
            username,
            email,
        } => commands::auth::profile(&client, name, username, email).await,
        Commands::List {
            filter,
            search,
            order,
        } => commands::tasks::list(&client, filter, search, order).await,
        Commands::Add { title, description } => {
            commands::tasks::add(&client, &title, &description).await
        }
        Commands::Done { id } => commands::tasks::toggle(&client, &id).await,
        Commands::Edit {
            id,
            title,
            description,
        } => commands::tasks::edit(&client, &id, title, description).await,
        Commands::Rm { id } => commands::tasks::remove(&client, &id).await,
        Commands::Stats => commands::tasks::stats(&client).await,
    };

    commands::print_events(&mut events);
    client.shutdown().await;
    result
}
