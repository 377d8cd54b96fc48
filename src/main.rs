use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rolekeeper::auth::{MIN_PASSWORD_LENGTH, PasswordManager};
use rolekeeper::config::ServerConfig;
use rolekeeper::seed::{create_superadmin, seed_all};
use rolekeeper::server::{AppState, create_router};
use rolekeeper::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "rolekeeper")]
#[command(about = "Multi-tenant authentication and role-based authorization server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Secret used to sign JWTs
        #[arg(long, env = "ROLEKEEPER_JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, seed catalog, create a superadmin)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Superadmin email
        #[arg(long)]
        email: Option<String>,

        /// Superadmin password
        #[arg(long, env = "ROLEKEEPER_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Superadmin display name
        #[arg(long, default_value = "Superadmin")]
        full_name: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Re-run the idempotent catalog seeding
    Seed {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    Ok(store)
}

fn run_init(
    data_dir: PathBuf,
    email: Option<String>,
    password: Option<String>,
    full_name: String,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = open_store(&data_dir)?;
    seed_all(&store);

    let email = match (email, non_interactive) {
        (Some(email), _) => email,
        (None, false) => inquire::Text::new("Superadmin email:")
            .with_validator(|input: &str| {
                if input.contains('@') && !input.contains(char::is_whitespace) {
                    Ok(inquire::validator::Validation::Valid)
                } else {
                    Ok(inquire::validator::Validation::Invalid(
                        "Enter a valid email address".into(),
                    ))
                }
            })
            .prompt()?,
        (None, true) => bail!("--email is required with --non-interactive"),
    };

    if store.get_user_by_email(&email)?.is_some() {
        bail!("Server already initialized. User {email} exists.");
    }

    let password = match (password, non_interactive) {
        (Some(password), _) => password,
        (None, false) => inquire::Password::new("Superadmin password:")
            .with_validator(inquire::min_length!(
                MIN_PASSWORD_LENGTH,
                "Password is too short"
            ))
            .prompt()?,
        (None, true) => bail!("--password is required with --non-interactive"),
    };

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {MIN_PASSWORD_LENGTH} characters");
    }

    let user = create_superadmin(&store, &PasswordManager::new(), &email, &password, &full_name)?;

    println!();
    println!("========================================");
    println!("Created superadmin {} ({})", user.email, user.id);
    println!("Database: {}", data_dir.join("rolekeeper.db").display());
    println!("========================================");
    println!();

    Ok(())
}

fn build_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    jwt_secret: Option<String>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match config {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(secret) = jwt_secret {
        config.jwt_secret = secret;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rolekeeper=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                email,
                password,
                full_name,
                non_interactive,
            } => {
                run_init(data_dir, email, password, full_name, non_interactive)?;
            }
            AdminCommands::Seed { data_dir } => {
                let store = open_store(&data_dir)?;
                let report = seed_all(&store);
                println!(
                    "Seeded {} applications and {} permissions ({} failures)",
                    report.applications, report.permissions, report.failures
                );
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            jwt_secret,
        } => {
            let config = build_config(config, host, port, data_dir, jwt_secret)?;

            if !config.db_path().exists() {
                bail!(
                    "Server not initialized. Run 'rolekeeper admin init' first to create the database and a superadmin."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            seed_all(&store);

            let addr = config.socket_addr()?;
            let state = Arc::new(AppState::new(Arc::new(store), config));
            let app = create_router(state);

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
