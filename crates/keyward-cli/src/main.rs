//! Keyward - SSH key identity cache for the credential broker
//!
//! Operator tool for inspecting and maintaining the user directory that
//! backs SSH signature authentication.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use keyward_core::config::{Backend, KeywardConfig};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "keyward")]
#[command(author = "Keyward Team")]
#[command(version = keyward_core::VERSION)]
#[command(about = "SSH key identity cache for the credential broker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KEYWARD_CONFIG")]
    config: Option<String>,

    /// Directory backend (ldap, keys-file)
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Keys file path
    #[arg(long, global = true)]
    keys_file: Option<PathBuf>,

    /// LDAP server URL
    #[arg(long, global = true)]
    ldap_url: Option<String>,

    /// Base DN for directory searches
    #[arg(long, global = true)]
    base_dn: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Ldap,
    KeysFile,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Ldap => Backend::Ldap,
            BackendArg::KeysFile => Backend::KeysFile,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sync from the directory and list every user
    Users,

    /// Parse SSH key material and print its fingerprint
    CheckKey {
        /// Base64 key blob or authorized-keys line
        material: String,
    },

    /// Append a public key to a user's LDAP entry
    AddKey {
        username: String,

        /// Base64 key blob or authorized-keys line
        material: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        KeywardConfig::from_file(config_path)?
    } else {
        KeywardConfig::from_env()
    };

    // Override with CLI args
    if let Some(backend) = cli.backend {
        config.cache.backend = backend.into();
    }
    if let Some(path) = cli.keys_file {
        config.keys_file.path = path;
    }
    if let Some(url) = cli.ldap_url {
        config.ldap.server_url = url;
    }
    if let Some(base_dn) = cli.base_dn {
        config.cache.base_dn = base_dn;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config);
    debug!(backend = ?config.cache.backend, "Configuration loaded");

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    match cli.command {
        Commands::Version => {
            println!("keyward {}", keyward_core::VERSION);
        }
        Commands::CheckKey { material } => {
            commands::check_key::execute(&ctx, &material)?;
        }
        Commands::Users => {
            ctx.config.validate()?;
            commands::users::execute(&ctx).await?;
        }
        Commands::AddKey { username, material } => {
            ctx.config.validate()?;
            commands::add_key::execute(&ctx, &username, &material).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &KeywardConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
