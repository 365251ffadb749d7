//! sesman CLI
//!
//! Manage Amazon SES email templates and contact lists from the command line.

mod commands;
mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sesman_aws::AwsClientFactory;
use sesman_repository::{RepositoryContext, TemplateBackend};
use sesman_session::{Connector, FileStore, Session};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::SesmanConfig;
use crate::console::ConsoleNotifier;

/// sesman: manage SES templates and contact lists.
#[derive(Parser, Debug)]
#[command(name = "sesman", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "sesman.toml", global = true)]
    config: PathBuf,

    /// Directory holding stored credentials and preferences.
    #[arg(long, env = "SESMAN_HOME", global = true)]
    state_dir: Option<PathBuf>,

    /// Template backend: `ses` or `object_store`.
    #[arg(long, env = "SESMAN_BACKEND", global = true)]
    backend: Option<TemplateBackend>,

    /// Custom AWS endpoint URL (e.g. `LocalStack`).
    #[arg(long, env = "SESMAN_ENDPOINT_URL", global = true)]
    endpoint_url: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify and store AWS credentials.
    Login(commands::session::LoginArgs),
    /// Forget the stored credentials.
    Logout,
    /// Show the stored login.
    Status,
    /// Show or change the color theme preference.
    Theme(commands::session::ThemeArgs),
    /// Manage email templates.
    Templates(commands::templates::TemplatesArgs),
    /// Manage contact lists.
    ContactLists(commands::contact_lists::ContactListsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings =
        SesmanConfig::load(&cli.config)?.resolve(cli.state_dir, cli.backend, cli.endpoint_url);
    debug!(?settings, "resolved settings");

    let session = Session::open(Arc::new(FileStore::new(&settings.state_dir))).await?;
    let factory = match &settings.endpoint_url {
        Some(url) => AwsClientFactory::new().with_endpoint_url(url),
        None => AwsClientFactory::new(),
    };
    let connector = Connector::new(session.clone(), Arc::new(factory));
    let ctx = RepositoryContext::new(connector.clone(), Arc::new(ConsoleNotifier));

    match cli.command {
        Command::Login(args) => commands::session::login(&connector, args).await,
        Command::Logout => commands::session::logout(&session, &ConsoleNotifier).await,
        Command::Status => commands::session::status(&session, &cli.format).await,
        Command::Theme(args) => commands::session::theme(&session, &args, &cli.format).await,
        Command::Templates(args) => {
            commands::templates::run(ctx, settings.backend, &args, &cli.format).await
        }
        Command::ContactLists(args) => {
            commands::contact_lists::run(ctx, &args, &cli.format).await
        }
    }
}
