use clap::{Args, Subcommand};
use serde::Serialize;
use sesman_core::{CredentialBundle, Notice, Notifier, Theme};
use sesman_session::{Connector, Session};

use crate::OutputFormat;
use crate::console::{ConsoleNotifier, emit};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// AWS region (e.g. us-east-1).
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
    /// AWS access key ID.
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,
    /// AWS secret access key.
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
    /// S3 bucket for file-backed templates.
    #[arg(long)]
    pub bucket: Option<String>,
    /// Key prefix inside the bucket.
    #[arg(long)]
    pub folder_prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct ThemeArgs {
    #[command(subcommand)]
    pub command: Option<ThemeCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    /// Switch between light and dark.
    Toggle,
    /// Set the theme explicitly.
    Set {
        /// `light` or `dark`.
        theme: Theme,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    logged_in: bool,
    region: Option<String>,
    access_key_id: Option<String>,
    bucket_name: Option<String>,
    folder_prefix: Option<String>,
}

pub async fn login(connector: &Connector, args: LoginArgs) -> anyhow::Result<()> {
    let mut bundle = CredentialBundle::new(
        args.region.unwrap_or_default(),
        args.access_key_id.unwrap_or_default(),
        args.secret_access_key.unwrap_or_default(),
    );
    bundle.bucket_name = args.bucket;
    bundle.folder_prefix = args.folder_prefix;

    connector
        .session()
        .login(connector.factory().as_ref(), bundle, &ConsoleNotifier)
        .await?;
    Ok(())
}

pub async fn logout(session: &Session, notifier: &dyn Notifier) -> anyhow::Result<()> {
    session.clear().await?;
    notifier.notify(Notice::success("Successfully logged out"));
    Ok(())
}

pub async fn status(session: &Session, format: &OutputFormat) -> anyhow::Result<()> {
    let bundle = session.load().await?;
    let view = StatusView {
        logged_in: bundle.is_some(),
        region: bundle.as_ref().map(|b| b.region.clone()),
        access_key_id: bundle.as_ref().map(|b| mask(&b.access_key_id)),
        bucket_name: bundle.as_ref().and_then(|b| b.bucket_name.clone()),
        folder_prefix: bundle.as_ref().and_then(|b| b.folder_prefix.clone()),
    };
    emit(format, &view, || match &bundle {
        Some(b) => {
            println!("Logged in");
            println!("Region:     {}", b.region);
            println!("Access key: {}", mask(&b.access_key_id));
            if let Some(bucket) = &b.bucket_name {
                println!("Bucket:     {bucket}");
                println!("Prefix:     {}", b.prefix());
            }
        }
        None => println!("Not logged in"),
    })
}

pub async fn theme(session: &Session, args: &ThemeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let theme = match &args.command {
        None => session.theme().await?,
        Some(ThemeCommand::Toggle) => session.toggle_theme().await?,
        Some(ThemeCommand::Set { theme }) => {
            session.set_theme(*theme).await?;
            *theme
        }
    };
    emit(format, &serde_json::json!({ "theme": theme.as_str() }), || {
        println!("{}", theme.as_str());
    })
}

/// Keep the last four characters of a key.
fn mask(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}
