use crate::application::{TestTextClient, TouchstoneClient, UploadDataOptions};
use crate::domain::credentials::Credentials;
use crate::domain::error::{AppError, Result};
use crate::domain::file_input::FileInput;
use crate::domain::portal_config::TESTTEXT_PATH_SUFFIXES;
use crate::domain::upload::{ContentType, DateFormat};
use crate::infrastructure::config::{load_settings, ConfigService};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "portal-uploader")]
#[command(about = "Log in to TestText or Touchstone and upload test data")]
pub struct Cli {
    /// Settings file (defaults to ./portal-uploader.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Testtext(TestTextCommand),
    #[command(subcommand)]
    Touchstone(TouchstoneCommand),
    /// Manage passwords kept in the OS keyring
    #[command(subcommand)]
    Credentials(CredentialsCommand),
}

#[derive(Args)]
pub struct Login {
    #[arg(long, env = "PORTAL_UPLOADER_USERNAME")]
    pub username: String,
    /// Falls back to PORTAL_UPLOADER_PASSWORD, then the keyring
    #[arg(long, env = "PORTAL_UPLOADER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum TestTextCommand {
    Upload {
        #[command(flatten)]
        login: Login,
        /// A .tsv path, or the file contents themselves
        file: String,
        #[arg(long, default_value = "email")]
        content_type: String,
        #[arg(long)]
        max_bytes: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum TouchstoneCommand {
    Upload {
        #[command(flatten)]
        login: Login,
        /// Name of the uploaded file (xls, xlsx, csv or txt)
        filename: String,
        /// Read the contents from here instead of FILENAME
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "Y-m-d")]
        date_format: String,
        #[arg(long)]
        initial_upload_url: Option<String>,
        #[arg(long)]
        final_upload_url: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Portal {
    Testtext,
    Touchstone,
}

impl Portal {
    fn key(self) -> &'static str {
        match self {
            Portal::Testtext => "testtext",
            Portal::Touchstone => "touchstone",
        }
    }
}

#[derive(Subcommand)]
pub enum CredentialsCommand {
    Set {
        #[arg(long, value_enum)]
        portal: Portal,
        #[arg(long)]
        username: String,
        #[arg(long, env = "PORTAL_UPLOADER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Delete {
        #[arg(long, value_enum)]
        portal: Portal,
        #[arg(long)]
        username: String,
    },
}

fn resolve_credentials(portal: Portal, login: Login, keyring: &ConfigService) -> Result<Credentials> {
    let password = match login.password {
        Some(password) => password,
        None => keyring
            .get_password(portal.key(), &login.username)?
            .ok_or_else(|| {
                AppError::ConfigurationError(format!(
                    "No password given and none stored for {} user {}",
                    portal.key(),
                    login.username
                ))
            })?,
    };
    Ok(Credentials::new(login.username, password))
}

pub async fn execute(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let keyring = ConfigService::new();

    match cli.command {
        Commands::Testtext(TestTextCommand::Upload {
            login,
            file,
            content_type,
            max_bytes,
        }) => {
            let content_type: ContentType = content_type.parse()?;
            let credentials = resolve_credentials(Portal::Testtext, login, &keyring)?;
            let input = FileInput::from_argument(&file, TESTTEXT_PATH_SUFFIXES);

            let session = TestTextClient::new(credentials, settings.testtext)?
                .open()
                .await?;
            let result = session.upload(input, content_type, max_bytes).await?;
            session.close();

            print_summary(json!({
                "portal": "testtext",
                "failures": result.failures,
                "status": result.response.status,
                "url": result.response.url,
            }));
        }
        Commands::Touchstone(TouchstoneCommand::Upload {
            login,
            filename,
            data,
            date_format,
            initial_upload_url,
            final_upload_url,
        }) => {
            let date_format: DateFormat = date_format.parse()?;
            let credentials = resolve_credentials(Portal::Touchstone, login, &keyring)?;
            let options = UploadDataOptions {
                date_format,
                initial_upload_url,
                final_upload_url,
                ..Default::default()
            };

            let session = TouchstoneClient::connect(credentials, settings.touchstone)
                .await?
                .open()
                .await?;
            let response = session
                .upload_data(&filename, data.map(FileInput::Path), options)
                .await?;
            session.close();

            print_summary(json!({
                "portal": "touchstone",
                "status": response.status,
                "url": response.url,
            }));
        }
        Commands::Credentials(CredentialsCommand::Set {
            portal,
            username,
            password,
        }) => {
            Credentials::new(username.as_str(), password.as_str()).ensure_present()?;
            keyring.save_password(portal.key(), &username, &password)?;
            info!(portal = portal.key(), username = %username, "Password stored");
        }
        Commands::Credentials(CredentialsCommand::Delete { portal, username }) => {
            keyring.delete_password(portal.key(), &username)?;
            info!(portal = portal.key(), username = %username, "Password removed");
        }
    }

    Ok(())
}

fn print_summary(summary: serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string())
    );
}
