// src/commands/mod.rs
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::plugins::auth::{AuthContext, FileCredentialStore};
use crate::services::api::ApiClient;
use crate::services::config::{ClientConfig, load_client_config, normalize_api_url};
use crate::services::paths;

pub mod account_commands;
pub mod chat_commands;
pub mod document_commands;

#[derive(Debug, Parser)]
#[command(name = "legal-assistant")]
#[command(version)]
#[command(about = "Terminal client for the Legal AI Assistant backend")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides LEGAL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding the stored credential (overrides LEGAL_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds (overrides LEGAL_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive chat with the assistant
    Chat {
        /// Document to attach to the first question
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Ask a single question and exit
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Search the legal corpus
    Search {
        query: String,

        /// Show the full section text instead of a preview
        #[arg(long)]
        full: bool,
    },

    /// Sign in and store the access token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "LEGAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored access token
    Logout,

    /// Show configuration and sign-in state
    Status,

    /// Register a new account
    Signup {
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        phonenumber: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "LEGAL_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat of the password; defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,
        /// Accept the terms and conditions
        #[arg(long)]
        accept_terms: bool,
    },

    /// Upload a document (PDF, DOC, DOCX or TXT, up to 5MB)
    Upload { path: PathBuf },

    /// List saved documents
    Docs {
        /// Match against index id, owner or file path
        #[arg(short, long, default_value = "")]
        search: String,

        /// all, indexed or not-indexed
        #[arg(long, default_value = "all")]
        filter: String,

        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: usize,

        #[arg(long, default_value_t = crate::services::documents::DEFAULT_ROWS_PER_PAGE)]
        rows: usize,
    },
}

/// Everything a command needs: resolved configuration plus a client wired to
/// the stored credential.
pub struct AppContext {
    pub config: ClientConfig,
    pub client: ApiClient,
}

impl AppContext {
    pub fn auth(&self) -> &AuthContext {
        self.client.auth()
    }

    pub fn chat_backend(&self) -> Arc<dyn crate::services::api::ChatBackend> {
        Arc::new(self.client.clone())
    }
}

pub(crate) fn resolve_config(cli: &Cli) -> ClientConfig {
    let mut config = load_client_config();
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = normalize_api_url(url);
    }
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout = Duration::from_secs(secs.max(1));
    }
    config
}

pub fn build_context(cli: &Cli) -> anyhow::Result<AppContext> {
    let config = resolve_config(cli);
    let data_dir = paths::init_data_dir(config.data_dir.clone()).map_err(anyhow::Error::msg)?;
    log::debug!("Data directory: {}", data_dir.display());

    let store = FileCredentialStore::new(&data_dir);
    let secret = config.jwt_secret.as_ref().map(|s| s.as_bytes().to_vec());
    let auth = AuthContext::new(Box::new(store), secret).context("Failed to load credential")?;
    let client = ApiClient::new(&config, auth).context("Failed to build HTTP client")?;

    Ok(AppContext { config, client })
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let ctx = build_context(&cli)?;

    match cli.command {
        Commands::Chat { file, question } => {
            chat_commands::run_chat(&ctx, file, question).await
        }
        Commands::Search { query, full } => {
            document_commands::run_search(&ctx, &query, full).await
        }
        Commands::Login { username, password } => {
            account_commands::run_login(&ctx, &username, &password).await
        }
        Commands::Logout => account_commands::run_logout(&ctx),
        Commands::Status => account_commands::run_status(&ctx),
        Commands::Signup {
            firstname,
            lastname,
            phonenumber,
            email,
            username,
            password,
            confirm_password,
            accept_terms,
        } => {
            let form = crate::services::api::SignupForm {
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                firstname,
                lastname,
                phonenumber,
                email,
                username,
                password,
                terms_and_condition: accept_terms,
            };
            account_commands::run_signup(&ctx, &form).await
        }
        Commands::Upload { path } => document_commands::run_upload(&ctx, &path).await,
        Commands::Docs {
            search,
            filter,
            page,
            rows,
        } => {
            let filter = filter.parse().map_err(anyhow::Error::msg)?;
            let query = crate::services::documents::DocumentQuery {
                search_term: search,
                filter,
                page,
                rows_per_page: rows,
            };
            document_commands::run_docs(&ctx, &query).await
        }
    }
}
