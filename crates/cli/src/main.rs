//! `autoflow` CLI entry-point.
//!
//! Sub-commands:
//! - `serve`    — start the API server with the production service stack.
//! - `validate` — validate a workflow JSON file without executing it.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use adapters::{
    DiscordWebhookClient, FileReportRenderer, GoogleDriveClient, GoogleSheetsClient, Mailer,
    OpenRouterClient, ReqwestDispatcher, RestImageGenerator, RestSocialPoster, SmtpConfig,
    SmtpMailer, TwilioRestSender, UnconfiguredMailer,
};
use credentials::{CredentialStore, Crypto, EnvOnlyCredentialStore, InMemoryCredentialStore};
use db::{InMemoryDb, Persistence, SqliteDb};
use engine::{StoredWorkflowRunner, WorkflowEngine, WorkflowStore};
use nodes::{NodeRegistry, Services};
use scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "autoflow", about = "Workflow automation engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: String,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: std::path::PathBuf,
    },
}

fn production_services() -> Services {
    let mailer: Arc<dyn Mailer> = match SmtpMailer::new(SmtpConfig::from_env()) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            tracing::warn!("SMTP transport unavailable: {e}");
            Arc::new(UnconfiguredMailer)
        }
    };

    Services {
        llm: Arc::new(OpenRouterClient::new()),
        mailer,
        dispatcher: Arc::new(ReqwestDispatcher::new()),
        messenger: Arc::new(TwilioRestSender::new()),
        discord: Arc::new(DiscordWebhookClient::new()),
        drive: Arc::new(GoogleDriveClient::new()),
        sheets: Arc::new(GoogleSheetsClient::new()),
        images: Arc::new(RestImageGenerator::new()),
        social: Arc::new(RestSocialPoster::new()),
        reports: Arc::new(FileReportRenderer),
    }
}

async fn persistence_from_env() -> Arc<dyn Persistence> {
    let force_in_memory = std::env::var("FORCE_IN_MEMORY_DB")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if force_in_memory {
        info!("using in-memory execution history");
        return Arc::new(InMemoryDb::new());
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://autoflow.db?mode=rwc".to_owned());
    match SqliteDb::connect(&database_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::warn!("database unavailable ({e}), falling back to in-memory history");
            Arc::new(InMemoryDb::new())
        }
    }
}

fn credential_store_from_env() -> Arc<dyn CredentialStore> {
    match std::env::var("ENCRYPTION_KEY").ok().and_then(|key| Crypto::from_key_b64(&key).ok()) {
        Some(crypto) => Arc::new(InMemoryCredentialStore::new(crypto)),
        None => {
            info!("no ENCRYPTION_KEY set, resolving credentials from the environment only");
            Arc::new(EnvOnlyCredentialStore)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            info!("Starting API server on {bind}");

            let store = Arc::new(WorkflowStore::new());
            let scheduler = Scheduler::new();
            let engine = Arc::new(WorkflowEngine::new(
                NodeRegistry::with_services(production_services()),
                store,
                scheduler.clone(),
                persistence_from_env().await,
                credential_store_from_env(),
            ));
            scheduler.set_runner(Arc::new(StoredWorkflowRunner::new(engine.clone())));

            api::serve(&bind, api::AppState { engine })
                .await
                .expect("server failed");
        }
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));

            let workflow: engine::Workflow = serde_json::from_str(&content)
                .unwrap_or_else(|e| panic!("invalid JSON: {e}"));

            match engine::validate_dag(&workflow) {
                Ok(order) => {
                    println!("Workflow is valid. Execution order: {order:?}");
                }
                Err(e) => {
                    eprintln!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
