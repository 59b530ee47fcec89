use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use dfd_api::autosave::{AutoSaveStore, ExportDocument, FormState};
use dfd_api::client::{ApiClient, ContactForm};
use dfd_api::config::{load_config, ApiConfig};

#[derive(Parser)]
#[command(name = "dfd-cli")]
#[command(about = "Client and draft tool for the DFD API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Per-request timeout in seconds.
    #[arg(short, long, default_value_t = 15)]
    timeout: u64,

    /// Config file; only the [autosave] section is used here.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Show remaining request budget (counts as a request)
    RateLimit,
    /// Fetch a CSRF token
    Token,
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Improve a piece of document text
    Improve {
        text: String,
        #[arg(long)]
        context: Option<String>,
    },
    /// Manage the locally saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Save a form JSON file as the current draft
    Save { file: PathBuf },
    /// Print the current draft
    Show,
    /// Delete the current draft
    Clear,
    /// Write the current draft as an export file
    Export { out: PathBuf },
    /// Replace the current draft with an export file
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Draft { action } => {
            let config = match &cli.config {
                Some(path) => load_config(path)?,
                None => ApiConfig::default(),
            };
            // Session storage dies with this process, so drafts only go to files.
            let store = AutoSaveStore::from_config(&config.autosave)?;
            store.ensure_durable()?;
            run_draft(action, store)?;
        }
        command => {
            let client = ApiClient::new(&cli.url, Duration::from_secs(cli.timeout))?;
            if let Err(e) = run_remote(command, &client).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_remote(command: Commands, client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Health => print_json(&client.health().await?)?,
        Commands::RateLimit => print_json(&client.rate_limit_status().await?)?,
        Commands::Token => println!("{}", client.csrf_token().await?),
        Commands::Contact { name, email, message } => {
            let form = ContactForm { name, email, message };
            print_json(&client.submit_contact(&form).await?)?;
        }
        Commands::Improve { text, context } => {
            println!("{}", client.improve_text(&text, context.as_deref()).await?);
        }
        Commands::Draft { .. } => unreachable!("handled locally"),
    }
    Ok(())
}

fn run_draft(action: DraftAction, store: AutoSaveStore) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DraftAction::Save { file } => {
            let form = read_form(&file)?;
            let saved_at = store.save(&form)?;
            println!("Draft saved at {}", saved_at.to_rfc3339());
        }
        DraftAction::Show => match store.restore()? {
            Some(form) => print_json(&form)?,
            None => println!("No draft saved"),
        },
        DraftAction::Clear => {
            store.clear()?;
            println!("Draft cleared");
        }
        DraftAction::Export { out } => {
            let form = store.restore()?.ok_or("no draft to export")?;
            std::fs::write(&out, ExportDocument::new(form).to_json()?)?;
            println!("Exported to {}", out.display());
        }
        DraftAction::Import { file } => {
            let document = ExportDocument::from_json(&std::fs::read_to_string(&file)?)?;
            store.save(&document.form_data)?;
            println!("Imported draft exported at {}", document.timestamp.to_rfc3339());
        }
    }
    Ok(())
}

fn read_form(path: &PathBuf) -> Result<FormState, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(&std::fs::read_to_string(path)?)? {
        Value::Object(form) => Ok(form),
        _ => Err("form file must contain a JSON object".into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
