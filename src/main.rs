//! # Grok Compare
//!
//! Fetches the same topic from Grokipedia and Wikipedia, asks Gemini to
//! compare the two articles, and keeps every comparison in a local SQLite
//! database.
//!
//! ## Usage
//!
//! ```sh
//! grok_compare search "Ada Lovelace"
//! grok_compare compare "Ada Lovelace"
//! grok_compare list
//! grok_compare serve --port 3000
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: the Grokipedia page and the Wikipedia extract are
//!    requested concurrently
//! 2. **Normalization**: the Grokipedia article is cut out of the page and
//!    its site-relative links are made absolute
//! 3. **Analysis**: both texts go to Gemini with the configured prompts
//! 4. **Persistence**: the pair and the analysis are saved as one record

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod document;
mod error;
mod models;
mod normalizer;
mod orchestrator;
mod outputs;
mod prompts;
mod scrapers;
mod server;
mod store;
mod utils;

use api::GeminiClient;
use cli::{Cli, Command};
use orchestrator::ComparisonOrchestrator;
use outputs::{json, markdown};
use prompts::PromptConfiguration;
use scrapers::{GrokipediaFetcher, WikipediaFetcher};
use store::ComparisonStore;
use utils::ensure_database_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(database = %args.database.display(), model = %args.model, "Parsed CLI arguments");

    // --- Collaborators ---
    let client = reqwest::Client::builder()
        .user_agent(concat!("grok_compare/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let grokipedia = GrokipediaFetcher::with_base_url(client.clone(), &args.grokipedia_url);
    let wikipedia = WikipediaFetcher::with_base_url(client.clone(), &args.wikipedia_url);
    let engine = GeminiClient::new(client, args.gemini_api_key.clone())
        .with_model(&args.model)
        .with_base_url(&args.gemini_url);

    if let Err(e) = ensure_database_dir(&args.database).await {
        error!(
            path = %args.database.display(),
            error = %e,
            "Database directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let store = ComparisonStore::open(&args.database)?;
    info!(path = %store.database_path().display(), "Comparison store ready");

    match args.command {
        Command::Serve { port, host } => {
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            let state = server::AppState::new(grokipedia, wikipedia, engine, store);
            server::serve(state, addr).await?;
        }

        Command::Search { topic } => {
            let mut orchestrator = ComparisonOrchestrator::new(grokipedia, wikipedia, engine, store);
            let results = orchestrator.search(&topic).await?;
            println!("# {}\n", results.term);
            println!("## Grokipedia\n\n{}\n", results.grokipedia_html);
            println!("## Wikipedia\n\n{}", results.wikipedia_text);
        }

        Command::Compare {
            topic,
            system_prompt,
            task_prompt,
        } => {
            let prompts = match &args.prompts {
                Some(path) => PromptConfiguration::load(path).await?,
                None => PromptConfiguration::default(),
            }
            .with_overrides(system_prompt, task_prompt);

            let mut orchestrator = ComparisonOrchestrator::new(grokipedia, wikipedia, engine, store);
            orchestrator.search(&topic).await?;
            if let Some(results) = orchestrator.results() {
                info!(
                    term = %results.term,
                    grokipedia_bytes = results.grokipedia_html.len(),
                    wikipedia_bytes = results.wikipedia_text.len(),
                    "Comparing sources"
                );
            }
            match orchestrator.compare_current(&prompts).await {
                Ok(outcome) => {
                    println!("{}", outcome.analysis);
                    info!(id = outcome.id, "Comparison complete");
                    eprintln!("Saved comparison #{}", outcome.id);
                }
                Err(e) => {
                    // Saving can fail after Gemini has answered.
                    if let Some(analysis) = orchestrator.analysis().filter(|a| !a.is_empty()) {
                        println!("{analysis}");
                    }
                    error!(
                        stage = ?orchestrator.stage(),
                        error = orchestrator.last_error().unwrap_or_default(),
                        "Comparison failed"
                    );
                    return Err(e.into());
                }
            }
        }

        Command::List { json: as_json } => {
            let records = store.list_all()?;
            if as_json {
                println!("{}", json::records_to_json(&records)?);
            } else {
                print!("{}", markdown::records_to_markdown(&records));
            }
        }

        Command::Show { id, json: as_json } => match store.get_by_id(id)? {
            Some(record) if as_json => println!("{}", json::record_to_json(&record)?),
            Some(record) => print!("{}", markdown::record_to_markdown(&record)),
            None => {
                error!(id, "Comparison not found");
                return Err(format!("Comparison not found: {id}").into());
            }
        },

        Command::Delete { id } => {
            if store.delete_by_id(id)? {
                println!("Deleted comparison #{id}");
            } else {
                error!(id, "Comparison not found");
                return Err(format!("Comparison not found: {id}").into());
            }
        }
    }

    Ok(())
}
