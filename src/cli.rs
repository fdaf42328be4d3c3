//! Command-line interface definitions for Grok Compare.
//!
//! Global options can be given as flags or environment variables; a `.env`
//! file in the working directory is loaded before parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

use crate::api::{DEFAULT_MODEL, GEMINI_ORIGIN};
use crate::normalizer::GROKIPEDIA_ORIGIN;
use crate::scrapers::wikipedia::WIKIPEDIA_ORIGIN;

/// Command-line arguments for Grok Compare.
///
/// # Examples
///
/// ```sh
/// # Fetch both articles
/// grok_compare search "Ada Lovelace"
///
/// # Fetch, compare with Gemini and save
/// GEMINI_API_KEY=... grok_compare compare "Ada Lovelace"
///
/// # Browse saved comparisons
/// grok_compare list
/// grok_compare show 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Gemini API key; only needed for comparisons
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Path to the SQLite database
    #[arg(short, long, env = "DATABASE_PATH", default_value = "./comparisons.db")]
    pub database: PathBuf,

    /// YAML file with `system_instruction` and/or `task_instruction`
    #[arg(short, long, env = "PROMPTS_FILE")]
    pub prompts: Option<PathBuf>,

    /// Grokipedia origin
    #[arg(long, env = "GROKIPEDIA_URL", value_parser = parse_origin, default_value = GROKIPEDIA_ORIGIN)]
    pub grokipedia_url: String,

    /// Wikipedia origin
    #[arg(long, env = "WIKIPEDIA_URL", value_parser = parse_origin, default_value = WIKIPEDIA_ORIGIN)]
    pub wikipedia_url: String,

    /// Gemini API origin
    #[arg(long, env = "GEMINI_URL", value_parser = parse_origin, default_value = GEMINI_ORIGIN)]
    pub gemini_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a topic from both sources and print the normalized content
    Search {
        topic: String,
    },

    /// Fetch a topic, compare both sources with Gemini, and save the result
    Compare {
        topic: String,

        /// Override the system instruction for this run
        #[arg(long)]
        system_prompt: Option<String>,

        /// Override the task instruction for this run
        #[arg(long)]
        task_prompt: Option<String>,
    },

    /// List saved comparisons, newest first
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one saved comparison
    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Delete a saved comparison
    Delete {
        id: i64,
    },

    /// Serve the JSON API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

/// Accept an absolute http(s) origin and drop any trailing slash.
fn parse_origin(raw: &str) -> Result<String, String> {
    let parsed = Url::parse(raw).map_err(|e| format!("invalid URL '{raw}': {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", parsed.scheme()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
