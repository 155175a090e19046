//! `famtree`: command-line driver for a famtree store.
//!
//! Reads `famtree.toml` (or the path given with `--config`), opens the SQLite
//! store it names, runs one subcommand and prints the result as JSON.
//!
//! # Usage
//!
//! ```
//! famtree register --username ada --email ada@example.com \
//!   --first-name Ada --last-name Lovelace --gender f
//! famtree fill ada 3
//! famtree persons --token <authtoken>
//! famtree load data.json
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use famtree_core::{corpus::StaticCorpus, person::Gender};
use famtree_services::{
  AccountService, FetchService, FillService, LoadRequest, Registration,
};
use famtree_store_sqlite::Database;
use serde::Serialize;
use settings::CliConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "famtree", version, about = "Family tree store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "famtree.toml")]
  config: PathBuf,

  /// SQLite store path; overrides `store_path` from the config.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create a user and fill their tree.
  Register {
    #[arg(long)]
    username:    String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password:    Option<String>,
    #[arg(long)]
    email:       String,
    #[arg(long)]
    first_name:  String,
    #[arg(long)]
    last_name:   String,
    /// `m` or `f`.
    #[arg(long)]
    gender:      Gender,
    #[arg(long)]
    generations: Option<i32>,
  },
  /// Issue a new auth token.
  Login {
    #[arg(long)]
    username: String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password: Option<String>,
  },
  /// Invalidate an auth token.
  Logout {
    #[arg(long)]
    token: String,
  },
  /// Replace a user's tree with generated ancestors.
  Fill {
    username:    String,
    generations: Option<i32>,
  },
  /// Delete everything in the store.
  Clear,
  /// Clear the store and load users, persons and events from a JSON file.
  Load { file: PathBuf },
  /// List the token owner's persons, or show one by id.
  Persons {
    #[arg(long)]
    token: String,
    #[arg(long)]
    id:    Option<String>,
  },
  /// List the token owner's events, or show one by id.
  Events {
    #[arg(long)]
    token: String,
    #[arg(long)]
    id:    Option<String>,
  },
}

fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries the JSON result.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config, cli.store.as_deref())?;

  let db = Database::open(&cfg.store_path).with_context(|| {
    format!("failed to open store at {:?}", cfg.store_path)
  })?;
  let corpus = match &cfg.corpus_dir {
    Some(dir) => StaticCorpus::from_dir(dir)
      .with_context(|| format!("failed to read corpus from {dir:?}"))?,
    None => StaticCorpus::builtin().context("built-in corpus is invalid")?,
  };

  let accounts = AccountService::new(&db, &corpus);
  let fetch = FetchService::new(&db);

  match cli.command {
    Command::Register {
      username,
      password,
      email,
      first_name,
      last_name,
      gender,
      generations,
    } => {
      let registration = Registration {
        password: password_or_stdin(password)?,
        username,
        email,
        first_name,
        last_name,
        gender,
      };
      let generations = generations.unwrap_or(cfg.default_generations);
      print_json(&accounts.register(registration, generations)?)
    }
    Command::Login { username, password } => {
      let password = password_or_stdin(password)?;
      print_json(&accounts.login(&username, &password)?)
    }
    Command::Logout { token } => {
      accounts.revoke(&token)?;
      print_json(&serde_json::json!({ "success": true }))
    }
    Command::Fill { username, generations } => {
      let generations = generations.unwrap_or(cfg.default_generations);
      let summary =
        FillService::new(&db, &corpus).fill(&username, generations)?;
      print_json(&summary)
    }
    Command::Clear => {
      famtree_services::clear(&db)?;
      print_json(&serde_json::json!({ "success": true }))
    }
    Command::Load { file } => {
      let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {file:?}"))?;
      let request: LoadRequest = serde_json::from_str(&text)
        .with_context(|| format!("{file:?} is not a valid load request"))?;
      print_json(&famtree_services::load(&db, request)?)
    }
    Command::Persons { token, id: Some(id) } => {
      print_json(&fetch.person(&token, &id)?)
    }
    Command::Persons { token, id: None } => print_json(&fetch.persons(&token)?),
    Command::Events { token, id: Some(id) } => {
      print_json(&fetch.event(&token, &id)?)
    }
    Command::Events { token, id: None } => print_json(&fetch.events(&token)?),
  }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let text =
    serde_json::to_string_pretty(value).context("failed to encode result")?;
  println!("{text}");
  Ok(())
}

/// Use `password` if given, otherwise read one line from stdin.
fn password_or_stdin(password: Option<String>) -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};

  if let Some(password) = password {
    return Ok(password);
  }
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin()
    .lock()
    .read_line(&mut line)
    .context("failed to read password")?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}
