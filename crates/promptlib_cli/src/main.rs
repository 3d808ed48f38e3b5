//! Terminal probe over the prompt library dispatch surface.
//!
//! # Responsibility
//! - Open the SQLite-backed library and apply one action per invocation.
//! - Print the resulting canonical state as pretty JSON.

use clap::{Parser, Subcommand};
use log::error;
use promptlib_core::{
    default_log_level, init_logging, LibraryService, LibraryState, Prompt, ServiceError,
    SqliteStateStore, StoreError,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "promptlib", version, about = "Personal prompt library")]
struct Cli {
    /// SQLite database file holding the library.
    #[arg(long, env = "PROMPTLIB_DB", default_value = "promptlib.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "PROMPTLIB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "PROMPTLIB_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the canonical state.
    State,
    /// Print prompts of the active list, or of `--list`.
    Prompts {
        #[arg(long)]
        list: Option<String>,
    },
    /// Create a list.
    CreateList { name: String },
    /// Make a list active.
    SetActive { list_id: String },
    /// Create a prompt in the active list, or in `--list`.
    CreatePrompt {
        body: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        list: Option<String>,
    },
    /// Delete a prompt.
    DeletePrompt { prompt_id: String },
    /// Delete a list, optionally moving its prompts to `--into`.
    DeleteList {
        list_id: String,
        #[arg(long)]
        into: Option<String>,
    },
}

impl Command {
    /// Maps the subcommand onto a dispatch name and payload.
    fn to_dispatch(&self) -> (&'static str, Value) {
        match self {
            Self::State | Self::Prompts { .. } => ("getState", json!({})),
            Self::CreateList { name } => ("createList", json!({ "name": name })),
            Self::SetActive { list_id } => ("setActiveList", json!({ "listId": list_id })),
            Self::CreatePrompt { body, title, list } => (
                "createPrompt",
                json!({ "title": title, "body": body, "listId": list }),
            ),
            Self::DeletePrompt { prompt_id } => {
                ("deletePrompt", json!({ "promptId": prompt_id }))
            }
            Self::DeleteList { list_id, into } => (
                "deleteList",
                json!({ "listId": list_id, "destinationListId": into }),
            ),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, ServiceError> {
    let store = SqliteStateStore::open(&cli.db)?;
    let mut library = LibraryService::new(store);
    let (action_name, payload) = cli.command.to_dispatch();
    let state = library.dispatch(action_name, &payload)?;

    let rendered = match &cli.command {
        Command::Prompts { list } => {
            serde_json::to_string_pretty(&PromptsView::new(&state, list.as_deref()))
        }
        _ => serde_json::to_string_pretty(&state),
    };
    rendered.map_err(|err| ServiceError::from(StoreError::from(err)))
}

/// Prompts of one list, newest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptsView<'a> {
    list_id: &'a str,
    count: usize,
    prompts: Vec<&'a Prompt>,
}

impl<'a> PromptsView<'a> {
    fn new(state: &'a LibraryState, list_id: Option<&'a str>) -> Self {
        let list_id = list_id.unwrap_or(state.settings.active_list_id.as_str());
        let prompts: Vec<&Prompt> = state.prompts_in_list(list_id).collect();
        Self {
            list_id,
            count: prompts.len(),
            prompts,
        }
    }
}
