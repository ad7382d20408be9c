//! Command-line interface parsing and handling
//!
//! `neoai` with no subcommand opens the chat shell. The other subcommands
//! act on persisted state or configuration without starting the UI.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::app::{apply_action, App, AppAction, AppCommand};
use crate::core::config::Config;
use crate::core::persistence::{FileStateStore, MemoryStateStore, StateStore};
use crate::core::provision::{OllamaBackend, ProvisioningService};
use crate::core::state::startup_screen;
use crate::ui::chat_loop::run_chat;
use crate::ui::icons::IconSet;
use crate::utils::logging;

#[derive(Parser)]
#[command(name = "neoai")]
#[command(version)]
#[command(about = "A terminal chat shell for a locally provisioned language model")]
#[command(
    long_about = "NeoAI walks you through a short onboarding, downloads and loads a local \
language model through the Ollama runtime, and then lets you chat with it. Your \
onboarding choice and chat history are kept between sessions.\n\n\
Controls:\n\
  Enter             Confirm onboarding / send the message / retry a failed load\n\
  Esc               Cancel a running download (asks for confirmation)\n\
  Up/Down/PgUp/PgDn Scroll through the chat\n\
  Ctrl+L            Clear all chats\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show keyboard shortcuts and commands\n\
  /clear            Clear all chats\n\
  /clear-cache      Purge the model cache and the stored state\n\
  /reset            Start over from onboarding\n\
  /quit             Leave NeoAI\n\n\
Environment Variables:\n\
  NEOAI_LOG         Log filter used with --log (default: neoai=info)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to provision, overriding the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Keep state in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Print the stored application state as JSON
    Status,
    /// Forget onboarding and chat history
    Reset,
    /// Purge the runtime's model cache and the stored state
    ClearCache,
    /// Set configuration values, or print them when no value is given
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.log.as_deref())?;

    match args.command {
        Some(Commands::Set { key, value }) => {
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            config.set_value(&key, value.join(" "))?;
            config.save()?;
            println!("✅ Set {key} to: {}", value.join(" "));
            Ok(())
        }
        Some(Commands::Unset { key }) => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Some(Commands::Config) => {
            Config::load()?.print_all();
            Ok(())
        }
        command => {
            let config = Config::load()?;
            let (app, service) = bootstrap(args.model.as_deref(), args.ephemeral, &config)?;
            match command.unwrap_or(Commands::Chat) {
                Commands::Status => {
                    println!("{}", status_json(&app)?);
                    Ok(())
                }
                Commands::Reset => {
                    let mut app = app;
                    reset(&mut app);
                    println!("✅ Onboarding and chat history reset");
                    Ok(())
                }
                Commands::ClearCache => {
                    let mut app = app;
                    let message = clear_cache(&mut app, &service).await?;
                    println!("✅ {message}");
                    Ok(())
                }
                _ => run_chat(app, service, IconSet::detect()).await,
            }
        }
    }
}

fn open_store(ephemeral: bool) -> Result<Box<dyn StateStore>, Box<dyn Error>> {
    if ephemeral {
        return Ok(Box::new(MemoryStateStore::new()));
    }
    let store = FileStateStore::at_default_location()
        .ok_or("Could not determine a data directory for NeoAI")?;
    info!(path = %store.path().display(), "Using state file");
    Ok(Box::new(store))
}

fn bootstrap(
    model: Option<&str>,
    ephemeral: bool,
    config: &Config,
) -> Result<(App, ProvisioningService), Box<dyn Error>> {
    let mut request = config.model_request();
    if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
        request.model = model.to_string();
    }

    let backend = OllamaBackend::new(config.runtime_url());
    let service = ProvisioningService::new(Arc::new(backend));
    let app = App::new(open_store(ephemeral)?, request);
    Ok((app, service))
}

/// The snapshot an interactive session would start from, without starting a
/// load.
pub fn status_json(app: &App) -> Result<String, serde_json::Error> {
    let mut snapshot = app.get_state();
    snapshot.state.current_screen =
        startup_screen(snapshot.state.onboarding_complete, snapshot.state.model_loaded);
    serde_json::to_string_pretty(&snapshot)
}

pub fn reset(app: &mut App) {
    apply_action(app, AppAction::ResetOnboarding);
}

/// Runs the cache-clear boundary to completion and reports its outcome.
pub async fn clear_cache(
    app: &mut App,
    service: &ProvisioningService,
) -> Result<String, Box<dyn Error>> {
    let Some(AppCommand::PurgeCaches { request }) = apply_action(app, AppAction::ClearModelCache)
    else {
        return Err("Cache clear was not scheduled".into());
    };

    let purge_result = service
        .purge_caches(&request)
        .await
        .map_err(|err| err.to_string());
    apply_action(app, AppAction::CacheClearFinished { purge_result });

    match app.ui.status.take() {
        Some(note) if note.is_error => Err(note.text.into()),
        Some(note) => Ok(note.text),
        None => Ok(String::new()),
    }
}
