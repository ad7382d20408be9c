//! NeoAI is a terminal chat shell that walks a user through onboarding,
//! provisions a local language model, and then chats with it turn by turn.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the application state, persistence, the conversation
//!   store, model provisioning, and the lifecycle controller that ties them
//!   together.
//! - [`ui`] projects controller state into a view model, renders it with
//!   ratatui, and runs the event loop that executes the controller's async
//!   commands.
//! - [`commands`] implements slash-command parsing for the chat input.
//! - [`api`] defines the chat and model-runtime payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
