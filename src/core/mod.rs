pub mod app;
pub mod config;
pub mod conversation;
pub mod message;
pub mod persistence;
pub mod provision;
pub mod state;
