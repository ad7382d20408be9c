//! Terminal UI layer.
//!
//! - [`view`]: pure projection of app state into what each screen shows.
//! - [`renderer`]: draws a projected view with ratatui.
//! - [`chat_loop`]: the event loop that maps keys to actions and runs the
//!   async work the reducer asks for.
//! - [`icons`]: optional glyphs for terminals that can show them.
//!
//! This layer never mutates [`crate::core`] state directly; everything
//! flows through actions.

pub mod chat_loop;
pub mod icons;
pub mod renderer;
pub mod view;
