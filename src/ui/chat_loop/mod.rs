//! Main chat event loop.
//!
//! Terminal events, actions dispatched by background tasks, and a redraw
//! tick are multiplexed here. Every state change goes through
//! [`apply_action`]; commands it returns are handed to the
//! [`executors::CommandExecutor`].

pub mod executors;
mod keybindings;
mod lifecycle;

use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use self::executors::CommandExecutor;
use self::keybindings::{map_key, map_paste};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use crate::core::app::{apply_action, App, AppAction, AppActionDispatcher};
use crate::core::provision::ProvisioningService;
use crate::ui::icons::IconSet;
use crate::ui::renderer::ui;
use crate::ui::view::project;

const TICK: Duration = Duration::from_millis(250);

/// How long the reader thread blocks before checking whether the loop is
/// still listening.
const READ_POLL: Duration = Duration::from_millis(50);

/// Reads terminal events on a blocking thread and forwards them. The thread
/// ends within one [`READ_POLL`] after the receiver is dropped.
fn forward_terminal_events(tx: mpsc::UnboundedSender<Event>) {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(READ_POLL) {
                Ok(false) => {}
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(error = %err, "Skipping unreadable terminal event"),
                },
                Err(err) => {
                    warn!(error = %err, "Terminal event polling failed");
                    break;
                }
            }
        }
    });
}

fn draw(terminal: &mut ChatTerminal, app: &App, icons: Option<&IconSet>) -> std::io::Result<()> {
    let view = project(&app.get_state(), &app.ui, icons);
    terminal.draw(|f| ui(f, &view))?;
    Ok(())
}

fn handle_terminal_event(app: &App, event: Event) -> Vec<AppAction> {
    match event {
        Event::Key(key) => map_key(app, key),
        Event::Paste(text) => map_paste(app, text),
        _ => Vec::new(),
    }
}

fn apply_and_execute(app: &mut App, executor: &CommandExecutor, actions: Vec<AppAction>) {
    for action in actions {
        if let Some(command) = apply_action(app, action) {
            executor.execute(command);
        }
    }
}

/// Runs the interactive session until the user quits.
pub async fn run_chat(
    mut app: App,
    service: ProvisioningService,
    icons: Option<IconSet>,
) -> Result<(), Box<dyn Error>> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppAction>();
    let executor = CommandExecutor::new(service, AppActionDispatcher::new(action_tx));

    if let Some(command) = app.start() {
        executor.execute(command);
    }
    info!(screen = app.state.current_screen.as_str(), "Chat session started");

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    forward_terminal_events(event_tx);
    let mut tick = tokio::time::interval(TICK);

    let result: Result<(), Box<dyn Error>> = loop {
        if app.ui.exit_requested {
            break Ok(());
        }
        if let Err(err) = draw(&mut terminal, &app, icons.as_ref()) {
            break Err(err.into());
        }

        tokio::select! {
            Some(event) = event_rx.recv() => {
                let actions = handle_terminal_event(&app, event);
                apply_and_execute(&mut app, &executor, actions);
            }
            Some(action) = action_rx.recv() => {
                let mut actions = vec![action];
                while let Ok(next) = action_rx.try_recv() {
                    actions.push(next);
                }
                apply_and_execute(&mut app, &executor, actions);
            }
            _ = tick.tick() => {}
        }
    };

    drop(event_rx);
    if let Some(token) = app.session.load_cancel_token.as_ref() {
        token.cancel();
    }
    restore_terminal(&mut terminal)?;
    debug!("Terminal restored");
    result
}
