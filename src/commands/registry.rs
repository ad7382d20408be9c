use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, for completion hints.
pub fn matching_commands(prefix: &str) -> impl Iterator<Item = &'static Command> + '_ {
    all_commands().iter().filter(move |command| {
        command
            .name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        help: "Zeigt die verfügbaren Befehle und Tastenkürzel.",
        handler: super::handle_help,
    },
    Command {
        name: "clear",
        help: "Löscht alle Chats.",
        handler: super::handle_clear,
    },
    Command {
        name: "clear-cache",
        help: "Löscht den Modell-Cache und den gespeicherten Zustand.",
        handler: super::handle_clear_cache,
    },
    Command {
        name: "reset",
        help: "Setzt die Einführung zurück und beginnt von vorn.",
        handler: super::handle_reset,
    },
    Command {
        name: "quit",
        help: "Beendet NeoAI.",
        handler: super::handle_quit,
    },
];
