//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Player commands

use crate::types::{Level, SessionId};
use crate::world::World;
use std::fmt::Write;
use tracing::debug;

/// Signature of a command handler. The argument is the rest of the line, trimmed.
pub type CommandFn = fn(&mut World, SessionId, &str);

/// Entry in the command table
#[derive(Clone, Copy)]
pub struct Command {
    /// Full command name
    pub name: &'static str,
    /// Handler
    pub handler: CommandFn,
    /// Lowest level allowed to use the command
    pub level: Level,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// The command table. Abbreviations resolve to the first entry they prefix.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "commands",
        handler: cmd_commands,
        level: Level::Guest,
    },
    Command {
        name: "help",
        handler: cmd_help,
        level: Level::Guest,
    },
    Command {
        name: "linkdead",
        handler: cmd_linkdead,
        level: Level::Admin,
    },
    Command {
        name: "say",
        handler: cmd_say,
        level: Level::Guest,
    },
    Command {
        name: "save",
        handler: cmd_save,
        level: Level::Guest,
    },
    Command {
        name: "shutdown",
        handler: cmd_shutdown,
        level: Level::God,
    },
    Command {
        name: "quit",
        handler: cmd_quit,
        level: Level::Guest,
    },
    Command {
        name: "who",
        handler: cmd_who,
        level: Level::Guest,
    },
];

/// Split a line into its lower-cased command word and the trimmed remainder
pub fn split_command(line: &str) -> (String, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_ascii_lowercase(), rest.trim()),
        None => (line.to_ascii_lowercase(), ""),
    }
}

/// First command available at `level` whose name starts with `word`
pub fn find(word: &str, level: Level) -> Option<&'static Command> {
    if word.is_empty() {
        return None;
    }
    COMMANDS
        .iter()
        .filter(|command| command.level <= level)
        .find(|command| command.name.starts_with(word))
}

/// Run one line of player input
pub fn dispatch(world: &mut World, session: SessionId, line: &str) {
    let Some(level) = world.session(session).map(|entry| entry.level()) else {
        return;
    };
    let (word, argument) = split_command(line);
    match find(&word, level) {
        Some(command) => {
            debug!(session_id = %session, command = command.name, "Dispatching command");
            (command.handler)(world, session, argument);
        }
        None => world.send_to_session(session, "No such command.\r\n"),
    }
}

fn session_name(world: &World, session: SessionId) -> String {
    world
        .session(session)
        .map(|entry| entry.name().to_string())
        .unwrap_or_default()
}

/// Lay out names in four columns, each padded to `width` and cut at `precision`
fn columns<'a>(
    names: impl Iterator<Item = &'a str>,
    width: usize,
    precision: usize,
    out: &mut String,
) {
    let mut col = 0;
    for name in names {
        let _ = write!(out, " {name:<width$.precision$}");
        col += 1;
        if col % 4 == 0 {
            out.push_str("\r\n");
        }
    }
    if col % 4 != 0 {
        out.push_str("\r\n");
    }
}

fn cmd_commands(world: &mut World, session: SessionId, _argument: &str) {
    let Some(level) = world.session(session).map(|entry| entry.level()) else {
        return;
    };
    let mut out = String::from("    - - - - ----==== The full command list ====---- - - - -\r\n\r\n");
    let names = COMMANDS
        .iter()
        .filter(|command| command.level <= level)
        .map(|command| command.name);
    columns(names, 16, 16, &mut out);
    world.send_to_session(session, &out);
}

fn cmd_help(world: &mut World, session: SessionId, argument: &str) {
    if argument.is_empty() {
        let mut out = String::from(
            "      - - - - - ----====//// HELP FILES  \\\\\\\\====---- - - - - -\r\n\r\n",
        );
        columns(world.help.keywords(), 19, 18, &mut out);
        out.push_str("\r\n Syntax: help <topic>\r\n");
        world.send_to_session(session, &out);
        return;
    }
    let text = world
        .help
        .lookup(argument)
        .map(|entry| format!("=== {} ===\r\n{}", entry.keyword(), entry.text()));
    match text {
        Some(text) => world.send_to_session(session, &text),
        None => world.send_to_session(session, "Sorry, no such helpfile.\r\n"),
    }
}

fn cmd_linkdead(world: &mut World, session: SessionId, _argument: &str) {
    let names: Vec<String> = world
        .sessions()
        .active()
        .iter()
        .filter_map(|id| world.session(*id))
        .filter(|entry| entry.is_linkdead())
        .map(|entry| entry.name().to_string())
        .collect();
    if names.is_empty() {
        world.send_to_session(session, "No one is currently linkdead.\r\n");
        return;
    }
    for name in names {
        world.send_to_session(session, &format!("{name} is linkdead.\r\n"));
    }
}

fn cmd_say(world: &mut World, session: SessionId, argument: &str) {
    if argument.is_empty() {
        world.send_to_session(session, "Say what?\r\n");
        return;
    }
    let name = session_name(world, session);
    world.send_to_session(session, &format!("You say '{argument}'.\r\n"));
    let message = format!("{name} says '{argument}'.\r\n");
    for other in world.sessions().active().to_vec() {
        if other != session {
            world.send_to_session(other, &message);
        }
    }
}

fn cmd_save(world: &mut World, session: SessionId, _argument: &str) {
    world.save_session(session);
    world.send_to_session(session, "Saved.\r\n");
}

fn cmd_shutdown(world: &mut World, session: SessionId, _argument: &str) {
    let name = session_name(world, session);
    world.log(&format!("{name} has requested a shutdown."));
    world.request_shutdown();
}

fn cmd_quit(world: &mut World, session: SessionId, _argument: &str) {
    let name = session_name(world, session);
    world.log(&format!("{name} has left the game."));
    world.save_session(session);
    let connection = world.session(session).and_then(|entry| entry.connection());
    world.free_session(session);
    if let Some(connection) = connection {
        world.close_connection(connection, false);
    }
}

fn cmd_who(world: &mut World, session: SessionId, _argument: &str) {
    let mut out = String::from(" - - - - ----==== Who's Online ====---- - - - -\r\n");
    for conn in world.connections().iter() {
        if !conn.state().is_playing() {
            continue;
        }
        let Some(player) = conn.session().and_then(|id| world.session(id)) else {
            continue;
        };
        let _ = write!(out, " {:<12}   {}\r\n", player.name(), conn.hostname());
    }
    out.push_str(" - - - - ----======================---- - - - -\r\n");
    world.send_to_session(session, &out);
}
