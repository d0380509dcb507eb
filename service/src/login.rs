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

//! Login dialogue
//!
//! ```text
//!  AwaitingName --(new)--> AwaitingNewPassword <--(mismatch)--+
//!       |                        |                            |
//!       |                        v                            |
//!       |                 AwaitingPasswordConfirm ------------+
//!       |                        |
//!       +--(known)--> AwaitingExistingPassword --> Playing
//!                                |
//!                                +--(bad password)--> Closed
//! ```

use crate::events::EventKind;
use crate::session::Session;
use crate::types::{ConnectionId, ConnectionState, SessionId};
use crate::wheel::Owner;
use crate::world::World;
use pulsemud_telnetcodec::consts::{ECHO_OFF, ECHO_ON};
use tracing::error;

const ILLEGAL_NAME: &str = "Sorry, that's not a legal name, please pick another.\r\nWhat is your name? ";
const STORE_UNAVAILABLE: &str =
    "Unable to load that player right now, please try again.\r\nWhat is your name? ";
const NEW_PASSWORD: &str = "Please enter a new password: ";
const PASSWORD_LENGTH: &str = "Between 5 and 12 chars please!\r\nPlease enter a new password: ";
const ILLEGAL_PASSWORD: &str = "Illegal password!\r\nPlease enter a new password: ";
const VERIFY_PASSWORD: &str = "Please verify the password: ";
const PASSWORD_MISMATCH: &str = "Password mismatch!\r\nPlease enter a new password: ";
const EXISTING_PASSWORD: &str = "What is your password? ";
const BAD_PASSWORD: &str = "Bad password!\r\n";
const PFILE_MISSING: &str = "ERROR: Your pfile is missing!\r\n";
const TAKE_OVER: &str = "You take over a body already in use.\r\n";

/// Character reserved by the player store format
const RESERVED_DELIMITER: char = '~';

/// Feed one line of input to a connection that is still logging in
pub(crate) fn handle(world: &mut World, id: ConnectionId, line: &str) {
    let Some(conn) = world.connections.get(id) else {
        return;
    };
    let state = conn.state();
    let session = conn.session();
    match (state, session) {
        (ConnectionState::AwaitingName, _) => ask_name(world, id, line),
        (ConnectionState::AwaitingNewPassword, Some(session)) => {
            new_password(world, id, session, line)
        }
        (ConnectionState::AwaitingPasswordConfirm, Some(session)) => {
            confirm_password(world, id, session, line)
        }
        (ConnectionState::AwaitingExistingPassword, Some(session)) => {
            existing_password(world, id, session, line)
        }
        (state, None) if state.is_negotiating() => {
            error!(connection_id = %id, %state, "Login state without a session");
            world.close_connection(id, false);
        }
        _ => {}
    }
}

/// Names are 3 to 12 ASCII letters
pub(crate) fn is_valid_name(name: &str) -> bool {
    (3..=12).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphabetic())
}

/// Upper-case the first letter, lower-case the rest
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn ask_name(world: &mut World, id: ConnectionId, line: &str) {
    let name = line.trim();
    if !is_valid_name(name) {
        world.send(id, ILLEGAL_NAME);
        return;
    }
    let name = capitalize(name);
    world.log(&format!("{name} is trying to connect."));

    let (session, prompt, next) = match world.store.load(&name) {
        Ok(Some(record)) => (
            world.sessions.from_record(record),
            EXISTING_PASSWORD,
            ConnectionState::AwaitingExistingPassword,
        ),
        Ok(None) => (
            world.sessions.create(name),
            NEW_PASSWORD,
            ConnectionState::AwaitingNewPassword,
        ),
        Err(err) => {
            error!(connection_id = %id, name = %name, error = %err, "Failed to load player");
            world.send(id, STORE_UNAVAILABLE);
            return;
        }
    };

    world.send(id, prompt);
    world.send_raw(id, &ECHO_OFF);
    world.link(session, id);
    world.set_state(id, next);
}

fn new_password(world: &mut World, id: ConnectionId, session: SessionId, line: &str) {
    if !(5..=12).contains(&line.len()) {
        world.send(id, PASSWORD_LENGTH);
        return;
    }
    let hash = match world.credentials.hash(line) {
        Ok(hash) if !hash.contains(RESERVED_DELIMITER) => hash,
        Ok(_) => {
            world.send(id, ILLEGAL_PASSWORD);
            return;
        }
        Err(err) => {
            error!(connection_id = %id, error = %err, "Failed to hash password");
            world.send(id, ILLEGAL_PASSWORD);
            return;
        }
    };
    if let Some(entry) = world.sessions.get_mut(session) {
        entry.set_password_hash(Some(hash));
    }
    world.send(id, VERIFY_PASSWORD);
    world.set_state(id, ConnectionState::AwaitingPasswordConfirm);
}

fn confirm_password(world: &mut World, id: ConnectionId, session: SessionId, line: &str) {
    if !verify(world, session, line) {
        if let Some(entry) = world.sessions.get_mut(session) {
            entry.set_password_hash(None);
        }
        world.send(id, PASSWORD_MISMATCH);
        world.set_state(id, ConnectionState::AwaitingNewPassword);
        return;
    }

    world.send_raw(id, &ECHO_ON);
    let name = session_name(world, session);
    world.set_state(id, ConnectionState::Playing);
    world.log(&format!("New player: {name} has entered the game."));
    enter_game(world, id, session);
}

fn existing_password(world: &mut World, id: ConnectionId, shell: SessionId, line: &str) {
    world.send_raw(id, &ECHO_ON);
    if !verify(world, shell, line) {
        world.write_direct(id, BAD_PASSWORD);
        world.close_connection(id, false);
        return;
    }
    let name = session_name(world, shell);

    if let Some(live) = world.sessions.find_active_by_name(&name) {
        if let Some(old) = world.sessions.get(live).and_then(Session::connection) {
            world.close_connection(old, true);
        }
        world.free_session(shell);
        world.link(live, id);
        world.log(&format!("{name} has reconnected."));
        world.set_state(id, ConnectionState::Playing);
        world.send(id, TAKE_OVER);
        world
            .wheel
            .strip(Owner::Connection(id), EventKind::ConnectionIdle);
        return;
    }

    let record = match world.store.load(&name) {
        Ok(Some(record)) => record,
        Ok(None) => {
            world.write_direct(id, PFILE_MISSING);
            world.close_connection(id, false);
            return;
        }
        Err(err) => {
            error!(connection_id = %id, name = %name, error = %err, "Failed to reload player");
            world.write_direct(id, PFILE_MISSING);
            world.close_connection(id, false);
            return;
        }
    };
    world.free_session(shell);
    let session = world.sessions.from_record(record);
    world.link(session, id);
    world.set_state(id, ConnectionState::Playing);
    world.log(&format!("{name} has entered the game."));
    enter_game(world, id, session);
}

fn verify(world: &World, session: SessionId, password: &str) -> bool {
    world
        .sessions
        .get(session)
        .and_then(Session::password_hash)
        .is_some_and(|hash| world.credentials.verify(password, hash))
}

fn session_name(world: &World, session: SessionId) -> String {
    world
        .sessions
        .get(session)
        .map(|entry| entry.name().to_string())
        .unwrap_or_default()
}

/// Put a freshly logged in session into the game
fn enter_game(world: &mut World, id: ConnectionId, session: SessionId) {
    world.sessions.activate(session);
    let motd = world.help.motd().to_string();
    world.send(id, &motd);

    let delay = world.config.ticks(world.config.autosave_interval);
    if let Err(err) = world
        .wheel
        .register_owned(Owner::Session(session), EventKind::SessionSave, delay)
    {
        error!(session_id = %session, error = %err, "Failed to schedule autosave");
    }
    world
        .wheel
        .strip(Owner::Connection(id), EventKind::ConnectionIdle);
    world.save_session(session);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        assert!(is_valid_name("Bob"));
        assert!(is_valid_name("abcdefghijkl"));
        assert!(!is_valid_name("Al"));
        assert!(!is_valid_name("abcdefghijklm"));
        assert!(!is_valid_name("Bob1"));
        assert!(!is_valid_name("Bo b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("alice"), "Alice");
        assert_eq!(capitalize("ALICE"), "Alice");
        assert_eq!(capitalize("aLiCe"), "Alice");
        assert_eq!(capitalize(""), "");
    }
}
