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

//! Game world
//!
//! The [`World`] owns every piece of server state: the connection and session
//! registries, the timing wheel, the player store and the help library. It is driven
//! one tick at a time by [`World::pulse`] and never blocks, which makes it usable
//! without a network from tests.

use crate::commands;
use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::events::EventKind;
use crate::help::HelpLibrary;
use crate::login;
use crate::password::Credentials;
use crate::registry::ConnectionRegistry;
use crate::session::{Session, SessionRegistry};
use crate::store::PlayerStore;
use crate::transport::Transport;
use crate::types::{ConnectionId, ConnectionState, SessionId};
use crate::wheel::{Owner, TimingWheel};
use crate::{Result, ServerError};
use metrics::counter;
use tracing::{debug, error, info, trace, warn};

const INPUT_OVERFLOW: &str = "\r\n!!!! Input Overflow !!!!\r\n";
const SHUTDOWN_NOTICE: &str = "\r\nThe server is shutting down!\r\n";
const TAKEN_OVER: &str = "This connection has been taken over.\r\n";

/// All server state
#[derive(Debug)]
pub struct World {
    pub(crate) config: ServerConfig,
    pub(crate) connections: ConnectionRegistry,
    pub(crate) sessions: SessionRegistry,
    pub(crate) wheel: TimingWheel<EventKind>,
    pub(crate) store: Box<dyn PlayerStore>,
    pub(crate) help: HelpLibrary,
    pub(crate) credentials: Credentials,
    shutdown_requested: bool,
    ticks: u64,
}

impl World {
    /// Build the world and schedule the global events.
    ///
    /// # Errors
    /// [`ServerError::Config`] if the configuration does not validate.
    pub fn new(
        config: ServerConfig,
        store: Box<dyn PlayerStore>,
        help: HelpLibrary,
    ) -> Result<Self> {
        config.validate().map_err(ServerError::Config)?;
        let credentials = Credentials::new(&config.password)?;
        let mut world = Self {
            wheel: TimingWheel::new(config.wheel_size),
            config,
            connections: ConnectionRegistry::new(),
            sessions: SessionRegistry::new(),
            store,
            help,
            credentials,
            shutdown_requested: false,
            ticks: 0,
        };
        let delay = world.config.ticks(world.config.game_tick_interval);
        world.wheel.register_global(EventKind::GameTick, delay)?;
        Ok(world)
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Live connections
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Look up a connection
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Sessions in memory
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Look up a session
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Timing wheel
    pub fn wheel(&self) -> &TimingWheel<EventKind> {
        &self.wheel
    }

    /// Timing wheel, for registering callbacks
    pub fn wheel_mut(&mut self) -> &mut TimingWheel<EventKind> {
        &mut self.wheel
    }

    /// Help library
    pub fn help(&self) -> &HelpLibrary {
        &self.help
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// True once a player asked the server to stop
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Ask the event loop to stop after the current tick
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// Register a new connection, greet it and start its idle timer
    pub fn add_connection(&mut self, transport: Box<dyn Transport>) -> ConnectionId {
        let id = self.connections.insert(transport, &self.config);
        if let Some(conn) = self.connections.get_mut(id) {
            conn.send(self.help.greeting());
            conn.send("What is your name? ");
        }

        let delay = self.config.ticks(self.config.idle_timeout);
        if let Err(err) =
            self.wheel
                .register_owned(Owner::Connection(id), EventKind::ConnectionIdle, delay)
        {
            error!(connection_id = %id, error = %err, "Failed to start idle timer");
        }
        id
    }

    /// Run one tick without accepting: service every connection, advance the wheel
    /// and reap closed connections.
    pub fn pulse(&mut self) {
        self.ticks += 1;
        for id in self.connections.ids() {
            self.service(id);
        }
        self.heartbeat();
        let reaped = self.connections.reap_closed();
        if reaped > 0 {
            trace!(reaped, "Reaped connections");
        }
    }

    fn service(&mut self, id: ConnectionId) {
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };
        if conn.is_closed() {
            return;
        }
        if let Err(err) = conn.read() {
            self.drop_connection(id, err);
            return;
        }
        let command = match conn.frame() {
            Ok(_) => conn.take_command(),
            Err(err) => {
                self.drop_connection(id, err);
                return;
            }
        };
        if command.is_none() && conn.peer_closed() {
            self.drop_connection(id, ServerError::ConnectionClosed);
            return;
        }

        if let Some(command) = command {
            self.handle_command(id, &command);
        }

        if let Some(conn) = self.connections.get_mut(id) {
            if conn.is_closed() {
                return;
            }
            if let Err(err) = conn.flush(&self.config.prompt) {
                warn!(connection_id = %id, error = %err, "Failed to flush output");
                self.close_connection(id, false);
            }
        }
    }

    fn drop_connection(&mut self, id: ConnectionId, err: ServerError) {
        match &err {
            ServerError::Framer(_) => {
                warn!(connection_id = %id, error = %err, "Input overflow");
                self.write_direct(id, INPUT_OVERFLOW);
            }
            ServerError::ConnectionClosed => {
                debug!(connection_id = %id, "Connection closed by peer");
            }
            _ => warn!(connection_id = %id, error = %err, "Failed to read from connection"),
        }
        self.close_connection(id, false);
    }

    fn handle_command(&mut self, id: ConnectionId, line: &str) {
        let Some(conn) = self.connections.get(id) else {
            return;
        };
        let state = conn.state();
        let session = conn.session();
        if state.is_negotiating() {
            login::handle(self, id, line);
        } else if let (ConnectionState::Playing, Some(session)) = (state, session) {
            counter!("pulsemud.commands.dispatched").increment(1);
            commands::dispatch(self, session, line);
        }
    }

    /// Advance the wheel one bucket and fire the callbacks that are due
    pub fn heartbeat(&mut self) {
        for id in self.wheel.advance() {
            let Some(event) = self.wheel.get(id) else {
                continue;
            };
            let kind = event.kind();
            let owner = event.owner();
            trace!(%id, ?kind, ?owner, "Firing event");
            counter!("pulsemud.events.fired").increment(1);
            if !(kind.action())(self, id, owner) {
                self.wheel.dequeue(id);
            }
        }
    }

    /// Close a connection.
    ///
    /// A playing connection leaves its session linkdead, unless it is being taken over
    /// by a reconnect. A connection still logging in frees its session shell. Every
    /// callback owned by the connection is dequeued. Closing twice is a no-op.
    pub fn close_connection(&mut self, id: ConnectionId, reconnect: bool) {
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };
        if conn.is_closed() {
            return;
        }
        let playing = conn.state().is_playing();
        let session = conn.session();
        if playing && reconnect {
            conn.write_direct(TAKEN_OVER);
        }
        conn.set_session(None);
        conn.set_state(ConnectionState::Closed);

        if let Some(session) = session {
            if !playing {
                self.free_session(session);
            } else if !reconnect {
                let detached = self
                    .sessions
                    .get_mut(session)
                    .filter(|entry| entry.connection() == Some(id))
                    .map(|entry| {
                        entry.set_connection(None);
                        entry.name().to_string()
                    });
                if let Some(name) = detached {
                    self.log(&format!("Closing link to {name}"));
                }
            }
        }

        self.wheel.dequeue_owner(Owner::Connection(id));
        info!(connection_id = %id, reconnect, "Connection closed");
    }

    /// Link a session and a connection to each other
    pub(crate) fn link(&mut self, session: SessionId, connection: ConnectionId) {
        if let Some(entry) = self.sessions.get_mut(session) {
            entry.set_connection(Some(connection));
        }
        if let Some(conn) = self.connections.get_mut(connection) {
            conn.set_session(Some(session));
        }
    }

    /// Change the lifecycle state of a connection
    pub(crate) fn set_state(&mut self, id: ConnectionId, state: ConnectionState) {
        if let Some(conn) = self.connections.get_mut(id) {
            conn.set_state(state);
        }
    }

    /// Free a session and every callback it owns
    pub fn free_session(&mut self, id: SessionId) {
        self.wheel.dequeue_owner(Owner::Session(id));
        let Some(session) = self.sessions.remove(id) else {
            return;
        };
        if let Some(conn) = session
            .connection()
            .and_then(|connection| self.connections.get_mut(connection))
        {
            if conn.session() == Some(id) {
                conn.set_session(None);
            }
        }
        debug!(session_id = %id, name = %session.name(), "Freed session");
    }

    /// Queue text on a connection
    pub fn send(&mut self, id: ConnectionId, text: &str) {
        if let Some(conn) = self.connections.get_mut(id) {
            if !conn.is_closed() {
                conn.send(text);
            }
        }
    }

    /// Queue raw bytes on a connection
    pub fn send_raw(&mut self, id: ConnectionId, bytes: &[u8]) {
        if let Some(conn) = self.connections.get_mut(id) {
            if !conn.is_closed() {
                conn.send_raw(bytes);
            }
        }
    }

    /// Write to a connection immediately, bypassing its output buffer
    pub fn write_direct(&mut self, id: ConnectionId, text: &str) -> bool {
        self.connections
            .get_mut(id)
            .is_some_and(|conn| conn.write_direct(text))
    }

    /// Queue text for a player and refresh their prompt. Linkdead players get nothing.
    pub fn send_to_session(&mut self, id: SessionId, text: &str) {
        let Some(connection) = self.sessions.get(id).and_then(Session::connection) else {
            return;
        };
        if let Some(conn) = self.connections.get_mut(connection) {
            if !conn.is_closed() {
                conn.send(text);
                conn.mark_prompt_dirty();
            }
        }
    }

    /// Log a game event and echo it to every admin in the game
    pub fn log(&mut self, message: &str) {
        info!("{message}");
        let line = format!("[LOG: {message}]\r\n");
        let admins: Vec<SessionId> = self
            .sessions
            .active()
            .iter()
            .copied()
            .filter(|id| {
                self.sessions
                    .get(*id)
                    .is_some_and(|session| session.level().is_admin())
            })
            .collect();
        for id in admins {
            self.send_to_session(id, &line);
        }
    }

    /// Write a session to the player store. Failures are logged.
    pub fn save_session(&mut self, id: SessionId) -> bool {
        let Some(session) = self.sessions.get(id) else {
            return false;
        };
        let record = session.to_record();
        match self.store.save(&record) {
            Ok(()) => {
                debug!(session_id = %id, name = %record.name, "Saved player");
                true
            }
            Err(err) => {
                error!(session_id = %id, name = %record.name, error = %err, "Failed to save player");
                false
            }
        }
    }

    /// Notify every connection, save every player and close everything
    pub fn shutdown(&mut self) {
        info!(
            connections = self.connections.len(),
            players = self.sessions.active().len(),
            "Shutting down"
        );
        for conn in self.connections.iter_mut() {
            if !conn.is_closed() {
                conn.write_direct(SHUTDOWN_NOTICE);
            }
        }
        for session in self.sessions.active().to_vec() {
            self.save_session(session);
        }
        for id in self.connections.ids() {
            if let Some(conn) = self.connections.get_mut(id) {
                conn.set_session(None);
                conn.set_state(ConnectionState::Closed);
            }
            self.wheel.dequeue_owner(Owner::Connection(id));
        }
        self.connections.reap_closed();
    }
}
