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

//! Player sessions
//!
//! A session is the in-memory player. It is created as a shell while a connection
//! negotiates its login, becomes *active* once the player is in the game, and survives
//! the loss of its connection as a linkdead body until the player reconnects or quits.

use crate::store::PlayerRecord;
use crate::types::{ConnectionId, Level, SessionId};
use std::collections::HashMap;

/// An in-memory player
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: String,
    password_hash: Option<String>,
    level: Level,
    connection: Option<ConnectionId>,
}

impl Session {
    fn new(id: SessionId, name: String) -> Self {
        Self {
            id,
            name,
            password_hash: None,
            level: Level::default(),
            connection: None,
        }
    }

    /// Session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Player name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored password hash, if one has been set
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Replace the password hash
    pub fn set_password_hash(&mut self, hash: Option<String>) {
        self.password_hash = hash;
    }

    /// Privilege level
    pub fn level(&self) -> Level {
        self.level
    }

    /// Connection currently driving this session
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Link or unlink the driving connection
    pub fn set_connection(&mut self, connection: Option<ConnectionId>) {
        self.connection = connection;
    }

    /// True if the player is in the game without a connection
    pub fn is_linkdead(&self) -> bool {
        self.connection.is_none()
    }

    /// Snapshot for the player store
    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            name: self.name.clone(),
            password: self.password_hash.clone().unwrap_or_default(),
            level: self.level,
        }
    }
}

/// Every session in memory, with the ordered list of active players
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    active: Vec<SessionId>,
    next_id: u64,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId::new(self.next_id)
    }

    /// Create a shell session for a new player
    pub fn create(&mut self, name: impl Into<String>) -> SessionId {
        let id = self.allocate();
        self.sessions.insert(id, Session::new(id, name.into()));
        id
    }

    /// Create a shell session from a stored record
    pub fn from_record(&mut self, record: PlayerRecord) -> SessionId {
        let id = self.allocate();
        let mut session = Session::new(id, record.name);
        session.password_hash = Some(record.password);
        session.level = record.level;
        self.sessions.insert(id, session);
        id
    }

    /// Look up a session
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Look up a session for modification
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Put a session into the game. Activating twice is a no-op.
    pub fn activate(&mut self, id: SessionId) {
        if self.sessions.contains_key(&id) && !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    /// True if the session is in the game
    pub fn is_active(&self, id: SessionId) -> bool {
        self.active.contains(&id)
    }

    /// Sessions in the game, in the order they entered it
    pub fn active(&self) -> &[SessionId] {
        &self.active
    }

    /// Active session whose name matches `name`, ignoring case
    pub fn find_active_by_name(&self, name: &str) -> Option<SessionId> {
        self.active.iter().copied().find(|id| {
            self.sessions
                .get(id)
                .is_some_and(|session| session.name.eq_ignore_ascii_case(name))
        })
    }

    /// Free a session, taking it out of the game
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.active.retain(|entry| *entry != id);
        self.sessions.remove(&id)
    }

    /// Number of sessions in memory, shells included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if no sessions exist
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_activate() {
        let mut sessions = SessionRegistry::new();
        let alice = sessions.create("Alice");
        let bob = sessions.create("Bob");
        assert_ne!(alice, bob);
        assert!(sessions.active().is_empty());

        sessions.activate(bob);
        sessions.activate(alice);
        sessions.activate(bob);
        assert_eq!(sessions.active(), &[bob, alice]);
        assert!(sessions.is_active(alice));
    }

    #[test]
    fn test_find_active_ignores_case_and_shells() {
        let mut sessions = SessionRegistry::new();
        let shell = sessions.create("Alice");
        assert_eq!(sessions.find_active_by_name("alice"), None);

        let live = sessions.create("Alice");
        sessions.activate(live);
        assert_eq!(sessions.find_active_by_name("ALICE"), Some(live));
        assert_ne!(sessions.find_active_by_name("alice"), Some(shell));
    }

    #[test]
    fn test_record_round_trip() {
        let mut sessions = SessionRegistry::new();
        let id = sessions.from_record(PlayerRecord {
            name: "Carol".to_string(),
            password: "hash".to_string(),
            level: Level::Admin,
        });
        let session = sessions.get(id).unwrap();
        assert_eq!(session.name(), "Carol");
        assert_eq!(session.password_hash(), Some("hash"));
        assert_eq!(session.level(), Level::Admin);
        assert!(session.is_linkdead());
        assert_eq!(session.to_record().password, "hash");
    }

    #[test]
    fn test_remove_deactivates() {
        let mut sessions = SessionRegistry::new();
        let id = sessions.create("Dave");
        sessions.activate(id);
        assert!(sessions.remove(id).is_some());
        assert!(!sessions.is_active(id));
        assert!(sessions.remove(id).is_none());
        assert!(sessions.is_empty());
    }
}
