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

//! Core identifiers and states for the game service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Unique identifier for an in-memory player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a new session ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Connection lifecycle state
///
/// A connection starts in [`ConnectionState::AwaitingName`], negotiates a name and
/// password and ends up [`ConnectionState::Playing`]. [`ConnectionState::Closed`] is
/// terminal; the registry reaps closed connections at the end of each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the player to type a name
    AwaitingName,
    /// New player, waiting for a password
    AwaitingNewPassword,
    /// New player, waiting for the password to be repeated
    AwaitingPasswordConfirm,
    /// Known player, waiting for the stored password
    AwaitingExistingPassword,
    /// Logged in and dispatching commands
    Playing,
    /// Closed, waiting to be reaped
    Closed,
}

impl ConnectionState {
    /// Check if the connection is in a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if the connection is logged in
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if the connection is still negotiating its login
    pub fn is_negotiating(self) -> bool {
        matches!(
            self,
            Self::AwaitingName
                | Self::AwaitingNewPassword
                | Self::AwaitingPasswordConfirm
                | Self::AwaitingExistingPassword
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingName => write!(f, "awaiting-name"),
            Self::AwaitingNewPassword => write!(f, "awaiting-new-password"),
            Self::AwaitingPasswordConfirm => write!(f, "awaiting-password-confirm"),
            Self::AwaitingExistingPassword => write!(f, "awaiting-existing-password"),
            Self::Playing => write!(f, "playing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Player privilege level
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Level {
    /// Dead players and actual guests
    Guest = 1,
    /// Almost everyone
    #[default]
    Player = 2,
    /// Administrators without shell access
    Admin = 3,
    /// Administrators with shell access
    God = 4,
}

impl Level {
    /// Admins see log traffic and admin commands
    pub fn is_admin(self) -> bool {
        self > Level::Player
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Player => write!(f, "player"),
            Self::Admin => write!(f, "admin"),
            Self::God => write!(f, "god"),
        }
    }
}
