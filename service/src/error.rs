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

//! Error types for the game service

use crate::wheel::EventId;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Game service error types
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error from a transport, the listener or the filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error from the input side of a connection
    #[error("Framing error: {0}")]
    Framer(#[from] pulsemud_telnetcodec::FramerError),

    /// Markup error from the output side of a connection
    #[error("Markup error: {0}")]
    Markup(#[from] pulsemud_ansicodec::AnsiError),

    /// Misuse of the timing wheel
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Player store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failure
    #[error("Password error: {0}")]
    Password(String),

    /// A help entry could not be loaded
    #[error("Help error: {0}")]
    Help(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,
}

impl ServerError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors fail a single operation and leave the connection and the
    /// server usable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ServerError::Markup(err) => err.is_recoverable(),
            ServerError::Store(_) | ServerError::Help(_) | ServerError::Password(_) => true,
            ServerError::Io(err) => err.kind() == std::io::ErrorKind::WouldBlock,
            _ => false,
        }
    }

    /// Check if the error must close the connection it happened on
    pub fn is_connection_error(&self) -> bool {
        match self {
            ServerError::Io(err) => err.kind() != std::io::ErrorKind::WouldBlock,
            ServerError::Framer(err) => err.is_fatal(),
            ServerError::ConnectionClosed => true,
            _ => false,
        }
    }
}

/// Timing wheel misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A callback was enqueued without an owner
    #[error("event has no owner")]
    Unowned,

    /// The callback is not in the wheel
    #[error("{0} is not scheduled")]
    NotScheduled(EventId),
}

/// Player store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed player record
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The name cannot be used as a record key
    #[error("Invalid player name: {0:?}")]
    InvalidName(String),
}
