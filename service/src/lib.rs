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

//! PulseMUD Game Service
//!
//! A single threaded, tick driven text game server. Every piece of state lives in one
//! [`World`], which the [`MudServer`] event loop advances a fixed number of times per
//! second:
//!
//! ```text
//! MudServer (accept, pace)
//!     ↓
//! World::pulse
//!     ├── Connection (read → LineFramer → login / commands → MarkupCodec → flush)
//!     └── TimingWheel (advance → fire EventKind actions)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pulsemud_service::{FileStore, HelpLibrary, MudServer, ServerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let help = HelpLibrary::load(&config.help_dir, config.max_buffer)?;
//!     let store = Box::new(FileStore::new(&config.player_dir));
//!     let mut server = MudServer::bind(config, store, help).await?;
//!     server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await;
//!     Ok(())
//! }
//! ```

pub mod commands;
mod config;
mod connection;
mod error;
pub mod events;
mod help;
mod login;
mod password;
mod registry;
mod server;
mod session;
mod store;
mod transport;
mod types;
pub mod wheel;
mod world;

pub use config::{DEFAULT_PORT, PasswordConfig, ServerConfig};
pub use connection::Connection;
pub use error::{Result, ScheduleError, ServerError, StoreError};
pub use events::{EventAction, EventKind};
pub use help::{GREETING, HelpEntry, HelpLibrary, MOTD};
pub use password::Credentials;
pub use registry::ConnectionRegistry;
pub use server::MudServer;
pub use session::{Session, SessionRegistry};
pub use store::{FileStore, MemoryStore, PlayerRecord, PlayerStore};
pub use transport::{MemoryTransport, Transport};
pub use types::{ConnectionId, ConnectionState, Level, SessionId};
pub use wheel::{EventId, Owner, TimedEvent, TimingWheel};
pub use world::World;
