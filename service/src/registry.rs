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

//! Live connection registry

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::transport::Transport;
use crate::types::ConnectionId;
use metrics::{counter, gauge};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Registry of live connections
///
/// IDs increase monotonically, so iterating the map visits connections in accept
/// order. Closed connections stay in place until [`ConnectionRegistry::reap_closed`]
/// runs at the end of a tick.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<ConnectionId, Connection>,
    next_id: u64,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted transport
    pub fn insert(&mut self, transport: Box<dyn Transport>, config: &ServerConfig) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        let connection = Connection::new(id, transport, config);
        info!(connection_id = %id, host = %connection.hostname(), "Connection accepted");
        self.connections.insert(id, connection);

        counter!("pulsemud.connections.total").increment(1);
        gauge!("pulsemud.connections.active").set(self.connections.len() as f64);
        id
    }

    /// Look up a connection
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Look up a connection for modification
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// True if the connection is registered, closed or not
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Snapshot of registered IDs in accept order
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Iterate connections in accept order
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Iterate connections in accept order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drop every closed connection. Returns how many were removed.
    pub fn reap_closed(&mut self) -> usize {
        let before = self.connections.len();
        self.connections.retain(|id, connection| {
            let keep = !connection.is_closed();
            if !keep {
                debug!(connection_id = %id, "Reaping closed connection");
            }
            keep
        });
        let reaped = before - self.connections.len();
        if reaped > 0 {
            gauge!("pulsemud.connections.active").set(self.connections.len() as f64);
        }
        reaped
    }
}
