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

//! Timed callbacks
//!
//! Each [`EventKind`] maps to a plain function that receives the world, the id of the
//! firing event and its owner. The return value tells the heartbeat whether the event
//! is still valid: `true` leaves it alone (it rescheduled itself or was already
//! removed), `false` dequeues it.

use crate::wheel::{EventId, Owner};
use crate::world::World;
use tracing::{debug, error, info};

/// Signature of a timed callback
pub type EventAction = fn(&mut World, EventId, Owner) -> bool;

/// The closed set of timed callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Global heartbeat message to every player
    GameTick,
    /// Periodic save of a playing session
    SessionSave,
    /// Disconnects a connection stuck at the login prompts
    ConnectionIdle,
}

impl EventKind {
    /// Function run when the event fires
    pub fn action(self) -> EventAction {
        match self {
            EventKind::GameTick => game_tick,
            EventKind::SessionSave => session_save,
            EventKind::ConnectionIdle => connection_idle,
        }
    }
}

fn game_tick(world: &mut World, _id: EventId, _owner: Owner) -> bool {
    for session in world.sessions().active().to_vec() {
        world.send_to_session(session, "Tick!\r\n");
    }

    let delay = world.config().ticks(world.config().game_tick_interval);
    if let Err(err) = world.wheel_mut().register_global(EventKind::GameTick, delay) {
        error!(error = %err, "Failed to schedule the next game tick");
    }
    false
}

fn session_save(world: &mut World, id: EventId, owner: Owner) -> bool {
    let Owner::Session(session) = owner else {
        error!(%id, ?owner, "Session save fired for a non-session owner");
        return false;
    };
    if world.save_session(session) {
        debug!(session_id = %session, "Autosaved session");
    }

    let delay = world.config().ticks(world.config().autosave_interval);
    world.wheel_mut().reschedule(id, delay).is_ok()
}

fn connection_idle(world: &mut World, id: EventId, owner: Owner) -> bool {
    let Owner::Connection(connection) = owner else {
        error!(%id, ?owner, "Idle timeout fired for a non-connection owner");
        return false;
    };
    info!(connection_id = %connection, "Connection idled out");
    world.write_direct(connection, "You have idled out...\r\n\r\n");
    world.close_connection(connection, false);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PasswordConfig, ServerConfig};
    use crate::help::HelpLibrary;
    use crate::store::MemoryStore;
    use crate::transport::MemoryTransport;
    use crate::types::ConnectionState;
    use std::time::Duration;

    fn world() -> World {
        let config = ServerConfig::default()
            .with_pulses_per_second(4)
            .with_idle_timeout(Duration::from_secs(1))
            .with_game_tick_interval(Duration::from_secs(2))
            .with_password(PasswordConfig::new(256, 1, 1));
        World::new(
            config,
            Box::new(MemoryStore::new()),
            HelpLibrary::new("help", 1024),
        )
        .unwrap()
    }

    #[test]
    fn test_game_tick_is_registered_at_startup() {
        let world = world();
        assert!(world.wheel().find(Owner::Global, EventKind::GameTick).is_some());
    }

    #[test]
    fn test_game_tick_requeues_itself() {
        let mut world = world();
        let first = world
            .wheel()
            .find(Owner::Global, EventKind::GameTick)
            .unwrap();
        for _ in 0..8 {
            world.heartbeat();
        }
        assert!(!world.wheel().is_scheduled(first));
        let next = world
            .wheel()
            .find(Owner::Global, EventKind::GameTick)
            .unwrap();
        assert_ne!(first, next);
        assert_eq!(world.wheel().events_of(Owner::Global).len(), 1);
    }

    #[test]
    fn test_idle_event_closes_connection() {
        let mut world = world();
        let transport = MemoryTransport::new("localhost");
        let id = world.add_connection(Box::new(transport.clone()));
        transport.take_output();

        for _ in 0..4 {
            world.heartbeat();
        }
        assert_eq!(
            world.connection(id).map(|conn| conn.state()),
            Some(ConnectionState::Closed)
        );
        assert_eq!(transport.take_text(), "You have idled out...\r\n\r\n");
        assert!(world.wheel().events_of(Owner::Connection(id)).is_empty());
    }

    #[test]
    fn test_actions_reject_wrong_owner() {
        let mut world = world();
        let id = world
            .wheel_mut()
            .register_global(EventKind::SessionSave, 5)
            .unwrap();
        assert!(!(EventKind::SessionSave.action())(&mut world, id, Owner::Global));
        assert!(!(EventKind::ConnectionIdle.action())(&mut world, id, Owner::Global));
    }
}
