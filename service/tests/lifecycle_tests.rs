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

//! Connection lifecycle tests driven through in-memory transports

use pulsemud_service::{
    ConnectionId, ConnectionState, Credentials, EventKind, HelpLibrary, Level, MemoryStore,
    MemoryTransport, Owner, PasswordConfig, PlayerRecord, PlayerStore, ServerConfig, SessionId,
    StoreError, World,
};
use pulsemud_telnetcodec::consts::{ECHO_OFF, ECHO_ON};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_test::traced_test;

const PROMPT: &str = "\r\n> ";

fn fast_password() -> PasswordConfig {
    PasswordConfig::new(256, 1, 1)
}

fn config() -> ServerConfig {
    ServerConfig::default()
        .with_password(fast_password())
        .with_prompt(PROMPT)
}

fn world_with(config: ServerConfig, store: &MemoryStore) -> World {
    World::new(
        config,
        Box::new(store.clone()),
        HelpLibrary::new("help", 1024),
    )
    .unwrap()
}

fn connect(world: &mut World) -> (ConnectionId, MemoryTransport) {
    let transport = MemoryTransport::new("127.0.0.1");
    let id = world.add_connection(Box::new(transport.clone()));
    world.pulse();
    transport.take_output();
    (id, transport)
}

/// Send one line, run one tick and return everything written back
fn send(world: &mut World, transport: &MemoryTransport, line: &str) -> Vec<u8> {
    transport.push_line(line);
    world.pulse();
    transport.take_output()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn state(world: &World, id: ConnectionId) -> Option<ConnectionState> {
    world.connection(id).map(|conn| conn.state())
}

fn session_of(world: &World, id: ConnectionId) -> SessionId {
    world.connection(id).and_then(|conn| conn.session()).unwrap()
}

/// Create a new player and return once they are playing
fn create_player(world: &mut World, name: &str, password: &str) -> (ConnectionId, MemoryTransport) {
    let (id, transport) = connect(world);
    send(world, &transport, name);
    send(world, &transport, password);
    send(world, &transport, password);
    assert_eq!(state(world, id), Some(ConnectionState::Playing));
    transport.take_output();
    (id, transport)
}

fn stored_record(store: &MemoryStore, name: &str, password: &str, level: Level) {
    let credentials = Credentials::new(&fast_password()).unwrap();
    store
        .save(&PlayerRecord {
            name: name.to_string(),
            password: credentials.hash(password).unwrap(),
            level,
        })
        .unwrap();
}

/// Store whose records disappear after the first load
#[derive(Clone, Debug, Default)]
struct VanishingStore {
    inner: MemoryStore,
    loads: Arc<AtomicUsize>,
}

impl PlayerStore for VanishingStore {
    fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StoreError> {
        if self.loads.fetch_add(1, Ordering::SeqCst) > 0 {
            return Ok(None);
        }
        self.inner.load(name)
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.inner.save(record)
    }
}

/// Store counting how often a record is written
#[derive(Clone, Debug, Default)]
struct CountingStore {
    inner: MemoryStore,
    saves: Arc<AtomicUsize>,
}

impl CountingStore {
    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PlayerStore for CountingStore {
    fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StoreError> {
        self.inner.load(name)
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(record)
    }
}

fn world_with_store(config: ServerConfig, store: &CountingStore) -> World {
    World::new(
        config,
        Box::new(store.clone()),
        HelpLibrary::new("help", 1024),
    )
    .unwrap()
}

#[test]
fn test_greeting_asks_for_name() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let transport = MemoryTransport::new("127.0.0.1");
    let id = world.add_connection(Box::new(transport.clone()));
    world.pulse();

    let output = transport.take_text();
    assert!(output.contains("Welcome to PulseMUD!"));
    assert!(output.ends_with("What is your name? "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingName));
    assert!(
        world
            .wheel()
            .find(Owner::Connection(id), EventKind::ConnectionIdle)
            .is_some()
    );
}

#[test]
fn test_short_name_rejected() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    let output = text(&send(&mut world, &transport, "Al"));
    assert!(output.contains("Sorry, that's not a legal name, please pick another.\r\nWhat is your name? "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingName));
    assert!(world.connection(id).unwrap().session().is_none());
}

#[test]
fn test_new_name_asks_for_password() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    let output = send(&mut world, &transport, "alice");
    assert!(contains(&output, b"Please enter a new password: "));
    assert!(output.ends_with(&ECHO_OFF));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingNewPassword));

    let session = session_of(&world, id);
    assert_eq!(world.session(session).unwrap().name(), "Alice");
    assert_eq!(world.session(session).unwrap().connection(), Some(id));
    assert!(!world.sessions().is_active(session));
}

#[test]
fn test_password_length_enforced() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);
    send(&mut world, &transport, "Alice");

    for password in ["abcd", "abcdefghijklm"] {
        let output = text(&send(&mut world, &transport, password));
        assert!(output.contains("Between 5 and 12 chars please!"));
        assert_eq!(state(&world, id), Some(ConnectionState::AwaitingNewPassword));
    }
}

#[test]
fn test_confirmed_password_enters_game() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    send(&mut world, &transport, "Alice");
    let output = text(&send(&mut world, &transport, "secret1"));
    assert!(output.contains("Please verify the password: "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingPasswordConfirm));

    let output = send(&mut world, &transport, "secret1");
    assert!(contains(&output, &ECHO_ON));
    assert!(text(&output).ends_with(PROMPT));
    assert_eq!(state(&world, id), Some(ConnectionState::Playing));

    let session = session_of(&world, id);
    assert!(world.sessions().is_active(session));
    assert!(
        world
            .wheel()
            .find(Owner::Session(session), EventKind::SessionSave)
            .is_some()
    );
    assert!(
        world
            .wheel()
            .find(Owner::Connection(id), EventKind::ConnectionIdle)
            .is_none()
    );

    let record = store.load("Alice").unwrap().unwrap();
    assert_eq!(record.level, Level::Player);
    assert!(record.password.starts_with("$argon2id$"));
}

#[test]
fn test_password_mismatch_starts_over() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    send(&mut world, &transport, "Alice");
    send(&mut world, &transport, "secret1");
    let output = text(&send(&mut world, &transport, "secret2"));

    assert!(output.contains("Password mismatch!\r\nPlease enter a new password: "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingNewPassword));
    let session = session_of(&world, id);
    assert_eq!(world.session(session).unwrap().password_hash(), None);
    assert!(store.is_empty());
}

#[test]
fn test_existing_player_logs_in() {
    let store = MemoryStore::new();
    stored_record(&store, "Bob", "hunter22", Level::Admin);
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    let output = send(&mut world, &transport, "BOB");
    assert!(contains(&output, b"What is your password? "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingExistingPassword));

    let output = send(&mut world, &transport, "hunter22");
    assert!(contains(&output, &ECHO_ON));
    assert_eq!(state(&world, id), Some(ConnectionState::Playing));
    let session = session_of(&world, id);
    assert_eq!(world.session(session).unwrap().level(), Level::Admin);
    assert_eq!(world.sessions().active(), &[session]);
}

#[test]
fn test_bad_password_closes() {
    let store = MemoryStore::new();
    stored_record(&store, "Bob", "hunter22", Level::Player);
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    send(&mut world, &transport, "Bob");
    let output = text(&send(&mut world, &transport, "hunter23"));
    assert!(output.contains("Bad password!\r\n"));
    assert!(world.connection(id).is_none());
    assert!(world.sessions().is_empty());
}

#[test]
fn test_missing_pfile_closes() {
    let store = VanishingStore::default();
    stored_record(&store.inner, "Bob", "hunter22", Level::Player);
    let mut world = World::new(
        config(),
        Box::new(store.clone()),
        HelpLibrary::new("help", 1024),
    )
    .unwrap();
    let (id, transport) = connect(&mut world);

    send(&mut world, &transport, "Bob");
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingExistingPassword));
    let output = text(&send(&mut world, &transport, "hunter22"));
    assert!(output.contains("ERROR: Your pfile is missing!\r\n"));
    assert!(world.connection(id).is_none());
    assert!(world.sessions().is_empty());
}

#[test]
fn test_reconnect_takes_over_live_session() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (first, first_transport) = create_player(&mut world, "Alice", "secret1");
    let live = session_of(&world, first);
    let autosave = world
        .wheel()
        .find(Owner::Session(live), EventKind::SessionSave)
        .unwrap();

    // The stored record changes behind the live session's back
    let mut record = store.load("Alice").unwrap().unwrap();
    record.level = Level::God;
    store.save(&record).unwrap();

    let (second, second_transport) = connect(&mut world);
    send(&mut world, &second_transport, "Alice");
    let output = text(&send(&mut world, &second_transport, "secret1"));

    assert!(output.contains("You take over a body already in use.\r\n"));
    assert_eq!(
        text(&first_transport.take_output()),
        "This connection has been taken over.\r\n"
    );
    assert!(world.connection(first).is_none());
    assert_eq!(state(&world, second), Some(ConnectionState::Playing));
    assert_eq!(session_of(&world, second), live);
    assert_eq!(world.session(live).unwrap().connection(), Some(second));
    assert_eq!(world.session(live).unwrap().level(), Level::Player);
    assert!(world.wheel().is_scheduled(autosave));
    assert_eq!(world.sessions().len(), 1);
}

#[test]
fn test_linkdead_and_reconnect() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (first, first_transport) = create_player(&mut world, "Alice", "secret1");
    let live = session_of(&world, first);

    first_transport.hang_up();
    world.pulse();
    assert!(world.connection(first).is_none());
    assert!(world.session(live).unwrap().is_linkdead());
    assert!(world.sessions().is_active(live));

    let (second, second_transport) = connect(&mut world);
    send(&mut world, &second_transport, "alice");
    let output = text(&send(&mut world, &second_transport, "secret1"));
    assert!(output.contains("You take over a body already in use."));
    assert_eq!(session_of(&world, second), live);
    assert!(!world.session(live).unwrap().is_linkdead());
}

#[test]
fn test_idle_connection_times_out() {
    let store = MemoryStore::new();
    let config = config()
        .with_pulses_per_second(4)
        .with_idle_timeout(Duration::from_secs(1));
    let mut world = world_with(config, &store);
    let (id, transport) = connect(&mut world);
    send(&mut world, &transport, "Alice");

    world.pulse();
    world.pulse();
    let output = transport.take_text();
    assert!(output.contains("You have idled out...\r\n\r\n"));
    assert!(world.connection(id).is_none());
    assert!(world.sessions().is_empty());
}

#[test]
fn test_playing_connection_does_not_idle_out() {
    let store = MemoryStore::new();
    let config = config()
        .with_pulses_per_second(4)
        .with_idle_timeout(Duration::from_secs(1));
    let mut world = world_with(config, &store);
    let (id, transport) = create_player(&mut world, "Alice", "secret1");

    for _ in 0..12 {
        world.pulse();
    }
    assert_eq!(state(&world, id), Some(ConnectionState::Playing));
    assert!(!transport.take_text().contains("idled out"));
}

#[test]
fn test_input_overflow_closes() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    transport.push_input(vec![b'x'; 4096]);
    world.pulse();
    assert!(transport.take_text().contains("\r\n!!!! Input Overflow !!!!\r\n"));
    assert!(world.connection(id).is_none());
}

#[test]
fn test_commands_and_prompt() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (_, transport) = create_player(&mut world, "Alice", "secret1");

    let output = text(&send(&mut world, &transport, "xyzzy"));
    assert_eq!(output, format!("\r\nNo such command.\r\n{PROMPT}"));

    let output = text(&send(&mut world, &transport, "say"));
    assert!(output.contains("Say what?\r\n"));

    let output = text(&send(&mut world, &transport, "shutdown"));
    assert!(output.contains("No such command."));
    assert!(!world.shutdown_requested());

    let output = text(&send(&mut world, &transport, "commands"));
    assert!(output.contains("The full command list"));
    assert!(output.contains(&format!(" {:<16}", "help")));
    assert!(!output.contains("linkdead"));

    let output = text(&send(&mut world, &transport, "who"));
    assert!(output.contains(&format!(" {:<12}   127.0.0.1\r\n", "Alice")));

    let output = text(&send(&mut world, &transport, "sav"));
    assert!(output.contains("Saved.\r\n"));

    let output = text(&send(&mut world, &transport, ""));
    assert_eq!(output, format!("\r\n{PROMPT}"));
}

#[test]
fn test_say_reaches_other_players() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (_, alice) = create_player(&mut world, "Alice", "secret1");
    let (_, bob) = create_player(&mut world, "Bob", "secret2");
    alice.take_output();

    let output = text(&send(&mut world, &alice, "say hello there"));
    assert!(output.contains("You say 'hello there'.\r\n"));
    assert!(bob.take_text().contains("Alice says 'hello there'.\r\n"));
}

#[test]
fn test_admin_commands() {
    let store = MemoryStore::new();
    stored_record(&store, "Root", "rootpass", Level::God);
    let mut world = world_with(config(), &store);
    let (_, alice) = create_player(&mut world, "Alice", "secret1");

    let (_, root) = connect(&mut world);
    send(&mut world, &root, "Root");
    send(&mut world, &root, "rootpass");

    let output = text(&send(&mut world, &root, "linkdead"));
    assert!(output.contains("No one is currently linkdead.\r\n"));

    alice.hang_up();
    let output = text(&send(&mut world, &root, "linkdead"));
    assert!(output.contains("[LOG: Closing link to Alice]"));
    world.pulse();
    let output = text(&send(&mut world, &root, "linkdead"));
    assert!(output.contains("Alice is linkdead.\r\n"));

    send(&mut world, &root, "shutdown");
    assert!(world.shutdown_requested());
}

#[test]
fn test_quit_saves_and_frees() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = create_player(&mut world, "Alice", "secret1");
    let session = session_of(&world, id);

    send(&mut world, &transport, "quit");
    assert!(world.connection(id).is_none());
    assert!(world.session(session).is_none());
    assert!(world.wheel().events_of(Owner::Session(session)).is_empty());
    assert!(store.load("Alice").unwrap().is_some());
}

#[test]
fn test_game_tick_reaches_players() {
    let store = MemoryStore::new();
    let config = config()
        .with_pulses_per_second(4)
        .with_game_tick_interval(Duration::from_secs(2));
    let mut world = world_with(config, &store);
    let (_, transport) = create_player(&mut world, "Alice", "secret1");

    let mut output = String::new();
    for _ in 0..8 {
        world.pulse();
        output.push_str(&transport.take_text());
    }
    assert!(output.contains("Tick!\r\n"));
}

#[test]
fn test_autosave_writes_store() {
    let store = CountingStore::default();
    let config = config()
        .with_pulses_per_second(4)
        .with_autosave_interval(Duration::from_secs(1));
    let mut world = world_with_store(config, &store);
    let (id, _transport) = create_player(&mut world, "Alice", "secret1");
    let session = session_of(&world, id);
    let autosave = world
        .wheel()
        .find(Owner::Session(session), EventKind::SessionSave)
        .unwrap();
    assert_eq!(store.saves(), 1);

    // The pulse that entered the game already advanced the wheel once
    for _ in 0..2 {
        world.pulse();
    }
    assert_eq!(store.saves(), 1);
    world.pulse();
    assert_eq!(store.saves(), 2);

    for _ in 0..4 {
        world.pulse();
    }
    assert_eq!(store.saves(), 3);
    assert!(world.wheel().is_scheduled(autosave));
}

#[test]
fn test_line_before_peer_close_is_answered() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (id, transport) = connect(&mut world);

    transport.push_line("Alice");
    transport.close_input();
    world.pulse();
    assert!(transport.take_text().contains("Please enter a new password: "));
    assert_eq!(state(&world, id), Some(ConnectionState::AwaitingNewPassword));

    world.pulse();
    assert!(world.connection(id).is_none());
    assert!(world.sessions().is_empty());
}

#[test]
fn test_quit_before_peer_close_saves() {
    let store = CountingStore::default();
    let mut world = world_with_store(config(), &store);
    let (id, transport) = create_player(&mut world, "Alice", "secret1");
    let session = session_of(&world, id);
    assert_eq!(store.saves(), 1);

    transport.push_line("quit");
    transport.close_input();
    world.pulse();
    assert_eq!(store.saves(), 2);
    assert!(world.connection(id).is_none());
    assert!(world.session(session).is_none());
}

#[test]
fn test_shutdown_notifies_and_saves() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    let (_, alice) = create_player(&mut world, "Alice", "secret1");
    let (_, guest) = connect(&mut world);

    world.shutdown();
    assert!(alice.take_text().contains("\r\nThe server is shutting down!\r\n"));
    assert!(guest.take_text().contains("The server is shutting down!"));
    assert!(world.connections().is_empty());
    assert!(store.load("Alice").unwrap().is_some());
}

#[test]
#[traced_test]
fn test_login_is_logged() {
    let store = MemoryStore::new();
    let mut world = world_with(config(), &store);
    create_player(&mut world, "Alice", "secret1");
    assert!(logs_contain("Alice is trying to connect."));
    assert!(logs_contain("New player: Alice has entered the game."));
}
