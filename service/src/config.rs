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

//! Server configuration
//!
//! # Example
//!
//! ```
//! use pulsemud_service::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::default()
//!     .with_pulses_per_second(8)
//!     .with_idle_timeout(Duration::from_secs(120))
//!     .with_prompt("\r\n> ");
//! assert!(config.validate().is_ok());
//! ```

use pulsemud_ansicodec::consts::MAX_OUTPUT;
use pulsemud_telnetcodec::consts::MAX_BUFFER;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 9009;

/// Server configuration
///
/// Durations are converted to whole ticks at the configured pulse rate when the
/// matching callbacks are scheduled.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Ticks per second. Must divide 1000.
    pub pulses_per_second: u32,

    /// Ceiling on buffered input per connection, also the longest accepted write
    pub max_buffer: usize,

    /// Ceiling on pending output per connection
    pub max_output: usize,

    /// Number of buckets in the timing wheel
    pub wheel_size: usize,

    /// How long a connection may sit at the login prompts
    pub idle_timeout: Duration,

    /// Interval between automatic saves of a playing session
    pub autosave_interval: Duration,

    /// Interval between global game ticks
    pub game_tick_interval: Duration,

    /// Directory holding one record per player
    pub player_dir: PathBuf,

    /// Directory holding help entries, including GREETING and MOTD
    pub help_dir: PathBuf,

    /// Prompt sent to playing connections after activity
    pub prompt: String,

    /// Password hashing cost
    pub password: PasswordConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            pulses_per_second: 4,
            max_buffer: MAX_BUFFER,
            max_output: MAX_OUTPUT,
            wheel_size: 128,
            idle_timeout: Duration::from_secs(5 * 60),
            autosave_interval: Duration::from_secs(2 * 60),
            game_tick_interval: Duration::from_secs(10 * 60),
            player_dir: PathBuf::from("players"),
            help_dir: PathBuf::from("help"),
            prompt: "\r\nPulseMUD:> ".to_string(),
            password: PasswordConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address
    ///
    /// All other settings will use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, bind_address: SocketAddr) -> Self {
        self.bind_address = bind_address;
        self
    }

    /// Set the tick rate
    pub fn with_pulses_per_second(mut self, pulses: u32) -> Self {
        self.pulses_per_second = pulses;
        self
    }

    /// Set the input ceiling
    pub fn with_max_buffer(mut self, max: usize) -> Self {
        self.max_buffer = max;
        self
    }

    /// Set the output ceiling
    pub fn with_max_output(mut self, max: usize) -> Self {
        self.max_output = max;
        self
    }

    /// Set the number of wheel buckets
    pub fn with_wheel_size(mut self, size: usize) -> Self {
        self.wheel_size = size;
        self
    }

    /// Set the login idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the autosave interval
    pub fn with_autosave_interval(mut self, interval: Duration) -> Self {
        self.autosave_interval = interval;
        self
    }

    /// Set the game tick interval
    pub fn with_game_tick_interval(mut self, interval: Duration) -> Self {
        self.game_tick_interval = interval;
        self
    }

    /// Set the player record directory
    pub fn with_player_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.player_dir = dir.into();
        self
    }

    /// Set the help directory
    pub fn with_help_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.help_dir = dir.into();
        self
    }

    /// Set the prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the password hashing cost
    pub fn with_password(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// Length of one tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.pulses_per_second.max(1)))
    }

    /// Convert a duration to whole ticks, never less than one
    pub fn ticks(&self, duration: Duration) -> i64 {
        let ticks = duration.as_millis() * u128::from(self.pulses_per_second) / 1000;
        i64::try_from(ticks).unwrap_or(i64::MAX).max(1)
    }

    /// Validate the configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.pulses_per_second == 0 || 1000 % self.pulses_per_second != 0 {
            return Err("pulses_per_second must divide 1000".to_string());
        }

        if self.max_buffer == 0 {
            return Err("max_buffer must be greater than 0".to_string());
        }

        if self.max_output == 0 {
            return Err("max_output must be greater than 0".to_string());
        }

        if self.wheel_size == 0 {
            return Err("wheel_size must be greater than 0".to_string());
        }

        if self.idle_timeout.is_zero() {
            return Err("idle_timeout must be greater than 0".to_string());
        }

        if self.autosave_interval.is_zero() {
            return Err("autosave_interval must be greater than 0".to_string());
        }

        if self.game_tick_interval.is_zero() {
            return Err("game_tick_interval must be greater than 0".to_string());
        }

        if self.prompt.len() > self.max_buffer {
            return Err("prompt must not exceed max_buffer".to_string());
        }

        self.password.validate()
    }
}

/// Argon2id cost parameters for stored passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl PasswordConfig {
    /// Create a new cost configuration
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Validate the parameters against the argon2 limits
    pub fn validate(&self) -> Result<(), String> {
        argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map(|_| ())
            .map_err(|err| format!("invalid password parameters: {err}"))
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}
