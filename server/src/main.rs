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

//! PulseMUD server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port with ./players and ./help
//! pulsemud
//!
//! # Custom port and data directories
//! pulsemud --port 4000 --player-dir data/players --help-dir data/help
//! ```

use clap::Parser;
use pulsemud_service::{DEFAULT_PORT, FileStore, HelpLibrary, MudServer, ServerConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// PulseMUD game server
#[derive(Parser, Debug)]
#[command(name = "pulsemud")]
#[command(about = "Single threaded tick driven MUD server")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Game ticks per second
    #[arg(long, default_value_t = 4)]
    pulses: u32,

    /// Minutes before a connection that never logged in is dropped
    #[arg(long, default_value_t = 5)]
    idle_minutes: u64,

    /// Directory holding player files
    #[arg(long, default_value = "players")]
    player_dir: PathBuf,

    /// Directory holding help files
    #[arg(long, default_value = "help")]
    help_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig::new(SocketAddr::new(self.bind, self.port))
            .with_pulses_per_second(self.pulses)
            .with_idle_timeout(Duration::from_secs(self.idle_minutes.saturating_mul(60)))
            .with_player_dir(&self.player_dir)
            .with_help_dir(&self.help_dir)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.config();
    config.validate()?;
    tracing::info!("PulseMUD starting");

    let help = match HelpLibrary::load(&config.help_dir, config.max_buffer) {
        Ok(help) => {
            tracing::info!(entries = help.len(), "Loaded help files");
            help
        }
        Err(err) => {
            tracing::warn!(dir = %config.help_dir.display(), error = %err, "Unable to load help files");
            HelpLibrary::new(&config.help_dir, config.max_buffer)
        }
    };
    let store = Box::new(FileStore::new(&config.player_dir));

    let mut server = MudServer::bind(config, store, help).await?;
    tracing::info!("Listening on {}", server.local_addr());

    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("PulseMUD stopped");
    Ok(())
}
