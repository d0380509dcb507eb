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

//! Event loop
//!
//! [`MudServer`] drives the [`World`] at a fixed tick rate on a single task. Each tick
//! accepts pending connections without waiting, then runs [`World::pulse`]. Ticks that
//! overrun are not caught up.

use crate::config::ServerConfig;
use crate::help::HelpLibrary;
use crate::store::PlayerStore;
use crate::world::World;
use crate::Result;
use futures::FutureExt;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// The game server
#[derive(Debug)]
pub struct MudServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    world: World,
}

impl MudServer {
    /// Bind the listener and build the world.
    ///
    /// Binding to port 0 picks a free port; see [`MudServer::local_addr`].
    pub async fn bind(
        config: ServerConfig,
        store: Box<dyn PlayerStore>,
        help: HelpLibrary,
    ) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        let local_addr = listener.local_addr()?;
        let world = World::new(config, store, help)?;
        info!("PulseMUD bound to {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
            world,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Server state
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Server state, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Accept every connection that is already waiting. Returns how many were accepted.
    pub fn accept_pending(&mut self) -> usize {
        let mut accepted = 0;
        while let Some(result) = self.listener.accept().now_or_never() {
            match result {
                Ok((stream, peer)) => {
                    if let Err(err) = stream.set_nodelay(true) {
                        debug!(%peer, error = %err, "Failed to disable Nagle");
                    }
                    self.world.add_connection(Box::new(stream));
                    accepted += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    break;
                }
            }
        }
        accepted
    }

    /// Run a single tick
    pub fn tick(&mut self) {
        self.accept_pending();
        self.world.pulse();
    }

    /// Run until `shutdown` completes or a player shuts the server down, then save
    /// and disconnect everyone.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.world.config().tick_duration();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(?period, addr = %self.local_addr, "Entering game loop");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                    if self.world.shutdown_requested() {
                        info!("Shutdown requested by a player");
                        break;
                    }
                }
            }
        }
        self.world.shutdown();
        info!(ticks = self.world.tick_count(), "Game loop stopped");
    }
}
