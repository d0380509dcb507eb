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

//! Client connection
//!
//! A connection owns its transport together with both halves of the codec stack: the
//! [`LineFramer`] pulls command lines out of the input buffer and the [`MarkupCodec`]
//! renders outgoing text into the output buffer. Nothing here blocks; the event loop
//! calls [`Connection::read`], [`Connection::frame`] and [`Connection::flush`] once per
//! tick.

use crate::config::ServerConfig;
use crate::transport::Transport;
use crate::types::{ConnectionId, ConnectionState, SessionId};
use crate::Result;
use bytes::{Buf, BytesMut};
use metrics::counter;
use pulsemud_ansicodec::{AnsiError, MarkupCodec, MarkupConfig};
use pulsemud_telnetcodec::{FramerError, LineFramer};
use std::io;
use std::time::Instant;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, instrument, trace, warn};

/// Bytes requested from the transport per read call
const READ_CHUNK: usize = 1024;

/// A client connection
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    transport: Box<dyn Transport>,
    state: ConnectionState,
    input: BytesMut,
    output: BytesMut,
    framer: LineFramer,
    encoder: MarkupCodec,
    pending_command: Option<String>,
    prompt_dirty: bool,
    peer_closed: bool,
    hostname: String,
    session: Option<SessionId>,
    created_at: Instant,
    bytes_received: u64,
    bytes_sent: u64,
}

impl Connection {
    /// Wrap a transport
    pub fn new(id: ConnectionId, transport: Box<dyn Transport>, config: &ServerConfig) -> Self {
        let hostname = transport.hostname();
        let encoder = MarkupCodec::new(
            MarkupConfig::default()
                .with_max_input(config.max_buffer)
                .with_max_output(config.max_output),
        );
        Self {
            id,
            transport,
            state: ConnectionState::AwaitingName,
            input: BytesMut::with_capacity(config.max_buffer),
            output: BytesMut::with_capacity(config.max_output),
            framer: LineFramer::with_max_buffer(config.max_buffer),
            encoder,
            pending_command: None,
            prompt_dirty: false,
            peer_closed: false,
            hostname,
            session: None,
            created_at: Instant::now(),
            bytes_received: 0,
            bytes_sent: 0,
        }
    }

    /// Connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to another lifecycle state
    pub fn set_state(&mut self, state: ConnectionState) {
        trace!(connection_id = %self.id, from = %self.state, to = %state, "State change");
        self.state = state;
    }

    /// True once the connection has been closed
    pub fn is_closed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Remote host name
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Linked session
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Link or unlink a session
    pub fn set_session(&mut self, session: Option<SessionId>) {
        self.session = session;
    }

    /// When the connection was accepted
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Total bytes read from the transport
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Total bytes written to the transport
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Raw bytes read but not yet framed
    pub fn buffered_input(&self) -> usize {
        self.input.len()
    }

    /// Output waiting for the next flush
    pub fn pending_output(&self) -> &[u8] {
        &self.output
    }

    /// True if a prompt will be sent on the next flush
    pub fn prompt_dirty(&self) -> bool {
        self.prompt_dirty
    }

    /// Request a prompt on the next flush
    pub fn mark_prompt_dirty(&mut self) {
        self.prompt_dirty = true;
    }

    /// True once the peer has stopped sending. Lines read before that are still framed.
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Pull everything the transport has available into the input buffer.
    ///
    /// End of stream only sets [`Connection::peer_closed`]; the caller closes the
    /// connection once no buffered command is left.
    ///
    /// # Errors
    /// [`ServerError::Framer`](crate::ServerError::Framer) when the input ceiling would be
    /// exceeded and [`ServerError::Io`](crate::ServerError::Io) on transport failure.
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub fn read(&mut self) -> Result<()> {
        if self.peer_closed {
            return Ok(());
        }
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.try_read(&mut chunk) {
                Ok(0) => {
                    debug!(buffered = self.input.len(), "Peer closed the connection");
                    self.peer_closed = true;
                    return Ok(());
                }
                Ok(count) => {
                    if self.framer.would_overflow(self.input.len(), count) {
                        let buffered = self.input.len() + self.framer.pending_len() + count;
                        self.input.clear();
                        self.framer.reset();
                        counter!("pulsemud.input.overflow").increment(1);
                        return Err(FramerError::Overflow {
                            buffered,
                            max: self.framer.max_buffer(),
                        }
                        .into());
                    }
                    self.input.extend_from_slice(&chunk[..count]);
                    self.bytes_received += count as u64;
                    trace!(count, "Read bytes");
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Frame the next command line, unless one is already waiting.
    ///
    /// A completed line marks the prompt dirty. Empty lines are consumed without
    /// becoming a command. Returns true if a command is waiting afterwards.
    pub fn frame(&mut self) -> Result<bool> {
        if self.pending_command.is_some() {
            return Ok(true);
        }
        match self.framer.decode(&mut self.input) {
            Ok(Some(line)) => {
                self.prompt_dirty = true;
                if !line.is_empty() {
                    self.pending_command = Some(line);
                }
                Ok(self.pending_command.is_some())
            }
            Ok(None) => Ok(false),
            Err(err) => {
                counter!("pulsemud.input.overflow").increment(1);
                Err(err.into())
            }
        }
    }

    /// Take the waiting command for dispatch
    pub fn take_command(&mut self) -> Option<String> {
        self.pending_command.take()
    }

    /// Queue markup text.
    ///
    /// # Errors
    /// [`AnsiError::InputTooLong`] or [`AnsiError::OutputOverflow`]; nothing is queued
    /// in either case.
    pub fn try_send(&mut self, text: &str) -> std::result::Result<(), AnsiError> {
        self.encoder.encode(text, &mut self.output)
    }

    /// Queue markup text, logging and dropping it if it does not fit
    pub fn send(&mut self, text: &str) {
        if let Err(err) = self.try_send(text) {
            self.report_dropped(&err);
        }
    }

    /// Queue raw bytes such as telnet control sequences
    pub fn send_raw(&mut self, bytes: &[u8]) {
        if let Err(err) = self.encoder.encode(bytes, &mut self.output) {
            self.report_dropped(&err);
        }
    }

    fn report_dropped(&self, err: &AnsiError) {
        counter!("pulsemud.output.overflow").increment(1);
        error!(connection_id = %self.id, error = %err, "Dropped outgoing text");
    }

    /// Write straight to the transport, bypassing the output buffer.
    ///
    /// Used for final messages on a connection that is about to close. Returns false if
    /// the transport did not take everything.
    pub fn write_direct(&mut self, text: &str) -> bool {
        let mut remaining = text.as_bytes();
        while !remaining.is_empty() {
            match self.transport.try_write(remaining) {
                Ok(0) => return false,
                Ok(count) => {
                    self.bytes_sent += count as u64;
                    remaining = &remaining[count..];
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!(connection_id = %self.id, error = %err, "Direct write failed");
                    return false;
                }
            }
        }
        true
    }

    /// Append the prompt if needed and write as much output as the transport accepts.
    ///
    /// Output the transport refuses with `WouldBlock` stays queued for the next tick.
    #[instrument(skip(self, prompt), fields(connection_id = %self.id))]
    pub fn flush(&mut self, prompt: &str) -> Result<()> {
        if self.prompt_dirty && self.state.is_playing() {
            self.send(prompt);
        }
        self.prompt_dirty = false;

        while !self.output.is_empty() {
            match self.transport.try_write(&self.output) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(count) => {
                    self.output.advance(count);
                    self.bytes_sent += count as u64;
                    trace!(count, "Flushed bytes");
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    trace!(pending = self.output.len(), "Transport full, keeping output");
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "Flush failed");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}
