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

//! Non-blocking byte transports
//!
//! A [`Transport`] never waits. Reads and writes either make progress immediately or
//! fail with [`io::ErrorKind::WouldBlock`], which callers treat as "try again next
//! tick". A read of zero bytes means the peer hung up.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpStream;

/// Raw, non-blocking duplex byte stream
pub trait Transport: fmt::Debug {
    /// Read whatever is available into `buf`
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write as much of `buf` as the transport accepts right now
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Printable name of the remote end
    fn hostname(&self) -> String;
}

impl Transport for TcpStream {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }

    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TcpStream::try_write(self, buf)
    }

    fn hostname(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[derive(Debug, Default)]
struct Pipe {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    hung_up: bool,
    input_closed: bool,
    write_capacity: Option<usize>,
}

/// In-memory transport
///
/// Clones share the same pipe, so a test can keep one handle while the server owns
/// the other.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    pipe: Arc<Mutex<Pipe>>,
    hostname: String,
}

impl MemoryTransport {
    /// Create an empty transport reporting `hostname` as its peer
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            pipe: Arc::new(Mutex::new(Pipe::default())),
            hostname: hostname.into(),
        }
    }

    fn pipe(&self) -> std::sync::MutexGuard<'_, Pipe> {
        self.pipe.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue bytes for the server to read
    pub fn push_input(&self, bytes: impl AsRef<[u8]>) {
        self.pipe().inbound.extend(bytes.as_ref());
    }

    /// Queue a line terminated by CR LF
    pub fn push_line(&self, line: &str) {
        let mut pipe = self.pipe();
        pipe.inbound.extend(line.as_bytes());
        pipe.inbound.extend(b"\r\n");
    }

    /// Drain everything the server has written so far
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.pipe().outbound)
    }

    /// Drain the server output as lossy UTF-8
    pub fn take_text(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }

    /// Simulate the peer hanging up
    pub fn hang_up(&self) {
        self.pipe().hung_up = true;
    }

    /// Simulate the peer shutting down its sending half. Output is still accepted.
    pub fn close_input(&self) {
        self.pipe().input_closed = true;
    }

    /// Limit how many bytes the transport accepts before reporting `WouldBlock`
    pub fn set_write_capacity(&self, capacity: Option<usize>) {
        self.pipe().write_capacity = capacity;
    }
}

impl Transport for MemoryTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pipe = self.pipe();
        if pipe.inbound.is_empty() {
            if pipe.hung_up || pipe.input_closed {
                return Ok(0);
            }
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let count = buf.len().min(pipe.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.inbound.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut pipe = self.pipe();
        if pipe.hung_up {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        let capacity = pipe.write_capacity;
        let count = match capacity {
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(capacity) => {
                let count = capacity.min(buf.len());
                pipe.write_capacity = Some(capacity - count);
                count
            }
            None => buf.len(),
        };
        pipe.outbound.extend_from_slice(&buf[..count]);
        Ok(count)
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }
}
