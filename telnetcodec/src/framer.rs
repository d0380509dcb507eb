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

use super::{FramerError, consts};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

/// Extracts complete command lines from a raw inbound byte stream.
///
/// The framer strips telnet `IAC DO <opt>` and `IAC DONT <opt>` negotiations, drops
/// non-printable bytes and yields one line per CR/LF terminator. Scanner state and the
/// partially assembled line survive between calls, so a negotiation or a line split
/// across two reads is handled the same as one delivered whole.
///
/// Bytes following a completed line are left in the source buffer; the caller decides
/// when to ask for the next line.
#[derive(Debug, Clone)]
pub struct LineFramer {
    state: FramerState,
    line: String,
    max_buffer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    /// Ordinary line data.
    Normal,
    /// An `IAC` byte was seen.
    SawMarker,
    /// `IAC DO` or `IAC DONT` was seen; the next byte is the option code.
    SawOption,
}

impl LineFramer {
    /// Creates a framer bounded by [`consts::MAX_BUFFER`].
    pub fn new() -> LineFramer {
        LineFramer::default()
    }

    /// Creates a framer with a custom buffered-bytes ceiling.
    pub fn with_max_buffer(max_buffer: usize) -> LineFramer {
        LineFramer {
            max_buffer,
            ..LineFramer::default()
        }
    }

    /// The configured ceiling.
    pub fn max_buffer(&self) -> usize {
        self.max_buffer
    }

    /// Number of bytes held in the partially assembled line.
    pub fn pending_len(&self) -> usize {
        self.line.len()
    }

    /// True if accepting `incoming` more bytes on top of `buffered` would exceed the ceiling.
    pub fn would_overflow(&self, buffered: usize, incoming: usize) -> bool {
        buffered + incoming + self.line.len() > self.max_buffer
    }

    /// Drops the partial line and returns the scanner to its initial state.
    pub fn reset(&mut self) {
        self.state = FramerState::Normal;
        self.line.clear();
    }

    fn check_capacity(&mut self, src: &mut BytesMut) -> Result<(), FramerError> {
        let buffered = src.len() + self.line.len();
        if buffered > self.max_buffer {
            warn!(buffered, max = self.max_buffer, "Input overflow, discarding buffered input");
            src.clear();
            self.reset();
            return Err(FramerError::Overflow {
                buffered,
                max: self.max_buffer,
            });
        }
        Ok(())
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        LineFramer {
            state: FramerState::Normal,
            line: String::new(),
            max_buffer: consts::MAX_BUFFER,
        }
    }
}

/// Printable ASCII, space included.
fn is_printable(byte: u8) -> bool {
    byte == b' ' || byte.is_ascii_graphic()
}

impl Decoder for LineFramer {
    type Item = String;
    type Error = FramerError;

    /// Scans `src` for the next complete line.
    ///
    /// Returns `Ok(None)` once `src` is exhausted without a terminator; the consumed bytes
    /// are kept in the framer. On success the run of CR/LF bytes directly following the
    /// terminator is consumed as well. An empty line is returned as an empty string.
    ///
    /// # Errors
    /// [`FramerError::Overflow`] when `src` plus the partial line exceeds the ceiling.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        self.check_capacity(src)?;
        while src.has_remaining() {
            let byte = src.get_u8();
            match (self.state, byte) {
                (FramerState::Normal, consts::IAC) => {
                    self.state = FramerState::SawMarker;
                }
                (FramerState::Normal, consts::CR | consts::LF) => {
                    while matches!(src.first(), Some(&consts::CR) | Some(&consts::LF)) {
                        src.advance(1);
                    }
                    let line = std::mem::take(&mut self.line);
                    trace!(len = line.len(), "Framed command line");
                    return Ok(Some(line));
                }
                (FramerState::Normal, _) => {
                    if is_printable(byte) {
                        self.line.push(char::from(byte));
                    }
                }
                (FramerState::SawMarker, consts::DO | consts::DONT) => {
                    self.state = FramerState::SawOption;
                }
                (FramerState::SawMarker, _) => {
                    self.state = FramerState::Normal;
                }
                (FramerState::SawOption, _) => {
                    self.state = FramerState::Normal;
                }
            }
        }
        Ok(None)
    }
}
