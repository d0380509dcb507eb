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

//! # PulseMUD Telnet Line Framer
//!
//! Line oriented MUD clients speak plain text wrapped in a thin layer of telnet option
//! negotiation. This crate turns the raw inbound byte stream of such a client into
//! discrete command lines.
//!
//! ## Core Components
//!
//! ### [`LineFramer`]
//!
//! A stateful [`Decoder`](tokio_util::codec::Decoder) yielding one `String` per CR/LF
//! terminated line. It understands just enough of the telnet protocol to discard
//! `IAC DO <option>` and `IAC DONT <option>` triples; any other `IAC` pair is swallowed.
//! Non-printable bytes never reach the line.
//!
//! ### [`consts`]
//!
//! Telnet command bytes along with the two echo control sequences a server sends around
//! password prompts, [`consts::ECHO_OFF`] and [`consts::ECHO_ON`].
//!
//! ## Usage Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use pulsemud_telnetcodec::LineFramer;
//! use tokio_util::codec::Decoder;
//!
//! let mut framer = LineFramer::new();
//! let mut input = BytesMut::from(&b"\xFF\xFD\x01say hello\r\n"[..]);
//! assert_eq!(framer.decode(&mut input).unwrap().as_deref(), Some("say hello"));
//! ```
//!
//! ## Buffer Limits
//!
//! The framer enforces a ceiling on buffered input plus the partial line. Exceeding it
//! yields [`FramerError::Overflow`] and discards all held input.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub mod consts;
mod framer;
mod result;

pub use self::framer::LineFramer;
pub use self::result::{FramerError, FramerResult};
