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

//! Telnet protocol bytes recognised by the framer.

/// Interpret As Command
pub const IAC: u8 = 255;
/// Refuse to perform, or continue performing, the indicated option.
pub const DONT: u8 = 254;
/// Request that the other party perform the indicated option.
pub const DO: u8 = 253;
/// Refuse to perform, or continue performing, the indicated option locally.
pub const WONT: u8 = 252;
/// Desire to begin performing the indicated option locally.
pub const WILL: u8 = 251;

/// Carriage Return
pub const CR: u8 = b'\r';
/// Line Feed
pub const LF: u8 = b'\n';

/// Telnet option codes.
pub mod option {
    /// Echo (RFC 857)
    pub const ECHO: u8 = 1;
}

/// `IAC WILL ECHO`: the server claims echo, so the client stops echoing locally.
pub const ECHO_OFF: [u8; 3] = [IAC, WILL, option::ECHO];

/// `IAC WONT ECHO`: the client resumes local echo.
pub const ECHO_ON: [u8; 3] = [IAC, WONT, option::ECHO];

/// Default ceiling for buffered inbound bytes per connection.
pub const MAX_BUFFER: usize = 1024;
