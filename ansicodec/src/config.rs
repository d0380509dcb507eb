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

use crate::consts::{MARKUP_MARKER, MAX_OUTPUT};
use pulsemud_telnetcodec::consts::MAX_BUFFER;

/// Markup Codec Configuration
///
/// Controls the markup escape character and the size limits applied to each write.
///
/// ```
/// use pulsemud_ansicodec::MarkupConfig;
///
/// let config = MarkupConfig::default()
///     .with_max_output(4096)
///     .with_leading_crlf(false);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarkupConfig {
    /// Character introducing a markup tag
    pub marker: u8,
    /// Longest markup text accepted by a single write
    pub max_input: usize,
    /// Ceiling on the destination buffer after a write
    pub max_output: usize,
    /// Prefix `\r\n` when writing into an empty destination
    pub leading_crlf: bool,
}

impl MarkupConfig {
    /// Set the markup marker
    pub fn with_marker(mut self, marker: u8) -> Self {
        self.marker = marker;
        self
    }

    /// Set the input limit
    pub fn with_max_input(mut self, max_input: usize) -> Self {
        self.max_input = max_input;
        self
    }

    /// Set the output ceiling
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    /// Enable or disable the leading line break
    pub fn with_leading_crlf(mut self, enabled: bool) -> Self {
        self.leading_crlf = enabled;
        self
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        MarkupConfig {
            marker: MARKUP_MARKER,
            max_input: MAX_BUFFER,
            max_output: MAX_OUTPUT,
            leading_crlf: true,
        }
    }
}
