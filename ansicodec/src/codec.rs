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

use crate::consts::{COLOR_TABLE, CSI, ColorTag, SGR_RESET, SGR_UNDERLINE, color_index};
use crate::{AnsiError, AnsiResult, MarkupConfig};
use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::{debug, instrument};

/// Markup codec rendering `#` tagged text into ANSI SGR sequences.
///
/// Tags recognised after the marker:
///
/// | Tag | Effect |
/// |-----|--------|
/// | `#` | literal marker |
/// | `u` | toggle underline |
/// | `n` | reset all styling |
/// | `d r g y b p c w` | normal foreground colour |
/// | `D R G Y B P C W` | bold foreground colour |
///
/// Any other character after the marker leaves the marker in the output and is then
/// treated as ordinary text. Styling starts from the terminal default on every write
/// and is reset at the end of a write that left anything active.
///
/// Writes are all-or-nothing: a write that would push the destination past
/// [`MarkupConfig::max_output`] fails with [`AnsiError::OutputOverflow`] and appends
/// nothing.
#[derive(Clone, Debug, Default)]
pub struct MarkupCodec {
    config: MarkupConfig,
}

/// Styling state carried through a single render.
#[derive(Clone, Copy, Debug, Default)]
struct Style {
    color: Option<usize>,
    bold: bool,
    underline: bool,
}

impl Style {
    fn is_active(self) -> bool {
        self.color.is_some() || self.bold || self.underline
    }
}

impl MarkupCodec {
    /// Creates a new markup codec with the given configuration.
    pub fn new(config: MarkupConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    /// Renders markup into raw terminal bytes without applying any limits.
    pub fn render(&self, text: &str) -> Vec<u8> {
        let marker = self.config.marker;
        let src = text.as_bytes();
        let mut out = Vec::with_capacity(src.len() + 16);
        let mut style = Style::default();
        let mut i = 0;

        while i < src.len() {
            if src[i] != marker {
                out.push(src[i]);
                i += 1;
                continue;
            }
            i += 1;
            match src.get(i).copied() {
                Some(b'u') => {
                    i += 1;
                    if style.underline {
                        style.underline = false;
                        out.extend_from_slice(b"\x1b[0");
                        if style.bold {
                            out.extend_from_slice(b";1");
                        }
                        if let Some(color) = style.color {
                            out.push(b';');
                            out.extend_from_slice(COLOR_TABLE[color].code);
                        }
                        out.push(b'm');
                    } else {
                        style.underline = true;
                        out.extend_from_slice(SGR_UNDERLINE);
                    }
                }
                Some(tag) if tag == marker => {
                    i += 1;
                    out.push(marker);
                }
                Some(b'n') => {
                    i += 1;
                    if style.is_active() {
                        style.underline = false;
                        style.bold = false;
                        out.extend_from_slice(SGR_RESET);
                    }
                    style.color = None;
                }
                next => match next.and_then(color_index) {
                    Some(index) => {
                        i += 1;
                        change_color(&mut style, index, &mut out);
                    }
                    None => out.push(marker),
                },
            }
        }

        if style.is_active() {
            out.extend_from_slice(SGR_RESET);
        }
        out
    }

    fn append(&self, rendered: &[u8], dst: &mut BytesMut) -> AnsiResult<()> {
        let prefix: &[u8] = if self.config.leading_crlf && dst.is_empty() {
            b"\r\n"
        } else {
            b""
        };
        let required = dst.len() + prefix.len() + rendered.len();
        if required > self.config.max_output {
            debug!(required, max = self.config.max_output, "Rejected write, output overflow");
            return Err(AnsiError::OutputOverflow {
                required,
                max: self.config.max_output,
            });
        }
        dst.reserve(prefix.len() + rendered.len());
        dst.extend_from_slice(prefix);
        dst.extend_from_slice(rendered);
        Ok(())
    }
}

/// Emits the shortest SGR sequence moving from the current style to colour `index`.
fn change_color(style: &mut Style, index: usize, out: &mut Vec<u8>) {
    if style.color == Some(index) {
        return;
    }
    let entry = COLOR_TABLE[index];
    let mut color_code = match style.color {
        None => true,
        Some(last) => !ColorTag::same_hue(last, index),
    };

    out.extend_from_slice(CSI);
    if style.bold && !entry.bold {
        // Leaving bold needs a full reset, which also drops the colour.
        out.push(b'0');
        style.bold = false;
        if style.underline {
            out.extend_from_slice(b";4");
        }
        out.push(b';');
        color_code = true;
    } else if !style.bold && entry.bold {
        out.push(b'1');
        style.bold = true;
        if color_code {
            out.push(b';');
        }
    }
    if color_code {
        out.extend_from_slice(entry.code);
    }
    out.push(b'm');
    style.color = Some(index);
}

impl<'a> Encoder<&'a str> for MarkupCodec {
    type Error = AnsiError;

    /// Renders markup text and appends it to `dst`.
    #[instrument(skip_all, fields(len = item.len()))]
    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> AnsiResult<()> {
        if item.len() > self.config.max_input {
            debug!(max = self.config.max_input, "Rejected write, input too long");
            return Err(AnsiError::InputTooLong {
                length: item.len(),
                max: self.config.max_input,
            });
        }
        let rendered = self.render(item);
        self.append(&rendered, dst)
    }
}

impl<'a> Encoder<&'a [u8]> for MarkupCodec {
    type Error = AnsiError;

    /// Appends raw bytes, such as telnet control sequences, without markup parsing.
    fn encode(&mut self, item: &'a [u8], dst: &mut BytesMut) -> AnsiResult<()> {
        self.append(item, dst)
    }
}
