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

/// Default markup escape character.
pub const MARKUP_MARKER: u8 = b'#';

/// Default ceiling for the pending output buffer of a connection.
pub const MAX_OUTPUT: usize = 2048;

/// Control Sequence Introducer
pub const CSI: &[u8] = b"\x1b[";

/// Full SGR reset
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// SGR underline on
pub const SGR_UNDERLINE: &[u8] = b"\x1b[4m";

/// An entry in the colour table: markup tag, SGR foreground code, bold flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTag {
    /// Character following the marker
    pub tag: u8,
    /// SGR foreground parameter
    pub code: &'static [u8],
    /// Bold variant
    pub bold: bool,
}

impl ColorTag {
    const fn new(tag: u8, code: &'static [u8], bold: bool) -> ColorTag {
        ColorTag { tag, code, bold }
    }

    /// Two entries share a hue when they differ only in boldness.
    pub fn same_hue(index: usize, other: usize) -> bool {
        index / 2 == other / 2
    }
}

/// The sixteen colour tags. Each hue occupies two adjacent slots, normal then bold.
pub const COLOR_TABLE: [ColorTag; 16] = [
    ColorTag::new(b'd', b"30", false),
    ColorTag::new(b'D', b"30", true),
    ColorTag::new(b'r', b"31", false),
    ColorTag::new(b'R', b"31", true),
    ColorTag::new(b'g', b"32", false),
    ColorTag::new(b'G', b"32", true),
    ColorTag::new(b'y', b"33", false),
    ColorTag::new(b'Y', b"33", true),
    ColorTag::new(b'b', b"34", false),
    ColorTag::new(b'B', b"34", true),
    ColorTag::new(b'p', b"35", false),
    ColorTag::new(b'P', b"35", true),
    ColorTag::new(b'c', b"36", false),
    ColorTag::new(b'C', b"36", true),
    ColorTag::new(b'w', b"37", false),
    ColorTag::new(b'W', b"37", true),
];

/// Looks up the colour table slot for a markup tag.
pub fn color_index(tag: u8) -> Option<usize> {
    COLOR_TABLE.iter().position(|entry| entry.tag == tag)
}
