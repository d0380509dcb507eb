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

//! # PulseMUD Markup Codec
//!
//! Renders the `#` colour markup used throughout game text into ANSI SGR escape
//! sequences, appending the result to a bounded output buffer.

mod codec;
mod config;
pub mod consts;
mod result;

pub use self::codec::MarkupCodec;
pub use self::config::MarkupConfig;
pub use self::consts::{COLOR_TABLE, ColorTag};
pub use self::result::{AnsiError, AnsiResult};
