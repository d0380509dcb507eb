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

//! Error types for the ansicodec crate.

use thiserror::Error;

/// Result type alias for operations that may fail with an [`AnsiError`].
pub type AnsiResult<T> = Result<T, AnsiError>;

/// Errors raised while rendering markup into an output buffer.
///
/// Neither error leaves partial output behind: the destination buffer is untouched.
#[derive(Debug, Error)]
pub enum AnsiError {
    /// IO Error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The markup text was longer than the configured input limit.
    #[error("input too long ({length} bytes, max {max})")]
    InputTooLong {
        /// Length of the rejected text
        length: usize,
        /// The configured limit
        max: usize,
    },

    /// The rendered text did not fit in the destination buffer.
    #[error("output overflow ({required} bytes required, max {max})")]
    OutputOverflow {
        /// Destination length after the write would have completed
        required: usize,
        /// The configured ceiling
        max: usize,
    },
}

impl AnsiError {
    /// Returns true if the error only loses the offending write.
    ///
    /// Both size errors leave the connection usable; an I/O error does not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnsiError::InputTooLong { .. } | AnsiError::OutputOverflow { .. }
        )
    }
}
