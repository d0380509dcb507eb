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

/// Result Type for Framer Operations
pub type FramerResult<T> = Result<T, FramerError>;

/// Errors raised while framing inbound bytes into command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramerError {
    /// An I/O error occurred while feeding the framer.
    IOError {
        /// The kind of I/O error that occurred
        kind: std::io::ErrorKind,
        /// Description of the operation that failed
        operation: String,
    },

    /// Buffered input plus the partial line exceeded the configured ceiling.
    ///
    /// The framer discards everything it holds when this is returned.
    Overflow {
        /// Number of bytes that would have been held
        buffered: usize,
        /// The configured ceiling
        max: usize,
    },
}

impl FramerError {
    /// Returns true if this error must terminate the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FramerError::Overflow { .. })
    }
}

impl std::error::Error for FramerError {}

impl std::fmt::Display for FramerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramerError::IOError { kind, operation } => {
                write!(f, "I/O error during {}: {:?}", operation, kind)
            }
            FramerError::Overflow { buffered, max } => {
                write!(f, "input overflow ({} bytes buffered, max {})", buffered, max)
            }
        }
    }
}

impl From<std::io::Error> for FramerError {
    fn from(err: std::io::Error) -> Self {
        FramerError::IOError {
            kind: err.kind(),
            operation: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FramerError;

    #[test]
    fn overflow_is_fatal() {
        let err = FramerError::Overflow {
            buffered: 1025,
            max: 1024,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "input overflow (1025 bytes buffered, max 1024)");
    }

    #[test]
    fn io_error_converts() {
        let err: FramerError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "peer went away").into();
        assert!(!err.is_fatal());
        assert!(matches!(
            err,
            FramerError::IOError {
                kind: std::io::ErrorKind::UnexpectedEof,
                ..
            }
        ));
    }
}
