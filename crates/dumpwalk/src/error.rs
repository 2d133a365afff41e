// Dweve Dumpwalk - Streaming reader for large XML data dumps
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for dump parsing.
//!
//! Failures fall into two groups:
//!
//! - **Configuration errors** ([`DumpError::UnknownFormat`],
//!   [`DumpError::InvalidConfig`], [`DumpError::Open`]) are reported before a
//!   single byte is parsed.
//! - **Interruptions** ([`DumpError::Interrupted`]) end a parse that was
//!   already running. They carry an [`Interruption`] describing the cause and
//!   the last record that was fully delivered, so a later run can be resumed
//!   by hand.
//!
//! # Examples
//!
//! ```rust
//! use dumpwalk::{DumpError, FailureKind, InterruptCause, Interruption};
//!
//! let interruption = Interruption {
//!     cause: InterruptCause::malformed(120, "unexpected end of input"),
//!     last_record_id: Some("42".to_string()),
//!     records: 42,
//! };
//! assert_eq!(interruption.cause.kind(), FailureKind::Malformed);
//!
//! let err = DumpError::from(interruption);
//! assert_eq!(err.last_record_id(), Some("42"));
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the dump reader.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The input path does not end in a recognized dump extension.
    #[error("Unknown extension on dump file path '{}' (expected .xml or .xml.gz)", .path.display())]
    UnknownFormat {
        /// The rejected path
        path: PathBuf,
    },

    /// A configuration value is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dump file could not be opened.
    #[error("Failed to open '{}': {source}", .path.display())]
    Open {
        /// The path that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Parsing started but did not run to the end of the dump.
    #[error(transparent)]
    Interrupted(#[from] Interruption),
}

impl DumpError {
    /// Id of the last record delivered before an interruption, if any.
    pub fn last_record_id(&self) -> Option<&str> {
        match self {
            Self::Interrupted(interruption) => interruption.last_record_id.as_deref(),
            _ => None,
        }
    }

    /// The interruption details, if parsing had started.
    pub fn interruption(&self) -> Option<&Interruption> {
        match self {
            Self::Interrupted(interruption) => Some(interruption),
            _ => None,
        }
    }
}

/// Describes a parse run that stopped before the end of the dump.
///
/// `last_record_id` is the `id` attribute of the last record whose
/// [`process`](crate::RecordProcessor::process) call returned successfully.
/// A record that was being assembled or processed when the failure occurred
/// is never reported here.
#[derive(Error, Debug)]
#[error("interrupted after {records} records (last record: {}): {cause}", .last_record_id.as_deref().unwrap_or("none"))]
pub struct Interruption {
    /// What stopped the parse
    #[source]
    pub cause: InterruptCause,
    /// Id attribute of the last successfully processed record
    pub last_record_id: Option<String>,
    /// Number of records successfully processed before the failure
    pub records: u64,
}

/// The condition that interrupted a parse.
#[derive(Error, Debug)]
pub enum InterruptCause {
    /// Reading or decompressing the byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// The XML could not be parsed any further.
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed {
        /// Byte offset in the decompressed dump
        position: u64,
        /// Description of the problem
        message: String,
    },

    /// Elements were nested deeper than the configured limit.
    #[error("Nesting depth exceeded (max: {max}) at byte {position}")]
    DepthLimitExceeded {
        /// Configured maximum depth
        max: usize,
        /// Byte offset in the decompressed dump
        position: u64,
    },

    /// The record processor failed.
    #[error("Record processor failed: {0}")]
    Processor(#[source] ProcessorError),

    /// The run exceeded its time limit.
    #[error("Parsing timeout: elapsed {elapsed:?} exceeded limit {limit:?}")]
    Timeout {
        /// Time spent before the check fired
        elapsed: Duration,
        /// Configured limit
        limit: Duration,
    },

    /// The run was cancelled through its [`CancelFlag`](crate::CancelFlag).
    #[error("Parsing cancelled")]
    Cancelled,
}

/// Coarse classification of an [`InterruptCause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// I/O or decompression failure
    Io,
    /// Malformed XML, including nesting beyond the depth limit
    Malformed,
    /// The record processor returned an error
    Processor,
    /// Stopped from outside: timeout or cancellation
    Aborted,
}

impl InterruptCause {
    /// Create a malformed-XML cause.
    #[inline]
    pub fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }

    /// Classify the cause.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io(_) => FailureKind::Io,
            Self::Malformed { .. } | Self::DepthLimitExceeded { .. } => FailureKind::Malformed,
            Self::Processor(_) => FailureKind::Processor,
            Self::Timeout { .. } | Self::Cancelled => FailureKind::Aborted,
        }
    }

    /// Byte position of the failure, where known.
    pub fn position(&self) -> Option<u64> {
        match self {
            Self::Malformed { position, .. } | Self::DepthLimitExceeded { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}

impl From<io::Error> for InterruptCause {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Errors raised by a [`RecordProcessor`](crate::RecordProcessor).
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Writing processor output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serializing a record failed.
    #[error("XML write error: {0}")]
    Xml(String),

    /// Any other processor-defined failure.
    #[error("{0}")]
    Message(String),
}

impl ProcessorError {
    /// Create a processor error from a message.
    #[inline]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<quick_xml::Error> for ProcessorError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => {
                ProcessorError::Io(io::Error::new(io.kind(), io.to_string()))
            }
            other => ProcessorError::Xml(other.to_string()),
        }
    }
}

/// Result type for dump operations.
pub type DumpResult<T> = Result<T, DumpError>;
