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

//! Error type for the dumpwalk command-line interface.
//!
//! Every failure maps to a process exit status through
//! [`CliError::exit_code`], following the BSD `sysexits` conventions so
//! scripts can tell a bad invocation from a truncated dump.

use dumpwalk::{DumpError, FailureKind};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid flags or an unrecognized dump extension.
pub const EXIT_USAGE: u8 = 2;
/// The dump is not well-formed XML.
pub const EXIT_DATA: u8 = 65;
/// A record handler failed.
pub const EXIT_SOFTWARE: u8 = 70;
/// Reading the dump or writing output failed.
pub const EXIT_IO: u8 = 74;
/// The run timed out or was cancelled.
pub const EXIT_TEMPFAIL: u8 = 75;

/// Errors reported by `dumpwalk` subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    /// The dump reader failed.
    #[error(transparent)]
    Dump(#[from] DumpError),

    /// An output file could not be created or written.
    #[error("I/O error for '{}': {message}", .path.display())]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// Invalid input provided by the user.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Dump(DumpError::UnknownFormat { .. })
            | CliError::Dump(DumpError::InvalidConfig(_))
            | CliError::InvalidInput(_) => EXIT_USAGE,
            CliError::Dump(DumpError::Open { .. }) | CliError::Io { .. } => EXIT_IO,
            CliError::Dump(DumpError::Interrupted(interruption)) => {
                match interruption.cause.kind() {
                    FailureKind::Io => EXIT_IO,
                    FailureKind::Malformed => EXIT_DATA,
                    FailureKind::Processor => EXIT_SOFTWARE,
                    FailureKind::Aborted => EXIT_TEMPFAIL,
                }
            }
        }
    }

    /// Whether the dump was partially processed before the failure.
    pub fn is_interruption(&self) -> bool {
        matches!(self, CliError::Dump(DumpError::Interrupted(_)))
    }
}
