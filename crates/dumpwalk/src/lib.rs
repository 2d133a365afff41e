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

//! Streaming reader for large XML data dumps
//!
//! This crate extracts records from multi-gigabyte XML dumps (such as the
//! Discogs monthly releases, artists, labels and masters files) without
//! building the whole document tree. Each record element is handed to a
//! [`RecordProcessor`] as soon as its closing tag is read, and every other
//! completed subtree is dropped right away.
//!
//! # Features
//!
//! - **Bounded memory**: resident nodes never exceed the open ancestors plus
//!   the record being assembled
//! - **Fragment input**: bare sequences of sibling elements with no root are
//!   wrapped in a synthetic envelope element
//! - **Gzip**: `.xml.gz` dumps are decompressed on the fly
//! - **Resumable failures**: interruptions report the id of the last record
//!   that was fully processed
//! - **Limits**: nesting depth, wall-clock timeout and external cancellation
//!
//! # Quick Start
//!
//! ```rust
//! use dumpwalk::{DumpConfig, DumpReader, Element, ProcessorError, RecordProcessor};
//! use std::io::Cursor;
//!
//! struct Titles(Vec<String>);
//!
//! impl RecordProcessor for Titles {
//!     fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
//!         if let Some(title) = record.find("title") {
//!             self.0.push(title.text());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // No root element: the envelope makes this a well-formed document.
//! let dump = r#"<release id="1"><title>Stockholm</title></release>
//! <release id="2"><title>Aerosol</title></release>"#;
//!
//! let mut titles = Titles(Vec::new());
//! let report = DumpReader::new(DumpConfig::default())
//!     .run_reader(Cursor::new(dump), &mut titles)
//!     .unwrap();
//!
//! assert_eq!(report.stats.records, 2);
//! assert_eq!(titles.0, vec!["Stockholm", "Aerosol"]);
//! ```
//!
//! # Interruptions
//!
//! Truncated input, malformed XML, I/O errors and processor errors all stop
//! the run. The processor sees the failure first through
//! [`RecordProcessor::on_interrupted`] and decides whether it propagates:
//!
//! ```rust
//! use dumpwalk::{CountingProcessor, DumpConfig, DumpReader};
//! use std::io::Cursor;
//!
//! let truncated = r#"<release id="7"/><release id="8"/><release id="9"><title>"#;
//! let mut counter = CountingProcessor::new();
//! let err = DumpReader::new(DumpConfig::default())
//!     .run_reader(Cursor::new(truncated), &mut counter)
//!     .unwrap_err();
//!
//! assert_eq!(err.last_record_id(), Some("8"));
//! ```

pub mod config;
mod driver;
mod element;
mod envelope;
mod error;
mod parser;
mod processor;
pub mod serialize;
mod source;

pub use config::{CancelFlag, DumpConfig, ParseOptions, DEFAULT_RECORD_TAG};
pub use driver::{parse_dump, DumpReader, RunReport};
pub use element::{Element, Node};
pub use envelope::{EnvelopeReader, DEFAULT_ENVELOPE_TAG};
pub use error::{
    DumpError, DumpResult, FailureKind, InterruptCause, Interruption, ProcessorError,
};
pub use parser::{ParseStats, RecordParser};
pub use processor::{
    CountingProcessor, NullProcessor, RecordProcessor, SamplingProcessor, SerializingProcessor,
};
pub use source::{DumpFormat, DumpSource};
