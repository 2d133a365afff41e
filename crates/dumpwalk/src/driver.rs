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

//! End-to-end dump runs.
//!
//! [`DumpReader`] wires the pieces together:
//!
//! ```text
//! DumpSource -> EnvelopeReader -> BufReader -> RecordParser -> RecordProcessor
//! ```
//!
//! The envelope reader is always closed once the parse loop ends, whether the
//! run succeeded or not.

use crate::config::{CancelFlag, DumpConfig};
use crate::envelope::EnvelopeReader;
use crate::error::DumpResult;
use crate::parser::{ParseStats, RecordParser};
use crate::processor::RecordProcessor;
use crate::source::{DumpFormat, DumpSource};
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Parse counters
    pub stats: ParseStats,
    /// Wall-clock time from opening the wrapped stream to closing it
    pub elapsed: Duration,
}

impl RunReport {
    /// Delivered records per second of wall-clock time.
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.stats.records as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs a configured dump through a record processor.
///
/// # Examples
///
/// ```rust,no_run
/// use dumpwalk::{CountingProcessor, DumpConfig, DumpReader};
///
/// let config = DumpConfig::new("discogs_releases.xml.gz").with_progress_interval(10_000);
/// let mut counter = CountingProcessor::new();
/// let report = DumpReader::new(config).run(&mut counter)?;
/// println!("{} records in {:.1}s", report.stats.records, report.elapsed.as_secs_f64());
/// # Ok::<(), dumpwalk::DumpError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DumpReader {
    config: DumpConfig,
    cancel: Option<CancelFlag>,
}

impl DumpReader {
    /// Create a reader for `config`.
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop the run when `flag` is set.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Open the configured path and parse it.
    ///
    /// The configuration is validated and the format resolved before the file
    /// is opened, so an unrecognized extension never starts a parse.
    pub fn run<P: RecordProcessor + ?Sized>(&self, processor: &mut P) -> DumpResult<RunReport> {
        self.config.validate()?;
        let path = &self.config.input_path;
        let format = match self.config.format {
            Some(format) => format,
            None => DumpFormat::from_path(path)?,
        };

        info!(path = %path.display(), %format, "Opening dump");
        let source = DumpSource::open(path, format)?;
        self.parse(source, processor)
    }

    /// Parse an already opened byte stream.
    ///
    /// The stream is taken as decoded XML; wrap it in
    /// [`DumpSource::from_reader`] for compressed input.
    pub fn run_reader<R: Read, P: RecordProcessor + ?Sized>(
        &self,
        reader: R,
        processor: &mut P,
    ) -> DumpResult<RunReport> {
        self.config.validate()?;
        self.parse(reader, processor)
    }

    fn parse<R: Read, P: RecordProcessor + ?Sized>(
        &self,
        reader: R,
        processor: &mut P,
    ) -> DumpResult<RunReport> {
        let start = Instant::now();

        let envelope = if self.config.wrap_fragment {
            EnvelopeReader::with_tag(reader, &self.config.envelope_tag)?
        } else {
            EnvelopeReader::unwrapped(reader)
        };
        let prefix = envelope.prefix_len();

        let mut options = self.config.parse_options(processor.record_tag());
        options.cancel = self.cancel.clone();
        debug!(
            record_tag = %options.record_tag,
            wrap = self.config.wrap_fragment,
            buffer_size = self.config.buffer_size,
            "Parse options resolved"
        );

        let buffered = BufReader::with_capacity(self.config.buffer_size, envelope);
        let mut parser = RecordParser::new(buffered, options).with_position_offset(prefix);
        let result = parser.run(processor);

        let mut envelope = parser.into_inner().into_inner();
        let body_bytes = envelope.body_bytes();
        envelope.close();
        let elapsed = start.elapsed();

        let mut stats = result?;
        stats.bytes = body_bytes;

        info!(
            records = stats.records,
            bytes = stats.bytes,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            interrupted = stats.interrupted,
            "Dump parse completed"
        );
        Ok(RunReport { stats, elapsed })
    }
}

/// Parse the dump at `path` with default settings.
///
/// The format follows the extension and the record tag comes from the
/// processor, falling back to [`DEFAULT_RECORD_TAG`](crate::DEFAULT_RECORD_TAG).
pub fn parse_dump<P: RecordProcessor + ?Sized>(
    path: impl AsRef<Path>,
    processor: &mut P,
) -> DumpResult<RunReport> {
    DumpReader::new(DumpConfig::new(path.as_ref())).run(processor)
}
