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

//! Console feedback around a record processor.

use colored::Colorize;
use dumpwalk::{Element, Interruption, ProcessorError, RecordProcessor, RunReport};
use std::io::{self, Write};

/// Wraps a processor with progress dots and the interruption diagnostic.
///
/// Progress goes to stderr so record output on stdout stays clean.
pub struct ConsoleProcessor<P> {
    inner: P,
    dots: u64,
    quiet: bool,
}

impl<P: RecordProcessor> ConsoleProcessor<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            dots: 0,
            quiet: false,
        }
    }

    /// Suppress progress dots.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Number of progress dots printed.
    pub fn dots(&self) -> u64 {
        self.dots
    }

    /// End the dot line, if one was started.
    pub fn finish_line(&mut self) {
        if self.dots > 0 {
            eprintln!();
            self.dots = 0;
        }
    }

    /// The wrapped processor.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwrap the processor.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: RecordProcessor> RecordProcessor for ConsoleProcessor<P> {
    fn record_tag(&self) -> Option<&str> {
        self.inner.record_tag()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        self.inner.process(record)
    }

    fn on_progress(&mut self, records: u64) {
        if !self.quiet {
            let mut stderr = io::stderr().lock();
            // Progress output is best effort
            let _ = stderr.write_all(b".");
            let _ = stderr.flush();
            self.dots += 1;
        }
        self.inner.on_progress(records);
    }

    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        self.finish_line();
        eprintln!("{}", interruption_line(&interruption).red().bold());
        self.inner.on_interrupted(interruption)
    }
}

/// The diagnostic printed when a run stops early.
pub fn interruption_line(interruption: &Interruption) -> String {
    format!(
        "Interrupted. Last record parsed: {} ({} records)",
        interruption.last_record_id.as_deref().unwrap_or("none"),
        interruption.records
    )
}

/// The elapsed-time line printed after every successful run.
pub fn total_time_line(report: &RunReport) -> String {
    format!("(total time: {:.2}s)", report.elapsed.as_secs_f64())
}
