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

//! The record processor contract and stock implementations.
//!
//! The parse loop hands every completed record to a [`RecordProcessor`].
//! Records arrive in document order, one call per record, synchronously with
//! parsing. The element is only borrowed for the duration of the call; its
//! storage is released by the loop afterwards, so a processor that needs data
//! later must copy it out.
//!
//! # Implementations
//!
//! - [`CountingProcessor`]: counts records and the elements inside them
//! - [`NullProcessor`]: discards everything (parse-only runs)
//! - [`SerializingProcessor`]: writes each record back out as XML
//! - [`SamplingProcessor`]: forwards every Nth record to another processor
//!
//! # Examples
//!
//! ```rust
//! use dumpwalk::{Element, ProcessorError, RecordProcessor};
//!
//! /// Collects the titles of all masters.
//! struct Titles(Vec<String>);
//!
//! impl RecordProcessor for Titles {
//!     fn record_tag(&self) -> Option<&str> {
//!         Some("master")
//!     }
//!
//!     fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
//!         if let Some(title) = record.find("title") {
//!             self.0.push(title.text());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::element::Element;
use crate::error::{Interruption, ProcessorError};
use crate::serialize::write_element;
use quick_xml::Writer;
use std::io::Write;
use tracing::error;

/// Receives completed records from the parse loop.
pub trait RecordProcessor {
    /// Tag name this processor treats as a record.
    ///
    /// Used when the run configuration does not name one. Returning `None`
    /// (the default) falls back to [`DEFAULT_RECORD_TAG`](crate::DEFAULT_RECORD_TAG).
    fn record_tag(&self) -> Option<&str> {
        None
    }

    /// Handle one completed record.
    ///
    /// Called exactly once per record, in document order. Returning an error
    /// aborts the parse.
    fn process(&mut self, record: &Element) -> Result<(), ProcessorError>;

    /// Periodic progress signal, every `progress_interval` records.
    fn on_progress(&mut self, _records: u64) {}

    /// Called once when the parse stops early.
    ///
    /// Receives the cause and the id of the last record processed
    /// successfully. Returning the interruption propagates it to the caller
    /// of the run; returning `Ok(())` swallows it and the run reports an
    /// interrupted but successful result.
    ///
    /// The default implementation logs a diagnostic and propagates.
    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        error!(
            last_record = interruption.last_record_id.as_deref().unwrap_or("none"),
            records = interruption.records,
            "Interrupted: {}",
            interruption.cause
        );
        Err(interruption)
    }
}

impl<P: RecordProcessor + ?Sized> RecordProcessor for &mut P {
    fn record_tag(&self) -> Option<&str> {
        (**self).record_tag()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        (**self).process(record)
    }

    fn on_progress(&mut self, records: u64) {
        (**self).on_progress(records)
    }

    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        (**self).on_interrupted(interruption)
    }
}

impl<P: RecordProcessor + ?Sized> RecordProcessor for Box<P> {
    fn record_tag(&self) -> Option<&str> {
        (**self).record_tag()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        (**self).process(record)
    }

    fn on_progress(&mut self, records: u64) {
        (**self).on_progress(records)
    }

    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        (**self).on_interrupted(interruption)
    }
}

/// Counts records and the elements they contain.
#[derive(Debug, Clone, Default)]
pub struct CountingProcessor {
    tag: Option<String>,
    records: u64,
    elements: u64,
    last_id: Option<String>,
}

impl CountingProcessor {
    /// Counter using the run's record tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter that declares `tag` as its record tag.
    pub fn for_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Records seen.
    #[inline]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Elements seen inside records, the records themselves included.
    #[inline]
    pub fn elements(&self) -> u64 {
        self.elements
    }

    /// Id of the most recent record.
    pub fn last_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }
}

impl RecordProcessor for CountingProcessor {
    fn record_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        self.records += 1;
        self.elements += record.element_count() as u64;
        self.last_id = record.id().map(str::to_owned);
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProcessor;

impl RecordProcessor for NullProcessor {
    fn process(&mut self, _record: &Element) -> Result<(), ProcessorError> {
        Ok(())
    }
}

/// Writes each record to an output stream as XML.
///
/// Records are separated by newlines, so the output is itself a fragment
/// that can be parsed again with the envelope enabled. In pretty mode the
/// indenting writer already breaks the line before each record. The writer is flushed
/// when the run is interrupted, before the interruption propagates.
pub struct SerializingProcessor<W: Write> {
    writer: Writer<W>,
    tag: Option<String>,
    pretty: bool,
    written: u64,
}

impl<W: Write> SerializingProcessor<W> {
    /// Compact output.
    pub fn new(output: W) -> Self {
        Self {
            writer: Writer::new(output),
            tag: None,
            pretty: false,
            written: 0,
        }
    }

    /// Indented output, `indent` spaces per level.
    pub fn pretty(output: W, indent: usize) -> Self {
        Self {
            writer: Writer::new_with_indent(output, b' ', indent),
            tag: None,
            pretty: true,
            written: 0,
        }
    }

    /// Declare `tag` as the record tag.
    pub fn with_record_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Records written so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying output.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.get_mut().flush()
    }

    /// Recover the output stream.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> RecordProcessor for SerializingProcessor<W> {
    fn record_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        write_element(&mut self.writer, record)?;
        if !self.pretty {
            self.writer.get_mut().write_all(b"\n")?;
        }
        self.written += 1;
        Ok(())
    }

    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        if let Err(e) = self.flush() {
            error!("Failed to flush record output: {}", e);
        }
        error!(
            last_record = interruption.last_record_id.as_deref().unwrap_or("none"),
            written = self.written,
            "Interrupted: {}",
            interruption.cause
        );
        Err(interruption)
    }
}

/// Forwards every `every`-th record to an inner processor.
///
/// The first record is always forwarded. Progress and interruption signals
/// are passed through unchanged.
#[derive(Debug, Clone)]
pub struct SamplingProcessor<P> {
    inner: P,
    every: u64,
    seen: u64,
}

impl<P: RecordProcessor> SamplingProcessor<P> {
    /// Sample every `every`-th record; `0` is treated as `1`.
    pub fn new(inner: P, every: u64) -> Self {
        Self {
            inner,
            every: every.max(1),
            seen: 0,
        }
    }

    /// The wrapped processor.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwrap the inner processor.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: RecordProcessor> RecordProcessor for SamplingProcessor<P> {
    fn record_tag(&self) -> Option<&str> {
        self.inner.record_tag()
    }

    fn process(&mut self, record: &Element) -> Result<(), ProcessorError> {
        let index = self.seen;
        self.seen += 1;
        if index % self.every == 0 {
            self.inner.process(record)
        } else {
            Ok(())
        }
    }

    fn on_progress(&mut self, records: u64) {
        self.inner.on_progress(records)
    }

    fn on_interrupted(&mut self, interruption: Interruption) -> Result<(), Interruption> {
        self.inner.on_interrupted(interruption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterruptCause;

    fn release(id: &str) -> Element {
        Element::new("release")
            .with_attr("id", id)
            .with_child(Element::new("title").with_text(format!("Release {}", id)))
    }

    // ==================== CountingProcessor tests ====================

    #[test]
    fn test_counting_processor() {
        let mut counter = CountingProcessor::new();
        counter.process(&release("1")).unwrap();
        counter.process(&release("2")).unwrap();
        assert_eq!(counter.records(), 2);
        assert_eq!(counter.elements(), 4);
        assert_eq!(counter.last_id(), Some("2"));
        assert_eq!(counter.record_tag(), None);
    }

    #[test]
    fn test_counting_processor_declares_tag() {
        let counter = CountingProcessor::for_tag("label");
        assert_eq!(counter.record_tag(), Some("label"));
    }

    // ==================== Default interruption handling tests ====================

    #[test]
    fn test_default_on_interrupted_propagates() {
        let mut processor = NullProcessor;
        let interruption = Interruption {
            cause: InterruptCause::Cancelled,
            last_record_id: Some("5".to_string()),
            records: 5,
        };
        let returned = processor.on_interrupted(interruption).unwrap_err();
        assert_eq!(returned.last_record_id.as_deref(), Some("5"));
        assert_eq!(returned.records, 5);
    }

    #[test]
    fn test_forwarding_through_mut_ref_and_box() {
        let mut counter = CountingProcessor::for_tag("artist");
        {
            let by_ref: &mut CountingProcessor = &mut counter;
            assert_eq!(RecordProcessor::record_tag(&by_ref), Some("artist"));
            by_ref.process(&release("1")).unwrap();
        }
        let mut boxed: Box<dyn RecordProcessor> = Box::new(counter);
        assert_eq!(boxed.record_tag(), Some("artist"));
        boxed.process(&release("2")).unwrap();
    }

    // ==================== SerializingProcessor tests ====================

    #[test]
    fn test_serializing_processor_writes_records() {
        let mut processor = SerializingProcessor::new(Vec::new());
        processor.process(&release("1")).unwrap();
        processor.process(&Element::new("release").with_attr("id", "2")).unwrap();
        assert_eq!(processor.written(), 2);

        let output = String::from_utf8(processor.into_inner()).unwrap();
        assert_eq!(
            output,
            "<release id=\"1\"><title>Release 1</title></release>\n<release id=\"2\"/>\n"
        );
    }

    #[test]
    fn test_serializing_processor_pretty_has_no_blank_lines() {
        let mut processor = SerializingProcessor::pretty(Vec::new(), 2);
        processor.process(&release("1")).unwrap();
        processor.process(&release("2")).unwrap();
        assert_eq!(processor.written(), 2);

        let output = String::from_utf8(processor.into_inner()).unwrap();
        assert!(output.starts_with("<release id=\"1\">"), "{:?}", output);
        assert!(output.contains("\n  <title>Release 1</title>"), "{:?}", output);
        assert!(output.contains("</release>\n<release id=\"2\">"), "{:?}", output);
        assert!(!output.contains("\n\n"), "{:?}", output);
    }

    #[test]
    fn test_serializing_processor_propagates_interruption() {
        let mut processor = SerializingProcessor::new(Vec::new()).with_record_tag("master");
        assert_eq!(processor.record_tag(), Some("master"));
        let interruption = Interruption {
            cause: InterruptCause::malformed(3, "truncated"),
            last_record_id: None,
            records: 0,
        };
        assert!(processor.on_interrupted(interruption).is_err());
    }

    #[test]
    fn test_serializing_processor_write_failure() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut processor = SerializingProcessor::new(Full);
        assert!(processor.process(&release("1")).is_err());
        assert_eq!(processor.written(), 0);
    }

    // ==================== SamplingProcessor tests ====================

    #[test]
    fn test_sampling_every_third() {
        let mut sampler = SamplingProcessor::new(CountingProcessor::new(), 3);
        for id in 1..=7 {
            sampler.process(&release(&id.to_string())).unwrap();
        }
        // Records 1, 4 and 7
        assert_eq!(sampler.inner().records(), 3);
        assert_eq!(sampler.inner().last_id(), Some("7"));
    }

    #[test]
    fn test_sampling_zero_means_all() {
        let mut sampler = SamplingProcessor::new(CountingProcessor::new(), 0);
        sampler.process(&release("1")).unwrap();
        sampler.process(&release("2")).unwrap();
        assert_eq!(sampler.into_inner().records(), 2);
    }
}
