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

//! Incremental record parser with subtree pruning.
//!
//! [`RecordParser`] pulls start and end events from quick-xml and turns them
//! into completed record elements while discarding everything else.
//!
//! # Algorithm
//!
//! The parser keeps an explicit ancestor stack mirroring the open elements and
//! a record depth counter (how many open elements carry the record tag):
//!
//! 1. On a start tag the new element is pushed; a record tag increments the
//!    counter.
//! 2. On an end tag the element is popped. A record tag decrements the counter
//!    and the record is handed to the processor.
//! 3. After popping, an element is dropped outright when the counter is zero,
//!    otherwise it is attached to the element below it on the stack.
//!
//! Records nested inside records are delivered too, inner first, but stay
//! attached to the outer record until the outer one is delivered. The
//! counter, not the tag name alone, decides when a subtree can be released.
//!
//! # Memory
//!
//! Resident nodes are bounded by the depth of the open ancestors plus the
//! size of the record currently being assembled. [`ParseStats`] exposes the
//! peak so callers can verify the bound; after a run `elements == pruned`.
//!
//! # Examples
//!
//! ```rust
//! use dumpwalk::{CountingProcessor, ParseOptions, RecordParser};
//! use std::io::Cursor;
//!
//! let xml = r#"<releases>
//!     <release id="1"><title>A</title></release>
//!     <release id="2"><title>B</title></release>
//! </releases>"#;
//!
//! let mut parser = RecordParser::new(Cursor::new(xml), ParseOptions::for_tag("release"));
//! let mut counter = CountingProcessor::new();
//! let stats = parser.run(&mut counter).unwrap();
//!
//! assert_eq!(stats.records, 2);
//! assert_eq!(stats.last_record_id.as_deref(), Some("2"));
//! assert_eq!(stats.elements, stats.pruned);
//! ```

use crate::config::ParseOptions;
use crate::element::Element;
use crate::error::{DumpError, DumpResult, InterruptCause, Interruption};
use crate::processor::RecordProcessor;
use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Events between two timeout/cancellation checks.
const LIMIT_CHECK_INTERVAL: u64 = 100;

/// Counters describing one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Records handed to the processor successfully.
    pub records: u64,
    /// `id` attribute of the last record processed successfully.
    pub last_record_id: Option<String>,
    /// Elements created, envelope included.
    pub elements: u64,
    /// Elements released, either pruned or dropped with a record.
    pub pruned: u64,
    /// Largest number of elements resident at once.
    pub peak_resident: usize,
    /// Input bytes consumed, envelope excluded where known.
    pub bytes: u64,
    /// The run stopped early and the processor swallowed the interruption.
    pub interrupted: bool,
}

/// One open element and the number of elements attached below it.
#[derive(Debug)]
struct Frame {
    element: Element,
    nodes: usize,
}

/// A single unit of work pulled from the XML reader.
enum Step {
    Open(Element),
    Empty(Element),
    Close(String),
    Text(String),
    Eof,
    Skip,
}

/// Pull parser that delivers completed records to a [`RecordProcessor`].
pub struct RecordParser<R: BufRead> {
    reader: Reader<R>,
    options: ParseOptions,
    stack: Vec<Frame>,
    record_depth: usize,
    root_closed: bool,
    resident: usize,
    position_offset: u64,
    stats: ParseStats,
    events: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> RecordParser<R> {
    /// Create a parser over `reader`.
    pub fn new(reader: R, options: ParseOptions) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            options,
            stack: Vec::new(),
            record_depth: 0,
            root_closed: false,
            resident: 0,
            position_offset: 0,
            stats: ParseStats::default(),
            events: 0,
            buf: Vec::with_capacity(8192),
        }
    }

    /// Report error positions relative to the end of a synthetic prefix.
    ///
    /// Set this to the envelope's opening tag length so positions refer to
    /// the dump itself.
    pub fn with_position_offset(mut self, offset: usize) -> Self {
        self.position_offset = offset as u64;
        self
    }

    /// Options in effect.
    #[inline]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Counters so far.
    #[inline]
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Elements currently held, open or attached to an open record.
    #[inline]
    pub fn resident(&self) -> usize {
        self.resident
    }

    /// Number of open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Byte offset of the reader in the dump.
    pub fn position(&self) -> u64 {
        (self.reader.buffer_position() as u64).saturating_sub(self.position_offset)
    }

    /// Recover the byte reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Parse to the end of input, delivering records to `processor`.
    ///
    /// On failure the partially built record is dropped and the processor's
    /// [`on_interrupted`](RecordProcessor::on_interrupted) decides whether
    /// the interruption propagates as [`DumpError::Interrupted`] or the run
    /// returns normally with [`ParseStats::interrupted`] set.
    pub fn run<P: RecordProcessor + ?Sized>(&mut self, processor: &mut P) -> DumpResult<ParseStats> {
        debug!(record_tag = %self.options.record_tag, "Starting record parse");
        let start = Instant::now();
        let outcome = self.drive(processor, start);
        self.stats.bytes = self.position();

        match outcome {
            Ok(()) => {
                debug!(
                    records = self.stats.records,
                    elements = self.stats.elements,
                    peak_resident = self.stats.peak_resident,
                    "Record parse finished"
                );
                Ok(self.stats.clone())
            }
            Err(cause) => {
                self.discard_open();
                let interruption = Interruption {
                    cause,
                    last_record_id: self.stats.last_record_id.clone(),
                    records: self.stats.records,
                };
                match processor.on_interrupted(interruption) {
                    Ok(()) => {
                        warn!(records = self.stats.records, "Interruption handled by processor");
                        self.stats.interrupted = true;
                        Ok(self.stats.clone())
                    }
                    Err(interruption) => Err(DumpError::Interrupted(interruption)),
                }
            }
        }
    }

    fn drive<P: RecordProcessor + ?Sized>(
        &mut self,
        processor: &mut P,
        start: Instant,
    ) -> Result<(), InterruptCause> {
        loop {
            self.check_limits(start)?;

            let keep_text = self.record_depth > 0;
            let step = read_step(&mut self.reader, &mut self.buf, keep_text)
                .map_err(|e| self.xml_cause(e))?;

            match step {
                Step::Open(element) => self.open(element)?,
                Step::Empty(element) => {
                    self.open(element)?;
                    self.close(None, processor)?;
                }
                Step::Close(name) => self.close(Some(&name), processor)?,
                Step::Text(text) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.element.push_text(text);
                    }
                }
                Step::Eof => return self.finish(),
                Step::Skip => {}
            }
        }
    }

    fn check_limits(&mut self, start: Instant) -> Result<(), InterruptCause> {
        let due = self.events % LIMIT_CHECK_INTERVAL == 0;
        self.events += 1;
        if !due {
            return Ok(());
        }

        if let Some(cancel) = &self.options.cancel {
            if cancel.is_cancelled() {
                return Err(InterruptCause::Cancelled);
            }
        }
        if let Some(limit) = self.options.timeout {
            let elapsed = start.elapsed();
            if elapsed >= limit {
                return Err(InterruptCause::Timeout { elapsed, limit });
            }
        }
        Ok(())
    }

    fn open(&mut self, element: Element) -> Result<(), InterruptCause> {
        if self.stack.is_empty() && self.root_closed {
            return Err(InterruptCause::malformed(
                self.position(),
                format!("unexpected element <{}> after the root element", element.name()),
            ));
        }
        if self.stack.len() >= self.options.max_depth {
            return Err(InterruptCause::DepthLimitExceeded {
                max: self.options.max_depth,
                position: self.position(),
            });
        }

        if element.name() == self.options.record_tag {
            self.record_depth += 1;
        }
        self.stats.elements += 1;
        self.resident += 1;
        self.stats.peak_resident = self.stats.peak_resident.max(self.resident);
        self.stack.push(Frame { element, nodes: 1 });
        Ok(())
    }

    fn close<P: RecordProcessor + ?Sized>(
        &mut self,
        name: Option<&str>,
        processor: &mut P,
    ) -> Result<(), InterruptCause> {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => {
                return Err(InterruptCause::malformed(
                    self.position(),
                    format!("unexpected closing tag </{}>", name.unwrap_or_default()),
                ))
            }
        };
        if let Some(name) = name {
            if name != frame.element.name() {
                let message = format!("expected </{}>, found </{}>", frame.element.name(), name);
                self.release(frame);
                return Err(InterruptCause::malformed(self.position(), message));
            }
        }
        if self.stack.is_empty() {
            self.root_closed = true;
        }

        if frame.element.name() == self.options.record_tag {
            self.record_depth -= 1;
            if let Err(e) = processor.process(&frame.element) {
                self.release(frame);
                return Err(InterruptCause::Processor(e));
            }
            self.stats.records += 1;
            self.stats.last_record_id = frame.element.id().map(str::to_owned);
            trace!(id = frame.element.id().unwrap_or(""), "Record delivered");

            let interval = self.options.progress_interval;
            if interval > 0 && self.stats.records % interval == 0 {
                processor.on_progress(self.stats.records);
            }
        }

        if self.record_depth == 0 {
            self.release(frame);
        } else if let Some(parent) = self.stack.last_mut() {
            parent.nodes += frame.nodes;
            parent.element.push_element(frame.element);
        }
        Ok(())
    }

    fn release(&mut self, frame: Frame) {
        self.resident -= frame.nodes;
        self.stats.pruned += frame.nodes as u64;
    }

    fn finish(&mut self) -> Result<(), InterruptCause> {
        match self.stack.last() {
            None => Ok(()),
            Some(frame) => Err(InterruptCause::malformed(
                self.position(),
                format!(
                    "unexpected end of input inside <{}> ({} unclosed elements)",
                    frame.element.name(),
                    self.stack.len()
                ),
            )),
        }
    }

    fn discard_open(&mut self) {
        while let Some(frame) = self.stack.pop() {
            self.release(frame);
        }
        self.record_depth = 0;
    }

    fn xml_cause(&self, err: quick_xml::Error) -> InterruptCause {
        match err {
            quick_xml::Error::Io(io) => InterruptCause::Io(io),
            other => InterruptCause::malformed(self.position(), describe_xml_error(&other)),
        }
    }
}

/// Message for a quick-xml error without the tag-relative offsets some
/// variants carry, so the only position reported is the dump offset.
fn describe_xml_error(err: &quick_xml::Error) -> String {
    match err {
        quick_xml::Error::InvalidAttr(attr) => {
            let reason = match attr {
                AttrError::ExpectedEq(_) => {
                    "attribute key must be directly followed by `=` or space".to_string()
                }
                AttrError::ExpectedValue(_) => "`=` must be followed by a value".to_string(),
                AttrError::UnquotedValue(_) => {
                    "attribute value must be enclosed in `\"` or `'`".to_string()
                }
                AttrError::ExpectedQuote(_, quote) => {
                    format!("missing closing quote `{}` in attribute value", *quote as char)
                }
                AttrError::Duplicated(_, _) => "duplicated attribute".to_string(),
            };
            format!("error while parsing attribute: {}", reason)
        }
        quick_xml::Error::EscapeError(escape) => match escape {
            EscapeError::EntityWithNull(_) => "null character entity not allowed".to_string(),
            EscapeError::UnrecognizedSymbol(_, symbol) => {
                format!("unrecognized entity `&{};`", symbol)
            }
            EscapeError::UnterminatedEntity(_) => "cannot find `;` after `&`".to_string(),
            other => other.to_string(),
        },
        other => other.to_string(),
    }
}

fn read_step<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    keep_text: bool,
) -> quick_xml::Result<Step> {
    buf.clear();
    let step = match reader.read_event_into(buf)? {
        Event::Start(e) => Step::Open(element_from_start(&e)?),
        Event::Empty(e) => Step::Empty(element_from_start(&e)?),
        Event::End(e) => Step::Close(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
        Event::Text(e) if keep_text => Step::Text(e.unescape()?.into_owned()),
        Event::CData(e) if keep_text => {
            Step::Text(String::from_utf8_lossy(&e.into_inner()).into_owned())
        }
        Event::Eof => Step::Eof,
        _ => Step::Skip,
    };
    Ok(step)
}

fn element_from_start(start: &BytesStart) -> quick_xml::Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.set_attr(key, value);
    }
    Ok(element)
}
