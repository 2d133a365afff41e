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

//! Synthetic envelope around a dump fragment.
//!
//! Many dumps are not single XML documents but a bare sequence of sibling
//! elements. [`EnvelopeReader`] presents such a stream to the XML reader as
//! the content of one synthetic root element by reading, in order, an opening
//! tag, the underlying stream and a closing tag.
//!
//! # Read convention
//!
//! A single `read` call moves across segment boundaries until the caller's
//! buffer is full, so the end of the opening tag or of the underlying stream
//! never shows up as a short read. The one exception is a short read from the
//! underlying stream itself, which is returned as-is instead of blocking for
//! more data. `Ok(0)` is returned only once all three segments are
//! exhausted.
//!
//! # Examples
//!
//! ```rust
//! use dumpwalk::EnvelopeReader;
//! use std::io::{Cursor, Read};
//!
//! let mut reader = EnvelopeReader::with_tag(Cursor::new("<a/><a/>"), "dummy").unwrap();
//! let mut wrapped = String::new();
//! reader.read_to_string(&mut wrapped).unwrap();
//! assert_eq!(wrapped, "<dummy><a/><a/></dummy>");
//! ```

use crate::error::{DumpError, DumpResult};
use std::io::{self, Read};

/// Envelope element name used when none is configured.
pub const DEFAULT_ENVELOPE_TAG: &str = "dumpwalk-envelope";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Open,
    Body,
    Close,
    Done,
    Closed,
}

/// Reader that surrounds a byte stream with a synthetic element.
#[derive(Debug)]
pub struct EnvelopeReader<R> {
    inner: Option<R>,
    open_tag: Vec<u8>,
    close_tag: Vec<u8>,
    segment: Segment,
    offset: usize,
    body_bytes: u64,
}

impl<R: Read> EnvelopeReader<R> {
    /// Wrap `inner` in the default envelope element.
    pub fn new(inner: R) -> Self {
        Self::build(
            inner,
            format!("<{}>", DEFAULT_ENVELOPE_TAG).into_bytes(),
            format!("</{}>", DEFAULT_ENVELOPE_TAG).into_bytes(),
        )
    }

    /// Wrap `inner` in an envelope element named `tag`.
    ///
    /// The tag must be a valid XML name and should not occur in the dump.
    pub fn with_tag(inner: R, tag: &str) -> DumpResult<Self> {
        if !is_valid_tag_name(tag) {
            return Err(DumpError::InvalidConfig(format!(
                "'{}' is not a valid envelope tag name",
                tag
            )));
        }
        Ok(Self::build(
            inner,
            format!("<{}>", tag).into_bytes(),
            format!("</{}>", tag).into_bytes(),
        ))
    }

    /// Pass `inner` through without an envelope.
    ///
    /// Used for inputs that are already well-formed documents, so the rest of
    /// the pipeline deals with a single reader type.
    pub fn unwrapped(inner: R) -> Self {
        Self::build(inner, Vec::new(), Vec::new())
    }

    fn build(inner: R, open_tag: Vec<u8>, close_tag: Vec<u8>) -> Self {
        Self {
            inner: Some(inner),
            open_tag,
            close_tag,
            segment: Segment::Open,
            offset: 0,
            body_bytes: 0,
        }
    }

    /// Length in bytes of the synthetic opening tag.
    #[inline]
    pub fn prefix_len(&self) -> usize {
        self.open_tag.len()
    }

    /// Length in bytes of the synthetic closing tag.
    #[inline]
    pub fn suffix_len(&self) -> usize {
        self.close_tag.len()
    }

    /// Bytes read so far from the underlying stream.
    #[inline]
    pub fn body_bytes(&self) -> u64 {
        self.body_bytes
    }

    /// Whether every segment has been read.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.segment == Segment::Done
    }

    /// Release the underlying stream.
    ///
    /// Further reads fail with an I/O error. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.inner = None;
        self.segment = Segment::Closed;
    }

    /// Recover the underlying stream, unless already closed.
    pub fn into_inner(self) -> Option<R> {
        self.inner
    }
}

impl<R: Read> Read for EnvelopeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.segment {
                Segment::Open => {
                    filled += copy_tag(&self.open_tag, &mut self.offset, &mut buf[filled..]);
                    if self.offset == self.open_tag.len() {
                        self.segment = Segment::Body;
                        self.offset = 0;
                    }
                }
                Segment::Body => {
                    let inner = self.inner.as_mut().ok_or_else(closed_error)?;
                    match inner.read(&mut buf[filled..]) {
                        Ok(0) => self.segment = Segment::Close,
                        Ok(n) => {
                            self.body_bytes += n as u64;
                            return Ok(filled + n);
                        }
                        // Bytes from the opening tag are already in `buf`
                        Err(e) if e.kind() == io::ErrorKind::Interrupted && filled > 0 => {
                            return Ok(filled)
                        }
                        Err(e) => return Err(e),
                    }
                }
                Segment::Close => {
                    filled += copy_tag(&self.close_tag, &mut self.offset, &mut buf[filled..]);
                    if self.offset == self.close_tag.len() {
                        self.segment = Segment::Done;
                        self.offset = 0;
                    }
                }
                Segment::Done => break,
                Segment::Closed => return Err(closed_error()),
            }
        }

        Ok(filled)
    }
}

fn copy_tag(tag: &[u8], offset: &mut usize, out: &mut [u8]) -> usize {
    let remaining = &tag[*offset..];
    let n = remaining.len().min(out.len());
    out[..n].copy_from_slice(&remaining[..n]);
    *offset += n;
    n
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "envelope reader is closed")
}

/// Whether `name` can be used as an element name.
///
/// Accepts the XML name subset that dumps use in practice: a letter or `_`
/// followed by letters, digits, `_`, `-`, `.` or `:`. Non-ASCII letters are
/// accepted.
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}
