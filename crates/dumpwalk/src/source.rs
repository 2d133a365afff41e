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

//! Byte sources for dump files.
//!
//! A dump is either plain XML or gzip-compressed XML. The format is chosen
//! from the file extension (or forced by the caller) before anything is read,
//! and a [`DumpSource`] then yields decompressed bytes on demand.

use crate::error::{DumpError, DumpResult};
use flate2::read::MultiGzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Encoding of a dump file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpFormat {
    /// Uncompressed XML (`.xml`)
    Xml,
    /// Gzip-compressed XML (`.xml.gz`)
    GzipXml,
}

impl DumpFormat {
    /// Infer the format from a file name.
    ///
    /// The comparison ignores ASCII case. Any extension other than `.xml` or
    /// `.xml.gz` is a configuration error.
    ///
    /// ```rust
    /// use dumpwalk::DumpFormat;
    ///
    /// assert_eq!(DumpFormat::from_path("releases.xml").unwrap(), DumpFormat::Xml);
    /// assert_eq!(DumpFormat::from_path("releases.XML.GZ").unwrap(), DumpFormat::GzipXml);
    /// assert!(DumpFormat::from_path("releases.json").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> DumpResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".xml.gz") {
            Ok(DumpFormat::GzipXml)
        } else if name.ends_with(".xml") {
            Ok(DumpFormat::Xml)
        } else {
            Err(DumpError::UnknownFormat {
                path: path.to_path_buf(),
            })
        }
    }

    /// Whether bytes must be decompressed before parsing.
    #[inline]
    pub fn is_compressed(self) -> bool {
        matches!(self, DumpFormat::GzipXml)
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpFormat::Xml => write!(f, "xml"),
            DumpFormat::GzipXml => write!(f, "xml.gz"),
        }
    }
}

/// A readable stream of (decompressed) dump bytes.
///
/// Read sequentially, never rewound.
pub enum DumpSource {
    /// Plain file
    File(File),
    /// Gzip-compressed file, decompressed while reading
    GzipFile(MultiGzDecoder<BufReader<File>>),
    /// Caller-supplied stream
    Reader(Box<dyn Read + Send>),
}

impl DumpSource {
    /// Open the dump at `path` using the given format.
    pub fn open(path: impl AsRef<Path>, format: DumpFormat) -> DumpResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DumpError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(match format {
            DumpFormat::Xml => DumpSource::File(file),
            DumpFormat::GzipXml => DumpSource::GzipFile(MultiGzDecoder::new(BufReader::new(file))),
        })
    }

    /// Open the dump at `path`, inferring the format from its extension.
    pub fn open_path(path: impl AsRef<Path>) -> DumpResult<Self> {
        let format = DumpFormat::from_path(path.as_ref())?;
        Self::open(path, format)
    }

    /// Wrap an arbitrary stream, decompressing it if `format` says so.
    pub fn from_reader<R: Read + Send + 'static>(reader: R, format: DumpFormat) -> Self {
        match format {
            DumpFormat::Xml => DumpSource::Reader(Box::new(reader)),
            DumpFormat::GzipXml => {
                DumpSource::Reader(Box::new(MultiGzDecoder::new(BufReader::new(reader))))
            }
        }
    }
}

impl Read for DumpSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DumpSource::File(file) => file.read(buf),
            DumpSource::GzipFile(decoder) => decoder.read(buf),
            DumpSource::Reader(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for DumpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpSource::File(_) => f.write_str("DumpSource::File"),
            DumpSource::GzipFile(_) => f.write_str("DumpSource::GzipFile"),
            DumpSource::Reader(_) => f.write_str("DumpSource::Reader"),
        }
    }
}
