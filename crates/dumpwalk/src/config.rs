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

//! Run configuration.
//!
//! A [`DumpConfig`] describes one parse run: where the dump lives, which
//! element is the record, how often progress is signalled and which limits
//! apply. It is passed to the [`DumpReader`](crate::DumpReader) at
//! construction; nothing is read from global state.
//!
//! # Examples
//!
//! ```rust
//! use dumpwalk::DumpConfig;
//! use std::time::Duration;
//!
//! let config = DumpConfig::new("discogs_20170601_artists.xml.gz")
//!     .with_record_tag("artist")
//!     .with_progress_interval(5_000)
//!     .with_timeout(Duration::from_secs(3600));
//!
//! assert_eq!(config.record_tag.as_deref(), Some("artist"));
//! assert!(config.validate().is_ok());
//! ```

use crate::envelope::{is_valid_tag_name, DEFAULT_ENVELOPE_TAG};
use crate::error::{DumpError, DumpResult};
use crate::source::DumpFormat;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Record tag used when neither the configuration nor the processor names one.
pub const DEFAULT_RECORD_TAG: &str = "release";

/// Records between two progress signals.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Read buffer placed between the byte source and the XML reader.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Maximum element nesting depth, envelope included.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Configuration for one dump parse run.
#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Location of the dump file.
    ///
    /// The extension selects the byte source unless [`format`](Self::format)
    /// is set: `.xml` is read as-is, `.xml.gz` is decompressed on the fly.
    pub input_path: PathBuf,

    /// Element name that denotes a record.
    ///
    /// `None` or an empty string defers to the processor's declared tag and
    /// then to [`DEFAULT_RECORD_TAG`].
    pub record_tag: Option<String>,

    /// Number of records between calls to
    /// [`RecordProcessor::on_progress`](crate::RecordProcessor::on_progress).
    ///
    /// `0` disables progress signalling.
    ///
    /// Default: 1000
    pub progress_interval: u64,

    /// Explicit input format, overriding the extension.
    pub format: Option<DumpFormat>,

    /// Wrap the input in a synthetic envelope element.
    ///
    /// Required for dumps that are a bare sequence of sibling elements.
    /// Harmless for well-formed documents.
    ///
    /// Default: true
    pub wrap_fragment: bool,

    /// Name of the synthetic envelope element.
    pub envelope_tag: String,

    /// Size of the read buffer in bytes.
    ///
    /// Default: 64KB
    pub buffer_size: usize,

    /// Maximum nesting depth before the input is rejected.
    ///
    /// Default: 1024
    pub max_depth: usize,

    /// Wall-clock limit for the parse.
    ///
    /// Checked periodically, so a run may slightly overshoot it.
    ///
    /// Default: None
    pub timeout: Option<Duration>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            record_tag: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            format: None,
            wrap_fragment: true,
            envelope_tag: DEFAULT_ENVELOPE_TAG.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: None,
        }
    }
}

impl DumpConfig {
    /// Create a configuration for the dump at `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: path.into(),
            ..Self::default()
        }
    }

    /// Set the record tag.
    pub fn with_record_tag(mut self, tag: impl Into<String>) -> Self {
        self.record_tag = Some(tag.into());
        self
    }

    /// Set the progress interval.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Force the input format instead of inferring it from the extension.
    pub fn with_format(mut self, format: DumpFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enable or disable the synthetic envelope.
    pub fn with_wrap_fragment(mut self, wrap: bool) -> Self {
        self.wrap_fragment = wrap;
        self
    }

    /// Set the read buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set a wall-clock limit for the parse.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the configuration before any input is opened.
    pub fn validate(&self) -> DumpResult<()> {
        if self.buffer_size == 0 {
            return Err(DumpError::InvalidConfig(
                "buffer size must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(DumpError::InvalidConfig(
                "maximum depth must be positive".to_string(),
            ));
        }
        if self.wrap_fragment && !is_valid_tag_name(&self.envelope_tag) {
            return Err(DumpError::InvalidConfig(format!(
                "'{}' is not a valid envelope tag name",
                self.envelope_tag
            )));
        }
        if let Some(tag) = self.record_tag.as_deref() {
            if !tag.is_empty() && !is_valid_tag_name(tag) {
                return Err(DumpError::InvalidConfig(format!(
                    "'{}' is not a valid record tag name",
                    tag
                )));
            }
        }
        Ok(())
    }

    /// Build the parse-loop options for a processor that declares `declared`.
    pub fn parse_options(&self, declared: Option<&str>) -> ParseOptions {
        ParseOptions {
            record_tag: resolve_record_tag(self.record_tag.as_deref(), declared),
            progress_interval: self.progress_interval,
            max_depth: self.max_depth,
            timeout: self.timeout,
            cancel: None,
        }
    }
}

/// Pick the record tag for a run.
///
/// A non-empty configured tag wins, then a non-empty tag declared by the
/// processor, then [`DEFAULT_RECORD_TAG`].
///
/// ```rust
/// use dumpwalk::config::{resolve_record_tag, DEFAULT_RECORD_TAG};
///
/// assert_eq!(resolve_record_tag(Some("master"), Some("label")), "master");
/// assert_eq!(resolve_record_tag(Some(""), Some("label")), "label");
/// assert_eq!(resolve_record_tag(None, None), DEFAULT_RECORD_TAG);
/// ```
pub fn resolve_record_tag(configured: Option<&str>, declared: Option<&str>) -> String {
    configured
        .filter(|tag| !tag.is_empty())
        .or_else(|| declared.filter(|tag| !tag.is_empty()))
        .unwrap_or(DEFAULT_RECORD_TAG)
        .to_string()
}

/// Options read once by the pull-parse loop when it starts.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Element name that denotes a record
    pub record_tag: String,
    /// Records between progress signals (0 disables)
    pub progress_interval: u64,
    /// Maximum nesting depth
    pub max_depth: usize,
    /// Wall-clock limit
    pub timeout: Option<Duration>,
    /// External cancellation
    pub cancel: Option<CancelFlag>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: None,
            cancel: None,
        }
    }
}

impl ParseOptions {
    /// Options with the given record tag and default limits.
    pub fn for_tag(tag: impl Into<String>) -> Self {
        Self {
            record_tag: tag.into(),
            ..Self::default()
        }
    }
}

/// Shared flag used to stop a running parse from another thread.
///
/// The parse loop polls the flag periodically and stops with
/// [`InterruptCause::Cancelled`](crate::InterruptCause::Cancelled).
///
/// ```rust
/// use dumpwalk::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
/// assert!(!flag.is_cancelled());
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== DumpConfig tests ====================

    #[test]
    fn test_config_defaults() {
        let config = DumpConfig::default();
        assert_eq!(config.record_tag, None);
        assert_eq!(config.progress_interval, 1000);
        assert_eq!(config.buffer_size, 64 * 1024);
        assert_eq!(config.max_depth, 1024);
        assert!(config.wrap_fragment);
        assert_eq!(config.envelope_tag, DEFAULT_ENVELOPE_TAG);
        assert_eq!(config.timeout, None);
        assert_eq!(config.format, None);
    }

    #[test]
    fn test_config_builder() {
        let config = DumpConfig::new("labels.xml")
            .with_record_tag("label")
            .with_progress_interval(10)
            .with_format(DumpFormat::Xml)
            .with_wrap_fragment(false)
            .with_buffer_size(4096)
            .with_max_depth(32)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.input_path, PathBuf::from("labels.xml"));
        assert_eq!(config.record_tag.as_deref(), Some("label"));
        assert_eq!(config.progress_interval, 10);
        assert_eq!(config.format, Some(DumpFormat::Xml));
        assert!(!config.wrap_fragment);
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let config = DumpConfig::new("a.xml").with_buffer_size(0);
        assert!(matches!(config.validate(), Err(DumpError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = DumpConfig::new("a.xml").with_max_depth(0);
        assert!(matches!(config.validate(), Err(DumpError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_envelope_tag() {
        let config = DumpConfig {
            envelope_tag: "not a tag".to_string(),
            ..DumpConfig::new("a.xml")
        };
        assert!(config.validate().is_err());

        // Unused when wrapping is off
        let config = config.with_wrap_fragment(false);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_record_tag() {
        let config = DumpConfig::new("a.xml").with_record_tag("<release>");
        assert!(config.validate().is_err());

        let config = DumpConfig::new("a.xml").with_record_tag("");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_options_from_config() {
        let config = DumpConfig::new("a.xml")
            .with_progress_interval(3)
            .with_max_depth(9);
        let options = config.parse_options(Some("master"));
        assert_eq!(options.record_tag, "master");
        assert_eq!(options.progress_interval, 3);
        assert_eq!(options.max_depth, 9);
        assert!(options.cancel.is_none());
    }

    // ==================== Record tag resolution tests ====================

    #[test]
    fn test_resolve_prefers_configured() {
        assert_eq!(resolve_record_tag(Some("artist"), Some("label")), "artist");
    }

    #[test]
    fn test_resolve_empty_configured_falls_through() {
        assert_eq!(resolve_record_tag(Some(""), Some("label")), "label");
        assert_eq!(resolve_record_tag(Some(""), Some("")), DEFAULT_RECORD_TAG);
    }

    #[test]
    fn test_resolve_default() {
        assert_eq!(resolve_record_tag(None, None), "release");
    }

    // ==================== CancelFlag tests ====================

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        other.cancel();
        assert!(flag.is_cancelled());
    }
}
