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

//! Command-line argument definitions.

use crate::commands;
use crate::error::CliError;
use clap::{Args, Subcommand, ValueEnum};
use dumpwalk::config::{DEFAULT_BUFFER_SIZE, DEFAULT_PROGRESS_INTERVAL};
use dumpwalk::{DumpConfig, DumpFormat};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Subcommand)]
pub enum Commands {
    /// Count the records in a dump
    ///
    /// Streams the whole dump, printing a dot every INTERVAL records, and
    /// reports the record count and elapsed time.
    Count {
        #[command(flatten)]
        dump: DumpArgs,
    },

    /// Write records back out as XML
    ///
    /// Serializes each completed record, one per line unless --pretty is
    /// given. With --sample N only every Nth record is written.
    Extract {
        #[command(flatten)]
        dump: DumpArgs,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent nested elements
        #[arg(long)]
        pretty: bool,

        /// Write only every Nth record
        #[arg(long, value_name = "N")]
        sample: Option<u64>,
    },

    /// Parse a dump without handling records
    ///
    /// Measures raw parse throughput and reports element and memory
    /// counters.
    Scan {
        #[command(flatten)]
        dump: DumpArgs,
    },
}

impl Commands {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the dump cannot be opened, parsing is interrupted,
    /// or output cannot be written.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Count { dump } => commands::count(&dump),
            Commands::Extract {
                dump,
                output,
                pretty,
                sample,
            } => commands::extract(&dump, output.as_deref(), pretty, sample),
            Commands::Scan { dump } => commands::scan(&dump),
        }
    }
}

/// Input format override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Plain XML
    Xml,
    /// Gzip-compressed XML
    Gzip,
}

impl From<FormatArg> for DumpFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => DumpFormat::Xml,
            FormatArg::Gzip => DumpFormat::GzipXml,
        }
    }
}

/// Arguments shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Dump file (.xml or .xml.gz)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Element name that denotes a record
    #[arg(short = 't', long = "tag", value_name = "NAME")]
    pub record_tag: Option<String>,

    /// Records between progress dots (0 disables)
    #[arg(short, long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub interval: u64,

    /// Input format, overriding the file extension
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Do not wrap the input in a synthetic root element
    #[arg(long)]
    pub no_wrap: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Read buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,
}

impl DumpArgs {
    /// Build the reader configuration.
    pub fn config(&self) -> DumpConfig {
        let mut config = DumpConfig::new(&self.file)
            .with_progress_interval(self.interval)
            .with_wrap_fragment(!self.no_wrap)
            .with_buffer_size(self.buffer_size);
        if let Some(tag) = &self.record_tag {
            config = config.with_record_tag(tag.clone());
        }
        if let Some(format) = self.format {
            config = config.with_format(format.into());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}
