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

//! Record passthrough serialization.

use super::run_dump;
use crate::cli::DumpArgs;
use crate::console::total_time_line;
use crate::error::CliError;
use dumpwalk::{SamplingProcessor, SerializingProcessor};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const PRETTY_INDENT: usize = 2;

/// Serialize records from a dump to `output` or stdout.
///
/// # Errors
///
/// Returns `Err` if `sample` is zero, the output cannot be created, or the
/// dump cannot be read to the end.
pub fn extract(
    args: &DumpArgs,
    output: Option<&Path>,
    pretty: bool,
    sample: Option<u64>,
) -> Result<(), CliError> {
    if sample == Some(0) {
        return Err(CliError::InvalidInput(
            "--sample must be at least 1".to_string(),
        ));
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::io_error(path, e))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let serializer = if pretty {
        SerializingProcessor::pretty(writer, PRETTY_INDENT)
    } else {
        SerializingProcessor::new(writer)
    };

    let (report, serializer) = match sample {
        Some(every) => {
            let (report, sampler) = run_dump(args, SamplingProcessor::new(serializer, every))?;
            (report, sampler.into_inner())
        }
        None => run_dump(args, serializer)?,
    };

    let written = finish(serializer, output)?;
    eprintln!("Wrote {} of {} records", written, report.stats.records);
    eprintln!("{}", total_time_line(&report));
    Ok(())
}

fn finish<W: Write>(
    mut serializer: SerializingProcessor<W>,
    output: Option<&Path>,
) -> Result<u64, CliError> {
    let path = output.unwrap_or_else(|| Path::new("<stdout>"));
    serializer
        .flush()
        .map_err(|e| CliError::io_error(path, e))?;
    Ok(serializer.written())
}
