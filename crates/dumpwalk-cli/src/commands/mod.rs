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

//! Subcommand implementations.

mod count;
mod extract;
mod scan;

pub use count::count;
pub use extract::extract;
pub use scan::scan;

use crate::cli::DumpArgs;
use crate::console::ConsoleProcessor;
use crate::error::CliError;
use dumpwalk::{DumpReader, RecordProcessor, RunReport};
use tracing::info;

/// Run the dump named by `args` through `processor` with console feedback.
///
/// Returns the processor so callers can read its results.
pub(crate) fn run_dump<P: RecordProcessor>(
    args: &DumpArgs,
    processor: P,
) -> Result<(RunReport, P), CliError> {
    let config = args.config();
    info!(file = %args.file.display(), "Processing dump");

    let mut console = ConsoleProcessor::new(processor).quiet(args.interval == 0);
    let result = DumpReader::new(config).run(&mut console);
    console.finish_line();

    let report = result?;
    Ok((report, console.into_inner()))
}
