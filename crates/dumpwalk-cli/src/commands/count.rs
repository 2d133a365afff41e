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

//! `dumpwalk count`

use super::run_dump;
use crate::cli::DumpArgs;
use crate::console::total_time_line;
use crate::error::CliError;
use colored::Colorize;
use dumpwalk::CountingProcessor;

/// Count the records in a dump.
///
/// # Errors
///
/// Returns `Err` if the dump cannot be read to the end.
pub fn count(args: &DumpArgs) -> Result<(), CliError> {
    let (report, counter) = run_dump(args, CountingProcessor::new())?;

    println!("{} {}", "Records:".green().bold(), counter.records());
    if let Some(id) = counter.last_id() {
        println!("{} {}", "Last id:".bold(), id);
    }
    if report.stats.interrupted {
        println!("{}", "Run stopped early".yellow());
    }
    println!("{}", total_time_line(&report));
    Ok(())
}
