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

use super::run_dump;
use crate::cli::DumpArgs;
use crate::console::total_time_line;
use crate::error::CliError;
use colored::Colorize;
use dumpwalk::NullProcessor;

/// Parse a dump without doing anything with its records.
///
/// # Errors
///
/// Returns `Err` if the dump cannot be read to the end.
pub fn scan(args: &DumpArgs) -> Result<(), CliError> {
    let (report, _) = run_dump(args, NullProcessor)?;
    let stats = &report.stats;
    let secs = report.elapsed.as_secs_f64();
    let mb_per_sec = if secs > 0.0 {
        stats.bytes as f64 / (1024.0 * 1024.0) / secs
    } else {
        0.0
    };

    println!("{}", "Scan complete".bright_blue().bold());
    println!("  Records:       {}", stats.records);
    println!("  Elements:      {}", stats.elements);
    println!("  Peak resident: {}", stats.peak_resident);
    println!("  Bytes:         {}", stats.bytes);
    println!(
        "  Throughput:    {:.0} records/s, {:.1} MB/s",
        report.records_per_second(),
        mb_per_sec
    );
    println!("{}", total_time_line(&report));
    Ok(())
}
