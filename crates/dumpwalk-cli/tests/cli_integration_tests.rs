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

//! CLI integration tests

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

// Test helper to create a dumpwalk command
fn dumpwalk_cmd() -> Command {
    let mut cmd = Command::cargo_bin("dumpwalk").expect("Failed to find dumpwalk binary");
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

// Test helper to create a temporary file with content
fn create_temp_file(content: &[u8], suffix: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    fs::write(file.path(), content).expect("Failed to write temp file");
    file
}

fn releases(count: usize) -> String {
    (1..=count)
        .map(|i| format!(r#"<release id="{i}"><title>Title {i}</title></release>"#))
        .collect::<Vec<_>>()
        .join("\n")
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

// ===== Help and Usage Tests =====

#[test]
fn test_help_output() {
    dumpwalk_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("streaming reader for large XML data dumps"))
        .stdout(predicate::str::contains("count"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn test_missing_file_argument() {
    dumpwalk_cmd()
        .arg("count")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("FILE"));
}

#[test]
fn test_no_subcommand_fails() {
    dumpwalk_cmd().assert().failure();
}

// ===== Count Command Tests =====

#[test]
fn test_count_plain_file() {
    let file = create_temp_file(releases(25).as_bytes(), ".xml");

    dumpwalk_cmd()
        .arg("count")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:"))
        .stdout(predicate::str::contains("25"))
        .stdout(predicate::str::contains("(total time: "));
}

#[test]
fn test_count_gzip_file() {
    let file = create_temp_file(&gzip(releases(40).as_bytes()), ".xml.gz");

    dumpwalk_cmd()
        .arg("count")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("40"));
}

#[test]
fn test_count_progress_dots() {
    let file = create_temp_file(releases(10).as_bytes(), ".xml");

    dumpwalk_cmd()
        .args(["count", "--interval", "3"])
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("..."))
        .stderr(predicate::str::contains("....").not());
}

#[test]
fn test_count_custom_tag() {
    let content = r#"<labels><label id="1"/><label id="2"/><release id="3"/></labels>"#;
    let file = create_temp_file(content.as_bytes(), ".xml");

    dumpwalk_cmd()
        .args(["count", "--tag", "label"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Last id: 2"));
}

// ===== Failure Tests =====

#[test]
fn test_unknown_extension() {
    let file = create_temp_file(releases(1).as_bytes(), ".json");

    dumpwalk_cmd()
        .arg("count")
        .arg(file.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown extension"));
}

#[test]
fn test_nonexistent_file() {
    dumpwalk_cmd()
        .args(["count", "/nonexistent/path/dump.xml"])
        .assert()
        .failure()
        .code(74);
}

#[test]
fn test_truncated_dump_reports_last_record() {
    let content = format!("{}\n<release id=\"6\"><title>Cut", releases(5));
    let file = create_temp_file(content.as_bytes(), ".xml");

    dumpwalk_cmd()
        .arg("count")
        .arg(file.path())
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains(
            "Interrupted. Last record parsed: 5 (5 records)",
        ));
}

#[test]
fn test_unwrapped_fragment_fails() {
    let file = create_temp_file(releases(3).as_bytes(), ".xml");

    dumpwalk_cmd()
        .args(["count", "--no-wrap"])
        .arg(file.path())
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains("Last record parsed: 1"));
}

#[test]
fn test_invalid_buffer_size() {
    let file = create_temp_file(releases(1).as_bytes(), ".xml");

    dumpwalk_cmd()
        .args(["scan", "--buffer-size", "0"])
        .arg(file.path())
        .assert()
        .failure()
        .code(2);
}

// ===== Extract Command Tests =====

#[test]
fn test_extract_to_stdout() {
    let file = create_temp_file(releases(3).as_bytes(), ".xml");

    dumpwalk_cmd()
        .arg("extract")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<release id="2"><title>Title 2</title></release>"#,
        ))
        .stderr(predicate::str::contains("Wrote 3 of 3 records"));
}

#[test]
fn test_extract_sample_to_file() {
    let file = create_temp_file(releases(10).as_bytes(), ".xml");
    let out = NamedTempFile::new().unwrap();

    dumpwalk_cmd()
        .args(["extract", "--sample", "4", "--output"])
        .arg(out.path())
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 3 of 10 records"));

    let written = fs::read_to_string(out.path()).unwrap();
    let ids: Vec<&str> = written
        .lines()
        .filter_map(|l| l.split('"').nth(1))
        .collect();
    assert_eq!(ids, vec!["1", "5", "9"]);
}

#[test]
fn test_extract_zero_sample_rejected() {
    let file = create_temp_file(releases(1).as_bytes(), ".xml");

    dumpwalk_cmd()
        .args(["extract", "--sample", "0"])
        .arg(file.path())
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_extract_keeps_output_on_interruption() {
    let content = format!("{}\n<release id=\"3\">", releases(2));
    let file = create_temp_file(content.as_bytes(), ".xml");
    let out = NamedTempFile::new().unwrap();

    dumpwalk_cmd()
        .args(["extract", "-o"])
        .arg(out.path())
        .arg(file.path())
        .assert()
        .failure()
        .code(65);

    let written = fs::read_to_string(out.path()).unwrap();
    assert_eq!(written.lines().count(), 2);
}

// ===== Scan Command Tests =====

#[test]
fn test_scan_reports_counters() {
    let file = create_temp_file(releases(8).as_bytes(), ".xml");

    dumpwalk_cmd()
        .arg("scan")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:       8"))
        .stdout(predicate::str::contains("Elements:      17"))
        .stdout(predicate::str::contains("(total time: "));
}

#[test]
fn test_scan_format_override() {
    let file = create_temp_file(&gzip(releases(4).as_bytes()), ".bin");

    dumpwalk_cmd()
        .args(["scan", "--format", "gzip"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:       4"));
}
