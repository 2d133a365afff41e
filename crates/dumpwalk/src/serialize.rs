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

//! Serialization of completed records.
//!
//! Records are written back out through quick-xml's writer, which takes care
//! of escaping attribute values and text. Only single elements are written;
//! writing whole dumps is out of scope.

use crate::element::{Element, Node};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};

/// Write `element` and its subtree.
///
/// Childless elements are written in self-closing form.
pub fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children().is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))
}

/// Serialize `element` to a string, optionally indented by `indent` spaces.
///
/// ```rust
/// use dumpwalk::{serialize::to_xml_string, Element};
///
/// let record = Element::new("release")
///     .with_attr("id", "1")
///     .with_child(Element::new("title").with_text("Rock & Roll"));
/// assert_eq!(
///     to_xml_string(&record, None).unwrap(),
///     r#"<release id="1"><title>Rock &amp; Roll</title></release>"#
/// );
/// ```
pub fn to_xml_string(element: &Element, indent: Option<usize>) -> quick_xml::Result<String> {
    let mut writer = match indent {
        Some(width) => Writer::new_with_indent(Cursor::new(Vec::new()), b' ', width),
        None => Writer::new(Cursor::new(Vec::new())),
    };
    write_element(&mut writer, element)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
