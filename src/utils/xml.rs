//! XML fragment to JSON conversion.
//!
//! Document summaries embed whole XML documents as string field values
//! (e.g. sra's `expxml`/`runs`, assembly's `meta`). This converter turns
//! such a fragment into structured JSON: attributes become object keys,
//! repeated sibling elements fold into arrays, and text-only elements
//! collapse to plain strings. Mixed elements keep their text under `"$"`.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::entrez::EntrezError;

/// Parse an XML fragment (one or more sibling elements, no declaration
/// required) into a JSON object keyed by the top-level element names.
pub fn xml_fragment_to_json(xml: &str) -> Result<Value, EntrezError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Stack of open elements: (name, attributes-and-children, text).
    let mut stack: Vec<(String, Map<String, Value>, String)> = Vec::new();
    let mut root = Map::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut map = Map::new();
                for attr in start.attributes() {
                    let attr = attr.map_err(|e| EntrezError::Parse(format!("XML: {}", e)))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| EntrezError::Parse(format!("XML: {}", e)))?;
                    map.insert(key, Value::String(value.into_owned()));
                }
                stack.push((name, map, String::new()));
            }
            Ok(Event::Empty(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut map = Map::new();
                for attr in start.attributes() {
                    let attr = attr.map_err(|e| EntrezError::Parse(format!("XML: {}", e)))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| EntrezError::Parse(format!("XML: {}", e)))?;
                    map.insert(key, Value::String(value.into_owned()));
                }
                let parent = stack.last_mut().map(|frame| &mut frame.1).unwrap_or(&mut root);
                insert_child(parent, name, Value::Object(map));
            }
            Ok(Event::Text(text)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.2.push_str(
                        &text
                            .unescape()
                            .map_err(|e| EntrezError::Parse(format!("XML: {}", e)))?,
                    );
                }
            }
            Ok(Event::End(_)) => {
                let (name, mut map, text) = stack
                    .pop()
                    .ok_or_else(|| EntrezError::Parse("XML: unbalanced end tag".to_string()))?;
                let value = if map.is_empty() && !text.is_empty() {
                    Value::String(text)
                } else {
                    if !text.is_empty() {
                        map.insert("$".to_string(), Value::String(text));
                    }
                    Value::Object(map)
                };
                let parent = stack.last_mut().map(|frame| &mut frame.1).unwrap_or(&mut root);
                insert_child(parent, name, value);
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, CDATA wrappers carry nothing we keep
            Ok(_) => {}
            Err(e) => return Err(EntrezError::Parse(format!("XML: {}", e))),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(EntrezError::Parse("XML: unclosed element".to_string()));
    }

    Ok(Value::Object(root))
}

/// Insert a child value, folding repeated names into an array.
fn insert_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        None => {
            parent.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}
