//! Lenient HTML-like parser producing a [`Document`].
//!
//! Template sources are not well-formed XML: they carry valueless attributes,
//! unclosed void elements and `<` inside `{ ... }` expressions. The parser
//! therefore never fails:
//!
//! - tag and attribute names are lowercased; attribute values are kept raw
//! - comments, doctypes and processing instructions are dropped
//! - a `<` that does not open a tag is literal text
//! - `script` and `style` bodies are raw text up to their closing tag
//! - an end tag closes the nearest open element with that name, and is
//!   ignored when no such element is open
//! - an unterminated tag is kept as text

use super::core::{is_void, Document, NodeId};

/// Elements whose body is not scanned for markup
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

struct StartTag {
    name: String,
    attrs: Vec<(String, Option<String>)>,
    self_closing: bool,
    end: usize,
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse a start tag beginning at `start` (which points at `<`)
fn parse_start_tag(src: &str, start: usize) -> Option<StartTag> {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && !is_name_end(bytes[i]) {
        i += 1;
    }
    let name = src[name_start..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;

    loop {
        i = skip_whitespace(bytes, i);
        match bytes.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing,
                    end: i + 1,
                })
            }
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => {}
        }
        self_closing = false;

        let attr_start = i;
        while i < bytes.len() && !is_name_end(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let attr_name = src[attr_start..i].to_ascii_lowercase();
        i = skip_whitespace(bytes, i);

        let value = if bytes.get(i) == Some(&b'=') {
            i = skip_whitespace(bytes, i + 1);
            match bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let value_start = i + 1;
                    let len = src[value_start..].find(char::from(*quote))?;
                    i = value_start + len + 1;
                    Some(src[value_start..value_start + len].to_string())
                }
                _ => {
                    // Unquoted values end at whitespace or `>` outside `{ ... }`
                    let value_start = i;
                    let mut depth = 0usize;
                    while let Some(&byte) = bytes.get(i) {
                        match byte {
                            b'{' => depth += 1,
                            b'}' => depth = depth.saturating_sub(1),
                            b if depth == 0 && (b.is_ascii_whitespace() || b == b'>') => break,
                            _ => {}
                        }
                        i += 1;
                    }
                    Some(src[value_start..i].to_string())
                }
            }
        } else {
            None
        };

        if attr_name.is_empty() {
            // Stray `=` or similar; skip one byte to guarantee progress
            i += 1;
            continue;
        }
        match attrs.iter_mut().find(|(k, _)| *k == attr_name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((attr_name, value)),
        }
    }
}

/// Find `</name` case-insensitively at or after `from`
fn find_closing(src: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let haystack = src[from..].to_ascii_lowercase();
    haystack.find(&needle).map(|i| from + i)
}

struct TreeBuilder {
    doc: Document,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn text(&mut self, content: &str) {
        let parent = self.current();
        self.doc.append_text(parent, content);
    }

    fn start(&mut self, tag: &StartTag) {
        let element = self.doc.create_element(&tag.name);
        for (name, value) in &tag.attrs {
            self.doc.set_attribute(element, name, value.clone());
        }
        let parent = self.current();
        self.doc.append_child(parent, element);
        if !tag.self_closing && !is_void(&tag.name) {
            self.stack.push(element);
        }
    }

    fn end(&mut self, name: &str) {
        if is_void(name) {
            return;
        }
        let open = self
            .stack
            .iter()
            .rposition(|&id| self.doc.tag(id) == Some(name));
        if let Some(pos) = open {
            self.stack.truncate(pos);
        }
    }
}

/// Parse template source into a fresh [`Document`]
#[must_use]
pub fn parse_html(src: &str) -> Document {
    let mut builder = TreeBuilder {
        doc: Document::new(),
        stack: Vec::new(),
    };
    let bytes = src.as_bytes();
    let mut i = 0;
    let mut text_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &src[i..];
        let next = bytes.get(i + 1).copied().unwrap_or(b' ');

        if rest.starts_with("<!--") {
            builder.text(&src[text_start..i]);
            i = rest[4..].find("-->").map_or(bytes.len(), |end| i + 4 + end + 3);
            text_start = i;
        } else if next == b'!' || next == b'?' {
            builder.text(&src[text_start..i]);
            i = rest.find('>').map_or(bytes.len(), |end| i + end + 1);
            text_start = i;
        } else if next == b'/' && bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic) {
            let Some(close) = rest.find('>') else {
                break;
            };
            builder.text(&src[text_start..i]);
            let name = rest[2..close]
                .split(|c: char| c.is_ascii_whitespace())
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            builder.end(&name);
            i += close + 1;
            text_start = i;
        } else if next.is_ascii_alphabetic() {
            let Some(tag) = parse_start_tag(src, i) else {
                break;
            };
            builder.text(&src[text_start..i]);
            builder.start(&tag);
            i = tag.end;
            if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                let body_end = find_closing(src, i, &tag.name).unwrap_or(bytes.len());
                builder.text(&src[i..body_end]);
                i = body_end;
            }
            text_start = i;
        } else {
            i += 1;
        }
    }
    builder.text(&src[text_start..]);
    builder.doc
}
