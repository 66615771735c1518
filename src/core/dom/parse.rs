//! Markup fragment parser: tokenizes tags, text, and comments into the node arena.

use std::borrow::Cow;

use super::{Document, NodeId, NodeKind, is_raw_text, is_void};

/// Maximum element nesting accepted by the parser.
pub const MAX_DEPTH: usize = 512;

/// Errors from parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end tag </{tag}> at byte {offset}")]
    UnexpectedEndTag { tag: String, offset: usize },
    #[error("unterminated tag at byte {offset}")]
    UnterminatedTag { offset: usize },
    #[error("unterminated comment at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("elements nested deeper than {limit}")]
    NestingTooDeep { limit: usize },
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    open: Vec<NodeId>,
    text: String,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        // open[0] is the fragment and is never popped
        self.open[self.open.len() - 1]
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.text);
        let id = self.doc.alloc(NodeKind::Text(decode_entities(&raw).into_owned()));
        let parent = self.current();
        self.doc.attach(parent, id);
    }

    fn push_literal(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let id = self.doc.alloc(NodeKind::Text(text.to_string()));
        self.doc.attach(parent, id);
    }

    fn open_element(&mut self, tag: StartTag) -> Result<NodeId, ParseError> {
        self.flush_text();
        let id = self.doc.alloc(NodeKind::Element {
            tag: tag.name.clone(),
            attrs: tag.attrs,
        });
        let parent = self.current();
        self.doc.attach(parent, id);
        if !tag.self_closing && !is_void(&tag.name) {
            if self.open.len() > MAX_DEPTH {
                return Err(ParseError::NestingTooDeep { limit: MAX_DEPTH });
            }
            self.open.push(id);
        }
        Ok(id)
    }

    fn close_element(&mut self, name: &str, offset: usize) -> Result<(), ParseError> {
        self.flush_text();
        if is_void(name) {
            return Ok(());
        }
        let pos = self
            .open
            .iter()
            .skip(1)
            .rposition(|id| self.doc.tag(*id) == Some(name))
            .map(|p| p + 1)
            .ok_or_else(|| ParseError::UnexpectedEndTag {
                tag: name.to_string(),
                offset,
            })?;
        // closes anything still open inside it
        self.open.truncate(pos);
        Ok(())
    }
}

/// Parse `markup` into a new detached fragment node.
pub(crate) fn parse_fragment(doc: &mut Document, markup: &str) -> Result<NodeId, ParseError> {
    let fragment = doc.alloc(NodeKind::Fragment);
    let mut b = TreeBuilder {
        doc,
        open: vec![fragment],
        text: String::new(),
    };
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];
        let Some(lt) = rest.find('<') else {
            b.text.push_str(rest);
            break;
        };
        b.text.push_str(&rest[..lt]);
        pos += lt;
        let rest = &markup[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body
                .find("-->")
                .ok_or(ParseError::UnterminatedComment { offset: pos })?;
            b.flush_text();
            let id = b.doc.create_comment(&body[..end]);
            let parent = b.current();
            b.doc.attach(parent, id);
            pos += 4 + end + 3;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            // doctype or processing instruction
            let end = rest
                .find('>')
                .ok_or(ParseError::UnterminatedTag { offset: pos })?;
            pos += end + 1;
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                let end = rest
                    .find('>')
                    .ok_or(ParseError::UnterminatedTag { offset: pos })?;
                let name = rest[2..end]
                    .split_ascii_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                b.close_element(&name, pos)?;
                pos += end + 1;
                continue;
            }
            b.text.push('<');
            pos += 1;
            continue;
        }

        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let (tag, consumed) =
                parse_start_tag(rest).ok_or(ParseError::UnterminatedTag { offset: pos })?;
            pos += consumed;
            let raw = is_raw_text(&tag.name) && !tag.self_closing;
            let name = tag.name.clone();
            let id = b.open_element(tag)?;
            if raw {
                let body = &markup[pos..];
                let (content, skip) = match find_raw_end(body, &name) {
                    Some((start, end)) => (&body[..start], end),
                    None => (body, body.len()),
                };
                b.push_literal(id, content);
                b.open.pop();
                pos += skip;
            }
            continue;
        }

        // a lone '<' is text
        b.text.push('<');
        pos += 1;
    }

    b.flush_text();
    Ok(fragment)
}

/// Locate `</name ...>` in raw-text content. Returns (content end, bytes to skip).
fn find_raw_end(body: &str, name: &str) -> Option<(usize, usize)> {
    let lower = body.to_ascii_lowercase();
    let needle = format!("</{}", name);
    let start = lower.find(&needle)?;
    let close = body[start..].find('>')?;
    Some((start, start + close + 1))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

/// Parse `<name attr=value ...>` at the start of `s`. Returns the tag and bytes consumed.
fn parse_start_tag(s: &str) -> Option<(StartTag, usize)> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let name = s[1..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();

    loop {
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some((
                    StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    },
                    i + 1,
                ));
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some((
                    StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    },
                    i + 2,
                ));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let start = i;
        while i < bytes.len()
            && !is_space(bytes[i])
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let key = s[start..i].to_ascii_lowercase();
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && is_space(bytes[i]) {
                i += 1;
            }
            match bytes.get(i) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let close = s[i + 1..].find(q as char)?;
                    value = decode_entities(&s[i + 1..i + 1 + close]).into_owned();
                    i += close + 2;
                }
                Some(_) => {
                    let vstart = i;
                    while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&s[vstart..i]).into_owned();
                }
                None => return None,
            }
        }
        if !attrs.iter().any(|(k, _)| *k == key) {
            attrs.push((key, value));
        }
    }
}

/// Decode character references. Unknown references are kept literally.
pub(crate) fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 32)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
