// Copyright 2024 The Codediff Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Minimal HTML fragment tree, as emitted by syntax highlighters.
//!
//! Only what's needed to map text positions to markup is modeled: elements,
//! text (with entities decoded) and comments. The raw spelling of every
//! token is kept so fragments can be serialized back byte-for-byte.

#![allow(missing_docs)]

use std::ops::Range;

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "html.pest"]
struct HtmlParser;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Error)]
pub enum HtmlParseError {
    #[error("Syntax error in HTML fragment")]
    Syntax(#[source] Box<pest::error::Error<Rule>>),
    #[error(r#"Closing tag "{name}" doesn't match any open element"#)]
    UnmatchedClosingTag { name: String },
    #[error(r#"Element "{name}" is never closed"#)]
    UnclosedTag { name: String },
}

impl From<pest::error::Error<Rule>> for HtmlParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        HtmlParseError::Syntax(Box::new(err))
    }
}

/// A run of text. Each character remembers how it was spelled in the
/// source, so `&lt;` is one character `<` that serializes as `&lt;`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HtmlText {
    raw: String,
    // Byte offsets into `raw` where each character starts, followed by
    // `raw.len()`.
    boundaries: Vec<usize>,
    decoded: String,
}

impl HtmlText {
    fn push_literal(&mut self, text: &str) {
        for c in text.chars() {
            self.push_char(c, c.encode_utf8(&mut [0; 4]));
        }
    }

    fn push_char(&mut self, c: char, raw: &str) {
        if self.boundaries.is_empty() {
            self.boundaries.push(0);
        }
        self.raw.push_str(raw);
        self.boundaries.push(self.raw.len());
        self.decoded.push(c);
    }

    fn push_entity(&mut self, raw: &str) {
        let decoded = html_escape::decode_html_entities(raw);
        let mut chars = decoded.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if decoded != raw => self.push_char(c, raw),
            // Unknown entities, and the few that expand to several code
            // points, are taken literally.
            _ => self.push_literal(raw),
        }
    }

    /// Number of characters after decoding.
    pub fn char_count(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    /// Text with entities decoded.
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Text as spelled in the source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Source spelling of the given range of characters.
    pub fn raw_slice(&self, chars: Range<usize>) -> &str {
        if chars.is_empty() {
            return "";
        }
        &self.raw[self.boundaries[chars.start]..self.boundaries[chars.end]]
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HtmlElement {
    /// Tag name as spelled in the source.
    pub name: String,
    pub open_tag: String,
    /// `None` for void and self-closing elements.
    pub close_tag: Option<String>,
    pub children: Vec<HtmlNode>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HtmlNode {
    Text(HtmlText),
    Element(HtmlElement),
    Comment(String),
}

impl HtmlNode {
    /// Appends the node's source spelling to `out`.
    pub fn write_html(&self, out: &mut String) {
        match self {
            HtmlNode::Text(text) => out.push_str(text.raw()),
            HtmlNode::Comment(comment) => out.push_str(comment),
            HtmlNode::Element(element) => {
                out.push_str(&element.open_tag);
                for child in &element.children {
                    child.write_html(out);
                }
                if let Some(close_tag) = &element.close_tag {
                    out.push_str(close_tag);
                }
            }
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            HtmlNode::Text(text) => out.push_str(text.decoded()),
            HtmlNode::Comment(_) => {}
            HtmlNode::Element(element) => {
                for child in &element.children {
                    child.write_text(out);
                }
            }
        }
    }
}

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// Appends to the text node at the end of `nodes`, creating one if needed.
fn last_text(nodes: &mut Vec<HtmlNode>) -> &mut HtmlText {
    if !matches!(nodes.last(), Some(HtmlNode::Text(_))) {
        nodes.push(HtmlNode::Text(HtmlText::default()));
    }
    match nodes.last_mut() {
        Some(HtmlNode::Text(text)) => text,
        _ => unreachable!(),
    }
}

struct OpenElement {
    name: String,
    open_tag: String,
    // Siblings preceding the element.
    siblings: Vec<HtmlNode>,
}

/// Parses an HTML fragment into a list of top-level nodes.
///
/// Every opened element must be closed, except void elements like `<br>`
/// and self-closing tags.
pub fn parse_fragment(html: &str) -> Result<Vec<HtmlNode>, HtmlParseError> {
    let fragment = HtmlParser::parse(Rule::fragment, html)?
        .next()
        .into_iter()
        .flat_map(|pair| pair.into_inner());
    let mut open_elements: Vec<OpenElement> = vec![];
    let mut nodes: Vec<HtmlNode> = vec![];
    for pair in fragment {
        match pair.as_rule() {
            Rule::text => last_text(&mut nodes).push_literal(pair.as_str()),
            Rule::entity => last_text(&mut nodes).push_entity(pair.as_str()),
            Rule::comment => nodes.push(HtmlNode::Comment(pair.as_str().to_owned())),
            Rule::open_tag => {
                let open_tag = pair.as_str().to_owned();
                let mut inner = pair.into_inner();
                let name = inner
                    .next()
                    .map(|name| name.as_str().to_owned())
                    .unwrap_or_default();
                let self_closing = inner.any(|pair| pair.as_rule() == Rule::self_closing);
                if self_closing || is_void_element(&name) {
                    nodes.push(HtmlNode::Element(HtmlElement {
                        name,
                        open_tag,
                        close_tag: None,
                        children: vec![],
                    }));
                } else {
                    open_elements.push(OpenElement {
                        name,
                        open_tag,
                        siblings: std::mem::take(&mut nodes),
                    });
                }
            }
            Rule::close_tag => {
                let close_tag = pair.as_str().to_owned();
                let name = pair
                    .into_inner()
                    .next()
                    .map(|name| name.as_str().to_owned())
                    .unwrap_or_default();
                let open = match open_elements.pop() {
                    Some(open) if open.name.eq_ignore_ascii_case(&name) => open,
                    _ => return Err(HtmlParseError::UnmatchedClosingTag { name }),
                };
                let children = std::mem::replace(&mut nodes, open.siblings);
                nodes.push(HtmlNode::Element(HtmlElement {
                    name: open.name,
                    open_tag: open.open_tag,
                    close_tag: Some(close_tag),
                    children,
                }));
            }
            Rule::EOI => {}
            rule => unreachable!("unexpected rule {rule:?} in fragment"),
        }
    }
    if let Some(open) = open_elements.pop() {
        return Err(HtmlParseError::UnclosedTag { name: open.name });
    }
    Ok(nodes)
}

/// Concatenated decoded text of `nodes`, without markup or comments.
pub fn text_content(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_text(&mut out);
    }
    out
}

/// Removes all markup from an HTML fragment and decodes entities.
pub fn strip_tags(html: &str) -> Result<String, HtmlParseError> {
    Ok(text_content(&parse_fragment(html)?))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn to_html(nodes: &[HtmlNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            node.write_html(&mut out);
        }
        out
    }

    #[test]
    fn test_parse_plain_text() {
        let nodes = parse_fragment("foo bar").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_matches!(&nodes[0], HtmlNode::Text(text) if text.decoded() == "foo bar");
        assert_eq!(parse_fragment("").unwrap(), Vec::<HtmlNode>::new());
    }

    #[test]
    fn test_parse_nested_elements() {
        let html = r#"<span class="hljs-keyword">if</span> (<b><i>x</i></b>)"#;
        let nodes = parse_fragment(html).unwrap();
        assert_eq!(nodes.len(), 4);
        assert_matches!(
            &nodes[0],
            HtmlNode::Element(HtmlElement { name, close_tag: Some(_), children, .. })
                if name == "span" && children.len() == 1
        );
        assert_eq!(to_html(&nodes), html);
        assert_eq!(text_content(&nodes), "if (x)");
    }

    #[test]
    fn test_parse_entities() {
        let nodes = parse_fragment("x&lt;y &amp;&amp; &#60;&#x3c;").unwrap();
        let [HtmlNode::Text(text)] = nodes.as_slice() else {
            panic!("unexpected nodes: {nodes:?}");
        };
        assert_eq!(text.decoded(), "x<y && <<");
        assert_eq!(text.char_count(), 9);
        assert_eq!(text.raw_slice(1..2), "&lt;");
        assert_eq!(text.raw_slice(4..6), "&amp;&amp;");
    }

    #[test]
    fn test_parse_unknown_entity_is_literal() {
        assert_eq!(strip_tags("&bogus; &").unwrap(), "&bogus; &");
    }

    #[test]
    fn test_parse_stray_angle_bracket_is_text() {
        assert_eq!(strip_tags("a < b && c<d").unwrap(), "a < b && c<d");
        assert_eq!(strip_tags("x <3").unwrap(), "x <3");
    }

    #[test]
    fn test_parse_quoted_attributes() {
        let html = r#"<a title="a > b" data-x='<'>link</a>"#;
        let nodes = parse_fragment(html).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(to_html(&nodes), html);
        assert_eq!(text_content(&nodes), "link");
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let nodes = parse_fragment("a<br>b<img src=x/>c<foo/>").unwrap();
        assert_eq!(nodes.len(), 6);
        assert_matches!(
            &nodes[1],
            HtmlNode::Element(HtmlElement { close_tag: None, .. })
        );
        assert_eq!(text_content(&nodes), "abc");
    }

    #[test]
    fn test_parse_comments() {
        let nodes = parse_fragment("a<!-- <b> -->b").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_matches!(&nodes[1], HtmlNode::Comment(comment) if comment == "<!-- <b> -->");
        assert_eq!(text_content(&nodes), "ab");
    }

    #[test]
    fn test_parse_case_insensitive_close() {
        assert_eq!(strip_tags("<B>x</b >").unwrap(), "x");
    }

    #[test]
    fn test_parse_unbalanced() {
        assert_matches!(
            parse_fragment("<b>x</i>"),
            Err(HtmlParseError::UnmatchedClosingTag { name }) if name == "i"
        );
        assert_matches!(
            parse_fragment("x</b>"),
            Err(HtmlParseError::UnmatchedClosingTag { name }) if name == "b"
        );
        assert_matches!(
            parse_fragment("<b><i>x</i>"),
            Err(HtmlParseError::UnclosedTag { name }) if name == "b"
        );
    }
}
