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

//! Maps character ranges of a line's text to fragments of its HTML.

use thiserror::Error;

use crate::html::parse_fragment;
use crate::html::text_content;
use crate::html::HtmlNode;
use crate::html::HtmlParseError;
use crate::html::HtmlText;

/// Error constructing an [`HtmlTextMapper`].
#[derive(Debug, Error)]
pub enum HtmlTextMapperError {
    /// The HTML couldn't be parsed.
    #[error(transparent)]
    Parse(#[from] HtmlParseError),
    /// The text of the HTML differs from the given text.
    #[error("HTML text {html_text:?} doesn't match {text:?}")]
    TextMismatch {
        /// Text the mapper was constructed with.
        text: String,
        /// Text of the HTML after stripping markup.
        html_text: String,
    },
}

/// Slices HTML by positions in its text.
#[derive(Clone, Debug)]
pub struct HtmlTextMapper {
    nodes: Vec<HtmlNode>,
    char_count: usize,
}

impl HtmlTextMapper {
    /// Creates a mapper for `html`, whose text with all markup removed must
    /// be `text`.
    pub fn new(text: &str, html: &str) -> Result<Self, HtmlTextMapperError> {
        let nodes = parse_fragment(html)?;
        let html_text = text_content(&nodes);
        if html_text != text {
            return Err(HtmlTextMapperError::TextMismatch {
                text: text.to_owned(),
                html_text,
            });
        }
        Ok(HtmlTextMapper {
            nodes,
            char_count: text.chars().count(),
        })
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Returns the HTML for the characters `start..limit` of the text.
    ///
    /// Markup enclosing the range is kept and closed properly. Elements that
    /// end before the range starts are dropped, and so is everything after
    /// the range ends. Leading markup belongs to the first character, so an
    /// empty range yields an empty string.
    pub fn get_html_substring(&self, start: usize, limit: usize) -> String {
        debug_assert!(start <= limit && limit <= self.char_count);
        let mut walk = SubstringWalk {
            start,
            count: limit as isize - start as isize,
            consumed: 0,
        };
        let mut out = String::new();
        walk.walk(&self.nodes, &mut out);
        out
    }
}

struct SubstringWalk {
    // Characters left to skip before the range.
    start: usize,
    // Characters left to take. Goes negative when a text node overshoots.
    count: isize,
    // Characters taken so far.
    consumed: usize,
}

impl SubstringWalk {
    /// Takes the part of `text` that falls into the range.
    fn track<'a>(&mut self, text: &'a HtmlText) -> &'a str {
        if self.count <= 0 {
            return "";
        }
        let len = text.char_count();
        let kept_start = if self.start <= len {
            std::mem::take(&mut self.start)
        } else {
            self.start -= len;
            len
        };
        let kept_len = len - kept_start;
        self.count -= kept_len as isize;
        self.consumed += kept_len;
        let kept_end = if self.count <= 0 {
            (len as isize + self.count) as usize
        } else {
            len
        };
        text.raw_slice(kept_start..kept_end)
    }

    /// Serializes the parts of `nodes` that survive into `out`. The first
    /// node is always visited; the walk stops once the range is exhausted.
    fn walk(&mut self, nodes: &[HtmlNode], out: &mut String) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => out.push_str(self.track(text)),
                HtmlNode::Comment(comment) => out.push_str(comment),
                HtmlNode::Element(element) => {
                    let mut inner = String::new();
                    self.walk(&element.children, &mut inner);
                    // Elements seen before the range started are dropped.
                    if self.consumed > 0 {
                        out.push_str(&element.open_tag);
                        out.push_str(&inner);
                        if let Some(close_tag) = &element.close_tag {
                            out.push_str(close_tag);
                        }
                    }
                }
            }
            if self.count <= 0 {
                break;
            }
        }
    }
}
