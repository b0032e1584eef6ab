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

//! Intra-line diffs between a replaced line and its replacement.

#![allow(missing_docs)]

use std::fmt;
use std::ops::Range;

use itertools::Itertools as _;
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;

use crate::html_text_mapper::HtmlTextMapper;
use crate::html_text_mapper::HtmlTextMapperError;
use crate::sequence_matcher::diff_opcodes;
use crate::sequence_matcher::OpTag;
use crate::words::split_into_words;

/// Character diffs are suppressed when less than this fraction of the
/// characters of both lines is unchanged.
const MIN_EQUAL_FRACTION: f64 = 0.5;

/// How a span of characters changed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharTag {
    Insert,
    Delete,
    Replace,
}

impl CharTag {
    pub fn as_str(self) -> &'static str {
        match self {
            CharTag::Insert => "insert",
            CharTag::Delete => "delete",
            CharTag::Replace => "replace",
        }
    }
}

impl fmt::Display for CharTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type CharacterDiffTuple = (Option<CharTag>, usize, usize);

/// A span of characters of one line. `tag` is `None` for unchanged text.
///
/// Offsets count `char`s, not bytes.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(from = "CharacterDiffTuple", into = "CharacterDiffTuple")]
pub struct CharacterDiff {
    pub tag: Option<CharTag>,
    pub start: usize,
    pub end: usize,
}

impl CharacterDiff {
    pub fn new(tag: Option<CharTag>, range: Range<usize>) -> Self {
        CharacterDiff {
            tag,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<CharacterDiffTuple> for CharacterDiff {
    fn from((tag, start, end): CharacterDiffTuple) -> Self {
        CharacterDiff { tag, start, end }
    }
}

impl From<CharacterDiff> for CharacterDiffTuple {
    fn from(span: CharacterDiff) -> Self {
        (span.tag, span.start, span.end)
    }
}

/// Character offset of every word boundary, including both ends.
fn word_offsets(words: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(words.len() + 1);
    offsets.push(0);
    let mut total = 0;
    for word in words {
        total += word.chars().count();
        offsets.push(total);
    }
    offsets
}

fn is_all_whitespace(words: &[&str]) -> bool {
    words.iter().all(|word| word.chars().all(char::is_whitespace))
}

/// Computes an intra-line diff at word granularity.
///
/// Returns the spans of the before line and of the after line, or `None` if
/// the lines have too little in common for a character diff to be helpful.
/// Changes consisting only of whitespace are always reported.
#[instrument(skip_all)]
pub fn compute_character_diff(
    before_text: &str,
    after_text: &str,
) -> Option<(Vec<CharacterDiff>, Vec<CharacterDiff>)> {
    let before_words = split_into_words(before_text);
    let after_words = split_into_words(after_text);
    let before_offsets = word_offsets(&before_words);
    let after_offsets = word_offsets(&after_words);
    let opcodes = diff_opcodes(&before_words, &after_words);

    let before_chars = |words: &Range<usize>| before_offsets[words.start]..before_offsets[words.end];
    let after_chars = |words: &Range<usize>| after_offsets[words.start]..after_offsets[words.end];

    // Unchanged characters count twice since they occur on both sides.
    let mut equal_count = 0;
    let mut char_count = 0;
    let mut before_changes_all_whitespace = true;
    let mut after_changes_all_whitespace = true;
    for opcode in &opcodes {
        let count = before_chars(&opcode.before).len() + after_chars(&opcode.after).len();
        if opcode.tag == OpTag::Equal {
            equal_count += count;
        } else {
            if before_changes_all_whitespace {
                before_changes_all_whitespace = is_all_whitespace(&before_words[opcode.before.clone()]);
            }
            if after_changes_all_whitespace {
                after_changes_all_whitespace = is_all_whitespace(&after_words[opcode.after.clone()]);
            }
        }
        char_count += count;
    }
    if (equal_count as f64) < MIN_EQUAL_FRACTION * char_count as f64
        && !(before_changes_all_whitespace && after_changes_all_whitespace)
    {
        tracing::trace!(equal_count, char_count, "declining character diff");
        return None;
    }

    let mut before_spans = vec![];
    let mut after_spans = vec![];
    for opcode in &opcodes {
        let before_range = before_chars(&opcode.before);
        let after_range = after_chars(&opcode.after);
        match opcode.tag {
            OpTag::Equal => {
                before_spans.push(CharacterDiff::new(None, before_range));
                after_spans.push(CharacterDiff::new(None, after_range));
            }
            OpTag::Delete => {
                before_spans.push(CharacterDiff::new(Some(CharTag::Delete), before_range));
            }
            OpTag::Insert => {
                after_spans.push(CharacterDiff::new(Some(CharTag::Insert), after_range));
            }
            // Words inside a replaced run aren't aligned with each other.
            OpTag::Replace => {
                before_spans.push(CharacterDiff::new(Some(CharTag::Delete), before_range));
                after_spans.push(CharacterDiff::new(Some(CharTag::Insert), after_range));
            }
        }
    }
    Some((merge_spans(before_spans), merge_spans(after_spans)))
}

/// Merges consecutive spans with the same tag.
pub fn merge_spans(spans: impl IntoIterator<Item = CharacterDiff>) -> Vec<CharacterDiff> {
    let mut merged: Vec<CharacterDiff> = vec![];
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.tag == span.tag => last.end = span.end,
            _ => merged.push(span),
        }
    }
    merged
}

/// Renders spans of a line, wrapping changed ones in
/// `<span class="char-{tag}">`.
pub fn spans_to_html(mapper: &HtmlTextMapper, spans: &[CharacterDiff]) -> String {
    spans
        .iter()
        .map(|span| {
            let html = mapper.get_html_substring(span.start, span.end);
            match span.tag {
                None => html,
                Some(tag) => format!(r#"<span class="char-{tag}">{html}</span>"#),
            }
        })
        .join("")
}

/// Marks up the character diff of two lines in their HTML renditions.
///
/// `before_html` and `after_html` may contain arbitrary balanced markup,
/// such as syntax highlighting, around the text of the lines. If no
/// character diff is appropriate, the HTML is returned unchanged.
pub fn splice_character_diff_into_html(
    before_text: &str,
    before_html: &str,
    after_text: &str,
    after_html: &str,
) -> Result<(String, String), HtmlTextMapperError> {
    let Some((before_spans, after_spans)) = compute_character_diff(before_text, after_text) else {
        return Ok((before_html.to_owned(), after_html.to_owned()));
    };
    let before_mapper = HtmlTextMapper::new(before_text, before_html)?;
    let after_mapper = HtmlTextMapper::new(after_text, after_html)?;
    Ok((
        spans_to_html(&before_mapper, &before_spans),
        spans_to_html(&after_mapper, &after_spans),
    ))
}
