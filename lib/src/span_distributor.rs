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

//! Splits highlighted multi-line HTML into lines of balanced markup.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::line_diff::split_lines;

static SPAN_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<span[^>]*>|</span>").unwrap());

const CLOSE_SPAN: &str = "</span>";

/// Error distributing spans over lines.
#[derive(Debug, Error)]
pub enum DistributeSpansError {
    /// Some spans were still open at the end of the input.
    #[error("Unbalanced <span>s: {open_spans} still open at the end")]
    UnbalancedMarkup {
        /// Number of spans that were never closed.
        open_spans: usize,
    },
    /// A `</span>` appeared while no span was open.
    #[error("Unexpected </span> on line {line}")]
    UnexpectedClosingSpan {
        /// 1-based line number.
        line: usize,
    },
}

/// Splits `html` into lines such that every `<span>` is opened and closed on
/// the same line.
///
/// A span that crosses line breaks is closed at the end of each line and
/// reopened, with its original attributes, at the start of the next.
pub fn distribute_spans(html: &str) -> Result<Vec<String>, DistributeSpansError> {
    let mut live_spans: Vec<&str> = vec![];
    let mut out_lines = vec![];
    for (line_index, line) in split_lines(html).into_iter().enumerate() {
        let mut out_line: String = live_spans.concat();
        let mut pos = 0;
        for tag in SPAN_TAG_REGEX.find_iter(line) {
            out_line.push_str(&line[pos..tag.start()]);
            out_line.push_str(tag.as_str());
            if tag.as_str() == CLOSE_SPAN {
                if live_spans.pop().is_none() {
                    return Err(DistributeSpansError::UnexpectedClosingSpan {
                        line: line_index + 1,
                    });
                }
            } else {
                live_spans.push(tag.as_str());
            }
            pos = tag.end();
        }
        out_line.push_str(&line[pos..]);
        out_line.push_str(&CLOSE_SPAN.repeat(live_spans.len()));
        out_lines.push(out_line);
    }
    if !live_spans.is_empty() {
        return Err(DistributeSpansError::UnbalancedMarkup {
            open_spans: live_spans.len(),
        });
    }
    Ok(out_lines)
}
