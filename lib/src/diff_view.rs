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

//! Side-by-side view of a diff between two texts.
//!
//! A [`DiffView`] holds the lines of both sides and the display ranges
//! between them, and renders them as rows of HTML, one per line pair or
//! skip. Expanding a skip updates the ranges in place.

#![allow(missing_docs)]

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::char_diff::splice_character_diff_into_html;
use crate::highlight::highlight_lines;
use crate::highlight::Highlighter;
use crate::html_text_mapper::HtmlTextMapperError;
use crate::line_diff::compute_line_diff;
use crate::line_diff::enforce_min_jump_size;
use crate::line_diff::expand_skip;
use crate::line_diff::split_lines;
use crate::line_diff::DisplayRange;
use crate::line_diff::RangeTag;
use crate::settings::DiffSettings;
use crate::span_distributor::DistributeSpansError;
use crate::unified_diff::parse_unified_diff;
use crate::unified_diff::UnifiedDiffError;

/// Error building or rendering a [`DiffView`].
#[derive(Debug, Error)]
pub enum DiffViewError {
    /// Highlighted HTML had unbalanced spans.
    #[error("Failed to split highlighted HTML into lines")]
    Highlight(#[from] DistributeSpansError),
    /// A line's HTML didn't match its text.
    #[error("Failed to apply character diff")]
    CharacterDiff(#[from] HtmlTextMapperError),
    /// The unified diff couldn't be read.
    #[error("Failed to read unified diff")]
    UnifiedDiff(#[from] UnifiedDiffError),
}

/// One side of a rendered line row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RowSide {
    /// 1-based line number.
    pub line_number: usize,
    /// HTML of the line, with character diff markup if any.
    pub html: String,
}

/// A row of the side-by-side view.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiffRow {
    /// Hidden unchanged lines.
    Skip {
        /// 0-based index of the first hidden before-line.
        before_start: usize,
        /// 0-based index of the first hidden after-line.
        after_start: usize,
        num_rows: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<String>,
    },
    /// A pair of lines. A side is `None` where the other side has more lines.
    Line {
        tag: RangeTag,
        before: Option<RowSide>,
        after: Option<RowSide>,
    },
}

/// Which part of a skip to reveal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpandDirection {
    /// The lines at the top of the skip.
    Up,
    /// The lines at the bottom of the skip.
    Down,
    /// All lines of the skip.
    All,
}

fn text_to_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    split_lines(text).into_iter().map(str::to_owned).collect()
}

/// Text of one side of the diff, split into lines.
#[derive(Clone, Debug)]
struct Side {
    text: String,
    lines: Vec<String>,
    highlighted: Option<Vec<String>>,
}

impl Side {
    fn new(text: &str) -> Self {
        Side {
            text: text.to_owned(),
            lines: text_to_lines(text),
            highlighted: None,
        }
    }

    fn highlight(
        &mut self,
        highlighter: &dyn Highlighter,
        language: &str,
    ) -> Result<(), DistributeSpansError> {
        self.highlighted = if self.text.is_empty() {
            Some(vec![])
        } else {
            Some(highlight_lines(highlighter, &self.text, language)?)
        };
        Ok(())
    }

    fn text(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", String::as_str)
    }

    fn html(&self, index: usize) -> String {
        match self.highlighted.as_ref().and_then(|lines| lines.get(index)) {
            Some(html) => html.clone(),
            None => html_escape::encode_text(self.text(index)).into_owned(),
        }
    }
}

/// The diff between two texts, as shown side by side.
#[derive(Clone, Debug)]
pub struct DiffView {
    before: Side,
    after: Side,
    ranges: Vec<DisplayRange>,
    settings: DiffSettings,
}

impl DiffView {
    /// Diffs `before_text` and `after_text` line by line.
    #[instrument(skip_all)]
    pub fn new(before_text: &str, after_text: &str, settings: DiffSettings) -> Self {
        let before = Side::new(before_text);
        let after = Side::new(after_text);
        let ranges = compute_line_diff(
            &before.lines,
            &after.lines,
            settings.context_size,
            settings.min_jump_size,
        );
        DiffView {
            before,
            after,
            ranges,
            settings,
        }
    }

    /// Shows precomputed display ranges between `before_text` and
    /// `after_text`. Skips shorter than the minimum jump size are shown.
    pub fn from_ranges(
        before_text: &str,
        after_text: &str,
        ranges: Vec<DisplayRange>,
        settings: DiffSettings,
    ) -> Self {
        DiffView {
            before: Side::new(before_text),
            after: Side::new(after_text),
            ranges: enforce_min_jump_size(ranges, settings.min_jump_size),
            settings,
        }
    }

    /// Shows the hunks of a unified diff between `before_text` and
    /// `after_text`.
    pub fn from_unified_diff(
        before_text: &str,
        after_text: &str,
        diff: &str,
        settings: DiffSettings,
    ) -> Result<Self, DiffViewError> {
        let after_num_lines = text_to_lines(after_text).len();
        let ranges = parse_unified_diff(diff, Some(after_num_lines))?;
        Ok(Self::from_ranges(before_text, after_text, ranges, settings))
    }

    /// Highlights both texts of the view as `language`.
    pub fn highlight(
        &mut self,
        highlighter: &dyn Highlighter,
        language: &str,
    ) -> Result<(), DiffViewError> {
        self.before.highlight(highlighter, language)?;
        self.after.highlight(highlighter, language)?;
        Ok(())
    }

    pub fn ranges(&self) -> &[DisplayRange] {
        &self.ranges
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    pub fn before_text(&self) -> &str {
        &self.before.text
    }

    pub fn after_text(&self) -> &str {
        &self.after.text
    }

    pub fn before_lines(&self) -> &[String] {
        &self.before.lines
    }

    pub fn after_lines(&self) -> &[String] {
        &self.after.lines
    }

    pub fn max_line_number(&self) -> usize {
        self.before.lines.len().max(self.after.lines.len())
    }

    /// Reveals `rows` lines of the skip starting at before-line
    /// `skip_before_start`: at its end if positive, at its start if negative.
    /// Asking for as many rows as the skip has, or more, reveals all of it.
    ///
    /// Returns `false` if there's no such skip.
    pub fn show_more(&mut self, skip_before_start: usize, rows: isize) -> bool {
        let Some(skip) = self
            .ranges
            .iter()
            .find(|range| range.tag == RangeTag::Skip && range.before.start == skip_before_start)
        else {
            return false;
        };
        let num_rows = skip.num_rows();
        let rows = if rows.unsigned_abs() >= num_rows {
            num_rows as isize
        } else {
            rows
        };
        if rows == 0 {
            return true;
        }
        tracing::trace!(skip_before_start, rows, "expanding skip");
        self.ranges = expand_skip(&self.ranges, skip_before_start, rows);
        true
    }

    /// Reveals `expand_lines` lines of a skip, or all of it if it's not much
    /// longer than that.
    pub fn expand(&mut self, skip_before_start: usize, direction: ExpandDirection) -> bool {
        let expand_lines = self.settings.expand_lines as isize;
        let rows = match direction {
            ExpandDirection::Up => -expand_lines,
            ExpandDirection::Down => expand_lines,
            ExpandDirection::All => isize::MAX,
        };
        self.show_more(skip_before_start, rows)
    }

    /// Renders the rows of the view.
    ///
    /// Lines of `replace` ranges that have a counterpart on the other side
    /// get character diff markup.
    pub fn rows(&self) -> Result<Vec<DiffRow>, DiffViewError> {
        let mut rows = vec![];
        for range in &self.ranges {
            if range.tag == RangeTag::Skip {
                rows.push(DiffRow::Skip {
                    before_start: range.before.start,
                    after_start: range.after.start,
                    num_rows: range.num_rows(),
                    header: range.header.clone(),
                });
                continue;
            }
            for j in 0..range.num_rows() {
                let before_index = (j < range.before.len()).then(|| range.before.start + j);
                let after_index = (j < range.after.len()).then(|| range.after.start + j);
                let (before_html, after_html) = match (before_index, after_index) {
                    (Some(b), Some(a)) if range.tag == RangeTag::Replace => {
                        let (before_html, after_html) = splice_character_diff_into_html(
                            self.before.text(b),
                            &self.before.html(b),
                            self.after.text(a),
                            &self.after.html(a),
                        )?;
                        (Some(before_html), Some(after_html))
                    }
                    _ => (
                        before_index.map(|i| self.before.html(i)),
                        after_index.map(|i| self.after.html(i)),
                    ),
                };
                let side = |index: Option<usize>, html: Option<String>| {
                    let (index, html) = index.zip(html)?;
                    Some(RowSide {
                        line_number: index + 1,
                        html,
                    })
                };
                rows.push(DiffRow::Line {
                    tag: range.tag,
                    before: side(before_index, before_html),
                    after: side(after_index, after_html),
                });
            }
        }
        Ok(rows)
    }
}
