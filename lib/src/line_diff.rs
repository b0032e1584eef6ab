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

//! Line-level diffs reduced to display ranges, with long unchanged runs
//! folded into skips.

#![allow(missing_docs)]

use std::cmp::max;
use std::ops::Range;

use itertools::Itertools as _;
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;

use crate::sequence_matcher::diff_opcodes;
use crate::sequence_matcher::OpTag;
use crate::sequence_matcher::Opcode;

/// Splits text into lines.
///
/// The line separator is `\n` unless the text contains `\r` but no `\n`.
/// Stray `\r`/`\n` characters around each line are removed, so CRLF input
/// produces the same lines as LF input. A trailing line break results in a
/// final empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let separator = if text.contains('\r') && !text.contains('\n') {
        '\r'
    } else {
        '\n'
    };
    text.split(separator)
        .map(|line| line.trim_matches(|c| c == '\r' || c == '\n'))
        .collect()
}

/// Kind of a display range.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeTag {
    Equal,
    Replace,
    Delete,
    Insert,
    /// Unchanged lines hidden behind a "show more" row.
    Skip,
}

impl From<OpTag> for RangeTag {
    fn from(tag: OpTag) -> Self {
        match tag {
            OpTag::Equal => RangeTag::Equal,
            OpTag::Replace => RangeTag::Replace,
            OpTag::Delete => RangeTag::Delete,
            OpTag::Insert => RangeTag::Insert,
        }
    }
}

/// A range of rows as the renderer shows them. The display ranges of a diff
/// tile both the before and the after lines in order.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct DisplayRange {
    #[serde(rename = "type")]
    pub tag: RangeTag,
    #[serde(with = "line_range")]
    pub before: Range<usize>,
    #[serde(with = "line_range")]
    pub after: Range<usize>,
    /// Text shown on a skip row, e.g. the enclosing function of a hunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl DisplayRange {
    pub fn new(tag: RangeTag, before: Range<usize>, after: Range<usize>) -> Self {
        DisplayRange {
            tag,
            before,
            after,
            header: None,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Number of rows this range occupies in a side-by-side view.
    pub fn num_rows(&self) -> usize {
        max(self.before.len(), self.after.len())
    }

    /// Turns `rows` lines of this skip back into an equal range.
    ///
    /// A positive `rows` reveals lines at the end of the skip, a negative one
    /// at the start. Revealing all lines turns the whole range into an equal
    /// range. Revealing no lines leaves the skip as is. The magnitude must
    /// not exceed `num_rows()`.
    pub fn unfold(&self, rows: isize) -> Vec<DisplayRange> {
        let count = rows.unsigned_abs();
        debug_assert_eq!(self.tag, RangeTag::Skip);
        debug_assert!(count <= self.num_rows(), "cannot reveal {count} rows of {self:?}");
        if count == 0 {
            return vec![self.clone()];
        }
        if count == self.num_rows() {
            return vec![DisplayRange::new(
                RangeTag::Equal,
                self.before.clone(),
                self.after.clone(),
            )];
        }

        let DisplayRange { before, after, .. } = self;
        if rows > 0 {
            vec![
                DisplayRange {
                    before: before.start..before.end - count,
                    after: after.start..after.end - count,
                    ..self.clone()
                },
                DisplayRange::new(
                    RangeTag::Equal,
                    before.end - count..before.end,
                    after.end - count..after.end,
                ),
            ]
        } else {
            vec![
                DisplayRange::new(
                    RangeTag::Equal,
                    before.start..before.start + count,
                    after.start..after.start + count,
                ),
                DisplayRange {
                    before: before.start + count..before.end,
                    after: after.start + count..after.end,
                    ..self.clone()
                },
            ]
        }
    }
}

impl From<Opcode> for DisplayRange {
    fn from(opcode: Opcode) -> Self {
        DisplayRange::new(opcode.tag.into(), opcode.before, opcode.after)
    }
}

/// Serializes a line range as a `[start, end]` pair.
mod line_range {
    use std::ops::Range;

    use serde::Deserialize as _;
    use serde::Deserializer;
    use serde::Serialize as _;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(range: &Range<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        (range.start, range.end).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Range<usize>, D::Error> {
        let (start, end) = <(usize, usize)>::deserialize(deserializer)?;
        Ok(start..end)
    }
}

/// Converts opcodes into display ranges, replacing the middle of long equal
/// runs with skips.
///
/// `context_size` unchanged lines stay visible next to every change. The
/// leading context of the first range and the trailing context of the last
/// range are not needed since nothing precedes or follows them. A skip is
/// only inserted when it would hide at least `min_jump_size` lines.
pub fn fold_ranges(
    opcodes: Vec<Opcode>,
    context_size: usize,
    min_jump_size: usize,
) -> Vec<DisplayRange> {
    let mut ranges = vec![];
    let last_index = opcodes.len().saturating_sub(1);
    for (i, opcode) in opcodes.into_iter().enumerate() {
        if opcode.tag != OpTag::Equal {
            ranges.push(opcode.into());
            continue;
        }

        // Equal opcodes have the same length on both sides.
        let row_count = opcode.before.len() as isize;
        let leading_context = if i == 0 { 0 } else { context_size as isize };
        let trailing_context = if i == last_index { 0 } else { context_size as isize };
        let first_skip_offset = leading_context;
        let last_skip_offset = row_count - trailing_context;
        let skip_length = last_skip_offset - first_skip_offset;
        if skip_length == 0 || skip_length < min_jump_size as isize {
            ranges.push(opcode.into());
            continue;
        }

        // Both offsets are within 0..=row_count here.
        let first_skip_offset = first_skip_offset as usize;
        let last_skip_offset = last_skip_offset as usize;
        let Opcode { before, after, .. } = opcode;
        if first_skip_offset > 0 {
            ranges.push(DisplayRange::new(
                RangeTag::Equal,
                before.start..before.start + first_skip_offset,
                after.start..after.start + first_skip_offset,
            ));
        }
        ranges.push(DisplayRange::new(
            RangeTag::Skip,
            before.start + first_skip_offset..before.start + last_skip_offset,
            after.start + first_skip_offset..after.start + last_skip_offset,
        ));
        if last_skip_offset < before.len() {
            ranges.push(DisplayRange::new(
                RangeTag::Equal,
                before.start + last_skip_offset..before.end,
                after.start + last_skip_offset..after.end,
            ));
        }
    }
    ranges
}

/// Diffs two lists of lines and folds the unchanged runs.
#[instrument(skip_all, fields(before_len = before_lines.len(), after_len = after_lines.len()))]
pub fn compute_line_diff<S: AsRef<str>>(
    before_lines: &[S],
    after_lines: &[S],
    context_size: usize,
    min_jump_size: usize,
) -> Vec<DisplayRange> {
    let before = before_lines.iter().map(AsRef::as_ref).collect_vec();
    let after = after_lines.iter().map(AsRef::as_ref).collect_vec();
    let opcodes = diff_opcodes(&before, &after);
    let ranges = fold_ranges(opcodes, context_size, min_jump_size);
    tracing::debug!(
        num_ranges = ranges.len(),
        num_skips = ranges.iter().filter(|r| r.tag == RangeTag::Skip).count(),
        "computed line diff"
    );
    ranges
}

/// Reveals `rows` lines of the skip starting at before-line
/// `skip_before_start`, keeping every other range as is. See
/// [`DisplayRange::unfold()`] for the meaning of `rows`.
///
/// If there's no such skip, the ranges are returned unchanged.
pub fn expand_skip(
    ranges: &[DisplayRange],
    skip_before_start: usize,
    rows: isize,
) -> Vec<DisplayRange> {
    ranges
        .iter()
        .flat_map(|range| {
            if range.tag == RangeTag::Skip && range.before.start == skip_before_start {
                range.unfold(rows)
            } else {
                vec![range.clone()]
            }
        })
        .collect()
}

/// Turns skips hiding fewer than `min_jump_size` lines into equal ranges.
pub fn enforce_min_jump_size(ranges: Vec<DisplayRange>, min_jump_size: usize) -> Vec<DisplayRange> {
    ranges
        .into_iter()
        .map(|range| {
            if range.tag == RangeTag::Skip && range.before.len() < min_jump_size {
                DisplayRange::new(RangeTag::Equal, range.before, range.after)
            } else {
                range
            }
        })
        .collect()
}
