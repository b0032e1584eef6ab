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

//! Display ranges from a unified diff, e.g. the output of `git diff`.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::instrument;

use crate::line_diff::DisplayRange;
use crate::line_diff::RangeTag;

static HUNK_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$").unwrap()
});

/// Error parsing a unified diff.
#[derive(Debug, Error)]
pub enum UnifiedDiffError {
    /// A line starting with `@@` isn't a valid hunk header.
    #[error("Malformed hunk header on line {line_number}: {line:?}")]
    MalformedHunkHeader {
        /// 1-based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },
    /// A hunk has fewer lines than its header announces.
    #[error("Hunk starting on line {line_number} is truncated")]
    TruncatedHunk {
        /// 1-based line number of the hunk header.
        line_number: usize,
    },
    /// A line inside a hunk is neither context, a removal nor an addition the
    /// header allows for.
    #[error("Unexpected line {line_number} in hunk: {line:?}")]
    UnexpectedHunkLine {
        /// 1-based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct HunkHeader {
    // 0-based position of the first line on each side.
    before_start: usize,
    before_len: usize,
    after_start: usize,
    after_len: usize,
    section: String,
}

fn hunk_start(start: usize, len: usize) -> usize {
    // An empty side names the line before the hunk.
    if len == 0 {
        start
    } else {
        start.saturating_sub(1)
    }
}

fn parse_hunk_header(line_number: usize, line: &str) -> Result<HunkHeader, UnifiedDiffError> {
    let malformed = || UnifiedDiffError::MalformedHunkHeader {
        line_number,
        line: line.to_owned(),
    };
    let captures = HUNK_HEADER_REGEX.captures(line).ok_or_else(malformed)?;
    let number = |index: usize, default: Option<usize>| match captures.get(index) {
        Some(m) => m.as_str().parse::<usize>().map_err(|_| malformed()),
        None => default.ok_or_else(malformed),
    };
    let before_len = number(2, Some(1))?;
    let after_len = number(4, Some(1))?;
    Ok(HunkHeader {
        before_start: hunk_start(number(1, None)?, before_len),
        before_len,
        after_start: hunk_start(number(3, None)?, after_len),
        after_len,
        section: captures
            .get(5)
            .map_or("", |m| m.as_str())
            .trim()
            .to_owned(),
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HunkLine {
    Context,
    Removed,
    Added,
}

/// Collects runs of hunk lines into display ranges.
struct RangeBuilder {
    ranges: Vec<DisplayRange>,
    before_pos: usize,
    after_pos: usize,
    run: Option<(HunkLine, usize)>,
}

impl RangeBuilder {
    fn start_hunk(&mut self, header: &HunkHeader) {
        self.flush();
        if header.before_start != self.before_pos {
            let mut skip = DisplayRange::new(
                RangeTag::Skip,
                self.before_pos..header.before_start,
                self.after_pos..header.after_start,
            );
            if !header.section.is_empty() {
                skip = skip.with_header(header.section.clone());
            }
            self.ranges.push(skip);
        }
        self.before_pos = header.before_start;
        self.after_pos = header.after_start;
    }

    fn push_line(&mut self, kind: HunkLine) {
        match &mut self.run {
            Some((run_kind, len)) if *run_kind == kind => *len += 1,
            _ => {
                self.flush();
                self.run = Some((kind, 1));
            }
        }
    }

    fn flush(&mut self) {
        let Some((kind, len)) = self.run.take() else {
            return;
        };
        let advance = |pos: &mut usize, by: usize| -> Range<usize> {
            let range = *pos..*pos + by;
            *pos += by;
            range
        };
        let (tag, before, after) = match kind {
            HunkLine::Context => (
                RangeTag::Equal,
                advance(&mut self.before_pos, len),
                advance(&mut self.after_pos, len),
            ),
            HunkLine::Removed => (
                RangeTag::Delete,
                advance(&mut self.before_pos, len),
                advance(&mut self.after_pos, 0),
            ),
            HunkLine::Added => (
                RangeTag::Insert,
                advance(&mut self.before_pos, 0),
                advance(&mut self.after_pos, len),
            ),
        };
        self.ranges.push(DisplayRange::new(tag, before, after));
    }
}

/// Reads the hunks of the first file in `diff` as display ranges.
///
/// Lines between hunks become `skip` ranges labeled with the hunk's section
/// heading. A diff without hunks, such as one of a binary file, has no
/// ranges.
pub fn read_hunks(diff: &str) -> Result<Vec<DisplayRange>, UnifiedDiffError> {
    let mut builder = RangeBuilder {
        ranges: vec![],
        before_pos: 0,
        after_pos: 0,
        run: None,
    };
    let mut seen_hunk = false;
    let mut lines = diff
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .map(|(index, line)| (index + 1, line));
    while let Some((line_number, line)) = lines.next() {
        if line.starts_with("@@") {
            let header = parse_hunk_header(line_number, line)?;
            builder.start_hunk(&header);
            seen_hunk = true;
            let mut before_remaining = header.before_len;
            let mut after_remaining = header.after_len;
            while before_remaining > 0 || after_remaining > 0 {
                let truncated = UnifiedDiffError::TruncatedHunk { line_number };
                let (body_line_number, body_line) = lines.next().ok_or(truncated)?;
                let unexpected = || UnifiedDiffError::UnexpectedHunkLine {
                    line_number: body_line_number,
                    line: body_line.to_owned(),
                };
                let kind = match body_line.chars().next() {
                    // Editors like to strip the space of empty context lines.
                    Some(' ') | None => HunkLine::Context,
                    Some('-') => HunkLine::Removed,
                    Some('+') => HunkLine::Added,
                    Some('\\') => continue,
                    Some(_) => return Err(unexpected()),
                };
                let (before_used, after_used) = match kind {
                    HunkLine::Context => (1, 1),
                    HunkLine::Removed => (1, 0),
                    HunkLine::Added => (0, 1),
                };
                if before_remaining < before_used || after_remaining < after_used {
                    return Err(unexpected());
                }
                before_remaining -= before_used;
                after_remaining -= after_used;
                builder.push_line(kind);
            }
        } else if seen_hunk && (line.starts_with("diff ") || line.starts_with("--- ")) {
            // Only the first file is of interest.
            break;
        }
    }
    builder.flush();
    Ok(builder.ranges)
}

/// Merges every `delete` range directly followed by an `insert` range into a
/// `replace` range.
pub fn add_replaces(ranges: Vec<DisplayRange>) -> Vec<DisplayRange> {
    let mut out: Vec<DisplayRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last_mut() {
            Some(last) if last.tag == RangeTag::Delete && range.tag == RangeTag::Insert => {
                last.tag = RangeTag::Replace;
                last.before.end = range.before.end;
                last.after.end = range.after.end;
            }
            _ => out.push(range),
        }
    }
    out
}

/// Converts the first file of a unified diff to display ranges.
///
/// The diff only covers the lines around changes. If `after_num_lines`, the
/// number of lines of the new file, is known, the lines after the last hunk
/// become a trailing `skip` range.
#[instrument(skip_all)]
pub fn parse_unified_diff(
    diff: &str,
    after_num_lines: Option<usize>,
) -> Result<Vec<DisplayRange>, UnifiedDiffError> {
    let mut ranges = add_replaces(read_hunks(diff)?);
    if let (Some(after_num_lines), Some(last)) = (after_num_lines, ranges.last()) {
        let before_end = last.before.end;
        let after_end = last.after.end;
        if after_num_lines > after_end {
            let end_skip = after_num_lines - after_end;
            ranges.push(DisplayRange::new(
                RangeTag::Skip,
                before_end..before_end + end_skip,
                after_end..after_end + end_skip,
            ));
        }
    }
    tracing::debug!(num_ranges = ranges.len(), "parsed unified diff");
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use indoc::indoc;

    use super::*;

    fn range(tag: RangeTag, before: Range<usize>, after: Range<usize>) -> DisplayRange {
        DisplayRange::new(tag, before, after)
    }

    #[test]
    fn test_parse_hunk_header() {
        assert_eq!(
            parse_hunk_header(1, "@@ -3,4 +3,5 @@ pytest==7.1.3").unwrap(),
            HunkHeader {
                before_start: 2,
                before_len: 4,
                after_start: 2,
                after_len: 5,
                section: "pytest==7.1.3".to_owned(),
            }
        );
        assert_eq!(
            parse_hunk_header(1, "@@ -0,0 +1 @@").unwrap(),
            HunkHeader {
                before_start: 0,
                before_len: 0,
                after_start: 0,
                after_len: 1,
                section: "".to_owned(),
            }
        );
        assert_matches!(
            parse_hunk_header(7, "@@ -x +1 @@"),
            Err(UnifiedDiffError::MalformedHunkHeader { line_number: 7, .. })
        );
    }

    #[test]
    fn test_add_replaces() {
        let ranges = vec![
            range(RangeTag::Equal, 0..2, 0..2),
            range(RangeTag::Delete, 2..3, 2..2),
            range(RangeTag::Insert, 3..3, 2..3),
            range(RangeTag::Equal, 3..6, 3..6),
        ];
        assert_eq!(
            add_replaces(ranges),
            vec![
                range(RangeTag::Equal, 0..2, 0..2),
                range(RangeTag::Replace, 2..3, 2..3),
                range(RangeTag::Equal, 3..6, 3..6),
            ]
        );
    }

    #[test]
    fn test_add_replaces_keeps_insert_before_delete() {
        let ranges = vec![
            range(RangeTag::Insert, 0..0, 0..1),
            range(RangeTag::Delete, 0..1, 1..1),
        ];
        assert_eq!(add_replaces(ranges.clone()), ranges);
    }

    #[test]
    fn test_read_hunks_truncated() {
        let diff = indoc! {"
            --- a/foo
            +++ b/foo
            @@ -1,3 +1,3 @@
             a
            -b
        "};
        assert_matches!(
            read_hunks(diff),
            Err(UnifiedDiffError::TruncatedHunk { line_number: 3 })
        );
    }

    #[test]
    fn test_read_hunks_too_many_removals() {
        let diff = indoc! {"
            --- a/foo
            +++ b/foo
            @@ -1,1 +1,1 @@
            -a
            -b
            +c
        "};
        assert_matches!(
            read_hunks(diff),
            Err(UnifiedDiffError::UnexpectedHunkLine { line_number: 5, line }) if line == "-b"
        );
    }
}
