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

//! Longest-matching-block sequence alignment.
//!
//! This is the Ratcliff/Obershelp style matcher known from the "difflib"
//! family. It finds the longest contiguous matching block, recurses into the
//! unmatched areas on both sides of it, and reports the result as a list of
//! opcodes.
//!
//! The matcher is close to linear on typical source files, but it degrades
//! to quadratic time on inputs with massive repetition. There is no timeout.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

/// Sequences at least this long are subject to the "popular element"
/// heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Kind of an edit-script entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One edit-script entry. Both ranges are half-open indices into the before
/// and after sequences respectively.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Opcode {
    pub tag: OpTag,
    pub before: Range<usize>,
    pub after: Range<usize>,
}

impl Opcode {
    pub fn new(tag: OpTag, before: Range<usize>, after: Range<usize>) -> Self {
        Opcode { tag, before, after }
    }
}

/// `before[before_start..][..len] == after[after_start..][..len]`
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct MatchingBlock {
    before_start: usize,
    after_start: usize,
    len: usize,
}

/// Aligns two sequences of comparable elements.
#[derive(Clone, Debug)]
pub struct SequenceMatcher<'a, T> {
    before: &'a [T],
    after: &'a [T],
    // Positions of every element of `after`, in increasing order. Popular
    // elements are left out.
    after_positions: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(before: &'a [T], after: &'a [T]) -> Self {
        Self::with_autojunk(before, after, true)
    }

    /// Creates a matcher. With `autojunk`, elements of a long `after`
    /// sequence that make up more than 1% of it can't seed a match, though
    /// they can still extend one.
    pub fn with_autojunk(before: &'a [T], after: &'a [T], autojunk: bool) -> Self {
        let mut after_positions: HashMap<&T, Vec<usize>> = HashMap::new();
        for (i, elt) in after.iter().enumerate() {
            after_positions.entry(elt).or_default().push(i);
        }
        let len = after.len();
        if autojunk && len >= AUTOJUNK_MIN_LEN {
            let max_occurrences = len / 100 + 1;
            let distinct_count = after_positions.len();
            after_positions.retain(|_, positions| positions.len() <= max_occurrences);
            let popular_count = distinct_count - after_positions.len();
            if popular_count > 0 {
                tracing::trace!(popular_count, len, "ignoring popular elements as match seeds");
            }
        }
        SequenceMatcher {
            before,
            after,
            after_positions,
        }
    }

    /// Finds the longest block in `before[before_range]` that also appears in
    /// `after[after_range]`. Of all maximal blocks, returns the one that starts
    /// earliest in `before`, and of those the one that starts earliest in
    /// `after`.
    fn find_longest_match(
        &self,
        before_range: Range<usize>,
        after_range: Range<usize>,
    ) -> MatchingBlock {
        let mut best = MatchingBlock {
            before_start: before_range.start,
            after_start: after_range.start,
            len: 0,
        };
        // Maps `j` to the length of the match ending at (i - 1, j - 1).
        let mut len_ending_at: HashMap<usize, usize> = HashMap::new();
        for i in before_range.clone() {
            let mut new_len_ending_at = HashMap::new();
            if let Some(positions) = self.after_positions.get(&self.before[i]) {
                for &j in positions {
                    if j < after_range.start {
                        continue;
                    }
                    if j >= after_range.end {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| len_ending_at.get(&prev))
                        .map_or(1, |len| len + 1);
                    new_len_ending_at.insert(j, k);
                    if k > best.len {
                        best = MatchingBlock {
                            before_start: i + 1 - k,
                            after_start: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            len_ending_at = new_len_ending_at;
        }

        // Popular elements never seed a match above, so grow the block over
        // any equal neighbors.
        while best.before_start > before_range.start
            && best.after_start > after_range.start
            && self.before[best.before_start - 1] == self.after[best.after_start - 1]
        {
            best.before_start -= 1;
            best.after_start -= 1;
            best.len += 1;
        }
        while best.before_start + best.len < before_range.end
            && best.after_start + best.len < after_range.end
            && self.before[best.before_start + best.len] == self.after[best.after_start + best.len]
        {
            best.len += 1;
        }
        best
    }

    /// Returns the maximal matching blocks in increasing order, with adjacent
    /// blocks merged.
    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0..self.before.len(), 0..self.after.len())];
        let mut blocks = vec![];
        while let Some((before_range, after_range)) = queue.pop() {
            let block = self.find_longest_match(before_range.clone(), after_range.clone());
            if block.len == 0 {
                continue;
            }
            let before_end = block.before_start + block.len;
            let after_end = block.after_start + block.len;
            if before_range.start < block.before_start && after_range.start < block.after_start {
                queue.push((
                    before_range.start..block.before_start,
                    after_range.start..block.after_start,
                ));
            }
            if before_end < before_range.end && after_end < after_range.end {
                queue.push((before_end..before_range.end, after_end..after_range.end));
            }
            blocks.push(block);
        }
        blocks.sort();

        let mut merged: Vec<MatchingBlock> = vec![];
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.before_start + last.len == block.before_start
                        && last.after_start + last.len == block.after_start =>
                {
                    last.len += block.len;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    /// Returns the edit script turning `before` into `after`. The opcodes
    /// tile both sequences in order.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut opcodes = vec![];
        let mut i = 0;
        let mut j = 0;
        let sentinel = MatchingBlock {
            before_start: self.before.len(),
            after_start: self.after.len(),
            len: 0,
        };
        for block in self.matching_blocks().into_iter().chain([sentinel]) {
            let tag = match (i < block.before_start, j < block.after_start) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                opcodes.push(Opcode::new(tag, i..block.before_start, j..block.after_start));
            }
            i = block.before_start + block.len;
            j = block.after_start + block.len;
            if block.len > 0 {
                opcodes.push(Opcode::new(
                    OpTag::Equal,
                    block.before_start..i,
                    block.after_start..j,
                ));
            }
        }
        opcodes
    }
}

/// Computes the opcodes between two sequences.
pub fn diff_opcodes<T: Eq + Hash>(before: &[T], after: &[T]) -> Vec<Opcode> {
    SequenceMatcher::new(before, after).opcodes()
}
