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

//! Diff engine for side-by-side code review.
//!
//! Computes line diffs folded into display ranges, word-level character
//! diffs inside replaced lines, and splices those character diffs into
//! syntax-highlighted HTML without breaking its markup.

#![warn(missing_docs)]
#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod char_diff;
pub mod diff_view;
pub mod highlight;
pub mod html;
pub mod html_text_mapper;
pub mod line_diff;
pub mod sequence_matcher;
pub mod settings;
pub mod span_distributor;
pub mod unified_diff;
pub mod words;
