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

use std::fs;
use std::path::Path;

use codediff_lib::highlight::Highlighter;
use codediff_lib::words::split_into_words;
use itertools::Itertools as _;
use rand::seq::SliceRandom as _;
use rand::Rng;
use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;

pub fn assert_no_forgotten_test_files(test_dir: &Path) {
    let runner_path = test_dir.join("runner.rs");
    let runner = fs::read_to_string(&runner_path).unwrap();
    let entries = fs::read_dir(test_dir).unwrap();
    for entry in entries {
        let path = entry.unwrap().path();
        if let Some(ext) = path.extension() {
            let name = path.file_stem().unwrap();
            if ext == "rs" && name != "runner" {
                let search = format!("mod {};", name.to_str().unwrap());
                assert!(
                    runner.contains(&search),
                    "missing `{search}` declaration in {}",
                    runner_path.display()
                );
            }
        }
    }
}

/// Deterministic random number generator for property-style tests.
pub fn new_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Lines drawn from a small vocabulary, so that many of them repeat.
pub fn random_lines(rng: &mut impl Rng, len: usize) -> Vec<String> {
    const VOCABULARY: &[&str] = &[
        "",
        "}",
        "  return x;",
        "  if (x) {",
        "function foo() {",
        "const bar = 1;",
        "// comment",
        "  x += 1;",
    ];
    (0..len)
        .map(|_| VOCABULARY.choose(rng).unwrap().to_string())
        .collect()
}

/// Applies a few random insertions, deletions and replacements to `lines`.
pub fn mutate_lines(rng: &mut impl Rng, lines: &[String]) -> Vec<String> {
    let mut mutated = lines.to_vec();
    for _ in 0..rng.gen_range(0..=5) {
        let pos = rng.gen_range(0..=mutated.len());
        match rng.gen_range(0..3) {
            0 => mutated.insert(pos, format!("inserted {}", rng.gen::<u16>())),
            1 if pos < mutated.len() => {
                mutated.remove(pos);
            }
            _ if pos < mutated.len() => {
                mutated[pos] = format!("{} // changed", mutated[pos]);
            }
            _ => {}
        }
    }
    mutated
}

/// Returns a random line of text and an HTML rendition of it with nested
/// `<span>`s around parts of it.
pub fn random_highlighted_line(rng: &mut impl Rng) -> (String, String) {
    const PIECES: &[&str] = &[
        "foo", "Bar", " ", "\t", "<", ">", "&", "x", "42", "é", "\"", "'", "()", "&lt;",
    ];
    let mut text = String::new();
    let mut html = String::new();
    let mut depth = 0;
    for _ in 0..rng.gen_range(0..16) {
        match rng.gen_range(0..4) {
            0 if depth < 3 => {
                html.push_str(r#"<span class="hljs-string">"#);
                depth += 1;
            }
            1 if depth > 0 => {
                html.push_str("</span>");
                depth -= 1;
            }
            _ => {
                let piece = PIECES.choose(rng).unwrap();
                text.push_str(piece);
                html.push_str(&html_escape::encode_text(piece));
            }
        }
    }
    html.push_str(&"</span>".repeat(depth));
    (text, html)
}

/// Highlighter marking up a handful of keywords and `/* */` comments.
/// Comments may span lines.
#[derive(Debug, Default)]
pub struct StubHighlighter;

impl StubHighlighter {
    const LANGUAGES: &'static [&'static str] = &["bash", "javascript", "makefile", "python"];
    const KEYWORDS: &'static [&'static str] =
        &["class", "const", "def", "else", "function", "if", "import", "let", "return"];

    fn highlight_keywords(text: &str) -> String {
        split_into_words(text)
            .into_iter()
            .map(|word| {
                if Self::KEYWORDS.contains(&word) {
                    format!(r#"<span class="hljs-keyword">{word}</span>"#)
                } else {
                    html_escape::encode_text(word).into_owned()
                }
            })
            .join("")
    }
}

impl Highlighter for StubHighlighter {
    fn highlight(&self, text: &str, _language: &str) -> String {
        let mut out = String::new();
        let mut rest = text;
        while let Some(start) = rest.find("/*") {
            let end = rest[start..]
                .find("*/")
                .map_or(rest.len(), |pos| start + pos + 2);
            out.push_str(&Self::highlight_keywords(&rest[..start]));
            out.push_str(r#"<span class="hljs-comment">"#);
            out.push_str(&html_escape::encode_text(&rest[start..end]));
            out.push_str("</span>");
            rest = &rest[end..];
        }
        out.push_str(&Self::highlight_keywords(rest));
        out
    }

    fn supports_language(&self, language: &str) -> bool {
        Self::LANGUAGES.contains(&language)
    }

    fn detect_language(&self, text: &str) -> Option<String> {
        if text.contains("def ") {
            Some("python".to_owned())
        } else if text.contains("function ") {
            Some("javascript".to_owned())
        } else {
            None
        }
    }
}
