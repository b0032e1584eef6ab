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

//! Syntax highlighting of whole files, split into lines.

use std::fmt::Debug;

use crate::span_distributor::distribute_spans;
use crate::span_distributor::DistributeSpansError;

/// A syntax highlighter producing HTML with `<span>` markup.
pub trait Highlighter: Debug {
    /// Returns `text` as HTML, with its text HTML-escaped and highlighted as
    /// `language`. Stripping the markup must yield `text` again.
    fn highlight(&self, text: &str, language: &str) -> String;

    /// Whether `language` is a name or alias the highlighter knows.
    fn supports_language(&self, language: &str) -> bool;

    /// Guesses the language of `text` from its tokens.
    fn detect_language(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Highlights `text` and splits the result into lines with balanced markup.
pub fn highlight_lines(
    highlighter: &dyn Highlighter,
    text: &str,
    language: &str,
) -> Result<Vec<String>, DistributeSpansError> {
    let html = highlighter.highlight(text, language);
    distribute_spans(&html)
}

/// Guesses the language of a file from its path.
///
/// Returns `None` unless the highlighter supports the guess.
pub fn guess_language_from_file_name(highlighter: &dyn Highlighter, path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let language = match file_name.rsplit_once('.') {
        Some((_, extension)) => match extension.to_ascii_lowercase().as_str() {
            "py" => "python".to_owned(),
            "sh" => "bash".to_owned(),
            "md" => "markdown".to_owned(),
            "js" => "javascript".to_owned(),
            extension => extension.to_owned(),
        },
        None if file_name == "Makefile" => "makefile".to_owned(),
        None => return None,
    };
    highlighter
        .supports_language(&language)
        .then_some(language)
}

/// Guesses the language of a file from its contents: first the interpreter
/// named on a `#!` line, then whatever the highlighter detects.
pub fn guess_language_from_contents(
    highlighter: &dyn Highlighter,
    contents: &str,
) -> Option<String> {
    if let Some(interpreter) = contents
        .split_once('\n')
        .and_then(|(first_line, _)| first_line.strip_prefix("#!"))
    {
        if let Some(language) = language_for_interpreter(interpreter.trim_end_matches('\r')) {
            return Some(language.to_owned());
        }
    }
    highlighter.detect_language(contents)
}

fn language_for_interpreter(interpreter: &str) -> Option<&'static str> {
    if interpreter == "/bin/bash" || interpreter == "/bin/sh" {
        return Some("bash");
    }
    [
        ("python", "python"),
        ("perl", "perl"),
        ("ruby", "ruby"),
        ("node", "javascript"),
    ]
    .into_iter()
    .find(|(name, _)| interpreter.contains(name))
    .map(|(_, language)| language)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[derive(Debug)]
    struct KnownLanguages(&'static [&'static str]);

    impl Highlighter for KnownLanguages {
        fn highlight(&self, text: &str, _language: &str) -> String {
            format!("<span class=x>{}</span>", html_escape::encode_text(text))
        }

        fn supports_language(&self, language: &str) -> bool {
            self.0.contains(&language)
        }

        fn detect_language(&self, text: &str) -> Option<String> {
            text.contains("def ").then(|| "python".to_owned())
        }
    }

    const HIGHLIGHTER: KnownLanguages = KnownLanguages(&[
        "bash", "css", "html", "javascript", "makefile", "markdown", "python",
    ]);

    #[test_case("/foo/bar/blah.html" => Some("html".to_owned()))]
    #[test_case("bar.html" => Some("html".to_owned()))]
    #[test_case("foo.css" => Some("css".to_owned()))]
    #[test_case("foo.py" => Some("python".to_owned()))]
    #[test_case("foo.sh" => Some("bash".to_owned()))]
    #[test_case("foo.js" => Some("javascript".to_owned()))]
    #[test_case("README.md" => Some("markdown".to_owned()))]
    #[test_case("Makefile" => Some("makefile".to_owned()))]
    #[test_case("src.d/Makefile" => Some("makefile".to_owned()))]
    #[test_case("foo.nonexistent" => None)]
    #[test_case("html" => None)]
    fn test_guess_language_from_file_name(path: &str) -> Option<String> {
        guess_language_from_file_name(&HIGHLIGHTER, path)
    }

    #[test_case("#!/usr/bin/env python\nprint 1 + 1\n" => Some("python".to_owned()))]
    #[test_case("#!/usr/local/bin/python\nprint 1 + 1\n" => Some("python".to_owned()))]
    #[test_case("#!/usr/bin/env node\n1\n" => Some("javascript".to_owned()))]
    #[test_case("#!/bin/bash\nopen $(git remote -v)\n" => Some("bash".to_owned()))]
    #[test_case("#!/bin/sh\r\nls\r\n" => Some("bash".to_owned()))]
    #[test_case("#!/usr/bin/perl -w\n" => Some("perl".to_owned()))]
    #[test_case("class Foo(object):\n    def __init__(self):\n" => Some("python".to_owned()))]
    #[test_case("#!/usr/bin/env zsh\necho\n" => None)]
    #[test_case("plain text" => None)]
    fn test_guess_language_from_contents(contents: &str) -> Option<String> {
        guess_language_from_contents(&HIGHLIGHTER, contents)
    }

    #[test]
    fn test_highlight_lines() {
        let lines = highlight_lines(&HIGHLIGHTER, "a < b\nc", "python").unwrap();
        assert_eq!(
            lines,
            vec!["<span class=x>a &lt; b</span>", "<span class=x>c</span>"]
        );
    }
}
