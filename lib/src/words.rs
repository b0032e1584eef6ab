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

//! Splits a line into the words the character diff operates on.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Whitespace,
    Symbol,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_ascii_lowercase() {
            CharClass::Lowercase
        } else if c.is_ascii_uppercase() {
            CharClass::Uppercase
        } else if c.is_ascii_digit() {
            CharClass::Digit
        } else if c.is_whitespace() {
            CharClass::Whitespace
        } else {
            CharClass::Symbol
        }
    }

    /// Symbols and whitespace are words of their own, one per character.
    fn forms_runs(self) -> bool {
        !matches!(self, CharClass::Whitespace | CharClass::Symbol)
    }
}

/// Splits `line` into words: runs of lowercase letters, uppercase letters or
/// digits, where a single capital joins the lowercase run after it
/// ("FooBar" is "Foo", "Bar"). Every other character is a word by itself.
///
/// Concatenating the words reproduces `line`.
pub fn split_into_words(line: &str) -> Vec<&str> {
    let mut words = vec![];
    let mut word_start = 0;
    // Class of the previous character, and of the first character of the
    // current word.
    let mut last_class = None;
    let mut word_len = 0;
    for (pos, c) in line.char_indices() {
        let class = CharClass::of(c);
        let extends_word = match last_class {
            Some(last) if last == class => class.forms_runs(),
            Some(CharClass::Uppercase) => class == CharClass::Lowercase && word_len == 1,
            _ => false,
        };
        if extends_word {
            word_len += 1;
        } else {
            if pos > word_start {
                words.push(&line[word_start..pos]);
            }
            word_start = pos;
            word_len = 1;
        }
        last_class = Some(class);
    }
    if word_start < line.len() {
        words.push(&line[word_start..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use itertools::Itertools as _;
    use test_case::test_case;

    use super::*;

    #[test_case("" => Vec::<&str>::new() ; "empty")]
    #[test_case("foo" => vec!["foo"] ; "lowercase")]
    #[test_case("FOO" => vec!["FOO"] ; "uppercase")]
    #[test_case("Foo" => vec!["Foo"] ; "capitalized")]
    #[test_case("FOo" => vec!["FO", "o"] ; "capital run then lowercase")]
    #[test_case("fooBar" => vec!["foo", "Bar"] ; "camel case")]
    #[test_case("   FooBar" => vec![" ", " ", " ", "Foo", "Bar"] ; "whitespace is not merged")]
    #[test_case("a+=b" => vec!["a", "+", "=", "b"] ; "symbols are not merged")]
    #[test_case("x1y22" => vec!["x", "1", "y", "22"] ; "digits")]
    #[test_case("Test1TEST23testAbc{}" => vec!["Test", "1", "TEST", "23", "test", "Abc", "{", "}"] ; "mixed classes")]
    #[test_case("naïve" => vec!["na", "ï", "ve"] ; "non-ascii letter is a symbol")]
    fn test_split_into_words(line: &str) -> Vec<&str> {
        split_into_words(line)
    }

    #[test]
    fn test_split_into_words_jsx() {
        assert_eq!(
            split_into_words("<ImageDiffModeSelector filePair={filePair}"),
            vec![
                "<", "Image", "Diff", "Mode", "Selector", " ", "file", "Pair", "=", "{", "file",
                "Pair", "}",
            ]
        );
        assert_eq!(
            split_into_words("<DiffView filePair={filePair}"),
            vec!["<", "Diff", "View", " ", "file", "Pair", "=", "{", "file", "Pair", "}"]
        );
    }

    #[test]
    fn test_split_into_words_is_lossless() {
        for line in [
            "",
            "    return '' + date.getFullYear();",
            "\tfoo_bar(BazQux, 0x1F)\r",
            "émoji 🎉 ok",
        ] {
            assert_eq!(split_into_words(line).iter().join(""), line);
        }
    }
}
