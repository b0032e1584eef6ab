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

use codediff_lib::highlight::highlight_lines;
use codediff_lib::html::parse_fragment;
use codediff_lib::html::strip_tags;
use codediff_lib::html_text_mapper::HtmlTextMapper;
use codediff_lib::line_diff::split_lines;
use testutils::new_rng;
use testutils::random_highlighted_line;
use testutils::StubHighlighter;

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

#[test]
fn test_substrings_keep_their_text() {
    let mut rng = new_rng(0);
    for _ in 0..100 {
        let (text, html) = random_highlighted_line(&mut rng);
        let mapper = HtmlTextMapper::new(&text, &html).unwrap();
        let len = mapper.char_count();
        assert_eq!(len, text.chars().count());
        for start in 0..=len {
            for end in start..=len {
                let substring = mapper.get_html_substring(start, end);
                assert_eq!(
                    strip_tags(&substring).unwrap(),
                    char_slice(&text, start, end),
                    "slicing {start}..{end} of {html:?} gave {substring:?}"
                );
            }
        }
    }
}

#[test]
fn test_adjacent_substrings_concatenate_to_text() {
    let mut rng = new_rng(2);
    for _ in 0..100 {
        let (text, html) = random_highlighted_line(&mut rng);
        let mapper = HtmlTextMapper::new(&text, &html).unwrap();
        let len = mapper.char_count();
        let mid = len / 2;
        let joined = format!(
            "{}{}",
            mapper.get_html_substring(0, mid),
            mapper.get_html_substring(mid, len)
        );
        assert!(parse_fragment(&joined).is_ok(), "{joined:?} is malformed");
        assert_eq!(strip_tags(&joined).unwrap(), text);
    }
}

#[test]
fn test_slices_of_highlighted_lines() {
    let text = "function f() {\n  /* multi\n  line */ return 1;\n}";
    let lines = highlight_lines(&StubHighlighter, text, "javascript").unwrap();
    assert_eq!(
        lines,
        vec![
            r#"<span class="hljs-keyword">function</span> f() {"#,
            r#"  <span class="hljs-comment">/* multi</span>"#,
            r#"<span class="hljs-comment">  line */</span> <span class="hljs-keyword">return</span> 1;"#,
            "}",
        ]
    );
    for (line_text, line_html) in split_lines(text).into_iter().zip(&lines) {
        let mapper = HtmlTextMapper::new(line_text, line_html).unwrap();
        assert_eq!(
            mapper.get_html_substring(0, mapper.char_count()),
            line_html.as_str()
        );
    }

    let mapper = HtmlTextMapper::new("  line */ return 1;", &lines[2]).unwrap();
    assert_eq!(
        mapper.get_html_substring(2, 12),
        r#"<span class="hljs-comment">line */</span> <span class="hljs-keyword">re</span>"#
    );
}
