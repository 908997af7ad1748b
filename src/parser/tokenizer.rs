//! Line tokenizer: splits TOC text into indentation, title and page number.

use unicode_normalization::UnicodeNormalization;

use crate::error::Warning;
use crate::model::ParsedLine;

use super::options::TocOptions;

/// Output of [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    /// Usable lines in input order
    pub lines: Vec<ParsedLine>,

    /// Lines that were dropped
    pub warnings: Vec<Warning>,
}

/// Split raw TOC text into [`ParsedLine`] records.
///
/// A leading byte order mark is ignored and blank lines are skipped. Lines
/// without a usable title, or whose page number does not fit in an `i64`,
/// are dropped with a [`Warning::MalformedTocLine`].
pub fn tokenize(text: &str, options: &TocOptions) -> Tokenized {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut result = Tokenized::default();

    for (idx, line) in text.lines().enumerate() {
        let line_number = idx + 1;
        let content = line.trim();
        if content.is_empty() {
            continue;
        }

        let raw_indent = indent_width(line, options.tab_width);
        let (head, digits) = split_page(content);
        let title = head.trim_end_matches(is_separator).trim();

        if title.is_empty() {
            log::warn!(
                "Dropping TOC line {} without title: {:?}",
                line_number,
                content
            );
            result.warnings.push(Warning::MalformedTocLine {
                line: line_number,
                text: content.to_string(),
            });
            continue;
        }

        let page = match digits {
            Some(digits) => match digits.nfkc().collect::<String>().parse::<i64>() {
                Ok(page) => Some(page),
                Err(_) => {
                    log::warn!(
                        "Dropping TOC line {} with bad page: {:?}",
                        line_number,
                        content
                    );
                    result.warnings.push(Warning::MalformedTocLine {
                        line: line_number,
                        text: content.to_string(),
                    });
                    continue;
                }
            },
            None => None,
        };

        result
            .lines
            .push(ParsedLine::new(line_number, raw_indent, title, page));
    }

    result
}

/// Width of the leading whitespace of a line.
fn indent_width(line: &str, tab_width: usize) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| match c {
            '\t' => tab_width,
            '\u{3000}' => 2,
            _ => 1,
        })
        .sum()
}

/// Split a trimmed line into the text before its trailing digit run and the run itself.
///
/// A run that completes a dotted numbering token such as `1.2` is not a page.
fn split_page(content: &str) -> (&str, Option<&str>) {
    let start = content
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_page_digit(*c))
        .last()
        .map(|(i, _)| i);

    let Some(start) = start else {
        return (content, None);
    };

    let head = &content[..start];
    let mut before = head.chars().rev();
    if let (Some(dot), Some(prev)) = (before.next(), before.next()) {
        if matches!(dot, '.' | '．') && is_page_digit(prev) {
            return (content, None);
        }
    }

    (head, Some(&content[start..]))
}

fn is_page_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

/// Characters allowed between a title and its page number.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '．' | '·' | '…' | '⋯' | '•' | '_' | '-' | '—')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<ParsedLine> {
        tokenize(text, &TocOptions::default()).lines
    }

    #[test]
    fn test_dot_leaders() {
        let parsed = lines("Chapter 1 ......... 5\n  Section 1.1 ..... 6");
        assert_eq!(parsed[0], ParsedLine::new(1, 0, "Chapter 1", Some(5)));
        assert_eq!(parsed[1], ParsedLine::new(2, 2, "Section 1.1", Some(6)));
    }

    #[test]
    fn test_whitespace_separator() {
        let parsed = lines("Intro 1");
        assert_eq!(parsed[0].title, "Intro");
        assert_eq!(parsed[0].page, Some(1));
    }

    #[test]
    fn test_heading_without_page() {
        let parsed = lines("Part I\n  Chapter 1 3");
        assert!(parsed[0].is_heading_only());
        assert_eq!(parsed[0].title, "Part I");
        assert_eq!(parsed[1].page, Some(3));
    }

    #[test]
    fn test_numbering_token_is_not_a_page() {
        let parsed = lines("1.2");
        assert_eq!(parsed[0].title, "1.2");
        assert_eq!(parsed[0].page, None);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let parsed = lines("\n\nA 1\n   \n\nB 2\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].line_number, 3);
        assert_eq!(parsed[1].line_number, 6);
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("\tA", 4), 4);
        assert_eq!(indent_width("\t A", 8), 9);
        assert_eq!(indent_width("\u{3000}A", 4), 2);
        assert_eq!(indent_width("A", 4), 0);
    }

    #[test]
    fn test_cjk_and_fullwidth_digits() {
        let parsed = lines("第一章 总论……１２\n\u{3000}\u{3000}第一节 概述 13");
        assert_eq!(parsed[0].title, "第一章 总论");
        assert_eq!(parsed[0].page, Some(12));
        assert_eq!(parsed[1].title, "第一节 概述");
        assert_eq!(parsed[1].raw_indent, 4);
    }

    #[test]
    fn test_malformed_lines() {
        let result = tokenize("42\n........ 7\nReal 3", &TocOptions::default());
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            result.warnings[0],
            Warning::MalformedTocLine {
                line: 1,
                text: "42".to_string()
            }
        );
    }

    #[test]
    fn test_page_overflow_is_malformed() {
        let result = tokenize("Huge 99999999999999999999999", &TocOptions::default());
        assert!(result.lines.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let parsed = lines("\u{feff}  Chapter 1 5\n    Section 2 6");
        assert_eq!(parsed[0], ParsedLine::new(1, 2, "Chapter 1", Some(5)));
        assert_eq!(parsed[1], ParsedLine::new(2, 4, "Section 2", Some(6)));
    }

    #[test]
    fn test_crlf_input() {
        let parsed = lines("A 1\r\n  B 2\r\n");
        assert_eq!(parsed[1].title, "B");
        assert_eq!(parsed[1].page, Some(2));
    }
}
