//! Fenced and inline code span detection.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex: fenced code"));
static INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").expect("valid regex: inline code"));

/// Byte ranges of the code spans in a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeRegions {
    ranges: Vec<Range<usize>>,
}

impl CodeRegions {
    /// Scan `text` once for fenced multi-line blocks and inline spans.
    pub fn scan(text: &str) -> Self {
        let ranges = FENCED
            .find_iter(text)
            .chain(INLINE.find_iter(text))
            .map(|m| m.range())
            .collect();
        Self { ranges }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&offset))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_covers_inner_lines() {
        let text = "before\n```\nmy age is 42\n```\nafter";
        let regions = CodeRegions::scan(text);
        assert!(regions.contains(text.find("my age").unwrap()));
        assert!(!regions.contains(text.find("after").unwrap()));
        assert!(!regions.contains(0));
    }

    #[test]
    fn inline_span_is_single_line() {
        let text = "run `cargo test` then\n`broken\nspan`";
        let regions = CodeRegions::scan(text);
        assert!(regions.contains(text.find("cargo").unwrap()));
        assert!(!regions.contains(text.find("broken").unwrap()));
    }

    #[test]
    fn plain_text_has_no_regions() {
        assert!(CodeRegions::scan("nothing to see").is_empty());
    }
}
