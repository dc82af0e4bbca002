//! Numbering tags.
//!
//! A tag is one or more `0` characters between angle brackets, optionally followed by
//! `:` and a decimal start number:
//!
//! | tag        | file index | expands to |
//! |------------|------------|------------|
//! | `<0>`      | 0          | `1`        |
//! | `<000>`    | 2          | `003`      |
//! | `<00:5>`   | 3          | `08`       |
//! | `<0:14>`   | 0          | `14`       |
//!
//! The number is `start + file_index` (start defaults to 1), left-padded with zeros to
//! as many digits as there are `0`s in the tag. Wider numbers are never truncated.
//! Expansion is a single pass: text produced by a tag is not scanned again.

use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(0+)(?::([0-9]+))?>").expect("tag pattern is valid"));

/// A piece of tag-expanded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// Text outside any tag, passed through untouched.
    Text(&'a str),
    /// The rendered number for one tag.
    Number(String),
}

/// Expand every numbering tag in `text` for the file at `file_index`.
pub fn expand(text: &str, file_index: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text, file_index) {
        match segment {
            Segment::Text(s) => out.push_str(s),
            Segment::Number(n) => out.push_str(&n),
        }
    }
    out
}

/// Whether `text` contains at least one numbering tag.
pub fn has_tags(text: &str) -> bool {
    TAG_PATTERN.is_match(text)
}

/// Split `text` into literal runs and rendered tag numbers.
///
/// All spans come from one left-to-right scan over the original text, so a
/// replacement can never shift the offsets of a later tag.
pub(crate) fn segments(text: &str, file_index: usize) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in TAG_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let zeros = caps.get(1).map_or(0, |m| m.len());
        let start = caps.get(2).map(|m| m.as_str());

        // Numbers that don't fit stay as literal text.
        let Some(number) = render_number(zeros, start, file_index) else {
            continue;
        };

        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Number(number));
        last = whole.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

fn render_number(width: usize, start: Option<&str>, file_index: usize) -> Option<String> {
    let start = match start {
        Some(digits) => digits.parse::<u64>().ok()?,
        None => 1,
    };
    let number = start.checked_add(u64::try_from(file_index).ok()?)?;
    Some(format!("{number:0>width$}"))
}
