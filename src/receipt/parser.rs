//! # Receipt Script Parser
//!
//! Reads section-tagged receipt text into a [`ReceiptScript`] in a single
//! left-to-right pass with one line of lookahead.
//!
//! ## Grammar
//!
//! Every line is trimmed before it is classified:
//!
//! | Line | Meaning |
//! |------|---------|
//! | *(blank)* | Ends the current section |
//! | `<name>, <size>` | Opens a text section; `size` is a number in 1..=255 |
//! | `<name>` | Opens a text section if `name` is in the style table, at its default size |
//! | `줄바꿈` / `줄바꿈, <n>` | Feed directive (`feed` also accepted); `n` defaults to 1 |
//! | `영수증 자르기` | Cut directive (`cut` also accepted) |
//! | `바코드, [<kind>, ]<data>` | Barcode directive (`barcode` also accepted), CODE128 by default |
//! | anything else | Content of the open section |
//!
//! A section's content runs until a blank line or the next header or
//! directive. Content outside any section is a [`MalformedSection`] error,
//! and so is a header whose size is positive but outside 1..=255. A size of
//! zero or below leaves the line as plain content.
//!
//! Directives are matched against the whole trimmed line, so a content line
//! reading exactly `cut` or `feed` (or their Korean forms) is a directive and
//! ends the section. Reword such lines to print them.
//!
//! ```text
//! 타이틀, 24          ← header: bold, centered, 24pt
//! 블루베리 카페        ← content
//!                     ← blank: section ends
//! 줄바꿈, 3           ← feed 3
//! 영수증 자르기        ← cut
//! ```
//!
//! [`MalformedSection`]: crate::error::BluberryError::MalformedSection

use std::str::FromStr;

use tracing::trace;

use super::script::{
    BARCODE_KEYWORDS, BarcodeDirective, CUT_KEYWORDS, FEED_KEYWORDS, FeedDirective,
    ReceiptScript, Section, TextBlock,
};
use super::style::StyleTable;
use crate::error::{BluberryError, Result};
use crate::protocol::barcode::BarcodeKind;
use crate::render::POINT_SIZES;

/// Parse a script with the built-in style table.
pub fn parse(text: &str) -> Result<ReceiptScript> {
    parse_with(text, StyleTable::builtin())
}

/// Parse a script, resolving section styles from `styles`.
pub fn parse_with(text: &str, styles: &StyleTable) -> Result<ReceiptScript> {
    let mut sections = Vec::new();
    let mut lines = text.lines().enumerate().peekable();

    while let Some((idx, raw)) = lines.next() {
        let line_no = idx + 1;
        let malformed = || BluberryError::MalformedSection {
            line: line_no,
            content: raw.to_string(),
        };

        let section = match classify(raw.trim(), styles) {
            Line::Blank => continue,
            Line::Cut => Section::Cut,
            Line::Feed(Some(line_count)) => Section::Feed(FeedDirective { line_count }),
            Line::Feed(None) => return Err(malformed()),
            Line::Barcode(None) => return Err(malformed()),
            Line::Barcode(Some(barcode)) => Section::Barcode(barcode),
            Line::Content(_) | Line::Header { size: None, .. } => return Err(malformed()),
            Line::Header {
                name,
                size: Some(size),
            } => {
                let mut content = Vec::new();
                while let Some(&(_, next)) = lines.peek() {
                    match classify(next.trim(), styles) {
                        Line::Content(text) => content.push(text.to_string()),
                        _ => break,
                    }
                    lines.next();
                }

                let (bold, align) = styles.resolve(name);
                Section::Text(TextBlock {
                    name: name.to_string(),
                    point_size: size,
                    bold,
                    align,
                    lines: content,
                })
            }
        };

        trace!(line = line_no, ?section, "parsed section");
        sections.push(section);
    }

    Ok(ReceiptScript::new(sections))
}

impl FromStr for ReceiptScript {
    type Err = BluberryError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// What a single trimmed line is, before section context is applied.
#[derive(Debug, PartialEq)]
enum Line<'a> {
    Blank,
    /// `size` is `None` when it is positive but outside [`POINT_SIZES`].
    Header { name: &'a str, size: Option<f32> },
    /// `None` when the count is a number outside 0..=255.
    Feed(Option<u8>),
    Cut,
    /// `None` when the directive has no data.
    Barcode(Option<BarcodeDirective>),
    Content(&'a str),
}

fn classify<'a>(line: &'a str, styles: &StyleTable) -> Line<'a> {
    if line.is_empty() {
        return Line::Blank;
    }
    if CUT_KEYWORDS.contains(&line) {
        return Line::Cut;
    }
    if FEED_KEYWORDS.contains(&line) {
        return Line::Feed(Some(1));
    }

    if let Some((keyword, rest)) = line.split_once(',') {
        let keyword = keyword.trim();
        let rest = rest.trim();

        if FEED_KEYWORDS.contains(&keyword) {
            return Line::Feed(feed_count(rest));
        }
        if BARCODE_KEYWORDS.contains(&keyword) {
            return Line::Barcode(barcode_directive(rest));
        }
    }

    if let Some(header) = header(line) {
        return header;
    }
    if let Some(style) = styles.get(line) {
        return Line::Header {
            name: line,
            size: Some(style.size),
        };
    }

    Line::Content(line)
}

/// `<name>, <size>` with exactly one `", "` separator and a positive size.
fn header(line: &str) -> Option<Line<'_>> {
    let mut parts = line.split(", ");
    let (name, size) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let name = name.trim();
    let size: f32 = size.trim().parse().ok()?;
    (!name.is_empty() && size > 0.0).then(|| Line::Header {
        name,
        size: POINT_SIZES.contains(&size).then_some(size),
    })
}

/// Feed count: unparsable text means 1, an out-of-range number is rejected.
fn feed_count(text: &str) -> Option<u8> {
    match text.parse::<i64>() {
        Ok(n) => u8::try_from(n).ok(),
        Err(_) => Some(1),
    }
}

fn barcode_directive(rest: &str) -> Option<BarcodeDirective> {
    let (kind, data) = match rest.split_once(", ") {
        Some((kind, data)) if BarcodeKind::from_name(kind.trim()).is_some() => {
            (BarcodeKind::from_name(kind.trim())?, data.trim())
        }
        _ => (BarcodeKind::default(), rest),
    };
    (!data.is_empty()).then(|| BarcodeDirective {
        kind,
        data: data.to_string(),
    })
}
