//! Parsed receipt scripts.
//!
//! A [`ReceiptScript`] is the ordered list of [`Section`]s read from script
//! text. Its [`Display`](std::fmt::Display) impl writes the script back in
//! the same text format, so `parse(script.to_string())` yields the same
//! sections.

use std::fmt;

use serde::Serialize;

use crate::protocol::barcode::BarcodeKind;
use crate::protocol::text::Alignment;

/// Keywords that start a feed directive (`줄바꿈, 3`).
pub const FEED_KEYWORDS: &[&str] = &["줄바꿈", "feed"];

/// Keywords that form a cut directive on their own line.
pub const CUT_KEYWORDS: &[&str] = &["영수증 자르기", "cut"];

/// Keywords that start a barcode directive (`바코드, 1234`).
pub const BARCODE_KEYWORDS: &[&str] = &["바코드", "barcode"];

/// A styled block of text lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub name: String,
    pub point_size: f32,
    pub bold: bool,
    pub align: Alignment,
    pub lines: Vec<String>,
}

impl TextBlock {
    /// Lines joined by `\n`, as handed to the rasterizer.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the block has no printable content.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }
}

/// Advance the paper by `line_count` motion units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedDirective {
    pub line_count: u8,
}

impl Default for FeedDirective {
    fn default() -> Self {
        Self { line_count: 1 }
    }
}

/// Print a 1D barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeDirective {
    pub kind: BarcodeKind,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Text(TextBlock),
    Feed(FeedDirective),
    Cut,
    Barcode(BarcodeDirective),
}

/// An ordered sequence of sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiptScript {
    pub sections: Vec<Section>,
}

impl ReceiptScript {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }
}

impl<'a> IntoIterator for &'a ReceiptScript {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Text(block) => {
                write!(f, "{}, {}", block.name, block.point_size)?;
                for line in &block.lines {
                    write!(f, "\n{}", line)?;
                }
                Ok(())
            }
            Section::Feed(feed) => write!(f, "{}, {}", FEED_KEYWORDS[0], feed.line_count),
            Section::Cut => f.write_str(CUT_KEYWORDS[0]),
            // The kind may be omitted only when the data cannot be mistaken for one.
            Section::Barcode(barcode)
                if barcode.kind == BarcodeKind::default()
                    && barcode
                        .data
                        .split_once(", ")
                        .is_none_or(|(k, _)| BarcodeKind::from_name(k).is_none()) =>
            {
                write!(f, "{}, {}", BARCODE_KEYWORDS[0], barcode.data)
            }
            Section::Barcode(barcode) => write!(
                f,
                "{}, {}, {}",
                BARCODE_KEYWORDS[0],
                barcode.kind.name(),
                barcode.data
            ),
        }
    }
}

impl fmt::Display for ReceiptScript {
    /// Sections separated by a blank line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str, size: f32, lines: &[&str]) -> TextBlock {
        TextBlock {
            name: name.to_string(),
            point_size: size,
            bold: false,
            align: Alignment::Left,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_text_joins_lines() {
        let b = block("상품목록", 14.0, &["아메리카노 4,500", "라떼 5,000"]);
        assert_eq!(b.text(), "아메리카노 4,500\n라떼 5,000");
        assert!(!b.is_empty());
        assert!(block("x", 1.0, &[]).is_empty());
    }

    #[test]
    fn test_display() {
        let script = ReceiptScript::new(vec![
            Section::Text(block("타이틀", 24.0, &["Hello"])),
            Section::Feed(FeedDirective { line_count: 3 }),
            Section::Barcode(BarcodeDirective {
                kind: BarcodeKind::Code128,
                data: "A-1".into(),
            }),
            Section::Barcode(BarcodeDirective {
                kind: BarcodeKind::Ean13,
                data: "490123456789".into(),
            }),
            Section::Cut,
        ]);
        assert_eq!(
            script.to_string(),
            "타이틀, 24\nHello\n\n줄바꿈, 3\n\n바코드, A-1\n\n바코드, ean13, 490123456789\n\n영수증 자르기"
        );
    }

    #[test]
    fn test_fractional_size_display() {
        let s = Section::Text(block("메모", 14.5, &[]));
        assert_eq!(s.to_string(), "메모, 14.5");
    }
}
