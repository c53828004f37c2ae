//! # Section Styles
//!
//! Section names map to a fixed style: emphasis, alignment and a default
//! point size. The table is configuration data. A built-in table is embedded
//! from `styles.json`; callers can load their own with [`StyleTable::from_json`].
//!
//! ## Built-in Table
//!
//! | Section | Bold | Align | Default size |
//! |---------|------|-------|--------------|
//! | 타이틀 (title) | yes | center | 24 |
//! | 매장정보 (store info) | no | center | 16 |
//! | 구분선 (separator) | no | center | 14 |
//! | 상품목록 (items) | no | left | 14 |
//! | 합계 (total) | yes | right | 16 |
//! | 감사메시지 (thank you) | no | center | 16 |
//!
//! Unknown names resolve to regular, left-aligned text at the point size
//! written in the script.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{BluberryError, Result};
use crate::protocol::text::Alignment;
use crate::render::POINT_SIZES;

const BUILTIN_STYLES: &str = include_str!("styles.json");

/// Style of a named section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionStyle {
    pub bold: bool,
    pub align: Alignment,
    /// Default point size, used when a header gives only the name.
    pub size: f32,
}

/// One row of the style table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleEntry {
    pub name: String,
    #[serde(flatten)]
    pub style: SectionStyle,
}

/// Ordered lookup table from section name to [`SectionStyle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    sections: Vec<StyleEntry>,
}

impl StyleTable {
    /// Parse a table from JSON (`{"sections": [{"name", "bold", "align", "size"}]}`).
    ///
    /// Rejects empty or duplicate names and sizes outside 1..=255.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: StyleTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BluberryError::Config(format!("Failed to read styles {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// The built-in table shared by every caller.
    pub fn builtin() -> &'static StyleTable {
        static BUILTIN: OnceLock<StyleTable> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            StyleTable::from_json(BUILTIN_STYLES).expect("built-in style table is valid")
        })
    }

    fn validate(&self) -> Result<()> {
        for (i, entry) in self.sections.iter().enumerate() {
            if entry.name.trim().is_empty() || entry.name.trim() != entry.name {
                return Err(BluberryError::Config(format!(
                    "Style name '{}' must be non-empty and trimmed",
                    entry.name
                )));
            }
            if !POINT_SIZES.contains(&entry.style.size) {
                return Err(BluberryError::Config(format!(
                    "Style '{}' has invalid size {}",
                    entry.name, entry.style.size
                )));
            }
            if self.sections[..i].iter().any(|e| e.name == entry.name) {
                return Err(BluberryError::Config(format!(
                    "Duplicate style '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Style for a known section name.
    pub fn get(&self, name: &str) -> Option<&SectionStyle> {
        self.sections
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.style)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve `(bold, align)` for any section name.
    ///
    /// Unknown names are regular and left-aligned.
    pub fn resolve(&self, name: &str) -> (bool, Alignment) {
        self.get(name)
            .map(|s| (s.bold, s.align))
            .unwrap_or((false, Alignment::Left))
    }

    pub fn entries(&self) -> impl Iterator<Item = &StyleEntry> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = StyleTable::builtin();
        assert_eq!(table.len(), 6);

        let title = table.get("타이틀").unwrap();
        assert!(title.bold);
        assert_eq!(title.align, Alignment::Center);
        assert_eq!(title.size, 24.0);

        let total = table.get("합계").unwrap();
        assert!(total.bold);
        assert_eq!(total.align, Alignment::Right);

        assert_eq!(table.get("상품목록").unwrap().align, Alignment::Left);
    }

    #[test]
    fn test_unknown_name_resolves_to_plain_left() {
        let table = StyleTable::default();
        assert_eq!(table.resolve("메모"), (false, Alignment::Left));
        assert_eq!(table.resolve("타이틀"), (true, Alignment::Center));
    }

    #[test]
    fn test_custom_table() {
        let table = StyleTable::from_json(
            r#"{"sections": [{"name": "Header", "bold": true, "align": "right", "size": 30}]}"#,
        )
        .unwrap();
        assert_eq!(table.resolve("Header"), (true, Alignment::Right));
        assert!(!table.contains("타이틀"));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_sizes() {
        let dup = r#"{"sections": [
            {"name": "A", "bold": true, "align": "left", "size": 10},
            {"name": "A", "bold": false, "align": "left", "size": 12}
        ]}"#;
        assert!(matches!(StyleTable::from_json(dup), Err(BluberryError::Config(_))));

        let zero = r#"{"sections": [{"name": "A", "bold": true, "align": "left", "size": 0}]}"#;
        assert!(StyleTable::from_json(zero).is_err());

        let huge = r#"{"sections": [{"name": "A", "bold": true, "align": "left", "size": 1e30}]}"#;
        assert!(matches!(StyleTable::from_json(huge), Err(BluberryError::Config(_))));

        let padded = r#"{"sections": [{"name": " A", "bold": true, "align": "left", "size": 9}]}"#;
        assert!(StyleTable::from_json(padded).is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(StyleTable::from_json("{"), Err(BluberryError::Json(_))));
    }

    #[test]
    fn test_serializes_back_to_loadable_json() {
        let json = serde_json::to_string(StyleTable::builtin()).unwrap();
        assert_eq!(&StyleTable::from_json(&json).unwrap(), StyleTable::builtin());
    }
}
