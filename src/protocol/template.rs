//! # Command Templates
//!
//! A command template is an immutable opcode byte sequence with zero or more
//! parameter slots. Binding values into the slots produces a [`Command`]: a
//! freshly allocated byte sequence owned by the caller.
//!
//! ```text
//! template  ESC  J   [lines]          slot "lines": offset 2, width 1, 0..=255
//!           1B   4A  00
//!
//! bind(lines = 3)
//!           1B   4A  03               new Vec<u8>, template untouched
//! ```
//!
//! ## Multi-byte Slots
//!
//! Slots wider than one byte are encoded **little-endian** across adjacent
//! bytes, matching the ESC/POS `nL nH` convention:
//!
//! ```text
//! GS L nL nH   with margin = 0x0150   →   1D 4C 50 01
//! ```
//!
//! Templates are `const` values. [`CommandTemplate::new`] checks every slot at
//! compile time, so a slot that overruns its opcode bytes, or a range that does
//! not fit the slot width, fails the build rather than a print job.

use std::fmt;

use crate::error::{BluberryError, Result};

/// Inclusive range of values a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidRange {
    pub min: i64,
    pub max: i64,
}

impl ValidRange {
    pub const fn new(min: i64, max: i64) -> Self {
        assert!(min <= max, "range min must not exceed max");
        Self { min, max }
    }

    /// Full range of an unsigned byte.
    pub const BYTE: Self = Self::new(0, 255);

    /// Full range of an unsigned 16-bit word.
    pub const WORD: Self = Self::new(0, 65535);

    /// Boolean flag encoded as 0 or 1.
    pub const FLAG: Self = Self::new(0, 1);

    #[inline]
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check `value` against the range, naming `slot` on failure.
    pub fn check(&self, slot: &'static str, value: i64) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(BluberryError::OutOfRange {
                slot,
                value,
                range: *self,
            })
        }
    }
}

impl fmt::Display for ValidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// A mutable parameter position inside a template's opcode bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub range: ValidRange,
}

impl ParamSlot {
    /// A one-byte slot.
    pub const fn byte(name: &'static str, offset: usize, range: ValidRange) -> Self {
        Self {
            name,
            offset,
            width: 1,
            range,
        }
    }

    /// A two-byte little-endian slot (`nL nH`).
    pub const fn word(name: &'static str, offset: usize, range: ValidRange) -> Self {
        Self {
            name,
            offset,
            width: 2,
            range,
        }
    }
}

/// An immutable, named command layout from the primitive table.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    pub name: &'static str,
    pub opcode: &'static [u8],
    pub slots: &'static [ParamSlot],
}

impl CommandTemplate {
    /// Declare a template. Panics during const evaluation if a slot does not
    /// lie inside `opcode` or its range cannot be encoded in its width.
    pub const fn new(
        name: &'static str,
        opcode: &'static [u8],
        slots: &'static [ParamSlot],
    ) -> Self {
        let mut i = 0;
        while i < slots.len() {
            let slot = &slots[i];
            assert!(slot.width >= 1 && slot.width <= 4, "slot width must be 1..=4");
            assert!(
                slot.offset + slot.width <= opcode.len(),
                "slot overruns template opcode bytes"
            );
            assert!(slot.range.min >= 0, "slot values are unsigned");
            assert!(
                (slot.range.max as u64) < (1u64 << (8 * slot.width)),
                "slot range does not fit slot width"
            );
            i += 1;
        }
        Self {
            name,
            opcode,
            slots,
        }
    }

    /// Fixed length of every command built from this template.
    #[inline]
    pub const fn len(&self) -> usize {
        self.opcode.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.opcode.is_empty()
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&ParamSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Bind parameter values into a fresh copy of the opcode bytes.
    ///
    /// Every slot must be supplied exactly by name; unknown names and
    /// out-of-range values are rejected before any byte is produced.
    ///
    /// ## Example
    ///
    /// ```
    /// use bluberry::protocol::commands::PRINT_AND_FEED;
    ///
    /// let cmd = PRINT_AND_FEED.bind(&[("lines", 3)]).unwrap();
    /// assert_eq!(cmd.bytes(), &[0x1B, 0x4A, 0x03]);
    /// assert!(PRINT_AND_FEED.bind(&[("lines", 256)]).is_err());
    /// ```
    pub fn bind(&self, params: &[(&str, i64)]) -> Result<Command> {
        if let Some((unknown, _)) = params.iter().find(|(name, _)| self.slot(name).is_none()) {
            return Err(BluberryError::UnknownParameter {
                template: self.name,
                slot: unknown.to_string(),
            });
        }

        let mut bytes = self.opcode.to_vec();
        for slot in self.slots {
            // Last value wins when a name is repeated.
            let value = params
                .iter()
                .rev()
                .find(|(name, _)| *name == slot.name)
                .map(|(_, value)| *value)
                .ok_or(BluberryError::MissingParameter {
                    template: self.name,
                    slot: slot.name,
                })?;
            slot.range.check(slot.name, value)?;

            let le = (value as u32).to_le_bytes();
            bytes[slot.offset..slot.offset + slot.width].copy_from_slice(&le[..slot.width]);
        }

        Ok(Command {
            name: self.name,
            bytes,
        })
    }
}

/// A concrete, independently owned command byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    bytes: Vec<u8>,
}

impl Command {
    /// Wrap bytes produced outside the template table (payload-carrying
    /// commands such as raster images and text).
    pub(crate) fn from_parts(name: &'static str, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    /// Append a variable-length payload to a bound header.
    pub(crate) fn with_payload(mut self, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Name of the template (or payload command) that produced this command.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Command {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TWO_SLOTS: CommandTemplate = CommandTemplate::new(
        "two_slots",
        &[0x1D, b'X', 0x00, 0x00, 0x00, 0xEE],
        &[
            ParamSlot::byte("mode", 2, ValidRange::new(0, 3)),
            ParamSlot::word("pos", 3, ValidRange::WORD),
        ],
    );

    #[test]
    fn test_bind_places_values_and_keeps_other_bytes() {
        let cmd = TWO_SLOTS.bind(&[("mode", 2), ("pos", 0x1234)]).unwrap();
        assert_eq!(cmd.bytes(), &[0x1D, b'X', 0x02, 0x34, 0x12, 0xEE]);
        assert_eq!(cmd.len(), TWO_SLOTS.len());
        assert_eq!(cmd.name(), "two_slots");
    }

    #[test]
    fn test_bind_every_valid_value_has_fixed_length() {
        for mode in 0..=3 {
            for pos in [0, 1, 255, 256, 65534, 65535] {
                let cmd = TWO_SLOTS.bind(&[("mode", mode), ("pos", pos)]).unwrap();
                assert_eq!(cmd.len(), 6);
                assert_eq!(cmd.bytes()[2] as i64, mode);
                assert_eq!(u16::from_le_bytes([cmd.bytes()[3], cmd.bytes()[4]]) as i64, pos);
                assert_eq!(&cmd.bytes()[..2], &[0x1D, b'X']);
                assert_eq!(cmd.bytes()[5], 0xEE);
            }
        }
    }

    #[test]
    fn test_bind_rejects_out_of_range() {
        for (mode, pos) in [(4, 0), (-1, 0), (0, 65536), (0, -1)] {
            let err = TWO_SLOTS.bind(&[("mode", mode), ("pos", pos)]).unwrap_err();
            assert!(matches!(err, BluberryError::OutOfRange { .. }), "{err}");
        }
    }

    #[test]
    fn test_out_of_range_names_slot() {
        match TWO_SLOTS.bind(&[("mode", 9), ("pos", 0)]) {
            Err(BluberryError::OutOfRange { slot, value, range }) => {
                assert_eq!(slot, "mode");
                assert_eq!(value, 9);
                assert_eq!(range, ValidRange::new(0, 3));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_bind_missing_and_unknown() {
        assert!(matches!(
            TWO_SLOTS.bind(&[("mode", 1)]),
            Err(BluberryError::MissingParameter { slot: "pos", .. })
        ));
        assert!(matches!(
            TWO_SLOTS.bind(&[("mode", 1), ("pos", 1), ("bogus", 1)]),
            Err(BluberryError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_bind_returns_independent_buffers() {
        let mut a = TWO_SLOTS.bind(&[("mode", 1), ("pos", 1)]).unwrap().into_bytes();
        let b = TWO_SLOTS.bind(&[("mode", 2), ("pos", 2)]).unwrap();
        a[2] = 0x7F;
        assert_eq!(b.bytes()[2], 2);
        assert_eq!(TWO_SLOTS.opcode[2], 0x00);
    }
}
