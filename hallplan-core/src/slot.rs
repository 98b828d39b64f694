use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an inventory item, as issued by the item catalog.
pub type ItemId = String;

/// Which flank of a hall a section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn code(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Side::Left),
            "R" => Some(Side::Right),
            _ => None,
        }
    }
}

/// Structured form of a slot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotAddress {
    /// A slot in a plain row section.
    Plain {
        hall: u32,
        side: Side,
        section: u32,
        row: u32,
    },
    /// A member slot of a grouped multi-slot unit.
    Member {
        hall: u32,
        side: Side,
        section: u32,
        unit: u32,
        member: u32,
    },
}

impl SlotAddress {
    pub fn hall(&self) -> u32 {
        match *self {
            SlotAddress::Plain { hall, .. } | SlotAddress::Member { hall, .. } => hall,
        }
    }

    pub fn side(&self) -> Side {
        match *self {
            SlotAddress::Plain { side, .. } | SlotAddress::Member { side, .. } => side,
        }
    }

    pub fn section(&self) -> u32 {
        match *self {
            SlotAddress::Plain { section, .. } | SlotAddress::Member { section, .. } => section,
        }
    }
}

/// Opaque slot identifier.
///
/// Plain slots render as `h{hall}.{L|R}.s{section}.r{row}`, grouped unit
/// members as `h{hall}.{L|R}.s{section}.u{unit}.m{member}`. Identifiers are
/// serialized as plain strings so persisted tables stay readable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    /// Identifier of a plain row slot.
    pub fn plain(hall: u32, side: Side, section: u32, row: u32) -> Self {
        SlotId(format!("h{hall}.{}.s{section}.r{row}", side.code()))
    }

    /// Identifier of a member slot inside a grouped unit.
    pub fn member(hall: u32, side: Side, section: u32, unit: u32, member: u32) -> Self {
        SlotId(format!(
            "h{hall}.{}.s{section}.u{unit}.m{member}",
            side.code()
        ))
    }

    /// Wraps a raw identifier without checking it.
    ///
    /// Validity is decided by the slot space, not by the string form.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        SlotId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier back into its structured address.
    pub fn address(&self) -> Option<SlotAddress> {
        let mut parts = self.0.split('.');
        let hall = numbered(parts.next()?, 'h')?;
        let side = Side::from_code(parts.next()?)?;
        let section = numbered(parts.next()?, 's')?;
        let fourth = parts.next()?;

        let address = if let Some(row) = numbered(fourth, 'r') {
            SlotAddress::Plain {
                hall,
                side,
                section,
                row,
            }
        } else {
            let unit = numbered(fourth, 'u')?;
            let member = numbered(parts.next()?, 'm')?;
            SlotAddress::Member {
                hall,
                side,
                section,
                unit,
                member,
            }
        };

        if parts.next().is_some() {
            return None;
        }
        Some(address)
    }

    /// Returns the index of the hall this slot belongs to.
    pub fn hall(&self) -> Option<u32> {
        self.address().map(|a| a.hall())
    }
}

fn numbered(part: &str, prefix: char) -> Option<u32> {
    part.strip_prefix(prefix)?.parse().ok()
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SlotId {
    fn from(raw: String) -> Self {
        SlotId(raw)
    }
}

impl From<&str> for SlotId {
    fn from(raw: &str) -> Self {
        SlotId(raw.to_string())
    }
}
