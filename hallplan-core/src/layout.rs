use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::slot::{Side, SlotId};

/// Error type for layout configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("layout has no halls")]
    NoHalls,
    #[error("hall {hall} section {section} has zero capacity")]
    ZeroCapacity { hall: usize, section: usize },
    #[error("hall {hall} section {section} has zero grouping width")]
    ZeroGroupWidth { hall: usize, section: usize },
    #[error("hall {hall} declares the {side:?} side twice")]
    DuplicateSide { hall: usize, side: Side },
    #[error("invalid layout file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Traversal order used to linearize the slot grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillDirection {
    /// Same row index across all sections before moving down.
    #[default]
    Row,
    /// Whole section top to bottom before moving to the next one.
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// A single column of plain slots.
    Rows,
    /// Multi-slot storage units, each `group_width` members wide.
    Grouped,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionConfig {
    pub kind: SectionKind,
    pub capacity: u32,
    #[serde(default = "default_group_width")]
    pub group_width: u32,
}

fn default_group_width() -> u32 {
    1
}

impl SectionConfig {
    pub fn rows(capacity: u32) -> Self {
        SectionConfig {
            kind: SectionKind::Rows,
            capacity,
            group_width: 1,
        }
    }

    pub fn grouped(capacity: u32, group_width: u32) -> Self {
        SectionConfig {
            kind: SectionKind::Grouped,
            capacity,
            group_width,
        }
    }

    /// Number of grouped units; zero for plain row sections.
    pub fn unit_count(&self) -> u32 {
        match self.kind {
            SectionKind::Rows => 0,
            SectionKind::Grouped => self.capacity.div_ceil(self.group_width.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideConfig {
    pub side: Side,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HallConfig {
    pub name: String,
    #[serde(default)]
    pub sides: Vec<SideConfig>,
}

impl HallConfig {
    pub fn new(name: impl Into<String>) -> Self {
        HallConfig {
            name: name.into(),
            sides: Vec::new(),
        }
    }

    pub fn with_side(mut self, side: Side, sections: Vec<SectionConfig>) -> Self {
        self.sides.push(SideConfig { side, sections });
        self
    }
}

/// Structural description of every hall in the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub halls: Vec<HallConfig>,
}

impl LayoutConfig {
    pub fn new(halls: Vec<HallConfig>) -> Self {
        LayoutConfig { halls }
    }

    /// Parses and validates a layout from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.halls.is_empty() {
            return Err(ConfigError::NoHalls);
        }
        for (h, hall) in self.halls.iter().enumerate() {
            let mut seen = HashSet::new();
            for side in &hall.sides {
                if !seen.insert(side.side) {
                    return Err(ConfigError::DuplicateSide {
                        hall: h,
                        side: side.side,
                    });
                }
                for (s, section) in side.sections.iter().enumerate() {
                    if section.capacity == 0 {
                        return Err(ConfigError::ZeroCapacity { hall: h, section: s });
                    }
                    if section.kind == SectionKind::Grouped && section.group_width == 0 {
                        return Err(ConfigError::ZeroGroupWidth { hall: h, section: s });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Enumerates every slot of the layout in fill order.
///
/// Plain row sections are interleaved according to `direction`; grouped
/// sections follow the plain slots of their side as contiguous blocks.
pub fn ordered_slots(config: &LayoutConfig, direction: FillDirection) -> Vec<SlotId> {
    let mut slots = Vec::new();

    for (h, hall) in config.halls.iter().enumerate() {
        let h = h as u32;
        for side in &hall.sides {
            let rows: Vec<(u32, u32)> = side
                .sections
                .iter()
                .enumerate()
                .filter(|(_, s)| s.kind == SectionKind::Rows)
                .map(|(i, s)| (i as u32, s.capacity))
                .collect();

            match direction {
                FillDirection::Row => {
                    let depth = rows.iter().map(|&(_, cap)| cap).max().unwrap_or(0);
                    for row in 0..depth {
                        for &(section, cap) in &rows {
                            if row < cap {
                                slots.push(SlotId::plain(h, side.side, section, row));
                            }
                        }
                    }
                }
                FillDirection::Column => {
                    for &(section, cap) in &rows {
                        for row in 0..cap {
                            slots.push(SlotId::plain(h, side.side, section, row));
                        }
                    }
                }
            }

            for (i, section) in side.sections.iter().enumerate() {
                if section.kind != SectionKind::Grouped {
                    continue;
                }
                let width = section.group_width.max(1);
                for index in 0..section.capacity {
                    slots.push(SlotId::member(
                        h,
                        side.side,
                        i as u32,
                        index / width,
                        index % width,
                    ));
                }
            }
        }
    }

    slots
}

/// The ordered slot sequence with constant-time position lookup.
///
/// This is the authority on slot validity.
#[derive(Debug, Clone, Default)]
pub struct SlotSpace {
    slots: Vec<SlotId>,
    positions: HashMap<SlotId, usize>,
}

impl SlotSpace {
    pub fn new(config: &LayoutConfig, direction: FillDirection) -> Self {
        Self::from_slots(ordered_slots(config, direction))
    }

    /// Builds a slot space from an externally supplied order.
    ///
    /// Repeated identifiers keep their first position.
    pub fn from_slots(slots: impl IntoIterator<Item = SlotId>) -> Self {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for slot in slots {
            if positions.contains_key(&slot) {
                continue;
            }
            positions.insert(slot.clone(), ordered.len());
            ordered.push(slot);
        }
        SlotSpace {
            slots: ordered,
            positions,
        }
    }

    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }

    pub fn position(&self, slot: &SlotId) -> Option<usize> {
        self.positions.get(slot).copied()
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.positions.contains_key(slot)
    }

    /// Slots from `slot` (inclusive) to the end of the sequence.
    pub fn walk_from(&self, slot: &SlotId) -> &[SlotId] {
        match self.position(slot) {
            Some(index) => &self.slots[index..],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
