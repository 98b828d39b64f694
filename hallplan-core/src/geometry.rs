use std::collections::HashMap;
use std::ops::{Add, Sub};

use crate::layout::{LayoutConfig, SectionKind};
use crate::slot::SlotId;

/// Maximum distance between a probe point and a slot center for the probe
/// to count as landing on that slot.
pub const LANDING_TOLERANCE: f64 = 1e-6;

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Projection between slot identifiers and layout coordinates.
///
/// Hosts that render the layout implement this over their own geometry;
/// the resolvers only use it to carry relative offsets of grouped moves.
pub trait GeometryProjector {
    /// Center point of the slot, or None if the slot is not drawn.
    fn center(&self, slot: &SlotId) -> Option<Point>;

    /// The slot whose center lies exactly at `point`, if any.
    fn slot_at(&self, point: Point) -> Option<SlotId>;
}

impl<P: GeometryProjector + ?Sized> GeometryProjector for &P {
    fn center(&self, slot: &SlotId) -> Option<Point> {
        (*self).center(slot)
    }

    fn slot_at(&self, point: Point) -> Option<SlotId> {
        (*self).slot_at(point)
    }
}

const SIDE_GAP: i64 = 1;
const HALL_GAP: i64 = 2;

/// A unit-grid projector derived from the layout configuration.
///
/// Every plain section is one column, rows grow downward. A grouped
/// section is `group_width` columns wide with one unit per row. Sides are
/// separated by one empty column and halls by two. Geometry does not depend
/// on the fill direction.
#[derive(Debug, Clone, Default)]
pub struct GridProjector {
    centers: HashMap<SlotId, (i64, i64)>,
    cells: HashMap<(i64, i64), SlotId>,
}

impl GridProjector {
    pub fn new(config: &LayoutConfig) -> Self {
        let mut projector = GridProjector::default();
        let mut x = 0i64;

        for (h, hall) in config.halls.iter().enumerate() {
            let h = h as u32;
            for side in &hall.sides {
                for (s, section) in side.sections.iter().enumerate() {
                    let s = s as u32;
                    match section.kind {
                        SectionKind::Rows => {
                            for row in 0..section.capacity {
                                let slot = SlotId::plain(h, side.side, s, row);
                                projector.insert(slot, (x, i64::from(row)));
                            }
                            x += 1;
                        }
                        SectionKind::Grouped => {
                            let width = section.group_width.max(1);
                            for index in 0..section.capacity {
                                let (unit, member) = (index / width, index % width);
                                let slot = SlotId::member(h, side.side, s, unit, member);
                                projector.insert(slot, (x + i64::from(member), i64::from(unit)));
                            }
                            x += i64::from(width);
                        }
                    }
                }
                x += SIDE_GAP;
            }
            x += HALL_GAP - SIDE_GAP;
        }

        projector
    }

    fn insert(&mut self, slot: SlotId, cell: (i64, i64)) {
        self.cells.insert(cell, slot.clone());
        self.centers.insert(slot, cell);
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

impl GeometryProjector for GridProjector {
    fn center(&self, slot: &SlotId) -> Option<Point> {
        self.centers
            .get(slot)
            .map(|&(x, y)| Point::new(x as f64 + 0.5, y as f64 + 0.5))
    }

    fn slot_at(&self, point: Point) -> Option<SlotId> {
        let cx = (point.x - 0.5).round();
        let cy = (point.y - 0.5).round();
        if (point.x - 0.5 - cx).abs() > LANDING_TOLERANCE
            || (point.y - 0.5 - cy).abs() > LANDING_TOLERANCE
        {
            return None;
        }
        self.cells.get(&(cx as i64, cy as i64)).cloned()
    }
}
