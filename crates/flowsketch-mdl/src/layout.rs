//! Grid placement rules for rendered blocks.
//!
//! Every block kind has a fixed size and a position derived only from its index
//! within its own collection:
//!
//! | kind | x | y | size |
//! |---|---|---|---|
//! | process | `100 + (i mod 4) * 150` | `100 + (i div 4) * 100` | 100×50 |
//! | data store | `500 + (i mod 2) * 150` | `100 + i * 80` | 120×40 |
//! | inbound entity (even `i`) | `50` | `200 + i * 60` | 80×30 |
//! | outbound entity (odd `i`) | `750` | `200 + (i - 1) * 60` | 80×30 |

use std::fmt;

/// Width and height of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    width: i64,
    height: i64,
}

impl Size {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> i64 {
        self.width
    }

    pub fn height(self) -> i64 {
        self.height
    }
}

/// Axis-aligned block bounds anchored at the top-left corner.
///
/// Displays as an MDL position vector `[left, top, right, bottom]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    left: i64,
    top: i64,
    size: Size,
}

impl Bounds {
    pub fn new(left: i64, top: i64, size: Size) -> Self {
        Self { left, top, size }
    }

    pub fn left(self) -> i64 {
        self.left
    }

    pub fn top(self) -> i64 {
        self.top
    }

    pub fn right(self) -> i64 {
        self.left + self.size.width
    }

    pub fn bottom(self) -> i64 {
        self.top + self.size.height
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left(),
            self.top(),
            self.right(),
            self.bottom()
        )
    }
}

pub const PROCESS_SIZE: Size = Size::new(100, 50);
pub const DATA_STORE_SIZE: Size = Size::new(120, 40);
pub const ENTITY_SIZE: Size = Size::new(80, 30);

/// Direction of an external-entity boundary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// Rendered as an `Inport` on the left edge.
    Inbound,
    /// Rendered as an `Outport` on the right edge.
    Outbound,
}

impl PortDirection {
    /// Even indices are inbound, odd indices outbound.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PortDirection::Inbound
        } else {
            PortDirection::Outbound
        }
    }

    /// Returns the MDL block type for this direction.
    pub fn block_type(self) -> &'static str {
        match self {
            PortDirection::Inbound => "Inport",
            PortDirection::Outbound => "Outport",
        }
    }
}

fn coord(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Bounds of the process block at `index`.
pub fn process_bounds(index: usize) -> Bounds {
    let column = coord(index % 4);
    let row = coord(index / 4);
    Bounds::new(100 + column * 150, 100 + row * 100, PROCESS_SIZE)
}

/// Bounds of the data store block at `index`.
pub fn data_store_bounds(index: usize) -> Bounds {
    let column = coord(index % 2);
    Bounds::new(500 + column * 150, 100 + coord(index) * 80, DATA_STORE_SIZE)
}

/// Direction and bounds of the external entity block at `index`.
///
/// Outbound blocks use `index - 1` for their row, so each outbound block sits
/// level with the inbound block just before it.
pub fn entity_bounds(index: usize) -> (PortDirection, Bounds) {
    let direction = PortDirection::for_index(index);
    let bounds = match direction {
        PortDirection::Inbound => Bounds::new(50, 200 + coord(index) * 60, ENTITY_SIZE),
        PortDirection::Outbound => Bounds::new(750, 200 + coord(index - 1) * 60, ENTITY_SIZE),
    };
    (direction, bounds)
}
