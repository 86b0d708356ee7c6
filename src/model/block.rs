//! Page geometry types.

use serde::{Deserialize, Serialize};

/// Rectangular extent of a text region, in points.
///
/// Coordinates are top-down: `y0` is the top edge and `y1` the bottom edge,
/// with the origin at the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a bounding box from its four edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Grow this box to cover `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether the horizontal extents of the two boxes intersect.
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1
    }
}

/// One structural text region on a page.
///
/// Only produced while classifying the layout of page 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    /// Extent of the block on the page
    pub bbox: BBox,
    /// Raw text of the block, lines joined with `\n`
    pub text: String,
}

impl PageBlock {
    /// Create a new block.
    pub fn new(bbox: BBox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}
