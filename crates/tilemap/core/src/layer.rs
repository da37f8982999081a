//! Layer variants stored in the map's layer table.

use std::collections::BTreeMap;

use crate::grid::{PixelVec, TileId};
use crate::mask::OcclusionMask;
use crate::object::GameObject;

/// One grid cell worth of tile data. `None` is the empty sentinel: the
/// authored id `0` decrements to "no tile".
pub type TileCell = Option<TileId>;

/// Ordered tile ids, one per grid cell, addressed by `x + y * width`.
pub type TileLayer = Vec<TileCell>;

/// Same indexing as a tile layer, but each occupied cell exclusively owns a
/// game object. At most one object per cell.
pub type ObjectLayer = Vec<Option<Box<dyn GameObject>>>;

/// Named line-of-sight regions keyed by region name.
pub type VisionLayer = BTreeMap<String, VisionRegion>;

/// A polygon line-of-sight region from the vision layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisionRegion {
    /// Polygon vertices in local (region-relative) coordinates.
    pub vertices: Vec<PixelVec>,

    /// World placement of the region's local origin.
    pub anchor: PixelVec,

    /// Mask rasterized from the polygon, already translated into map-pixel
    /// space.
    pub mask: OcclusionMask,
}

/// Polymorphic layer content, dispatched exhaustively by the renderer and the
/// walkability query.
#[derive(Debug)]
pub enum Layer {
    Tiles(TileLayer),
    Objects(ObjectLayer),
    Vision(VisionLayer),
}

impl Layer {
    /// Number of grid cells this layer covers, `None` for vision layers,
    /// which are keyed by name rather than cell index.
    pub fn cell_count(&self) -> Option<usize> {
        match self {
            Layer::Tiles(cells) => Some(cells.len()),
            Layer::Objects(cells) => Some(cells.len()),
            Layer::Vision(_) => None,
        }
    }

    pub fn as_tiles(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tiles(cells) => Some(cells),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Objects(cells) => Some(cells),
            _ => None,
        }
    }

    pub fn as_vision(&self) -> Option<&VisionLayer> {
        match self {
            Layer::Vision(regions) => Some(regions),
            _ => None,
        }
    }
}
