//! Traits describing the collaborators the engine is injected with.
//!
//! The tileset and the render surface are ambient globals in many engines;
//! here they are passed explicitly into the map's constructor and the
//! render/query methods so the core carries no hidden process-wide coupling.

use crate::grid::{DrawableHandle, PixelVec, TileId};
use crate::mask::OcclusionMask;

/// Read-only tile atlas lookup.
///
/// Both methods take the stored, already-decremented [`TileId`]; the 1-based
/// authoring convention never crosses this seam.
pub trait TilesetOracle {
    /// Resolves a tile id to a drawable, `None` for ids outside the atlas.
    fn drawable(&self, id: TileId) -> Option<DrawableHandle>;

    /// Per-tile collision flag consulted by the walkability query.
    fn blocks(&self, id: TileId) -> bool;
}

/// Drawing sink for the renderer.
///
/// Positions are map-pixel coordinates of the drawable's center, matching the
/// cell-center convention the renderer uses.
pub trait RenderSurface {
    fn blit(&mut self, drawable: DrawableHandle, at: PixelVec);

    /// Composites an occlusion mask over everything drawn so far.
    fn blit_mask(&mut self, mask: &OcclusionMask, at: PixelVec);
}
