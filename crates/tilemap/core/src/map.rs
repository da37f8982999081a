//! The loaded map: layer table, global vision mask, rendering, walkability.

use std::collections::BTreeMap;

use crate::env::{RenderSurface, TilesetOracle};
use crate::error::LoadError;
use crate::grid::{GridSize, PixelVec, Position};
use crate::layer::Layer;
use crate::mask::OcclusionMask;

/// Diagonal sample offsets used by the walkability query.
const SAMPLE_OFFSETS: [(f32, f32); 4] = [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)];

/// Sample distance from the queried position, as a fraction of the tile size.
const SAMPLE_RADIUS: f32 = 0.3;

/// A fully loaded level map.
///
/// Constructed once per level load and held for the lifetime of the level.
/// The renderer and the walkability query read it every frame with no
/// internal locking; any mutation must be externally sequenced between
/// frames. The global mask is fixed at load time - masks do not follow
/// objects that move afterwards.
#[derive(Debug)]
pub struct Map {
    grid: GridSize,
    tile_size: u32,
    layers: BTreeMap<String, Layer>,
    global_mask: OcclusionMask,
}

impl Map {
    /// Creates an empty map shell; the loader fills in layers and the global
    /// mask.
    pub fn new(grid: GridSize, tile_size: u32) -> Self {
        let pixel = (grid.width * tile_size, grid.height * tile_size);
        Self {
            grid,
            tile_size,
            layers: BTreeMap::new(),
            global_mask: OcclusionMask::transparent(pixel.0, pixel.1),
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Total map extent in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.grid.width * self.tile_size,
            self.grid.height * self.tile_size,
        )
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Adds a layer, enforcing the cell-count invariant for tile and object
    /// layers. Vision layers are keyed by name and exempt.
    pub fn insert_layer(&mut self, name: impl Into<String>, layer: Layer) -> Result<(), LoadError> {
        let name = name.into();
        if let Some(actual) = layer.cell_count() {
            let expected = self.grid.cell_count();
            if actual != expected {
                return Err(LoadError::LayerLength {
                    layer: name,
                    expected,
                    actual,
                });
            }
        }
        self.layers.insert(name, layer);
        Ok(())
    }

    pub fn global_mask(&self) -> &OcclusionMask {
        &self.global_mask
    }

    pub fn set_global_mask(&mut self, mask: OcclusionMask) {
        self.global_mask = mask;
    }

    /// Draws the map in fixed order: ground, mid, objects, then the global
    /// vision mask composited at the map origin.
    pub fn render(&self, tileset: &dyn TilesetOracle, surface: &mut dyn RenderSurface) {
        self.render_layer("ground", tileset, surface);
        self.render_layer("mid", tileset, surface);
        self.render_layer("objects", tileset, surface);
        surface.blit_mask(&self.global_mask, PixelVec::new(0.0, 0.0));
    }

    /// Draws one named layer. A name absent from the layer table is a no-op;
    /// a description may legally omit any of the standard layers.
    pub fn render_layer(
        &self,
        name: &str,
        tileset: &dyn TilesetOracle,
        surface: &mut dyn RenderSurface,
    ) {
        let Some(layer) = self.layers.get(name) else {
            return;
        };
        match layer {
            Layer::Tiles(cells) => {
                for (index, cell) in cells.iter().enumerate() {
                    let Some(id) = cell else { continue };
                    if let Some(drawable) = tileset.drawable(*id) {
                        surface.blit(drawable, self.cell_center(index));
                    }
                }
            }
            Layer::Objects(cells) => {
                for (index, cell) in cells.iter().enumerate() {
                    if let Some(object) = cell {
                        object.render(surface, self.cell_center(index));
                    }
                }
            }
            // Vision regions draw only through the composited global mask.
            Layer::Vision(_) => {}
        }
    }

    /// Whether a continuous pixel position is open for movement.
    ///
    /// Samples four diagonal offsets at `0.3 * tile_size` around the
    /// position, approximating a bounding-footprint check: the position is
    /// walkable only if every sample lands on an in-bounds cell whose ground
    /// and mid tiles both carry no collision flag. Layers missing from the
    /// description count as all-empty.
    pub fn is_walkable(&self, tileset: &dyn TilesetOracle, at: PixelVec) -> bool {
        let tile_size = self.tile_size as f32;
        let (width_px, height_px) = self.pixel_size();
        if at.x < 0.0 || at.x >= width_px as f32 || at.y < 0.0 || at.y >= height_px as f32 {
            return false;
        }

        for (dx, dy) in SAMPLE_OFFSETS {
            // Truncating cast: a sample fractionally past the left/top edge
            // still lands in column/row 0, like the boundary checks above
            // already guaranteed for the queried position itself.
            let cell = Position::new(
                ((at.x + SAMPLE_RADIUS * dx * tile_size) / tile_size) as i32,
                ((at.y + SAMPLE_RADIUS * dy * tile_size) / tile_size) as i32,
            );
            let Some(index) = self.grid.index_of(cell) else {
                return false;
            };
            if self.tile_blocks("ground", index, tileset) || self.tile_blocks("mid", index, tileset)
            {
                return false;
            }
        }

        true
    }

    fn tile_blocks(&self, layer: &str, index: usize, tileset: &dyn TilesetOracle) -> bool {
        let Some(Layer::Tiles(cells)) = self.layers.get(layer) else {
            return false;
        };
        matches!(cells.get(index), Some(Some(id)) if tileset.blocks(*id))
    }

    /// Pixel-space center of a cell, the position everything in that cell is
    /// drawn at.
    fn cell_center(&self, index: usize) -> PixelVec {
        let tile_size = self.tile_size as f32;
        let width = self.grid.width as usize;
        PixelVec::new(
            ((index % width) as f32 + 0.5) * tile_size,
            ((index / width) as f32 + 0.5) * tile_size,
        )
    }
}
