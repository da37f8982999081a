//! Tilemap engine core shared across clients and tools.
//!
//! `tilemap-core` defines the loaded-map data model (layer table, placed
//! objects, vision masks), the fixed-order renderer, and the point-sample
//! walkability query. It performs no I/O and no parsing: descriptions are
//! turned into a [`Map`] by the `tilemap-content` loaders, and the tile
//! atlas, render target, and object behavior are injected through the traits
//! in [`env`] and [`object`].
pub mod env;
pub mod error;
pub mod grid;
pub mod layer;
pub mod map;
pub mod mask;
pub mod object;

pub use env::{RenderSurface, TilesetOracle};
pub use error::{EngineError, ErrorSeverity, LoadError};
pub use grid::{DrawableHandle, GridSize, PixelVec, Position, TileId};
pub use layer::{Layer, ObjectLayer, TileCell, TileLayer, VisionLayer, VisionRegion};
pub use map::Map;
pub use mask::OcclusionMask;
pub use object::{GameObject, ObjectFactory, ObjectRegistry, PropertyValue, SpawnContext};
