//! Content factory for resolving map files under a data directory.

use std::path::{Path, PathBuf};

use tilemap_core::{Map, ObjectRegistry, TilesetOracle};

use crate::loaders::{LoadResult, MapLoader};

/// Loads level content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// └── maps/
///     ├── hideout.json
///     └── courtyard.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load a map from `maps/{map_name}.json`.
    ///
    /// One-shot blocking operation performed once per level load; any failure
    /// is fatal to the load, there is no partial map and no retry.
    pub fn load_map(
        &self,
        map_name: &str,
        tile_size: u32,
        tileset: &dyn TilesetOracle,
        registry: &ObjectRegistry,
    ) -> LoadResult<Map> {
        let path = self
            .data_dir
            .join("maps")
            .join(format!("{}.json", map_name));
        MapLoader::load(&path, tile_size, tileset, registry)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
