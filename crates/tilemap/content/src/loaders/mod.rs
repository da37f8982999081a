//! Content loaders for reading map descriptions from files.
//!
//! Loaders convert the JSON documents in [`crate::formats`] into live
//! [`tilemap_core::Map`] values. File and I/O failures use [`anyhow`]; the
//! schema-level failures inside them are typed [`tilemap_core::LoadError`]s
//! and can be recovered by downcasting.

pub mod factory;
pub mod map;

pub use factory::ContentFactory;
pub use map::MapLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
