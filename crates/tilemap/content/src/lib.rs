//! Data-driven map descriptions and their loaders.
//!
//! This crate turns layered JSON map documents into live
//! [`tilemap_core::Map`] values:
//! - tile layers are stored with the 1-based authoring ids decremented
//! - the layer named `objects` is materialized through the object registry
//! - the layer named `vision` is rasterized into occlusion masks and the
//!   map-sized global mask
//!
//! Descriptions are consumed at level load and never appear in engine state.

pub mod formats;
pub mod loaders;

pub use formats::{LayerDoc, MapDoc, ObjectDoc, PointDoc};
pub use loaders::{ContentFactory, LoadResult, MapLoader};
