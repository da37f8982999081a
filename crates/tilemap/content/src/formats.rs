//! Serde document model for the JSON map description.
//!
//! Mirrors the authoring format field for field: a top-level `width`/`height`
//! plus an ordered `layers` list, where each layer carries either a flat
//! `data` array of 1-based tile ids or an `objects` array of placement
//! records. Vision regions arrive as objects with a `polyline`.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level map document.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDoc {
    /// Grid width in tiles. Optional here so its absence can surface as a
    /// schema error rather than a parse error.
    pub width: Option<u32>,

    /// Grid height in tiles.
    pub height: Option<u32>,

    #[serde(default)]
    pub layers: Vec<LayerDoc>,
}

/// One named layer of the description.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerDoc {
    pub name: String,

    /// Declared layer kind, `"tilelayer"` or other. Dispatch is by name
    /// first: layers called `objects` or `vision` are built as such
    /// regardless of the declared kind.
    #[serde(rename = "type")]
    pub kind: String,

    /// Flat tile-id array, 1-based, `0` meaning "no tile".
    #[serde(default)]
    pub data: Option<Vec<u32>>,

    /// Placement records for object and vision layers.
    #[serde(default)]
    pub objects: Option<Vec<ObjectDoc>>,
}

/// A placement record on an object or vision layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDoc {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    /// Pixel placement of the record's anchor.
    #[serde(default)]
    pub x: f32,

    #[serde(default)]
    pub y: f32,

    /// Record width in pixels, used as the tile pixel size reference when
    /// deriving the grid cell.
    #[serde(default)]
    pub width: f32,

    /// 1-based tile id of the object's drawable.
    #[serde(default)]
    pub gid: u32,

    /// Free-form per-object properties, forwarded to the object factory.
    #[serde(default)]
    pub properties: Option<BTreeMap<String, serde_json::Value>>,

    /// Polygon vertices for vision regions, relative to the anchor.
    #[serde(default)]
    pub polyline: Option<Vec<PointDoc>>,
}

/// A 2D point inside a `polyline` array.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointDoc {
    pub x: f32,
    pub y: f32,
}
