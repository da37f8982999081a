//! Map description loader.
//!
//! Parses the JSON document and builds the layer table: tile layers are
//! stored with every id decremented (authored `0` becomes the empty
//! sentinel), the layer named `objects` is materialized through the object
//! registry, and the layer named `vision` is rasterized into occlusion masks
//! plus the map-sized global mask.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use tilemap_core::{
    GridSize, Layer, LoadError, Map, ObjectLayer, ObjectRegistry, OcclusionMask, PixelVec,
    Position, PropertyValue, SpawnContext, TileId, TileLayer, TilesetOracle, VisionLayer,
    VisionRegion,
};
use tracing::{debug, info, warn};

use crate::formats::{LayerDoc, MapDoc};
use crate::loaders::{LoadResult, read_file};

/// Placement records tagged with this type become vision regions; anything
/// else on the vision layer is ignored as a forward-compatible extension
/// point.
const FIELD_OF_VISION: &str = "FieldOfVision";

/// Loader for JSON map descriptions.
pub struct MapLoader;

impl MapLoader {
    /// Load a map description from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON document
    /// * `tile_size` - Tile pixel size of the tileset in use
    /// * `tileset` - Tile atlas lookup for object drawables
    /// * `registry` - Object factories keyed by placement type string
    pub fn load(
        path: &Path,
        tile_size: u32,
        tileset: &dyn TilesetOracle,
        registry: &ObjectRegistry,
    ) -> LoadResult<Map> {
        let content = read_file(path)?;
        let map = Self::from_json(&content, tile_size, tileset, registry)
            .with_context(|| format!("Failed to load map {}", path.display()))?;
        Ok(map)
    }

    /// Parses and builds a map from an in-memory JSON document.
    ///
    /// Any failure aborts the load as a whole; no partially built map is
    /// returned.
    pub fn from_json(
        json: &str,
        tile_size: u32,
        tileset: &dyn TilesetOracle,
        registry: &ObjectRegistry,
    ) -> Result<Map, LoadError> {
        let doc: MapDoc =
            serde_json::from_str(json).map_err(|e| LoadError::Malformed(e.to_string()))?;
        Self::build(doc, tile_size, tileset, registry)
    }

    fn build(
        doc: MapDoc,
        tile_size: u32,
        tileset: &dyn TilesetOracle,
        registry: &ObjectRegistry,
    ) -> Result<Map, LoadError> {
        let (Some(width), Some(height)) = (doc.width, doc.height) else {
            return Err(LoadError::MissingDimensions);
        };
        let grid = GridSize::new(width, height);
        let mut map = Map::new(grid, tile_size);

        for layer in &doc.layers {
            debug!(layer = %layer.name, kind = %layer.kind, "building layer");
            let built = if layer.name == "objects" {
                Layer::Objects(build_object_layer(layer, grid, tileset, registry)?)
            } else if layer.name == "vision" {
                let (regions, global) = build_vision_layer(layer, map.pixel_size());
                map.set_global_mask(global);
                Layer::Vision(regions)
            } else {
                Layer::Tiles(build_tile_layer(layer)?)
            };
            map.insert_layer(layer.name.clone(), built)?;
        }

        Ok(map)
    }
}

/// Stores a tile layer with the 1-based authoring convention reconciled:
/// every id is decremented, and an authored `0` becomes the empty sentinel.
fn build_tile_layer(layer: &LayerDoc) -> Result<TileLayer, LoadError> {
    let Some(data) = &layer.data else {
        return Err(LoadError::Malformed(format!(
            "layer '{}' has no tile data",
            layer.name
        )));
    };
    Ok(data
        .iter()
        .map(|&id| id.checked_sub(1).map(TileId))
        .collect())
}

/// Materializes placement records into owned objects on a grid.
fn build_object_layer(
    layer: &LayerDoc,
    grid: GridSize,
    tileset: &dyn TilesetOracle,
    registry: &ObjectRegistry,
) -> Result<ObjectLayer, LoadError> {
    let records = layer.objects.as_deref().unwrap_or(&[]);
    let mut cells: ObjectLayer = Vec::with_capacity(grid.cell_count());
    cells.resize_with(grid.cell_count(), || None);

    for record in records {
        if record.width <= 0.0 {
            return Err(LoadError::Malformed(format!(
                "object '{}' has no width to derive a grid cell from",
                record.name
            )));
        }

        // The record width doubles as the tile pixel size reference. The -1
        // on gy is the anchor-at-bottom adjustment of the authoring format.
        let gx = (record.x / record.width).floor() as i32;
        let gy = (record.y / record.width).floor() as i32 - 1;
        let position = Position::new(gx, gy);

        info!(name = %record.name, kind = %record.kind, %position, "loading object");

        let Some(index) = grid.index_of(position) else {
            return Err(LoadError::Malformed(format!(
                "object '{}' placed outside the grid at {}",
                record.name, position
            )));
        };

        // The object keeps the raw 1-based gid; the drawable lookup is where
        // the decrement happens.
        let drawable = record
            .gid
            .checked_sub(1)
            .and_then(|id| tileset.drawable(TileId(id)));
        let context = SpawnContext {
            name: record.name.clone(),
            position,
            gid: record.gid,
            drawable,
            properties: convert_properties(record.properties.as_ref()),
        };
        cells[index] = Some(registry.spawn(&record.kind, context)?);
    }

    Ok(cells)
}

/// Rasterizes field-of-vision regions and composites the global mask.
fn build_vision_layer(layer: &LayerDoc, pixel_size: (u32, u32)) -> (VisionLayer, OcclusionMask) {
    let records = layer.objects.as_deref().unwrap_or(&[]);
    let mut regions = VisionLayer::new();

    for record in records {
        if record.kind != FIELD_OF_VISION {
            debug!(name = %record.name, kind = %record.kind, "ignoring non-vision record");
            continue;
        }

        let vertices: Vec<PixelVec> = record
            .polyline
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|p| PixelVec::new(p.x, p.y))
            .collect();

        let local = OcclusionMask::from_polygon(&vertices);
        let (local_x, local_y) = local.origin();
        // Translate from polygon-local space into map-pixel space by
        // subtracting the mask's own local origin from the region anchor.
        let mask = local.placed_at(record.x as i32 - local_x, record.y as i32 - local_y);

        debug!(name = %record.name, vertices = vertices.len(), "built vision region");
        regions.insert(
            record.name.clone(),
            VisionRegion {
                vertices,
                anchor: PixelVec::new(record.x, record.y),
                mask,
            },
        );
    }

    // Union is commutative, so the composite is identical regardless of the
    // order regions appear in the description.
    let global = OcclusionMask::composite(pixel_size, regions.values().map(|r| &r.mask));
    (regions, global)
}

fn convert_properties(
    raw: Option<&BTreeMap<String, serde_json::Value>>,
) -> BTreeMap<String, PropertyValue> {
    let mut properties = BTreeMap::new();
    let Some(raw) = raw else {
        return properties;
    };
    for (key, value) in raw {
        let converted = match value {
            serde_json::Value::Bool(b) => PropertyValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => PropertyValue::String(s.clone()),
            _ => {
                warn!(%key, "skipping unsupported property value");
                continue;
            }
        };
        properties.insert(key.clone(), converted);
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use tilemap_core::{DrawableHandle, GameObject, RenderSurface};

    struct StubTileset;

    impl TilesetOracle for StubTileset {
        fn drawable(&self, id: TileId) -> Option<DrawableHandle> {
            (id.0 < 64).then_some(DrawableHandle(id.0))
        }

        fn blocks(&self, id: TileId) -> bool {
            id.0 == 9
        }
    }

    #[derive(Debug)]
    struct Chest {
        name: String,
        position: Position,
        gid: u32,
    }

    impl GameObject for Chest {
        fn name(&self) -> &str {
            &self.name
        }

        fn position(&self) -> Position {
            self.position
        }

        fn gid(&self) -> u32 {
            self.gid
        }

        fn render(&self, _surface: &mut dyn RenderSurface, _at: PixelVec) {}
    }

    fn registry() -> ObjectRegistry {
        let mut registry = ObjectRegistry::new();
        registry.register("Chest", |ctx| {
            Box::new(Chest {
                name: ctx.name,
                position: ctx.position,
                gid: ctx.gid,
            })
        });
        registry
    }

    /// Registry whose factory records every context it is handed.
    fn recording_registry(log: Rc<RefCell<Vec<SpawnContext>>>) -> ObjectRegistry {
        let mut registry = ObjectRegistry::new();
        registry.register("Chest", move |ctx| {
            log.borrow_mut().push(ctx.clone());
            Box::new(Chest {
                name: ctx.name,
                position: ctx.position,
                gid: ctx.gid,
            })
        });
        registry
    }

    fn load(json: &str) -> Result<Map, LoadError> {
        MapLoader::from_json(json, 32, &StubTileset, &registry())
    }

    #[test]
    fn tile_ids_are_stored_decremented() {
        let map = load(
            r#"{"width": 2, "height": 2, "layers": [
                {"name": "ground", "type": "tilelayer", "data": [1, 2, 3, 0]}
            ]}"#,
        )
        .unwrap();

        let tiles = map.layer("ground").unwrap().as_tiles().unwrap();
        assert_eq!(
            tiles,
            &vec![Some(TileId(0)), Some(TileId(1)), Some(TileId(2)), None]
        );
    }

    #[test]
    fn missing_dimensions_fail_the_load() {
        let err = load(r#"{"layers": []}"#).unwrap_err();
        assert_eq!(err, LoadError::MissingDimensions);
    }

    #[test]
    fn unparseable_document_is_malformed() {
        let err = load("not json at all").unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn short_tile_layer_fails_the_length_invariant() {
        let err = load(
            r#"{"width": 2, "height": 2, "layers": [
                {"name": "ground", "type": "tilelayer", "data": [1, 2, 3]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LoadError::LayerLength {
                layer: "ground".into(),
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn object_records_land_on_their_grid_cell() {
        let map = load(
            r#"{"width": 3, "height": 3, "layers": [
                {"name": "objects", "type": "objectgroup", "objects": [
                    {"name": "chest", "type": "Chest", "x": 32, "y": 64, "width": 32, "gid": 5}
                ]}
            ]}"#,
        )
        .unwrap();

        let objects = map.layer("objects").unwrap().as_objects().unwrap();
        assert_eq!(objects.len(), 9);

        // gy = floor(64 / 32) - 1 = 1, so index 1 + 1 * 3.
        let object = objects[4].as_ref().unwrap();
        assert_eq!(object.name(), "chest");
        assert_eq!(object.position(), Position::new(1, 1));
        assert_eq!(object.gid(), 5);
        assert!(objects.iter().enumerate().all(|(i, c)| i == 4 || c.is_none()));
    }

    #[test]
    fn object_drawable_is_resolved_at_gid_minus_one() {
        let log = Rc::new(RefCell::new(Vec::new()));
        MapLoader::from_json(
            r#"{"width": 3, "height": 3, "layers": [
                {"name": "objects", "type": "objectgroup", "objects": [
                    {"name": "chest", "type": "Chest", "x": 0, "y": 32, "width": 32, "gid": 5}
                ]}
            ]}"#,
            32,
            &StubTileset,
            &recording_registry(Rc::clone(&log)),
        )
        .unwrap();

        let contexts = log.borrow();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].gid, 5);
        assert_eq!(contexts[0].drawable, Some(DrawableHandle(4)));
    }

    #[test]
    fn unknown_object_type_aborts_the_whole_load() {
        let err = load(
            r#"{"width": 3, "height": 3, "layers": [
                {"name": "objects", "type": "objectgroup", "objects": [
                    {"name": "guard", "type": "Guard", "x": 0, "y": 32, "width": 32, "gid": 1}
                ]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LoadError::UnknownObjectType {
                name: "guard".into(),
                type_str: "Guard".into(),
            }
        );
    }

    #[test]
    fn properties_are_forwarded_to_the_factory() {
        let log = Rc::new(RefCell::new(Vec::new()));
        MapLoader::from_json(
            r#"{"width": 3, "height": 3, "layers": [
                {"name": "objects", "type": "objectgroup", "objects": [
                    {"name": "chest", "type": "Chest", "x": 0, "y": 32, "width": 32, "gid": 1,
                     "properties": {"locked": true, "loot": "key", "weight": 3, "ratio": 0.5}}
                ]}
            ]}"#,
            32,
            &StubTileset,
            &recording_registry(Rc::clone(&log)),
        )
        .unwrap();

        let contexts = log.borrow();
        let properties = &contexts[0].properties;
        assert_eq!(properties.get("locked"), Some(&PropertyValue::Bool(true)));
        assert_eq!(
            properties.get("loot"),
            Some(&PropertyValue::String("key".into()))
        );
        assert_eq!(properties.get("weight"), Some(&PropertyValue::Int(3)));
        assert_eq!(properties.get("ratio"), Some(&PropertyValue::Float(0.5)));
    }

    #[test]
    fn layer_named_objects_is_built_as_objects_regardless_of_kind() {
        let map = load(
            r#"{"width": 2, "height": 2, "layers": [
                {"name": "objects", "type": "tilelayer", "objects": []}
            ]}"#,
        )
        .unwrap();
        assert!(map.layer("objects").unwrap().as_objects().is_some());
    }

    #[test]
    fn only_field_of_vision_records_become_regions() {
        let map = load(
            r#"{"width": 2, "height": 2, "layers": [
                {"name": "vision", "type": "objectgroup", "objects": [
                    {"name": "fov", "type": "FieldOfVision", "x": 0, "y": 0,
                     "polyline": [{"x": 0, "y": 0}, {"x": 16, "y": 0}, {"x": 16, "y": 16}, {"x": 0, "y": 16}]},
                    {"name": "spawn", "type": "SpawnMarker", "x": 8, "y": 8}
                ]}
            ]}"#,
        )
        .unwrap();

        let regions = map.layer("vision").unwrap().as_vision().unwrap();
        assert_eq!(regions.len(), 1);
        assert!(regions.contains_key("fov"));
        assert_eq!(regions["fov"].vertices.len(), 4);
        assert!(map.global_mask().is_opaque(8, 8));
        assert!(!map.global_mask().is_opaque(40, 40));
    }

    #[test]
    fn vision_mask_anchor_translation() {
        let map = load(
            r#"{"width": 4, "height": 4, "layers": [
                {"name": "vision", "type": "objectgroup", "objects": [
                    {"name": "fov", "type": "FieldOfVision", "x": 32, "y": 32,
                     "polyline": [{"x": 0, "y": 0}, {"x": 64, "y": 0}, {"x": 64, "y": 32}, {"x": 0, "y": 32}]}
                ]}
            ]}"#,
        )
        .unwrap();

        let regions = map.layer("vision").unwrap().as_vision().unwrap();
        // Local origin (0, 0) subtracted from anchor (32, 32).
        assert_eq!(regions["fov"].mask.origin(), (32, 32));
        assert!(map.global_mask().is_opaque(40, 40));
        assert!(map.global_mask().is_opaque(95, 63));
        assert!(!map.global_mask().is_opaque(40, 70));
    }

    #[test]
    fn global_mask_is_order_independent() {
        let forward = r#"{"width": 4, "height": 4, "layers": [
            {"name": "vision", "type": "objectgroup", "objects": [
                {"name": "a", "type": "FieldOfVision", "x": 0, "y": 0,
                 "polyline": [{"x": 0, "y": 0}, {"x": 48, "y": 0}, {"x": 48, "y": 48}, {"x": 0, "y": 48}]},
                {"name": "b", "type": "FieldOfVision", "x": 64, "y": 64,
                 "polyline": [{"x": 0, "y": 0}, {"x": 32, "y": 0}, {"x": 32, "y": 32}, {"x": 0, "y": 32}]}
            ]}
        ]}"#;
        let reversed = r#"{"width": 4, "height": 4, "layers": [
            {"name": "vision", "type": "objectgroup", "objects": [
                {"name": "b", "type": "FieldOfVision", "x": 64, "y": 64,
                 "polyline": [{"x": 0, "y": 0}, {"x": 32, "y": 0}, {"x": 32, "y": 32}, {"x": 0, "y": 32}]},
                {"name": "a", "type": "FieldOfVision", "x": 0, "y": 0,
                 "polyline": [{"x": 0, "y": 0}, {"x": 48, "y": 0}, {"x": 48, "y": 48}, {"x": 0, "y": 48}]}
            ]}
        ]}"#;

        let first = load(forward).unwrap();
        let second = load(reversed).unwrap();
        assert_eq!(first.global_mask(), second.global_mask());
        assert!(first.global_mask().is_opaque(24, 24));
        assert!(first.global_mask().is_opaque(80, 80));
        assert!(!first.global_mask().is_opaque(56, 56));
    }

    #[test]
    fn missing_vision_layer_leaves_the_map_fully_visible() {
        let map = load(
            r#"{"width": 2, "height": 2, "layers": [
                {"name": "ground", "type": "tilelayer", "data": [1, 1, 1, 1]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(map.global_mask().opaque_count(), 0);
        assert_eq!(
            (map.global_mask().width(), map.global_mask().height()),
            (64, 64)
        );
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let json = r#"{"width": 2, "height": 2, "layers": [
            {"name": "ground", "type": "tilelayer", "data": [1, 2, 0, 4]},
            {"name": "objects", "type": "objectgroup", "objects": [
                {"name": "chest", "type": "Chest", "x": 0, "y": 32, "width": 32, "gid": 3}
            ]}
        ]}"#;

        let first = load(json).unwrap();
        let second = load(json).unwrap();

        assert_eq!(
            first.layer("ground").unwrap().as_tiles().unwrap(),
            second.layer("ground").unwrap().as_tiles().unwrap()
        );

        let a = first.layer("objects").unwrap().as_objects().unwrap();
        let b = second.layer("objects").unwrap().as_objects().unwrap();
        assert_eq!(a.len(), b.len());
        for (left, right) in a.iter().zip(b.iter()) {
            match (left, right) {
                (None, None) => {}
                (Some(l), Some(r)) => {
                    assert_eq!(l.name(), r.name());
                    assert_eq!(l.position(), r.position());
                    assert_eq!(l.gid(), r.gid());
                }
                _ => panic!("object layers differ in occupancy"),
            }
        }
    }
}
