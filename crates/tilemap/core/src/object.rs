//! Placed game objects and the type-string registry that constructs them.

use std::collections::BTreeMap;
use std::fmt;

use crate::env::RenderSurface;
use crate::error::LoadError;
use crate::grid::{DrawableHandle, PixelVec, Position};

/// Property value attached to an object placement record.
///
/// The description format allows free-form per-object properties; they are
/// forwarded untouched to the object factory.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Everything an object factory receives at construction time.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnContext {
    /// Object name from the placement record.
    pub name: String,

    /// Grid cell the object occupies, derived from its pixel placement.
    pub position: Position,

    /// Raw 1-based tile id (`gid`) from the placement record.
    pub gid: u32,

    /// Drawable resolved at `gid - 1` in the tileset.
    pub drawable: Option<DrawableHandle>,

    /// Optional per-object properties from the description.
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A game object owned by its object-layer cell.
///
/// Gameplay behavior lives outside the engine; the core only needs identity,
/// placement, and the ability to delegate drawing.
pub trait GameObject: fmt::Debug {
    fn name(&self) -> &str;

    fn position(&self) -> Position;

    /// Raw 1-based tile id the object was constructed with.
    fn gid(&self) -> u32;

    /// Draws the object at its cell center.
    fn render(&self, surface: &mut dyn RenderSurface, at: PixelVec);
}

/// Factory invoked by the loader for each placement record of a given type.
pub type ObjectFactory = Box<dyn Fn(SpawnContext) -> Box<dyn GameObject>>;

/// Maps placement type strings to object factories.
///
/// Populated once at startup by the embedding game. Looking up an
/// unregistered string is a typed error, not a crash: an unplayable map must
/// fail the whole load.
#[derive(Default)]
pub struct ObjectRegistry {
    factories: BTreeMap<String, ObjectFactory>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_str: impl Into<String>, factory: F)
    where
        F: Fn(SpawnContext) -> Box<dyn GameObject> + 'static,
    {
        self.factories.insert(type_str.into(), Box::new(factory));
    }

    pub fn is_registered(&self, type_str: &str) -> bool {
        self.factories.contains_key(type_str)
    }

    /// Constructs an object of the named type.
    pub fn spawn(
        &self,
        type_str: &str,
        context: SpawnContext,
    ) -> Result<Box<dyn GameObject>, LoadError> {
        match self.factories.get(type_str) {
            Some(factory) => Ok(factory(context)),
            None => Err(LoadError::UnknownObjectType {
                name: context.name,
                type_str: type_str.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker {
        name: String,
        position: Position,
        gid: u32,
    }

    impl GameObject for Marker {
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

    fn context(name: &str) -> SpawnContext {
        SpawnContext {
            name: name.to_string(),
            position: Position::new(2, 3),
            gid: 7,
            drawable: None,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn spawns_registered_types() {
        let mut registry = ObjectRegistry::new();
        registry.register("Marker", |ctx| {
            Box::new(Marker {
                name: ctx.name,
                position: ctx.position,
                gid: ctx.gid,
            })
        });

        let object = registry.spawn("Marker", context("flag")).unwrap();
        assert_eq!(object.name(), "flag");
        assert_eq!(object.position(), Position::new(2, 3));
        assert_eq!(object.gid(), 7);
    }

    #[test]
    fn unknown_type_is_a_typed_error() {
        let registry = ObjectRegistry::new();
        let err = registry.spawn("Ghost", context("g")).unwrap_err();
        assert_eq!(
            err,
            LoadError::UnknownObjectType {
                name: "g".into(),
                type_str: "Ghost".into(),
            }
        );
    }
}
