//! Common error infrastructure for tilemap-core.
//!
//! Load-time failures are typed and fatal to the whole map load: a partially
//! built map is never returned. Render and walkability paths are total and do
//! not surface errors; out-of-bounds access is prevented by bounds checks and
//! reported to the walkability caller as `false`.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition that may succeed on retry with different input.
    Recoverable,

    /// Invalid input, should not retry without changes.
    Validation,

    /// Unexpected state inconsistency. Indicates a bug.
    Internal,

    /// Unrecoverable, the operation cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for tilemap-core errors.
///
/// Use `#[derive(thiserror::Error)]` for the Display/Error impl and classify
/// severity based on recoverability, not impact.
pub trait EngineError: std::fmt::Display + std::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for error categorization, metrics, and testing.
    fn error_code(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Errors raised while turning a map description into a [`crate::Map`].
///
/// Any of these aborts the load as a whole; a malformed map is not playable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadError {
    /// The description has no usable width/height.
    #[error("map description is missing width/height")]
    MissingDimensions,

    /// A tile or object layer does not cover the grid exactly.
    #[error("layer '{layer}' has {actual} cells, expected {expected}")]
    LayerLength {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// The description could not be parsed as structured data, or a record
    /// inside it violates the schema.
    #[error("malformed map description: {0}")]
    Malformed(String),

    /// An object placement references a type string no factory is registered
    /// for.
    #[error("object '{name}' references unregistered type '{type_str}'")]
    UnknownObjectType { name: String, type_str: String },
}

impl EngineError for LoadError {
    fn severity(&self) -> ErrorSeverity {
        use LoadError::*;
        match self {
            // Unparseable document - nothing about the map can be trusted
            MissingDimensions | Malformed(_) => ErrorSeverity::Fatal,

            // Schema violations in an otherwise parseable document
            LayerLength { .. } | UnknownObjectType { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use LoadError::*;
        match self {
            MissingDimensions => "MAP_MISSING_DIMENSIONS",
            LayerLength { .. } => "MAP_LAYER_LENGTH",
            Malformed(_) => "MAP_MALFORMED",
            UnknownObjectType { .. } => "MAP_UNKNOWN_OBJECT_TYPE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_match_taxonomy() {
        assert_eq!(LoadError::MissingDimensions.severity(), ErrorSeverity::Fatal);
        assert_eq!(
            LoadError::UnknownObjectType {
                name: "guard".into(),
                type_str: "Ghost".into(),
            }
            .severity(),
            ErrorSeverity::Validation
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            LoadError::Malformed("bad json".into()).error_code(),
            "MAP_MALFORMED"
        );
    }
}
