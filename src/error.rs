//! Error types for scene-description construction.

use thiserror::Error;

/// Errors that can occur while building or transforming an object description.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The template tree has no body named `object` under its worldbody.
    #[error("template has no designated 'object' body under its worldbody")]
    MissingObjectRoot,

    /// Property extraction found a number of root bodies other than one.
    #[error("expected exactly 1 root body, found {found}")]
    RootBodyCount {
        /// How many root bodies were actually found.
        found: usize,
    },

    /// A size or scale attribute carried an unsupported number of components.
    #[error("invalid dimensionality for {what}: expected {expected}, found {found} components")]
    InvalidDimension {
        /// Which attribute was malformed (e.g. `geom size`, `box size`).
        what: String,
        /// Supported component counts, human-readable.
        expected: &'static str,
        /// Component count actually present.
        found: usize,
    },

    /// A marker site expected by a bounding accessor does not exist.
    #[error("marker site '{0}' not found")]
    SiteNotFound(String),

    /// A numeric attribute could not be parsed.
    #[error("malformed numeric attribute '{attribute}': {value:?}")]
    InvalidNumber {
        /// Attribute key whose value failed to parse.
        attribute: String,
        /// The offending raw value.
        value: String,
    },
}

impl SceneError {
    /// Creates an [`SceneError::InvalidDimension`] for `what`.
    pub fn invalid_dimension(what: impl Into<String>, expected: &'static str, found: usize) -> Self {
        Self::InvalidDimension {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Creates an [`SceneError::InvalidNumber`] for `attribute`.
    pub fn invalid_number(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}
