//! # mjcf-object
//!
//! An engine-agnostic builder for MJCF-like scene descriptions: constructs,
//! transforms, and merges tree-structured object descriptions (bodies, geoms,
//! joints, sites, sensors, actuators, materials) for a rigid-body physics
//! engine.
//!
//! It decouples *authoring* (templates or primitive parameters) from the
//! *world* (the engine's scene graph), producing a [`SceneObject`] whose
//! subtree can be instanced many times in one world: naming isolation keeps
//! instances collision-free, a group policy filters collision vs. visual
//! geometry, and a scale transform resizes every element consistently.
//!
//! Physics itself — stepping, contacts, collision detection — is an external
//! collaborator reached only through the injected [`PoseSource`].

pub mod element;
pub mod error;
pub mod geom;
pub mod object;
pub mod prefix;
pub mod scale;

pub use element::*;
pub use error::*;
pub use geom::*;
pub use object::*;
pub use prefix::*;
pub use scale::*;
