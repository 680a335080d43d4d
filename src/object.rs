//! Object model: builds a finished, fully-prefixed object subtree from a
//! pre-authored template tree or from primitive parameters.
//!
//! A [`SceneObject`] owns exactly one root body subtree plus an asset
//! collection. Construction runs synchronously: filter geoms by group
//! policy, inject joints and the default marker site, optionally scale,
//! extract and cache name lists, then apply the instance naming prefix.
//! Afterwards the subtree is a finished, read-mostly value ready for
//! insertion into a larger world tree.

use crate::element::{Element, format_vec3, format_vector, merge_assets};
use crate::error::SceneError;
use crate::geom::{
    GeomGroup, OBJECT_COLLISION_COLOR, SortedElements, VISUAL_GEOM_MASS, filter_geoms,
    sort_elements,
};
use crate::prefix::{PrefixTarget, add_prefix, correct_naming, exclude_nothing};
use crate::scale::{Scale, apply_scale};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Attributes of the spherical site used to mark a body origin.
fn site_attrib_template() -> Element {
    Element::new("site")
        .with_attr("pos", "0 0 0")
        .with_attr("size", "0.002 0.002 0.002")
        .with_attr("rgba", "1 0 0 1")
        .with_attr("type", "sphere")
        .with_attr("group", "0")
}

/// A single joint specification: a free-form ordered attribute bag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    attrs: Vec<(String, String)>,
}

impl JointSpec {
    /// An empty joint spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default free joint.
    pub fn free() -> Self {
        Self::new().with_attr("type", "free")
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the attribute value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets (or overwrites) the attribute `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key, value)),
        }
    }

    fn to_element(&self) -> Element {
        let mut joint = Element::new("joint");
        for (k, v) in &self.attrs {
            joint.set(k.clone(), v.clone());
        }
        joint
    }
}

/// Joint configuration for an object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Joints {
    /// No joints: the object is welded to its parent.
    None,
    /// A single free joint.
    #[default]
    Default,
    /// Explicit joint specifications, in order.
    Custom(Vec<JointSpec>),
}

impl Joints {
    /// Resolves to the concrete spec list, auto-naming every unnamed joint
    /// `joint<i>` in specification order.
    fn resolve(self) -> Vec<JointSpec> {
        let mut specs = match self {
            Self::None => Vec::new(),
            Self::Default => vec![JointSpec::free()],
            Self::Custom(specs) => specs,
        };
        for (i, spec) in specs.iter_mut().enumerate() {
            if spec.get("name").is_none() {
                spec.set("name", format!("joint{i}"));
            }
        }
        specs
    }
}

/// A texture / material declaration pair for an object's asset collection.
///
/// A shared material keeps its global name across instances: its material and
/// texture names are exempted from per-instance prefixing so many objects can
/// reference one definition, deduplicated at world assembly by the asset
/// merger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomMaterial {
    /// The `texture` asset element.
    pub texture: Element,
    /// The `material` asset element (references the texture by name).
    pub material: Element,
    /// Whether the names stay global instead of being instance-prefixed.
    pub shared: bool,
}

impl CustomMaterial {
    /// Builds a flat procedural texture / material pair from an rgba color,
    /// with the conventional element attributes.
    pub fn from_rgba(rgba: [f32; 4], tex_name: &str, mat_name: &str, shared: bool) -> Self {
        let rgb = format_vector(&rgba[..3]);
        let texture = Element::new("texture")
            .with_attr("name", tex_name)
            .with_attr("type", "cube")
            .with_attr("builtin", "flat")
            .with_attr("rgb1", rgb.clone())
            .with_attr("rgb2", rgb)
            .with_attr("width", "100")
            .with_attr("height", "100");
        let material = Element::new("material")
            .with_attr("name", mat_name)
            .with_attr("texture", tex_name);
        Self {
            texture,
            material,
            shared,
        }
    }

    /// The material's declared name.
    pub fn name(&self) -> &str {
        self.material.get("name").unwrap_or_default()
    }

    /// The texture's declared name.
    pub fn texture_name(&self) -> &str {
        self.texture.get("name").unwrap_or_default()
    }
}

/// How a primitive object is colored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MaterialSpec {
    /// Plain rgba coloring, no material.
    #[default]
    None,
    /// A per-instance template material derived from the object's rgba.
    Default,
    /// An externally supplied material, possibly shared across instances.
    Custom(CustomMaterial),
}

/// Geometric primitives an object can be generated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveShape {
    /// Half-extent sizes `[x, y, z]`.
    Box,
    /// Size `[radius]`.
    Sphere,
    /// Size `[radius, half-length]`.
    Cylinder,
    /// Size `[radius, half-length]`; total height adds the end caps.
    Capsule,
}

impl PrimitiveShape {
    /// The engine geom `type` string.
    pub fn geom_type(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Capsule => "capsule",
        }
    }

    /// Required number of size components.
    pub fn size_len(self) -> usize {
        match self {
            Self::Box => 3,
            Self::Sphere => 1,
            Self::Cylinder | Self::Capsule => 2,
        }
    }

    fn check_size(self, size: &[f32]) -> Result<(), SceneError> {
        if size.len() != self.size_len() {
            return Err(SceneError::InvalidDimension {
                what: format!("{} size", self.geom_type()),
                expected: match self.size_len() {
                    1 => "1",
                    2 => "2",
                    _ => "3",
                },
                found: size.len(),
            });
        }
        Ok(())
    }

    fn bottom_offset(self, size: &[f32]) -> Vec3 {
        let half_height = match self {
            Self::Box => size[2],
            Self::Sphere => size[0],
            Self::Cylinder => size[1],
            Self::Capsule => size[0] + size[1],
        };
        Vec3::new(0.0, 0.0, -half_height)
    }

    fn top_offset(self, size: &[f32]) -> Vec3 {
        -self.bottom_offset(size)
    }

    fn horizontal_radius(self, size: &[f32]) -> f32 {
        match self {
            Self::Box => Vec3::new(size[0], size[1], 0.0).length(),
            _ => size[0],
        }
    }

    fn bounding_half_size(self, size: &[f32]) -> Vec3 {
        match self {
            Self::Box => Vec3::new(size[0], size[1], size[2]),
            _ => Vec3::new(size[0], size[0], -self.bottom_offset(size).z),
        }
    }

    /// Applies `scale` to this shape's size components, mirroring the rules
    /// the scale transform applies to the geom `size` attributes in the tree.
    fn rescale_size(self, size: &mut [f32], scale: Scale) {
        match self {
            Self::Box => {
                let f = scale.factor();
                size[0] *= f.x;
                size[1] *= f.y;
                size[2] *= f.z;
            }
            Self::Sphere => size[0] *= scale.mean(),
            Self::Cylinder | Self::Capsule => match scale {
                Scale::Uniform(s) => size[1] *= s,
                Scale::PerAxis(_) => {
                    size[0] *= scale.width_factor();
                    size[1] *= scale.height_factor();
                }
            },
        }
    }
}

/// Parameters for a procedurally generated primitive object.
///
/// [`PrimitiveParams::new`] fills every field with the engine defaults;
/// callers override fields directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveParams {
    /// Unique object name (must be unique across the world).
    pub name: String,
    /// Which primitive to generate.
    pub shape: PrimitiveShape,
    /// Shape size parameters; component count is fixed per shape.
    pub size: Vec<f32>,
    /// Color, used for the visual geom when no material is set.
    pub rgba: [f32; 4],
    /// Density in kg/m³.
    pub density: f32,
    /// Sliding, torsional, and rolling friction.
    pub friction: [f32; 3],
    /// Contact solver reference parameters.
    pub solref: [f32; 2],
    /// Contact solver impedance parameters.
    pub solimp: [f32; 3],
    /// Coloring / material policy.
    pub material: MaterialSpec,
    /// Joint configuration.
    pub joints: Joints,
}

impl PrimitiveParams {
    /// Creates parameters with the engine defaults: red opaque rgba, water
    /// density, default friction and contact-solver settings, no material,
    /// a single free joint.
    pub fn new(name: impl Into<String>, shape: PrimitiveShape, size: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape,
            size,
            rgba: [1.0, 0.0, 0.0, 1.0],
            density: 1000.0,
            friction: [1.0, 0.005, 0.0001],
            solref: [0.001, 1.0],
            solimp: [0.998, 0.998, 0.001],
            material: MaterialSpec::None,
            joints: Joints::Default,
        }
    }

    /// Sets only the sliding friction, keeping the torsional and rolling
    /// defaults.
    pub fn with_sliding_friction(mut self, sliding: f32) -> Self {
        self.friction[0] = sliding;
        self
    }
}

/// Configuration for an object built from a pre-authored template tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateObjectConfig {
    /// Unique object name; derives the naming prefix.
    pub name: String,
    /// Joint configuration (joints are expected to be absent from the raw
    /// template and are added here).
    pub joints: Joints,
    /// Which geom groups survive construction.
    pub obj_type: GeomGroup,
    /// Whether kept collision geoms are recolored in place with the
    /// collision marker color (the template-path duplication policy).
    pub duplicate_collision_geoms: bool,
    /// Optional scale applied once during construction.
    pub scale: Option<Scale>,
}

impl TemplateObjectConfig {
    /// Default configuration for `name`: one free joint, all geom groups,
    /// collision recoloring on, no scaling.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joints: Joints::Default,
            obj_type: GeomGroup::All,
            duplicate_collision_geoms: true,
            scale: None,
        }
    }
}

/// Live-pose accessor consumed by [`SceneObject::position`] and
/// [`SceneObject::orientation`].
///
/// Implemented over a running simulation and injected explicitly; the object
/// never performs ambient lookups. Returned values may be one step stale and
/// carry no ordering guarantee relative to concurrent stepping.
pub trait PoseSource {
    /// World position of the named body, if known.
    fn body_position(&self, body: &str) -> Option<Vec3>;

    /// World orientation of the named body in the engine's `w x y z` order,
    /// if known.
    fn body_orientation_wxyz(&self, body: &str) -> Option<[f32; 4]>;
}

enum ObjectKind {
    /// Built from a template; keeps the worldbody remainder holding the
    /// template's marker sites.
    Template { markers: Element },
    /// Procedurally generated from primitive parameters.
    Primitive { shape: PrimitiveShape, size: Vec<f32> },
}

/// A finished scene object: one fully-prefixed root body subtree plus its
/// asset collection and cached name metadata.
///
/// Single-writer, many-reader after construction: placement calls mutate the
/// subtree in place and must be serialized by the caller against reads of
/// derived metadata.
pub struct SceneObject {
    name: String,
    obj_type: GeomGroup,
    duplicate_collision_geoms: bool,
    scale: Option<Scale>,
    kind: ObjectKind,
    root: Element,
    asset: Element,
    shared_materials: HashSet<String>,
    shared_textures: HashSet<String>,
    props: SortedElements,
    pose_source: Option<Box<dyn PoseSource>>,
}

// Manual impl: the injected pose source is an opaque trait object.
impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("name", &self.name)
            .field("obj_type", &self.obj_type)
            .field("duplicate_collision_geoms", &self.duplicate_collision_geoms)
            .field("scale", &self.scale)
            .field("root", &self.root)
            .field("asset", &self.asset)
            .finish_non_exhaustive()
    }
}

impl SceneObject {
    /// Builds an object from a pre-parsed template tree.
    ///
    /// `template` is either the full parsed document (a root holding a
    /// `worldbody` and optionally an `asset` collection) or a bare
    /// `worldbody`. The designated object root is the body named `object`
    /// anywhere under the worldbody; it is detached, renamed `main`,
    /// filtered, extended with joints and the default site, optionally
    /// scaled, then prefixed. Template objects exclude nothing from
    /// prefixing.
    pub fn from_template(
        mut template: Element,
        config: TemplateObjectConfig,
    ) -> Result<Self, SceneError> {
        let (mut worldbody, mut asset) = if template.tag == "worldbody" {
            (template, Element::new("asset"))
        } else {
            let asset = template
                .detach_first("asset", &[])
                .unwrap_or_else(|| Element::new("asset"));
            let worldbody = template
                .detach_first("worldbody", &[])
                .ok_or(SceneError::MissingObjectRoot)?;
            (worldbody, asset)
        };

        let mut root = worldbody
            .detach_first("body", &[("name", "object")])
            .ok_or(SceneError::MissingObjectRoot)?;
        root.set("name", "main");

        filter_geoms(&mut root, config.obj_type, config.duplicate_collision_geoms)?;

        for spec in config.joints.clone().resolve() {
            root.append(spec.to_element());
        }
        // Invisible in the template path: the site only records an offset.
        let mut site = site_attrib_template();
        site.set("rgba", "1 0 0 0");
        site.set("name", "default_site");
        root.append(site);

        if let Some(scale) = config.scale {
            apply_scale(&mut root, &mut asset, Some(&mut worldbody), scale)?;
        }

        let props = sort_elements(&root)?;

        let prefix = format!("{}_", config.name);
        add_prefix(&mut root, &prefix, &exclude_nothing);
        add_prefix(&mut worldbody, &prefix, &exclude_nothing);
        add_prefix(&mut asset, &prefix, &exclude_nothing);

        debug!(name = %config.name, bodies = props.bodies.len(), "built template object");
        Ok(Self {
            name: config.name,
            obj_type: config.obj_type,
            duplicate_collision_geoms: config.duplicate_collision_geoms,
            scale: config.scale,
            kind: ObjectKind::Template { markers: worldbody },
            root,
            asset,
            shared_materials: HashSet::new(),
            shared_textures: HashSet::new(),
            props,
            pose_source: None,
        })
    }

    /// Generates an object from primitive parameters.
    ///
    /// One geom is synthesized per admitted geometry group: a collision geom
    /// `g0` with contact defaults, and a visual geom `g0_vis` colored per the
    /// material spec. Shared material names are recorded and excluded from
    /// prefixing so every instance references the identical global
    /// definition.
    pub fn primitive(
        params: PrimitiveParams,
        obj_type: GeomGroup,
        duplicate_collision_geoms: bool,
    ) -> Result<Self, SceneError> {
        params.shape.check_size(&params.size)?;

        let prefix = format!("{}_", params.name);
        let mut asset = Element::new("asset");
        let mut shared_materials = HashSet::new();
        let mut shared_textures = HashSet::new();

        let material = match &params.material {
            MaterialSpec::None => None,
            MaterialSpec::Default => {
                Some(CustomMaterial::from_rgba(params.rgba, "tex", "mat", false))
            }
            MaterialSpec::Custom(custom) => Some(custom.clone()),
        };
        if let Some(material) = &material {
            append_material(
                &mut asset,
                material,
                &prefix,
                &mut shared_materials,
                &mut shared_textures,
            );
        }

        let mut root = Element::new("body").with_attr("name", "main");
        let base = Element::new("geom")
            .with_attr("name", "g0")
            .with_attr("type", params.shape.geom_type())
            .with_attr("size", format_vector(&params.size));

        if obj_type.allows(0) {
            let mut collision = base.clone();
            collision.set("group", "0");
            collision.set_vector("rgba", &OBJECT_COLLISION_COLOR);
            collision.set("density", params.density.to_string());
            collision.set_vector("friction", &params.friction);
            collision.set_vector("solref", &params.solref);
            collision.set_vector("solimp", &params.solimp);
            root.append(collision);
        }
        if obj_type.allows(1) {
            let mut visual = base.clone();
            visual.set("name", "g0_vis");
            visual.set("conaffinity", "0");
            visual.set("contype", "0");
            visual.set("mass", VISUAL_GEOM_MASS);
            visual.set("group", "1");
            match &params.material {
                MaterialSpec::Default => {
                    visual.set("rgba", "0.5 0.5 0.5 1");
                    visual.set("material", "mat");
                }
                MaterialSpec::Custom(custom) => {
                    visual.set("material", custom.name().to_owned());
                }
                MaterialSpec::None => visual.set_vector("rgba", &params.rgba),
            }
            root.append(visual);
        }

        for spec in params.joints.clone().resolve() {
            root.append(spec.to_element());
        }
        let mut site = site_attrib_template();
        site.set("name", "default_site");
        root.append(site);

        let props = sort_elements(&root)?;

        {
            let materials = &shared_materials;
            let textures = &shared_textures;
            add_prefix(&mut root, &prefix, &|target| match target {
                PrefixTarget::Name(name) => materials.contains(name) || textures.contains(name),
                PrefixTarget::Element(_) => false,
            });
        }

        debug!(name = %params.name, shape = ?params.shape, "built primitive object");
        Ok(Self {
            name: params.name,
            obj_type,
            duplicate_collision_geoms,
            scale: None,
            kind: ObjectKind::Primitive {
                shape: params.shape,
                size: params.size,
            },
            root,
            asset,
            shared_materials,
            shared_textures,
            props,
            pose_source: None,
        })
    }

    fn excluded(&self, name: &str) -> bool {
        self.shared_materials.contains(name) || self.shared_textures.contains(name)
    }

    fn correct(&self, name: &str) -> String {
        correct_naming(&self.naming_prefix(), name, &|target| match target {
            PrefixTarget::Name(n) => self.excluded(n),
            PrefixTarget::Element(_) => false,
        })
    }

    fn correct_all(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|n| self.correct(n)).collect()
    }

    /// The object's identity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The per-instance prefix prepended to identifiers.
    pub fn naming_prefix(&self) -> String {
        format!("{}_", self.name)
    }

    /// The geometry group policy fixed at construction.
    pub fn obj_type(&self) -> GeomGroup {
        self.obj_type
    }

    /// Whether the collision-duplication policy was requested.
    pub fn duplicate_collision_geoms(&self) -> bool {
        self.duplicate_collision_geoms
    }

    /// The currently applied scale, if any.
    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    /// The finished root body subtree, ready for world insertion.
    pub fn subtree(&self) -> &Element {
        &self.root
    }

    /// This object's asset collection (materials, textures, meshes).
    pub fn asset(&self) -> &Element {
        &self.asset
    }

    /// Prefixed root body name.
    pub fn root_body(&self) -> String {
        self.correct(&self.props.root_body)
    }

    /// Prefixed body names, root body first.
    ///
    /// Returned lists are owned copies; mutating them has no effect on the
    /// object.
    pub fn bodies(&self) -> Vec<String> {
        self.correct_all(&self.props.bodies)
    }

    /// Prefixed joint names.
    pub fn joints(&self) -> Vec<String> {
        self.correct_all(&self.props.joints)
    }

    /// Prefixed actuator names.
    pub fn actuators(&self) -> Vec<String> {
        self.correct_all(&self.props.actuators)
    }

    /// Prefixed site names.
    pub fn sites(&self) -> Vec<String> {
        self.correct_all(&self.props.sites)
    }

    /// Prefixed sensor names.
    pub fn sensors(&self) -> Vec<String> {
        self.correct_all(&self.props.sensors)
    }

    /// Prefixed contact (collision) geom names.
    pub fn contact_geoms(&self) -> Vec<String> {
        self.correct_all(&self.props.contact_geoms)
    }

    /// Prefixed visual geom names.
    pub fn visual_geoms(&self) -> Vec<String> {
        self.correct_all(&self.props.visual_geoms)
    }

    /// Names in the shared-material set (exempt from prefixing).
    pub fn shared_materials(&self) -> &HashSet<String> {
        &self.shared_materials
    }

    /// Names in the shared-texture set (exempt from prefixing).
    pub fn shared_textures(&self) -> &HashSet<String> {
        &self.shared_textures
    }

    /// The object's default marker site name.
    pub fn important_site(&self) -> String {
        format!("{}default_site", self.naming_prefix())
    }

    /// Merges a foreign asset collection into this object's assets,
    /// skipping tag+name duplicates.
    pub fn merge_assets_from(&mut self, other: &Element) {
        merge_assets(&mut self.asset, other);
    }

    /// Sets the root body position (center of the bounding box).
    pub fn set_pos(&mut self, pos: Vec3) {
        self.root.set("pos", format_vec3(pos));
    }

    /// Sets the root body orientation as Euler angles.
    pub fn set_euler(&mut self, euler: Vec3) {
        self.root.set("euler", format_vec3(euler));
    }

    /// Reads back the yaw component of the root body's Euler orientation.
    pub fn rot(&self) -> Result<f32, SceneError> {
        let euler = self.root.get_vector("euler")?.unwrap_or_else(|| vec![0.0; 3]);
        Ok(euler.get(2).copied().unwrap_or(0.0))
    }

    /// Re-applies a scale factor to the finished subtree.
    ///
    /// Scaling compounds with any previously applied factor. Bounding
    /// metadata tracks the rescale: template objects through their scaled
    /// marker sites, primitive objects through the cached shape size.
    pub fn set_scale(&mut self, scale: Scale) -> Result<(), SceneError> {
        match &mut self.kind {
            ObjectKind::Template { markers } => {
                apply_scale(&mut self.root, &mut self.asset, Some(markers), scale)?;
            }
            ObjectKind::Primitive { shape, size } => {
                apply_scale(&mut self.root, &mut self.asset, None, scale)?;
                shape.rescale_size(size, scale);
            }
        }
        self.scale = Some(scale);
        Ok(())
    }

    /// Injects the live-pose accessor used by [`position`](Self::position)
    /// and [`orientation`](Self::orientation).
    pub fn set_pose_source(&mut self, source: Box<dyn PoseSource>) {
        self.pose_source = Some(source);
    }

    fn main_body_name(&self) -> String {
        format!("{}main", self.naming_prefix())
    }

    /// World position of the object's main body.
    ///
    /// Best-effort: without an injected [`PoseSource`], or when the lookup
    /// fails, returns the zero position rather than an error. This is the
    /// expected steady state before a simulation starts.
    pub fn position(&self) -> Vec3 {
        self.pose_source
            .as_ref()
            .and_then(|source| source.body_position(&self.main_body_name()))
            .unwrap_or(Vec3::ZERO)
    }

    /// World orientation of the object's main body, as a `glam` quaternion
    /// (`x y z w` order), converted from the engine's `w x y z` order at this
    /// boundary.
    ///
    /// Best-effort with the identity orientation as the fallback, like
    /// [`position`](Self::position).
    pub fn orientation(&self) -> Quat {
        self.pose_source
            .as_ref()
            .and_then(|source| source.body_orientation_wxyz(&self.main_body_name()))
            .map(|[w, x, y, z]| Quat::from_xyzw(x, y, z, w))
            .unwrap_or(Quat::IDENTITY)
    }

    fn marker_site_pos(&self, markers: &Element, which: &str) -> Result<Vec3, SceneError> {
        let name = format!("{}{which}", self.naming_prefix());
        let site = markers
            .find_first("site", &[("name", name.as_str())])
            .ok_or_else(|| SceneError::SiteNotFound(name.clone()))?;
        let pos = site.get_vector("pos")?.unwrap_or_else(|| vec![0.0; 3]);
        if pos.len() != 3 {
            return Err(SceneError::invalid_dimension("site pos", "3", pos.len()));
        }
        Ok(Vec3::new(pos[0], pos[1], pos[2]))
    }

    /// Vector from the root body to the object bottom, for placing the
    /// object on a surface.
    ///
    /// Template objects read the `bottom_site` marker recorded by the
    /// authoring side; the lookup fails when the template never declared it.
    pub fn bottom_offset(&self) -> Result<Vec3, SceneError> {
        match &self.kind {
            ObjectKind::Template { markers } => self.marker_site_pos(markers, "bottom_site"),
            ObjectKind::Primitive { shape, size } => Ok(shape.bottom_offset(size)),
        }
    }

    /// Vector from the root body to the object top.
    pub fn top_offset(&self) -> Result<Vec3, SceneError> {
        match &self.kind {
            ObjectKind::Template { markers } => self.marker_site_pos(markers, "top_site"),
            ObjectKind::Primitive { shape, size } => Ok(shape.top_offset(size)),
        }
    }

    /// Maximum distance from the root body to any radial point of the
    /// object, used to place objects without initial interpenetration.
    pub fn horizontal_radius(&self) -> Result<f32, SceneError> {
        match &self.kind {
            ObjectKind::Template { markers } => Ok(self
                .marker_site_pos(markers, "horizontal_radius_site")?
                .x),
            ObjectKind::Primitive { shape, size } => Ok(shape.horizontal_radius(size)),
        }
    }

    /// Half extents of an axis-aligned bounding box around this object.
    pub fn bounding_half_size(&self) -> Result<Vec3, SceneError> {
        match &self.kind {
            ObjectKind::Template { markers } => {
                let radius = self.marker_site_pos(markers, "horizontal_radius_site")?;
                Ok(radius - self.bottom_offset()?)
            }
            ObjectKind::Primitive { shape, size } => Ok(shape.bounding_half_size(size)),
        }
    }

    /// Full size of the bounding box.
    pub fn bounding_size(&self) -> Result<Vec3, SceneError> {
        Ok(2.0 * self.bounding_half_size()?)
    }
}

/// Appends a texture / material pair to `asset` unless the material is
/// already in the shared set; shared names are recorded and left unprefixed
/// so instances can reference the identical global definition.
fn append_material(
    asset: &mut Element,
    material: &CustomMaterial,
    prefix: &str,
    shared_materials: &mut HashSet<String>,
    shared_textures: &mut HashSet<String>,
) {
    if !shared_materials.contains(material.name()) {
        let mut texture = material.texture.clone();
        let mut declaration = material.material.clone();
        if !material.shared {
            add_prefix(&mut texture, prefix, &exclude_nothing);
            add_prefix(&mut declaration, prefix, &exclude_nothing);
        }
        asset.append(texture);
        asset.append(declaration);
    }
    if material.shared {
        shared_materials.insert(material.name().to_owned());
        shared_textures.insert(material.texture_name().to_owned());
    }
}
