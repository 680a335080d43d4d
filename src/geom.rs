//! Geometry classification: collision/visual group policy, geom filtering,
//! visual duplication, and tree property extraction.

use crate::element::Element;
use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed rgba used to mark collision geoms when they are kept visible.
pub const OBJECT_COLLISION_COLOR: [f32; 4] = [0.5, 0.0, 0.0, 1.0];

/// Mass assigned to synthesized visual-only geoms (near-zero, never exactly
/// zero so the engine accepts it).
pub const VISUAL_GEOM_MASS: &str = "1e-8";

/// Which geometry groups an object keeps when its subtree is built.
///
/// Group numbers are the engine's convention: 0 for physics (collision),
/// 1 for rendering (visual).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomGroup {
    /// Keep only group-0 geoms (physics without visualization).
    Collision,
    /// Keep only group-1 geoms (visualization without physics).
    Visual,
    /// Keep both groups.
    #[default]
    All,
}

impl GeomGroup {
    /// Whether a geom with numeric group `group` survives under this policy.
    pub fn allows(self, group: u32) -> bool {
        match self {
            Self::Collision => group == 0,
            Self::Visual => group == 1,
            Self::All => group == 0 || group == 1,
        }
    }
}

/// Reads a geom's numeric group, treating a missing attribute as the default
/// collision group 0.
pub fn geom_group_number(geom: &Element) -> Result<u32, SceneError> {
    match geom.get("group") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| SceneError::invalid_number("group", raw)),
        None => Ok(0),
    }
}

/// Filters the geoms of the subtree at `root` according to `policy`.
///
/// Walks (parent, geom) pairs depth-first in document order. Geoms whose
/// group the policy rejects are removed from their parent, preserving the
/// order of the remaining siblings. Kept geoms without a name are named
/// `g<index>`, where the index counts every geom pair encountered so far
/// (removed ones included), not the position among siblings.
///
/// When `recolor_collisions` is set, each kept collision geom (group 0 or
/// unset) has its visual appearance overwritten in place: rgba forced to
/// [`OBJECT_COLLISION_COLOR`] and any `material` reference dropped. This is
/// the template-path duplication policy — no second geom node is spawned.
pub fn filter_geoms(
    root: &mut Element,
    policy: GeomGroup,
    recolor_collisions: bool,
) -> Result<(), SceneError> {
    let mut counter = 0usize;
    let mut removed = 0usize;
    filter_walk(root, policy, recolor_collisions, &mut counter, &mut removed)?;
    debug!(
        encountered = counter,
        removed,
        ?policy,
        "filtered geoms"
    );
    Ok(())
}

fn filter_walk(
    node: &mut Element,
    policy: GeomGroup,
    recolor_collisions: bool,
    counter: &mut usize,
    removed: &mut usize,
) -> Result<(), SceneError> {
    let mut idx = 0;
    while idx < node.children.len() {
        if node.children[idx].tag == "geom" {
            let index = *counter;
            *counter += 1;
            let group = geom_group_number(&node.children[idx])?;
            if !policy.allows(group) {
                node.children.remove(idx);
                *removed += 1;
                continue;
            }
            let geom = &mut node.children[idx];
            if geom.get("name").is_none() {
                geom.set("name", format!("g{index}"));
            }
            if recolor_collisions && group == 0 {
                geom.set_vector("rgba", &OBJECT_COLLISION_COLOR);
                geom.remove_attr("material");
            }
        }
        filter_walk(
            &mut node.children[idx],
            policy,
            recolor_collisions,
            counter,
            removed,
        )?;
        idx += 1;
    }
    Ok(())
}

/// Produces a visual twin of a collision geom.
///
/// The copy is forced into group 1 with `contype`/`conaffinity` 0 and a
/// near-zero mass, and its name is suffixed `_visual`.
pub fn duplicate_as_visual(geom: &Element) -> Element {
    let mut visual = geom.clone();
    visual.set("group", "1");
    visual.set("conaffinity", "0");
    visual.set("contype", "0");
    visual.set("mass", VISUAL_GEOM_MASS);
    let name = visual.get("name").unwrap_or_default().to_owned();
    visual.set("name", format!("{name}_visual"));
    visual
}

/// Names extracted from an object subtree, classified by element kind.
///
/// All names are the raw (unprefixed) names found in the tree; unnamed
/// elements are skipped.
#[derive(Clone, Debug, Default)]
pub struct SortedElements {
    /// Name of the unique root body.
    pub root_body: String,
    /// Every body name, root body first.
    pub bodies: Vec<String>,
    /// Joint names.
    pub joints: Vec<String>,
    /// Actuator names.
    pub actuators: Vec<String>,
    /// Site names.
    pub sites: Vec<String>,
    /// Sensor names.
    pub sensors: Vec<String>,
    /// Geoms used for physics contact (group 0 or unset).
    pub contact_geoms: Vec<String>,
    /// Geoms used for rendering (group 1).
    pub visual_geoms: Vec<String>,
}

/// Classifies every element of the subtree at `root` by tag and geom group,
/// validating that exactly one root body exists.
///
/// A root body is a `body` whose parent is not itself a `body`; geoms in
/// groups other than 0 and 1 are ignored.
pub fn sort_elements(root: &Element) -> Result<SortedElements, SceneError> {
    let mut sorted = SortedElements::default();
    let mut root_bodies = Vec::new();
    sort_walk(root, None, &mut sorted, &mut root_bodies)?;
    if root_bodies.len() != 1 {
        return Err(SceneError::RootBodyCount {
            found: root_bodies.len(),
        });
    }
    sorted.root_body = root_bodies.remove(0);
    sorted.bodies.insert(0, sorted.root_body.clone());
    Ok(sorted)
}

fn sort_walk(
    node: &Element,
    parent_tag: Option<&str>,
    sorted: &mut SortedElements,
    root_bodies: &mut Vec<String>,
) -> Result<(), SceneError> {
    let name = node.get("name").map(str::to_owned);
    match node.tag.as_str() {
        "body" if parent_tag != Some("body") => {
            root_bodies.push(name.unwrap_or_default());
        }
        "body" => {
            if let Some(name) = name {
                sorted.bodies.push(name);
            }
        }
        "joint" => sorted.joints.extend(name),
        "actuator" => sorted.actuators.extend(name),
        "site" => sorted.sites.extend(name),
        "sensor" => sorted.sensors.extend(name),
        "geom" => {
            if let Some(name) = name {
                match geom_group_number(node)? {
                    0 => sorted.contact_geoms.push(name),
                    1 => sorted.visual_geoms.push(name),
                    _ => {}
                }
            }
        }
        _ => {}
    }
    for child in &node.children {
        sort_walk(child, Some(node.tag.as_str()), sorted, root_bodies)?;
    }
    Ok(())
}
