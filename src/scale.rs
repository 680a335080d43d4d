//! Geometric scaling of object subtrees.
//!
//! A scale factor is applied consistently to every positional, size, and
//! mesh-scale attribute across geoms, bodies, joints, sites, and meshes.
//! Sizes with fewer than 3 components follow a fixed width/height convention
//! for capsule/cylinder-like primitives; that convention is load-bearing for
//! downstream consumers and must not change.

use crate::element::Element;
use crate::error::SceneError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A uniform or per-axis scale factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Scale {
    /// One factor applied to every axis.
    Uniform(f32),
    /// Independent factors per world axis.
    PerAxis(Vec3),
}

impl Scale {
    /// The factor broadcast to a 3-vector.
    pub fn factor(self) -> Vec3 {
        match self {
            Self::Uniform(s) => Vec3::splat(s),
            Self::PerAxis(v) => v,
        }
    }

    /// Mean of the broadcast factor, used for 1-component (sphere-like) sizes.
    pub fn mean(self) -> f32 {
        let f = self.factor();
        (f.x + f.y + f.z) / 3.0
    }

    /// Factor applied to the radial ("width") component of 2-component sizes
    /// under per-axis scaling: the mean of the first two axes.
    pub fn width_factor(self) -> f32 {
        let f = self.factor();
        (f.x + f.y) / 2.0
    }

    /// Factor applied to the axial ("height") component of 2-component sizes
    /// under per-axis scaling: the third axis.
    pub fn height_factor(self) -> f32 {
        self.factor().z
    }
}

/// Applies `scale` to the object subtree at `root`, the meshes of `asset`,
/// and the sites of `site_root`.
///
/// `site_root` is the widest tree available so that marker sites living
/// outside the object body (template worldbody remainders) are scaled too;
/// pass `None` when the object subtree already is the widest tree.
///
/// Rules, per element kind, skipping elements missing the attribute:
/// - geom `pos`: elementwise multiply;
/// - geom `size`: 3 components elementwise; 2 components (radius +
///   half-length) under uniform scale multiply only the length, under
///   per-axis scale multiply the radius by [`Scale::width_factor`] and the
///   length by [`Scale::height_factor`]; anything else is an error;
/// - mesh `scale`: initialized to `1 1 1` when absent, then elementwise;
/// - body and joint `pos`: elementwise;
/// - site `pos`: elementwise; site `size`: 3 components elementwise,
///   2 components per the geom convention, 1 component by [`Scale::mean`].
///
/// Repeated application compounds; this is applied exactly once during
/// construction and again only on explicit rescale calls.
pub fn apply_scale(
    root: &mut Element,
    asset: &mut Element,
    site_root: Option<&mut Element>,
    scale: Scale,
) -> Result<(), SceneError> {
    debug!(?scale, "applying scale");

    root.for_each_mut("geom", &mut |geom| scale_geom(geom, scale))?;

    asset.for_each_mut("mesh", &mut |mesh| {
        let mut m_scale = mesh.get_vector("scale")?.unwrap_or_else(|| vec![1.0; 3]);
        multiply_elementwise(&mut m_scale, "mesh scale", scale)?;
        mesh.set_vector("scale", &m_scale);
        Ok(())
    })?;

    root.for_each_mut("body", &mut |body| scale_pos(body, scale))?;
    root.for_each_mut("joint", &mut |joint| scale_pos(joint, scale))?;

    root.for_each_mut("site", &mut |site| scale_site(site, scale))?;
    if let Some(site_root) = site_root {
        site_root.for_each_mut("site", &mut |site| scale_site(site, scale))?;
    }
    Ok(())
}

fn scale_geom(geom: &mut Element, scale: Scale) -> Result<(), SceneError> {
    scale_pos(geom, scale)?;
    if let Some(mut size) = geom.get_vector("size")? {
        match size.len() {
            3 => multiply_elementwise(&mut size, "geom size", scale)?,
            2 => match scale {
                Scale::Uniform(s) => size[1] *= s,
                Scale::PerAxis(_) => {
                    size[0] *= scale.width_factor();
                    size[1] *= scale.height_factor();
                }
            },
            n => return Err(SceneError::invalid_dimension("geom size", "2 or 3", n)),
        }
        geom.set_vector("size", &size);
    }
    Ok(())
}

fn scale_site(site: &mut Element, scale: Scale) -> Result<(), SceneError> {
    scale_pos(site, scale)?;
    if let Some(mut size) = site.get_vector("size")? {
        match size.len() {
            3 => multiply_elementwise(&mut size, "site size", scale)?,
            2 => match scale {
                Scale::Uniform(s) => size[1] *= s,
                Scale::PerAxis(_) => {
                    size[0] *= scale.width_factor();
                    size[1] *= scale.height_factor();
                }
            },
            1 => size[0] *= scale.mean(),
            n => return Err(SceneError::invalid_dimension("site size", "1, 2 or 3", n)),
        }
        site.set_vector("size", &size);
    }
    Ok(())
}

fn scale_pos(elem: &mut Element, scale: Scale) -> Result<(), SceneError> {
    if let Some(mut pos) = elem.get_vector("pos")? {
        multiply_elementwise(&mut pos, "pos", scale)?;
        elem.set_vector("pos", &pos);
    }
    Ok(())
}

/// Elementwise multiply; a uniform factor broadcasts over any length, a
/// per-axis factor requires exactly 3 components.
fn multiply_elementwise(
    values: &mut [f32],
    what: &'static str,
    scale: Scale,
) -> Result<(), SceneError> {
    match scale {
        Scale::Uniform(s) => {
            for v in values.iter_mut() {
                *v *= s;
            }
        }
        Scale::PerAxis(f) => {
            if values.len() != 3 {
                return Err(SceneError::invalid_dimension(what, "3", values.len()));
            }
            values[0] *= f.x;
            values[1] *= f.y;
            values[2] *= f.z;
        }
    }
    Ok(())
}
