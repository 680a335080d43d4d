// tests/primitive_objects.rs
use glam::{Quat, Vec3};
use mjcf_object::{
    CustomMaterial, Element, GeomGroup, JointSpec, Joints, MaterialSpec, PoseSource,
    PrimitiveParams, PrimitiveShape, Scale, SceneError, SceneObject, merge_assets,
};

fn cube(name: &str) -> PrimitiveParams {
    PrimitiveParams::new(name, PrimitiveShape::Box, vec![0.05, 0.05, 0.05])
}

#[test]
fn test_cube_end_to_end() {
    let obj = SceneObject::primitive(cube("cube1"), GeomGroup::All, true).unwrap();

    let root = obj.subtree();
    assert_eq!(root.tag, "body");
    assert_eq!(root.get("name"), Some("cube1_main"));

    let geoms = root.find_all("geom", &[]);
    assert_eq!(geoms.len(), 2, "policy 'all' should keep both geoms");

    // Collision geom: group 0, fixed collision marker color.
    assert_eq!(geoms[0].get("name"), Some("cube1_g0"));
    assert_eq!(geoms[0].get("group"), Some("0"));
    assert_eq!(geoms[0].get("rgba"), Some("0.5 0 0 1"));
    assert_eq!(geoms[0].get("density"), Some("1000"));
    assert_eq!(geoms[0].get("friction"), Some("1 0.005 0.0001"));

    // Visual geom: group 1, contact disabled, colored per the params rgba.
    assert_eq!(geoms[1].get("name"), Some("cube1_g0_vis"));
    assert_eq!(geoms[1].get("group"), Some("1"));
    assert_eq!(geoms[1].get("contype"), Some("0"));
    assert_eq!(geoms[1].get("conaffinity"), Some("0"));
    assert_eq!(geoms[1].get("rgba"), Some("1 0 0 1"));

    assert_eq!(obj.joints(), vec!["cube1_joint0".to_owned()]);
    assert_eq!(root.find_all("joint", &[])[0].get("type"), Some("free"));
    assert_eq!(obj.sites(), vec!["cube1_default_site".to_owned()]);
    assert_eq!(obj.root_body(), "cube1_main");
    assert_eq!(obj.contact_geoms(), vec!["cube1_g0".to_owned()]);
    assert_eq!(obj.visual_geoms(), vec!["cube1_g0_vis".to_owned()]);
}

#[test]
fn test_geom_group_policies() {
    let collision_only =
        SceneObject::primitive(cube("c"), GeomGroup::Collision, true).unwrap();
    let geoms = collision_only.subtree().find_all("geom", &[]);
    assert_eq!(geoms.len(), 1);
    assert_eq!(geoms[0].get("group"), Some("0"));

    let visual_only = SceneObject::primitive(cube("v"), GeomGroup::Visual, true).unwrap();
    let geoms = visual_only.subtree().find_all("geom", &[]);
    assert_eq!(geoms.len(), 1);
    assert_eq!(geoms[0].get("name"), Some("v_g0_vis"));
}

#[test]
fn test_joint_auto_naming_is_deterministic() {
    let build = || {
        let mut params = cube("jointy");
        params.joints = Joints::Custom(vec![
            JointSpec::new().with_attr("type", "slide"),
            JointSpec::new().with_attr("type", "hinge"),
            JointSpec::new().with_attr("type", "ball").with_attr("name", "wrist"),
        ]);
        SceneObject::primitive(params, GeomGroup::All, true).unwrap()
    };

    let first = build();
    let second = build();
    let expected = vec![
        "jointy_joint0".to_owned(),
        "jointy_joint1".to_owned(),
        "jointy_wrist".to_owned(),
    ];
    assert_eq!(first.joints(), expected);
    assert_eq!(second.joints(), expected, "auto-naming must be deterministic");
}

#[test]
fn test_no_joints() {
    let mut params = cube("still");
    params.joints = Joints::None;
    let obj = SceneObject::primitive(params, GeomGroup::All, true).unwrap();
    assert!(obj.joints().is_empty());
    assert!(obj.subtree().find_all("joint", &[]).is_empty());
}

#[test]
fn test_default_material_is_instance_prefixed() {
    let mut params = cube("m1");
    params.material = MaterialSpec::Default;
    let obj = SceneObject::primitive(params, GeomGroup::All, true).unwrap();

    let material = obj.asset().find_first("material", &[]).expect("material missing");
    assert_eq!(material.get("name"), Some("m1_mat"));
    assert_eq!(material.get("texture"), Some("m1_tex"));
    let texture = obj.asset().find_first("texture", &[]).expect("texture missing");
    assert_eq!(texture.get("name"), Some("m1_tex"));

    // The visual geom reference follows the prefixed material name.
    let visual = obj
        .subtree()
        .find_first("geom", &[("name", "m1_g0_vis")])
        .unwrap();
    assert_eq!(visual.get("material"), Some("m1_mat"));
    assert_eq!(visual.get("rgba"), Some("0.5 0.5 0.5 1"));
}

#[test]
fn test_shared_material_keeps_global_name_across_instances() {
    let shared = CustomMaterial::from_rgba([0.0, 0.0, 1.0, 1.0], "blue_tex", "blue_mat", true);

    let build = |name: &str| {
        let mut params = cube(name);
        params.material = MaterialSpec::Custom(shared.clone());
        SceneObject::primitive(params, GeomGroup::All, true).unwrap()
    };
    let a = build("a");
    let b = build("b");

    for obj in [&a, &b] {
        let material = obj.asset().find_first("material", &[]).unwrap();
        assert_eq!(material.get("name"), Some("blue_mat"), "shared name stays unprefixed");
        let visual = obj
            .subtree()
            .find_first("geom", &[("group", "1")])
            .unwrap();
        assert_eq!(visual.get("material"), Some("blue_mat"));
    }

    // Everything that is not shared differs by prefix.
    assert_eq!(a.root_body(), "a_main");
    assert_eq!(b.root_body(), "b_main");
    assert_ne!(a.contact_geoms(), b.contact_geoms());

    // World assembly dedupes the shared declarations by tag + name.
    let mut world_asset = Element::new("asset");
    merge_assets(&mut world_asset, a.asset());
    merge_assets(&mut world_asset, b.asset());
    assert_eq!(world_asset.children.len(), 2, "one texture + one material");
    merge_assets(&mut world_asset, a.asset());
    assert_eq!(world_asset.children.len(), 2, "asset merge is idempotent");
}

#[test]
fn test_nameless_assets_merge_idempotently() {
    let library = Element::new("asset")
        .with_child(Element::new("texture").with_attr("builtin", "gradient"))
        .with_child(Element::new("material").with_attr("name", "floor"));

    let mut world_asset = Element::new("asset");
    merge_assets(&mut world_asset, &library);
    merge_assets(&mut world_asset, &library);
    assert_eq!(world_asset.children.len(), 2, "nameless texture must not duplicate");
}

#[test]
fn test_sliding_friction_override() {
    let params = cube("slick").with_sliding_friction(0.2);
    let obj = SceneObject::primitive(params, GeomGroup::All, true).unwrap();
    let collision = obj
        .subtree()
        .find_first("geom", &[("group", "0")])
        .unwrap();
    assert_eq!(collision.get("friction"), Some("0.2 0.005 0.0001"));
}

#[test]
fn test_metadata_accessors() {
    let obj = SceneObject::primitive(cube("meta"), GeomGroup::Collision, false).unwrap();
    assert_eq!(obj.name(), "meta");
    assert_eq!(obj.naming_prefix(), "meta_");
    assert_eq!(obj.obj_type(), GeomGroup::Collision);
    assert!(!obj.duplicate_collision_geoms());
    assert_eq!(obj.scale(), None);
    assert_eq!(obj.bodies(), vec!["meta_main".to_owned()]);
    assert!(obj.actuators().is_empty());
    assert!(obj.sensors().is_empty());
    assert!(obj.shared_materials().is_empty());
    assert!(obj.shared_textures().is_empty());
    assert!(format!("{obj:?}").contains("\"meta\""));
}

#[test]
fn test_size_dimensionality_is_checked() {
    let err = SceneObject::primitive(
        PrimitiveParams::new("bad", PrimitiveShape::Sphere, vec![0.1, 0.2, 0.3]),
        GeomGroup::All,
        true,
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::InvalidDimension { found: 3, .. }));

    let err = SceneObject::primitive(
        PrimitiveParams::new("bad", PrimitiveShape::Capsule, vec![0.1]),
        GeomGroup::All,
        true,
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::InvalidDimension { found: 1, .. }));
}

#[test]
fn test_primitive_bounding_geometry() {
    let box_obj = SceneObject::primitive(cube("bx"), GeomGroup::All, true).unwrap();
    assert_eq!(box_obj.bottom_offset().unwrap(), Vec3::new(0.0, 0.0, -0.05));
    assert_eq!(box_obj.top_offset().unwrap(), Vec3::new(0.0, 0.0, 0.05));
    let radius = box_obj.horizontal_radius().unwrap();
    assert!((radius - (0.05f32 * 0.05 * 2.0).sqrt()).abs() < 1e-6);
    assert_eq!(
        box_obj.bounding_half_size().unwrap(),
        Vec3::new(0.05, 0.05, 0.05)
    );
    assert_eq!(box_obj.bounding_size().unwrap(), Vec3::new(0.1, 0.1, 0.1));

    let capsule = SceneObject::primitive(
        PrimitiveParams::new("cap", PrimitiveShape::Capsule, vec![0.03, 0.1]),
        GeomGroup::All,
        true,
    )
    .unwrap();
    // Capsule extends past its half-length by the cap radius.
    assert!((capsule.bottom_offset().unwrap().z - -0.13).abs() < 1e-6);
    assert_eq!(capsule.horizontal_radius().unwrap(), 0.03);
    let half = capsule.bounding_half_size().unwrap();
    assert_eq!(half.x, 0.03);
    assert!((half.z - 0.13).abs() < 1e-6);
}

#[test]
fn test_rescale_updates_bounding_geometry() {
    let mut obj = SceneObject::primitive(cube("grow"), GeomGroup::All, true).unwrap();
    obj.set_scale(Scale::Uniform(2.0)).unwrap();
    assert_eq!(obj.scale(), Some(Scale::Uniform(2.0)));

    // The tree and the bounding metadata agree after rescaling.
    let collision = obj.subtree().find_first("geom", &[("group", "0")]).unwrap();
    assert_eq!(collision.get("size"), Some("0.1 0.1 0.1"));
    assert_eq!(obj.bottom_offset().unwrap(), Vec3::new(0.0, 0.0, -0.1));
    assert_eq!(obj.top_offset().unwrap(), Vec3::new(0.0, 0.0, 0.1));
    assert_eq!(obj.bounding_half_size().unwrap(), Vec3::new(0.1, 0.1, 0.1));

    let mut capsule = SceneObject::primitive(
        PrimitiveParams::new("cap", PrimitiveShape::Capsule, vec![0.03, 0.1]),
        GeomGroup::All,
        true,
    )
    .unwrap();
    // Uniform rescale of a radius + half-length size grows the length only.
    capsule.set_scale(Scale::Uniform(2.0)).unwrap();
    assert_eq!(capsule.horizontal_radius().unwrap(), 0.03);
    assert!((capsule.bottom_offset().unwrap().z - -0.23).abs() < 1e-6);

    // Per-axis rescale follows the width/height convention.
    let mut cyl = SceneObject::primitive(
        PrimitiveParams::new("cyl", PrimitiveShape::Cylinder, vec![0.04, 0.06]),
        GeomGroup::All,
        true,
    )
    .unwrap();
    cyl.set_scale(Scale::PerAxis(Vec3::new(2.0, 4.0, 5.0))).unwrap();
    assert!((cyl.horizontal_radius().unwrap() - 0.12).abs() < 1e-6);
    assert!((cyl.bottom_offset().unwrap().z - -0.3).abs() < 1e-6);
}

struct StubPose;

impl PoseSource for StubPose {
    fn body_position(&self, body: &str) -> Option<Vec3> {
        (body == "cube1_main").then_some(Vec3::new(1.0, 2.0, 3.0))
    }

    fn body_orientation_wxyz(&self, body: &str) -> Option<[f32; 4]> {
        // 180 degrees about X, in the engine's wxyz order.
        (body == "cube1_main").then_some([0.0, 1.0, 0.0, 0.0])
    }
}

#[test]
fn test_pose_defaults_without_source() {
    let obj = SceneObject::primitive(cube("lonely"), GeomGroup::All, true).unwrap();
    assert_eq!(obj.position(), Vec3::ZERO);
    assert_eq!(obj.orientation(), Quat::IDENTITY);
}

#[test]
fn test_pose_source_conversion_and_fallback() {
    let mut obj = SceneObject::primitive(cube("cube1"), GeomGroup::All, true).unwrap();
    obj.set_pose_source(Box::new(StubPose));
    assert_eq!(obj.position(), Vec3::new(1.0, 2.0, 3.0));
    // wxyz [0, 1, 0, 0] converts to xyzw (1, 0, 0, 0).
    assert_eq!(obj.orientation(), Quat::from_xyzw(1.0, 0.0, 0.0, 0.0));

    // A source that doesn't know the body falls back to the default pose.
    let mut other = SceneObject::primitive(cube("cube2"), GeomGroup::All, true).unwrap();
    other.set_pose_source(Box::new(StubPose));
    assert_eq!(other.position(), Vec3::ZERO);
    assert_eq!(other.orientation(), Quat::IDENTITY);
}

#[test]
fn test_placement_setters() {
    let mut obj = SceneObject::primitive(cube("mover"), GeomGroup::All, true).unwrap();
    obj.set_pos(Vec3::new(0.5, -0.25, 1.0));
    assert_eq!(obj.subtree().get("pos"), Some("0.5 -0.25 1"));

    assert_eq!(obj.rot().unwrap(), 0.0, "yaw defaults to zero");
    obj.set_euler(Vec3::new(0.0, 0.0, 1.57));
    assert!((obj.rot().unwrap() - 1.57).abs() < 1e-6);
}
