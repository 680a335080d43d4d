//! Naming isolation: instance prefixes for identifier attributes.
//!
//! When several instances of one object template coexist in a world tree,
//! every identifying attribute must be rewritten to a per-instance name.
//! Only identifier and identifier-reference attributes are touched; numeric
//! geometry data (`pos`, `size`, `quat`, ...) is never rewritten.

use crate::element::Element;

/// Attributes whose values are names or references to names.
///
/// Fixed closed set for the MJCF-like schema; everything else is data.
const IDENTIFIER_ATTRIBUTES: &[&str] = &[
    "name", "joint", "joint1", "joint2", "geom", "geom1", "geom2", "body", "body1", "body2",
    "site", "mesh", "material", "texture", "tendon", "objname", "prefix",
];

/// Input handed to an exclusion predicate: either a whole element (to exclude
/// by tag or kind) or a bare name string (to exclude a specific shared name).
#[derive(Clone, Copy, Debug)]
pub enum PrefixTarget<'a> {
    /// A whole element about to have its identifiers rewritten.
    Element(&'a Element),
    /// A single identifier value about to be rewritten.
    Name(&'a str),
}

/// Predicate deciding whether a node or name is exempt from prefixing.
///
/// Must return `false` for anything not explicitly excluded.
pub type ExcludePredicate<'a> = dyn Fn(PrefixTarget<'_>) -> bool + 'a;

/// Prepends `prefix` to every identifier attribute in the subtree at `root`.
///
/// Walks every node depth-first. A node excluded as a whole keeps all of its
/// identifiers untouched; otherwise each identifier value is rewritten to
/// `prefix + value` unless the bare value is excluded (e.g. a shared material
/// name). Not idempotent: applying the same prefix twice double-prefixes, so
/// callers apply it exactly once per subtree.
pub fn add_prefix(root: &mut Element, prefix: &str, exclude: &ExcludePredicate<'_>) {
    if !exclude(PrefixTarget::Element(root)) {
        for (key, value) in root.attrs_mut() {
            if IDENTIFIER_ATTRIBUTES.contains(&key) && !exclude(PrefixTarget::Name(value)) {
                value.insert_str(0, prefix);
            }
        }
    }
    for child in &mut root.children {
        add_prefix(child, prefix, exclude);
    }
}

/// Applies the prefixing rule to a single cached name on read.
pub fn correct_naming(prefix: &str, name: &str, exclude: &ExcludePredicate<'_>) -> String {
    if exclude(PrefixTarget::Name(name)) {
        name.to_owned()
    } else {
        format!("{prefix}{name}")
    }
}

/// The exclusion predicate that excludes nothing.
pub fn exclude_nothing(_: PrefixTarget<'_>) -> bool {
    false
}
