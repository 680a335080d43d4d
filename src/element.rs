//! Generic mutable element tree for MJCF-like scene descriptions.
//!
//! The vocabulary is a small closed schema (`body`, `geom`, `joint`, `site`,
//! `sensor`, `actuator`, `asset`/`material`/`texture`), but the tree itself is
//! generic: tagged nodes with ordered string attributes and ordered children.
//! Numeric attributes (positions, sizes, colors) are stored in the engine's
//! wire form — whitespace-separated floats — and decoded on demand.

use crate::error::SceneError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A single tagged node with ordered attributes and owned children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element tag (e.g. `body`, `geom`).
    pub tag: String,
    attrs: Vec<(String, String)>,
    /// Child elements, in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the attribute value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets (or overwrites, preserving position) the attribute `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Removes the attribute `key`, returning its old value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(idx).1)
    }

    /// Iterates over `(key, value)` attribute pairs in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over attributes with mutable access to the values.
    pub(crate) fn attrs_mut(&mut self) -> impl Iterator<Item = (&str, &mut String)> {
        self.attrs.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Appends a child element.
    pub fn append(&mut self, child: Element) {
        self.children.push(child);
    }

    fn matches(&self, tag: &str, attribs: &[(&str, &str)]) -> bool {
        self.tag == tag && attribs.iter().all(|(k, v)| self.get(k) == Some(*v))
    }

    /// Finds the first descendant (depth-first, document order, including
    /// `self`) matching `tag` and all attribute equality constraints.
    pub fn find_first(&self, tag: &str, attribs: &[(&str, &str)]) -> Option<&Element> {
        if self.matches(tag, attribs) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_first(tag, attribs))
    }

    /// Collects every matching descendant in depth-first document order.
    pub fn find_all(&self, tag: &str, attribs: &[(&str, &str)]) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_matches(tag, attribs, &mut found);
        found
    }

    fn collect_matches<'a>(
        &'a self,
        tag: &str,
        attribs: &[(&str, &str)],
        found: &mut Vec<&'a Element>,
    ) {
        if self.matches(tag, attribs) {
            found.push(self);
        }
        for child in &self.children {
            child.collect_matches(tag, attribs, found);
        }
    }

    /// Detaches the first descendant body (or other element) matching `tag`
    /// and `attribs` from its parent and returns it by value.
    ///
    /// Searches strictly below `self`; `self` itself is never detached.
    pub fn detach_first(&mut self, tag: &str, attribs: &[(&str, &str)]) -> Option<Element> {
        if let Some(idx) = self
            .children
            .iter()
            .position(|child| child.matches(tag, attribs))
        {
            return Some(self.children.remove(idx));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.detach_first(tag, attribs))
    }

    /// Runs `f` on every descendant with the given tag (including `self`),
    /// depth-first in document order, stopping at the first error.
    pub fn for_each_mut<E>(
        &mut self,
        tag: &str,
        f: &mut impl FnMut(&mut Element) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.tag == tag {
            f(self)?;
        }
        for child in &mut self.children {
            child.for_each_mut(tag, f)?;
        }
        Ok(())
    }

    /// Decodes the attribute `key` as a whitespace-separated float vector.
    ///
    /// Returns `Ok(None)` when the attribute is absent; a malformed component
    /// is an [`SceneError::InvalidNumber`].
    pub fn get_vector(&self, key: &str) -> Result<Option<Vec<f32>>, SceneError> {
        match self.get(key) {
            Some(raw) => parse_vector(key, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes `values` into the attribute `key` in wire form.
    pub fn set_vector(&mut self, key: impl Into<String>, values: &[f32]) {
        self.set(key, format_vector(values));
    }
}

/// Parses a whitespace-separated float vector out of `raw`.
///
/// `attribute` is only used for error reporting.
pub fn parse_vector(attribute: &str, raw: &str) -> Result<Vec<f32>, SceneError> {
    raw.split_whitespace()
        .map(|tok| {
            tok.parse::<f32>()
                .map_err(|_| SceneError::invalid_number(attribute, raw))
        })
        .collect()
}

/// Formats `values` as a whitespace-separated vector that re-parses equal.
pub fn format_vector(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a [`Vec3`] in wire form.
pub fn format_vec3(v: Vec3) -> String {
    format_vector(&v.to_array())
}

/// Merges `source`'s asset children into `target`.
///
/// A child is appended (cloned) unless `target` already contains a child with
/// the same tag and `name` attribute: the first definition wins and later
/// duplicates are silently dropped, so the same asset library can be merged
/// repeatedly without growing the collection.
pub fn merge_assets(target: &mut Element, source: &Element) {
    for asset in &source.children {
        let duplicate = match asset.get("name") {
            Some(name) => target.find_first(&asset.tag, &[("name", name)]).is_some(),
            // A nameless declaration matches a nameless sibling of the same
            // tag, so re-merging stays idempotent.
            None => target
                .children
                .iter()
                .any(|child| child.tag == asset.tag && child.get("name").is_none()),
        };
        if duplicate {
            trace!(tag = %asset.tag, name = asset.get("name"), "skipping duplicate asset");
        } else {
            target.append(asset.clone());
        }
    }
}
