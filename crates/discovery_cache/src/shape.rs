//! Canonical shapes of source entities.
//!
//! A shape keeps only the declarations the downstream compiler reacts to:
//! class-level markers grouped by facet, and for members that carry access
//! markers, those markers plus the non-builtin types they take. Formatting,
//! comments and declaration order never reach a shape.

use std::collections::{BTreeMap, BTreeSet};

use discovery_common::EntityId;
use serde::{Deserialize, Serialize};

/// Entity identifier to shape, ordered by identifier.
pub type ShapeMap = BTreeMap<EntityId, Shape>;

/// The compiler-relevant declarations of a single entity.
///
/// Built through [`ShapeBuilder`], which drops empty facets and unmarked
/// members so that "no declarations" always has exactly one representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shape {
    /// Facet name to declaration names, e.g. `"class"` to `{"Service"}`.
    #[serde(default)]
    facets: BTreeMap<String, BTreeSet<String>>,

    /// Member name to its marker and parameter declarations.
    #[serde(default)]
    members: BTreeMap<String, MemberShape>,
}

/// The declarations of one public member (e.g. a controller action).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberShape {
    /// Access markers attached to the member.
    pub markers: BTreeSet<String>,

    /// Non-builtin parameter types, in declaration order.
    pub params: Vec<String>,
}

impl Shape {
    /// Starts building a shape.
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::default()
    }

    /// Returns `true` if the entity declares nothing the compiler cares about.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty() && self.members.is_empty()
    }

    /// Returns the declarations recorded under `facet`, if any.
    pub fn facet(&self, facet: &str) -> Option<&BTreeSet<String>> {
        self.facets.get(facet)
    }

    /// Iterates facets in name order.
    pub fn facets(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.facets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the shape of member `name`, if it is marked.
    pub fn member(&self, name: &str) -> Option<&MemberShape> {
        self.members.get(name)
    }

    /// Iterates marked members in name order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberShape)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl MemberShape {
    /// Creates a member shape from markers and parameter types.
    pub fn new<M, P>(markers: M, params: P) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// Incremental constructor for [`Shape`].
#[derive(Debug, Clone, Default)]
pub struct ShapeBuilder {
    shape: Shape,
}

impl ShapeBuilder {
    /// Records `declaration` under `facet`. Duplicates collapse.
    pub fn facet(mut self, facet: impl Into<String>, declaration: impl Into<String>) -> Self {
        self.shape
            .facets
            .entry(facet.into())
            .or_default()
            .insert(declaration.into());
        self
    }

    /// Records a member. Members without markers are ignored.
    pub fn member(mut self, name: impl Into<String>, member: MemberShape) -> Self {
        if !member.markers.is_empty() {
            self.shape.members.insert(name.into(), member);
        }
        self
    }

    /// Finishes the shape.
    pub fn build(self) -> Shape {
        self.shape
    }
}
