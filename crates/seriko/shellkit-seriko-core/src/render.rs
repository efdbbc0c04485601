//! Render tree and collision layer types, plus surface expansion.

use std::path::PathBuf;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use shellkit_surface::{Collision, Element, Method, Pattern, SurfaceId, Surfaces};

/// Drawable tree node handed to the external renderer.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderInfo {
    Element(Element),
    Group(ElementWithChildren),
}

/// Composite layer: children are drawn with `method` at offset (x, y).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementWithChildren {
    pub method: Method,
    pub x: i32,
    pub y: i32,
    pub children: Vec<RenderInfo>,
}

impl RenderInfo {
    /// Image files of this subtree in draw order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files(&self, out: &mut Vec<PathBuf>) {
        match self {
            RenderInfo::Element(e) => out.push(e.file.clone()),
            RenderInfo::Group(g) => {
                for child in &g.children {
                    child.collect_files(out);
                }
            }
        }
    }
}

/// One hit-test layer: collisions of one surface placed at (x, y).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CollisionInfo {
    pub x: i32,
    pub y: i32,
    pub collisions: Vec<Collision>,
}

impl CollisionInfo {
    /// Layer for `collisions`, highest factor first. `None` when empty.
    pub(crate) fn sorted<'a>(
        x: i32,
        y: i32,
        collisions: impl Iterator<Item = &'a Collision>,
    ) -> Option<Self> {
        let mut collisions: Vec<Collision> = collisions.cloned().collect();
        if collisions.is_empty() {
            return None;
        }
        collisions.sort_by(|a, b| b.factor.cmp(&a.factor));
        Some(Self { x, y, collisions })
    }
}

/// Group node for `pattern`: the referenced surface's elements followed by
/// its bind-only sub-animations, expanded recursively. Surfaces already in
/// `visited` are not entered again. `None` when the surface does not exist.
pub(crate) fn expand_pattern(
    surfaces: &Surfaces,
    pattern: &Pattern,
    visited: &mut HashSet<SurfaceId>,
) -> Option<RenderInfo> {
    let surface = surfaces.get(pattern.surface)?;
    visited.insert(pattern.surface);
    let mut children: Vec<RenderInfo> = surface
        .elements
        .values()
        .cloned()
        .map(RenderInfo::Element)
        .collect();
    for animation in surface.animations.values().filter(|a| a.is_bind_only()) {
        for sub in &animation.patterns {
            if visited.contains(&sub.surface) {
                continue;
            }
            if let Some(node) = expand_pattern(surfaces, sub, visited) {
                children.push(node);
            }
        }
    }
    Some(RenderInfo::Group(ElementWithChildren {
        method: pattern.method,
        x: pattern.x,
        y: pattern.y,
        children,
    }))
}
