//! Surface data model shared by the descriptor parser and the runtime.
//!
//! Everything here is plain data: parsed once at startup and immutable
//! afterwards. Maps are ordered so that "id order" is simply iteration order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric surface identifier. Negative values never name a real surface.
pub type SurfaceId = i32;

/// Numeric animation identifier, unique within one surface.
pub type AnimationId = i32;

/// Surface id used by patterns that point at nothing.
pub const NO_SURFACE: SurfaceId = -1;

/// Composition method of a layer or pattern step.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Base,
    Overlay,
    OverlayFast,
    OverlayMultiply,
    Replace,
    Interpolate,
    Asis,
    Move,
    Bind,
    Add,
    Reduce,
    Insert,
    Start,
    Stop,
    AlternativeStart,
    AlternativeStop,
    ParallelStart,
    ParallelStop,
}

impl Method {
    /// Methods that can compose an image: the only ones allowed on elements
    /// and inside bind-only animations.
    pub fn is_synthesizable(self) -> bool {
        matches!(
            self,
            Method::Base
                | Method::Overlay
                | Method::OverlayFast
                | Method::OverlayMultiply
                | Method::Replace
                | Method::Interpolate
                | Method::Asis
                | Method::Bind
                | Method::Add
                | Method::Reduce
        )
    }

    /// Methods whose pattern line carries `<surface>,<wait>,<x>,<y>`.
    pub fn takes_surface(self) -> bool {
        self.is_synthesizable() || self == Method::Move
    }

    /// Methods that take a single target animation id.
    pub fn takes_single_target(self) -> bool {
        matches!(self, Method::Insert | Method::Start | Method::Stop)
    }

    /// Methods that take a parenthesized list of target animation ids.
    pub fn takes_target_list(self) -> bool {
        matches!(
            self,
            Method::AlternativeStart
                | Method::AlternativeStop
                | Method::ParallelStart
                | Method::ParallelStop
        )
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_lowercase().as_str() {
            "base" => Method::Base,
            "overlay" => Method::Overlay,
            "overlayfast" => Method::OverlayFast,
            "overlaymultiply" => Method::OverlayMultiply,
            "replace" => Method::Replace,
            "interpolate" => Method::Interpolate,
            "asis" => Method::Asis,
            "move" => Method::Move,
            "bind" => Method::Bind,
            "add" => Method::Add,
            "reduce" => Method::Reduce,
            "insert" => Method::Insert,
            "start" => Method::Start,
            "stop" => Method::Stop,
            "alternativestart" => Method::AlternativeStart,
            "alternativestop" => Method::AlternativeStop,
            "parallelstart" => Method::ParallelStart,
            "parallelstop" => Method::ParallelStop,
            _ => return Err(()),
        };
        Ok(method)
    }
}

/// Re-trigger policy tag of an animation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Sometimes,
    Rarely,
    Random,
    Periodic,
    Always,
    Runonce,
    Never,
    YenE,
    Talk,
    Bind,
}

impl FromStr for Interval {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.to_ascii_lowercase().as_str() {
            "sometimes" => Interval::Sometimes,
            "rarely" => Interval::Rarely,
            "random" => Interval::Random,
            "periodic" => Interval::Periodic,
            "always" => Interval::Always,
            "runonce" => Interval::Runonce,
            "never" => Interval::Never,
            "yen-e" => Interval::YenE,
            "talk" => Interval::Talk,
            "bind" => Interval::Bind,
            _ => return Err(()),
        };
        Ok(interval)
    }
}

/// Shape of a collision region.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    Rect,
    Ellipse,
    Circle,
    Polygon,
    /// Bitmap region; accepted by the parser but never hit.
    Region,
}

impl FromStr for CollisionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "rect" => CollisionKind::Rect,
            "ellipse" => CollisionKind::Ellipse,
            "circle" => CollisionKind::Circle,
            "polygon" => CollisionKind::Polygon,
            "region" => CollisionKind::Region,
            _ => return Err(()),
        };
        Ok(kind)
    }
}

/// A single static image layer.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Element {
    pub method: Method,
    pub x: i32,
    pub y: i32,
    pub file: PathBuf,
}

/// One step of an animation.
///
/// Synthesis steps use `surface`, the wait range and the offset; control
/// steps only use `targets`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    pub method: Method,
    pub surface: SurfaceId,
    pub wait_min: i32,
    pub wait_max: i32,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<AnimationId>,
}

impl Pattern {
    /// Overlay of nothing at the origin. Shown by inactive actors.
    pub fn hidden() -> Self {
        Self {
            method: Method::Overlay,
            surface: NO_SURFACE,
            wait_min: 0,
            wait_max: 0,
            x: 0,
            y: 0,
            targets: Vec::new(),
        }
    }

    pub fn synthesis(method: Method, surface: SurfaceId, wait: (i32, i32), x: i32, y: i32) -> Self {
        Self {
            method,
            surface,
            wait_min: wait.0,
            wait_max: wait.1,
            x,
            y,
            targets: Vec::new(),
        }
    }

    pub fn control(method: Method, targets: Vec<AnimationId>) -> Self {
        Self {
            method,
            surface: NO_SURFACE,
            wait_min: 0,
            wait_max: 0,
            x: 0,
            y: 0,
            targets,
        }
    }
}

/// A named, interval-governed sequence of patterns.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub intervals: BTreeSet<Interval>,
    pub interval_factor: i32,
    pub patterns: Vec<Pattern>,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            intervals: BTreeSet::new(),
            interval_factor: 1,
            patterns: Vec::new(),
        }
    }
}

impl Animation {
    pub fn has(&self, interval: Interval) -> bool {
        self.intervals.contains(&interval)
    }

    /// True when `bind` is the one and only interval tag.
    pub fn is_bind_only(&self) -> bool {
        self.intervals.len() == 1 && self.has(Interval::Bind)
    }

    /// Sum of the upper wait bounds of every pattern.
    pub fn total_wait(&self) -> i64 {
        self.patterns.iter().map(|p| i64::from(p.wait_max)).sum()
    }

    /// Copy of this animation with every resolvable `insert` step replaced by
    /// the patterns of its target animation (recursively). Unresolvable or
    /// cyclic inserts are kept as inert steps.
    pub fn with_inserts_spliced(
        &self,
        id: AnimationId,
        siblings: &BTreeMap<AnimationId, Animation>,
    ) -> Animation {
        let mut stack = vec![id];
        let patterns = splice_patterns(&self.patterns, siblings, &mut stack);
        Animation {
            intervals: self.intervals.clone(),
            interval_factor: self.interval_factor,
            patterns,
        }
    }
}

fn splice_patterns(
    patterns: &[Pattern],
    siblings: &BTreeMap<AnimationId, Animation>,
    stack: &mut Vec<AnimationId>,
) -> Vec<Pattern> {
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if pattern.method != Method::Insert {
            out.push(pattern.clone());
            continue;
        }
        let target = pattern.targets.first().copied();
        let resolved = target.and_then(|t| {
            if stack.contains(&t) {
                log::debug!("insert of animation {t} would recurse; left inert");
                return None;
            }
            siblings.get(&t).map(|anim| (t, anim))
        });
        match resolved {
            Some((t, anim)) => {
                stack.push(t);
                out.extend(splice_patterns(&anim.patterns, siblings, stack));
                stack.pop();
            }
            None => out.push(pattern.clone()),
        }
    }
    out
}

/// A named hit region.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Collision {
    /// Definition order (source line); higher is tested first.
    pub factor: i32,
    pub kind: CollisionKind,
    pub id: String,
    pub points: Vec<i32>,
}

/// A layered character pose: elements, animations and collision regions.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    #[serde(default)]
    pub elements: BTreeMap<i32, Element>,
    #[serde(default)]
    pub animations: BTreeMap<AnimationId, Animation>,
    #[serde(default)]
    pub collisions: BTreeMap<i32, Collision>,
}

impl Surface {
    /// Overlay `other` onto `self` key by key; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Surface) {
        for (k, v) in &other.elements {
            self.elements.insert(*k, v.clone());
        }
        for (k, v) in &other.animations {
            self.animations.insert(*k, v.clone());
        }
        for (k, v) in &other.collisions {
            self.collisions.insert(*k, v.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.animations.is_empty() && self.collisions.is_empty()
    }
}
