//! Bind groups: resolver trait, descript-backed catalog and runtime tables.
//!
//! A bind group is an animation shown only while toggled on. Groups cascade
//! through "add ids": when a group is bound, every group that lists it as an
//! add member is bound too, and stays bound until its last dependent goes.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use shellkit_surface::AnimationId;

/// Host-facing bind request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindFlag {
    True,
    False,
    /// Flip the current binding state.
    Toggle,
}

impl BindFlag {
    pub fn resolve(self, current: bool) -> bool {
        match self {
            BindFlag::True => true,
            BindFlag::False => false,
            BindFlag::Toggle => !current,
        }
    }
}

/// Bind group information owned by the host (usually the shell's descript).
/// Passed into the [`Seriko`](crate::Seriko) calls that need it.
pub trait BindResolver {
    /// Whether group `id` starts out bound.
    fn is_binding_default(&self, id: AnimationId) -> bool;

    /// Groups that list `id` as an add member.
    fn add_ids(&self, id: AnimationId) -> Vec<AnimationId>;
}

/// Resolver for shells without bind groups.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBinds;

impl BindResolver for NoBinds {
    fn is_binding_default(&self, _id: AnimationId) -> bool {
        false
    }

    fn add_ids(&self, _id: AnimationId) -> Vec<AnimationId> {
        Vec::new()
    }
}

/// Descript key prefix of a character side: `sakura`, `kero`, `char2`, ...
pub fn side_name(side: u32) -> String {
    match side {
        0 => "sakura".to_string(),
        1 => "kero".to_string(),
        n => format!("char{n}"),
    }
}

/// [`BindResolver`] built from `<side>.bindgroup<id>.default` and
/// `<side>.bindgroup<id>.addid` entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BindCatalog {
    defaults: HashMap<AnimationId, bool>,
    /// group -> its add members
    members: HashMap<AnimationId, Vec<AnimationId>>,
}

impl BindCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the entries of `side` from `key,value` pairs. Unrelated keys
    /// and malformed values are ignored.
    pub fn from_pairs<'a, I>(side: u32, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let prefix = format!("{}.bindgroup", side_name(side));
        let mut catalog = Self::new();
        for (key, value) in pairs {
            let Some(rest) = key.trim().strip_prefix(prefix.as_str()) else {
                continue;
            };
            let Some((id, field)) = rest.split_once('.') else {
                continue;
            };
            let Ok(id) = id.parse::<AnimationId>() else {
                log::debug!("bindgroup: bad group id in {key:?}");
                continue;
            };
            match field {
                "default" => {
                    catalog.set_default(id, value.trim() == "1");
                }
                "addid" => {
                    let ids = value
                        .split(',')
                        .filter_map(|s| s.trim().parse::<AnimationId>().ok())
                        .collect();
                    catalog.set_members(id, ids);
                }
                _ => {}
            }
        }
        catalog
    }

    /// Parse descript text (`key,value` per line) for the entries of `side`.
    pub fn parse_descript(side: u32, text: &str) -> Self {
        let pairs = text
            .lines()
            .map(|l| l.trim_start_matches('\u{feff}').trim())
            .filter(|l| !l.is_empty() && !l.starts_with("//"))
            .filter_map(|l| l.split_once(','));
        Self::from_pairs(side, pairs)
    }

    pub fn set_default(&mut self, id: AnimationId, binding: bool) {
        self.defaults.insert(id, binding);
    }

    pub fn set_members(&mut self, id: AnimationId, members: Vec<AnimationId>) {
        self.members.insert(id, members);
    }
}

impl BindResolver for BindCatalog {
    fn is_binding_default(&self, id: AnimationId) -> bool {
        self.defaults.get(&id).copied().unwrap_or(false)
    }

    fn add_ids(&self, id: AnimationId) -> Vec<AnimationId> {
        let mut groups: Vec<AnimationId> = self
            .members
            .iter()
            .filter(|(_, members)| members.contains(&id))
            .map(|(group, _)| *group)
            .collect();
        groups.sort_unstable();
        groups
    }
}

/// Persistent bind flags plus the reverse add-id dependency map.
#[derive(Clone, Debug, Default)]
pub struct BindTable {
    flags: HashMap<AnimationId, bool>,
    dependents: HashMap<AnimationId, HashSet<AnimationId>>,
}

impl BindTable {
    pub fn flag(&self, id: AnimationId) -> Option<bool> {
        self.flags.get(&id).copied()
    }

    pub fn set_flag(&mut self, id: AnimationId, binding: bool) {
        self.flags.insert(id, binding);
    }

    pub fn add_dependent(&mut self, group: AnimationId, dependent: AnimationId) {
        self.dependents.entry(group).or_default().insert(dependent);
    }

    /// Drop `dependent` from `group`. Returns true when that emptied the set.
    pub fn remove_dependent(&mut self, group: AnimationId, dependent: AnimationId) -> bool {
        let Some(set) = self.dependents.get_mut(&group) else {
            return false;
        };
        if !set.remove(&dependent) {
            return false;
        }
        if set.is_empty() {
            self.dependents.remove(&group);
            return true;
        }
        false
    }

    pub fn is_binding(&self, id: AnimationId) -> bool {
        self.dependents.contains_key(&id) || self.flag(id).unwrap_or(false)
    }
}
