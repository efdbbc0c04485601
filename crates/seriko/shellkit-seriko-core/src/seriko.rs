//! Per-character orchestrator: owns the actors of the active surface,
//! advances time and assembles the render tree and collision layers.

use std::time::Instant;

use hashbrown::{HashMap, HashSet};
use rand_pcg::Pcg64Mcg;
use shellkit_surface::{AnimationId, SurfaceId, Surfaces};

use crate::actor::{Actor, ActorEffect, Source};
use crate::bind::{BindResolver, BindTable};
use crate::config::Config;
use crate::queue::TickQueue;
use crate::render::{expand_pattern, CollisionInfo, RenderInfo};

pub struct Seriko {
    cfg: Config,
    surfaces: Surfaces,
    current: Option<SurfaceId>,
    actors: HashMap<AnimationId, Actor>,
    /// Actor ids in ascending order.
    order: Vec<AnimationId>,
    last_tick: Option<Instant>,
    queue: TickQueue,
    binds: BindTable,
    rng: Pcg64Mcg,
}

impl Seriko {
    pub fn new(surfaces: Surfaces, cfg: Config) -> Self {
        let rng = cfg.rng();
        Self {
            cfg,
            surfaces,
            current: None,
            actors: HashMap::new(),
            order: Vec::new(),
            last_tick: None,
            queue: TickQueue::new(),
            binds: BindTable::default(),
            rng,
        }
    }

    /// Surface whose actors are currently loaded.
    pub fn current_surface(&self) -> Option<SurfaceId> {
        self.current
    }

    pub fn actor(&self, id: AnimationId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Layer tree of `surface_id`, advanced by the wall-clock time since the
    /// previous call.
    pub fn get(&mut self, surface_id: SurfaceId, resolver: &dyn BindResolver) -> Vec<RenderInfo> {
        if !self.refresh(surface_id, None, resolver) {
            return Vec::new();
        }
        self.render_tree(surface_id)
    }

    /// Like [`Seriko::get`] with an explicit time step in milliseconds.
    pub fn get_with_elapsed(
        &mut self,
        surface_id: SurfaceId,
        elapsed: i64,
        resolver: &dyn BindResolver,
    ) -> Vec<RenderInfo> {
        if !self.refresh(surface_id, Some(elapsed), resolver) {
            return Vec::new();
        }
        self.render_tree(surface_id)
    }

    /// Hit-test layers of `surface_id`, topmost first.
    pub fn get_collision(
        &mut self,
        surface_id: SurfaceId,
        resolver: &dyn BindResolver,
    ) -> Vec<CollisionInfo> {
        if !self.refresh(surface_id, None, resolver) {
            return Vec::new();
        }
        self.collision_layers(surface_id)
    }

    pub fn get_collision_with_elapsed(
        &mut self,
        surface_id: SurfaceId,
        elapsed: i64,
        resolver: &dyn BindResolver,
    ) -> Vec<CollisionInfo> {
        if !self.refresh(surface_id, Some(elapsed), resolver) {
            return Vec::new();
        }
        self.collision_layers(surface_id)
    }

    /// Start animation `id` unless it is already running; it then consumes
    /// `elapsed` within the current tick. Returns whether it started.
    pub fn activate(&mut self, source: Source, id: AnimationId, elapsed: i64) -> bool {
        let binding = self.binds.is_binding(id);
        let Some(actor) = self.actors.get_mut(&id) else {
            log::debug!("seriko: activate of unknown animation {id}");
            return false;
        };
        if actor.is_active() {
            log::trace!("seriko: animation {id} already active");
            return false;
        }
        if !actor.activate(source, binding, &mut self.rng) {
            return false;
        }
        self.queue.push(id, elapsed);
        true
    }

    pub fn inactivate(&mut self, id: AnimationId) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.inactivate();
        }
    }

    pub fn active(&self, id: AnimationId) -> bool {
        match self.actors.get(&id) {
            Some(actor) => actor.is_active(),
            None => {
                log::debug!("seriko: animation {id} not found");
                false
            }
        }
    }

    /// Toggle bind group `id`, cascading to the groups that list it as an add
    /// member. Ignored when the active surface has no animation `id`.
    pub fn bind(&mut self, id: AnimationId, enable: bool, resolver: &dyn BindResolver) {
        let mut visiting = HashSet::new();
        self.bind_inner(id, enable, resolver, &mut visiting);
    }

    fn bind_inner(
        &mut self,
        id: AnimationId,
        enable: bool,
        resolver: &dyn BindResolver,
        visiting: &mut HashSet<AnimationId>,
    ) {
        if !self.actors.contains_key(&id) {
            log::debug!("seriko: bind of unknown animation {id}");
            return;
        }
        if !visiting.insert(id) {
            return;
        }
        self.binds.set_flag(id, enable);
        if enable {
            self.activate(Source::System, id, 0);
        } else {
            self.inactivate(id);
        }
        for group in resolver.add_ids(id) {
            if enable {
                self.binds.add_dependent(group, id);
                self.bind_inner(group, true, resolver, visiting);
            } else if self.binds.remove_dependent(group, id) {
                self.bind_inner(group, false, resolver, visiting);
            }
        }
    }

    pub fn is_binding(&self, id: AnimationId) -> bool {
        self.binds.is_binding(id)
    }

    /// Bring the actors up to date for `surface_id`. Returns false when the
    /// surface does not exist.
    fn refresh(
        &mut self,
        surface_id: SurfaceId,
        elapsed: Option<i64>,
        resolver: &dyn BindResolver,
    ) -> bool {
        if !self.surfaces.contains(surface_id) {
            log::debug!("seriko: no surface {surface_id}");
            return false;
        }
        if self.current != Some(surface_id) {
            self.load_actors(surface_id);
            self.update_bind(resolver);
            self.update(0, true);
        } else {
            let elapsed = elapsed.unwrap_or_else(|| self.wall_clock_elapsed());
            self.update(elapsed, false);
        }
        self.last_tick = Some(Instant::now());
        true
    }

    fn wall_clock_elapsed(&self) -> i64 {
        self.last_tick
            .map(|t| i64::try_from(t.elapsed().as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }

    fn load_actors(&mut self, surface_id: SurfaceId) {
        log::debug!("seriko: switching to surface {surface_id}");
        self.current = Some(surface_id);
        self.actors.clear();
        self.order.clear();
        let Some(surface) = self.surfaces.get(surface_id) else {
            return;
        };
        for (&id, animation) in &surface.animations {
            let animation = animation.with_inserts_spliced(id, &surface.animations);
            self.actors.insert(id, Actor::new(id, animation));
            self.order.push(id);
        }
    }

    /// Seed bind flags never set before from the resolver's defaults.
    fn update_bind(&mut self, resolver: &dyn BindResolver) {
        for id in self.order.clone() {
            if self.binds.flag(id).is_none() {
                let enable = resolver.is_binding_default(id);
                self.bind(id, enable, resolver);
            }
        }
    }

    fn update(&mut self, elapsed: i64, change: bool) {
        self.queue.clear();
        for &id in &self.order {
            let binding = self.binds.is_binding(id);
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            if change {
                actor.activate(Source::System, binding, &mut self.rng);
            }
            if actor.is_active() {
                self.queue.push(id, elapsed);
            }
        }
        self.drain();
    }

    fn drain(&mut self) {
        let mut effects = Vec::new();
        let mut steps: HashMap<AnimationId, usize> = HashMap::new();
        while let Some((id, remaining)) = self.queue.pop() {
            let count = steps.entry(id).or_insert(0);
            *count += 1;
            if *count > self.cfg.max_steps_per_tick {
                if *count == self.cfg.max_steps_per_tick + 1 {
                    log::warn!(
                        "seriko: animation {id} ran more than {} steps in one tick; \
                         dropping the rest of its tick",
                        self.cfg.max_steps_per_tick
                    );
                }
                continue;
            }
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            actor.update(remaining, &mut self.rng, &mut effects);
            for effect in effects.drain(..) {
                match effect {
                    ActorEffect::Start { id: target, elapsed } => {
                        self.activate(Source::Seriko, target, elapsed);
                    }
                    ActorEffect::Stop { id: target } => self.inactivate(target),
                    ActorEffect::Requeue { id, elapsed } => {
                        if self.active(id) {
                            self.queue.push(id, elapsed);
                        }
                    }
                }
            }
        }
    }

    fn render_tree(&self, surface_id: SurfaceId) -> Vec<RenderInfo> {
        let Some(surface) = self.surfaces.get(surface_id) else {
            return Vec::new();
        };
        let mut out: Vec<RenderInfo> = surface
            .elements
            .values()
            .cloned()
            .map(RenderInfo::Element)
            .collect();
        let mut seed = HashSet::new();
        seed.insert(surface_id);
        for id in &self.order {
            let Some(actor) = self.actors.get(id) else {
                continue;
            };
            let animation = actor.animation();
            if animation.is_bind_only() {
                if !self.binds.is_binding(*id) {
                    continue;
                }
                for pattern in &animation.patterns {
                    out.extend(expand_pattern(&self.surfaces, pattern, &mut seed.clone()));
                }
            } else {
                out.extend(expand_pattern(&self.surfaces, actor.displayed(), &mut seed.clone()));
            }
        }
        out
    }

    fn collision_layers(&self, surface_id: SurfaceId) -> Vec<CollisionInfo> {
        let Some(surface) = self.surfaces.get(surface_id) else {
            return Vec::new();
        };
        let mut layers = Vec::new();
        layers.extend(CollisionInfo::sorted(0, 0, surface.collisions.values()));
        for id in &self.order {
            let Some(actor) = self.actors.get(id) else {
                continue;
            };
            let pattern = actor.displayed();
            let Some(shown) = self.surfaces.get(pattern.surface) else {
                continue;
            };
            layers.extend(CollisionInfo::sorted(pattern.x, pattern.y, shown.collisions.values()));
        }
        layers.reverse();
        layers
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::NoBinds;
    use shellkit_surface::parse_descriptor;

    const TEXT: &str = "surface0 {\n\
        element0,base,body.png,0,0\n\
        animation1.interval,never\n\
        animation1.pattern0,overlay,5,100,0,0\n\
        animation2.interval,always\n\
        animation2.pattern0,overlay,5,0,0,0\n\
        }\n\
        surface5 { element0,overlay,eye.png,0,0 }";

    fn seriko() -> Seriko {
        Seriko::new(parse_descriptor(TEXT), Config::with_seed(1))
    }

    #[test]
    fn unknown_surface_is_empty_and_keeps_state() {
        let mut s = seriko();
        assert!(s.get_with_elapsed(99, 0, &NoBinds).is_empty());
        assert_eq!(s.current_surface(), None);
        assert!(!s.get_with_elapsed(0, 0, &NoBinds).is_empty());
        assert!(s.get_with_elapsed(99, 0, &NoBinds).is_empty());
        assert_eq!(s.current_surface(), Some(0));
    }

    #[test]
    fn activate_checks_existence_and_state() {
        let mut s = seriko();
        s.get_with_elapsed(0, 0, &NoBinds);
        assert!(!s.active(1));
        assert!(!s.activate(Source::User, 42, 0));
        assert!(s.activate(Source::User, 1, 0));
        assert!(!s.activate(Source::User, 1, 0));
        assert!(s.active(1));
        s.inactivate(1);
        assert!(!s.active(1));
    }

    #[test]
    fn always_zero_wait_is_bounded_by_elapsed() {
        let mut s = seriko();
        s.get_with_elapsed(0, 0, &NoBinds);
        assert!(s.active(2));
        let tree = s.get_with_elapsed(0, 10_000, &NoBinds);
        assert_eq!(tree.len(), 2);
        assert!(s.active(2));
    }

    #[test]
    fn step_cap_only_stops_the_runaway_animations() {
        // 1 and 2 restart each other forever without consuming time
        let text = "surface0 {\n\
            element0,base,body.png,0,0\n\
            animation1.interval,runonce\n\
            animation1.pattern0,start,2\n\
            animation2.interval,never\n\
            animation2.pattern0,start,1\n\
            animation3.interval,runonce\n\
            animation3.pattern0,overlay,5,100,0,0\n\
            animation3.pattern1,overlay,5,1000,0,0\n\
            }\n\
            surface5 { element0,overlay,eye.png,0,0 }";
        let cfg = Config {
            seed: Some(1),
            max_steps_per_tick: 10,
        };
        let mut s = Seriko::new(parse_descriptor(text), cfg);
        s.get_with_elapsed(0, 0, &NoBinds);
        let tree = s.get_with_elapsed(0, 150, &NoBinds);
        assert_eq!(tree.len(), 2);
        assert_eq!(s.actor(3).map(Actor::remaining_wait), Some(950));
    }
}
