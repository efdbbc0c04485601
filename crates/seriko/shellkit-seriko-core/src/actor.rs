//! Per-animation state machine.
//!
//! An [`Actor`] steps through the patterns of one animation. It never touches
//! its siblings directly: cross-animation triggers come back to the caller as
//! [`ActorEffect`] values, which [`Seriko`](crate::Seriko) applies in order.

use rand::Rng;
use serde::{Deserialize, Serialize};
use shellkit_surface::{Animation, AnimationId, Interval, Method, Pattern, NO_SURFACE};

/// Who asked for an activation. Each source may only start animations with
/// matching interval tags.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Automatic start on surface change.
    System,
    /// Started by another animation.
    Seriko,
    /// Explicit host request.
    User,
    YenE,
    Talk,
}

const FROM_SYSTEM: &[Interval] = &[
    Interval::Sometimes,
    Interval::Rarely,
    Interval::Random,
    Interval::Periodic,
    Interval::Always,
    Interval::Runonce,
];

const FROM_USER: &[Interval] = &[
    Interval::Sometimes,
    Interval::Rarely,
    Interval::Random,
    Interval::Periodic,
    Interval::Always,
    Interval::Runonce,
    Interval::Never,
    Interval::YenE,
    Interval::Talk,
];

impl Source {
    fn allows(self, animation: &Animation) -> bool {
        let accepted: &[Interval] = match self {
            Source::System => FROM_SYSTEM,
            Source::Seriko | Source::User => FROM_USER,
            Source::YenE => &[Interval::YenE],
            Source::Talk => &[Interval::Talk],
        };
        accepted.iter().any(|i| animation.has(*i))
    }
}

/// Side effect requested by [`Actor::update`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActorEffect {
    /// Activate animation `id` and let it consume `elapsed` in this tick.
    Start { id: AnimationId, elapsed: i64 },
    Stop { id: AnimationId },
    /// Re-run the emitting actor with what is left of the tick.
    Requeue { id: AnimationId, elapsed: i64 },
}

#[derive(Clone, Debug)]
pub struct Actor {
    id: AnimationId,
    animation: Animation,
    index: usize,
    active: bool,
    /// Finished a bind animation: stays active but is not re-armed.
    parked: bool,
    wait: i64,
    displayed: Pattern,
    /// Always-animation without any wait: bound the steps per tick.
    loop_guard: bool,
}

impl Actor {
    pub fn new(id: AnimationId, animation: Animation) -> Self {
        let loop_guard = animation.has(Interval::Always) && animation.total_wait() == 0;
        Self {
            id,
            animation,
            index: 0,
            active: false,
            parked: false,
            wait: 0,
            displayed: Pattern::hidden(),
            loop_guard,
        }
    }

    pub fn id(&self) -> AnimationId {
        self.id
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Index of the pattern that runs next.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Milliseconds left before the current pattern runs.
    pub fn remaining_wait(&self) -> i64 {
        self.wait
    }

    /// Last synthesis pattern reached, or the hidden sentinel.
    pub fn displayed(&self) -> &Pattern {
        &self.displayed
    }

    pub fn inactivate(&mut self) {
        self.active = false;
        self.parked = false;
        self.displayed = Pattern::hidden();
    }

    /// Try to start from the first pattern. `binding` is the bind state of
    /// this animation id. Returns whether the actor was (re)started.
    pub fn activate<R: Rng + ?Sized>(
        &mut self,
        source: Source,
        binding: bool,
        rng: &mut R,
    ) -> bool {
        if self.animation.patterns.is_empty() {
            log::debug!("animation {}: no patterns", self.id);
            return false;
        }
        if self.animation.has(Interval::Bind) && !binding {
            return false;
        }
        if !source.allows(&self.animation) {
            return false;
        }
        self.inactivate();
        self.active = true;
        self.index = 0;
        self.wait = sample_wait(&self.animation.patterns[0], rng);
        true
    }

    /// Consume `elapsed` milliseconds. At most one pattern runs per call;
    /// leftover time is handed back through [`ActorEffect::Requeue`].
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        elapsed: i64,
        rng: &mut R,
        effects: &mut Vec<ActorEffect>,
    ) {
        if !self.active || self.parked {
            return;
        }
        if elapsed < self.wait {
            self.wait -= elapsed;
            return;
        }
        let mut elapsed = elapsed - self.wait;
        self.wait = 0;
        if self.loop_guard {
            elapsed = self.skip_whole_rounds(elapsed);
        }

        let pattern = &self.animation.patterns[self.index];
        match pattern.method {
            m if m.is_synthesizable() => self.displayed = pattern.clone(),
            Method::Move => {
                if self.displayed.surface != NO_SURFACE {
                    self.displayed.x = pattern.x;
                    self.displayed.y = pattern.y;
                }
            }
            Method::Start => {
                if let Some(&id) = pattern.targets.first() {
                    effects.push(ActorEffect::Start { id, elapsed });
                }
            }
            Method::Stop => {
                if let Some(&id) = pattern.targets.first() {
                    effects.push(ActorEffect::Stop { id });
                }
            }
            Method::AlternativeStart => {
                if let Some(id) = pick(&pattern.targets, rng) {
                    effects.push(ActorEffect::Start { id, elapsed });
                }
            }
            Method::AlternativeStop => {
                if let Some(id) = pick(&pattern.targets, rng) {
                    effects.push(ActorEffect::Stop { id });
                }
            }
            Method::ParallelStart => {
                effects.extend(
                    pattern
                        .targets
                        .iter()
                        .map(|&id| ActorEffect::Start { id, elapsed }),
                );
            }
            Method::ParallelStop => {
                effects.extend(pattern.targets.iter().map(|&id| ActorEffect::Stop { id }));
            }
            Method::Insert => {
                log::debug!("animation {}: unresolved insert {:?}", self.id, pattern.targets);
            }
            _ => {}
        }

        self.index += 1;
        if self.index == self.animation.patterns.len() {
            self.index = 0;
            match self.rearm_wait(rng) {
                Some(wait) => self.wait = wait,
                None => {
                    if self.animation.has(Interval::Bind) {
                        self.parked = true;
                    } else {
                        self.inactivate();
                    }
                    return;
                }
            }
        } else {
            self.wait = sample_wait(&self.animation.patterns[self.index], rng);
        }

        if self.loop_guard {
            elapsed -= 1;
            if elapsed < 0 {
                return;
            }
        }
        effects.push(ActorEffect::Requeue { id: self.id, elapsed });
    }

    /// A guarded loop runs one pattern per millisecond and every round leaves
    /// the same state behind, so only the last one or two rounds of `elapsed`
    /// need to run. Returns the elapsed time that is left to step through.
    fn skip_whole_rounds(&self, elapsed: i64) -> i64 {
        let len = self.animation.patterns.len() as i64;
        let runs = elapsed + 1;
        if runs < 2 * len {
            return elapsed;
        }
        elapsed - (runs / len - 1) * len
    }

    /// Wait before the next round after the last pattern, or `None` when the
    /// animation does not repeat.
    fn rearm_wait<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        let anim = &self.animation;
        if anim.has(Interval::Always) {
            return Some(sample_wait(&anim.patterns[0], rng));
        }
        let chance = if anim.has(Interval::Sometimes) {
            2.0
        } else if anim.has(Interval::Rarely) {
            4.0
        } else if anim.has(Interval::Random) {
            f64::from(anim.interval_factor)
        } else if anim.has(Interval::Periodic) {
            return Some(i64::from(anim.interval_factor) * 1000);
        } else {
            return None;
        };
        let mut x: f64 = rng.random();
        while x == 0.0 {
            x = rng.random();
        }
        // seconds until the first success of a 1-in-`chance` roll per second
        let seconds = (-chance.ln() / x.ln()).ceil().max(1.0);
        Some((seconds * 1000.0) as i64)
    }
}

fn sample_wait<R: Rng + ?Sized>(pattern: &Pattern, rng: &mut R) -> i64 {
    if pattern.wait_min >= pattern.wait_max {
        i64::from(pattern.wait_min)
    } else {
        i64::from(rng.random_range(pattern.wait_min..=pattern.wait_max))
    }
}

fn pick<R: Rng + ?Sized>(targets: &[AnimationId], rng: &mut R) -> Option<AnimationId> {
    if targets.is_empty() {
        return None;
    }
    Some(targets[rng.random_range(0..targets.len())])
}
