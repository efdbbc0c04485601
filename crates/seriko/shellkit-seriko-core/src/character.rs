//! Thread-safe facade over one [`Seriko`] for a single on-screen character.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shellkit_surface::{AnimationId, SurfaceId, NO_SURFACE};

use crate::actor::Source;
use crate::bind::{BindFlag, BindResolver};
use crate::hittest::hit_test;
use crate::render::RenderInfo;
use crate::seriko::Seriko;

struct State {
    seriko: Seriko,
    surface: SurfaceId,
    origin: (i32, i32),
}

/// One character: its animation runtime, bind information, current surface
/// and window origin. Every entry point takes the same lock.
pub struct Character<R: BindResolver> {
    state: Mutex<State>,
    resolver: R,
}

impl<R: BindResolver> Character<R> {
    pub fn new(seriko: Seriko, resolver: R) -> Self {
        Self {
            state: Mutex::new(State {
                seriko,
                surface: NO_SURFACE,
                origin: (0, 0),
            }),
            resolver,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_surface(&self, id: SurfaceId) {
        self.lock().surface = id;
    }

    pub fn surface(&self) -> SurfaceId {
        self.lock().surface
    }

    pub fn set_origin(&self, x: i32, y: i32) {
        self.lock().origin = (x, y);
    }

    pub fn start_animation(&self, id: AnimationId) -> bool {
        self.lock().seriko.activate(Source::User, id, 0)
    }

    pub fn is_playing_animation(&self, id: AnimationId) -> bool {
        self.lock().seriko.active(id)
    }

    pub fn bind(&self, id: AnimationId, flag: BindFlag) {
        let mut state = self.lock();
        let enable = flag.resolve(state.seriko.is_binding(id));
        state.seriko.bind(id, enable, &self.resolver);
    }

    pub fn is_binding(&self, id: AnimationId) -> bool {
        self.lock().seriko.is_binding(id)
    }

    /// Layer tree of the current surface.
    pub fn render(&self) -> Vec<RenderInfo> {
        let mut state = self.lock();
        let surface = state.surface;
        state.seriko.get(surface, &self.resolver)
    }

    /// [`Character::render`] with an explicit time step in milliseconds.
    pub fn render_with_elapsed(&self, elapsed: i64) -> Vec<RenderInfo> {
        let mut state = self.lock();
        let surface = state.surface;
        state.seriko.get_with_elapsed(surface, elapsed, &self.resolver)
    }

    /// Collision id under the screen point (x, y), if any.
    pub fn hit_box_name(&self, x: i32, y: i32) -> Option<String> {
        let mut state = self.lock();
        let surface = state.surface;
        let (ox, oy) = state.origin;
        let layers = state.seriko.get_collision(surface, &self.resolver);
        let (x, y) = (i64::from(x) - i64::from(ox), i64::from(y) - i64::from(oy));
        hit_test(&layers, x, y).map(str::to_string)
    }
}
