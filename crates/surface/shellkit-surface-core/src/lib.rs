//! shellkit surface core
//!
//! Data model and descriptor language for layered character shells: surfaces
//! made of image elements, interval-driven animations and hit regions. The
//! runtime that plays these animations lives in `shellkit_seriko`.

pub mod descriptor;
pub mod error;
pub mod idspec;
pub mod loader;
pub mod model;

pub use descriptor::{parse_descriptor, Surfaces};
pub use error::{LoadError, ParseError};
pub use idspec::IdSpec;
pub use loader::{load_shell_dir, LoaderConfig};
pub use model::{
    Animation, AnimationId, Collision, CollisionKind, Element, Interval, Method, Pattern, Surface,
    SurfaceId, NO_SURFACE,
};
