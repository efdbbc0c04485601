//! shellkit seriko core
//!
//! Animation runtime for layered character shells. A [`Seriko`] owns one
//! [`Actor`] per animation of the active surface, advances them in time,
//! resolves cross-animation triggers and bind groups, and produces the
//! [`RenderInfo`] layer tree plus the [`CollisionInfo`] layers that
//! [`hit_test`] resolves points against.

pub mod actor;
pub mod bind;
pub mod character;
pub mod config;
pub mod hittest;
pub mod queue;
pub mod render;
pub mod seriko;

pub use actor::{Actor, ActorEffect, Source};
pub use bind::{side_name, BindCatalog, BindFlag, BindResolver, BindTable, NoBinds};
pub use character::Character;
pub use config::Config;
pub use hittest::hit_test;
pub use queue::TickQueue;
pub use render::{CollisionInfo, ElementWithChildren, RenderInfo};
pub use seriko::Seriko;
