//! # `arthropod_locomotion`
//!
//! Procedural locomotion for multi-legged creatures, with physics backend
//! abstraction.
//!
//! Every fixed tick, this crate:
//! - Smooths the body's displacement into a velocity estimate
//! - Schedules steps in two alternating leg groups (or farthest leg first)
//! - Predicts where each stepping leg should land and matches it to terrain
//!   with directional sphere casts
//! - Moves stepping legs along a half-sine arc while planted legs stay pinned
//! - Re-orients the body from the geometry of its legs
//!
//! A leg-less variant ([`support::Crawler`]) hugs terrain with a ring of
//! probes instead.
//!
//! ## Architecture
//!
//! The core ([`creature::Creature`], [`support::Crawler`]) is plain data
//! driven by an explicit `tick`. It never touches the scene graph; it reads
//! and writes a [`pose::BodyPose`] and queries terrain through
//! [`backend::TerrainProbe`]. The ECS layer builds poses from `Transform`s,
//! lets a backend supply the probe, and copies leg positions to IK targets.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use arthropod_locomotion::prelude::*;
//!
//! let rest = vec![
//!     Vec3::new(-0.5, -0.5, -0.5),
//!     Vec3::new(0.5, -0.5, 0.5),
//!     Vec3::new(0.5, -0.5, -0.5),
//!     Vec3::new(-0.5, -0.5, 0.5),
//! ];
//! let creature = Creature::new(LocomotionConfig::arthropod(), rest).unwrap();
//!
//! // Spawn it on a top-level body entity, with `LegTargets` naming the
//! // entities that should follow each foot.
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod creature;
pub mod detection;
pub mod error;
pub mod gait;
pub mod intent;
pub mod leg;
pub mod orientation;
pub mod placement;
pub mod pose;
pub mod state;
pub mod support;
pub mod systems;
pub mod terrain;
pub mod velocity;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{LocomotionBackend, ProbeRay, TerrainProbe};
    pub use crate::collision::ProbeHit;
    pub use crate::config::{GaitPolicy, LocomotionConfig, SupportConfig};
    pub use crate::creature::{Creature, TickReport};
    pub use crate::detection::TerrainSample;
    pub use crate::error::ConfigError;
    pub use crate::intent::MovementIntent;
    pub use crate::leg::{Leg, LegGroup, StepMotion};
    pub use crate::pose::{BodyPose, ReferenceFrame};
    pub use crate::state::{Settled, Stepping};
    pub use crate::support::{Crawler, SupportEstimate};
    pub use crate::systems::{LegTargets, StaticTerrainBackend};
    pub use crate::terrain::{PlaneTerrain, TerrainGap, TerrainSet};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
}

/// System sets for the locomotion pipeline, chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Backend systems tick every creature and crawler.
    Tick,
    /// Leg targets and state markers are synced.
    Apply,
}

/// Main plugin for the locomotion system.
///
/// This plugin is generic over a backend `B`, which supplies the terrain
/// probes and therefore the tick systems.
///
/// # Examples
///
/// With Rapier3D:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use arthropod_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<creature::Creature>();
        app.register_type::<support::Crawler>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<pose::ReferenceFrame>();
        app.register_type::<state::Stepping>();
        app.register_type::<state::Settled>();
        app.register_type::<systems::LegTargets>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<config::SupportConfig>();

        app.configure_sets(
            FixedUpdate,
            (LocomotionSet::Tick, LocomotionSet::Apply).chain(),
        );

        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::sync_leg_targets, systems::sync_state_markers)
                .in_set(LocomotionSet::Apply),
        );
    }
}
