//! State marker components.
//!
//! Exactly one of [`Stepping`] and [`Settled`] sits on every creature. The
//! markers are added and removed by the apply systems after each tick.

use bevy::prelude::*;

/// Marker component indicating the creature has legs in flight.
///
/// Mutually exclusive with [`Settled`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use arthropod_locomotion::prelude::*;
///
/// fn legs_in_flight(stepping: Option<&Stepping>) -> usize {
///     stepping.map_or(0, |s| s.legs)
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct Stepping {
    /// Number of legs currently stepping.
    pub legs: usize,
}

impl Default for Stepping {
    fn default() -> Self {
        Self { legs: 1 }
    }
}

impl Stepping {
    pub fn new(legs: usize) -> Self {
        Self { legs }
    }
}

/// Marker component indicating every leg is planted.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct Settled;
