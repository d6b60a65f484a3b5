//! Narrow host adapter boundary.
//!
//! Everything the bridge needs from the game lives behind these traits: pose
//! access, raycasts, the binding registry, the ability manager and the avatar
//! orientation. One concrete adapter exists per host version; all brittle
//! coupling to host internals stays inside that adapter.
//!
//! Every fallible call returns [`Result`]. Callers treat an error as
//! "no effect this frame" and never propagate it out of a frame tick.

use crate::aim::RaycastService;
use crate::binding::BindingRegistry;
use crate::error::Result;
use crate::spatial::SpatialSourceProvider;
use glam::Quat;

/// The host's ability manager: equipped state and the three per-slot input callbacks.
pub trait AbilityHost {
    /// Number of ability slots the manager exposes (0 when the manager is absent).
    fn slot_count(&self) -> usize;

    /// Whether `slot` currently holds an ability.
    fn has_equipped_ability(&self, slot: usize) -> Result<bool>;

    fn input_down(&mut self, slot: usize) -> Result<()>;

    fn input_hold(&mut self, slot: usize) -> Result<()>;

    fn input_up(&mut self, slot: usize) -> Result<()>;
}

/// The avatar whose orientation is temporarily overridden while a slot is active.
pub trait AvatarHost {
    fn orientation(&self) -> Result<Quat>;

    fn set_orientation(&mut self, rotation: Quat) -> Result<()>;
}

/// Host-side mode flags.
pub trait ContextProbe {
    /// True while the local player is spectating the actor in VR.
    fn spectate_context_active(&self) -> bool;
}

/// Everything the bridge consumes from one host version.
pub trait HostAdapter:
    SpatialSourceProvider + RaycastService + BindingRegistry + AbilityHost + AvatarHost + ContextProbe
{
}

impl<T> HostAdapter for T where
    T: SpatialSourceProvider
        + RaycastService
        + BindingRegistry
        + AbilityHost
        + AvatarHost
        + ContextProbe
{
}
