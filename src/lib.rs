//! # aimbridge - VR aim resolution and ability slot arbitration
//!
//! A frame-synchronous input bridge for spectate-mode VR play. Each frame it
//! turns partially-available tracked poses into a usable aim direction, and
//! multiplexes one physical trigger onto several logical ability slots without
//! letting the host's legacy input paths react to the same press twice.
//!
//! ## Features
//!
//! - **Aim Source Resolution**: controller ray, tracked hand and head fallbacks,
//!   raycast pull targets that skip the actor's own body
//! - **Ability Slot Arbitration**: at most one slot open, orientation override
//!   restored on every exit path, frame-precise suppression windows
//! - **Binding Resolution**: exact name, symbolic key, discovery scan and static
//!   fallback strategies with lazy re-resolution after a remap
//! - **Scenario Replay**: a scripted host adapter for tests and the CLI
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - TOML configuration, defaults, clamping and legacy migration
//! - [`spatial`] - Poses, ray sources and the spatial provider trait
//! - [`host`] - The narrow host adapter boundary
//! - [`aim`] - Aim source resolution and movement direction
//! - [`binding`] - Input binding resolution
//! - [`arbiter`] - Ability slot state machine
//! - [`bridge`] - Per-frame facade over one host adapter
//! - [`replay`] - Scripted host and scenario runner

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Inputs
pub mod binding;
pub mod host;
pub mod spatial;

// Core components
pub mod aim;
pub mod arbiter;
pub mod bridge;

// Scripted host
pub mod replay;

// Re-export commonly used types for convenience
pub use error::{BridgeError, Result};

// Public API surface for external usage
pub use aim::{AimRequest, AimResolution, AimSourceResolver, RaycastHit, RaycastService};
pub use arbiter::{AbilitySlotArbiter, ArbiterGate, ArbitrationState, SlotRole, SlotSignal};
pub use binding::{BindingHandle, BindingRegistry, ButtonState, InputBindingResolver, InputKey};
pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use host::HostAdapter;
pub use spatial::{GripSelection, Hand, Pose, SpatialSourceProvider};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
