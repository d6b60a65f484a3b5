//! Spatial inputs: poses, ray sources, and the provider trait the host implements.
//!
//! World convention: Y is up and +Z is forward, so a pose's forward vector is
//! `rotation * Vec3::Z`.

pub mod grip;

use glam::{Mat3, Quat, Vec3};
use std::fmt;

pub use grip::GripSelection;

/// World up axis.
pub const UP: Vec3 = Vec3::Y;
/// Canonical forward used when nothing better exists.
pub const FORWARD: Vec3 = Vec3::Z;
/// Squared-length threshold below which a direction is treated as unusable.
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// A tracked hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn from_left(use_left: bool) -> Self {
        if use_left {
            Hand::Left
        } else {
            Hand::Right
        }
    }

    pub fn other(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

/// Position plus orientation of a tracked transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` facing `forward`. Degenerate forwards keep the identity rotation.
    pub fn looking(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            rotation: look_rotation(forward).unwrap_or(Quat::IDENTITY),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }
}

/// Where a ray source came from. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaySourceKind {
    /// HMD camera, used when aiming with the head.
    HeadHmd,
    /// Engine-native controller ray interactor.
    ControllerRay(Hand),
    /// Raw tracked hand transform.
    TrackedHand(Hand),
    /// Secondary hand reported by the player rig.
    SecondaryHand,
    /// Generic tracking head transform, last resort in controller mode.
    HeadTransform,
}

impl fmt::Display for RaySourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaySourceKind::HeadHmd => write!(f, "head-hmd"),
            RaySourceKind::ControllerRay(hand) => write!(f, "ray-{}", hand.as_str()),
            RaySourceKind::TrackedHand(hand) => write!(f, "tracked-{}", hand.as_str()),
            RaySourceKind::SecondaryHand => write!(f, "tracked-secondary"),
            RaySourceKind::HeadTransform => write!(f, "head-transform"),
        }
    }
}

/// Transient ray origin and forward for one aim resolution. `forward` need not be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySource {
    pub origin: Vec3,
    pub forward: Vec3,
    pub kind: RaySourceKind,
}

impl RaySource {
    pub fn from_pose(pose: Pose, kind: RaySourceKind) -> Self {
        Self {
            origin: pose.position,
            forward: pose.forward(),
            kind,
        }
    }
}

/// Read-only access to the host's tracked poses. Every getter may report `None`
/// on any frame; callers fall back instead of failing.
pub trait SpatialSourceProvider {
    /// HMD camera pose (or the spectate camera when the HMD camera is unavailable).
    fn head_pose(&self) -> Option<Pose>;

    /// Engine-native controller ray for `hand`, if the interactor exists.
    fn controller_ray(&self, hand: Hand) -> Option<Pose>;

    /// Directly tracked transform for `hand`.
    fn hand_pose(&self, hand: Hand) -> Option<Pose>;

    /// The rig's secondary hand transform, used when the preferred tracked hand is missing.
    fn secondary_hand_pose(&self) -> Option<Pose> {
        None
    }

    /// Generic tracking head transform.
    fn head_transform(&self) -> Option<Pose>;

    /// Spectate camera pose used for the aligned forward.
    fn camera_pose(&self) -> Option<Pose>;

    /// Forward captured when the spectate camera was last aligned, if any.
    fn base_forward(&self) -> Option<Vec3> {
        None
    }

    /// Whether the host reports the dominant hand as the left one.
    fn dominant_hand_is_left(&self) -> bool;

    /// Position of the actor being aimed for (the entity that will move or act).
    fn reference_actor_position(&self) -> Option<Vec3>;

    /// Camera forward flattened onto the horizontal plane, `+Z` when unavailable.
    fn aligned_forward(&self) -> Vec3 {
        let Some(camera) = self.camera_pose() else {
            return FORWARD;
        };

        let forward = camera.forward();
        let planar = project_on_horizontal(forward);
        if planar.length_squared() >= DIRECTION_EPSILON {
            return planar.normalize();
        }

        // Looking straight up or down: keep whatever horizontal component survives.
        Vec3::new(forward.x, 0.0, forward.z)
            .try_normalize()
            .unwrap_or(FORWARD)
    }

    /// Captured base forward, else the aligned forward.
    fn resolved_base_forward(&self) -> Vec3 {
        self.base_forward()
            .filter(|forward| forward.length_squared() >= DIRECTION_EPSILON)
            .map(Vec3::normalize)
            .unwrap_or_else(|| self.aligned_forward())
    }
}

/// Project onto the horizontal plane (drop the up component).
pub fn project_on_horizontal(v: Vec3) -> Vec3 {
    v - UP * v.dot(UP)
}

/// Rotation whose forward is `forward` and whose up is as close to world up as possible.
///
/// Returns `None` when `forward` is degenerate or parallel to up.
pub fn look_rotation(forward: Vec3) -> Option<Quat> {
    let forward = forward.try_normalize()?;
    let right = UP.cross(forward);
    if right.length_squared() < DIRECTION_EPSILON {
        return None;
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}
