//! Scenario files.
//!
//! A scenario describes a host (`[host]`) and a list of frames (`[[frames]]`).
//! Per-frame fields are optional: an absent pose, flag or collider list keeps
//! the previous frame's value, so only changes need to be written down.
//!
//! ```toml
//! [host]
//! slot_count = 3
//! equipped = [0, 1]
//! actions = ["VR Actions/ResetHeight", "GripLeft"]
//! keys = ["Interact"]
//!
//! [[frames]]
//! context = true
//! press = ["GripLeft", "VR Actions/ResetHeight"]
//! head = { position = [0.0, 1.6, 0.0], forward = [0.0, 0.0, 1.0] }
//! actor = [0.0, 0.0, 2.0]
//! ```

use crate::error::{BridgeError, Result};
use crate::spatial::Pose;
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Upper bound on scripted slots.
pub const MAX_SLOTS: usize = 16;

/// A pose written as position plus forward.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PoseScript {
    pub position: Vec3,
    pub forward: Vec3,
}

impl PoseScript {
    pub fn to_pose(self) -> Pose {
        Pose::looking(self.position, self.forward)
    }
}

/// A sphere collider for scripted raycasts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

/// Static host description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostScript {
    pub left_handed: bool,
    /// Ability slots exposed by the manager; 0 means the manager is absent.
    pub slot_count: usize,
    /// Slots holding an ability at start.
    pub equipped: Vec<usize>,
    /// Registered action names, in registry order.
    pub actions: Vec<String>,
    /// Symbolic keys known to the host's input layer.
    pub keys: Vec<String>,
    /// Current low-level path per key name.
    pub key_paths: BTreeMap<String, String>,
    /// Host calls that fail on every invocation (`input_down`, `input_hold`,
    /// `input_up`, `orientation`, `set_orientation`).
    pub failing_calls: Vec<String>,
    /// Initial avatar yaw in degrees.
    pub avatar_yaw_degrees: f32,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            left_handed: false,
            slot_count: 3,
            equipped: vec![0],
            actions: Vec::new(),
            keys: Vec::new(),
            key_paths: BTreeMap::new(),
            failing_calls: Vec::new(),
            avatar_yaw_degrees: 0.0,
        }
    }
}

/// Changes applied at the start of one frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameScript {
    pub context: Option<bool>,
    /// Inputs that go down this frame (and stay held).
    pub press: Vec<String>,
    /// Inputs that come up this frame.
    pub release: Vec<String>,
    pub equipped: Option<Vec<usize>>,
    /// Key name to new low-level path.
    pub rebind: BTreeMap<String, String>,
    pub stick: Option<Vec2>,
    pub head: Option<PoseScript>,
    pub left_ray: Option<PoseScript>,
    pub right_ray: Option<PoseScript>,
    pub left_hand: Option<PoseScript>,
    pub right_hand: Option<PoseScript>,
    pub head_transform: Option<PoseScript>,
    pub camera: Option<PoseScript>,
    pub actor: Option<Vec3>,
    pub colliders: Option<Vec<SphereCollider>>,
    /// Names whose suppression flags are reported after the tick.
    pub probe: Vec<String>,
    /// Names of pose sources that disappear from this frame on
    /// (`head`, `left_ray`, `right_ray`, `left_hand`, `right_hand`,
    /// `head_transform`, `camera`, `actor`).
    pub lose: Vec<String>,
}

/// A complete replay script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub host: HostScript,
    pub frames: Vec<FrameScript>,
}

const POSE_SOURCES: &[&str] = &[
    "head",
    "left_ray",
    "right_ray",
    "left_hand",
    "right_hand",
    "head_transform",
    "camera",
    "actor",
];

const HOST_CALLS: &[&str] = &[
    "input_down",
    "input_hold",
    "input_up",
    "orientation",
    "set_orientation",
];

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(contents).map_err(|e| BridgeError::parse("scenario", e))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BridgeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => BridgeError::file_error(format!("Failed to read {}", path.display()), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject scripts the scripted host cannot represent.
    pub fn validate(&self) -> Result<()> {
        let host = &self.host;
        if host.slot_count > MAX_SLOTS {
            return Err(BridgeError::scenario(format!(
                "slot_count {} exceeds {MAX_SLOTS}",
                host.slot_count
            )));
        }

        let check_slots = |slots: &[usize], context: &str| -> Result<()> {
            match slots.iter().find(|slot| **slot >= host.slot_count) {
                Some(slot) => Err(BridgeError::scenario(format!(
                    "{context}: slot {slot} is outside 0..{}",
                    host.slot_count
                ))),
                None => Ok(()),
            }
        };
        check_slots(&host.equipped, "host.equipped")?;

        for call in &host.failing_calls {
            if !HOST_CALLS.contains(&call.as_str()) {
                return Err(BridgeError::scenario(format!("unknown host call `{call}`")));
            }
        }

        for (index, frame) in self.frames.iter().enumerate() {
            if let Some(equipped) = &frame.equipped {
                check_slots(equipped, &format!("frames[{index}].equipped"))?;
            }
            if let Some(lost) = frame
                .lose
                .iter()
                .find(|name| !POSE_SOURCES.contains(&name.as_str()))
            {
                return Err(BridgeError::scenario(format!(
                    "frames[{index}]: unknown pose source `{lost}`"
                )));
            }
            if let Some(collider) = frame
                .colliders
                .iter()
                .flatten()
                .find(|collider| collider.radius.is_nan() || collider.radius <= 0.0)
            {
                return Err(BridgeError::scenario(format!(
                    "frames[{index}]: collider radius {} must be positive",
                    collider.radius
                )));
            }
        }

        Ok(())
    }
}
