//! A host adapter driven by a scenario script.

use crate::aim::{RaycastHit, RaycastService};
use crate::binding::{BindingHandle, BindingRegistry, ButtonState, InputKey};
use crate::error::{BridgeError, Result};
use crate::host::{AbilityHost, AvatarHost, ContextProbe};
use crate::replay::scenario::{FrameScript, HostScript, PoseScript, SphereCollider};
use crate::spatial::{Hand, Pose, SpatialSourceProvider};
use glam::{Quat, Vec3};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One observable side effect on the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    InputDown(usize),
    InputHold(usize),
    InputUp(usize),
    Orientation(Quat),
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::InputDown(slot) => write!(f, "down slot={slot}"),
            HostEvent::InputHold(slot) => write!(f, "hold slot={slot}"),
            HostEvent::InputUp(slot) => write!(f, "up slot={slot}"),
            HostEvent::Orientation(rotation) => {
                let forward = *rotation * Vec3::Z;
                let yaw = forward.x.atan2(forward.z).to_degrees();
                write!(f, "orient yaw={yaw:.1}")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Poses {
    head: Option<Pose>,
    left_ray: Option<Pose>,
    right_ray: Option<Pose>,
    left_hand: Option<Pose>,
    right_hand: Option<Pose>,
    head_transform: Option<Pose>,
    camera: Option<Pose>,
    actor: Option<Vec3>,
}

impl Poses {
    fn apply(&mut self, frame: &FrameScript) {
        let update = |slot: &mut Option<Pose>, script: Option<PoseScript>| {
            if let Some(script) = script {
                *slot = Some(script.to_pose());
            }
        };
        update(&mut self.head, frame.head);
        update(&mut self.left_ray, frame.left_ray);
        update(&mut self.right_ray, frame.right_ray);
        update(&mut self.left_hand, frame.left_hand);
        update(&mut self.right_hand, frame.right_hand);
        update(&mut self.head_transform, frame.head_transform);
        update(&mut self.camera, frame.camera);
        if let Some(actor) = frame.actor {
            self.actor = Some(actor);
        }

        for name in &frame.lose {
            match name.as_str() {
                "head" => self.head = None,
                "left_ray" => self.left_ray = None,
                "right_ray" => self.right_ray = None,
                "left_hand" => self.left_hand = None,
                "right_hand" => self.right_hand = None,
                "head_transform" => self.head_transform = None,
                "camera" => self.camera = None,
                "actor" => self.actor = None,
                _ => {}
            }
        }
    }
}

/// Scripted host: poses, inputs and ability slots advance frame by frame, and
/// every callback the bridge issues is recorded.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    left_handed: bool,
    slot_count: usize,
    equipped: BTreeSet<usize>,
    actions: Vec<String>,
    keys: BTreeSet<InputKey>,
    key_paths: BTreeMap<InputKey, String>,
    failing_calls: BTreeSet<String>,
    context: bool,
    poses: Poses,
    colliders: Vec<SphereCollider>,
    held: BTreeSet<String>,
    pressed: BTreeSet<String>,
    released: BTreeSet<String>,
    orientation: Quat,
    events: Vec<HostEvent>,
}

impl ScriptedHost {
    pub fn new(script: &HostScript) -> Self {
        let keys = script
            .keys
            .iter()
            .filter_map(|name| InputKey::parse(name))
            .collect();
        let key_paths = script
            .key_paths
            .iter()
            .filter_map(|(name, path)| InputKey::parse(name).map(|key| (key, path.clone())))
            .collect();

        Self {
            left_handed: script.left_handed,
            slot_count: script.slot_count,
            equipped: script.equipped.iter().copied().collect(),
            actions: script.actions.clone(),
            keys,
            key_paths,
            failing_calls: script.failing_calls.iter().cloned().collect(),
            context: false,
            poses: Poses::default(),
            colliders: Vec::new(),
            held: BTreeSet::new(),
            pressed: BTreeSet::new(),
            released: BTreeSet::new(),
            orientation: Quat::from_rotation_y(script.avatar_yaw_degrees.to_radians()),
            events: Vec::new(),
        }
    }

    /// Apply one frame's changes. Edge sets from the previous frame are cleared.
    pub fn begin_frame(&mut self, frame: &FrameScript) {
        self.pressed.clear();
        self.released.clear();

        if let Some(context) = frame.context {
            self.context = context;
        }
        if let Some(equipped) = &frame.equipped {
            self.equipped = equipped.iter().copied().collect();
        }
        for (name, path) in &frame.rebind {
            if let Some(key) = InputKey::parse(name) {
                self.key_paths.insert(key, path.clone());
            }
        }
        for name in &frame.release {
            if self.held.remove(name) {
                self.released.insert(name.clone());
            }
        }
        for name in &frame.press {
            if self.held.insert(name.clone()) {
                self.pressed.insert(name.clone());
            }
        }

        self.poses.apply(frame);
        if let Some(colliders) = &frame.colliders {
            self.colliders = colliders.clone();
        }
    }

    pub fn current_orientation(&self) -> Quat {
        self.orientation
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Input name a handle is observed through.
    fn input_name(handle: &BindingHandle) -> &str {
        match handle {
            BindingHandle::Action(name) => name.as_str(),
            BindingHandle::Key(key) => key.as_str(),
            BindingHandle::Mirrored { path, .. } => path.as_str(),
        }
    }

    fn check(&self, call: &str) -> Result<()> {
        if self.failing_calls.contains(call) {
            return Err(BridgeError::host_call(call, "scripted failure"));
        }
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.slot_count {
            return Err(BridgeError::unavailable(format!("ability slot {slot}")));
        }
        Ok(())
    }
}

impl SpatialSourceProvider for ScriptedHost {
    fn head_pose(&self) -> Option<Pose> {
        self.poses.head.or(self.poses.camera)
    }

    fn controller_ray(&self, hand: Hand) -> Option<Pose> {
        match hand {
            Hand::Left => self.poses.left_ray,
            Hand::Right => self.poses.right_ray,
        }
    }

    fn hand_pose(&self, hand: Hand) -> Option<Pose> {
        match hand {
            Hand::Left => self.poses.left_hand,
            Hand::Right => self.poses.right_hand,
        }
    }

    fn secondary_hand_pose(&self) -> Option<Pose> {
        // The rig's secondary hand is the one opposite the dominant hand.
        self.hand_pose(Hand::from_left(!self.left_handed))
    }

    fn head_transform(&self) -> Option<Pose> {
        self.poses.head_transform
    }

    fn camera_pose(&self) -> Option<Pose> {
        self.poses.camera
    }

    fn dominant_hand_is_left(&self) -> bool {
        self.left_handed
    }

    fn reference_actor_position(&self) -> Option<Vec3> {
        self.poses.actor
    }
}

impl RaycastService for ScriptedHost {
    fn cast_all(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RaycastHit> {
        let Some(direction) = direction.try_normalize() else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for collider in &self.colliders {
            let offset = origin - collider.center;
            let b = offset.dot(direction);
            let c = offset.length_squared() - collider.radius * collider.radius;
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }

            let root = discriminant.sqrt();
            for distance in [-b - root, -b + root] {
                if (0.0..=max_distance).contains(&distance) {
                    let point = origin + direction * distance;
                    hits.push(RaycastHit {
                        distance,
                        point,
                        normal: (point - collider.center) / collider.radius,
                    });
                }
            }
        }
        hits
    }
}

impl BindingRegistry for ScriptedHost {
    fn action_names(&self) -> Vec<String> {
        self.actions.clone()
    }

    fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|action| action == name)
    }

    fn has_key(&self, key: InputKey) -> bool {
        self.keys.contains(&key)
    }

    fn key_binding_path(&self, key: InputKey) -> Option<String> {
        self.key_paths.get(&key).cloned()
    }

    fn query(&self, handle: &BindingHandle) -> Option<ButtonState> {
        let live = match handle {
            BindingHandle::Action(name) => self.has_action(name),
            BindingHandle::Key(key) => self.has_key(*key),
            BindingHandle::Mirrored { key, path } => {
                self.key_paths.get(key).is_some_and(|current| current == path)
            }
        };
        if !live {
            return None;
        }

        let name = Self::input_name(handle);
        Some(ButtonState {
            pressed_this_frame: self.pressed.contains(name),
            held: self.held.contains(name),
            released_this_frame: self.released.contains(name),
        })
    }
}

impl AbilityHost for ScriptedHost {
    fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn has_equipped_ability(&self, slot: usize) -> Result<bool> {
        self.check_slot(slot)?;
        Ok(self.equipped.contains(&slot))
    }

    fn input_down(&mut self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;
        self.check("input_down")?;
        self.events.push(HostEvent::InputDown(slot));
        Ok(())
    }

    fn input_hold(&mut self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;
        self.check("input_hold")?;
        self.events.push(HostEvent::InputHold(slot));
        Ok(())
    }

    fn input_up(&mut self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;
        self.check("input_up")?;
        self.events.push(HostEvent::InputUp(slot));
        Ok(())
    }
}

impl AvatarHost for ScriptedHost {
    fn orientation(&self) -> Result<Quat> {
        self.check("orientation")?;
        Ok(self.orientation)
    }

    fn set_orientation(&mut self, rotation: Quat) -> Result<()> {
        self.check("set_orientation")?;
        self.orientation = rotation;
        self.events.push(HostEvent::Orientation(rotation));
        Ok(())
    }
}

impl ContextProbe for ScriptedHost {
    fn spectate_context_active(&self) -> bool {
        self.context
    }
}
