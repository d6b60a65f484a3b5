//! Scenario replay.
//!
//! Runs a [`Scenario`] through a [`Bridge`] over a [`ScriptedHost`] and
//! collects what happened on every frame: the host callbacks, the resolved
//! directions and the suppression flags of any probed bindings.

pub mod host;
pub mod scenario;

use crate::binding::{BindingHandle, InputKey};
use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use glam::Vec3;
use std::fmt;

pub use host::{HostEvent, ScriptedHost};
pub use scenario::{FrameScript, HostScript, PoseScript, Scenario, SphereCollider};

/// Suppression flags for one probed binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub binding: BindingHandle,
    pub down: bool,
    pub hold: bool,
    pub up: bool,
}

/// Everything observed on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub events: Vec<HostEvent>,
    pub active_slot: Option<usize>,
    /// Present when the frame scripted stick input.
    pub movement: Option<Vec3>,
    pub ability_aim: Vec3,
    pub probes: Vec<Probe>,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.frame;
        for event in &self.events {
            writeln!(f, "frame {frame}: {event}")?;
        }
        if let Some(movement) = self.movement {
            writeln!(
                f,
                "frame {frame}: movement ({:.3}, {:.3}, {:.3})",
                movement.x, movement.y, movement.z
            )?;
        }
        for probe in &self.probes {
            writeln!(
                f,
                "frame {frame}: suppress {} down={} hold={} up={}",
                probe.binding, probe.down, probe.hold, probe.up
            )?;
        }
        match self.active_slot {
            Some(slot) => write!(f, "frame {frame}: active slot={slot}"),
            None => write!(f, "frame {frame}: idle"),
        }
    }
}

/// Interpret a probe name: a key name becomes a key handle, anything else an action.
pub fn probe_handle(name: &str) -> BindingHandle {
    match InputKey::parse(name) {
        Some(key) => BindingHandle::Key(key),
        None => BindingHandle::Action(name.trim().to_string()),
    }
}

/// Replay every frame of `scenario`. Frame numbers start at 1.
pub fn run(config: BridgeConfig, scenario: &Scenario) -> (Vec<FrameReport>, ScriptedHost) {
    let mut bridge = Bridge::new(config, ScriptedHost::new(&scenario.host));
    let mut reports = Vec::with_capacity(scenario.frames.len());

    for (index, script) in scenario.frames.iter().enumerate() {
        let frame = index as u64 + 1;
        bridge.host_mut().begin_frame(script);
        bridge.tick(frame);

        let movement = script
            .stick
            .map(|stick| bridge.resolve_movement_direction(stick));
        let ability_aim = bridge.resolve_ability_aim_direction();
        let probes = script
            .probe
            .iter()
            .map(|name| {
                let binding = probe_handle(name);
                Probe {
                    down: bridge.should_suppress_binding_down(&binding, frame),
                    hold: bridge.should_suppress_binding_hold(&binding, frame),
                    up: bridge.should_suppress_binding_up(&binding, frame),
                    binding,
                }
            })
            .collect();

        reports.push(FrameReport {
            frame,
            events: bridge.host_mut().take_events(),
            active_slot: bridge.arbitration_state().active_slot_index(),
            movement,
            ability_aim,
            probes,
        });
    }

    (reports, bridge.into_host())
}
