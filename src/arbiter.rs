//! Ability slot arbitration.
//!
//! One physical press drives at most one logical ability slot. The arbiter is
//! ticked once per frame with the gate (enabled, context, grip) and one
//! [`SlotSignal`] per slot in priority order. It issues the host's
//! down/hold/up callbacks, owns the temporary orientation override while a
//! slot is active, and records suppression windows so legacy observers of the
//! direction binding do not react to the same edge.
//!
//! Host failures never escape a tick. They are logged (rate limited) and the
//! affected call is treated as having had no effect.

pub mod state;

use crate::binding::{BindingHandle, ButtonState};
use crate::error::BridgeError;
use crate::host::{AbilityHost, AvatarHost};
use crate::logging::LogLimiter;
use crate::spatial::{look_rotation, project_on_horizontal};
use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;

pub use state::{ActiveSlot, ArbitrationState, SlotRole, SuppressionWindow};

/// Conditions that must all hold for any slot to be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArbiterGate {
    /// Global bridge switch.
    pub enabled: bool,
    /// Spectate/ability context is active.
    pub context_active: bool,
    /// The ability grip modifier is held.
    pub grip_held: bool,
}

impl ArbiterGate {
    pub fn is_open(&self) -> bool {
        self.enabled && self.context_active && self.grip_held
    }
}

/// One slot's inputs for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSignal {
    pub slot_index: usize,
    pub role: SlotRole,
    pub has_equipped: bool,
    /// `None` when no binding resolved this frame.
    pub binding: Option<BindingHandle>,
    pub state: Option<ButtonState>,
}

impl SlotSignal {
    fn pressed(&self) -> Option<&BindingHandle> {
        let pressed = self.state.is_some_and(|state| state.pressed_this_frame);
        if self.has_equipped && pressed {
            self.binding.as_ref()
        } else {
            None
        }
    }
}

/// Why an active slot was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The gate closed (disabled, context lost or grip released).
    GateClosed,
    /// The binding reported release or is no longer held.
    BindingReleased,
    /// The binding no longer resolves, or resolves to something else.
    BindingLost,
    /// Another slot is starting.
    Preempted,
}

/// The per-frame slot state machine.
#[derive(Debug)]
pub struct AbilitySlotArbiter {
    state: ArbitrationState,
    limiter: Arc<LogLimiter>,
    log_interval: Duration,
    trace: bool,
}

impl Default for AbilitySlotArbiter {
    fn default() -> Self {
        Self::new(Arc::new(LogLimiter::new()), Duration::from_millis(500), false)
    }
}

impl AbilitySlotArbiter {
    pub fn new(limiter: Arc<LogLimiter>, log_interval: Duration, trace: bool) -> Self {
        Self {
            state: ArbitrationState::new(),
            limiter,
            log_interval,
            trace,
        }
    }

    pub fn state(&self) -> &ArbitrationState {
        &self.state
    }

    /// Advance one frame.
    ///
    /// `signals` are in priority order; the first slot with an equipped ability
    /// and a fresh press wins. A slot that starts while its binding is held also
    /// gets its first hold on the same frame. `aim` is only evaluated when a slot
    /// starts.
    pub fn tick<H, F>(
        &mut self,
        frame: u64,
        gate: ArbiterGate,
        signals: &[SlotSignal],
        host: &mut H,
        aim: F,
    ) where
        H: AbilityHost + AvatarHost + ?Sized,
        F: FnOnce(&H) -> Vec3,
    {
        if !gate.is_open() {
            self.release(frame, host, ReleaseReason::GateClosed);
            return;
        }

        if let Some((signal, binding)) = signals
            .iter()
            .find_map(|signal| signal.pressed().map(|binding| (signal, binding)))
        {
            let started = self.start(frame, signal, binding.clone(), host, aim);
            if started && signal.state.is_some_and(|state| state.held) {
                self.hold(frame, host);
            }
            return;
        }

        let Some(active) = self.state.active() else {
            return;
        };

        let signal = signals
            .iter()
            .find(|signal| signal.slot_index == active.slot_index);
        let verdict = match signal {
            Some(SlotSignal {
                binding: Some(binding),
                state: Some(state),
                ..
            }) if *binding == active.binding => {
                if state.released_this_frame || !state.held {
                    Err(ReleaseReason::BindingReleased)
                } else {
                    Ok(())
                }
            }
            _ => Err(ReleaseReason::BindingLost),
        };

        match verdict {
            Ok(()) => self.hold(frame, host),
            Err(reason) => self.release(frame, host, reason),
        }
    }

    /// Close the active slot, if any: input up, restore orientation, clear state.
    pub fn release<H>(&mut self, frame: u64, host: &mut H, reason: ReleaseReason)
    where
        H: AbilityHost + AvatarHost + ?Sized,
    {
        let Some(active) = self.state.take_active() else {
            return;
        };

        if let Err(err) = host.input_up(active.slot_index) {
            self.report("arbiter.input_up", &err);
        }
        if let Err(err) = host.set_orientation(active.saved_orientation) {
            self.report("arbiter.restore", &err);
        }
        if active.role == SlotRole::Direction {
            self.state.extend_up(&active.binding, frame);
        }

        self.trace_line(
            "arbiter.release",
            format_args!(
                "released slot {} ({:?}) on frame {frame}",
                active.slot_index, reason
            ),
        );
    }

    pub fn should_suppress_binding_down(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.state.suppresses_down(binding, frame)
    }

    pub fn should_suppress_binding_hold(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.state.suppresses_hold(binding, frame)
    }

    pub fn should_suppress_binding_up(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.state.suppresses_up(binding, frame)
    }

    /// Returns whether the slot is now active.
    fn start<H, F>(
        &mut self,
        frame: u64,
        signal: &SlotSignal,
        binding: BindingHandle,
        host: &mut H,
        aim: F,
    ) -> bool
    where
        H: AbilityHost + AvatarHost + ?Sized,
        F: FnOnce(&H) -> Vec3,
    {
        self.release(frame, host, ReleaseReason::Preempted);

        let saved_orientation = match host.orientation() {
            Ok(rotation) => rotation,
            Err(err) => {
                self.report("arbiter.orientation", &err);
                return false;
            }
        };

        if let Some(rotation) = look_rotation(project_on_horizontal(aim(&*host))) {
            if let Err(err) = host.set_orientation(rotation) {
                self.report("arbiter.orient", &err);
            }
        }

        if let Err(err) = host.input_down(signal.slot_index) {
            self.report("arbiter.input_down", &err);
            if let Err(err) = host.set_orientation(saved_orientation) {
                self.report("arbiter.restore", &err);
            }
            return false;
        }

        if signal.role == SlotRole::Direction {
            self.state.arm_press(&binding, frame);
        }
        self.trace_line(
            "arbiter.start",
            format_args!(
                "started slot {} ({:?}) via {binding} on frame {frame}",
                signal.slot_index, signal.role
            ),
        );
        self.state.activate(ActiveSlot {
            slot_index: signal.slot_index,
            role: signal.role,
            binding,
            saved_orientation,
        });
        true
    }

    fn hold<H>(&mut self, frame: u64, host: &mut H)
    where
        H: AbilityHost + AvatarHost + ?Sized,
    {
        let Some(active) = self.state.active() else {
            return;
        };
        let (slot_index, role, binding) = (active.slot_index, active.role, active.binding.clone());

        if let Err(err) = host.input_hold(slot_index) {
            self.report("arbiter.input_hold", &err);
        }
        if role == SlotRole::Direction {
            self.state.extend_hold(&binding, frame);
        }
    }

    fn report(&self, key: &str, err: &BridgeError) {
        if self.limiter.allow(key, self.log_interval) {
            log::warn!("{key}: {err}");
        }
    }

    fn trace_line(&self, key: &str, message: std::fmt::Arguments<'_>) {
        if self.trace && self.limiter.allow(key, self.log_interval) {
            log::debug!("{message}");
        }
    }
}
