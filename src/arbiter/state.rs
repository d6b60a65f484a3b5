//! State carried by the arbiter across frames.
//!
//! The active slot, its binding and the saved orientation live in one
//! `Option<ActiveSlot>`, so "a slot is active" and "an orientation is saved"
//! cannot disagree.

use crate::binding::BindingHandle;
use glam::Quat;

/// Logical role of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Slot 0.
    Primary,
    /// The configured direction slot, whose binding is shared with legacy input paths.
    Direction,
}

/// The slot currently held open by the arbiter.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSlot {
    pub slot_index: usize,
    pub role: SlotRole,
    pub binding: BindingHandle,
    /// Orientation to restore on release.
    pub saved_orientation: Quat,
}

/// Suppresses one edge of a binding for every frame up to and including `through_frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionWindow {
    pub binding: BindingHandle,
    pub through_frame: u64,
}

impl SuppressionWindow {
    pub fn covers(&self, binding: &BindingHandle, frame: u64) -> bool {
        frame <= self.through_frame && self.binding.same_input(binding)
    }
}

/// Everything the arbiter remembers between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArbitrationState {
    active: Option<ActiveSlot>,
    suppress_down: Option<SuppressionWindow>,
    suppress_hold: Option<SuppressionWindow>,
    suppress_up: Option<SuppressionWindow>,
}

impl ArbitrationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveSlot> {
        self.active.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active_slot_index(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.slot_index)
    }

    pub fn active_binding(&self) -> Option<&BindingHandle> {
        self.active.as_ref().map(|active| &active.binding)
    }

    pub fn saved_orientation(&self) -> Option<Quat> {
        self.active.as_ref().map(|active| active.saved_orientation)
    }

    pub(crate) fn activate(&mut self, slot: ActiveSlot) {
        self.active = Some(slot);
    }

    pub(crate) fn take_active(&mut self) -> Option<ActiveSlot> {
        self.active.take()
    }

    /// Arm the windows for a direction-slot press observed on `frame`.
    ///
    /// Down and hold are suppressed for the rest of this frame; up through the next one.
    pub(crate) fn arm_press(&mut self, binding: &BindingHandle, frame: u64) {
        self.suppress_down = Some(SuppressionWindow {
            binding: binding.clone(),
            through_frame: frame,
        });
        self.suppress_hold = Some(SuppressionWindow {
            binding: binding.clone(),
            through_frame: frame,
        });
        self.suppress_up = Some(SuppressionWindow {
            binding: binding.clone(),
            through_frame: frame.saturating_add(1),
        });
    }

    pub(crate) fn extend_hold(&mut self, binding: &BindingHandle, frame: u64) {
        extend(&mut self.suppress_hold, binding, frame);
    }

    pub(crate) fn extend_up(&mut self, binding: &BindingHandle, frame: u64) {
        extend(&mut self.suppress_up, binding, frame);
    }

    pub fn suppresses_down(&self, binding: &BindingHandle, frame: u64) -> bool {
        covers(&self.suppress_down, binding, frame)
    }

    pub fn suppresses_hold(&self, binding: &BindingHandle, frame: u64) -> bool {
        covers(&self.suppress_hold, binding, frame)
    }

    pub fn suppresses_up(&self, binding: &BindingHandle, frame: u64) -> bool {
        covers(&self.suppress_up, binding, frame)
    }
}

fn covers(window: &Option<SuppressionWindow>, binding: &BindingHandle, frame: u64) -> bool {
    window
        .as_ref()
        .is_some_and(|window| window.covers(binding, frame))
}

/// Push `window` out to at least `frame`, retargeting it when the input changed.
fn extend(window: &mut Option<SuppressionWindow>, binding: &BindingHandle, frame: u64) {
    match window {
        Some(existing) if existing.binding.same_input(binding) => {
            existing.through_frame = existing.through_frame.max(frame);
        }
        _ => {
            *window = Some(SuppressionWindow {
                binding: binding.clone(),
                through_frame: frame,
            });
        }
    }
}
