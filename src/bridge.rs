//! Frame-update facade.
//!
//! `Bridge` wires the aim resolver, the binding resolvers and the slot arbiter
//! to one host adapter. The host's frame loop calls [`Bridge::tick`] once per
//! frame before gameplay reads movement, then queries directions and
//! suppression flags as its own code paths need them.

use crate::aim::movement::movement_direction;
use crate::aim::{AimRequest, AimSourceResolver, RaycastService};
use crate::arbiter::{AbilitySlotArbiter, ArbiterGate, ArbitrationState, SlotRole, SlotSignal};
use crate::binding::{BindingHandle, GripBindings, InputBindingResolver};
use crate::config::BridgeConfig;
use crate::host::HostAdapter;
use crate::logging::LogLimiter;
use crate::spatial::{SpatialSourceProvider, DIRECTION_EPSILON};
use glam::{Vec2, Vec3};
use std::sync::Arc;

/// Per-frame entry points over one host adapter.
pub struct Bridge<H: HostAdapter> {
    config: BridgeConfig,
    host: H,
    resolver: AimSourceResolver,
    arbiter: AbilitySlotArbiter,
    primary_binding: InputBindingResolver,
    direction_binding: InputBindingResolver,
    grips: GripBindings,
    limiter: Arc<LogLimiter>,
}

impl<H: HostAdapter> Bridge<H> {
    pub fn new(config: BridgeConfig, host: H) -> Self {
        let limiter = Arc::new(LogLimiter::new());
        let interval = config.debug.log_interval();

        Self {
            resolver: AimSourceResolver::new(
                Arc::clone(&limiter),
                interval,
                config.debug.movement_direction,
            ),
            arbiter: AbilitySlotArbiter::new(
                Arc::clone(&limiter),
                interval,
                config.debug.ability_input_flow,
            ),
            primary_binding: InputBindingResolver::new(
                &config.ability.activate_action,
                &config.bindings.static_fallbacks,
            ),
            direction_binding: InputBindingResolver::new(
                &config.ability.direction_action,
                &config.bindings.static_fallbacks,
            ),
            grips: GripBindings::new(&config.bindings.left_grip, &config.bindings.right_grip),
            limiter,
            config,
            host,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn arbitration_state(&self) -> &ArbitrationState {
        self.arbiter.state()
    }

    /// World movement direction for raw stick input (zero when idle).
    pub fn resolve_movement_direction(&self, stick: Vec2) -> Vec3 {
        movement_direction(&self.resolver, &self.host, &self.config.movement, stick)
    }

    /// Direction abilities fire in. Never zero.
    pub fn resolve_ability_aim_direction(&self) -> Vec3 {
        let direction = ability_aim(&self.resolver, &self.host, &self.config);
        if self.config.debug.ability
            && self
                .limiter
                .allow("bridge.ability_aim", self.config.debug.log_interval())
        {
            log::debug!("ability aim {direction:?}");
        }
        direction
    }

    /// Run slot arbitration for `frame`. Frames must be monotonic.
    pub fn tick(&mut self, frame: u64) {
        let gate = ArbiterGate {
            enabled: self.config.ability.enabled,
            context_active: self.host.spectate_context_active(),
            grip_held: self.ability_grip_held(),
        };
        let signals = if gate.is_open() {
            self.collect_signals()
        } else {
            Vec::new()
        };

        let resolver = &self.resolver;
        let config = &self.config;
        self.arbiter.tick(frame, gate, &signals, &mut self.host, |host| {
            ability_aim(resolver, host, config)
        });
    }

    pub fn should_suppress_binding_down(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.arbiter.should_suppress_binding_down(binding, frame)
    }

    pub fn should_suppress_binding_hold(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.arbiter.should_suppress_binding_hold(binding, frame)
    }

    pub fn should_suppress_binding_up(&self, binding: &BindingHandle, frame: u64) -> bool {
        self.arbiter.should_suppress_binding_up(binding, frame)
    }

    /// Whether the hand selected for camera control holds its grip.
    pub fn camera_grip_held(&mut self) -> bool {
        let hand = self
            .config
            .movement
            .camera_grip
            .hand(self.host.dominant_hand_is_left());
        let held = self.grips.is_held(hand, &self.host);

        if self.config.debug.head_alignment
            && self
                .limiter
                .allow("bridge.camera_grip", self.config.debug.log_interval())
        {
            log::debug!("camera grip ({}) held={held}", hand.as_str());
        }
        held
    }

    /// Whether the hand selected for abilities holds its grip.
    pub fn ability_grip_held(&mut self) -> bool {
        let hand = self
            .config
            .ability
            .ability_grip
            .hand(self.host.dominant_hand_is_left());
        self.grips.is_held(hand, &self.host)
    }

    /// True while the host's own spectate movement should be ignored.
    pub fn should_suppress_legacy_movement(&mut self) -> bool {
        self.host.spectate_context_active() && self.camera_grip_held()
    }

    /// Camera rotation input passes only while the camera grip is held.
    pub fn guard_rotation_axis(&mut self, value: f32) -> f32 {
        if self.camera_grip_held() {
            return value;
        }

        if self.config.debug.spectate_guard
            && self
                .limiter
                .allow("bridge.rotation_guard", self.config.debug.log_interval())
        {
            log::debug!("rotation guard zeroed {value} (grip not held)");
        }
        0.0
    }

    /// Whether the direction slot's binding is held right now.
    pub fn direction_binding_held(&mut self) -> bool {
        self.direction_binding
            .state(&self.host)
            .is_some_and(|(_, state)| state.held)
    }

    fn collect_signals(&mut self) -> Vec<SlotSignal> {
        let slot_count = self.host.slot_count();
        if slot_count == 0 {
            return Vec::new();
        }

        let mut signals = Vec::with_capacity(2);
        let slots = [
            Some((0, SlotRole::Primary)),
            self.config
                .ability
                .direction_slot_index(slot_count)
                .map(|index| (index, SlotRole::Direction)),
        ];

        for (slot_index, role) in slots.into_iter().flatten() {
            let has_equipped = match self.host.has_equipped_ability(slot_index) {
                Ok(equipped) => equipped,
                Err(err) => {
                    if self
                        .limiter
                        .allow("bridge.has_equipped", self.config.debug.log_interval())
                    {
                        log::warn!("slot {slot_index}: {err}");
                    }
                    false
                }
            };

            let binding = match role {
                SlotRole::Primary => &mut self.primary_binding,
                SlotRole::Direction => &mut self.direction_binding,
            };
            let resolved = binding.state(&self.host);

            signals.push(SlotSignal {
                slot_index,
                role,
                has_equipped,
                binding: resolved.as_ref().map(|(handle, _)| handle.clone()),
                state: resolved.map(|(_, state)| state),
            });
        }

        signals
    }
}

/// Ability aim: the ability section's source and distance, cast from the
/// camera-grip hand, falling back to the camera-aligned forward.
fn ability_aim<P>(resolver: &AimSourceResolver, provider: &P, config: &BridgeConfig) -> Vec3
where
    P: SpatialSourceProvider + RaycastService + ?Sized,
{
    let ability = &config.ability;
    let request = AimRequest::new(
        ability.direction_source,
        config.movement.camera_grip,
        ability.raycast_distance,
    )
    .horizon_ray(ability.use_horizon_ray);

    let direction = resolver.resolve(provider, &request).direction;
    if direction.length_squared() < DIRECTION_EPSILON {
        return provider.aligned_forward();
    }
    direction
}
