use aimbridge::binding::{BindingHandle, InputKey};
use aimbridge::config::BridgeConfig;
use aimbridge::replay::{FrameScript, HostEvent, Scenario, ScriptedHost};
use aimbridge::Bridge;
use glam::{Quat, Vec3};

const GRIP: &str = "GripLeft";
const PRIMARY: &str = "VR Actions/ResetHeight";
const DIRECTION: &str = "VR Actions/Interact";

const HOST: &str = r#"
[host]
slot_count = 3
equipped = [0, 1]
actions = ["VR Actions/ResetHeight", "VR Actions/Interact", "GripLeft", "GripRight"]
avatar_yaw_degrees = 30.0
"#;

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn bridge_with(config: BridgeConfig, host: &str) -> Bridge<ScriptedHost> {
    let scenario = Scenario::from_toml_str(host).expect("valid scenario");
    Bridge::new(config, ScriptedHost::new(&scenario.host))
}

fn bridge() -> Bridge<ScriptedHost> {
    bridge_with(BridgeConfig::default(), HOST)
}

fn step(bridge: &mut Bridge<ScriptedHost>, frame: u64, script: FrameScript) -> Vec<HostEvent> {
    bridge.host_mut().begin_frame(&script);
    bridge.tick(frame);
    bridge.host_mut().take_events()
}

fn press(items: &[&str]) -> FrameScript {
    FrameScript {
        context: Some(true),
        press: names(items),
        ..FrameScript::default()
    }
}

fn release(items: &[&str]) -> FrameScript {
    FrameScript {
        release: names(items),
        ..FrameScript::default()
    }
}

fn idle() -> FrameScript {
    FrameScript::default()
}

fn slot_calls(events: &[HostEvent]) -> Vec<HostEvent> {
    events
        .iter()
        .copied()
        .filter(|event| !matches!(event, HostEvent::Orientation(_)))
        .collect()
}

#[test]
fn primary_slot_wins_when_both_bindings_fire() {
    let mut bridge = bridge();

    let events = step(&mut bridge, 1, press(&[GRIP, PRIMARY, DIRECTION]));

    assert_eq!(
        slot_calls(&events),
        vec![HostEvent::InputDown(0), HostEvent::InputHold(0)]
    );
    assert_eq!(bridge.arbitration_state().active_slot_index(), Some(0));
    let direction = BindingHandle::Action(DIRECTION.to_string());
    assert!(!bridge.should_suppress_binding_down(&direction, 1));
}

#[test]
fn direction_slot_suppresses_its_binding_for_the_frame() {
    let mut bridge = bridge();
    let events = step(&mut bridge, 1, press(&[GRIP, DIRECTION]));

    assert_eq!(
        slot_calls(&events),
        vec![HostEvent::InputDown(1), HostEvent::InputHold(1)]
    );

    let action = BindingHandle::Action(DIRECTION.to_string());
    let key = BindingHandle::Key(InputKey::Interact);
    assert!(bridge.should_suppress_binding_down(&action, 1));
    assert!(bridge.should_suppress_binding_down(&key, 1));
    assert!(bridge.should_suppress_binding_up(&key, 2));
    assert!(!bridge.should_suppress_binding_down(&key, 2));
    assert!(!bridge.should_suppress_binding_down(&BindingHandle::Key(InputKey::Jump), 1));
}

#[test]
fn direction_hold_keeps_hold_suppressed_and_release_suppresses_up() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[GRIP, DIRECTION]));

    let events = step(&mut bridge, 2, idle());
    assert_eq!(events, vec![HostEvent::InputHold(1)]);
    let key = BindingHandle::Key(InputKey::Interact);
    assert!(bridge.should_suppress_binding_hold(&key, 2));

    let events = step(&mut bridge, 5, release(&[DIRECTION]));
    assert_eq!(slot_calls(&events), vec![HostEvent::InputUp(1)]);
    assert!(bridge.should_suppress_binding_up(&key, 5));
    assert!(!bridge.should_suppress_binding_up(&key, 6));
}

#[test]
fn grip_release_restores_orientation_exactly_once() {
    let mut bridge = bridge();
    let before = bridge.host().current_orientation();

    let started = step(&mut bridge, 1, press(&[GRIP, PRIMARY]));
    assert!(matches!(started.first(), Some(HostEvent::Orientation(_))));

    let released = step(&mut bridge, 2, release(&[GRIP]));
    assert_eq!(
        released,
        vec![HostEvent::InputUp(0), HostEvent::Orientation(before)]
    );
    assert_eq!(bridge.host().current_orientation(), before);
    assert!(bridge.arbitration_state().saved_orientation().is_none());
}

#[test]
fn context_loss_forces_a_single_release() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[GRIP, PRIMARY]));

    let lost = FrameScript {
        context: Some(false),
        ..FrameScript::default()
    };
    let events = step(&mut bridge, 2, lost);
    assert_eq!(slot_calls(&events), vec![HostEvent::InputUp(0)]);

    for frame in 3..6 {
        assert!(step(&mut bridge, frame, idle()).is_empty());
    }
}

#[test]
fn binding_release_ends_the_slot() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[GRIP, PRIMARY]));
    assert_eq!(step(&mut bridge, 2, idle()), vec![HostEvent::InputHold(0)]);

    let events = step(&mut bridge, 3, release(&[PRIMARY]));
    assert_eq!(slot_calls(&events), vec![HostEvent::InputUp(0)]);
    assert!(bridge.arbitration_state().is_idle());
}

#[test]
fn new_press_preempts_the_active_slot() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[GRIP, PRIMARY]));

    let events = step(&mut bridge, 2, press(&[DIRECTION]));
    assert_eq!(
        slot_calls(&events),
        vec![
            HostEvent::InputUp(0),
            HostEvent::InputDown(1),
            HostEvent::InputHold(1)
        ]
    );
    assert_eq!(bridge.arbitration_state().active_slot_index(), Some(1));
}

#[test]
fn nothing_starts_without_grip_or_equipped_ability() {
    let mut bridge = bridge();
    assert!(step(&mut bridge, 1, press(&[PRIMARY])).is_empty());

    let unequipped = FrameScript {
        equipped: Some(Vec::new()),
        ..press(&[GRIP])
    };
    step(&mut bridge, 2, unequipped);
    step(&mut bridge, 3, release(&[PRIMARY]));
    assert!(step(&mut bridge, 4, press(&[PRIMARY])).is_empty());
}

#[test]
fn disabled_bridge_never_activates() {
    let mut config = BridgeConfig::default();
    config.ability.enabled = false;
    let mut bridge = bridge_with(config, HOST);

    assert!(step(&mut bridge, 1, press(&[GRIP, PRIMARY])).is_empty());
}

#[test]
fn unavailable_orientation_skips_activation() {
    let host = format!("{HOST}failing_calls = [\"orientation\"]\n");
    let mut bridge = bridge_with(BridgeConfig::default(), &host);

    assert!(step(&mut bridge, 1, press(&[GRIP, PRIMARY])).is_empty());
    assert!(bridge.arbitration_state().is_idle());
}

#[test]
fn failed_input_up_still_restores_and_clears() {
    let host = format!("{HOST}failing_calls = [\"input_up\"]\n");
    let mut bridge = bridge_with(BridgeConfig::default(), &host);
    let before = bridge.host().current_orientation();

    step(&mut bridge, 1, press(&[GRIP, PRIMARY]));
    let events = step(&mut bridge, 2, release(&[GRIP]));

    assert_eq!(events, vec![HostEvent::Orientation(before)]);
    assert!(bridge.arbitration_state().is_idle());
}

#[test]
fn remapped_direction_key_releases_and_re_resolves() {
    let mut config = BridgeConfig::default();
    config.ability.direction_action = "Interact".to_string();
    let host = format!(
        "{HOST}\n[host.key_paths]\nInteract = \"<XRController>{{RightHand}}/primaryButton\"\n"
    );
    let mut bridge = bridge_with(config, &host);

    let events = step(
        &mut bridge,
        1,
        press(&[GRIP, "<XRController>{RightHand}/primaryButton"]),
    );
    assert_eq!(
        slot_calls(&events),
        vec![HostEvent::InputDown(1), HostEvent::InputHold(1)]
    );

    let mut rebind = idle();
    rebind.rebind.insert(
        "Interact".to_string(),
        "<XRController>{RightHand}/secondaryButton".to_string(),
    );
    let events = step(&mut bridge, 2, rebind);
    assert_eq!(slot_calls(&events), vec![HostEvent::InputUp(1)]);

    let events = step(
        &mut bridge,
        3,
        press(&["<XRController>{RightHand}/secondaryButton"]),
    );
    assert_eq!(
        slot_calls(&events),
        vec![HostEvent::InputDown(1), HostEvent::InputHold(1)]
    );
}

#[test]
fn activation_faces_the_ability_aim() {
    let mut bridge = bridge();
    let frame = FrameScript {
        camera: Some(aimbridge::replay::PoseScript {
            position: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::X,
        }),
        ..press(&[GRIP, PRIMARY])
    };

    step(&mut bridge, 1, frame);

    let facing = bridge.host().current_orientation() * Vec3::Z;
    assert!((facing - Vec3::X).length() < 1e-4, "{facing:?}");
    assert_ne!(bridge.host().current_orientation(), Quat::IDENTITY);
}

#[test]
fn legacy_movement_and_rotation_follow_camera_grip() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[]));
    assert!(!bridge.should_suppress_legacy_movement());
    assert_eq!(bridge.guard_rotation_axis(0.8), 0.0);

    step(&mut bridge, 2, press(&[GRIP]));
    assert!(bridge.should_suppress_legacy_movement());
    assert_eq!(bridge.guard_rotation_axis(0.8), 0.8);

    let lost = FrameScript {
        context: Some(false),
        ..FrameScript::default()
    };
    step(&mut bridge, 3, lost);
    assert!(!bridge.should_suppress_legacy_movement());
}

#[test]
fn direction_binding_held_tracks_the_binding() {
    let mut bridge = bridge();
    step(&mut bridge, 1, press(&[DIRECTION]));
    assert!(bridge.direction_binding_held());

    step(&mut bridge, 2, release(&[DIRECTION]));
    assert!(!bridge.direction_binding_held());
}

#[test]
fn start_frame_holds_after_the_orientation_override() {
    let mut bridge = bridge();

    let events = step(&mut bridge, 1, press(&[GRIP, PRIMARY]));

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], HostEvent::Orientation(_)));
    assert_eq!(events[1..], [HostEvent::InputDown(0), HostEvent::InputHold(0)]);
}
