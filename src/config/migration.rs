//! Legacy key migration.
//!
//! Older config files used CamelCase keys under descriptive section names
//! (`[Spectate Movement] MovementRaycastDistance = 40`). Before deserializing,
//! every key that is not part of the current layout is either moved to its
//! current location or dropped.
//!
//! Resolution order for an unknown `(section, key)`:
//! 1. the explicit alias table,
//! 2. a current key with the same name that exists under exactly one section,
//! 3. otherwise the entry is dropped.
//!
//! A value already present at the destination always wins over a migrated one.

use std::fmt;
use toml::{Table, Value};

/// `(old section, old key) -> (new section, new key)`.
const ALIASES: &[(&str, &str, &str, &str)] = &[
    ("Spectate Movement", "MovementDirectionSource", "movement", "direction_source"),
    ("Spectate Movement", "MovementRaycastDistance", "movement", "raycast_distance"),
    ("Spectate Movement", "ControllerRaycastXAxisDeadzone", "movement", "x_axis_deadzone"),
    ("Spectate Movement", "ControllerRaycastForwardPriorityMinY", "movement", "forward_priority_min_y"),
    ("Spectate Movement", "ControllerRaycastForwardPriorityRatio", "movement", "forward_priority_ratio"),
    ("Spectate Movement", "UseAnalogMagnitude", "movement", "use_analog_magnitude"),
    ("Spectate Movement", "CameraGripPreference", "movement", "camera_grip"),
    ("Spectate VR Ability", "AbilityDirectionSource", "ability", "direction_source"),
    ("Spectate VR Ability", "AbilityRaycastDistance", "ability", "raycast_distance"),
    ("Spectate VR Ability", "AbilityRaycastUseHorizon", "ability", "use_horizon_ray"),
    ("Spectate VR Ability", "AbilityGripPreference", "ability", "ability_grip"),
    ("Spectate VR Ability", "AbilityActivateAction", "ability", "activate_action"),
    ("Spectate VR Ability", "DebugAbility", "debug", "ability"),
    ("Spectate VR Direction", "AbilityDirectionAction", "ability", "direction_action"),
    ("Spectate VR Direction", "AbilityDirectionSlot", "ability", "direction_slot"),
    ("ability", "grip", "ability", "ability_grip"),
    ("movement", "grip", "movement", "camera_grip"),
];

/// One change applied to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationNote {
    pub from: String,
    /// `None` when the entry was dropped.
    pub to: Option<String>,
}

impl fmt::Display for MigrationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Some(to) => write!(f, "migrated `{}` to `{}`", self.from, to),
            None => write!(f, "dropped unknown key `{}`", self.from),
        }
    }
}

#[derive(Debug)]
struct Move {
    section: String,
    key: String,
    value: Value,
    destination: Option<(String, String)>,
}

/// Rewrite `document` in place so that it only contains keys present in `known`.
///
/// `known` is a two-level table (section -> key -> default value) describing the
/// current layout. Top-level scalar entries are treated as belonging to the
/// empty section.
pub fn migrate(document: &mut Table, known: &Table) -> Vec<MigrationNote> {
    let moves = collect_moves(document, known);
    let mut notes = Vec::with_capacity(moves.len());

    for Move {
        section,
        key,
        value,
        destination,
    } in moves
    {
        remove_entry(document, &section, &key);
        let from = qualified(&section, &key);

        let Some((new_section, new_key)) = destination else {
            notes.push(MigrationNote { from, to: None });
            continue;
        };

        let target = document
            .entry(new_section.clone())
            .or_insert(Value::Table(Table::new()));
        let Value::Table(target) = target else {
            // A scalar occupies the section name; nothing sensible to merge into.
            notes.push(MigrationNote { from, to: None });
            continue;
        };

        if target.contains_key(&new_key) {
            notes.push(MigrationNote { from, to: None });
            continue;
        }

        target.insert(new_key.clone(), value);
        notes.push(MigrationNote {
            from,
            to: Some(qualified(&new_section, &new_key)),
        });
    }

    let emptied: Vec<String> = document
        .iter()
        .filter(|(_, value)| matches!(value, Value::Table(t) if t.is_empty()))
        .map(|(name, _)| name.clone())
        .collect();
    for name in emptied {
        document.remove(&name);
    }

    notes
}

fn collect_moves(document: &Table, known: &Table) -> Vec<Move> {
    let mut moves = Vec::new();

    for (section, value) in document {
        match value {
            Value::Table(entries) => {
                for (key, value) in entries {
                    if is_known(known, section, key) {
                        continue;
                    }
                    moves.push(Move {
                        section: section.clone(),
                        key: key.clone(),
                        value: value.clone(),
                        destination: destination_for(known, section, key),
                    });
                }
            }
            scalar => {
                moves.push(Move {
                    section: String::new(),
                    key: section.clone(),
                    value: scalar.clone(),
                    destination: destination_for(known, "", section),
                });
            }
        }
    }

    moves
}

fn destination_for(known: &Table, section: &str, key: &str) -> Option<(String, String)> {
    let aliased = ALIASES
        .iter()
        .find(|(old_section, old_key, _, _)| *old_section == section && *old_key == key)
        .map(|(_, _, new_section, new_key)| (new_section.to_string(), new_key.to_string()));
    if aliased.is_some() {
        return aliased;
    }

    let mut candidates = known
        .iter()
        .filter(|(_, value)| matches!(value, Value::Table(t) if t.contains_key(key)))
        .map(|(name, _)| name);
    match (candidates.next(), candidates.next()) {
        (Some(only), None) if only != section => Some((only.clone(), key.to_string())),
        _ => None,
    }
}

fn is_known(known: &Table, section: &str, key: &str) -> bool {
    matches!(known.get(section), Some(Value::Table(t)) if t.contains_key(key))
}

fn remove_entry(document: &mut Table, section: &str, key: &str) {
    if section.is_empty() {
        document.remove(key);
    } else if let Some(Value::Table(entries)) = document.get_mut(section) {
        entries.remove(key);
    }
}

fn qualified(section: &str, key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{section}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    fn known() -> Table {
        BridgeConfig::known_keys().unwrap()
    }

    fn parse(doc: &str) -> Table {
        toml::from_str(doc).unwrap()
    }

    #[test]
    fn aliased_keys_move_to_current_sections() {
        let mut doc = parse(
            r#"
            ["Spectate Movement"]
            MovementRaycastDistance = 25.0
            CameraGripPreference = "Left"
            "#,
        );

        let notes = migrate(&mut doc, &known());

        assert_eq!(notes.len(), 2);
        assert_eq!(doc["movement"]["raycast_distance"].as_float(), Some(25.0));
        assert_eq!(doc["movement"]["camera_grip"].as_str(), Some("Left"));
        assert!(!doc.contains_key("Spectate Movement"));
    }

    #[test]
    fn key_under_a_single_section_is_relocated() {
        let mut doc = parse("[general]\nuse_horizon_ray = true\n");
        let notes = migrate(&mut doc, &known());

        assert_eq!(
            notes,
            vec![MigrationNote {
                from: "general.use_horizon_ray".to_string(),
                to: Some("ability.use_horizon_ray".to_string()),
            }]
        );
        assert_eq!(doc["ability"]["use_horizon_ray"].as_bool(), Some(true));
    }

    #[test]
    fn ambiguous_and_unknown_keys_are_dropped() {
        // `raycast_distance` exists in both movement and ability.
        let mut doc = parse("[legacy]\nraycast_distance = 10.0\nshiny = 1\n");
        let notes = migrate(&mut doc, &known());

        assert!(notes.iter().all(|note| note.to.is_none()));
        assert!(doc.is_empty());
    }

    #[test]
    fn current_value_wins_over_migrated_one() {
        let mut doc = parse(
            r#"
            [ability]
            activate_action = "Jump"

            ["Spectate VR Ability"]
            AbilityActivateAction = "VR Actions/Push"
            "#,
        );
        migrate(&mut doc, &known());
        assert_eq!(doc["ability"]["activate_action"].as_str(), Some("Jump"));
    }

    #[test]
    fn migrated_document_deserializes() {
        let config = BridgeConfig::from_toml_str(
            r#"
            ["Spectate VR Direction"]
            AbilityDirectionAction = "Jump"
            AbilityDirectionSlot = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.ability.direction_action, "Jump");
        assert_eq!(config.ability.direction_slot, 3);
    }
}
