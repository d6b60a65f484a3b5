//! Bridge configuration.
//!
//! Settings are read from a TOML file with four sections (`[movement]`,
//! `[ability]`, `[bindings]`, `[debug]`). Every field has a default, legacy key
//! names are migrated before deserialization, and ranged values are clamped
//! rather than rejected.

pub mod migration;

use crate::error::{BridgeError, Result};
use crate::logging::DEFAULT_LOG_INTERVAL_MS;
use crate::spatial::GripSelection;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "aimbridge";
/// File name of the default config.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Which pose drives a raycast-derived direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DirectionSource {
    /// Cast from the HMD.
    HeadRaycast,
    /// Cast from the configured hand's controller.
    #[default]
    ControllerRaycast,
}

impl DirectionSource {
    /// Accepts the full names and the short `Head` / `Controller` spellings; anything else
    /// falls back to `ControllerRaycast`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "head" | "headraycast" => DirectionSource::HeadRaycast,
            _ => DirectionSource::ControllerRaycast,
        }
    }

    pub fn uses_controller(self) -> bool {
        matches!(self, DirectionSource::ControllerRaycast)
    }
}

impl fmt::Display for DirectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionSource::HeadRaycast => f.write_str("HeadRaycast"),
            DirectionSource::ControllerRaycast => f.write_str("ControllerRaycast"),
        }
    }
}

impl<'de> Deserialize<'de> for DirectionSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DirectionSource::parse(&raw))
    }
}

/// Spectate movement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub direction_source: DirectionSource,
    /// Maximum POV raycast distance in meters.
    pub raycast_distance: f32,
    /// Stick X values at or below this are ignored while pushing forward/back.
    pub x_axis_deadzone: f32,
    /// Minimum |Y| before forward priority kicks in.
    pub forward_priority_min_y: f32,
    /// |Y| must exceed |X| by this factor for forward priority.
    pub forward_priority_ratio: f32,
    /// Scale the direction by stick magnitude instead of always normalizing.
    pub use_analog_magnitude: bool,
    /// Hand whose grip drives camera look and whose controller aims movement.
    pub camera_grip: GripSelection,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            direction_source: DirectionSource::ControllerRaycast,
            raycast_distance: 40.0,
            x_axis_deadzone: 0.05,
            forward_priority_min_y: 0.3,
            forward_priority_ratio: 1.35,
            use_analog_magnitude: true,
            camera_grip: GripSelection::Auto,
        }
    }
}

/// Ability slot bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Master switch for slot arbitration.
    pub enabled: bool,
    pub direction_source: DirectionSource,
    pub raycast_distance: f32,
    /// Flatten the POV ray onto the horizon before casting.
    pub use_horizon_ray: bool,
    /// Hand whose grip must be held to activate slots.
    pub ability_grip: GripSelection,
    /// Candidate binding names for the primary slot, `;` or `,` separated.
    pub activate_action: String,
    /// Candidate binding names for the direction slot.
    pub direction_action: String,
    /// 1-based index of the direction slot; anything below 2 is clamped up.
    pub direction_slot: i64,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction_source: DirectionSource::ControllerRaycast,
            raycast_distance: 60.0,
            use_horizon_ray: false,
            ability_grip: GripSelection::Auto,
            activate_action: "VR Actions/ResetHeight".to_string(),
            direction_action: "VR Actions/Interact".to_string(),
            direction_slot: 2,
        }
    }
}

impl AbilityConfig {
    /// Zero-based direction slot index, clamped into `1..slot_count`.
    ///
    /// Returns `None` when the host exposes fewer than two slots.
    pub fn direction_slot_index(&self, slot_count: usize) -> Option<usize> {
        if slot_count < 2 {
            return None;
        }
        let index = usize::try_from(self.direction_slot.saturating_sub(1).max(1))
            .unwrap_or(usize::MAX);
        Some(index.clamp(1, slot_count - 1))
    }
}

/// Binding name tables used by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Tried after every configured candidate failed.
    pub static_fallbacks: Vec<String>,
    pub left_grip: Vec<String>,
    pub right_grip: Vec<String>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            static_fallbacks: names(&[
                "VR Actions/ResetHeight",
                "VR Actions/Interact",
                "VR Actions/Push",
            ]),
            left_grip: names(&["GripLeft", "leftGrip", "Grab", "MapGrabLeft"]),
            right_grip: names(&["GripRight", "rightGrip", "Grab", "MapGrabRight"]),
        }
    }
}

/// Diagnostic switches. All off by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub ability: bool,
    pub ability_input_flow: bool,
    pub movement_direction: bool,
    pub spectate_guard: bool,
    pub head_alignment: bool,
    /// Minimum spacing between two log lines with the same key.
    pub log_interval_ms: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            ability: false,
            ability_input_flow: false,
            movement_direction: false,
            spectate_guard: false,
            head_alignment: false,
            log_interval_ms: DEFAULT_LOG_INTERVAL_MS,
        }
    }
}

impl DebugConfig {
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub movement: MovementConfig,
    pub ability: AbilityConfig,
    pub bindings: BindingConfig,
    pub debug: DebugConfig,
}

impl BridgeConfig {
    /// `<config dir>/aimbridge/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse, migrate and sanitize a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(contents).map_err(|e| BridgeError::parse("config", e))?;

        for note in migration::migrate(&mut table, &Self::known_keys()?) {
            log::info!("config: {note}");
        }

        let mut config: BridgeConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e| BridgeError::parse("config", e))?;
        config.sanitize();
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BridgeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => BridgeError::file_error(format!("Failed to read {}", path.display()), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load `explicit` if given, else the default path when it exists, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Clamp every ranged value into its valid range.
    pub fn sanitize(&mut self) {
        let defaults = BridgeConfig::default();

        let m = &mut self.movement;
        m.raycast_distance = clamp_setting(
            "movement.raycast_distance",
            m.raycast_distance,
            2.0,
            200.0,
            defaults.movement.raycast_distance,
        );
        m.x_axis_deadzone = clamp_setting(
            "movement.x_axis_deadzone",
            m.x_axis_deadzone,
            0.0,
            0.5,
            defaults.movement.x_axis_deadzone,
        );
        m.forward_priority_min_y = clamp_setting(
            "movement.forward_priority_min_y",
            m.forward_priority_min_y,
            0.0,
            1.0,
            defaults.movement.forward_priority_min_y,
        );
        m.forward_priority_ratio = clamp_setting(
            "movement.forward_priority_ratio",
            m.forward_priority_ratio,
            1.0,
            3.0,
            defaults.movement.forward_priority_ratio,
        );

        let a = &mut self.ability;
        a.raycast_distance = clamp_setting(
            "ability.raycast_distance",
            a.raycast_distance,
            2.0,
            200.0,
            defaults.ability.raycast_distance,
        );
        if a.direction_slot < 2 {
            log::warn!(
                "config: ability.direction_slot={} is below 2, clamping",
                a.direction_slot
            );
            a.direction_slot = 2;
        }

        if self.debug.log_interval_ms > 60_000 {
            self.debug.log_interval_ms = 60_000;
        }
    }

    fn known_keys() -> Result<toml::Table> {
        // Serializing the defaults yields exactly the current (section, key) layout.
        toml::Table::try_from(BridgeConfig::default())
            .map_err(|e| BridgeError::config(format!("cannot describe the config layout: {e}")))
    }
}

fn clamp_setting(name: &str, value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("config: {name} is not finite, using {fallback}");
        return fallback;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("config: {name}={value} outside [{min}, {max}], clamped to {clamped}");
    }
    clamped
}
