//! Input binding resolution.
//!
//! A configured binding is a `;`/`,` separated list of candidate names. Each
//! candidate is turned into a [`BindingHandle`] through the strategy chain in
//! [`strategy`]. The handle is cached but re-validated every frame, so a hot
//! input remap re-resolves lazily instead of leaving a dead handle behind.

pub mod strategy;

use crate::spatial::Hand;
use std::fmt;
use strategy::{ResolutionStrategy, CANDIDATE_STRATEGIES};

/// Symbolic host input keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputKey {
    Jump,
    Crouch,
    Sprint,
    Tumble,
    Grab,
    Rotate,
    Push,
    Pull,
    Interact,
    Inventory1,
    Inventory2,
    Inventory3,
    Map,
    Menu,
    Chat,
    PushToTalk,
    ToggleMute,
}

impl InputKey {
    pub const ALL: [InputKey; 17] = [
        InputKey::Jump,
        InputKey::Crouch,
        InputKey::Sprint,
        InputKey::Tumble,
        InputKey::Grab,
        InputKey::Rotate,
        InputKey::Push,
        InputKey::Pull,
        InputKey::Interact,
        InputKey::Inventory1,
        InputKey::Inventory2,
        InputKey::Inventory3,
        InputKey::Map,
        InputKey::Menu,
        InputKey::Chat,
        InputKey::PushToTalk,
        InputKey::ToggleMute,
    ];

    /// Case-insensitive match on the key name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        InputKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputKey::Jump => "Jump",
            InputKey::Crouch => "Crouch",
            InputKey::Sprint => "Sprint",
            InputKey::Tumble => "Tumble",
            InputKey::Grab => "Grab",
            InputKey::Rotate => "Rotate",
            InputKey::Push => "Push",
            InputKey::Pull => "Pull",
            InputKey::Interact => "Interact",
            InputKey::Inventory1 => "Inventory1",
            InputKey::Inventory2 => "Inventory2",
            InputKey::Inventory3 => "Inventory3",
            InputKey::Map => "Map",
            InputKey::Menu => "Menu",
            InputKey::Chat => "Chat",
            InputKey::PushToTalk => "PushToTalk",
            InputKey::ToggleMute => "ToggleMute",
        }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved, queryable binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingHandle {
    /// A named high-level action.
    Action(String),
    /// A symbolic key queried through the host's own input layer.
    Key(InputKey),
    /// A symbolic key mirrored onto the low-level path it is bound to right now.
    Mirrored { key: InputKey, path: String },
}

impl BindingHandle {
    /// The symbolic key this handle stands for, if any.
    ///
    /// Actions map to a key when their last path segment names one
    /// (`VR Actions/Interact` is `Interact`).
    pub fn key(&self) -> Option<InputKey> {
        match self {
            BindingHandle::Key(key) | BindingHandle::Mirrored { key, .. } => Some(*key),
            BindingHandle::Action(name) => InputKey::parse(last_segment(name)),
        }
    }

    /// True when both handles observe the same physical input.
    pub fn same_input(&self, other: &BindingHandle) -> bool {
        if self == other {
            return true;
        }
        match (self.key(), other.key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingHandle::Action(name) => write!(f, "action:{name}"),
            BindingHandle::Key(key) => write!(f, "key:{key}"),
            BindingHandle::Mirrored { key, path } => write!(f, "key:{key}@{path}"),
        }
    }
}

/// Edge and level state of one binding for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    pub pressed_this_frame: bool,
    pub held: bool,
    pub released_this_frame: bool,
}

impl ButtonState {
    pub fn pressed() -> Self {
        Self {
            pressed_this_frame: true,
            held: true,
            released_this_frame: false,
        }
    }

    pub fn holding() -> Self {
        Self {
            pressed_this_frame: false,
            held: true,
            released_this_frame: false,
        }
    }

    pub fn released() -> Self {
        Self {
            pressed_this_frame: false,
            held: false,
            released_this_frame: true,
        }
    }
}

/// The host's binding and action registry.
pub trait BindingRegistry {
    /// Every registered action name, in registry order.
    fn action_names(&self) -> Vec<String>;

    fn has_action(&self, name: &str) -> bool;

    /// Whether the host's own input layer knows `key`.
    fn has_key(&self, key: InputKey) -> bool;

    /// The low-level path `key` is currently bound to, when the host exposes it.
    fn key_binding_path(&self, key: InputKey) -> Option<String>;

    /// Current state of `handle`. `None` means the handle no longer resolves.
    fn query(&self, handle: &BindingHandle) -> Option<ButtonState>;

    /// Whether `handle` still refers to something queryable. Mirrored handles
    /// also go stale when their key is rebound to another path.
    fn is_live(&self, handle: &BindingHandle) -> bool {
        if let BindingHandle::Mirrored { key, path } = handle {
            if self.key_binding_path(*key).as_deref() != Some(path.as_str()) {
                return false;
            }
        }
        self.query(handle).is_some()
    }
}

/// Split a configured binding string into trimmed, non-empty candidate names.
pub fn split_candidates(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name).trim()
}

#[derive(Debug, Clone)]
struct Resolved {
    handle: BindingHandle,
    strategy: ResolutionStrategy,
}

/// Resolves one configured binding and keeps the handle fresh across frames.
#[derive(Debug, Clone)]
pub struct InputBindingResolver {
    candidates: Vec<String>,
    static_fallbacks: Vec<String>,
    resolved: Option<Resolved>,
}

impl InputBindingResolver {
    pub fn new(configured: &str, static_fallbacks: &[String]) -> Self {
        Self {
            candidates: split_candidates(configured),
            static_fallbacks: static_fallbacks.to_vec(),
            resolved: None,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The cached handle without re-validation.
    pub fn cached(&self) -> Option<&BindingHandle> {
        self.resolved.as_ref().map(|resolved| &resolved.handle)
    }

    /// Drop the cached handle; the next [`resolve`](Self::resolve) starts over.
    pub fn invalidate(&mut self) {
        self.resolved = None;
    }

    /// A live handle for this binding, re-resolving when the cached one went stale.
    pub fn resolve<R>(&mut self, registry: &R) -> Option<BindingHandle>
    where
        R: BindingRegistry + ?Sized,
    {
        if let Some(resolved) = &self.resolved {
            if registry.is_live(&resolved.handle) {
                return Some(resolved.handle.clone());
            }
            log::debug!(
                "binding: {} ({}) went stale, re-resolving",
                resolved.handle,
                resolved.strategy
            );
            self.resolved = None;
        }

        let resolved = self.resolve_fresh(registry)?;
        log::debug!(
            "binding: {:?} resolved to {} via {}",
            self.candidates,
            resolved.handle,
            resolved.strategy
        );
        let handle = resolved.handle.clone();
        self.resolved = Some(resolved);
        Some(handle)
    }

    /// Resolve and query in one step.
    pub fn state<R>(&mut self, registry: &R) -> Option<(BindingHandle, ButtonState)>
    where
        R: BindingRegistry + ?Sized,
    {
        let handle = self.resolve(registry)?;
        let state = registry.query(&handle)?;
        Some((handle, state))
    }

    fn resolve_fresh<R>(&self, registry: &R) -> Option<Resolved>
    where
        R: BindingRegistry + ?Sized,
    {
        for candidate in &self.candidates {
            for strategy in CANDIDATE_STRATEGIES {
                if let Some(handle) = strategy.attempt(candidate, registry) {
                    return Some(Resolved { handle, strategy });
                }
            }
        }

        self.static_fallbacks.iter().find_map(|name| {
            ResolutionStrategy::StaticFallback
                .attempt(name, registry)
                .map(|handle| Resolved {
                    handle,
                    strategy: ResolutionStrategy::StaticFallback,
                })
        })
    }
}

/// Grip detection for both hands: a hand's grip is held when any of its
/// candidate bindings reports held.
#[derive(Debug, Clone)]
pub struct GripBindings {
    left: Vec<InputBindingResolver>,
    right: Vec<InputBindingResolver>,
}

impl GripBindings {
    pub fn new(left: &[String], right: &[String]) -> Self {
        let resolvers = |names: &[String]| {
            names
                .iter()
                .map(|name| InputBindingResolver::new(name, &[]))
                .collect()
        };
        Self {
            left: resolvers(left),
            right: resolvers(right),
        }
    }

    pub fn is_held<R>(&mut self, hand: Hand, registry: &R) -> bool
    where
        R: BindingRegistry + ?Sized,
    {
        let resolvers = match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        };
        resolvers
            .iter_mut()
            .any(|resolver| matches!(resolver.state(registry), Some((_, state)) if state.held))
    }
}
