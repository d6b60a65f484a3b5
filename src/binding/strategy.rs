//! Ordered binding resolution strategies.
//!
//! Every configured candidate name is tried against [`CANDIDATE_STRATEGIES`]
//! in order. Only after every candidate failed are the static fallback names
//! tried with [`ResolutionStrategy::StaticFallback`].

use crate::binding::{last_segment, BindingHandle, BindingRegistry, InputKey};
use std::fmt;

/// One way of turning a candidate name into a live handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// A registered action with exactly this name.
    ExactName,
    /// A symbolic key token, mirrored onto its current low-level path when the
    /// host exposes one.
    SymbolicKey,
    /// Case-insensitive scan over every registered action name.
    DiscoveryScan,
    /// Exact lookup of a name from the static fallback table.
    StaticFallback,
}

/// Strategies applied to each configured candidate.
pub const CANDIDATE_STRATEGIES: [ResolutionStrategy; 3] = [
    ResolutionStrategy::ExactName,
    ResolutionStrategy::SymbolicKey,
    ResolutionStrategy::DiscoveryScan,
];

impl ResolutionStrategy {
    /// Try to resolve `candidate`. A returned handle is always live.
    pub fn attempt<R>(self, candidate: &str, registry: &R) -> Option<BindingHandle>
    where
        R: BindingRegistry + ?Sized,
    {
        let handle = match self {
            ResolutionStrategy::ExactName | ResolutionStrategy::StaticFallback => {
                exact_name(candidate, registry)
            }
            ResolutionStrategy::SymbolicKey => symbolic_key(candidate, registry),
            ResolutionStrategy::DiscoveryScan => discovery_scan(candidate, registry),
        }?;

        registry.is_live(&handle).then_some(handle)
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionStrategy::ExactName => "exact-name",
            ResolutionStrategy::SymbolicKey => "symbolic-key",
            ResolutionStrategy::DiscoveryScan => "discovery-scan",
            ResolutionStrategy::StaticFallback => "static-fallback",
        };
        f.write_str(name)
    }
}

fn exact_name<R>(candidate: &str, registry: &R) -> Option<BindingHandle>
where
    R: BindingRegistry + ?Sized,
{
    registry
        .has_action(candidate)
        .then(|| BindingHandle::Action(candidate.to_string()))
}

fn symbolic_key<R>(candidate: &str, registry: &R) -> Option<BindingHandle>
where
    R: BindingRegistry + ?Sized,
{
    let key = InputKey::parse(candidate)?;

    // More physical bindings exist than named actions, so prefer the path the
    // key is currently bound to.
    if let Some(path) = registry.key_binding_path(key) {
        return Some(BindingHandle::Mirrored { key, path });
    }

    registry.has_key(key).then_some(BindingHandle::Key(key))
}

fn discovery_scan<R>(candidate: &str, registry: &R) -> Option<BindingHandle>
where
    R: BindingRegistry + ?Sized,
{
    let wanted = last_segment(candidate);
    registry
        .action_names()
        .into_iter()
        .find(|name| {
            name.eq_ignore_ascii_case(candidate) || last_segment(name).eq_ignore_ascii_case(wanted)
        })
        .map(BindingHandle::Action)
}
