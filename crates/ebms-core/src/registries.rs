// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collaborator interfaces the header processing pipeline resolves
//! against, plus small in-memory implementations.
//!
//! The pipeline treats these as explicit, externally-owned collaborators
//! (passed in at construction) rather than process-wide singletons — this
//! keeps the pipeline itself free of hidden coupling and trivially testable.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Mpc, PMode, SignalMessage};

/// The well-known default MPC, used when a `UserMessage` and its leg both
/// leave the MPC unspecified.
pub const DEFAULT_MPC: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/defaultMPC";

// ---------------------------------------------------------------------------
// P-Mode Resolver
// ---------------------------------------------------------------------------

/// Maps `(pmodeId, service, action, initiator, responder, responderAddress)`
/// to a governing [`PMode`]. Implementations may consult a static catalog,
/// a database, or a derivation rule; the pipeline treats this as opaque and
/// requires it be pure with respect to its arguments within one resolution.
pub trait PModeResolver: Send + Sync {
    /// Resolve a P-Mode from the given hints. Returns `None` when no P-Mode matches.
    fn resolve(
        &self,
        pmode_id: Option<&str>,
        service: &str,
        action: &str,
        initiator: &str,
        responder: &str,
        responder_address: Option<&str>,
    ) -> Option<PMode>;
}

/// A static, in-memory catalog of P-Modes keyed by id, with a fallback
/// lookup by `(service, action)` when no id is supplied.
#[derive(Debug, Default)]
pub struct StaticPModeCatalog {
    by_id: BTreeMap<String, PMode>,
}

impl StaticPModeCatalog {
    /// Build an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a P-Mode, keyed by its own `id`.
    pub fn insert(&mut self, pmode: PMode) {
        self.by_id.insert(pmode.id.clone(), pmode);
    }

    /// Register a P-Mode, builder-style.
    #[must_use]
    pub fn with_pmode(mut self, pmode: PMode) -> Self {
        self.insert(pmode);
        self
    }
}

impl PModeResolver for StaticPModeCatalog {
    fn resolve(
        &self,
        pmode_id: Option<&str>,
        service: &str,
        action: &str,
        _initiator: &str,
        _responder: &str,
        _responder_address: Option<&str>,
    ) -> Option<PMode> {
        if let Some(id) = pmode_id {
            return self.by_id.get(id).cloned();
        }
        self.by_id
            .values()
            .find(|p| {
                p.leg1.business_info.service.as_deref() == Some(service)
                    && p.leg1.business_info.action.as_deref() == Some(action)
            })
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// MPC Registry
// ---------------------------------------------------------------------------

/// Lookup of Message Partition Channels by id, with a default-MPC fallback.
pub trait MpcRegistry: Send + Sync {
    /// `true` when `id` is registered.
    fn contains(&self, id: &str) -> bool;

    /// Strict lookup: `None` when `id` is not registered.
    fn get(&self, id: &str) -> Option<Mpc>;

    /// Lookup used for effective-MPC resolution on the user-message path:
    /// `None` id resolves to the default MPC; an unregistered, non-default
    /// id resolves to `None`.
    fn get_or_default(&self, id: Option<&str>) -> Option<Mpc>;
}

/// A static, in-memory MPC registry.
#[derive(Debug)]
pub struct StaticMpcRegistry {
    known: BTreeSet<String>,
}

impl StaticMpcRegistry {
    /// Build a registry containing only the default MPC.
    #[must_use]
    pub fn new() -> Self {
        let mut known = BTreeSet::new();
        known.insert(DEFAULT_MPC.to_string());
        Self { known }
    }

    /// Register an additional MPC id.
    pub fn register(&mut self, id: impl Into<String>) {
        self.known.insert(id.into());
    }

    /// Register an additional MPC id, builder-style.
    #[must_use]
    pub fn with_mpc(mut self, id: impl Into<String>) -> Self {
        self.register(id);
        self
    }
}

impl Default for StaticMpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MpcRegistry for StaticMpcRegistry {
    fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    fn get(&self, id: &str) -> Option<Mpc> {
        self.known.contains(id).then(|| Mpc::new(id))
    }

    fn get_or_default(&self, id: Option<&str>) -> Option<Mpc> {
        match id {
            None => Some(Mpc::new(DEFAULT_MPC)),
            Some(id) if self.known.contains(id) => Some(Mpc::new(id)),
            Some(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pull-Request Processor Registry
// ---------------------------------------------------------------------------

/// A capability satisfied by anything that can claim a pull-request signal
/// and return the P-Mode it governs. Modeled as a trait object rather than
/// a class hierarchy: any closure-like value can register.
pub trait PullRequestProcessor: Send + Sync {
    /// Attempt to claim `signal`, returning its governing P-Mode.
    fn process(&self, signal: &SignalMessage) -> Option<PMode>;
}

impl<F> PullRequestProcessor for F
where
    F: Fn(&SignalMessage) -> Option<PMode> + Send + Sync,
{
    fn process(&self, signal: &SignalMessage) -> Option<PMode> {
        self(signal)
    }
}

/// An ordered collection of [`PullRequestProcessor`]s. The first processor
/// to return a P-Mode wins.
#[derive(Default)]
pub struct PullRequestProcessorRegistry {
    processors: Vec<Box<dyn PullRequestProcessor>>,
}

impl PullRequestProcessorRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processor to the end of the declared order.
    pub fn register(&mut self, processor: impl PullRequestProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }

    /// How many processors are registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// `true` when no processors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Query processors in declared order; the first to return a P-Mode wins.
    #[must_use]
    pub fn process(&self, signal: &SignalMessage) -> Option<PMode> {
        self.processors.iter().find_map(|p| p.process(signal))
    }
}
