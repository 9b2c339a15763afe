// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dispatch of inbound SOAP header elements to their processors, in
//! declared order, short-circuiting at the first failure.

use std::fmt;

use ebms_core::state::{Attachment, MessageState, SoapDocument};
use ebms_core::{EngineConfig, MpcRegistry, PModeResolver, PullRequestProcessorRegistry};
use ebms_error::ErrorList;

use crate::MessagingSource;

/// A namespace-qualified SOAP header element name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    /// The element's namespace URI.
    pub namespace: String,
    /// The element's local name.
    pub local_name: String,
}

impl QName {
    /// Build a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// Everything a [`HeaderProcessor`] needs to do its work, bundled so the
/// chain can dispatch uniformly regardless of which header is being
/// processed. Every field is an explicit collaborator, not ambient state.
pub struct HeaderProcessingContext<'ctx, 'doc> {
    /// Result of binding the raw header into structured data.
    pub messaging_source: MessagingSource,
    /// Read-only handle to the already-parsed SOAP envelope.
    pub soap_document: Option<&'doc dyn SoapDocument>,
    /// Attachments received alongside this envelope.
    pub attachments: Vec<Attachment>,
    /// Per-request state being accumulated, committed to by [`super::header_processor`].
    pub state: &'ctx mut MessageState<'doc>,
    /// Engine-wide configuration.
    pub config: &'ctx EngineConfig,
    /// P-Mode resolution collaborator.
    pub pmode_resolver: &'ctx dyn PModeResolver,
    /// MPC lookup collaborator.
    pub mpc_registry: &'ctx dyn MpcRegistry,
    /// Pull-request claim collaborator.
    pub pull_request_registry: &'ctx PullRequestProcessorRegistry,
    /// Errors accumulated across the whole chain.
    pub errors: ErrorList,
}

/// A single header element's processor.
pub trait HeaderProcessor: Send + Sync {
    /// The header element this processor handles.
    fn qname(&self) -> QName;

    /// Process the header bound in `ctx.messaging_source`, mutating
    /// `ctx.state` and appending to `ctx.errors`.
    fn process(&self, ctx: &mut HeaderProcessingContext<'_, '_>) -> super::ProcessOutcome;
}

/// Ordered dispatch table of [`HeaderProcessor`]s, keyed by [`QName`].
#[derive(Default)]
pub struct HeaderProcessorChain {
    processors: Vec<Box<dyn HeaderProcessor>>,
}

impl HeaderProcessorChain {
    /// Build an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processor to the end of the declared order.
    pub fn register(&mut self, processor: impl HeaderProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }

    /// Run every registered processor whose [`QName`] is present in
    /// `headers`, in declared order, stopping at the first failure.
    pub fn dispatch(
        &self,
        headers: &[QName],
        ctx: &mut HeaderProcessingContext<'_, '_>,
    ) -> super::ProcessOutcome {
        for processor in &self.processors {
            if !headers.contains(&processor.qname()) {
                continue;
            }
            if matches!(processor.process(ctx), super::ProcessOutcome::Failure) {
                return super::ProcessOutcome::Failure;
            }
        }
        super::ProcessOutcome::Success
    }
}
