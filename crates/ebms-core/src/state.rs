// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-request message state.

use std::collections::BTreeMap;
use std::fmt;

use crate::{CompressionType, EffectivePModeLeg, Messaging, Mpc, PMode, SoapVersion};

/// Abstract view over the already-parsed SOAP envelope, owned by the
/// external XML/transport layer. The header processor uses this solely to
/// determine whether the SOAP body carries a payload.
pub trait SoapDocument: fmt::Debug {
    /// `true` when the first child element of the SOAP body matching
    /// `soap_version`'s body element exists and has child nodes.
    fn body_has_children(&self, soap_version: SoapVersion) -> bool;
}

/// A MIME/SOAP-with-Attachments part, owned by the MIME layer and borrowed
/// by this engine for the duration of a single request. The only mutation
/// the engine performs is setting `declared_charset`, at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The attachment's MIME content id (without the `cid:` prefix).
    pub content_id: String,
    /// Character set declared for this attachment's content, if any.
    pub declared_charset: Option<String>,
}

impl Attachment {
    /// Build an attachment with no declared character set.
    #[must_use]
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            declared_charset: None,
        }
    }
}

/// Mutable per-request accumulator, populated by the header processing
/// pipeline and consumed by the delivery stage. Created empty at envelope
/// receipt and discarded once the response is written.
pub struct MessageState<'doc> {
    /// Locale used to localize error descriptions sourced from the error catalog.
    pub locale: String,
    /// The structural record of the parsed `Messaging` element, stored
    /// unconditionally once parsing succeeds (even on later failure).
    pub messaging: Option<Messaging>,
    /// The P-Mode governing this message, once resolved.
    pub p_mode: Option<PMode>,
    /// Which leg of `p_mode` governs this message.
    pub effective_pmode_leg: Option<EffectivePModeLeg>,
    /// The resolved MPC for this message.
    pub mpc: Option<Mpc>,
    /// The sole partyId value of the `UserMessage`'s `from` party.
    pub initiator_id: Option<String>,
    /// The sole partyId value of the `UserMessage`'s `to` party.
    pub responder_id: Option<String>,
    /// Whether the SOAP body carries a payload.
    pub soap_body_payload_present: bool,
    /// Read-only handle to the parsed SOAP envelope, borrowed from the XML layer.
    pub original_soap_document: Option<&'doc dyn SoapDocument>,
    /// The attachments as received, with declared character sets updated
    /// by this stage where applicable.
    pub original_attachments: Vec<Attachment>,
    /// Attachment id to compression mode, for every attachment whose
    /// `PartInfo` declared a recognized `CompressionType`.
    pub compressed_attachment_ids: BTreeMap<String, CompressionType>,
}

impl<'doc> MessageState<'doc> {
    /// Create an empty state for a new inbound envelope.
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            messaging: None,
            p_mode: None,
            effective_pmode_leg: None,
            mpc: None,
            initiator_id: None,
            responder_id: None,
            soap_body_payload_present: false,
            original_soap_document: None,
            original_attachments: Vec::new(),
            compressed_attachment_ids: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for MessageState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageState")
            .field("locale", &self.locale)
            .field("messaging", &self.messaging)
            .field("p_mode", &self.p_mode)
            .field("effective_pmode_leg", &self.effective_pmode_leg)
            .field("mpc", &self.mpc)
            .field("initiator_id", &self.initiator_id)
            .field("responder_id", &self.responder_id)
            .field("soap_body_payload_present", &self.soap_body_payload_present)
            .field("original_soap_document", &self.original_soap_document.is_some())
            .field("original_attachments", &self.original_attachments)
            .field("compressed_attachment_ids", &self.compressed_attachment_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty() {
        let state = MessageState::new("en");
        assert!(state.messaging.is_none());
        assert!(state.p_mode.is_none());
        assert!(state.original_attachments.is_empty());
        assert!(state.compressed_attachment_ids.is_empty());
        assert!(!state.soap_body_payload_present);
    }
}
