// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fluent fixture builders for tests and examples. None of this is used
//! by the processing pipeline itself.

use chrono::Utc;
use ebms_core::{
    AgreementRef, BusinessInfo, CollaborationInfo, Leg, MepBinding, MessageInfo, MessageProperties,
    PMode, Party, PartyId, PartyInfo, Protocol, RequiredLegs, Service, SoapVersion, UserMessage,
};

/// Builds a minimal, valid `UserMessage` governed by `pmode_id`.
#[must_use]
pub fn user_message_fixture(pmode_id: &str) -> UserMessage {
    UserMessageBuilder::new(pmode_id).build()
}

/// Builds a minimal, one-way P-Mode with the given id.
#[must_use]
pub fn pmode_fixture(id: &str) -> PMode {
    PModeBuilder::new(id).build()
}

/// Fluent builder for a `UserMessage` fixture.
pub struct UserMessageBuilder {
    message_id: String,
    ref_to_message_id: Option<String>,
    pmode_id: String,
    service: String,
    action: String,
    conversation_id: String,
    initiator: String,
    responder: String,
    mpc: Option<String>,
}

impl UserMessageBuilder {
    /// Start a builder whose `AgreementRef.pmode` is `pmode_id`.
    #[must_use]
    pub fn new(pmode_id: impl Into<String>) -> Self {
        Self {
            message_id: "message-1".into(),
            ref_to_message_id: None,
            pmode_id: pmode_id.into(),
            service: "urn:example:service".into(),
            action: "Submit".into(),
            conversation_id: "conversation-1".into(),
            initiator: "urn:example:initiator".into(),
            responder: "urn:example:responder".into(),
            mpc: None,
        }
    }

    /// Mark this message as a response to `message_id`.
    #[must_use]
    pub fn responding_to(mut self, message_id: impl Into<String>) -> Self {
        self.ref_to_message_id = Some(message_id.into());
        self
    }

    /// Override the message-level MPC.
    #[must_use]
    pub fn with_mpc(mut self, mpc: impl Into<String>) -> Self {
        self.mpc = Some(mpc.into());
        self
    }

    /// Build the `UserMessage`.
    #[must_use]
    pub fn build(self) -> UserMessage {
        UserMessage {
            message_info: MessageInfo {
                message_id: self.message_id,
                ref_to_message_id: self.ref_to_message_id,
                timestamp: Utc::now(),
            },
            party_info: PartyInfo {
                from: Party {
                    role: "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/initiator".into(),
                    party_ids: vec![PartyId::new(self.initiator)],
                },
                to: Party {
                    role: "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/responder".into(),
                    party_ids: vec![PartyId::new(self.responder)],
                },
            },
            collaboration_info: CollaborationInfo {
                agreement_ref: Some(AgreementRef {
                    value: format!("agreement-{}", self.pmode_id),
                    pmode: Some(self.pmode_id),
                }),
                service: Service {
                    value: self.service,
                    service_type: None,
                },
                action: self.action,
                conversation_id: self.conversation_id,
            },
            message_properties: MessageProperties::default(),
            payload_info: None,
            mpc: self.mpc,
        }
    }
}

/// Fluent builder for a one-way [`PMode`] fixture.
pub struct PModeBuilder {
    id: String,
    soap_version: SoapVersion,
    service: Option<String>,
    action: Option<String>,
    two_way: bool,
}

impl PModeBuilder {
    /// Start a builder for a SOAP 1.2, one-way P-Mode.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            soap_version: SoapVersion::Soap12,
            service: None,
            action: None,
            two_way: false,
        }
    }

    /// Pin the leg's default service/action, for service+action P-Mode lookup.
    #[must_use]
    pub fn with_business_info(mut self, service: impl Into<String>, action: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self.action = Some(action.into());
        self
    }

    /// Require a second leg.
    #[must_use]
    pub fn two_way(mut self) -> Self {
        self.two_way = true;
        self
    }

    /// Build the `PMode`.
    #[must_use]
    pub fn build(self) -> PMode {
        let leg1 = Leg {
            protocol: Protocol {
                soap_version: self.soap_version,
            },
            business_info: BusinessInfo {
                mpc_id: None,
                service: self.service,
                action: self.action,
            },
        };
        PMode {
            id: self.id,
            mep_binding: MepBinding {
                required_legs: if self.two_way { RequiredLegs::Two } else { RequiredLegs::One },
            },
            leg2: if self.two_way { Some(leg1.clone()) } else { None },
            leg1,
        }
    }
}
