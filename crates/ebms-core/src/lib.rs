// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod charset;
pub mod compression;
pub mod config;
pub mod registries;
pub mod state;

pub use charset::canonical_charset;
pub use compression::CompressionType;
pub use config::{ConfigDefaults, ConfigValidator, ConfigWarning, EngineConfig, WarningSeverity};
pub use registries::{
    MpcRegistry, PModeResolver, PullRequestProcessor, PullRequestProcessorRegistry,
    StaticMpcRegistry, StaticPModeCatalog, DEFAULT_MPC,
};
pub use state::{Attachment, MessageState, SoapDocument};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Namespace URI of the ebMS 3.0 Core `Messaging` header element.
pub const EBMS_CORE_NAMESPACE: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/";

/// Local name of the `Messaging` SOAP header element.
pub const MESSAGING_LOCAL_NAME: &str = "Messaging";

// ---------------------------------------------------------------------------
// Shared leaf types
// ---------------------------------------------------------------------------

/// A single name/value property, optionally typed (e.g. an XML Schema type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Property {
    /// Property name. Matched case-insensitively for the well-known `PartInfo` properties.
    pub name: String,
    /// Property value.
    pub value: String,
    /// Optional XML Schema type of the value.
    pub property_type: Option<String>,
}

impl Property {
    /// Build a property with no declared type.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            property_type: None,
        }
    }
}

/// A trading-partner identifier, optionally typed (e.g. a URN scheme).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PartyId {
    /// The identifier value.
    pub value: String,
    /// Optional identifier scheme/type.
    pub party_id_type: Option<String>,
}

impl PartyId {
    /// Build a party id with no declared type.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            party_id_type: None,
        }
    }
}

/// One side (`from` or `to`) of a `PartyInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Party {
    /// The role URI this party plays in the exchange.
    pub role: String,
    /// Candidate identifiers for this party. The header processor requires
    /// exactly one entry; more than one is `ValueInconsistent`.
    pub party_ids: Vec<PartyId>,
}

/// `from`/`to` party pair of a `UserMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PartyInfo {
    /// The sending party.
    pub from: Party,
    /// The receiving party.
    pub to: Party,
}

/// `MessageInfo`: the identity and timing of a `UserMessage` or `SignalMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessageInfo {
    /// Globally unique id of this message.
    pub message_id: String,
    /// Id of the message this one refers to, if any.
    pub ref_to_message_id: Option<String>,
    /// Time the message was created.
    pub timestamp: DateTime<Utc>,
}

/// Reference to the bilateral agreement governing a `UserMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AgreementRef {
    /// The agreement identifier.
    pub value: String,
    /// Candidate P-Mode id, consumed by P-Mode resolution.
    pub pmode: Option<String>,
}

/// The business service a `UserMessage` invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Service {
    /// The service identifier.
    pub value: String,
    /// Optional service type qualifier.
    pub service_type: Option<String>,
}

/// `CollaborationInfo`: the business context of a `UserMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CollaborationInfo {
    /// The bilateral agreement this message is exchanged under, if declared.
    pub agreement_ref: Option<AgreementRef>,
    /// The service invoked.
    pub service: Service,
    /// The action within that service.
    pub action: String,
    /// Correlates messages belonging to the same business conversation.
    pub conversation_id: String,
}

/// Zero or more business-level `Property` values attached to a `UserMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessageProperties {
    /// The properties.
    pub property: Vec<Property>,
}

/// Well-known `PartInfo` property names, matched case-insensitively.
pub mod part_property_names {
    /// Declares the original MIME type of a (possibly compressed) part.
    pub const MIME_TYPE: &str = "MimeType";
    /// Declares the compression applied to a part.
    pub const COMPRESSION_TYPE: &str = "CompressionType";
    /// Declares the character set of a part.
    pub const CHARACTER_SET: &str = "CharacterSet";
}

/// Descriptor of a single payload part: either SOAP-body-located (no
/// `href`) or attachment-located (a `cid:`-prefixed `href`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PartInfo {
    /// `cid:`-prefixed content id of the attachment this part describes,
    /// or `None`/empty when the part is the SOAP body payload.
    pub href: Option<String>,
    /// Properties of this part. Recognized names: `MimeType`,
    /// `CompressionType`, `CharacterSet` (case-insensitive); others are ignored.
    pub part_properties: Vec<Property>,
}

impl PartInfo {
    /// Find a part property by case-insensitive name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.part_properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// `true` when `href` is present and non-empty, i.e. this part
    /// references an attachment rather than the SOAP body.
    #[must_use]
    pub fn references_attachment(&self) -> bool {
        self.href.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// `PayloadInfo`: the ordered list of parts a `UserMessage` declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PayloadInfo {
    /// The declared parts.
    pub part_info: Vec<PartInfo>,
}

/// A business-to-business message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserMessage {
    /// Identity and timing.
    pub message_info: MessageInfo,
    /// Sender and receiver.
    pub party_info: PartyInfo,
    /// Business context.
    pub collaboration_info: CollaborationInfo,
    /// Business-level properties.
    #[serde(default)]
    pub message_properties: MessageProperties,
    /// Declared payload parts, if any.
    pub payload_info: Option<PayloadInfo>,
    /// Message-side MPC override.
    pub mpc: Option<String>,
}

/// A pull request signal: "deliver any queued user message on this MPC".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PullRequest {
    /// The MPC to pull from.
    pub mpc: String,
}

/// A receipt signal, acknowledging a prior `UserMessage`. The
/// non-repudiation content itself is opaque to this engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Receipt {
    /// Opaque non-repudiation content, when present.
    pub content: Option<String>,
}

/// A single error reported by an error-bearing signal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignalError {
    /// The stable ebMS code.
    pub code: ebms_error::ErrorCode,
    /// Severity as declared on the wire.
    pub severity: ebms_error::Severity,
    /// Optional category string as declared on the wire.
    pub category: Option<String>,
    /// Id of the message this error reports on.
    pub ref_to_message_in_error: Option<String>,
    /// Human-readable description, as declared on the wire.
    pub description: Option<String>,
    /// Free-form detail, as declared on the wire.
    pub error_detail: Option<String>,
}

/// A signal message: exactly one of a pull request, a receipt, or a
/// non-empty list of errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignalMessage {
    /// Identity and timing.
    pub message_info: MessageInfo,
    /// Present when this signal is a pull request.
    pub pull_request: Option<PullRequest>,
    /// Present when this signal is a receipt.
    pub receipt: Option<Receipt>,
    /// Present (non-empty) when this signal reports errors on a prior message.
    #[serde(default)]
    pub error: Vec<SignalError>,
}

/// Envelope-level container: zero-or-one `UserMessage` and zero-or-one
/// `SignalMessage`. Exactly one of the two must be present for a message
/// to be admissible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Messaging {
    /// The user message, if this `Messaging` element carries one.
    pub user_message: Option<UserMessage>,
    /// The signal message, if this `Messaging` element carries one.
    pub signal_message: Option<SignalMessage>,
}

impl Messaging {
    /// `0` or `1` — how many user messages this envelope carries.
    #[must_use]
    pub fn user_message_count(&self) -> usize {
        usize::from(self.user_message.is_some())
    }

    /// `0` or `1` — how many signal messages this envelope carries.
    #[must_use]
    pub fn signal_message_count(&self) -> usize {
        usize::from(self.signal_message.is_some())
    }
}

// ---------------------------------------------------------------------------
// P-Mode
// ---------------------------------------------------------------------------

/// SOAP protocol version selected by a P-Mode leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SoapVersion {
    /// SOAP 1.1.
    Soap11,
    /// SOAP 1.2.
    Soap12,
}

impl SoapVersion {
    /// Namespace URI of the envelope for this SOAP version.
    #[must_use]
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
            Self::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }
}

/// Wire protocol settings of a P-Mode leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Protocol {
    /// The SOAP version this leg speaks.
    pub soap_version: SoapVersion,
}

/// Business addressing defaults for a P-Mode leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BusinessInfo {
    /// Default MPC id for user messages on this leg, if any.
    pub mpc_id: Option<String>,
    /// Default service value for this leg, if any.
    pub service: Option<String>,
    /// Default action for this leg, if any.
    pub action: Option<String>,
}

/// One direction of a message exchange pattern. Security and reliability
/// sub-configuration are opaque to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Leg {
    /// Wire protocol settings.
    pub protocol: Protocol,
    /// Business addressing defaults.
    #[serde(default)]
    pub business_info: BusinessInfo,
}

/// How many legs a P-Mode's MEP requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RequiredLegs {
    /// One-way exchange.
    One,
    /// Request-response exchange.
    Two,
}

/// Message exchange pattern binding of a P-Mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MepBinding {
    /// How many legs this MEP requires.
    pub required_legs: RequiredLegs,
}

/// A bilateral agreement governing how a message is processed between two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PMode {
    /// The P-Mode identifier.
    pub id: String,
    /// The exchange pattern this P-Mode implements.
    pub mep_binding: MepBinding,
    /// The first (and for one-way exchanges, only) leg.
    pub leg1: Leg,
    /// The second leg, required when `mep_binding.required_legs == Two`.
    pub leg2: Option<Leg>,
}

/// Which leg of a P-Mode governs a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LegNumber {
    /// Leg 1 — the initiating leg.
    One,
    /// Leg 2 — the reply leg.
    Two,
}

/// The leg selected for a `UserMessage`, and which of the two it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EffectivePModeLeg {
    /// Which leg was selected.
    pub number: LegNumber,
    /// The selected leg itself.
    pub leg: Leg,
}

/// A named logical queue for pull-style delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Mpc {
    /// The MPC's URI identifier.
    pub id: String,
}

impl Mpc {
    /// Build an MPC handle with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
