// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

//! Error taxonomy for the ebMS3/AS4 engine.
//!
//! Every code follows the ebMS wire convention `EBMS:NNNN` used by the
//! OASIS ebMS 3.0 Core Specification's error signal. `ErrorCatalog` maps
//! each code to a short, locale-sensitive description; `ErrorEntry` is the
//! value the header processing pipeline appends to an `errorList` on
//! failure, and is also what a `SignalMessage`'s wire-level `Error`
//! element carries.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Coarse grouping of [`ErrorCode`]s, mirrors the "Kind" column of the
/// error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A value was not recognized (e.g. an unknown MPC).
    ValueNotRecognized,
    /// A value is inconsistent with the rest of the message or configuration.
    ValueInconsistent,
    /// A receipt signal is structurally invalid.
    InvalidReceipt,
    /// The `Messaging` header itself failed deserialization.
    InvalidHeader,
    /// No P-Mode could be resolved, or the resolved P-Mode disagrees with the message.
    ProcessingModeMismatch,
    /// Attachments disagree with the declared `PartInfo`.
    ExternalPayloadError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValueNotRecognized => "value_not_recognized",
            Self::ValueInconsistent => "value_inconsistent",
            Self::InvalidReceipt => "invalid_receipt",
            Self::InvalidHeader => "invalid_header",
            Self::ProcessingModeMismatch => "processing_mode_mismatch",
            Self::ExternalPayloadError => "external_payload_error",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// The ebMS error codes this engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `EBMS:0003` — unknown MPC on a pull request, or no pull processor claims the signal.
    ValueNotRecognized,
    /// `EBMS:0004` — cardinality violations, unknown compression type, unparseable charset,
    /// missing MIME type on a compressed part, body/part mismatch, unknown message-side MPC.
    ValueInconsistent,
    /// `EBMS:0006` — a receipt signal without `refToMessageId`.
    InvalidReceipt,
    /// `EBMS:0009` — the `Messaging` element failed XSD deserialization.
    InvalidHeader,
    /// `EBMS:0010` — P-Mode not resolvable, required leg absent, invalid P-Mode-side MPC.
    ProcessingModeMismatch,
    /// `EBMS:0011` — attachment count disagrees with `PartInfo`, or attachments with no `PartInfo`.
    ExternalPayloadError,
}

impl ErrorCode {
    /// Stable wire code, e.g. `"EBMS:0003"`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValueNotRecognized => "EBMS:0003",
            Self::ValueInconsistent => "EBMS:0004",
            Self::InvalidReceipt => "EBMS:0006",
            Self::InvalidHeader => "EBMS:0009",
            Self::ProcessingModeMismatch => "EBMS:0010",
            Self::ExternalPayloadError => "EBMS:0011",
        }
    }

    /// The category this code belongs to. For this taxonomy category and
    /// code are in a one-to-one relationship.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValueNotRecognized => ErrorCategory::ValueNotRecognized,
            Self::ValueInconsistent => ErrorCategory::ValueInconsistent,
            Self::InvalidReceipt => ErrorCategory::InvalidReceipt,
            Self::InvalidHeader => ErrorCategory::InvalidHeader,
            Self::ProcessingModeMismatch => ErrorCategory::ProcessingModeMismatch,
            Self::ExternalPayloadError => ErrorCategory::ExternalPayloadError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for ErrorCode {}

/// All codes, in catalog order.
const ALL_CODES: &[ErrorCode] = &[
    ErrorCode::ValueNotRecognized,
    ErrorCode::ValueInconsistent,
    ErrorCode::InvalidReceipt,
    ErrorCode::InvalidHeader,
    ErrorCode::ProcessingModeMismatch,
    ErrorCode::ExternalPayloadError,
];

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of an error entry, matching the `severity` attribute of an
/// ebMS `Error` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The message cannot be processed further.
    Failure,
    /// Advisory only; processing continued.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => write!(f, "failure"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorCatalog
// ---------------------------------------------------------------------------

/// Looks up the stable codes and their locale-sensitive descriptions.
///
/// Only `en` and `nl` are populated; any other locale falls back to `en`.
pub struct ErrorCatalog;

impl ErrorCatalog {
    /// Look up an [`ErrorCode`] by its wire string, e.g. `"EBMS:0003"`.
    #[must_use]
    pub fn lookup(code: &str) -> Option<ErrorCode> {
        ALL_CODES.iter().find(|c| c.code() == code).copied()
    }

    /// Every code this engine knows about, in catalog order.
    #[must_use]
    pub fn all() -> Vec<ErrorCode> {
        ALL_CODES.to_vec()
    }

    /// All codes belonging to `category`.
    #[must_use]
    pub fn by_category(category: ErrorCategory) -> Vec<ErrorCode> {
        ALL_CODES
            .iter()
            .filter(|c| c.category() == category)
            .copied()
            .collect()
    }

    /// Short, human-readable description for `code` in `locale`.
    #[must_use]
    pub fn describe(code: ErrorCode, locale: &str) -> &'static str {
        match (code, locale) {
            (ErrorCode::ValueNotRecognized, "nl") => "De waarde wordt niet herkend",
            (ErrorCode::ValueNotRecognized, _) => "The value is not recognized",

            (ErrorCode::ValueInconsistent, "nl") => "De waarde is inconsistent",
            (ErrorCode::ValueInconsistent, _) => "The value is inconsistent",

            (ErrorCode::InvalidReceipt, "nl") => "Het ontvangstbewijs is ongeldig",
            (ErrorCode::InvalidReceipt, _) => "The receipt signal is invalid",

            (ErrorCode::InvalidHeader, "nl") => "De berichtenheader is ongeldig",
            (ErrorCode::InvalidHeader, _) => "The messaging header is invalid",

            (ErrorCode::ProcessingModeMismatch, "nl") => "De processing mode komt niet overeen",
            (ErrorCode::ProcessingModeMismatch, _) => "The processing mode does not match",

            (ErrorCode::ExternalPayloadError, "nl") => "Fout in externe payload",
            (ErrorCode::ExternalPayloadError, _) => "External payload error",
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorEntry
// ---------------------------------------------------------------------------

/// A single ebMS error entry: what the header processing pipeline appends
/// to an `errorList` on failure, and what a `SignalMessage`'s `Error`
/// element carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEntry {
    /// The stable ebMS code.
    pub code: ErrorCode,
    /// How severe this entry is.
    pub severity: Severity,
    /// Locale-sensitive short description, sourced from the [`ErrorCatalog`].
    pub short_description: String,
    /// `refToMessageInError`, when this entry is reporting on a specific prior message.
    pub ref_to_message_in_error: Option<String>,
    /// Free-form detail, e.g. a collected schema-validation diagnostic.
    pub error_detail: Option<String>,
}

impl ErrorEntry {
    /// Build a new failure-severity entry, describing `code` in `locale`.
    #[must_use]
    pub fn new(code: ErrorCode, locale: &str) -> Self {
        Self {
            code,
            severity: Severity::Failure,
            short_description: ErrorCatalog::describe(code, locale).to_string(),
            ref_to_message_in_error: None,
            error_detail: None,
        }
    }

    /// Mark this entry as advisory only.
    #[must_use]
    pub fn with_warning_severity(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Attach a free-form detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }

    /// Attach the message id this entry reports on.
    #[must_use]
    pub fn with_ref_to_message_in_error(mut self, message_id: impl Into<String>) -> Self {
        self.ref_to_message_in_error = Some(message_id.into());
        self
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code.code(), self.short_description, self.severity)?;
        if let Some(detail) = &self.error_detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorEntry {}

/// The list of ebMS error entries a failed header-processing call reports.
pub type ErrorList = Vec<ErrorEntry>;

// ---------------------------------------------------------------------------
// EngineError — rich internal error for non-ebMS (structural) faults
// ---------------------------------------------------------------------------

/// Structural or collaborator faults that are not ebMS-level admissibility
/// errors — these propagate across the pipeline's boundary rather than
/// being reported via an [`ErrorList`].
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// A collaborator (P-Mode store, MPC registry, ...) failed in a way
    /// that is not itself an ebMS fault.
    #[error("collaborator failure: {message}")]
    Collaborator {
        /// Human-readable explanation.
        message: String,
        /// Optional underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// JSON (de)serialization of a wire value failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Build a collaborator failure with no underlying cause.
    #[must_use]
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
            source: None,
        }
    }

    /// Build a collaborator failure wrapping an underlying cause.
    #[must_use]
    pub fn collaborator_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Collaborator {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// ---------------------------------------------------------------------------
// EbmsError — rich error with structured context, for host-side logging
// ---------------------------------------------------------------------------

/// A rich error value: an [`ErrorCode`], a human message, structured
/// context, and an optional source.
pub struct EbmsError {
    /// The catalog error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Arbitrary key-value context, deterministic ordering.
    pub context: BTreeMap<String, serde_json::Value>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EbmsError {
    /// Start building an [`EbmsError`] for the given code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: BTreeMap::new(),
            source: None,
        }
    }

    /// Add a key-value context entry. Silently skipped if `value` cannot be serialized.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert this into a wire-level [`ErrorEntry`], localized.
    #[must_use]
    pub fn to_entry(&self, locale: &str) -> ErrorEntry {
        ErrorEntry::new(self.code, locale).with_detail(self.message.clone())
    }
}

impl fmt::Display for EbmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if !self.context.is_empty() {
            write!(f, " (")?;
            let mut first = true;
            for (k, v) in &self.context {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{k}={v}")?;
                first = false;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for EbmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EbmsError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("context", &self.context)
            .field("source", &self.source.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

impl std::error::Error for EbmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
