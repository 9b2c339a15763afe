// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine-wide configuration and its validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PMode, RequiredLegs};

/// Engine-wide configuration. Deliberately small: the header processing
/// pipeline has exactly one ambient setting, the address this engine is
/// reachable at, used to validate P-Modes that pin a responder address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// This engine's own address, as seen by remote parties. `None` when unset.
    pub server_address: Option<String>,
}

impl EngineConfig {
    /// Build a config with no server address set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config with the given server address.
    #[must_use]
    pub fn with_server_address(address: impl Into<String>) -> Self {
        Self {
            server_address: Some(address.into()),
        }
    }
}

/// Severity of a [`ConfigWarning`]. Warnings never block startup; they
/// exist to surface configuration that is legal but likely a mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    /// Worth a note in logs, nothing more.
    Info,
    /// Likely a misconfiguration; operators should look at it.
    Notice,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Notice => write!(f, "notice"),
        }
    }
}

/// A single configuration concern raised during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigWarning {
    /// Severity of this warning.
    pub severity: WarningSeverity,
    /// What was observed and why it's worth a look.
    pub message: String,
}

impl ConfigWarning {
    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Info,
            message: message.into(),
        }
    }

    fn notice(message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Notice,
            message: message.into(),
        }
    }
}

/// Default values this engine falls back to when configuration is silent.
#[derive(Debug, Clone, Copy)]
pub struct ConfigDefaults;

impl ConfigDefaults {
    /// Locale used when a request carries no explicit locale hint.
    pub const LOCALE: &'static str = "en";
}

/// Validates [`EngineConfig`] values and [`PMode`] structural shape,
/// accumulating non-fatal [`ConfigWarning`]s rather than failing outright —
/// none of the concerns here are reachable as header-processing errors.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    warnings: Vec<ConfigWarning>,
}

impl ConfigValidator {
    /// Build a validator with no accumulated warnings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate engine configuration, returning accumulated warnings.
    pub fn validate_engine_config(&mut self, config: &EngineConfig) -> &[ConfigWarning] {
        match &config.server_address {
            None => self
                .warnings
                .push(ConfigWarning::info("server_address is unset; responder-address checks are skipped")),
            Some(address) if address.trim().is_empty() => self
                .warnings
                .push(ConfigWarning::notice("server_address is set but blank")),
            Some(_) => {}
        }
        &self.warnings
    }

    /// Validate a P-Mode's structural shape against its declared exchange
    /// pattern: a two-leg MEP binding requires `leg2` to be present.
    pub fn validate_pmode(&mut self, pmode: &PMode) -> &[ConfigWarning] {
        if matches!(pmode.mep_binding.required_legs, RequiredLegs::Two) && pmode.leg2.is_none() {
            self.warnings.push(ConfigWarning::notice(format!(
                "P-Mode '{}' declares a two-leg exchange but leg2 is absent",
                pmode.id
            )));
        }
        if matches!(pmode.mep_binding.required_legs, RequiredLegs::One) && pmode.leg2.is_some() {
            self.warnings.push(ConfigWarning::info(format!(
                "P-Mode '{}' declares a one-leg exchange but leg2 is present and will be ignored",
                pmode.id
            )));
        }
        &self.warnings
    }

    /// All warnings accumulated so far, across every `validate_*` call.
    #[must_use]
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }
}
