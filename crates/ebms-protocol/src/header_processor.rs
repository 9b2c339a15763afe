// SPDX-License-Identifier: MIT OR Apache-2.0
//! The inbound `Messaging` header processor: the centerpiece of this
//! engine. Binds a raw header into structured data, validates it against
//! the governing P-Mode, and commits the result to per-request state.

use ebms_core::state::Attachment;
use ebms_core::{
    part_property_names, CompressionType, EffectivePModeLeg, LegNumber, Messaging, RequiredLegs,
    UserMessage,
};
use ebms_error::{EbmsError, ErrorCode, ErrorList};

use crate::chain::{HeaderProcessingContext, HeaderProcessor, QName};
use crate::MessagingSource;

/// Outcome of processing one header element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Processing completed with no failure-level errors recorded.
    Success,
    /// At least one failure-level error was recorded; the message is not admissible.
    Failure,
}

/// Processes the `Messaging` SOAP header: the sole header this engine understands.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessagingHeaderProcessor;

impl MessagingHeaderProcessor {
    /// Build a processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Process one `Messaging` header against the supplied collaborators,
    /// committing results to `ctx.state` and appending to `errors`.
    pub fn process_messaging(
        &self,
        ctx: &mut HeaderProcessingContext<'_, '_>,
        errors: &mut ErrorList,
    ) -> ProcessOutcome {
        let locale = ctx.state.locale.clone();
        tracing::debug!("entering Messaging header processing");

        // P0 — Parse: adopt whatever the binding layer produced. A parsed
        // Messaging is recorded unconditionally, even if later phases fail.
        let messaging = match &ctx.messaging_source {
            MessagingSource::Parsed(messaging) => messaging.clone(),
            MessagingSource::Invalid(reasons) => {
                for reason in reasons {
                    errors.push(
                        EbmsError::new(ErrorCode::InvalidHeader, reason.clone())
                            .to_entry(&locale),
                    );
                }
                return ProcessOutcome::Failure;
            }
        };
        ctx.state.messaging = Some(messaging.clone());

        // P1 — Cardinality: exactly one of UserMessage/SignalMessage.
        let present = messaging.user_message_count() + messaging.signal_message_count();
        if present != 1 {
            errors.push(
                EbmsError::new(
                    ErrorCode::ValueInconsistent,
                    format!(
                        "Messaging header must carry exactly one of UserMessage or \
                         SignalMessage, found {present}"
                    ),
                )
                .to_entry(&locale),
            );
            return ProcessOutcome::Failure;
        }

        let outcome = if let Some(user_message) = &messaging.user_message {
            tracing::debug!(
                message_id = %user_message.message_info.message_id,
                conversation_id = %user_message.collaboration_info.conversation_id,
                "dispatching UserMessage branch"
            );
            self.process_user_message(ctx, user_message, errors, &locale)
        } else if let Some(signal) = &messaging.signal_message {
            tracing::debug!(
                message_id = %signal.message_info.message_id,
                "dispatching SignalMessage branch"
            );
            self.process_signal_message(ctx, signal, errors, &locale)
        } else {
            unreachable!("cardinality check above guarantees exactly one branch")
        };

        outcome
    }

    fn process_user_message(
        &self,
        ctx: &mut HeaderProcessingContext<'_, '_>,
        user_message: &UserMessage,
        errors: &mut ErrorList,
        locale: &str,
    ) -> ProcessOutcome {
        // Step 1 — party cardinality: exactly one partyId per side.
        if user_message.party_info.from.party_ids.len() != 1
            || user_message.party_info.to.party_ids.len() != 1
        {
            errors.push(
                EbmsError::new(
                    ErrorCode::ValueInconsistent,
                    "PartyInfo.from and PartyInfo.to must each declare exactly one PartyId",
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        }
        let initiator_id = user_message.party_info.from.party_ids[0].value.clone();
        let responder_id = user_message.party_info.to.party_ids[0].value.clone();

        // Step 2 — P-Mode resolution.
        let pmode_hint = user_message
            .collaboration_info
            .agreement_ref
            .as_ref()
            .and_then(|agreement| agreement.pmode.as_deref());
        let Some(pmode) = ctx.pmode_resolver.resolve(
            pmode_hint,
            &user_message.collaboration_info.service.value,
            &user_message.collaboration_info.action,
            &initiator_id,
            &responder_id,
            ctx.config.server_address.as_deref(),
        ) else {
            errors.push(
                EbmsError::new(
                    ErrorCode::ProcessingModeMismatch,
                    "no P-Mode matches this UserMessage",
                )
                .with_context("service", &user_message.collaboration_info.service.value)
                .with_context("action", &user_message.collaboration_info.action)
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        };

        // Step 3 — leg selection. useLeg1 holds unless refToMessageId is
        // present and genuinely refers to a different message; a
        // self-referencing messageId is suspicious but still resolves to leg1.
        let this_id = user_message.message_info.message_id.as_str();
        let ref_id = user_message.message_info.ref_to_message_id.as_deref();
        if ref_id.is_some_and(|id| id == this_id) {
            tracing::warn!(message_id = this_id, "UserMessage refers to its own messageId");
        }
        let use_leg1 = ref_id.is_none_or(|id| id == this_id);

        if matches!(pmode.mep_binding.required_legs, RequiredLegs::Two) && pmode.leg2.is_none() {
            errors.push(
                EbmsError::new(
                    ErrorCode::ProcessingModeMismatch,
                    format!("P-Mode '{}' requires two legs but leg2 is absent", pmode.id),
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        }

        let selected_leg = if use_leg1 { Some(&pmode.leg1) } else { pmode.leg2.as_ref() };
        let Some(selected_leg) = selected_leg else {
            errors.push(
                EbmsError::new(
                    ErrorCode::ProcessingModeMismatch,
                    "leg selection resolved to an absent leg",
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        };
        let effective_leg = EffectivePModeLeg {
            number: if use_leg1 { LegNumber::One } else { LegNumber::Two },
            leg: selected_leg.clone(),
        };

        // Step 4 — MPC validation (config side).
        if let Some(configured_mpc) = &effective_leg.leg.business_info.mpc_id {
            if !ctx.mpc_registry.contains(configured_mpc) {
                errors.push(
                    EbmsError::new(
                        ErrorCode::ProcessingModeMismatch,
                        "P-Mode leg declares an MPC that is not registered",
                    )
                    .with_context("mpc", configured_mpc.clone())
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            }
        }

        // Step 5 — SOAP body payload presence.
        let soap_body_payload_present = ctx
            .soap_document
            .is_some_and(|doc| doc.body_has_children(effective_leg.leg.protocol.soap_version));

        // Step 6 — MPC message-side resolution. Message-level MPC takes
        // precedence over the leg-level default.
        let mpc_candidate = user_message
            .mpc
            .clone()
            .or_else(|| effective_leg.leg.business_info.mpc_id.clone());
        let Some(effective_mpc) = ctx.mpc_registry.get_or_default(mpc_candidate.as_deref()) else {
            errors.push(
                EbmsError::new(
                    ErrorCode::ValueInconsistent,
                    "UserMessage declares an MPC that is not registered",
                )
                .with_context("mpc", mpc_candidate.unwrap_or_default())
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        };

        // Step 7 — payload/attachment cross-check.
        let parts = user_message
            .payload_info
            .as_ref()
            .map(|payload_info| payload_info.part_info.as_slice())
            .unwrap_or_default();
        let mut attachments = std::mem::take(&mut ctx.attachments);

        if parts.is_empty() {
            if soap_body_payload_present {
                errors.push(
                    EbmsError::new(
                        ErrorCode::ValueInconsistent,
                        "SOAP body carries a payload but no PartInfo references it",
                    )
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            }
            if !attachments.is_empty() {
                errors.push(
                    EbmsError::new(
                        ErrorCode::ExternalPayloadError,
                        "attachments were delivered but PayloadInfo is absent",
                    )
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            }
        } else if attachments.len() > parts.len() {
            errors.push(
                EbmsError::new(
                    ErrorCode::ExternalPayloadError,
                    "more attachments were delivered than PartInfo entries declare",
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        }

        let mut compressed_attachment_ids = std::collections::BTreeMap::new();
        let mut specified_attachment_count = 0usize;
        for part in parts {
            if !part.references_attachment() {
                if !soap_body_payload_present {
                    errors.push(
                        EbmsError::new(
                            ErrorCode::ValueInconsistent,
                            "PartInfo with no href requires a SOAP body payload",
                        )
                        .to_entry(locale),
                    );
                    return ProcessOutcome::Failure;
                }
                continue;
            }

            specified_attachment_count += 1;
            let content_id = part
                .href
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches("cid:");

            let mime_type_present = part
                .find_property(part_property_names::MIME_TYPE)
                .is_some_and(|property| !property.value.is_empty());
            let compression = part
                .find_property(part_property_names::COMPRESSION_TYPE)
                .filter(|property| !property.value.is_empty());
            let character_set = part
                .find_property(part_property_names::CHARACTER_SET)
                .filter(|property| !property.value.is_empty());

            if let Some(compression_property) = compression {
                match CompressionType::parse(&compression_property.value) {
                    Some(compression_type) => {
                        compressed_attachment_ids.insert(content_id.to_string(), compression_type);
                    }
                    None => {
                        errors.push(
                            EbmsError::new(
                                ErrorCode::ValueInconsistent,
                                format!(
                                    "unrecognized CompressionType '{}'",
                                    compression_property.value
                                ),
                            )
                            .with_context("content_id", content_id)
                            .to_entry(locale),
                        );
                        return ProcessOutcome::Failure;
                    }
                }
                if !mime_type_present {
                    errors.push(
                        EbmsError::new(
                            ErrorCode::ValueInconsistent,
                            "a compressed part must also declare MimeType",
                        )
                        .with_context("content_id", content_id)
                        .to_entry(locale),
                    );
                    return ProcessOutcome::Failure;
                }
            }

            match attachments.iter_mut().find(|a| a.content_id == content_id) {
                Some(attachment) => {
                    if let Some(character_set_property) = character_set {
                        match ebms_core::canonical_charset(&character_set_property.value) {
                            Some(canonical) => attachment.declared_charset = Some(canonical.to_string()),
                            None => {
                                errors.push(
                                    EbmsError::new(
                                        ErrorCode::ValueInconsistent,
                                        format!(
                                            "unrecognized CharacterSet '{}'",
                                            character_set_property.value
                                        ),
                                    )
                                    .with_context("content_id", content_id)
                                    .to_entry(locale),
                                );
                                return ProcessOutcome::Failure;
                            }
                        }
                    }
                }
                None => {
                    tracing::warn!(
                        content_id,
                        "PartInfo references an attachment that was not delivered"
                    );
                }
            }
        }

        if specified_attachment_count != attachments.len() {
            errors.push(
                EbmsError::new(
                    ErrorCode::ExternalPayloadError,
                    "number of attachment-bearing PartInfo entries disagrees with delivered attachments",
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        }

        // P3 — commit.
        ctx.state.p_mode = Some(pmode);
        ctx.state.effective_pmode_leg = Some(effective_leg);
        ctx.state.mpc = Some(effective_mpc);
        ctx.state.initiator_id = Some(initiator_id);
        ctx.state.responder_id = Some(responder_id);
        ctx.state.soap_body_payload_present = soap_body_payload_present;
        ctx.state.original_soap_document = ctx.soap_document;
        ctx.state.original_attachments = attachments;
        ctx.state.compressed_attachment_ids = compressed_attachment_ids;

        ProcessOutcome::Success
    }

    fn process_signal_message(
        &self,
        ctx: &mut HeaderProcessingContext<'_, '_>,
        signal: &ebms_core::SignalMessage,
        errors: &mut ErrorList,
        locale: &str,
    ) -> ProcessOutcome {
        // Step 1 — exactly one signal kind.
        let kinds = usize::from(signal.pull_request.is_some())
            + usize::from(signal.receipt.is_some())
            + usize::from(!signal.error.is_empty());
        if kinds != 1 {
            errors.push(
                EbmsError::new(
                    ErrorCode::ValueInconsistent,
                    "SignalMessage must carry exactly one of PullRequest, Receipt, or Error",
                )
                .to_entry(locale),
            );
            return ProcessOutcome::Failure;
        }

        if let Some(pull_request) = &signal.pull_request {
            // Step 2 — pull request: the MPC must be known. This call site is
            // not the user-message effective-MPC resolution, so it uses the
            // strict form rather than `getOrDefault`.
            let Some(mpc) = ctx.mpc_registry.get(&pull_request.mpc) else {
                errors.push(
                    EbmsError::new(
                        ErrorCode::ValueNotRecognized,
                        "PullRequest references an unregistered MPC",
                    )
                    .with_context("mpc", pull_request.mpc.clone())
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            };
            let Some(claimed_pmode) = ctx.pull_request_registry.process(signal) else {
                errors.push(
                    EbmsError::new(
                        ErrorCode::ValueNotRecognized,
                        "no registered processor claims this PullRequest",
                    )
                    .with_context("mpc", pull_request.mpc.clone())
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            };
            ctx.state.mpc = Some(mpc);
            ctx.state.p_mode = Some(claimed_pmode);
        } else if signal.receipt.is_some() {
            // Step 3 — receipt: refToMessageId must be present and non-empty.
            let ref_to_message_id = signal.message_info.ref_to_message_id.as_deref();
            if ref_to_message_id.is_none_or(str::is_empty) {
                errors.push(
                    EbmsError::new(
                        ErrorCode::InvalidReceipt,
                        "Receipt signal is missing a non-empty refToMessageId",
                    )
                    .to_entry(locale),
                );
                return ProcessOutcome::Failure;
            }
        } else {
            // Error-bearing signal: advisory logging only. refToMessageInError
            // is not re-promoted to a hard check here.
            for signal_error in &signal.error {
                tracing::warn!(
                    code = %signal_error.code,
                    ref_to_message_in_error = signal_error.ref_to_message_in_error.as_deref().unwrap_or(""),
                    "inbound SignalMessage reports an error"
                );
            }
        }

        ProcessOutcome::Success
    }
}

impl HeaderProcessor for MessagingHeaderProcessor {
    fn qname(&self) -> QName {
        QName::new(ebms_core::EBMS_CORE_NAMESPACE, ebms_core::MESSAGING_LOCAL_NAME)
    }

    fn process(&self, ctx: &mut HeaderProcessingContext<'_, '_>) -> ProcessOutcome {
        let mut errors = std::mem::take(&mut ctx.errors);
        let outcome = MessagingHeaderProcessor::process_messaging(self, ctx, &mut errors);
        ctx.errors = errors;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{pmode_fixture, user_message_fixture};
    use ebms_core::state::{MessageState, SoapDocument};
    use ebms_core::{EngineConfig, PullRequestProcessorRegistry, SoapVersion, StaticMpcRegistry, StaticPModeCatalog};

    #[derive(Debug)]
    struct FakeDocument {
        has_body: bool,
    }
    impl SoapDocument for FakeDocument {
        fn body_has_children(&self, _soap_version: SoapVersion) -> bool {
            self.has_body
        }
    }

    fn context<'ctx, 'doc>(
        messaging: Messaging,
        attachments: Vec<Attachment>,
        soap_document: Option<&'doc dyn SoapDocument>,
        state: &'ctx mut MessageState<'doc>,
        config: &'ctx EngineConfig,
        resolver: &'ctx StaticPModeCatalog,
        mpc_registry: &'ctx StaticMpcRegistry,
        pull_registry: &'ctx PullRequestProcessorRegistry,
    ) -> HeaderProcessingContext<'ctx, 'doc> {
        HeaderProcessingContext {
            messaging_source: MessagingSource::Parsed(messaging),
            soap_document,
            attachments,
            state,
            config,
            pmode_resolver: resolver,
            mpc_registry,
            pull_request_registry: pull_registry,
            errors: Vec::new(),
        }
    }

    #[test]
    fn minimal_valid_user_message_succeeds() {
        let pmode = pmode_fixture("P1");
        let resolver = StaticPModeCatalog::new().with_pmode(pmode);
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let doc = FakeDocument { has_body: false };
        let mut state = MessageState::new("en");
        let messaging = Messaging {
            user_message: Some(user_message_fixture("P1")),
            signal_message: None,
        };
        let mut ctx = context(
            messaging,
            Vec::new(),
            Some(&doc),
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Success);
        assert!(errors.is_empty());
        assert!(ctx.state.p_mode.is_some());
        assert_eq!(ctx.state.mpc.as_ref().map(|m| m.id.as_str()), Some(ebms_core::DEFAULT_MPC));
    }

    #[test]
    fn user_and_signal_message_together_is_value_inconsistent() {
        let resolver = StaticPModeCatalog::new();
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let mut state = MessageState::new("en");
        // Cardinality violation is checked before branching, so a lone
        // UserMessage alongside a SignalMessage already reproduces it.
        let messaging = Messaging {
            user_message: Some(user_message_fixture("P1")),
            signal_message: Some(ebms_core::SignalMessage {
                message_info: ebms_core::MessageInfo {
                    message_id: "sig-1".into(),
                    ref_to_message_id: None,
                    timestamp: chrono::Utc::now(),
                },
                pull_request: Some(ebms_core::PullRequest {
                    mpc: ebms_core::DEFAULT_MPC.into(),
                }),
                receipt: None,
                error: Vec::new(),
            }),
        };
        let mut ctx = context(
            messaging,
            Vec::new(),
            None,
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Failure);
        assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
    }

    #[test]
    fn compressed_attachment_missing_mime_type_fails() {
        let pmode = pmode_fixture("P1");
        let resolver = StaticPModeCatalog::new().with_pmode(pmode);
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let mut state = MessageState::new("en");

        let mut user_message = user_message_fixture("P1");
        user_message.payload_info = Some(ebms_core::PayloadInfo {
            part_info: vec![ebms_core::PartInfo {
                href: Some("cid:payload-1".into()),
                part_properties: vec![ebms_core::Property::new(
                    "CompressionType",
                    CompressionType::GZIP_MIME,
                )],
            }],
        });
        let messaging = Messaging {
            user_message: Some(user_message),
            signal_message: None,
        };
        let attachments = vec![Attachment::new("payload-1")];
        let mut ctx = context(
            messaging,
            attachments,
            None,
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Failure);
        assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
    }

    #[test]
    fn gzipped_attachment_with_mime_type_succeeds_and_is_tracked() {
        let pmode = pmode_fixture("P1");
        let resolver = StaticPModeCatalog::new().with_pmode(pmode);
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let mut state = MessageState::new("en");

        let mut user_message = user_message_fixture("P1");
        user_message.payload_info = Some(ebms_core::PayloadInfo {
            part_info: vec![ebms_core::PartInfo {
                href: Some("cid:payload-1".into()),
                part_properties: vec![
                    ebms_core::Property::new("MimeType", "application/xml"),
                    ebms_core::Property::new("CompressionType", CompressionType::GZIP_MIME),
                ],
            }],
        });
        let messaging = Messaging {
            user_message: Some(user_message),
            signal_message: None,
        };
        let attachments = vec![Attachment::new("payload-1")];
        let mut ctx = context(
            messaging,
            attachments,
            None,
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Success);
        assert_eq!(
            ctx.state.compressed_attachment_ids.get("payload-1"),
            Some(&CompressionType::Gzip)
        );
    }

    #[test]
    fn unknown_pull_request_mpc_is_value_not_recognized() {
        let resolver = StaticPModeCatalog::new();
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let mut state = MessageState::new("en");
        let messaging = Messaging {
            user_message: None,
            signal_message: Some(ebms_core::SignalMessage {
                message_info: ebms_core::MessageInfo {
                    message_id: "sig-1".into(),
                    ref_to_message_id: None,
                    timestamp: chrono::Utc::now(),
                },
                pull_request: Some(ebms_core::PullRequest {
                    mpc: "urn:example:unknown-mpc".into(),
                }),
                receipt: None,
                error: Vec::new(),
            }),
        };
        let mut ctx = context(
            messaging,
            Vec::new(),
            None,
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Failure);
        assert_eq!(errors[0].code, ErrorCode::ValueNotRecognized);
    }

    #[test]
    fn receipt_with_empty_ref_to_message_id_is_invalid_receipt() {
        let resolver = StaticPModeCatalog::new();
        let mpc_registry = StaticMpcRegistry::new();
        let config = EngineConfig::new();
        let pull_registry = PullRequestProcessorRegistry::new();
        let mut state = MessageState::new("en");
        let messaging = Messaging {
            user_message: None,
            signal_message: Some(ebms_core::SignalMessage {
                message_info: ebms_core::MessageInfo {
                    message_id: "sig-1".into(),
                    ref_to_message_id: Some(String::new()),
                    timestamp: chrono::Utc::now(),
                },
                pull_request: None,
                receipt: Some(ebms_core::Receipt::default()),
                error: Vec::new(),
            }),
        };
        let mut ctx = context(
            messaging,
            Vec::new(),
            None,
            &mut state,
            &config,
            &resolver,
            &mpc_registry,
            &pull_registry,
        );
        let mut errors = Vec::new();
        let outcome = MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors);
        assert_eq!(outcome, ProcessOutcome::Failure);
        assert_eq!(errors[0].code, ErrorCode::InvalidReceipt);
    }
}
