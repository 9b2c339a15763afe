// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenario tests for the inbound `Messaging` header processing pipeline.

use ebms_core::state::{Attachment, MessageState, SoapDocument};
use ebms_core::{
    EngineConfig, Messaging, MessageInfo, PullRequest, PullRequestProcessorRegistry, Receipt,
    SignalMessage, SoapVersion, StaticMpcRegistry, StaticPModeCatalog, DEFAULT_MPC,
};
use ebms_error::ErrorCode;
use ebms_protocol::builder::{pmode_fixture, user_message_fixture, PModeBuilder, UserMessageBuilder};
use ebms_protocol::{HeaderProcessingContext, MessagingHeaderProcessor, MessagingSource, ProcessOutcome};

#[derive(Debug)]
struct StubDocument {
    has_body: bool,
}

impl SoapDocument for StubDocument {
    fn body_has_children(&self, _soap_version: SoapVersion) -> bool {
        self.has_body
    }
}

#[allow(clippy::too_many_arguments)]
fn run<'doc>(
    messaging: Messaging,
    attachments: Vec<Attachment>,
    soap_document: Option<&'doc dyn SoapDocument>,
    resolver: &StaticPModeCatalog,
    mpc_registry: &StaticMpcRegistry,
    pull_registry: &PullRequestProcessorRegistry,
) -> (ProcessOutcome, Vec<ebms_error::ErrorEntry>, MessageState<'doc>) {
    let config = EngineConfig::new();
    let mut state = MessageState::new("en");
    let mut errors = Vec::new();
    let outcome = {
        let mut ctx = HeaderProcessingContext {
            messaging_source: MessagingSource::Parsed(messaging),
            soap_document,
            attachments,
            state: &mut state,
            config: &config,
            pmode_resolver: resolver,
            mpc_registry,
            pull_request_registry: pull_registry,
            errors: Vec::new(),
        };
        MessagingHeaderProcessor::new().process_messaging(&mut ctx, &mut errors)
    };
    (outcome, errors, state)
}

#[test]
fn minimal_valid_user_message_is_admissible() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: Some(user_message_fixture("P1")),
        signal_message: None,
    };
    let (outcome, errors, state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Success);
    assert!(errors.is_empty());
    assert_eq!(state.mpc.unwrap().id, DEFAULT_MPC);
}

#[test]
fn unknown_pull_request_mpc_is_rejected() {
    let resolver = StaticPModeCatalog::new();
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: None,
        signal_message: Some(SignalMessage {
            message_info: MessageInfo {
                message_id: "s1".into(),
                ref_to_message_id: None,
                timestamp: chrono::Utc::now(),
            },
            pull_request: Some(PullRequest {
                mpc: "urn:example:unregistered".into(),
            }),
            receipt: None,
            error: Vec::new(),
        }),
    };
    let (outcome, errors, _state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueNotRecognized);
}

#[test]
fn receipt_missing_ref_to_message_id_is_rejected() {
    let resolver = StaticPModeCatalog::new();
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: None,
        signal_message: Some(SignalMessage {
            message_info: MessageInfo {
                message_id: "s1".into(),
                ref_to_message_id: None,
                timestamp: chrono::Utc::now(),
            },
            pull_request: None,
            receipt: Some(Receipt::default()),
            error: Vec::new(),
        }),
    };
    let (outcome, errors, _state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::InvalidReceipt);
}

#[test]
fn leg_selection_picks_leg2_for_a_response() {
    let pmode = PModeBuilder::new("P9").two_way().build();
    let resolver = StaticPModeCatalog::new().with_pmode(pmode);
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let user_message = UserMessageBuilder::new("P9").responding_to("original-1").build();
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let (outcome, errors, state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Success);
    assert!(errors.is_empty());
    assert!(matches!(
        state.effective_pmode_leg.unwrap().number,
        ebms_core::LegNumber::Two
    ));
}

#[test]
fn soap_body_payload_presence_is_read_from_the_document() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    // A body-payload part carries no href; it is referenced by the SOAP
    // body itself, not by an attachment.
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: None,
            part_properties: Vec::new(),
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let document = StubDocument { has_body: true };
    let (outcome, _errors, state) = run(
        messaging,
        Vec::new(),
        Some(&document),
        &resolver,
        &mpc_registry,
        &pull_registry,
    );
    assert_eq!(outcome, ProcessOutcome::Success);
    assert!(state.soap_body_payload_present);
    assert!(std::ptr::eq(
        state.original_soap_document.unwrap() as *const dyn SoapDocument as *const (),
        &document as *const StubDocument as *const (),
    ));
}

#[test]
fn body_payload_with_no_referencing_part_is_value_inconsistent() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: Some(user_message_fixture("P1")),
        signal_message: None,
    };
    let document = StubDocument { has_body: true };
    let (outcome, errors, _state) = run(
        messaging,
        Vec::new(),
        Some(&document),
        &resolver,
        &mpc_registry,
        &pull_registry,
    );
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
}

#[test]
fn attachment_delivered_without_any_part_info_is_external_payload_error() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: Some(user_message_fixture("P1")),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("orphan-1")];
    let (outcome, errors, _state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ExternalPayloadError);
}

#[test]
fn more_attachments_than_declared_parts_is_external_payload_error() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: Vec::new(),
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1"), Attachment::new("payload-2")];
    let (outcome, errors, _state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ExternalPayloadError);
}

#[test]
fn unregistered_compression_type_is_value_inconsistent() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: vec![ebms_core::Property::new("CompressionType", "application/zstd")],
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1")];
    let (outcome, errors, _state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
}

#[test]
fn unrecognized_character_set_is_value_inconsistent() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: vec![ebms_core::Property::new("CharacterSet", "not-a-real-charset")],
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1")];
    let (outcome, errors, _state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
}

#[test]
fn two_leg_pmode_missing_leg2_is_processing_mode_mismatch() {
    let pmode = PModeBuilder::new("P9").two_way().build();
    let mut pmode = pmode;
    pmode.leg2 = None;
    let resolver = StaticPModeCatalog::new().with_pmode(pmode);
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: Some(user_message_fixture("P9")),
        signal_message: None,
    };
    let (outcome, errors, _state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ProcessingModeMismatch);
}

#[test]
fn unclaimed_pull_request_is_value_not_recognized() {
    let resolver = StaticPModeCatalog::new();
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let messaging = Messaging {
        user_message: None,
        signal_message: Some(SignalMessage {
            message_info: MessageInfo {
                message_id: "s1".into(),
                ref_to_message_id: None,
                timestamp: chrono::Utc::now(),
            },
            pull_request: Some(PullRequest {
                mpc: ebms_core::DEFAULT_MPC.into(),
            }),
            receipt: None,
            error: Vec::new(),
        }),
    };
    let (outcome, errors, _state) = run(messaging, Vec::new(), None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueNotRecognized);
}

#[test]
fn empty_compression_type_is_treated_as_no_compression() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: vec![ebms_core::Property::new("CompressionType", "")],
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1")];
    let (outcome, errors, state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Success);
    assert!(errors.is_empty());
    assert!(state.compressed_attachment_ids.is_empty());
}

#[test]
fn empty_mime_type_does_not_satisfy_compressed_part_requirement() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: vec![
                ebms_core::Property::new("MimeType", ""),
                ebms_core::Property::new("CompressionType", ebms_core::CompressionType::GZIP_MIME),
            ],
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1")];
    let (outcome, errors, _state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Failure);
    assert_eq!(errors[0].code, ErrorCode::ValueInconsistent);
}

#[test]
fn empty_character_set_is_ignored_rather_than_rejected() {
    let resolver = StaticPModeCatalog::new().with_pmode(pmode_fixture("P1"));
    let mpc_registry = StaticMpcRegistry::new();
    let pull_registry = PullRequestProcessorRegistry::new();
    let mut user_message = user_message_fixture("P1");
    user_message.payload_info = Some(ebms_core::PayloadInfo {
        part_info: vec![ebms_core::PartInfo {
            href: Some("cid:payload-1".into()),
            part_properties: vec![ebms_core::Property::new("CharacterSet", "")],
        }],
    });
    let messaging = Messaging {
        user_message: Some(user_message),
        signal_message: None,
    };
    let attachments = vec![Attachment::new("payload-1")];
    let (outcome, errors, state) = run(messaging, attachments, None, &resolver, &mpc_registry, &pull_registry);
    assert_eq!(outcome, ProcessOutcome::Success);
    assert!(errors.is_empty());
    assert!(state.original_attachments[0].declared_charset.is_none());
}
