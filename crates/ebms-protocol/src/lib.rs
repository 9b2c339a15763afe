// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod builder;
pub mod chain;
pub mod header_processor;

pub use chain::{HeaderProcessor, HeaderProcessorChain, HeaderProcessingContext, QName};
pub use header_processor::{MessagingHeaderProcessor, ProcessOutcome};

use ebms_core::Messaging;

/// Outcome of binding a raw `Messaging` header element into structured data.
/// Producing this from wire XML is outside this engine's scope; the
/// pipeline only ever sees one of these two shapes.
#[derive(Debug, Clone)]
pub enum MessagingSource {
    /// The header bound cleanly.
    Parsed(Messaging),
    /// Binding failed; each entry is a human-readable reason.
    Invalid(Vec<String>),
}

/// Converts a raw header representation into a [`MessagingSource`].
/// Implementations live upstream of this crate in a real deployment (an
/// XML-to-object binding layer); this crate only depends on the trait.
pub trait MessagingReader: Send + Sync {
    /// Bind `raw_header` into a [`MessagingSource`].
    fn read(&self, raw_header: &str) -> MessagingSource;
}

/// A [`MessagingReader`] that binds a JSON representation of the
/// `Messaging` header. Used as the default when no richer XML binding
/// layer is wired in; production deployments typically supply their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessagingReader;

impl MessagingReader for DefaultMessagingReader {
    fn read(&self, raw_header: &str) -> MessagingSource {
        match serde_json::from_str::<Messaging>(raw_header) {
            Ok(messaging) => MessagingSource::Parsed(messaging),
            Err(err) => MessagingSource::Invalid(vec![err.to_string()]),
        }
    }
}
