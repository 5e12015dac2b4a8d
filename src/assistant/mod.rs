//! Drafting help for campaign copy, backed by an external chat-completion model.

use async_trait::async_trait;

use crate::error::Error;

pub mod client;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

/// A text model that answers a single prompt under a system instruction.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, instruction: &str, prompt: &str) -> Result<String, Error>;
}

/// The configured model, if any. Registered as app data even when disabled so handlers can
/// report that nothing is configured.
pub struct Assistant {
    model: Option<Box<dyn LanguageModel>>,
}

impl Assistant {
    pub fn new(model: Box<dyn LanguageModel>) -> Assistant {
        Assistant { model: Some(model) }
    }

    pub fn disabled() -> Assistant {
        Assistant { model: None }
    }

    pub fn model(&self) -> Result<&dyn LanguageModel, Error> {
        self.model.as_deref().ok_or(Error::AssistantNotConfigured)
    }
}
