//! Configuration module for the Callbridge Gateway server
//!
//! Configuration is read from environment variables (with `.env` support via
//! dotenvy). The only hard requirement is the AI provider credential: the
//! process refuses to start without `OPENAI_API_KEY`.

use thiserror::Error;

mod env;

use crate::core::realtime::openai::OPENAI_REALTIME_URL;

/// Default listening port, matching the telephony platform webhook setup.
pub const DEFAULT_PORT: u16 = 5050;

/// Default chat-completions endpoint used for post-call extraction.
pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default completion model used for post-call extraction.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o";

/// Default voice for the realtime agent.
pub const DEFAULT_VOICE: &str = "shimmer";

/// Default system instructions driving the realtime agent's interview flow.
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "You are an AI assistant, your name is Marie. You're calling from Edebex, specify this in the greeting part. Your job is to politely engage with the client, you'll call him as Peter, greet him first, then ask for availabilty and then ask these questions: \n  What is the country where you are operating?\n  Are your invoices are already due? If not when?\n  Are services or deliveries are executed and delivered?\n  Do you have a factoring contract?\n  Do you have any social security/tax debts?\n  Ask one question at a time. Do not ask for other contact information. Ensure the conversation remains friendly and professional, and guide the user to provide these details naturally. If necessary, ask follow-up questions to gather the required information. After you acquired all of the answers, say this \"Thank you for your time. My colleague will be in touch for the next steps.\" give your kind regards, and terminate the session.";

/// Configuration errors. Only `MissingCredential` is reachable in a default
/// deployment; it terminates the process before a listener is bound.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The AI provider credential is absent
    #[error("missing OPENAI_API_KEY; set it in the environment or .env file")]
    MissingCredential,

    /// An environment variable is present but not parseable
    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port)
/// - AI provider credential and endpoint overrides
/// - Realtime session defaults (voice, system instructions)
/// - Webhook delivery target (optional; log-only stub when absent)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// OpenAI API key for the Realtime API and post-call extraction.
    /// Required; absence is a startup-fatal error.
    pub openai_api_key: String,

    /// Realtime WebSocket endpoint (model baked into the query string).
    /// Overridable so tests can point at a local mock provider.
    pub openai_realtime_url: String,

    /// Chat-completions endpoint used for post-call extraction.
    pub openai_completions_url: String,

    /// Completion model for post-call extraction.
    pub extraction_model: String,

    /// Voice for the realtime agent's audio output.
    pub voice: String,

    /// System instructions for the realtime agent.
    pub system_instructions: String,

    /// Webhook URL for extracted customer details. When unset, dispatch is
    /// log-only.
    pub webhook_url: Option<String>,
}

impl ServerConfig {
    /// Get the server address as a string in "host:port" form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether real webhook delivery is enabled.
    pub fn has_webhook(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            openai_api_key: String::new(),
            openai_realtime_url: OPENAI_REALTIME_URL.to_string(),
            openai_completions_url: DEFAULT_COMPLETIONS_URL.to_string(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
            webhook_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_format() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            openai_api_key: "test-key".to_string(),
            ..Default::default()
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.voice, "shimmer");
        assert_eq!(config.extraction_model, "gpt-4o");
        assert!(!config.has_webhook());
    }

    #[test]
    fn test_has_webhook() {
        let config = ServerConfig {
            webhook_url: Some("https://hooks.example.com/calls".to_string()),
            ..Default::default()
        };
        assert!(config.has_webhook());
    }
}
