use std::env;

use super::{
    ConfigError, DEFAULT_COMPLETIONS_URL, DEFAULT_EXTRACTION_MODEL, DEFAULT_PORT,
    DEFAULT_SYSTEM_INSTRUCTIONS, DEFAULT_VOICE, ServerConfig,
};
use crate::core::realtime::openai::OPENAI_REALTIME_URL;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `OPENAI_API_KEY` is unset or empty (startup-fatal by design)
    /// - `PORT` is present but not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // The provider credential is the only required setting
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        // Endpoint overrides (primarily for tests against mock servers)
        let openai_realtime_url =
            env::var("OPENAI_REALTIME_URL").unwrap_or_else(|_| OPENAI_REALTIME_URL.to_string());
        let openai_completions_url = env::var("OPENAI_COMPLETIONS_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETIONS_URL.to_string());
        let extraction_model =
            env::var("EXTRACTION_MODEL").unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.to_string());

        // Realtime session defaults
        let voice = env::var("OPENAI_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string());
        let system_instructions = env::var("SYSTEM_INSTRUCTIONS")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_INSTRUCTIONS.to_string());

        // Webhook delivery target; dispatch stays log-only when unset
        let webhook_url = env::var("WEBHOOK_URL").ok().filter(|url| !url.is_empty());

        Ok(ServerConfig {
            host,
            port,
            openai_api_key,
            openai_realtime_url,
            openai_completions_url,
            extraction_model,
            voice,
            system_instructions,
            webhook_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper to clean up environment variables after tests
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("WEBHOOK_URL");
            env::remove_var("OPENAI_VOICE");
        }
    }

    #[test]
    #[serial]
    fn test_missing_credential_is_fatal() {
        cleanup_env_vars();

        let result = ServerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::MissingCredential)));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_credential_is_fatal() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "");
        }

        let result = ServerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::MissingCredential)));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_defaults_applied() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-test");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.voice, DEFAULT_VOICE);
        assert!(config.webhook_url.is_none());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("HOST", "127.0.0.1");
            env::set_var("PORT", "9090");
            env::set_var("OPENAI_VOICE", "alloy");
            env::set_var("WEBHOOK_URL", "https://hooks.example.com/calls");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.voice, "alloy");
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/calls")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_port_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));

        cleanup_env_vars();
    }
}
