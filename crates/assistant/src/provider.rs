// Completion service construction from resolved configuration

use std::fmt;

use ledgerlens_config::ai::{AIConfigStatus, ResolvedAIConfig};
use ledgerlens_config::settings::AIProvider;

use crate::error::ServiceError;
use crate::gemini::GeminiClient;
use crate::openai::OpenAIClient;
use crate::service::{CompletionService, RemoteService};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectError {
    /// provider = none
    Disabled,
    /// Provider configured, no key found; carries the remediation hint
    MissingKey(String),
    /// HTTP client could not be built
    Client(ServiceError),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "AI is disabled"),
            Self::MissingKey(reason) => write!(f, "{reason}"),
            Self::Client(e) => write!(f, "cannot initialize AI client: {e}"),
        }
    }
}

impl std::error::Error for ConnectError {}

pub fn connect(config: &ResolvedAIConfig) -> Result<Box<dyn CompletionService>, ConnectError> {
    let api_key = match (config.status, &config.api_key) {
        (AIConfigStatus::Ready, Some(key)) => key.clone(),
        (AIConfigStatus::Disabled, _) => return Err(ConnectError::Disabled),
        _ => {
            return Err(ConnectError::MissingKey(
                config
                    .blocking_reason
                    .clone()
                    .unwrap_or_else(|| "No API key found".to_string()),
            ))
        }
    };

    let model = Some(config.model.clone());
    let base_url = config.endpoint.clone();
    log::debug!("connecting to {} (model {})", config.provider.name(), config.model);

    match config.provider {
        AIProvider::None => Err(ConnectError::Disabled),
        AIProvider::Gemini => {
            let client = GeminiClient::with_base_url(api_key, model, base_url)
                .map_err(ConnectError::Client)?
                .with_temperature(config.temperature);
            Ok(Box::new(RemoteService::new(client)))
        }
        AIProvider::OpenAI => {
            let client = OpenAIClient::with_base_url(api_key, model, base_url)
                .map_err(ConnectError::Client)?
                .with_temperature(config.temperature);
            Ok(Box::new(RemoteService::new(client)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_config::ai::KeyLookup;
    use ledgerlens_config::settings::AISettings;

    #[test]
    fn test_disabled() {
        let config = ResolvedAIConfig::from_settings_with(&AISettings::default(), |_| KeyLookup::missing());
        assert_eq!(connect(&config).err(), Some(ConnectError::Disabled));
    }

    #[test]
    fn test_missing_key_carries_hint() {
        let settings = AISettings {
            provider: AIProvider::Gemini,
            ..AISettings::default()
        };
        let config = ResolvedAIConfig::from_settings_with(&settings, |_| KeyLookup::missing());
        match connect(&config) {
            Err(ConnectError::MissingKey(hint)) => assert!(hint.contains("LEDGERLENS_GEMINI_KEY")),
            _ => panic!("expected MissingKey"),
        }
    }
}
