// AI configuration and secrets management
//
// API keys are looked up in:
// 1. System keychain (preferred)
// 2. LEDGERLENS_<PROVIDER>_KEY
// 3. The provider's conventional variable (GEMINI_API_KEY, OPENAI_API_KEY)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::settings::{AIProvider, AISettings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "ledgerlens";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Environment,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

impl KeyLookup {
    pub fn missing() -> Self {
        Self {
            key: None,
            source: KeySource::None,
        }
    }
}

/// Get the environment variable name for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("LEDGERLENS_{}_KEY", provider.to_uppercase())
}

/// Variable the provider's own tooling reads
fn conventional_env_var(provider: &str) -> Option<&'static str> {
    match provider.to_lowercase().as_str() {
        "gemini" => Some("GEMINI_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an API key for the specified provider
pub fn get_api_key(provider: &str) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    let from_env = non_empty_env(&env_var_name(provider))
        .or_else(|| conventional_env_var(provider).and_then(non_empty_env));
    match from_env {
        Some(key) => KeyLookup {
            key: Some(key),
            source: KeySource::Environment,
        },
        None => KeyLookup::missing(),
    }
}

/// Store an API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(provider: &str, key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider))
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_provider: &str, _key: &str) -> Result<(), String> {
    Err("Keychain support not enabled. Set LEDGERLENS_<PROVIDER>_KEY instead.".to_string())
}

/// Delete an API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key(provider: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider))
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key(_provider: &str) -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "probe").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration (single source of truth)
// ============================================================================

/// The effective AI configuration, fully resolved from settings and secrets.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    /// Resolved from settings or provider default
    pub model: String,
    /// Base URL, without trailing slash
    pub endpoint: String,
    /// Language the assistant answers in
    pub language: String,
    pub temperature: f32,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// provider = none
    Disabled,
    Ready,
    /// Provider is configured but API key is missing
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl ResolvedAIConfig {
    /// Resolve the effective AI configuration from settings.
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::from_settings_with(settings, get_api_key)
    }

    /// Resolve with a caller-supplied key lookup.
    pub fn from_settings_with(settings: &AISettings, lookup: impl Fn(&str) -> KeyLookup) -> Self {
        let provider = settings.provider;

        if !provider.is_enabled() {
            return Self {
                provider,
                model: String::new(),
                endpoint: String::new(),
                language: settings.language.clone(),
                temperature: settings.temperature,
                api_key: None,
                key_source: KeySource::None,
                status: AIConfigStatus::Disabled,
                blocking_reason: Some("AI is disabled (provider = \"none\")".to_string()),
            };
        }

        let lookup = if provider.needs_api_key() {
            lookup(provider.name())
        } else {
            KeyLookup::missing()
        };

        let (status, blocking_reason) = match &lookup.key {
            Some(_) => (AIConfigStatus::Ready, None),
            None => {
                let mut reason = format!(
                    "No API key found. Set via keychain or {}",
                    env_var_name(provider.name())
                );
                if let Some(conventional) = conventional_env_var(provider.name()) {
                    reason.push_str(&format!(" (or {})", conventional));
                }
                (AIConfigStatus::MissingKey, Some(reason))
            }
        };

        Self {
            provider,
            model: settings.effective_model().to_string(),
            endpoint: settings.effective_endpoint().to_string(),
            language: settings.language.clone(),
            temperature: settings.temperature,
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }

    /// Load settings and resolve in one call
    pub fn load() -> Self {
        let settings = crate::settings::Settings::load();
        Self::from_settings(&settings.ai)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

// ============================================================================
// Diagnostics (for `llens ai doctor`)
// ============================================================================

#[derive(Debug, serde::Serialize)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: AIConfigStatus,
    pub key_present: bool,
    #[serde(serialize_with = "serialize_source")]
    pub key_source: KeySource,
    pub keychain_available: bool,
    pub endpoint: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_reason: Option<String>,
}

fn serialize_status<S: serde::Serializer>(status: &AIConfigStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(status.as_str())
}

fn serialize_source<S: serde::Serializer>(source: &KeySource, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(source.as_str())
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: config.provider.name().to_string(),
            model: config.model.clone(),
            status: config.status,
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            blocking_reason: config.blocking_reason.clone(),
        }
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:           {}", self.provider)?;
        writeln!(f, "Status:             {}", self.status.as_str())?;
        if !self.model.is_empty() {
            writeln!(f, "Model:              {}", self.model)?;
        }
        if !self.endpoint.is_empty() {
            writeln!(f, "Endpoint:           {}", self.endpoint)?;
        }
        writeln!(f, "Language:           {}", self.language)?;
        writeln!(f, "Key present:        {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:         {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available: {}", if self.keychain_available { "yes" } else { "no" })?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Note:               {}", reason)?;
        }
        Ok(())
    }
}
