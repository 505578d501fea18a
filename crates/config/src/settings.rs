// Application settings
// Loaded from ~/.config/ledgerlens/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use ledgerlens_analysis::LabelSet;
use serde::{Deserialize, Serialize};

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// AI features disabled (default)
    #[default]
    None,
    /// Google Gemini API
    Gemini,
    /// OpenAI API
    #[serde(rename = "openai")]
    OpenAI,
}

impl AIProvider {
    /// Returns true if AI features are enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    pub fn needs_api_key(&self) -> bool {
        self.is_enabled()
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::Gemini => "gemini",
            AIProvider::OpenAI => "openai",
        }
    }

    /// Returns the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Gemini => "gemini-2.5-flash",
            AIProvider::OpenAI => "gpt-4o",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Gemini => "https://generativelanguage.googleapis.com",
            AIProvider::OpenAI => "https://api.openai.com",
        }
    }
}

/// AI-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Selected AI provider
    pub provider: AIProvider,

    /// Model identifier (provider-specific, empty = provider default)
    pub model: String,

    /// Base URL override (proxies, tests)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Language the assistant answers in
    pub language: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::None,
            model: String::new(),
            endpoint: None,
            language: "English".to_string(),
            temperature: 0.3,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or provider default)
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    pub fn effective_endpoint(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(e) if !e.trim().is_empty() => e.trim_end_matches('/'),
            _ => self.provider.default_endpoint(),
        }
    }
}

/// Line-item aliases used to locate the rows the analysis depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    #[serde(rename = "totalAssets")]
    pub total_assets: Vec<String>,
    #[serde(rename = "currentAssets")]
    pub current_assets: Vec<String>,
    #[serde(rename = "currentLiabilities")]
    pub current_liabilities: Vec<String>,
}

impl Default for LabelSettings {
    fn default() -> Self {
        let defaults = LabelSet::default();
        Self {
            total_assets: defaults.total_assets,
            current_assets: defaults.current_assets,
            current_liabilities: defaults.current_liabilities,
        }
    }
}

impl LabelSettings {
    /// Empty alias lists fall back to the built-in defaults.
    pub fn to_label_set(&self) -> LabelSet {
        let defaults = LabelSet::default();
        let pick = |configured: &Vec<String>, fallback: Vec<String>| {
            let cleaned: Vec<String> = configured
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if cleaned.is_empty() {
                fallback
            } else {
                cleaned
            }
        };
        LabelSet {
            total_assets: pick(&self.total_assets, defaults.total_assets),
            current_assets: pick(&self.current_assets, defaults.current_assets),
            current_liabilities: pick(&self.current_liabilities, defaults.current_liabilities),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// First row of an upload is a header
    #[serde(rename = "hasHeaders")]
    pub has_headers: bool,

    /// Memoized derivations kept per session
    #[serde(rename = "cacheCapacity")]
    pub cache_capacity: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            has_headers: true,
            cache_capacity: ledgerlens_analysis::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub labels: LabelSettings,
    pub analysis: AnalysisSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgerlens")
            .join("settings.json")
    }

    /// Load settings from the default location, writing a commented default
    /// file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }
        Self::load_from(&path)
    }

    /// Load settings from an explicit path, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}; using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines starting with `//`.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to disk
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // AI (disabled by default)
    // Provider options: "none", "gemini", "openai"
    // API keys are read from the system keychain or LEDGERLENS_<PROVIDER>_KEY,
    // never from this file
    "ai": {
        "provider": "none",
        "model": "",
        "language": "English",
        "temperature": 0.3
    },

    // Line items located by case-insensitive substring; first match wins
    "labels": {
        "totalAssets": ["TOTAL ASSETS", "TỔNG CỘNG TÀI SẢN"],
        "currentAssets": ["CURRENT ASSETS", "TÀI SẢN NGẮN HẠN"],
        "currentLiabilities": ["CURRENT LIABILITIES", "NỢ NGẮN HẠN"]
    },

    // Uploads
    "analysis": {
        "hasHeaders": true,
        "cacheCapacity": 8
    }
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}
