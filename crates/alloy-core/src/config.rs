use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AlloyError, Result};

/// Default inspection script used when the config does not override it.
pub const DEFAULT_PROCEDURE_STEPS: [&str; 5] = [
    "Rotate primary isolation valve 90° clockwise",
    "Verify pressure gauge reads below 2.5 bar",
    "Inspect flange gasket for thermal degradation",
    "Disengage lock-out tag-out mechanism",
    "Confirm bypass line is sealed and capped",
];

/// Top-level configuration for the AlloyPro copilot.
///
/// Loaded from `~/.alloypro/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlloyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dictation: DictationConfig,
    #[serde(default)]
    pub procedure: ProcedureConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub procurement: ProcurementConfig,
}

impl AlloyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AlloyConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject configurations the workflow cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.procedure.steps.is_empty() {
            return Err(AlloyError::Config(
                "procedure.steps must contain at least one step".to_string(),
            ));
        }
        if self.procedure.steps.iter().any(|s| s.trim().is_empty()) {
            return Err(AlloyError::Config(
                "procedure.steps must not contain blank steps".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Speech recognizer settings handed to the dictation adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// BCP-47 language tag for the recognizer.
    pub language: String,
    /// Keep the recognizer open across utterances.
    pub continuous: bool,
    /// Ask the recognizer for interim results. They are discarded either way.
    pub interim_results: bool,
    /// Restart the recognizer when it ends on its own while dictation is on.
    pub auto_restart: bool,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: true,
            interim_results: false,
            auto_restart: true,
        }
    }
}

/// Guided procedure script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcedureConfig {
    /// Ordered inspection steps. Must be non-empty.
    pub steps: Vec<String>,
}

impl Default for ProcedureConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_PROCEDURE_STEPS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Real-time session device synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Mirror the workflow's mic intent onto the transport microphone.
    pub sync_microphone: bool,
    /// Keep the camera enabled whenever the workflow is not idle.
    pub camera_follows_workflow: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sync_microphone: true,
            camera_follows_workflow: true,
        }
    }
}

/// Purchase-order assistant endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcurementConfig {
    /// Conversation endpoint URL. `None` logs purchase requests instead of sending them.
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint.
    pub api_key: Option<String>,
    /// Assistant configuration mentioned in the request.
    pub agent_id: String,
    /// Username reported in the message context.
    pub username: String,
    /// Timezone reported in the message context.
    pub timezone: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProcurementConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            agent_id: "relay".to_string(),
            username: "AlloyPro System".to_string(),
            timezone: "America/New_York".to_string(),
            timeout_secs: 30,
        }
    }
}
