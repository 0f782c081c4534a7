use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration structure for mod-triage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModTriageConfig {
    /// Moderator channel that receives report summaries and review prompts
    pub mod_channel: u64,
    /// Intake workflow settings. The whole section is optional; the config
    /// crate cannot express a `None` default for the timeout, so the default
    /// comes from serde instead.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Classifier settings
    pub classifier: ClassifierConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntakeConfig {
    /// Optional expiry for follow-up menus, in seconds. Unset disables the
    /// timeout entirely; reports then wait indefinitely for the next event.
    pub follow_up_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Enable automatic classifier-seeded reports
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is not set
    pub log_level: String,
}

impl Default for ModTriageConfig {
    fn default() -> Self {
        Self {
            mod_channel: 0,
            intake: IntakeConfig {
                follow_up_timeout_seconds: None,
            },
            classifier: ClassifierConfig { enabled: false },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl ModTriageConfig {
    /// Load from `mod-triage.toml` (optional) with `MOD_TRIAGE_*` environment
    /// overrides, e.g. `MOD_TRIAGE_MOD_CHANNEL=1211760623969370122`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = ModTriageConfig::default();
        let config = Config::builder()
            .set_default("mod_channel", defaults.mod_channel)?
            .set_default("classifier.enabled", defaults.classifier.enabled)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .add_source(File::with_name("mod-triage").required(false))
            .add_source(Environment::with_prefix("MOD_TRIAGE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
