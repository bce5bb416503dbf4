use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::colonies::AssignmentSettings;
use crate::directive_lifecycle::DirectiveVariant;
use crate::persistence::{DEFAULT_MAX_LINEAR_RANGE, DEFAULT_MAX_PATH_LENGTH};
use crate::presence::{DirectivePresence, DEFAULT_SUFFIX_LEN};

/// Main configuration structure for Colony Directives
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ColonyDirectivesConfig {
    /// Assignment limits and naming
    pub engine: EngineConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Durable record storage
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest acceptable colony-to-directive path
    pub max_path_length: u32,
    /// Furthest colony, in rooms, considered by the nearest search
    pub max_linear_range: u32,
    /// Search budget handed to the distance oracle
    pub path_max_ops: u32,
    /// Hex digits in generated directive names
    pub name_suffix_len: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Durable record file used when no path is given on the command line
    pub memory_path: String,
    /// Save the durable records once the simulation finishes
    pub autosave: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let settings = AssignmentSettings::default();
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_linear_range: DEFAULT_MAX_LINEAR_RANGE,
            path_max_ops: settings.path_max_ops,
            name_suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            memory_path: ".colony-directives/memory.json".to_string(),
            autosave: true,
        }
    }
}

impl Default for ColonyDirectivesConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            observability: ObservabilityConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn assignment_settings(&self) -> AssignmentSettings {
        AssignmentSettings {
            default_max_path_length: self.max_path_length,
            default_max_linear_range: self.max_linear_range,
            path_max_ops: self.path_max_ops,
        }
    }

    /// Presence helper for `variant` generating names of the configured length
    pub fn presence(&self, variant: DirectiveVariant) -> DirectivePresence {
        DirectivePresence::new(variant).with_suffix_len(self.name_suffix_len)
    }
}

impl ColonyDirectivesConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (colony-directives.toml, .colony-directives-rc)
    /// 3. Environment variables (prefixed with COLONY_DIRECTIVES_)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load) with configuration files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_path = dir.join("colony-directives.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".colony-directives-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        // Nested keys use a double underscore, e.g. COLONY_DIRECTIVES_ENGINE__MAX_PATH_LENGTH
        builder = builder.add_source(
            Environment::with_prefix("COLONY_DIRECTIVES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let colony_directives_config: ColonyDirectivesConfig = config.try_deserialize()?;
        Ok(colony_directives_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ColonyDirectivesConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ColonyDirectivesConfig::load_env_file();
        ColonyDirectivesConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ColonyDirectivesConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
