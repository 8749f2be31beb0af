use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::validator::{ConfigValidator, StandardValidator};

/// Name of the tool configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "app-devkit.toml";
pub const CONFIG_VERSION: &str = "1.0";

/// Settings manager components still using the object-payload toast call.
pub const DEFAULT_TOAST_FILES: [&str; 7] = [
    "src/components/admin/settings/VehicleTypesManager.tsx",
    "src/components/admin/settings/FreightCategoriesManager.tsx",
    "src/components/admin/settings/ServiceRegionsManager.tsx",
    "src/components/admin/settings/CommissionTiersManager.tsx",
    "src/components/admin/settings/SurgePricingManager.tsx",
    "src/components/admin/settings/PromotionalCodesManager.tsx",
    "src/components/admin/settings/TaxRatesManager.tsx",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EnvSettings {
    /// The `KEY=value` file holding the service URL and keys.
    pub file: PathBuf,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".env.local"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeSettings {
    pub table: String,
    pub schema: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            table: "disputes".to_string(),
            schema: "public".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ToastSettings {
    /// Directory the `files` entries are relative to.
    pub base_dir: PathBuf,
    pub files: Vec<String>,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            files: DEFAULT_TOAST_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DevkitConfig {
    pub version: String,
    pub env: EnvSettings,
    pub probe: ProbeSettings,
    pub toast: ToastSettings,
}

impl Default for DevkitConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            env: EnvSettings::default(),
            probe: ProbeSettings::default(),
            toast: ToastSettings::default(),
        }
    }
}

/// Formats accepted by `show-config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

pub struct ConfigManager {
    config_path: PathBuf,
    root: PathBuf,
}

impl ConfigManager {
    /// Uses `app-devkit.toml` in the current directory.
    pub fn new() -> Result<Self> {
        let root = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::new_at(root))
    }

    /// Uses `app-devkit.toml` inside `root`.
    pub fn new_at(root: PathBuf) -> Self {
        Self {
            config_path: root.join(CONFIG_FILE_NAME),
            root,
        }
    }

    /// Uses an explicit config file; relative settings resolve against its directory.
    pub fn with_path(config_path: PathBuf) -> Self {
        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_path, root }
    }

    /// Writes the default configuration unless a file already exists.
    /// Returns whether a file was written.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        self.save_config(&DevkitConfig::default())?;
        Ok(true)
    }

    /// Loads the configuration and prints every issue `StandardValidator` finds.
    ///
    /// # Returns
    /// `Ok(())` if the configuration is valid, an error otherwise so the
    /// `validate` command exits non-zero.
    pub fn validate_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let validator = StandardValidator::new(self.root.clone());
        let issues = validator.validate_config(&config)?;

        if issues.is_empty() {
            println!("✓ Configuration is valid.");
            Ok(())
        } else {
            println!("⚠️  Found issues in configuration:");
            for issue in issues {
                println!("  - {issue}");
            }
            anyhow::bail!("Configuration validation failed.");
        }
    }

    /// Renders the effective configuration.
    ///
    /// # Arguments
    /// * `format`: The `ExportFormat` to render in.
    ///
    /// # Returns
    /// The serialized configuration, defaults included.
    pub fn export_config(&self, format: ExportFormat) -> Result<String> {
        let config = self.load_config()?;

        let content = match format {
            ExportFormat::Json => {
                serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?
            }
            ExportFormat::Yaml => {
                serde_yaml::to_string(&config).context("Failed to serialize to YAML")?
            }
            ExportFormat::Toml => {
                toml::to_string_pretty(&config).context("Failed to serialize to TOML")?
            }
        };

        Ok(content)
    }

    /// Resolves a configured path against the configuration's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }
}

/// Loading and saving of the tool configuration.
pub trait ConfigProvider {
    /// Reads the configuration file.
    ///
    /// # Returns
    /// The parsed `DevkitConfig`, or the defaults when no file exists.
    /// Settings missing from the file keep their default values.
    fn load_config(&self) -> Result<DevkitConfig>;

    /// Writes `config` as TOML, replacing any existing file.
    ///
    /// # Arguments
    /// * `config`: The `DevkitConfig` to write.
    fn save_config(&self, config: &DevkitConfig) -> Result<()>;

    /// Returns the path of the configuration file, whether or not it exists.
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<DevkitConfig> {
        if !self.config_path.exists() {
            return Ok(DevkitConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &DevkitConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}
