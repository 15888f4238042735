//! Centralized data for the bot
//!
//! Holds the configuration surface (default prefix, command role tables),
//! the per-guild prefix overrides, the permission table, the ephemeral
//! tracker store, and the sanction service. Prefixes and role overrides are
//! persisted to YAML; tracking state is deliberately not.

use std::{collections::BTreeMap, ops::Deref, sync::Arc};

use crate::engine::TrackerStore;
use crate::engine::permission::{PermissionTable, default_command_roles};
use crate::error::WardenResult;
use crate::sanction::SanctionService;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use std::collections::HashMap;

const CONFIG_FILE: &str = "data/warden_config.yaml";
const PREFIXES_FILE: &str = "data/prefixes.yaml";
const COMMAND_ROLES_FILE: &str = "data/command_roles.yaml";
const DATA_DIR: &str = "data";

/// Static configuration loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Prefix used for text commands when a guild has not set its own
    pub default_prefix: String,
    /// Default command -> required role table
    pub default_command_roles: HashMap<String, u64>,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            default_prefix: "!".to_string(),
            default_command_roles: default_command_roles(),
        }
    }
}

/// Centralized data structure for the bot
#[derive(Debug, Clone)]
pub struct Data(pub Arc<DataInner>);

impl TypeMapKey for Data {
    type Value = Data;
}

impl Default for Data {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Data {
    type Target = DataInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Data {
    /// Create a new Data instance with built-in defaults
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(DataInner::new()))
    }

    /// Load persisted configuration from YAML files
    pub async fn load() -> Self {
        Self(Arc::new(DataInner::load().await))
    }

    /// Save persisted configuration to YAML files
    ///
    /// # Errors
    /// Returns a persistence error if the data directory cannot be
    /// created, the maps cannot be serialized, or the files cannot be
    /// written.
    pub async fn save(&self) -> WardenResult<()> {
        self.0.save().await
    }

    /// The command prefix for a guild, falling back to the default
    #[must_use]
    pub fn prefix(&self, guild_id: u64) -> String {
        self.0
            .prefixes
            .get(&guild_id)
            .map_or_else(|| self.0.config.default_prefix.clone(), |p| p.clone())
    }

    /// Set a guild's command prefix
    pub fn set_prefix(&self, guild_id: u64, prefix: impl Into<String>) {
        self.0.prefixes.insert(guild_id, prefix.into());
    }
}

/// Inner data shared across handlers, commands, and tasks
#[derive(Debug)]
pub struct DataInner {
    /// Static configuration
    pub config: WardenConfig,
    /// Per-guild prefix overrides
    pub prefixes: DashMap<u64, String>,
    /// Command -> role resolution
    pub permissions: PermissionTable,
    /// Ephemeral engine state
    pub tracker: TrackerStore,
    /// Sanction application and lift scheduling
    pub sanctions: SanctionService,
}

impl Default for DataInner {
    fn default() -> Self {
        Self::new()
    }
}

impl DataInner {
    /// Create a new instance with built-in defaults
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WardenConfig::default())
    }

    fn with_config(config: WardenConfig) -> Self {
        let permissions = PermissionTable::new(config.default_command_roles.clone());
        Self {
            config,
            prefixes: DashMap::new(),
            permissions,
            tracker: TrackerStore::new(),
            sanctions: SanctionService::new(),
        }
    }

    /// Load configuration and persisted overrides from YAML files.
    /// Missing or unreadable files fall back to defaults.
    pub async fn load() -> Self {
        let config = match tokio::fs::read_to_string(CONFIG_FILE).await {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
            Err(_) => WardenConfig::default(),
        };

        let data = Self::with_config(config);

        if let Ok(content) = tokio::fs::read_to_string(PREFIXES_FILE).await {
            if let Ok(prefixes) = serde_yaml::from_str::<BTreeMap<u64, String>>(&content) {
                for (guild_id, prefix) in prefixes {
                    data.prefixes.insert(guild_id, prefix);
                }
            }
        }

        if let Ok(content) = tokio::fs::read_to_string(COMMAND_ROLES_FILE).await {
            if let Ok(overrides) =
                serde_yaml::from_str::<BTreeMap<u64, BTreeMap<String, u64>>>(&content)
            {
                data.permissions.import(overrides);
            }
        }

        data
    }

    /// Save per-guild prefixes and role overrides to YAML files
    ///
    /// # Errors
    /// Returns a persistence error if the data directory cannot be
    /// created, the maps cannot be serialized, or the files cannot be
    /// written.
    pub async fn save(&self) -> WardenResult<()> {
        if !std::path::Path::new(DATA_DIR).exists() {
            tokio::fs::create_dir_all(DATA_DIR).await?;
        }

        let prefixes: BTreeMap<u64, String> = self
            .prefixes
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        let prefixes_yaml = serde_yaml::to_string(&prefixes)?;
        tokio::fs::write(PREFIXES_FILE, prefixes_yaml).await?;

        let overrides = self.permissions.export();
        let overrides_yaml = serde_yaml::to_string(&overrides)?;
        tokio::fs::write(COMMAND_ROLES_FILE, overrides_yaml).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::permission::DEFAULT_MOD_ROLE_ID;

    // Framework error logging formats the whole error context with Debug,
    // which reaches through to Data
    #[test]
    fn test_data_is_debug() {
        fn assert_impl<T: std::fmt::Debug>() {}
        assert_impl::<Data>();
        assert_impl::<DataInner>();
    }

    #[test]
    fn test_data_new() {
        let data = Data::new();
        assert_eq!(data.config.default_prefix, "!");
        assert!(data.prefixes.is_empty());
        assert_eq!(
            data.permissions.required_role(1, "ban"),
            Some(DEFAULT_MOD_ROLE_ID)
        );
    }

    #[test]
    fn test_prefix_default_on_missing() {
        let data = Data::new();
        assert_eq!(data.prefix(1), "!");

        data.set_prefix(1, "?");
        assert_eq!(data.prefix(1), "?");
        assert_eq!(data.prefix(2), "!");
    }

    #[test]
    fn test_config_serialization() {
        let config = WardenConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        assert!(yaml.contains("default_prefix: '!'"));

        let restored: WardenConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(restored.default_prefix, config.default_prefix);
        assert_eq!(restored.default_command_roles, config.default_command_roles);
    }

    #[test]
    fn test_override_yaml_round_trip() {
        let data = Data::new();
        data.permissions.set_override(1, "ban", 999);
        data.permissions.set_override(2, "setcount", 777);

        let exported = data.permissions.export();
        let yaml = serde_yaml::to_string(&exported).expect("serialize");
        let restored: BTreeMap<u64, BTreeMap<String, u64>> =
            serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(restored, exported);
    }
}
