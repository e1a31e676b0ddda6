//! Startup configuration
//!
//! Everything is fixed when the context is created: player count, LED
//! profiles, report/IR modes and the pointer smoothing filter. The file lives
//! at `<config dir>/wiimote_wrapper/config.toml`; a default one is written on
//! first start.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::assignment::lights::{classic_profiles, normalize_profiles, LightProfile};
use crate::driver::{IrMode, LedPattern, ReportMode};
use crate::error::WiimoteError;
use crate::input::SmoothingConfig;

const CONFIG_DIR: &str = "wiimote_wrapper";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WiimoteConfig {
    pub max_players: usize,
    /// Lights for a connected remote without a player
    pub default_lights: LedPattern,
    /// Lights per player number
    pub player_lights: Vec<LightProfile>,
    /// Fill players without a profile with `default_lights`
    pub pad_light_profiles: bool,
    pub report_mode: ReportMode,
    pub ir_mode: IrMode,
    pub smoothing: SmoothingConfig,
    pub max_reads_per_tick: usize,
    /// Log rejected input queries at warn level
    pub debug_mode: bool,
    /// Discover and auto-assign remotes in `init()`
    pub auto_assign_on_init: bool,
}

impl Default for WiimoteConfig {
    fn default() -> Self {
        let max_players = 4;
        Self {
            max_players,
            default_lights: LedPattern::ALL_ON,
            player_lights: classic_profiles(max_players),
            pad_light_profiles: true,
            report_mode: ReportMode::ButtonsAccelExt16,
            ir_mode: IrMode::Basic,
            smoothing: SmoothingConfig::default(),
            max_reads_per_tick: 32,
            debug_mode: false,
            auto_assign_on_init: true,
        }
    }
}

impl WiimoteConfig {
    pub fn validate(&self) -> Result<(), WiimoteError> {
        if self.max_reads_per_tick == 0 {
            return Err(WiimoteError::InvalidConfig(
                "max_reads_per_tick must be at least 1".to_string(),
            ));
        }
        self.smoothing.validate()
    }

    /// Light profiles with duplicates and out-of-range players removed
    pub fn normalized_light_profiles(&self) -> Vec<LightProfile> {
        normalize_profiles(
            &self.player_lights,
            self.max_players,
            self.default_lights,
            self.pad_light_profiles,
        )
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        config.validate()?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }

    /// Load the config at `path`, writing the defaults there first if it does not exist
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check {}: {}", path.display(), e))?;
        if !exists {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }
        Self::load(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FastMotion;

    #[test]
    fn defaults_are_valid() {
        let config = WiimoteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.normalized_light_profiles().len(), 4);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: WiimoteConfig = toml::from_str(
            r#"
            max_players = 2
            debug_mode = true

            [smoothing.fast_motion]
            mode = "snap"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_players, 2);
        assert!(config.debug_mode);
        assert_eq!(config.smoothing.fast_motion, FastMotion::Snap);
        assert_eq!(config.smoothing.rest_factor, SmoothingConfig::lerp().rest_factor);
        assert_eq!(config.report_mode, ReportMode::ButtonsAccelExt16);
        // The four default profiles get cut down to the player count
        assert_eq!(config.normalized_light_profiles().len(), 2);
    }

    #[tokio::test]
    async fn load_or_create_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let created = WiimoteConfig::load_or_create(&path).await.unwrap();
        assert_eq!(created, WiimoteConfig::default());
        assert!(path.exists());

        let mut changed = created.clone();
        changed.max_players = 3;
        changed.smoothing = SmoothingConfig::snap();
        changed.save(&path).await.unwrap();

        let loaded = WiimoteConfig::load_or_create(&path).await.unwrap();
        assert_eq!(loaded.max_players, 3);
        assert_eq!(loaded.smoothing.fast_motion, FastMotion::Snap);
    }

    #[tokio::test]
    async fn load_rejects_invalid_smoothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "[smoothing]\nrest_factor = 0.0\n")
            .await
            .unwrap();

        assert!(WiimoteConfig::load(&path).await.is_err());
    }
}
