use crate::catalog::{
    load_icon_platforms, load_splash_platforms, IconPlatformDef, Platform, SplashPlatformDef,
};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_QUALITY: u8 = 100;

/// Everything one run needs, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub icon_source: PathBuf,
    pub splash_source: PathBuf,
    /// Replaces the built-in icon catalog when set.
    pub icon_platforms: Option<Vec<Platform>>,
    /// Replaces the built-in splash catalog when set.
    pub splash_platforms: Option<Vec<Platform>>,
    pub quality: u8,
    /// Worker threads per platform batch; `None` uses available parallelism.
    pub jobs: Option<usize>,
    /// Platform families to generate. Empty keeps each platform's own `is_added`.
    pub selected_platforms: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            icon_source: Path::new("resources").join("icon.png"),
            splash_source: Path::new("resources").join("splash.png"),
            icon_platforms: None,
            splash_platforms: None,
            quality: DEFAULT_QUALITY,
            jobs: None,
            selected_platforms: Vec::new(),
        }
    }
}

/// On-disk JSON configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub icon_source_path: Option<PathBuf>,
    pub splash_source_path: Option<PathBuf>,
    pub icon_platforms: Option<Vec<IconPlatformDef>>,
    pub splash_platforms: Option<Vec<SplashPlatformDef>>,
    pub quality: Option<u8>,
    pub jobs: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        log::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub icon_source: Option<PathBuf>,
    pub splash_source: Option<PathBuf>,
    pub quality: Option<u8>,
    pub jobs: Option<usize>,
    pub platforms: Vec<String>,
}

impl Settings {
    /// Layer built-in defaults, then `config`, then `overrides`, and validate the result.
    pub fn resolve(config: ConfigFile, overrides: Overrides) -> Result<Self> {
        let defaults = Self::default();

        let icon_platforms = config
            .icon_platforms
            .map(load_icon_platforms)
            .transpose()
            .context("Invalid iconPlatforms")?;
        let splash_platforms = config
            .splash_platforms
            .map(load_splash_platforms)
            .transpose()
            .context("Invalid splashPlatforms")?;

        let settings = Self {
            icon_source: overrides
                .icon_source
                .or(config.icon_source_path)
                .unwrap_or(defaults.icon_source),
            splash_source: overrides
                .splash_source
                .or(config.splash_source_path)
                .unwrap_or(defaults.splash_source),
            icon_platforms,
            splash_platforms,
            quality: overrides
                .quality
                .or(config.quality)
                .unwrap_or(defaults.quality),
            jobs: overrides.jobs.or(config.jobs),
            selected_platforms: overrides.platforms,
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=100).contains(&self.quality),
            "Quality must be between 1 and 100, got {}",
            self.quality
        );
        if let Some(jobs) = self.jobs {
            ensure!(jobs > 0, "Worker count must be at least 1");
        }
        Ok(())
    }
}
