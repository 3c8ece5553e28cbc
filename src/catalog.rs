//! Platform catalog: which image files each platform needs and where they go.
//!
//! The built-in tables follow the Windows, Android and iOS resource
//! conventions. A caller may replace either table wholesale with JSON
//! definitions, which are validated here before any generation starts.

use crate::{format::OutputFormat, settings::Settings};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// One required output image of a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl Asset {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Result<Self> {
        let name = name.into();
        ensure!(
            width > 0 && height > 0,
            "{name} must have positive dimensions, got {width}x{height}"
        );

        let format = OutputFormat::from_file_name(&name)?;
        if let Some(max) = format.max_dimension() {
            ensure!(
                width <= max && height <= max,
                "{name} is {width}x{height}, but {format} images are limited to {max}x{max}"
            );
        }

        Ok(Self {
            name,
            width,
            height,
            format,
        })
    }
}

/// A named output target with its own directory and list of required assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub name: String,
    pub is_added: bool,
    pub path: PathBuf,
    /// Encoder quality for this platform; the run-wide quality applies when unset.
    pub quality: Option<u8>,
    pub assets: Vec<Asset>,
}

impl Platform {
    pub fn new(
        name: impl Into<String>,
        is_added: bool,
        path: impl Into<PathBuf>,
        quality: Option<u8>,
        assets: Vec<Asset>,
    ) -> Result<Self> {
        let name = name.into();

        if let Some(quality) = quality {
            ensure!(
                (1..=100).contains(&quality),
                "Platform {name}: quality must be between 1 and 100, got {quality}"
            );
        }

        let mut seen = HashSet::new();
        for asset in &assets {
            ensure!(
                seen.insert(asset.name.to_lowercase()),
                "Platform {name} lists {} more than once",
                asset.name
            );
        }

        Ok(Self {
            name,
            is_added,
            path: path.into(),
            quality,
            assets,
        })
    }

    /// Where `asset` is written: the platform directory joined with the asset name.
    pub fn destination(&self, asset: &Asset) -> PathBuf {
        self.path.join(&asset.name)
    }

    /// `windows` matches both `windows` and `windows_wide`.
    pub fn belongs_to(&self, family: &str) -> bool {
        self.name == family
            || self
                .name
                .strip_prefix(family)
                .map_or(false, |rest| rest.starts_with('_'))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IconSpec {
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplashSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// JSON form of an icon platform, e.g.
/// `{ "name": "windows", "isAdded": true, "iconsPath": "resources/windows/icon/", "icons": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IconPlatformDef {
    pub name: String,
    pub is_added: bool,
    pub icons_path: PathBuf,
    pub icons: Vec<IconSpec>,
    #[serde(default)]
    pub quality: Option<u8>,
}

/// JSON form of a splash platform, with `splashPath` and a `splash` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SplashPlatformDef {
    pub name: String,
    pub is_added: bool,
    pub splash_path: PathBuf,
    pub splash: Vec<SplashSpec>,
    #[serde(default)]
    pub quality: Option<u8>,
}

impl IconPlatformDef {
    pub fn into_platform(self) -> Result<Platform> {
        let name = self.name;
        let assets = self
            .icons
            .into_iter()
            .map(|icon| Asset::new(icon.name, icon.size, icon.size))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Invalid icon platform {name}"))?;

        Platform::new(name, self.is_added, self.icons_path, self.quality, assets)
    }
}

impl SplashPlatformDef {
    pub fn into_platform(self) -> Result<Platform> {
        let name = self.name;
        let assets = self
            .splash
            .into_iter()
            .map(|splash| Asset::new(splash.name, splash.width, splash.height))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Invalid splash platform {name}"))?;

        Platform::new(name, self.is_added, self.splash_path, self.quality, assets)
    }
}

pub fn load_icon_platforms(defs: Vec<IconPlatformDef>) -> Result<Vec<Platform>> {
    let platforms = defs
        .into_iter()
        .map(IconPlatformDef::into_platform)
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_names(&platforms)?;
    Ok(platforms)
}

pub fn load_splash_platforms(defs: Vec<SplashPlatformDef>) -> Result<Vec<Platform>> {
    let platforms = defs
        .into_iter()
        .map(SplashPlatformDef::into_platform)
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_names(&platforms)?;
    Ok(platforms)
}

fn ensure_unique_names(platforms: &[Platform]) -> Result<()> {
    let mut seen = HashSet::new();
    for platform in platforms {
        ensure!(
            seen.insert(platform.name.as_str()),
            "Platform {} is defined more than once",
            platform.name
        );
    }
    Ok(())
}

/// Icon platforms for this run: the caller's override if present, the built-in table otherwise.
pub fn list_icon_platforms(settings: &Settings) -> Vec<Platform> {
    let platforms = settings
        .icon_platforms
        .clone()
        .unwrap_or_else(default_icon_platforms);
    apply_selection(platforms, &settings.selected_platforms)
}

/// Splash platforms for this run: the caller's override if present, the built-in table otherwise.
pub fn list_splash_platforms(settings: &Settings) -> Vec<Platform> {
    let platforms = settings
        .splash_platforms
        .clone()
        .unwrap_or_else(default_splash_platforms);
    apply_selection(platforms, &settings.selected_platforms)
}

fn apply_selection(mut platforms: Vec<Platform>, families: &[String]) -> Vec<Platform> {
    if families.is_empty() {
        return platforms;
    }

    for platform in &mut platforms {
        platform.is_added = families.iter().any(|family| platform.belongs_to(family));
    }
    platforms
}

struct IconTable {
    name: &'static str,
    is_added: bool,
    path: &'static str,
    icons: &'static [(&'static str, u32)],
}

struct SplashTable {
    name: &'static str,
    is_added: bool,
    path: &'static str,
    splash: &'static [(&'static str, u32, u32)],
}

const ICON_TABLES: &[IconTable] = &[
    IconTable {
        name: "windows",
        is_added: true,
        path: "resources/windows/icon/",
        icons: &[
            ("Square30x30Logo.scale-100.png", 30),
            ("Square30x30Logo.scale-200.png", 60),
            ("Square30x30Logo.scale-240.png", 72),
            ("Square30x30Logo.scale-400.png", 120),
            ("Square44x44Logo.scale-100.png", 44),
            ("Square44x44Logo.scale-200.png", 88),
            ("Square44x44Logo.scale-240.png", 106),
            ("Square44x44Logo.scale-400.png", 176),
            ("Square70x70Logo.scale-100.png", 70),
            ("Square70x70Logo.scale-200.png", 140),
            ("Square70x70Logo.scale-240.png", 168),
            ("Square70x70Logo.scale-400.png", 280),
            ("Square71x71Logo.scale-100.png", 71),
            ("Square71x71Logo.scale-200.png", 142),
            ("Square71x71Logo.scale-240.png", 170),
            ("Square71x71Logo.scale-400.png", 284),
            ("Square150x150Logo.scale-100.png", 150),
            ("Square150x150Logo.scale-200.png", 300),
            ("Square150x150Logo.scale-240.png", 360),
            ("Square150x150Logo.scale-400.png", 600),
            ("Square310x310Logo.scale-100.png", 310),
            ("Square310x310Logo.scale-200.png", 620),
            ("Square310x310Logo.scale-240.png", 744),
            ("StoreLogo.scale-100.png", 50),
            ("StoreLogo.scale-200.png", 100),
            ("StoreLogo.scale-240.png", 120),
            ("StoreLogo.scale-400.png", 200),
        ],
    },
    IconTable {
        name: "android",
        is_added: false,
        path: "resources/android/icon/",
        icons: &[
            ("drawable-ldpi-icon.png", 36),
            ("drawable-mdpi-icon.png", 48),
            ("drawable-hdpi-icon.png", 72),
            ("drawable-xhdpi-icon.png", 96),
            ("drawable-xxhdpi-icon.png", 144),
            ("drawable-xxxhdpi-icon.png", 192),
        ],
    },
    IconTable {
        name: "ios",
        is_added: false,
        path: "resources/ios/icon/",
        icons: &[
            ("icon.png", 57),
            ("icon@2x.png", 114),
            ("icon-20.png", 20),
            ("icon-20@2x.png", 40),
            ("icon-20@3x.png", 60),
            ("icon-40.png", 40),
            ("icon-40@2x.png", 80),
            ("icon-40@3x.png", 120),
            ("icon-50.png", 50),
            ("icon-50@2x.png", 100),
            ("icon-60.png", 60),
            ("icon-60@2x.png", 120),
            ("icon-60@3x.png", 180),
            ("icon-72.png", 72),
            ("icon-72@2x.png", 144),
            ("icon-76.png", 76),
            ("icon-76@2x.png", 152),
            ("icon-83.5@2x.png", 167),
            ("icon-small.png", 29),
            ("icon-small@2x.png", 58),
            ("icon-small@3x.png", 87),
            ("icon-1024.png", 1024),
        ],
    },
];

const SPLASH_TABLES: &[SplashTable] = &[
    SplashTable {
        name: "windows",
        is_added: true,
        path: "resources/windows/splash/",
        splash: &[
            ("SplashScreen.scale-100.png", 620, 300),
            ("SplashScreen.scale-200.png", 1240, 600),
            ("SplashScreen.scale-240.png", 1488, 720),
            ("SplashScreen.scale-400.png", 2480, 1200),
            ("SplashScreenPhone.scale-100.png", 480, 800),
            ("SplashScreenPhone.scale-200.png", 960, 1600),
            ("SplashScreenPhone.scale-240.png", 1152, 1920),
            ("SplashScreenPhone.scale-400.png", 1920, 3200),
        ],
    },
    SplashTable {
        name: "windows_wide",
        is_added: true,
        path: "resources/windows/icon/",
        splash: &[
            ("Wide310x150Logo.scale-100.png", 310, 150),
            ("Wide310x150Logo.scale-200.png", 620, 300),
            ("Wide310x150Logo.scale-240.png", 744, 360),
        ],
    },
    SplashTable {
        name: "android",
        is_added: false,
        path: "resources/android/splash/",
        splash: &[
            ("drawable-land-ldpi-screen.png", 320, 200),
            ("drawable-land-mdpi-screen.png", 480, 320),
            ("drawable-land-hdpi-screen.png", 800, 480),
            ("drawable-land-xhdpi-screen.png", 1280, 720),
            ("drawable-land-xxhdpi-screen.png", 1600, 960),
            ("drawable-land-xxxhdpi-screen.png", 1920, 1280),
            ("drawable-port-ldpi-screen.png", 200, 320),
            ("drawable-port-mdpi-screen.png", 320, 480),
            ("drawable-port-hdpi-screen.png", 480, 800),
            ("drawable-port-xhdpi-screen.png", 720, 1280),
            ("drawable-port-xxhdpi-screen.png", 960, 1600),
            ("drawable-port-xxxhdpi-screen.png", 1280, 1920),
        ],
    },
    SplashTable {
        name: "ios",
        is_added: false,
        path: "resources/ios/splash/",
        splash: &[
            ("Default~iphone.png", 320, 480),
            ("Default@2x~iphone.png", 640, 960),
            ("Default-568h@2x~iphone.png", 640, 1136),
            ("Default-667h.png", 750, 1334),
            ("Default-736h.png", 1242, 2208),
            ("Default-Landscape-736h.png", 2208, 1242),
            ("Default-Portrait~ipad.png", 768, 1024),
            ("Default-Portrait@2x~ipad.png", 1536, 2048),
            ("Default-Landscape~ipad.png", 1024, 768),
            ("Default-Landscape@2x~ipad.png", 2048, 1536),
            ("Default@2x~universal~anyany.png", 2732, 2732),
        ],
    },
];

// Every built-in asset is a PNG, so the tables skip extension parsing.
fn png(name: &str, width: u32, height: u32) -> Asset {
    Asset {
        name: name.to_string(),
        width,
        height,
        format: OutputFormat::Png,
    }
}

pub fn default_icon_platforms() -> Vec<Platform> {
    ICON_TABLES
        .iter()
        .map(|table| Platform {
            name: table.name.to_string(),
            is_added: table.is_added,
            path: Path::new(table.path).to_path_buf(),
            quality: None,
            assets: table
                .icons
                .iter()
                .map(|&(name, size)| png(name, size, size))
                .collect(),
        })
        .collect()
}

pub fn default_splash_platforms() -> Vec<Platform> {
    SPLASH_TABLES
        .iter()
        .map(|table| Platform {
            name: table.name.to_string(),
            is_added: table.is_added,
            path: Path::new(table.path).to_path_buf(),
            quality: None,
            assets: table
                .splash
                .iter()
                .map(|&(name, width, height)| png(name, width, height))
                .collect(),
        })
        .collect()
}
