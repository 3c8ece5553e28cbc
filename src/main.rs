use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};

mod catalog;
mod display;
mod format;
mod generate;
mod settings;
mod transform;

use generate::Pipeline;
use settings::{ConfigFile, Overrides, Settings};
use transform::ImageCrateTransformer;

#[derive(Debug, Parser)]
#[clap(
    name = "splash-gen",
    about = "Generate icons and splash screens for every configured platform"
)]
struct Args {
    /// Master icon image. Defaults to resources/icon.png.
    #[clap(long, value_name = "PATH")]
    icon: Option<PathBuf>,

    /// Master splash screen image. Defaults to resources/splash.png.
    #[clap(long, value_name = "PATH")]
    splash: Option<PathBuf>,

    /// JSON config file with source paths and platform catalogs.
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Encoder quality for lossy formats (1-100). Defaults to 100.
    #[clap(short, long, value_name = "QUALITY", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Number of assets generated at the same time. Defaults to the number of CPUs.
    #[clap(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Generate assets for Windows platforms
    #[clap(long)]
    windows: bool,

    /// Generate assets for Android platforms
    #[clap(long)]
    android: bool,

    /// Generate assets for iOS platforms
    #[clap(long)]
    ios: bool,

    /// Print the icon and splash screen catalogs and exit
    #[clap(long)]
    list: bool,
}

impl Args {
    fn selected_platforms(&self) -> Vec<String> {
        [
            ("windows", self.windows),
            ("android", self.android),
            ("ios", self.ios),
        ]
        .into_iter()
        .filter(|&(_, selected)| selected)
        .map(|(family, _)| family.to_string())
        .collect()
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let settings = load_settings(&args)?;

    if args.list {
        display::catalog(Pipeline::Icons, &catalog::list_icon_platforms(&settings));
        display::catalog(Pipeline::Splash, &catalog::list_splash_platforms(&settings));
        display::finish();
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = generate::generate(&settings, &ImageCrateTransformer)?;
    Ok(ExitCode::from(outcome.exit_code()))
}

fn load_settings(args: &Args) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let overrides = Overrides {
        icon_source: args.icon.clone(),
        splash_source: args.splash.clone(),
        quality: args.quality,
        jobs: args.jobs,
        platforms: args.selected_platforms(),
    };

    Settings::resolve(config, overrides)
}
