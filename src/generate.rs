use crate::{
    catalog::{self, Asset, Platform},
    display,
    settings::Settings,
    transform::{ImageTransformer, TransformRequest},
};
use anyhow::{Context, Result};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Icons,
    Splash,
}

impl Pipeline {
    pub fn label(self) -> &'static str {
        match self {
            Self::Icons => "Icons",
            Self::Splash => "splash screen",
        }
    }

    fn source(self, settings: &Settings) -> &Path {
        match self {
            Self::Icons => &settings.icon_source,
            Self::Splash => &settings.splash_source,
        }
    }

    fn platforms(self, settings: &Settings) -> Vec<Platform> {
        match self {
            Self::Icons => catalog::list_icon_platforms(settings),
            Self::Splash => catalog::list_splash_platforms(settings),
        }
    }

    /// Icons are resized, splash screens are cropped.
    fn transform<T: ImageTransformer>(self, transformer: &T, request: &TransformRequest) -> Result<()> {
        match self {
            Self::Icons => transformer.resize(request),
            Self::Splash => transformer.crop(request),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub pipeline: Pipeline,
    pub platform: String,
    pub asset: String,
    pub destination: PathBuf,
    pub error: String,
}

/// Result of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every attempted asset was written. `generated` may be zero.
    Success { generated: usize },
    /// At least one asset failed; the others were still attempted.
    PartialFailure {
        generated: usize,
        failures: Vec<AssetFailure>,
    },
    /// Neither source image exists.
    NoSources,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success { .. } => 0,
            Self::NoSources => 2,
            Self::PartialFailure { .. } => 3,
        }
    }
}

#[derive(Debug, Default)]
struct Report {
    generated: usize,
    failures: Vec<AssetFailure>,
}

impl Report {
    fn into_outcome(self) -> RunOutcome {
        if self.failures.is_empty() {
            RunOutcome::Success {
                generated: self.generated,
            }
        } else {
            RunOutcome::PartialFailure {
                generated: self.generated,
                failures: self.failures,
            }
        }
    }
}

/// Check that a master image is present, reporting either way.
pub fn source_exists(path: &Path) -> bool {
    if path.is_file() {
        display::success(&format!("{} exists", path.display()));
        true
    } else {
        log::info!("Source image {} not found", path.display());
        display::error(&format!("{} does not exist", path.display()));
        false
    }
}

/// Create `path` and any missing ancestors. Existing directories are left alone.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }
    create_dir_all(path)
        .with_context(|| format!("Can't create output directory {}", path.display()))
}

/// Generate every icon and splash screen the settings call for.
///
/// Platforms run one after another in catalog order; the assets of one
/// platform run concurrently on a pool of `settings.jobs` threads. A failed
/// asset is reported and recorded without stopping its siblings, and files
/// already written are kept.
pub fn generate<T: ImageTransformer>(settings: &Settings, transformer: &T) -> Result<RunOutcome> {
    display::header("Checking Splash & Icon");
    let has_icon = source_exists(&settings.icon_source);
    let has_splash = source_exists(&settings.splash_source);

    let outcome = if !has_icon && !has_splash {
        RunOutcome::NoSources
    } else {
        let pool = build_pool(settings.jobs)?;
        let mut report = Report::default();

        if has_icon {
            run_pipeline(Pipeline::Icons, settings, transformer, &pool, &mut report);
        }
        if has_splash {
            run_pipeline(Pipeline::Splash, settings, transformer, &pool, &mut report);
        }

        report.into_outcome()
    };

    display::summary(&outcome, settings);
    display::finish();
    Ok(outcome)
}

fn build_pool(jobs: Option<usize>) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|index| format!("splash-gen-{index}"));
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs);
    }

    let pool = builder.build().context("Failed to start worker threads")?;
    log::info!("Using {} worker threads", pool.current_num_threads());
    Ok(pool)
}

fn run_pipeline<T: ImageTransformer>(
    pipeline: Pipeline,
    settings: &Settings,
    transformer: &T,
    pool: &ThreadPool,
    report: &mut Report,
) {
    let source = pipeline.source(settings);
    let platforms = pipeline.platforms(settings);

    for platform in platforms.iter().filter(|platform| platform.is_added) {
        display::header(&format!(
            "Generating {} for {}",
            pipeline.label(),
            platform.name
        ));

        let quality = platform.quality.unwrap_or(settings.quality);
        let results: Vec<Result<()>> = pool.install(|| {
            platform
                .assets
                .par_iter()
                .map(|asset| {
                    let request = transform_request(source, platform, asset, quality);
                    generate_asset(pipeline, transformer, asset, &request)
                })
                .collect()
        });

        for (asset, result) in platform.assets.iter().zip(results) {
            match result {
                Ok(()) => report.generated += 1,
                Err(err) => report.failures.push(AssetFailure {
                    pipeline,
                    platform: platform.name.clone(),
                    asset: asset.name.clone(),
                    destination: platform.destination(asset),
                    error: format!("{err:#}"),
                }),
            }
        }
    }
}

fn transform_request(
    source: &Path,
    platform: &Platform,
    asset: &Asset,
    quality: u8,
) -> TransformRequest {
    TransformRequest {
        source: source.to_path_buf(),
        destination: platform.destination(asset),
        width: asset.width,
        height: asset.height,
        format: asset.format,
        quality,
    }
}

fn generate_asset<T: ImageTransformer>(
    pipeline: Pipeline,
    transformer: &T,
    asset: &Asset,
    request: &TransformRequest,
) -> Result<()> {
    let result = write_asset(pipeline, transformer, request);
    match &result {
        Ok(()) => display::success(&format!("{} created", asset.name)),
        Err(err) => display::error(&format!("{}: {err:#}", asset.name)),
    }
    result
}

fn write_asset<T: ImageTransformer>(
    pipeline: Pipeline,
    transformer: &T,
    request: &TransformRequest,
) -> Result<()> {
    if let Some(dir) = request.destination.parent() {
        ensure_dir(dir)?;
    }

    log::debug!(
        "{} {} -> {} ({}x{} {}, quality {})",
        pipeline.label(),
        request.source.display(),
        request.destination.display(),
        request.width,
        request.height,
        request.format,
        request.quality
    );
    pipeline.transform(transformer, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{format::OutputFormat, settings::DEFAULT_QUALITY};
    use anyhow::bail;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Resize,
        Crop,
    }

    /// Records every request instead of touching pixels.
    #[derive(Default)]
    struct RecordingTransformer {
        calls: Mutex<Vec<(Op, TransformRequest)>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingTransformer {
        fn failing_on(name: &'static str) -> Self {
            Self {
                fail_on: Some(name),
                ..Self::default()
            }
        }

        fn record(&self, op: Op, request: &TransformRequest) -> Result<()> {
            self.calls.lock().unwrap().push((op, request.clone()));
            if let Some(name) = self.fail_on {
                if request.destination.ends_with(name) {
                    bail!("transformer rejected {name}");
                }
            }
            Ok(())
        }

        fn calls(&self) -> Vec<(Op, TransformRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageTransformer for RecordingTransformer {
        fn resize(&self, request: &TransformRequest) -> Result<()> {
            self.record(Op::Resize, request)
        }

        fn crop(&self, request: &TransformRequest) -> Result<()> {
            self.record(Op::Crop, request)
        }
    }

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new(with_icon: bool, with_splash: bool) -> Self {
            let dir = TempDir::new().expect("Failed to create temp directory");
            if with_icon {
                std::fs::write(dir.path().join("icon.png"), b"icon").unwrap();
            }
            if with_splash {
                std::fs::write(dir.path().join("splash.png"), b"splash").unwrap();
            }
            Self { dir }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.dir.path().join(relative)
        }

        fn settings(&self, icons: Vec<Platform>, splash: Vec<Platform>) -> Settings {
            Settings {
                icon_source: self.path("icon.png"),
                splash_source: self.path("splash.png"),
                icon_platforms: Some(icons),
                splash_platforms: Some(splash),
                jobs: Some(2),
                ..Settings::default()
            }
        }
    }

    fn icon_platform(name: &str, is_added: bool, path: PathBuf, icons: &[(&str, u32)]) -> Platform {
        let assets = icons
            .iter()
            .map(|&(name, size)| Asset::new(name, size, size).unwrap())
            .collect();
        Platform::new(name, is_added, path, None, assets).unwrap()
    }

    fn splash_platform(
        name: &str,
        is_added: bool,
        path: PathBuf,
        splash: &[(&str, u32, u32)],
    ) -> Platform {
        let assets = splash
            .iter()
            .map(|&(name, width, height)| Asset::new(name, width, height).unwrap())
            .collect();
        Platform::new(name, is_added, path, None, assets).unwrap()
    }

    #[test]
    fn single_icon_produces_single_resize() {
        let project = Project::new(true, false);
        let p1 = icon_platform("p1", true, project.path("p1"), &[("a.png", 10)]);
        let settings = project.settings(vec![p1], vec![]);
        let transformer = RecordingTransformer::default();

        let outcome = generate(&settings, &transformer).unwrap();

        assert_eq!(outcome, RunOutcome::Success { generated: 1 });
        assert_eq!(
            transformer.calls(),
            vec![(
                Op::Resize,
                TransformRequest {
                    source: project.path("icon.png"),
                    destination: project.path("p1").join("a.png"),
                    width: 10,
                    height: 10,
                    format: OutputFormat::Png,
                    quality: DEFAULT_QUALITY,
                }
            )]
        );
        assert!(project.path("p1").is_dir());
    }

    #[test]
    fn platform_not_added_is_skipped() {
        let project = Project::new(true, false);
        let p2 = icon_platform("p2", false, project.path("p2"), &[("a.png", 10)]);
        let settings = project.settings(vec![p2], vec![]);
        let transformer = RecordingTransformer::default();

        let outcome = generate(&settings, &transformer).unwrap();

        assert_eq!(outcome, RunOutcome::Success { generated: 0 });
        assert!(transformer.calls().is_empty());
        assert!(!project.path("p2").exists());
    }

    #[test]
    fn missing_sources_generate_nothing() {
        let project = Project::new(false, false);
        let icons = icon_platform("p1", true, project.path("icons"), &[("a.png", 10)]);
        let splash = splash_platform("p1", true, project.path("splash"), &[("s.png", 20, 10)]);
        let settings = project.settings(vec![icons], vec![splash]);
        let transformer = RecordingTransformer::default();

        let outcome = generate(&settings, &transformer).unwrap();

        assert_eq!(outcome, RunOutcome::NoSources);
        assert_eq!(outcome.exit_code(), 2);
        assert!(transformer.calls().is_empty());
        assert!(!project.path("icons").exists());
        assert!(!project.path("splash").exists());
    }

    #[test]
    fn only_icon_source_runs_only_icon_pipeline() {
        let project = Project::new(true, false);
        let icons = icon_platform("p1", true, project.path("icons"), &[("a.png", 10)]);
        let splash = splash_platform("p1", true, project.path("splash"), &[("s.png", 20, 10)]);
        let settings = project.settings(vec![icons], vec![splash]);
        let transformer = RecordingTransformer::default();

        generate(&settings, &transformer).unwrap();

        let calls = transformer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls.iter().all(|(op, _)| *op == Op::Resize));
        assert!(!project.path("splash").exists());
    }

    #[test]
    fn only_splash_source_runs_only_splash_pipeline() {
        let project = Project::new(false, true);
        let icons = icon_platform("p1", true, project.path("icons"), &[("a.png", 10)]);
        let splash = splash_platform("p1", true, project.path("splash"), &[("s.png", 20, 10)]);
        let settings = project.settings(vec![icons], vec![splash]);
        let transformer = RecordingTransformer::default();

        generate(&settings, &transformer).unwrap();

        let calls = transformer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Op::Crop);
        assert!(!project.path("icons").exists());
    }

    #[test]
    fn every_icon_is_a_square_resize_at_platform_quality() {
        let project = Project::new(true, false);
        let mut icons = icon_platform(
            "windows",
            true,
            project.path("windows"),
            &[("a.png", 30), ("b.png", 44), ("c.jpg", 150)],
        );
        icons.quality = Some(70);
        let settings = project.settings(vec![icons], vec![]);
        let transformer = RecordingTransformer::default();

        generate(&settings, &transformer).unwrap();

        let mut calls = transformer.calls();
        calls.sort_by(|a, b| a.1.destination.cmp(&b.1.destination));
        let sizes: Vec<_> = calls
            .iter()
            .map(|(op, request)| (*op, request.width, request.height, request.quality))
            .collect();
        assert_eq!(
            sizes,
            [
                (Op::Resize, 30, 30, 70),
                (Op::Resize, 44, 44, 70),
                (Op::Resize, 150, 150, 70)
            ]
        );
        assert_eq!(calls[2].1.format, OutputFormat::Jpeg);
    }

    #[test]
    fn every_splash_is_a_crop_at_declared_size() {
        let project = Project::new(false, true);
        let splash = splash_platform(
            "windows",
            true,
            project.path("splash"),
            &[("wide.png", 620, 300), ("tall.png", 480, 800)],
        );
        let settings = Settings {
            quality: 85,
            ..project.settings(vec![], vec![splash])
        };
        let transformer = RecordingTransformer::default();

        let outcome = generate(&settings, &transformer).unwrap();

        assert_eq!(outcome, RunOutcome::Success { generated: 2 });
        let mut calls = transformer.calls();
        calls.sort_by(|a, b| a.1.destination.cmp(&b.1.destination));
        let sizes: Vec<_> = calls
            .iter()
            .map(|(op, request)| (*op, request.width, request.height, request.quality))
            .collect();
        assert_eq!(sizes, [(Op::Crop, 480, 800, 85), (Op::Crop, 620, 300, 85)]);
    }

    #[test]
    fn platforms_run_one_after_another() {
        let project = Project::new(true, false);
        let names = [("a.png", 8), ("b.png", 9), ("c.png", 10), ("d.png", 11)];
        let first = icon_platform("first", true, project.path("first"), &names);
        let second = icon_platform("second", true, project.path("second"), &names);
        let settings = Settings {
            jobs: Some(4),
            ..project.settings(vec![first, second], vec![])
        };
        let transformer = RecordingTransformer::default();

        generate(&settings, &transformer).unwrap();

        let calls = transformer.calls();
        assert_eq!(calls.len(), 8);
        let (first_batch, second_batch) = calls.split_at(4);
        assert!(first_batch
            .iter()
            .all(|(_, request)| request.destination.starts_with(project.path("first"))));
        assert!(second_batch
            .iter()
            .all(|(_, request)| request.destination.starts_with(project.path("second"))));
    }

    #[test]
    fn failed_asset_does_not_stop_siblings() {
        let project = Project::new(true, false);
        let icons = icon_platform(
            "p1",
            true,
            project.path("p1"),
            &[("a.png", 10), ("b.png", 20), ("c.png", 30)],
        );
        let next = icon_platform("p2", true, project.path("p2"), &[("d.png", 40)]);
        let settings = project.settings(vec![icons, next], vec![]);
        let transformer = RecordingTransformer::failing_on("b.png");

        let outcome = generate(&settings, &transformer).unwrap();

        assert_eq!(transformer.calls().len(), 4);
        match outcome {
            RunOutcome::PartialFailure {
                generated,
                failures,
            } => {
                assert_eq!(generated, 3);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].pipeline, Pipeline::Icons);
                assert_eq!(failures[0].platform, "p1");
                assert_eq!(failures[0].asset, "b.png");
                assert_eq!(failures[0].destination, project.path("p1").join("b.png"));
                assert!(failures[0].error.contains("transformer rejected b.png"));
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn unwritable_directory_fails_only_that_platform() {
        let project = Project::new(false, true);
        std::fs::write(project.path("blocked"), b"not a directory").unwrap();
        let blocked = splash_platform(
            "blocked",
            true,
            project.path("blocked").join("splash"),
            &[("s.png", 20, 10)],
        );
        let fine = splash_platform("fine", true, project.path("fine"), &[("s.png", 20, 10)]);
        let settings = project.settings(vec![], vec![blocked, fine]);
        let transformer = RecordingTransformer::default();

        let outcome = generate(&settings, &transformer).unwrap();

        let calls = transformer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.destination, project.path("fine").join("s.png"));
        assert_eq!(outcome.exit_code(), 3);
        let RunOutcome::PartialFailure { failures, .. } = outcome else {
            panic!("expected partial failure");
        };
        assert_eq!(failures[0].pipeline, Pipeline::Splash);
        assert!(failures[0].error.contains("Can't create output directory"));
    }

    #[test]
    fn repeated_runs_issue_identical_requests() {
        let project = Project::new(true, true);
        let icons = icon_platform("p1", true, project.path("icons"), &[("a.png", 10), ("b.png", 20)]);
        let splash = splash_platform("p1", true, project.path("splash"), &[("s.png", 20, 10)]);
        let settings = project.settings(vec![icons], vec![splash]);

        let run = || {
            let transformer = RecordingTransformer::default();
            generate(&settings, &transformer).unwrap();
            let mut calls = transformer.calls();
            calls.sort_by(|a, b| a.1.destination.cmp(&b.1.destination));
            calls
        };

        let first = run();
        assert_eq!(first.len(), 3);
        assert_eq!(first, run());
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let project = Project::new(false, false);
        let nested = project.path("a/b/c");

        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();

        assert!(nested.is_dir());
        ensure_dir(Path::new("")).unwrap();
    }

    #[test]
    fn source_exists_requires_a_file() {
        let project = Project::new(true, false);
        assert!(source_exists(&project.path("icon.png")));
        assert!(!source_exists(&project.path("splash.png")));
        assert!(!source_exists(project.dir.path()));
    }
}
