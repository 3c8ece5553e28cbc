//! Progress lines printed to stdout while a run is in progress.

use crate::{
    catalog::Platform,
    generate::{Pipeline, RunOutcome},
    settings::Settings,
};

pub fn success(message: &str) {
    println!("  ✓  {message}");
}

pub fn error(message: &str) {
    println!("  ✗  {message}");
}

pub fn header(title: &str) {
    println!();
    println!(" {title}");
    println!();
}

/// Ends every run.
pub fn finish() {
    println!();
}

pub fn summary(outcome: &RunOutcome, settings: &Settings) {
    println!();
    match outcome {
        RunOutcome::Success { generated } => success(&format!("{generated} files generated")),
        RunOutcome::PartialFailure {
            generated,
            failures,
        } => {
            error(&format!(
                "{} of {} files failed",
                failures.len(),
                generated + failures.len()
            ));
            for failure in failures {
                println!(
                    "       {} {} for {} -> {}: {}",
                    failure.pipeline.label(),
                    failure.asset,
                    failure.platform,
                    failure.destination.display(),
                    failure.error
                );
            }
        }
        RunOutcome::NoSources => error(&format!(
            "Neither {} nor {} exists, nothing to generate",
            settings.icon_source.display(),
            settings.splash_source.display()
        )),
    }
}

/// Print a catalog for `--list`.
pub fn catalog(pipeline: Pipeline, platforms: &[Platform]) {
    for platform in platforms {
        let state = if platform.is_added { "added" } else { "not added" };
        header(&format!(
            "{} for {} ({state}) -> {}",
            pipeline.label(),
            platform.name,
            platform.path.display()
        ));
        for asset in &platform.assets {
            println!("  {:<40} {}x{}", asset.name, asset.width, asset.height);
        }
    }
}
