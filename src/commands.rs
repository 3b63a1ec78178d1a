use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use repo_layout::check::{detect_collisions, find_stray_output_dirs};
use repo_layout::config::{Settings, load_settings_from_path};
use repo_layout::layout::{OVERRIDE_MARKER, normalize, resolve_with};
use repo_layout::properties::parse_assignment;
use repo_layout::render::{OutputFormat, render, render_layout};
use repo_layout::{BuildContext, Evaluation, FsProbe, Properties};
use tracing::{debug, info};

pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let loaded = match explicit {
        Some(path) => Some(load_settings_from_path(path)?),
        None => repo_layout::config::load_settings()?,
    };
    match loaded {
        Some(loaded) => {
            debug!(path = %loaded.path.display(), "loaded settings");
            Ok(loaded.data)
        }
        None => Ok(Settings::default()),
    }
}

pub fn root(settings: &Settings, dir: Option<&Path>, format: OutputFormat) -> Result<()> {
    let start = absolute_dir(dir)?;
    let layout = resolve_with(&start, &settings.root_markers(), &FsProbe)?;
    print!("{}", render_layout(&layout, format)?);
    Ok(())
}

pub fn paths(
    settings: &Settings,
    dirs: &[PathBuf],
    assignments: &[String],
    format: OutputFormat,
) -> Result<()> {
    let overrides = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let props = Properties::from_env().with_overrides(overrides);
    let markers = settings.root_markers();
    let defaults = settings.context_defaults();

    let mut evaluations = Vec::new();
    for dir in project_dirs(dirs)? {
        let layout = resolve_with(&dir, &markers, &FsProbe)
            .with_context(|| format!("evaluating {}", dir.display()))?;
        let context = BuildContext::from_properties(&dir, &props, &defaults)?;
        evaluations.push(Evaluation::new(layout, context));
    }
    detect_collisions(&evaluations)?;

    print!("{}", render(&evaluations, format)?);
    Ok(())
}

pub fn check(dirs: &[PathBuf]) -> Result<()> {
    let mut stray = Vec::new();
    for dir in project_dirs(dirs)? {
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        stray.extend(
            find_stray_output_dirs(&dir)
                .with_context(|| format!("scanning {}", dir.display()))?,
        );
    }

    if !stray.is_empty() {
        for dir in &stray {
            println!("{}", dir.display());
        }
        bail!(
            "found {} output director{} inside project sources",
            stray.len(),
            if stray.len() == 1 { "y" } else { "ies" }
        );
    }
    println!("No bin/obj directories inside project sources.");
    Ok(())
}

pub fn init(settings: &Settings, dir: Option<&Path>) -> Result<()> {
    let root = absolute_dir(dir)?;
    let src = root.join("src");
    if !src.is_dir() {
        bail!("{} has no src directory", root.display());
    }

    let marker_name = settings
        .override_marker
        .as_deref()
        .unwrap_or(OVERRIDE_MARKER);
    let marker = src.join(marker_name);
    if marker.exists() {
        println!("{} already exists", marker.display());
        return Ok(());
    }

    fs::write(&marker, b"").with_context(|| format!("writing {}", marker.display()))?;
    info!(root = %root.display(), "pinned repository root");
    println!("Created {}", marker.display());
    Ok(())
}

fn project_dirs(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if dirs.is_empty() {
        return Ok(vec![absolute_dir(None)?]);
    }
    dirs.iter().map(|dir| absolute_dir(Some(dir))).collect()
}

fn absolute_dir(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => std::path::absolute(dir)
            .map(|abs| normalize(&abs))
            .with_context(|| format!("resolving absolute path of {}", dir.display())),
        None => std::env::current_dir().context("resolving current directory"),
    }
}
