//! Checks that keep the shared output tree honest: no `bin`/`obj` left
//! under project sources, and no two evaluations writing to the same place.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LayoutError, Result};
use crate::layout::normalize;
use crate::paths::Evaluation;

const OUTPUT_DIR_NAMES: &[&str] = &["bin", "obj"];

/// Every `bin` or `obj` directory below `project_dir`, outermost only.
///
/// Unreadable entries fail the scan rather than being skipped.
pub fn find_stray_output_dirs(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut stray = Vec::new();
    let mut walker = WalkDir::new(project_dir)
        .follow_links(false)
        .min_depth(1)
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|err| LayoutError::Probe {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| project_dir.to_path_buf()),
            source: io::Error::from(err),
        })?;
        if entry.file_type().is_dir() && is_output_dir_name(entry.file_name()) {
            debug!(dir = %entry.path().display(), "stray output directory");
            stray.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    stray.sort();
    Ok(stray)
}

fn is_output_dir_name(name: &OsStr) -> bool {
    OUTPUT_DIR_NAMES.iter().any(|candidate| name == *candidate)
}

/// Fails when two evaluations would write to the same directory.
///
/// The same project directory evaluated twice is fine as long as both
/// evaluations agree; differing results mean the project would be built twice.
pub fn detect_collisions(evaluations: &[Evaluation]) -> Result<()> {
    for (idx, first) in evaluations.iter().enumerate() {
        for second in &evaluations[idx + 1..] {
            let first_dir = &first.context.project_directory;
            let second_dir = &second.context.project_directory;

            if normalize(first_dir) == normalize(second_dir) {
                if first.paths != second.paths {
                    return Err(LayoutError::DoubleEvaluation {
                        project: first_dir.clone(),
                        first: first.paths.target_dir.display().to_string(),
                        second: second.paths.target_dir.display().to_string(),
                    });
                }
                continue;
            }

            let shared = if first.paths.target_dir == second.paths.target_dir {
                Some(first.paths.target_dir.clone())
            } else if intermediate_dir(first) == intermediate_dir(second) {
                intermediate_dir(first).map(Path::to_path_buf)
            } else {
                None
            };
            if let Some(dir) = shared {
                return Err(LayoutError::OutputCollision {
                    first: first_dir.clone(),
                    second: second_dir.clone(),
                    dir,
                });
            }
        }
    }
    Ok(())
}

fn intermediate_dir(eval: &Evaluation) -> Option<&Path> {
    eval.paths.built_output.parent()
}
