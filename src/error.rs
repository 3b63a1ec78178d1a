//! Error types for repository layout resolution

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "could not find the repository root above {}; add an empty src/.RepoSrcRoot file or one of the root markers",
        start.display()
    )]
    RepoRootNotFound { start: PathBuf },

    #[error("failed to probe {}: {source}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "cannot derive a project name for {}; set the ProjectName property",
        project.display()
    )]
    MissingProjectName { project: PathBuf },

    #[error("invalid property assignment `{0}`, expected Name=Value")]
    InvalidProperty(String),

    #[error(
        "projects {} and {} both write to {}",
        first.display(),
        second.display(),
        dir.display()
    )]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        dir: PathBuf,
    },

    #[error(
        "project {} was evaluated twice with different properties ({first} vs {second})",
        project.display()
    )]
    DoubleEvaluation {
        project: PathBuf,
        first: String,
        second: String,
    },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
