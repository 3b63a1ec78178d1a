//! repo-layout: shared `bin`/`obj` roots for every project in a repository
//!
//! - `layout`: finds the repository root from a project directory
//! - `paths`: derives `OutputPath`, `IntermediateOutputPath`, `TargetDir` and friends
//! - `properties`: the immutable property map a build evaluation reads from
//! - `check`: stray output directories and output collisions between projects

pub mod check;
pub mod config;
pub mod error;
pub mod layout;
pub mod paths;
pub mod properties;
pub mod render;

pub use error::LayoutError;
pub use layout::{FsProbe, Marker, Probe, RepositoryLayout, RootMarkers, resolve};
pub use paths::{BuildContext, Evaluation, ResolvedPaths, compute};
pub use properties::Properties;
