//! Output and intermediate path derivation.
//!
//! `OutputPath` and `IntermediateOutputPath` stay relative to the project
//! directory, while `TargetDir` and the output-group items are absolute.

use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::layout::RepositoryLayout;
use crate::properties::Properties;

pub const DEFAULT_CONFIGURATION: &str = "Debug";
pub const DEFAULT_TARGET_EXTENSION: &str = ".dll";
pub const DOCUMENTATION_EXTENSION: &str = ".xml";

const BIN_DIR: &str = "bin";
const OBJ_DIR: &str = "obj";

/// Fallback values used when the property map leaves something unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDefaults {
    pub configuration: String,
    pub target_extension: String,
    pub documentation_extension: String,
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            configuration: DEFAULT_CONFIGURATION.to_string(),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            documentation_extension: DOCUMENTATION_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildContext {
    pub project_directory: PathBuf,
    pub project_name: String,
    pub configuration: String,
    pub platform: Option<String>,
    pub target_name: String,
    pub target_extension: String,
    pub generate_documentation: bool,
    pub documentation_extension: String,
}

impl BuildContext {
    pub fn new(
        project_directory: impl Into<PathBuf>,
        project_name: impl Into<String>,
        configuration: impl Into<String>,
    ) -> Self {
        let project_name = project_name.into();
        Self {
            project_directory: project_directory.into(),
            target_name: project_name.clone(),
            project_name,
            configuration: configuration.into(),
            platform: None,
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            generate_documentation: false,
            documentation_extension: DOCUMENTATION_EXTENSION.to_string(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_documentation(mut self) -> Self {
        self.generate_documentation = true;
        self
    }

    /// Build a context from the evaluation properties of one project.
    ///
    /// `ProjectName` falls back to the directory name, `AssemblyName` to the
    /// project name. `Configuration` is used verbatim. Fails when neither the
    /// property nor the directory yields a project name.
    pub fn from_properties(
        project_directory: &Path,
        props: &Properties,
        defaults: &ContextDefaults,
    ) -> Result<Self> {
        let project_name = props
            .get("ProjectName")
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .or_else(|| directory_name(project_directory))
            .ok_or_else(|| LayoutError::MissingProjectName {
                project: project_directory.to_path_buf(),
            })?;
        let configuration = props
            .get("Configuration")
            .filter(|value| !value.is_empty())
            .unwrap_or(&defaults.configuration);
        let target_name = props
            .get("AssemblyName")
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| project_name.clone());
        let target_extension = props
            .get("TargetExt")
            .unwrap_or(&defaults.target_extension);

        Ok(Self {
            project_directory: project_directory.to_path_buf(),
            project_name,
            configuration: configuration.to_string(),
            platform: props.get("Platform").map(str::to_string),
            target_name,
            target_extension: target_extension.to_string(),
            generate_documentation: props.is_true("GenerateDocumentationFile"),
            documentation_extension: defaults.documentation_extension.clone(),
        })
    }

    pub fn target_file_name(&self) -> String {
        format!("{}{}", self.target_name, self.target_extension)
    }

    /// The platform directory segment, if the platform is not the AnyCPU default.
    pub fn platform_segment(&self) -> Option<&str> {
        self.platform
            .as_deref()
            .map(str::trim)
            .filter(|platform| !is_default_platform(platform))
    }

    fn output_segments(&self) -> Vec<&str> {
        self.platform_segment()
            .into_iter()
            .chain([self.configuration.as_str(), self.project_name.as_str()])
            .collect()
    }
}

pub fn is_default_platform(platform: &str) -> bool {
    let platform = platform.trim();
    platform.is_empty()
        || platform.eq_ignore_ascii_case("AnyCPU")
        || platform.eq_ignore_ascii_case("Any CPU")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    /// Relative to the project directory, trailing separator.
    pub output_path: String,
    /// Relative to the project directory, trailing separator.
    pub intermediate_output_path: String,
    /// Absolute, trailing separator.
    pub target_dir: PathBuf,
    pub target_path: PathBuf,
    /// Primary compiled artifact before it is copied to `target_dir`.
    pub built_output: PathBuf,
    pub documentation_file: Option<PathBuf>,
}

/// Derive every output location for `ctx` below the shared roots of `layout`.
pub fn compute(layout: &RepositoryLayout, ctx: &BuildContext) -> ResolvedPaths {
    let segments = ctx.output_segments();
    let bin_dir = nested(&layout.bin_root, &segments);
    let obj_dir = nested(&layout.obj_root, &segments);
    let file_name = ctx.target_file_name();

    ResolvedPaths {
        output_path: relative_dir(BIN_DIR, &segments),
        intermediate_output_path: relative_dir(OBJ_DIR, &segments),
        target_path: bin_dir.join(&file_name),
        built_output: obj_dir.join(&file_name),
        documentation_file: ctx.generate_documentation.then(|| {
            bin_dir.join(format!("{}{}", ctx.target_name, ctx.documentation_extension))
        }),
        target_dir: with_trailing_separator(bin_dir),
    }
}

/// One project's layout, context and derived paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub layout: RepositoryLayout,
    pub context: BuildContext,
    pub paths: ResolvedPaths,
}

impl Evaluation {
    pub fn new(layout: RepositoryLayout, context: BuildContext) -> Self {
        let paths = compute(&layout, &context);
        Self {
            layout,
            context,
            paths,
        }
    }

    /// Properties exposed to the build engine, in declaration order.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let mut props = self.layout.properties();
        props.push(("Configuration", self.context.configuration.clone()));
        if let Some(platform) = &self.context.platform {
            props.push(("Platform", platform.clone()));
        }
        props.extend([
            ("OutputPath", self.paths.output_path.clone()),
            (
                "IntermediateOutputPath",
                self.paths.intermediate_output_path.clone(),
            ),
            ("TargetDir", display(&self.paths.target_dir)),
            ("TargetPath", display(&self.paths.target_path)),
        ]);
        props
    }

    /// Output-group items exposed to the build engine.
    pub fn items(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![("BuiltProjectOutputGroup", display(&self.paths.built_output))];
        if let Some(doc) = &self.paths.documentation_file {
            items.push(("DocumentationProjectOutputGroup", display(doc)));
        }
        items
    }
}

fn relative_dir(root: &str, segments: &[&str]) -> String {
    let mut parts = vec!["..", "..", root];
    parts.extend_from_slice(segments);
    let mut joined = parts.join(MAIN_SEPARATOR_STR);
    joined.push_str(MAIN_SEPARATOR_STR);
    joined
}

fn nested(root: &Path, segments: &[&str]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment))
}

fn with_trailing_separator(dir: PathBuf) -> PathBuf {
    let mut raw: OsString = dir.into_os_string();
    if !raw.to_string_lossy().ends_with(MAIN_SEPARATOR_STR) {
        raw.push(MAIN_SEPARATOR_STR);
    }
    PathBuf::from(raw)
}

fn directory_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
