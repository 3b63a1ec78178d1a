//! Repository root discovery.
//!
//! The root is found either through an explicit override (an empty
//! `src/.RepoSrcRoot` file) or by walking upward from the project directory
//! until a directory carries one of an ordered set of root markers.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LayoutError, Result};

/// Empty file inside `src/` that pins the repository root to its parent.
pub const OVERRIDE_MARKER: &str = ".RepoSrcRoot";

/// Root markers tried at every level, in order.
pub const DEFAULT_MARKERS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "*.sln",
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "README.md",
    "README",
];

const SRC_DIR: &str = "src";
const BIN_DIR: &str = "bin";
const OBJ_DIR: &str = "obj";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryLayout {
    pub root: PathBuf,
    pub src_root: PathBuf,
    pub bin_root: PathBuf,
    pub obj_root: PathBuf,
}

impl RepositoryLayout {
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            src_root: root.join(SRC_DIR),
            bin_root: root.join(BIN_DIR),
            obj_root: root.join(OBJ_DIR),
        }
    }

    /// `RepoRoot`, `RepoSrcRoot`, `RepoBinRoot` and `RepoObjRoot`.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("RepoRoot", self.root.display().to_string()),
            ("RepoSrcRoot", self.src_root.display().to_string()),
            ("RepoBinRoot", self.bin_root.display().to_string()),
            ("RepoObjRoot", self.obj_root.display().to_string()),
        ]
    }
}

/// A single root indicator: a literal entry name (`.git`) or an extension
/// pattern (`*.sln`) that matches any entry with that extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Name(String),
    Extension(String),
}

impl Marker {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("*.") {
            Some(ext) if !ext.is_empty() => Marker::Extension(ext.to_string()),
            _ => Marker::Name(raw.to_string()),
        }
    }

    fn matches(&self, probe: &dyn Probe, dir: &Path) -> Result<bool> {
        match self {
            Marker::Name(name) => probe.exists(&dir.join(name)),
            Marker::Extension(ext) => probe.has_entry_with_extension(dir, ext),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Name(name) => f.write_str(name),
            Marker::Extension(ext) => write!(f, "*.{ext}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMarkers {
    markers: Vec<Marker>,
    override_marker: String,
}

impl Default for RootMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().copied())
    }
}

impl RootMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|raw| Marker::parse(raw.as_ref()))
                .collect(),
            override_marker: OVERRIDE_MARKER.to_string(),
        }
    }

    pub fn with_override_marker(mut self, name: impl Into<String>) -> Self {
        self.override_marker = name.into();
        self
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn override_marker(&self) -> &str {
        &self.override_marker
    }
}

/// Read-only view of the filesystem used while resolving.
pub trait Probe {
    fn exists(&self, path: &Path) -> Result<bool>;

    fn has_entry_with_extension(&self, dir: &Path, ext: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl Probe for FsProbe {
    fn exists(&self, path: &Path) -> Result<bool> {
        path.try_exists().map_err(|source| LayoutError::Probe {
            path: path.to_path_buf(),
            source,
        })
    }

    fn has_entry_with_extension(&self, dir: &Path, ext: &str) -> Result<bool> {
        let probe_err = |source: std::io::Error| LayoutError::Probe {
            path: dir.to_path_buf(),
            source,
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(probe_err(e)),
        };
        for entry in entries {
            let entry = entry.map_err(probe_err)?;
            if Path::new(&entry.file_name()).extension() == Some(OsStr::new(ext)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Resolve the repository layout for `start` with the default markers.
pub fn resolve(start: &Path) -> Result<RepositoryLayout> {
    resolve_with(start, &RootMarkers::default(), &FsProbe)
}

pub fn resolve_with(
    start: &Path,
    markers: &RootMarkers,
    probe: &dyn Probe,
) -> Result<RepositoryLayout> {
    if let Some(root) = override_root(start, markers, probe)? {
        info!(root = %root.display(), "repository root pinned by {}", markers.override_marker());
        return Ok(RepositoryLayout::at(root));
    }

    // a project folder and the `src` directly above it never hold the root
    let skipped = if is_project_folder(start) { 2 } else { 0 };
    for dir in start.ancestors().skip(skipped) {
        debug!(dir = %dir.display(), "probing for root markers");
        for marker in markers.markers() {
            if marker.matches(probe, dir)? {
                info!(root = %dir.display(), %marker, "resolved repository root");
                return Ok(RepositoryLayout::at(dir));
            }
        }
    }

    Err(LayoutError::RepoRootNotFound {
        start: start.to_path_buf(),
    })
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let (after_name, at_root) = match normalized.components().next_back() {
                    Some(Component::Normal(_)) => (true, false),
                    Some(Component::RootDir | Component::Prefix(_)) => (false, true),
                    _ => (false, false),
                };
                if after_name {
                    normalized.pop();
                } else if !at_root {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn override_root<'a>(
    start: &'a Path,
    markers: &RootMarkers,
    probe: &dyn Probe,
) -> Result<Option<&'a Path>> {
    let Some(src) = start.ancestors().find(|dir| is_named(dir, SRC_DIR)) else {
        return Ok(None);
    };
    if !probe.exists(&src.join(markers.override_marker()))? {
        return Ok(None);
    }
    Ok(src.parent())
}

fn is_project_folder(dir: &Path) -> bool {
    dir.parent().is_some_and(|parent| is_named(parent, SRC_DIR))
}

fn is_named(dir: &Path, name: &str) -> bool {
    dir.file_name() == Some(OsStr::new(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    /// Probe backed by a fixed set of existing paths.
    struct MemProbe {
        entries: HashSet<PathBuf>,
    }

    impl MemProbe {
        fn new(paths: &[&str]) -> Self {
            Self {
                entries: paths.iter().map(PathBuf::from).collect(),
            }
        }
    }

    impl Probe for MemProbe {
        fn exists(&self, path: &Path) -> Result<bool> {
            Ok(self.entries.contains(path))
        }

        fn has_entry_with_extension(&self, dir: &Path, ext: &str) -> Result<bool> {
            Ok(self.entries.iter().any(|entry| {
                entry.parent() == Some(dir) && entry.extension() == Some(OsStr::new(ext))
            }))
        }
    }

    struct FailingProbe;

    impl Probe for FailingProbe {
        fn exists(&self, path: &Path) -> Result<bool> {
            Err(LayoutError::Probe {
                path: path.to_path_buf(),
                source: std::io::Error::other("disk went away"),
            })
        }

        fn has_entry_with_extension(&self, dir: &Path, _ext: &str) -> Result<bool> {
            self.exists(dir)
        }
    }

    fn root_of(start: &str, probe: &MemProbe) -> PathBuf {
        resolve_with(Path::new(start), &RootMarkers::default(), probe)
            .expect("root should resolve")
            .root
    }

    #[test]
    fn project_two_levels_below_root_resolves_two_up() {
        let probe = MemProbe::new(&["/repo/.git"]);
        let layout = resolve_with(Path::new("/repo/src/Foo"), &RootMarkers::default(), &probe)
            .expect("resolve");

        assert_eq!(layout.root, PathBuf::from("/repo"));
        assert_eq!(layout.src_root, PathBuf::from("/repo/src"));
        assert_eq!(layout.bin_root, PathBuf::from("/repo/bin"));
        assert_eq!(layout.obj_root, PathBuf::from("/repo/obj"));
    }

    #[test]
    fn override_marker_beats_markers_further_up() {
        let probe = MemProbe::new(&["/outer/.git", "/outer/inner/src/.RepoSrcRoot"]);
        assert_eq!(root_of("/outer/inner/src/Foo", &probe), PathBuf::from("/outer/inner"));
    }

    #[test]
    fn override_marker_applies_from_nested_project_folders() {
        let probe = MemProbe::new(&["/r/src/.RepoSrcRoot", "/r/src/group/README.md"]);
        assert_eq!(root_of("/r/src/group/Foo", &probe), PathBuf::from("/r"));
    }

    #[test]
    fn project_folder_markers_are_ignored() {
        let probe = MemProbe::new(&["/repo/README.md", "/repo/src/Foo/README.md"]);
        assert_eq!(root_of("/repo/src/Foo", &probe), PathBuf::from("/repo"));
    }

    #[test]
    fn solution_in_src_does_not_become_root() {
        let probe = MemProbe::new(&["/repo/.git", "/repo/src/All.sln"]);
        assert_eq!(root_of("/repo/src/Foo", &probe), PathBuf::from("/repo"));
    }

    #[test]
    fn extension_marker_matches_any_solution_file() {
        let probe = MemProbe::new(&["/repo/Everything.sln"]);
        assert_eq!(root_of("/repo/src/Foo", &probe), PathBuf::from("/repo"));
    }

    #[test]
    fn root_directory_may_itself_be_named_src() {
        let probe = MemProbe::new(&["/work/src/.git"]);
        assert_eq!(root_of("/work/src/src/Foo", &probe), PathBuf::from("/work/src"));
    }

    #[test]
    fn normalize_resolves_dot_components() {
        assert_eq!(
            normalize(Path::new("/R/src/Foo/Properties/..")),
            PathBuf::from("/R/src/Foo")
        );
        assert_eq!(normalize(Path::new("/R/src/./Foo/../Foo")), PathBuf::from("/R/src/Foo"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn nearest_marked_ancestor_wins() {
        let probe = MemProbe::new(&["/a/.git", "/a/b/LICENSE"]);
        assert_eq!(root_of("/a/b/src/Foo", &probe), PathBuf::from("/a/b"));
    }

    #[test]
    fn project_outside_src_is_probed_itself() {
        let probe = MemProbe::new(&["/repo/tools/Foo/.git", "/repo/.git"]);
        assert_eq!(root_of("/repo/tools/Foo", &probe), PathBuf::from("/repo/tools/Foo"));
    }

    #[test]
    fn missing_markers_fail_with_repo_root_not_found() {
        let probe = MemProbe::new(&[]);
        let err = resolve_with(Path::new("/repo/src/Foo"), &RootMarkers::default(), &probe)
            .expect_err("no root");
        match err {
            LayoutError::RepoRootNotFound { start } => {
                assert_eq!(start, PathBuf::from("/repo/src/Foo"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_marker_set_replaces_defaults() {
        let probe = MemProbe::new(&["/a/.git", "/a/b/build.root"]);
        let markers = RootMarkers::new(["build.root"]);
        let layout = resolve_with(Path::new("/a/b/src/Foo"), &markers, &probe).expect("resolve");
        assert_eq!(layout.root, PathBuf::from("/a/b"));

        let only_git = RootMarkers::new([".git"]);
        let layout = resolve_with(Path::new("/a/b/src/Foo"), &only_git, &probe).expect("resolve");
        assert_eq!(layout.root, PathBuf::from("/a"));
    }

    #[test]
    fn custom_override_marker_name_is_honoured() {
        let probe = MemProbe::new(&["/outer/.git", "/outer/inner/src/.root"]);
        let markers = RootMarkers::default().with_override_marker(".root");
        let layout =
            resolve_with(Path::new("/outer/inner/src/Foo"), &markers, &probe).expect("resolve");
        assert_eq!(layout.root, PathBuf::from("/outer/inner"));
    }

    #[test]
    fn probe_errors_propagate() {
        let err = resolve_with(Path::new("/repo/src/Foo"), &RootMarkers::default(), &FailingProbe)
            .expect_err("probe failure");
        assert!(matches!(err, LayoutError::Probe { .. }));
    }

    #[test]
    fn marker_parse_distinguishes_names_and_extensions() {
        assert_eq!(Marker::parse(".git"), Marker::Name(".git".to_string()));
        assert_eq!(Marker::parse("*.sln"), Marker::Extension("sln".to_string()));
        assert_eq!(Marker::parse("*."), Marker::Name("*.".to_string()));
        assert_eq!(Marker::parse("*.sln").to_string(), "*.sln");
    }

    #[test]
    fn resolves_real_directories() {
        let tmp = tempdir().expect("temp dir");
        let root = tmp.path().join("R");
        fs::create_dir_all(root.join(".git")).expect("git dir");
        fs::create_dir_all(root.join("src").join("Foo")).expect("project dir");
        fs::write(root.join("src").join("Foo").join("Foo.csproj"), "<Project />")
            .expect("project file");

        let layout = resolve(&root.join("src").join("Foo")).expect("resolve");
        assert_eq!(layout.root, root);
        assert_eq!(layout.src_root, root.join("src"));
    }

    #[test]
    fn real_override_marker_wins_over_outer_repository() {
        let tmp = tempdir().expect("temp dir");
        let outer = tmp.path().join("outer");
        let inner = outer.join("vendor").join("inner");
        fs::create_dir_all(outer.join(".git")).expect("outer git");
        fs::create_dir_all(inner.join("src").join("Foo")).expect("inner project");
        fs::write(inner.join("src").join(OVERRIDE_MARKER), "").expect("override marker");

        let layout = resolve(&inner.join("src").join("Foo")).expect("resolve");
        assert_eq!(layout.root, inner);
    }

    #[test]
    fn real_repository_cloned_into_src_directory() {
        let tmp = tempdir().expect("temp dir");
        let root = tmp.path().join("work").join("src");
        fs::create_dir_all(root.join(".git")).expect("git dir");
        fs::create_dir_all(root.join("src").join("Foo")).expect("project dir");

        let layout = resolve(&root.join("src").join("Foo")).expect("resolve");
        assert_eq!(layout.root, root);
        assert_eq!(layout.src_root, root.join("src"));
    }

    #[test]
    fn real_solution_file_is_detected() {
        let tmp = tempdir().expect("temp dir");
        let root = tmp.path().join("R");
        fs::create_dir_all(root.join("src").join("Foo")).expect("project dir");
        fs::write(root.join("R.sln"), "").expect("solution");

        let layout = resolve(&root.join("src").join("Foo")).expect("resolve");
        assert_eq!(layout.root, root);
    }
}
