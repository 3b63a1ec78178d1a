use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::layout::RootMarkers;
use crate::paths::ContextDefaults;

const CONFIG_CANDIDATES: &[(&str, ConfigFormat)] = &[
    ("repo-layout.yml", ConfigFormat::Yaml),
    ("repo-layout.yaml", ConfigFormat::Yaml),
    ("repo-layout.toml", ConfigFormat::Toml),
];

#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub path: PathBuf,
    pub data: Settings,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Ordered root markers; replaces the built-in list when set.
    pub markers: Option<Vec<String>>,
    pub override_marker: Option<String>,
    pub default_configuration: Option<String>,
    pub target_extension: Option<String>,
    pub documentation_extension: Option<String>,
}

impl Settings {
    pub fn root_markers(&self) -> RootMarkers {
        let markers = match &self.markers {
            Some(markers) => RootMarkers::new(markers),
            None => RootMarkers::default(),
        };
        match &self.override_marker {
            Some(name) => markers.with_override_marker(name.as_str()),
            None => markers,
        }
    }

    pub fn context_defaults(&self) -> ContextDefaults {
        let mut defaults = ContextDefaults::default();
        if let Some(configuration) = &self.default_configuration {
            defaults.configuration = configuration.clone();
        }
        if let Some(ext) = &self.target_extension {
            defaults.target_extension = ext.clone();
        }
        if let Some(ext) = &self.documentation_extension {
            defaults.documentation_extension = ext.clone();
        }
        defaults
    }
}

pub fn load_settings() -> Result<Option<LoadedSettings>> {
    let current_dir = std::env::current_dir().context("resolving current directory for config")?;
    load_settings_from_dir(&current_dir)
}

pub fn load_settings_from_dir(base_dir: &Path) -> Result<Option<LoadedSettings>> {
    for (file, format) in CONFIG_CANDIDATES {
        let path = base_dir.join(file);
        if !path.exists() {
            continue;
        }
        return load_settings_file(&path, *format).map(Some);
    }
    Ok(None)
}

/// Load an explicitly named config file; the format follows the extension.
pub fn load_settings_from_path(path: &Path) -> Result<LoadedSettings> {
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!(
            "unsupported config file {} (expected .yml, .yaml or .toml)",
            path.display()
        );
    };
    load_settings_file(path, format)
}

fn load_settings_file(path: &Path, format: ConfigFormat) -> Result<LoadedSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    let data = match format {
        ConfigFormat::Yaml => parse_yaml_str(&content)
            .with_context(|| format!("parsing YAML config at {}", path.display()))?,
        ConfigFormat::Toml => parse_toml_str(&content)
            .with_context(|| format!("parsing TOML config at {}", path.display()))?,
    };
    Ok(LoadedSettings {
        path: path.to_path_buf(),
        data,
    })
}

pub(crate) fn parse_yaml_str(content: &str) -> Result<Settings> {
    // an empty YAML document deserializes as unit, not as an empty map
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub(crate) fn parse_toml_str(content: &str) -> Result<Settings> {
    Ok(toml::from_str(content)?)
}
