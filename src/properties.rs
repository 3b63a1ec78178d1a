//! Immutable property map standing in for the build engine's evaluation
//! environment. Names are matched case-insensitively, values are kept verbatim.

use std::collections::BTreeMap;

use crate::error::{LayoutError, Result};

/// Properties picked up from the process environment when present.
pub const AMBIENT_KEYS: &[&str] = &["Configuration", "Platform"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    // lowercased name -> (name as written, value)
    values: BTreeMap<String, (String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the ambient properties in the process environment.
    pub fn from_env() -> Self {
        AMBIENT_KEYS
            .iter()
            .filter_map(|key| {
                std::env::var(key)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (key.to_string(), value))
            })
            .fold(Self::new(), |props, (key, value)| props.with(key, value))
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.values
            .insert(name.to_ascii_lowercase(), (name, value.into()));
        self
    }

    /// Later assignments win over earlier ones and over existing values.
    pub fn with_overrides<I>(self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        overrides
            .into_iter()
            .fold(self, |props, (name, value)| props.with(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn is_true(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse a `Name=Value` assignment; the value may be empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(LayoutError::InvalidProperty(raw.to_string()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(LayoutError::InvalidProperty(raw.to_string()));
    }
    Ok((name.to_string(), value.to_string()))
}
