//! Rendering of evaluations for the CLI.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::layout::RepositoryLayout;
use crate::paths::Evaluation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `Name=Value` lines
    #[default]
    Text,
    Json,
    /// A `<Project>` fragment with one property group per project
    Msbuild,
}

pub fn render(evaluations: &[Evaluation], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(evaluations)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(evaluations).context("serializing evaluations to JSON")
        }
        OutputFormat::Msbuild => Ok(render_msbuild(evaluations)),
    }
}

pub fn render_layout(layout: &RepositoryLayout, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(layout
            .properties()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(layout).context("serializing layout to JSON")
        }
        OutputFormat::Msbuild => {
            let mut out = String::from("<Project>\n  <PropertyGroup>\n");
            for (name, value) in layout.properties() {
                let _ = writeln!(out, "    <{name}>{}</{name}>", escape_xml(&value));
            }
            out.push_str("  </PropertyGroup>\n</Project>\n");
            Ok(out)
        }
    }
}

fn render_text(evaluations: &[Evaluation]) -> String {
    let mut out = String::new();
    for (idx, eval) in evaluations.iter().enumerate() {
        if evaluations.len() > 1 {
            if idx > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", eval.context.project_directory.display());
        }
        for (name, value) in eval.properties().into_iter().chain(eval.items()) {
            let _ = writeln!(out, "{name}={value}");
        }
    }
    out
}

fn render_msbuild(evaluations: &[Evaluation]) -> String {
    let mut out = String::from("<Project>\n");
    for eval in evaluations {
        let condition = if evaluations.len() > 1 {
            format!(
                " Condition=\"'$(MSBuildProjectDirectory)' == '{}'\"",
                escape_xml(&eval.context.project_directory.display().to_string())
            )
        } else {
            String::new()
        };

        let _ = writeln!(out, "  <PropertyGroup{condition}>");
        for (name, value) in eval.properties() {
            let _ = writeln!(out, "    <{name}>{}</{name}>", escape_xml(&value));
        }
        out.push_str("  </PropertyGroup>\n");

        let _ = writeln!(out, "  <ItemGroup{condition}>");
        for (name, value) in eval.items() {
            let _ = writeln!(out, "    <{name} Include=\"{}\" />", escape_xml(&value));
        }
        out.push_str("  </ItemGroup>\n");
    }
    out.push_str("</Project>\n");
    out
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
