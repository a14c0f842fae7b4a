//! Report rendering

use anyhow::Result;
use clap::ValueEnum;
use gltf_audit::Report;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per issue followed by a summary
    #[default]
    Text,
    /// The full report as pretty-printed JSON
    Json,
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for issue in &report.issues {
        let _ = writeln!(out, "{issue}");
    }
    if report.truncated {
        out.push_str("(issue list truncated)\n");
    }
    let _ = writeln!(
        out,
        "Errors: {}, Warnings: {}, Infos: {}, Hints: {}",
        report.num_errors, report.num_warnings, report.num_infos, report.num_hints
    );
    out
}
