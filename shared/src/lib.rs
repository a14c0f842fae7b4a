//! Shared types for gltf-audit.
//!
//! This crate holds the output contract shared between the validator core and
//! the command-line front end:
//!
//! - [`issue`] - diagnostic records ([`Issue`], [`IssueCode`], [`Severity`])
//! - [`config`] - TOML configuration ([`ReportConfig`], [`ValidationOptions`])
//! - [`report`] - post-processing of the issue list into a [`Report`]

pub mod config;
pub mod issue;
pub mod report;

pub use config::{ConfigError, ReportConfig, ReportOptions, ValidationOptions};
pub use issue::{Issue, IssueCode, Severity, UnknownIssueCode};
pub use report::{Report, compare_pointers, sort_issues};
