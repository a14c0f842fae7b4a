//! Report assembly
//!
//! Pure post-processing over the issue list produced by the core: severity
//! overrides, code filtering, ordering, truncation and per-severity counts.
//! Nothing here feeds back into validation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::ReportOptions;
use crate::issue::{Issue, Severity};

/// Final report handed to output formatters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub num_errors: usize,
    pub num_warnings: usize,
    pub num_infos: usize,
    pub num_hints: usize,
    /// True when `max_issues` dropped part of the list
    pub truncated: bool,
    pub issues: Vec<Issue>,
}

impl Report {
    /// Shape a raw issue list into a report.
    pub fn build(mut issues: Vec<Issue>, options: &ReportOptions) -> Self {
        for issue in &mut issues {
            if let Some(&severity) = options.severity_overrides.get(&issue.code) {
                issue.severity = severity;
            }
        }
        issues.retain(|issue| !options.ignored.contains(&issue.code));

        if options.sort {
            sort_issues(&mut issues);
        }

        let mut truncated = false;
        if let Some(max) = options.max_issues {
            if issues.len() > max {
                issues.truncate(max);
                truncated = true;
            }
        }

        let mut report = Report {
            truncated,
            ..Default::default()
        };
        for issue in &issues {
            match issue.severity {
                Severity::Error => report.num_errors += 1,
                Severity::Warning => report.num_warnings += 1,
                Severity::Info => report.num_infos += 1,
                Severity::Hint => report.num_hints += 1,
            }
        }
        report.issues = issues;
        report
    }

    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }
}

/// Stable sort by pointer (array indices compared numerically), then offset.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        compare_pointers(&a.pointer, &b.pointer).then_with(|| a.offset.cmp(&b.offset))
    });
}

/// Order two JSON pointers segment by segment.
///
/// Segments that are both decimal integers compare numerically so that
/// `/nodes/2` sorts before `/nodes/10`; a pointer sorts before its children.
pub fn compare_pointers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('/');
    let mut right = b.split('/');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
