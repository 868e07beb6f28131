//! Validation of a preference set against a [`Schema`]
//!
//! Validation never fails as an operation. Every problem is reported as a
//! [`Finding`]:
//!
//! - unknown key: warning, since the browser defines far more preferences than
//!   any schema lists
//! - malformed namespace path: warning
//! - key set more than once: warning (the last value is the one that applies)
//! - wrong value type, integer out of range, string outside the allowed set:
//!   error

use crate::schema::{Schema, ValueKind};
use crate::types::{PrefValue, PreferenceEntry, PreferenceSet};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    UnknownKey,
    MalformedKey,
    Overridden,
    TypeMismatch,
    OutOfRange,
    NotAllowed,
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::UnknownKey | FindingKind::MalformedKey | FindingKind::Overridden => {
                Severity::Warning
            }
            FindingKind::TypeMismatch | FindingKind::OutOfRange | FindingKind::NotAllowed => {
                Severity::Error
            }
        }
    }
}

/// One validation problem tied to a key and source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub key: String,
    pub line: usize,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, entry: &PreferenceEntry, message: String) -> Self {
        Finding {
            severity: kind.severity(),
            kind,
            key: entry.key.clone(),
            line: entry.line,
            message,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {}: {}: {}",
            self.line, self.severity, self.key, self.message
        )
    }
}

/// All findings of one validation run, ordered by source line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    findings: Vec<Finding>,
}

impl ValidationResult {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.by_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.by_severity(Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }
}

/// Check every entry of `set` against `schema`
///
/// # Example
///
/// ```rust
/// use prefset::{load, validate, Schema};
///
/// let set = load(r#"set("foo.bar.baz", 1);"#)?;
/// let result = validate(&set, Schema::builtin());
/// assert_eq!(result.warnings().count(), 1);
/// assert!(!result.has_errors());
/// # Ok::<(), prefset::Error>(())
/// ```
pub fn validate(set: &PreferenceSet, schema: &Schema) -> ValidationResult {
    let mut findings = Vec::new();

    for entry in set.iter() {
        if let Some(problem) = check_key_shape(&entry.key) {
            findings.push(Finding::new(
                FindingKind::MalformedKey,
                entry,
                problem.to_string(),
            ));
        }

        match schema.get(&entry.key) {
            None => findings.push(Finding::new(
                FindingKind::UnknownKey,
                entry,
                "key is not in the known schema".to_string(),
            )),
            Some(known) => {
                if let Some((kind, message)) = check_value(&known.kind, &entry.value) {
                    findings.push(Finding::new(kind, entry, message));
                }
            }
        }
    }

    for overridden in set.overrides() {
        findings.push(Finding {
            severity: FindingKind::Overridden.severity(),
            kind: FindingKind::Overridden,
            key: overridden.key.clone(),
            line: overridden.line,
            message: format!(
                "overrides the value set on line {}",
                overridden.first_line
            ),
        });
    }

    findings.sort_by_key(|f| f.line);

    let result = ValidationResult { findings };
    tracing::debug!(
        entries = set.len(),
        warnings = result.warnings().count(),
        errors = result.errors().count(),
        "validation finished"
    );
    result
}

fn check_key_shape(key: &str) -> Option<&'static str> {
    if key.is_empty() {
        Some("key is empty")
    } else if key.chars().any(char::is_whitespace) {
        Some("key contains whitespace")
    } else if key.split('.').any(str::is_empty) {
        Some("key has an empty namespace segment")
    } else {
        None
    }
}

fn check_value(expected: &ValueKind, value: &PrefValue) -> Option<(FindingKind, String)> {
    match (expected, value) {
        (ValueKind::Bool, PrefValue::Bool(_)) => None,
        (ValueKind::Integer { min, max }, PrefValue::Integer(n)) => {
            let below = min.is_some_and(|min| *n < min);
            let above = max.is_some_and(|max| *n > max);
            if below || above {
                Some((
                    FindingKind::OutOfRange,
                    format!("value {} is outside {}", n, describe_range(*min, *max)),
                ))
            } else {
                None
            }
        }
        (ValueKind::String { allowed }, PrefValue::String(s)) => {
            if allowed.is_empty() || allowed.iter().any(|a| a == s) {
                None
            } else {
                Some((
                    FindingKind::NotAllowed,
                    format!("\"{}\" is not one of: {}", s, allowed.join(", ")),
                ))
            }
        }
        (expected, value) => Some((
            FindingKind::TypeMismatch,
            format!(
                "expected {}, found {} {}",
                expected.type_name(),
                value.type_name(),
                value
            ),
        )),
    }
}

fn describe_range(min: Option<i64>, max: Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}
