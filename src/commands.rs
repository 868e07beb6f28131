use crate::cli::{OutputType, ReportFormat};
use anyhow::Context;
use indexmap::IndexMap;
use prefset::{PrefValue, PreferenceEntry, PreferenceSet, Schema, ValidationResult};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Entry representation for JSON array output
#[derive(Debug, Serialize)]
pub struct ConfigEntry<'a> {
    pub key: &'a str,
    pub value: &'a PrefValue,
    pub function: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    path: &'a Path,
    entries: usize,
    warnings: usize,
    errors: usize,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

/// Validate a preference file and print the findings
pub fn validate(
    path: &Path,
    schema_path: Option<&Path>,
    deny_warnings: bool,
    output: ReportFormat,
) -> anyhow::Result<ExitCode> {
    let schema = load_schema(schema_path)?;
    let set = load_set(path)?;
    let result = prefset::validate(&set, &schema);

    match output {
        ReportFormat::Text => print!("{}", render_text_report(path, &set, &result)),
        ReportFormat::Json => println!("{}", render_json_report(path, &set, &result)?),
    }

    let failed = result.has_errors() || (deny_warnings && result.has_warnings());
    if failed {
        tracing::info!(path = %path.display(), "validation failed");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Normalize a preference file in place, or check/print it
pub fn format(path: &Path, sort: bool, check: bool, stdout: bool) -> anyhow::Result<ExitCode> {
    let original = read_file(path)?;
    let mut set = prefset::load(&original)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if sort {
        set.sort_by_key();
    }
    let formatted = prefset::serialize(&set);

    if check {
        if formatted != original {
            println!("{} is not formatted", path.display());
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if stdout {
        print!("{}", formatted);
        return Ok(ExitCode::SUCCESS);
    }

    if formatted == original {
        tracing::info!(path = %path.display(), "already formatted");
        return Ok(ExitCode::SUCCESS);
    }

    prefset::write_file(path, &set)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), entries = set.len(), "formatted");
    Ok(ExitCode::SUCCESS)
}

/// Print entries whose keys match any of `patterns`
pub fn query(
    path: &Path,
    patterns: &[String],
    schema_path: Option<&Path>,
    output_type: OutputType,
) -> anyhow::Result<ExitCode> {
    let schema = load_schema(schema_path)?;
    let set = load_set(path)?;
    let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();

    let matched = prefset::query_preferences(&set, &patterns)
        .map_err(|e| anyhow::anyhow!("Failed to apply query: {}", e))?;

    let json = render_query(&matched, &schema, output_type)?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

fn load_schema(schema_path: Option<&Path>) -> anyhow::Result<Schema> {
    Schema::with_extension(schema_path).with_context(|| match schema_path {
        Some(p) => format!("Failed to load schema {}", p.display()),
        None => "Failed to load built-in schema".to_string(),
    })
}

fn load_set(path: &Path) -> anyhow::Result<PreferenceSet> {
    prefset::load_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| prefset::Error::from_io(path, e))
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Matched entries as a key/value object or an array with explanations
fn render_query(
    matched: &[&PreferenceEntry],
    schema: &Schema,
    output_type: OutputType,
) -> serde_json::Result<String> {
    match output_type {
        OutputType::JsonObject => {
            let object: IndexMap<&str, &PrefValue> = matched
                .iter()
                .map(|entry| (entry.key.as_str(), &entry.value))
                .collect();
            serde_json::to_string_pretty(&object)
        }
        OutputType::JsonArray => {
            let array: Vec<ConfigEntry> = matched
                .iter()
                .map(|entry| ConfigEntry {
                    key: &entry.key,
                    value: &entry.value,
                    function: entry.function.as_str(),
                    explanation: schema.description(&entry.key),
                })
                .collect();
            serde_json::to_string_pretty(&array)
        }
    }
}

fn render_json_report(
    path: &Path,
    set: &PreferenceSet,
    result: &ValidationResult,
) -> serde_json::Result<String> {
    let report = ValidationReport {
        path,
        entries: set.len(),
        warnings: result.warnings().count(),
        errors: result.errors().count(),
        result,
    };
    serde_json::to_string_pretty(&report)
}

/// Human-readable report: one line per finding, then a summary
fn render_text_report(path: &Path, set: &PreferenceSet, result: &ValidationResult) -> String {
    let mut report = String::new();
    for finding in result.findings() {
        report.push_str(&format!("{}:{}\n", path.display(), finding));
    }

    let warnings = result.warnings().count();
    let errors = result.errors().count();
    report.push_str(&format!(
        "{}: {} {}, {} {}, {} {}\n",
        path.display(),
        set.len(),
        plural(set.len(), "entry", "entries"),
        warnings,
        plural(warnings, "warning", "warnings"),
        errors,
        plural(errors, "error", "errors"),
    ));
    report
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_report() {
        let set = prefset::load(
            "set(\"foo.bar.baz\", 1);\nset(\"dom.battery.enabled\", 0);",
        )
        .unwrap();
        let result = prefset::validate(&set, Schema::builtin());
        let report = render_text_report(Path::new("user.js"), &set, &result);
        assert_eq!(
            report,
            "user.js:line 1: warning: foo.bar.baz: key is not in the known schema\n\
             user.js:line 2: error: dom.battery.enabled: expected boolean, found integer 0\n\
             user.js: 2 entries, 1 warning, 1 error\n"
        );
    }

    #[test]
    fn test_json_report_shape() {
        let set = prefset::load("set(\"foo.bar.baz\", 1);\nset(\"geo.enabled\", 0);").unwrap();
        let result = prefset::validate(&set, Schema::builtin());
        let json = render_json_report(Path::new("user.js"), &set, &result).unwrap();

        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            report,
            serde_json::json!({
                "path": "user.js",
                "entries": 2,
                "warnings": 1,
                "errors": 1,
                "findings": [
                    {
                        "severity": "warning",
                        "kind": "unknown_key",
                        "key": "foo.bar.baz",
                        "line": 1,
                        "message": "key is not in the known schema"
                    },
                    {
                        "severity": "error",
                        "kind": "type_mismatch",
                        "key": "geo.enabled",
                        "line": 2,
                        "message": "expected boolean, found integer 0"
                    }
                ]
            })
        );
    }

    fn query_fixture() -> (PreferenceSet, Schema) {
        let set = prefset::load(
            "user_pref(\"z.described\", true);\nset(\"a.plain\", \"x\");\nset(\"other.key\", 1);",
        )
        .unwrap();
        let mut schema = Schema::new();
        schema.insert("z.described", prefset::ValueKind::Bool, Some("Has a description"));
        (set, schema)
    }

    #[test]
    fn test_query_json_object_keeps_file_order() {
        let (set, schema) = query_fixture();
        let matched = prefset::query_preferences(&set, &["z.*", "a.*"]).unwrap();
        let json = render_query(&matched, &schema, OutputType::JsonObject).unwrap();

        assert_eq!(json, "{\n  \"z.described\": true,\n  \"a.plain\": \"x\"\n}");
    }

    #[test]
    fn test_query_json_array_includes_explanation() {
        let (set, schema) = query_fixture();
        let matched = prefset::query_preferences(&set, &["z.*", "a.*"]).unwrap();
        let json = render_query(&matched, &schema, OutputType::JsonArray).unwrap();

        let array: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            array,
            serde_json::json!([
                {
                    "key": "z.described",
                    "value": true,
                    "function": "user_pref",
                    "explanation": "Has a description"
                },
                {
                    "key": "a.plain",
                    "value": "x",
                    "function": "set"
                }
            ])
        );
    }

    #[test]
    fn test_format_missing_file_is_not_found() {
        let err = format(Path::new("/nonexistent/user.js"), false, false, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<prefset::Error>(),
            Some(prefset::Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_validate_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.js");
        let bad = dir.path().join("bad.js");
        let unknown = dir.path().join("unknown.js");
        std::fs::write(&good, "set(\"geo.enabled\", false);\n").unwrap();
        std::fs::write(&bad, "set(\"geo.enabled\", 1);\n").unwrap();
        std::fs::write(&unknown, "set(\"foo.bar.baz\", 1);\n").unwrap();

        let run = |p: &Path, deny| validate(p, None, deny, ReportFormat::Json).unwrap();
        assert_eq!(run(&good, false), ExitCode::SUCCESS);
        assert_eq!(run(&bad, false), ExitCode::FAILURE);
        assert_eq!(run(&unknown, false), ExitCode::SUCCESS);
        assert_eq!(run(&unknown, true), ExitCode::FAILURE);
    }

    #[test]
    fn test_validate_missing_file_is_error() {
        let err = validate(Path::new("/nonexistent/user.js"), None, false, ReportFormat::Text)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<prefset::Error>(),
            Some(prefset::Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_format_rewrites_and_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.js");
        std::fs::write(&path, "set( \"b.b\",1 );set(\"a.a\", true);").unwrap();

        assert_eq!(format(&path, false, true, false).unwrap(), ExitCode::FAILURE);
        assert_eq!(format(&path, true, false, false).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "set(\"a.a\", true);\nset(\"b.b\", 1);\n"
        );
        assert_eq!(format(&path, true, true, false).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_query_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.js");
        std::fs::write(&path, "set(\"a.b\", 1);").unwrap();
        let patterns = vec!["[oops".to_string()];
        assert!(query(&path, &patterns, None, OutputType::JsonObject).is_err());
    }
}
