//! Writing a preference set back out as directive text
//!
//! Output layout:
//!
//! ```text
//! // Comment block attached to the first entry
//! user_pref("first.key", true);
//! set("second.key", 1); // trailing comment
//!
//! // Every commented entry after the first gets a blank line above it
//! set("third.key", "value");
//! ```
//!
//! Entries keep their insertion order and directive function. Output ends with
//! a single newline, or is empty for an empty set.

use crate::error::{Error, Result};
use crate::parser::load;
use crate::types::{Comment, CommentLine, PreferenceEntry, PreferenceSet};
use std::io::Write;
use std::path::Path;

/// Render `set` in normalized form
///
/// # Example
///
/// ```rust
/// use prefset::{load, serialize};
///
/// let text = "// Disable battery API\nset(\"dom.battery.enabled\",false) ;";
/// assert_eq!(
///     serialize(&load(text)?),
///     "// Disable battery API\nset(\"dom.battery.enabled\", false);\n"
/// );
/// # Ok::<(), prefset::Error>(())
/// ```
pub fn serialize(set: &PreferenceSet) -> String {
    let mut out = String::new();

    for (index, entry) in set.iter().enumerate() {
        if let Some(comment) = entry.comment.as_ref().filter(|c| !c.is_empty()) {
            if index > 0 {
                out.push('\n');
            }
            write_comment(&mut out, comment);
        }
        write_directive(&mut out, entry);
    }

    if let Some(comment) = set.trailing_comment.as_ref().filter(|c| !c.is_empty()) {
        if !set.is_empty() {
            out.push('\n');
        }
        write_comment(&mut out, comment);
    }

    out
}

/// Load `content` and render it normalized, optionally sorted by key
pub fn normalize(content: &str, sort: bool) -> Result<String> {
    let mut set = load(content)?;
    if sort {
        set.sort_by_key();
    }
    Ok(serialize(&set))
}

/// Replace the file at `path` with the serialized `set`
///
/// The text goes to a temporary file in the target's directory first and is
/// then renamed over the target, so readers never see a half-written file.
/// An existing target keeps its permissions, and a symlinked `path` keeps
/// pointing at the rewritten file.
pub fn write_file(path: &Path, set: &PreferenceSet) -> Result<()> {
    let target = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(Error::from_io(path, e)),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(serialize(set).as_bytes())?;
    if let Ok(metadata) = std::fs::metadata(&target) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %target.display(), entries = set.len(), "wrote preference file");
    Ok(())
}

fn write_comment(out: &mut String, comment: &Comment) {
    for line in &comment.lines {
        match line {
            CommentLine::Line(text) => {
                out.push_str("//");
                out.push_str(text);
            }
            CommentLine::Block(text) => {
                out.push_str("/*");
                out.push_str(text);
                out.push_str("*/");
            }
            CommentLine::Blank => {}
        }
        out.push('\n');
    }
}

fn write_directive(out: &mut String, entry: &PreferenceEntry) {
    out.push_str(&format!(
        "{}(\"{}\", {});",
        entry.function.as_str(),
        escape_string(&entry.key),
        entry.value
    ));
    if let Some(text) = &entry.trailing_comment {
        out.push_str(" //");
        out.push_str(text);
    }
    out.push('\n');
}

/// Escape a string for use inside a double-quoted literal
pub(crate) fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\x08' => escaped.push_str("\\b"),
            '\x0c' => escaped.push_str("\\f"),
            c if c.is_ascii_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load_file;
    use crate::types::{PrefFunction, PreferenceEntry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize(&PreferenceSet::new()), "");
    }

    #[test]
    fn test_serialize_normalizes_spacing() {
        let set = load("set( \"a.b\" ,true ) ;\n\n\nset(\"c.d\",  -3);").unwrap();
        assert_eq!(serialize(&set), "set(\"a.b\", true);\nset(\"c.d\", -3);\n");
    }

    #[test]
    fn test_serialize_comments_above_entries() {
        let input = "\
// Strict tracking protection
user_pref(\"privacy.trackingprotection.enabled\", true);
user_pref(\"privacy.trackingprotection.socialtracking.enabled\", true);

// HTTPS-only mode
user_pref(\"dom.security.https_only_mode\", true);
";
        assert_eq!(serialize(&load(input).unwrap()), input);
    }

    #[test]
    fn test_serialize_detached_comment_block() {
        let input = "\
set(\"a.b\", 1);

// Keep WebRTC enabled
// set(\"media.peerconnection.enabled\", false);

// Disable battery API
set(\"dom.battery.enabled\", false);
";
        assert_eq!(serialize(&load(input).unwrap()), input);
    }

    #[test]
    fn test_serialize_trailing_and_block_comments() {
        let input = "\
/* header */
set(\"a.b\", 1); // one

// footer
";
        assert_eq!(serialize(&load(input).unwrap()), input);
    }

    #[test]
    fn test_serialize_duplicate_key_once() {
        let set = load("set(\"a.b\", 1);\nset(\"a.b\", 2);").unwrap();
        assert_eq!(serialize(&set), "set(\"a.b\", 2);\n");
    }

    #[test]
    fn test_serialize_escapes_strings() {
        let mut set = PreferenceSet::new();
        let mut entry = PreferenceEntry::new("s.k", "tab\there \"q\" \\ \x01");
        entry.function = PrefFunction::UserPref;
        set.insert(entry);

        let text = serialize(&set);
        assert_eq!(
            text,
            "user_pref(\"s.k\", \"tab\\there \\\"q\\\" \\\\ \\x01\");\n"
        );
        assert_eq!(
            load(&text).unwrap().get("s.k").unwrap().value,
            set.get("s.k").unwrap().value
        );
    }

    #[test]
    fn test_normalize_sorted() {
        let text = normalize("set(\"b.b\", 1);\n// first\nset(\"a.a\", 2);", true).unwrap();
        assert_eq!(text, "// first\nset(\"a.a\", 2);\nset(\"b.b\", 1);\n");
    }

    #[test]
    fn test_normalize_propagates_parse_error() {
        assert!(matches!(
            normalize("set(\"a\" 1);", false),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_write_file_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.js");
        std::fs::write(&path, "old content").unwrap();

        let set = load("set(\"geo.enabled\", false);").unwrap();
        write_file(&path, &set).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "set(\"geo.enabled\", false);\n"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_file_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.js");
        std::fs::write(&path, "set(\"geo.enabled\",true);").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let set = load_file(&path).unwrap();
        write_file(&path, &set).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_file_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.js");
        let link = dir.path().join("user.js");
        std::fs::write(&real, "set(\"geo.enabled\",true);").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let set = load_file(&link).unwrap();
        write_file(&link, &set).unwrap();

        assert!(std::fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(
            std::fs::read_to_string(&real).unwrap(),
            "set(\"geo.enabled\", true);\n"
        );
    }

    #[test]
    fn test_serialize_keeps_header_of_overridden_entry() {
        let set = load("// Section header\nset(\"a.a\",1);\nset(\"b.b\",2);\nset(\"a.a\",3);")
            .unwrap();
        assert_eq!(
            serialize(&set),
            "// Section header\nset(\"b.b\", 2);\nset(\"a.a\", 3);\n"
        );
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let input = "// c\nset( \"x.y\",'single' );set(\"z.w\", false); //t\n/* end */";
        let once = serialize(&load(input).unwrap());
        let twice = serialize(&load(&once).unwrap());
        assert_eq!(once, twice);
    }
}
