//! Core data model: preference values, entries and the ordered preference set

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A preference value as written in a directive
///
/// The browser only stores booleans, 32-bit integers and strings, so those are
/// the only literals a directive may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl PrefValue {
    /// Human readable type name used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "boolean",
            PrefValue::Integer(_) => "integer",
            PrefValue::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Writes the value as a directive literal (strings quoted and escaped)
impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Integer(n) => write!(f, "{}", n),
            PrefValue::String(s) => write!(f, "\"{}\"", crate::serializer::escape_string(s)),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<i64> for PrefValue {
    fn from(n: i64) -> Self {
        PrefValue::Integer(n)
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::String(s.to_string())
    }
}

/// Directive function name
///
/// `set` is the tool's canonical form. The browser's own spellings are
/// accepted too and preserved on output so an existing `user.js` keeps its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrefFunction {
    #[default]
    Set,
    UserPref,
    Pref,
    LockPref,
    StickyPref,
}

impl PrefFunction {
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "set" => Some(PrefFunction::Set),
            "user_pref" => Some(PrefFunction::UserPref),
            "pref" => Some(PrefFunction::Pref),
            "lock_pref" => Some(PrefFunction::LockPref),
            "sticky_pref" => Some(PrefFunction::StickyPref),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrefFunction::Set => "set",
            PrefFunction::UserPref => "user_pref",
            PrefFunction::Pref => "pref",
            PrefFunction::LockPref => "lock_pref",
            PrefFunction::StickyPref => "sticky_pref",
        }
    }
}

/// One line of a comment block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentLine {
    /// `//` comment, text after the slashes kept verbatim
    Line(String),
    /// `/* */` comment, inner text kept verbatim
    Block(String),
    /// Blank line separating comment groups
    Blank,
}

/// Comment lines collected above a directive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    pub lines: Vec<CommentLine>,
}

impl Comment {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop trailing blank separators
    pub(crate) fn trim_end(&mut self) {
        while matches!(self.lines.last(), Some(CommentLine::Blank)) {
            self.lines.pop();
        }
    }

    /// Comment text with markers removed, one line per entry
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                CommentLine::Line(s) | CommentLine::Block(s) => s.trim(),
                CommentLine::Blank => "",
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single preference directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceEntry {
    /// Dot-delimited namespace path, e.g. `privacy.resistFingerprinting`
    pub key: String,
    pub value: PrefValue,
    pub function: PrefFunction,
    /// Comment block directly above the directive
    pub comment: Option<Comment>,
    /// `//` comment after the `;` on the same line
    pub trailing_comment: Option<String>,
    /// 1-based source line, 0 for entries built in code
    pub line: usize,
}

impl PreferenceEntry {
    pub fn new(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        PreferenceEntry {
            key: key.into(),
            value: value.into(),
            function: PrefFunction::default(),
            comment: None,
            trailing_comment: None,
            line: 0,
        }
    }

    pub fn with_comment(mut self, text: &str) -> Self {
        self.comment = Some(Comment {
            lines: text
                .lines()
                .map(|l| CommentLine::Line(format!(" {}", l)))
                .collect(),
        });
        self
    }
}

/// A key that was set more than once; the later directive won
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    pub key: String,
    pub first_line: usize,
    pub line: usize,
}

/// Ordered, key-unique collection of preference entries
///
/// Insertion order is preserved. Inserting a key that already exists removes
/// the earlier entry and appends the new one (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSet {
    entries: IndexMap<String, PreferenceEntry>,
    /// Comments after the last directive
    pub trailing_comment: Option<Comment>,
    overrides: Vec<Override>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced
    ///
    /// A replaced entry's comment block moves to the entry that followed it,
    /// or to `entry` when nothing did, so section headers are not lost.
    pub fn insert(&mut self, mut entry: PreferenceEntry) -> Option<PreferenceEntry> {
        let previous = self.entries.shift_remove_full(&entry.key);
        if let Some((index, _, prev)) = &previous {
            tracing::debug!(
                key = %entry.key,
                first_line = prev.line,
                line = entry.line,
                "preference set more than once, keeping the last value"
            );
            self.overrides.push(Override {
                key: entry.key.clone(),
                first_line: prev.line,
                line: entry.line,
            });

            if let Some(orphan) = prev.comment.as_ref().filter(|c| !c.is_empty()) {
                let heir = match self.entries.get_index_mut(*index) {
                    Some((_, next)) => next,
                    None => &mut entry,
                };
                heir.comment = Some(match heir.comment.take().filter(|c| !c.is_empty()) {
                    Some(own) => {
                        let mut lines = orphan.lines.clone();
                        lines.push(CommentLine::Blank);
                        lines.extend(own.lines);
                        Comment { lines }
                    }
                    None => orphan.clone(),
                });
            }
        }
        self.entries.insert(entry.key.clone(), entry);
        previous.map(|(_, _, prev)| prev)
    }

    pub fn get(&self, key: &str) -> Option<&PreferenceEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreferenceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that were overridden during loading, in the order they occurred
    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    /// Reorder entries by key; comments travel with their entries
    pub fn sort_by_key(&mut self) {
        self.entries.sort_keys();
    }

    pub fn into_entries(self) -> Vec<PreferenceEntry> {
        self.entries.into_values().collect()
    }
}

impl FromIterator<PreferenceEntry> for PreferenceSet {
    fn from_iter<I: IntoIterator<Item = PreferenceEntry>>(iter: I) -> Self {
        let mut set = PreferenceSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}
