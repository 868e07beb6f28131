//! # prefset - Preference Set Loader/Validator
//!
//! This library loads, validates and normalizes browser preference files
//! (`user.js` style). The browser reads such a file at startup and applies
//! each directive to its preference store. This crate only deals with the
//! file itself: it never talks to a browser.
//!
//! ## Features
//!
//! - Parse `set("key", value);` directives, plus the browser's own
//!   `user_pref`/`pref`/`lock_pref`/`sticky_pref` spellings
//! - Keep comments attached to the directive below them, so files survive a
//!   load/serialize round trip
//! - Last-write-wins semantics for repeated keys, with every override recorded
//! - Validate keys and value types against a built-in schema of privacy,
//!   telemetry and networking preferences, extensible from a TOML file
//! - Query preferences using glob patterns (e.g., `"network.*"`)
//!
//! ## Quick Start
//!
//! ### Loading Preferences
//!
//! ```rust
//! use prefset::{load, PrefValue};
//!
//! let content = r#"
//!     // Disable battery API
//!     set("dom.battery.enabled", false);
//!     user_pref("network.cookie.cookieBehavior", 5);
//! "#;
//!
//! let set = load(content)?;
//! assert_eq!(set.len(), 2);
//! assert_eq!(
//!     set.get("dom.battery.enabled").unwrap().value,
//!     PrefValue::Bool(false)
//! );
//! # Ok::<(), prefset::Error>(())
//! ```
//!
//! ### Validating Against the Schema
//!
//! ```rust
//! use prefset::{load, validate, FindingKind, Schema};
//!
//! let set = load(r#"
//!     set("dom.battery.enabled", "off");
//!     set("foo.bar.baz", 1);
//! "#)?;
//!
//! let result = validate(&set, Schema::builtin());
//! assert_eq!(result.errors().count(), 1);   // wrong type for a known key
//! assert_eq!(result.warnings().count(), 1); // unknown key
//! assert_eq!(result.errors().next().unwrap().kind, FindingKind::TypeMismatch);
//! # Ok::<(), prefset::Error>(())
//! ```
//!
//! ### Writing Normalized Output
//!
//! ```rust
//! use prefset::{load, serialize};
//!
//! let set = load("set( \"geo.enabled\",false );")?;
//! assert_eq!(serialize(&set), "set(\"geo.enabled\", false);\n");
//! # Ok::<(), prefset::Error>(())
//! ```
//!
//! ### Querying Preferences
//!
//! ```rust
//! use prefset::{load, query_preferences};
//!
//! let set = load(r#"
//!     set("network.dns.disablePrefetch", true);
//!     set("network.prefetch-next", false);
//!     set("geo.enabled", false);
//! "#)?;
//!
//! let network = query_preferences(&set, &["network.*"])?;
//! assert_eq!(network.len(), 2);
//! # Ok::<(), prefset::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Loading returns [`Result<T, Error>`]. A malformed directive aborts the
//! file with [`Error::Parse`]:
//!
//! ```rust
//! use prefset::{load, Error};
//!
//! match load("set(dom.battery.enabled false)") {
//!     Ok(_) => unreachable!(),
//!     Err(Error::Parse { line, column, message }) => {
//!         eprintln!("Parse error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```
//!
//! Validation findings are data, not errors; see [`ValidationResult`].

// Re-export all public types at crate root
pub use types::{
    Comment, CommentLine, Override, PrefFunction, PrefValue, PreferenceEntry, PreferenceSet,
};

// Re-export error types
pub use error::{Error, Result};

// Re-export schema and validation types
pub use schema::{Schema, SchemaEntry, ValueKind};
pub use validator::{validate, Finding, FindingKind, Severity, ValidationResult};

// Re-export all public functions at crate root
pub use parser::{load, load_file};
pub use query::query_preferences;
pub use serializer::{normalize, serialize, write_file};

// All modules are private - use re-exports above for public API
mod error;
mod lexer;
mod parser;
mod query;
mod schema;
mod serializer;
mod types;
mod validator;
