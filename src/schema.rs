//! Preference schema: the table of known keys and their expected value types
//!
//! A built-in table covers the privacy, telemetry and networking preferences of
//! a hardened developer profile. It is built once and cached in a static
//! [`OnceLock`]. Additional keys can be described in a TOML file and merged over
//! the built-in table:
//!
//! ```toml
//! [prefs."network.cookie.cookieBehavior"]
//! type = "integer"
//! min = 0
//! max = 5
//! description = "Cookie policy; 5 partitions third-party storage."
//!
//! [prefs."browser.contentblocking.category"]
//! type = "string"
//! allowed = ["standard", "strict", "custom"]
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

/// Expected type of a preference value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    /// Integer, optionally bounded (inclusive)
    Integer { min: Option<i64>, max: Option<i64> },
    /// String, optionally restricted to an enumeration; empty means any
    String { allowed: Vec<String> },
}

impl ValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "boolean",
            ValueKind::Integer { .. } => "integer",
            ValueKind::String { .. } => "string",
        }
    }

    fn integer(min: i64, max: i64) -> Self {
        ValueKind::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    fn any_string() -> Self {
        ValueKind::String {
            allowed: Vec::new(),
        }
    }

    fn one_of(values: &[&str]) -> Self {
        ValueKind::String {
            allowed: values.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Schema record for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub kind: ValueKind,
    pub description: Option<String>,
}

/// Known preference keys mapped to their expected value types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entries: HashMap<String, SchemaEntry>,
}

static BUILTIN: OnceLock<Schema> = OnceLock::new();

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table of well-known preferences
    pub fn builtin() -> &'static Schema {
        BUILTIN.get_or_init(|| {
            let mut schema = Schema::new();
            for (key, kind, description) in builtin_table() {
                schema.insert(key, kind, Some(description));
            }
            schema
        })
    }

    /// The built-in table extended with an optional schema file
    pub fn with_extension(path: Option<&Path>) -> Result<Schema> {
        let mut schema = Schema::builtin().clone();
        if let Some(path) = path {
            let extension = Schema::load(path)?;
            tracing::debug!(
                path = %path.display(),
                keys = extension.len(),
                "extending built-in schema"
            );
            schema.extend(extension);
        }
        Ok(schema)
    }

    pub fn insert(&mut self, key: &str, kind: ValueKind, description: Option<&str>) {
        self.entries.insert(
            key.to_string(),
            SchemaEntry {
                kind,
                description: description.map(str::to_string),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Human-readable explanation for a key, if documented
    pub fn description(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|e| e.description.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into this schema; its entries replace existing ones
    pub fn extend(&mut self, other: Schema) {
        self.entries.extend(other.entries);
    }

    /// Read a schema extension file
    pub fn load(path: &Path) -> Result<Schema> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        Schema::from_toml_str(&content)
    }

    /// Parse a schema extension from TOML text
    pub fn from_toml_str(content: &str) -> Result<Schema> {
        let file: SchemaFile =
            toml::from_str(content).map_err(|e| Error::Schema(e.to_string()))?;

        let mut schema = Schema::new();
        for (key, raw) in file.prefs {
            let entry = raw.into_entry(&key)?;
            schema.entries.insert(key, entry);
        }
        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    prefs: BTreeMap<String, RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "int")]
    Integer,
    String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: RawKind,
    min: Option<i64>,
    max: Option<i64>,
    #[serde(default)]
    allowed: Vec<String>,
    description: Option<String>,
}

impl RawEntry {
    fn into_entry(self, key: &str) -> Result<SchemaEntry> {
        let invalid = |message: &str| Error::Schema(format!("prefs.\"{}\": {}", key, message));

        let has_range = self.min.is_some() || self.max.is_some();
        if has_range && !matches!(self.kind, RawKind::Integer) {
            return Err(invalid("'min'/'max' only apply to integer preferences"));
        }
        if !self.allowed.is_empty() && !matches!(self.kind, RawKind::String) {
            return Err(invalid("'allowed' only applies to string preferences"));
        }

        let kind = match self.kind {
            RawKind::Bool => ValueKind::Bool,
            RawKind::Integer => {
                if let (Some(min), Some(max)) = (self.min, self.max) {
                    if min > max {
                        return Err(invalid("min is greater than max"));
                    }
                }
                ValueKind::Integer {
                    min: self.min,
                    max: self.max,
                }
            }
            RawKind::String => ValueKind::String {
                allowed: self.allowed,
            },
        };

        Ok(SchemaEntry {
            kind,
            description: self.description,
        })
    }
}

/// Built-in preference table
///
/// Add new keys here following the same pattern:
/// `(key, kind, "What the preference controls.")`
fn builtin_table() -> Vec<(&'static str, ValueKind, &'static str)> {
    use ValueKind::Bool;

    vec![
        // Startup
        (
            "browser.startup.homepage",
            ValueKind::any_string(),
            "Page or pipe-separated list of pages opened at startup and by the Home button.",
        ),
        (
            "browser.newtabpage.enabled",
            Bool,
            "When false, new tabs open blank instead of the activity-stream page.",
        ),
        // Privacy and tracking protection
        (
            "privacy.firstparty.isolate",
            Bool,
            "First-party isolation: keys cookies, cache and storage by the top-level site. \
             Strong isolation, but breaks many login flows.",
        ),
        (
            "privacy.sanitize.sanitizeOnShutdown",
            Bool,
            "Clear history and site data selected under privacy.clearOnShutdown when the browser exits.",
        ),
        (
            "privacy.trackingprotection.enabled",
            Bool,
            "Block known tracking scripts and cookies in all windows.",
        ),
        (
            "privacy.trackingprotection.socialtracking.enabled",
            Bool,
            "Block social-media trackers embedded in third-party pages.",
        ),
        (
            "privacy.trackingprotection.emailtracking.enabled",
            Bool,
            "Block tracking pixels used by email providers to report when a message was opened.",
        ),
        (
            "privacy.bounceTrackingProtection.mode",
            ValueKind::integer(0, 3),
            "Bounce tracker protection: 0 off, 1 on, 2 off (dry run), 3 on (dry run).",
        ),
        (
            "privacy.resistFingerprinting",
            Bool,
            "Normalize values exposed to pages (timezone, screen size, fonts) to resist fingerprinting.",
        ),
        (
            "privacy.query_stripping.enabled",
            Bool,
            "Strip known tracking parameters from URLs during navigation.",
        ),
        (
            "privacy.query_stripping.enabled.pbmode",
            Bool,
            "Strip known tracking parameters from URLs in private windows.",
        ),
        (
            "browser.contentblocking.category",
            ValueKind::one_of(&["standard", "strict", "custom"]),
            "Enhanced Tracking Protection level shown in settings.",
        ),
        (
            "dom.private-attribution.submission.enabled",
            Bool,
            "Allow sites to submit privacy-preserving attribution reports for ad measurement.",
        ),
        (
            "signon.rememberSignons",
            Bool,
            "Offer to save logins in the built-in password manager.",
        ),
        // HTTPS and TLS
        (
            "dom.security.https_only_mode",
            Bool,
            "Upgrade every connection to HTTPS and warn before loading an insecure page.",
        ),
        (
            "dom.security.https_only_mode_ever_enabled",
            Bool,
            "Set by the browser once HTTPS-only mode has been switched on.",
        ),
        (
            "security.OCSP.require",
            Bool,
            "Treat an unreachable OCSP responder as a hard failure instead of accepting the certificate.",
        ),
        (
            "security.tls.enable_0rtt_data",
            Bool,
            "Allow TLS 1.3 0-RTT early data, which is replayable by a network attacker.",
        ),
        (
            "security.tls.version.min",
            ValueKind::integer(1, 4),
            "Minimum TLS version: 1 = TLS 1.0, 2 = 1.1, 3 = 1.2, 4 = 1.3.",
        ),
        (
            "security.ssl.require_safe_negotiation",
            Bool,
            "Refuse servers that do not support secure TLS renegotiation (RFC 5746).",
        ),
        // Networking
        (
            "network.dns.disablePrefetch",
            Bool,
            "Stop resolving hostnames of links on a page before they are clicked.",
        ),
        (
            "network.prefetch-next",
            Bool,
            "Follow <link rel=\"prefetch\"> hints and download resources ahead of time.",
        ),
        (
            "network.http.speculative-parallel-limit",
            ValueKind::integer(0, 65535),
            "Number of speculative connections opened on link hover; 0 disables them.",
        ),
        (
            "network.predictor.enabled",
            Bool,
            "Learn browsing patterns to preconnect and preresolve likely next pages.",
        ),
        (
            "network.cookie.cookieBehavior",
            ValueKind::integer(0, 5),
            "Cookie policy: 0 accept all, 1 block third-party, 2 block all, 3 block unvisited, \
             4 reject trackers, 5 reject trackers and partition third-party storage.",
        ),
        (
            "network.proxy.type",
            ValueKind::integer(0, 5),
            "Proxy mode: 0 direct, 1 manual, 2 PAC, 4 auto-detect, 5 system.",
        ),
        (
            "network.trr.mode",
            ValueKind::integer(0, 5),
            "DNS over HTTPS mode: 0 default, 2 first, 3 only, 5 explicitly off.",
        ),
        (
            "network.trr.uri",
            ValueKind::any_string(),
            "DNS over HTTPS resolver endpoint.",
        ),
        (
            "network.http.referer.XOriginPolicy",
            ValueKind::integer(0, 2),
            "Send Referer cross-origin: 0 always, 1 only if base domains match, 2 only if hosts match.",
        ),
        (
            "network.http.referer.XOriginTrimmingPolicy",
            ValueKind::integer(0, 2),
            "Cross-origin Referer detail: 0 full URL, 1 without query string, 2 origin only.",
        ),
        // Telemetry
        (
            "datareporting.healthreport.uploadEnabled",
            Bool,
            "Send technical and interaction data to the vendor.",
        ),
        (
            "toolkit.telemetry.enabled",
            Bool,
            "Collect extended telemetry measurements.",
        ),
        (
            "toolkit.telemetry.unified",
            Bool,
            "Unified telemetry behavior; when false, only base data is recorded.",
        ),
        (
            "toolkit.telemetry.server",
            ValueKind::any_string(),
            "Endpoint telemetry pings are submitted to.",
        ),
        (
            "browser.ping-centre.telemetry",
            Bool,
            "Send activity-stream usage pings.",
        ),
        (
            "app.shield.optoutstudies.enabled",
            Bool,
            "Allow the browser to install and run studies.",
        ),
        // Web APIs
        (
            "javascript.enabled",
            Bool,
            "Master switch for JavaScript execution in web pages.",
        ),
        (
            "dom.events.asyncClipboard.readText",
            Bool,
            "Expose navigator.clipboard.readText() to pages.",
        ),
        (
            "dom.events.asyncClipboard.read",
            Bool,
            "Expose navigator.clipboard.read() to pages.",
        ),
        (
            "dom.battery.enabled",
            Bool,
            "Expose the Battery Status API, a known fingerprinting vector.",
        ),
        (
            "dom.gamepad.enabled",
            Bool,
            "Expose the Gamepad API to pages.",
        ),
        (
            "geo.enabled",
            Bool,
            "Allow pages to request the device location.",
        ),
        (
            "webgl.disabled",
            Bool,
            "Disable WebGL entirely.",
        ),
        (
            "webgl.min_capability_mode",
            Bool,
            "Report minimal WebGL capabilities to reduce the fingerprinting surface.",
        ),
        (
            "media.peerconnection.enabled",
            Bool,
            "Enable WebRTC peer connections, which can reveal local IP addresses.",
        ),
        // Cache and devtools
        (
            "browser.cache.disk.enable",
            Bool,
            "Store the HTTP cache on disk; when false, only the memory cache is used.",
        ),
        (
            "devtools.debugger.remote-enabled",
            Bool,
            "Allow remote debugging connections to the browser.",
        ),
    ]
}
