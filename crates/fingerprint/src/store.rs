//! Fingerprint store: ordered, immutable service fingerprints
//!
//! Entries keep the order they have in the source JSON, and every lookup walks
//! them in that order, so the first matching entry always wins.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use subsnipe_common::{ConfirmationMode, FingerprintEntry, LoadError};

use crate::domain::{second_level_label, service_key, trim_root};

/// A fingerprint hit: the entry plus the pattern or derived key that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintMatch<'a> {
    pub entry: &'a FingerprintEntry,
    pub key: &'a str,
}

impl FingerprintMatch<'_> {
    #[inline]
    pub fn service_id(&self) -> &str {
        &self.entry.service_id
    }

    #[inline]
    pub fn vulnerable(&self) -> bool {
        self.entry.vulnerable
    }
}

/// Fingerprint record as found in either supported JSON layout.
#[derive(Debug, Deserialize)]
struct RawFingerprint {
    cname: Vec<String>,
    vulnerable: bool,
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    nxdomain: bool,
}

impl RawFingerprint {
    fn into_entry(self, service_id: String) -> FingerprintEntry {
        let text = self.fingerprint.filter(|t| !t.trim().is_empty());
        let mode = if self.nxdomain {
            ConfirmationMode::DnsNxdomain
        } else if text.is_some() {
            ConfirmationMode::HttpBodyContains
        } else {
            ConfirmationMode::None
        };

        let suffixes = self
            .cname
            .into_iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        FingerprintEntry::new(service_id, suffixes, self.vulnerable).with_confirmation(mode, text)
    }
}

/// Immutable, ordered collection of service fingerprints.
///
/// Safe to share behind an `Arc` and read from any number of tasks.
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
    entries: Vec<FingerprintEntry>,
    // Derived second-level keys, parallel to `entries`.
    derived_keys: Vec<Vec<String>>,
}

impl FingerprintStore {
    /// Build a store from entries already in match order.
    pub fn from_entries(mut entries: Vec<FingerprintEntry>) -> Self {
        for entry in &mut entries {
            for pattern in &mut entry.match_suffixes {
                pattern.make_ascii_lowercase();
            }
        }
        let derived_keys = entries.iter().map(derive_keys).collect();
        Self {
            entries,
            derived_keys,
        }
    }

    /// Read and parse a fingerprint database from disk.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self::from_json(&raw)?;
        debug!("Loaded {} fingerprints from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parse a fingerprint database.
    ///
    /// Accepts an object keyed by service id (key order is kept) or the
    /// can-i-take-over-xyz array layout where each record names its `service`.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let entries = match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(service, value)| parse_entry(service, value))
                .collect::<Result<Vec<_>, _>>()?,
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, value)| {
                    let service = value
                        .get("service")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{}", idx));
                    parse_entry(service, value)
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(LoadError::InvalidEntry {
                    service: "<root>".to_string(),
                    reason: format!("expected object or array, found {}", json_kind(&other)),
                })
            }
        };

        if entries.is_empty() {
            warn!("Fingerprint database contains no entries; every CNAME will be unknown");
        }
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[FingerprintEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry (load order) with a suffix pattern that `resolved_name` ends
    /// with, after trimming one trailing root dot. Patterns are checked in
    /// their stored order. Comparison is ASCII case-insensitive.
    pub fn match_direct(&self, resolved_name: &str) -> Option<FingerprintMatch<'_>> {
        let name = trim_root(resolved_name).to_ascii_lowercase();
        self.entries.iter().find_map(|entry| {
            entry
                .match_suffixes
                .iter()
                .find(|pattern| name.ends_with(pattern.as_str()))
                .map(|pattern| FingerprintMatch {
                    entry,
                    key: pattern,
                })
        })
    }

    /// First entry whose derived keys contain the second-level label of
    /// `resolved_name`. A weaker signal than [`match_direct`](Self::match_direct).
    pub fn match_by_second_level_domain(&self, resolved_name: &str) -> Option<FingerprintMatch<'_>> {
        let label = second_level_label(resolved_name)?;
        self.entries
            .iter()
            .zip(&self.derived_keys)
            .find_map(|(entry, keys)| {
                keys.iter()
                    .find(|key| **key == label)
                    .map(|key| FingerprintMatch { entry, key })
            })
    }
}

fn parse_entry(service: String, value: Value) -> Result<FingerprintEntry, LoadError> {
    match serde_json::from_value::<RawFingerprint>(value) {
        Ok(raw) => Ok(raw.into_entry(service)),
        Err(e) => Err(LoadError::InvalidEntry {
            service,
            reason: e.to_string(),
        }),
    }
}

/// Normalized service id first, then the second-level label of each pattern.
fn derive_keys(entry: &FingerprintEntry) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(entry.match_suffixes.len() + 1);
    let id_key = service_key(&entry.service_id);
    if !id_key.is_empty() {
        keys.push(id_key);
    }
    for label in entry.match_suffixes.iter().filter_map(|s| second_level_label(s)) {
        if !keys.contains(&label) {
            keys.push(label);
        }
    }
    keys
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KEYED: &str = r#"{
        "Shopify": {"cname": ["myshopify.com"], "vulnerable": true, "fingerprint": "Sorry, this shop is currently unavailable."},
        "GitHub": {"cname": ["github.io"], "vulnerable": false},
        "Agile CRM": {"cname": ["agilecrm.com"], "vulnerable": true, "nxdomain": true, "status": "Vulnerable"}
    }"#;

    fn entry(service: &str, suffixes: &[&str], vulnerable: bool) -> FingerprintEntry {
        FingerprintEntry::new(
            service,
            suffixes.iter().map(|s| s.to_string()).collect(),
            vulnerable,
        )
    }

    #[test]
    fn keyed_layout_keeps_source_order() {
        let store = FingerprintStore::from_json(KEYED).unwrap();
        let ids: Vec<&str> = store.entries().iter().map(|e| e.service_id.as_str()).collect();
        assert_eq!(ids, vec!["Shopify", "GitHub", "Agile CRM"]);
    }

    #[test]
    fn confirmation_fields_are_carried() {
        let store = FingerprintStore::from_json(KEYED).unwrap();
        let entries = store.entries();
        assert_eq!(entries[0].confirmation_mode, ConfirmationMode::HttpBodyContains);
        assert_eq!(
            entries[0].confirmation_text.as_deref(),
            Some("Sorry, this shop is currently unavailable.")
        );
        assert_eq!(entries[1].confirmation_mode, ConfirmationMode::None);
        assert_eq!(entries[2].confirmation_mode, ConfirmationMode::DnsNxdomain);
    }

    #[test]
    fn array_layout_uses_service_field() {
        let json = r#"[
            {"service": "Heroku", "cname": ["herokuapp.com", "herokudns.com"], "vulnerable": false, "fingerprint": "No such app"},
            {"cname": ["surge.sh"], "vulnerable": true}
        ]"#;
        let store = FingerprintStore::from_json(json).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].service_id, "Heroku");
        assert_eq!(store.entries()[0].match_suffixes, vec!["herokuapp.com", "herokudns.com"]);
        assert_eq!(store.entries()[1].service_id, "#1");
    }

    #[test]
    fn malformed_sources_fail() {
        assert!(matches!(
            FingerprintStore::from_json("{not json"),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            FingerprintStore::from_json(r#"{"x": {"vulnerable": true}}"#),
            Err(LoadError::InvalidEntry { .. })
        ));
        assert!(matches!(
            FingerprintStore::from_json(r#"{"x": {"cname": ["x.io"], "vulnerable": "yes"}}"#),
            Err(LoadError::InvalidEntry { .. })
        ));
        assert!(FingerprintStore::from_json("42").is_err());
    }

    #[test]
    fn empty_patterns_are_dropped() {
        let store =
            FingerprintStore::from_json(r#"{"x": {"cname": ["", "  "], "vulnerable": true}}"#).unwrap();
        assert!(store.entries()[0].match_suffixes.is_empty());
        assert!(store.match_direct("anything.example.com").is_none());
    }

    #[test]
    fn direct_match_trims_root_dot() {
        let store = FingerprintStore::from_entries(vec![entry("shopify", &["myshopify.com"], true)]);
        let hit = store.match_direct("shop.myshopify.com.").unwrap();
        assert_eq!(hit.service_id(), "shopify");
        assert_eq!(hit.key, "myshopify.com");
        assert!(hit.vulnerable());
    }

    #[test]
    fn direct_match_is_exact_suffix() {
        let store = FingerprintStore::from_entries(vec![entry("shopify", &["myshopify.com"], true)]);
        assert!(store.match_direct("shop.myshopify.com..").is_none());
        assert!(store.match_direct("shop.myshopify.com.evil.net").is_none());
        assert!(store.match_direct("myshopify.co").is_none());
    }

    #[test]
    fn direct_match_ignores_case() {
        let store = FingerprintStore::from_entries(vec![entry("shopify", &["MyShopify.com"], true)]);
        let hit = store.match_direct("Shop.MyShopify.COM.").unwrap();
        assert_eq!(hit.service_id(), "shopify");
        assert_eq!(hit.key, "myshopify.com");

        let store = FingerprintStore::from_json(r#"{"Shopify": {"cname": ["MYSHOPIFY.COM"], "vulnerable": true}}"#)
            .unwrap();
        assert_eq!(store.entries()[0].match_suffixes, vec!["myshopify.com"]);
        assert!(store.match_direct("shop.myshopify.com").is_some());
    }

    #[test]
    fn second_level_fallback_first_entry_wins() {
        let store = FingerprintStore::from_entries(vec![
            entry("alpha", &["alpha.io"], false),
            entry("Alpha", &["x.net"], true),
        ]);
        for _ in 0..10 {
            let hit = store.match_by_second_level_domain("c.alpha.co.uk").unwrap();
            assert_eq!(hit.service_id(), "alpha");
            assert_eq!(hit.key, "alpha");
            assert!(!hit.vulnerable());
        }
    }

    #[test]
    fn first_entry_wins() {
        let store = FingerprintStore::from_entries(vec![
            entry("first", &["a.example"], false),
            entry("second", &["a.example"], true),
        ]);
        for _ in 0..10 {
            let hit = store.match_direct("x.a.example").unwrap();
            assert_eq!(hit.service_id(), "first");
            assert!(!hit.vulnerable());
        }
    }

    #[test]
    fn patterns_checked_in_stored_order() {
        let store = FingerprintStore::from_entries(vec![entry(
            "cdn",
            &["edge.example.net", "example.net"],
            true,
        )]);
        assert_eq!(store.match_direct("a.edge.example.net").unwrap().key, "edge.example.net");
        assert_eq!(store.match_direct("a.example.net").unwrap().key, "example.net");
    }

    #[test]
    fn second_level_fallback_uses_service_id_and_patterns() {
        let store = FingerprintStore::from_entries(vec![
            entry("Zendesk Support", &["zendesk.com"], false),
            entry("Tilda", &["tilda.ws"], true),
        ]);

        let by_pattern = store.match_by_second_level_domain("help.zendesk.co.uk.").unwrap();
        assert_eq!(by_pattern.service_id(), "Zendesk Support");
        assert_eq!(by_pattern.key, "zendesk");
        assert!(!by_pattern.vulnerable());
        let by_id = store.match_by_second_level_domain("proxy.tilda.cc").unwrap();
        assert_eq!(by_id.service_id(), "Tilda");
        assert!(by_id.vulnerable());
    }

    #[test]
    fn unknown_host_matches_nothing() {
        let store = FingerprintStore::from_json(KEYED).unwrap();
        assert!(store.match_direct("x.randomhost.net").is_none());
        assert!(store.match_by_second_level_domain("x.randomhost.net").is_none());
    }

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KEYED.as_bytes()).unwrap();

        let store = FingerprintStore::load(file.path()).await.unwrap();
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = FingerprintStore::load(dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(LoadError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn bundled_database_loads() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../fingerprints/can-i-take-over-xyz_fingerprints.json"
        );
        let store = FingerprintStore::load(path).await.unwrap();
        assert!(!store.is_empty());

        let hit = store.match_direct("shop.myshopify.com.").unwrap();
        assert_eq!(hit.service_id(), "Shopify");
        assert!(hit.vulnerable());
    }
}
