// # Zone Model
//
// SOA snapshots as delivered by the control panel, and the provider's view of
// a slave zone.
//
// ## Wire Format
//
// The control panel hands over the row before and after a change:
//
// ```json
// {
//   "old": {"id": "7", "origin": "example.com.", "ns": "ns1.example.com.", "active": "Y"},
//   "new": {"id": "7", "origin": "example.com.", "ns": "ns2.example.com.", "active": "Y"}
// }
// ```
//
// An absent side may be `null`, missing, or an empty array.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Normalize a domain or host name for comparison and remote calls
///
/// Trims dots and whitespace at both ends and lower-cases the result.
pub fn normalize_origin(name: &str) -> String {
    name.trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_lowercase()
}

/// SOA state of a zone at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// Control panel row id; empty means "no data"
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,

    /// Zone name as entered (e.g. "Example.COM.")
    #[serde(default)]
    pub origin: String,

    /// Hostname of the authoritative master
    #[serde(default, rename = "ns", alias = "nameserver")]
    pub nameserver: String,

    /// Whether the zone is published
    #[serde(default, deserialize_with = "de_active")]
    pub active: bool,
}

impl ZoneSnapshot {
    /// Create a snapshot
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        nameserver: impl Into<String>,
        active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            nameserver: nameserver.into(),
            active,
        }
    }

    /// Whether the snapshot carries data (non-empty id)
    pub fn is_present(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Normalized zone name
    pub fn domain(&self) -> String {
        normalize_origin(&self.origin)
    }
}

/// A zone mutation: the snapshot before and after
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneChangeEvent {
    /// State before the change
    #[serde(default, rename = "old", alias = "previous", deserialize_with = "de_snapshot")]
    pub previous: Option<ZoneSnapshot>,

    /// State after the change
    #[serde(default, rename = "new", alias = "current", deserialize_with = "de_snapshot")]
    pub current: Option<ZoneSnapshot>,
}

impl ZoneChangeEvent {
    /// Create an event from both sides
    pub fn new(previous: Option<ZoneSnapshot>, current: Option<ZoneSnapshot>) -> Self {
        Self { previous, current }
    }

    /// Event for a freshly inserted zone
    pub fn inserted(current: ZoneSnapshot) -> Self {
        Self::new(None, Some(current))
    }

    /// Event for a deleted zone
    pub fn deleted(previous: ZoneSnapshot) -> Self {
        Self::new(Some(previous), None)
    }

    /// The new snapshot, if it carries data
    pub fn current_zone(&self) -> Option<&ZoneSnapshot> {
        self.current.as_ref().filter(|z| z.is_present())
    }

    /// The old snapshot, if it carries data
    pub fn previous_zone(&self) -> Option<&ZoneSnapshot> {
        self.previous.as_ref().filter(|z| z.is_present())
    }
}

/// Lifecycle events emitted by the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneEventKind {
    /// A zone was created
    #[serde(rename = "dns_soa_insert")]
    Inserted,
    /// A zone was modified
    #[serde(rename = "dns_soa_update")]
    Updated,
    /// A zone was removed
    #[serde(rename = "dns_soa_delete")]
    Deleted,
}

impl ZoneEventKind {
    /// Host event name
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneEventKind::Inserted => "dns_soa_insert",
            ZoneEventKind::Updated => "dns_soa_update",
            ZoneEventKind::Deleted => "dns_soa_delete",
        }
    }
}

impl std::fmt::Display for ZoneEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a zone as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteZoneType {
    /// Zone served from the provider's own records
    Master,
    /// Zone transferred from an external master
    Slave,
}

impl RemoteZoneType {
    /// Provider-side name
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteZoneType::Master => "master",
            RemoteZoneType::Slave => "slave",
        }
    }
}

/// The provider's view of a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteZoneRecord {
    /// Opaque provider handle
    pub remote_id: String,
    /// Zone name as stored by the provider
    pub domain_name: String,
    /// Masters the provider transfers from
    pub master_ips: Vec<String>,
    /// Zone type, when reported
    pub zone_type: Option<RemoteZoneType>,
}

impl RemoteZoneRecord {
    /// Create a slave zone record
    pub fn slave(
        remote_id: impl Into<String>,
        domain_name: impl Into<String>,
        master_ips: Vec<String>,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            domain_name: domain_name.into(),
            master_ips,
            zone_type: Some(RemoteZoneType::Slave),
        }
    }
}

/// First remote record whose name matches `domain`
///
/// `domain` is expected to be normalized already; remote names are normalized
/// before comparison.
pub fn find_remote<'a>(
    records: &'a [RemoteZoneRecord],
    domain: &str,
) -> Option<&'a RemoteZoneRecord> {
    records
        .iter()
        .find(|r| normalize_origin(&r.domain_name) == domain)
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid zone id: {}",
            other
        ))),
    }
}

fn de_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(matches!(
            s.trim().to_ascii_uppercase().as_str(),
            "Y" | "YES" | "TRUE" | "1"
        )),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        other => Err(serde::de::Error::custom(format!(
            "invalid active flag: {}",
            other
        ))),
    }
}

fn de_snapshot<'de, D>(deserializer: D) -> Result<Option<ZoneSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        value => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
