//! Indicator module - indicator kinds, candidates and the kind-to-id table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type id assigned to an indicator whose kind has no entry in the type table
pub const UNKNOWN_INDICATOR_TYPE: i32 = -1;

/// Kind of indicator the pattern matcher knows how to find
///
/// The wire names follow the naming used by the `iocs` type table, so they
/// can be used directly as keys of an [`IndicatorTypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    /// Web URL (`http://`, `https://`, `ftp://`)
    Url,
    /// Fully qualified domain name
    Fqdn,
    /// IPv4 address
    Ip4,
    /// IPv6 address
    Ip6,
    /// MD5 digest
    Md5,
    /// SHA-1 digest
    Sha1,
    /// SHA-256 digest
    Sha256,
    /// SHA-512 digest
    Sha512,
    /// Email address
    Email,
    /// CVE identifier
    Cve,
    /// GitHub account handle
    GithubHandle,
    /// Telegram account handle
    TelegramHandle,
    /// Bitcoin address
    Bitcoin,
    /// Dogecoin address
    Dogecoin,
    /// Ethereum address
    Ethereum,
    /// Monero address
    Monero,
    /// Android/Java style package name
    PackageName,
    /// Windows registry key
    Registry,
    /// File name with a suspicious extension
    Filename,
    /// Absolute file path
    Filepath,
}

impl IndicatorKind {
    /// Every kind the matcher supports
    pub const ALL: [IndicatorKind; 20] = [
        IndicatorKind::Url,
        IndicatorKind::Fqdn,
        IndicatorKind::Ip4,
        IndicatorKind::Ip6,
        IndicatorKind::Md5,
        IndicatorKind::Sha1,
        IndicatorKind::Sha256,
        IndicatorKind::Sha512,
        IndicatorKind::Email,
        IndicatorKind::Cve,
        IndicatorKind::GithubHandle,
        IndicatorKind::TelegramHandle,
        IndicatorKind::Bitcoin,
        IndicatorKind::Dogecoin,
        IndicatorKind::Ethereum,
        IndicatorKind::Monero,
        IndicatorKind::PackageName,
        IndicatorKind::Registry,
        IndicatorKind::Filename,
        IndicatorKind::Filepath,
    ];

    /// Get the kind's wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Url => "url",
            IndicatorKind::Fqdn => "fqdn",
            IndicatorKind::Ip4 => "ip4",
            IndicatorKind::Ip6 => "ip6",
            IndicatorKind::Md5 => "md5",
            IndicatorKind::Sha1 => "sha1",
            IndicatorKind::Sha256 => "sha256",
            IndicatorKind::Sha512 => "sha512",
            IndicatorKind::Email => "email",
            IndicatorKind::Cve => "cve",
            IndicatorKind::GithubHandle => "githubHandle",
            IndicatorKind::TelegramHandle => "telegramHandle",
            IndicatorKind::Bitcoin => "bitcoin",
            IndicatorKind::Dogecoin => "dogecoin",
            IndicatorKind::Ethereum => "ethereum",
            IndicatorKind::Monero => "monero",
            IndicatorKind::PackageName => "packageName",
            IndicatorKind::Registry => "registry",
            IndicatorKind::Filename => "filename",
            IndicatorKind::Filepath => "filepath",
        }
    }

    /// Parse a kind from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw match reported by the pattern matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndicator {
    /// Kind of the match
    pub kind: IndicatorKind,
    /// Normalized matched value
    pub value: String,
}

impl RawIndicator {
    /// Create a raw indicator
    pub fn new(kind: IndicatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// An indicator found in one article, before filtering
///
/// Equality is structural over `(type_id, value)`; this is the dedup key
/// within a single article's extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorCandidate {
    /// Database type id (or [`UNKNOWN_INDICATOR_TYPE`])
    pub type_id: i32,
    /// Indicator value
    pub value: String,
}

impl IndicatorCandidate {
    /// Create a candidate
    pub fn new(type_id: i32, value: impl Into<String>) -> Self {
        Self {
            type_id,
            value: value.into(),
        }
    }
}

/// Mapping from indicator kind name to database type id
///
/// Only the kinds present in the table are searched for. A kind that the
/// matcher reports but that has no entry resolves to
/// [`UNKNOWN_INDICATOR_TYPE`] instead of failing.
///
/// # Examples
///
/// ```
/// use ferret_domain::{IndicatorKind, IndicatorTypeTable, UNKNOWN_INDICATOR_TYPE};
///
/// let table = IndicatorTypeTable::default();
/// assert_eq!(table.type_id("ip4"), 3);
/// assert_eq!(table.type_id("onionAddress"), UNKNOWN_INDICATOR_TYPE);
/// assert!(table.kinds().contains(&IndicatorKind::Sha256));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorTypeTable {
    ids: BTreeMap<String, i32>,
}

impl IndicatorTypeTable {
    /// Create a table from explicit `(name, id)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Self {
            ids: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a `name=id,name=id` override list
    ///
    /// Whitespace around entries is ignored; empty entries are skipped.
    pub fn parse_overrides(s: &str) -> Result<Self, String> {
        let mut ids = BTreeMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, id) = entry
                .split_once('=')
                .ok_or_else(|| format!("Expected name=id, got '{}'", entry))?;
            let id: i32 = id
                .trim()
                .parse()
                .map_err(|e| format!("Invalid id for '{}': {}", name.trim(), e))?;
            ids.insert(name.trim().to_string(), id);
        }
        if ids.is_empty() {
            return Err("Indicator type table must not be empty".to_string());
        }
        Ok(Self { ids })
    }

    /// Resolve a kind name to its type id
    pub fn type_id(&self, kind: &str) -> i32 {
        self.ids.get(kind).copied().unwrap_or(UNKNOWN_INDICATOR_TYPE)
    }

    /// Resolve a raw matcher result into a candidate
    pub fn candidate(&self, raw: RawIndicator) -> IndicatorCandidate {
        IndicatorCandidate::new(self.type_id(raw.kind.as_str()), raw.value)
    }

    /// Kinds to search for: every table entry naming a supported kind
    pub fn kinds(&self) -> Vec<IndicatorKind> {
        self.ids
            .keys()
            .filter_map(|name| IndicatorKind::parse(name))
            .collect()
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for IndicatorTypeTable {
    /// The production type ids of the `iocs` table
    fn default() -> Self {
        Self::from_pairs([
            ("url", 1),
            ("fqdn", 2),
            ("ip4", 3),
            ("ip6", 4),
            ("md5", 6),
            ("sha1", 7),
            ("sha256", 8),
            ("email", 9),
            ("cve", 12),
            ("githubHandle", 15),
            ("telegramHandle", 19),
            ("bitcoin", 27),
            ("dogecoin", 31),
            ("ethereum", 32),
            ("monero", 34),
            ("packageName", 44),
            ("registry", 46),
            ("filename", 47),
            ("filepath", 48),
            ("sha512", 49),
        ])
    }
}
