//! Regex-based indicator matcher

use crate::error::ExtractorError;
use ferret_domain::traits::IndicatorMatcher;
use ferret_domain::{IndicatorKind, MatchError, RawIndicator};
use regex::Regex;
use std::net::Ipv6Addr;
use std::sync::LazyLock;

/// Largest text the matcher accepts
const MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;

/// Extensions reported as suspicious file names, also excluded as TLDs
const FILE_EXTENSIONS: &[&str] = &[
    "exe", "dll", "bat", "cmd", "ps1", "vbs", "js", "jar", "scr", "msi", "lnk", "hta", "sys",
    "apk", "elf", "sh", "docm", "xlsm", "pptm", "zip", "rar", "7z", "iso", "img", "pdf", "doc",
    "docx", "xls", "xlsx",
];

const TOP_LEVEL_DOMAINS: &[&str] = &[
    "com", "net", "org", "edu", "gov", "mil", "int", "info", "biz", "io", "co", "me", "tv", "cc",
    "ws", "us", "uk", "eu", "de", "fr", "nl", "be", "ch", "at", "it", "es", "pt", "pl", "cz",
    "se", "no", "fi", "dk", "ru", "su", "ua", "by", "kz", "cn", "hk", "tw", "jp", "kr", "kp",
    "in", "ir", "il", "tr", "br", "ar", "mx", "ca", "au", "nz", "za", "ng", "sg", "my", "id",
    "vn", "th", "ph", "pk", "bd", "ae", "sa", "top", "xyz", "online", "site", "club", "app",
    "dev", "pro", "live", "shop", "store", "tech", "cloud", "link", "click", "win", "bid", "vip",
    "work", "icu", "buzz", "cyou", "rest", "fun", "space", "website", "host", "onion", "tk", "ml",
    "ga", "cf", "gq", "to", "ly", "gl", "so", "la", "asia", "mobi", "name",
];

const GITHUB_RESERVED: &[&str] = &[
    "about", "collections", "explore", "features", "login", "marketplace", "orgs", "pricing",
    "settings", "sponsors", "topics", "trending",
];

const TELEGRAM_RESERVED: &[&str] = &["joinchat", "addstickers", "proxy", "share", "socks"];

static DEFANGED_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*(?:\.|dot)\s*\]|\(\s*(?:\.|dot)\s*\)|\{\s*(?:\.|dot)\s*\}").unwrap()
});
static DEFANGED_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[:(//)?\]").unwrap());
static DEFANGED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\s*(?:@|at)\s*\]|\(\s*@\s*\)").unwrap());
static DEFANGED_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bhxxp").unwrap());

/// Restore defanged indicators (`hxxp`, `[.]`, `[DOT]`, `[://]`, `[@]`)
///
/// # Examples
///
/// ```
/// use ferret_extractor::rearm;
///
/// assert_eq!(rearm("hxxps[://]evil[.]test"), "https://evil.test");
/// assert_eq!(rearm("ops[@]evil[DOT]test"), "ops@evil.test");
/// ```
pub fn rearm(text: &str) -> String {
    let text = DEFANGED_SCHEME.replace_all(text, "http");
    let text = DEFANGED_COLON.replace_all(&text, ":$1");
    let text = DEFANGED_DOT.replace_all(&text, ".");
    DEFANGED_AT.replace_all(&text, "@").into_owned()
}

type Normalizer = fn(&str) -> String;
type Validator = fn(&str) -> bool;

struct KindPattern {
    kind: IndicatorKind,
    regex: Regex,
    normalize: Normalizer,
    accept: Validator,
}

fn keep(value: &str) -> String {
    value.to_string()
}

fn lower(value: &str) -> String {
    value.to_lowercase()
}

fn upper(value: &str) -> String {
    value.to_uppercase()
}

fn trim_trailing(value: &str) -> String {
    value
        .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'])
        .to_string()
}

fn any(_: &str) -> bool {
    true
}

fn plausible_domain(value: &str) -> bool {
    value
        .rsplit('.')
        .next()
        .map(|tld| {
            let tld = tld.to_lowercase();
            TOP_LEVEL_DOMAINS.contains(&tld.as_str()) && !FILE_EXTENSIONS.contains(&tld.as_str())
        })
        .unwrap_or(false)
}

fn plausible_ip6(value: &str) -> bool {
    let groups = value.split(':').filter(|g| !g.is_empty()).count();
    groups >= 2 && value.parse::<Ipv6Addr>().is_ok()
}

fn github_handle(value: &str) -> bool {
    !GITHUB_RESERVED.contains(&value.to_lowercase().as_str())
}

fn telegram_handle(value: &str) -> bool {
    !TELEGRAM_RESERVED.contains(&value.to_lowercase().as_str())
}

fn definitions() -> Vec<(IndicatorKind, String, Normalizer, Validator)> {
    let extensions = FILE_EXTENSIONS.join("|");
    vec![
        (
            IndicatorKind::Url,
            r#"(?i)\b(?:https?|ftp)://[^\s<>"'`]+"#.to_string(),
            trim_trailing,
            any,
        ),
        (
            IndicatorKind::Fqdn,
            r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,24}\b".to_string(),
            lower,
            plausible_domain,
        ),
        (
            IndicatorKind::Ip4,
            r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b"
                .to_string(),
            keep,
            any,
        ),
        (
            IndicatorKind::Ip6,
            r"(?i)[0-9a-f]{0,4}(?::[0-9a-f]{0,4}){2,7}".to_string(),
            lower,
            plausible_ip6,
        ),
        (IndicatorKind::Md5, r"\b[a-fA-F0-9]{32}\b".to_string(), lower, any),
        (IndicatorKind::Sha1, r"\b[a-fA-F0-9]{40}\b".to_string(), lower, any),
        (IndicatorKind::Sha256, r"\b[a-fA-F0-9]{64}\b".to_string(), lower, any),
        (IndicatorKind::Sha512, r"\b[a-fA-F0-9]{128}\b".to_string(), lower, any),
        (
            IndicatorKind::Email,
            r"(?i)\b[a-z0-9._%+-]+@(?:[a-z0-9-]+\.)+[a-z]{2,24}\b".to_string(),
            lower,
            any,
        ),
        (IndicatorKind::Cve, r"(?i)\bcve-\d{4}-\d{4,7}\b".to_string(), upper, any),
        (
            IndicatorKind::GithubHandle,
            r"(?i)\bgithub\.com/([a-z0-9](?:[a-z0-9-]{0,37}[a-z0-9])?)\b".to_string(),
            lower,
            github_handle,
        ),
        (
            IndicatorKind::TelegramHandle,
            r"(?i)\b(?:t|telegram)\.me/([a-z][a-z0-9_]{4,31})\b".to_string(),
            lower,
            telegram_handle,
        ),
        (
            IndicatorKind::Bitcoin,
            r"\b(?:bc1[02-9ac-hj-np-z]{25,59}|[13][a-km-zA-HJ-NP-Z1-9]{25,34})\b".to_string(),
            keep,
            any,
        ),
        (
            IndicatorKind::Dogecoin,
            r"\bD[5-9A-HJ-NP-U][1-9A-HJ-NP-Za-km-z]{32}\b".to_string(),
            keep,
            any,
        ),
        (IndicatorKind::Ethereum, r"\b0x[a-fA-F0-9]{40}\b".to_string(), lower, any),
        (
            IndicatorKind::Monero,
            r"\b[48][0-9AB][1-9A-HJ-NP-Za-km-z]{93}\b".to_string(),
            keep,
            any,
        ),
        (
            IndicatorKind::PackageName,
            r"\b(?:com|org|net|io)\.[a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]*)+\b".to_string(),
            keep,
            any,
        ),
        (
            IndicatorKind::Registry,
            r#"(?i)\b(?:HKEY_LOCAL_MACHINE|HKEY_CURRENT_USER|HKEY_CLASSES_ROOT|HKEY_USERS|HKEY_CURRENT_CONFIG|HKLM|HKCU|HKCR|HKU|HKCC)\\[^\s"'<>]+"#
                .to_string(),
            trim_trailing,
            any,
        ),
        (
            IndicatorKind::Filename,
            format!(r"(?i)\b[a-z0-9_-][a-z0-9_.-]*\.(?:{})\b", extensions),
            keep,
            any,
        ),
        (
            IndicatorKind::Filepath,
            r#"(?im)\b([a-z]:\\(?:[^\\\s:*?"<>|]+\\)*[^\\\s:*?"<>|]+)|(?:^|[\s("'])(/(?:[\w.-]+/)+[\w.-]+)"#
                .to_string(),
            trim_trailing,
            any,
        ),
    ]
}

/// [`IndicatorMatcher`] built on compiled regular expressions
///
/// The text is rearmed first, so defanged indicators such as
/// `hxxp://evil[.]test` are reported in their live form.
pub struct RegexMatcher {
    patterns: Vec<KindPattern>,
}

impl RegexMatcher {
    /// Compile the patterns for every supported kind
    pub fn new() -> Result<Self, ExtractorError> {
        let patterns = definitions()
            .into_iter()
            .map(|(kind, source, normalize, accept)| {
                let regex = Regex::new(&source).map_err(|e| MatchError::InvalidPattern {
                    kind: kind.to_string(),
                    message: e.to_string(),
                })?;
                Ok(KindPattern {
                    kind,
                    regex,
                    normalize,
                    accept,
                })
            })
            .collect::<Result<Vec<_>, MatchError>>()?;
        Ok(Self { patterns })
    }
}

impl IndicatorMatcher for RegexMatcher {
    fn find_indicators(
        &self,
        text: &str,
        kinds: &[IndicatorKind],
    ) -> Result<Vec<RawIndicator>, MatchError> {
        if text.len() > MAX_INPUT_BYTES {
            return Err(MatchError::Input(format!(
                "text of {} bytes exceeds the {} byte limit",
                text.len(),
                MAX_INPUT_BYTES
            )));
        }

        let text = rearm(text);
        let mut found: Vec<(usize, RawIndicator)> = Vec::new();
        for pattern in self.patterns.iter().filter(|p| kinds.contains(&p.kind)) {
            for captures in pattern.regex.captures_iter(&text) {
                // Use the first capture group that took part, else the whole match
                let Some(m) = captures.iter().skip(1).flatten().next().or(captures.get(0)) else {
                    continue;
                };
                let value = (pattern.normalize)(m.as_str());
                if value.is_empty() || !(pattern.accept)(&value) {
                    continue;
                }
                found.push((m.start(), RawIndicator::new(pattern.kind, value)));
            }
        }

        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, raw)| raw).collect())
    }
}
