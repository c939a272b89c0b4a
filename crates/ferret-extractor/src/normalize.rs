//! HTML normalization

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Undo HTML entity escaping, then remove every markup tag
///
/// Entities are decoded first so that escaped markup (`&lt;b&gt;`) is
/// stripped as well.
///
/// # Examples
///
/// ```
/// use ferret_extractor::strip_html;
///
/// assert_eq!(strip_html("&lt;p&gt;evil.com &amp; co&lt;/p&gt;"), "evil.com & co");
/// ```
pub fn strip_html(input: &str) -> String {
    let unescaped = html_escape::decode_html_entities(input);
    TAG.replace_all(&unescaped, "").into_owned()
}
