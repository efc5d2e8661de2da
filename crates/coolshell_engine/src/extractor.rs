/* 📖 # How are search result fields extracted?

Archived pages are WordPress output. Two markers in that markup are reliable
enough to anchor on without an HTML parser:

- `screen-reader-text`: the first element carrying this class holds the post
  title text, used as the result description;
- `datetime="..."`: the first `<time>` element carries the publication time in
  RFC 3339.

Both functions are total: a missing or malformed marker degrades that one field
to its empty value and never affects whether the article matches.
*/

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Serialize, Serializer};

const SNIPPET_MARKER: &str = "screen-reader-text";
const DATE_MARKER: &str = "datetime=\"";

/// Publication time of an article, or the "unknown" sentinel.
///
/// Ordering compares instants; the unknown sentinel is earlier than every real
/// date, so it sorts last in a newest-first listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublishDate(Option<DateTime<FixedOffset>>);

impl PublishDate {
    /// The sentinel used when a page carries no usable date.
    pub const UNKNOWN: PublishDate = PublishDate(None);

    pub fn new(datetime: DateTime<FixedOffset>) -> Self {
        Self(Some(datetime))
    }

    /// Parse an RFC 3339 timestamp, keeping its offset and sub-second precision.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value).ok().map(Self::new)
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_none()
    }

    pub fn datetime(&self) -> Option<&DateTime<FixedOffset>> {
        self.0.as_ref()
    }

    /// RFC 3339 rendering with the original offset (`Z` for UTC).
    pub fn to_rfc3339(&self) -> Option<String> {
        self.0
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    /// Calendar date in the article's own offset, e.g. `2022-06-15`.
    pub fn display_date(&self) -> Option<String> {
        self.0.map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

/// Serialized as an RFC 3339 string, or `null` for the unknown sentinel.
impl Serialize for PublishDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_rfc3339() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

/// Text of the first `screen-reader-text` element, verbatim.
///
/// From the first occurrence of the marker, the snippet starts after the next
/// `>` and ends before the following `<`. Returns an empty string if the marker
/// or either delimiter is missing. No entity decoding is applied.
pub fn extract_snippet(text: &str) -> String {
    let Some(marker) = text.find(SNIPPET_MARKER) else {
        return String::new();
    };
    let Some(open) = text[marker..].find('>') else {
        return String::new();
    };
    let start = marker + open + 1;
    let Some(len) = text[start..].find('<') else {
        return String::new();
    };
    text[start..start + len].to_string()
}

/// Value of the first `datetime="..."` attribute, parsed as RFC 3339.
///
/// Returns [`PublishDate::UNKNOWN`] if the attribute is missing, unterminated or
/// not a valid timestamp.
pub fn extract_date(text: &str) -> PublishDate {
    let Some(marker) = text.find(DATE_MARKER) else {
        return PublishDate::UNKNOWN;
    };
    let start = marker + DATE_MARKER.len();
    let Some(len) = text[start..].find('"') else {
        return PublishDate::UNKNOWN;
    };
    PublishDate::parse_rfc3339(&text[start..start + len]).unwrap_or(PublishDate::UNKNOWN)
}
