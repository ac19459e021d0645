use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fuzzy "NOMOR" anchor followed by the numeric grammar. The second and fourth
/// letters tolerate the O/0 confusion; after normalization they are always `0`.
static NOMOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:N[O0]M[O0]R)[\s:]*([0-9]{4,6}(?:[/|.][0-9]{1,5}){4})").unwrap()
});

static CANONICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4,6}(?:\.[0-9]{1,5}){4}$").unwrap());

/// A reference number in canonical dotted form, e.g. `12345.6.789.01.2345`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// Accepts `/`, `|` or `.` separated input and returns the dotted form,
    /// or `None` when the grouping is wrong.
    pub fn parse(raw: &str) -> Option<Self> {
        let dotted = raw.replace(['/', '|'], ".");
        if CANONICAL.is_match(&dotted) {
            Some(Self(dotted))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.0)
    }
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReferenceNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a reference number: {}", value))
    }
}

impl From<ReferenceNumber> for String {
    fn from(value: ReferenceNumber) -> Self {
        value.0
    }
}

/// Locate the reference number in normalized OCR text.
/// The first anchor that is directly followed by a well-formed number wins.
pub fn extract(normalized: &str) -> Option<ReferenceNumber> {
    let caps = NOMOR_PATTERN.captures(normalized)?;
    ReferenceNumber::parse(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_short_first_group() {
        assert!(ReferenceNumber::parse("123.45.6789.01.234").is_none());
        assert!(ReferenceNumber::parse("1234.45.6789.01").is_none());
    }

    #[test]
    fn parse_normalizes_separators() {
        let r = ReferenceNumber::parse("1234|5/6.7/8").unwrap();
        assert_eq!(r.as_str(), "1234.5.6.7.8");
        assert_eq!(r.groups().count(), 5);
    }

    #[test]
    fn serde_round_trip_enforces_invariant() {
        let r: ReferenceNumber = serde_json::from_str("\"1234.5.6.7.8\"").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"1234.5.6.7.8\"");
        assert!(serde_json::from_str::<ReferenceNumber>("\"12.5\"").is_err());
    }
}
