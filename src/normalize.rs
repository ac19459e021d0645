use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\r\n]+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize raw OCR output before pattern matching.
///
/// Uppercases, maps the letters tesseract commonly confuses with digits
/// (`O`, `I`, `L`) onto those digits, folds the full-width colon and collapses
/// whitespace. Lowercase `l` is covered because uppercasing runs first.
pub fn normalize(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let substituted: String = upper
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'L' => '1',
            '：' => ':',
            other => other,
        })
        .collect();
    let single_line = LINE_BREAKS.replace_all(&substituted, " ");
    WHITESPACE.replace_all(&single_line, " ").into_owned()
}
