use image::DynamicImage;

use crate::ocr::{OcrEngine, OcrError};

pub const DEFAULT_KEYWORD: &str = "billing";
pub const DEFAULT_LANG: &str = "eng+ind";

/// Classifies a rendered page as a billing page by keyword presence in its
/// OCR text. Heuristic: an OCR miss yields a false negative.
pub struct BillingDetector<'a> {
    ocr: &'a dyn OcrEngine,
    lang: String,
    keyword: String,
}

impl<'a> BillingDetector<'a> {
    pub fn new(ocr: &'a dyn OcrEngine) -> Self {
        Self::with_keyword(ocr, DEFAULT_LANG, DEFAULT_KEYWORD)
    }

    pub fn with_keyword(ocr: &'a dyn OcrEngine, lang: &str, keyword: &str) -> Self {
        Self { ocr, lang: lang.to_string(), keyword: keyword.to_lowercase() }
    }

    pub fn is_billing(&self, page: &DynamicImage) -> Result<bool, OcrError> {
        let text = self.ocr.recognize(page, &self.lang)?;
        Ok(contains_keyword(&text, &self.keyword))
    }
}

/// `keyword` is expected lowercase.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(keyword)
}
