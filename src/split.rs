use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::billing::BillingDetector;
use crate::observer::{Event, Observer};
use crate::pdf::{CopyError, PdfCopier};
use crate::raster::Rasterizer;

/// Pages per chunk before a trailing billing page is appended.
pub const CHUNK_SIZE: usize = 2;

/// Contiguous half-open page range `[start, end)` of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitChunk {
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
}

impl SplitChunk {
    pub fn pages(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Partition `page_count` pages into chunks of two, extending a chunk by one
/// page when the page right after it is a billing page.
///
/// `is_billing` is called at most once per chunk, only for the page directly
/// following it.
pub fn plan_chunks<F>(page_count: usize, mut is_billing: F) -> Vec<SplitChunk>
where
    F: FnMut(usize) -> bool,
{
    let mut chunks = Vec::new();
    let mut cursor = 0;
    while cursor < page_count {
        let start = cursor;
        cursor = (cursor + CHUNK_SIZE).min(page_count);
        if cursor < page_count && is_billing(cursor) {
            cursor += 1;
        }
        chunks.push(SplitChunk { ordinal: chunks.len() + 1, start, end: cursor });
    }
    chunks
}

/// A chunk written to disk as a standalone PDF.
#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub chunk: SplitChunk,
    pub id: String,
    pub path: PathBuf,
}

pub struct Splitter<'a> {
    pub copier: &'a dyn PdfCopier,
    pub rasterizer: &'a dyn Rasterizer,
    pub detector: &'a BillingDetector<'a>,
    pub observer: &'a dyn Observer,
    pub dpi: u32,
}

impl<'a> Splitter<'a> {
    /// Plan and write the chunks of `pdf` into `out_dir` as `<stem>_partNN.pdf`.
    /// A page that cannot be rendered or read is treated as not billing.
    pub fn split_document(&self, pdf: &Path, stem: &str, out_dir: &Path) -> Result<Vec<ChunkFile>, CopyError> {
        let source = pdf.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let page_count = self.copier.page_count(pdf)?;

        let chunks = plan_chunks(page_count, |page| self.page_is_billing(pdf, &source, page));
        self.observer.notify(&Event::SplitPlanned {
            source: source.clone(),
            pages: page_count,
            chunks: chunks.iter().map(|c| c.pages().collect()).collect(),
        });

        let mut files = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = format!("{}_part{:02}", stem, chunk.ordinal);
            let path = out_dir.join(format!("{}.pdf", id));
            let pages: Vec<usize> = chunk.pages().collect();
            self.copier.write_pages(pdf, &pages, &path)?;
            files.push(ChunkFile { chunk, id, path });
        }
        Ok(files)
    }

    fn page_is_billing(&self, pdf: &Path, source: &str, page: usize) -> bool {
        let outcome = self
            .rasterizer
            .render_page(pdf, page, self.dpi)
            .map_err(|e| e.to_string())
            .and_then(|img| self.detector.is_billing(&img).map_err(|e| e.to_string()));
        match outcome {
            Ok(flag) => flag,
            Err(message) => {
                self.observer.notify(&Event::BillingCheckFailed { source: source.to_string(), page, message });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(chunks: &[SplitChunk]) -> Vec<usize> {
        chunks.iter().map(SplitChunk::len).collect()
    }

    #[test]
    fn empty_document_has_no_chunks() {
        assert!(plan_chunks(0, |_| true).is_empty());
    }

    #[test]
    fn single_page() {
        let chunks = plan_chunks(1, |_| true);
        assert_eq!(chunks, vec![SplitChunk { ordinal: 1, start: 0, end: 1 }]);
    }

    #[test]
    fn detector_only_asked_after_full_chunks() {
        let mut asked = Vec::new();
        let chunks = plan_chunks(5, |p| {
            asked.push(p);
            false
        });
        assert_eq!(sizes(&chunks), vec![2, 2, 1]);
        assert_eq!(asked, vec![2, 4]);
    }

    #[test]
    fn consecutive_billing_pages() {
        // page 2 joins chunk 1, page 5 joins chunk 2, page 6 starts chunk 3
        let flags = [false, false, true, false, false, true, true];
        let chunks = plan_chunks(flags.len(), |p| flags[p]);
        let ranges: Vec<_> = chunks.iter().map(SplitChunk::pages).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..7]);
    }
}
