use std::path::Path;

use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    Encrypted(String),
    #[error("PdfError: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("page {page} out of range (document has {count})")]
    PageOutOfRange { page: usize, count: usize },
    #[error("no pages selected")]
    Empty,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a PDF's pages and writes a new PDF holding a chosen subset of them.
pub trait PdfCopier {
    fn page_count(&self, pdf: &Path) -> Result<usize, CopyError>;

    /// `pages` are 0-based, ascending.
    fn write_pages(&self, src: &Path, pages: &[usize], dst: &Path) -> Result<(), CopyError>;

    fn copy_all(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        let count = self.page_count(src)?;
        let pages: Vec<usize> = (0..count).collect();
        self.write_pages(src, &pages, dst)
    }
}

/// In-process copier on top of `lopdf`: loads, drops unselected pages,
/// prunes orphaned objects and saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCopier;

impl LopdfCopier {
    fn load(pdf: &Path) -> Result<Document, CopyError> {
        if !pdf.exists() {
            return Err(CopyError::FileNotFound(pdf.display().to_string()));
        }
        let doc = Document::load(pdf)?;
        if doc.is_encrypted() {
            return Err(CopyError::Encrypted(pdf.display().to_string()));
        }
        Ok(doc)
    }
}

impl PdfCopier for LopdfCopier {
    fn page_count(&self, pdf: &Path) -> Result<usize, CopyError> {
        Ok(Self::load(pdf)?.get_pages().len())
    }

    fn write_pages(&self, src: &Path, pages: &[usize], dst: &Path) -> Result<(), CopyError> {
        if pages.is_empty() {
            return Err(CopyError::Empty);
        }
        let mut doc = Self::load(src)?;
        let count = doc.get_pages().len();
        if let Some(&page) = pages.iter().find(|&&p| p >= count) {
            return Err(CopyError::PageOutOfRange { page, count });
        }

        // lopdf numbers pages from 1
        let drop: Vec<u32> = (0..count)
            .filter(|p| !pages.contains(p))
            .map(|p| (p + 1) as u32)
            .collect();
        if !drop.is_empty() {
            doc.delete_pages(&drop);
            doc.prune_objects();
            doc.renumber_objects();
        }
        doc.compress();

        // write to a sibling temp file then rename, so a failed save leaves nothing behind
        let tmp = dst.with_extension(format!("pdf.tmp.{}", std::process::id()));
        if let Err(e) = doc.save(&tmp) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, dst) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}
