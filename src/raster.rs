use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("pdftoppm not available: {0}")]
    Unavailable(String),
    #[error("pdftoppm failed: {0}")]
    Render(String),
    #[error("no image rendered for page {0}")]
    MissingImage(usize),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts a range of PDF pages (0-based, half-open) into images.
pub trait Rasterizer {
    fn render(&self, pdf: &Path, pages: Range<usize>, dpi: u32) -> Result<Vec<DynamicImage>, RasterError>;

    fn render_page(&self, pdf: &Path, page: usize, dpi: u32) -> Result<DynamicImage, RasterError> {
        self.render(pdf, page..page + 1, dpi)?
            .into_iter()
            .next()
            .ok_or(RasterError::MissingImage(page))
    }
}

/// Poppler's `pdftoppm`, rendering PNGs into a scratch directory.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self { program: PathBuf::from("pdftoppm") }
    }
}

impl PdftoppmRasterizer {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn render(&self, pdf: &Path, pages: Range<usize>, dpi: u32) -> Result<Vec<DynamicImage>, RasterError> {
        if !pdf.exists() {
            return Err(RasterError::FileNotFound(pdf.display().to_string()));
        }
        if pages.is_empty() {
            return Ok(Vec::new());
        }
        let tmp = tempfile::tempdir()?;
        let prefix = tmp.path().join("page");
        // pdftoppm is 1-based and inclusive
        let first = pages.start + 1;
        let last = pages.end;
        let out = Command::new(&self.program)
            .arg("-r").arg(dpi.to_string())
            .arg("-f").arg(first.to_string())
            .arg("-l").arg(last.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RasterError::Unavailable(self.program.display().to_string()),
                _ => RasterError::Io(e),
            })?;
        if !out.status.success() {
            let err = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(RasterError::Render(if err.is_empty() {
                format!("exit {}", out.status.code().unwrap_or(-1))
            } else {
                err
            }));
        }

        let mut images = Vec::with_capacity(pages.len());
        for page in pages {
            let path = find_page_image(tmp.path(), page + 1).ok_or(RasterError::MissingImage(page))?;
            images.push(image::open(&path)?);
        }
        Ok(images)
    }
}

/// pdftoppm pads the page number to the width of the document's page count.
pub fn find_page_image(dir: &Path, page_no: usize) -> Option<PathBuf> {
    (1..=5)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page_no, width = digits)))
        .find(|p| p.exists())
}

/// Fractional region of interest on a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for CropBox {
    fn default() -> Self {
        Self { left: 0.05, top: 0.05, right: 0.95, bottom: 0.25 }
    }
}

impl CropBox {
    /// Full width, top 35% of the page.
    pub fn top_band() -> Self {
        Self { left: 0.0, top: 0.0, right: 1.0, bottom: 0.35 }
    }

    pub fn full_page() -> Self {
        Self { left: 0.0, top: 0.0, right: 1.0, bottom: 1.0 }
    }

    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.left)
            && in_unit(self.top)
            && in_unit(self.right)
            && in_unit(self.bottom)
            && self.left < self.right
            && self.top < self.bottom
    }

    /// Pixel rectangle `(x, y, w, h)` for an image of the given size.
    pub fn pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let scale = |size: u32, frac: f64| ((size as f64 * frac).round() as u32).min(size);
        let (x0, x1) = (scale(width, self.left), scale(width, self.right));
        let (y0, y1) = (scale(height, self.top), scale(height, self.bottom));
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let (x, y, w, h) = self.pixels(image.width(), image.height());
        image.crop_imm(x, y, w, h)
    }
}
