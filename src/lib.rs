use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod archive;
pub mod billing;
pub mod config;
pub mod extract;
pub mod normalize;
pub mod observer;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod report;
pub mod split;
pub mod workspace;

pub use archive::{archive_dir, ArchiveError, ARCHIVE_NAME};
pub use billing::BillingDetector;
pub use config::{load_config, parse_config, ConfigError, RenameConfig};
pub use extract::{extract, ReferenceNumber};
pub use normalize::normalize;
pub use observer::{Event, JsonLinesObserver, Observer, RecordingObserver};
pub use ocr::{OcrEngine, OcrError, TesseractEngine};
pub use pdf::{CopyError, LopdfCopier, PdfCopier};
pub use pipeline::{InputDocument, Pipeline, PipelineError, PipelineOptions};
pub use raster::{CropBox, PdftoppmRasterizer, RasterError, Rasterizer};
pub use report::{emit_report, BatchOutcome, RenameResult, UnitFailure};
pub use split::{plan_chunks, SplitChunk, Splitter};
pub use workspace::{Workspace, WorkspaceError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Check the external tools the pipeline shells out to.
/// Both `pdftoppm` (Poppler) and `tesseract` are required.
pub fn check_deps() -> DepsResult {
    let missing: Vec<String> = ["pdftoppm", "tesseract"]
        .into_iter()
        .filter(|tool| which::which(tool).is_err())
        .map(String::from)
        .collect();
    DepsResult { ok: missing.is_empty(), missing }
}

/// Install hint for missing tools, empty when nothing is missing.
pub fn install_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| m == "pdftoppm") {
        pkgs.push("poppler-utils");
    }
    if missing.iter().any(|m| m == "tesseract") {
        pkgs.push("tesseract-ocr");
        pkgs.push("tesseract-ocr-ind");
    }

    if pkgs.is_empty() {
        return String::new();
    }

    format!("Dependency missing. Install via Nala:\n  sudo nala install {}", pkgs.join(" "))
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Expand input patterns into a sorted, de-duplicated list of PDF files.
/// Entries naming an existing file are taken as-is; everything else is a glob.
pub fn enumerate_pdfs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, EnumerateError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let direct = Path::new(pattern);
        if direct.is_file() {
            paths.push(direct.to_path_buf());
            continue;
        }
        let (base, pat) = split_glob_base(pattern);
        let walker = match GlobWalkerBuilder::from_patterns(&base, &[pat.as_str()])
            .case_insensitive(true)
            .follow_links(false)
            .build()
        {
            Ok(w) => w,
            Err(_) => continue,
        };
        paths.extend(walker.filter_map(|e| e.ok()).map(|e| e.path().to_path_buf()));
    }

    paths.retain(|p| p.is_file());
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: input_guidance() });
    }
    Ok(paths)
}

/// Split a glob into the literal directory prefix to walk from and the
/// remaining pattern, e.g. `/data/in/**/*.pdf` -> (`/data/in`, `**/*.pdf`).
fn split_glob_base(pattern: &str) -> (PathBuf, String) {
    let is_glob = |c: &str| c.contains(['*', '?', '[', '{']);
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components[..components.len().saturating_sub(1)]
        .iter()
        .take_while(|c| !is_glob(c))
        .count();
    let mut base = components[..literal].join("/");
    if base.is_empty() {
        base = if pattern.starts_with('/') { "/".to_string() } else { ".".to_string() };
    }
    (PathBuf::from(base), components[literal..].join("/"))
}

fn input_guidance() -> String {
    let guide = r#"Tidak ada PDF yang cocok dengan pola input.
Letakkan hasil scan STP di ./input/ (mis. ./input/scan-01.pdf)
atau berikan path/pola secara langsung: nomor-rename "scans/**/*.pdf""#;
    guide.to_string()
}
