use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::{archive_dir, ArchiveError};
use crate::billing::BillingDetector;
use crate::config::{BillingConfig, RenameConfig};
use crate::extract::{extract, ReferenceNumber};
use crate::normalize::normalize;
use crate::observer::{Event, Observer};
use crate::ocr::{OcrEngine, OcrError};
use crate::pdf::PdfCopier;
use crate::raster::{CropBox, RasterError, Rasterizer};
use crate::report::{sha256_hex, BatchOutcome, FailureStage, RenameResult, UnitFailure};
use crate::split::Splitter;
use crate::workspace::Workspace;

pub const UNKNOWN_PREFIX: &str = "UNKNOWN_";

/// An uploaded PDF: its bytes and the filename it arrived with.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok(Self { name, bytes: fs::read(path)? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub dpi: u32,
    pub crop: CropBox,
    pub ocr_lang: String,
    pub split: bool,
    pub billing: BillingConfig,
    pub archive_path: PathBuf,
    /// Where normalized OCR text is dumped per unit, if anywhere.
    pub dump_dir: Option<PathBuf>,
}

impl From<&RenameConfig> for PipelineOptions {
    fn from(cfg: &RenameConfig) -> Self {
        Self {
            dpi: cfg.dpi,
            crop: cfg.crop_box(),
            ocr_lang: cfg.ocr_lang.clone(),
            split: cfg.split,
            billing: cfg.billing.clone(),
            archive_path: cfg.archive_path(),
            dump_dir: cfg.dump_ocr.then(|| cfg.output_dir.join("ocr")),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Archive failed: {0}")]
    Archive(#[from] ArchiveError),
}

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Drives upload, optional splitting, OCR identification, renaming and
/// archiving for a batch. Units are processed one at a time; a failing unit
/// never stops the batch.
pub struct Pipeline<'a> {
    pub options: PipelineOptions,
    pub rasterizer: &'a dyn Rasterizer,
    pub ocr: &'a dyn OcrEngine,
    pub copier: &'a dyn PdfCopier,
    pub observer: &'a dyn Observer,
}

struct Unit {
    id: String,
    /// Unique within the batch; names the OCR dump file.
    key: String,
    path: PathBuf,
    fallback: Fallback,
}

enum Fallback {
    Named(String),
    Counter,
}

impl<'a> Pipeline<'a> {
    pub fn run(&self, inputs: &[InputDocument], workspace: &Workspace) -> Result<BatchOutcome, PipelineError> {
        let detector = BillingDetector::with_keyword(self.ocr, &self.options.billing.lang, &self.options.billing.keyword);
        let splitter = Splitter {
            copier: self.copier,
            rasterizer: self.rasterizer,
            detector: &detector,
            observer: self.observer,
            dpi: self.options.billing.dpi,
        };

        let mut uploads = UniqueNames::default();
        let mut outputs = UniqueNames::default();
        let mut unknown_counter = 0usize;
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for (idx, input) in inputs.iter().enumerate() {
            let safe = uploads.reserve(&safe_name(&input.name));
            let upload_path = workspace.upload_dir().join(&safe);
            match fs::write(&upload_path, &input.bytes) {
                Ok(()) => self.observer.notify(&Event::Uploaded {
                    source: input.name.clone(),
                    path: upload_path.display().to_string(),
                    bytes: input.bytes.len(),
                }),
                Err(e) => {
                    self.fail(&mut failures, &input.name, FailureStage::Upload, e.to_string());
                    self.observer.notify(&Event::Progress { done: idx + 1, total: inputs.len() });
                    continue;
                }
            }

            let units: Vec<Unit> = if self.options.split {
                match splitter.split_document(&upload_path, file_stem(&safe), &workspace.split_dir()) {
                    Ok(chunks) if chunks.is_empty() => {
                        self.fail(&mut failures, &input.name, FailureStage::Split, "document has no pages".into());
                        Vec::new()
                    }
                    Ok(chunks) => chunks
                        .into_iter()
                        .map(|c| Unit { key: c.id.clone(), id: c.id, path: c.path, fallback: Fallback::Counter })
                        .collect(),
                    Err(e) => {
                        self.fail(&mut failures, &input.name, FailureStage::Split, e.to_string());
                        Vec::new()
                    }
                }
            } else {
                vec![Unit {
                    id: input.name.clone(),
                    key: safe.clone(),
                    path: upload_path,
                    fallback: Fallback::Named(format!("{}{}.pdf", UNKNOWN_PREFIX, file_stem(&safe))),
                }]
            };

            for unit in units {
                let reference = self.identify_unit(&unit.id, &unit.key, &unit.path);
                let wanted = match (&reference, &unit.fallback) {
                    (Some(r), _) => r.file_name(),
                    (None, Fallback::Named(name)) => name.clone(),
                    (None, Fallback::Counter) => {
                        unknown_counter += 1;
                        format!("{}{}.pdf", UNKNOWN_PREFIX, unknown_counter)
                    }
                };
                let output = outputs.reserve(&wanted);
                let dst = workspace.result_dir().join(&output);
                match self.copier.copy_all(&unit.path, &dst) {
                    Ok(()) => {
                        let sha256 = match fs::read(&dst) {
                            Ok(bytes) => sha256_hex(&bytes),
                            Err(e) => {
                                self.observer.notify(&Event::ChecksumFailed {
                                    unit: unit.id.clone(),
                                    message: e.to_string(),
                                });
                                String::new()
                            }
                        };
                        self.observer.notify(&Event::Renamed {
                            unit: unit.id.clone(),
                            output: output.clone(),
                            reference: reference.as_ref().map(|r| r.to_string()),
                        });
                        results.push(RenameResult { source: unit.id, output, reference, sha256 });
                    }
                    Err(e) => self.fail(&mut failures, &unit.id, FailureStage::Copy, e.to_string()),
                }
            }

            self.observer.notify(&Event::Progress { done: idx + 1, total: inputs.len() });
        }

        let archive = self.options.archive_path.clone();
        let archive_entries = archive_dir(&workspace.result_dir(), &archive)?;
        self.observer.notify(&Event::Archived {
            path: archive.display().to_string(),
            entries: archive_entries.len(),
        });

        let outcome = BatchOutcome { results, failures, archive, archive_entries };
        self.observer.notify(&Event::Finished {
            renamed: outcome.resolved(),
            unresolved: outcome.unresolved(),
            failed: outcome.failures.len(),
        });
        Ok(outcome)
    }

    /// OCR the header region of the first page and look for the reference
    /// number. Rendering and OCR errors are reported and count as "not found".
    pub fn identify(&self, unit: &str, pdf: &Path) -> Option<ReferenceNumber> {
        self.identify_unit(unit, &safe_name(unit), pdf)
    }

    fn identify_unit(&self, unit: &str, key: &str, pdf: &Path) -> Option<ReferenceNumber> {
        match self.read_header(pdf) {
            Ok(raw) => {
                let text = normalize(&raw);
                self.observer.notify(&Event::OcrPreview { unit: unit.to_string(), text: text.clone() });
                if let Some(dir) = &self.options.dump_dir {
                    let path = dir.join(format!("{}.txt", key));
                    if let Err(e) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, &text)) {
                        self.observer.notify(&Event::DumpFailed {
                            unit: unit.to_string(),
                            path: path.display().to_string(),
                            message: e.to_string(),
                        });
                    }
                }
                extract(&text)
            }
            Err(e) => {
                self.observer.notify(&Event::OcrFailed { unit: unit.to_string(), message: e.to_string() });
                None
            }
        }
    }

    fn read_header(&self, pdf: &Path) -> Result<String, IdentifyError> {
        let page = self.rasterizer.render_page(pdf, 0, self.options.dpi)?;
        let header = self.options.crop.apply(&page);
        Ok(self.ocr.recognize(&header, &self.options.ocr_lang)?)
    }

    fn fail(&self, failures: &mut Vec<UnitFailure>, source: &str, stage: FailureStage, message: String) {
        self.observer.notify(&Event::UnitFailed {
            unit: source.to_string(),
            stage: stage.as_str().to_string(),
            message: message.clone(),
        });
        failures.push(UnitFailure { source: source.to_string(), stage, message });
    }
}

/// Bare file name with spaces replaced by underscores.
pub fn safe_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let base = base.trim_start_matches('.');
    if base.is_empty() {
        "document.pdf".to_string()
    } else {
        base.replace(' ', "_")
    }
}

fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case("pdf") => stem,
        _ => name,
    }
}

/// Hands out file names that are unique within one directory by appending
/// `-1`, `-2`, ... before the extension.
#[derive(Debug, Default)]
pub struct UniqueNames {
    used: HashSet<String>,
}

impl UniqueNames {
    pub fn reserve(&mut self, name: &str) -> String {
        if self.used.insert(name.to_lowercase()) {
            return name.to_string();
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((s, e)) if !s.is_empty() => (s, format!(".{}", e)),
            _ => (name, String::new()),
        };
        let mut i = 1;
        loop {
            let candidate = format!("{}-{}{}", stem, i, ext);
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_name_strips_dirs_and_spaces() {
        assert_eq!(safe_name("scan 01.pdf"), "scan_01.pdf");
        assert_eq!(safe_name("../../etc/x y.pdf"), "x_y.pdf");
        assert_eq!(safe_name(""), "document.pdf");
    }

    #[test]
    fn unique_names_suffix_before_extension() {
        let mut names = UniqueNames::default();
        assert_eq!(names.reserve("1234.5.6.7.8.pdf"), "1234.5.6.7.8.pdf");
        assert_eq!(names.reserve("1234.5.6.7.8.pdf"), "1234.5.6.7.8-1.pdf");
        assert_eq!(names.reserve("1234.5.6.7.8.pdf"), "1234.5.6.7.8-2.pdf");
        assert_eq!(names.reserve("README"), "README");
        assert_eq!(names.reserve("readme"), "readme-1");
    }

    #[test]
    fn unique_names_skip_taken_suffix() {
        let mut names = UniqueNames::default();
        names.reserve("a-1.pdf");
        names.reserve("a.pdf");
        assert_eq!(names.reserve("a.pdf"), "a-2.pdf");
    }

    #[test]
    fn file_stem_drops_pdf_extension() {
        assert_eq!(file_stem("scan_01.pdf"), "scan_01");
        assert_eq!(file_stem("scan_01.PDF"), "scan_01");
        assert_eq!(file_stem("noext"), "noext");
    }
}
