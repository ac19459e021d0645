use std::path::PathBuf;
use std::process::Command;

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("tesseract not available: {0}")]
    Unavailable(String),
    #[error("tesseract_exit_{0}: {1}")]
    Failed(i32, String),
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns an image into text. `lang` uses tesseract's `eng+ind` syntax.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, OcrError>;
}

/// The `tesseract` command-line engine, reading a PNG and printing to stdout.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    psm: Option<u8>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self { program: PathBuf::from("tesseract"), psm: None }
    }
}

impl TesseractEngine {
    pub fn new(psm: Option<u8>) -> Self {
        Self { psm, ..Self::default() }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, OcrError> {
        let tmp = tempfile::tempdir()?;
        let img_path = tmp.path().join("ocr.png");
        image.save(&img_path)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(&img_path).arg("stdout").arg("-l").arg(lang);
        if let Some(psm) = self.psm {
            cmd.arg("--psm").arg(psm.to_string());
        }
        let out = cmd.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OcrError::Unavailable(self.program.display().to_string()),
            _ => OcrError::Io(e),
        })?;
        if !out.status.success() {
            return Err(OcrError::Failed(
                out.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}
