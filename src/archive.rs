use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_NAME: &str = "rename_result.zip";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read output directory: {0}")]
    ReadDir(io::Error),
    #[error("Failed to write archive: {0}")]
    Write(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Zip every regular file directly inside `dir` into `zip_path` (deflate),
/// stored under its bare file name. Returns the entry names in archive order.
pub fn archive_dir(dir: &Path, zip_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .map_err(ArchiveError::ReadDir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if let Some(parent) = zip_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => continue,
        };
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&fs::read(&path)?)?;
        entries.push(name);
    }
    zip.finish()?;
    Ok(entries)
}
