use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

pub const UPLOAD_DIR: &str = "upload_pdf";
pub const SPLIT_DIR: &str = "split_pdf";
pub const RESULT_DIR: &str = "hasil_rename";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to reset workspace directory {path}: {source}")]
    Reset { path: String, source: std::io::Error },
    #[error("Failed to create temporary workspace: {0}")]
    Temp(std::io::Error),
}

/// Working directories for one run: uploads, split intermediates and
/// renamed outputs.
///
/// A temporary workspace is removed when the value is dropped. A workspace at
/// a fixed root is wiped and recreated on creation and left in place afterwards.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl Workspace {
    pub fn temporary() -> Result<Self, WorkspaceError> {
        let temp = tempfile::Builder::new()
            .prefix("nomor-rename-")
            .tempdir()
            .map_err(WorkspaceError::Temp)?;
        let root = temp.path().to_path_buf();
        let ws = Self { root, temp: Some(temp) };
        ws.reset()?;
        Ok(ws)
    }

    /// Destroys any previous contents of the working directories under `root`.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let ws = Self { root: root.into(), temp: None };
        ws.reset()?;
        Ok(ws)
    }

    pub fn create(root: Option<&Path>) -> Result<Self, WorkspaceError> {
        match root {
            Some(r) => Self::at(r),
            None => Self::temporary(),
        }
    }

    fn reset(&self) -> Result<(), WorkspaceError> {
        for dir in [self.upload_dir(), self.split_dir(), self.result_dir()] {
            let wrap = |source| WorkspaceError::Reset { path: dir.display().to_string(), source };
            if dir.exists() {
                fs::remove_dir_all(&dir).map_err(wrap)?;
            }
            fs::create_dir_all(&dir).map_err(wrap)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.join(UPLOAD_DIR)
    }

    pub fn split_dir(&self) -> PathBuf {
        self.root.join(SPLIT_DIR)
    }

    pub fn result_dir(&self) -> PathBuf {
        self.root.join(RESULT_DIR)
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_root_is_wiped_on_create() {
        let td = tempfile::tempdir().unwrap();
        let stale = td.path().join(RESULT_DIR).join("old.pdf");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"x").unwrap();

        let ws = Workspace::at(td.path()).unwrap();
        assert!(!stale.exists());
        assert!(ws.upload_dir().is_dir());
        assert!(ws.split_dir().is_dir());
        assert!(ws.result_dir().is_dir());
        assert!(!ws.is_temporary());
    }

    #[test]
    fn temporary_is_removed_on_drop() {
        let ws = Workspace::temporary().unwrap();
        let root = ws.root().to_path_buf();
        assert!(ws.result_dir().is_dir());
        drop(ws);
        assert!(!root.exists());
    }
}
