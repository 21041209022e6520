//! Memory-mapped FITS file handle.

use crate::error::{FitsViewError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A FITS file opened read-only through a memory mapping.
///
/// The mapping is released on [`FitsFile::close`] or when the handle is
/// dropped. Reads after `close` fail with [`FitsViewError::FileClosed`].
#[derive(Debug)]
pub struct FitsFile {
    path: PathBuf,
    map: Option<Mmap>,
}

impl FitsFile {
    /// Open and map `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(FitsViewError::FileNotFound { path });
        }

        let file = File::open(&path).map_err(|e| FitsViewError::file_open(path.clone(), e))?;
        let len = file
            .metadata()
            .map_err(|e| FitsViewError::file_open(path.clone(), e))?
            .len();
        if len == 0 {
            return Err(FitsViewError::invalid("file is empty"));
        }

        // SAFETY: the file is opened read-only and never written through this
        // process; slices handed out borrow the mapping.
        #[allow(unsafe_code)]
        let map = unsafe { Mmap::map(&file) }.map_err(|e| FitsViewError::file_open(path.clone(), e))?;

        tracing::info!("Mapped {} ({} bytes)", path.display(), map.len());
        Ok(Self {
            path,
            map: Some(map),
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mapped file contents.
    pub fn bytes(&self) -> Result<&[u8]> {
        self.map.as_deref().ok_or(FitsViewError::FileClosed)
    }

    /// Byte slice `range` of the file.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Result<&[u8]> {
        self.bytes()?
            .get(range)
            .ok_or_else(|| FitsViewError::invalid("read past the end of the file"))
    }

    /// Release the mapping. Idempotent.
    pub fn close(&mut self) {
        if self.map.take().is_some() {
            tracing::info!("Closed {}", self.path.display());
        }
    }

    /// Returns `true` until [`FitsFile::close`] is called.
    pub fn is_open(&self) -> bool {
        self.map.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = FitsFile::open("/definitely/not/here.fits").unwrap_err();
        assert!(matches!(err, FitsViewError::FileNotFound { .. }));
    }

    #[test]
    fn reads_fail_after_close() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[b' '; 2880]).unwrap();

        let mut file = FitsFile::open(tmp.path()).unwrap();
        assert_eq!(file.bytes().unwrap().len(), 2880);

        file.close();
        assert!(!file.is_open());
        assert!(matches!(file.bytes(), Err(FitsViewError::FileClosed)));
        file.close();
    }
}
