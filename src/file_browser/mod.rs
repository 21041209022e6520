//! File picker shown when no file is given on the command line.
//!
//! Lists directories and FITS files (`.fits`, `.fit`, `.fts`, any case).

pub mod ui;

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions offered by the picker.
pub const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];

/// Returns `true` if `path` has a FITS extension.
pub fn is_fits_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FITS_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
}

/// One row of the picker.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path.
    pub path: PathBuf,
    /// Display name.
    pub name: String,
    /// Directory (symlinks resolved).
    pub is_dir: bool,
    /// File size in bytes, for files.
    pub size: Option<u64>,
}

/// File picker state.
#[derive(Debug)]
pub struct FileBrowserState {
    /// Directory being listed.
    pub current_dir: PathBuf,
    /// Listed entries: `..`, directories, then FITS files.
    pub entries: Vec<FileEntry>,
    /// Cursor position.
    pub cursor: usize,
    /// Scroll offset.
    pub scroll: usize,
    /// Show dot-prefixed entries.
    pub show_hidden: bool,
}

impl FileBrowserState {
    /// Picker rooted at the working directory.
    pub fn new() -> Self {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            entries: Vec::new(),
            cursor: 0,
            scroll: 0,
            show_hidden: false,
        }
    }

    /// Re-read the current directory.
    pub fn load_directory(&mut self) {
        self.entries.clear();

        if let Some(parent) = self.current_dir.parent() {
            self.entries.push(FileEntry {
                path: parent.to_path_buf(),
                name: "..".to_string(),
                is_dir: true,
                size: None,
            });
        }

        let dir_entries = match fs::read_dir(&self.current_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", self.current_dir.display(), e);
                return;
            },
        };

        for entry in dir_entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }

            // metadata() follows symlinks
            let metadata = path.metadata().ok();
            let is_dir = metadata.as_ref().is_some_and(|m| m.is_dir());
            if !is_dir && !is_fits_file(&path) {
                continue;
            }

            self.entries.push(FileEntry {
                path,
                name,
                is_dir,
                size: metadata.filter(|m| m.is_file()).map(|m| m.len()),
            });
        }

        self.entries.sort_by(|a, b| match (a.name == "..", b.name == "..") {
            (true, _) => Ordering::Less,
            (_, true) => Ordering::Greater,
            _ => b
                .is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        });

        self.cursor = 0;
        self.scroll = 0;
    }

    /// Move cursor up.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor down.
    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// Entry under the cursor.
    pub fn current_entry(&self) -> Option<&FileEntry> {
        self.entries.get(self.cursor)
    }

    /// Enter the selected directory, or return the selected file.
    pub fn select_current(&mut self) -> Option<PathBuf> {
        let entry = self.current_entry()?.clone();
        if entry.is_dir {
            self.current_dir = entry.path;
            self.load_directory();
            None
        } else {
            Some(entry.path)
        }
    }

    /// Go to the parent directory.
    pub fn go_to_parent(&mut self) {
        if let Some(parent) = self.current_dir.parent() {
            self.current_dir = parent.to_path_buf();
            self.load_directory();
        }
    }

    /// Toggle dot-prefixed entries.
    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        self.load_directory();
    }

    /// Keep the cursor inside a viewport of `viewport_height` rows.
    pub fn adjust_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        if self.cursor >= self.scroll + viewport_height {
            self.scroll = self.cursor + 1 - viewport_height;
        }
    }
}

impl Default for FileBrowserState {
    fn default() -> Self {
        Self::new()
    }
}
