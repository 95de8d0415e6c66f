//! Saved media list: a flat text file of absolute paths, one per line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ApexError, Result};

#[derive(Debug, Clone)]
pub struct Playlist {
    path: PathBuf,
}

impl Playlist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn wrap(&self, source: std::io::Error) -> ApexError {
        ApexError::Playlist {
            path: self.path.clone(),
            source,
        }
    }

    /// Create the file (and its directory) empty if it is missing.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.wrap(e))?;
        }
        fs::File::create(&self.path).map_err(|e| self.wrap(e))?;
        tracing::info!("created playlist file {}", self.path.display());
        Ok(())
    }

    pub fn append(&self, media: &Path) -> Result<()> {
        self.ensure_exists()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.wrap(e))?;
        writeln!(file, "{}", media.display()).map_err(|e| self.wrap(e))?;
        tracing::debug!("saved {} to playlist", media.display());
        Ok(())
    }

    /// Every listed path that still exists on disk, in file order.
    ///
    /// A missing playlist file reads as empty.
    pub fn load_existing(&self) -> Result<Vec<PathBuf>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.wrap(e)),
        };

        let mut entries = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let candidate = PathBuf::from(line);
            if candidate.exists() {
                entries.push(candidate);
            } else {
                tracing::debug!("skipping missing playlist entry {}", line);
            }
        }
        Ok(entries)
    }
}
