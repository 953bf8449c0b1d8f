use std::path::{Path, PathBuf};

use eyre::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::errors::ConfigError;

/// A regular file picked up from the local source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name only; this is what the report and naming strategy see.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Exclude patterns matched against file names (e.g. `*.tmp`, `.DS_Store`).
#[derive(Debug, Clone)]
pub struct FileFilter {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl FileFilter {
    pub fn new<I, S>(patterns: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|err| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: err.to_string(),
            })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|err| ConfigError::InvalidPattern {
            pattern: patterns.join(","),
            message: err.to_string(),
        })?;
        Ok(Self { patterns, globs })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn allows(&self, name: &str) -> bool {
        !self.globs.is_match(name)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            globs: GlobSet::empty(),
        }
    }
}

/// List regular files directly under `root`, sorted by file name.
///
/// Subdirectories are skipped and symlinks are followed. Entries that cannot
/// be read (e.g. dangling links) are logged and left out.
pub fn enumerate_files(root: &Path, filter: &FileFilter) -> Result<Vec<LocalFile>> {
    if !root.exists() {
        bail!("local directory does not exist: {}", root.display());
    }
    if !root.is_dir() {
        bail!("local path is not a directory: {}", root.display());
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            debug!("skipping non-file entry {}", entry.path().display());
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.allows(&name) {
            debug!("excluded {}", name);
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!("skipping {}: {}", entry.path().display(), err);
                continue;
            }
        };
        files.push(LocalFile {
            name,
            path: entry.into_path(),
            size,
        });
    }

    Ok(files)
}
