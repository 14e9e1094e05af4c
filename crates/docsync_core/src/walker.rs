use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

use crate::page::parse_file;
use crate::permalink::{PermalinkResolver, normalize_path};
use crate::record::SearchRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirectory {
    pub path: PathBuf,
    /// Path as walked from the build dir, e.g. `build/html/payments`; used for logs.
    pub label: String,
    /// Path inside the build dir, `""` for the build dir itself.
    pub relative_path: String,
}

pub struct SiteWalker {
    build_dir: PathBuf,
    excluded_fragments: Vec<String>,
    resolver: PermalinkResolver,
}

impl SiteWalker {
    pub fn new(build_dir: &Path, base_url: &str, excluded_fragments: &[String]) -> Self {
        Self {
            build_dir: build_dir.to_path_buf(),
            excluded_fragments: excluded_fragments.to_vec(),
            resolver: PermalinkResolver::new(build_dir, base_url),
        }
    }

    /// The build dir and every directory below it, parents before children.
    pub fn directories(&self) -> Result<Vec<BuildDirectory>> {
        if !self.build_dir.is_dir() {
            bail!("build directory not found: {}", self.build_dir.display());
        }

        let mut directories = Vec::new();
        for entry in WalkDir::new(&self.build_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry =
                entry.with_context(|| format!("failed to walk {}", self.build_dir.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path().to_path_buf();
            let relative_path = path
                .strip_prefix(&self.build_dir)
                .map(normalize_path)
                .unwrap_or_default();
            directories.push(BuildDirectory {
                label: normalize_path(&path),
                relative_path,
                path,
            });
        }
        Ok(directories)
    }

    pub fn is_excluded(&self, directory: &BuildDirectory) -> bool {
        is_excluded_path(&directory.relative_path, &self.excluded_fragments)
    }

    /// Records from every file directly inside `directory`, in file name order.
    /// Subdirectories are visited on their own by the outer walk, and
    /// non-page files are rejected by the doctype check in `parse_file`.
    pub fn scan_directory(&self, directory: &BuildDirectory) -> Result<Vec<SearchRecord>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&directory.path)
            .with_context(|| format!("failed to list {}", directory.path.display()))?
        {
            let entry =
                entry.with_context(|| format!("failed to list {}", directory.path.display()))?;
            files.push(entry.path());
        }
        files.sort();

        let mut records = Vec::new();
        for file in files {
            records.extend(parse_file(&file, &self.resolver)?);
        }
        Ok(records)
    }
}

/// Match `fragment`s such as `/reference/v1/` against the relative path with a
/// slash on both ends, so the named directory is excluded along with its children.
pub fn is_excluded_path(relative_path: &str, excluded_fragments: &[String]) -> bool {
    let trimmed = relative_path.trim_matches('/');
    let wrapped = if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    };
    excluded_fragments
        .iter()
        .any(|fragment| wrapped.contains(fragment.as_str()))
}
