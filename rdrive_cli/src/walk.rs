use anyhow::{Context, Result};
use rdrive::upload::UploadEntry;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A local file together with its path relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// `None` for files given directly on the command line.
    pub relative_path: Option<String>,
}

/// Collects the files below `path`. A directory contributes its own name as the
/// first segment of every relative path.
pub fn collect(path: &Path) -> Result<Vec<LocalFile>> {
    let metadata = fs::metadata(path).with_context(|| format!("cannot read {}", path.display()))?;
    if !metadata.is_dir() {
        return Ok(vec![LocalFile {
            path: path.to_owned(),
            relative_path: None,
        }]);
    }
    let root = path
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut files = Vec::new();
    walk(path, &root, &mut files)?;
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut Vec<LocalFile>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&entry.path(), &relative, files)?;
        } else if file_type.is_file() {
            files.push(LocalFile {
                path: entry.path(),
                relative_path: Some(relative),
            });
        }
    }
    Ok(())
}

/// Creates upload entries for local files, guessing the MIME type from the extension.
pub async fn entries(files: Vec<LocalFile>) -> Result<Vec<UploadEntry>> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let mut entry = UploadEntry::from_file(&file.path)
            .await
            .with_context(|| format!("cannot read {}", file.path.display()))?;
        if let Some(mime) = mime_guess::from_path(&file.path).first() {
            entry = entry.with_mime_type(mime.essence_str());
        }
        if let Some(relative_path) = file.relative_path {
            entry = entry.with_relative_path(relative_path);
        }
        entries.push(entry);
    }
    Ok(entries)
}
