//! Archive extraction for compressed uploads.
//!
//! Shapefiles typically arrive as a zip or tar archive. Extraction is
//! path-traversal safe, and locating the real content root below the
//! extraction directory uses a bounded loop rather than recursion.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use super::DatasetError;

/// Maximum depth walked when resolving wrapper directory chains.
const MAX_ROOT_DESCENT: usize = 32;

/// Extracts a compressed upload next to the source file and returns the
/// content root. Uncompressed files are returned as-is.
///
/// Supported archive formats: zip, tar, tar.gz/tgz (detected from the
/// file name).
pub fn extract_archive(src_file: &Path) -> Result<PathBuf, DatasetError> {
    if src_file.is_dir() {
        return resolve_extracted_root(src_file);
    }

    let dest = src_file
        .parent()
        .ok_or_else(|| DatasetError::Read("upload has no parent directory".to_string()))?;

    let name = src_file
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        extract_zip(src_file, dest)?;
        resolve_extracted_root(dest)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let file = File::open(src_file)?;
        extract_tar(Archive::new(GzDecoder::new(BufReader::new(file))), dest)?;
        resolve_extracted_root(dest)
    } else if name.ends_with(".tar") {
        let file = File::open(src_file)?;
        extract_tar(Archive::new(BufReader::new(file)), dest)?;
        resolve_extracted_root(dest)
    } else {
        Ok(src_file.to_path_buf())
    }
}

fn extract_zip(src_file: &Path, dest: &Path) -> Result<(), DatasetError> {
    let file = File::open(src_file)?;
    let mut zip_archive = zip::ZipArchive::new(file)
        .map_err(|e| DatasetError::Read(format!("failed to open zip archive: {e}")))?;

    for i in 0..zip_archive.len() {
        let mut entry = zip_archive
            .by_index(i)
            .map_err(|e| DatasetError::Read(format!("failed to read zip entry: {e}")))?;

        let rel_path = sanitize_entry_path(entry.name())?;
        let out_path = dest.join(rel_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;
    }

    Ok(())
}

fn extract_tar<R: std::io::Read>(mut tar: Archive<R>, dest: &Path) -> Result<(), DatasetError> {
    for entry in tar
        .entries()
        .map_err(|e| DatasetError::Read(format!("failed to read tar entries: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| DatasetError::Read(format!("failed to read tar entry: {e}")))?;
        let entry_path = entry
            .path()
            .map_err(|e| DatasetError::Read(format!("invalid tar entry path: {e}")))?
            .to_string_lossy()
            .to_string();
        let rel_path = sanitize_entry_path(&entry_path)?;
        let out_path = dest.join(rel_path);

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&out_path)
            .map_err(|e| DatasetError::Read(format!("failed to unpack tar entry: {e}")))?;
    }

    Ok(())
}

/// Rejects absolute paths and parent-directory components in archive
/// entry names.
fn sanitize_entry_path(name: &str) -> Result<PathBuf, DatasetError> {
    let path = Path::new(name);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(DatasetError::Read(format!(
                    "archive entry escapes extraction directory: {name}"
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(DatasetError::Read(format!("empty archive entry: {name}")));
    }
    Ok(clean)
}

/// Walks wrapper-directory chains down to the real content root.
///
/// Archives are often built with one or more wrapper directories; each
/// level descends into the (lexicographically) first non-hidden
/// subdirectory until a level without subdirectories is reached. The
/// walk is bounded to [`MAX_ROOT_DESCENT`] levels so crafted archives
/// cannot drive it arbitrarily deep.
pub fn resolve_extracted_root(dir: &Path) -> Result<PathBuf, DatasetError> {
    let mut current = dir.to_path_buf();

    for _ in 0..MAX_ROOT_DESCENT {
        let mut subdirectories: Vec<PathBuf> = std::fs::read_dir(&current)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                !entry.file_name().to_string_lossy().starts_with('.') && entry.path().is_dir()
            })
            .map(|entry| entry.path())
            .collect();
        subdirectories.sort();

        match subdirectories.into_iter().next() {
            Some(first) => current = first,
            None => return Ok(current),
        }
    }

    Err(DatasetError::Read(format!(
        "directory nesting deeper than {MAX_ROOT_DESCENT} levels under {}",
        dir.display()
    )))
}
