//! Input resolution: list the scanned page images in the input folder.
//!
//! ## Why sort by file name?
//!
//! Scanners and phone apps number pages sequentially (`page_01.jpg`,
//! `page_02.jpg`, ...). Cross-page reconciliation only works when images are
//! visited in page order, and the file name is the only page-order signal we
//! have. Directory iteration order is filesystem-dependent, so it is never
//! used directly.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Return `true` if the path has a supported image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// List the image files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A folder with no images is not an
/// error; the caller decides what an empty run means.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    if !dir.exists() {
        return Err(ExtractError::InputFolderNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(ExtractError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let read_failed = |source| ExtractError::InputReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        let path = entry.map_err(read_failed)?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("Found {} images in {}", images.len(), dir.display());
    Ok(images)
}

/// File name of `path` as a displayable string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image_path(Path::new("a.PNG")));
        assert!(is_image_path(Path::new("a.Jpeg")));
        assert!(is_image_path(Path::new("dir/b.jpg")));
        assert!(!is_image_path(Path::new("a.pdf")));
        assert!(!is_image_path(Path::new("png")));
        assert!(!is_image_path(Path::new("a.png.txt")));
    }

    #[test]
    fn lists_images_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["page_03.jpg", "page_01.PNG", "notes.txt", "page_02.jpeg"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<String> = scan_folder(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, ["page_01.PNG", "page_02.jpeg", "page_03.jpg"]);
    }

    #[test]
    fn empty_folder_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(scan_folder(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_folder(&missing),
            Err(ExtractError::InputFolderNotFound { .. })
        ));
    }

    #[test]
    fn file_instead_of_folder_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.png");
        assert!(matches!(
            scan_folder(&dir.path().join("a.png")),
            Err(ExtractError::NotADirectory { .. })
        ));
    }
}
