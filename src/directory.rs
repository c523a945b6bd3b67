//! # Directory Listing Module
//!
//! Non-recursive, extension filtered listing of still images in a directory.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Extensions of still images the `image` crate can usually decode.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "png", "bmp", "dib", "tif", "tiff"];

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// List the regular files in `dir` whose extension is one of `extensions`, sorted by path.
///
/// Extensions are compared case-insensitively and may be given with or without a leading dot.
pub(crate) fn list_images<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
        .collect();

    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::DirectoryListError(dir.to_path_buf(), e))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, &wanted))
        .collect();

    files.sort();

    Ok(files)
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn has_extension(path: &Path, wanted: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .map_or(false, |e| wanted.iter().any(|w| *w == e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["c.jpg", "a.jpg", "b.JPG", "notes.txt", "d.png", "noext"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        touch(&dir.path().join("nested.jpg"), "inner.jpg");

        let files = list_images(dir.path(), &[".jpg"]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.JPG", "c.jpg"]);
    }

    #[test]
    fn test_multiple_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["1.png", "2.bmp", "3.jpg", "4.gif"] {
            touch(dir.path(), name);
        }

        let files = list_images(dir.path(), &["png", ".bmp", "jpg"]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(list_images(dir.path(), IMAGE_EXTENSIONS).unwrap().len() == 3);
    }

    #[test]
    fn test_extension_matching() {
        let wanted = vec!["jpg".to_string()];

        assert!(has_extension(Path::new("a/b.JpG"), &wanted));
        assert!(!has_extension(Path::new("a/b.jpg.txt"), &wanted));
        // A dotfile has no extension
        assert!(!has_extension(Path::new("a/.jpg"), &wanted));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        match list_images(&dir.path().join("gone"), &["jpg"]) {
            Err(Error::DirectoryListError(_, _)) => (),
            other => panic!("Expected a listing error, got {:?}", other)
        }
    }
}
