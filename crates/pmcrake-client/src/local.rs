//! Local XML access: single files and directory walks. No parsing here,
//! just bytes plus errors precise enough for the ledger.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};

pub fn read_xml(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(ClientError::NotFound(path.display().to_string()));
    }
    fs::read(path).map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// All `*.xml` files directly inside `dir`, sorted lexicographically so
/// batch runs over a directory are deterministic.
pub fn walk_xml_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ClientError::NotFound(dir.display().to_string()));
    }
    let entries = fs::read_dir(dir).map_err(|source| ClientError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ClientError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_xml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xml"))
            .unwrap_or(false);
        if path.is_file() && is_xml {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = read_xml(Path::new("/nonexistent/article.xml")).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn reads_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xml");
        File::create(&path)
            .unwrap()
            .write_all(b"<article/>")
            .unwrap();
        assert_eq!(read_xml(&path).unwrap(), b"<article/>");
    }

    #[test]
    fn walk_returns_sorted_xml_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xml", "a.XML", "c.txt", "z.xml"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let names: Vec<String> = walk_xml_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.XML", "b.xml", "z.xml"]);
    }

    #[test]
    fn walking_a_missing_dir_is_not_found() {
        assert!(matches!(
            walk_xml_dir(Path::new("/nonexistent/dir")),
            Err(ClientError::NotFound(_))
        ));
    }
}
