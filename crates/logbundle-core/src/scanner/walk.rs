use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, trace};
use walkdir::WalkDir;

use crate::error::Error;
use crate::file_metadata::FileMetadata;

/// Everything found under the input roots, in walk order.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<FileMetadata>,
    pub empty_directories: Vec<PathBuf>,
}

/// Walk each root in sorted order, skipping symlinks and anything matching an
/// ignore glob. Roots may be plain files. Unreadable directories are logged
/// and skipped.
pub fn discover(roots: &[PathBuf], ignore_globs: &[String]) -> Result<Discovery, Error> {
    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut empty_directories: Vec<PathBuf> = Vec::new();

    for root in roots {
        visit_root(root, &ignore_patterns, &mut candidates, &mut empty_directories)?;
    }

    let files = candidates
        .par_iter()
        .map(|path| FileMetadata::from_path(path))
        .collect::<io::Result<Vec<_>>>()?;

    Ok(Discovery {
        files,
        empty_directories,
    })
}

fn visit_root(
    root: &Path,
    ignore_patterns: &[Pattern],
    candidates: &mut Vec<PathBuf>,
    empty_directories: &mut Vec<PathBuf>,
) -> Result<(), Error> {
    if !root.exists() {
        error!("Input path {} does not exist, skipping", root.display());
        return Ok(());
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path(), ignore_patterns));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.io_error().map(|e| e.kind()) == Some(io::ErrorKind::PermissionDenied) {
                    error!("Access denied while walking {}: {}", root.display(), err);
                    continue;
                }
                return Err(Error::Io(err.into()));
            }
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            let mut children = match fs::read_dir(entry.path()) {
                Ok(children) => children,
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                    error!("Access denied to directory {}: {}", entry.path().display(), err);
                    continue;
                }
                Err(err) => return Err(Error::Io(err)),
            };
            if children.next().is_none() {
                trace!("Found empty directory {}", entry.path().display());
                empty_directories.push(entry.into_path());
            }
        } else if file_type.is_file() {
            trace!("Found {}", entry.path().display());
            candidates.push(entry.into_path());
        }
    }

    Ok(())
}

fn is_ignored(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(path))
}

/// Read a newline-separated list of input paths, ignoring blank lines.
pub fn read_path_list(list_path: &Path) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(list_path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_walks_sorted_and_records_empty_dirs() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("a/empty")).unwrap();
        fs::write(root.join("b/2.log"), "two").unwrap();
        fs::write(root.join("b/1.log"), "one!").unwrap();
        fs::write(root.join("a/x.log"), "x").unwrap();

        let found = discover(&[root.to_path_buf()], &[]).unwrap();
        let names: Vec<PathBuf> = found
            .files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a/x.log"),
                PathBuf::from("b/1.log"),
                PathBuf::from("b/2.log"),
            ]
        );
        assert_eq!(found.files[1].size, 4);
        assert_eq!(found.empty_directories, vec![root.join("a/empty")]);
    }

    #[test]
    fn test_discover_honors_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("skip")).unwrap();
        fs::write(root.join("skip/ignored.log"), "nope").unwrap();
        fs::write(root.join("kept.log"), "yes").unwrap();
        fs::write(root.join("kept.tmp"), "nope").unwrap();

        let ignore = vec!["*/skip".to_string(), "*.tmp".to_string()];
        let found = discover(&[root.to_path_buf()], &ignore).unwrap();
        assert_eq!(found.files.len(), 1);
        assert!(found.files[0].path.ends_with("kept.log"));
    }

    #[test]
    fn test_discover_accepts_file_roots_and_missing_paths() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("single.log");
        fs::write(&file, "abc").unwrap();

        let found = discover(&[file.clone(), tmp.path().join("missing")], &[]).unwrap();
        assert_eq!(found.files.len(), 1);
        assert_eq!(found.files[0].path, file);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("ok")).unwrap();
        fs::write(root.join("ok/a.log"), "a").unwrap();
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.log"), "hidden").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let found = discover(&[root.to_path_buf()], &[]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let found = found.unwrap();
        assert_eq!(found.files.len(), 1);
        assert!(found.files[0].path.ends_with("ok/a.log"));
        assert!(found.empty_directories.is_empty());
    }

    #[test]
    fn test_read_path_list_skips_blank_lines() {
        let tmp = tempdir().unwrap();
        let list = tmp.path().join("inputs.txt");
        fs::write(&list, "/var/log/a\n\n  /var/log/b  \n").unwrap();
        assert_eq!(read_path_list(&list).unwrap(), vec!["/var/log/a", "/var/log/b"]);
    }
}
