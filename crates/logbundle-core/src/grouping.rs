use ahash::AHashMap;

use crate::file_metadata::FileMetadata;

/// An ordered cluster of files expected to compress well together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub id: u64,
    pub files: Vec<FileMetadata>,
}

/// Splits a file list into groups.
///
/// Implementations must cover the input exhaustively and disjointly, hand out
/// distinct ids within one call, and return the same layout for the same input.
pub trait FileGrouper {
    fn group(&self, files: &[FileMetadata]) -> Vec<FileGroup>;
}

/// Groups files that live in the same directory and whose names differ only in
/// their digits, e.g. `app.log`, `app.log.1`, `app-2024-01-02.log`.
///
/// Groups are ordered by the first appearance of their key in the input, and
/// members keep input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimilarFilenameGrouper;

impl FileGrouper for SimilarFilenameGrouper {
    fn group(&self, files: &[FileMetadata]) -> Vec<FileGroup> {
        let mut index_by_key: AHashMap<String, usize> = AHashMap::new();
        let mut groups: Vec<FileGroup> = Vec::new();

        for file in files {
            let key = similarity_key(file);
            let ix = *index_by_key.entry(key).or_insert_with(|| {
                groups.push(FileGroup {
                    id: groups.len() as u64,
                    files: Vec::new(),
                });
                groups.len() - 1
            });
            groups[ix].files.push(file.clone());
        }

        groups
    }
}

fn similarity_key(file: &FileMetadata) -> String {
    let parent = file
        .path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = file
        .path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut key = String::with_capacity(parent.len() + name.len() + 1);
    key.push_str(&parent);
    key.push('/');
    let mut in_digits = false;
    for c in name.chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                key.push('#');
            }
            in_digits = true;
        } else {
            key.push(c);
            in_digits = false;
        }
    }
    key
}
