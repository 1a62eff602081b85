use crate::file_metadata::FileMetadata;

/// Working set of files destined for one archive.
#[derive(Debug, Default)]
pub struct FilesPartition {
    files: Vec<FileMetadata>,
    group_ids: Vec<u64>,
    total_size: u64,
}

/// Everything a partition held at the moment it was drained. The parallel
/// vectors share one index space and keep insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainedPartition {
    pub files: Vec<FileMetadata>,
    pub file_paths: Vec<String>,
    pub group_ids: Vec<u64>,
    pub st_sizes: Vec<u64>,
    pub total_size: u64,
}

impl DrainedPartition {
    /// Sum of on-disk sizes, as opposed to the estimated `total_size`.
    pub fn original_size(&self) -> u64 {
        self.st_sizes.iter().sum()
    }
}

impl FilesPartition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: FileMetadata, group_id: u64) {
        self.total_size += file.estimated_uncompressed_size;
        self.files.push(file);
        self.group_ids.push(group_id);
    }

    /// Accumulated estimated size.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn has_members(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn files(&self) -> &[FileMetadata] {
        &self.files
    }

    pub fn drain(&mut self) -> DrainedPartition {
        let files = std::mem::take(&mut self.files);
        let group_ids = std::mem::take(&mut self.group_ids);
        let total_size = std::mem::replace(&mut self.total_size, 0);

        let file_paths = files.iter().map(FileMetadata::path_string).collect();
        let st_sizes = files.iter().map(|f| f.size).collect();

        DrainedPartition {
            files,
            file_paths,
            group_ids,
            st_sizes,
            total_size,
        }
    }

    /// Put back the contents of a drain whose submission failed. Anything added
    /// since the drain stays after the restored members.
    pub fn restore(&mut self, drained: DrainedPartition) {
        let DrainedPartition {
            mut files,
            mut group_ids,
            total_size,
            ..
        } = drained;
        files.append(&mut self.files);
        group_ids.append(&mut self.group_ids);
        self.files = files;
        self.group_ids = group_ids;
        self.total_size += total_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tracks_estimated_size() {
        let mut partition = FilesPartition::new();
        assert!(!partition.has_members());
        assert_eq!(partition.total_size(), 0);

        partition.add(FileMetadata::with_estimate("/a.log", 10, 100), 0);
        partition.add(FileMetadata::with_estimate("/b.log", 20, 200), 7);

        assert!(partition.has_members());
        assert_eq!(partition.total_size(), 300);
    }

    #[test]
    fn test_drain_returns_parallel_vectors_and_clears() {
        let mut partition = FilesPartition::new();
        partition.add(FileMetadata::with_estimate("/a.log", 10, 100), 3);
        partition.add(FileMetadata::with_estimate("/b.log", 20, 200), 1);

        let drained = partition.drain();
        assert_eq!(drained.file_paths, vec!["/a.log", "/b.log"]);
        assert_eq!(drained.group_ids, vec![3, 1]);
        assert_eq!(drained.st_sizes, vec![10, 20]);
        assert_eq!(drained.total_size, 300);
        assert_eq!(drained.original_size(), 30);

        assert!(!partition.has_members());
        assert_eq!(partition.total_size(), 0);
        assert_eq!(partition.drain(), DrainedPartition::default());
    }

    #[test]
    fn test_restore_undoes_drain() {
        let mut partition = FilesPartition::new();
        partition.add(FileMetadata::with_estimate("/a.log", 10, 100), 0);
        let drained = partition.drain();
        partition.add(FileMetadata::with_estimate("/b.log", 20, 200), 1);

        partition.restore(drained);
        assert_eq!(partition.total_size(), 300);
        let paths: Vec<String> = partition.files().iter().map(|f| f.path_string()).collect();
        assert_eq!(paths, vec!["/a.log", "/b.log"]);
    }
}
